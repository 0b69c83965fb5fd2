//! Ordered migration versions and the table tasks each one runs.
//!
//! The order of tasks is a hand-written topological sort: a task only ever
//! references tables seeded by an earlier task (in the same or an earlier
//! version) or tables the registry does not seed at all.
//! [`SeedStepRegistry::new`] rejects registries that break this.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::MigrationTarget;
use crate::db::{Id, InsertHead, RowGenerator};
use crate::error::SeedError;

/// A parent table a task draws foreign keys from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub table: &'static str,
    /// Identifier column to read; `None` uses the discovered primary key.
    pub column: Option<&'static str>,
}

impl Dependency {
    pub const fn key(table: &'static str) -> Self {
        Self {
            table,
            column: None,
        }
    }

    pub const fn column(table: &'static str, column: &'static str) -> Self {
        Self {
            table,
            column: Some(column),
        }
    }
}

/// How many rows a task inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCount {
    /// The configured per-table seed count.
    SeedCount,
    /// A fixed catalog size (lookup tables).
    Fixed(usize),
}

impl RowCount {
    pub fn resolve(self, seed_count: usize) -> usize {
        match self {
            RowCount::SeedCount => seed_count,
            RowCount::Fixed(n) => n,
        }
    }
}

/// A non-empty set of identifiers to pick foreign keys from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPool {
    table: String,
    ids: Vec<Id>,
}

impl IdPool {
    pub fn new(table: impl Into<String>, ids: Vec<Id>) -> Result<Self, SeedError> {
        let table = table.into();
        if ids.is_empty() {
            return Err(SeedError::ReferentialDataMissing { table });
        }
        Ok(Self { table, ids })
    }

    pub fn pick(&self, rng: &mut impl Rng) -> Id {
        self.ids[rng.gen_range(0..self.ids.len())]
    }

    pub fn ids(&self) -> &[Id] {
        &self.ids
    }
}

/// Identifiers of every dependency of one task, read just before it runs.
#[derive(Debug, Clone, Default)]
pub struct DependencyIds {
    pools: BTreeMap<String, IdPool>,
}

impl DependencyIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pool: IdPool) {
        self.pools.insert(pool.table.clone(), pool);
    }

    /// The pool for `table`. Asking for a table that was not resolved is
    /// reported the same way as an empty parent table.
    pub fn pool(&self, table: &str) -> Result<IdPool, SeedError> {
        self.pools
            .get(table)
            .cloned()
            .ok_or_else(|| SeedError::ReferentialDataMissing {
                table: table.to_string(),
            })
    }
}

/// Builds the row generator for a task once its dependency IDs are known.
pub type GeneratorFactory = fn(&DependencyIds, StdRng) -> Result<RowGenerator, SeedError>;

/// Seeding work for one table within one version.
#[derive(Clone)]
pub struct TableTask {
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub dependencies: Vec<Dependency>,
    pub rows: RowCount,
    pub generate: GeneratorFactory,
}

impl TableTask {
    pub fn new(
        table: &'static str,
        columns: &'static [&'static str],
        generate: GeneratorFactory,
    ) -> Self {
        Self {
            table,
            columns,
            dependencies: Vec::new(),
            rows: RowCount::SeedCount,
            generate,
        }
    }

    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn fixed_rows(mut self, count: usize) -> Self {
        self.rows = RowCount::Fixed(count);
        self
    }

    pub fn head(&self) -> InsertHead {
        InsertHead::new(self.table, self.columns)
    }
}

impl fmt::Debug for TableTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableTask")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("dependencies", &self.dependencies)
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct SeedStep {
    pub version: i32,
    pub tasks: Vec<TableTask>,
}

impl SeedStep {
    pub fn new(version: i32, tasks: Vec<TableTask>) -> Self {
        Self { version, tasks }
    }
}

#[derive(Debug, Clone)]
pub struct SeedStepRegistry {
    steps: Vec<SeedStep>,
}

impl SeedStepRegistry {
    /// Builds a registry from steps numbered `1..=N`, checking task order.
    pub fn new(mut steps: Vec<SeedStep>) -> Result<Self, SeedError> {
        steps.sort_by_key(|s| s.version);
        for (expected, step) in (1..).zip(&steps) {
            if step.version != expected {
                return Err(SeedError::InvalidRegistry(format!(
                    "versions must be numbered 1..=N without gaps, found {} where {} was expected",
                    step.version, expected
                )));
            }
        }

        let registry = Self { steps };
        registry.validate()?;
        Ok(registry)
    }

    /// The registry shipped with the tool.
    pub fn education() -> Result<Self, SeedError> {
        Self::new(crate::generators::education_steps())
    }

    pub fn steps(&self) -> &[SeedStep] {
        &self.steps
    }

    pub fn latest_version(&self) -> i32 {
        self.steps.last().map(|s| s.version).unwrap_or(0)
    }

    /// Turns the configured target into a registered version number.
    pub fn resolve_target(&self, target: MigrationTarget) -> Result<i32, SeedError> {
        match target {
            MigrationTarget::Latest => Ok(self.latest_version()),
            MigrationTarget::Version(v) if self.steps.iter().any(|s| s.version == v) => Ok(v),
            MigrationTarget::Version(v) => Err(SeedError::Configuration(format!(
                "migration version {v} is not registered (latest is {})",
                self.latest_version()
            ))),
        }
    }

    /// Steps with `current < version <= target`, ascending.
    pub fn steps_up_to(&self, target: i32, current: i32) -> impl Iterator<Item = &SeedStep> {
        self.steps
            .iter()
            .filter(move |s| s.version > current && s.version <= target)
    }

    /// Checks that no task references a registry-seeded table before that
    /// table's own task, and that no table is seeded twice in one version.
    pub fn validate(&self) -> Result<(), SeedError> {
        let all_seeded: HashSet<&str> = self
            .steps
            .iter()
            .flat_map(|s| s.tasks.iter().map(|t| t.table))
            .collect();

        let mut seeded_so_far: HashSet<&str> = HashSet::new();
        for step in &self.steps {
            let mut in_version: HashSet<&str> = HashSet::new();
            for task in &step.tasks {
                if !in_version.insert(task.table) {
                    return Err(SeedError::InvalidRegistry(format!(
                        "table {} is seeded twice in version {}",
                        task.table, step.version
                    )));
                }

                for dep in &task.dependencies {
                    if all_seeded.contains(dep.table) && !seeded_so_far.contains(dep.table) {
                        return Err(SeedError::InvalidRegistry(format!(
                            "{} (version {}) depends on {}, which is seeded later",
                            task.table, step.version, dep.table
                        )));
                    }
                }

                seeded_so_far.insert(task.table);
            }
        }

        Ok(())
    }
}
