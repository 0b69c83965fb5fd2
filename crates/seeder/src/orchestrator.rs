//! Drives a seeding run from the current ledger version up to the target.
//!
//! Versions run strictly in order and tasks strictly in registry order. A
//! version only counts as applied once every one of its tasks has a
//! successful ledger record; any error stops the run where it is, and the
//! next run picks up from the ledger.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use crate::config::SeedConfig;
use crate::db::{BatchInsertEngine, SchemaProbe, SeedingLedger, StatementExecutor};
use crate::error::SeedError;
use crate::registry::{DependencyIds, IdPool, SeedStep, SeedStepRegistry, TableTask};

/// What happened to one table task during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Rows were generated and sent to the database.
    Seeded {
        rows: usize,
        inserted: u64,
        statements: usize,
    },
    /// A successful ledger record already existed.
    AlreadySeeded,
    /// The table is not part of the schema; recorded as done with no rows.
    TableAbsent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub version: i32,
    pub table: String,
    pub outcome: TaskOutcome,
}

/// Summary of one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Global marker before the run.
    pub starting_version: i32,
    /// Version the run was asked to reach.
    pub target_version: i32,
    /// Global marker after the run.
    pub final_version: i32,
    pub tasks: Vec<TaskReport>,
    /// Wall time of the run (milliseconds).
    pub elapsed_ms: u64,
}

impl RunReport {
    fn new(starting_version: i32, target_version: i32) -> Self {
        Self {
            starting_version,
            target_version,
            final_version: starting_version,
            ..Default::default()
        }
    }

    pub fn versions_applied(&self) -> i32 {
        (self.final_version - self.starting_version).max(0)
    }

    pub fn tables_seeded(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| matches!(t.outcome, TaskOutcome::Seeded { .. }))
            .count()
    }

    pub fn rows_seeded(&self) -> usize {
        self.tasks
            .iter()
            .map(|t| match t.outcome {
                TaskOutcome::Seeded { rows, .. } => rows,
                _ => 0,
            })
            .sum()
    }

    pub fn outcome(&self, version: i32, table: &str) -> Option<TaskOutcome> {
        self.tasks
            .iter()
            .find(|t| t.version == version && t.table == table)
            .map(|t| t.outcome)
    }
}

/// Runs registered seed steps against a ledger, a schema probe and a
/// statement executor. In production all three are backed by one pool.
pub struct Orchestrator<'a, L: ?Sized, P: ?Sized, E: ?Sized> {
    ledger: &'a L,
    probe: &'a P,
    executor: &'a E,
    registry: SeedStepRegistry,
    config: SeedConfig,
}

impl<'a, L, P, E> Orchestrator<'a, L, P, E>
where
    L: SeedingLedger + ?Sized,
    P: SchemaProbe + ?Sized,
    E: StatementExecutor + ?Sized,
{
    pub fn new(
        ledger: &'a L,
        probe: &'a P,
        executor: &'a E,
        registry: SeedStepRegistry,
        config: SeedConfig,
    ) -> Self {
        Self {
            ledger,
            probe,
            executor,
            registry,
            config,
        }
    }

    /// Brings the database up to the configured migration version.
    pub async fn run(&self) -> Result<RunReport, SeedError> {
        let started = Instant::now();
        let target = self.registry.resolve_target(self.config.migration_version)?;
        let engine = BatchInsertEngine::new(self.executor, self.config.insert_batch_size)?;

        self.ledger.ensure_status_table().await?;
        let current = self.ledger.current_version().await?;
        let mut report = RunReport::new(current, target);

        if current >= target {
            info!(
                current_version = current,
                target_version = target,
                "Schema already seeded up to target, nothing to do"
            );
        } else {
            info!(
                current_version = current,
                target_version = target,
                seed_count = self.config.seed_count,
                batch_size = engine.batch_size(),
                "Seeding schema"
            );

            for step in self.registry.steps_up_to(target, current) {
                self.run_step(step, &engine, &mut report).await?;
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }

    async fn run_step(
        &self,
        step: &SeedStep,
        engine: &BatchInsertEngine<'_, E>,
        report: &mut RunReport,
    ) -> Result<(), SeedError> {
        let version = step.version;

        let cleaned = self
            .ledger
            .cleanup_failed_attempts(version)
            .await
            .inspect_err(|err| error!(version, error = %err, "Failed to clean up earlier attempts"))?;
        if cleaned > 0 {
            warn!(version, records = cleaned, "Removed records of an unfinished earlier attempt");
        }

        info!(version, tasks = step.tasks.len(), "Seeding version");

        for task in &step.tasks {
            let outcome = self
                .run_task(version, task, engine)
                .await
                .inspect_err(|err| {
                    error!(version, table = task.table, error = %err, "Seeding task failed")
                })?;

            report.tasks.push(TaskReport {
                version,
                table: task.table.to_string(),
                outcome,
            });
        }

        self.ledger
            .advance_global_version(version)
            .await
            .inspect_err(|err| error!(version, error = %err, "Failed to advance global version"))?;
        report.final_version = version;

        info!(version, "Version seeded");
        Ok(())
    }

    async fn run_task(
        &self,
        version: i32,
        task: &TableTask,
        engine: &BatchInsertEngine<'_, E>,
    ) -> Result<TaskOutcome, SeedError> {
        let table = task.table;

        if self.ledger.is_table_seeded(version, table).await? {
            info!(version, table, "Table already seeded, skipping");
            return Ok(TaskOutcome::AlreadySeeded);
        }

        self.ledger.record_task_start(version, table).await?;

        if !self.probe.table_exists(table).await? {
            warn!(version, table, "Table does not exist, nothing to seed");
            self.ledger.record_task_success(version, table).await?;
            return Ok(TaskOutcome::TableAbsent);
        }

        let ids = self.resolve_dependencies(task).await?;
        let mut generator = (task.generate)(&ids, self.task_rng(version, table))?;
        let rows = task.rows.resolve(self.config.seed_count);

        info!(version, table, rows, "Seeding table");
        let stats = engine.batch_insert(&task.head(), &mut generator, rows).await?;

        self.ledger.record_task_success(version, table).await?;
        info!(
            version,
            table,
            rows = stats.rows_generated,
            inserted = stats.rows_inserted,
            statements = stats.statements,
            "Table seeded"
        );

        Ok(TaskOutcome::Seeded {
            rows: stats.rows_generated,
            inserted: stats.rows_inserted,
            statements: stats.statements,
        })
    }

    /// Reads the current identifiers of every parent table. Done per task so
    /// rows inserted by earlier tasks of the same version are visible.
    async fn resolve_dependencies(&self, task: &TableTask) -> Result<DependencyIds, SeedError> {
        let mut ids = DependencyIds::new();

        for dependency in &task.dependencies {
            if !self.probe.table_exists(dependency.table).await? {
                return Err(SeedError::SchemaIntrospection {
                    table: dependency.table.to_string(),
                    reason: format!("required by {} but does not exist", task.table),
                });
            }

            let existing = self
                .probe
                .existing_ids(dependency.table, dependency.column)
                .await?;
            let pool = IdPool::new(dependency.table, existing)?;
            debug!(
                table = task.table,
                dependency = dependency.table,
                ids = pool.ids().len(),
                "Resolved dependency identifiers"
            );
            ids.insert(pool);
        }

        Ok(ids)
    }

    fn task_rng(&self, version: i32, table: &str) -> StdRng {
        match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(task_seed(seed, version, table)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Derives a per-task seed so each table gets its own reproducible stream.
fn task_seed(seed: u64, version: i32, table: &str) -> u64 {
    // FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in version.to_le_bytes().iter().chain(table.as_bytes()) {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    seed ^ hash
}
