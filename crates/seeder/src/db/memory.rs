//! In-memory stand-in for the database, used by unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::batch::{InsertStatement, StatementExecutor};
use super::ledger::{SeedingLedger, SeedingStatusRecord};
use super::probe::SchemaProbe;
use super::value::{Id, SqlValue};
use crate::error::SeedError;

#[derive(Debug, Default)]
pub struct MemoryTable {
    /// `None` models a table without a primary key.
    pub key_column: Option<String>,
    pub columns: Vec<String>,
    /// Each row is `(serial id, values)`; values line up with `columns`.
    pub rows: Vec<(Id, Vec<SqlValue>)>,
}

impl MemoryTable {
    pub fn column_values(&self, column: &str) -> Vec<SqlValue> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .unwrap_or_else(|| panic!("no column {column}"));
        self.rows.iter().map(|(_, values)| values[idx].clone()).collect()
    }

    pub fn ids(&self) -> Vec<Id> {
        self.rows.iter().map(|(id, _)| *id).collect()
    }
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, MemoryTable>,
    ledger: Vec<SeedingStatusRecord>,
    statements: Vec<InsertStatement>,
    fail_inserts_into: Option<String>,
    fail_ledger_writes_for: Option<String>,
    fail_marker_advance: bool,
}

#[derive(Debug, Default)]
pub struct MemoryDatabase {
    state: Mutex<State>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table whose serial key column is `key_column`.
    pub fn create_table(&self, name: &str, key_column: &str) {
        self.state.lock().unwrap().tables.insert(
            name.to_string(),
            MemoryTable {
                key_column: Some(key_column.to_string()),
                ..Default::default()
            },
        );
    }

    /// Creates an empty table that has no primary key.
    pub fn create_keyless_table(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .tables
            .insert(name.to_string(), MemoryTable::default());
    }

    /// Creates a table already holding `count` rows.
    pub fn create_filled_table(&self, name: &str, key_column: &str, count: usize) {
        self.create_table(name, key_column);
        let mut state = self.state.lock().unwrap();
        let table = state.tables.get_mut(name).unwrap();
        table.rows = (1..=count as Id).map(|id| (id, Vec::new())).collect();
    }

    /// Makes every later insert into `table` fail.
    pub fn fail_inserts_into(&self, table: Option<&str>) {
        self.state.lock().unwrap().fail_inserts_into = table.map(str::to_string);
    }

    /// Makes every later task start/success record for `table` fail.
    pub fn fail_ledger_writes_for(&self, table: Option<&str>) {
        self.state.lock().unwrap().fail_ledger_writes_for = table.map(str::to_string);
    }

    /// Makes every later global marker advance fail.
    pub fn fail_marker_advance(&self, fail: bool) {
        self.state.lock().unwrap().fail_marker_advance = fail;
    }

    fn ledger_write_fails_for(&self, table: &str) -> bool {
        self.state.lock().unwrap().fail_ledger_writes_for.as_deref() == Some(table)
    }

    pub fn with_table<R>(&self, name: &str, f: impl FnOnce(&MemoryTable) -> R) -> R {
        let state = self.state.lock().unwrap();
        f(state.tables.get(name).unwrap_or_else(|| panic!("no table {name}")))
    }

    pub fn row_count(&self, name: &str) -> usize {
        self.with_table(name, |t| t.rows.len())
    }

    pub fn statements(&self) -> Vec<InsertStatement> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn statements_for(&self, table: &str) -> Vec<InsertStatement> {
        self.statements()
            .into_iter()
            .filter(|s| s.table == table)
            .collect()
    }

    pub fn ledger_rows(&self) -> Vec<SeedingStatusRecord> {
        self.state.lock().unwrap().ledger.clone()
    }

    /// Inserts a ledger row directly, bypassing the trait methods.
    pub fn put_ledger_row(&self, version: i32, table: Option<&str>, success: bool) {
        self.state.lock().unwrap().ledger.push(SeedingStatusRecord {
            migration_version: version,
            table_name: table.map(str::to_string),
            success,
            seeded_at: OffsetDateTime::now_utc(),
        });
    }
}

fn simulated_ledger_failure(operation: &'static str, version: i32, table: Option<&str>) -> SeedError {
    SeedError::LedgerWrite {
        operation,
        version: Some(version),
        table: table.map(str::to_string),
        source: sqlx::Error::Protocol(format!("simulated failure to {operation}")),
    }
}

#[async_trait]
impl StatementExecutor for MemoryDatabase {
    async fn execute(&self, statement: &InsertStatement) -> Result<u64, SeedError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_inserts_into.as_deref() == Some(statement.table.as_str()) {
            return Err(SeedError::Database(sqlx::Error::Protocol(format!(
                "simulated failure inserting into {}",
                statement.table
            ))));
        }

        let table = state
            .tables
            .get_mut(&statement.table)
            .ok_or_else(|| SeedError::Database(sqlx::Error::RowNotFound))?;
        table.columns = statement.columns.clone();

        for chunk in statement.params.chunks(statement.columns.len().max(1)) {
            let next_id = table.rows.last().map(|(id, _)| id + 1).unwrap_or(1);
            table.rows.push((next_id, chunk.to_vec()));
        }

        state.statements.push(statement.clone());
        Ok(statement.rows as u64)
    }
}

#[async_trait]
impl SchemaProbe for MemoryDatabase {
    async fn table_exists(&self, table: &str) -> Result<bool, SeedError> {
        Ok(self.state.lock().unwrap().tables.contains_key(table))
    }

    async fn primary_key_column(&self, table: &str) -> Result<String, SeedError> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .and_then(|t| t.key_column.clone())
            .ok_or_else(|| SeedError::SchemaIntrospection {
                table: table.to_string(),
                reason: "no primary key found".to_string(),
            })
    }

    async fn column_ids(&self, table: &str, column: &str) -> Result<Vec<Id>, SeedError> {
        let state = self.state.lock().unwrap();
        let t = state
            .tables
            .get(table)
            .ok_or_else(|| SeedError::SchemaIntrospection {
                table: table.to_string(),
                reason: "table does not exist".to_string(),
            })?;
        if t.key_column.as_deref() != Some(column) {
            return Err(SeedError::SchemaIntrospection {
                table: table.to_string(),
                reason: format!("unknown key column {column}"),
            });
        }
        Ok(t.ids())
    }
}

#[async_trait]
impl SeedingLedger for MemoryDatabase {
    async fn ensure_status_table(&self) -> Result<(), SeedError> {
        Ok(())
    }

    async fn current_version(&self) -> Result<i32, SeedError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .ledger
            .iter()
            .filter(|r| r.is_global())
            .map(|r| r.migration_version)
            .max()
            .unwrap_or(0))
    }

    async fn is_table_seeded(&self, version: i32, table: &str) -> Result<bool, SeedError> {
        Ok(self.state.lock().unwrap().ledger.iter().any(|r| {
            r.migration_version == version && r.table_name.as_deref() == Some(table) && r.success
        }))
    }

    async fn record_task_start(&self, version: i32, table: &str) -> Result<(), SeedError> {
        if self.ledger_write_fails_for(table) {
            return Err(simulated_ledger_failure("record task start", version, Some(table)));
        }
        self.put_ledger_row(version, Some(table), false);
        Ok(())
    }

    async fn record_task_success(&self, version: i32, table: &str) -> Result<(), SeedError> {
        if self.ledger_write_fails_for(table) {
            return Err(simulated_ledger_failure("record task success", version, Some(table)));
        }
        let mut state = self.state.lock().unwrap();
        let mut updated = 0;
        for record in state.ledger.iter_mut().filter(|r| {
            r.migration_version == version && r.table_name.as_deref() == Some(table)
        }) {
            record.success = true;
            record.seeded_at = OffsetDateTime::now_utc();
            updated += 1;
        }
        if updated == 0 {
            return Err(SeedError::LedgerWrite {
                operation: "record task success",
                version: Some(version),
                table: Some(table.to_string()),
                source: sqlx::Error::RowNotFound,
            });
        }
        Ok(())
    }

    async fn cleanup_failed_attempts(&self, version: i32) -> Result<u64, SeedError> {
        let mut state = self.state.lock().unwrap();
        let before = state.ledger.len();
        state
            .ledger
            .retain(|r| !(r.migration_version == version && !r.is_global() && !r.success));
        Ok((before - state.ledger.len()) as u64)
    }

    async fn advance_global_version(&self, version: i32) -> Result<(), SeedError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_marker_advance {
            return Err(simulated_ledger_failure("advance global version", version, None));
        }
        match state.ledger.iter_mut().find(|r| r.is_global()) {
            Some(record) => {
                record.migration_version = version;
                record.success = true;
                record.seeded_at = OffsetDateTime::now_utc();
            }
            None => state.ledger.push(SeedingStatusRecord {
                migration_version: version,
                table_name: None,
                success: true,
                seeded_at: OffsetDateTime::now_utc(),
            }),
        }
        Ok(())
    }

    async fn records(&self, version: i32) -> Result<Vec<SeedingStatusRecord>, SeedError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .ledger
            .iter()
            .filter(|r| r.migration_version == version)
            .cloned()
            .collect())
    }
}
