//! Chunked multi-row INSERT execution.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::value::{quote_ident, SqlValue};
use crate::error::SeedError;

/// Postgres refuses statements with more bind parameters than this.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Produces the column values for row `index` of a task.
pub type RowGenerator = Box<dyn FnMut(usize) -> Vec<SqlValue> + Send>;

/// The `INSERT INTO table (columns)` part of a batch statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertHead {
    pub table: String,
    pub columns: Vec<String>,
}

impl InsertHead {
    pub fn new(table: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            table: table.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    pub fn to_sql(&self) -> String {
        insert_into(&self.table, &self.columns)
    }
}

fn insert_into(table: &str, columns: &[String]) -> String {
    let columns: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    format!("INSERT INTO {} ({})", quote_ident(table), columns.join(", "))
}

/// One chunk of rows for a single table, ready to execute in one round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    /// Row-major values, `columns.len()` per row.
    pub params: Vec<SqlValue>,
    pub rows: usize,
}

impl InsertStatement {
    /// `INSERT ... VALUES (...), (...) ON CONFLICT DO NOTHING` with every value bound.
    pub fn query_builder(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!("{} ", insert_into(&self.table, &self.columns)));
        builder.push_values(self.params.chunks(self.columns.len().max(1)), |mut b, row| {
            for value in row {
                value.push_bind_to(&mut b);
            }
        });
        builder.push(" ON CONFLICT DO NOTHING");
        builder
    }
}

/// Collects one chunk of rows into a statement.
///
/// Every row must have exactly as many values as the head has columns.
pub fn build_insert_statement(
    head: &InsertHead,
    rows: Vec<Vec<SqlValue>>,
    first_row_index: usize,
) -> Result<InsertStatement, SeedError> {
    let arity = head.arity();
    let row_count = rows.len();
    let mut params = Vec::with_capacity(row_count * arity);

    for (offset, row) in rows.into_iter().enumerate() {
        if row.len() != arity {
            return Err(SeedError::BatchArity {
                table: head.table.clone(),
                row: first_row_index + offset,
                expected: arity,
                found: row.len(),
            });
        }
        params.extend(row);
    }

    Ok(InsertStatement {
        table: head.table.clone(),
        columns: head.columns.clone(),
        params,
        rows: row_count,
    })
}

/// Executes built statements against the store.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Runs the statement and returns the number of rows actually inserted.
    async fn execute(&self, statement: &InsertStatement) -> Result<u64, SeedError>;
}

/// Statement executor backed by a Postgres pool.
#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatementExecutor for PgExecutor {
    async fn execute(&self, statement: &InsertStatement) -> Result<u64, SeedError> {
        let mut builder = statement.query_builder();
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Counters for one `batch_insert` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub statements: usize,
    pub rows_generated: usize,
    pub rows_inserted: u64,
}

/// Splits row generation into bounded chunks and sends one statement per chunk.
pub struct BatchInsertEngine<'a, E: StatementExecutor + ?Sized> {
    executor: &'a E,
    batch_size: usize,
}

impl<'a, E: StatementExecutor + ?Sized> BatchInsertEngine<'a, E> {
    pub fn new(executor: &'a E, batch_size: usize) -> Result<Self, SeedError> {
        if batch_size == 0 {
            return Err(SeedError::Configuration(
                "insert batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            executor,
            batch_size,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Inserts `total_rows` rows produced by `generator`, `batch_size` rows per statement.
    ///
    /// Executes exactly `ceil(total_rows / batch_size)` statements; the last one
    /// carries the remainder. A row with the wrong number of values aborts the
    /// run before its chunk is sent.
    pub async fn batch_insert(
        &self,
        head: &InsertHead,
        generator: &mut RowGenerator,
        total_rows: usize,
    ) -> Result<BatchStats, SeedError> {
        let mut stats = BatchStats::default();
        if total_rows == 0 {
            return Ok(stats);
        }

        if self.batch_size.min(total_rows) * head.arity() > MAX_BIND_PARAMS {
            return Err(SeedError::Configuration(format!(
                "batch of {} rows x {} columns for {} exceeds {} bind parameters",
                self.batch_size.min(total_rows),
                head.arity(),
                head.table,
                MAX_BIND_PARAMS
            )));
        }

        let mut start = 0;
        while start < total_rows {
            let end = (start + self.batch_size).min(total_rows);
            let rows: Vec<Vec<SqlValue>> = (start..end).map(|i| generator(i)).collect();
            let statement = build_insert_statement(head, rows, start)?;

            let inserted = self.executor.execute(&statement).await?;
            debug!(
                table = %head.table,
                rows = statement.rows,
                inserted,
                "executed batch insert"
            );

            stats.statements += 1;
            stats.rows_generated += statement.rows;
            stats.rows_inserted += inserted;
            start = end;
        }

        Ok(stats)
    }
}
