//! Persisted seeding progress (`seeding_status`).
//!
//! One row with `table_name IS NULL` holds the highest fully seeded version
//! and is overwritten in place. Every other row tracks one table of one
//! version: inserted with `success = false` when the task starts, flipped to
//! `true` when it finishes. Only `success = true` rows count as done, so a
//! crashed attempt leaves a row that is ignored and later cleaned up.

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::error::SeedError;

/// One row of the `seeding_status` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SeedingStatusRecord {
    pub migration_version: i32,
    /// `None` marks the global "version complete" record.
    pub table_name: Option<String>,
    pub success: bool,
    pub seeded_at: OffsetDateTime,
}

impl SeedingStatusRecord {
    pub fn is_global(&self) -> bool {
        self.table_name.is_none()
    }
}

#[async_trait]
pub trait SeedingLedger: Send + Sync {
    /// Creates the bookkeeping table if it does not exist yet.
    async fn ensure_status_table(&self) -> Result<(), SeedError>;

    /// Highest fully seeded version, 0 if the schema was never seeded.
    async fn current_version(&self) -> Result<i32, SeedError>;

    /// True iff a successful record exists for `(version, table)`.
    async fn is_table_seeded(&self, version: i32, table: &str) -> Result<bool, SeedError>;

    async fn record_task_start(&self, version: i32, table: &str) -> Result<(), SeedError>;

    async fn record_task_success(&self, version: i32, table: &str) -> Result<(), SeedError>;

    /// Removes unfinished per-table records left behind by a crashed attempt.
    async fn cleanup_failed_attempts(&self, version: i32) -> Result<u64, SeedError>;

    /// Moves the global marker to `version`. Callers must only do this once
    /// every task of `version` has succeeded.
    async fn advance_global_version(&self, version: i32) -> Result<(), SeedError>;

    /// All records belonging to `version`, global record included.
    async fn records(&self, version: i32) -> Result<Vec<SeedingStatusRecord>, SeedError>;
}

/// Ledger stored in the target Postgres database.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn ledger_write(
    operation: &'static str,
    version: Option<i32>,
    table: Option<&str>,
) -> impl FnOnce(sqlx::Error) -> SeedError {
    let table = table.map(str::to_string);
    move |source| SeedError::LedgerWrite {
        operation,
        version,
        table,
        source,
    }
}

#[async_trait]
impl SeedingLedger for PgLedger {
    async fn ensure_status_table(&self) -> Result<(), SeedError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seeding_status (
                id SERIAL PRIMARY KEY,
                migration_version INTEGER NOT NULL,
                table_name TEXT,
                success BOOLEAN NOT NULL DEFAULT false,
                seeded_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(ledger_write("create seeding_status table", None, None))?;

        Ok(())
    }

    async fn current_version(&self) -> Result<i32, SeedError> {
        let version: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT migration_version FROM seeding_status
            WHERE table_name IS NULL
            ORDER BY migration_version DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(version.unwrap_or(0))
    }

    async fn is_table_seeded(&self, version: i32, table: &str) -> Result<bool, SeedError> {
        let seeded: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM seeding_status
                WHERE migration_version = $1
                  AND table_name = $2
                  AND success = true
            )
            "#,
        )
        .bind(version)
        .bind(table)
        .fetch_one(&self.pool)
        .await?;

        Ok(seeded)
    }

    async fn record_task_start(&self, version: i32, table: &str) -> Result<(), SeedError> {
        sqlx::query(
            r#"
            INSERT INTO seeding_status (migration_version, table_name, success, seeded_at)
            VALUES ($1, $2, false, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(version)
        .bind(table)
        .execute(&self.pool)
        .await
        .map_err(ledger_write("record task start", Some(version), Some(table)))?;

        Ok(())
    }

    async fn record_task_success(&self, version: i32, table: &str) -> Result<(), SeedError> {
        let result = sqlx::query(
            r#"
            UPDATE seeding_status
            SET success = true, seeded_at = CURRENT_TIMESTAMP
            WHERE migration_version = $1 AND table_name = $2
            "#,
        )
        .bind(version)
        .bind(table)
        .execute(&self.pool)
        .await
        .map_err(ledger_write("record task success", Some(version), Some(table)))?;

        if result.rows_affected() == 0 {
            return Err(ledger_write("record task success", Some(version), Some(table))(
                sqlx::Error::RowNotFound,
            ));
        }

        Ok(())
    }

    async fn cleanup_failed_attempts(&self, version: i32) -> Result<u64, SeedError> {
        let result = sqlx::query(
            r#"
            DELETE FROM seeding_status
            WHERE migration_version = $1
              AND table_name IS NOT NULL
              AND success = false
            "#,
        )
        .bind(version)
        .execute(&self.pool)
        .await
        .map_err(ledger_write("clean up failed attempts", Some(version), None))?;

        Ok(result.rows_affected())
    }

    async fn advance_global_version(&self, version: i32) -> Result<(), SeedError> {
        let updated = sqlx::query(
            r#"
            UPDATE seeding_status
            SET migration_version = $1, success = true, seeded_at = CURRENT_TIMESTAMP
            WHERE table_name IS NULL
            "#,
        )
        .bind(version)
        .execute(&self.pool)
        .await
        .map_err(ledger_write("advance global version", Some(version), None))?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO seeding_status (migration_version, table_name, success, seeded_at)
                VALUES ($1, NULL, true, CURRENT_TIMESTAMP)
                "#,
            )
            .bind(version)
            .execute(&self.pool)
            .await
            .map_err(ledger_write("advance global version", Some(version), None))?;
        }

        Ok(())
    }

    async fn records(&self, version: i32) -> Result<Vec<SeedingStatusRecord>, SeedError> {
        let records = sqlx::query_as::<_, SeedingStatusRecord>(
            r#"
            SELECT migration_version, table_name, success, seeded_at::timestamptz AS seeded_at
            FROM seeding_status
            WHERE migration_version = $1
            ORDER BY table_name NULLS FIRST
            "#,
        )
        .bind(version)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
