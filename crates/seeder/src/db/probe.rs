//! Live schema introspection.

use async_trait::async_trait;
use sqlx::PgPool;

use super::value::{quote_ident, Id};
use crate::error::SeedError;

#[async_trait]
pub trait SchemaProbe: Send + Sync {
    async fn table_exists(&self, table: &str) -> Result<bool, SeedError>;

    /// Name of the table's primary-key column.
    async fn primary_key_column(&self, table: &str) -> Result<String, SeedError>;

    /// Every value currently stored in `table.column`, ascending.
    async fn column_ids(&self, table: &str, column: &str) -> Result<Vec<Id>, SeedError>;

    /// Current identifiers of `table`, read from `column` or the discovered
    /// primary key. An empty table is an error: foreign keys are never
    /// invented when there is nothing to point at.
    async fn existing_ids(&self, table: &str, column: Option<&str>) -> Result<Vec<Id>, SeedError> {
        let column = match column {
            Some(column) => column.to_string(),
            None => self.primary_key_column(table).await?,
        };

        let ids = self.column_ids(table, &column).await?;
        if ids.is_empty() {
            return Err(SeedError::ReferentialDataMissing {
                table: table.to_string(),
            });
        }

        Ok(ids)
    }
}

/// Probe over the Postgres catalog, scoped to the connection's current schema.
#[derive(Clone)]
pub struct PgSchemaProbe {
    pool: PgPool,
}

impl PgSchemaProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaProbe for PgSchemaProbe {
    async fn table_exists(&self, table: &str) -> Result<bool, SeedError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema()
                  AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn primary_key_column(&self, table: &str) -> Result<String, SeedError> {
        let column: Option<String> = sqlx::query_scalar(
            r#"
            SELECT kcu.column_name::text
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON kcu.constraint_name = tc.constraint_name
             AND kcu.constraint_schema = tc.constraint_schema
             AND kcu.table_name = tc.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = current_schema()
              AND tc.table_name = $1
            ORDER BY kcu.ordinal_position
            LIMIT 1
            "#,
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;

        column.ok_or_else(|| SeedError::SchemaIntrospection {
            table: table.to_string(),
            reason: "no primary key found".to_string(),
        })
    }

    async fn column_ids(&self, table: &str, column: &str) -> Result<Vec<Id>, SeedError> {
        let column = quote_ident(column);
        let sql = format!(
            "SELECT {column}::bigint FROM {} WHERE {column} IS NOT NULL ORDER BY 1",
            quote_ident(table)
        );

        let ids: Vec<Id> = sqlx::query_scalar(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SeedError::SchemaIntrospection {
                table: table.to_string(),
                reason: format!("could not read {column}: {e}"),
            })?;

        Ok(ids)
    }
}
