use thiserror::Error;

/// Every failure the seeding run can hit. None of them is recovered from
/// locally apart from the startup connection retry; the supported recovery
/// is to fix the cause and run the tool again.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database not reachable after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Schema introspection failed for table {table}: {reason}")]
    SchemaIntrospection { table: String, reason: String },

    #[error("No rows found in table {table} to reference")]
    ReferentialDataMissing { table: String },

    #[error("Row {row} for table {table} has {found} values, expected {expected}")]
    BatchArity {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Failed to {operation}{}{}: {source}", version_suffix(.version), table_suffix(.table))]
    LedgerWrite {
        operation: &'static str,
        /// `None` for writes that are not tied to a version (creating the table).
        version: Option<i32>,
        table: Option<String>,
        #[source]
        source: sqlx::Error,
    },

    #[error("Seed registry is inconsistent: {0}")]
    InvalidRegistry(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn version_suffix(version: &Option<i32>) -> String {
    version
        .map(|v| format!(" for version {v}"))
        .unwrap_or_default()
}

fn table_suffix(table: &Option<String>) -> String {
    table
        .as_deref()
        .map(|t| format!(" (table {t})"))
        .unwrap_or_default()
}

impl SeedError {
    /// Name of the table the error is about, if it concerns one.
    pub fn table(&self) -> Option<&str> {
        match self {
            SeedError::SchemaIntrospection { table, .. }
            | SeedError::ReferentialDataMissing { table }
            | SeedError::BatchArity { table, .. } => Some(table),
            SeedError::LedgerWrite { table, .. } => table.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_write_message_includes_table() {
        let err = SeedError::LedgerWrite {
            operation: "record task start",
            version: Some(2),
            table: Some("employee".to_string()),
            source: sqlx::Error::PoolClosed,
        };
        let msg = err.to_string();
        assert!(msg.contains("version 2"));
        assert!(msg.contains("(table employee)"));
        assert_eq!(err.table(), Some("employee"));
    }

    #[test]
    fn test_ledger_write_message_for_global_marker() {
        let err = SeedError::LedgerWrite {
            operation: "advance global version",
            version: Some(3),
            table: None,
            source: sqlx::Error::PoolClosed,
        };
        assert!(!err.to_string().contains("(table"));
        assert_eq!(err.table(), None);
    }

    #[test]
    fn test_ledger_write_message_without_version() {
        let err = SeedError::LedgerWrite {
            operation: "create seeding_status table",
            version: None,
            table: None,
            source: sqlx::Error::PoolClosed,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to create seeding_status table: "));
        assert!(!msg.contains("version"));
    }

    #[test]
    fn test_referential_error_names_parent() {
        let err = SeedError::ReferentialDataMissing {
            table: "course".to_string(),
        };
        assert_eq!(err.table(), Some("course"));
        assert!(err.to_string().contains("course"));
    }
}
