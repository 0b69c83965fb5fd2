//! Versioned, resumable seeding of an education platform database.
//!
//! Each migration version of the schema has a registered list of table
//! tasks. A run reads the progress ledger (`seeding_status`), seeds every
//! version between the last completed one and the target, and records
//! progress per table so that a failed run can simply be started again.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seeder::prelude::*;
//!
//! let config = Config::from_env()?;
//! let pool = connect_with_retry(&config.db, &config.retry).await?;
//! let store = PgStore::new(pool);
//!
//! let report = Orchestrator::new(
//!     &store.ledger,
//!     &store.probe,
//!     &store.executor,
//!     SeedStepRegistry::education()?,
//!     config.seed,
//! )
//! .run()
//! .await?;
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod generators;
pub mod orchestrator;
pub mod registry;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{Config, DbConfig, MigrationTarget, RetryConfig, SeedConfig};
    pub use crate::db::{
        connect_with_retry, BatchInsertEngine, PgStore, SchemaProbe, SeedingLedger, SqlValue,
        StatementExecutor,
    };
    pub use crate::error::SeedError;
    pub use crate::orchestrator::{Orchestrator, RunReport, TaskOutcome};
    pub use crate::registry::{Dependency, SeedStep, SeedStepRegistry, TableTask};
}
