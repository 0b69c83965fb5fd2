//! Database access for the seeding run.
//!
//! Three seams, each with a Postgres implementation sharing one pool:
//! - [`SeedingLedger`]: progress records in `seeding_status`
//! - [`SchemaProbe`]: table existence, key columns and existing identifiers
//! - [`StatementExecutor`]: runs the statements built by [`BatchInsertEngine`]

mod batch;
mod connect;
mod ledger;
#[cfg(test)]
pub(crate) mod memory;
mod probe;
mod value;

use sqlx::PgPool;

pub use batch::{
    build_insert_statement, BatchInsertEngine, BatchStats, InsertHead, InsertStatement,
    PgExecutor, RowGenerator, StatementExecutor, MAX_BIND_PARAMS,
};
pub use connect::{connect_options, connect_with_retry, retry_fixed};
pub use ledger::{PgLedger, SeedingLedger, SeedingStatusRecord};
pub use probe::{PgSchemaProbe, SchemaProbe};
pub use value::{quote_ident, Id, SqlValue};

/// The Postgres-backed implementations of every seam, over one pool.
#[derive(Clone)]
pub struct PgStore {
    pub ledger: PgLedger,
    pub probe: PgSchemaProbe,
    pub executor: PgExecutor,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            ledger: PgLedger::new(pool.clone()),
            probe: PgSchemaProbe::new(pool.clone()),
            executor: PgExecutor::new(pool),
        }
    }
}
