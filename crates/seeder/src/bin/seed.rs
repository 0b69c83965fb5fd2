//! Seeds the education platform database up to the configured migration version.
//!
//! Run with:
//! ```
//! DB_HOST=localhost DB_PORT=5432 DB_USER=edu DB_PASSWORD=edu DB_NAME=edu \
//!     cargo run -p seeder --bin seed
//! ```
//!
//! Safe to rerun after a failure: completed tables are skipped.

use seeder::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        match err.downcast_ref::<SeedError>().and_then(SeedError::table) {
            Some(table) => tracing::error!(table, "Seeding failed: {err:#}"),
            None => tracing::error!("Seeding failed: {err:#}"),
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing::info!(db = ?config.db, seed = ?config.seed, "Loaded configuration");

    let registry = SeedStepRegistry::education()?;
    let pool = connect_with_retry(&config.db, &config.retry).await?;
    let store = PgStore::new(pool.clone());

    let report = Orchestrator::new(
        &store.ledger,
        &store.probe,
        &store.executor,
        registry,
        config.seed,
    )
    .run()
    .await?;

    // Summary output
    tracing::info!("Seed completed!");
    tracing::info!(
        "  Versions: {} -> {} (target {})",
        report.starting_version,
        report.final_version,
        report.target_version
    );
    for task in &report.tasks {
        match task.outcome {
            TaskOutcome::Seeded {
                rows, statements, ..
            } => tracing::info!(
                "  v{} {}: {} rows in {} statements",
                task.version,
                task.table,
                rows,
                statements
            ),
            TaskOutcome::AlreadySeeded => {
                tracing::info!("  v{} {}: already seeded", task.version, task.table)
            }
            TaskOutcome::TableAbsent => {
                tracing::info!("  v{} {}: table absent, skipped", task.version, task.table)
            }
        }
    }
    tracing::info!(
        "  Tables seeded: {}, rows: {}, took {} ms",
        report.tables_seeded(),
        report.rows_seeded(),
        report.elapsed_ms
    );

    pool.close().await;
    Ok(())
}
