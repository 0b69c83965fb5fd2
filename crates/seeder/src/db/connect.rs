//! Startup connection with a fixed retry budget.

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::{DbConfig, RetryConfig};
use crate::error::SeedError;

pub fn connect_options(db: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.user)
        .password(&db.password)
        .database(&db.name)
}

/// Runs `attempt` up to `max_attempts` times, sleeping `interval` between
/// failures. Returns the first success, or the attempt count and last error.
pub async fn retry_fixed<T, E, F, Fut>(
    max_attempts: u32,
    interval: Duration,
    mut attempt: F,
) -> Result<T, (u32, E)>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut n = 1;
    loop {
        match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(e) if n >= max_attempts => return Err((n, e)),
            Err(e) => {
                warn!(attempt = n, max_attempts, error = %e, "database not ready, retrying");
                tokio::time::sleep(interval).await;
                n += 1;
            }
        }
    }
}

/// Opens the pool shared by every component of the run.
pub async fn connect_with_retry(db: &DbConfig, retry: &RetryConfig) -> Result<PgPool, SeedError> {
    info!(
        host = %db.host,
        port = db.port,
        dbname = %db.name,
        user = %db.user,
        "Connecting to database"
    );

    let options = connect_options(db);
    let pool = retry_fixed(retry.max_attempts, retry.interval(), |_| {
        PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options.clone())
    })
    .await
    .map_err(|(attempts, source)| SeedError::Connection { attempts, source })?;

    info!("Connected to database");
    Ok(pool)
}
