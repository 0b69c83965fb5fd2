//! Configuration types for the seeding run.
//!
//! Everything is read once from the process environment (optionally primed
//! from a `.env` file) and then passed down explicitly.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SeedError;

/// Connection settings for the target database. All fields are required.
#[derive(Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .finish()
    }
}

/// Which migration version the run should bring the database up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationTarget {
    /// The highest version known to the registry.
    Latest,
    /// An explicit version number.
    Version(i32),
}

impl FromStr for MigrationTarget {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        s.parse::<i32>().map(Self::Version).map_err(|_| {
            SeedError::Configuration(format!(
                "MIGRATION_VERSION must be \"latest\" or an integer, got {s:?}"
            ))
        })
    }
}

impl fmt::Display for MigrationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Version(v) => write!(f, "{v}"),
        }
    }
}

/// Configuration for seeding operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Rows generated per table per task (lookup tables use their fixed catalog size).
    pub seed_count: usize,

    /// Version the run should end at.
    pub migration_version: MigrationTarget,

    /// Maximum rows per INSERT statement.
    pub insert_batch_size: usize,

    /// Seed for the synthetic data RNG; `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            seed_count: 10,
            migration_version: MigrationTarget::Latest,
            insert_batch_size: 1000,
            rng_seed: None,
        }
    }
}

/// Startup connection retry budget. This is the only retry in the system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl RetryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub db: DbConfig,
    pub seed: SeedConfig,
    pub retry: RetryConfig,
}

impl Config {
    /// Loads configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, SeedError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SeedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SeedConfig::default();
        let retry_defaults = RetryConfig::default();

        let db = DbConfig {
            host: required(&lookup, "DB_HOST")?,
            port: parse_value("DB_PORT", &required(&lookup, "DB_PORT")?)?,
            user: required(&lookup, "DB_USER")?,
            password: required(&lookup, "DB_PASSWORD")?,
            name: required(&lookup, "DB_NAME")?,
        };

        let seed = SeedConfig {
            seed_count: optional(&lookup, "SEED_COUNT")?.unwrap_or(defaults.seed_count),
            migration_version: optional(&lookup, "MIGRATION_VERSION")?
                .unwrap_or(defaults.migration_version),
            insert_batch_size: optional(&lookup, "INSERT_BATCH_SIZE")?
                .unwrap_or(defaults.insert_batch_size),
            rng_seed: optional(&lookup, "SEED_RNG_SEED")?,
        };

        if seed.insert_batch_size == 0 {
            return Err(SeedError::Configuration(
                "INSERT_BATCH_SIZE must be at least 1".to_string(),
            ));
        }

        let retry = RetryConfig {
            max_attempts: optional(&lookup, "CONNECT_MAX_ATTEMPTS")?
                .unwrap_or(retry_defaults.max_attempts),
            interval_ms: optional(&lookup, "CONNECT_RETRY_INTERVAL_MS")?
                .unwrap_or(retry_defaults.interval_ms),
        };

        if retry.max_attempts == 0 {
            return Err(SeedError::Configuration(
                "CONNECT_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        Ok(Self { db, seed, retry })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, SeedError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SeedError::Configuration(format!(
            "required environment variable {key} is not set"
        ))),
    }
}

fn optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>, SeedError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => parse_value(key, &value).map(Some),
        _ => Ok(None),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, SeedError> {
    value
        .trim()
        .parse()
        .map_err(|_| SeedError::Configuration(format!("{key} has an invalid value: {value:?}")))
}
