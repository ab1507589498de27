use std::env;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

use crate::sequence::SequenceScope;

/// Error raised when an environment variable is missing or malformed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub run_migrations: bool,
    pub invoice_scope: SequenceScope,
    /// Seed for the invoice counter; the first issued number is `start + 1`.
    pub invoice_sequence_start: Option<i64>,
    pub reconcile_interval_seconds: u64,
}

impl AppConfig {
    /// Loads configuration from process environment variables.
    ///
    /// Call `dotenv().ok()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set, falling back to the development secret");
                "secret".to_string()
            }
        };

        Ok(Self {
            database_url,
            host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            invoice_scope: parse_or(&lookup, "INVOICE_SEQUENCE_SCOPE", SequenceScope::Global)?,
            invoice_sequence_start: parse_optional(&lookup, "INVOICE_SEQUENCE_START")?,
            reconcile_interval_seconds: parse_or(&lookup, "RECONCILE_INTERVAL_SECONDS", 300)?,
        })
    }
}

fn parse_optional<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    Ok(parse_optional(lookup, name)?.unwrap_or(default))
}
