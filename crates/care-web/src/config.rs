//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Care web server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Connection pool size.
    pub pool_size: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CARE_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:care.db?mode=rwc` |
    /// | `DB_POOL_SIZE` | Connection pool size | `20` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("CARE_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:care.db?mode=rwc".to_string());

        let pool_size = match env::var("DB_POOL_SIZE") {
            Ok(raw) => parse_pool_size(&raw)?,
            Err(_) => database::Database::DEFAULT_POOL_SIZE,
        };

        Ok(Self {
            addr,
            database_url,
            pool_size,
        })
    }
}

fn parse_pool_size(raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ConfigError::InvalidPoolSize(raw.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CARE_ADDR format")]
    InvalidAddr,

    #[error("DB_POOL_SIZE must be a positive integer, got '{0}'")]
    InvalidPoolSize(String),
}
