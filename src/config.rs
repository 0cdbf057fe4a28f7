//! Environment driven settings. `.env` is loaded by the binaries before
//! [`Config::from_env`] runs.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tasks.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid BIND_ADDR {value:?}: {source}")]
    BindAddr { value: String, source: std::net::AddrParseError },
    #[error("invalid DATABASE_MAX_CONNECTIONS {value:?}: must be a positive integer")]
    MaxConnections { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn in_memory() -> Self { Self { url: "sqlite::memory:".into(), max_connections: 1 } }

    pub fn is_in_memory(&self) -> bool { self.url.starts_with("sqlite::memory:") || self.url.contains("mode=memory") }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database: DatabaseConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| std::env::var(key).ok()) }

    /// Resolves settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = addr.parse::<SocketAddr>().map_err(|source| ConfigError::BindAddr { value: addr.clone(), source })?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(value) => match value.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::MaxConnections { value }),
            },
        };

        Ok(Self { bind_addr, database: DatabaseConfig { url, max_connections } })
    }
}
