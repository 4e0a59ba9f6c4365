//! Session API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! Without a database URL the server runs on the in-memory store.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use receipt_db::CacheConfig;
use serde::{Deserialize, Serialize};

/// Session API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// Interface to bind
    pub bind_addr: String,

    /// PostgreSQL connection string (`None` selects the in-memory store)
    pub database_url: Option<String>,

    /// Pool size
    pub db_max_connections: u32,

    /// Apply embedded migrations on startup
    pub run_migrations: bool,

    /// Session cache time-to-live in seconds
    pub session_cache_ttl_secs: u64,

    /// Session cache size
    pub session_cache_capacity: usize,

    /// Rate limit window length in seconds (default: 15 minutes)
    pub rate_limit_window_secs: u64,

    /// Requests allowed per client per window
    pub rate_limit_max_requests: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 3000,
            bind_addr: "0.0.0.0".to_string(),
            database_url: None,
            db_max_connections: 10,
            run_migrations: true,
            session_cache_ttl_secs: 300,
            session_cache_capacity: 100,
            rate_limit_window_secs: 900,
            rate_limit_max_requests: 100,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            http_port: parse_or(&get, "HTTP_PORT", defaults.http_port)?,

            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),

            database_url: get("DATABASE_URL").or_else(|| get("POSTGRES_URL")),

            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,

            run_migrations: parse_or(&get, "RUN_MIGRATIONS", defaults.run_migrations)?,

            session_cache_ttl_secs: parse_or(
                &get,
                "SESSION_CACHE_TTL_SECS",
                defaults.session_cache_ttl_secs,
            )?,

            session_cache_capacity: parse_or(
                &get,
                "SESSION_CACHE_CAPACITY",
                defaults.session_cache_capacity,
            )?,

            rate_limit_window_secs: parse_or(
                &get,
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )?,

            rate_limit_max_requests: parse_or(
                &get,
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            )?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.rate_limit_window_secs == 0 {
            return Err(ConfigError::InvalidValue("RATE_LIMIT_WINDOW_SECS".to_string()));
        }
        if config.rate_limit_max_requests == 0 {
            return Err(ConfigError::InvalidValue("RATE_LIMIT_MAX_REQUESTS".to_string()));
        }

        Ok(config)
    }

    /// Address the HTTP listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("BIND_ADDR".to_string()))?;
        Ok(SocketAddr::new(ip, self.http_port))
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.session_cache_ttl_secs),
            capacity: self.session_cache_capacity,
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
        assert_eq!(config.cache_config(), CacheConfig::default());
        assert_eq!(config.rate_limit_window(), Duration::from_secs(900));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HTTP_PORT", "8080"),
            ("BIND_ADDR", "127.0.0.1"),
            ("DATABASE_URL", "postgres://localhost/receipts"),
            ("RUN_MIGRATIONS", "false"),
            ("SESSION_CACHE_CAPACITY", "0"),
            ("RATE_LIMIT_MAX_REQUESTS", "5"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/receipts"));
        assert!(!config.run_migrations);
        assert_eq!(config.session_cache_capacity, 0);
        assert_eq!(config.rate_limit_max_requests, 5);
    }

    #[test]
    fn test_postgres_url_fallback() {
        let config = load(&[("POSTGRES_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://fallback/db"));

        let config = load(&[
            ("DATABASE_URL", "postgres://primary/db"),
            ("POSTGRES_URL", "postgres://fallback/db"),
        ])
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://primary/db"));

        // Blank means unset
        let config = load(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("HTTP_PORT", "http")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for HTTP_PORT");

        assert!(load(&[("RUN_MIGRATIONS", "yes")]).is_err());
        assert!(load(&[("RATE_LIMIT_WINDOW_SECS", "0")]).is_err());
        assert!(load(&[("RATE_LIMIT_MAX_REQUESTS", "0")]).is_err());

        let config = load(&[("BIND_ADDR", "not an address")]).unwrap();
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_ipv6_bind_addr() {
        let config = load(&[("BIND_ADDR", "::"), ("HTTP_PORT", "8080")]).unwrap();
        assert_eq!(config.socket_addr().unwrap().to_string(), "[::]:8080");

        let config = load(&[("BIND_ADDR", "::1")]).unwrap();
        let addr = config.socket_addr().unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 3000);
    }
}
