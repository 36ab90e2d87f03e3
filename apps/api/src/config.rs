//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use shelf_core::StockPolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Signing secret used when `JWT_SECRET` is unset. Development only.
pub const DEV_JWT_SECRET: &str = "shelf-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind
    pub http_host: String,

    /// HTTP port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// How long a writer waits on the SQLite lock
    pub db_busy_timeout: Duration,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// What checkout does with short stock
    pub stock_policy: StockPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_host: "0.0.0.0".to_string(),
            http_port: 8000,
            database_path: "shelf.db".to_string(),
            db_max_connections: 5,
            db_busy_timeout: Duration::from_millis(5000),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_access_lifetime_secs: 86_400, // 1 day
            stock_policy: StockPolicy::Strict,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            http_host: lookup("HTTP_HOST").unwrap_or(defaults.http_host),
            http_port: parse_or(&lookup, "HTTP_PORT", defaults.http_port)?,
            database_path: lookup("DATABASE_PATH").unwrap_or(defaults.database_path),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_busy_timeout: Duration::from_millis(parse_or(
                &lookup,
                "DB_BUSY_TIMEOUT_MS",
                defaults.db_busy_timeout.as_millis() as u64,
            )?),
            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_access_lifetime_secs: parse_or(
                &lookup,
                "JWT_ACCESS_LIFETIME_SECS",
                defaults.jwt_access_lifetime_secs,
            )?,
            stock_policy: parse_or(&lookup, "STOCK_POLICY", defaults.stock_policy)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()));
        }
        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        Ok(config)
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Whether tokens are signed with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
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

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.database_path, "shelf.db");
        assert_eq!(config.stock_policy, StockPolicy::Strict);
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("HTTP_PORT", "9000"),
            ("STOCK_POLICY", "best_effort"),
            ("DB_BUSY_TIMEOUT_MS", "250"),
            ("JWT_SECRET", "prod"),
        ]))
        .unwrap();

        assert_eq!(config.http_port, 9000);
        assert_eq!(config.stock_policy, StockPolicy::BestEffort);
        assert_eq!(config.db_busy_timeout, Duration::from_millis(250));
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_bad_values() {
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("HTTP_PORT", "eighty")])),
            Err(ConfigError::InvalidValue(key)) if key == "HTTP_PORT"
        ));
        assert!(ApiConfig::from_lookup(lookup(&[("STOCK_POLICY", "lenient")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "0")])).is_err());
    }
}
