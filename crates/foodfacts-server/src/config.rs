//! Configuration management

use std::time::Duration;

use foodfacts_common::env;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost:5432/openfoodfacts";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 1;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Any origin
pub const CORS_ANY_ORIGIN: &str = "*";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Config {
    /// Load `.env`, then the environment over the defaults.
    pub fn load() -> ServerResult<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            cors: CorsConfig::from_env()?,
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.server.port == 0 {
            return Err(ServerError::config("Server port must be greater than 0"));
        }

        self.database.validate()?;

        if self.cors.allowed_origins.is_empty() {
            return Err(ServerError::config(
                "CORS_ALLOWED_ORIGINS must list at least one origin or `*`",
            ));
        }

        if self.cors.allows_any_origin() && self.cors.allow_credentials {
            tracing::warn!("CORS credentials are not sent with wildcard origins; ignoring");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn from_env() -> ServerResult<Self> {
        let port = match env::first_var(&["FOODFACTS_PORT", "PORT"]) {
            Some(raw) => raw.parse().map_err(|e| {
                ServerError::config(format!("Invalid server port '{}': {}", raw, e))
            })?,
            None => DEFAULT_SERVER_PORT,
        };

        Ok(Self {
            host: env::string_or("FOODFACTS_HOST", DEFAULT_SERVER_HOST),
            port,
            shutdown_timeout_secs: env::parse_or(
                "FOODFACTS_SHUTDOWN_TIMEOUT",
                DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            )?,
        })
    }
}

impl DatabaseConfig {
    /// `DATABASE_*` variables over the defaults.
    pub fn from_env() -> ServerResult<Self> {
        Ok(Self {
            url: env::string_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections: env::parse_or(
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
            min_connections: env::parse_or(
                "DATABASE_MIN_CONNECTIONS",
                DEFAULT_DATABASE_MIN_CONNECTIONS,
            )?,
            connect_timeout_secs: env::parse_or(
                "DATABASE_CONNECT_TIMEOUT",
                DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: env::parse_or(
                "DATABASE_IDLE_TIMEOUT",
                DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            )?,
        })
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.url.is_empty() {
            return Err(ServerError::config("Database URL cannot be empty"));
        }

        if self.max_connections == 0 {
            return Err(ServerError::config("Database max_connections must be greater than 0"));
        }

        if self.min_connections > self.max_connections {
            return Err(ServerError::config(format!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
        }
    }
}

impl CorsConfig {
    fn from_env() -> ServerResult<Self> {
        Ok(Self {
            allowed_origins: parse_origins(&env::string_or(
                "CORS_ALLOWED_ORIGINS",
                CORS_ANY_ORIGIN,
            )),
            allow_credentials: env::parse_or("CORS_ALLOW_CREDENTIALS", false)?,
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == CORS_ANY_ORIGIN)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig::default(),
            cors: CorsConfig {
                allowed_origins: vec![CORS_ANY_ORIGIN.to_string()],
                allow_credentials: false,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(config.cors.allows_any_origin());
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_pool_bounds() {
        let mut config = Config::default();
        config.database.min_connections = 20;
        config.database.max_connections = 5;
        assert!(config.validate().is_err());

        config.database.min_connections = 0;
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_origins() {
        let mut config = Config::default();
        config.cors.allowed_origins.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://a.test, http://b.test,,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origins(" ").is_empty());
    }
}
