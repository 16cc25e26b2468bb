//! Server configuration.
//!
//! Values are layered, later sources winning:
//!
//! ```text
//! built-in defaults  →  ./rxpos.toml (optional)  →  RXPOS_* environment
//! ```
//!
//! | Key               | Env                     | Default        |
//! |-------------------|-------------------------|----------------|
//! | `host`            | `RXPOS_HOST`            | `0.0.0.0`      |
//! | `port`            | `RXPOS_PORT`            | `3001`         |
//! | `database_path`   | `RXPOS_DATABASE_PATH`   | `./rxpos.db`   |
//! | `log_level`       | `RXPOS_LOG_LEVEL`       | `info`         |
//! | `max_connections` | `RXPOS_MAX_CONNECTIONS` | `5`            |
//! | `cors_origin`     | `RXPOS_CORS_ORIGIN`     | any origin     |
//!
//! `database_path = ":memory:"` runs against a throwaway in-memory database.

use axum::http::HeaderValue;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use rxpos_db::DbConfig;
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory (`rxpos.toml`).
const CONFIG_FILE: &str = "rxpos";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Default tracing filter when `RUST_LOG` is not set
    pub log_level: String,

    /// Pool size
    pub max_connections: u32,

    /// Allowed CORS origin; any origin when unset or `*`
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl ServerConfig {
    /// Loads configuration from defaults, `rxpos.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("RXPOS").try_parsing(true));

        Self::from_builder(builder)
    }

    /// Builder preloaded with the default values.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3001)?
            .set_default("database_path", "./rxpos.db")?
            .set_default("log_level", "info")?
            .set_default("max_connections", 5)?)
    }

    /// Builds and validates a configuration from any set of sources.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        if let Some(origin) = self.cors_origin() {
            HeaderValue::from_str(origin)
                .map_err(|_| ConfigError::InvalidValue("cors_origin".to_string()))?;
        }
        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The single allowed origin, or `None` for any origin.
    pub fn cors_origin(&self) -> Option<&str> {
        self.cors_origin
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty() && *o != "*")
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        if self.database_path == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database_path).max_connections(self.max_connections)
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<ServerConfig, ConfigError> {
        ServerConfig::from_builder(
            ServerConfig::defaults()
                .unwrap()
                .add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3001");
        assert_eq!(config.database_path, "./rxpos.db");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.cors_origin(), None);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = from_toml(
            r#"
            port = 8080
            database_path = ":memory:"
            cors_origin = "http://localhost:5173"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.db_config().is_in_memory());
        assert_eq!(config.cors_origin(), Some("http://localhost:5173"));
    }

    #[test]
    fn test_wildcard_origin_means_any() {
        let config = from_toml(r#"cors_origin = "*""#).unwrap();
        assert_eq!(config.cors_origin(), None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            from_toml("port = 0"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            from_toml("max_connections = 0"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            from_toml(r#"database_path = "  ""#),
            Err(ConfigError::MissingRequired(_))
        ));
        assert!(from_toml(r#"port = "not-a-port""#).is_err());
    }
}
