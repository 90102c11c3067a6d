//! API configuration
//!
//! Read from `API_*` environment variables. Nested sections use a double
//! underscore, so `API_DATABASE__URL` sets `database.url` and
//! `API_ENGINE__DEFAULT_SLA_HOURS` sets `engine.default_sla_hours`.

use serde::Deserialize;

use domain_reconciliation::EngineConfig;
use infra_db::DatabaseConfig;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            database: DatabaseConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("API")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
