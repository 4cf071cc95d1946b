//! Engine configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. The base currency is fixed for the process lifetime: it is
//! a construction-time input to the engine, never a per-request value.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Landed cost engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base currency every cost is normalized into (ISO code).
    pub base_currency: String,

    /// SQLite database file path.
    pub database_path: PathBuf,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let base_currency = env::var("LANDED_BASE_CURRENCY").unwrap_or_else(|_| "EUR".to_string());

        if base_currency.trim().is_empty() {
            return Err(ConfigError::InvalidValue("LANDED_BASE_CURRENCY".to_string()));
        }

        let database_path = env::var("LANDED_DATABASE_PATH")
            .unwrap_or_else(|_| "./landed.db".to_string())
            .into();

        Ok(EngineConfig {
            base_currency,
            database_path,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_currency: "EUR".to_string(),
            database_path: PathBuf::from("./landed.db"),
        }
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
