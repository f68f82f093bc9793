//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_KEY` - Key the cart blob is stored under (default: `@GoMarketplace`)
//! - `CART_STORAGE_DIR` - Directory for the file-backed store (default: `.marketplace`)
//! - `CART_LOG_PERSIST` - Log every successful write at info level (default: false)

use std::path::PathBuf;

use thiserror::Error;

/// Key the mobile client has always used for the cart blob.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarketplace";

const DEFAULT_STORAGE_DIR: &str = ".marketplace";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Key the serialized cart is persisted under
    pub storage_key: String,
    /// Root directory for [`FileStore`](crate::storage::FileStore)
    pub storage_dir: PathBuf,
    /// Whether successful writes are logged at info rather than debug
    pub log_persist: bool,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            log_persist: false,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage_key = get_env_or_default("CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let storage_dir = PathBuf::from(get_env_or_default("CART_STORAGE_DIR", DEFAULT_STORAGE_DIR));

        let log_persist = get_optional_env("CART_LOG_PERSIST")
            .map(|value| parse_bool(&value))
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_LOG_PERSIST".to_string(), e))?
            .unwrap_or(false);

        Ok(Self {
            storage_key,
            storage_dir,
            log_persist,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean flag.
fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_mobile_key() {
        let config = CartConfig::default();
        assert_eq!(config.storage_key, "@GoMarketplace");
        assert_eq!(config.storage_dir, PathBuf::from(".marketplace"));
        assert!(!config.log_persist);
    }

    #[test]
    fn test_parse_bool_truthy() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_bool(value).unwrap(), "{value}");
        }
    }

    #[test]
    fn test_parse_bool_falsy() {
        for value in ["0", "false", "No", "off", ""] {
            assert!(!parse_bool(value).unwrap(), "{value}");
        }
    }

    #[test]
    fn test_parse_bool_invalid() {
        assert!(parse_bool("maybe").is_err());
    }
}
