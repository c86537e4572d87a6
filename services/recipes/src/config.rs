//! Service configuration loaded from the environment

use std::path::PathBuf;

use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Upload ceiling for a single image (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Which backend holds the recipes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-lifetime list, lost on restart
    Memory,
    /// PostgreSQL through `common::database`
    Postgres,
}

/// Recipe service configuration
///
/// # Environment Variables
/// - `RECIPES_PORT`: listening port (default: 3001)
/// - `RECIPES_STORAGE`: `memory` or `postgres` (default: memory)
/// - `RECIPES_UPLOAD_DIR`: managed image directory (default: public/images)
/// - `RECIPES_MAX_UPLOAD_BYTES`: image size ceiling (default: 5 MiB)
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub storage: StorageBackend,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Build the configuration from defaults overlaid with `RECIPES_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("port", 3001)?
            .set_default("storage", "memory")?
            .set_default("upload_dir", "public/images")?
            .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as u64)?
            .add_source(Environment::with_prefix("RECIPES").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = [
        "RECIPES_PORT",
        "RECIPES_STORAGE",
        "RECIPES_UPLOAD_DIR",
        "RECIPES_MAX_UPLOAD_BYTES",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.upload_dir, PathBuf::from("public/images"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    #[serial]
    fn test_config_from_env_with_custom_values() {
        clear_env();
        unsafe {
            std::env::set_var("RECIPES_PORT", "8080");
            std::env::set_var("RECIPES_STORAGE", "postgres");
            std::env::set_var("RECIPES_UPLOAD_DIR", "/var/lib/recipes/images");
            std::env::set_var("RECIPES_MAX_UPLOAD_BYTES", "1024");
        }

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.upload_dir, PathBuf::from("/var/lib/recipes/images"));
        assert_eq!(config.max_upload_bytes, 1024);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_rejects_unknown_backend() {
        clear_env();
        unsafe {
            std::env::set_var("RECIPES_STORAGE", "mongodb");
        }

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }
}
