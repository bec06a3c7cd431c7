// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # handsig configuration
//!
//! Type-safe configuration for the handsig pipeline:
//! - TOML file parsing (`handsig_configuration.toml`)
//! - Environment variable overrides (`HANDSIG_*`)
//! - CLI argument overrides (`section.key = value`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use handsig_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//! println!("Broker: {}:{}", config.broker.host, config.broker.port);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_cli_overrides, apply_environment_overrides, apply_environment_overrides_with,
    find_config_file, load_config, load_defaults, set_value, CONFIG_FILE_NAME, CONFIG_PATH_ENV,
    ENV_OVERRIDES,
};
pub use types::*;
pub use validation::{collect_errors, validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = HandsigConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: HandsigConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
