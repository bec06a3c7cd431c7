// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every violation is collected before failing so a broken file can be
//! fixed in one pass.

use crate::{ConfigError, ConfigResult, HandsigConfig};

/// Minimum keepalive accepted by the MQTT transport
pub const MIN_KEEPALIVE_SECS: u64 = 5;

/// Largest keepalive an MQTT CONNECT packet can carry
pub const MAX_KEEPALIVE_SECS: u64 = u16::MAX as u64;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

fn invalid(errors: &mut Vec<ConfigValidationError>, field: &str, reason: impl Into<String>) {
    errors.push(ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    });
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &HandsigConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Every violation in `config`, empty when valid
pub fn collect_errors(config: &HandsigConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_broker(config, &mut errors);
    validate_detection(config, &mut errors);
    validate_pipeline(config, &mut errors);
    errors
}

fn validate_broker(config: &HandsigConfig, errors: &mut Vec<ConfigValidationError>) {
    let broker = &config.broker;

    for (field, value) in [
        ("broker.host", &broker.host),
        ("broker.topic", &broker.topic),
        ("broker.client_id", &broker.client_id),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }

    if broker.topic.contains(['+', '#']) {
        invalid(
            errors,
            "broker.topic",
            "wildcards '+' and '#' are not allowed in a publish topic",
        );
    }
    if broker.port == 0 {
        invalid(errors, "broker.port", "must be between 1 and 65535");
    }
    if broker.qos > 2 {
        invalid(errors, "broker.qos", format!("{} is not 0, 1 or 2", broker.qos));
    }
    if broker.keepalive_secs < MIN_KEEPALIVE_SECS {
        invalid(
            errors,
            "broker.keepalive_secs",
            format!("must be at least {}", MIN_KEEPALIVE_SECS),
        );
    }
    if broker.keepalive_secs > MAX_KEEPALIVE_SECS {
        invalid(
            errors,
            "broker.keepalive_secs",
            format!("must be at most {}", MAX_KEEPALIVE_SECS),
        );
    }
    if broker.password.is_some() && broker.username.is_none() {
        invalid(errors, "broker.password", "set without broker.username");
    }
    if broker.connection_timeout_ms == 0 {
        invalid(errors, "broker.connection_timeout_ms", "must be positive");
    }
    if broker.retry_backoff_ms == 0 {
        invalid(errors, "broker.retry_backoff_ms", "must be positive");
    }
    if broker.queue_capacity == 0 {
        invalid(errors, "broker.queue_capacity", "must be at least 1");
    }
    if broker.shutdown_grace_ms == 0 {
        invalid(errors, "broker.shutdown_grace_ms", "must be positive");
    }
}

fn validate_detection(config: &HandsigConfig, errors: &mut Vec<ConfigValidationError>) {
    let detection = &config.detection;
    if detection.max_num_hands == 0 {
        invalid(errors, "detection.max_num_hands", "must be at least 1");
    }
    for (field, value) in [
        ("detection.min_detection_confidence", detection.min_detection_confidence),
        ("detection.min_tracking_confidence", detection.min_tracking_confidence),
    ] {
        if !(0.0..=1.0).contains(&value) {
            invalid(errors, field, format!("{} is outside [0, 1]", value));
        }
    }

    let window = config.classifier.smoothing_window;
    if window == 0 || window % 2 == 0 {
        invalid(
            errors,
            "classifier.smoothing_window",
            format!("{} must be odd and at least 1", window),
        );
    }
}

fn validate_pipeline(config: &HandsigConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.pipeline.tick_interval_ms == 0 {
        invalid(errors, "pipeline.tick_interval_ms", "must be positive");
    }
    if config.pipeline.capture_timeout_ms == 0 {
        invalid(errors, "pipeline.capture_timeout_ms", "must be positive");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(config: &HandsigConfig) -> Vec<String> {
        collect_errors(config)
            .into_iter()
            .map(|e| match e {
                ConfigValidationError::MissingRequired { field } => field,
                ConfigValidationError::InvalidValue { field, .. } => field,
            })
            .collect()
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&HandsigConfig::default()).is_ok());
    }

    #[test]
    fn test_all_violations_reported() {
        let mut config = HandsigConfig::default();
        config.broker.host = String::new();
        config.broker.topic = "hands/#".to_string();
        config.broker.qos = 3;
        config.broker.password = Some("secret".to_string());
        config.detection.min_detection_confidence = 1.5;
        config.classifier.smoothing_window = 4;
        config.pipeline.tick_interval_ms = 0;

        assert_eq!(
            fields(&config),
            vec![
                "broker.host",
                "broker.topic",
                "broker.qos",
                "broker.password",
                "detection.min_detection_confidence",
                "classifier.smoothing_window",
                "pipeline.tick_interval_ms",
            ]
        );

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("broker.qos"));
        assert!(message.contains("pipeline.tick_interval_ms"));
    }

    #[test]
    fn test_keepalive_floor() {
        let mut config = HandsigConfig::default();
        config.broker.keepalive_secs = 4;
        assert_eq!(fields(&config), vec!["broker.keepalive_secs"]);
    }

    #[test]
    fn test_keepalive_ceiling() {
        let mut config = HandsigConfig::default();
        config.broker.keepalive_secs = MAX_KEEPALIVE_SECS;
        assert!(validate_config(&config).is_ok());

        config.broker.keepalive_secs = 70_000;
        assert_eq!(fields(&config), vec!["broker.keepalive_secs"]);
        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("65535"));
    }

    #[test]
    fn test_credentials_pairing() {
        let mut config = HandsigConfig::default();
        config.broker.username = Some("pi".to_string());
        assert!(validate_config(&config).is_ok());
        config.broker.password = Some("secret".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
