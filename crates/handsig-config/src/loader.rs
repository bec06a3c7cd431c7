// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones win:
//! 1. TOML file (or built-in defaults when there is none)
//! 2. Environment variables
//! 3. CLI arguments (`section.key` map)

use crate::{ConfigError, ConfigResult, HandsigConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name searched for by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "handsig_configuration.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "HANDSIG_CONFIG_PATH";

/// Environment variables and the `section.key` each one overrides
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HANDSIG_BROKER_HOST", "broker.host"),
    ("HANDSIG_BROKER_PORT", "broker.port"),
    ("HANDSIG_BROKER_TOPIC", "broker.topic"),
    ("HANDSIG_CLIENT_ID", "broker.client_id"),
    ("HANDSIG_BROKER_USERNAME", "broker.username"),
    ("HANDSIG_BROKER_PASSWORD", "broker.password"),
    ("HANDSIG_LOG_LEVEL", "logging.level"),
    ("HANDSIG_TICK_INTERVAL_MS", "pipeline.tick_interval_ms"),
];

/// Find the configuration file
///
/// Search order:
/// 1. `HANDSIG_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI overrides keyed by `section.key`
///
/// # Errors
///
/// Missing file, invalid TOML, or an override that does not parse
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<HandsigConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let config: HandsigConfig = toml::from_str(&content)?;
    finish(config, cli_args)
}

/// Built-in defaults with environment and CLI overrides, for running
/// without a configuration file
pub fn load_defaults(cli_args: Option<&HashMap<String, String>>) -> ConfigResult<HandsigConfig> {
    finish(HandsigConfig::default(), cli_args)
}

fn finish(
    mut config: HandsigConfig,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<HandsigConfig> {
    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }
    Ok(config)
}

/// Apply environment variable overrides listed in [`ENV_OVERRIDES`]
pub fn apply_environment_overrides(config: &mut HandsigConfig) -> ConfigResult<()> {
    apply_environment_overrides_with(config, |name| env::var(name).ok())
}

/// Same as [`apply_environment_overrides`] with a custom variable lookup
pub fn apply_environment_overrides_with<F>(config: &mut HandsigConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    for (variable, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(variable) {
            set_value(config, key, &value)
                .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", variable, e)))?;
        }
    }
    Ok(())
}

/// Apply CLI argument overrides
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - `section.key` to value, e.g. `{"broker.host": "192.168.1.16"}`
pub fn apply_cli_overrides(
    config: &mut HandsigConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    // Sorted so failures are reported deterministically
    let mut keys: Vec<&String> = cli_args.keys().collect();
    keys.sort();
    for key in keys {
        set_value(config, key, &cli_args[key])?;
    }
    Ok(())
}

fn parse<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!("{} = '{}'", key, value))),
    }
}

/// Set one value addressed as `section.key`
pub fn set_value(config: &mut HandsigConfig, key: &str, value: &str) -> ConfigResult<()> {
    let broker = &mut config.broker;
    match key {
        "broker.host" => broker.host = value.to_string(),
        "broker.port" => broker.port = parse(key, value)?,
        "broker.topic" => broker.topic = value.to_string(),
        "broker.client_id" => broker.client_id = value.to_string(),
        "broker.keepalive_secs" => broker.keepalive_secs = parse(key, value)?,
        "broker.qos" => broker.qos = parse(key, value)?,
        "broker.username" => broker.username = Some(value.to_string()),
        "broker.password" => broker.password = Some(value.to_string()),
        "broker.connection_timeout_ms" => broker.connection_timeout_ms = parse(key, value)?,
        "broker.startup_retries" => broker.startup_retries = parse(key, value)?,
        "broker.auto_reconnect" => broker.auto_reconnect = parse_bool(key, value)?,
        "broker.reconnect_retries" => broker.reconnect_retries = parse(key, value)?,
        "broker.retry_backoff_ms" => broker.retry_backoff_ms = parse(key, value)?,
        "broker.publish_enqueue_timeout_ms" => {
            broker.publish_enqueue_timeout_ms = parse(key, value)?
        }
        "broker.queue_capacity" => broker.queue_capacity = parse(key, value)?,
        "broker.shutdown_grace_ms" => broker.shutdown_grace_ms = parse(key, value)?,

        "detection.max_num_hands" => config.detection.max_num_hands = parse(key, value)?,
        "detection.min_detection_confidence" => {
            config.detection.min_detection_confidence = parse(key, value)?
        }
        "detection.min_tracking_confidence" => {
            config.detection.min_tracking_confidence = parse(key, value)?
        }

        "classifier.smoothing_window" => config.classifier.smoothing_window = parse(key, value)?,

        "pipeline.tick_interval_ms" => config.pipeline.tick_interval_ms = parse(key, value)?,
        "pipeline.capture_timeout_ms" => config.pipeline.capture_timeout_ms = parse(key, value)?,

        "logging.level" => config.logging.level = value.to_string(),
        "logging.log_dir" => config.logging.log_dir = PathBuf::from(value),
        "logging.retention_days" => config.logging.retention_days = parse(key, value)?,
        "logging.retention_runs" => config.logging.retention_runs = parse(key, value)?,

        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        env::set_var(CONFIG_PATH_ENV, missing.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_partial_config_keeps_defaults() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[broker]").unwrap();
        writeln!(file, "host = \"192.168.1.16\"").unwrap();
        writeln!(file, "[pipeline]").unwrap();
        writeln!(file, "tick_interval_ms = 50").unwrap();

        let saved: Vec<_> = ENV_OVERRIDES
            .iter()
            .map(|(name, _)| (*name, env::var(name).ok()))
            .collect();
        for (name, _) in ENV_OVERRIDES {
            env::remove_var(name);
        }

        let config = load_config(Some(config_path.as_path()), None);

        for (name, value) in saved {
            if let Some(value) = value {
                env::set_var(name, value);
            }
        }

        let config = config.unwrap();
        assert_eq!(config.broker.host, "192.168.1.16");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.broker.topic, "OpenCV-IoT6601");
        assert_eq!(config.pipeline.tick_interval_ms, 50);
        assert_eq!(config.detection.min_detection_confidence, 0.7);
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[broker\nhost = ").unwrap();

        let result = load_config(Some(config_path.as_path()), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = HandsigConfig::default();
        let vars: HashMap<&str, &str> = [
            ("HANDSIG_BROKER_HOST", "broker.lan"),
            ("HANDSIG_BROKER_PORT", "8883"),
            ("HANDSIG_BROKER_USERNAME", "pi"),
            ("HANDSIG_TICK_INTERVAL_MS", "33"),
        ]
        .into_iter()
        .collect();

        apply_environment_overrides_with(&mut config, |name| {
            vars.get(name).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.broker.host, "broker.lan");
        assert_eq!(config.broker.port, 8883);
        assert_eq!(config.broker.username.as_deref(), Some("pi"));
        assert_eq!(config.pipeline.tick_interval_ms, 33);
    }

    #[test]
    fn test_environment_override_bad_number() {
        let mut config = HandsigConfig::default();
        let result = apply_environment_overrides_with(&mut config, |name| {
            (name == "HANDSIG_BROKER_PORT").then(|| "eighty".to_string())
        });
        let err = result.unwrap_err().to_string();
        assert!(err.contains("HANDSIG_BROKER_PORT"), "{}", err);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = HandsigConfig::default();
        let cli: HashMap<String, String> = [
            ("broker.topic", "lab/hand"),
            ("broker.auto_reconnect", "no"),
            ("classifier.smoothing_window", "3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        apply_cli_overrides(&mut config, &cli).unwrap();
        assert_eq!(config.broker.topic, "lab/hand");
        assert!(!config.broker.auto_reconnect);
        assert_eq!(config.classifier.smoothing_window, 3);
    }

    #[test]
    fn test_unknown_cli_key() {
        let mut config = HandsigConfig::default();
        let cli = HashMap::from([("broker.colour".to_string(), "red".to_string())]);
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli),
            Err(ConfigError::UnknownKey(_))
        ));
    }
}
