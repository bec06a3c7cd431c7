// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `handsig_configuration.toml`. Every
//! field has a default, so a file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HandsigConfig {
    pub broker: BrokerConfig,
    pub detection: DetectionConfig,
    pub classifier: ClassifierConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Message broker connection and publish session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
    pub keepalive_secs: u64,
    /// MQTT QoS: 0 at-most-once, 1 at-least-once, 2 exactly-once
    pub qos: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub connection_timeout_ms: u64,
    /// Connection attempts at startup beyond the first (0 = fail fast)
    pub startup_retries: u32,
    pub auto_reconnect: bool,
    /// Reconnect attempts per outage (0 = unbounded)
    pub reconnect_retries: u32,
    pub retry_backoff_ms: u64,
    pub publish_enqueue_timeout_ms: u64,
    pub queue_capacity: usize,
    pub shutdown_grace_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            topic: "OpenCV-IoT6601".to_string(),
            client_id: "handsig-client".to_string(),
            keepalive_secs: 60,
            qos: 1,
            username: None,
            password: None,
            connection_timeout_ms: 5000,
            startup_retries: 0,
            auto_reconnect: true,
            reconnect_retries: 0,
            retry_backoff_ms: 1000,
            publish_enqueue_timeout_ms: 50,
            queue_capacity: 64,
            shutdown_grace_ms: 2000,
        }
    }
}

/// Thresholds handed to the landmark source
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub max_num_hands: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_num_hands: 1,
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Majority-vote window in ticks; 1 keeps classification frame-local
    pub smoothing_window: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tick_interval_ms: u64,
    pub capture_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            capture_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: PathBuf,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            retention_days: 30,
            retention_runs: 10,
        }
    }
}
