// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Conversions from the loaded configuration into component settings

use crate::source::DetectionThresholds;
use handsig_config::HandsigConfig;
use handsig_gesture::{InvalidWindowError, MajorityFilter};
use handsig_session::{
    BrokerEndpoint, ConnectOptions, ConnectionError, Credentials, DeliveryLevel, SessionConfig,
};
use std::time::Duration;

/// Session settings from the `[broker]` section
pub fn session_config(config: &HandsigConfig) -> Result<SessionConfig, ConnectionError> {
    let broker = &config.broker;
    let delivery = DeliveryLevel::from_qos(broker.qos).ok_or_else(|| {
        ConnectionError::InvalidConfig(format!("unsupported QoS level {}", broker.qos))
    })?;

    Ok(SessionConfig::new(broker.client_id.clone(), broker.topic.clone())
        .with_default_delivery(delivery)
        .with_enqueue_timeout(Duration::from_millis(broker.publish_enqueue_timeout_ms))
        .with_queue_capacity(broker.queue_capacity)
        .with_shutdown_grace(Duration::from_millis(broker.shutdown_grace_ms))
        .with_auto_reconnect(broker.auto_reconnect)
        .with_reconnect_retries(broker.reconnect_retries)
        .with_retry_backoff_ms(broker.retry_backoff_ms))
}

/// Endpoint, credentials and timers from the `[broker]` section
pub fn connect_options(config: &HandsigConfig) -> ConnectOptions {
    let broker = &config.broker;
    let mut options = ConnectOptions::new(BrokerEndpoint::new(broker.host.clone(), broker.port))
        .with_keepalive_interval(Duration::from_secs(broker.keepalive_secs))
        .with_connect_timeout(Duration::from_millis(broker.connection_timeout_ms));
    if let Some(username) = &broker.username {
        options = options.with_credentials(Credentials::new(username.clone(), broker.password.clone()));
    }
    options
}

pub fn detection_thresholds(config: &HandsigConfig) -> DetectionThresholds {
    DetectionThresholds {
        max_num_hands: config.detection.max_num_hands,
        min_detection_confidence: config.detection.min_detection_confidence,
        min_tracking_confidence: config.detection.min_tracking_confidence,
    }
}

/// Smoothing stage, `None` for a window of 1 (frame-local classification)
pub fn smoothing_filter(config: &HandsigConfig) -> Result<Option<MajorityFilter>, InvalidWindowError> {
    match config.classifier.smoothing_window {
        1 => Ok(None),
        window => MajorityFilter::new(window).map(Some),
    }
}

pub fn tick_interval(config: &HandsigConfig) -> Duration {
    Duration::from_millis(config.pipeline.tick_interval_ms)
}

pub fn capture_timeout(config: &HandsigConfig) -> Duration {
    Duration::from_millis(config.pipeline.capture_timeout_ms)
}
