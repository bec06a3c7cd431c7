// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connection parameters and session configuration

use crate::error::ConnectionError;
use std::fmt;
use std::time::Duration;

/// Largest keepalive an MQTT CONNECT packet can carry, in seconds
pub const MAX_KEEPALIVE_SECS: u64 = u16::MAX as u64;

/// Acknowledgement strength requested for a publish (MQTT QoS 0/1/2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeliveryLevel {
    /// Fire and forget (QoS 0)
    AtMostOnce,
    /// Broker acknowledges every message (QoS 1)
    #[default]
    AtLeastOnce,
    /// Four-step handshake (QoS 2)
    ExactlyOnce,
}

impl DeliveryLevel {
    /// Map an MQTT QoS number. Returns `None` for anything above 2.
    pub fn from_qos(qos: u8) -> Option<Self> {
        match qos {
            0 => Some(DeliveryLevel::AtMostOnce),
            1 => Some(DeliveryLevel::AtLeastOnce),
            2 => Some(DeliveryLevel::ExactlyOnce),
            _ => None,
        }
    }

    pub fn qos(self) -> u8 {
        match self {
            DeliveryLevel::AtMostOnce => 0,
            DeliveryLevel::AtLeastOnce => 1,
            DeliveryLevel::ExactlyOnce => 2,
        }
    }

    /// Whether the broker sends an acknowledgement back
    pub fn is_acknowledged(self) -> bool {
        self != DeliveryLevel::AtMostOnce
    }
}

/// Broker network address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

impl BrokerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Broker login
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

// Keep passwords out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Arguments of a single connect attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub endpoint: BrokerEndpoint,
    pub credentials: Option<Credentials>,
    /// Interval between keepalive pings while idle
    pub keepalive_interval: Duration,
    /// How long to wait for the broker's handshake acknowledgement
    pub connect_timeout: Duration,
}

impl ConnectOptions {
    pub fn new(endpoint: BrokerEndpoint) -> Self {
        Self {
            endpoint,
            credentials: None,
            keepalive_interval: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Validate before handing to a transport
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.endpoint.host.trim().is_empty() {
            return Err(ConnectionError::InvalidConfig(
                "broker host cannot be empty".to_string(),
            ));
        }
        if self.endpoint.port == 0 {
            return Err(ConnectionError::InvalidConfig(
                "broker port cannot be 0".to_string(),
            ));
        }
        if let Some(credentials) = &self.credentials {
            if credentials.username.is_empty() {
                return Err(ConnectionError::InvalidConfig(
                    "credentials require a username".to_string(),
                ));
            }
        }
        if self.connect_timeout.is_zero() {
            return Err(ConnectionError::InvalidConfig(
                "connect timeout must be positive".to_string(),
            ));
        }
        // Sent as whole seconds in a u16; zero disables pings
        let keepalive = self.keepalive_interval;
        if !keepalive.is_zero() && keepalive < Duration::from_secs(1) {
            return Err(ConnectionError::InvalidConfig(format!(
                "keepalive interval {:?} is below 1s",
                keepalive
            )));
        }
        if keepalive.as_secs() > MAX_KEEPALIVE_SECS {
            return Err(ConnectionError::InvalidConfig(format!(
                "keepalive interval {}s exceeds {}s",
                keepalive.as_secs(),
                MAX_KEEPALIVE_SECS
            )));
        }
        Ok(())
    }
}

/// Publish session configuration builder
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Client identifier presented to the broker
    pub client_id: String,

    /// Topic every symbol is published to
    pub topic: String,

    /// Level used by [`PublishSession::publish_default`](crate::PublishSession::publish_default)
    pub default_delivery: DeliveryLevel,

    /// Longest `publish()` waits for room in the command queue
    pub enqueue_timeout: Duration,

    /// Command queue capacity
    pub queue_capacity: usize,

    /// How long shutdown waits for in-flight acknowledgements
    pub shutdown_grace: Duration,

    /// Let the worker reconnect on its own after a lost link
    pub auto_reconnect: bool,

    /// Reconnect attempts per outage (0 = infinite)
    pub reconnect_retries: u32,

    /// Retry backoff base in milliseconds
    pub retry_backoff_ms: u64,
}

impl SessionConfig {
    pub fn new(client_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            topic: topic.into(),
            default_delivery: DeliveryLevel::AtLeastOnce,
            enqueue_timeout: Duration::from_millis(50),
            queue_capacity: 64,
            shutdown_grace: Duration::from_secs(2),
            auto_reconnect: true,
            reconnect_retries: 0,
            retry_backoff_ms: 1000,
        }
    }

    pub fn with_default_delivery(mut self, level: DeliveryLevel) -> Self {
        self.default_delivery = level;
        self
    }

    pub fn with_enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = timeout;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn with_reconnect_retries(mut self, retries: u32) -> Self {
        self.reconnect_retries = retries;
        self
    }

    pub fn with_retry_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.retry_backoff_ms = backoff_ms;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.client_id.is_empty() {
            return Err(ConnectionError::InvalidConfig(
                "client_id cannot be empty".to_string(),
            ));
        }
        if self.topic.is_empty() {
            return Err(ConnectionError::InvalidConfig(
                "topic cannot be empty".to_string(),
            ));
        }
        if self.topic.contains(['+', '#']) {
            return Err(ConnectionError::InvalidConfig(format!(
                "publish topic '{}' must not contain wildcards",
                self.topic
            )));
        }
        if self.queue_capacity == 0 {
            return Err(ConnectionError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.retry_backoff_ms == 0 {
            return Err(ConnectionError::InvalidConfig(
                "retry_backoff_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
