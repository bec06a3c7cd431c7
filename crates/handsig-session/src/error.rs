// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the publish session

use crate::state::ConnectionState;
use std::time::Duration;

/// Failure reported by a [`BrokerTransport`](crate::transport::BrokerTransport)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Socket/network level failure while talking to the broker
    #[error("I/O error: {0}")]
    Io(String),

    /// No broker acknowledgement within the handshake timeout
    #[error("Handshake timed out after {0:?}")]
    Timeout(Duration),

    /// Broker answered the handshake with a refusal
    #[error("Broker refused connection: {0}")]
    Refused(String),

    /// An established link went away
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Operation requires an open link
    #[error("Transport is not open")]
    NotOpen,

    /// Local client rejected the request (e.g. outgoing buffer full)
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Check if error is transient
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Refused(_))
    }
}

/// Error returned by [`PublishSession::connect`](crate::PublishSession::connect)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Invalid configuration (malformed topic, credentials, limits)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Handshake did not complete
    #[error("Handshake failed: {0}")]
    Handshake(#[from] TransportError),

    /// Session already has a live connection
    #[error("Session already connected")]
    AlreadyConnected,

    /// Session was disconnected and cannot be reused
    #[error("Session is closed")]
    Closed,

    /// Background worker could not be started or died
    #[error("Session worker error: {0}")]
    Worker(String),
}

impl ConnectionError {
    /// Check if error is retryable (for reconnection logic)
    pub fn is_retryable(&self) -> bool {
        match self {
            ConnectionError::Handshake(e) => e.is_retryable(),
            // The transport does not come back from a dead worker
            ConnectionError::InvalidConfig(_)
            | ConnectionError::AlreadyConnected
            | ConnectionError::Closed
            | ConnectionError::Worker(_) => false,
        }
    }
}

/// Error returned by [`PublishSession::publish`](crate::PublishSession::publish)
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// Session was not `Connected` when the call was made
    #[error("Not connected (state: {0})")]
    NotConnected(ConnectionState),

    /// Command queue stayed full for the whole enqueue timeout
    #[error("Publish queue full")]
    QueueFull,

    /// Session has been shut down
    #[error("Session is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ConnectionError::from(TransportError::Io("reset".into())).is_retryable());
        assert!(ConnectionError::from(TransportError::Timeout(Duration::from_secs(1))).is_retryable());
        assert!(!ConnectionError::from(TransportError::Refused("not authorized".into())).is_retryable());
        assert!(!ConnectionError::InvalidConfig("topic".into()).is_retryable());
        assert!(!ConnectionError::Closed.is_retryable());
        assert!(!ConnectionError::Worker("transport unavailable".into()).is_retryable());
    }

    #[test]
    fn test_publish_error_mentions_state() {
        let err = PublishError::NotConnected(ConnectionState::Disconnected);
        assert_eq!(err.to_string(), "Not connected (state: Disconnected)");
    }
}
