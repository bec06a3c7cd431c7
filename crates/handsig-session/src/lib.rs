// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # handsig-session
//!
//! Broker publish session for gesture symbols.
//!
//! A [`PublishSession`] keeps one logical connection to a message broker and
//! delivers [`GestureSymbol`](handsig_gesture::GestureSymbol) payloads to a
//! single topic:
//!
//! ```text
//! Disconnected ──connect──> Connecting ──ack──> Connected
//!      ^                        │                   │
//!      └────────failure─────────┘<──link lost───────┘
//!
//! any state ──disconnect──> Disconnecting ──drain/grace──> Closed
//! ```
//!
//! ## Features
//! - `mqtt` (default): [`MqttTransport`] over `rumqttc`
//!
//! [`MemoryBroker`] provides an in-process broker for dry runs and tests.

pub mod config;
pub mod error;
pub mod reconnect;
pub mod session;
pub mod state;
pub mod transport;
mod worker;

pub use config::{
    BrokerEndpoint, ConnectOptions, Credentials, DeliveryLevel, SessionConfig, MAX_KEEPALIVE_SECS,
};
pub use error::{ConnectionError, PublishError, TransportError};
pub use reconnect::{retry_with_backoff, ReconnectionStrategy};
pub use session::PublishSession;
pub use state::{ConnectionState, SessionStats, StateChange, StateChangeCallback};
#[cfg(feature = "mqtt")]
pub use transport::MqttTransport;
pub use transport::{BrokerTransport, MemoryBroker, MemoryTransport, PublishedMessage, TransportEvent};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
