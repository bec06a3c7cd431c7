// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Broker transports
//!
//! A [`BrokerTransport`] is owned by exactly one session worker thread. The
//! worker drives it synchronously: `open` performs the full handshake,
//! `poll` advances network I/O (keepalive pings, acknowledgements) and
//! reports loss of the link as an error.
//!
//! A transport must not reconnect on its own. After `poll` reports
//! `ConnectionLost` it stays closed until the worker calls `open` again.

mod memory;
#[cfg(feature = "mqtt")]
mod mqtt;

pub use memory::{MemoryBroker, MemoryTransport, PublishedMessage};
#[cfg(feature = "mqtt")]
pub use mqtt::MqttTransport;

use crate::config::{ConnectOptions, DeliveryLevel};
use crate::error::TransportError;
use std::time::Duration;

/// Something the broker told us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// One acknowledged publish completed
    Acknowledged,
    /// Keepalive answered
    KeepAlive,
}

/// Seam between the session worker and a concrete broker client
pub trait BrokerTransport: Send {
    /// Short name for log lines
    fn name(&self) -> &'static str;

    /// Connect and block until the broker acknowledges or
    /// `options.connect_timeout` elapses.
    fn open(&mut self, client_id: &str, options: &ConnectOptions) -> Result<(), TransportError>;

    /// Queue one message for delivery. Must not wait for the acknowledgement.
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        level: DeliveryLevel,
    ) -> Result<(), TransportError>;

    /// Drive I/O for up to `timeout`. `Ok(None)` means nothing happened.
    fn poll(&mut self, timeout: Duration) -> Result<Option<TransportEvent>, TransportError>;

    /// Acknowledged publishes still waiting for the broker
    fn in_flight(&self) -> usize;

    fn is_open(&self) -> bool;

    /// Release the link. Idempotent.
    fn close(&mut self);
}
