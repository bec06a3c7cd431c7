// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process broker
//!
//! [`MemoryBroker`] records every message it receives and can be told to go
//! offline, sever live links, or sit on acknowledgements. Each
//! [`MemoryTransport`] created from it behaves like one client connection.

use super::{BrokerTransport, TransportEvent};
use crate::config::{ConnectOptions, DeliveryLevel};
use crate::error::TransportError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A message as the broker stored it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub client_id: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub level: DeliveryLevel,
}

impl PublishedMessage {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or("<binary>")
    }
}

#[derive(Debug)]
struct BrokerInner {
    online: bool,
    refusal: Option<String>,
    withhold_acks: bool,
    /// Bumped by `drop_connections`; links opened before are dead
    generation: u64,
    connections: u64,
    retain: Option<usize>,
    messages: VecDeque<PublishedMessage>,
}

/// Cloneable handle to an in-process broker
#[derive(Debug, Clone)]
pub struct MemoryBroker {
    inner: Arc<Mutex<BrokerInner>>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BrokerInner {
                online: true,
                refusal: None,
                withhold_acks: false,
                generation: 0,
                connections: 0,
                retain: None,
                messages: VecDeque::new(),
            })),
        }
    }

    /// Keep only the most recent `count` messages
    pub fn with_retention(self, count: usize) -> Self {
        self.inner.lock().retain = Some(count);
        self
    }

    /// New client connection to this broker
    pub fn transport(&self) -> MemoryTransport {
        MemoryTransport {
            broker: self.clone(),
            client_id: String::new(),
            link: None,
            in_flight: 0,
        }
    }

    /// Offline brokers fail every handshake with an I/O error.
    pub fn set_online(&self, online: bool) {
        self.inner.lock().online = online;
    }

    /// Refuse handshakes (e.g. bad credentials) until cleared with `None`
    pub fn set_refusal(&self, reason: Option<String>) {
        self.inner.lock().refusal = reason;
    }

    /// Hold back acknowledgements until called again with `false`
    pub fn set_withhold_acks(&self, withhold: bool) {
        self.inner.lock().withhold_acks = withhold;
    }

    /// Sever every live link, as if the broker restarted
    pub fn drop_connections(&self) {
        self.inner.lock().generation += 1;
    }

    /// Handshakes accepted so far
    pub fn connection_count(&self) -> u64 {
        self.inner.lock().connections
    }

    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.inner.lock().messages.iter().cloned().collect()
    }

    /// Payloads of every stored message, in arrival order
    pub fn payloads(&self) -> Vec<String> {
        self.inner
            .lock()
            .messages
            .iter()
            .map(|m| m.payload_str().to_string())
            .collect()
    }
}

/// One client link to a [`MemoryBroker`]
#[derive(Debug)]
pub struct MemoryTransport {
    broker: MemoryBroker,
    client_id: String,
    link: Option<u64>,
    in_flight: usize,
}

impl MemoryTransport {
    fn check_link(&mut self) -> Result<(), TransportError> {
        let link = self.link.ok_or(TransportError::NotOpen)?;
        if link != self.broker.inner.lock().generation {
            self.link = None;
            self.in_flight = 0;
            return Err(TransportError::ConnectionLost(
                "broker closed the connection".to_string(),
            ));
        }
        Ok(())
    }
}

impl BrokerTransport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn open(&mut self, client_id: &str, _options: &ConnectOptions) -> Result<(), TransportError> {
        let mut inner = self.broker.inner.lock();
        if !inner.online {
            return Err(TransportError::Io("connection refused".to_string()));
        }
        if let Some(reason) = &inner.refusal {
            return Err(TransportError::Refused(reason.clone()));
        }
        inner.connections += 1;
        self.link = Some(inner.generation);
        self.client_id = client_id.to_string();
        self.in_flight = 0;
        Ok(())
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        level: DeliveryLevel,
    ) -> Result<(), TransportError> {
        self.check_link()?;
        let mut inner = self.broker.inner.lock();
        inner.messages.push_back(PublishedMessage {
            client_id: self.client_id.clone(),
            topic: topic.to_string(),
            payload: payload.to_vec(),
            level,
        });
        if let Some(retain) = inner.retain {
            while inner.messages.len() > retain {
                inner.messages.pop_front();
            }
        }
        if level.is_acknowledged() {
            self.in_flight += 1;
        }
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<TransportEvent>, TransportError> {
        self.check_link()?;
        let withhold = self.broker.inner.lock().withhold_acks;
        if self.in_flight > 0 && !withhold {
            self.in_flight -= 1;
            return Ok(Some(TransportEvent::Acknowledged));
        }
        thread::sleep(timeout);
        Ok(None)
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn is_open(&self) -> bool {
        self.link.is_some()
    }

    fn close(&mut self) {
        self.link = None;
        self.in_flight = 0;
    }
}
