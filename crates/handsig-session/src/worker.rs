// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Background worker owning the broker transport
//!
//! The worker is the only code that touches the transport or writes the
//! connection state. It consumes a bounded FIFO of commands, so publishes
//! reach the broker in the order they were offered.

use crate::config::{ConnectOptions, DeliveryLevel, SessionConfig};
use crate::error::{ConnectionError, TransportError};
use crate::reconnect::ReconnectionStrategy;
use crate::state::{ConnectionState, SharedState};
use crate::transport::{BrokerTransport, TransportEvent};
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};
use handsig_gesture::GestureSymbol;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Longest the worker waits for a command before servicing the transport
const COMMAND_WAIT: Duration = Duration::from_millis(10);

/// First transport poll of a turn may block this long
const POLL_SLICE: Duration = Duration::from_millis(5);

/// Cap on transport events handled per turn so commands are not starved
const MAX_EVENTS_PER_TURN: usize = 32;

pub(crate) enum Command {
    Publish {
        symbol: GestureSymbol,
        level: DeliveryLevel,
        /// Connection epoch observed by the caller
        epoch: u64,
    },
    Reconnect,
    Shutdown,
}

pub(crate) type HandshakeResult = Result<(), ConnectionError>;

pub(crate) struct Worker {
    transport: Box<dyn BrokerTransport>,
    config: SessionConfig,
    options: ConnectOptions,
    shared: Arc<SharedState>,
    commands: Receiver<Command>,
    strategy: ReconnectionStrategy,
    /// Next automatic reconnect attempt, if one is scheduled
    next_attempt: Option<Instant>,
    connected: bool,
}

impl Worker {
    pub(crate) fn new(
        transport: Box<dyn BrokerTransport>,
        config: SessionConfig,
        options: ConnectOptions,
        shared: Arc<SharedState>,
        commands: Receiver<Command>,
    ) -> Self {
        let strategy = ReconnectionStrategy::new(config.retry_backoff_ms, config.reconnect_retries);
        Self {
            transport,
            config,
            options,
            shared,
            commands,
            strategy,
            next_attempt: None,
            connected: false,
        }
    }

    /// Thread body. Reports the initial handshake through `ready`, then
    /// serves commands until shutdown. Hands the transport back on exit.
    pub(crate) fn run(mut self, ready: Sender<HandshakeResult>) -> Box<dyn BrokerTransport> {
        info!(
            "[SESSION] Connecting to {} as '{}' ({} transport)",
            self.options.endpoint,
            self.config.client_id,
            self.transport.name()
        );

        if let Err(e) = self.open() {
            warn!("[SESSION] ✗ Connection to {} failed: {}", self.options.endpoint, e);
            let _ = ready.send(Err(ConnectionError::Handshake(e)));
            return self.transport;
        }
        info!(
            "[SESSION] ✓ Connected to {} (topic '{}')",
            self.options.endpoint, self.config.topic
        );
        let _ = ready.send(Ok(()));

        loop {
            match self.commands.recv_timeout(COMMAND_WAIT) {
                Ok(Command::Publish {
                    symbol,
                    level,
                    epoch,
                }) => self.publish(symbol, level, epoch),
                Ok(Command::Reconnect) => self.reconnect_now(),
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.service_transport();
            self.maybe_auto_reconnect();
        }

        self.shutdown();
        self.transport
    }

    fn open(&mut self) -> Result<(), TransportError> {
        self.shared.transition(ConnectionState::Connecting, None);
        match self.transport.open(&self.config.client_id, &self.options) {
            Ok(()) => {
                self.connected = true;
                self.shared.transition(
                    ConnectionState::Connected,
                    Some("broker acknowledged handshake".to_string()),
                );
                Ok(())
            }
            Err(e) => {
                self.connected = false;
                self.shared
                    .transition(ConnectionState::Disconnected, Some(e.to_string()));
                Err(e)
            }
        }
    }

    fn publish(&mut self, symbol: GestureSymbol, level: DeliveryLevel, epoch: u64) {
        if !self.connected || epoch != self.shared.epoch() {
            debug!("[SESSION] Dropping {} queued before a disconnect", symbol);
            self.shared.counters.dropped(1);
            return;
        }

        match self
            .transport
            .publish(&self.config.topic, symbol.as_bytes(), level)
        {
            Ok(()) => {
                trace!("[SESSION] Published {} at {:?}", symbol, level);
                self.shared.counters.published();
            }
            Err(TransportError::ConnectionLost(reason)) => {
                self.shared.counters.dropped(1);
                self.link_lost(reason);
            }
            Err(TransportError::NotOpen) => {
                self.shared.counters.dropped(1);
                self.link_lost("transport closed".to_string());
            }
            Err(e) => {
                self.shared.counters.dropped(1);
                warn!("[SESSION] ⚠ Publish of {} failed: {}", symbol, e);
            }
        }
    }

    fn service_transport(&mut self) {
        if !self.connected {
            return;
        }
        for turn in 0..MAX_EVENTS_PER_TURN {
            let timeout = if turn == 0 { POLL_SLICE } else { Duration::ZERO };
            match self.transport.poll(timeout) {
                Ok(Some(TransportEvent::Acknowledged)) => self.shared.counters.acknowledged(),
                Ok(Some(TransportEvent::KeepAlive)) => trace!("[SESSION] Keepalive answered"),
                Ok(None) => break,
                Err(e) => {
                    self.link_lost(e.to_string());
                    break;
                }
            }
        }
    }

    fn link_lost(&mut self, reason: String) {
        self.transport.close();
        self.connected = false;
        warn!("[SESSION] ⚠ Connection to {} lost: {}", self.options.endpoint, reason);
        self.shared
            .transition(ConnectionState::Disconnected, Some(reason));

        if self.config.auto_reconnect {
            self.strategy.reset();
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(&mut self) {
        match self.strategy.next_backoff() {
            Some(backoff) => {
                info!(
                    "[RECONNECT] Attempt {} in {:?}",
                    self.strategy.attempt_number(),
                    backoff
                );
                self.next_attempt = Some(Instant::now() + backoff);
            }
            None => {
                warn!(
                    "[RECONNECT] ✗ Giving up after {} attempts",
                    self.strategy.attempt_number()
                );
                self.next_attempt = None;
            }
        }
    }

    fn maybe_auto_reconnect(&mut self) {
        let due = matches!(self.next_attempt, Some(at) if Instant::now() >= at);
        if !due || self.connected {
            return;
        }
        self.next_attempt = None;
        self.attempt_reconnect();
    }

    fn reconnect_now(&mut self) {
        if self.connected {
            debug!("[RECONNECT] Already connected, ignoring reconnect request");
            return;
        }
        self.strategy.reset();
        self.next_attempt = None;
        self.attempt_reconnect();
    }

    fn attempt_reconnect(&mut self) {
        match self.open() {
            Ok(()) => {
                info!(
                    "[RECONNECT] ✓ Reconnected to {} after {} attempts",
                    self.options.endpoint,
                    self.strategy.attempt_number().max(1)
                );
                self.shared.counters.reconnected();
                self.strategy.reset();
            }
            Err(e) if e.is_retryable() && self.config.auto_reconnect => {
                warn!("[RECONNECT] ⚠ Reconnect failed: {}", e);
                self.schedule_reconnect();
            }
            Err(e) => warn!("[RECONNECT] ✗ Reconnect failed: {}", e),
        }
    }

    /// Stop accepting work, wait up to the grace period for outstanding
    /// acknowledgements, then release the transport.
    fn shutdown(&mut self) {
        self.shared.transition(
            ConnectionState::Disconnecting,
            Some("shutdown requested".to_string()),
        );

        // Anything still queued was offered after the shutdown request
        let late = self
            .commands
            .try_iter()
            .filter(|c| matches!(c, Command::Publish { .. }))
            .count();
        if late > 0 {
            self.shared.counters.dropped(late as u64);
        }

        let deadline = Instant::now() + self.config.shutdown_grace;
        while self.connected && self.transport.in_flight() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.transport.poll(remaining.min(POLL_SLICE)) {
                Ok(Some(TransportEvent::Acknowledged)) => self.shared.counters.acknowledged(),
                Ok(_) => {}
                Err(e) => {
                    debug!("[SESSION] Link lost while draining: {}", e);
                    self.connected = false;
                }
            }
        }

        let abandoned = self.transport.in_flight();
        if self.connected && abandoned > 0 {
            warn!(
                "[SESSION] ⚠ Abandoning {} unacknowledged publishes after {:?}",
                abandoned, self.config.shutdown_grace
            );
            self.shared.counters.dropped(abandoned as u64);
        }

        self.transport.close();
        self.connected = false;
        self.shared
            .transition(ConnectionState::Closed, Some("session shut down".to_string()));
        info!("[SESSION] Session closed");
    }
}
