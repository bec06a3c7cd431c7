// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Publish session handle

use crate::config::{ConnectOptions, DeliveryLevel, SessionConfig};
use crate::error::{ConnectionError, PublishError};
use crate::state::{ConnectionState, SessionStats, SharedState, StateChange};
use crate::transport::BrokerTransport;
use crate::worker::{Command, HandshakeResult, Worker};
use crossbeam::channel::{self, SendTimeoutError, Sender};
use handsig_gesture::GestureSymbol;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

struct WorkerHandle {
    commands: Sender<Command>,
    thread: JoinHandle<Box<dyn BrokerTransport>>,
}

/// Single logical connection to a broker, publishing gesture symbols to one
/// topic.
///
/// The handle is used from the foreground loop. Network I/O, keepalive and
/// reconnect backoff run on a background worker started by
/// [`connect`](Self::connect); `publish` only enqueues.
///
/// # Example
/// ```
/// use handsig_gesture::GestureSymbol;
/// use handsig_session::{BrokerEndpoint, ConnectOptions, MemoryBroker, PublishSession, SessionConfig};
///
/// let broker = MemoryBroker::new();
/// let mut session = PublishSession::new(
///     SessionConfig::new("doc-client", "OpenCV-IoT6601"),
///     broker.transport(),
/// );
/// session.connect(&ConnectOptions::new(BrokerEndpoint::new("localhost", 1883))).unwrap();
/// session.publish_default(GestureSymbol::NO_HAND).unwrap();
/// session.disconnect();
/// assert_eq!(broker.payloads(), vec!["00000"]);
/// ```
pub struct PublishSession {
    config: SessionConfig,
    shared: Arc<SharedState>,
    /// Present while no worker owns it
    transport: Option<Box<dyn BrokerTransport>>,
    worker: Option<WorkerHandle>,
}

impl PublishSession {
    pub fn new(config: SessionConfig, transport: impl BrokerTransport + 'static) -> Self {
        Self {
            config,
            shared: Arc::new(SharedState::new()),
            transport: Some(Box::new(transport)),
            worker: None,
        }
    }

    /// Session over the MQTT transport
    #[cfg(feature = "mqtt")]
    pub fn mqtt(config: SessionConfig) -> Self {
        Self::new(config, crate::transport::MqttTransport::new())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn stats(&self) -> SessionStats {
        self.shared.stats()
    }

    /// Register an observer for connectivity transitions.
    ///
    /// Observers run on the worker thread and are meant for logging and
    /// telemetry.
    pub fn on_state_change<F>(&self, callback: F)
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.shared.add_observer(Box::new(callback));
    }

    /// Connect and start the background worker.
    ///
    /// Blocks until the broker acknowledges the handshake or the connect
    /// timeout elapses. A failed attempt leaves the session `Disconnected`
    /// and may be repeated.
    ///
    /// # Errors
    /// - `InvalidConfig` for a malformed topic, client id or endpoint
    /// - `Handshake` when the broker is unreachable, refuses, or times out
    /// - `AlreadyConnected` while a worker is running (use [`reconnect`](Self::reconnect))
    /// - `Closed` after [`disconnect`](Self::disconnect)
    pub fn connect(&mut self, options: &ConnectOptions) -> Result<(), ConnectionError> {
        if self.state() == ConnectionState::Closed {
            return Err(ConnectionError::Closed);
        }
        if self.worker.is_some() {
            return Err(ConnectionError::AlreadyConnected);
        }
        self.config.validate()?;
        options.validate()?;

        let transport = self
            .transport
            .take()
            .ok_or_else(|| ConnectionError::Worker("transport unavailable".to_string()))?;

        let (commands, receiver) = channel::bounded(self.config.queue_capacity);
        let (ready_tx, ready_rx) = channel::bounded::<HandshakeResult>(1);
        let worker = Worker::new(
            transport,
            self.config.clone(),
            options.clone(),
            Arc::clone(&self.shared),
            receiver,
        );

        let thread = thread::Builder::new()
            .name("handsig-session".to_string())
            .spawn(move || worker.run(ready_tx))
            .map_err(|e| ConnectionError::Worker(format!("failed to spawn worker: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(WorkerHandle { commands, thread });
                Ok(())
            }
            Ok(Err(e)) => {
                self.reclaim(thread);
                Err(e)
            }
            Err(_) => {
                self.reclaim(thread);
                self.shared.transition(
                    ConnectionState::Disconnected,
                    Some("worker exited during handshake".to_string()),
                );
                Err(ConnectionError::Worker(
                    "worker exited during handshake".to_string(),
                ))
            }
        }
    }

    fn reclaim(&mut self, thread: JoinHandle<Box<dyn BrokerTransport>>) {
        match thread.join() {
            Ok(transport) => self.transport = Some(transport),
            Err(_) => error!("[SESSION] Session worker panicked"),
        }
    }

    /// Offer one symbol for delivery at `level`.
    ///
    /// Returns once the symbol is queued for the worker, waiting at most the
    /// configured enqueue timeout. The broker acknowledgement is tracked in
    /// the background.
    ///
    /// # Errors
    /// `NotConnected` unless the session is `Connected` at call time,
    /// `QueueFull` if the worker is backed up, `Closed` after shutdown.
    pub fn publish(&self, symbol: GestureSymbol, level: DeliveryLevel) -> Result<(), PublishError> {
        let state = self.state();
        match state {
            ConnectionState::Connected => {}
            ConnectionState::Closed => return Err(PublishError::Closed),
            other => return Err(PublishError::NotConnected(other)),
        }
        let worker = self.worker.as_ref().ok_or(PublishError::Closed)?;

        let command = Command::Publish {
            symbol,
            level,
            epoch: self.shared.epoch(),
        };
        worker
            .commands
            .send_timeout(command, self.config.enqueue_timeout)
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => PublishError::QueueFull,
                SendTimeoutError::Disconnected(_) => PublishError::Closed,
            })
    }

    /// Publish at the configured default delivery level
    pub fn publish_default(&self, symbol: GestureSymbol) -> Result<(), PublishError> {
        self.publish(symbol, self.config.default_delivery)
    }

    /// Ask the worker for an immediate reconnect attempt.
    ///
    /// Returns as soon as the request is queued; watch [`state`](Self::state)
    /// or an observer for the outcome.
    pub fn reconnect(&self) -> Result<(), ConnectionError> {
        let worker = match (&self.worker, self.state()) {
            (_, ConnectionState::Closed) => return Err(ConnectionError::Closed),
            (Some(worker), _) => worker,
            (None, _) => {
                return Err(ConnectionError::Worker(
                    "session was never connected".to_string(),
                ))
            }
        };
        worker
            .commands
            .send_timeout(Command::Reconnect, self.config.enqueue_timeout)
            .map_err(|_| ConnectionError::Worker("worker not accepting commands".to_string()))
    }

    /// Poll until the session reaches `target` or `timeout` elapses.
    pub fn wait_for_state(&self, target: ConnectionState, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.state() == target {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    /// Shut the session down. Idempotent.
    ///
    /// Symbols already queued are still delivered, outstanding
    /// acknowledgements get up to the shutdown grace period, then the
    /// transport is released and the session is `Closed` for good.
    pub fn disconnect(&mut self) {
        if let Some(worker) = self.worker.take() {
            debug!("[SESSION] Requesting worker shutdown");
            // FIFO: everything queued before this is handled first
            let _ = worker.commands.send(Command::Shutdown);
            self.reclaim(worker.thread);
        }
        if self.state() != ConnectionState::Closed {
            self.shared.transition(
                ConnectionState::Disconnecting,
                Some("shutdown requested".to_string()),
            );
        }
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
        self.shared.transition(
            ConnectionState::Closed,
            Some("session shut down".to_string()),
        );
    }
}

impl Drop for PublishSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerEndpoint;
    use crate::transport::MemoryBroker;

    fn options() -> ConnectOptions {
        ConnectOptions::new(BrokerEndpoint::new("memory", 1883))
    }

    fn session(broker: &MemoryBroker) -> PublishSession {
        PublishSession::new(SessionConfig::new("unit", "hands"), broker.transport())
    }

    #[test]
    fn test_lifecycle() {
        let broker = MemoryBroker::new();
        let mut session = session(&broker);
        assert_eq!(session.state(), ConnectionState::Disconnected);

        session.connect(&options()).unwrap();
        assert!(session.is_connected());
        assert_eq!(session.connect(&options()), Err(ConnectionError::AlreadyConnected));

        session.disconnect();
        assert_eq!(session.state(), ConnectionState::Closed);
        session.disconnect();
        assert_eq!(session.connect(&options()), Err(ConnectionError::Closed));
        assert_eq!(
            session.publish_default(GestureSymbol::NO_HAND),
            Err(PublishError::Closed)
        );
    }

    #[test]
    fn test_invalid_topic_is_fatal() {
        let broker = MemoryBroker::new();
        let mut session =
            PublishSession::new(SessionConfig::new("unit", "hands/#"), broker.transport());
        let err = session.connect(&options()).unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidConfig(_)));
        assert!(!err.is_retryable());
        assert_eq!(broker.connection_count(), 0);
    }

    #[test]
    fn test_failed_connect_can_be_retried() {
        let broker = MemoryBroker::new();
        broker.set_online(false);
        let mut session = session(&broker);

        let err = session.connect(&options()).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(session.state(), ConnectionState::Disconnected);

        broker.set_online(true);
        session.connect(&options()).unwrap();
        assert!(session.is_connected());
    }

    #[test]
    fn test_sub_second_keepalive_rejected_before_worker_starts() {
        let broker = MemoryBroker::new();
        let mut session = session(&broker);

        let err = session
            .connect(&options().with_keepalive_interval(Duration::from_millis(500)))
            .unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidConfig(_)));
        assert!(!err.is_retryable());
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(broker.connection_count(), 0);

        // Transport was never handed to a worker
        session.connect(&options()).unwrap();
        assert!(session.is_connected());
    }

    #[test]
    fn test_reconnect_requires_started_session() {
        let broker = MemoryBroker::new();
        let session = session(&broker);
        assert!(session.reconnect().is_err());
    }
}
