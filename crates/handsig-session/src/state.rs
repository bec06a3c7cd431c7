// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connection state, transition events and session counters
//!
//! While a session worker is running it is the only writer of the state
//! cell. The foreground only reads it, through `PublishSession::state` and
//! the registered observers.

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Connectivity of a publish session
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    /// Terminal: the session has been shut down
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One observed transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub previous: ConnectionState,
    pub now: ConnectionState,
    /// Why the transition happened, when there is something to say
    pub reason: Option<String>,
}

/// Type alias for the state change observer.
pub type StateChangeCallback = Box<dyn Fn(&StateChange) + Send + Sync + 'static>;

/// Snapshot of session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Symbols handed to the transport
    pub published: u64,
    /// Broker acknowledgements received
    pub acknowledged: u64,
    /// Symbols accepted by `publish()` but never handed to the transport,
    /// plus in-flight messages abandoned at shutdown
    pub dropped: u64,
    /// Successful connects after the first one
    pub reconnects: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    published: AtomicU64,
    acknowledged: AtomicU64,
    dropped: AtomicU64,
    reconnects: AtomicU64,
}

impl Counters {
    pub(crate) fn published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn acknowledged(&self) {
        self.acknowledged.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dropped(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn reconnected(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SessionStats {
        SessionStats {
            published: self.published.load(Ordering::Relaxed),
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// State shared between a session handle and its worker
pub(crate) struct SharedState {
    state: RwLock<ConnectionState>,
    /// Bumped on every successful connect; publishes tagged with an older
    /// epoch were overtaken by a disconnect.
    epoch: AtomicU64,
    observers: RwLock<Vec<StateChangeCallback>>,
    pub(crate) counters: Counters,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(ConnectionState::Disconnected),
            epoch: AtomicU64::new(0),
            observers: RwLock::new(Vec::new()),
            counters: Counters::default(),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    pub(crate) fn stats(&self) -> SessionStats {
        self.counters.snapshot()
    }

    pub(crate) fn add_observer(&self, callback: StateChangeCallback) {
        self.observers.write().push(callback);
    }

    /// Move to `now`, notifying observers. Returns false if already there.
    ///
    /// Observers run on the caller's thread and must not register further
    /// observers from inside the callback.
    pub(crate) fn transition(&self, now: ConnectionState, reason: Option<String>) -> bool {
        let previous = {
            let mut state = self.state.write();
            let previous = *state;
            if previous == now {
                return false;
            }
            if now == ConnectionState::Connected {
                self.epoch.fetch_add(1, Ordering::AcqRel);
            }
            *state = now;
            previous
        };

        debug!("[SESSION] {} -> {}", previous, now);
        let change = StateChange {
            previous,
            now,
            reason,
        };
        for observer in self.observers.read().iter() {
            observer(&change);
        }
        true
    }
}
