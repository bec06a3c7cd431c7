// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Initial broker connection

use handsig_session::{
    retry_with_backoff, ConnectOptions, ConnectionError, PublishSession, ReconnectionStrategy,
};
use tracing::{error, info};

/// Connect `session`, retrying transient failures `retries` times.
///
/// `retries == 0` makes a single attempt, so a broker that is down at
/// startup terminates the process.
pub fn connect_with_retry(
    session: &mut PublishSession,
    options: &ConnectOptions,
    retries: u32,
    backoff_ms: u64,
) -> Result<(), ConnectionError> {
    info!(
        "[PIPELINE] Connecting to broker {} as '{}'",
        options.endpoint,
        session.config().client_id
    );

    let result = if retries == 0 {
        session.connect(options)
    } else {
        let mut strategy = ReconnectionStrategy::new(backoff_ms, retries);
        retry_with_backoff(|| session.connect(options), &mut strategy, "broker connection")
    };

    match &result {
        Ok(()) => info!("[PIPELINE] ✓ Connected to broker {}", options.endpoint),
        Err(e) => error!("[PIPELINE] ✗ Broker connection failed: {}", e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use handsig_session::{BrokerEndpoint, ConnectionState, MemoryBroker, SessionConfig};

    fn session(broker: &MemoryBroker) -> PublishSession {
        PublishSession::new(
            SessionConfig::new("startup-test", "gestures"),
            broker.transport(),
        )
    }

    fn options() -> ConnectOptions {
        ConnectOptions::new(BrokerEndpoint::new("memory", 1883))
    }

    #[test]
    fn test_single_attempt_without_retries() {
        let broker = MemoryBroker::new();
        broker.set_online(false);
        let mut session = session(&broker);

        let err = connect_with_retry(&mut session, &options(), 0, 1).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(broker.connection_count(), 0);
    }

    #[test]
    fn test_retries_until_budget_exhausted() {
        let broker = MemoryBroker::new();
        broker.set_online(false);
        let mut session = session(&broker);

        assert!(connect_with_retry(&mut session, &options(), 2, 1).is_err());
        broker.set_online(true);
        assert!(connect_with_retry(&mut session, &options(), 2, 1).is_ok());
        assert!(session.is_connected());
        session.disconnect();
    }
}
