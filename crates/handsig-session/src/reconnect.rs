// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Reconnection logic with exponential backoff

use crate::error::ConnectionError;
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound for a single backoff interval
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Reconnection strategy with exponential backoff
#[derive(Debug, Clone)]
pub struct ReconnectionStrategy {
    /// Base backoff in milliseconds
    base_backoff_ms: u64,

    /// Maximum backoff in milliseconds
    max_backoff_ms: u64,

    /// Current attempt number
    current_attempt: u32,

    /// Maximum retry attempts (0 = infinite)
    max_attempts: u32,
}

impl ReconnectionStrategy {
    /// Create a new reconnection strategy
    ///
    /// # Arguments
    /// * `base_backoff_ms` - Initial backoff duration in milliseconds
    /// * `max_attempts` - Maximum retry attempts (0 = infinite)
    pub fn new(base_backoff_ms: u64, max_attempts: u32) -> Self {
        Self {
            base_backoff_ms,
            max_backoff_ms: MAX_BACKOFF_MS,
            current_attempt: 0,
            max_attempts,
        }
    }

    /// Get next backoff duration, or `None` once attempts are used up
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        self.current_attempt = self.current_attempt.saturating_add(1);

        // base * 2^(attempt - 1), capped
        let exp = 2u64.saturating_pow(self.current_attempt - 1);
        let backoff_ms = self
            .base_backoff_ms
            .saturating_mul(exp)
            .min(self.max_backoff_ms);

        Some(Duration::from_millis(backoff_ms))
    }

    /// Reset the strategy (after successful connection)
    pub fn reset(&mut self) {
        self.current_attempt = 0;
    }

    pub fn attempt_number(&self) -> u32 {
        self.current_attempt
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_attempts > 0 && self.current_attempt >= self.max_attempts
    }
}

/// Execute a connection attempt, retrying transient failures with backoff
///
/// Non-retryable errors (invalid configuration, closed session, broker
/// refusal) are returned immediately.
///
/// # Example
/// ```ignore
/// let mut strategy = ReconnectionStrategy::new(1000, 3);
/// retry_with_backoff(|| session.connect(&options), &mut strategy, "broker connection")?;
/// ```
pub fn retry_with_backoff<F, T>(
    mut operation: F,
    strategy: &mut ReconnectionStrategy,
    operation_name: &str,
) -> Result<T, ConnectionError>
where
    F: FnMut() -> Result<T, ConnectionError>,
{
    loop {
        match operation() {
            Ok(result) => {
                if strategy.attempt_number() > 0 {
                    info!(
                        "[RECONNECT] ✓ {} succeeded after {} attempts",
                        operation_name,
                        strategy.attempt_number()
                    );
                }
                strategy.reset();
                return Ok(result);
            }
            Err(e) if e.is_retryable() => {
                if let Some(backoff) = strategy.next_backoff() {
                    warn!(
                        "[RECONNECT] ⚠ {} failed (attempt {}): {} - retrying in {:?}",
                        operation_name,
                        strategy.attempt_number(),
                        e,
                        backoff
                    );
                    std::thread::sleep(backoff);
                } else {
                    warn!(
                        "[RECONNECT] ✗ {} failed after {} attempts - giving up",
                        operation_name,
                        strategy.attempt_number()
                    );
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        }
    }
}
