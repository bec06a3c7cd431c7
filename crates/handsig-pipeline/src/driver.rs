// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pipeline driver
//!
//! One foreground loop runs capture → classify → (smooth) → encode → sink →
//! publish once per tick. The loop suspends only in the landmark source
//! (bounded by the capture timeout), in `publish()` (bounded by the enqueue
//! timeout) and in the inter-tick throttle.

use crate::error::{PipelineError, Result};
use crate::sink::{FrameReport, FrameSink, LogSink};
use crate::source::LandmarkSource;
use handsig_gesture::{classify, encode, thumb_orientation, GestureSymbol, LandmarkSet, MajorityFilter};
use handsig_session::{
    ConnectionState, DeliveryLevel, PublishError, PublishSession, SessionStats, StateChange,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Longest single sleep of the throttle, so a stop request is noticed quickly
const THROTTLE_SLICE: Duration = Duration::from_millis(50);

/// Result of one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Symbol accepted by the publish session
    Published(GestureSymbol),
    /// Symbol dropped because the session refused it
    Dropped {
        symbol: GestureSymbol,
        error: PublishError,
    },
}

impl TickOutcome {
    pub fn symbol(&self) -> GestureSymbol {
        match self {
            TickOutcome::Published(symbol) | TickOutcome::Dropped { symbol, .. } => *symbol,
        }
    }
}

/// Driver counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub ticks: u64,
    pub hands_seen: u64,
    pub published: u64,
    pub dropped: u64,
    /// Hands reported with an incomplete or non-finite landmark set
    pub classification_defects: u64,
}

/// Owns the per-tick loop and the injected publish session
pub struct PipelineDriver {
    source: Box<dyn LandmarkSource + Send>,
    sink: Box<dyn FrameSink + Send>,
    session: PublishSession,
    smoothing: Option<MajorityFilter>,
    delivery: DeliveryLevel,
    tick_interval: Duration,
    stats: DriverStats,
    publish_failing: bool,
}

impl PipelineDriver {
    /// Create a driver that reports to the console and publishes at the
    /// session's default delivery level.
    pub fn new(
        source: impl LandmarkSource + Send + 'static,
        session: PublishSession,
        tick_interval: Duration,
    ) -> Self {
        let delivery = session.config().default_delivery;
        session.on_state_change(log_state_change);
        Self {
            source: Box::new(source),
            sink: Box::new(LogSink),
            session,
            smoothing: None,
            delivery,
            tick_interval,
            stats: DriverStats::default(),
            publish_failing: false,
        }
    }

    pub fn with_sink(mut self, sink: impl FrameSink + Send + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_smoothing(mut self, filter: Option<MajorityFilter>) -> Self {
        self.smoothing = filter;
        self
    }

    pub fn with_delivery(mut self, level: DeliveryLevel) -> Self {
        self.delivery = level;
        self
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    pub fn session(&self) -> &PublishSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PublishSession {
        &mut self.session
    }

    /// Run one tick.
    ///
    /// Exactly one symbol is offered to the session per tick. Publish and
    /// classification failures stay inside the tick.
    ///
    /// # Errors
    /// Only capture failures, including `CaptureError::EndOfStream`.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let detected = self.source.next_frame_landmarks()?;
        self.stats.ticks += 1;
        let tick = self.stats.ticks;

        let landmarks = detected.and_then(|hand| match LandmarkSet::try_from_points(hand.points) {
            Ok(set) => Some(set),
            Err(e) => {
                self.stats.classification_defects += 1;
                warn!("[PIPELINE] Tick {}: discarding malformed hand: {}", tick, e);
                None
            }
        });
        if landmarks.is_some() {
            self.stats.hands_seen += 1;
        }

        let raw = landmarks.as_ref().map(classify);
        let states = match self.smoothing.as_mut() {
            Some(filter) => filter.apply(raw),
            None => raw,
        };
        let symbol = encode(states.as_ref());

        self.sink.on_frame(&FrameReport {
            tick,
            symbol,
            states,
            landmarks: landmarks.as_ref(),
            orientation: landmarks.as_ref().map(thumb_orientation),
        });

        match self.session.publish(symbol, self.delivery) {
            Ok(()) => {
                self.stats.published += 1;
                if self.publish_failing {
                    info!("[PIPELINE] Publishing resumed at tick {}", tick);
                    self.publish_failing = false;
                }
                Ok(TickOutcome::Published(symbol))
            }
            Err(error) => {
                self.stats.dropped += 1;
                if self.publish_failing {
                    debug!("[PIPELINE] Tick {}: dropped {}: {}", tick, symbol, error);
                } else {
                    warn!("[PIPELINE] Dropping symbols while publishing fails: {}", error);
                    self.publish_failing = true;
                }
                Ok(TickOutcome::Dropped { symbol, error })
            }
        }
    }

    /// Tick until `running` clears or the source ends.
    ///
    /// Ticks start at most once per tick interval. A stop request is
    /// honored between ticks, never in the middle of one.
    ///
    /// # Errors
    /// Capture failures other than end of stream.
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        info!(
            "[PIPELINE] Running (tick interval {:?}, delivery {:?})",
            self.tick_interval, self.delivery
        );
        while running.load(Ordering::SeqCst) {
            let started = Instant::now();
            match self.tick() {
                Ok(_) => {}
                Err(PipelineError::Capture(e)) if e.is_end_of_stream() => {
                    info!("[PIPELINE] Landmark source ended after {} ticks", self.stats.ticks);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
            self.throttle(started, running);
        }
        info!("[PIPELINE] Stop requested after {} ticks", self.stats.ticks);
        Ok(())
    }

    fn throttle(&self, started: Instant, running: &AtomicBool) {
        let deadline = started + self.tick_interval;
        loop {
            let now = Instant::now();
            if now >= deadline || !running.load(Ordering::SeqCst) {
                return;
            }
            thread::sleep((deadline - now).min(THROTTLE_SLICE));
        }
    }

    /// Stop publishing, drain the session and report totals
    pub fn shutdown(mut self) -> (DriverStats, SessionStats) {
        self.session.disconnect();
        let session_stats = self.session.stats();
        info!(
            "[PIPELINE] Shutdown: {} ticks, {} hands, {} published ({} acknowledged), {} dropped",
            self.stats.ticks,
            self.stats.hands_seen,
            self.stats.published,
            session_stats.acknowledged,
            self.stats.dropped + session_stats.dropped
        );
        if self.stats.classification_defects > 0 {
            warn!(
                "[PIPELINE] {} hands had malformed landmark sets",
                self.stats.classification_defects
            );
        }
        (self.stats, session_stats)
    }
}

fn log_state_change(change: &StateChange) {
    let reason = change.reason.as_deref().unwrap_or("");
    match change.now {
        ConnectionState::Connected => info!("[PIPELINE] Broker connected {}", reason),
        ConnectionState::Disconnected if change.previous == ConnectionState::Connected => {
            warn!("[PIPELINE] Broker connection lost {}", reason)
        }
        _ => debug!("[PIPELINE] Session {} -> {}", change.previous, change.now),
    }
}
