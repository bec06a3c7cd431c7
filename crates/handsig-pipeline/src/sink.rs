// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-tick rendering and telemetry sinks
//!
//! Sinks are fire-and-forget: the driver never inspects their outcome and
//! publishing does not depend on them.

use handsig_gesture::{FingerStates, GestureSymbol, LandmarkSet, ThumbOrientation};
use tracing::info;

/// Everything the driver knows about one tick
#[derive(Debug, Clone, Copy)]
pub struct FrameReport<'a> {
    pub tick: u64,
    pub symbol: GestureSymbol,
    /// `None` when no hand was detected (or the set was malformed)
    pub states: Option<FingerStates>,
    pub landmarks: Option<&'a LandmarkSet>,
    pub orientation: Option<ThumbOrientation>,
}

impl FrameReport<'_> {
    pub fn hand_present(&self) -> bool {
        self.landmarks.is_some()
    }
}

/// Consumer of per-tick reports (display overlay, telemetry, recording)
pub trait FrameSink {
    fn on_frame(&mut self, report: &FrameReport<'_>);
}

impl<F> FrameSink for F
where
    F: FnMut(&FrameReport<'_>),
{
    fn on_frame(&mut self, report: &FrameReport<'_>) {
        self(report)
    }
}

/// Console output of every offered symbol
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FrameSink for LogSink {
    fn on_frame(&mut self, report: &FrameReport<'_>) {
        if report.hand_present() {
            info!("Sending: {}", report.symbol);
        } else {
            info!("Sending: {} (No hand detected)", report.symbol);
        }
    }
}

/// Discards reports
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn on_frame(&mut self, _report: &FrameReport<'_>) {}
}
