// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # handsig pipeline
//!
//! The driver loop that turns landmark frames into published gesture
//! symbols:
//!
//! ```text
//! LandmarkSource ─► classify ─► MajorityFilter? ─► encode ─► FrameSink
//!                                                      └────► PublishSession
//! ```
//!
//! The [`PipelineDriver`] owns an injected [`PublishSession`]; connection
//! lifecycle stays explicit (`connect_with_retry` before, `shutdown` after).
//!
//! [`PublishSession`]: handsig_session::PublishSession

pub mod driver;
pub mod error;
pub mod settings;
pub mod sink;
pub mod source;
pub mod startup;

pub use driver::{DriverStats, PipelineDriver, TickOutcome};
pub use error::{CaptureError, PipelineError, Result};
pub use sink::{FrameReport, FrameSink, LogSink, NullSink};
pub use source::{DetectedHand, DetectionThresholds, JsonLinesSource, LandmarkSource};
pub use startup::connect_with_retry;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
