// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # handsig - hand gesture telemetry
//!
//! Classifies the five fingers of a detected hand as open or closed, encodes
//! them as a 5-character symbol (`"01011"`, Thumb → Pinky) and publishes one
//! symbol per tick to an MQTT topic. No hand means `"00000"`.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! handsig = "0.1"  # Default: MQTT transport
//! ```
//!
//! ## Feature Flags
//!
//! - **`mqtt`** (default): MQTT broker transport (`rumqttc`)
//! - **`file-logging`**: per-run JSON log files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use handsig::prelude::*;
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//!
//! let broker = MemoryBroker::new();
//! let mut session = PublishSession::new(
//!     SessionConfig::new("handsig-client", "OpenCV-IoT6601"),
//!     broker.transport(),
//! );
//! session.connect(&ConnectOptions::new(BrokerEndpoint::new("localhost", 1883)))?;
//!
//! let source = JsonLinesSource::stdin(DetectionThresholds::default(), Duration::from_secs(1));
//! let mut driver = PipelineDriver::new(source, session, Duration::from_millis(100));
//! driver.run(&AtomicBool::new(true))?;
//! driver.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: handsig-config, handsig-observability      │
//! │  (TOML + overrides, logging)                            │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithms: handsig-gesture                            │
//! │  (finger classification, symbol encoding, smoothing)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  I/O: handsig-session                                   │
//! │  (publish session, MQTT / in-memory transports)         │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application: handsig-pipeline                          │
//! │  (landmark source, driver loop, sinks)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use handsig_config as config;
pub use handsig_gesture as gesture;
pub use handsig_observability as observability;
pub use handsig_pipeline as pipeline;
pub use handsig_session as session;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::gesture::{classify, encode, Digit, DigitState, FingerStates, GestureSymbol, LandmarkSet};
    pub use crate::pipeline::{
        connect_with_retry, DetectionThresholds, FrameSink, JsonLinesSource, LandmarkSource,
        PipelineDriver,
    };
    pub use crate::session::{
        BrokerEndpoint, ConnectOptions, ConnectionState, DeliveryLevel, MemoryBroker,
        PublishSession, SessionConfig,
    };

    #[cfg(feature = "mqtt")]
    pub use crate::session::MqttTransport;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        assert_eq!(encode(None), GestureSymbol::NO_HAND);
    }
}
