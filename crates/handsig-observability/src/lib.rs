// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # handsig-observability
//!
//! Logging setup shared by the handsig binary and tests, with per-crate
//! debug flags.
//!
//! ## Features
//! - `file-logging`: JSON log file per run with retention cleanup

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known handsig crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "handsig",
    "handsig-config",
    "handsig-gesture",
    "handsig-pipeline",
    "handsig-session",
];
