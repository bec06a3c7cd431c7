// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # handsig-gesture
//!
//! Turns the 21 landmarks of one detected hand into five open/closed digit
//! states, and those states into the five-character [`GestureSymbol`] that
//! is published as the control signal.
//!
//! ```
//! use handsig_gesture::{classify, encode, LandmarkPoint, LandmarkSet};
//!
//! # let points = vec![LandmarkPoint::new(0.5, 0.5); 21];
//! let hand = LandmarkSet::try_from_points(points)?;
//! let symbol = encode(Some(&classify(&hand)));
//! assert_eq!(symbol.as_bytes().len(), 5);
//!
//! // No hand this tick
//! assert_eq!(encode(None).to_string(), "00000");
//! # Ok::<(), handsig_gesture::ClassificationError>(())
//! ```
//!
//! Everything here is pure and allocation-free per tick except the optional
//! [`MajorityFilter`], which keeps a short per-digit history.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod classifier;
pub mod digit;
pub mod encoder;
pub mod error;
pub mod landmarks;
pub mod smoothing;

pub use classifier::{classify, classify_digit, thumb_orientation, ThumbOrientation};
pub use digit::{Digit, DigitState, FingerStates, DIGIT_COUNT};
pub use encoder::{encode, GestureSymbol};
pub use error::{ClassificationError, InvalidWindowError, SymbolParseError};
pub use landmarks::{HandLandmark, LandmarkPoint, LandmarkSet, LANDMARK_COUNT};
pub use smoothing::MajorityFilter;
