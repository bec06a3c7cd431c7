// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for gesture classification and encoding

use crate::landmarks::{HandLandmark, LANDMARK_COUNT};

/// A landmark set could not be classified.
///
/// This only happens when the landmark detector breaks its contract of
/// reporting complete, finite hands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassificationError {
    #[error("Incomplete landmark set: expected {} points, found {found}", LANDMARK_COUNT)]
    IncompleteLandmarkSet { found: usize },

    #[error("Non-finite coordinate at landmark {landmark:?}")]
    NonFiniteCoordinate { landmark: HandLandmark },
}

/// A payload is not a valid gesture symbol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid gesture symbol {0:?}: expected exactly 5 characters of '0' or '1'")]
pub struct SymbolParseError(pub String);

/// Smoothing window size is unusable for a majority vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Smoothing window must be odd and at least 1, got {0}")]
pub struct InvalidWindowError(pub usize);
