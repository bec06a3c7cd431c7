// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the pipeline driver

use handsig_gesture::InvalidWindowError;
use handsig_session::ConnectionError;

/// Landmark source failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// Source has no more frames; the driver stops cleanly
    #[error("Landmark stream ended")]
    EndOfStream,

    /// Source could not be opened
    #[error("Landmark source unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read landmark stream: {0}")]
    Io(String),

    /// A frame that does not decode
    #[error("Malformed frame on line {line}: {message}")]
    Decode { line: usize, message: String },
}

impl CaptureError {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, CaptureError::EndOfStream)
    }
}

/// Errors that stop the driver or prevent it from starting
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Invalid smoothing window: {0}")]
    Smoothing(#[from] InvalidWindowError),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
