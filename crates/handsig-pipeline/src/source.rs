// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Landmark sources
//!
//! Hand detection itself runs outside this crate. A [`LandmarkSource`]
//! hands the driver at most one detected hand per tick.
//!
//! [`JsonLinesSource`] consumes the output of an external detector as one
//! JSON document per frame:
//!
//! ```text
//! {"hands": [{"landmarks": [{"x": 0.41, "y": 0.88, "z": 0.0}, ...], "score": 0.93}]}
//! {"hands": []}
//! ```
//!
//! `score` (detection confidence), `tracking_score` and `handedness` are
//! optional; missing scores always pass the thresholds.

use crate::error::CaptureError;
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use handsig_gesture::LandmarkPoint;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// One hand as reported by the detector, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedHand {
    #[serde(rename = "landmarks")]
    pub points: Vec<LandmarkPoint>,
    #[serde(default, alias = "detection_score")]
    pub score: Option<f32>,
    #[serde(default)]
    pub tracking_score: Option<f32>,
    #[serde(default)]
    pub handedness: Option<String>,
}

impl DetectedHand {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self {
            points,
            score: None,
            tracking_score: None,
            handedness: None,
        }
    }
}

/// Provider of per-tick hand landmarks
pub trait LandmarkSource {
    /// Landmarks for the current frame, `Ok(None)` when no hand is present.
    ///
    /// May block up to the source's capture timeout.
    ///
    /// # Errors
    /// `EndOfStream` when the source is exhausted; anything else means the
    /// capture device failed.
    fn next_frame_landmarks(&mut self) -> Result<Option<DetectedHand>, CaptureError>;
}

/// Confidence limits applied to detected hands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThresholds {
    /// Hands considered per frame, in detector order
    pub max_num_hands: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            max_num_hands: 1,
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.5,
        }
    }
}

impl DetectionThresholds {
    pub fn accepts(&self, hand: &DetectedHand) -> bool {
        hand.score.map_or(true, |s| s >= self.min_detection_confidence)
            && hand
                .tracking_score
                .map_or(true, |s| s >= self.min_tracking_confidence)
    }

    /// First qualifying hand among the first `max_num_hands`
    pub fn select(&self, hands: Vec<DetectedHand>) -> Option<DetectedHand> {
        hands
            .into_iter()
            .take(self.max_num_hands)
            .find(|hand| self.accepts(hand))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FrameRecord {
    #[serde(default)]
    hands: Vec<DetectedHand>,
}

type FrameResult = Result<FrameRecord, CaptureError>;

/// Frames decoded from a line-oriented JSON stream by a reader thread
pub struct JsonLinesSource {
    frames: Receiver<FrameResult>,
    thresholds: DetectionThresholds,
    capture_timeout: Duration,
    reader: Option<JoinHandle<()>>,
}

impl JsonLinesSource {
    /// Start reading `input` on a background thread.
    ///
    /// The reader stays at most one frame ahead of the driver, so a file
    /// replays one frame per tick and a live detector is paced by the pipe.
    pub fn new<R>(input: R, thresholds: DetectionThresholds, capture_timeout: Duration) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (sender, frames) = channel::bounded::<FrameResult>(1);
        let reader = thread::Builder::new()
            .name("handsig-capture".to_string())
            .spawn(move || {
                for (index, line) in input.lines().enumerate() {
                    let frame = match line {
                        Ok(line) if line.trim().is_empty() => continue,
                        Ok(line) => parse_frame(&line, index + 1),
                        Err(e) => Err(CaptureError::Io(e.to_string())),
                    };
                    let failed = frame.is_err();
                    if sender.send(frame).is_err() || failed {
                        return;
                    }
                }
                debug!("[PIPELINE] Landmark input exhausted");
            });

        let reader = match reader {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("[PIPELINE] Failed to start capture reader: {}", e);
                None
            }
        };

        Self {
            frames,
            thresholds,
            capture_timeout,
            reader,
        }
    }

    /// Read frames from standard input
    pub fn stdin(thresholds: DetectionThresholds, capture_timeout: Duration) -> Self {
        Self::new(BufReader::new(io::stdin()), thresholds, capture_timeout)
    }

    /// Read frames from a file
    pub fn open(
        path: &Path,
        thresholds: DetectionThresholds,
        capture_timeout: Duration,
    ) -> Result<Self, CaptureError> {
        let file = File::open(path)
            .map_err(|e| CaptureError::Unavailable(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(BufReader::new(file), thresholds, capture_timeout))
    }

    pub fn thresholds(&self) -> &DetectionThresholds {
        &self.thresholds
    }
}

fn parse_frame(line: &str, line_number: usize) -> FrameResult {
    let record: Option<FrameRecord> =
        serde_json::from_str(line).map_err(|e| CaptureError::Decode {
            line: line_number,
            message: e.to_string(),
        })?;
    Ok(record.unwrap_or_default())
}

impl LandmarkSource for JsonLinesSource {
    fn next_frame_landmarks(&mut self) -> Result<Option<DetectedHand>, CaptureError> {
        if self.reader.is_none() {
            return Err(CaptureError::Unavailable(
                "capture reader is not running".to_string(),
            ));
        }
        match self.frames.recv_timeout(self.capture_timeout) {
            Ok(Ok(frame)) => {
                trace!("[PIPELINE] Frame with {} hands", frame.hands.len());
                Ok(self.thresholds.select(frame.hands))
            }
            Ok(Err(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => {
                debug!(
                    "[PIPELINE] No frame within {:?}, treating as no hand",
                    self.capture_timeout
                );
                Ok(None)
            }
            Err(RecvTimeoutError::Disconnected) => Err(CaptureError::EndOfStream),
        }
    }
}

impl Drop for JsonLinesSource {
    fn drop(&mut self) {
        // A reader blocked on stdin cannot be interrupted, so only join
        // threads that have already finished.
        if let Some(reader) = self.reader.take() {
            if reader.is_finished() {
                let _ = reader.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hand_json(score: Option<f32>) -> String {
        let points = vec![LandmarkPoint::new(0.5, 0.5); 21];
        let mut hand = DetectedHand::new(points);
        hand.score = score;
        serde_json::to_string(&hand).unwrap()
    }

    fn source(input: String) -> JsonLinesSource {
        JsonLinesSource::new(
            Cursor::new(input.into_bytes()),
            DetectionThresholds::default(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_frames_in_order_then_end_of_stream() {
        let input = format!(
            "{{\"hands\": [{}]}}\n\n{{\"hands\": []}}\nnull\n",
            hand_json(Some(0.9))
        );
        let mut source = source(input);

        assert_eq!(source.next_frame_landmarks().unwrap().unwrap().points.len(), 21);
        assert_eq!(source.next_frame_landmarks().unwrap(), None);
        assert_eq!(source.next_frame_landmarks().unwrap(), None);
        assert_eq!(source.next_frame_landmarks(), Err(CaptureError::EndOfStream));
    }

    #[test]
    fn test_low_confidence_hand_is_ignored() {
        let input = format!("{{\"hands\": [{}]}}\n", hand_json(Some(0.3)));
        let mut source = source(input);
        assert_eq!(source.next_frame_landmarks().unwrap(), None);
    }

    #[test]
    fn test_only_first_hands_considered() {
        let low = hand_json(Some(0.1));
        let high = hand_json(Some(0.95));
        let input = format!("{{\"hands\": [{}, {}]}}\n", low, high);

        let mut single = source(input.clone());
        assert_eq!(single.next_frame_landmarks().unwrap(), None);

        let mut two = JsonLinesSource::new(
            Cursor::new(input.into_bytes()),
            DetectionThresholds {
                max_num_hands: 2,
                ..DetectionThresholds::default()
            },
            Duration::from_secs(5),
        );
        let hand = two.next_frame_landmarks().unwrap().unwrap();
        assert_eq!(hand.score, Some(0.95));
    }

    #[test]
    fn test_malformed_line_is_capture_error() {
        let mut source = source("{\"hands\": [oops]}\n".to_string());
        assert!(matches!(
            source.next_frame_landmarks(),
            Err(CaptureError::Decode { line: 1, .. })
        ));
    }

    #[test]
    fn test_incomplete_hand_passes_through() {
        let hand = DetectedHand::new(vec![LandmarkPoint::new(0.5, 0.5); 7]);
        let input = format!(
            "{{\"hands\": [{}]}}\n",
            serde_json::to_string(&hand).unwrap()
        );
        let mut source = source(input);
        assert_eq!(source.next_frame_landmarks().unwrap().unwrap().points.len(), 7);
    }
}
