// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Hand landmark data model
//!
//! A detected hand is described by 21 normalized points, one per anatomical
//! site, in the order used by common hand-landmark models:
//!
//! ```text
//!  0  wrist
//!  1- 4  thumb  (CMC, MCP, IP, tip)
//!  5- 8  index  (MCP, PIP, DIP, tip)
//!  9-12  middle (MCP, PIP, DIP, tip)
//! 13-16  ring   (MCP, PIP, DIP, tip)
//! 17-20  pinky  (MCP, PIP, DIP, tip)
//! ```
//!
//! Coordinates are normalized to the frame (`0.0..=1.0`, smaller `y` is
//! higher in the image). Points may fall slightly outside that range when a
//! hand is partly out of frame.

use crate::error::ClassificationError;
use serde::{Deserialize, Serialize};

/// Number of landmarks in a complete hand.
pub const LANDMARK_COUNT: usize = 21;

/// Anatomical site of a hand landmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmark {
    /// All sites in index order
    pub const ALL: [HandLandmark; LANDMARK_COUNT] = [
        HandLandmark::Wrist,
        HandLandmark::ThumbCmc,
        HandLandmark::ThumbMcp,
        HandLandmark::ThumbIp,
        HandLandmark::ThumbTip,
        HandLandmark::IndexMcp,
        HandLandmark::IndexPip,
        HandLandmark::IndexDip,
        HandLandmark::IndexTip,
        HandLandmark::MiddleMcp,
        HandLandmark::MiddlePip,
        HandLandmark::MiddleDip,
        HandLandmark::MiddleTip,
        HandLandmark::RingMcp,
        HandLandmark::RingPip,
        HandLandmark::RingDip,
        HandLandmark::RingTip,
        HandLandmark::PinkyMcp,
        HandLandmark::PinkyPip,
        HandLandmark::PinkyDip,
        HandLandmark::PinkyTip,
    ];

    /// Stable anatomical index (0..=20)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// A single normalized landmark coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    /// Relative depth; carried through but not used for classification.
    #[serde(default)]
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One detected hand in one frame: exactly 21 points indexed by [`HandLandmark`].
///
/// Construction validates completeness, so every `LandmarkSet` can be
/// classified.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [LandmarkPoint; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Build from a complete, already ordered array of points.
    ///
    /// # Errors
    /// `NonFiniteCoordinate` if any coordinate is NaN or infinite.
    pub fn new(points: [LandmarkPoint; LANDMARK_COUNT]) -> Result<Self, ClassificationError> {
        if let Some(position) = points.iter().position(|p| !p.is_finite()) {
            return Err(ClassificationError::NonFiniteCoordinate {
                landmark: HandLandmark::ALL[position],
            });
        }
        Ok(Self { points })
    }

    /// Build from the point list reported by a landmark detector.
    ///
    /// # Errors
    /// `IncompleteLandmarkSet` unless exactly 21 points are supplied,
    /// `NonFiniteCoordinate` for NaN/infinite coordinates.
    pub fn try_from_points(points: Vec<LandmarkPoint>) -> Result<Self, ClassificationError> {
        let found = points.len();
        let points: [LandmarkPoint; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| ClassificationError::IncompleteLandmarkSet { found })?;
        Self::new(points)
    }

    pub fn point(&self, landmark: HandLandmark) -> &LandmarkPoint {
        &self.points[landmark.index()]
    }

    pub fn points(&self) -> &[LandmarkPoint; LANDMARK_COUNT] {
        &self.points
    }

    /// Iterate points together with their anatomical site.
    pub fn iter(&self) -> impl Iterator<Item = (HandLandmark, &LandmarkPoint)> {
        HandLandmark::ALL.iter().copied().zip(self.points.iter())
    }

    /// Reflect every point horizontally about the frame center (`x -> 1 - x`).
    pub fn mirrored(&self) -> Self {
        let mut points = self.points;
        for point in points.iter_mut() {
            point.x = 1.0 - point.x;
        }
        Self { points }
    }
}

impl TryFrom<Vec<LandmarkPoint>> for LandmarkSet {
    type Error = ClassificationError;

    fn try_from(points: Vec<LandmarkPoint>) -> Result<Self, Self::Error> {
        Self::try_from_points(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_points(count: usize) -> Vec<LandmarkPoint> {
        (0..count)
            .map(|i| LandmarkPoint::new(i as f32 / 32.0, 0.5))
            .collect()
    }

    #[test]
    fn test_indices_are_stable() {
        for (i, landmark) in HandLandmark::ALL.iter().enumerate() {
            assert_eq!(landmark.index(), i);
            assert_eq!(HandLandmark::from_index(i), Some(*landmark));
        }
        assert_eq!(HandLandmark::from_index(21), None);
        assert_eq!(HandLandmark::ThumbTip.index(), 4);
        assert_eq!(HandLandmark::IndexMcp.index(), 5);
        assert_eq!(HandLandmark::PinkyPip.index(), 18);
    }

    #[test]
    fn test_incomplete_set_rejected() {
        let err = LandmarkSet::try_from_points(flat_points(20)).unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::IncompleteLandmarkSet { found: 20 }
        ));

        let err = LandmarkSet::try_from_points(flat_points(22)).unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::IncompleteLandmarkSet { found: 22 }
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut points = flat_points(LANDMARK_COUNT);
        points[HandLandmark::MiddleTip.index()].y = f32::NAN;
        let err = LandmarkSet::try_from_points(points).unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::NonFiniteCoordinate {
                landmark: HandLandmark::MiddleTip
            }
        ));
    }

    #[test]
    fn test_mirrored_reflects_x_only() {
        let set = LandmarkSet::try_from_points(flat_points(LANDMARK_COUNT)).unwrap();
        let mirrored = set.mirrored();
        for ((site, original), (_, reflected)) in set.iter().zip(mirrored.iter()) {
            assert_eq!(reflected.x, 1.0 - original.x, "site {:?}", site);
            assert_eq!(reflected.y, original.y);
        }
        assert_eq!(mirrored.mirrored(), set);
    }

    #[test]
    fn test_point_deserializes_without_depth() {
        let point: LandmarkPoint = serde_json::from_str(r#"{"x":0.25,"y":0.75}"#).unwrap();
        assert_eq!(point, LandmarkPoint::new(0.25, 0.75));
    }
}
