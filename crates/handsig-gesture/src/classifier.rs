// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Finger openness classifier
//!
//! Stateless, frame-local heuristics over a single [`LandmarkSet`]:
//!
//! - **Index..Pinky**: open iff the tip is above the PIP knuckle
//!   (`tip.y < pip.y`). Assumes a roughly upright hand; rotation and camera
//!   tilt are not compensated.
//! - **Thumb**: the thumb moves laterally, so openness compares x against the
//!   thumb MCP. The direction depends on which way the hand faces, inferred
//!   from the wrist being left or right of the index MCP. The sign convention
//!   matches a horizontally mirrored (selfie) frame. Because the orientation
//!   test flips together with the openness test, mirroring the whole frame
//!   does not change the result, but a frame with the wrist exactly level
//!   with the index MCP always takes the left-hand branch.

use crate::digit::{Digit, DigitState, FingerStates};
use crate::landmarks::{HandLandmark, LandmarkSet};

/// Which branch of the handedness heuristic a frame took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbOrientation {
    /// Wrist left of the index MCP
    Right,
    /// Wrist at or right of the index MCP
    Left,
}

/// Infer hand orientation from wrist/index-base geometry.
pub fn thumb_orientation(landmarks: &LandmarkSet) -> ThumbOrientation {
    let wrist = landmarks.point(HandLandmark::Wrist);
    let index_mcp = landmarks.point(HandLandmark::IndexMcp);
    if wrist.x < index_mcp.x {
        ThumbOrientation::Right
    } else {
        ThumbOrientation::Left
    }
}

/// Classify every digit of one hand.
pub fn classify(landmarks: &LandmarkSet) -> FingerStates {
    let mut states = FingerStates::default();
    for digit in Digit::ALL {
        states.set(digit, classify_digit(landmarks, digit));
    }
    states
}

/// Classify a single digit.
pub fn classify_digit(landmarks: &LandmarkSet, digit: Digit) -> DigitState {
    match digit {
        Digit::Thumb => thumb_state(landmarks),
        _ => {
            let tip = landmarks.point(digit.tip());
            let pip = landmarks.point(digit.pip());
            DigitState::from(tip.y < pip.y)
        }
    }
}

fn thumb_state(landmarks: &LandmarkSet) -> DigitState {
    let tip = landmarks.point(Digit::Thumb.tip());
    let mcp = landmarks.point(Digit::Thumb.mcp());
    let open = match thumb_orientation(landmarks) {
        ThumbOrientation::Right => tip.x > mcp.x,
        ThumbOrientation::Left => tip.x < mcp.x,
    };
    DigitState::from(open)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{LandmarkPoint, LANDMARK_COUNT};

    /// Upright right-oriented hand with every digit extended.
    fn open_hand() -> [LandmarkPoint; LANDMARK_COUNT] {
        let mut p = [LandmarkPoint::new(0.5, 0.5); LANDMARK_COUNT];
        p[HandLandmark::Wrist.index()] = LandmarkPoint::new(0.40, 0.90);
        p[HandLandmark::ThumbMcp.index()] = LandmarkPoint::new(0.45, 0.75);
        p[HandLandmark::ThumbIp.index()] = LandmarkPoint::new(0.50, 0.70);
        p[HandLandmark::ThumbTip.index()] = LandmarkPoint::new(0.55, 0.65);
        p[HandLandmark::IndexMcp.index()] = LandmarkPoint::new(0.50, 0.60);
        for digit in [Digit::Index, Digit::Middle, Digit::Ring, Digit::Pinky] {
            p[digit.pip().index()].y = 0.45;
            p[digit.tip().index()].y = 0.25;
        }
        p
    }

    fn set(points: [LandmarkPoint; LANDMARK_COUNT]) -> LandmarkSet {
        LandmarkSet::new(points).unwrap()
    }

    #[test]
    fn test_all_open() {
        let states = classify(&set(open_hand()));
        assert_eq!(states, FingerStates::all_open());
    }

    #[test]
    fn test_folded_finger_closed() {
        let mut points = open_hand();
        points[HandLandmark::RingTip.index()].y = 0.55;
        let states = classify(&set(points));
        assert_eq!(states[Digit::Ring], DigitState::Closed);
        assert_eq!(states.open_count(), 4);
    }

    #[test]
    fn test_tip_level_with_pip_is_closed() {
        let mut points = open_hand();
        points[HandLandmark::IndexTip.index()].y = 0.45;
        assert_eq!(
            classify_digit(&set(points), Digit::Index),
            DigitState::Closed
        );
    }

    #[test]
    fn test_thumb_right_orientation() {
        let mut points = open_hand();
        let hand = set(points);
        assert_eq!(thumb_orientation(&hand), ThumbOrientation::Right);
        assert_eq!(classify_digit(&hand, Digit::Thumb), DigitState::Open);

        points[HandLandmark::ThumbTip.index()].x = 0.40;
        assert_eq!(classify_digit(&set(points), Digit::Thumb), DigitState::Closed);
    }

    #[test]
    fn test_thumb_left_orientation() {
        let mut points = open_hand();
        points[HandLandmark::Wrist.index()].x = 0.60;
        points[HandLandmark::ThumbTip.index()].x = 0.35;
        let hand = set(points);
        assert_eq!(thumb_orientation(&hand), ThumbOrientation::Left);
        assert_eq!(classify_digit(&hand, Digit::Thumb), DigitState::Open);

        points[HandLandmark::ThumbTip.index()].x = 0.50;
        assert_eq!(classify_digit(&set(points), Digit::Thumb), DigitState::Closed);
    }

    #[test]
    fn test_wrist_level_with_index_mcp_takes_left_branch() {
        let mut points = open_hand();
        points[HandLandmark::Wrist.index()].x = 0.50;
        assert_eq!(thumb_orientation(&set(points)), ThumbOrientation::Left);
    }
}
