// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Digits and their per-frame open/closed state

use crate::landmarks::HandLandmark;
use std::ops::Index;

/// Number of digits on a hand.
pub const DIGIT_COUNT: usize = 5;

/// One of the five digits, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Digit {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Digit {
    pub const ALL: [Digit; DIGIT_COUNT] = [
        Digit::Thumb,
        Digit::Index,
        Digit::Middle,
        Digit::Ring,
        Digit::Pinky,
    ];

    /// Position of this digit in a [`FingerStates`] array and on the wire
    pub fn position(self) -> usize {
        self as usize
    }

    pub fn tip(self) -> HandLandmark {
        match self {
            Digit::Thumb => HandLandmark::ThumbTip,
            Digit::Index => HandLandmark::IndexTip,
            Digit::Middle => HandLandmark::MiddleTip,
            Digit::Ring => HandLandmark::RingTip,
            Digit::Pinky => HandLandmark::PinkyTip,
        }
    }

    /// Middle knuckle. For the thumb this is the IP joint, which has no
    /// PIP of its own.
    pub fn pip(self) -> HandLandmark {
        match self {
            Digit::Thumb => HandLandmark::ThumbIp,
            Digit::Index => HandLandmark::IndexPip,
            Digit::Middle => HandLandmark::MiddlePip,
            Digit::Ring => HandLandmark::RingPip,
            Digit::Pinky => HandLandmark::PinkyPip,
        }
    }

    /// Base knuckle where the digit meets the palm
    pub fn mcp(self) -> HandLandmark {
        match self {
            Digit::Thumb => HandLandmark::ThumbMcp,
            Digit::Index => HandLandmark::IndexMcp,
            Digit::Middle => HandLandmark::MiddleMcp,
            Digit::Ring => HandLandmark::RingMcp,
            Digit::Pinky => HandLandmark::PinkyMcp,
        }
    }
}

/// Open/closed state of one digit in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigitState {
    #[default]
    Closed,
    Open,
}

impl DigitState {
    pub fn is_open(self) -> bool {
        self == DigitState::Open
    }
}

impl From<bool> for DigitState {
    fn from(open: bool) -> Self {
        if open {
            DigitState::Open
        } else {
            DigitState::Closed
        }
    }
}

/// States of all five digits in [`Digit`] order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FingerStates([DigitState; DIGIT_COUNT]);

impl FingerStates {
    pub fn new(states: [DigitState; DIGIT_COUNT]) -> Self {
        Self(states)
    }

    pub fn all_open() -> Self {
        Self([DigitState::Open; DIGIT_COUNT])
    }

    pub fn all_closed() -> Self {
        Self([DigitState::Closed; DIGIT_COUNT])
    }

    pub fn get(&self, digit: Digit) -> DigitState {
        self.0[digit.position()]
    }

    pub fn set(&mut self, digit: Digit, state: DigitState) {
        self.0[digit.position()] = state;
    }

    pub fn as_array(&self) -> &[DigitState; DIGIT_COUNT] {
        &self.0
    }

    pub fn open_count(&self) -> usize {
        self.0.iter().filter(|s| s.is_open()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Digit, DigitState)> + '_ {
        Digit::ALL.iter().copied().zip(self.0.iter().copied())
    }
}

impl Index<Digit> for FingerStates {
    type Output = DigitState;

    fn index(&self, digit: Digit) -> &Self::Output {
        &self.0[digit.position()]
    }
}

impl From<[bool; DIGIT_COUNT]> for FingerStates {
    fn from(flags: [bool; DIGIT_COUNT]) -> Self {
        Self(flags.map(DigitState::from))
    }
}
