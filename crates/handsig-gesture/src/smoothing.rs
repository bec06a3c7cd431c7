// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Optional temporal smoothing between the classifier and the encoder
//!
//! Classification is frame-local, so a finger hovering near its knuckle can
//! flicker between ticks. [`MajorityFilter`] votes per digit over the last N
//! ticks in which a hand was present. A tick without a hand clears the
//! history and passes straight through, so the no-hand symbol is never
//! delayed. A window of 1 reproduces the unsmoothed behavior.

use crate::digit::{Digit, DigitState, FingerStates, DIGIT_COUNT};
use crate::error::InvalidWindowError;
use std::collections::VecDeque;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct MajorityFilter {
    window: usize,
    history: [VecDeque<DigitState>; DIGIT_COUNT],
}

impl MajorityFilter {
    /// # Errors
    /// `InvalidWindowError` when `window` is zero or even.
    pub fn new(window: usize) -> Result<Self, InvalidWindowError> {
        if window == 0 || window % 2 == 0 {
            return Err(InvalidWindowError(window));
        }
        Ok(Self {
            window,
            history: std::array::from_fn(|_| VecDeque::with_capacity(window)),
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of hand-present ticks currently remembered
    pub fn depth(&self) -> usize {
        self.history[0].len()
    }

    pub fn reset(&mut self) {
        for digit_history in self.history.iter_mut() {
            digit_history.clear();
        }
    }

    /// Feed one tick and get the smoothed states.
    pub fn apply(&mut self, states: Option<FingerStates>) -> Option<FingerStates> {
        let Some(states) = states else {
            if self.depth() > 0 {
                trace!("[SMOOTHING] Hand lost, clearing {} ticks of history", self.depth());
            }
            self.reset();
            return None;
        };

        let mut smoothed = FingerStates::default();
        for digit in Digit::ALL {
            let latest = states.get(digit);
            let digit_history = &mut self.history[digit.position()];
            if digit_history.len() == self.window {
                digit_history.pop_front();
            }
            digit_history.push_back(latest);

            let open = digit_history.iter().filter(|s| s.is_open()).count();
            let voted = match (open * 2).cmp(&digit_history.len()) {
                std::cmp::Ordering::Greater => DigitState::Open,
                std::cmp::Ordering::Less => DigitState::Closed,
                std::cmp::Ordering::Equal => latest,
            };
            smoothed.set(digit, voted);
        }
        Some(smoothed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(flags: [bool; DIGIT_COUNT]) -> Option<FingerStates> {
        Some(FingerStates::from(flags))
    }

    #[test]
    fn test_rejects_even_or_zero_window() {
        assert_eq!(MajorityFilter::new(0).unwrap_err(), InvalidWindowError(0));
        assert_eq!(MajorityFilter::new(4).unwrap_err(), InvalidWindowError(4));
        assert!(MajorityFilter::new(1).is_ok());
        assert!(MajorityFilter::new(5).is_ok());
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let mut filter = MajorityFilter::new(1).unwrap();
        let a = states([true, false, true, false, true]);
        let b = states([false, true, false, true, false]);
        assert_eq!(filter.apply(a), a);
        assert_eq!(filter.apply(b), b);
        assert_eq!(filter.apply(None), None);
    }

    #[test]
    fn test_single_flicker_suppressed() {
        let mut filter = MajorityFilter::new(3).unwrap();
        let open = states([true; DIGIT_COUNT]);
        let flicker = states([true, false, true, true, true]);

        filter.apply(open);
        filter.apply(open);
        let out = filter.apply(flicker).unwrap();
        assert_eq!(out[Digit::Index], DigitState::Open);
    }

    #[test]
    fn test_sustained_change_wins() {
        let mut filter = MajorityFilter::new(3).unwrap();
        let open = states([true; DIGIT_COUNT]);
        let closed = states([false; DIGIT_COUNT]);

        filter.apply(open);
        filter.apply(open);
        filter.apply(closed);
        let out = filter.apply(closed).unwrap();
        assert_eq!(out, FingerStates::all_closed());
    }

    #[test]
    fn test_warm_up_tie_follows_latest() {
        let mut filter = MajorityFilter::new(3).unwrap();
        filter.apply(states([true; DIGIT_COUNT]));
        let out = filter.apply(states([false; DIGIT_COUNT])).unwrap();
        assert_eq!(out, FingerStates::all_closed());
    }

    #[test]
    fn test_no_hand_clears_history() {
        let mut filter = MajorityFilter::new(5).unwrap();
        for _ in 0..5 {
            filter.apply(states([true; DIGIT_COUNT]));
        }
        assert_eq!(filter.depth(), 5);
        assert_eq!(filter.apply(None), None);
        assert_eq!(filter.depth(), 0);

        let closed = states([false; DIGIT_COUNT]);
        assert_eq!(filter.apply(closed), closed);
    }
}
