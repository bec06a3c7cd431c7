// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Gesture symbol encoding
//!
//! A [`GestureSymbol`] is the unit transmitted on the wire: five ASCII
//! characters, `'1'` for an open digit and `'0'` for a closed one, in
//! Thumb, Index, Middle, Ring, Pinky order. When no hand is detected the
//! symbol is `"00000"`.

use crate::digit::{Digit, FingerStates, DIGIT_COUNT};
use crate::error::SymbolParseError;
use std::fmt;
use std::str::FromStr;

const OPEN: u8 = b'1';
const CLOSED: u8 = b'0';

/// Canonical five-character encoding of one tick's finger states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GestureSymbol([u8; DIGIT_COUNT]);

impl GestureSymbol {
    /// Symbol sent when no hand is present
    pub const NO_HAND: GestureSymbol = GestureSymbol([CLOSED; DIGIT_COUNT]);

    pub fn from_states(states: &FingerStates) -> Self {
        let mut bytes = [CLOSED; DIGIT_COUNT];
        for (digit, state) in states.iter() {
            if state.is_open() {
                bytes[digit.position()] = OPEN;
            }
        }
        Self(bytes)
    }

    /// Wire payload (always 5 ASCII bytes)
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_open(&self, digit: Digit) -> bool {
        self.0[digit.position()] == OPEN
    }

    pub fn is_no_hand(&self) -> bool {
        *self == Self::NO_HAND
    }

    /// Decode back into finger states.
    pub fn to_states(&self) -> FingerStates {
        let mut flags = [false; DIGIT_COUNT];
        for digit in Digit::ALL {
            flags[digit.position()] = self.is_open(digit);
        }
        FingerStates::from(flags)
    }
}

impl Default for GestureSymbol {
    fn default() -> Self {
        Self::NO_HAND
    }
}

impl fmt::Display for GestureSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{}", byte as char)?;
        }
        Ok(())
    }
}

impl FromStr for GestureSymbol {
    type Err = SymbolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; DIGIT_COUNT] = s
            .as_bytes()
            .try_into()
            .map_err(|_| SymbolParseError(s.to_string()))?;
        if bytes.iter().all(|b| *b == OPEN || *b == CLOSED) {
            Ok(Self(bytes))
        } else {
            Err(SymbolParseError(s.to_string()))
        }
    }
}

/// Encode one tick. `None` means no hand was detected.
pub fn encode(states: Option<&FingerStates>) -> GestureSymbol {
    match states {
        Some(states) => GestureSymbol::from_states(states),
        None => GestureSymbol::NO_HAND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digit::DigitState;

    #[test]
    fn test_no_hand() {
        assert_eq!(encode(None).to_string(), "00000");
        assert!(encode(None).is_no_hand());
    }

    #[test]
    fn test_positional_order() {
        let mut states = FingerStates::all_closed();
        states.set(Digit::Thumb, DigitState::Open);
        states.set(Digit::Ring, DigitState::Open);
        let symbol = encode(Some(&states));
        assert_eq!(symbol.to_string(), "10010");
        assert_eq!(symbol.as_bytes(), b"10010");
        assert!(symbol.is_open(Digit::Thumb));
        assert!(!symbol.is_open(Digit::Index));
    }

    #[test]
    fn test_all_closed_hand_matches_no_hand() {
        assert_eq!(
            encode(Some(&FingerStates::all_closed())),
            GestureSymbol::NO_HAND
        );
        assert_eq!(encode(Some(&FingerStates::all_open())).to_string(), "11111");
    }

    #[test]
    fn test_parse() {
        let symbol: GestureSymbol = "01101".parse().unwrap();
        assert_eq!(symbol.to_string(), "01101");
        assert_eq!(symbol.to_states().open_count(), 3);

        assert!("0110".parse::<GestureSymbol>().is_err());
        assert!("011010".parse::<GestureSymbol>().is_err());
        assert!("01201".parse::<GestureSymbol>().is_err());
        assert!("".parse::<GestureSymbol>().is_err());
    }
}
