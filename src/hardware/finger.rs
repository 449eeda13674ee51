//! Hand and finger identifiers.
//!
//! `FingerId` is totally ordered by declaration: the right hand occupies
//! indices 0-4 and the left hand 5-9. Each hand's glove only ever reports
//! a finger index within that hand (0-4); the hand supplies the offset.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fingers reported by one glove.
pub const FINGERS_PER_HAND: u8 = 5;

/// Which glove a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    #[serde(rename = "right", alias = "r", alias = "R")]
    Right,
    #[serde(rename = "left", alias = "l", alias = "L")]
    Left,
}

impl Hand {
    /// Both hands, right first.
    pub const BOTH: [Hand; 2] = [Hand::Right, Hand::Left];

    /// Offset added to a per-hand finger index to get the `FingerId` ordinal.
    pub fn offset(self) -> u8 {
        match self {
            Hand::Right => 0,
            Hand::Left => FINGERS_PER_HAND,
        }
    }

    /// Single-letter wire label (`r` / `l`).
    pub fn label(self) -> char {
        match self {
            Hand::Right => 'r',
            Hand::Left => 'l',
        }
    }

    /// The five fingers belonging to this hand, thumb first.
    pub fn fingers(self) -> impl Iterator<Item = FingerId> {
        FingerId::ALL
            .into_iter()
            .skip(self.offset() as usize)
            .take(FINGERS_PER_HAND as usize)
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Right => f.write_str("right"),
            Hand::Left => f.write_str("left"),
        }
    }
}

impl FromStr for Hand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" | "R" | "right" => Ok(Hand::Right),
            "l" | "L" | "left" => Ok(Hand::Left),
            other => Err(format!("unknown hand '{}' (expected 'r' or 'l')", other)),
        }
    }
}

/// One finger of one hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FingerId {
    RightThumb = 0,
    RightIndex = 1,
    RightMiddle = 2,
    RightRing = 3,
    RightPinky = 4,
    LeftThumb = 5,
    LeftIndex = 6,
    LeftMiddle = 7,
    LeftRing = 8,
    LeftPinky = 9,
}

impl FingerId {
    /// Number of distinct fingers across both hands.
    pub const COUNT: usize = 10;

    /// Every finger in declaration order.
    pub const ALL: [FingerId; FingerId::COUNT] = [
        FingerId::RightThumb,
        FingerId::RightIndex,
        FingerId::RightMiddle,
        FingerId::RightRing,
        FingerId::RightPinky,
        FingerId::LeftThumb,
        FingerId::LeftIndex,
        FingerId::LeftMiddle,
        FingerId::LeftRing,
        FingerId::LeftPinky,
    ];

    /// Look up a finger by its ordinal (0-9).
    pub fn from_ordinal(ordinal: u8) -> Option<FingerId> {
        FingerId::ALL.get(ordinal as usize).copied()
    }

    /// Resolve a per-hand finger index (0-4) to a finger.
    ///
    /// Returns `None` when `index` is outside the hand. The offset is never
    /// allowed to carry a right-hand index over into the left hand.
    pub fn from_hand_index(hand: Hand, index: u8) -> Option<FingerId> {
        if index >= FINGERS_PER_HAND {
            return None;
        }
        FingerId::from_ordinal(index + hand.offset())
    }

    /// Ordinal in declaration order (0-9).
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// The hand this finger belongs to.
    pub fn hand(self) -> Hand {
        if (self as u8) < FINGERS_PER_HAND {
            Hand::Right
        } else {
            Hand::Left
        }
    }

    /// Short display label, e.g. `R-Index`.
    pub fn label(self) -> &'static str {
        match self {
            FingerId::RightThumb => "R-Thumb",
            FingerId::RightIndex => "R-Index",
            FingerId::RightMiddle => "R-Middle",
            FingerId::RightRing => "R-Ring",
            FingerId::RightPinky => "R-Pinky",
            FingerId::LeftThumb => "L-Thumb",
            FingerId::LeftIndex => "L-Index",
            FingerId::LeftMiddle => "L-Middle",
            FingerId::LeftRing => "L-Ring",
            FingerId::LeftPinky => "L-Pinky",
        }
    }
}

impl fmt::Display for FingerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_declaration_order() {
        for (i, finger) in FingerId::ALL.iter().enumerate() {
            assert_eq!(finger.ordinal(), i);
            assert_eq!(FingerId::from_ordinal(i as u8), Some(*finger));
        }
        assert_eq!(FingerId::from_ordinal(10), None);
        assert!(FingerId::RightPinky < FingerId::LeftThumb);
    }

    #[test]
    fn hand_index_resolution() {
        assert_eq!(
            FingerId::from_hand_index(Hand::Right, 0),
            Some(FingerId::RightThumb)
        );
        assert_eq!(
            FingerId::from_hand_index(Hand::Left, 4),
            Some(FingerId::LeftPinky)
        );
        // A right-hand index of 5 must not alias LeftThumb.
        assert_eq!(FingerId::from_hand_index(Hand::Right, 5), None);
        assert_eq!(FingerId::from_hand_index(Hand::Left, 5), None);
    }

    #[test]
    fn hands_partition_fingers() {
        let right: Vec<_> = Hand::Right.fingers().collect();
        let left: Vec<_> = Hand::Left.fingers().collect();
        assert_eq!(right.len(), 5);
        assert_eq!(left.len(), 5);
        assert!(right.iter().all(|f| f.hand() == Hand::Right));
        assert!(left.iter().all(|f| f.hand() == Hand::Left));
    }

    #[test]
    fn hand_parsing() {
        assert_eq!("r".parse::<Hand>(), Ok(Hand::Right));
        assert_eq!("left".parse::<Hand>(), Ok(Hand::Left));
        assert!("x".parse::<Hand>().is_err());
        assert_eq!(Hand::Left.label(), 'l');
        assert_eq!(Hand::Right.to_string(), "right");
    }
}
