//! Glove wire format.
//!
//! Every reading travels as a 16-bit frame:
//!
//! ```text
//!  15      12 11                      0
//! +----------+-------------------------+
//! |  finger  |     flex magnitude      |
//! +----------+-------------------------+
//! ```
//!
//! The finger field is an index within one hand (0-4); the hand itself is
//! known from the link the frame arrived on.
//!
//! Over Bluetooth the glove answers each poll byte with up to 16 bytes holding
//! eight frames. They are consumed back to front: the last byte received is the
//! MSB of the first frame decoded. [`PollFrameUnpacker`] implements that order
//! and carries an odd trailing byte over to the next poll.

use crate::error::{GloveError, GloveResult};
use crate::hardware::finger::{FingerId, Hand};

/// Bit position of the finger index field.
pub const FINGER_SHIFT: u32 = 12;

/// Mask selecting the flex magnitude field.
pub const MAGNITUDE_MASK: u16 = 0x0FFF;

/// Largest representable flex magnitude.
pub const MAX_MAGNITUDE: u16 = MAGNITUDE_MASK;

/// Byte the host sends to request one poll frame.
pub const POLL_REQUEST: u8 = b'S';

/// Size of one poll response from the glove.
pub const POLL_FRAME_LEN: usize = 16;

/// Frames carried by one full poll response.
pub const READINGS_PER_POLL: usize = POLL_FRAME_LEN / 2;

/// Raw 16-bit frame as sent by a glove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame(pub u16);

impl RawFrame {
    /// Pack a per-hand finger index and magnitude. Bits that do not fit are dropped.
    pub fn new(finger_index: u8, magnitude: u16) -> Self {
        RawFrame((u16::from(finger_index & 0x0F) << FINGER_SHIFT) | (magnitude & MAGNITUDE_MASK))
    }

    /// Bits 15..12.
    pub fn finger_index(self) -> u8 {
        (self.0 >> FINGER_SHIFT) as u8
    }

    /// Bits 11..0.
    pub fn magnitude(self) -> u16 {
        self.0 & MAGNITUDE_MASK
    }
}

/// One decoded flex reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// Finger the reading belongs to.
    pub finger: FingerId,
    /// 12-bit flex magnitude (0-4095).
    pub magnitude: u16,
}

/// Decode a raw frame received on `hand`'s link.
///
/// Fails with `InvalidFingerIndex` when the finger field is above 4.
pub fn decode(hand: Hand, raw: u16) -> GloveResult<Reading> {
    let frame = RawFrame(raw);
    let index = frame.finger_index();
    let finger = FingerId::from_hand_index(hand, index)
        .ok_or(GloveError::InvalidFingerIndex { hand, index })?;

    Ok(Reading {
        finger,
        magnitude: frame.magnitude(),
    })
}

/// Reassembles 16-bit values from Bluetooth poll responses.
#[derive(Debug, Default)]
pub struct PollFrameUnpacker {
    pending: Vec<u8>,
}

impl PollFrameUnpacker {
    /// Empty unpacker with no carried byte.
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(POLL_FRAME_LEN + 1),
        }
    }

    /// Append received bytes and drain every complete pair.
    ///
    /// Pairs are popped from the end of the buffer (MSB first, then LSB), so
    /// a full 16-byte response `[b0..b15]` yields `b14 | b15 << 8` first and
    /// `b0 | b1 << 8` last. A single leftover byte stays buffered.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<u16> {
        self.pending.extend_from_slice(bytes);

        let mut values = Vec::with_capacity(self.pending.len() / 2);
        while self.pending.len() > 1 {
            let (Some(msb), Some(lsb)) = (self.pending.pop(), self.pending.pop()) else {
                break;
            };
            values.push(u16::from(lsb) | (u16::from(msb) << 8));
        }
        values
    }

    /// Bytes waiting for a partner.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Lay out eight values as the glove would send them in one poll response.
///
/// Inverse of [`PollFrameUnpacker::push`] for a full response: `values[0]`
/// occupies the last two bytes.
pub fn pack_poll_frame(values: &[u16; READINGS_PER_POLL]) -> [u8; POLL_FRAME_LEN] {
    let mut bytes = [0u8; POLL_FRAME_LEN];
    for (k, value) in values.iter().enumerate() {
        let msb_pos = POLL_FRAME_LEN - 1 - 2 * k;
        bytes[msb_pos] = (value >> 8) as u8;
        bytes[msb_pos - 1] = (value & 0xFF) as u8;
    }
    bytes
}
