//! Bar geometry for the glove display.
//!
//! Each finger is drawn as a fixed-size vertical bar over the hand outline,
//! filled from the bottom in proportion to its flex magnitude. Positions are
//! in canvas pixels, origin top-left.

use crate::hardware::finger::FingerId;
use crate::hardware::frame::MAX_MAGNITUDE;

/// Width of every bar.
pub const BAR_WIDTH: f32 = 22.0;

/// Fill colour, `0x4051f6`.
pub const BAR_COLOR: [u8; 3] = [0x40, 0x51, 0xf6];

/// Canvas size holding all ten bars.
pub const CANVAS_SIZE: [f32; 2] = [960.0, 480.0];

/// Magnitudes are scaled against a full 12-bit range.
const FULL_SCALE: u32 = 1 << 12;

// Right hand first (thumb..pinky), then left hand; same order as FingerId.
const BAR_HEIGHTS: [u32; FingerId::COUNT] = [134, 227, 235, 202, 165, 134, 227, 235, 202, 165];
const BAR_X: [f32; FingerId::COUNT] = [
    563.0, 628.0, 694.0, 773.0, 843.0, 380.0, 316.0, 250.0, 171.0, 100.0,
];
const BAR_Y: [f32; FingerId::COUNT] = [318.0, 53.0, 45.0, 78.0, 115.0, 318.0, 53.0, 45.0, 78.0, 115.0];

/// Where one finger's bar sits on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Full bar height in pixels.
    pub height: u32,
}

impl BarGeometry {
    /// Bar position and height for `finger`.
    pub fn for_finger(finger: FingerId) -> Self {
        let i = finger.ordinal();
        Self {
            x: BAR_X[i],
            y: BAR_Y[i],
            height: BAR_HEIGHTS[i],
        }
    }

    /// Pixels filled from the bottom for `magnitude`.
    pub fn filled_pixels(&self, magnitude: u16) -> u32 {
        self.height - empty_pixels(self.height, magnitude)
    }
}

/// Unfilled pixels at the top of a bar of `height` showing `magnitude`.
///
/// Magnitude is clamped to 0-4095 first, so the result is always in
/// `1..=height` for non-zero heights: a full-scale reading leaves the
/// top pixel row empty.
pub fn empty_pixels(height: u32, magnitude: u16) -> u32 {
    let magnitude = u32::from(magnitude.min(MAX_MAGNITUDE));
    height - (height * magnitude) / FULL_SCALE
}

/// Fill fraction in `0.0..1.0` for headless gauges.
pub fn fill_fraction(magnitude: u16) -> f32 {
    f32::from(magnitude.min(MAX_MAGNITUDE)) / FULL_SCALE as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_fit_canvas() {
        for finger in FingerId::ALL {
            let bar = BarGeometry::for_finger(finger);
            assert!(bar.x + BAR_WIDTH <= CANVAS_SIZE[0], "{finger} overflows x");
            assert!(bar.y + bar.height as f32 <= CANVAS_SIZE[1], "{finger} overflows y");
        }
    }

    #[test]
    fn hands_mirror_heights() {
        for (right, left) in crate::hardware::Hand::Right
            .fingers()
            .zip(crate::hardware::Hand::Left.fingers())
        {
            assert_eq!(
                BarGeometry::for_finger(right).height,
                BarGeometry::for_finger(left).height
            );
        }
    }

    #[test]
    fn scale_and_clamp() {
        assert_eq!(empty_pixels(134, 0), 134);
        assert_eq!(empty_pixels(134, 2048), 67);
        // 134 * 4095 / 4096 = 133
        assert_eq!(empty_pixels(134, 4095), 1);
        assert_eq!(empty_pixels(134, u16::MAX), 1);

        let bar = BarGeometry::for_finger(FingerId::RightIndex);
        assert_eq!(bar.filled_pixels(0), 0);
        assert_eq!(bar.filled_pixels(4095), 226);
    }

    #[test]
    fn fraction_is_monotonic_and_bounded() {
        assert_eq!(fill_fraction(0), 0.0);
        assert!(fill_fraction(4095) < 1.0);
        assert_eq!(fill_fraction(u16::MAX), fill_fraction(4095));
        assert!(fill_fraction(100) < fill_fraction(101));
    }
}
