use serde::{Deserialize, Serialize};

/// Boxes narrower or shorter than this are treated as spurious and dropped.
pub const MIN_BOX_SIDE: f32 = 1.0;

/// Bounds `value` to `[min, max]`. NaN collapses to `min`.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    debug_assert!(min <= max, "clamp bounds must be ordered");
    max.min(min.max(value))
}

/// Axis-aligned box as left/top origin plus extent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoxRect {
    pub fn from_corners([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self {
            left: x1,
            top: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn corners(&self) -> [f32; 4] {
        [self.left, self.top, self.right(), self.bottom()]
    }

    /// True when either side is below [`MIN_BOX_SIDE`].
    pub fn is_degenerate(&self) -> bool {
        !(self.width >= MIN_BOX_SIDE && self.height >= MIN_BOX_SIDE)
    }
}

/// Clamps x coordinates to `[0, max_x]` and y coordinates to `[0, max_y]`.
pub fn clamp_corners([x1, y1, x2, y2]: [f32; 4], max_x: f32, max_y: f32) -> [f32; 4] {
    [
        clamp(x1, 0.0, max_x),
        clamp(y1, 0.0, max_y),
        clamp(x2, 0.0, max_x),
        clamp(y2, 0.0, max_y),
    ]
}

/// Pushes each corner outward by `margin` pixels.
pub fn expand_corners([x1, y1, x2, y2]: [f32; 4], margin: f32) -> [f32; 4] {
    [x1 - margin, y1 - margin, x2 + margin, y2 + margin]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::below(-5.0, 0.0)]
    #[case::inside(12.5, 12.5)]
    #[case::above(900.0, 639.0)]
    #[case::at_max(639.0, 639.0)]
    fn test_clamp(#[case] value: f32, #[case] expected: f32) {
        assert_relative_eq!(clamp(value, 0.0, 639.0), expected);
    }

    #[test]
    fn test_clamp_nan_collapses_to_min() {
        assert_relative_eq!(clamp(f32::NAN, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_rect_from_corners() {
        let r = BoxRect::from_corners([10.0, 10.0, 50.0, 60.0]);
        assert_relative_eq!(r.left, 10.0);
        assert_relative_eq!(r.top, 10.0);
        assert_relative_eq!(r.width, 40.0);
        assert_relative_eq!(r.height, 50.0);
        assert_eq!(r.corners(), [10.0, 10.0, 50.0, 60.0]);
    }

    #[rstest]
    #[case::zero_area([10.0, 10.0, 10.0, 10.0], true)]
    #[case::sub_pixel_width([10.0, 10.0, 10.5, 40.0], true)]
    #[case::sub_pixel_height([10.0, 10.0, 40.0, 10.9], true)]
    #[case::inverted([50.0, 50.0, 10.0, 10.0], true)]
    #[case::exactly_one([10.0, 10.0, 11.0, 11.0], false)]
    #[case::regular([0.0, 0.0, 30.0, 30.0], false)]
    fn test_is_degenerate(#[case] corners: [f32; 4], #[case] expected: bool) {
        assert_eq!(BoxRect::from_corners(corners).is_degenerate(), expected);
    }

    #[test]
    fn test_nan_extent_is_degenerate() {
        let r = BoxRect::from_corners([f32::NAN, 0.0, 10.0, 10.0]);
        assert!(r.is_degenerate());
    }

    #[test]
    fn test_clamp_corners_uses_axis_bounds() {
        let c = clamp_corners([-3.0, -4.0, 800.0, 500.0], 639.0, 319.0);
        assert_eq!(c, [0.0, 0.0, 639.0, 319.0]);
    }

    #[test]
    fn test_expand_corners() {
        let c = expand_corners([100.0, 100.0, 150.0, 180.0], 8.0);
        assert_eq!(c, [92.0, 92.0, 158.0, 188.0]);
    }
}
