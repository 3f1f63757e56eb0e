//! Display scaling of source images onto the drawing canvas.

use crate::config::DisplayConfig;

pub const MAX_DISPLAY_WIDTH: u32 = 800;
pub const MAX_DISPLAY_HEIGHT: u32 = 400;

/// Size of the canvas an image of `natural_width` x `natural_height` is drawn into,
/// using the default 800x400 box.
pub fn compute_display_size(natural_width: u32, natural_height: u32) -> (u32, u32) {
    compute_display_size_within(
        natural_width,
        natural_height,
        MAX_DISPLAY_WIDTH,
        MAX_DISPLAY_HEIGHT,
    )
}

/// Two-pass clamp: width first, then height on the already scaled size.
///
/// The width is not re-checked after the height pass and the result is not a
/// joint best fit. Saved boxes are in this display space, so the order and the
/// flooring must stay exactly as they are. A side floored to zero is raised to 1
/// so extreme aspect ratios still give a drawable canvas.
pub fn compute_display_size_within(
    natural_width: u32,
    natural_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    let mut width = natural_width;
    let mut height = natural_height;

    if width > max_width {
        let ratio = max_width as f64 / width as f64;
        width = max_width;
        height = ((height as f64 * ratio).floor() as u32).max(1);
    }

    if height > max_height {
        let ratio = max_height as f64 / height as f64;
        height = max_height;
        width = ((width as f64 * ratio).floor() as u32).max(1);
    }

    (width, height)
}

impl DisplayConfig {
    pub fn display_size(&self, natural_width: u32, natural_height: u32) -> (u32, u32) {
        compute_display_size_within(natural_width, natural_height, self.max_width, self.max_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_bounds_is_unchanged() {
        for (w, h) in [(1, 1), (800, 400), (640, 360), (799, 12)] {
            assert_eq!(compute_display_size(w, h), (w, h));
        }
    }

    #[test]
    fn test_wide_image_scales_once() {
        assert_eq!(compute_display_size(1600, 200), (800, 100));
    }

    #[test]
    fn test_tall_image_scales_on_height() {
        assert_eq!(compute_display_size(100, 800), (50, 400));
    }

    #[test]
    fn test_both_passes() {
        // 2000x1500 -> 800x600 -> 533x400
        assert_eq!(compute_display_size(2000, 1500), (533, 400));
    }

    #[test]
    fn test_flooring() {
        // 1000 * 0.8 height: 333 * 0.8 = 266.4
        assert_eq!(compute_display_size(1000, 333), (800, 266));
    }

    #[test]
    fn test_extreme_aspect_keeps_one_pixel() {
        assert_eq!(compute_display_size(10000, 4), (800, 1));
        assert_eq!(compute_display_size(4, 10000), (1, 400));
        assert_eq!(compute_display_size(0, 0), (0, 0));
    }

    #[test]
    fn test_config_limits() {
        let display = DisplayConfig {
            max_width: 400,
            max_height: 400,
            min_selection: 5.0,
        };
        assert_eq!(display.display_size(800, 200), (400, 100));
    }
}
