//! Utility functions for the annotator application.

use log::LevelFilter;

/// Initialise logging. `RUST_LOG` still refines per-module filters.
pub fn init_logging(level: &str) {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(parse_level(level))
        .try_init();
}

/// Parse a level name from the config file, falling back to `Info`.
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Create a placeholder checkerboard image shown until an image is selected
#[cfg(feature = "gui")]
pub fn placeholder_image() -> slint::Image {
    use slint::SharedPixelBuffer;

    let width = 64u32;
    let height = 64u32;
    let mut buffer = SharedPixelBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if (x / 8 + y / 8) % 2 == 0 { 60 } else { 110 };
            let i = ((y * width + x) * 3) as usize;
            let data = buffer.make_mut_bytes();
            data[i] = v;
            data[i + 1] = v;
            data[i + 2] = v;
        }
    }
    slint::Image::from_rgb8(buffer)
}

/// Convert a catalog colour string (`rgba(...)` or `#rrggbb`) to a Slint Color
#[cfg(feature = "gui")]
pub fn parse_color(color: &str) -> Option<slint::Color> {
    let (r, g, b, a) = crate::classes::parse_rgba(color)?;
    Some(slint::Color::from_argb_u8(a, r, g, b))
}
