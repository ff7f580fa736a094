//! Solid border around the exported image

use image::RgbaImage;
use image::imageops;
use serde::{Deserialize, Serialize};

use crate::domain::Color;

/// Largest padding, in pixels per side
pub const MAX_PADDING: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaddingConfig {
    /// Border width on every side, 0-200
    pub size: u32,
    pub color: Color,
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            size: 40,
            color: Color::WHITE,
        }
    }
}

/// Grow the canvas by `size` on every side, filled with `color`
pub fn apply_padding(image: &RgbaImage, config: &PaddingConfig) -> RgbaImage {
    let size = config.size.min(MAX_PADDING);
    if size == 0 {
        return image.clone();
    }
    let mut canvas = RgbaImage::from_pixel(
        image.width() + size * 2,
        image.height() + size * 2,
        image::Rgba(config.color.to_rgba_u8()),
    );
    imageops::overlay(&mut canvas, image, i64::from(size), i64::from(size));
    canvas
}
