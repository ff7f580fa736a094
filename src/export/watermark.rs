//! Image watermark stamped onto exports

use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tiny_skia::{FilterQuality, PixmapPaint, Transform};

use crate::error::EditorError;
use crate::render::image::{pixmap_from_rgba, with_pixmap};

/// Distance from the canvas edge for corner anchors
pub const WATERMARK_MARGIN: f32 = 20.0;
pub const MIN_WATERMARK_SIZE: u32 = 20;
pub const MAX_WATERMARK_SIZE: u32 = 200;
/// Largest share of the canvas the watermark may cover per axis
pub const MAX_CANVAS_FRACTION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

/// Placement settings, stored in the config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatermarkSettings {
    pub position: WatermarkPosition,
    /// Percent of the watermark's natural size, 20-200
    pub size: u32,
    /// Percent, 0-100
    pub opacity: u8,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            position: WatermarkPosition::BottomRight,
            size: 100,
            opacity: 50,
        }
    }
}

/// A decoded watermark image with its placement
#[derive(Debug, Clone)]
pub struct Watermark {
    pub image: Arc<RgbaImage>,
    pub settings: WatermarkSettings,
}

/// Placement of the watermark on a canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkLayout {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Compute where a `natural` sized watermark lands on a `canvas`
pub fn layout(
    natural: (u32, u32),
    canvas: (u32, u32),
    settings: &WatermarkSettings,
) -> Option<WatermarkLayout> {
    let (nw, nh) = (natural.0 as f32, natural.1 as f32);
    let (cw, ch) = (canvas.0 as f32, canvas.1 as f32);
    if nw <= 0.0 || nh <= 0.0 || cw <= 0.0 || ch <= 0.0 {
        return None;
    }
    let scale = settings.size.clamp(MIN_WATERMARK_SIZE, MAX_WATERMARK_SIZE) as f32 / 100.0;
    let (mut width, mut height) = (nw * scale, nh * scale);

    let fit = (cw * MAX_CANVAS_FRACTION / width).min(ch * MAX_CANVAS_FRACTION / height);
    if fit < 1.0 {
        width *= fit;
        height *= fit;
    }

    let m = WATERMARK_MARGIN;
    let (x, y) = match settings.position {
        WatermarkPosition::TopLeft => (m, m),
        WatermarkPosition::TopRight => (cw - width - m, m),
        WatermarkPosition::BottomLeft => (m, ch - height - m),
        WatermarkPosition::BottomRight => (cw - width - m, ch - height - m),
        WatermarkPosition::Center => ((cw - width) / 2.0, (ch - height) / 2.0),
    };
    Some(WatermarkLayout {
        x: x.max(0.0),
        y: y.max(0.0),
        width,
        height,
    })
}

/// Draw the watermark onto `canvas` in place
pub fn apply_watermark(canvas: &mut RgbaImage, watermark: &Watermark) -> Result<(), EditorError> {
    let Some(placement) = layout(
        watermark.image.dimensions(),
        canvas.dimensions(),
        &watermark.settings,
    ) else {
        log::warn!("Skipping watermark: empty image or canvas");
        return Ok(());
    };
    let opacity = f32::from(watermark.settings.opacity.min(100)) / 100.0;
    if opacity <= 0.0 {
        return Ok(());
    }
    let source = pixmap_from_rgba(&watermark.image)?;
    let transform = Transform::from_translate(placement.x, placement.y).pre_scale(
        placement.width / source.width() as f32,
        placement.height / source.height() as f32,
    );
    with_pixmap(canvas, |pixmap| {
        let paint = PixmapPaint {
            opacity,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(position: WatermarkPosition, size: u32) -> WatermarkSettings {
        WatermarkSettings {
            position,
            size,
            opacity: 100,
        }
    }

    #[test]
    fn test_anchor_positions() {
        let natural = (50, 20);
        let canvas = (400, 300);
        let br = layout(natural, canvas, &settings(WatermarkPosition::BottomRight, 100)).unwrap();
        assert_eq!((br.x, br.y), (330.0, 260.0));
        let tl = layout(natural, canvas, &settings(WatermarkPosition::TopLeft, 100)).unwrap();
        assert_eq!((tl.x, tl.y), (20.0, 20.0));
        let c = layout(natural, canvas, &settings(WatermarkPosition::Center, 100)).unwrap();
        assert_eq!((c.x, c.y), (175.0, 140.0));
    }

    #[test]
    fn test_size_is_clamped_and_fitted() {
        let canvas = (400, 300);
        let small = layout((100, 100), canvas, &settings(WatermarkPosition::TopLeft, 1)).unwrap();
        assert_eq!(small.width, 20.0);

        // 200% of 150 would be 300, more than half the 300px height
        let big = layout((150, 150), canvas, &settings(WatermarkPosition::TopLeft, 500)).unwrap();
        assert_eq!(big.height, 150.0);
        assert_eq!(big.width, 150.0);
    }

    #[test]
    fn test_watermark_is_drawn() {
        let mut canvas = RgbaImage::from_pixel(100, 100, image::Rgba([255, 255, 255, 255]));
        let watermark = Watermark {
            image: Arc::new(RgbaImage::from_pixel(10, 10, image::Rgba([0, 0, 0, 255]))),
            settings: settings(WatermarkPosition::TopLeft, 100),
        };
        apply_watermark(&mut canvas, &watermark).unwrap();
        assert_eq!(canvas.get_pixel(25, 25).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(50, 50).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_zero_opacity_is_noop() {
        let mut canvas = RgbaImage::from_pixel(50, 50, image::Rgba([255, 255, 255, 255]));
        let before = canvas.clone();
        let watermark = Watermark {
            image: Arc::new(RgbaImage::from_pixel(10, 10, image::Rgba([0, 0, 0, 255]))),
            settings: WatermarkSettings {
                opacity: 0,
                ..WatermarkSettings::default()
            },
        };
        apply_watermark(&mut canvas, &watermark).unwrap();
        assert_eq!(canvas, before);
    }
}
