//! Export pipeline
//!
//! Composition order is fixed: base image, annotations, watermark,
//! browser frame, padding. The result is encoded and wrapped in a data URL.

pub mod encode;
pub mod frame;
pub mod padding;
pub mod watermark;

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::render;
use crate::scene::{Layer, Scene};

pub use frame::{FrameConfig, FrameStyle};
pub use padding::PaddingConfig;
pub use watermark::{Watermark, WatermarkPosition, WatermarkSettings};

/// Default JPEG quality
pub const DEFAULT_QUALITY: u8 = 92;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "webp" => Ok(ExportFormat::Webp),
            other => Err(format!("unknown export format {other:?}")),
        }
    }
}

/// Effects and encoding applied on export
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub watermark: Option<Watermark>,
    pub browser_frame: Option<FrameConfig>,
    pub padding: Option<PaddingConfig>,
    pub format: ExportFormat,
    /// JPEG quality, 1-100; ignored by lossless formats
    pub quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            watermark: None,
            browser_frame: None,
            padding: None,
            format: ExportFormat::Png,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Encoded export result
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutput {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
}

/// Apply watermark, frame and padding to an already composed image
pub fn apply_effects(mut image: RgbaImage, config: &ExportConfig) -> Result<RgbaImage, EditorError> {
    if let Some(watermark) = &config.watermark {
        watermark::apply_watermark(&mut image, watermark)?;
    }
    if let Some(frame) = &config.browser_frame {
        image = frame::apply_frame(&image, frame)?;
    }
    if let Some(padding) = &config.padding {
        image = padding::apply_padding(&image, padding);
    }
    Ok(image)
}

fn finish(image: RgbaImage, config: &ExportConfig) -> Result<ExportOutput, EditorError> {
    let image = apply_effects(image, config)?;
    let bytes = encode::encode(&image, config.format, config.quality)?;
    log::info!(
        "Exported {}x{} {} ({} bytes)",
        image.width(),
        image.height(),
        config.format,
        bytes.len()
    );
    Ok(ExportOutput {
        data_url: encode::data_url(config.format, &bytes),
        width: image.width(),
        height: image.height(),
        bytes,
        format: config.format,
    })
}

/// Export a base image without a live scene
pub fn export_image(base: &RgbaImage, config: &ExportConfig) -> Result<ExportOutput, EditorError> {
    if base.width() == 0 || base.height() == 0 {
        return Err(EditorError::EmptyImage);
    }
    finish(base.clone(), config)
}

/// Export the annotation layer of a live scene over `base`
///
/// The selection is cleared first and the scene is flattened at scale 1
/// whatever the current zoom. Previews are left out.
pub fn export_scene<S: Scene + ?Sized>(
    scene: &mut S,
    base: &RgbaImage,
    config: &ExportConfig,
) -> Result<ExportOutput, EditorError> {
    scene.set_active_object(None);
    let composed = render::image::flatten(
        base,
        scene
            .objects()
            .iter()
            .filter(|o| o.renderable.tag.layer == Layer::Annotation)
            .map(|o| &o.renderable),
        1.0,
    )?;
    finish(composed, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Color, Point, Transform};
    use crate::scene::{Brush, MemoryScene, Primitive, Renderable};

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]))
    }

    fn decode(output: &ExportOutput) -> RgbaImage {
        image::load_from_memory(&output.bytes).unwrap().to_rgba8()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JPG".parse::<ExportFormat>().unwrap(), ExportFormat::Jpeg);
        assert_eq!("webp".parse::<ExportFormat>().unwrap(), ExportFormat::Webp);
        assert!("gif".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_headless_export_with_padding_and_frame() {
        let config = ExportConfig {
            browser_frame: Some(FrameConfig::default()),
            padding: Some(PaddingConfig {
                size: 10,
                color: Color::BLACK,
            }),
            ..ExportConfig::default()
        };
        let out = export_image(&white(100, 50), &config).unwrap();
        assert_eq!((out.width, out.height), (120, 110));
        assert!(out.data_url.starts_with("data:image/png;base64,"));
        let decoded = decode(&out);
        assert_eq!(decoded.dimensions(), (120, 110));
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(60, 80).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_scene_export_clears_selection_and_skips_previews() {
        let mut scene = MemoryScene::new();
        let square = Renderable::new(
            Transform::at(Point::new(0.0, 0.0)),
            vec![Primitive::Rect {
                origin: Point::ZERO,
                width: 10.0,
                height: 10.0,
                brush: Brush::fill(Color::BLACK),
            }],
        );
        let id = scene.add(square.clone());
        scene.set_active_object(Some(id));
        scene.add(
            Renderable::new(Transform::at(Point::new(20.0, 0.0)), square.primitives.clone())
                .into_preview(),
        );

        let out = export_scene(&mut scene, &white(40, 20), &ExportConfig::default()).unwrap();
        assert_eq!(scene.active_object(), None);
        let decoded = decode(&out);
        assert_eq!(decoded.get_pixel(5, 5).0, [0, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(25, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_empty_base_rejected() {
        assert!(matches!(
            export_image(&RgbaImage::new(0, 0), &ExportConfig::default()),
            Err(EditorError::EmptyImage)
        ));
    }
}
