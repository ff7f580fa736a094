//! Output encoders and data URLs

use std::io;

use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use super::ExportFormat;
use crate::error::EditorError;

/// Highest JPEG quality
pub const MAX_JPEG_QUALITY: u8 = 100;

fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, EditorError> {
    let mut buffer = Vec::new();
    write_png(&mut buffer, image).map_err(|e| EditorError::Encode {
        format: "png",
        reason: e.to_string(),
    })?;
    Ok(buffer)
}

/// Encode as JPEG, compositing transparent pixels over white
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, EditorError> {
    let quality = quality.clamp(1, MAX_JPEG_QUALITY);
    let mut rgb = Vec::with_capacity(image.width() as usize * image.height() as usize * 3);
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let alpha = u32::from(a);
        for channel in [r, g, b] {
            let blended = (u32::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255;
            rgb.push(blended as u8);
        }
    }
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(&rgb, image.width(), image.height(), ExtendedColorType::Rgb8)
        .map_err(|e| EditorError::Encode {
            format: "jpeg",
            reason: e.to_string(),
        })?;
    Ok(out)
}

pub fn encode_webp(image: &RgbaImage) -> Result<Vec<u8>, EditorError> {
    let mut out = Vec::new();
    WebPEncoder::new_lossless(&mut out)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EditorError::Encode {
            format: "webp",
            reason: e.to_string(),
        })?;
    Ok(out)
}

/// Encode in the requested format
pub fn encode(image: &RgbaImage, format: ExportFormat, quality: u8) -> Result<Vec<u8>, EditorError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EditorError::EmptyImage);
    }
    match format {
        ExportFormat::Png => encode_png(image),
        ExportFormat::Jpeg => encode_jpeg(image, quality),
        ExportFormat::Webp => encode_webp(image),
    }
}

/// `data:<mime>;base64,...` for encoded bytes
pub fn data_url(format: ExportFormat, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        format.mime_type(),
        general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(8, 6, |x, y| image::Rgba([x as u8 * 30, y as u8 * 40, 90, 255]))
    }

    #[test]
    fn test_png_decodes_back() {
        let bytes = encode_png(&sample()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_webp_is_lossless() {
        let bytes = encode_webp(&sample()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_jpeg_has_expected_size() {
        let bytes = encode_jpeg(&sample(), 0).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn test_data_url_prefix() {
        let url = data_url(ExportFormat::Jpeg, &[1, 2, 3]);
        assert_eq!(url, "data:image/jpeg;base64,AQID");
    }
}
