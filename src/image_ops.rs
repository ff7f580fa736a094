//! Whole-document operations on the source image
//!
//! Both operations validate their input before any pixel is touched and
//! return the annotations adjusted to the new image space.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::domain::{Annotation, Rect};
use crate::error::EditorError;

/// Largest width or height a resize may produce
pub const MAX_DIMENSION: u32 = 16384;

/// Check a crop selection against an image of `width` x `height`
pub fn validate_crop(selection: Rect, width: u32, height: u32) -> Result<(), EditorError> {
    if selection.left < 0 || selection.top < 0 {
        return Err(EditorError::InvalidCrop(format!(
            "origin ({}, {}) is negative",
            selection.left, selection.top
        )));
    }
    if selection.width() <= 0 || selection.height() <= 0 {
        return Err(EditorError::InvalidCrop(format!(
            "size {}x{} is empty",
            selection.width(),
            selection.height()
        )));
    }
    // Both edges are positive here
    let (right, bottom) = (selection.right as u32, selection.bottom as u32);
    if right > width || bottom > height {
        return Err(EditorError::InvalidCrop(format!(
            "selection ends at ({right}, {bottom}), image is {width}x{height}"
        )));
    }
    Ok(())
}

/// Check a resize target
pub fn validate_resize(width: u32, height: u32) -> Result<(), EditorError> {
    if width == 0 || height == 0 {
        return Err(EditorError::InvalidResize(format!(
            "{width}x{height} has a zero dimension"
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(EditorError::InvalidResize(format!(
            "{width}x{height} exceeds {MAX_DIMENSION}px"
        )));
    }
    Ok(())
}

/// Cut `selection` out of `image`; the result is exactly the selection size
pub fn crop_image(image: &RgbaImage, selection: Rect) -> Result<RgbaImage, EditorError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EditorError::EmptyImage);
    }
    validate_crop(selection, image.width(), image.height())?;
    let cropped = imageops::crop_imm(
        image,
        selection.left as u32,
        selection.top as u32,
        selection.width() as u32,
        selection.height() as u32,
    )
    .to_image();
    log::debug!(
        "Cropped {}x{} -> {}x{}",
        image.width(),
        image.height(),
        cropped.width(),
        cropped.height()
    );
    Ok(cropped)
}

/// Resample `image` to `width` x `height`
pub fn resize_image(image: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, EditorError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EditorError::EmptyImage);
    }
    validate_resize(width, height)?;
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, width, height, FilterType::Lanczos3))
}

/// Move annotations into the space of a cropped image
pub fn crop_annotations(annotations: &[Annotation], selection: Rect) -> Vec<Annotation> {
    let (dx, dy) = (-selection.left as f32, -selection.top as f32);
    annotations.iter().map(|a| a.translated(dx, dy)).collect()
}

/// Scale annotations into the space of a resized image
pub fn resize_annotations(annotations: &[Annotation], sx: f32, sy: f32) -> Vec<Annotation> {
    annotations
        .iter()
        .map(|a| a.with_transform(a.transform.scaled(sx, sy)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AnnotationShape, AnnotationStyle, LineGeometry, Point, ToolSettings, Transform,
        calculate_proportional_height,
    };

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| image::Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn test_crop_output_is_selection_size() {
        let img = gradient(200, 200);
        let out = crop_image(&img, Rect::from_xywh(10, 20, 100, 50)).unwrap();
        assert_eq!(out.dimensions(), (100, 50));
        assert_eq!(out.get_pixel(0, 0).0, [10, 20, 0, 255]);
    }

    #[test]
    fn test_crop_rejects_bad_selections() {
        let img = gradient(200, 200);
        for rect in [
            Rect::from_xywh(-1, 0, 10, 10),
            Rect::from_xywh(0, -5, 10, 10),
            Rect::from_xywh(150, 150, 100, 10),
            Rect::from_xywh(0, 0, 0, 10),
        ] {
            assert!(
                matches!(crop_image(&img, rect), Err(EditorError::InvalidCrop(_))),
                "{rect:?} accepted"
            );
        }
        assert!(crop_image(&img, Rect::from_xywh(0, 0, 200, 200)).is_ok());
    }

    #[test]
    fn test_resize_validation() {
        let img = gradient(10, 10);
        assert!(matches!(
            resize_image(&img, 0, 10),
            Err(EditorError::InvalidResize(_))
        ));
        assert!(matches!(
            resize_image(&img, MAX_DIMENSION + 1, 10),
            Err(EditorError::InvalidResize(_))
        ));
        assert_eq!(resize_image(&img, 20, 5).unwrap().dimensions(), (20, 5));
    }

    #[test]
    fn test_proportional_resize() {
        let img = gradient(400, 800);
        let height = calculate_proportional_height(100, 400, 800);
        assert_eq!(height, 200);
        assert_eq!(resize_image(&img, 100, height).unwrap().dimensions(), (100, 200));
    }

    #[test]
    fn test_crop_translates_annotations() {
        let style = AnnotationStyle::from_settings(&ToolSettings::default());
        let rect = Annotation::new(
            AnnotationShape::Rectangle {
                width: 10.0,
                height: 10.0,
            },
            style.clone(),
            Transform::at(Point::new(50.0, 60.0)),
        );
        let moved = crop_annotations(std::slice::from_ref(&rect), Rect::from_xywh(20, 30, 100, 100));
        assert_eq!(moved[0].id, rect.id);
        assert_eq!(moved[0].transform.anchor(), Point::new(30.0, 30.0));
    }

    #[test]
    fn test_resize_scales_line_endpoints() {
        let style = AnnotationStyle::from_settings(&ToolSettings::default());
        let shape = AnnotationShape::Line(LineGeometry::straight(
            Point::new(10.0, 10.0),
            Point::new(30.0, 10.0),
        ));
        let line = Annotation::new(shape.clone(), style, Transform::at(shape.local_origin()));
        let scaled = &resize_annotations(&[line], 0.5, 0.5)[0];
        let end = scaled
            .transform
            .map_point(Point::new(30.0, 10.0) - shape.local_origin());
        assert!((end.x - 15.0).abs() < 1e-4);
        assert!((end.y - 5.0).abs() < 1e-4);
    }
}
