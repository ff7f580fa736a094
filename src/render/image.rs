//! Image rendering for renderables using tiny-skia
//!
//! These functions flatten scene objects onto an `RgbaImage` for export.
//! Local primitive coordinates go through the renderable's transform and
//! then a uniform output scale.

use image::RgbaImage;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke, StrokeDash, Transform,
};

use super::geometry;
use super::pixelate::{PixelRegion, pixelate_pixmap};
use super::text::draw_text;
use crate::domain::{Color, Point};
use crate::error::EditorError;
use crate::scene::{Brush, PathOp, Primitive, Renderable};

/// Drop shadow offset in output pixels
const SHADOW_OFFSET: f32 = 2.0;
/// Drop shadow alpha
const SHADOW_ALPHA: u8 = 90;
const PLACEHOLDER_FILL: Color = Color::rgb(220, 220, 220);
const PLACEHOLDER_BORDER: Color = Color::rgb(140, 140, 140);

// ============================================================================
// Buffer conversion
// ============================================================================

/// Copy straight-alpha RGBA pixels into a premultiplied pixmap
pub fn pixmap_from_rgba(img: &RgbaImage) -> Result<Pixmap, EditorError> {
    let (width, height) = img.dimensions();
    let mut pixmap = Pixmap::new(width, height).ok_or(EditorError::Pixmap { width, height })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Copy a premultiplied pixmap back into straight-alpha RGBA pixels
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    img
}

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back
pub fn with_pixmap(
    img: &mut RgbaImage,
    f: impl FnOnce(&mut Pixmap),
) -> Result<(), EditorError> {
    let mut pixmap = pixmap_from_rgba(img)?;
    f(&mut pixmap);
    *img = rgba_from_pixmap(&pixmap);
    Ok(())
}

// ============================================================================
// Primitive drawing
// ============================================================================

fn build_path(ops: &[PathOp]) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for op in ops {
        match *op {
            PathOp::MoveTo(p) => pb.move_to(p.x, p.y),
            PathOp::LineTo(p) => pb.line_to(p.x, p.y),
            PathOp::QuadTo(c, p) => pb.quad_to(c.x, c.y, p.x, p.y),
            PathOp::Close => pb.close(),
        }
    }
    pb.finish()
}

fn rect_path(origin: Point, width: f32, height: f32) -> Option<tiny_skia::Path> {
    let rect = tiny_skia::Rect::from_xywh(origin.x, origin.y, width, height)?;
    Some(PathBuilder::from_rect(rect))
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn stroke_for(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

/// Colors used when drawing a pass: the real one or the shadow
#[derive(Clone, Copy)]
enum Pass {
    Normal { opacity: f32 },
    Shadow,
}

impl Pass {
    fn tint(self, color: Color) -> Color {
        match self {
            Pass::Normal { opacity } => color.faded(opacity),
            Pass::Shadow => Color::rgba(0, 0, 0, SHADOW_ALPHA).faded(f32::from(color.a) / 255.0),
        }
    }
}

fn draw_path(
    pixmap: &mut Pixmap,
    path: &tiny_skia::Path,
    brush: &Brush,
    pass: Pass,
    transform: Transform,
) {
    if let Some(fill) = brush.fill {
        pixmap.fill_path(
            path,
            &paint_for(pass.tint(fill)),
            FillRule::Winding,
            transform,
            None,
        );
    }
    if let Some(stroke) = brush.stroke {
        pixmap.stroke_path(
            path,
            &paint_for(pass.tint(stroke.color)),
            &stroke_for(stroke.width),
            transform,
            None,
        );
    }
}

fn draw_image(
    pixmap: &mut Pixmap,
    pixels: &RgbaImage,
    width: f32,
    height: f32,
    opacity: f32,
    transform: Transform,
) {
    let Ok(source) = pixmap_from_rgba(pixels) else {
        log::warn!("Skipping empty inserted image");
        return;
    };
    let sx = width / source.width() as f32;
    let sy = height / source.height() as f32;
    let paint = PixmapPaint {
        opacity,
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform.pre_scale(sx, sy), None);
}

fn draw_placeholder(pixmap: &mut Pixmap, width: f32, height: f32, opacity: f32, transform: Transform) {
    let Some(path) = rect_path(Point::ZERO, width, height) else {
        return;
    };
    pixmap.fill_path(
        &path,
        &paint_for(PLACEHOLDER_FILL.faded(opacity)),
        FillRule::Winding,
        transform,
        None,
    );
    let stroke = Stroke {
        dash: StrokeDash::new(vec![6.0, 4.0], 0.0),
        ..stroke_for(1.5)
    };
    pixmap.stroke_path(
        &path,
        &paint_for(PLACEHOLDER_BORDER.faded(opacity)),
        &stroke,
        transform,
        None,
    );
}

/// Pixelate whatever lies under a local `width` x `height` box
fn draw_pixelate(pixmap: &mut Pixmap, width: f32, height: f32, block: f32, transform: Transform) {
    let mut corners = [
        tiny_skia::Point::from_xy(0.0, 0.0),
        tiny_skia::Point::from_xy(width, 0.0),
        tiny_skia::Point::from_xy(width, height),
        tiny_skia::Point::from_xy(0.0, height),
    ];
    transform.map_points(&mut corners);
    let (min_x, max_x) = corners
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
    let (min_y, max_y) = corners
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    let Some(region) =
        PixelRegion::clamped((min_x, min_y, max_x, max_y), pixmap.width(), pixmap.height())
    else {
        return;
    };
    pixelate_pixmap(pixmap, region, block.round().max(1.0) as u32);
}

fn draw_primitive(
    pixmap: &mut Pixmap,
    primitive: &Primitive,
    pass: Pass,
    opacity: f32,
    scale: f32,
    transform: Transform,
) {
    match primitive {
        Primitive::Rect {
            origin,
            width,
            height,
            brush,
        } => {
            if let Some(path) = rect_path(*origin, *width, *height) {
                draw_path(pixmap, &path, brush, pass, transform);
            }
        }
        Primitive::Ellipse {
            center,
            rx,
            ry,
            brush,
        } => {
            if let Some(path) = geometry::ellipse_path(center.x, center.y, *rx, *ry) {
                draw_path(pixmap, &path, brush, pass, transform);
            }
        }
        Primitive::Path { ops, brush } => {
            if let Some(path) = build_path(ops) {
                draw_path(pixmap, &path, brush, pass, transform);
            }
        }
        Primitive::Text {
            origin,
            text,
            font_family,
            font_size,
            color,
        } => {
            let color = pass.tint(*color);
            draw_text(
                pixmap,
                text,
                font_family,
                *font_size,
                color,
                *origin,
                1.0,
                transform,
            );
        }
        // Raster primitives cast no shadow
        _ if matches!(pass, Pass::Shadow) => {}
        Primitive::Image {
            pixels,
            width,
            height,
        } => draw_image(pixmap, pixels, *width, *height, opacity, transform),
        Primitive::Placeholder { width, height } => {
            draw_placeholder(pixmap, *width, *height, opacity, transform)
        }
        Primitive::Pixelate {
            width,
            height,
            pixel_size,
        } => draw_pixelate(pixmap, *width, *height, *pixel_size as f32 * scale, transform),
    }
}

/// Draw one renderable, shadow first
pub fn draw_renderable(pixmap: &mut Pixmap, renderable: &Renderable, scale: f32) {
    let transform = Transform::from_scale(scale, scale).pre_concat(renderable.transform.to_skia());
    let opacity = renderable.opacity;

    if renderable.shadow {
        let offset = SHADOW_OFFSET * scale;
        let shadow = Transform::from_translate(offset, offset).pre_concat(transform);
        for primitive in &renderable.primitives {
            draw_primitive(pixmap, primitive, Pass::Shadow, opacity, scale, shadow);
        }
    }

    for primitive in &renderable.primitives {
        draw_primitive(
            pixmap,
            primitive,
            Pass::Normal { opacity },
            opacity,
            scale,
            transform,
        );
    }
}

/// Flatten renderables over a base image, in order, at `scale`
pub fn flatten<'a>(
    base: &RgbaImage,
    renderables: impl IntoIterator<Item = &'a Renderable>,
    scale: f32,
) -> Result<RgbaImage, EditorError> {
    if base.width() == 0 || base.height() == 0 {
        return Err(EditorError::EmptyImage);
    }
    let width = (base.width() as f32 * scale).round().max(1.0) as u32;
    let height = (base.height() as f32 * scale).round().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or(EditorError::Pixmap { width, height })?;

    let source = pixmap_from_rgba(base)?;
    let quality = if (scale - 1.0).abs() < f32::EPSILON {
        FilterQuality::Nearest
    } else {
        FilterQuality::Bilinear
    };
    pixmap.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &PixmapPaint {
            quality,
            ..PixmapPaint::default()
        },
        Transform::from_scale(scale, scale),
        None,
    );

    for renderable in renderables {
        draw_renderable(&mut pixmap, renderable, scale);
    }
    Ok(rgba_from_pixmap(&pixmap))
}
