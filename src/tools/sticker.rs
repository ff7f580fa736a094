//! Sticker and image placement tools
//!
//! Both place a box either sized by a drag or, on a plain click, at a
//! default size centred on the click.

use crate::domain::{
    Annotation, AnnotationKind, AnnotationShape, AnnotationStyle, Bounds, Color, Point,
    StickerKind, ToolSettings, Transform,
};
use crate::scene::{Brush, PathOp, Primitive, Renderable};
use crate::session::{PointerEvent, SessionContext};

use super::{
    GestureState, MIN_SHAPE_SIZE, Tool, ToolOutput, base_renderable, complete, drag_box,
    positive_size, preview,
};

/// Side of a sticker placed with a click
pub const DEFAULT_STICKER_SIZE: f32 = 64.0;
/// Longest side of an image placed with a click
pub const MAX_INSERT_SIZE: f32 = 400.0;
/// Size of an image placed with a click before its asset has decoded
pub const DEFAULT_INSERT_SIZE: f32 = 200.0;

/// Box for a placement gesture: the dragged box, or `size` centred on the click
fn placement(start: Point, event: &PointerEvent, default: (f32, f32)) -> Bounds {
    let dragged = drag_box(start, event);
    if dragged.max_dimension() >= MIN_SHAPE_SIZE {
        return dragged;
    }
    let half = Point::new(default.0 / 2.0, default.1 / 2.0);
    Bounds::from_corners(start - half, start + half)
}

// ============================================================================
// Sticker artwork
// ============================================================================

fn unit(w: f32, h: f32, x: f32, y: f32) -> Point {
    Point::new(x * w, y * h)
}

fn star(w: f32, h: f32) -> Vec<PathOp> {
    let center = Point::new(0.5, 0.52);
    let mut ops = Vec::with_capacity(11);
    for i in 0..10 {
        let radius = if i % 2 == 0 { 0.5 } else { 0.2 };
        let angle = -std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / 5.0;
        let p = center + Point::new(angle.cos(), angle.sin()).scale(radius);
        let p = unit(w, h, p.x, p.y);
        ops.push(if i == 0 {
            PathOp::MoveTo(p)
        } else {
            PathOp::LineTo(p)
        });
    }
    ops.push(PathOp::Close);
    ops
}

fn heart(w: f32, h: f32) -> Vec<PathOp> {
    let u = |x, y| unit(w, h, x, y);
    vec![
        PathOp::MoveTo(u(0.5, 0.95)),
        PathOp::QuadTo(u(0.0, 0.6), u(0.05, 0.3)),
        PathOp::QuadTo(u(0.15, 0.0), u(0.5, 0.25)),
        PathOp::QuadTo(u(0.85, 0.0), u(0.95, 0.3)),
        PathOp::QuadTo(u(1.0, 0.6), u(0.5, 0.95)),
        PathOp::Close,
    ]
}

fn arrow_right(w: f32, h: f32) -> Vec<PathOp> {
    let u = |x, y| unit(w, h, x, y);
    vec![
        PathOp::MoveTo(u(0.0, 0.35)),
        PathOp::LineTo(u(0.55, 0.35)),
        PathOp::LineTo(u(0.55, 0.1)),
        PathOp::LineTo(u(1.0, 0.5)),
        PathOp::LineTo(u(0.55, 0.9)),
        PathOp::LineTo(u(0.55, 0.65)),
        PathOp::LineTo(u(0.0, 0.65)),
        PathOp::Close,
    ]
}

/// Disc with a glyph in the middle
fn badge(w: f32, h: f32, color: Color, glyph: &str) -> Vec<Primitive> {
    let font_size = w.min(h) * 0.7;
    vec![
        Primitive::Ellipse {
            center: Point::new(w / 2.0, h / 2.0),
            rx: w / 2.0,
            ry: h / 2.0,
            brush: Brush::fill(color),
        },
        Primitive::Text {
            origin: Point::new(w / 2.0 - font_size * 0.3, h / 2.0 - font_size * 0.6),
            text: glyph.to_string(),
            font_family: "Sans".to_string(),
            font_size,
            color: Color::WHITE,
        },
    ]
}

/// Vector artwork of a sticker inside a `w` x `h` box
pub fn sticker_primitives(kind: StickerKind, w: f32, h: f32, color: Color) -> Vec<Primitive> {
    let u = |x, y| unit(w, h, x, y);
    let bold = Brush::stroke(color, (w.min(h) * 0.12).max(1.0));
    match kind {
        StickerKind::Star => vec![Primitive::Path {
            ops: star(w, h),
            brush: Brush::fill(color),
        }],
        StickerKind::Heart => vec![Primitive::Path {
            ops: heart(w, h),
            brush: Brush::fill(color),
        }],
        StickerKind::Check => vec![Primitive::Path {
            ops: vec![
                PathOp::MoveTo(u(0.12, 0.55)),
                PathOp::LineTo(u(0.4, 0.82)),
                PathOp::LineTo(u(0.88, 0.18)),
            ],
            brush: bold,
        }],
        StickerKind::Cross => vec![Primitive::Path {
            ops: vec![
                PathOp::MoveTo(u(0.15, 0.15)),
                PathOp::LineTo(u(0.85, 0.85)),
                PathOp::MoveTo(u(0.85, 0.15)),
                PathOp::LineTo(u(0.15, 0.85)),
            ],
            brush: bold,
        }],
        StickerKind::Question => badge(w, h, color, "?"),
        StickerKind::Exclamation => badge(w, h, color, "!"),
        StickerKind::ArrowRight => vec![Primitive::Path {
            ops: arrow_right(w, h),
            brush: Brush::fill(color),
        }],
    }
}

// ============================================================================
// Sticker tool
// ============================================================================

/// Places the session's selected sticker
#[derive(Debug, Default, Clone, Copy)]
pub struct StickerTool;

impl StickerTool {
    fn build(sticker: StickerKind, bounds: &Bounds, settings: &ToolSettings) -> Annotation {
        Annotation::new(
            AnnotationShape::Sticker {
                sticker_type: sticker,
                width: bounds.width(),
                height: bounds.height(),
            },
            AnnotationStyle {
                fill: None,
                ..AnnotationStyle::from_settings(settings)
            },
            Transform::at(bounds.origin()),
        )
    }

    fn preview_at(
        &self,
        start: Point,
        event: &PointerEvent,
        settings: &ToolSettings,
        ctx: &SessionContext,
    ) -> Option<Renderable> {
        let sticker = ctx.selected_sticker?;
        let bounds = placement(start, event, (DEFAULT_STICKER_SIZE, DEFAULT_STICKER_SIZE));
        preview(self, &Self::build(sticker, &bounds, settings), settings, ctx)
    }
}

impl Tool for StickerTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Sticker
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) -> Option<Renderable> {
        state.begin(event.point);
        state.preview = self.preview_at(event.point, event, settings, ctx);
        state.preview.clone()
    }

    fn on_move(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) {
        let Some(start) = state.active_start() else {
            return;
        };
        state.preview = self.preview_at(start, event, settings, ctx);
    }

    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        let start = state.finish()?;
        let sticker = ctx.selected_sticker?;
        let bounds = placement(start, event, (DEFAULT_STICKER_SIZE, DEFAULT_STICKER_SIZE));
        complete(self, Self::build(sticker, &bounds, settings), settings, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::Sticker {
            sticker_type,
            width,
            height,
        } = &annotation.shape
        else {
            return None;
        };
        if !positive_size(*width, *height) {
            return None;
        }
        base_renderable(
            annotation,
            sticker_primitives(*sticker_type, *width, *height, annotation.style.color),
        )
    }
}

// ============================================================================
// Insert image tool
// ============================================================================

/// Places the session's selected image asset
#[derive(Debug, Default, Clone, Copy)]
pub struct InsertImageTool;

impl InsertImageTool {
    /// Click size: the asset's natural size capped to `MAX_INSERT_SIZE`
    fn default_size(key: &str, ctx: &SessionContext) -> (f32, f32) {
        let Some(image) = ctx.assets.ready(key) else {
            return (DEFAULT_INSERT_SIZE, DEFAULT_INSERT_SIZE);
        };
        let (w, h) = (image.width() as f32, image.height() as f32);
        let longest = w.max(h);
        if longest <= 0.0 {
            return (DEFAULT_INSERT_SIZE, DEFAULT_INSERT_SIZE);
        }
        let k = (MAX_INSERT_SIZE / longest).min(1.0);
        (w * k, h * k)
    }

    fn build(key: &str, bounds: &Bounds, settings: &ToolSettings) -> Annotation {
        Annotation::new(
            AnnotationShape::InsertImage {
                source: key.to_string(),
                width: bounds.width(),
                height: bounds.height(),
            },
            AnnotationStyle {
                fill: None,
                ..AnnotationStyle::from_settings(settings)
            },
            Transform::at(bounds.origin()),
        )
    }

    fn preview_at(
        &self,
        start: Point,
        event: &PointerEvent,
        settings: &ToolSettings,
        ctx: &SessionContext,
    ) -> Option<Renderable> {
        let key = ctx.selected_image.as_deref()?;
        let bounds = placement(start, event, Self::default_size(key, ctx));
        preview(self, &Self::build(key, &bounds, settings), settings, ctx)
    }
}

impl Tool for InsertImageTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::InsertImage
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) -> Option<Renderable> {
        state.begin(event.point);
        state.preview = self.preview_at(event.point, event, settings, ctx);
        state.preview.clone()
    }

    fn on_move(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) {
        let Some(start) = state.active_start() else {
            return;
        };
        state.preview = self.preview_at(start, event, settings, ctx);
    }

    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        let start = state.finish()?;
        let key = ctx.selected_image.clone()?;
        let bounds = placement(start, event, Self::default_size(&key, ctx));
        complete(self, Self::build(&key, &bounds, settings), settings, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::InsertImage {
            source,
            width,
            height,
        } = &annotation.shape
        else {
            return None;
        };
        if source.is_empty() || !positive_size(*width, *height) {
            return None;
        }
        let primitive = match ctx.assets.ready(source) {
            Some(pixels) => Primitive::Image {
                pixels,
                width: *width,
                height: *height,
            },
            None => Primitive::Placeholder {
                width: *width,
                height: *height,
            },
        };
        base_renderable(annotation, vec![primitive])
    }
}
