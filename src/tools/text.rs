//! Text and callout tools
//!
//! Both place the pending text from the tool settings with a single click.
//! A callout keeps its pointer tip where the user clicked and computes the
//! box position backwards from it.

use crate::domain::{
    Annotation, AnnotationKind, AnnotationShape, AnnotationStyle, CalloutContent, Color, Point,
    PointerDirection, TextContent, ToolSettings, Transform, callout_box_origin,
};
use crate::render::text::measure_text;
use crate::scene::{Brush, PathOp, Primitive, Renderable};
use crate::session::{PointerEvent, SessionContext};

use super::{GestureState, Tool, ToolOutput, base_renderable, complete, preview};

/// Space between the callout border and its text
pub const CALLOUT_PADDING: f32 = 10.0;
/// Half the width of the callout pointer where it meets the box
const POINTER_HALF_BASE: f32 = 10.0;
/// Space between a text background and the text
const TEXT_BACKGROUND_PADDING: f32 = 4.0;

fn valid_text(text: &str, font_size: f32) -> bool {
    !text.trim().is_empty() && font_size.is_finite() && font_size > 0.0
}

/// Free text
#[derive(Debug, Default, Clone, Copy)]
pub struct TextTool;

impl TextTool {
    fn build(at: Point, settings: &ToolSettings) -> Annotation {
        Annotation::new(
            AnnotationShape::Text(TextContent {
                text: settings.text.clone(),
                font_family: settings.font_family.clone(),
                font_size: settings.font_size,
                background_color: settings.background_color,
                has_shadow: settings.has_shadow,
            }),
            AnnotationStyle {
                fill: None,
                ..AnnotationStyle::from_settings(settings)
            },
            Transform::at(at),
        )
    }
}

impl Tool for TextTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Text
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) -> Option<Renderable> {
        state.begin(event.point);
        state.preview = preview(self, &Self::build(event.point, settings), settings, ctx);
        state.preview.clone()
    }

    fn on_move(
        &self,
        _event: &PointerEvent,
        _settings: &ToolSettings,
        _state: &mut GestureState,
        _ctx: &SessionContext,
    ) {
        // Text stays where it was pressed
    }

    fn on_release(
        &self,
        _event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        let at = state.finish()?;
        if !valid_text(&settings.text, settings.font_size) {
            return None;
        }
        complete(self, Self::build(at, settings), settings, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::Text(content) = &annotation.shape else {
            return None;
        };
        if !valid_text(&content.text, content.font_size) {
            return None;
        }
        let mut primitives = Vec::with_capacity(2);
        if let Some(background) = content.background_color {
            let (width, height) =
                measure_text(&content.text, &content.font_family, content.font_size);
            primitives.push(Primitive::Rect {
                origin: Point::new(-TEXT_BACKGROUND_PADDING, -TEXT_BACKGROUND_PADDING),
                width: width + 2.0 * TEXT_BACKGROUND_PADDING,
                height: height + 2.0 * TEXT_BACKGROUND_PADDING,
                brush: Brush::fill(background),
            });
        }
        primitives.push(Primitive::Text {
            origin: Point::ZERO,
            text: content.text.clone(),
            font_family: content.font_family.clone(),
            font_size: content.font_size,
            color: annotation.style.color,
        });
        Some(base_renderable(annotation, primitives)?.with_shadow(content.has_shadow))
    }
}

/// Text box with a pointer
#[derive(Debug, Default, Clone, Copy)]
pub struct CalloutTool;

impl CalloutTool {
    fn build(tip: Point, settings: &ToolSettings) -> Annotation {
        let (text_w, text_h) = measure_text(&settings.text, &settings.font_family, settings.font_size);
        let width = text_w + 2.0 * CALLOUT_PADDING;
        let height = text_h + 2.0 * CALLOUT_PADDING;
        let direction = settings.pointer_direction;
        let origin = callout_box_origin(tip, direction, width, height);
        Annotation::new(
            AnnotationShape::Callout(CalloutContent {
                text: settings.text.clone(),
                font_family: settings.font_family.clone(),
                font_size: settings.font_size,
                pointer_direction: direction,
                tip,
                width,
                height,
                background_color: settings.background_color,
            }),
            AnnotationStyle {
                fill: None,
                ..AnnotationStyle::from_settings(settings)
            },
            Transform::at(origin),
        )
    }
}

/// Triangle from the box edge to the tip, in box-local coordinates
fn pointer_path(content: &CalloutContent) -> Vec<PathOp> {
    let (w, h) = (content.width, content.height);
    let (base, spread) = match content.pointer_direction {
        PointerDirection::Bottom => (Point::new(w / 2.0, h), Point::new(POINTER_HALF_BASE, 0.0)),
        PointerDirection::Top => (Point::new(w / 2.0, 0.0), Point::new(POINTER_HALF_BASE, 0.0)),
        PointerDirection::Left => (Point::new(0.0, h / 2.0), Point::new(0.0, POINTER_HALF_BASE)),
        PointerDirection::Right => (Point::new(w, h / 2.0), Point::new(0.0, POINTER_HALF_BASE)),
    };
    let tip = content.tip - content.box_origin();
    vec![
        PathOp::MoveTo(base - spread),
        PathOp::LineTo(tip),
        PathOp::LineTo(base + spread),
        PathOp::Close,
    ]
}

impl Tool for CalloutTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Callout
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) -> Option<Renderable> {
        state.begin(event.point);
        state.preview = preview(self, &Self::build(event.point, settings), settings, ctx);
        state.preview.clone()
    }

    fn on_move(
        &self,
        _event: &PointerEvent,
        _settings: &ToolSettings,
        _state: &mut GestureState,
        _ctx: &SessionContext,
    ) {
        // The tip is fixed at the press point
    }

    fn on_release(
        &self,
        _event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        let tip = state.finish()?;
        if !valid_text(&settings.text, settings.font_size) {
            return None;
        }
        complete(self, Self::build(tip, settings), settings, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::Callout(content) = &annotation.shape else {
            return None;
        };
        if !valid_text(&content.text, content.font_size)
            || !content.tip.is_finite()
            || !super::positive_size(content.width, content.height)
        {
            return None;
        }
        let style = &annotation.style;
        let background = content.background_color.unwrap_or(Color::WHITE);
        let brush = Brush::stroke(style.color, style.stroke_width).with_fill(Some(background));
        base_renderable(
            annotation,
            vec![
                Primitive::Path {
                    ops: pointer_path(content),
                    brush,
                },
                Primitive::Rect {
                    origin: Point::ZERO,
                    width: content.width,
                    height: content.height,
                    brush,
                },
                Primitive::Text {
                    origin: Point::new(CALLOUT_PADDING, CALLOUT_PADDING),
                    text: content.text.clone(),
                    font_family: content.font_family.clone(),
                    font_size: content.font_size,
                    color: style.color,
                },
            ],
        )
    }
}
