//! Numbered sequence marker tool
//!
//! Each successful click places the next number from the session's
//! sequence counter. Previews peek at the counter; only a completed
//! gesture advances it.

use crate::domain::{
    Annotation, AnnotationKind, AnnotationShape, AnnotationStyle, Color, Point, ToolSettings,
    Transform,
};
use crate::render::geometry::marker::{RADIUS, font_scale};
use crate::render::text::measure_text;
use crate::scene::{Brush, Primitive, Renderable};
use crate::session::{PointerEvent, SessionContext};

use super::{GestureState, Tool, ToolOutput, base_renderable, complete, preview};

/// Label font size relative to the marker radius, before digit scaling
const LABEL_SIZE_FACTOR: f32 = 1.1;

/// Label color with enough contrast against the marker fill
fn label_color(fill: Color) -> Color {
    if fill.luminance() > 0.6 {
        Color::BLACK
    } else {
        Color::WHITE
    }
}

/// Sequence marker ("list") tool
#[derive(Debug, Default, Clone, Copy)]
pub struct ListTool;

impl ListTool {
    fn build(center: Point, number: u32, settings: &ToolSettings) -> Annotation {
        let base = AnnotationStyle::from_settings(settings);
        let style = AnnotationStyle {
            fill: Some(base.color),
            ..base
        };
        Annotation::new(
            AnnotationShape::List {
                number,
                radius: RADIUS,
            },
            style,
            Transform::at(center),
        )
    }
}

impl Tool for ListTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::List
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) -> Option<Renderable> {
        state.begin(event.point);
        let annotation = Self::build(event.point, ctx.sequence.peek(), settings);
        state.preview = preview(self, &annotation, settings, ctx);
        state.preview.clone()
    }

    fn on_move(
        &self,
        _event: &PointerEvent,
        _settings: &ToolSettings,
        _state: &mut GestureState,
        _ctx: &SessionContext,
    ) {
    }

    fn on_release(
        &self,
        _event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        let center = state.finish()?;
        let annotation = Self::build(center, ctx.sequence.peek(), settings);
        let output = complete(self, annotation, settings, ctx)?;
        ctx.sequence.advance();
        Some(output)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::List { number, radius } = &annotation.shape else {
            return None;
        };
        if *number == 0 || !radius.is_finite() || *radius <= 0.0 {
            return None;
        }
        let style = &annotation.style;
        let fill = style.fill.unwrap_or(style.color);
        let label = number.to_string();
        let font_size = radius * LABEL_SIZE_FACTOR * font_scale(*number);
        let family = "Sans";
        let (text_w, text_h) = measure_text(&label, family, font_size);
        base_renderable(
            annotation,
            vec![
                Primitive::Ellipse {
                    center: Point::ZERO,
                    rx: *radius,
                    ry: *radius,
                    brush: Brush::fill(fill),
                },
                Primitive::Text {
                    origin: Point::new(-text_w / 2.0, -text_h / 2.0),
                    text: label,
                    font_family: family.to_string(),
                    font_size,
                    color: label_color(fill),
                },
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::drag;

    fn place(ctx: &mut SessionContext, x: f32) -> u32 {
        let out = drag(&ListTool, &[(x, 10.0), (x, 10.0)], &ToolSettings::default(), ctx).unwrap();
        match out.annotation.shape {
            AnnotationShape::List { number, .. } => number,
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_markers_number_consecutively() {
        let mut ctx = SessionContext::default();
        let numbers: Vec<u32> = (0..5).map(|i| place(&mut ctx, i as f32 * 40.0)).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_restart_resets_to_one() {
        let mut ctx = SessionContext::default();
        place(&mut ctx, 0.0);
        place(&mut ctx, 40.0);
        ctx.sequence.restart();
        assert_eq!(place(&mut ctx, 80.0), 1);
    }

    #[test]
    fn test_preview_does_not_advance() {
        let mut ctx = SessionContext::default();
        let settings = ToolSettings::default();
        let mut state = GestureState::default();
        let preview = ListTool.on_press(&PointerEvent::down(5.0, 5.0), &settings, &mut state, &ctx);
        assert!(preview.is_some());
        state.reset();
        assert_eq!(ctx.sequence.peek(), 1);
        assert_eq!(place(&mut ctx, 0.0), 1);
    }

    #[test]
    fn test_label_shrinks_with_digits() {
        let ctx = SessionContext::default();
        let settings = ToolSettings::default();
        let size_of = |number: u32| {
            let annotation = ListTool::build(Point::ZERO, number, &settings);
            let renderable = ListTool.reconstruct(&annotation, &settings, &ctx).unwrap();
            match &renderable.primitives[1] {
                Primitive::Text { font_size, .. } => *font_size,
                other => panic!("unexpected primitive {other:?}"),
            }
        };
        let one = size_of(3);
        assert!((size_of(12) - one * 0.85).abs() < 1e-4);
        assert!((size_of(123) - one * 0.7).abs() < 1e-4);
    }
}
