//! Rectangle and ellipse tools

use crate::domain::{
    Annotation, AnnotationKind, AnnotationShape, AnnotationStyle, Bounds, Point, ToolSettings,
    Transform,
};
use crate::scene::{Brush, Primitive, Renderable};
use crate::session::{PointerEvent, SessionContext};

use super::{
    GestureState, MIN_SHAPE_SIZE, Tool, ToolOutput, base_renderable, complete, drag_box,
    positive_size, preview,
};

fn outline_brush(annotation: &Annotation) -> Brush {
    let style = &annotation.style;
    Brush::stroke(style.color, style.stroke_width).with_fill(style.fill)
}

/// Axis-aligned rectangle dragged between two corners
#[derive(Debug, Default, Clone, Copy)]
pub struct RectangleTool;

impl RectangleTool {
    fn build(bounds: &Bounds, settings: &ToolSettings) -> Annotation {
        Annotation::new(
            AnnotationShape::Rectangle {
                width: bounds.width(),
                height: bounds.height(),
            },
            AnnotationStyle::from_settings(settings),
            Transform::at(bounds.origin()),
        )
    }
}

impl Tool for RectangleTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Rectangle
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        _settings: &ToolSettings,
        state: &mut GestureState,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        state.begin(event.point);
        None
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
        let annotation = Self::build(&drag_box(start, event), settings);
        state.preview = preview(self, &annotation, settings, ctx);
    }

    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        let start = state.finish()?;
        let bounds = drag_box(start, event);
        if bounds.max_dimension() < MIN_SHAPE_SIZE {
            return None;
        }
        complete(self, Self::build(&bounds, settings), settings, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::Rectangle { width, height } = &annotation.shape else {
            return None;
        };
        if !positive_size(*width, *height) {
            return None;
        }
        base_renderable(
            annotation,
            vec![Primitive::Rect {
                origin: Point::ZERO,
                width: *width,
                height: *height,
                brush: outline_brush(annotation),
            }],
        )
    }
}

/// Ellipse inscribed in the dragged box
#[derive(Debug, Default, Clone, Copy)]
pub struct EllipseTool;

impl EllipseTool {
    fn build(bounds: &Bounds, settings: &ToolSettings) -> Annotation {
        Annotation::new(
            AnnotationShape::Ellipse {
                width: bounds.width(),
                height: bounds.height(),
            },
            AnnotationStyle::from_settings(settings),
            Transform::at(bounds.origin()),
        )
    }
}

impl Tool for EllipseTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Ellipse
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        _settings: &ToolSettings,
        state: &mut GestureState,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        state.begin(event.point);
        None
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
        let annotation = Self::build(&drag_box(start, event), settings);
        state.preview = preview(self, &annotation, settings, ctx);
    }

    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        let start = state.finish()?;
        let bounds = drag_box(start, event);
        if bounds.max_dimension() < MIN_SHAPE_SIZE {
            return None;
        }
        complete(self, Self::build(&bounds, settings), settings, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::Ellipse { width, height } = &annotation.shape else {
            return None;
        };
        if !positive_size(*width, *height) {
            return None;
        }
        let (rx, ry) = (width / 2.0, height / 2.0);
        base_renderable(
            annotation,
            vec![Primitive::Ellipse {
                center: Point::new(rx, ry),
                rx,
                ry,
                brush: outline_brush(annotation),
            }],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Modifiers;
    use crate::tools::test_support::{drag, drag_with};

    #[test]
    fn test_small_rectangle_rejected() {
        let mut ctx = SessionContext::default();
        let settings = ToolSettings::default();
        assert!(drag(&RectangleTool, &[(0.0, 0.0), (3.0, 3.0)], &settings, &mut ctx).is_none());

        let out = drag(&RectangleTool, &[(0.0, 0.0), (10.0, 10.0)], &settings, &mut ctx).unwrap();
        assert_eq!(
            out.annotation.shape,
            AnnotationShape::Rectangle {
                width: 10.0,
                height: 10.0
            }
        );
    }

    #[test]
    fn test_reverse_drag_normalizes_origin() {
        let mut ctx = SessionContext::default();
        let out = drag(
            &RectangleTool,
            &[(50.0, 40.0), (20.0, 10.0)],
            &ToolSettings::default(),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(out.annotation.transform.anchor(), Point::new(20.0, 10.0));
    }

    #[test]
    fn test_shift_makes_square_ellipse() {
        let mut ctx = SessionContext::default();
        let out = drag_with(
            &EllipseTool,
            &[(0.0, 0.0), (30.0, 12.0)],
            Modifiers::shift(),
            &ToolSettings::default(),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(
            out.annotation.shape,
            AnnotationShape::Ellipse {
                width: 30.0,
                height: 30.0
            }
        );
        match &out.renderable.primitives[0] {
            Primitive::Ellipse { rx, ry, center, .. } => {
                assert_eq!((*rx, *ry), (15.0, 15.0));
                assert_eq!(*center, Point::new(15.0, 15.0));
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn test_move_updates_preview_idempotently() {
        let ctx = SessionContext::default();
        let settings = ToolSettings::default();
        let mut state = GestureState::default();
        RectangleTool.on_press(&PointerEvent::down(0.0, 0.0), &settings, &mut state, &ctx);
        RectangleTool.on_move(&PointerEvent::moved(20.0, 20.0), &settings, &mut state, &ctx);
        let first = state.preview.clone().unwrap();
        RectangleTool.on_move(&PointerEvent::moved(20.0, 20.0), &settings, &mut state, &ctx);
        assert_eq!(state.preview.as_ref(), Some(&first));
        assert!(!first.selectable);
    }

    #[test]
    fn test_rejects_malformed_rectangle() {
        let ctx = SessionContext::default();
        let settings = ToolSettings::default();
        let bad = Annotation::new(
            AnnotationShape::Rectangle {
                width: f32::NAN,
                height: 5.0,
            },
            AnnotationStyle::from_settings(&settings),
            Transform::default(),
        );
        assert!(RectangleTool.reconstruct(&bad, &settings, &ctx).is_none());
    }
}
