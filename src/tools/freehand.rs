//! Freehand curve and highlighter tools
//!
//! Both capture raw pointer points, skipping points closer than a minimum
//! distance to the last one. The stored annotation keeps every captured
//! point in order; smoothing only happens when the path is rendered.

use crate::domain::{
    Annotation, AnnotationKind, AnnotationShape, AnnotationStyle, Point, ToolSettings, Transform,
};
use crate::render::geometry::smooth_path;
use crate::scene::{Brush, Primitive, Renderable};
use crate::session::{PointerEvent, SessionContext};

use super::{GestureState, Tool, ToolOutput, base_renderable, complete, preview};

/// Minimum distance between captured curve points
pub const CURVE_MIN_DISTANCE: f32 = 2.0;
/// Minimum distance between captured highlighter points
pub const HIGHLIGHT_MIN_DISTANCE: f32 = 3.0;
/// Fixed highlighter opacity
pub const HIGHLIGHT_OPACITY: f32 = 0.4;
/// Highlighter stroke width as a multiple of the configured stroke width
pub const HIGHLIGHT_WIDTH_FACTOR: f32 = 4.0;

/// Append `point` if it is far enough from the last captured point
fn capture(points: &mut Vec<Point>, point: Point, min_distance: f32) {
    let far_enough = points
        .last()
        .is_none_or(|last| last.distance(point) >= min_distance);
    if far_enough && point.is_finite() {
        points.push(point);
    }
}

/// Captured points of a finished gesture, including the release point
fn release_points(
    event: &PointerEvent,
    state: &mut GestureState,
    min_distance: f32,
) -> Option<Vec<Point>> {
    if !state.is_drawing {
        return None;
    }
    let mut points = std::mem::take(&mut state.points);
    state.reset();
    capture(&mut points, event.point, min_distance);
    (points.len() >= 2).then_some(points)
}

fn valid_points(points: &[Point]) -> bool {
    points.len() >= 2 && points.iter().all(|p| p.is_finite())
}

/// Smoothed stroke of raw canvas points, relative to the shape's origin
fn stroke_path(annotation: &Annotation, points: &[Point]) -> Option<Renderable> {
    if !valid_points(points) {
        return None;
    }
    let origin = annotation.shape.local_origin();
    let local: Vec<Point> = points.iter().map(|p| *p - origin).collect();
    let style = &annotation.style;
    base_renderable(
        annotation,
        vec![Primitive::Path {
            ops: smooth_path(&local),
            brush: Brush::stroke(style.color, style.stroke_width),
        }],
    )
}

fn anchored(shape: AnnotationShape, style: AnnotationStyle) -> Annotation {
    let transform = Transform::at(shape.local_origin());
    Annotation::new(shape, style, transform)
}

/// Freehand pen
#[derive(Debug, Default, Clone, Copy)]
pub struct CurveTool;

impl CurveTool {
    fn build(points: Vec<Point>, settings: &ToolSettings) -> Annotation {
        anchored(
            AnnotationShape::Curve { points },
            AnnotationStyle::from_settings(settings),
        )
    }
}

impl Tool for CurveTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Curve
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
        if !state.is_drawing {
            return;
        }
        capture(&mut state.points, event.point, CURVE_MIN_DISTANCE);
        let annotation = Self::build(state.points.clone(), settings);
        state.preview = preview(self, &annotation, settings, ctx);
    }

    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        let points = release_points(event, state, CURVE_MIN_DISTANCE)?;
        complete(self, Self::build(points, settings), settings, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::Curve { points } = &annotation.shape else {
            return None;
        };
        stroke_path(annotation, points)
    }
}

/// Semi-transparent wide marker
#[derive(Debug, Default, Clone, Copy)]
pub struct HighlightTool;

impl HighlightTool {
    fn build(points: Vec<Point>, settings: &ToolSettings) -> Annotation {
        let base = AnnotationStyle::from_settings(settings);
        let style = AnnotationStyle {
            stroke_width: base.stroke_width * HIGHLIGHT_WIDTH_FACTOR,
            fill: None,
            ..base
        }
        .with_opacity(HIGHLIGHT_OPACITY);
        anchored(AnnotationShape::Highlight { points }, style)
    }
}

impl Tool for HighlightTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Highlight
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
        if !state.is_drawing {
            return;
        }
        capture(&mut state.points, event.point, HIGHLIGHT_MIN_DISTANCE);
        let annotation = Self::build(state.points.clone(), settings);
        state.preview = preview(self, &annotation, settings, ctx);
    }

    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        let points = release_points(event, state, HIGHLIGHT_MIN_DISTANCE)?;
        complete(self, Self::build(points, settings), settings, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::Highlight { points } = &annotation.shape else {
            return None;
        };
        // Stored opacity may come from an external document
        let renderable = stroke_path(annotation, points)?;
        Some(renderable.with_opacity(annotation.style.opacity.min(HIGHLIGHT_OPACITY)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::drag;

    fn recorded() -> Vec<(f32, f32)> {
        vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (20.0, 10.0)]
    }

    #[test]
    fn test_curve_keeps_points_in_order() {
        let mut ctx = SessionContext::default();
        let out = drag(&CurveTool, &recorded(), &ToolSettings::default(), &mut ctx).unwrap();
        let expected: Vec<Point> = recorded().iter().map(|(x, y)| Point::new(*x, *y)).collect();
        assert_eq!(out.annotation.shape, AnnotationShape::Curve { points: expected });
        assert_eq!(out.annotation.transform.anchor(), Point::ZERO);
    }

    #[test]
    fn test_curve_skips_close_points() {
        let mut ctx = SessionContext::default();
        let out = drag(
            &CurveTool,
            &[(0.0, 0.0), (1.0, 0.0), (1.5, 0.5), (5.0, 0.0), (6.0, 0.0)],
            &ToolSettings::default(),
            &mut ctx,
        )
        .unwrap();
        let AnnotationShape::Curve { points } = out.annotation.shape else {
            panic!("expected curve");
        };
        assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)]);
    }

    #[test]
    fn test_single_click_is_not_a_curve() {
        let mut ctx = SessionContext::default();
        assert!(drag(&CurveTool, &[(4.0, 4.0), (5.0, 4.0)], &ToolSettings::default(), &mut ctx).is_none());
    }

    #[test]
    fn test_highlight_opacity_is_fixed() {
        let mut ctx = SessionContext::default();
        let settings = ToolSettings {
            opacity: 1.0,
            stroke_width: 5.0,
            ..ToolSettings::default()
        };
        let out = drag(&HighlightTool, &recorded(), &settings, &mut ctx).unwrap();
        assert_eq!(out.annotation.style.opacity, HIGHLIGHT_OPACITY);
        assert!(out.annotation.style.opacity < 1.0);
        assert_eq!(out.annotation.style.stroke_width, 20.0);
        assert_eq!(out.renderable.opacity, HIGHLIGHT_OPACITY);
    }

    #[test]
    fn test_highlight_caps_loaded_opacity() {
        let ctx = SessionContext::default();
        let settings = ToolSettings::default();
        let mut annotation = HighlightTool::build(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
            &settings,
        );
        annotation.style.opacity = 1.0;
        let renderable = HighlightTool.reconstruct(&annotation, &settings, &ctx).unwrap();
        assert!(renderable.opacity < 1.0);
    }

    #[test]
    fn test_curve_rejects_short_or_non_finite() {
        let ctx = SessionContext::default();
        let settings = ToolSettings::default();
        let short = CurveTool::build(vec![Point::new(1.0, 1.0)], &settings);
        assert!(CurveTool.reconstruct(&short, &settings, &ctx).is_none());
        let nan = CurveTool::build(vec![Point::ZERO, Point::new(f32::NAN, 1.0)], &settings);
        assert!(CurveTool.reconstruct(&nan, &settings, &ctx).is_none());
    }
}
