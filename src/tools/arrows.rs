//! Arrow and line tools
//!
//! All four tools capture a start and end point; they differ only in the
//! head drawn at the end:
//! - big-head arrow: filled triangle, length 4x stroke width
//! - line arrow: open V at +-30 degrees, length 3x stroke width
//! - bezier arrow: quadratic curve with an automatic control point, V head
//!   tangent to the curve
//! - line: no head

use crate::domain::{
    Annotation, AnnotationKind, AnnotationShape, AnnotationStyle, Bounds, LineGeometry, Point,
    ToolSettings, Transform, perpendicular_control_point, quadratic_tangent,
};
use crate::render::geometry::arrow;
use crate::scene::{Brush, PathOp, Primitive, Renderable};
use crate::session::{PointerEvent, SessionContext};

use super::{
    Constraint, GestureState, MIN_SHAPE_SIZE, Tool, ToolOutput, base_renderable, complete,
    drag_end, preview,
};

/// Control point offset of a new bezier arrow, as a fraction of its length
pub const BEZIER_CURVATURE: f32 = 0.3;

fn build(kind: AnnotationKind, start: Point, end: Point, settings: &ToolSettings) -> Annotation {
    let geometry = LineGeometry::straight(start, end);
    let shape = match kind {
        AnnotationKind::BigHeadArrow => AnnotationShape::BigHeadArrow(geometry),
        AnnotationKind::LineArrow => AnnotationShape::LineArrow(geometry),
        AnnotationKind::BezierArrow => AnnotationShape::BezierArrow(LineGeometry {
            control_points: vec![perpendicular_control_point(start, end, BEZIER_CURVATURE)],
            ..geometry
        }),
        _ => AnnotationShape::Line(geometry),
    };
    let style = AnnotationStyle {
        fill: None,
        ..AnnotationStyle::from_settings(settings)
    };
    let transform = Transform::at(shape.local_origin());
    Annotation::new(shape, style, transform)
}

// ============================================================================
// Shared gesture handling
// ============================================================================

fn press(event: &PointerEvent, state: &mut GestureState) -> Option<Renderable> {
    state.begin(event.point);
    None
}

fn move_preview(
    tool: &dyn Tool,
    event: &PointerEvent,
    settings: &ToolSettings,
    state: &mut GestureState,
    ctx: &SessionContext,
) {
    let Some(start) = state.active_start() else {
        return;
    };
    let end = drag_end(start, event, Constraint::Angle);
    let annotation = build(tool.kind(), start, end, settings);
    state.preview = preview(tool, &annotation, settings, ctx);
}

fn release(
    tool: &dyn Tool,
    event: &PointerEvent,
    settings: &ToolSettings,
    state: &mut GestureState,
    ctx: &SessionContext,
) -> Option<ToolOutput> {
    let start = state.finish()?;
    let end = drag_end(start, event, Constraint::Angle);
    if Bounds::from_corners(start, end).max_dimension() < MIN_SHAPE_SIZE {
        return None;
    }
    complete(tool, build(tool.kind(), start, end, settings), settings, ctx)
}

/// Line geometry in local coordinates, `None` if malformed
fn local_line(annotation: &Annotation, line: &LineGeometry) -> Option<LineGeometry> {
    let points = line.all_points();
    if !points.iter().all(|p| p.is_finite()) || line.start_point == line.end_point {
        return None;
    }
    let origin = annotation.shape.local_origin();
    Some(LineGeometry {
        start_point: line.start_point - origin,
        end_point: line.end_point - origin,
        control_points: line.control_points.iter().map(|p| *p - origin).collect(),
    })
}

fn stroke(annotation: &Annotation) -> Brush {
    Brush::stroke(annotation.style.color, annotation.style.stroke_width)
}

/// Open V head as two strokes meeting at `tip`
fn open_head(tip: Point, direction: Point, length: f32) -> Vec<PathOp> {
    match arrow::head_points(tip, direction, length) {
        Some((head1, head2)) => vec![
            PathOp::MoveTo(head1),
            PathOp::LineTo(tip),
            PathOp::LineTo(head2),
        ],
        None => Vec::new(),
    }
}

// ============================================================================
// Tools
// ============================================================================

/// Straight arrow with a filled triangular head
#[derive(Debug, Default, Clone, Copy)]
pub struct BigHeadArrowTool;

impl Tool for BigHeadArrowTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::BigHeadArrow
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        _settings: &ToolSettings,
        state: &mut GestureState,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        press(event, state)
    }

    fn on_move(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) {
        move_preview(self, event, settings, state, ctx);
    }

    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        release(self, event, settings, state, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::BigHeadArrow(line) = &annotation.shape else {
            return None;
        };
        let local = local_line(annotation, line)?;
        let head_length = annotation.style.stroke_width * arrow::BIG_HEAD_FACTOR;
        let direction = local.end_point - local.start_point;
        let (shaft_end, [tip, left, right]) =
            arrow::filled_head(local.end_point, direction, head_length)?;
        base_renderable(
            annotation,
            vec![
                Primitive::Path {
                    ops: vec![PathOp::MoveTo(local.start_point), PathOp::LineTo(shaft_end)],
                    brush: stroke(annotation),
                },
                Primitive::Path {
                    ops: vec![
                        PathOp::MoveTo(tip),
                        PathOp::LineTo(left),
                        PathOp::LineTo(right),
                        PathOp::Close,
                    ],
                    brush: Brush::fill(annotation.style.color),
                },
            ],
        )
    }
}

/// Straight arrow with an open V head
#[derive(Debug, Default, Clone, Copy)]
pub struct LineArrowTool;

impl Tool for LineArrowTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::LineArrow
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        _settings: &ToolSettings,
        state: &mut GestureState,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        press(event, state)
    }

    fn on_move(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) {
        move_preview(self, event, settings, state, ctx);
    }

    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        release(self, event, settings, state, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::LineArrow(line) = &annotation.shape else {
            return None;
        };
        let local = local_line(annotation, line)?;
        let head_length = annotation.style.stroke_width * arrow::LINE_HEAD_FACTOR;
        let mut ops = vec![
            PathOp::MoveTo(local.start_point),
            PathOp::LineTo(local.end_point),
        ];
        ops.extend(open_head(
            local.end_point,
            local.end_point - local.start_point,
            head_length,
        ));
        base_renderable(
            annotation,
            vec![Primitive::Path {
                ops,
                brush: stroke(annotation),
            }],
        )
    }
}

/// Curved arrow; the control point is offset perpendicular to the segment
#[derive(Debug, Default, Clone, Copy)]
pub struct BezierArrowTool;

impl Tool for BezierArrowTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::BezierArrow
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        _settings: &ToolSettings,
        state: &mut GestureState,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        press(event, state)
    }

    fn on_move(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) {
        move_preview(self, event, settings, state, ctx);
    }

    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        release(self, event, settings, state, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::BezierArrow(line) = &annotation.shape else {
            return None;
        };
        let local = local_line(annotation, line)?;
        let control = *local.control_points.first()?;
        let head_length = annotation.style.stroke_width * arrow::LINE_HEAD_FACTOR;
        let tangent = quadratic_tangent(local.start_point, control, local.end_point, 1.0);
        let mut ops = vec![
            PathOp::MoveTo(local.start_point),
            PathOp::QuadTo(control, local.end_point),
        ];
        ops.extend(open_head(local.end_point, tangent, head_length));
        base_renderable(
            annotation,
            vec![Primitive::Path {
                ops,
                brush: stroke(annotation),
            }],
        )
    }
}

/// Plain straight line
#[derive(Debug, Default, Clone, Copy)]
pub struct LineTool;

impl Tool for LineTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Line
    }

    fn on_press(
        &self,
        event: &PointerEvent,
        _settings: &ToolSettings,
        state: &mut GestureState,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        press(event, state)
    }

    fn on_move(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) {
        move_preview(self, event, settings, state, ctx);
    }

    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        release(self, event, settings, state, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::Line(line) = &annotation.shape else {
            return None;
        };
        let local = local_line(annotation, line)?;
        base_renderable(
            annotation,
            vec![Primitive::Path {
                ops: vec![PathOp::MoveTo(local.start_point), PathOp::LineTo(local.end_point)],
                brush: stroke(annotation),
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
    fn test_bezier_always_has_control_point() {
        let mut ctx = SessionContext::default();
        let out = drag(
            &BezierArrowTool,
            &[(0.0, 0.0), (100.0, 0.0)],
            &ToolSettings::default(),
            &mut ctx,
        )
        .unwrap();
        let AnnotationShape::BezierArrow(line) = &out.annotation.shape else {
            panic!("expected bezier arrow");
        };
        assert_eq!(line.control_points.len(), 1);
        // 30% of the 100 unit segment, perpendicular to it
        assert_eq!(line.control_points[0], Point::new(50.0, 30.0));
    }

    #[test]
    fn test_bezier_without_controls_is_malformed() {
        let ctx = SessionContext::default();
        let settings = ToolSettings::default();
        let mut annotation = build(
            AnnotationKind::BezierArrow,
            Point::ZERO,
            Point::new(40.0, 0.0),
            &settings,
        );
        if let AnnotationShape::BezierArrow(line) = &mut annotation.shape {
            line.control_points.clear();
        }
        assert!(BezierArrowTool.reconstruct(&annotation, &settings, &ctx).is_none());
    }

    #[test]
    fn test_short_line_rejected() {
        let mut ctx = SessionContext::default();
        let settings = ToolSettings::default();
        for tool in [
            &BigHeadArrowTool as &dyn Tool,
            &LineArrowTool,
            &BezierArrowTool,
            &LineTool,
        ] {
            assert!(drag(tool, &[(0.0, 0.0), (3.0, 2.0)], &settings, &mut ctx).is_none());
            assert!(drag(tool, &[(0.0, 0.0), (6.0, 2.0)], &settings, &mut ctx).is_some());
        }
    }

    #[test]
    fn test_big_head_shaft_stops_at_head_base() {
        let mut ctx = SessionContext::default();
        let settings = ToolSettings {
            stroke_width: 2.0,
            ..ToolSettings::default()
        };
        let out = drag(&BigHeadArrowTool, &[(0.0, 0.0), (50.0, 0.0)], &settings, &mut ctx).unwrap();
        let Primitive::Path { ops, .. } = &out.renderable.primitives[0] else {
            panic!("expected shaft path");
        };
        assert_eq!(ops[1], PathOp::LineTo(Point::new(42.0, 0.0)));
    }

    #[test]
    fn test_shift_snaps_line_angle() {
        let mut ctx = SessionContext::default();
        let out = drag_with(
            &LineTool,
            &[(0.0, 0.0), (100.0, 8.0)],
            Modifiers::shift(),
            &ToolSettings::default(),
            &mut ctx,
        )
        .unwrap();
        let AnnotationShape::Line(line) = &out.annotation.shape else {
            panic!("expected line");
        };
        assert!(line.end_point.y.abs() < 1e-3);
        assert!(line.control_points.is_empty());
    }

    #[test]
    fn test_anchor_is_bounds_origin() {
        let mut ctx = SessionContext::default();
        let out = drag(
            &LineArrowTool,
            &[(80.0, 20.0), (30.0, 60.0)],
            &ToolSettings::default(),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(out.annotation.transform.anchor(), Point::new(30.0, 20.0));
    }
}
