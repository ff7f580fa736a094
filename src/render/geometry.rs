//! Shared geometry calculations for annotations
//!
//! This module contains constants and math shared between the tools that
//! build renderables and the rasteriser that draws them.

use crate::domain::Point;
use crate::scene::PathOp;

/// Arrow geometry constants
pub mod arrow {
    use crate::domain::Point;

    /// Open V head arm angle from the shaft in radians (30 degrees)
    pub const HEAD_ANGLE: f32 = 0.523_598_8; // 30.0_f32.to_radians()
    /// Open V head arm length as a multiple of the stroke width
    pub const LINE_HEAD_FACTOR: f32 = 3.0;
    /// Filled head length as a multiple of the stroke width
    pub const BIG_HEAD_FACTOR: f32 = 4.0;

    /// Calculate the two arm endpoints of an open head at `tip`
    ///
    /// `direction` points along the shaft towards the tip; it need not be
    /// normalized. Returns None for a zero-length direction.
    pub fn head_points(tip: Point, direction: Point, length: f32) -> Option<(Point, Point)> {
        let back = direction.normalized()?.scale(-length);
        // Rotate the backwards vector each way to get the two arms
        let head1 = tip + back.rotate(HEAD_ANGLE);
        let head2 = tip + back.rotate(-HEAD_ANGLE);
        Some((head1, head2))
    }

    /// Filled triangular head: returns the shaft end (centre of the head
    /// base) and the three triangle corners, tip first
    pub fn filled_head(tip: Point, direction: Point, length: f32) -> Option<(Point, [Point; 3])> {
        let dir = direction.normalized()?;
        let base = tip - dir.scale(length);
        // Base width equals the head length
        let half = dir.perpendicular().scale(length / 2.0);
        Some((base, [tip, base + half, base - half]))
    }
}

/// Shape (rectangle/ellipse) geometry constants
pub mod shape {
    /// Ellipse bezier approximation constant: 4/3 * (sqrt(2) - 1)
    pub const BEZIER_K: f32 = 0.552_284_8;
}

/// Sequence marker geometry
pub mod marker {
    /// Circle radius of a new marker
    pub const RADIUS: f32 = 15.0;

    /// Font scale so wider numbers still fit inside the circle
    pub fn font_scale(number: u32) -> f32 {
        match number {
            n if n > 99 => 0.7,
            n if n > 9 => 0.85,
            _ => 1.0,
        }
    }
}

/// Smooth freehand path: quadratic segments through the midpoints of
/// consecutive points, using each captured point as the control
pub fn smooth_path(points: &[Point]) -> Vec<PathOp> {
    let mut ops = Vec::with_capacity(points.len() + 1);
    let Some((first, rest)) = points.split_first() else {
        return ops;
    };
    ops.push(PathOp::MoveTo(*first));
    match rest {
        [] => {}
        [only] => ops.push(PathOp::LineTo(*only)),
        _ => {
            for pair in rest.windows(2) {
                ops.push(PathOp::QuadTo(pair[0], pair[0].midpoint(pair[1])));
            }
            if let Some(last) = rest.last() {
                ops.push(PathOp::LineTo(*last));
            }
        }
    }
    ops
}

/// Build an ellipse path using cubic bezier curves
pub fn ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<tiny_skia::Path> {
    let kx = rx * shape::BEZIER_K;
    let ky = ry * shape::BEZIER_K;

    let mut pb = tiny_skia::PathBuilder::new();

    // Start at top
    pb.move_to(cx, cy - ry);

    // Top to right
    pb.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);

    // Right to bottom
    pb.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);

    // Bottom to left
    pb.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);

    // Left to top
    pb.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);

    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_points_symmetric() {
        let tip = Point::new(100.0, 0.0);
        let (a, b) = arrow::head_points(tip, Point::new(1.0, 0.0), 9.0).unwrap();
        assert!((a.x - b.x).abs() < 1e-4);
        assert!((a.y + b.y).abs() < 1e-4);
        assert!((tip.distance(a) - 9.0).abs() < 1e-4);
        assert!(a.x < tip.x);
        assert!(arrow::head_points(tip, Point::ZERO, 9.0).is_none());
    }

    #[test]
    fn test_filled_head_base() {
        let (shaft_end, tri) =
            arrow::filled_head(Point::new(50.0, 10.0), Point::new(1.0, 0.0), 12.0).unwrap();
        assert_eq!(shaft_end, Point::new(38.0, 10.0));
        assert!((tri[1].distance(tri[2]) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_marker_font_scale() {
        assert_eq!(marker::font_scale(7), 1.0);
        assert_eq!(marker::font_scale(42), 0.85);
        assert_eq!(marker::font_scale(100), 0.7);
    }

    #[test]
    fn test_smooth_path_uses_midpoints() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        let ops = smooth_path(&pts);
        assert_eq!(ops[0], PathOp::MoveTo(pts[0]));
        assert_eq!(ops[1], PathOp::QuadTo(pts[1], Point::new(10.0, 5.0)));
        assert_eq!(ops.last(), Some(&PathOp::LineTo(pts[2])));
        assert!(smooth_path(&[]).is_empty());
    }
}
