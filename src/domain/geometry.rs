//! Geometric types for canvas coordinates and image regions

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Canvas-space coordinate (device independent, after DPR normalization)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }

    /// Length of this point treated as a vector
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, `None` for a zero-length vector
    pub fn normalized(self) -> Option<Point> {
        let len = self.length();
        if len <= f32::EPSILON {
            return None;
        }
        Some(Point::new(self.x / len, self.y / len))
    }

    /// Vector rotated 90 degrees counter-clockwise (in y-down space this
    /// points to the left of the direction of travel)
    pub fn perpendicular(self) -> Point {
        Point::new(-self.y, self.x)
    }

    pub fn scale(self, k: f32) -> Point {
        Point::new(self.x * k, self.y * k)
    }

    /// Linear interpolation towards `other`
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn midpoint(self, other: Point) -> Point {
        self.lerp(other, 0.5)
    }

    /// Rotate around the origin by `angle` radians
    pub fn rotate(self, angle: f32) -> Point {
        let (sin, cos) = angle.sin_cos();
        Point::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned bounding box in canvas space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    /// Normalized box spanned by two arbitrary corners
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Smallest box containing every point, `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Bounds::from_corners(*first, *first);
        for p in rest {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn origin(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// Larger of width and height
    pub fn max_dimension(&self) -> f32 {
        self.width().max(self.height())
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Point on a quadratic bezier at parameter `t` in [0, 1]
pub fn quadratic_point(p0: Point, control: Point, p1: Point, t: f32) -> Point {
    let mt = 1.0 - t;
    Point::new(
        mt * mt * p0.x + 2.0 * mt * t * control.x + t * t * p1.x,
        mt * mt * p0.y + 2.0 * mt * t * control.y + t * t * p1.y,
    )
}

/// First derivative of a quadratic bezier at parameter `t`
pub fn quadratic_tangent(p0: Point, control: Point, p1: Point, t: f32) -> Point {
    Point::new(
        2.0 * (1.0 - t) * (control.x - p0.x) + 2.0 * t * (p1.x - control.x),
        2.0 * (1.0 - t) * (control.y - p0.y) + 2.0 * t * (p1.y - control.y),
    )
}

/// Control point offset perpendicular from the segment midpoint by
/// `ratio` of the segment length
pub fn perpendicular_control_point(start: Point, end: Point, ratio: f32) -> Point {
    let mid = start.midpoint(end);
    let delta = end - start;
    let length = delta.length();
    match delta.normalized() {
        Some(dir) => mid + dir.perpendicular().scale(length * ratio),
        None => mid,
    }
}

/// Height that keeps the aspect ratio when the width changes
///
/// `round(new_width * original_height / original_width)`
pub fn calculate_proportional_height(
    new_width: u32,
    original_width: u32,
    original_height: u32,
) -> u32 {
    if original_width == 0 {
        return 0;
    }
    (f64::from(new_width) * f64::from(original_height) / f64::from(original_width)).round() as u32
}

/// Width that keeps the aspect ratio when the height changes
///
/// `round(new_height * original_width / original_height)`
pub fn calculate_proportional_width(
    new_height: u32,
    original_width: u32,
    original_height: u32,
) -> u32 {
    if original_height == 0 {
        return 0;
    }
    (f64::from(new_height) * f64::from(original_width) / f64::from(original_height)).round() as u32
}

/// Move `current` so the box spanned from `start` is a square
pub fn constrain_square(start: Point, current: Point) -> Point {
    let dx = current.x - start.x;
    let dy = current.y - start.y;
    let side = dx.abs().max(dy.abs());
    Point::new(start.x + side * dx.signum(), start.y + side * dy.signum())
}

/// Snap the direction from `start` to `current` to multiples of `step_degrees`
pub fn snap_angle(start: Point, current: Point, step_degrees: f32) -> Point {
    let delta = current - start;
    let length = delta.length();
    if length <= f32::EPSILON || step_degrees <= 0.0 {
        return current;
    }
    let step = step_degrees.to_radians();
    let angle = (delta.y.atan2(delta.x) / step).round() * step;
    start + Point::new(angle.cos(), angle.sin()).scale(length)
}

/// Integer rectangle in image pixel space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Create a new rectangle from coordinates
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from an origin and a size
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Round a canvas-space box outwards to whole pixels
    pub fn enclosing(bounds: &Bounds) -> Self {
        Self::new(
            bounds.min_x.floor() as i32,
            bounds.min_y.floor() as i32,
            bounds.max_x.ceil() as i32,
            bounds.max_y.ceil() as i32,
        )
    }

    /// Calculate the intersection of two rectangles
    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left < right && top < bottom {
            Some(Rect {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// Get the width of the rectangle
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Get the height of the rectangle
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportional_height() {
        assert_eq!(calculate_proportional_height(400, 800, 400), 200);
        assert_eq!(calculate_proportional_height(333, 1000, 500), 167);
        assert_eq!(calculate_proportional_height(10, 0, 500), 0);
    }

    #[test]
    fn test_proportional_width() {
        assert_eq!(calculate_proportional_width(200, 800, 400), 400);
        assert_eq!(calculate_proportional_width(1, 3, 2), 2);
    }

    #[test]
    fn test_bounds_from_points() {
        let pts = [
            Point::new(10.0, 5.0),
            Point::new(-2.0, 8.0),
            Point::new(4.0, -1.0),
        ];
        let b = Bounds::from_points(&pts).unwrap();
        assert_eq!(b.origin(), Point::new(-2.0, -1.0));
        assert_eq!(b.width(), 12.0);
        assert_eq!(b.height(), 9.0);
        assert!(Bounds::from_points(&[]).is_none());
    }

    #[test]
    fn test_quadratic_endpoints() {
        let p0 = Point::new(0.0, 0.0);
        let c = Point::new(50.0, 40.0);
        let p1 = Point::new(100.0, 0.0);
        assert_eq!(quadratic_point(p0, c, p1, 0.0), p0);
        assert_eq!(quadratic_point(p0, c, p1, 1.0), p1);
        let tangent = quadratic_tangent(p0, c, p1, 1.0);
        assert_eq!(tangent, Point::new(100.0, -80.0));
    }

    #[test]
    fn test_perpendicular_control_point() {
        let c = perpendicular_control_point(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 0.3);
        assert!((c.x - 50.0).abs() < 1e-4);
        assert!((c.y.abs() - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_constrain_square_and_snap() {
        let p = constrain_square(Point::new(0.0, 0.0), Point::new(10.0, -4.0));
        assert_eq!(p, Point::new(10.0, -10.0));

        let snapped = snap_angle(Point::new(0.0, 0.0), Point::new(10.0, 1.0), 45.0);
        assert!((snapped.y).abs() < 1e-4);
        assert!((snapped.x - 101.0_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_rect_intersect() {
        let a = Rect::from_xywh(0, 0, 100, 100);
        let b = Rect::from_xywh(50, 50, 100, 100);
        assert_eq!(a.intersect(b), Some(Rect::new(50, 50, 100, 100)));
        assert_eq!(a.intersect(Rect::from_xywh(200, 0, 5, 5)), None);
    }
}
