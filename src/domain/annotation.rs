//! Annotation types for drawing on screenshots
//!
//! Box shapes keep local geometry at `(0,0)-(w,h)` with the transform anchor
//! on the top-left corner. Point-based shapes keep raw canvas points; their
//! local geometry is the points relative to their own bounding-box minimum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::{Bounds, Point};
use super::style::{AnnotationStyle, Color, Transform};

/// Distance between the callout tip and the nearest box edge
pub const CALLOUT_POINTER_LENGTH: f32 = 20.0;

/// Unique, immutable annotation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Annotation type tag, also the key of the tool that creates it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Rectangle,
    Ellipse,
    Curve,
    Highlight,
    BigHeadArrow,
    LineArrow,
    BezierArrow,
    Line,
    Text,
    Callout,
    List,
    Sticker,
    InsertImage,
    Blur,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 14] = [
        AnnotationKind::Rectangle,
        AnnotationKind::Ellipse,
        AnnotationKind::Curve,
        AnnotationKind::Highlight,
        AnnotationKind::BigHeadArrow,
        AnnotationKind::LineArrow,
        AnnotationKind::BezierArrow,
        AnnotationKind::Line,
        AnnotationKind::Text,
        AnnotationKind::Callout,
        AnnotationKind::List,
        AnnotationKind::Sticker,
        AnnotationKind::InsertImage,
        AnnotationKind::Blur,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationKind::Rectangle => "rectangle",
            AnnotationKind::Ellipse => "ellipse",
            AnnotationKind::Curve => "curve",
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::BigHeadArrow => "big_head_arrow",
            AnnotationKind::LineArrow => "line_arrow",
            AnnotationKind::BezierArrow => "bezier_arrow",
            AnnotationKind::Line => "line",
            AnnotationKind::Text => "text",
            AnnotationKind::Callout => "callout",
            AnnotationKind::List => "list",
            AnnotationKind::Sticker => "sticker",
            AnnotationKind::InsertImage => "insert_image",
            AnnotationKind::Blur => "blur",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnnotationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown annotation type {s:?}"))
    }
}

/// Side of the callout box the pointer leaves from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerDirection {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

/// Built-in vector stickers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerKind {
    Star,
    Heart,
    Check,
    Cross,
    Question,
    Exclamation,
    ArrowRight,
}

/// Start/end capture shared by the arrow variants and the plain line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineGeometry {
    pub start_point: Point,
    pub end_point: Point,
    #[serde(default)]
    pub control_points: Vec<Point>,
}

impl LineGeometry {
    pub fn straight(start_point: Point, end_point: Point) -> Self {
        Self {
            start_point,
            end_point,
            control_points: Vec::new(),
        }
    }

    pub fn all_points(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(2 + self.control_points.len());
        points.push(self.start_point);
        points.extend(self.control_points.iter().copied());
        points.push(self.end_point);
        points
    }
}

/// Free text placed at a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(default)]
    pub has_shadow: bool,
}

/// Text box with a pointer towards a fixed tip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalloutContent {
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub pointer_direction: PointerDirection,
    /// Canvas-space pointer tip at creation time
    pub tip: Point,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
}

impl CalloutContent {
    /// Top-left of the box, computed backwards from the tip
    pub fn box_origin(&self) -> Point {
        callout_box_origin(self.tip, self.pointer_direction, self.width, self.height)
    }
}

/// Box origin for a callout whose pointer ends at `tip`
pub fn callout_box_origin(
    tip: Point,
    direction: PointerDirection,
    width: f32,
    height: f32,
) -> Point {
    match direction {
        PointerDirection::Bottom => Point::new(
            tip.x - width / 2.0,
            tip.y - CALLOUT_POINTER_LENGTH - height,
        ),
        PointerDirection::Top => Point::new(tip.x - width / 2.0, tip.y + CALLOUT_POINTER_LENGTH),
        PointerDirection::Left => Point::new(tip.x + CALLOUT_POINTER_LENGTH, tip.y - height / 2.0),
        PointerDirection::Right => Point::new(
            tip.x - CALLOUT_POINTER_LENGTH - width,
            tip.y - height / 2.0,
        ),
    }
}

/// Type-specific annotation geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AnnotationShape {
    Rectangle { width: f32, height: f32 },
    Ellipse { width: f32, height: f32 },
    Curve { points: Vec<Point> },
    Highlight { points: Vec<Point> },
    BigHeadArrow(LineGeometry),
    LineArrow(LineGeometry),
    BezierArrow(LineGeometry),
    Line(LineGeometry),
    Text(TextContent),
    Callout(CalloutContent),
    List { number: u32, radius: f32 },
    Sticker {
        sticker_type: StickerKind,
        width: f32,
        height: f32,
    },
    InsertImage {
        /// Asset key of the inserted image
        source: String,
        width: f32,
        height: f32,
    },
    Blur {
        width: f32,
        height: f32,
        pixel_size: u32,
    },
}

impl AnnotationShape {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationShape::Rectangle { .. } => AnnotationKind::Rectangle,
            AnnotationShape::Ellipse { .. } => AnnotationKind::Ellipse,
            AnnotationShape::Curve { .. } => AnnotationKind::Curve,
            AnnotationShape::Highlight { .. } => AnnotationKind::Highlight,
            AnnotationShape::BigHeadArrow(_) => AnnotationKind::BigHeadArrow,
            AnnotationShape::LineArrow(_) => AnnotationKind::LineArrow,
            AnnotationShape::BezierArrow(_) => AnnotationKind::BezierArrow,
            AnnotationShape::Line(_) => AnnotationKind::Line,
            AnnotationShape::Text(_) => AnnotationKind::Text,
            AnnotationShape::Callout(_) => AnnotationKind::Callout,
            AnnotationShape::List { .. } => AnnotationKind::List,
            AnnotationShape::Sticker { .. } => AnnotationKind::Sticker,
            AnnotationShape::InsertImage { .. } => AnnotationKind::InsertImage,
            AnnotationShape::Blur { .. } => AnnotationKind::Blur,
        }
    }

    /// Canvas point that local coordinates are measured from
    ///
    /// Zero for box shapes; the bounding-box minimum for point shapes; the
    /// box origin for callouts.
    pub fn local_origin(&self) -> Point {
        match self {
            AnnotationShape::Curve { points } | AnnotationShape::Highlight { points } => {
                Bounds::from_points(points)
                    .map(|b| b.origin())
                    .unwrap_or_default()
            }
            AnnotationShape::BigHeadArrow(line)
            | AnnotationShape::LineArrow(line)
            | AnnotationShape::BezierArrow(line)
            | AnnotationShape::Line(line) => Bounds::from_points(&line.all_points())
                .map(|b| b.origin())
                .unwrap_or_default(),
            AnnotationShape::Callout(callout) => callout.box_origin(),
            _ => Point::ZERO,
        }
    }

    /// Bounds of the geometry in local coordinates
    pub fn local_bounds(&self) -> Option<Bounds> {
        let origin = self.local_origin();
        let relative = |points: &[Point]| {
            let local: Vec<Point> = points.iter().map(|p| *p - origin).collect();
            Bounds::from_points(&local)
        };
        let sized = |w: f32, h: f32| Some(Bounds::from_corners(Point::ZERO, Point::new(w, h)));
        match self {
            AnnotationShape::Rectangle { width, height }
            | AnnotationShape::Ellipse { width, height }
            | AnnotationShape::Sticker { width, height, .. }
            | AnnotationShape::InsertImage { width, height, .. }
            | AnnotationShape::Blur { width, height, .. } => sized(*width, *height),
            AnnotationShape::Curve { points } | AnnotationShape::Highlight { points } => {
                relative(points)
            }
            AnnotationShape::BigHeadArrow(line)
            | AnnotationShape::LineArrow(line)
            | AnnotationShape::BezierArrow(line)
            | AnnotationShape::Line(line) => relative(&line.all_points()),
            AnnotationShape::Text(text) => {
                let lines = text.text.lines().count().max(1) as f32;
                let longest = text.text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
                sized(
                    longest as f32 * text.font_size * 0.6,
                    lines * text.font_size * 1.2,
                )
            }
            AnnotationShape::Callout(callout) => {
                let tip = callout.tip - origin;
                Some(
                    Bounds::from_corners(Point::ZERO, Point::new(callout.width, callout.height))
                        .union(&Bounds::from_corners(tip, tip)),
                )
            }
            AnnotationShape::List { radius, .. } => Some(Bounds::from_corners(
                Point::new(-radius, -radius),
                Point::new(*radius, *radius),
            )),
        }
    }
}

/// A persisted overlay record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(flatten)]
    pub shape: AnnotationShape,
    pub style: AnnotationStyle,
    pub transform: Transform,
    #[serde(default)]
    pub locked: bool,
}

impl Annotation {
    /// Create an annotation with a freshly generated id
    pub fn new(shape: AnnotationShape, style: AnnotationStyle, transform: Transform) -> Self {
        Self {
            id: AnnotationId::new(),
            shape,
            style,
            transform,
            locked: false,
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        self.shape.kind()
    }

    /// Same annotation (same id) with a different transform
    pub fn with_transform(&self, transform: Transform) -> Self {
        Self {
            transform,
            ..self.clone()
        }
    }

    /// Same annotation moved by an offset
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        self.with_transform(self.transform.translated(dx, dy))
    }

    /// Axis-aligned canvas bounds after the transform is applied
    pub fn canvas_bounds(&self) -> Option<Bounds> {
        let local = self.shape.local_bounds()?;
        let corners = [
            Point::new(local.min_x, local.min_y),
            Point::new(local.max_x, local.min_y),
            Point::new(local.max_x, local.max_y),
            Point::new(local.min_x, local.max_y),
        ]
        .map(|p| self.transform.map_point(p));
        Bounds::from_points(&corners)
    }
}

/// Parse an annotation list, dropping items that fail to decode
///
/// A document may have been written by code with a newer schema; one bad
/// record must not cost the user the rest of the list.
pub fn load_annotations(json: &str) -> anyhow::Result<Vec<Annotation>> {
    let items: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let total = items.len();
    let annotations: Vec<Annotation> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Annotation>(item) {
            Ok(annotation) => Some(annotation),
            Err(err) => {
                log::warn!("Dropping annotation #{index}: {err}");
                None
            }
        })
        .collect();
    log::debug!("Loaded {} of {} annotations", annotations.len(), total);
    Ok(annotations)
}
