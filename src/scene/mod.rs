//! Render surface abstraction
//!
//! This module contains:
//! - Renderables: the live, drawable form of an annotation or preview
//! - The narrow `Scene` trait the editor talks to
//! - An in-memory scene used headless and in tests
//! - The diff-based sync between the annotation list and a scene

pub mod memory;
pub mod sync;

use std::sync::Arc;

use image::RgbaImage;

use crate::domain::{AnnotationId, Color, Point, Transform};

pub use memory::MemoryScene;
pub use sync::{CanvasSync, SyncReport};

/// Identifier of an object inside a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderId(pub u64);

/// Which layer an object belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layer {
    /// Committed annotations, reconciled against the annotation list
    #[default]
    Annotation,
    /// Transient gesture previews
    Preview,
}

/// Stroke parameters of a primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
}

/// How a primitive is painted
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Brush {
    pub stroke: Option<StrokeStyle>,
    pub fill: Option<Color>,
}

impl Brush {
    pub fn stroke(color: Color, width: f32) -> Self {
        Self {
            stroke: Some(StrokeStyle { color, width }),
            fill: None,
        }
    }

    pub fn fill(color: Color) -> Self {
        Self {
            stroke: None,
            fill: Some(color),
        }
    }

    pub fn with_fill(self, fill: Option<Color>) -> Self {
        Self { fill, ..self }
    }
}

/// Path command in local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    Close,
}

/// Drawable building block, in the renderable's local coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect {
        origin: Point,
        width: f32,
        height: f32,
        brush: Brush,
    },
    Ellipse {
        center: Point,
        rx: f32,
        ry: f32,
        brush: Brush,
    },
    Path {
        ops: Vec<PathOp>,
        brush: Brush,
    },
    Text {
        origin: Point,
        text: String,
        font_family: String,
        font_size: f32,
        color: Color,
    },
    Image {
        pixels: Arc<RgbaImage>,
        width: f32,
        height: f32,
    },
    /// Stand-in drawn while an image asset is still decoding
    Placeholder { width: f32, height: f32 },
    /// Pixelates whatever is underneath when rasterised
    Pixelate {
        width: f32,
        height: f32,
        pixel_size: u32,
    },
}

/// Where a scene object came from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ObjectTag {
    pub annotation_id: Option<AnnotationId>,
    pub layer: Layer,
}

/// Live, on-screen representation of an annotation or preview
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    pub transform: Transform,
    pub opacity: f32,
    pub shadow: bool,
    pub selectable: bool,
    pub primitives: Vec<Primitive>,
    pub tag: ObjectTag,
}

impl Renderable {
    pub fn new(transform: Transform, primitives: Vec<Primitive>) -> Self {
        Self {
            transform,
            opacity: 1.0,
            shadow: false,
            selectable: true,
            primitives,
            tag: ObjectTag::default(),
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_shadow(mut self, shadow: bool) -> Self {
        self.shadow = shadow;
        self
    }

    /// Mark as a transient preview (never selectable)
    pub fn into_preview(mut self) -> Self {
        self.tag = ObjectTag {
            annotation_id: None,
            layer: Layer::Preview,
        };
        self.selectable = false;
        self
    }

    /// Tag as the renderable of a committed annotation
    pub fn tagged(mut self, annotation_id: AnnotationId) -> Self {
        self.tag = ObjectTag {
            annotation_id: Some(annotation_id),
            layer: Layer::Annotation,
        };
        self
    }

    /// Whether any primitive is a decode placeholder
    pub fn has_placeholder(&self) -> bool {
        self.primitives
            .iter()
            .any(|p| matches!(p, Primitive::Placeholder { .. }))
    }
}

/// A renderable together with its scene id
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: RenderId,
    pub renderable: Renderable,
}

/// Notifications a scene raises in response to user interaction
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// The active object changed (None = deselected)
    SelectionChanged(Option<RenderId>),
    /// The user moved, resized or rotated an object
    ObjectModified { id: RenderId, transform: Transform },
}

/// The rendering collaborator the editor drives
///
/// Any 2D backend that can hold ordered objects, track one active object
/// and report user edits can stand behind this trait.
pub trait Scene {
    /// Append an object on top, returning its id
    fn add(&mut self, renderable: Renderable) -> RenderId;

    /// Insert an object at a z-order position (clamped to the end)
    fn insert(&mut self, index: usize, renderable: Renderable) -> RenderId;

    /// Remove an object, deselecting it if it was active
    fn remove(&mut self, id: RenderId) -> Option<Renderable>;

    /// Swap the renderable behind an id, keeping its position and selection
    fn replace(&mut self, id: RenderId, renderable: Renderable) -> bool;

    /// All objects, bottom to top
    fn objects(&self) -> &[SceneObject];

    fn object(&self, id: RenderId) -> Option<&Renderable> {
        self.objects()
            .iter()
            .find(|o| o.id == id)
            .map(|o| &o.renderable)
    }

    /// Z-order position of an object
    fn index_of(&self, id: RenderId) -> Option<usize> {
        self.objects().iter().position(|o| o.id == id)
    }

    fn set_active_object(&mut self, id: Option<RenderId>);

    fn active_object(&self) -> Option<RenderId>;

    /// Drain pending selection/modification notifications
    fn take_events(&mut self) -> Vec<SceneEvent>;
}
