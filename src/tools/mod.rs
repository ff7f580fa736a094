//! Drawing tools
//!
//! This module contains:
//! - The `Tool` trait: press/move/release gesture handling plus reconstruction
//! - Per-gesture scratch state shared by every tool
//! - `ToolRegistry`, the dispatch table keyed by annotation kind
//! - Helpers shared by the drag-based tools

pub mod arrows;
pub mod blur;
pub mod freehand;
pub mod marker;
pub mod shapes;
pub mod sticker;
pub mod text;

use std::collections::HashMap;
use std::fmt;

use crate::domain::{
    Annotation, AnnotationKind, Bounds, Point, ToolSettings, constrain_square, snap_angle,
};
use crate::scene::Renderable;
use crate::session::{PointerEvent, SessionContext};

pub use arrows::{BezierArrowTool, BigHeadArrowTool, LineArrowTool, LineTool};
pub use blur::BlurTool;
pub use freehand::{CurveTool, HighlightTool};
pub use marker::ListTool;
pub use shapes::{EllipseTool, RectangleTool};
pub use sticker::{InsertImageTool, StickerTool};
pub use text::{CalloutTool, TextTool};

/// Minimum extent (in at least one axis) of a shape or line gesture
pub const MIN_SHAPE_SIZE: f32 = 5.0;

/// Angle step for shift-constrained line tools, in degrees
pub const SNAP_ANGLE_DEGREES: f32 = 45.0;

// ============================================================================
// Gesture State
// ============================================================================

/// Scratch state for one press -> move* -> release gesture
#[derive(Debug, Clone, Default)]
pub struct GestureState {
    pub is_drawing: bool,
    pub start_point: Option<Point>,
    pub points: Vec<Point>,
    pub preview: Option<Renderable>,
}

impl GestureState {
    /// Start a gesture at `point`, seeding the captured points
    pub fn begin(&mut self, point: Point) {
        *self = Self {
            is_drawing: true,
            start_point: Some(point),
            points: vec![point],
            preview: None,
        };
    }

    /// Start point of the gesture in progress
    pub fn active_start(&self) -> Option<Point> {
        self.start_point.filter(|_| self.is_drawing)
    }

    /// End the gesture and return where it started
    pub fn finish(&mut self) -> Option<Point> {
        let start = self.active_start();
        self.reset();
        start
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A completed gesture
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub annotation: Annotation,
    pub renderable: Renderable,
}

// ============================================================================
// Tool Protocol
// ============================================================================

/// A drawing tool
///
/// Gesture handlers run synchronously inside a single input event.
/// `reconstruct` must return `None` for annotations of another kind and for
/// malformed data, never panic.
pub trait Tool {
    fn kind(&self) -> AnnotationKind;

    /// Pointer pressed; may return an initial preview
    fn on_press(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    ) -> Option<Renderable>;

    /// Pointer moved; refreshes `state.preview`
    fn on_move(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &SessionContext,
    );

    /// Pointer released; `None` when the gesture is below the tool's threshold
    fn on_release(
        &self,
        event: &PointerEvent,
        settings: &ToolSettings,
        state: &mut GestureState,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput>;

    /// Rebuild the renderable of a persisted annotation
    fn reconstruct(
        &self,
        annotation: &Annotation,
        settings: &ToolSettings,
        ctx: &SessionContext,
    ) -> Option<Renderable>;
}

// ============================================================================
// Registry
// ============================================================================

/// Dispatch table from annotation kind to tool
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<AnnotationKind, Box<dyn Tool>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding one tool per annotation kind
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(RectangleTool));
        registry.register(Box::new(EllipseTool));
        registry.register(Box::new(CurveTool));
        registry.register(Box::new(HighlightTool));
        registry.register(Box::new(BigHeadArrowTool));
        registry.register(Box::new(LineArrowTool));
        registry.register(Box::new(BezierArrowTool));
        registry.register(Box::new(LineTool));
        registry.register(Box::new(TextTool));
        registry.register(Box::new(CalloutTool));
        registry.register(Box::new(ListTool));
        registry.register(Box::new(StickerTool));
        registry.register(Box::new(InsertImageTool));
        registry.register(Box::new(BlurTool));
        registry
    }

    /// Register a tool under its kind, returning any tool it replaced
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Option<Box<dyn Tool>> {
        let kind = tool.kind();
        let previous = self.tools.insert(kind, tool);
        if previous.is_some() {
            log::debug!("Replaced tool {kind}");
        }
        previous
    }

    pub fn get(&self, kind: AnnotationKind) -> Option<&dyn Tool> {
        self.tools.get(&kind).map(|t| t.as_ref())
    }

    /// Look a tool up by its serialized type key, e.g. `"big_head_arrow"`
    pub fn get_by_name(&self, name: &str) -> Option<&dyn Tool> {
        self.get(name.parse().ok()?)
    }

    pub fn has(&self, kind: AnnotationKind) -> bool {
        self.tools.contains_key(&kind)
    }

    /// Registered tools in canonical kind order
    pub fn all(&self) -> Vec<&dyn Tool> {
        self.kinds()
            .into_iter()
            .filter_map(|kind| self.get(kind))
            .collect()
    }

    /// Registered kinds in canonical order
    pub fn kinds(&self) -> Vec<AnnotationKind> {
        AnnotationKind::ALL
            .into_iter()
            .filter(|kind| self.has(*kind))
            .collect()
    }

    /// Rebuild the renderable for any annotation through its own tool
    pub fn reconstruct(
        &self,
        annotation: &Annotation,
        settings: &ToolSettings,
        ctx: &SessionContext,
    ) -> Option<Renderable> {
        self.get(annotation.kind())?
            .reconstruct(annotation, settings, ctx)
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// How the shift modifier constrains a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    /// Equal width and height
    Square,
    /// Direction snapped to 45 degree steps
    Angle,
}

/// Effective drag end point after applying the shift constraint
pub(crate) fn drag_end(start: Point, event: &PointerEvent, constraint: Constraint) -> Point {
    if !event.modifiers.shift {
        return event.point;
    }
    match constraint {
        Constraint::Square => constrain_square(start, event.point),
        Constraint::Angle => snap_angle(start, event.point, SNAP_ANGLE_DEGREES),
    }
}

/// Box spanned by a drag, square when shift is held
pub(crate) fn drag_box(start: Point, event: &PointerEvent) -> Bounds {
    Bounds::from_corners(start, drag_end(start, event, Constraint::Square))
}

/// Preview renderable for an in-progress annotation
pub(crate) fn preview(
    tool: &dyn Tool,
    annotation: &Annotation,
    settings: &ToolSettings,
    ctx: &SessionContext,
) -> Option<Renderable> {
    tool.reconstruct(annotation, settings, ctx)
        .map(Renderable::into_preview)
}

/// Pair a finished annotation with its renderable
///
/// The renderable always comes from `reconstruct`, so anything a tool
/// creates can be rebuilt later from the stored annotation alone.
pub(crate) fn complete(
    tool: &dyn Tool,
    annotation: Annotation,
    settings: &ToolSettings,
    ctx: &SessionContext,
) -> Option<ToolOutput> {
    let renderable = tool
        .reconstruct(&annotation, settings, ctx)?
        .tagged(annotation.id);
    Some(ToolOutput {
        annotation,
        renderable,
    })
}

/// Renderable carrying the annotation's transform and opacity
///
/// `None` when the shared style or transform fields are malformed.
pub(crate) fn base_renderable(
    annotation: &Annotation,
    primitives: Vec<crate::scene::Primitive>,
) -> Option<Renderable> {
    if !annotation.style.is_valid() || !annotation.transform.is_valid() {
        return None;
    }
    Some(Renderable::new(annotation.transform, primitives).with_opacity(annotation.style.opacity))
}

/// Finite, strictly positive box size
pub(crate) fn positive_size(width: f32, height: f32) -> bool {
    width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::session::Modifiers;

    /// Run a full press/move/release gesture through a tool
    pub fn drag(
        tool: &dyn Tool,
        points: &[(f32, f32)],
        settings: &ToolSettings,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        drag_with(tool, points, Modifiers::NONE, settings, ctx)
    }

    pub fn drag_with(
        tool: &dyn Tool,
        points: &[(f32, f32)],
        modifiers: Modifiers,
        settings: &ToolSettings,
        ctx: &mut SessionContext,
    ) -> Option<ToolOutput> {
        let mut state = GestureState::default();
        let (first, rest) = points.split_first()?;
        let (last, moves) = rest.split_last().unwrap_or((first, &[]));
        tool.on_press(
            &PointerEvent::down(first.0, first.1).with_modifiers(modifiers),
            settings,
            &mut state,
            ctx,
        );
        for (x, y) in moves {
            tool.on_move(
                &PointerEvent::moved(*x, *y).with_modifiers(modifiers),
                settings,
                &mut state,
                ctx,
            );
        }
        tool.on_release(
            &PointerEvent::up(last.0, last.1).with_modifiers(modifiers),
            settings,
            &mut state,
            ctx,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::drag;
    use super::*;
    use crate::domain::StickerKind;

    fn gesture_for(kind: AnnotationKind) -> Vec<(f32, f32)> {
        match kind {
            AnnotationKind::Curve | AnnotationKind::Highlight => {
                vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (20.0, 10.0)]
            }
            _ => vec![(10.0, 10.0), (40.0, 30.0), (60.0, 50.0)],
        }
    }

    fn session() -> SessionContext {
        let mut ctx = SessionContext::default();
        ctx.selected_sticker = Some(StickerKind::Star);
        ctx.selected_image = Some("logo".to_string());
        ctx
    }

    #[test]
    fn test_defaults_register_every_kind() {
        let registry = ToolRegistry::with_defaults();
        assert_eq!(registry.kinds(), AnnotationKind::ALL.to_vec());
        assert_eq!(registry.all().len(), 14);
        for kind in AnnotationKind::ALL {
            assert_eq!(registry.get(kind).map(|t| t.kind()), Some(kind));
        }
        assert!(registry.get_by_name("big_head_arrow").is_some());
        assert!(registry.get_by_name("crop").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ToolRegistry::new();
        assert!(!registry.has(AnnotationKind::Line));
        assert!(registry.register(Box::new(LineTool)).is_none());
        assert!(registry.register(Box::new(LineTool)).is_some());
        assert_eq!(registry.kinds(), vec![AnnotationKind::Line]);
    }

    #[test]
    fn test_registry_round_trip_and_type_guard() {
        let registry = ToolRegistry::with_defaults();
        let settings = ToolSettings::default();
        let mut ctx = session();

        let outputs: Vec<ToolOutput> = AnnotationKind::ALL
            .into_iter()
            .map(|kind| {
                let tool = registry.get(kind).unwrap();
                let output = drag(tool, &gesture_for(kind), &settings, &mut ctx)
                    .unwrap_or_else(|| panic!("{kind} gesture produced nothing"));
                assert_eq!(output.annotation.kind(), kind);
                assert_eq!(output.renderable.tag.annotation_id, Some(output.annotation.id));
                output
            })
            .collect();

        for kind in AnnotationKind::ALL {
            let tool = registry.get(kind).unwrap();
            for output in &outputs {
                let rebuilt = tool.reconstruct(&output.annotation, &settings, &ctx);
                if output.annotation.kind() == kind {
                    assert!(rebuilt.is_some(), "{kind} failed to reconstruct its own output");
                } else {
                    assert!(
                        rebuilt.is_none(),
                        "{kind} accepted a {} annotation",
                        output.annotation.kind()
                    );
                }
            }
        }
    }

    #[test]
    fn test_round_trip_survives_json() {
        let registry = ToolRegistry::with_defaults();
        let settings = ToolSettings::default();
        let mut ctx = session();
        for kind in AnnotationKind::ALL {
            let tool = registry.get(kind).unwrap();
            let output = drag(tool, &gesture_for(kind), &settings, &mut ctx).unwrap();
            let json = serde_json::to_string(&output.annotation).unwrap();
            let back: Annotation = serde_json::from_str(&json).unwrap();
            assert_eq!(back, output.annotation);
            assert!(registry.reconstruct(&back, &settings, &ctx).is_some());
        }
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let registry = ToolRegistry::with_defaults();
        let settings = ToolSettings::default();
        let mut ctx = session();
        for tool in registry.all() {
            let mut state = GestureState::default();
            let out = tool.on_release(&PointerEvent::up(50.0, 50.0), &settings, &mut state, &mut ctx);
            assert!(out.is_none(), "{} completed without a press", tool.kind());
        }
    }
}
