//! Blur (pixelation) region tool
//!
//! The annotation stores only the region and block size; pixels are
//! averaged when the scene is rasterised, so the block size can change
//! until export.

use crate::domain::{
    Annotation, AnnotationKind, AnnotationShape, AnnotationStyle, Bounds, ToolSettings, Transform,
};
use crate::scene::{Primitive, Renderable};
use crate::session::state::{MAX_BLUR_PIXEL_SIZE, MIN_BLUR_PIXEL_SIZE};
use crate::session::{PointerEvent, SessionContext};

use super::{
    GestureState, MIN_SHAPE_SIZE, Tool, ToolOutput, base_renderable, complete, drag_box,
    positive_size, preview,
};

/// Pixelated rectangle
#[derive(Debug, Default, Clone, Copy)]
pub struct BlurTool;

impl BlurTool {
    fn build(bounds: &Bounds, pixel_size: u32, settings: &ToolSettings) -> Annotation {
        Annotation::new(
            AnnotationShape::Blur {
                width: bounds.width(),
                height: bounds.height(),
                pixel_size,
            },
            AnnotationStyle {
                fill: None,
                opacity: 1.0,
                ..AnnotationStyle::from_settings(settings)
            },
            Transform::at(bounds.origin()),
        )
    }
}

impl Tool for BlurTool {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Blur
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
        let bounds = drag_box(start, event);
        let annotation = Self::build(&bounds, ctx.blur_pixel_size(), settings);
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
        let annotation = Self::build(&bounds, ctx.blur_pixel_size(), settings);
        complete(self, annotation, settings, ctx)
    }

    fn reconstruct(
        &self,
        annotation: &Annotation,
        _settings: &ToolSettings,
        _ctx: &SessionContext,
    ) -> Option<Renderable> {
        let AnnotationShape::Blur {
            width,
            height,
            pixel_size,
        } = &annotation.shape
        else {
            return None;
        };
        if !positive_size(*width, *height) {
            return None;
        }
        base_renderable(
            annotation,
            vec![Primitive::Pixelate {
                width: *width,
                height: *height,
                pixel_size: (*pixel_size).clamp(MIN_BLUR_PIXEL_SIZE, MAX_BLUR_PIXEL_SIZE),
            }],
        )
    }
}
