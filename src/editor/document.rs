//! The editable document: source image, annotation list and its history

use std::sync::Arc;

use image::RgbaImage;

use crate::domain::{Annotation, AnnotationId, AnnotationKind, Point, RecentColors, ToolSettings};
use crate::export::ExportConfig;
use crate::history::{ActionType, HistoryEngine};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 8.0;

/// One history state: the image and the annotations drawn on it
///
/// The image is shared, so annotation-only edits do not copy pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSnapshot {
    pub image: Arc<RgbaImage>,
    pub annotations: Vec<Annotation>,
}

/// Aggregate state of one editing session
#[derive(Debug)]
pub struct EditorDocument {
    history: HistoryEngine<EditorSnapshot>,
    pub selected: Option<AnnotationId>,
    pub active_tool: AnnotationKind,
    pub settings: ToolSettings,
    zoom: f32,
    pub pan: Point,
    /// Watermark, frame, padding and encoding used by `Editor::export`
    pub export: ExportConfig,
    pub recent_colors: RecentColors,
}

impl EditorDocument {
    pub fn new(image: RgbaImage) -> Self {
        Self::from_history(HistoryEngine::new(EditorSnapshot {
            image: Arc::new(image),
            annotations: Vec::new(),
        }))
    }

    /// Document whose history keeps at most `limit` commands
    pub fn with_history_limit(image: RgbaImage, limit: usize) -> Self {
        Self::from_history(HistoryEngine::with_limit(
            EditorSnapshot {
                image: Arc::new(image),
                annotations: Vec::new(),
            },
            limit,
        ))
    }

    fn from_history(history: HistoryEngine<EditorSnapshot>) -> Self {
        Self {
            history,
            selected: None,
            active_tool: AnnotationKind::Rectangle,
            settings: ToolSettings::default(),
            zoom: 1.0,
            pan: Point::ZERO,
            export: ExportConfig::default(),
            recent_colors: RecentColors::default(),
        }
    }

    pub fn image(&self) -> &Arc<RgbaImage> {
        &self.history.current().image
    }

    /// Annotations bottom to top
    pub fn annotations(&self) -> &[Annotation] {
        &self.history.current().annotations
    }

    pub fn find(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations().iter().find(|a| a.id == id)
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected.and_then(|id| self.find(id))
    }

    /// Record a new annotation list over the same image
    pub fn commit(&mut self, annotations: Vec<Annotation>, action: ActionType) {
        let image = Arc::clone(self.image());
        self.history.push_state(EditorSnapshot { image, annotations }, action);
    }

    /// Record a new image together with the adjusted annotations
    pub fn commit_image(
        &mut self,
        image: RgbaImage,
        annotations: Vec<Annotation>,
        action: ActionType,
    ) {
        self.history.push_state(
            EditorSnapshot {
                image: Arc::new(image),
                annotations,
            },
            action,
        );
    }

    /// Replace one annotation (matched by id) and record it
    pub fn commit_replace(&mut self, annotation: Annotation, action: ActionType) -> bool {
        let mut annotations = self.annotations().to_vec();
        let Some(slot) = annotations.iter_mut().find(|a| a.id == annotation.id) else {
            return false;
        };
        *slot = annotation;
        self.commit(annotations, action);
        true
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }

    pub fn history(&self) -> &HistoryEngine<EditorSnapshot> {
        &self.history
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the view zoom; export always renders at scale 1
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnnotationShape, AnnotationStyle, Transform};

    fn rect() -> Annotation {
        Annotation::new(
            AnnotationShape::Rectangle {
                width: 10.0,
                height: 10.0,
            },
            AnnotationStyle::from_settings(&ToolSettings::default()),
            Transform::default(),
        )
    }

    #[test]
    fn test_annotation_commits_share_image() {
        let mut doc = EditorDocument::new(RgbaImage::new(4, 4));
        let before = Arc::clone(doc.image());
        doc.commit(vec![rect()], ActionType::Add);
        assert!(Arc::ptr_eq(&before, doc.image()));
        assert_eq!(doc.annotations().len(), 1);
    }

    #[test]
    fn test_image_commit_is_undoable() {
        let mut doc = EditorDocument::new(RgbaImage::new(4, 4));
        doc.commit_image(RgbaImage::new(2, 2), Vec::new(), ActionType::Crop);
        assert_eq!(doc.image().dimensions(), (2, 2));
        assert!(doc.undo());
        assert_eq!(doc.image().dimensions(), (4, 4));
        assert!(doc.redo());
        assert_eq!(doc.image().dimensions(), (2, 2));
    }

    #[test]
    fn test_commit_replace_keeps_order() {
        let mut doc = EditorDocument::new(RgbaImage::new(4, 4));
        let (a, b) = (rect(), rect());
        doc.commit(vec![a.clone(), b.clone()], ActionType::Add);
        assert!(doc.commit_replace(a.translated(3.0, 0.0), ActionType::Modify));
        assert_eq!(doc.annotations()[0].transform.x, 3.0);
        assert_eq!(doc.annotations()[1].id, b.id);
        assert!(!doc.commit_replace(rect(), ActionType::Modify));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut doc = EditorDocument::new(RgbaImage::new(1, 1));
        doc.set_zoom(100.0);
        assert_eq!(doc.zoom(), MAX_ZOOM);
        doc.set_zoom(f32::NAN);
        assert_eq!(doc.zoom(), MAX_ZOOM);
    }
}
