//! Editor session
//!
//! Wires pointer input to the active tool, records finished edits in the
//! history, keeps the scene reconciled with the annotation list and drives
//! export. Everything runs on the caller's thread.

pub mod document;

use image::RgbaImage;

use crate::config::EditorConfig;
use crate::domain::{
    Annotation, AnnotationId, AnnotationKind, AnnotationShape, Bounds, Point, Rect, RecentColors,
    StickerKind, ToolSettings, Transform, load_annotations,
};
use crate::error::EditorError;
use crate::export::{self, ExportConfig, ExportOutput};
use crate::history::ActionType;
use crate::image_ops;
use crate::scene::{CanvasSync, MemoryScene, RenderId, Scene, SceneEvent, SyncReport};
use crate::session::shortcuts::{Key, handle_key_event};
use crate::session::{EditorCommand, Modifiers, PointerEvent, PointerKind, SessionContext};
use crate::tools::{GestureState, Tool, ToolRegistry};

pub use document::{EditorDocument, EditorSnapshot};

/// What pointer input currently does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Pointer input goes to the active tool
    #[default]
    Draw,
    /// Pointer input drags out a crop selection
    Crop,
}

type SelectionListener = Box<dyn FnMut(Option<AnnotationId>)>;
type ModifiedListener = Box<dyn FnMut(&Annotation)>;

#[derive(Default)]
struct Listeners {
    selection: Vec<SelectionListener>,
    modified: Vec<ModifiedListener>,
}

/// An annotation editor bound to a scene
pub struct Editor<S: Scene = MemoryScene> {
    document: EditorDocument,
    registry: ToolRegistry,
    session: SessionContext,
    scene: S,
    sync: CanvasSync,
    gesture: GestureState,
    preview: Option<RenderId>,
    mode: EditorMode,
    crop_anchor: Option<Point>,
    crop_selection: Option<Rect>,
    listeners: Listeners,
}

impl Editor<MemoryScene> {
    /// Headless editor over an in-memory scene
    pub fn new(image: RgbaImage) -> Self {
        Self::with_scene(image, MemoryScene::new())
    }
}

impl<S: Scene> Editor<S> {
    pub fn with_scene(image: RgbaImage, scene: S) -> Self {
        Self::from_document(EditorDocument::new(image), scene)
    }

    /// Editor seeded from persisted configuration
    pub fn from_config(image: RgbaImage, scene: S, config: &EditorConfig) -> Self {
        let mut document = match config.history_limit {
            Some(limit) => EditorDocument::with_history_limit(image, limit),
            None => EditorDocument::new(image),
        };
        document.settings = config.tool_settings.clone();
        document.recent_colors = RecentColors::from_colors(config.recent_colors.iter().copied());
        document.export = config.export_config();
        let mut editor = Self::from_document(document, scene);
        editor.session.set_blur_pixel_size(config.blur_pixel_size);
        editor
    }

    fn from_document(document: EditorDocument, scene: S) -> Self {
        log::debug!(
            "Editor opened on {}x{} image",
            document.image().width(),
            document.image().height()
        );
        Self {
            document,
            registry: ToolRegistry::with_defaults(),
            session: SessionContext::default(),
            scene,
            sync: CanvasSync::new(),
            gesture: GestureState::default(),
            preview: None,
            mode: EditorMode::Draw,
            crop_anchor: None,
            crop_selection: None,
            listeners: Listeners::default(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn document(&self) -> &EditorDocument {
        &self.document
    }

    pub fn image(&self) -> &RgbaImage {
        self.document.image()
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.document.annotations()
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.document.selected
    }

    pub fn active_tool(&self) -> AnnotationKind {
        self.document.active_tool
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.document.settings
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Scene access for the shell; call `pump_scene_events` after user edits
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn crop_selection(&self) -> Option<Rect> {
        self.crop_selection
    }

    pub fn recent_colors(&self) -> &RecentColors {
        &self.document.recent_colors
    }

    pub fn can_undo(&self) -> bool {
        self.document.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.document.history().can_redo()
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.document.set_zoom(zoom);
    }

    pub fn set_export_config(&mut self, config: ExportConfig) {
        self.document.export = config;
    }

    /// Add or replace a tool
    pub fn register_tool(&mut self, tool: Box<dyn Tool>) {
        self.registry.register(tool);
        self.sync.invalidate_all();
        self.resync();
    }

    // ========================================================================
    // Pointer input
    // ========================================================================

    /// Feed one pointer event; returns the id of a newly created annotation
    pub fn pointer(&mut self, event: PointerEvent) -> Option<AnnotationId> {
        if self.mode == EditorMode::Crop {
            self.crop_pointer(event);
            return None;
        }
        let tool = self.registry.get(self.document.active_tool)?;
        let settings = &self.document.settings;
        match event.kind {
            PointerKind::Down => {
                if let Some(preview) = tool.on_press(&event, settings, &mut self.gesture, &self.session)
                {
                    self.gesture.preview = Some(preview);
                }
                self.show_preview();
                None
            }
            PointerKind::Move => {
                tool.on_move(&event, settings, &mut self.gesture, &self.session);
                self.show_preview();
                None
            }
            PointerKind::Up => {
                let output = tool.on_release(&event, settings, &mut self.gesture, &mut self.session);
                self.gesture.reset();
                self.show_preview();
                let output = output?;
                let id = output.annotation.id;
                let mut annotations = self.document.annotations().to_vec();
                annotations.push(output.annotation.clone());
                self.document.commit(annotations, ActionType::Add);
                self.document.recent_colors.push(self.document.settings.color);
                let preceding = self
                    .document
                    .annotations()
                    .split_last()
                    .map_or(&[][..], |(_, rest)| rest);
                self.sync
                    .adopt(&mut self.scene, &output.annotation, output.renderable, preceding);
                log::debug!("Added {} annotation {id}", output.annotation.kind());
                Some(id)
            }
        }
    }

    /// Mirror the gesture preview into the scene
    fn show_preview(&mut self) {
        match (self.preview, self.gesture.preview.clone()) {
            (Some(id), Some(preview)) => {
                if !self.scene.replace(id, preview.clone()) {
                    self.preview = Some(self.scene.add(preview));
                }
            }
            (None, Some(preview)) => self.preview = Some(self.scene.add(preview)),
            (Some(id), None) => {
                self.scene.remove(id);
                self.preview = None;
            }
            (None, None) => {}
        }
    }

    fn crop_pointer(&mut self, event: PointerEvent) {
        match event.kind {
            PointerKind::Down => {
                self.crop_anchor = Some(event.point);
                self.crop_selection = None;
            }
            PointerKind::Move | PointerKind::Up => {
                let Some(anchor) = self.crop_anchor else {
                    return;
                };
                let (w, h) = self.document.image().dimensions();
                let image_rect = Rect::new(0, 0, w as i32, h as i32);
                self.crop_selection = Rect::enclosing(&Bounds::from_corners(anchor, event.point))
                    .intersect(image_rect);
                if event.kind == PointerKind::Up {
                    self.crop_anchor = None;
                }
            }
        }
    }

    /// Escape: drop the gesture preview, or leave crop mode
    pub fn cancel_gesture(&mut self) {
        self.gesture.reset();
        self.show_preview();
        self.crop_anchor = None;
        self.crop_selection = None;
        self.mode = EditorMode::Draw;
    }

    // ========================================================================
    // Tool and session state
    // ========================================================================

    /// Switch tools; unknown kinds are ignored
    pub fn set_tool(&mut self, kind: AnnotationKind) -> bool {
        if !self.registry.has(kind) {
            log::warn!("No tool registered for {kind}");
            return false;
        }
        self.cancel_gesture();
        self.document.active_tool = kind;
        true
    }

    /// Change the settings used for new annotations
    pub fn update_settings(&mut self, f: impl FnOnce(&mut ToolSettings)) {
        f(&mut self.document.settings);
    }

    pub fn restart_sequence(&mut self) {
        self.session.sequence.restart();
    }

    pub fn set_sticker(&mut self, sticker: Option<StickerKind>) {
        self.session.selected_sticker = sticker;
    }

    pub fn set_image(&mut self, key: Option<String>) {
        self.session.selected_image = key;
    }

    pub fn set_blur_pixel_size(&mut self, size: u32) {
        self.session.set_blur_pixel_size(size);
    }

    // ========================================================================
    // Edits
    // ========================================================================

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        let done = self.document.undo();
        if done {
            self.resync();
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        let done = self.document.redo();
        if done {
            self.resync();
        }
        done
    }

    /// Delete the selected annotation unless it is locked
    pub fn delete_selected(&mut self) -> bool {
        let Some(selected) = self.document.selected_annotation() else {
            return false;
        };
        if selected.locked {
            return false;
        }
        let id = selected.id;
        let annotations = self
            .document
            .annotations()
            .iter()
            .filter(|a| a.id != id)
            .cloned()
            .collect();
        self.document.commit(annotations, ActionType::Delete);
        self.resync();
        true
    }

    pub fn clear_all(&mut self) -> bool {
        if self.document.annotations().is_empty() {
            return false;
        }
        self.cancel_gesture();
        self.document.commit(Vec::new(), ActionType::ClearAll);
        self.resync();
        true
    }

    /// Lock or unlock an annotation; locked annotations cannot be selected
    pub fn set_locked(&mut self, id: AnnotationId, locked: bool) -> bool {
        let Some(annotation) = self.document.find(id) else {
            return false;
        };
        if annotation.locked == locked {
            return false;
        }
        let next = Annotation {
            locked,
            ..annotation.clone()
        };
        self.document.commit_replace(next, ActionType::Lock);
        if locked && self.document.selected == Some(id) {
            self.scene.set_active_object(None);
        }
        self.resync();
        true
    }

    /// Lock the selected annotation
    ///
    /// Locked annotations cannot be selected, so unlocking goes through
    /// `set_locked`.
    pub fn toggle_lock(&mut self) -> bool {
        let Some(selected) = self.document.selected_annotation() else {
            return false;
        };
        let (id, locked) = (selected.id, selected.locked);
        self.set_locked(id, !locked)
    }

    /// Resample the source image; annotations scale with it
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        let image = self.document.image();
        let resized = image_ops::resize_image(image, width, height)?;
        let sx = width as f32 / image.width() as f32;
        let sy = height as f32 / image.height() as f32;
        let annotations = image_ops::resize_annotations(self.document.annotations(), sx, sy);
        self.cancel_gesture();
        self.document
            .commit_image(resized, annotations, ActionType::Resize);
        log::info!("Resized image to {width}x{height}");
        self.resync();
        Ok(())
    }

    /// Crop the source image; annotations move into the cropped space
    pub fn crop(&mut self, selection: Rect) -> Result<(), EditorError> {
        let cropped = image_ops::crop_image(self.document.image(), selection)?;
        let annotations = image_ops::crop_annotations(self.document.annotations(), selection);
        self.cancel_gesture();
        self.document
            .commit_image(cropped, annotations, ActionType::Crop);
        log::info!(
            "Cropped image to {}x{}",
            selection.width(),
            selection.height()
        );
        self.resync();
        Ok(())
    }

    /// Enter crop mode; pointer drags now select the crop rectangle
    pub fn begin_crop(&mut self) {
        self.cancel_gesture();
        self.mode = EditorMode::Crop;
    }

    /// Crop to the dragged selection; `Ok(false)` when nothing is selected
    pub fn apply_crop_selection(&mut self) -> Result<bool, EditorError> {
        let Some(selection) = self.crop_selection else {
            return Ok(false);
        };
        self.crop(selection)?;
        Ok(true)
    }

    // ========================================================================
    // Selection and scene events
    // ========================================================================

    /// Select an annotation (or clear with `None`)
    pub fn select(&mut self, id: Option<AnnotationId>) -> bool {
        let target = match id {
            Some(id) => {
                let Some(annotation) = self.document.find(id) else {
                    return false;
                };
                if annotation.locked {
                    return false;
                }
                let Some(render_id) = self.sync.render_id(id) else {
                    return false;
                };
                Some(render_id)
            }
            None => None,
        };
        self.scene.set_active_object(target);
        self.pump_scene_events();
        true
    }

    /// Called with the new selection whenever it changes
    pub fn on_selection_changed(&mut self, listener: impl FnMut(Option<AnnotationId>) + 'static) {
        self.listeners.selection.push(Box::new(listener));
    }

    /// Called with the updated annotation after a user transform
    pub fn on_modified(&mut self, listener: impl FnMut(&Annotation) + 'static) {
        self.listeners.modified.push(Box::new(listener));
    }

    /// Drain scene notifications into the document
    pub fn pump_scene_events(&mut self) {
        loop {
            let events = self.scene.take_events();
            if events.is_empty() {
                break;
            }
            let mut dirty = false;
            for event in events {
                match event {
                    SceneEvent::SelectionChanged(render_id) => {
                        let selected = render_id.and_then(|rid| self.sync.annotation_for(rid));
                        self.set_selected(selected);
                    }
                    SceneEvent::ObjectModified { id, transform } => {
                        dirty |= self.apply_user_transform(id, transform);
                    }
                }
            }
            if dirty {
                self.reconcile();
            }
        }
    }

    fn set_selected(&mut self, selected: Option<AnnotationId>) {
        if self.document.selected == selected {
            return;
        }
        self.document.selected = selected;
        for listener in &mut self.listeners.selection {
            listener(selected);
        }
    }

    /// Record a transform the user applied on the scene; true if a resync is needed
    fn apply_user_transform(
        &mut self,
        render_id: RenderId,
        transform: Transform,
    ) -> bool {
        let Some(id) = self.sync.annotation_for(render_id) else {
            return false;
        };
        let Some(annotation) = self.document.find(id) else {
            return false;
        };
        if annotation.locked {
            log::debug!("Ignoring transform of locked annotation {id}");
            self.sync.invalidate(id);
            return true;
        }
        let next = annotation.with_transform(transform.sanitized());
        if next == *annotation {
            return false;
        }
        self.document.commit_replace(next.clone(), ActionType::Modify);
        for listener in &mut self.listeners.modified {
            listener(&next);
        }
        true
    }

    fn reconcile(&mut self) -> SyncReport {
        let report = self.sync.reconcile(
            &mut self.scene,
            self.document.annotations(),
            &self.registry,
            &self.document.settings,
            &self.session,
        );
        if let Some(id) = self.document.selected
            && self.document.find(id).is_none()
        {
            self.set_selected(None);
        }
        report
    }

    /// Reconcile the scene with the current annotations and pump events
    pub fn resync(&mut self) -> SyncReport {
        let report = self.reconcile();
        self.pump_scene_events();
        report
    }

    // ========================================================================
    // Assets
    // ========================================================================

    pub fn begin_asset_load(&mut self, key: &str) {
        self.session.assets.begin(key);
    }

    /// Store a finished load and swap placeholders for the decoded image
    pub fn finish_asset_load(&mut self, key: &str, result: anyhow::Result<RgbaImage>) -> bool {
        if !self.session.assets.finish(key, result) {
            return false;
        }
        let waiting: Vec<AnnotationId> = self
            .document
            .annotations()
            .iter()
            .filter(|a| matches!(&a.shape, AnnotationShape::InsertImage { source, .. } if source == key))
            .map(|a| a.id)
            .collect();
        for id in waiting {
            self.sync.invalidate(id);
        }
        self.resync();
        true
    }

    // ========================================================================
    // Persistence and export
    // ========================================================================

    /// Replace the annotation list from JSON, dropping undecodable items
    pub fn load_annotations_json(&mut self, json: &str) -> anyhow::Result<usize> {
        let annotations = load_annotations(json)?;
        let count = annotations.len();
        self.cancel_gesture();
        self.document.commit(annotations, ActionType::Load);
        let report = self.resync();
        if !report.failed.is_empty() {
            log::warn!("{} loaded annotations could not be drawn", report.failed.len());
        }
        Ok(count)
    }

    pub fn annotations_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self.document.annotations())
    }

    /// Export with the document's effect settings
    pub fn export(&mut self) -> Result<ExportOutput, EditorError> {
        let config = self.document.export.clone();
        self.export_with(&config)
    }

    /// Flatten the scene at scale 1 and apply `config`
    pub fn export_with(&mut self, config: &ExportConfig) -> Result<ExportOutput, EditorError> {
        self.cancel_gesture();
        let image = std::sync::Arc::clone(self.document.image());
        let output = export::export_scene(&mut self.scene, &image, config)?;
        self.pump_scene_events();
        Ok(output)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn handle_command(&mut self, command: EditorCommand) -> Result<(), EditorError> {
        match command {
            EditorCommand::Undo => {
                self.undo();
            }
            EditorCommand::Redo => {
                self.redo();
            }
            EditorCommand::DeleteSelected => {
                self.delete_selected();
            }
            EditorCommand::ClearAll => {
                self.clear_all();
            }
            EditorCommand::RestartSequence => self.restart_sequence(),
            EditorCommand::SetSticker(sticker) => self.set_sticker(sticker),
            EditorCommand::SetImage(key) => self.set_image(key),
            EditorCommand::SetBlurPixelSize(size) => self.set_blur_pixel_size(size),
            EditorCommand::SetTool(kind) => {
                self.set_tool(kind);
            }
            EditorCommand::ToggleLock => {
                self.toggle_lock();
            }
            EditorCommand::BeginCrop => self.begin_crop(),
            EditorCommand::Crop(rect) => self.crop(rect)?,
            EditorCommand::Resize { width, height } => self.resize(width, height)?,
            EditorCommand::Cancel => self.cancel_gesture(),
        }
        Ok(())
    }

    /// Route a key press through the shortcut table
    pub fn handle_key(
        &mut self,
        key: &Key,
        modifiers: Modifiers,
        editing_text: bool,
    ) -> Result<bool, EditorError> {
        match handle_key_event(key, modifiers, editing_text) {
            Some(command) => {
                self.handle_command(command)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
