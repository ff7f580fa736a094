//! Reconcile the annotation list against a scene
//!
//! The annotation list is authoritative. Each pass:
//! - removes annotation-layer objects whose annotation is gone
//! - inserts objects for annotations the scene does not show yet, right
//!   above the object of the preceding annotation
//! - rebuilds in place objects whose annotation changed since the last pass
//!
//! A reconstruction failure only drops that one annotation from the scene.

use std::collections::{HashMap, HashSet};

use crate::domain::{Annotation, AnnotationId, ToolSettings};
use crate::session::SessionContext;
use crate::tools::ToolRegistry;

use super::{Layer, RenderId, Renderable, Scene};

/// What a reconcile pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    pub rebuilt: usize,
    /// Annotations that could not be reconstructed
    pub failed: Vec<AnnotationId>,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.rebuilt == 0 && self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
struct SyncedEntry {
    render_id: RenderId,
    /// Annotation the object was built from; `None` forces a rebuild
    source: Option<Annotation>,
}

/// Mapping between annotations and the scene objects showing them
#[derive(Debug, Default)]
pub struct CanvasSync {
    entries: HashMap<AnnotationId, SyncedEntry>,
}

impl CanvasSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_id(&self, id: AnnotationId) -> Option<RenderId> {
        self.entries.get(&id).map(|e| e.render_id)
    }

    /// Annotation shown by a scene object
    pub fn annotation_for(&self, render_id: RenderId) -> Option<AnnotationId> {
        self.entries
            .iter()
            .find(|(_, e)| e.render_id == render_id)
            .map(|(id, _)| *id)
    }

    /// Force the next pass to rebuild an annotation's object
    pub fn invalidate(&mut self, id: AnnotationId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.source = None;
        }
    }

    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.source = None;
        }
    }

    /// Track the object of a freshly drawn annotation
    ///
    /// The object goes right above the nearest annotation in `preceding`
    /// that the scene shows, or on top of the annotation layer when none is.
    pub fn adopt<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        annotation: &Annotation,
        renderable: Renderable,
        preceding: &[Annotation],
    ) -> RenderId {
        let index = preceding
            .iter()
            .rev()
            .find_map(|a| self.index_above(scene, a.id))
            .unwrap_or_else(|| annotation_layer_top(scene));
        let render_id = scene.insert(index, prepare(renderable, annotation));
        self.entries.insert(
            annotation.id,
            SyncedEntry {
                render_id,
                source: Some(annotation.clone()),
            },
        );
        render_id
    }

    /// Z-order position just above the object of `id`
    fn index_above<S: Scene + ?Sized>(&self, scene: &S, id: AnnotationId) -> Option<usize> {
        self.render_id(id)
            .and_then(|rid| scene.index_of(rid))
            .map(|index| index + 1)
    }

    /// Bring the scene in line with `annotations`
    pub fn reconcile<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        annotations: &[Annotation],
        registry: &ToolRegistry,
        settings: &ToolSettings,
        ctx: &SessionContext,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        let wanted: HashSet<AnnotationId> = annotations.iter().map(|a| a.id).collect();

        // Entries whose annotation is gone, or whose object vanished
        let stale: Vec<AnnotationId> = self
            .entries
            .iter()
            .filter(|(id, e)| !wanted.contains(id) || scene.index_of(e.render_id).is_none())
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            if let Some(entry) = self.entries.remove(&id)
                && scene.remove(entry.render_id).is_some()
            {
                report.removed += 1;
            }
        }

        // Tagged annotation objects nobody tracks (left over from another sync)
        let orphans: Vec<RenderId> = scene
            .objects()
            .iter()
            .filter(|o| o.renderable.tag.layer == Layer::Annotation)
            .filter(|o| {
                o.renderable
                    .tag
                    .annotation_id
                    .is_some_and(|id| self.render_id(id) != Some(o.id))
            })
            .map(|o| o.id)
            .collect();
        for rid in orphans {
            scene.remove(rid);
            report.removed += 1;
        }

        let mut previous: Option<AnnotationId> = None;
        for annotation in annotations {
            let tracked = self.entries.get(&annotation.id).cloned();
            if let Some(entry) = &tracked
                && entry.source.as_ref() == Some(annotation)
            {
                previous = Some(annotation.id);
                continue;
            }

            let Some(renderable) = registry.reconstruct(annotation, settings, ctx) else {
                log::warn!(
                    "Skipping {} annotation {}: cannot reconstruct",
                    annotation.kind(),
                    annotation.id
                );
                if let Some(entry) = tracked {
                    scene.remove(entry.render_id);
                    self.entries.remove(&annotation.id);
                    report.removed += 1;
                }
                report.failed.push(annotation.id);
                continue;
            };
            let renderable = prepare(renderable, annotation);

            match tracked {
                Some(entry) => {
                    scene.replace(entry.render_id, renderable);
                    self.entries.insert(
                        annotation.id,
                        SyncedEntry {
                            render_id: entry.render_id,
                            source: Some(annotation.clone()),
                        },
                    );
                    report.rebuilt += 1;
                }
                None => {
                    let index = previous
                        .and_then(|id| self.index_above(scene, id))
                        .unwrap_or(0);
                    let render_id = scene.insert(index, renderable);
                    self.entries.insert(
                        annotation.id,
                        SyncedEntry {
                            render_id,
                            source: Some(annotation.clone()),
                        },
                    );
                    report.added += 1;
                }
            }
            previous = Some(annotation.id);
        }

        if !report.is_noop() {
            log::debug!(
                "Scene sync: +{} -{} ~{} ({} failed)",
                report.added,
                report.removed,
                report.rebuilt,
                report.failed.len()
            );
        }
        report
    }

    /// Remove every tracked object from the scene
    pub fn clear<S: Scene + ?Sized>(&mut self, scene: &mut S) {
        for (_, entry) in self.entries.drain() {
            scene.remove(entry.render_id);
        }
    }
}

/// Position just above the topmost annotation-layer object
fn annotation_layer_top<S: Scene + ?Sized>(scene: &S) -> usize {
    scene
        .objects()
        .iter()
        .rposition(|o| o.renderable.tag.layer == Layer::Annotation)
        .map_or(0, |index| index + 1)
}

/// Tag a renderable for its annotation; locked annotations cannot be picked
fn prepare(renderable: Renderable, annotation: &Annotation) -> Renderable {
    let mut renderable = renderable.tagged(annotation.id);
    renderable.selectable = !annotation.locked;
    renderable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnnotationShape, AnnotationStyle, Point, Transform};
    use crate::scene::MemoryScene;

    fn rect(x: f32) -> Annotation {
        Annotation::new(
            AnnotationShape::Rectangle {
                width: 10.0,
                height: 10.0,
            },
            AnnotationStyle::from_settings(&ToolSettings::default()),
            Transform::at(Point::new(x, 0.0)),
        )
    }

    fn broken() -> Annotation {
        Annotation::new(
            AnnotationShape::Curve { points: Vec::new() },
            AnnotationStyle::from_settings(&ToolSettings::default()),
            Transform::default(),
        )
    }

    struct Fixture {
        scene: MemoryScene,
        sync: CanvasSync,
        registry: ToolRegistry,
        settings: ToolSettings,
        ctx: SessionContext,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scene: MemoryScene::new(),
                sync: CanvasSync::new(),
                registry: ToolRegistry::with_defaults(),
                settings: ToolSettings::default(),
                ctx: SessionContext::default(),
            }
        }

        fn sync(&mut self, annotations: &[Annotation]) -> SyncReport {
            self.sync.reconcile(
                &mut self.scene,
                annotations,
                &self.registry,
                &self.settings,
                &self.ctx,
            )
        }

        fn order(&self) -> Vec<Option<AnnotationId>> {
            self.scene
                .objects()
                .iter()
                .map(|o| o.renderable.tag.annotation_id)
                .collect()
        }
    }

    #[test]
    fn test_add_and_remove() {
        let mut f = Fixture::new();
        let (a, b) = (rect(0.0), rect(20.0));
        let report = f.sync(&[a.clone(), b.clone()]);
        assert_eq!(report.added, 2);
        assert_eq!(f.order(), vec![Some(a.id), Some(b.id)]);

        let report = f.sync(std::slice::from_ref(&b));
        assert_eq!(report.removed, 1);
        assert_eq!(f.order(), vec![Some(b.id)]);

        assert!(f.sync(std::slice::from_ref(&b)).is_noop());
    }

    #[test]
    fn test_restored_annotation_keeps_z_order() {
        let mut f = Fixture::new();
        let (a, b, c) = (rect(0.0), rect(20.0), rect(40.0));
        f.sync(&[a.clone(), b.clone(), c.clone()]);
        f.sync(&[a.clone(), c.clone()]);
        f.sync(&[a.clone(), b.clone(), c.clone()]);
        assert_eq!(f.order(), vec![Some(a.id), Some(b.id), Some(c.id)]);
    }

    #[test]
    fn test_changed_annotation_rebuilt_in_place() {
        let mut f = Fixture::new();
        let a = rect(0.0);
        f.sync(std::slice::from_ref(&a));
        let rid = f.sync.render_id(a.id).unwrap();
        f.scene.user_select(Some(rid));

        let moved = a.translated(5.0, 5.0);
        let report = f.sync(std::slice::from_ref(&moved));
        assert_eq!(report.rebuilt, 1);
        assert_eq!(f.sync.render_id(a.id), Some(rid));
        assert_eq!(f.scene.active_object(), Some(rid));
        assert_eq!(f.scene.object(rid).unwrap().transform, moved.transform);
    }

    #[test]
    fn test_failure_is_per_item() {
        let mut f = Fixture::new();
        let (a, bad, c) = (rect(0.0), broken(), rect(40.0));
        let report = f.sync(&[a.clone(), bad.clone(), c.clone()]);
        assert_eq!(report.added, 2);
        assert_eq!(report.failed, vec![bad.id]);
        assert_eq!(f.order(), vec![Some(a.id), Some(c.id)]);
    }

    #[test]
    fn test_failure_mid_list_keeps_later_order() {
        let mut f = Fixture::new();
        let (a, bad, c, d) = (rect(0.0), broken(), rect(40.0), rect(60.0));
        f.sync(&[a.clone(), c.clone()]);

        let report = f.sync(&[a.clone(), bad.clone(), c.clone(), d.clone()]);
        assert_eq!(report.failed, vec![bad.id]);
        assert_eq!(report.added, 1);
        assert_eq!(f.order(), vec![Some(a.id), Some(c.id), Some(d.id)]);

        // Failed again on the next pass, without disturbing the rest
        let report = f.sync(&[a.clone(), bad.clone(), c.clone(), d.clone()]);
        assert_eq!(report.failed, vec![bad.id]);
        assert_eq!(f.order(), vec![Some(a.id), Some(c.id), Some(d.id)]);
    }

    #[test]
    fn test_adopt_skips_unshown_predecessor() {
        let mut f = Fixture::new();
        let (a, bad, b) = (rect(0.0), broken(), rect(20.0));
        f.sync(&[a.clone(), bad.clone(), b.clone()]);

        let new = rect(80.0);
        let renderable = Renderable::new(new.transform, Vec::new());
        let rid = f.sync.adopt(&mut f.scene, &new, renderable, &[a.clone(), b.clone(), bad]);
        assert_eq!(f.scene.index_of(rid), Some(2));
        assert_eq!(f.order(), vec![Some(a.id), Some(b.id), Some(new.id)]);
    }

    #[test]
    fn test_adopt_without_shown_predecessor_goes_on_top() {
        let mut f = Fixture::new();
        let a = rect(0.0);
        f.sync(std::slice::from_ref(&a));
        let preview = f.scene.add(Renderable::new(Transform::default(), Vec::new()).into_preview());

        let new = rect(80.0);
        let renderable = Renderable::new(new.transform, Vec::new());
        let rid = f.sync.adopt(&mut f.scene, &new, renderable, &[broken()]);
        assert_eq!(f.scene.index_of(rid), Some(1));
        assert_eq!(f.scene.index_of(preview), Some(2));
    }

    #[test]
    fn test_locked_objects_not_selectable() {
        let mut f = Fixture::new();
        let mut a = rect(0.0);
        a.locked = true;
        f.sync(std::slice::from_ref(&a));
        let rid = f.sync.render_id(a.id).unwrap();
        assert!(!f.scene.object(rid).unwrap().selectable);
        f.scene.user_select(Some(rid));
        assert_eq!(f.scene.active_object(), None);
    }

    #[test]
    fn test_previews_are_left_alone() {
        let mut f = Fixture::new();
        let preview = f.scene.add(Renderable::new(Transform::default(), Vec::new()).into_preview());
        f.sync(&[rect(0.0)]);
        f.sync(&[]);
        assert_eq!(f.scene.len(), 1);
        assert!(f.scene.object(preview).is_some());
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let mut f = Fixture::new();
        let a = rect(0.0);
        f.sync(std::slice::from_ref(&a));
        f.sync.invalidate(a.id);
        assert_eq!(f.sync(std::slice::from_ref(&a)).rebuilt, 1);
    }
}
