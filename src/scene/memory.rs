//! In-memory scene used for headless editing and tests

use crate::domain::Transform;

use super::{RenderId, Renderable, Scene, SceneEvent, SceneObject};

/// Ordered list of objects with a single active object
#[derive(Debug, Default)]
pub struct MemoryScene {
    objects: Vec<SceneObject>,
    active: Option<RenderId>,
    next_id: u64,
    events: Vec<SceneEvent>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> RenderId {
        self.next_id += 1;
        RenderId(self.next_id)
    }

    fn set_active(&mut self, id: Option<RenderId>) {
        if self.active != id {
            self.active = id;
            self.events.push(SceneEvent::SelectionChanged(id));
        }
    }

    /// Simulate the user clicking an object (or empty canvas for `None`)
    ///
    /// Non-selectable objects cannot be picked and clear the selection.
    pub fn user_select(&mut self, id: Option<RenderId>) {
        let target = id.filter(|id| self.object(*id).is_some_and(|r| r.selectable));
        self.set_active(target);
    }

    /// Simulate the user dragging, scaling or rotating an object
    pub fn user_transform(&mut self, id: RenderId, transform: Transform) -> bool {
        let Some(object) = self.objects.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        if !object.renderable.selectable {
            return false;
        }
        object.renderable.transform = transform;
        self.events
            .push(SceneEvent::ObjectModified { id, transform });
        true
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Scene for MemoryScene {
    fn add(&mut self, renderable: Renderable) -> RenderId {
        let id = self.allocate_id();
        self.objects.push(SceneObject { id, renderable });
        id
    }

    fn insert(&mut self, index: usize, renderable: Renderable) -> RenderId {
        let id = self.allocate_id();
        let index = index.min(self.objects.len());
        self.objects.insert(index, SceneObject { id, renderable });
        id
    }

    fn remove(&mut self, id: RenderId) -> Option<Renderable> {
        let index = self.index_of(id)?;
        if self.active == Some(id) {
            self.set_active(None);
        }
        Some(self.objects.remove(index).renderable)
    }

    fn replace(&mut self, id: RenderId, renderable: Renderable) -> bool {
        match self.objects.iter_mut().find(|o| o.id == id) {
            Some(object) => {
                object.renderable = renderable;
                true
            }
            None => false,
        }
    }

    fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    fn set_active_object(&mut self, id: Option<RenderId>) {
        let target = id.filter(|id| self.index_of(*id).is_some());
        self.set_active(target);
    }

    fn active_object(&self) -> Option<RenderId> {
        self.active
    }

    fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;

    fn renderable() -> Renderable {
        Renderable::new(Transform::default(), Vec::new())
    }

    #[test]
    fn test_insert_and_order() {
        let mut scene = MemoryScene::new();
        let a = scene.add(renderable());
        let b = scene.insert(0, renderable());
        let c = scene.insert(99, renderable());
        let ids: Vec<RenderId> = scene.objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![b, a, c]);
    }

    #[test]
    fn test_remove_active_emits_deselect() {
        let mut scene = MemoryScene::new();
        let a = scene.add(renderable());
        scene.user_select(Some(a));
        assert_eq!(scene.active_object(), Some(a));
        scene.remove(a);
        assert_eq!(scene.active_object(), None);
        assert_eq!(
            scene.take_events(),
            vec![
                SceneEvent::SelectionChanged(Some(a)),
                SceneEvent::SelectionChanged(None)
            ]
        );
        assert!(scene.take_events().is_empty());
    }

    #[test]
    fn test_user_transform_respects_selectable() {
        let mut scene = MemoryScene::new();
        let a = scene.add(renderable());
        let b = scene.add(renderable().into_preview());
        let moved = Transform::at(Point::new(5.0, 5.0));
        assert!(scene.user_transform(a, moved));
        assert!(!scene.user_transform(b, moved));
        assert_eq!(scene.object(a).unwrap().transform, moved);
        scene.user_select(Some(b));
        assert_eq!(scene.active_object(), None);
    }
}
