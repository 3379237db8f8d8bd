//! Ordered entity collections owned by a diagram.

use crate::connection::Connection;
use crate::entity::{Entity, EntityId, SiteId};
use crate::error::{DiagramError, DiagramResult};
use crate::shapes::Shape;

/// Insertion-ordered collection of entities with unique identifiers.
///
/// Adding stamps the owning site on the entity; adding or removing raises a
/// repaint request that the owner drains with [`take_repaint_request`].
///
/// [`take_repaint_request`]: EntityCollection::take_repaint_request
#[derive(Debug, Clone)]
pub struct EntityCollection<T> {
    site: SiteId,
    items: Vec<T>,
    repaint: bool,
}

/// Shapes of a diagram.
pub type ShapeCollection = EntityCollection<Shape>;

/// Connections of a diagram.
pub type ConnectionCollection = EntityCollection<Connection>;

impl<T> Default for EntityCollection<T> {
    fn default() -> Self {
        Self::new(SiteId::new())
    }
}

impl<T> EntityCollection<T> {
    /// Create an empty collection owned by `site`.
    pub fn new(site: SiteId) -> Self {
        Self {
            site,
            items: Vec::new(),
            repaint: false,
        }
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Get an entity by position.
    pub fn at(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Return and clear the pending repaint request.
    pub fn take_repaint_request(&mut self) -> bool {
        std::mem::take(&mut self.repaint)
    }
}

impl<T: Entity> EntityCollection<T> {
    /// Append an entity and return the stored instance.
    pub fn add(&mut self, mut entity: T) -> DiagramResult<&mut T> {
        let id = entity.id();
        if self.contains(id) {
            return Err(DiagramError::DuplicateId(id));
        }
        entity.set_site(Some(self.site));
        self.items.push(entity);
        self.repaint = true;
        let last = self.items.len() - 1;
        Ok(&mut self.items[last])
    }

    /// Remove an entity. Removing an absent id is a no-op returning `None`.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let position = self.position(id)?;
        let mut entity = self.items.remove(position);
        entity.set_site(None);
        self.repaint = true;
        Some(entity)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.items.iter().any(|e| e.id() == id)
    }

    /// Position of an entity in insertion order.
    pub fn position(&self, id: EntityId) -> Option<usize> {
        self.items.iter().position(|e| e.id() == id)
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.items.iter_mut().find(|e| e.id() == id)
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(Entity::id).collect()
    }
}

impl<'a, T> IntoIterator for &'a EntityCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Outline, Shape};

    fn shape() -> Shape {
        Shape::new("rectangle", Outline::Rectangle, 10, 10)
    }

    #[test]
    fn test_add_stamps_site_and_requests_repaint() {
        let mut shapes = ShapeCollection::default();
        let site = shapes.site();
        let added = shapes.add(shape()).unwrap();
        assert_eq!(added.site(), Some(site));
        assert!(added.connectors().iter().all(|c| c.site() == Some(site)));
        assert!(shapes.take_repaint_request());
        assert!(!shapes.take_repaint_request());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut shapes = ShapeCollection::default();
        let s = shape();
        let copy = s.clone();
        shapes.add(s).unwrap();
        assert!(matches!(shapes.add(copy), Err(DiagramError::DuplicateId(_))));
        assert_eq!(shapes.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut shapes = ShapeCollection::default();
        let id = shapes.add(shape()).unwrap().id();
        shapes.take_repaint_request();

        let removed = shapes.remove(id).unwrap();
        assert_eq!(removed.site(), None);
        assert!(shapes.take_repaint_request());

        assert!(shapes.remove(id).is_none());
        assert!(!shapes.take_repaint_request());
        assert!(shapes.is_empty());
    }

    #[test]
    fn test_insertion_order_after_removals() {
        let mut shapes = ShapeCollection::default();
        let ids: Vec<_> = (0..5).map(|_| shapes.add(shape()).unwrap().id()).collect();
        shapes.remove(ids[1]);
        shapes.remove(ids[3]);
        assert_eq!(shapes.ids(), vec![ids[0], ids[2], ids[4]]);
        assert_eq!(shapes.position(ids[4]), Some(2));
    }

    #[test]
    fn test_membership_is_net_effect() {
        // Deterministic pseudo-random add/remove sequence.
        let mut shapes = ShapeCollection::default();
        let mut expected: Vec<EntityId> = Vec::new();
        let mut pool: Vec<EntityId> = Vec::new();
        let mut x: u32 = 0x1234_5678;
        for _ in 0..200 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            if x % 3 == 0 && !pool.is_empty() {
                let id = pool[(x as usize / 3) % pool.len()];
                shapes.remove(id);
                expected.retain(|&e| e != id);
            } else {
                let id = shapes.add(shape()).unwrap().id();
                pool.push(id);
                expected.push(id);
            }
        }
        assert_eq!(shapes.ids(), expected);
    }
}
