//! Arena of every entity in the world with deferred removal.

use tag_jam_core::{Adjacency, EntityId, EntityKind, TileCoord, TileExtent, TileRect};

use crate::shapes::Shape;

/// Authoritative state of a single placed entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) anchor: TileCoord,
    pub(crate) extent: TileExtent,
    pub(crate) absorbed: bool,
    pub(crate) adjacency: Adjacency,
    pub(crate) shape: Shape,
}

impl Entity {
    fn new(id: EntityId, kind: EntityKind, anchor: TileCoord) -> Self {
        Self {
            id,
            kind,
            anchor,
            extent: TileExtent::UNIT,
            absorbed: false,
            adjacency: Adjacency::Unresolved,
            shape: Shape::None,
        }
    }

    /// Identifier assigned by the registry.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Kind of entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Top-left tile of the entity's footprint.
    #[must_use]
    pub const fn anchor(&self) -> TileCoord {
        self.anchor
    }

    /// Footprint size in tiles.
    #[must_use]
    pub const fn extent(&self) -> TileExtent {
        self.extent
    }

    /// Footprint as a rectangle.
    #[must_use]
    pub const fn region(&self) -> TileRect {
        TileRect::from_origin_and_extent(self.anchor, self.extent)
    }

    /// Whether the entity was folded into another one and is pending removal.
    #[must_use]
    pub const fn is_absorbed(&self) -> bool {
        self.absorbed
    }

    /// Resolved relationship to neighbouring tiles.
    #[must_use]
    pub const fn adjacency(&self) -> Adjacency {
        self.adjacency
    }

    /// Visual transforms derived from the adjacency state.
    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// Arena with stable identifiers in registration order.
///
/// While protected, removals are queued and applied when the outermost
/// protection ends, so iteration over a snapshot of live ids stays valid.
/// Identifiers are never handed out twice, not even after [`clear`].
///
/// [`clear`]: EntityRegistry::clear
#[derive(Debug, Default)]
pub(crate) struct EntityRegistry {
    slots: Vec<Option<Entity>>,
    protection_depth: u32,
    pending_removals: Vec<EntityId>,
}

impl EntityRegistry {
    pub(crate) fn insert(&mut self, kind: EntityKind, anchor: TileCoord) -> EntityId {
        let id = EntityId::new(u32::try_from(self.slots.len()).unwrap_or(u32::MAX));
        self.slots.push(Some(Entity::new(id, kind, anchor)));
        id
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(slot_index(id)?)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(slot_index(id)?)?.as_mut()
    }

    /// Identifiers of live entities in registration order.
    pub(crate) fn live_ids(&self) -> Vec<EntityId> {
        self.iter().map(Entity::id).collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().flatten()
    }

    pub(crate) fn protect(&mut self) {
        debug_assert!(self.protection_depth > 0 || self.pending_removals.is_empty());
        self.protection_depth += 1;
    }

    /// Ends one level of protection. Returns the entities removed by the
    /// queued operations once the outermost level ends.
    pub(crate) fn end_protect(&mut self) -> Vec<Entity> {
        debug_assert!(self.protection_depth > 0);
        self.protection_depth = self.protection_depth.saturating_sub(1);
        if self.protection_depth > 0 {
            return Vec::new();
        }

        let pending = std::mem::take(&mut self.pending_removals);
        pending.into_iter().filter_map(|id| self.take(id)).collect()
    }

    /// Removes an entity, or queues the removal while protected.
    ///
    /// Returns the removed entity when the removal happened immediately.
    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        if self.protection_depth > 0 {
            self.pending_removals.push(id);
            return None;
        }
        self.take(id)
    }

    /// Removes every entity immediately, in registration order. Emptied slots
    /// stay allocated so later insertions keep receiving fresh ids.
    pub(crate) fn clear(&mut self) -> Vec<Entity> {
        self.pending_removals.clear();
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    fn take(&mut self, id: EntityId) -> Option<Entity> {
        self.slots.get_mut(slot_index(id)?)?.take()
    }
}

fn slot_index(id: EntityId) -> Option<usize> {
    usize::try_from(id.get()).ok()
}
