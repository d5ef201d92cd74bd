//! Registration table mapping level tile ids to entity kinds.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{EntityKind, TileId};

/// Tile ids used by the shipped levels.
const DEFAULT_REGISTRATIONS: [(u32, EntityKind); 5] = [
    (1, EntityKind::Wall),
    (2, EntityKind::Beer),
    (3, EntityKind::TaggingLocation),
    (4, EntityKind::Door),
    (5, EntityKind::Player),
];

/// Reasons a tileset registration may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TilesetError {
    /// Tile id zero denotes empty space and cannot construct anything.
    #[error("tile id 0 is reserved for empty space and cannot map to {kind:?}")]
    ReservedId {
        /// Kind that was requested for id zero.
        kind: EntityKind,
    },
    /// Two kinds were registered for the same tile id.
    #[error("tile id {} is registered for both {existing:?} and {requested:?}", .tile.get())]
    DuplicateId {
        /// Contested tile id.
        tile: TileId,
        /// Kind registered first.
        existing: EntityKind,
        /// Kind rejected by the second registration.
        requested: EntityKind,
    },
}

/// Explicit table of which entity kind each tile id constructs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tileset {
    kinds: BTreeMap<TileId, EntityKind>,
}

impl Tileset {
    /// Creates a tileset with no registrations.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    /// Builds a tileset from `(id, kind)` pairs, rejecting reserved and duplicate ids.
    pub fn from_entries<I>(entries: I) -> Result<Self, TilesetError>
    where
        I: IntoIterator<Item = (TileId, EntityKind)>,
    {
        let mut tileset = Self::empty();
        for (tile, kind) in entries {
            tileset.register(tile, kind)?;
        }
        Ok(tileset)
    }

    /// Registers `kind` as the entity constructed for `tile`.
    pub fn register(&mut self, tile: TileId, kind: EntityKind) -> Result<(), TilesetError> {
        if tile.is_empty() {
            return Err(TilesetError::ReservedId { kind });
        }
        if let Some(existing) = self.kinds.get(&tile) {
            return Err(TilesetError::DuplicateId {
                tile,
                existing: *existing,
                requested: kind,
            });
        }
        let _ = self.kinds.insert(tile, kind);
        Ok(())
    }

    /// Kind constructed for the provided tile id, if registered.
    #[must_use]
    pub fn kind_for(&self, tile: TileId) -> Option<EntityKind> {
        self.kinds.get(&tile).copied()
    }

    /// Number of registered tile ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Reports whether no tile ids are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for Tileset {
    fn default() -> Self {
        let mut kinds = BTreeMap::new();
        for (id, kind) in DEFAULT_REGISTRATIONS {
            let _ = kinds.insert(TileId::new(id), kind);
        }
        Self { kinds }
    }
}
