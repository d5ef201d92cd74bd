#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tag Jam.
//!
//! The world owns the static tile grid and every entity placed from a level.
//! It is only mutated through [`apply`] and only read through [`query`].

mod adjacency;
mod grid;
mod level;
mod registry;
pub mod shapes;

use tag_jam_core::{
    Command, EntityId, Event, LevelError, TileCoord, TileId, Tileset, WELCOME_BANNER,
};
use thiserror::Error;

pub use grid::StaticGrid;
pub use level::{populate, TileLayer};
pub use registry::Entity;

use registry::EntityRegistry;

/// Errors raised while applying commands to the world.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WorldError {
    /// The level data is inconsistent and construction must abort.
    #[error(transparent)]
    Level(#[from] LevelError),
    /// Adjacency resolution runs once per populated grid.
    #[error("adjacency has already been resolved for this level")]
    AdjacencyAlreadyResolved,
    /// Tiles cannot be placed after adjacency resolution.
    #[error("level is sealed after adjacency resolution")]
    LevelSealed,
    /// The command referenced an entity that is not registered.
    #[error("entity {} is not registered", .0.get())]
    UnknownEntity(EntityId),
}

/// Represents the authoritative Tag Jam world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    tileset: Tileset,
    grid: StaticGrid,
    registry: EntityRegistry,
    adjacency_resolved: bool,
}

impl World {
    /// Creates an empty world using the default tileset.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tileset(Tileset::default())
    }

    /// Creates an empty world that maps tile ids through `tileset`.
    #[must_use]
    pub fn with_tileset(tileset: Tileset) -> Self {
        Self {
            banner: WELCOME_BANNER,
            tileset,
            grid: StaticGrid::new(0, 0),
            registry: EntityRegistry::default(),
            adjacency_resolved: false,
        }
    }

    fn place_tile(
        &mut self,
        tile: TileId,
        cell: TileCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        if self.adjacency_resolved {
            return Err(WorldError::LevelSealed);
        }
        if tile.is_empty() {
            return Ok(());
        }
        if !self.grid.contains(cell) {
            return Err(LevelError::OutOfBounds {
                cell,
                columns: self.grid.columns(),
                rows: self.grid.rows(),
            }
            .into());
        }

        let Some(kind) = self.tileset.kind_for(tile) else {
            log::warn!(
                "no entity registered for tile id {} at ({}, {}); skipping",
                tile.get(),
                cell.column(),
                cell.row()
            );
            out_events.push(Event::UnknownTileSkipped { tile, cell });
            return Ok(());
        };

        if kind.is_static() {
            if let Some(occupant) = self.grid.static_entity_at(cell) {
                return Err(LevelError::CellOccupied { cell, occupant }.into());
            }
        }

        let entity = self.registry.insert(kind, cell);
        if kind.is_static() {
            let _ = self.grid.set_static_entity_at(entity, cell);
        }
        out_events.push(Event::EntitySpawned { entity, kind, cell });
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// A failed adjacency resolution still seals the level; the world must be
/// reconfigured before it can be populated again.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError> {
    match command {
        Command::ConfigureTileGrid { columns, rows } => {
            for removed in world.registry.clear() {
                out_events.push(Event::EntityRemoved {
                    entity: removed.id(),
                    kind: removed.kind(),
                });
            }
            world.grid = StaticGrid::new(columns, rows);
            world.adjacency_resolved = false;
            out_events.push(Event::TileGridConfigured { columns, rows });
            Ok(())
        }
        Command::PlaceTile { tile, cell } => world.place_tile(tile, cell, out_events),
        Command::ResolveAdjacency => {
            if world.adjacency_resolved {
                return Err(WorldError::AdjacencyAlreadyResolved);
            }
            world.adjacency_resolved = true;
            adjacency::resolve_all(&mut world.grid, &mut world.registry, out_events)?;
            Ok(())
        }
        Command::RemoveEntity { entity } => {
            let removed = world
                .registry
                .remove(entity)
                .ok_or(WorldError::UnknownEntity(entity))?;
            world.grid.forget(entity);
            out_events.push(Event::EntityRemoved {
                entity,
                kind: removed.kind(),
            });
            Ok(())
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tag_jam_core::{EntityId, TileCoord};

    use super::{Entity, StaticGrid, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the static tile grid.
    #[must_use]
    pub fn grid(world: &World) -> &StaticGrid {
        &world.grid
    }

    /// Static entity occupying the tile. Tiles outside the grid are empty.
    #[must_use]
    pub fn static_entity_at(world: &World, cell: TileCoord) -> Option<&Entity> {
        let id = world.grid.static_entity_at(cell)?;
        world.registry.get(id)
    }

    /// Looks up a live entity by identifier.
    #[must_use]
    pub fn entity(world: &World, entity: EntityId) -> Option<&Entity> {
        world.registry.get(entity)
    }

    /// Live entities in registration order.
    pub fn entities(world: &World) -> impl Iterator<Item = &Entity> {
        world.registry.iter()
    }

    /// Reports whether adjacency has been resolved for the current level.
    #[must_use]
    pub fn adjacency_resolved(world: &World) -> bool {
        world.adjacency_resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tag_jam_core::EntityKind;

    fn configured(columns: u32, rows: u32) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureTileGrid { columns, rows },
            &mut events,
        )
        .expect("configure");
        world
    }

    #[test]
    fn new_world_reports_banner() {
        let world = World::new();
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
        assert_eq!(query::entities(&world).count(), 0);
    }

    #[test]
    fn movable_entities_stay_out_of_the_grid() {
        let mut world = configured(3, 3);
        let mut events = Vec::new();
        let cell = TileCoord::new(1, 1);
        apply(
            &mut world,
            Command::PlaceTile {
                tile: TileId::new(5),
                cell,
            },
            &mut events,
        )
        .expect("player placed");

        assert!(query::static_entity_at(&world, cell).is_none());
        let spawned: Vec<_> = query::entities(&world).map(Entity::kind).collect();
        assert_eq!(spawned, vec![EntityKind::Player]);
    }

    #[test]
    fn reconfiguring_tears_down_previous_level() {
        let mut world = configured(2, 1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTile {
                tile: TileId::new(1),
                cell: TileCoord::new(0, 0),
            },
            &mut events,
        )
        .expect("wall placed");
        apply(&mut world, Command::ResolveAdjacency, &mut events).expect("resolved");

        events.clear();
        apply(
            &mut world,
            Command::ConfigureTileGrid {
                columns: 4,
                rows: 4,
            },
            &mut events,
        )
        .expect("reconfigure");

        assert!(matches!(
            events.as_slice(),
            [
                Event::EntityRemoved {
                    kind: EntityKind::Wall,
                    ..
                },
                Event::TileGridConfigured {
                    columns: 4,
                    rows: 4
                }
            ]
        ));
        assert!(!query::adjacency_resolved(&world));
        assert_eq!(query::grid(&world).columns(), 4);
    }
}
