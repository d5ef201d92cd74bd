//! Adjacency resolution for static entities.
//!
//! Resolution walks the registry once in registration order. Tagging zones
//! absorb contiguous neighbours first, then every static entity looks at its
//! orthogonal neighbours through the grid to pick attachment sides and wall
//! connectivity. Absorbed zones are queued for removal while the walk runs and
//! leave the registry at the barrier that ends it.

use tag_jam_core::{
    Adjacency, EntityId, EntityKind, Event, LevelError, Side, TileCoord, TileExtent, TileRect,
    WallLinks,
};

use crate::{
    grid::StaticGrid,
    registry::{Entity, EntityRegistry},
    shapes::{self, Shape},
};

/// Resolves every live static entity and reports removals caused by merging.
///
/// Removal events are emitted even when resolution fails part way, so owners
/// of per-entity resources can still tear down the absorbed zones.
pub(crate) fn resolve_all(
    grid: &mut StaticGrid,
    registry: &mut EntityRegistry,
    out_events: &mut Vec<Event>,
) -> Result<(), LevelError> {
    registry.protect();
    let result = resolve_live(grid, registry, out_events);
    for removed in registry.end_protect() {
        out_events.push(Event::EntityRemoved {
            entity: removed.id(),
            kind: removed.kind(),
        });
    }
    result
}

fn resolve_live(
    grid: &mut StaticGrid,
    registry: &mut EntityRegistry,
    out_events: &mut Vec<Event>,
) -> Result<(), LevelError> {
    for id in registry.live_ids() {
        let Some(entity) = registry.get(id) else {
            continue;
        };
        if entity.is_absorbed() || !entity.kind().needs_adjacency() {
            continue;
        }
        let kind = entity.kind();
        let anchor = entity.anchor();
        let region = entity.region();

        let (adjacency, shape) = match kind {
            EntityKind::Wall => {
                let links = wall_links(grid, registry, anchor);
                (Adjacency::Wall(links), shapes::wall_shape(links))
            }
            EntityKind::Door => {
                let (side, double) = door_attachment(grid, registry, anchor);
                (
                    Adjacency::Door { side, double },
                    shapes::door_shape(anchor, side, double),
                )
            }
            EntityKind::TaggingLocation => {
                let region = merge_zone(grid, registry, id, region, out_events)?;
                let side = zone_attachment(grid, registry, region);
                (
                    Adjacency::TaggingZone { side },
                    shapes::poster_shape(region, side),
                )
            }
            EntityKind::Beer | EntityKind::Player => (Adjacency::Unresolved, Shape::None),
        };

        if let Some(entity) = registry.get_mut(id) {
            entity.adjacency = adjacency;
            entity.shape = shape;
        }
        log::trace!("entity {} ({}) resolved to {adjacency:?}", id.get(), kind.name());
        out_events.push(Event::AdjacencyResolved {
            entity: id,
            adjacency,
        });
    }
    Ok(())
}

fn kind_at(grid: &StaticGrid, registry: &EntityRegistry, cell: Option<TileCoord>) -> Option<EntityKind> {
    let entity = grid.static_entity_at(cell?)?;
    registry.get(entity).map(Entity::kind)
}

fn wall_links(grid: &StaticGrid, registry: &EntityRegistry, cell: TileCoord) -> WallLinks {
    let connects = |side: Side| {
        kind_at(grid, registry, cell.neighbor(side)).is_some_and(EntityKind::connects_walls)
    };
    WallLinks {
        left: connects(Side::Left),
        right: connects(Side::Right),
        up: connects(Side::Up),
        down: connects(Side::Down),
    }
}

/// Side the door hangs on and whether a second door faces it.
fn door_attachment(grid: &StaticGrid, registry: &EntityRegistry, cell: TileCoord) -> (Side, bool) {
    let side = Side::ATTACHMENT_PRIORITY
        .into_iter()
        .find(|&side| kind_at(grid, registry, cell.neighbor(side)).is_some_and(EntityKind::is_wall_like))
        .unwrap_or(Side::Left);
    let double =
        kind_at(grid, registry, cell.neighbor(side.opposite())) == Some(EntityKind::Door);
    (side, double)
}

/// Absorbs neighbouring zones into `id` until none is left along its axis.
fn merge_zone(
    grid: &mut StaticGrid,
    registry: &mut EntityRegistry,
    id: EntityId,
    mut region: TileRect,
    out_events: &mut Vec<Event>,
) -> Result<TileRect, LevelError> {
    loop {
        let Some(survivor) = registry.get(id) else {
            return Ok(region);
        };
        let Some(candidate) = merge_candidate(grid, registry, survivor) else {
            return Ok(region);
        };

        let merged = combine(survivor, candidate)?;
        let absorbed = candidate.id();
        let absorbed_cells: Vec<TileCoord> = candidate.region().cells().collect();

        for cell in absorbed_cells {
            let _ = grid.set_static_entity_at(id, cell);
        }
        if let Some(survivor) = registry.get_mut(id) {
            survivor.anchor = merged.origin();
            survivor.extent = merged.extent();
        }
        if let Some(candidate) = registry.get_mut(absorbed) {
            candidate.absorbed = true;
        }
        let _ = registry.remove(absorbed);

        log::debug!(
            "zone {} absorbed zone {}, now {}x{} at ({}, {})",
            id.get(),
            absorbed.get(),
            merged.extent().width(),
            merged.extent().height(),
            merged.origin().column(),
            merged.origin().row()
        );
        out_events.push(Event::TaggingZonesMerged {
            survivor: id,
            absorbed,
            region: merged,
        });
        region = merged;
    }
}

/// Next zone the survivor may absorb: left then right while horizontal, up
/// then down while vertical.
fn merge_candidate<'a>(
    grid: &StaticGrid,
    registry: &'a EntityRegistry,
    survivor: &Entity,
) -> Option<&'a Entity> {
    let region = survivor.region();
    let origin = region.origin();
    let extent = region.extent();
    let width = i64::from(extent.width());
    let height = i64::from(extent.height());

    let mut probes = Vec::with_capacity(4);
    if extent.is_horizontal() {
        probes.push(origin.offset(-1, 0));
        probes.push(origin.offset(width, 0));
    }
    if extent.is_vertical() {
        probes.push(origin.offset(0, -1));
        probes.push(origin.offset(0, height));
    }

    probes.into_iter().flatten().find_map(|cell| {
        let candidate = registry.get(grid.static_entity_at(cell)?)?;
        let mergeable = candidate.id() != survivor.id()
            && !candidate.is_absorbed()
            && candidate.kind().merge_group().is_some()
            && candidate.kind().merge_group() == survivor.kind().merge_group();
        mergeable.then_some(candidate)
    })
}

/// Footprint of `survivor` after absorbing `absorbed`.
///
/// The absorbed entity must cover a single tile. A neighbour sharing the
/// survivor's column grows its height, any other neighbour grows its width.
fn combine(survivor: &Entity, absorbed: &Entity) -> Result<TileRect, LevelError> {
    let absorbed_extent = absorbed.extent();
    if !absorbed_extent.is_unit() {
        return Err(LevelError::NonUnitMerge {
            survivor: survivor.id(),
            absorbed: absorbed.id(),
            extent: absorbed_extent,
        });
    }

    let extent = survivor.extent();
    let grown = if absorbed.anchor().column() == survivor.anchor().column() {
        TileExtent::new(extent.width(), extent.height() + 1)
    } else {
        TileExtent::new(extent.width() + 1, extent.height())
    };
    if grown.width() > 1 && grown.height() > 1 {
        return Err(LevelError::MixedAxisGrowth {
            survivor: survivor.id(),
            extent: grown,
        });
    }

    Ok(TileRect::from_origin_and_extent(
        survivor.anchor().min(absorbed.anchor()),
        grown,
    ))
}

/// First wall-backed side in priority order that suits the zone's axis.
fn zone_attachment(grid: &StaticGrid, registry: &EntityRegistry, region: TileRect) -> Option<Side> {
    let extent = region.extent();
    Side::ATTACHMENT_PRIORITY
        .into_iter()
        .filter(|side| {
            if side.is_horizontal() {
                extent.is_vertical()
            } else {
                extent.is_horizontal()
            }
        })
        .find(|&side| {
            region
                .border(side)
                .any(|cell| kind_at(grid, registry, Some(cell)).is_some_and(EntityKind::is_wall_like))
        })
}
