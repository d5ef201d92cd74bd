use tag_jam_core::{
    Command, EntityId, EntityKind, Event, LevelError, TileCoord, TileId, Tileset,
};
use tag_jam_world::{apply, populate, query, TileLayer, World, WorldError};

fn configured(columns: u32, rows: u32) -> (World, Vec<Event>) {
    let mut world = World::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureTileGrid { columns, rows },
        &mut events,
    )
    .expect("configure grid");
    (world, events)
}

fn place(world: &mut World, tile: u32, column: u32, row: u32) -> Result<Vec<Event>, WorldError> {
    let mut events = Vec::new();
    apply(
        world,
        Command::PlaceTile {
            tile: TileId::new(tile),
            cell: TileCoord::new(column, row),
        },
        &mut events,
    )?;
    Ok(events)
}

#[test]
fn lookups_outside_the_grid_return_nothing() {
    let (mut world, _) = configured(4, 3);
    for column in 0..4 {
        for row in 0..3 {
            let _ = place(&mut world, 1, column, row).expect("wall placed");
        }
    }

    for cell in [
        TileCoord::new(4, 0),
        TileCoord::new(0, 3),
        TileCoord::new(100, 100),
        TileCoord::new(u32::MAX, 0),
        TileCoord::new(0, u32::MAX),
    ] {
        assert!(query::static_entity_at(&world, cell).is_none(), "{cell:?}");
        assert!(query::grid(&world).static_entity_at(cell).is_none());
    }
}

#[test]
fn placing_outside_the_grid_is_a_level_error() {
    let (mut world, _) = configured(2, 2);
    assert_eq!(
        place(&mut world, 1, 2, 0),
        Err(WorldError::Level(LevelError::OutOfBounds {
            cell: TileCoord::new(2, 0),
            columns: 2,
            rows: 2,
        }))
    );
}

#[test]
fn second_static_entity_on_a_cell_is_rejected() {
    let (mut world, _) = configured(2, 2);
    let first = place(&mut world, 1, 1, 1).expect("wall placed");
    let Some(Event::EntitySpawned { entity, .. }) = first.first() else {
        panic!("spawn event expected, got {first:?}");
    };

    assert_eq!(
        place(&mut world, 4, 1, 1),
        Err(WorldError::Level(LevelError::CellOccupied {
            cell: TileCoord::new(1, 1),
            occupant: *entity,
        }))
    );
}

#[test]
fn unknown_tile_ids_are_skipped_with_an_event() {
    let (mut world, _) = configured(2, 2);
    let events = place(&mut world, 42, 0, 1).expect("unknown id is not fatal");

    assert_eq!(
        events,
        vec![Event::UnknownTileSkipped {
            tile: TileId::new(42),
            cell: TileCoord::new(0, 1),
        }]
    );
    assert_eq!(query::entities(&world).count(), 0);
}

#[test]
fn empty_tiles_place_nothing() {
    let (mut world, _) = configured(2, 2);
    assert_eq!(place(&mut world, 0, 0, 0), Ok(Vec::new()));
}

#[test]
fn custom_tileset_drives_construction() {
    let tileset = Tileset::from_entries([
        (TileId::new(7), EntityKind::Wall),
        (TileId::new(8), EntityKind::Beer),
    ])
    .expect("valid tileset");
    let mut world = World::with_tileset(tileset);
    let layer = TileLayer::parse_csv("7,8\n1,7\n").expect("valid layer");
    let mut events = Vec::new();

    populate(&mut world, &layer, &mut events).expect("level builds");

    let kinds: Vec<_> = query::entities(&world).map(|entity| entity.kind()).collect();
    assert_eq!(
        kinds,
        vec![EntityKind::Wall, EntityKind::Beer, EntityKind::Wall]
    );
    assert!(events.contains(&Event::UnknownTileSkipped {
        tile: TileId::new(1),
        cell: TileCoord::new(0, 1),
    }));
}

#[test]
fn population_emits_events_in_command_order() {
    let layer = TileLayer::parse_csv("1,2\n").expect("valid layer");
    let mut world = World::new();
    let mut events = Vec::new();
    populate(&mut world, &layer, &mut events).expect("level builds");

    assert!(matches!(
        events.as_slice(),
        [
            Event::TileGridConfigured {
                columns: 2,
                rows: 1
            },
            Event::EntitySpawned {
                kind: EntityKind::Wall,
                ..
            },
            Event::EntitySpawned {
                kind: EntityKind::Beer,
                ..
            },
            Event::AdjacencyResolved { .. },
        ]
    ));
    assert!(query::adjacency_resolved(&world));
}

#[test]
fn removing_an_entity_frees_its_cell() {
    let (mut world, _) = configured(3, 1);
    let events = place(&mut world, 4, 1, 0).expect("door placed");
    let Some(Event::EntitySpawned { entity, .. }) = events.first().cloned() else {
        panic!("spawn event expected");
    };

    let mut removal = Vec::new();
    apply(&mut world, Command::RemoveEntity { entity }, &mut removal).expect("removed");
    assert_eq!(
        removal,
        vec![Event::EntityRemoved {
            entity,
            kind: EntityKind::Door,
        }]
    );
    assert!(query::static_entity_at(&world, TileCoord::new(1, 0)).is_none());
    assert!(query::entity(&world, entity).is_none());

    assert_eq!(
        apply(&mut world, Command::RemoveEntity { entity }, &mut removal),
        Err(WorldError::UnknownEntity(entity))
    );
    assert_eq!(
        apply(
            &mut world,
            Command::RemoveEntity {
                entity: EntityId::new(99)
            },
            &mut removal
        ),
        Err(WorldError::UnknownEntity(EntityId::new(99)))
    );
}

#[test]
fn reconfiguring_the_grid_retires_old_identifiers() {
    let (mut world, _) = configured(3, 1);
    let events = place(&mut world, 1, 0, 0).expect("wall placed");
    let Some(Event::EntitySpawned { entity: old, .. }) = events.first().cloned() else {
        panic!("spawn event expected");
    };

    let mut reconfigure = Vec::new();
    apply(
        &mut world,
        Command::ConfigureTileGrid { columns: 3, rows: 1 },
        &mut reconfigure,
    )
    .expect("reconfigure grid");
    assert_eq!(
        reconfigure.first(),
        Some(&Event::EntityRemoved {
            entity: old,
            kind: EntityKind::Wall,
        })
    );

    let events = place(&mut world, 4, 1, 0).expect("door placed");
    let Some(Event::EntitySpawned { entity: new, .. }) = events.first().cloned() else {
        panic!("spawn event expected");
    };
    assert_ne!(new, old, "identifiers from the previous level must stay retired");

    let mut removal = Vec::new();
    assert_eq!(
        apply(&mut world, Command::RemoveEntity { entity: old }, &mut removal),
        Err(WorldError::UnknownEntity(old))
    );
    assert!(removal.is_empty());
    assert_eq!(
        query::static_entity_at(&world, TileCoord::new(1, 0)).map(|entity| entity.id()),
        Some(new),
        "the new door survives a stale removal"
    );
}
