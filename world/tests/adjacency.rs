use tag_jam_core::{
    Adjacency, Command, EntityKind, Event, LevelError, Side, TileCoord, TileExtent, TileId,
    WallLinks,
};
use tag_jam_world::{apply, populate, query, shapes::Shape, Entity, TileLayer, World, WorldError};

const WALL: u32 = 1;
const TAG: u32 = 3;
const DOOR: u32 = 4;

fn layout(columns: u32, rows: u32, tiles: &[(u32, u32, u32)]) -> TileLayer {
    let mut cells = vec![vec![TileId::EMPTY; columns as usize]; rows as usize];
    for &(column, row, tile) in tiles {
        cells[row as usize][column as usize] = TileId::new(tile);
    }
    TileLayer::from_rows(cells).expect("rectangular layout")
}

fn build(layer: &TileLayer) -> (World, Vec<Event>) {
    let mut world = World::new();
    let mut events = Vec::new();
    populate(&mut world, layer, &mut events).expect("level builds");
    (world, events)
}

fn entities_of(world: &World, kind: EntityKind) -> Vec<&Entity> {
    query::entities(world)
        .filter(|entity| entity.kind() == kind)
        .collect()
}

fn removed_count(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::EntityRemoved { .. }))
        .count()
}

#[test]
fn zone_run_under_wall_collapses_and_attaches_up() {
    let layer = layout(
        8,
        8,
        &[(2, 4, WALL), (2, 5, TAG), (3, 5, TAG), (4, 5, TAG)],
    );
    let (world, events) = build(&layer);

    let zones = entities_of(&world, EntityKind::TaggingLocation);
    assert_eq!(zones.len(), 1, "exactly one zone survives the merge");
    let zone = zones[0];
    assert_eq!(zone.anchor(), TileCoord::new(2, 5));
    assert_eq!(zone.extent(), TileExtent::new(3, 1));
    assert_eq!(
        zone.adjacency(),
        Adjacency::TaggingZone {
            side: Some(Side::Up)
        }
    );
    assert!(matches!(zone.shape(), Shape::Poster(_)));

    for column in 2..5 {
        let occupant = query::static_entity_at(&world, TileCoord::new(column, 5))
            .map(Entity::id);
        assert_eq!(occupant, Some(zone.id()), "column {column}");
    }
    assert_eq!(removed_count(&events), 2);
}

#[test]
fn horizontal_runs_converge_to_a_single_zone() {
    for length in 1..=6 {
        let tiles: Vec<_> = (0..length).map(|offset| (1 + offset, 2, TAG)).collect();
        let (world, events) = build(&layout(8, 4, &tiles));

        let zones = entities_of(&world, EntityKind::TaggingLocation);
        assert_eq!(zones.len(), 1, "run of {length}");
        assert_eq!(zones[0].anchor(), TileCoord::new(1, 2));
        assert_eq!(zones[0].extent(), TileExtent::new(length, 1));
        assert!(!zones[0].is_absorbed());
        assert_eq!(removed_count(&events), length as usize - 1);
    }
}

#[test]
fn vertical_runs_converge_to_a_single_zone() {
    for length in 2..=5 {
        let tiles: Vec<_> = (0..length).map(|offset| (3, 1 + offset, TAG)).collect();
        let (world, _) = build(&layout(6, 8, &tiles));

        let zones = entities_of(&world, EntityKind::TaggingLocation);
        assert_eq!(zones.len(), 1, "run of {length}");
        assert_eq!(zones[0].anchor(), TileCoord::new(3, 1));
        assert_eq!(zones[0].extent(), TileExtent::new(1, length));
        for row in 1..=length {
            assert_eq!(
                query::static_entity_at(&world, TileCoord::new(3, row)).map(Entity::id),
                Some(zones[0].id())
            );
        }
    }
}

#[test]
fn vertical_zone_attaches_to_side_wall() {
    let layer = layout(5, 5, &[(1, 2, WALL), (2, 1, TAG), (2, 2, TAG)]);
    let (world, _) = build(&layer);

    let zone = entities_of(&world, EntityKind::TaggingLocation)[0];
    assert_eq!(zone.extent(), TileExtent::new(1, 2));
    assert_eq!(
        zone.adjacency(),
        Adjacency::TaggingZone {
            side: Some(Side::Left)
        }
    );
}

#[test]
fn zone_without_wall_floats() {
    let (world, _) = build(&layout(3, 3, &[(1, 1, TAG)]));

    let zone = entities_of(&world, EntityKind::TaggingLocation)[0];
    assert_eq!(zone.adjacency(), Adjacency::TaggingZone { side: None });
    assert_eq!(zone.shape(), &Shape::None);
}

#[test]
fn l_shaped_zones_abort_level_construction() {
    let layer = layout(6, 8, &[(2, 5, TAG), (3, 5, TAG), (2, 6, TAG)]);
    let mut world = World::new();
    let mut events = Vec::new();

    let result = populate(&mut world, &layer, &mut events);

    assert!(
        matches!(
            result,
            Err(WorldError::Level(LevelError::NonUnitMerge { .. }))
        ),
        "got {result:?}"
    );
    assert_eq!(
        removed_count(&events),
        1,
        "zones absorbed before the failure are still reported"
    );
}

#[test]
fn doors_in_a_doorway_are_double() {
    let layer = layout(
        8,
        8,
        &[(3, 4, WALL), (4, 4, DOOR), (5, 4, DOOR), (6, 4, WALL)],
    );
    let (world, _) = build(&layer);

    let door_at = |column| {
        query::static_entity_at(&world, TileCoord::new(column, 4))
            .map(Entity::adjacency)
            .expect("door placed")
    };
    assert_eq!(
        door_at(4),
        Adjacency::Door {
            side: Side::Left,
            double: true
        }
    );
    assert_eq!(
        door_at(5),
        Adjacency::Door {
            side: Side::Right,
            double: true
        }
    );
}

#[test]
fn side_by_side_doors_on_a_wall_run_stay_single() {
    let layer = layout(
        8,
        8,
        &[(4, 4, DOOR), (5, 4, DOOR), (4, 5, WALL), (5, 5, WALL)],
    );
    let (world, _) = build(&layer);

    // Both hang Down; the tiles facing their hinges are empty.
    for column in [4, 5] {
        let door = query::static_entity_at(&world, TileCoord::new(column, 4))
            .map(Entity::adjacency)
            .expect("door placed");
        assert_eq!(
            door,
            Adjacency::Door {
                side: Side::Down,
                double: false
            },
            "door at column {column}"
        );
    }
}

#[test]
fn lone_door_is_single() {
    let layer = layout(4, 4, &[(1, 1, DOOR), (1, 2, WALL)]);
    let (world, _) = build(&layer);

    let door = entities_of(&world, EntityKind::Door)[0];
    assert_eq!(
        door.adjacency(),
        Adjacency::Door {
            side: Side::Down,
            double: false
        }
    );
    assert!(matches!(door.shape(), Shape::Door(_)));
}

#[test]
fn door_without_wall_defaults_to_left() {
    let (world, _) = build(&layout(3, 3, &[(1, 1, DOOR)]));

    let door = entities_of(&world, EntityKind::Door)[0];
    assert_eq!(
        door.adjacency(),
        Adjacency::Door {
            side: Side::Left,
            double: false
        }
    );
}

#[test]
fn walls_connect_to_walls_and_doors() {
    let layer = layout(
        5,
        5,
        &[(0, 0, WALL), (1, 0, WALL), (2, 0, WALL), (1, 1, DOOR), (4, 4, WALL)],
    );
    let (world, _) = build(&layer);

    let links = |column, row| match query::static_entity_at(&world, TileCoord::new(column, row))
        .map(Entity::adjacency)
    {
        Some(Adjacency::Wall(links)) => links,
        other => panic!("wall expected, got {other:?}"),
    };

    assert_eq!(
        links(1, 0),
        WallLinks {
            left: true,
            right: true,
            up: false,
            down: true,
        }
    );
    assert_eq!(
        links(0, 0),
        WallLinks {
            right: true,
            ..WallLinks::default()
        }
    );
    assert_eq!(links(4, 4), WallLinks::default());
}

#[test]
fn every_static_entity_reports_resolution() {
    let layer = layout(4, 4, &[(0, 0, WALL), (1, 0, DOOR), (2, 2, TAG), (3, 3, 2)]);
    let (_, events) = build(&layer);

    let resolved = events
        .iter()
        .filter(|event| matches!(event, Event::AdjacencyResolved { .. }))
        .count();
    assert_eq!(resolved, 3, "beer takes no part in resolution");
}

#[test]
fn resolution_runs_once_and_seals_the_level() {
    let (mut world, _) = build(&layout(3, 3, &[(0, 0, WALL)]));
    let mut events = Vec::new();

    assert_eq!(
        apply(&mut world, Command::ResolveAdjacency, &mut events),
        Err(WorldError::AdjacencyAlreadyResolved)
    );
    assert_eq!(
        apply(
            &mut world,
            Command::PlaceTile {
                tile: TileId::new(WALL),
                cell: TileCoord::new(1, 1),
            },
            &mut events,
        ),
        Err(WorldError::LevelSealed)
    );
    assert!(events.is_empty());
}
