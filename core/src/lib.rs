#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tag Jam workspace.
//!
//! This crate defines the vocabulary that connects the level loader, the
//! authoritative world, and the driver adapter. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values the driver
//! reacts to (for example by acquiring or releasing pooled resources for an
//! entity).

mod tileset;

use serde::Deserialize;
use thiserror::Error;

pub use tileset::{Tileset, TilesetError};

/// Canonical banner emitted when the game boots.
pub const WELCOME_BANNER: &str = "Welcome to Tag Jam.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Replaces the static tile grid with an empty grid of the given size.
    ConfigureTileGrid {
        /// Number of tile columns laid out in the grid.
        columns: u32,
        /// Number of tile rows laid out in the grid.
        rows: u32,
    },
    /// Constructs the entity registered for `tile` at the provided cell.
    PlaceTile {
        /// Tile identifier read from the level layer.
        tile: TileId,
        /// Cell the tile was read from.
        cell: TileCoord,
    },
    /// Derives adjacency state for every placed static entity.
    ///
    /// Valid exactly once per populated grid.
    ResolveAdjacency,
    /// Removes an entity from the registry and, when static, from the grid.
    RemoveEntity {
        /// Identifier of the entity targeted for removal.
        entity: EntityId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The static tile grid was replaced.
    TileGridConfigured {
        /// Number of columns in the new grid.
        columns: u32,
        /// Number of rows in the new grid.
        rows: u32,
    },
    /// A new entity was constructed and registered.
    EntitySpawned {
        /// Identifier assigned to the entity.
        entity: EntityId,
        /// Kind of entity that was constructed.
        kind: EntityKind,
        /// Cell the entity was placed on.
        cell: TileCoord,
    },
    /// A tile id without a registered entity kind was ignored.
    UnknownTileSkipped {
        /// Tile identifier that had no registration.
        tile: TileId,
        /// Cell the tile was read from.
        cell: TileCoord,
    },
    /// Two tagging zones collapsed into one.
    TaggingZonesMerged {
        /// Zone that absorbed its neighbour and keeps living.
        survivor: EntityId,
        /// Zone that was absorbed and is pending removal.
        absorbed: EntityId,
        /// Region covered by the survivor after the merge.
        region: TileRect,
    },
    /// Adjacency state was computed for an entity.
    AdjacencyResolved {
        /// Entity whose state was computed.
        entity: EntityId,
        /// Final adjacency state.
        adjacency: Adjacency,
    },
    /// An entity left the registry and should be torn down by its owner.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
        /// Kind of the removed entity.
        kind: EntityKind,
    },
}

/// Unique identifier assigned to an entity by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Raw tile identifier stored in a level layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u32);

impl TileId {
    /// Identifier reserved for empty space.
    pub const EMPTY: TileId = TileId(0);

    /// Creates a new tile identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether the identifier denotes empty space.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Location of a single tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Coordinate shifted by the provided signed deltas.
    ///
    /// Returns `None` when the result would leave the unsigned coordinate
    /// space; grids treat that exactly like any other out-of-range lookup.
    #[must_use]
    pub fn offset(self, columns: i64, rows: i64) -> Option<TileCoord> {
        let column = u32::try_from(i64::from(self.column).checked_add(columns)?).ok()?;
        let row = u32::try_from(i64::from(self.row).checked_add(rows)?).ok()?;
        Some(TileCoord::new(column, row))
    }

    /// Orthogonal neighbour on the provided side.
    #[must_use]
    pub fn neighbor(self, side: Side) -> Option<TileCoord> {
        let (columns, rows) = side.delta();
        self.offset(columns, rows)
    }

    /// Component-wise minimum of two coordinates.
    #[must_use]
    pub fn min(self, other: TileCoord) -> TileCoord {
        TileCoord::new(self.column.min(other.column), self.row.min(other.row))
    }
}

/// Size of a multi-tile entity measured in whole tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileExtent {
    width: u32,
    height: u32,
}

impl TileExtent {
    /// Footprint of a single tile.
    pub const UNIT: TileExtent = TileExtent::new(1, 1);

    /// Creates a new extent with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the extent in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the extent in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the extent covers exactly one tile.
    #[must_use]
    pub const fn is_unit(&self) -> bool {
        self.width == 1 && self.height == 1
    }

    /// Width is at least the height. A unit extent is both horizontal and vertical.
    #[must_use]
    pub const fn is_horizontal(&self) -> bool {
        self.width >= self.height
    }

    /// Height is at least the width. A unit extent is both horizontal and vertical.
    #[must_use]
    pub const fn is_vertical(&self) -> bool {
        self.height >= self.width
    }

    /// Length of the longer axis.
    #[must_use]
    pub fn long_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

impl Default for TileExtent {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Axis-aligned rectangle expressed in tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileRect {
    origin: TileCoord,
    extent: TileExtent,
}

impl TileRect {
    /// Constructs a rectangle from an origin tile and extent.
    #[must_use]
    pub const fn from_origin_and_extent(origin: TileCoord, extent: TileExtent) -> Self {
        Self { origin, extent }
    }

    /// Upper-left tile that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> TileCoord {
        self.origin
    }

    /// Dimensions of the rectangle.
    #[must_use]
    pub const fn extent(&self) -> TileExtent {
        self.extent
    }

    /// Tiles covered by the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = TileCoord> {
        let origin = self.origin;
        let extent = self.extent;
        (0..extent.height()).flat_map(move |dy| {
            (0..extent.width()).filter_map(move |dx| {
                origin.offset(i64::from(dx), i64::from(dy))
            })
        })
    }

    /// Tiles bordering the rectangle on the provided side, nearest first.
    ///
    /// Tiles that would fall outside the unsigned coordinate space are
    /// skipped.
    pub fn border(&self, side: Side) -> impl Iterator<Item = TileCoord> {
        let origin = self.origin;
        let width = i64::from(self.extent.width());
        let height = i64::from(self.extent.height());
        let (fixed, span, horizontal_run) = match side {
            Side::Left => (-1, height, false),
            Side::Right => (width, height, false),
            Side::Up => (-1, width, true),
            Side::Down => (height, width, true),
        };
        (0..span).filter_map(move |step| {
            if horizontal_run {
                origin.offset(step, fixed)
            } else {
                origin.offset(fixed, step)
            }
        })
    }
}

/// Orthogonal sides used for attachment and connectivity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing column indices.
    Right,
    /// Toward decreasing row indices.
    Up,
    /// Toward increasing row indices.
    Down,
}

impl Side {
    /// Order in which candidate sides are examined when attaching to a wall.
    pub const ATTACHMENT_PRIORITY: [Side; 4] = [Side::Left, Side::Right, Side::Up, Side::Down];

    /// Side facing the opposite direction along the same axis.
    #[must_use]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Up => Side::Down,
            Side::Down => Side::Up,
        }
    }

    /// Reports whether the side lies on the horizontal axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    const fn delta(self) -> (i64, i64) {
        match self {
            Side::Left => (-1, 0),
            Side::Right => (1, 0),
            Side::Up => (0, -1),
            Side::Down => (0, 1),
        }
    }
}

/// Groups of entities that may merge with each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MergeGroup {
    /// Contiguous tagging locations along a wall.
    TaggingZone,
}

/// Closed set of entity kinds a level can place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Solid wall segment.
    Wall,
    /// Beer bottle the player can drink.
    Beer,
    /// Wall surface the player can tag.
    TaggingLocation,
    /// Swinging door hinged on a wall.
    Door,
    /// The player character.
    Player,
}

impl EntityKind {
    /// Every kind in declaration order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Wall,
        EntityKind::Beer,
        EntityKind::TaggingLocation,
        EntityKind::Door,
        EntityKind::Player,
    ];

    /// Static entities occupy grid cells; the rest move freely.
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(
            self,
            EntityKind::Wall | EntityKind::Door | EntityKind::TaggingLocation
        )
    }

    /// Doors and tagging locations attach only to these.
    #[must_use]
    pub const fn is_wall_like(self) -> bool {
        matches!(self, EntityKind::Wall)
    }

    /// Walls draw connecting segments toward these.
    #[must_use]
    pub const fn connects_walls(self) -> bool {
        matches!(self, EntityKind::Wall | EntityKind::Door)
    }

    /// Merge group the kind belongs to, if any.
    #[must_use]
    pub const fn merge_group(self) -> Option<MergeGroup> {
        match self {
            EntityKind::TaggingLocation => Some(MergeGroup::TaggingZone),
            _ => None,
        }
    }

    /// Reports whether the kind takes part in adjacency resolution.
    #[must_use]
    pub const fn needs_adjacency(self) -> bool {
        self.is_static()
    }

    /// Stable name used in resource keys and configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EntityKind::Wall => "Wall",
            EntityKind::Beer => "Beer",
            EntityKind::TaggingLocation => "TaggingLocation",
            EntityKind::Door => "Door",
            EntityKind::Player => "Player",
        }
    }
}

/// Sides along which a wall connects to neighbouring walls or doors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WallLinks {
    /// Connected toward decreasing columns.
    pub left: bool,
    /// Connected toward increasing columns.
    pub right: bool,
    /// Connected toward decreasing rows.
    pub up: bool,
    /// Connected toward increasing rows.
    pub down: bool,
}

/// Relationship of an entity to its orthogonal neighbours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Adjacency {
    /// Not computed yet, or the kind does not take part in resolution.
    #[default]
    Unresolved,
    /// Wall connectivity.
    Wall(WallLinks),
    /// Door hinge side and double-door status.
    Door {
        /// Side of the wall the door hangs on.
        side: Side,
        /// Another door sits on the opposite side along the attachment axis.
        double: bool,
    },
    /// Wall the tagging zone is painted on. `None` for a floating zone.
    TaggingZone {
        /// Side holding the wall, if any.
        side: Option<Side>,
    },
}

/// Level data violations that abort level construction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// A static entity was placed on a cell already holding one.
    #[error("cell ({}, {}) already holds static entity {}", .cell.column(), .cell.row(), .occupant.get())]
    CellOccupied {
        /// Contested cell.
        cell: TileCoord,
        /// Entity already registered there.
        occupant: EntityId,
    },
    /// A tile was placed outside the configured grid.
    #[error("cell ({}, {}) lies outside the {columns}x{rows} grid", .cell.column(), .cell.row())]
    OutOfBounds {
        /// Offending cell.
        cell: TileCoord,
        /// Grid width.
        columns: u32,
        /// Grid height.
        rows: u32,
    },
    /// A zone tried to absorb a neighbour that already spans several tiles.
    #[error("entity {} cannot absorb entity {} with non-unit extent {}x{}", .survivor.get(), .absorbed.get(), .extent.width(), .extent.height())]
    NonUnitMerge {
        /// Absorbing entity.
        survivor: EntityId,
        /// Neighbour that was not 1x1.
        absorbed: EntityId,
        /// Extent of the neighbour.
        extent: TileExtent,
    },
    /// A merge grew a zone along both axes.
    #[error("entity {} grew to {}x{} while merging", .survivor.get(), .extent.width(), .extent.height())]
    MixedAxisGrowth {
        /// Absorbing entity.
        survivor: EntityId,
        /// Extent reached by the rejected merge.
        extent: TileExtent,
    },
    /// A CSV tile layer could not be parsed.
    #[error("malformed tile layer at line {line}: {reason}")]
    MalformedLayer {
        /// One-based line number within the layer.
        line: usize,
        /// Description of the problem.
        reason: String,
    },
}
