//! Visual transforms derived from resolved adjacency.
//!
//! Everything here is a pure function of an entity's footprint and adjacency
//! state. Coordinates follow the level layout: x grows with columns, y grows
//! with rows and negative z points up out of the ground.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Vec3};
use tag_jam_core::{Side, TileCoord, TileRect, WallLinks};

/// Thickness of a wall segment in world units.
pub const WALL_THICKNESS: f32 = 0.2;
/// Height of a wall in world units.
pub const WALL_HEIGHT: f32 = 3.0;
/// Thickness of a door panel.
pub const DOOR_THICKNESS: f32 = WALL_THICKNESS / 4.0;
/// Width of a door panel.
pub const DOOR_WIDTH: f32 = 1.0;
/// Height of a door panel.
pub const DOOR_HEIGHT: f32 = WALL_HEIGHT;

/// Gap kept between a poster and its wall to avoid z-fighting.
const POSTER_WALL_GAP: f32 = 0.01;

/// Render-ready transform data for an entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Shape {
    /// Nothing computed, or nothing to draw.
    #[default]
    None,
    /// Wall segments.
    Wall(WallShape),
    /// Door panel.
    Door(DoorShape),
    /// Tagging poster.
    Poster(PosterShape),
}

/// Scaled cube drawn for part of a wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallSegment {
    /// Cube scale.
    pub scale: Vec3,
    /// Offset from the tile centre.
    pub offset: Vec3,
}

impl WallSegment {
    /// World transform of the segment for a wall centred on `center`,
    /// rotated about z by `rotation` radians.
    #[must_use]
    pub fn transform(&self, center: Vec3, rotation: f32) -> Mat4 {
        Mat4::from_translation(center + self.offset)
            * Mat4::from_rotation_z(rotation)
            * Mat4::from_scale(self.scale)
    }
}

/// Segments drawn for one wall tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallShape {
    /// Segment along x, present when connected left or right.
    pub horizontal: Option<WallSegment>,
    /// Segment along y, present when connected up or down. Drawn rotated by a
    /// quarter turn, so its length lives in `scale.x`.
    pub vertical: Option<WallSegment>,
    /// Lone post drawn for an isolated wall.
    pub post: Option<WallSegment>,
}

/// Door panel transforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoorShape {
    /// Places the panel relative to its hinge.
    pub model: Mat4,
    /// Places the hinge in the level.
    pub world: Mat4,
    /// Swing direction, `1.0` or `-1.0`. Double door halves swing apart.
    pub swing: f32,
}

impl DoorShape {
    /// Panel transform with the door swung `angle` radians around its hinge.
    #[must_use]
    pub fn posed(&self, angle: f32) -> Mat4 {
        self.world * Mat4::from_rotation_z(self.swing * angle) * self.model
    }
}

/// Tagging poster transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PosterShape {
    /// Places a unit plane on the wall.
    pub transform: Mat4,
}

/// Centre of a footprint in world units.
#[must_use]
pub fn footprint_center(region: TileRect) -> Vec3 {
    let origin = region.origin();
    let extent = region.extent();
    Vec3::new(
        origin.column() as f32 + (extent.width() as f32 - 1.0) / 2.0,
        origin.row() as f32 + (extent.height() as f32 - 1.0) / 2.0,
        0.0,
    )
}

pub(crate) fn wall_shape(links: WallLinks) -> Shape {
    let base_scale = Vec3::new(WALL_THICKNESS, WALL_THICKNESS, WALL_HEIGHT);
    let base_offset = Vec3::new(0.0, 0.0, -WALL_HEIGHT / 2.0);
    let half = 0.5 - WALL_THICKNESS / 2.0;

    let horizontal = (links.left || links.right).then(|| {
        let mut segment = WallSegment {
            scale: base_scale,
            offset: base_offset,
        };
        if links.left {
            segment.scale.x += half;
            segment.offset.x -= half;
        }
        if links.right {
            segment.scale.x += half;
            segment.offset.x += half;
            if !links.left {
                segment.offset.x -= WALL_THICKNESS;
            }
        } else if links.left {
            segment.offset.x += WALL_THICKNESS;
        }
        segment
    });

    let vertical = (links.up || links.down).then(|| {
        let mut segment = WallSegment {
            scale: base_scale,
            offset: base_offset,
        };
        if links.up {
            segment.scale.x += half;
            segment.offset.y -= half;
        }
        if links.down {
            segment.scale.x += half;
            segment.offset.y += half;
            if !links.up {
                segment.offset.y -= WALL_THICKNESS;
            }
        } else if links.up {
            segment.offset.y += WALL_THICKNESS;
        }
        segment
    });

    let post = (horizontal.is_none() && vertical.is_none()).then(|| WallSegment {
        scale: base_scale,
        offset: base_offset - Vec3::Z,
    });

    Shape::Wall(WallShape {
        horizontal,
        vertical,
        post,
    })
}

pub(crate) fn door_shape(cell: TileCoord, side: Side, double: bool) -> Shape {
    let mut model = Mat4::from_translation(Vec3::new(0.0, 0.0, -DOOR_HEIGHT / 2.0))
        * Mat4::from_scale(Vec3::new(DOOR_WIDTH, DOOR_THICKNESS, DOOR_HEIGHT));

    let rotation = match side {
        Side::Left => 0.0,
        Side::Right => PI,
        Side::Up => -FRAC_PI_2,
        Side::Down => FRAC_PI_2,
    };
    model = Mat4::from_rotation_z(rotation) * model;

    // Put the hinge edge on the z axis.
    let hinge = DOOR_WIDTH / 2.0 - DOOR_THICKNESS / 2.0;
    let hinge_offset = match side {
        Side::Left => Vec3::new(hinge, 0.0, 0.0),
        Side::Right => Vec3::new(-hinge, 0.0, 0.0),
        Side::Up => Vec3::new(0.0, hinge, 0.0),
        Side::Down => Vec3::new(0.0, -hinge, 0.0),
    };
    model = Mat4::from_translation(hinge_offset) * model;

    let along = DOOR_WIDTH / 2.0;
    let x = cell.column() as f32;
    let y = cell.row() as f32;
    let hinge_position = match side {
        Side::Left => Vec3::new(x - along, y, 0.0),
        Side::Right => Vec3::new(x + along, y, 0.0),
        Side::Up => Vec3::new(x, y - along, 0.0),
        Side::Down => Vec3::new(x, y + along, 0.0),
    };

    let swing = match (double, side) {
        (true, Side::Right | Side::Down) => -1.0,
        _ => 1.0,
    };

    Shape::Door(DoorShape {
        model,
        world: Mat4::from_translation(hinge_position),
        swing,
    })
}

pub(crate) fn poster_shape(region: TileRect, side: Option<Side>) -> Shape {
    let Some(side) = side else {
        return Shape::None;
    };

    let distance = 1.0 - WALL_THICKNESS / 2.0 - POSTER_WALL_GAP;
    let size = Mat4::from_scale(Vec3::new(
        region.extent().long_side() as f32,
        WALL_HEIGHT - 1.0,
        1.0,
    ));
    let flipped = Mat4::from_rotation_x(PI) * size;

    let (offset, facing) = match side {
        Side::Up => (
            Vec3::new(0.0, -distance, 0.0),
            Mat4::from_rotation_x(FRAC_PI_2),
        ),
        Side::Down => (
            Vec3::new(0.0, distance, 0.0),
            Mat4::from_rotation_x(-FRAC_PI_2),
        ),
        Side::Left => (
            Vec3::new(-distance, 0.0, 0.0),
            Mat4::from_rotation_z(-FRAC_PI_2) * Mat4::from_rotation_x(FRAC_PI_2),
        ),
        Side::Right => (
            Vec3::new(distance, 0.0, 0.0),
            Mat4::from_rotation_z(FRAC_PI_2) * Mat4::from_rotation_x(FRAC_PI_2),
        ),
    };
    let raised = offset + Vec3::new(0.0, 0.0, -WALL_HEIGHT / 2.0);

    Shape::Poster(PosterShape {
        transform: Mat4::from_translation(footprint_center(region) + raised) * facing * flipped,
    })
}
