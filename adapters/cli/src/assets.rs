use std::{collections::BTreeMap, sync::Arc};

use anyhow::{Context, Result};
use glam::Vec3;
use tag_jam_core::{EntityId, EntityKind, Event};
use tag_jam_resources::{Poolable, ResourcePool};
use tag_jam_world::shapes::{DOOR_HEIGHT, DOOR_THICKNESS, DOOR_WIDTH, WALL_HEIGHT, WALL_THICKNESS};

/// Placeholder for a GPU mesh shared by every entity of a kind.
#[derive(Debug)]
pub(crate) struct Mesh {
    key: String,
    bounds: Vec3,
}

impl Mesh {
    fn for_kind(key: String, kind: EntityKind) -> Self {
        let bounds = match kind {
            EntityKind::Wall => Vec3::new(WALL_THICKNESS, WALL_THICKNESS, WALL_HEIGHT),
            EntityKind::Door => Vec3::new(DOOR_WIDTH, DOOR_THICKNESS, DOOR_HEIGHT),
            EntityKind::TaggingLocation => Vec3::new(1.0, WALL_HEIGHT - 1.0, 0.0),
            EntityKind::Beer => Vec3::new(0.2, 0.2, 0.5),
            EntityKind::Player => Vec3::new(0.5, 0.5, 1.8),
        };
        log::debug!("built mesh {key} with bounds {bounds}");
        Self { key, bounds }
    }

    /// Size of the mesh's bounding box.
    pub(crate) fn bounds(&self) -> Vec3 {
        self.bounds
    }
}

impl Poolable for Mesh {
    fn release_native(&self) {
        log::debug!("released mesh {}", self.key);
    }
}

/// Placeholder for a texture shared by every entity of a kind.
#[derive(Debug)]
pub(crate) struct Texture {
    key: String,
}

impl Poolable for Texture {
    fn release_native(&self) {
        log::debug!("released texture {}", self.key);
    }
}

fn mesh_key(kind: EntityKind) -> String {
    format!("{}/Mesh", kind.name())
}

fn texture_key(kind: EntityKind) -> String {
    let surface = match kind {
        EntityKind::Wall => "Bricks",
        EntityKind::Door => "Wood",
        EntityKind::TaggingLocation => "Poster",
        EntityKind::Beer => "Label",
        EntityKind::Player => "Skin",
    };
    format!("{}/{surface}", kind.name())
}

#[derive(Debug)]
struct HeldAssets {
    kind: EntityKind,
    mesh: Arc<Mesh>,
    texture: Arc<Texture>,
}

/// Acquires pooled resources for spawned entities and releases them when the
/// entities leave the world.
#[derive(Debug)]
pub(crate) struct AssetLibrary<'pool> {
    pool: &'pool ResourcePool,
    held: BTreeMap<EntityId, HeldAssets>,
}

impl<'pool> AssetLibrary<'pool> {
    pub(crate) fn new(pool: &'pool ResourcePool) -> Self {
        Self {
            pool,
            held: BTreeMap::new(),
        }
    }

    /// Reacts to world events in order.
    pub(crate) fn handle(&mut self, events: &[Event]) -> Result<()> {
        for event in events {
            match *event {
                Event::EntitySpawned { entity, kind, .. } => self.acquire(entity, kind)?,
                Event::EntityRemoved { entity, .. } => self.release(entity)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Releases every resource still held.
    pub(crate) fn release_all(&mut self) -> Result<()> {
        let entities: Vec<EntityId> = self.held.keys().copied().collect();
        for entity in entities {
            self.release(entity)?;
        }
        Ok(())
    }

    /// Number of entities currently holding resources.
    pub(crate) fn held(&self) -> usize {
        self.held.len()
    }

    /// Mesh held for the entity, if any.
    pub(crate) fn mesh(&self, entity: EntityId) -> Option<&Mesh> {
        self.held.get(&entity).map(|assets| assets.mesh.as_ref())
    }

    fn acquire(&mut self, entity: EntityId, kind: EntityKind) -> Result<()> {
        let mesh_key = mesh_key(kind);
        let mesh = self
            .pool
            .acquire(&mesh_key, || Mesh::for_kind(mesh_key.clone(), kind))
            .with_context(|| format!("failed to acquire {mesh_key}"))?;

        let texture_key = texture_key(kind);
        let texture = self
            .pool
            .acquire(&texture_key, || Texture {
                key: texture_key.clone(),
            })
            .with_context(|| format!("failed to acquire {texture_key}"))?;

        let _ = self.held.insert(
            entity,
            HeldAssets {
                kind,
                mesh,
                texture,
            },
        );
        Ok(())
    }

    fn release(&mut self, entity: EntityId) -> Result<()> {
        let Some(assets) = self.held.remove(&entity) else {
            log::warn!("entity {} removed without held resources", entity.get());
            return Ok(());
        };
        let mesh_key = mesh_key(assets.kind);
        self.pool
            .release(&mesh_key, &assets.mesh)
            .with_context(|| format!("failed to release {mesh_key}"))?;
        let texture_key = texture_key(assets.kind);
        self.pool
            .release(&texture_key, &assets.texture)
            .with_context(|| format!("failed to release {texture_key}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tag_jam_core::TileCoord;

    fn spawned(entity: u32, kind: EntityKind) -> Event {
        Event::EntitySpawned {
            entity: EntityId::new(entity),
            kind,
            cell: TileCoord::new(entity, 0),
        }
    }

    #[test]
    fn entities_of_a_kind_share_one_mesh() {
        let pool = ResourcePool::new();
        let mut assets = AssetLibrary::new(&pool);
        assets
            .handle(&[
                spawned(0, EntityKind::Wall),
                spawned(1, EntityKind::Wall),
                spawned(2, EntityKind::Door),
            ])
            .expect("acquire");

        assert_eq!(pool.len(), 4, "one mesh and one texture per kind");
        assert_eq!(
            pool.stats("Wall/Mesh").map(|stats| stats.reference_count),
            Some(2)
        );
        assert_eq!(
            assets.mesh(EntityId::new(2)).map(Mesh::bounds),
            Some(Vec3::new(DOOR_WIDTH, DOOR_THICKNESS, DOOR_HEIGHT))
        );
    }

    #[test]
    fn removal_releases_and_shutdown_is_clean() {
        let pool = ResourcePool::new();
        let mut assets = AssetLibrary::new(&pool);
        assets
            .handle(&[
                spawned(0, EntityKind::TaggingLocation),
                spawned(1, EntityKind::TaggingLocation),
                Event::EntityRemoved {
                    entity: EntityId::new(1),
                    kind: EntityKind::TaggingLocation,
                },
            ])
            .expect("handle events");

        assert_eq!(assets.held(), 1);
        assert_eq!(
            pool.stats("TaggingLocation/Poster").map(|stats| stats.reference_count),
            Some(1)
        );

        assets.release_all().expect("release");
        let report = pool.shutdown();
        assert!(report.leaks.is_empty(), "{report:?}");
        assert!(report.disposed.is_empty(), "everything was released already");
    }
}
