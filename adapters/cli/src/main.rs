#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that builds a Tag Jam level and reports its
//! resolved structure.

mod assets;
mod config;

use std::{collections::BTreeMap, fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tag_jam_core::{Adjacency, Command, EntityId, EntityKind};
use tag_jam_resources::{LeakKind, ResourcePool};
use tag_jam_world::{apply, populate, query, shapes, Entity, TileLayer, World};

use crate::{assets::AssetLibrary, config::Config};

#[derive(Debug, Parser)]
#[command(name = "tag-jam")]
#[command(about = "Builds a Tag Jam level and reports its resolved structure")]
struct CliArgs {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV tile layer to load. Overrides the configured level.
    #[arg(long)]
    level: Option<PathBuf>,
}

/// Entry point for the Tag Jam command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let level_path = args
        .level
        .or(config.level)
        .context("no level given; pass --level or set `level` in the config")?;
    let contents = fs::read_to_string(&level_path)
        .with_context(|| format!("failed to read level at {}", level_path.display()))?;
    let layer = TileLayer::parse_csv(&contents)
        .with_context(|| format!("failed to parse level at {}", level_path.display()))?;

    let pool = ResourcePool::new();
    let mut assets = AssetLibrary::new(&pool);
    let mut world = World::with_tileset(config.tileset);

    let outcome = run(&mut world, &layer, &mut assets);
    let released = assets.release_all();
    report_shutdown(&pool);

    outcome
        .and(released)
        .with_context(|| format!("failed to run level {}", level_path.display()))
}

fn run(world: &mut World, layer: &TileLayer, assets: &mut AssetLibrary<'_>) -> Result<()> {
    let mut events = Vec::new();
    let built = populate(world, layer, &mut events);
    assets.handle(&events)?;
    built?;

    println!("{}", query::welcome_banner(world));
    print_summary(world, assets);

    events.clear();
    let entities: Vec<EntityId> = query::entities(world).map(Entity::id).collect();
    for entity in entities {
        apply(world, Command::RemoveEntity { entity }, &mut events)?;
    }
    assets.handle(&events)
}

fn print_summary(world: &World, assets: &AssetLibrary<'_>) {
    let grid = query::grid(world);
    let mut counts: BTreeMap<EntityKind, usize> = BTreeMap::new();
    for entity in query::entities(world) {
        *counts.entry(entity.kind()).or_default() += 1;
    }

    println!("Level {}x{}", grid.columns(), grid.rows());
    for (kind, count) in &counts {
        println!("  {:<16} {count}", kind.name());
    }

    for entity in query::entities(world) {
        let anchor = entity.anchor();
        match entity.adjacency() {
            Adjacency::TaggingZone { side } => {
                let center = shapes::footprint_center(entity.region());
                let facing = side.map_or_else(|| "no wall".to_owned(), |side| format!("{side:?}"));
                println!(
                    "  zone #{} at ({}, {}) spanning {}x{} centred on {center}, wall {facing}",
                    entity.id().get(),
                    anchor.column(),
                    anchor.row(),
                    entity.extent().width(),
                    entity.extent().height(),
                );
            }
            Adjacency::Door { side, double } => {
                let bounds = assets
                    .mesh(entity.id())
                    .map(|mesh| mesh.bounds().to_string())
                    .unwrap_or_default();
                println!(
                    "  door #{} at ({}, {}) hinged {side:?}{} panel {bounds}",
                    entity.id().get(),
                    anchor.column(),
                    anchor.row(),
                    if double { " (double)" } else { "" },
                );
            }
            Adjacency::Wall(_) | Adjacency::Unresolved => {}
        }
    }
    println!("  entities holding pooled resources: {}", assets.held());
}

fn report_shutdown(pool: &ResourcePool) {
    let report = pool.shutdown();
    for key in &report.disposed {
        log::info!("disposed {key} at shutdown");
    }
    for leak in &report.leaks {
        match leak.kind {
            LeakKind::StillReferenced => log::error!(
                "{} ({}) still had {} references at shutdown",
                leak.key,
                leak.type_name,
                leak.reference_count
            ),
            LeakKind::ReclaimedWhileReferenced => log::error!(
                "{} ({}) was reclaimed while holding {} references",
                leak.key,
                leak.type_name,
                leak.reference_count
            ),
        }
    }
}
