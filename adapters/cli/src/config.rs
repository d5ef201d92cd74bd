use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use tag_jam_core::{EntityKind, TileId, Tileset};

const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Settings for a single run of the driver.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Config {
    /// Level to load when none is given on the command line.
    pub(crate) level: Option<PathBuf>,
    /// Mapping from tile ids to entity kinds.
    pub(crate) tileset: Tileset,
}

impl Config {
    /// Loads the configuration file at `path`. Relative level paths resolve
    /// against the file's directory.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config_path = path.as_ref();
        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config at {}", config_path.display()))?;
        let base = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        parse_config(&contents, &base)
            .with_context(|| format!("invalid config at {}", config_path.display()))
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    version: u32,
    level: Option<PathBuf>,
    tileset: Option<BTreeMap<String, EntityKind>>,
}

fn parse_config(contents: &str, base_path: &Path) -> Result<Config> {
    let file: ConfigFile =
        toml::from_str(contents).context("failed to parse config toml contents")?;
    if file.version != SUPPORTED_CONFIG_VERSION {
        bail!(
            "unsupported config version {}; expected {}",
            file.version,
            SUPPORTED_CONFIG_VERSION
        );
    }

    let tileset = match file.tileset {
        Some(entries) => {
            let mut parsed = Vec::with_capacity(entries.len());
            for (tile, kind) in entries {
                let id = tile
                    .trim()
                    .parse::<u32>()
                    .with_context(|| format!("tileset key `{tile}` is not a tile id"))?;
                parsed.push((TileId::new(id), kind));
            }
            Tileset::from_entries(parsed).context("config contains an invalid tileset")?
        }
        None => Tileset::default(),
    };

    Ok(Config {
        level: file.level.map(|level| base_path.join(level)),
        tileset,
    })
}
