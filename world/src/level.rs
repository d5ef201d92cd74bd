//! Level construction from a CSV tile layer.

use tag_jam_core::{Command, Event, LevelError, TileCoord, TileId};

use crate::{apply, World, WorldError};

/// Rectangular layer of raw tile identifiers in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayer {
    columns: u32,
    rows: u32,
    tiles: Vec<TileId>,
}

impl TileLayer {
    /// Parses a CSV tile layer.
    ///
    /// Rows are separated by newlines and ids by commas. Carriage returns,
    /// blank lines and empty tokens are ignored. Every row must hold the same
    /// number of ids.
    pub fn parse_csv(text: &str) -> Result<Self, LevelError> {
        let mut rows = Vec::new();
        for (index, line) in text.split('\n').enumerate() {
            let line_number = index + 1;
            let line = line.replace('\r', "");
            if line.trim().is_empty() {
                continue;
            }

            let row = line
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| {
                    token
                        .parse::<u32>()
                        .map(TileId::new)
                        .map_err(|_| LevelError::MalformedLayer {
                            line: line_number,
                            reason: format!("`{token}` is not a tile id"),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if row.is_empty() {
                return Err(LevelError::MalformedLayer {
                    line: line_number,
                    reason: "row holds no tile ids".to_owned(),
                });
            }
            rows.push((line_number, row));
        }

        Self::from_numbered_rows(rows)
    }

    /// Builds a layer from already split rows.
    pub fn from_rows(rows: Vec<Vec<TileId>>) -> Result<Self, LevelError> {
        Self::from_numbered_rows(rows.into_iter().enumerate().map(|(index, row)| (index + 1, row)).collect())
    }

    fn from_numbered_rows(rows: Vec<(usize, Vec<TileId>)>) -> Result<Self, LevelError> {
        let expected = rows.first().map_or(0, |(_, row)| row.len());
        let mut tiles = Vec::with_capacity(expected * rows.len());
        for (line, row) in &rows {
            if row.len() != expected {
                return Err(LevelError::MalformedLayer {
                    line: *line,
                    reason: format!("expected {expected} tile ids, found {}", row.len()),
                });
            }
            tiles.extend_from_slice(row);
        }

        let too_large = |what: &str| LevelError::MalformedLayer {
            line: 1,
            reason: format!("layer has too many {what}"),
        };
        Ok(Self {
            columns: u32::try_from(expected).map_err(|_| too_large("columns"))?,
            rows: u32::try_from(rows.len()).map_err(|_| too_large("rows"))?,
            tiles,
        })
    }

    /// Number of columns in the layer.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the layer.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile id at the cell, if inside the layer.
    #[must_use]
    pub fn tile_at(&self, cell: TileCoord) -> Option<TileId> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let index = u64::from(cell.row()) * u64::from(self.columns) + u64::from(cell.column());
        self.tiles.get(usize::try_from(index).ok()?).copied()
    }

    /// Non-empty tiles with their cells in row-major order.
    pub fn placements(&self) -> impl Iterator<Item = (TileCoord, TileId)> + '_ {
        let columns = self.columns.max(1);
        (0_u32..)
            .zip(self.tiles.iter().copied())
            .filter(|(_, tile)| !tile.is_empty())
            .map(move |(index, tile)| (TileCoord::new(index % columns, index / columns), tile))
    }
}

/// Configures the world for the layer, places every tile and resolves
/// adjacency.
pub fn populate(
    world: &mut World,
    layer: &TileLayer,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError> {
    apply(
        world,
        Command::ConfigureTileGrid {
            columns: layer.columns(),
            rows: layer.rows(),
        },
        out_events,
    )?;
    for (cell, tile) in layer.placements() {
        apply(world, Command::PlaceTile { tile, cell }, out_events)?;
    }
    apply(world, Command::ResolveAdjacency, out_events)
}
