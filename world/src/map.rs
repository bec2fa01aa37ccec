//! Tile map storage and layout parsing.

use flagrush_core::{GridCoord, TileKind};
use thiserror::Error;

/// Dense tile classification grid backing the arena floor.
///
/// The map owns the only mutable copy of the tile classifications; the
/// navigation subsystem reads them through [`TileMap::classify`] and never
/// caches them beyond a single search run, so a destroyed box is observed on
/// the next query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileMap {
    columns: u32,
    rows: u32,
    tiles: Vec<TileKind>,
}

impl TileMap {
    /// Parses a character layout into a tile map.
    ///
    /// One line per row: `.` open ground, `W` wooden box, `M` metal box,
    /// `S` stone block. Blank lines are skipped, every remaining row must
    /// span the same number of columns.
    pub fn parse(layout: &str) -> Result<Self, MapParseError> {
        let mut tiles = Vec::new();
        let mut columns = None;
        let mut rows = 0u32;

        for line in layout.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let width = line.chars().count();
            match columns {
                None => columns = Some(width),
                Some(expected) if expected != width => {
                    return Err(MapParseError::RaggedRow {
                        row: rows as usize,
                        expected,
                        found: width,
                    });
                }
                Some(_) => {}
            }

            for (column, glyph) in line.chars().enumerate() {
                tiles.push(match glyph {
                    '.' => TileKind::Open,
                    'W' => TileKind::WoodBox,
                    'M' => TileKind::MetalBox,
                    'S' => TileKind::StoneBox,
                    other => {
                        return Err(MapParseError::UnknownGlyph {
                            glyph: other,
                            column,
                            row: rows as usize,
                        });
                    }
                });
            }
            rows += 1;
        }

        let columns = columns.ok_or(MapParseError::EmptyLayout)?;
        Ok(Self {
            columns: columns as u32,
            rows,
            tiles,
        })
    }

    /// Number of tile columns spanned by the map.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows spanned by the map.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Classification of the tile at the provided coordinate.
    ///
    /// Coordinates outside the stored range, including negative ones,
    /// classify as [`TileKind::StoneBox`] rather than failing, so callers
    /// never need to bounds-check before querying.
    #[must_use]
    pub fn classify(&self, coord: GridCoord) -> TileKind {
        match self.index(coord) {
            Some(index) => self.tiles[index],
            None => TileKind::StoneBox,
        }
    }

    /// Overwrites the classification of an in-bounds tile.
    ///
    /// Returns `false` and leaves the map untouched when the coordinate lies
    /// outside the stored range.
    pub fn place(&mut self, coord: GridCoord, kind: TileKind) -> bool {
        match self.index(coord) {
            Some(index) => {
                self.tiles[index] = kind;
                true
            }
            None => false,
        }
    }

    /// Renders the map back into the glyph rows accepted by [`TileMap::parse`].
    #[must_use]
    pub fn layout_rows(&self) -> Vec<String> {
        let width = self.columns as usize;
        self.tiles
            .chunks(width.max(1))
            .map(|row| {
                row.iter()
                    .map(|kind| match kind {
                        TileKind::Open => '.',
                        TileKind::WoodBox => 'W',
                        TileKind::MetalBox => 'M',
                        TileKind::StoneBox => 'S',
                    })
                    .collect()
            })
            .collect()
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.column() < 0 || coord.row() < 0 {
            return None;
        }

        let column = coord.column() as u32;
        let row = coord.row() as u32;
        if column >= self.columns || row >= self.rows {
            return None;
        }

        Some(row as usize * self.columns as usize + column as usize)
    }
}

/// Errors produced while parsing a character layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MapParseError {
    /// The layout contained no rows.
    #[error("layout contains no rows")]
    EmptyLayout,
    /// A row spanned a different number of columns than the first row.
    #[error("row {row} spans {found} columns, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Column count established by the first row.
        expected: usize,
        /// Column count found on the offending row.
        found: usize,
    },
    /// The layout contained a character with no tile mapping.
    #[error("unknown tile glyph '{glyph}' at column {column}, row {row}")]
    UnknownGlyph {
        /// The unrecognised character.
        glyph: char,
        /// Zero-based column of the character.
        column: usize,
        /// Zero-based row of the character.
        row: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_all_tile_kinds() {
        let map = TileMap::parse(".WMS\n....").expect("layout parses");
        assert_eq!(map.columns(), 4);
        assert_eq!(map.rows(), 2);
        assert_eq!(map.classify(GridCoord::new(0, 0)), TileKind::Open);
        assert_eq!(map.classify(GridCoord::new(1, 0)), TileKind::WoodBox);
        assert_eq!(map.classify(GridCoord::new(2, 0)), TileKind::MetalBox);
        assert_eq!(map.classify(GridCoord::new(3, 0)), TileKind::StoneBox);
    }

    #[test]
    fn out_of_range_coordinates_classify_as_stone() {
        let map = TileMap::parse("..\n..").expect("layout parses");
        assert_eq!(map.classify(GridCoord::new(-1, 0)), TileKind::StoneBox);
        assert_eq!(map.classify(GridCoord::new(0, -1)), TileKind::StoneBox);
        assert_eq!(map.classify(GridCoord::new(2, 0)), TileKind::StoneBox);
        assert_eq!(map.classify(GridCoord::new(0, 2)), TileKind::StoneBox);
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        assert_eq!(
            TileMap::parse("...\n.."),
            Err(MapParseError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2,
            })
        );
    }

    #[test]
    fn parse_rejects_unknown_glyphs() {
        assert_eq!(
            TileMap::parse(".x."),
            Err(MapParseError::UnknownGlyph {
                glyph: 'x',
                column: 1,
                row: 0,
            })
        );
    }

    #[test]
    fn parse_rejects_empty_layouts() {
        assert_eq!(TileMap::parse("\n  \n"), Err(MapParseError::EmptyLayout));
    }

    #[test]
    fn place_rejects_out_of_range_tiles() {
        let mut map = TileMap::parse("..").expect("layout parses");
        assert!(map.place(GridCoord::new(1, 0), TileKind::WoodBox));
        assert_eq!(map.classify(GridCoord::new(1, 0)), TileKind::WoodBox);
        assert!(!map.place(GridCoord::new(5, 0), TileKind::WoodBox));
    }

    #[test]
    fn layout_rows_round_trip_through_parse() {
        let source = "S.WM\n.S.W\nMM..";
        let map = TileMap::parse(source).expect("layout parses");
        let rendered = map.layout_rows().join("\n");
        assert_eq!(TileMap::parse(&rendered).expect("round trip"), map);
    }
}
