#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use flagrush_world::{MapParseError, TileMap};
use serde::{Deserialize, Serialize};

const SNAPSHOT_DOMAIN: &str = "flagrush";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "flagrush:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of an arena layout suitable for single-line clipboard transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct MapLayoutSnapshot {
    /// Number of tile columns contained in the arena.
    pub columns: u32,
    /// Number of tile rows contained in the arena.
    pub rows: u32,
    /// Glyph rows composing the layout, one string per tile row.
    pub glyph_rows: Vec<String>,
}

impl MapLayoutSnapshot {
    /// Captures the provided tile map as a transferable snapshot.
    #[must_use]
    pub(crate) fn from_map(map: &TileMap) -> Self {
        Self {
            columns: map.columns(),
            rows: map.rows(),
            glyph_rows: map.layout_rows(),
        }
    }

    /// Rebuilds the tile map described by the snapshot.
    pub(crate) fn into_map(self) -> Result<TileMap, LayoutTransferError> {
        let map = TileMap::parse(&self.glyph_rows.join("\n"))
            .map_err(LayoutTransferError::InvalidLayout)?;
        if map.columns() != self.columns || map.rows() != self.rows {
            return Err(LayoutTransferError::DimensionMismatch {
                declared: (self.columns, self.rows),
                found: (map.columns(), map.rows()),
            });
        }
        Ok(map)
    }

    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableSnapshot {
            glyph_rows: self.glyph_rows.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("layout snapshot serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SNAPSHOT_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        Ok(Self {
            columns,
            rows,
            glyph_rows: decoded.glyph_rows,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableSnapshot {
    glyph_rows: Vec<String>,
}

/// Errors that can occur while decoding layout transfer strings.
#[derive(Debug)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded snapshot.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// The decoded glyph rows did not form a valid layout.
    InvalidLayout(MapParseError),
    /// The decoded layout did not match the declared grid dimensions.
    DimensionMismatch {
        /// Dimensions declared in the snapshot header.
        declared: (u32, u32),
        /// Dimensions derived from the decoded glyph rows.
        found: (u32, u32),
    },
}

impl fmt::Display for LayoutTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "clipboard payload was empty"),
            Self::MissingPrefix => write!(f, "layout string is missing the prefix"),
            Self::MissingVersion => write!(f, "layout string is missing the version"),
            Self::MissingDimensions => write!(f, "layout string is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "layout string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "layout prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "layout version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode layout payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse layout payload: {error}")
            }
            Self::InvalidLayout(error) => {
                write!(f, "decoded layout is not a valid arena: {error}")
            }
            Self::DimensionMismatch { declared, found } => write!(
                f,
                "layout declares {}x{} but decodes to {}x{}",
                declared.0, declared.1, found.0, found.1
            ),
        }
    }
}

impl Error for LayoutTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            Self::InvalidLayout(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(LayoutTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_encode_and_decode() {
        let map = TileMap::parse("S.WM\n.S.W\nMM..").expect("layout parses");
        let snapshot = MapLayoutSnapshot::from_map(&map);

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:4x3:")));

        let decoded = MapLayoutSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
        assert_eq!(decoded.into_map().expect("map rebuilds"), map);
    }

    #[test]
    fn decode_rejects_foreign_prefixes() {
        let map = TileMap::parse("..").expect("layout parses");
        let encoded = MapLayoutSnapshot::from_map(&map)
            .encode()
            .replace("flagrush", "maze");

        assert!(matches!(
            MapLayoutSnapshot::decode(&encoded),
            Err(LayoutTransferError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn into_map_rejects_mismatched_dimensions() {
        let snapshot = MapLayoutSnapshot {
            columns: 5,
            rows: 1,
            glyph_rows: vec!["...".to_owned()],
        };

        assert!(matches!(
            snapshot.into_map(),
            Err(LayoutTransferError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn into_map_rejects_unknown_glyphs() {
        let snapshot = MapLayoutSnapshot {
            columns: 3,
            rows: 1,
            glyph_rows: vec![".x.".to_owned()],
        };

        assert!(matches!(
            snapshot.into_map(),
            Err(LayoutTransferError::InvalidLayout(_))
        ));
    }
}
