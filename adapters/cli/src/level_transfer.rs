#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use grid_tactics_core::PlayerKind;
use grid_tactics_world::LevelSpec;
use serde::{Deserialize, Serialize};

const CODE_DOMAIN: &str = "tactics";
const CODE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded level payload.
pub(crate) const CODE_HEADER: &str = "tactics:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a level into a single-line string suitable for clipboard transfer.
#[must_use]
pub(crate) fn encode(spec: &LevelSpec) -> String {
    let payload = SerializableLevel {
        name: spec.name.clone(),
        display_name: spec.display_name.clone(),
        max_turns: spec.max_turns,
        players: spec.players.clone(),
        cells: spec.cells.clone(),
    };
    let json = serde_json::to_vec(&payload).expect("level payload serialization never fails");
    let encoded = STANDARD_NO_PAD.encode(json);
    format!("{CODE_HEADER}:{}x{}:{encoded}", spec.width, spec.height)
}

/// Decodes a level from the provided share-code string.
pub(crate) fn decode(value: &str) -> Result<LevelSpec, LevelTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LevelTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(LevelTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(LevelTransferError::MissingVersion)?;
    let dimensions = parts.next().ok_or(LevelTransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(LevelTransferError::MissingPayload)?;

    if domain != CODE_DOMAIN {
        return Err(LevelTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != CODE_VERSION {
        return Err(LevelTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (width, height) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(LevelTransferError::InvalidEncoding)?;
    let decoded: SerializableLevel =
        serde_json::from_slice(&bytes).map_err(LevelTransferError::InvalidPayload)?;

    Ok(LevelSpec {
        name: decoded.name,
        display_name: decoded.display_name,
        width,
        height,
        max_turns: decoded.max_turns,
        players: decoded.players,
        cells: decoded.cells,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableLevel {
    name: String,
    display_name: String,
    max_turns: u32,
    players: Vec<PlayerKind>,
    cells: Vec<String>,
}

/// Errors that can occur while decoding level share codes.
#[derive(Debug)]
pub(crate) enum LevelTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded level.
    MissingPrefix,
    /// The encoded level did not contain a version segment.
    MissingVersion,
    /// The encoded level did not include grid dimensions.
    MissingDimensions,
    /// The encoded level did not include the payload segment.
    MissingPayload,
    /// The encoded level used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded level used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded level.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for LevelTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "share code was empty"),
            Self::MissingPrefix => write!(f, "share code is missing the prefix"),
            Self::MissingVersion => write!(f, "share code is missing the version"),
            Self::MissingDimensions => write!(f, "share code is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "share code is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "share prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "share version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode level payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse level payload: {error}")
            }
        }
    }
}

impl Error for LevelTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LevelTransferError> {
    let (width, height) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LevelTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if width == 0 || height == 0 {
        return Err(LevelTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((width, height))
}
