//! Level data validation and world construction.
//!
//! A level lists per-cell codes in row-major order: a terrain character
//! (`G`, `W`, `S`, `T`), optionally followed by a unit kind character and the
//! one-based digit of the owning player, e.g. `GK1` or `GS2`. Validation
//! happens in full before any gameplay state is constructed.

use grid_tactics_core::{PlayerKind, Terrain, UnitKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declarative description of a playable level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Machine-friendly identifier of the level.
    pub name: String,
    /// Name shown to players.
    pub display_name: String,
    /// Number of board columns.
    pub width: u32,
    /// Number of board rows.
    pub height: u32,
    /// Turn limit after which the tie-break rule decides the match.
    pub max_turns: u32,
    /// Participating players in seat order; seat 1 acts first.
    pub players: Vec<PlayerKind>,
    /// Row-major cell codes covering the whole grid.
    pub cells: Vec<String>,
}

/// Errors detected while validating level data.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The grid dimensions do not describe any cells.
    #[error("level dimensions must be positive (got {width}x{height})")]
    EmptyGrid {
        /// Configured column count.
        width: u32,
        /// Configured row count.
        height: u32,
    },
    /// The cell list does not cover the configured grid.
    #[error("level grid holds {expected} cells but data lists {actual}")]
    DimensionMismatch {
        /// Cell count implied by the dimensions.
        expected: usize,
        /// Cell count present in the data.
        actual: usize,
    },
    /// A cell code was empty.
    #[error("cell {index} has an empty code")]
    EmptyCellCode {
        /// Row-major index of the offending cell.
        index: usize,
    },
    /// A cell code used an unknown terrain character.
    #[error("cell {index} uses unknown terrain code '{code}'")]
    UnknownTerrain {
        /// Row-major index of the offending cell.
        index: usize,
        /// Unrecognised character.
        code: char,
    },
    /// A cell code used an unknown unit kind character.
    #[error("cell {index} uses unknown unit code '{code}'")]
    UnknownUnit {
        /// Row-major index of the offending cell.
        index: usize,
        /// Unrecognised character.
        code: char,
    },
    /// A unit code was not followed by its owning player digit.
    #[error("cell {index} unit code is missing its owning player digit")]
    MissingPlayerDigit {
        /// Row-major index of the offending cell.
        index: usize,
    },
    /// A cell code carried trailing characters after the player digit.
    #[error("cell {index} code has unexpected trailing characters")]
    TrailingCharacters {
        /// Row-major index of the offending cell.
        index: usize,
    },
    /// A unit named a player seat that does not exist.
    #[error("cell {index} names player {player} but only {count} players are configured")]
    PlayerOutOfRange {
        /// Row-major index of the offending cell.
        index: usize,
        /// One-based player seat from the cell code.
        player: u32,
        /// Number of configured players.
        count: usize,
    },
    /// A unit was placed on terrain that never admits units.
    #[error("cell {index} places a unit on unwalkable terrain")]
    UnitOnUnwalkableCell {
        /// Row-major index of the offending cell.
        index: usize,
    },
    /// Fewer than two players were configured.
    #[error("a level requires at least two players (got {count})")]
    TooFewPlayers {
        /// Number of configured players.
        count: usize,
    },
    /// The turn limit was zero.
    #[error("max_turns must be positive")]
    ZeroMaxTurns,
}

/// One cell of parsed level data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ParsedCell {
    pub(crate) terrain: Terrain,
    pub(crate) unit: Option<ParsedUnit>,
}

/// Starting unit recovered from a cell code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ParsedUnit {
    pub(crate) kind: UnitKind,
    /// Zero-based index into the level's player list.
    pub(crate) player: usize,
}

impl LevelSpec {
    /// Validates the level data, yielding parsed cells in row-major order.
    pub(crate) fn parse(&self) -> Result<Vec<ParsedCell>, LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.players.len() < 2 {
            return Err(LevelError::TooFewPlayers {
                count: self.players.len(),
            });
        }
        if self.max_turns == 0 {
            return Err(LevelError::ZeroMaxTurns);
        }

        let expected = usize::try_from(u64::from(self.width) * u64::from(self.height))
            .map_err(|_| LevelError::EmptyGrid {
                width: self.width,
                height: self.height,
            })?;
        if self.cells.len() != expected {
            return Err(LevelError::DimensionMismatch {
                expected,
                actual: self.cells.len(),
            });
        }

        self.cells
            .iter()
            .enumerate()
            .map(|(index, code)| parse_cell(index, code, self.players.len()))
            .collect()
    }
}

fn parse_cell(index: usize, code: &str, player_count: usize) -> Result<ParsedCell, LevelError> {
    let mut chars = code.chars();

    let terrain_code = chars.next().ok_or(LevelError::EmptyCellCode { index })?;
    let terrain = Terrain::from_code(terrain_code)
        .ok_or(LevelError::UnknownTerrain {
            index,
            code: terrain_code,
        })?;

    let Some(unit_code) = chars.next() else {
        return Ok(ParsedCell {
            terrain,
            unit: None,
        });
    };
    let kind = UnitKind::from_code(unit_code).ok_or(LevelError::UnknownUnit {
        index,
        code: unit_code,
    })?;

    let digit = chars
        .next()
        .and_then(|c| c.to_digit(10))
        .ok_or(LevelError::MissingPlayerDigit { index })?;
    if chars.next().is_some() {
        return Err(LevelError::TrailingCharacters { index });
    }
    if digit == 0 || digit as usize > player_count {
        return Err(LevelError::PlayerOutOfRange {
            index,
            player: digit,
            count: player_count,
        });
    }
    if !terrain.is_walkable() {
        return Err(LevelError::UnitOnUnwalkableCell { index });
    }

    Ok(ParsedCell {
        terrain,
        unit: Some(ParsedUnit {
            kind,
            player: digit as usize - 1,
        }),
    })
}
