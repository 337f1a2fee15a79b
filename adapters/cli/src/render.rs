use std::fmt::Write as _;

use grid_tactics_core::{CellCoord, HighlightKind, PlayerKind, Terrain, UnitSnapshot};
use grid_tactics_system_selection::Highlight;
use grid_tactics_world::{query, World};

/// Renders the board as a text grid with row/column indices.
///
/// Units draw over highlights, highlights draw over terrain. Human units use
/// the upper-case kind letter, computer units the lower-case one.
pub(crate) fn board(world: &World, highlights: &[Highlight]) -> String {
    let (width, height) = query::dimensions(world);
    let view = query::board_view(world);

    let mut out = String::new();
    out.push_str("   ");
    for x in 0..width {
        let digit = char::from_digit(x % 10, 10).unwrap_or('?');
        out.push(digit);
        out.push(' ');
    }
    out.push('\n');

    for y in 0..height {
        let _ = write!(out, "{y:>2} ");
        for x in 0..width {
            let cell = CellCoord::new(x, y);
            out.push(cell_glyph(world, &view, cell, highlights));
            out.push(' ');
        }
        out.push('\n');
    }

    out
}

/// One-line match status followed by the active player's unit roster.
pub(crate) fn status(world: &World) -> String {
    let active = query::active_player(world);
    let kind = query::player_kind(world, active);
    let mut out = format!(
        "turn {}/{}, player {} ({})\n",
        query::turn(world),
        query::max_turns(world),
        active.get() + 1,
        match kind {
            Some(PlayerKind::Human) => "human",
            Some(PlayerKind::Computer) => "computer",
            None => "unknown",
        }
    );

    for snapshot in query::unit_view(world).iter() {
        if snapshot.player != active {
            continue;
        }
        let _ = writeln!(out, "  {}", describe_unit(snapshot));
    }

    out
}

/// Compact single-line unit description used in rosters and event logs.
pub(crate) fn describe_unit(snapshot: &UnitSnapshot) -> String {
    let mut line = format!(
        "#{} {} at ({}, {}) hp {}",
        snapshot.id.get(),
        snapshot.kind.code(),
        snapshot.cell.x(),
        snapshot.cell.y(),
        snapshot.health.get(),
    );
    if snapshot.has_moved {
        line.push_str(" [moved]");
    }
    if snapshot.has_attacked {
        line.push_str(" [attacked]");
    }
    line
}

fn cell_glyph(
    world: &World,
    view: &grid_tactics_core::BoardView<'_>,
    cell: CellCoord,
    highlights: &[Highlight],
) -> char {
    if let Some(unit) = view.occupant(cell) {
        if let Some(snapshot) = query::unit(world, unit) {
            let letter = snapshot.kind.code();
            return match query::player_kind(world, snapshot.player) {
                Some(PlayerKind::Computer) => letter.to_ascii_lowercase(),
                _ => letter,
            };
        }
    }

    if let Some(kind) = highlight_at(highlights, cell) {
        return match kind {
            HighlightKind::Path => '*',
            HighlightKind::Attack => 'x',
            HighlightKind::Range => '+',
        };
    }

    match view.terrain(cell) {
        Some(Terrain::Grass) => '.',
        Some(Terrain::Water) => '~',
        Some(Terrain::Sand) => ':',
        Some(Terrain::Stone) => '#',
        None => '?',
    }
}

/// Path previews draw over ranges so the chosen route stays visible.
fn highlight_at(highlights: &[Highlight], cell: CellCoord) -> Option<HighlightKind> {
    let mut found = None;
    for highlight in highlights {
        if !highlight.cells.contains(&cell) {
            continue;
        }
        match highlight.kind {
            HighlightKind::Path => return Some(HighlightKind::Path),
            kind => {
                if found.is_none() {
                    found = Some(kind);
                }
            }
        }
    }
    found
}
