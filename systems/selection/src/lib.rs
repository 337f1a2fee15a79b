#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Selection state machine that turns player intent into world commands.
//!
//! Adapters feed it cell picks, it validates them against the current world
//! snapshot, and on success it emits [`Command`] values for the world to
//! apply. Every invalid pick is a silent `false`: the machine never errors,
//! it simply refuses to transition.

use grid_tactics_core::{CellCoord, Command, Event, HighlightKind, UnitId};
use grid_tactics_system_pathfinding::{MovementRange, Pathfinder};
use grid_tactics_system_targeting::{attack_range, AttackRange};
use grid_tactics_world::{query, World};

/// Action the player intends to perform with the unit being selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    /// Pick a destination cell inside the unit's movement range.
    Move,
    /// Pick an enemy unit inside the unit's attack range.
    Attack,
}

/// Group of cells an adapter should emphasize, tagged with the reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Highlight {
    /// Presentation category of the highlighted cells.
    pub kind: HighlightKind,
    /// Cells to emphasize, in the order the producing system yields them.
    pub cells: Vec<CellCoord>,
}

/// Current stage of the selection state machine.
#[derive(Debug)]
enum Phase {
    Idle,
    MoveSelected { unit: UnitId, range: MovementRange },
    AttackSelected { unit: UnitId, range: AttackRange },
    Resolving { pending: Pending },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    Move { unit: UnitId },
    Attack { attacker: UnitId, target: UnitId },
}

/// Selection state machine driven by one adapter at a time.
#[derive(Debug)]
pub struct Selection {
    phase: Phase,
    pathfinder: Pathfinder,
    highlights: Vec<Highlight>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection {
    /// Creates an idle selection machine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pathfinder: Pathfinder::new(),
            highlights: Vec::new(),
        }
    }

    /// Reports whether the machine is idle and ready for a new selection.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Reports whether the machine awaits confirmation from the world.
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        matches!(self.phase, Phase::Resolving { .. })
    }

    /// Identifier of the currently selected unit, if any.
    #[must_use]
    pub fn selected_unit(&self) -> Option<UnitId> {
        match &self.phase {
            Phase::Idle => None,
            Phase::MoveSelected { unit, .. } | Phase::AttackSelected { unit, .. } => Some(*unit),
            Phase::Resolving { pending } => match pending {
                Pending::Move { unit } => Some(*unit),
                Pending::Attack { attacker, .. } => Some(*attacker),
            },
        }
    }

    /// Selects a unit of the active player and computes the relevant range.
    ///
    /// Rejected when the match is over, the unit does not exist, belongs to
    /// another player, or has already performed the requested action this
    /// turn. A successful call replaces whatever was selected before.
    pub fn select_unit(&mut self, world: &World, unit: UnitId, mode: SelectionMode) -> bool {
        if query::outcome(world).is_some() {
            return false;
        }
        let Some(snapshot) = query::unit(world, unit) else {
            return false;
        };
        if snapshot.player != query::active_player(world) {
            return false;
        }

        match mode {
            SelectionMode::Move => {
                if snapshot.has_moved {
                    return false;
                }
                let range = self
                    .pathfinder
                    .movement_range(&query::board_view(world), &snapshot);
                self.highlights.clear();
                self.highlights.push(Highlight {
                    kind: HighlightKind::Range,
                    cells: range.cells().collect(),
                });
                self.phase = Phase::MoveSelected { unit, range };
            }
            SelectionMode::Attack => {
                if snapshot.has_attacked {
                    return false;
                }
                let range = attack_range(
                    query::dimensions(world),
                    snapshot.cell,
                    snapshot.attack_radius,
                );
                self.highlights.clear();
                self.highlights.push(Highlight {
                    kind: HighlightKind::Attack,
                    cells: range.cells().to_vec(),
                });
                self.phase = Phase::AttackSelected { unit, range };
            }
        }

        true
    }

    /// Previews the path the selected unit would take to the given cell.
    ///
    /// Only meaningful while a destination is awaited; replaces any previous
    /// path highlight without advancing the state machine.
    pub fn preview_path(&mut self, cell: CellCoord) -> bool {
        let Phase::MoveSelected { range, .. } = &self.phase else {
            return false;
        };
        let Some(path) = range.path_to(cell) else {
            return false;
        };

        self.highlights
            .retain(|highlight| highlight.kind != HighlightKind::Path);
        self.highlights.push(Highlight {
            kind: HighlightKind::Path,
            cells: path,
        });
        true
    }

    /// Confirms a destination cell and emits the resulting move command.
    ///
    /// The cell must be a stoppable member of the computed movement range;
    /// anything else leaves the machine awaiting a valid pick.
    pub fn select_destination(&mut self, cell: CellCoord, out: &mut Vec<Command>) -> bool {
        let Phase::MoveSelected { unit, range } = &self.phase else {
            return false;
        };
        let Some(path) = range.path_to(cell) else {
            return false;
        };

        let unit = *unit;
        out.push(Command::MoveUnit { unit, path });
        self.highlights.clear();
        self.phase = Phase::Resolving {
            pending: Pending::Move { unit },
        };
        true
    }

    /// Confirms a target cell and emits the resulting attack command.
    ///
    /// The cell must lie in the attack range and hold a living enemy unit.
    pub fn select_target(&mut self, world: &World, cell: CellCoord, out: &mut Vec<Command>) -> bool {
        let Phase::AttackSelected { unit, range } = &self.phase else {
            return false;
        };
        if !range.contains(cell) {
            return false;
        }
        let Some(target) = query::occupant(world, cell) else {
            return false;
        };
        let Some(attacker_snapshot) = query::unit(world, *unit) else {
            return false;
        };
        let Some(target_snapshot) = query::unit(world, target) else {
            return false;
        };
        if target_snapshot.player == attacker_snapshot.player {
            return false;
        }

        let attacker = *unit;
        out.push(Command::Attack { attacker, target });
        self.highlights.clear();
        self.phase = Phase::Resolving {
            pending: Pending::Attack { attacker, target },
        };
        true
    }

    /// Returns the machine to idle from any phase, clearing all highlights.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.highlights.clear();
    }

    /// Consumes world events, releasing the machine once the issued command
    /// has been confirmed or rejected.
    pub fn observe(&mut self, events: &[Event]) {
        let Phase::Resolving { pending } = &self.phase else {
            return;
        };
        let pending = *pending;

        for event in events {
            let resolved = match (pending, event) {
                (Pending::Move { unit }, Event::UnitMoved { unit: moved, .. }) => unit == *moved,
                (Pending::Move { unit }, Event::MoveRejected { unit: rejected, .. }) => {
                    unit == *rejected
                }
                (Pending::Attack { target, .. }, Event::UnitDamaged { unit: hit, .. }) => {
                    target == *hit
                }
                (Pending::Attack { target, .. }, Event::UnitDefeated { unit: felled, .. }) => {
                    target == *felled
                }
                (
                    Pending::Attack { attacker, .. },
                    Event::AttackRejected {
                        attacker: rejected, ..
                    },
                ) => attacker == *rejected,
                _ => false,
            };

            if resolved {
                self.reset();
                return;
            }
        }
    }

    /// Highlight set the presentation layer should render right now.
    #[must_use]
    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }
}
