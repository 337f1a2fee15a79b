#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Tactics.
//!
//! The world owns the board, the unit roster, and the turn sequencer.
//! Adapters and systems mutate it exclusively through [`apply`], which
//! validates each [`Command`] and broadcasts [`Event`] values describing
//! what actually happened. Illegal player input is answered with rejection
//! events; occupancy-invariant violations indicate programming defects and
//! panic instead.

mod board;
mod level;

pub use level::{LevelError, LevelSpec};

use board::Board;
use grid_tactics_core::{
    AttackError, CellCoord, Command, Event, Health, MatchOutcome, MoveError, PlayerId, PlayerKind,
    UnitId, UnitKind,
};
use level::ParsedCell;

/// Represents the authoritative Grid Tactics world state.
#[derive(Clone, Debug)]
pub struct World {
    board: Board,
    units: Vec<UnitState>,
    players: Vec<PlayerState>,
    active_player: usize,
    turn: u32,
    max_turns: u32,
    outcome: Option<MatchOutcome>,
}

impl World {
    /// Constructs a world from validated level data.
    ///
    /// All configuration errors are reported before any gameplay state is
    /// created; a returned world always satisfies the occupancy invariants.
    pub fn from_level(spec: &LevelSpec) -> Result<Self, LevelError> {
        let cells = spec.parse()?;

        let players = spec
            .players
            .iter()
            .enumerate()
            .map(|(index, kind)| PlayerState {
                id: PlayerId::new(index as u32),
                kind: *kind,
            })
            .collect();

        let mut world = Self {
            board: Board::new(
                spec.width,
                spec.height,
                cells.iter().map(|cell| cell.terrain).collect(),
            ),
            units: Vec::new(),
            players,
            active_player: 0,
            turn: 1,
            max_turns: spec.max_turns,
            outcome: None,
        };
        world.spawn_units(spec.width, &cells);

        Ok(world)
    }

    fn spawn_units(&mut self, width: u32, cells: &[ParsedCell]) {
        for (index, parsed) in cells.iter().enumerate() {
            let Some(unit) = parsed.unit else {
                continue;
            };

            let x = (index as u32) % width;
            let y = (index as u32) / width;
            let cell = CellCoord::new(x, y);
            let id = UnitId::new(self.units.len() as u32);
            let player = self.players[unit.player].id;

            let placed = self.board.place(id, player, cell);
            assert!(placed, "validated level data placed unit on a blocked cell");

            self.units.push(UnitState::new(id, player, unit.kind, cell));
        }
    }

    fn unit_index(&self, unit: UnitId) -> Option<usize> {
        self.units.iter().position(|state| state.id == unit)
    }

    fn living_units_of(&self, player: PlayerId) -> usize {
        self.units
            .iter()
            .filter(|unit| unit.player == player)
            .count()
    }

    fn execute_move(&mut self, unit: UnitId, path: &[CellCoord]) -> Result<Event, MoveError> {
        if self.outcome.is_some() {
            return Err(MoveError::MatchOver);
        }
        let index = self.unit_index(unit).ok_or(MoveError::MissingUnit)?;
        let mover = &self.units[index];
        let player = self.players[self.active_player].id;
        if mover.player != player {
            return Err(MoveError::NotActivePlayer);
        }
        if mover.has_moved {
            return Err(MoveError::AlreadyMoved);
        }

        let from = mover.cell;
        if path.first() != Some(&from) {
            return Err(MoveError::InvalidOrigin);
        }
        if (path.len() - 1) as u32 > mover.move_budget {
            return Err(MoveError::BudgetExceeded);
        }

        let view = self.board.view();
        for pair in path.windows(2) {
            if pair[0].manhattan_distance(pair[1]) != 1 {
                return Err(MoveError::DiscontiguousPath);
            }
            if !view.is_traversable_by(pair[1], player) {
                return Err(MoveError::BlockedCell);
            }
        }

        let to = *path.last().unwrap_or(&from);
        if view.occupant(to).is_some_and(|occupant| occupant != unit) {
            return Err(MoveError::DestinationOccupied);
        }

        self.board.remove(unit, from);
        let placed = self.board.place(unit, player, to);
        assert!(placed, "validated destination refused placement");
        let mover = &mut self.units[index];
        mover.cell = to;
        mover.has_moved = true;

        Ok(Event::UnitMoved { unit, from, to })
    }

    fn execute_attack(
        &mut self,
        attacker: UnitId,
        target: UnitId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), AttackError> {
        if self.outcome.is_some() {
            return Err(AttackError::MatchOver);
        }
        let attacker_index = self
            .unit_index(attacker)
            .ok_or(AttackError::MissingAttacker)?;
        let target_index = self.unit_index(target).ok_or(AttackError::MissingTarget)?;

        let player = self.players[self.active_player].id;
        let (attacker_state, target_state) = (&self.units[attacker_index], &self.units[target_index]);
        if attacker_state.player != player {
            return Err(AttackError::NotActivePlayer);
        }
        if attacker_state.has_attacked {
            return Err(AttackError::AlreadyAttacked);
        }
        if target_state.player == player {
            return Err(AttackError::FriendlyTarget);
        }
        if attacker_state
            .cell
            .manhattan_distance(target_state.cell)
            > attacker_state.attack_radius
        {
            return Err(AttackError::OutOfRange);
        }

        let damage = attacker_state.kind.attack_power();
        let remaining = target_state.health.saturating_damage(damage);
        let defeated_player = target_state.player;
        let defeated_cell = target_state.cell;

        self.units[attacker_index].has_attacked = true;

        if remaining.is_zero() {
            self.board.remove(target, defeated_cell);
            let _ = self.units.remove(target_index);
            out_events.push(Event::UnitDefeated {
                unit: target,
                cell: defeated_cell,
            });
            self.check_elimination(defeated_player, out_events);
        } else {
            self.units[target_index].health = remaining;
            out_events.push(Event::UnitDamaged {
                unit: target,
                remaining,
            });
        }

        Ok(())
    }

    fn check_elimination(&mut self, player: PlayerId, out_events: &mut Vec<Event>) {
        if self.living_units_of(player) > 0 {
            return;
        }
        out_events.push(Event::PlayerEliminated { player });

        let mut survivors = self
            .players
            .iter()
            .filter(|state| self.living_units_of(state.id) > 0);
        let first = survivors.next().map(|state| state.id);
        let second = survivors.next();

        if let (Some(winner), None) = (first, second) {
            let outcome = MatchOutcome::Victory { winner };
            self.outcome = Some(outcome);
            out_events.push(Event::MatchEnded { outcome });
        }
    }

    fn execute_end_turn(&mut self, out_events: &mut Vec<Event>) {
        if let Some(outcome) = self.outcome {
            out_events.push(Event::MatchEnded { outcome });
            return;
        }

        let current = self.active_player;
        out_events.push(Event::TurnEnded {
            player: self.players[current].id,
        });

        let Some(next) = self.next_seated_player(current) else {
            // No opponent with units remains; elimination should already
            // have ended the match.
            let outcome = self.tie_break_outcome();
            self.outcome = Some(outcome);
            out_events.push(Event::MatchEnded { outcome });
            return;
        };

        let wrapped = next <= current;
        if wrapped {
            if self.turn >= self.max_turns {
                let outcome = self.tie_break_outcome();
                self.outcome = Some(outcome);
                out_events.push(Event::MatchEnded { outcome });
                return;
            }
            self.turn += 1;
        }

        self.active_player = next;
        let player = self.players[next].id;
        for unit in self.units.iter_mut().filter(|unit| unit.player == player) {
            unit.has_moved = false;
            unit.has_attacked = false;
        }
        out_events.push(Event::TurnStarted {
            player,
            turn: self.turn,
        });
    }

    /// Next seat after `current` (cyclically) that still fields units.
    fn next_seated_player(&self, current: usize) -> Option<usize> {
        let count = self.players.len();
        (1..=count)
            .map(|offset| (current + offset) % count)
            .find(|&seat| self.living_units_of(self.players[seat].id) > 0)
    }

    /// Turn-limit tie-break: most living units, then greatest total health,
    /// then a draw.
    fn tie_break_outcome(&self) -> MatchOutcome {
        let mut best: Option<(usize, u64, PlayerId)> = None;
        let mut tied = false;

        for player in &self.players {
            let units = self.living_units_of(player.id);
            if units == 0 {
                continue;
            }
            let health: u64 = self
                .units
                .iter()
                .filter(|unit| unit.player == player.id)
                .map(|unit| u64::from(unit.health.get()))
                .sum();

            match best {
                None => {
                    best = Some((units, health, player.id));
                    tied = false;
                }
                Some((best_units, best_health, _)) => {
                    if (units, health) > (best_units, best_health) {
                        best = Some((units, health, player.id));
                        tied = false;
                    } else if (units, health) == (best_units, best_health) {
                        tied = true;
                    }
                }
            }
        }

        match best {
            Some((_, _, winner)) if !tied => MatchOutcome::Victory { winner },
            _ => MatchOutcome::Draw,
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::MoveUnit { unit, path } => match world.execute_move(unit, &path) {
            Ok(event) => out_events.push(event),
            Err(reason) => {
                log::debug!("move of unit {} rejected: {reason:?}", unit.get());
                out_events.push(Event::MoveRejected { unit, reason });
            }
        },
        Command::Attack { attacker, target } => {
            if let Err(reason) = world.execute_attack(attacker, target, out_events) {
                log::debug!("attack by unit {} rejected: {reason:?}", attacker.get());
                out_events.push(Event::AttackRejected { attacker, reason });
            }
        }
        Command::EndTurn => world.execute_end_turn(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use grid_tactics_core::{
        BoardView, CellCoord, MatchOutcome, PlayerId, PlayerKind, UnitId, UnitSnapshot, UnitView,
    };

    /// Exposes a read-only view over the board's terrain, masks, and
    /// occupancy.
    #[must_use]
    pub fn board_view(world: &World) -> BoardView<'_> {
        world.board.view()
    }

    /// Board dimensions as `(width, height)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        world.board.dimensions()
    }

    /// Captures a read-only view of every living unit.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(super::UnitState::snapshot).collect())
    }

    /// Snapshot of a single living unit, if it exists.
    #[must_use]
    pub fn unit(world: &World, unit: UnitId) -> Option<UnitSnapshot> {
        world
            .units
            .iter()
            .find(|state| state.id == unit)
            .map(super::UnitState::snapshot)
    }

    /// Unit occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(world: &World, cell: CellCoord) -> Option<UnitId> {
        world.board.occupant(cell)
    }

    /// Identifier of the player whose turn it is.
    #[must_use]
    pub fn active_player(world: &World) -> PlayerId {
        world.players[world.active_player].id
    }

    /// Controller kind of the provided player, if the player exists.
    #[must_use]
    pub fn player_kind(world: &World, player: PlayerId) -> Option<PlayerKind> {
        world
            .players
            .iter()
            .find(|state| state.id == player)
            .map(|state| state.kind)
    }

    /// Identifiers of every participating player in seat order.
    #[must_use]
    pub fn players(world: &World) -> Vec<PlayerId> {
        world.players.iter().map(|state| state.id).collect()
    }

    /// One-based turn counter.
    #[must_use]
    pub fn turn(world: &World) -> u32 {
        world.turn
    }

    /// Configured turn limit.
    #[must_use]
    pub fn max_turns(world: &World) -> u32 {
        world.max_turns
    }

    /// Final outcome once the match has concluded.
    #[must_use]
    pub fn outcome(world: &World) -> Option<MatchOutcome> {
        world.outcome
    }
}

#[derive(Clone, Debug)]
struct PlayerState {
    id: PlayerId,
    kind: PlayerKind,
}

#[derive(Clone, Debug)]
struct UnitState {
    id: UnitId,
    player: PlayerId,
    kind: UnitKind,
    cell: CellCoord,
    move_budget: u32,
    attack_radius: u32,
    health: Health,
    has_moved: bool,
    has_attacked: bool,
}

impl UnitState {
    fn new(id: UnitId, player: PlayerId, kind: UnitKind, cell: CellCoord) -> Self {
        Self {
            id,
            player,
            kind,
            cell,
            move_budget: kind.move_budget(),
            attack_radius: kind.attack_radius(),
            health: kind.base_health(),
            has_moved: false,
            has_attacked: false,
        }
    }

    fn snapshot(&self) -> grid_tactics_core::UnitSnapshot {
        grid_tactics_core::UnitSnapshot {
            id: self.id,
            player: self.player,
            kind: self.kind,
            cell: self.cell,
            move_budget: self.move_budget,
            attack_radius: self.attack_radius,
            health: self.health,
            has_moved: self.has_moved,
            has_attacked: self.has_attacked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(width: u32, height: u32, max_turns: u32, cells: &[&str]) -> LevelSpec {
        LevelSpec {
            name: "test".to_owned(),
            display_name: "Test".to_owned(),
            width,
            height,
            max_turns,
            players: vec![PlayerKind::Human, PlayerKind::Computer],
            cells: cells.iter().map(|code| (*code).to_owned()).collect(),
        }
    }

    #[test]
    fn from_level_places_units_with_agreeing_references() {
        let world = World::from_level(&spec(
            3,
            1,
            10,
            &["GK1", "G", "GS2"],
        ))
        .expect("valid level");

        let knight = query::unit(&world, UnitId::new(0)).expect("knight exists");
        assert_eq!(knight.cell, CellCoord::new(0, 0));
        assert_eq!(query::occupant(&world, knight.cell), Some(knight.id));

        let spider = query::unit(&world, UnitId::new(1)).expect("spider exists");
        assert_eq!(spider.cell, CellCoord::new(2, 0));
        assert_eq!(spider.player, PlayerId::new(1));
    }

    #[test]
    fn move_relocates_unit_and_updates_masks() {
        let mut world =
            World::from_level(&spec(3, 1, 10, &["GK1", "G", "GS2"])).expect("valid level");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(0),
                path: vec![CellCoord::new(0, 0), CellCoord::new(1, 0)],
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::UnitMoved {
                unit: UnitId::new(0),
                from: CellCoord::new(0, 0),
                to: CellCoord::new(1, 0),
            }]
        );
        assert_eq!(query::occupant(&world, CellCoord::new(0, 0)), None);
        assert_eq!(
            query::occupant(&world, CellCoord::new(1, 0)),
            Some(UnitId::new(0))
        );
    }

    #[test]
    fn second_move_in_a_turn_is_rejected() {
        let mut world =
            World::from_level(&spec(4, 1, 10, &["GK1", "G", "G", "GS2"])).expect("valid level");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(0),
                path: vec![CellCoord::new(0, 0), CellCoord::new(1, 0)],
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(0),
                path: vec![CellCoord::new(1, 0), CellCoord::new(2, 0)],
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::MoveRejected {
                unit: UnitId::new(0),
                reason: MoveError::AlreadyMoved,
            }]
        );
    }

    #[test]
    fn move_rejections_cover_ownership_and_path_shape() {
        let mut world =
            World::from_level(&spec(3, 2, 10, &["GK1", "G", "GS2", "G", "W", "G"]))
                .expect("valid level");
        let mut events = Vec::new();

        // Enemy unit cannot be moved by the active player.
        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(1),
                path: vec![CellCoord::new(2, 0), CellCoord::new(2, 1)],
            },
            &mut events,
        );
        // Path must start at the unit's cell.
        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(0),
                path: vec![CellCoord::new(1, 0), CellCoord::new(2, 0)],
            },
            &mut events,
        );
        // Path steps must be orthogonal neighbors.
        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(0),
                path: vec![CellCoord::new(0, 0), CellCoord::new(2, 0)],
            },
            &mut events,
        );
        // Water is never traversable.
        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(0),
                path: vec![CellCoord::new(0, 0), CellCoord::new(0, 1), CellCoord::new(1, 1)],
            },
            &mut events,
        );

        let reasons: Vec<_> = events
            .iter()
            .map(|event| match event {
                Event::MoveRejected { reason, .. } => *reason,
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(
            reasons,
            vec![
                MoveError::NotActivePlayer,
                MoveError::InvalidOrigin,
                MoveError::DiscontiguousPath,
                MoveError::BlockedCell,
            ]
        );
    }

    #[test]
    fn attack_damages_then_defeats_and_ends_match() {
        // Knight (power 2) adjacent to spider (health 2): one hit defeats it.
        let mut world =
            World::from_level(&spec(2, 1, 10, &["GK1", "GS2"])).expect("valid level");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::Attack {
                attacker: UnitId::new(0),
                target: UnitId::new(1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::UnitDefeated {
                    unit: UnitId::new(1),
                    cell: CellCoord::new(1, 0),
                },
                Event::PlayerEliminated {
                    player: PlayerId::new(1),
                },
                Event::MatchEnded {
                    outcome: MatchOutcome::Victory {
                        winner: PlayerId::new(0),
                    },
                },
            ]
        );
        assert_eq!(query::occupant(&world, CellCoord::new(1, 0)), None);
        assert!(query::unit(&world, UnitId::new(1)).is_none());
        assert_eq!(
            query::outcome(&world),
            Some(MatchOutcome::Victory {
                winner: PlayerId::new(0),
            })
        );
    }

    #[test]
    fn spider_attack_leaves_knight_damaged() {
        let mut world =
            World::from_level(&spec(2, 1, 10, &["GS2", "GK1"])).expect("valid level");
        let mut events = Vec::new();

        // Hand the turn to player 2 first.
        apply(&mut world, Command::EndTurn, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::Attack {
                attacker: UnitId::new(0),
                target: UnitId::new(1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::UnitDamaged {
                unit: UnitId::new(1),
                remaining: Health::new(2),
            }]
        );
    }

    #[test]
    fn attack_rejections_cover_range_and_ownership() {
        let mut world =
            World::from_level(&spec(4, 1, 10, &["GK1", "GK1", "G", "GS2"])).expect("valid level");
        let mut events = Vec::new();

        // Out of radius (knight range 1, spider three cells away).
        apply(
            &mut world,
            Command::Attack {
                attacker: UnitId::new(0),
                target: UnitId::new(2),
            },
            &mut events,
        );
        // Friendly fire.
        apply(
            &mut world,
            Command::Attack {
                attacker: UnitId::new(0),
                target: UnitId::new(1),
            },
            &mut events,
        );
        // Unknown target.
        apply(
            &mut world,
            Command::Attack {
                attacker: UnitId::new(0),
                target: UnitId::new(9),
            },
            &mut events,
        );

        let reasons: Vec<_> = events
            .iter()
            .map(|event| match event {
                Event::AttackRejected { reason, .. } => *reason,
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(
            reasons,
            vec![
                AttackError::OutOfRange,
                AttackError::FriendlyTarget,
                AttackError::MissingTarget,
            ]
        );
    }

    #[test]
    fn end_turn_advances_players_and_wraps_turn_counter() {
        let mut world =
            World::from_level(&spec(3, 1, 10, &["GK1", "G", "GS2"])).expect("valid level");
        let mut events = Vec::new();

        assert_eq!(query::active_player(&world), PlayerId::new(0));
        assert_eq!(query::turn(&world), 1);

        apply(&mut world, Command::EndTurn, &mut events);
        assert_eq!(query::active_player(&world), PlayerId::new(1));
        assert_eq!(query::turn(&world), 1);

        apply(&mut world, Command::EndTurn, &mut events);
        assert_eq!(query::active_player(&world), PlayerId::new(0));
        assert_eq!(query::turn(&world), 2);
    }

    #[test]
    fn turn_start_resets_action_flags() {
        let mut world =
            World::from_level(&spec(3, 1, 10, &["GK1", "G", "GS2"])).expect("valid level");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(0),
                path: vec![CellCoord::new(0, 0), CellCoord::new(1, 0)],
            },
            &mut events,
        );
        assert!(query::unit(&world, UnitId::new(0)).expect("knight").has_moved);

        apply(&mut world, Command::EndTurn, &mut events);
        apply(&mut world, Command::EndTurn, &mut events);

        assert!(!query::unit(&world, UnitId::new(0)).expect("knight").has_moved);
    }

    #[test]
    fn turn_limit_triggers_tie_break() {
        // Knight outlasts the spider on units=1 vs 1, health 3 vs 2.
        let mut world =
            World::from_level(&spec(3, 1, 2, &["GK1", "G", "GS2"])).expect("valid level");
        let mut events = Vec::new();

        for _ in 0..3 {
            apply(&mut world, Command::EndTurn, &mut events);
        }
        assert_eq!(query::outcome(&world), None);
        events.clear();

        apply(&mut world, Command::EndTurn, &mut events);
        assert_eq!(
            events,
            vec![
                Event::TurnEnded {
                    player: PlayerId::new(1),
                },
                Event::MatchEnded {
                    outcome: MatchOutcome::Victory {
                        winner: PlayerId::new(0),
                    },
                },
            ]
        );
    }

    #[test]
    fn tie_break_declares_draw_for_identical_forces() {
        let mut world =
            World::from_level(&spec(3, 1, 1, &["GS1", "G", "GS2"])).expect("valid level");
        let mut events = Vec::new();

        apply(&mut world, Command::EndTurn, &mut events);
        events.clear();
        apply(&mut world, Command::EndTurn, &mut events);

        assert_eq!(
            events,
            vec![
                Event::TurnEnded {
                    player: PlayerId::new(1),
                },
                Event::MatchEnded {
                    outcome: MatchOutcome::Draw,
                },
            ]
        );
    }

    #[test]
    fn commands_after_match_end_are_rejected() {
        let mut world =
            World::from_level(&spec(2, 1, 10, &["GK1", "GS2"])).expect("valid level");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::Attack {
                attacker: UnitId::new(0),
                target: UnitId::new(1),
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(0),
                path: vec![CellCoord::new(0, 0), CellCoord::new(1, 0)],
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::MoveRejected {
                unit: UnitId::new(0),
                reason: MoveError::MatchOver,
            }]
        );
    }
}
