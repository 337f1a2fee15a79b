#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Greedy computer opponent that plays one command at a time.
//!
//! The policy is deliberately simple and fully deterministic: units act in
//! ascending identifier order, each first closing the Manhattan gap to the
//! nearest enemy and then striking the weakest enemy left in range of its
//! new cell. Once every unit has spent both of its actions the player ends
//! the turn.

use grid_tactics_core::{CellCoord, Command, Event, UnitSnapshot, UnitView};
use grid_tactics_system_pathfinding::Pathfinder;
use grid_tactics_system_targeting::{attack_range, Targeting};
use grid_tactics_world::{query, World};

/// Command source for a computer-controlled player.
#[derive(Debug, Default)]
pub struct ComputerPlayer {
    pathfinder: Pathfinder,
    targeting: Targeting,
}

impl ComputerPlayer {
    /// Creates a computer player with empty scratch state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits the next command for the active player.
    ///
    /// Pushes exactly one command per call and returns `true` while the turn
    /// continues. Returns `false` once it pushes [`Command::EndTurn`], or
    /// without pushing anything when the match is already decided.
    pub fn next_command(&mut self, world: &World, out: &mut Vec<Command>) -> bool {
        if query::outcome(world).is_some() {
            return false;
        }

        let player = query::active_player(world);
        let units = query::unit_view(world);

        for snapshot in units.iter() {
            if snapshot.player != player {
                continue;
            }

            if !snapshot.has_moved {
                if let Some(command) = self.advance_command(world, snapshot, &units) {
                    out.push(command);
                    return true;
                }
            }

            if !snapshot.has_attacked {
                let range =
                    attack_range(query::dimensions(world), snapshot.cell, snapshot.attack_radius);
                if let Some(target) = self.targeting.best_target(&range, &units, player) {
                    out.push(Command::Attack {
                        attacker: snapshot.id,
                        target,
                    });
                    return true;
                }
            }
        }

        out.push(Command::EndTurn);
        false
    }

    /// Picks the reachable cell closest to the nearest enemy and returns the
    /// move towards it, or `None` when no enemy remains.
    fn advance_command(
        &mut self,
        world: &World,
        snapshot: &UnitSnapshot,
        units: &UnitView,
    ) -> Option<Command> {
        let enemies: Vec<CellCoord> = units
            .iter()
            .filter(|other| other.player != snapshot.player && !other.health.is_zero())
            .map(|other| other.cell)
            .collect();
        if enemies.is_empty() {
            return None;
        }

        let range = self
            .pathfinder
            .movement_range(&query::board_view(world), snapshot);

        let mut best: Option<Approach> = None;
        for cell in range.cells() {
            let gap = enemies
                .iter()
                .map(|enemy| cell.manhattan_distance(*enemy))
                .min()
                .unwrap_or(u32::MAX);
            let candidate = Approach { cell, gap };

            match &mut best {
                Some(existing) => {
                    if candidate.precedes(existing) {
                        *existing = candidate;
                    }
                }
                None => best = Some(candidate),
            }
        }

        let destination = best.map(|approach| approach.cell)?;
        let path = range.path_to(destination)?;
        Some(Command::MoveUnit {
            unit: snapshot.id,
            path,
        })
    }
}

/// Runs the computer player until it ends the active player's turn, applying
/// each command to the world and collecting the resulting events.
pub fn play_turn(
    computer: &mut ComputerPlayer,
    world: &mut World,
    out_events: &mut Vec<Event>,
) -> Vec<Command> {
    let mut played = Vec::new();
    let mut pending = Vec::new();

    loop {
        let more = computer.next_command(world, &mut pending);
        let Some(command) = pending.pop() else {
            break;
        };
        played.push(command.clone());
        grid_tactics_world::apply(world, command, out_events);
        if !more {
            break;
        }
    }

    played
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Approach {
    cell: CellCoord,
    gap: u32,
}

impl Approach {
    fn precedes(&self, other: &Self) -> bool {
        if self.gap != other.gap {
            return self.gap < other.gap;
        }

        if self.cell.x() != other.cell.x() {
            return self.cell.x() < other.cell.x();
        }

        self.cell.y() < other.cell.y()
    }
}

#[cfg(test)]
mod tests {
    use super::{play_turn, ComputerPlayer};
    use grid_tactics_core::{CellCoord, Command, PlayerKind, UnitId};
    use grid_tactics_world::{apply, query, LevelSpec, World};

    fn level(width: u32, height: u32, cells: &[&str]) -> LevelSpec {
        LevelSpec {
            name: "fixture".to_owned(),
            display_name: "Fixture".to_owned(),
            width,
            height,
            max_turns: 10,
            players: vec![PlayerKind::Human, PlayerKind::Computer],
            cells: cells.iter().map(|code| (*code).to_owned()).collect(),
        }
    }

    fn hand_turn_to_computer(world: &mut World) {
        let mut events = Vec::new();
        apply(world, Command::EndTurn, &mut events);
        assert_eq!(
            query::player_kind(world, query::active_player(world)),
            Some(PlayerKind::Computer)
        );
    }

    #[test]
    fn unit_closes_in_and_then_attacks() {
        //   K . S
        let mut world = World::from_level(&level(3, 1, &["GK1", "G", "GS2"])).expect("valid level");
        hand_turn_to_computer(&mut world);

        let mut computer = ComputerPlayer::new();
        let mut events = Vec::new();
        let played = play_turn(&mut computer, &mut world, &mut events);

        assert_eq!(
            played,
            vec![
                Command::MoveUnit {
                    unit: UnitId::new(1),
                    path: vec![CellCoord::new(2, 0), CellCoord::new(1, 0)],
                },
                Command::Attack {
                    attacker: UnitId::new(1),
                    target: UnitId::new(0),
                },
                Command::EndTurn,
            ]
        );
    }

    #[test]
    fn distant_unit_moves_towards_the_nearest_enemy() {
        //   K . . . S
        let mut world =
            World::from_level(&level(5, 1, &["GK1", "G", "G", "G", "GS2"])).expect("valid level");
        hand_turn_to_computer(&mut world);

        let mut computer = ComputerPlayer::new();
        let mut commands = Vec::new();
        assert!(computer.next_command(&world, &mut commands));

        // Budget two closes the gap from four to two.
        assert_eq!(
            commands,
            vec![Command::MoveUnit {
                unit: UnitId::new(1),
                path: vec![
                    CellCoord::new(4, 0),
                    CellCoord::new(3, 0),
                    CellCoord::new(2, 0),
                ],
            }]
        );
    }

    #[test]
    fn full_turn_ends_with_end_turn_and_yields_to_the_human() {
        let mut world =
            World::from_level(&level(5, 1, &["GK1", "G", "G", "G", "GS2"])).expect("valid level");
        hand_turn_to_computer(&mut world);

        let mut computer = ComputerPlayer::new();
        let mut events = Vec::new();
        let played = play_turn(&mut computer, &mut world, &mut events);

        assert_eq!(played.last(), Some(&Command::EndTurn));
        assert_eq!(
            query::player_kind(&world, query::active_player(&world)),
            Some(PlayerKind::Human)
        );
    }

    #[test]
    fn cornered_spider_stays_put_and_attacks() {
        //   S K
        let mut world = World::from_level(&level(2, 1, &["GS2", "GK1"])).expect("valid level");
        hand_turn_to_computer(&mut world);

        let mut computer = ComputerPlayer::new();
        let mut events = Vec::new();
        let played = play_turn(&mut computer, &mut world, &mut events);

        // A stand-still move first, then the attack, then the turn ends.
        assert_eq!(played.len(), 3);
        assert!(matches!(
            &played[0],
            Command::MoveUnit { path, .. } if path.len() == 1
        ));
        assert!(matches!(played[1], Command::Attack { .. }));
        assert_eq!(played[2], Command::EndTurn);
    }
}
