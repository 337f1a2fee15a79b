#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Grid Tactics matches in a terminal.

mod level_transfer;
mod levels;
mod render;

use std::fs;
use std::io::{self, BufRead, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grid_tactics_core::{CellCoord, Command as EngineCommand, Event, MatchOutcome, PlayerKind};
use grid_tactics_system_ai::{play_turn, ComputerPlayer};
use grid_tactics_system_selection::{Selection, SelectionMode};
use grid_tactics_world::{apply, query, LevelSpec, World};

/// Command-line interface for the Grid Tactics engine.
#[derive(Debug, Parser)]
#[command(name = "grid-tactics", about = "Turn-based tactics in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Play a match interactively (the default).
    Play {
        /// Level file to load; JSON or a share code. Defaults to the bundled level.
        #[arg(long)]
        level: Option<PathBuf>,
        /// Override the level's turn limit.
        #[arg(long)]
        turns: Option<u32>,
        /// Let the computer policy play every seat to completion.
        #[arg(long)]
        auto: bool,
    },
    /// Print the starting board of a level and exit.
    Show {
        /// Level file to load; JSON or a share code. Defaults to the bundled level.
        #[arg(long)]
        level: Option<PathBuf>,
    },
    /// Print a shareable single-line code for a level.
    Share {
        /// Level file to load; JSON or a share code. Defaults to the bundled level.
        #[arg(long)]
        level: Option<PathBuf>,
    },
    /// Decode a share code and print the level it carries.
    Import {
        /// Share code produced by the `share` subcommand.
        code: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(CliCommand::Play {
        level: None,
        turns: None,
        auto: false,
    }) {
        CliCommand::Play { level, turns, auto } => {
            let mut spec = load_level(level.as_deref())?;
            if let Some(turns) = turns {
                spec.max_turns = turns;
            }
            play(&spec, auto)
        }
        CliCommand::Show { level } => {
            let spec = load_level(level.as_deref())?;
            let world = World::from_level(&spec)?;
            println!("{} ({}x{}, {} turns)", spec.display_name, spec.width, spec.height, spec.max_turns);
            print!("{}", render::board(&world, &[]));
            Ok(())
        }
        CliCommand::Share { level } => {
            let spec = load_level(level.as_deref())?;
            let _ = World::from_level(&spec)?;
            println!("{}", level_transfer::encode(&spec));
            Ok(())
        }
        CliCommand::Import { code } => {
            let spec = level_transfer::decode(&code)?;
            let world = World::from_level(&spec)?;
            println!("{} ({}x{}, {} turns)", spec.display_name, spec.width, spec.height, spec.max_turns);
            print!("{}", render::board(&world, &[]));
            Ok(())
        }
    }
}

/// Loads a level from disk, accepting JSON files and share-code files, or
/// falls back to the bundled level.
fn load_level(path: Option<&Path>) -> Result<LevelSpec> {
    let Some(path) = path else {
        return Ok(levels::gentle_plains());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read level file {}", path.display()))?;
    if text.trim_start().starts_with(level_transfer::CODE_HEADER) {
        return Ok(level_transfer::decode(&text)?);
    }

    serde_json::from_str(&text)
        .with_context(|| format!("could not parse level file {}", path.display()))
}

/// Runs a match until it concludes or the player quits.
fn play(spec: &LevelSpec, auto: bool) -> Result<()> {
    let mut world = World::from_level(spec)?;
    println!(
        "{} ({}x{}, {} turns), type 'help' for commands",
        spec.display_name, spec.width, spec.height, spec.max_turns
    );

    let mut selection = Selection::new();
    let mut computer = ComputerPlayer::new();
    let mut events = Vec::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if let Some(outcome) = query::outcome(&world) {
            print!("{}", render::board(&world, &[]));
            match outcome {
                MatchOutcome::Victory { winner } => {
                    println!("player {} wins the match", winner.get() + 1);
                }
                MatchOutcome::Draw => println!("the match ends in a draw"),
            }
            return Ok(());
        }

        let active = query::active_player(&world);
        let seat_is_computer =
            query::player_kind(&world, active) == Some(PlayerKind::Computer);
        if auto || seat_is_computer {
            log::debug!("resolving seat {} with the computer policy", active.get());
            events.clear();
            let _ = play_turn(&mut computer, &mut world, &mut events);
            print_events(&events);
            continue;
        }

        println!();
        print!("{}", render::status(&world));
        print!("{}", render::board(&world, selection.highlights()));
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line?;
        if !handle_line(line.trim(), &mut world, &mut selection, &mut events) {
            return Ok(());
        }
    }
}

/// Interprets one line of player input. Returns `false` when the player
/// asked to quit.
fn handle_line(
    line: &str,
    world: &mut World,
    selection: &mut Selection,
    events: &mut Vec<Event>,
) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => {}
        Some("quit") | Some("exit") => return false,
        Some("help") => print_help(),
        Some("cancel") => selection.reset(),
        Some("pass") => {
            selection.reset();
            dispatch(world, selection, EngineCommand::EndTurn, events);
        }
        Some("select") => {
            let Some(cell) = parse_cell(&mut parts) else {
                println!("usage: select <x> <y> [move|attack]");
                return true;
            };
            let mode = match parts.next() {
                Some("attack") => SelectionMode::Attack,
                _ => SelectionMode::Move,
            };
            let Some(unit) = query::occupant(world, cell) else {
                println!("no unit at ({}, {})", cell.x(), cell.y());
                return true;
            };
            if !selection.select_unit(world, unit, mode) {
                println!("that unit cannot be selected for this action");
            }
        }
        Some("go") => {
            let Some(cell) = parse_cell(&mut parts) else {
                println!("usage: go <x> <y>");
                return true;
            };
            let _ = selection.preview_path(cell);
            let mut commands = Vec::new();
            if selection.select_destination(cell, &mut commands) {
                for command in commands {
                    dispatch(world, selection, command, events);
                }
            } else {
                println!("that cell is not a reachable destination");
            }
        }
        Some("hit") => {
            let Some(cell) = parse_cell(&mut parts) else {
                println!("usage: hit <x> <y>");
                return true;
            };
            let mut commands = Vec::new();
            if selection.select_target(world, cell, &mut commands) {
                for command in commands {
                    dispatch(world, selection, command, events);
                }
            } else {
                println!("that cell holds no enemy in range");
            }
        }
        Some(other) => println!("unknown command '{other}', type 'help'"),
    }
    true
}

fn dispatch(
    world: &mut World,
    selection: &mut Selection,
    command: EngineCommand,
    events: &mut Vec<Event>,
) {
    events.clear();
    apply(world, command, events);
    selection.observe(events);
    print_events(events);
}

fn print_events(events: &[Event]) {
    for event in events {
        match event {
            Event::UnitMoved { unit, from, to } => println!(
                "unit #{} moved ({}, {}) to ({}, {})",
                unit.get(),
                from.x(),
                from.y(),
                to.x(),
                to.y()
            ),
            Event::MoveRejected { unit, reason } => {
                println!("move rejected for unit #{}: {reason:?}", unit.get());
            }
            Event::UnitDamaged { unit, remaining } => println!(
                "unit #{} took a hit, {} hp left",
                unit.get(),
                remaining.get()
            ),
            Event::UnitDefeated { unit, cell } => println!(
                "unit #{} was defeated at ({}, {})",
                unit.get(),
                cell.x(),
                cell.y()
            ),
            Event::AttackRejected { attacker, reason } => {
                println!("attack rejected for unit #{}: {reason:?}", attacker.get());
            }
            Event::PlayerEliminated { player } => {
                println!("player {} has no units left", player.get() + 1);
            }
            Event::TurnEnded { player } => {
                println!("player {} ended their turn", player.get() + 1);
            }
            Event::TurnStarted { player, turn } => {
                println!("turn {turn}: player {} to act", player.get() + 1);
            }
            Event::MatchEnded { outcome } => match outcome {
                MatchOutcome::Victory { winner } => {
                    println!("player {} wins the match", winner.get() + 1);
                }
                MatchOutcome::Draw => println!("the match ends in a draw"),
            },
        }
    }
}

fn print_help() {
    println!("commands:");
    println!("  select <x> <y> [move|attack]  pick one of your units");
    println!("  go <x> <y>                    move the selected unit");
    println!("  hit <x> <y>                   attack the unit on that cell");
    println!("  cancel                        drop the current selection");
    println!("  pass                          end your turn");
    println!("  quit                          leave the match");
}

fn parse_cell<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Option<CellCoord> {
    let x = parts.next()?.parse::<u32>().ok()?;
    let y = parts.next()?.parse::<u32>().ok()?;
    Some(CellCoord::new(x, y))
}
