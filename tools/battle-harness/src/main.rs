//! battle-harness: headless bombsite battle runner.
//!
//! Usage:
//!   battle-harness run --seed 7 --members 2 --max-turns 40
//!   battle-harness run --config tuning.json --weapons weapons.json
//!   battle-harness map --seed 7 --width 600 --height 300

use std::path::PathBuf;
use std::process;

use serde_json::json;
use tracing::{info, warn};

use bombsite_core::commands::{Command, InputEvent};
use bombsite_core::config::BattleConfig;
use bombsite_core::enums::{Facing, TurnPhase};
use bombsite_core::events::BattleEvent;
use bombsite_core::types::CharacterId;
use bombsite_core::weapons::WeaponCatalogue;
use bombsite_procgen::{generate, MapParams};
use bombsite_sim::{BattleEngine, BattleSetup};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "map" => cmd_map(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn print_usage() {
    eprintln!(
        "battle-harness: headless bombsite battle runner\n\
         \n\
         Commands:\n\
         \n\
         run   Generate a map and play a scripted battle, printing one JSON line per turn\n\
         \n\
           --seed <N>         Map and battle seed (default: 0)\n\
           --width <N>        Map width in cells (default: 1000)\n\
           --height <N>       Map height in cells (default: 500)\n\
           --teams <N>        Number of teams (default: 2)\n\
           --members <N>      Characters per team (default: 3)\n\
           --max-turns <N>    Stop after this many turns (default: 60)\n\
           --config <path>    BattleConfig JSON (optional)\n\
           --weapons <path>   Weapon catalogue JSON (optional)\n\
         \n\
         map   Generate a map and print it as ASCII art\n\
         \n\
           --seed, --width, --height, --teams, --members as above\n\
         \n\
         Logging: RUST_LOG sets the filter, LOG_FORMAT=json switches to JSON logs.\n"
    );
}

fn parse_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    for i in 0..args.len() {
        if args[i] == flag && i + 1 < args.len() {
            match args[i + 1].parse::<T>() {
                Ok(v) => return Some(v),
                Err(_) => {
                    eprintln!("Error: invalid value for {flag}: {}", args[i + 1]);
                    process::exit(1);
                }
            }
        }
    }
    None
}

fn parse_path(args: &[String], flag: &str) -> Option<PathBuf> {
    parse_value::<String>(args, flag).map(PathBuf::from)
}

fn map_params(args: &[String]) -> MapParams {
    let defaults = MapParams::default();
    let teams: usize = parse_value(args, "--teams").unwrap_or(defaults.team_names.len());
    let team_names = (0..teams)
        .map(|i| {
            defaults
                .team_names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Team {}", i + 1))
        })
        .collect();
    MapParams {
        seed: parse_value(args, "--seed").unwrap_or(0),
        width: parse_value(args, "--width").unwrap_or(defaults.width),
        height: parse_value(args, "--height").unwrap_or(defaults.height),
        members_per_team: parse_value(args, "--members").unwrap_or(defaults.members_per_team),
        team_names,
        ..defaults
    }
}

fn read_file(path: &PathBuf) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            process::exit(1);
        }
    }
}

// --- Run command ---

fn cmd_run(args: &[String]) {
    let params = map_params(args);
    let max_turns: u32 = parse_value(args, "--max-turns").unwrap_or(60);

    let mut config = match parse_path(args, "--config") {
        Some(path) => match BattleConfig::from_json(&read_file(&path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error in {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => BattleConfig::default(),
    };
    config.seed = params.seed;

    let catalogue = match parse_path(args, "--weapons") {
        Some(path) => match WeaponCatalogue::from_json(&read_file(&path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error in {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => WeaponCatalogue::default(),
    };

    let map = match generate(&params) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error generating map: {e}");
            process::exit(1);
        }
    };
    let setup = BattleSetup {
        terrain: map.terrain,
        teams: map.teams,
    };
    let mut engine = match BattleEngine::new(setup, catalogue, config) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error starting battle: {e}");
            process::exit(1);
        }
    };

    info!(
        seed = params.seed,
        width = params.width,
        height = params.height,
        "harness started"
    );

    let dt = engine.config().tuning.dt();
    let tick_limit = (max_turns as f64 * 2.0 * engine.config().tuning.max_flight_secs / dt) as u64;
    let mut fired_turn = 0;
    let mut turn_events: Vec<BattleEvent> = Vec::new();

    for _ in 0..tick_limit {
        let inputs = scripted_inputs(&engine, &mut fired_turn);
        let report = engine.tick(dt, &inputs);

        for event in report.events {
            let closes_turn = matches!(
                event,
                BattleEvent::TurnEnded { .. } | BattleEvent::BattleEnded { .. }
            );
            turn_events.push(event);
            if closes_turn {
                print_turn(&engine, &turn_events);
                turn_events.clear();
            }
        }

        if engine.outcome().is_some() {
            break;
        }
        if engine.turn_state().turn > max_turns {
            warn!(max_turns, "turn limit reached");
            break;
        }
    }

    let summary = json!({
        "kind": "summary",
        "time": engine.time(),
        "outcome": engine.outcome(),
        "teams": engine.snapshot().teams,
        "solid_cells": engine.terrain().solid_count(),
    });
    println!("{summary}");
}

/// Aim the active character at the nearest living enemy and fire once per
/// turn, cycling through the catalogue.
fn scripted_inputs(engine: &BattleEngine, fired_turn: &mut u32) -> Vec<InputEvent> {
    let state = engine.turn_state();
    if state.phase != TurnPhase::AwaitingInput || state.turn == *fired_turn {
        return Vec::new();
    }
    *fired_turn = state.turn;

    let Some(me) = engine.character(state.character) else {
        return Vec::new();
    };
    let target = engine
        .roster()
        .characters()
        .filter(|c| c.team != me.team && c.is_alive())
        .filter_map(|c| engine.character(c.id))
        .min_by(|a, b| {
            let da = (a.position - me.position).length();
            let db = (b.position - me.position).length();
            da.total_cmp(&db)
        });
    let Some(target) = target else {
        return Vec::new();
    };

    let id: CharacterId = me.id;
    let mut inputs = Vec::new();
    let dx = target.position.x - me.position.x;
    let wanted = if dx < 0.0 { Facing::Left } else { Facing::Right };
    if wanted != me.facing {
        let turn = match wanted {
            Facing::Left => Command::MoveLeft,
            Facing::Right => Command::MoveRight,
        };
        inputs.push(InputEvent::new(id, turn));
    }

    let weapons: Vec<_> = engine.catalogue().iter().map(|w| w.id).collect();
    let weapon = weapons[(state.turn as usize - 1) % weapons.len()];
    let scale = engine
        .catalogue()
        .get(weapon)
        .map_or(1.0, |w| w.projectile.launch_speed_scale);

    // Flat-ground range at 45 degrees is v^2 / g.
    let tuning = &engine.config().tuning;
    let speed = (dx.abs() * tuning.gravity).sqrt() / scale;
    let power = (speed / tuning.max_launch_speed).clamp(0.05, 1.0);

    inputs.push(InputEvent::new(id, Command::SelectWeapon { weapon }));
    inputs.push(InputEvent::new(
        id,
        Command::AimAdjust {
            delta: 45.0 - me.aim_degrees,
        },
    ));
    inputs.push(InputEvent::new(id, Command::Fire { power }));
    inputs
}

fn print_turn(engine: &BattleEngine, events: &[BattleEvent]) {
    let count = |pred: fn(&BattleEvent) -> bool| events.iter().filter(|e| pred(e)).count();
    let characters: Vec<_> = engine
        .roster()
        .characters()
        .map(|c| json!({ "id": c.id, "team": c.team, "health": c.health, "status": c.status }))
        .collect();
    let line = json!({
        "kind": "turn",
        "turn": engine.turn_state().turn,
        "time": engine.time(),
        "explosions": count(|e| matches!(e, BattleEvent::Explosion { .. })),
        "rejected": count(|e| matches!(e, BattleEvent::CommandRejected { .. })),
        "deaths": count(|e| matches!(e, BattleEvent::CharacterDied { .. })),
        "characters": characters,
        "events": events,
    });
    println!("{line}");
}

// --- Map command ---

fn cmd_map(args: &[String]) {
    let params = map_params(args);
    let map = match generate(&params) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error generating map: {e}");
            process::exit(1);
        }
    };

    let spawns: Vec<(u32, u32, usize)> = map
        .teams
        .iter()
        .enumerate()
        .flat_map(|(t, team)| {
            team.spawns.iter().map(move |p| (p.x as u32, p.y as u32, t))
        })
        .collect();

    // One character per 4x4 block of cells.
    const STEP: u32 = 4;
    let mut out = String::new();
    for y in (0..map.terrain.height()).step_by(STEP as usize) {
        for x in (0..map.terrain.width()).step_by(STEP as usize) {
            let spawn = spawns
                .iter()
                .find(|(sx, sy, _)| sx / STEP == x / STEP && sy / STEP == y / STEP);
            let ch = match spawn {
                Some((_, _, t)) => char::from_digit(*t as u32 % 10, 10).unwrap_or('?'),
                None if map.terrain.is_solid_cell(x as i64, y as i64) => '#',
                None => '.',
            };
            out.push(ch);
        }
        out.push('\n');
    }
    print!("{out}");
    eprintln!(
        "{}x{} cells, {} solid, {} teams",
        map.terrain.width(),
        map.terrain.height(),
        map.terrain.solid_count(),
        map.teams.len()
    );
}
