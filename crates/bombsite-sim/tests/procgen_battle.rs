use bombsite_core::commands::{Command, InputEvent};
use bombsite_core::config::BattleConfig;
use bombsite_core::enums::{CharacterStatus, TurnPhase};
use bombsite_core::events::BattleEvent;
use bombsite_core::weapons::{ids as weapon_ids, WeaponCatalogue};
use bombsite_procgen::{generate, MapParams};
use bombsite_sim::{BattleEngine, BattleSetup};

fn new_battle(seed: u64) -> BattleEngine {
    let map = generate(&MapParams {
        seed,
        ..MapParams::default()
    })
    .unwrap();
    let setup = BattleSetup {
        terrain: map.terrain,
        teams: map.teams,
    };
    BattleEngine::new(setup, WeaponCatalogue::default(), BattleConfig::with_seed(seed)).unwrap()
}

/// Each turn the active character picks a weapon and power from the turn
/// number and fires once.
fn script(engine: &BattleEngine, fired_turn: &mut u32) -> Vec<InputEvent> {
    let state = engine.turn_state();
    if state.phase != TurnPhase::AwaitingInput || state.turn == *fired_turn {
        return Vec::new();
    }
    *fired_turn = state.turn;
    let weapons = [
        weapon_ids::ROCKET,
        weapon_ids::GRENADE,
        weapon_ids::CLUSTER_BOMB,
        weapon_ids::RIFLE,
        weapon_ids::BUILDER,
    ];
    let weapon = weapons[state.turn as usize % weapons.len()];
    let power = 0.25 + 0.1 * (state.turn % 5) as f64;
    let c = state.character;
    let mut inputs = Vec::new();
    if state.turn % 2 == 0 {
        inputs.push(InputEvent::new(c, Command::MoveLeft));
    }
    inputs.push(InputEvent::new(c, Command::SelectWeapon { weapon }));
    inputs.push(InputEvent::new(c, Command::AimAdjust { delta: 15.0 }));
    inputs.push(InputEvent::new(c, Command::Fire { power }));
    inputs
}

fn run_battle(seed: u64, ticks: u64) -> Vec<String> {
    let mut engine = new_battle(seed);
    let mut fired_turn = 0;
    let mut frames = Vec::new();
    for _ in 0..ticks {
        let inputs = script(&engine, &mut fired_turn);
        let report = engine.tick(1.0 / 60.0, &inputs);
        frames.push(serde_json::to_string(&report).unwrap());
        if report.outcome.is_some() {
            break;
        }
    }
    frames.push(serde_json::to_string(&engine.snapshot()).unwrap());
    frames
}

#[test]
fn identical_seeds_produce_identical_battles() {
    let run1 = run_battle(7, 60 * 60);
    let run2 = run_battle(7, 60 * 60);
    assert_eq!(run1.len(), run2.len());
    for (i, (a, b)) in run1.iter().zip(&run2).enumerate() {
        assert_eq!(a, b, "Reports diverged at frame {i}");
    }
}

#[test]
fn long_battle_keeps_invariants() {
    let mut engine = new_battle(3);
    let mut fired_turn = 0;
    let mut dead = Vec::new();

    for _ in 0..60 * 120 {
        let inputs = script(&engine, &mut fired_turn);
        let report = engine.tick(1.0 / 60.0, &inputs);

        for event in &report.events {
            if let BattleEvent::CharacterDied { character, .. } = event {
                assert!(!dead.contains(character), "{character} died twice");
                dead.push(*character);
            }
        }

        for c in engine.roster().characters() {
            assert!(c.health <= c.max_health);
            assert_eq!(c.health == 0, c.status == CharacterStatus::Dead);
            if dead.contains(&c.id) {
                assert_eq!(c.status, CharacterStatus::Dead, "{} came back", c.id);
                assert!(c.body.is_none());
            }
        }

        let state = engine.turn_state();
        if state.phase == TurnPhase::AwaitingInput {
            assert!(engine.roster().is_alive(state.character));
        }

        for body in &report.bodies {
            assert!(engine.terrain().in_extent(body.position, engine.config().tuning.sky_margin));
        }

        if report.outcome.is_some() {
            assert_eq!(state.phase, TurnPhase::Ended);
            assert!(engine.roster().alive_teams().len() <= 1);
            return;
        }
    }
    assert!(engine.turn_state().turn > 1, "no turn ever completed");
}
