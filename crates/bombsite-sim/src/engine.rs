//! Battle engine: the sole owner of battle state.
//!
//! `BattleEngine` owns the hecs world of physics bodies, the roster, the
//! terrain and the turn machine. `tick` is the only mutation entry point:
//! it applies inputs, runs every system in a fixed order and returns a
//! `TickReport`. Completely headless, so battles are deterministic and
//! several can run side by side.

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use bombsite_core::commands::{Command, InputEvent};
use bombsite_core::config::{BattleConfig, Tuning};
use bombsite_core::enums::{BattleOutcome, CharacterStatus, Facing, RejectReason, TurnPhase};
use bombsite_core::error::{ConfigError, MapConstructionError};
use bombsite_core::events::BattleEvent;
use bombsite_core::setup::TeamSetup;
use bombsite_core::state::{BattleSnapshot, CharacterView, TickReport, TurnState};
use bombsite_core::types::{BodyId, CharacterId, SimTime};
use bombsite_core::weapons::WeaponCatalogue;
use bombsite_terrain::TerrainField;

use crate::physics::{Forces, PhysicsBody, StepLimits};
use crate::roster::Roster;
use crate::systems::{self, walking, TickLog};
use crate::turn::{self, TurnEvent, TurnMachine};
use crate::world_setup::{self, BodyIds};

/// Map input for a new battle.
#[derive(Debug, Clone)]
pub struct BattleSetup {
    pub terrain: TerrainField,
    /// Teams in turn order.
    pub teams: Vec<TeamSetup>,
}

/// The battle engine. Owns the ECS world and all battle state.
pub struct BattleEngine {
    world: World,
    roster: Roster,
    terrain: TerrainField,
    catalogue: WeaponCatalogue,
    config: BattleConfig,
    forces: Forces,
    limits: StepLimits,
    time: SimTime,
    turn: TurnMachine,
    outcome: Option<BattleOutcome>,
    rng: ChaCha8Rng,
    body_ids: BodyIds,
    despawn_buffer: Vec<(Entity, BodyId)>,
    /// Events raised outside `tick`, delivered with the next report.
    pending_events: Vec<BattleEvent>,
}

impl BattleEngine {
    /// Validate the setup, spawn every character and open turn 1 for the
    /// first character of the first team.
    pub fn new(
        setup: BattleSetup,
        catalogue: WeaponCatalogue,
        config: BattleConfig,
    ) -> Result<Self, MapConstructionError> {
        config.validate()?;
        let BattleSetup { terrain, teams } = setup;
        validate_teams(&terrain, &teams, &config.tuning)?;
        let default_weapon = catalogue.first_id().ok_or(ConfigError::EmptyCatalogue)?;

        let tuning = &config.tuning;
        let mut world = World::new();
        let mut roster = Roster::new();
        let mut body_ids = BodyIds::default();

        for setup in &teams {
            let team = roster.add_team(setup.name.clone());
            for (i, &position) in setup.spawns.iter().enumerate() {
                let Some(id) = roster.spawn(
                    team,
                    setup.character_name(i),
                    tuning.character_max_health,
                    default_weapon,
                    tuning.default_aim_degrees,
                    position,
                ) else {
                    continue;
                };
                let (entity, _) = world_setup::spawn_character_body(
                    &mut world,
                    &mut body_ids,
                    &terrain,
                    tuning,
                    id,
                    position,
                );
                if let Some(c) = roster.get_mut(id) {
                    c.body = Some(entity);
                    // Face the middle of the map.
                    if position.x > terrain.width() as f64 / 2.0 {
                        c.facing = Facing::Left;
                    }
                }
            }
        }

        let first_team = roster
            .teams()
            .next()
            .map(|t| t.id)
            .ok_or(MapConstructionError::TooFewTeams(0))?;
        let first = roster
            .next_member(first_team)
            .ok_or_else(|| MapConstructionError::EmptyTeam(teams[0].name.clone()))?;
        let turn = TurnMachine::new(first_team, first, tuning.turn_time_secs);

        info!(
            seed = config.seed,
            teams = roster.team_count(),
            characters = roster.characters().count(),
            "battle created"
        );

        let pending_events = vec![BattleEvent::TurnStarted {
            turn: turn.state().turn,
            team: first_team,
            character: first,
        }];

        Ok(Self {
            forces: Forces::from_tuning(tuning),
            limits: StepLimits::from_tuning(tuning),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            world,
            roster,
            terrain,
            catalogue,
            config,
            time: SimTime::default(),
            turn,
            outcome: None,
            body_ids,
            despawn_buffer: Vec::new(),
            pending_events,
        })
    }

    /// Advance the battle by one tick of `dt` seconds, applying `inputs` in
    /// order first. A non-finite or non-positive `dt` is replaced by the
    /// nominal step; larger steps are capped.
    pub fn tick(&mut self, dt: f64, inputs: &[InputEvent]) -> TickReport {
        let dt = self.sanitize_dt(dt);
        let before = systems::snapshot::build_characters(&self.world, &self.roster);
        let mut log = TickLog::default();
        log.events.append(&mut self.pending_events);

        for input in inputs {
            self.handle_input(input, dt, &mut log);
        }

        if self.turn.phase() != TurnPhase::Ended {
            self.run_systems(dt, &mut log);
            self.advance_turn(dt, &mut log);
            self.time.advance(dt);
        }

        let character_deltas = systems::snapshot::build_characters(&self.world, &self.roster)
            .into_iter()
            .zip(before)
            .filter(|(after, before)| after != before)
            .map(|(after, _)| after)
            .collect();

        TickReport {
            time: self.time,
            terrain_delta: log.terrain_delta,
            character_deltas,
            bodies: systems::snapshot::build_bodies(&self.world),
            turn: *self.turn.state(),
            events: log.events,
            outcome: self.outcome,
        }
    }

    /// Build a complete snapshot of the battle.
    pub fn snapshot(&self) -> BattleSnapshot {
        systems::snapshot::build_snapshot(
            &self.world,
            &self.roster,
            &self.terrain,
            self.time,
            *self.turn.state(),
            self.outcome,
        )
    }

    pub fn turn_state(&self) -> &TurnState {
        self.turn.state()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn terrain(&self) -> &TerrainField {
        &self.terrain
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn catalogue(&self) -> &WeaponCatalogue {
        &self.catalogue
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current view of one character.
    pub fn character(&self, id: CharacterId) -> Option<CharacterView> {
        self.roster
            .get(id)
            .map(|c| systems::snapshot::character_view(&self.world, c))
    }

    /// Physics body of a living character (for tests).
    #[cfg(test)]
    pub fn character_body(&self, id: CharacterId) -> Option<PhysicsBody> {
        let entity = self.roster.get(id)?.body?;
        self.world.get::<&PhysicsBody>(entity).ok().map(|b| *b)
    }

    /// Mutable access to the roster (for tests that stage damage).
    #[cfg(test)]
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    fn sanitize_dt(&self, dt: f64) -> f64 {
        let tuning = &self.config.tuning;
        if !dt.is_finite() || dt <= 0.0 {
            warn!(dt, "invalid tick length, using the nominal step");
            return tuning.dt();
        }
        dt.min(tuning.max_tick_dt)
    }

    /// Apply one input event, reporting it when rejected.
    fn handle_input(&mut self, input: &InputEvent, dt: f64, log: &mut TickLog) {
        if let Err(reason) = self.apply_command(input, dt, log) {
            debug!(character = %input.character, ?reason, command = ?input.command, "command rejected");
            log.push(BattleEvent::CommandRejected {
                character: input.character,
                command: input.command,
                reason,
            });
        }
    }

    fn apply_command(
        &mut self,
        input: &InputEvent,
        dt: f64,
        log: &mut TickLog,
    ) -> Result<(), RejectReason> {
        let InputEvent { character, command } = *input;
        if !is_finite(&command) {
            return Err(RejectReason::NonFiniteValue);
        }
        let c = self
            .roster
            .get(character)
            .ok_or(RejectReason::UnknownCharacter)?;
        if !c.is_alive() {
            return Err(RejectReason::CharacterDead);
        }
        if self.turn.phase() != TurnPhase::AwaitingInput {
            return Err(RejectReason::InputLocked);
        }
        if self.turn.state().character != character {
            return Err(RejectReason::NotActive);
        }
        if c.status == CharacterStatus::Incapacitated {
            return Err(RejectReason::CharacterBusy);
        }
        let entity = c.body.ok_or(RejectReason::CharacterDead)?;
        let (facing, aim_degrees, selected) = (c.facing, c.aim_degrees, c.weapon);

        let tuning = &self.config.tuning;
        match command {
            Command::MoveLeft | Command::MoveRight => {
                let facing = if command == Command::MoveLeft {
                    Facing::Left
                } else {
                    Facing::Right
                };
                if let Some(c) = self.roster.get_mut(character) {
                    c.facing = facing;
                }
                let mut body = self
                    .world
                    .get::<&mut PhysicsBody>(entity)
                    .map_err(|_| RejectReason::CharacterDead)?;
                // Airborne characters can turn but not walk.
                if body.settled {
                    let result = walking::walk(
                        &self.terrain,
                        &mut body,
                        facing.sign(),
                        tuning.walk_speed * dt,
                        tuning.max_climb,
                        tuning.walk_speed,
                    );
                    if result == walking::WalkResult::Blocked {
                        debug!(%character, "walk blocked");
                    }
                }
            }
            Command::Jump => {
                let mut body = self
                    .world
                    .get::<&mut PhysicsBody>(entity)
                    .map_err(|_| RejectReason::CharacterDead)?;
                let jumped = walking::jump(
                    &mut body,
                    facing.sign(),
                    tuning.jump_speed,
                    tuning.jump_horizontal_speed,
                );
                if !jumped {
                    return Err(RejectReason::CharacterBusy);
                }
            }
            Command::AimAdjust { delta } => {
                let aim = (aim_degrees + delta).clamp(tuning.aim_min_degrees, tuning.aim_max_degrees);
                if let Some(c) = self.roster.get_mut(character) {
                    c.aim_degrees = aim;
                }
            }
            Command::SelectWeapon { weapon } => {
                if !self.catalogue.contains(weapon) {
                    return Err(RejectReason::UnknownWeapon);
                }
                if let Some(c) = self.roster.get_mut(character) {
                    c.weapon = weapon;
                }
            }
            Command::Fire { power } => {
                let weapon = self
                    .catalogue
                    .get(selected)
                    .ok_or(RejectReason::UnknownWeapon)?;
                let origin = self
                    .world
                    .get::<&PhysicsBody>(entity)
                    .map(|b| b.position)
                    .map_err(|_| RejectReason::CharacterDead)?;
                let bodies = world_setup::fire_weapon(
                    &mut self.world,
                    &mut self.body_ids,
                    tuning,
                    character,
                    origin,
                    facing,
                    aim_degrees,
                    weapon,
                    power,
                );
                debug!(%character, weapon = %weapon.id, power, aim_degrees, "weapon fired");
                for body in bodies {
                    log.push(BattleEvent::WeaponFired {
                        character,
                        weapon: weapon.id,
                        body,
                    });
                }
                self.turn.handle(TurnEvent::WeaponFired);
            }
        }
        Ok(())
    }

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f64, log: &mut TickLog) {
        let tuning = &self.config.tuning;

        // 1. Body integration against terrain
        let steps = systems::movement::run(
            &mut self.world,
            &self.terrain,
            &self.forces,
            &self.limits,
            dt,
        );
        // 2. Contacts: detonate, bounce, land
        let contacts = systems::collision::detect(&self.world, &steps);
        let collisions = systems::collision::resolve(&mut self.world, &contacts, tuning, log);
        // 3. Fuses
        let mut detonations = collisions.detonations;
        detonations.extend(systems::collision::tick_fuses(&mut self.world, dt));
        detonations.sort_by_key(|d| d.body);
        // 4. Weapon effects
        for detonation in &detonations {
            systems::damage::detonate(
                &mut self.world,
                &mut self.roster,
                &mut self.terrain,
                tuning,
                &mut self.body_ids,
                &mut self.rng,
                detonation,
                log,
            );
        }
        // 5. Fall damage
        systems::damage::apply_fall_damage(
            &mut self.world,
            &mut self.roster,
            &collisions.landings,
            log,
        );
        // 6. Cleanup (out of world)
        systems::cleanup::run(
            &mut self.world,
            &mut self.roster,
            &self.terrain,
            tuning.sky_margin,
            &mut self.despawn_buffer,
            log,
        );
        // 7. Roster sync
        systems::movement::sync_characters(&self.world, &mut self.roster);
    }

    /// Observe the world and feed the turn machine.
    fn advance_turn(&mut self, dt: f64, log: &mut TickLog) {
        self.turn.advance_clock(dt);
        let state = *self.turn.state();
        let tuning = &self.config.tuning;

        match state.phase {
            TurnPhase::AwaitingInput => {
                if !self.roster.is_alive(state.character) {
                    self.transition(TurnEvent::ActiveCharacterDied, log);
                } else if self.turn.timer_expired() {
                    self.transition(TurnEvent::TimerExpired, log);
                }
            }
            TurnPhase::ActionInFlight => {
                let at_rest = !systems::cleanup::projectiles_remaining(&self.world)
                    && systems::movement::all_settled(&self.world);
                if at_rest {
                    self.transition(TurnEvent::AllBodiesSettled, log);
                } else if state.phase_elapsed >= tuning.max_flight_secs {
                    systems::cleanup::expire_projectiles(&mut self.world, log);
                    self.transition(TurnEvent::FlightTimedOut, log);
                }
            }
            TurnPhase::Resolving => {
                if state.phase_elapsed < tuning.turn_gap_secs {
                    return;
                }
                if !systems::movement::all_settled(&self.world) {
                    if state.phase_elapsed < tuning.turn_gap_secs + tuning.max_flight_secs {
                        return;
                    }
                    debug!("forcing bodies to rest");
                    systems::cleanup::expire_projectiles(&mut self.world, log);
                    systems::movement::settle_all(&mut self.world);
                    systems::movement::sync_characters(&self.world, &mut self.roster);
                }
                self.conclude_turn(state, log);
            }
            TurnPhase::Ended => {}
        }
    }

    /// Hand the turn to the next eligible character, or end the battle.
    fn conclude_turn(&mut self, state: TurnState, log: &mut TickLog) {
        match turn::next_eligible(state.team, &mut self.roster) {
            Some((team, character)) => {
                self.transition(TurnEvent::NextTurn { team, character }, log);
                let turn = self.turn.state().turn;
                info!(turn, %team, %character, "turn started");
                log.push(BattleEvent::TurnStarted {
                    turn,
                    team,
                    character,
                });
            }
            None => {
                self.transition(TurnEvent::BattleOver, log);
                let outcome = match self.roster.alive_teams().as_slice() {
                    [winner] => BattleOutcome::Victor(*winner),
                    _ => BattleOutcome::Draw,
                };
                info!(?outcome, turns = state.turn, "battle ended");
                self.outcome = Some(outcome);
                log.push(BattleEvent::BattleEnded { outcome });
            }
        }
    }

    fn transition(&mut self, event: TurnEvent, log: &mut TickLog) {
        let Some(phase) = self.turn.handle(event) else {
            return;
        };
        if phase == TurnPhase::Resolving {
            let state = self.turn.state();
            let forfeited = self.turn.forfeited();
            info!(turn = state.turn, team = %state.team, forfeited, "turn ended");
            log.push(BattleEvent::TurnEnded {
                turn: state.turn,
                forfeited,
            });
        }
        debug_assert!(
            phase == TurnPhase::Ended
                || phase == TurnPhase::Resolving
                || self.roster.is_alive(self.turn.state().character),
            "active character must be alive"
        );
    }
}

/// Check the team list against the terrain.
fn validate_teams(
    terrain: &TerrainField,
    teams: &[TeamSetup],
    tuning: &Tuning,
) -> Result<(), MapConstructionError> {
    if teams.len() < 2 {
        return Err(MapConstructionError::TooFewTeams(teams.len()));
    }
    for team in teams {
        if team.spawns.is_empty() {
            return Err(MapConstructionError::EmptyTeam(team.name.clone()));
        }
        for &position in &team.spawns {
            if !terrain.in_extent(position, 0.0) {
                return Err(MapConstructionError::SpawnOutOfBounds {
                    team: team.name.clone(),
                    position,
                });
            }
            if terrain.overlaps_circle(position, tuning.character_radius) {
                return Err(MapConstructionError::SpawnInsideTerrain {
                    team: team.name.clone(),
                    position,
                });
            }
        }
    }
    Ok(())
}

fn is_finite(command: &Command) -> bool {
    match *command {
        Command::AimAdjust { delta } => delta.is_finite(),
        Command::Fire { power } => power.is_finite(),
        _ => true,
    }
}
