//! Battle configuration. Every field has a default from `constants`, so a JSON
//! document only needs to name the values it overrides.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{DragModel, Falloff};
use crate::error::ConfigError;

/// Top-level battle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Seed for every random draw in the battle.
    pub seed: u64,
    pub tuning: Tuning,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tuning: Tuning::default(),
        }
    }
}

impl BattleConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BattleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tuning.validate()
    }
}

/// Physics, timing and rules parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub tick_rate: u32,
    pub max_tick_dt: f64,
    pub gravity: f64,
    pub drag_model: DragModel,
    pub wind: f64,
    pub settle_speed: f64,
    pub max_substep_distance: f64,
    pub max_substeps: u32,
    pub contact_bisection_steps: u32,
    pub sky_margin: f64,

    pub turn_time_secs: f64,
    pub turn_gap_secs: f64,
    pub max_flight_secs: f64,

    pub character_radius: f64,
    pub character_mass: f64,
    pub character_max_health: u32,
    pub character_restitution: f64,
    pub character_friction: f64,
    pub walk_speed: f64,
    pub max_climb: u32,
    pub jump_speed: f64,
    pub jump_horizontal_speed: f64,
    pub fall_damage_threshold: f64,
    pub fall_damage_factor: f64,

    pub aim_min_degrees: f64,
    pub aim_max_degrees: f64,
    pub default_aim_degrees: f64,
    pub max_launch_speed: f64,

    pub falloff: Falloff,
    pub occlusion_factor: f64,
    pub knockback_upward_bias: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            max_tick_dt: MAX_TICK_DT,
            gravity: GRAVITY,
            drag_model: DragModel::default(),
            wind: WIND,
            settle_speed: SETTLE_SPEED,
            max_substep_distance: MAX_SUBSTEP_DISTANCE,
            max_substeps: MAX_SUBSTEPS,
            contact_bisection_steps: CONTACT_BISECTION_STEPS,
            sky_margin: SKY_MARGIN,

            turn_time_secs: TURN_TIME_SECS,
            turn_gap_secs: TURN_GAP_SECS,
            max_flight_secs: MAX_FLIGHT_SECS,

            character_radius: CHARACTER_RADIUS,
            character_mass: CHARACTER_MASS,
            character_max_health: CHARACTER_MAX_HEALTH,
            character_restitution: CHARACTER_RESTITUTION,
            character_friction: CHARACTER_FRICTION,
            walk_speed: WALK_SPEED,
            max_climb: MAX_CLIMB,
            jump_speed: JUMP_SPEED,
            jump_horizontal_speed: JUMP_HORIZONTAL_SPEED,
            fall_damage_threshold: FALL_DAMAGE_THRESHOLD,
            fall_damage_factor: FALL_DAMAGE_FACTOR,

            aim_min_degrees: AIM_MIN_DEGREES,
            aim_max_degrees: AIM_MAX_DEGREES,
            default_aim_degrees: DEFAULT_AIM_DEGREES,
            max_launch_speed: MAX_LAUNCH_SPEED,

            falloff: Falloff::default(),
            occlusion_factor: OCCLUSION_FACTOR,
            knockback_upward_bias: KNOCKBACK_UPWARD_BIAS,
        }
    }
}

impl Tuning {
    /// Seconds per tick at the configured rate.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate.max(1) as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(ok: bool, field: &'static str) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::InvalidTuning { field })
            }
        }
        let pos = |v: f64| v.is_finite() && v > 0.0;
        let non_neg = |v: f64| v.is_finite() && v >= 0.0;
        let unit = |v: f64| (0.0..=1.0).contains(&v);

        check(self.tick_rate > 0, "tick_rate")?;
        check(pos(self.max_tick_dt), "max_tick_dt")?;
        check(self.gravity.is_finite(), "gravity")?;
        check(self.wind.is_finite(), "wind")?;
        check(non_neg(self.settle_speed), "settle_speed")?;
        check(pos(self.max_substep_distance), "max_substep_distance")?;
        check(self.max_substeps > 0, "max_substeps")?;
        check(non_neg(self.sky_margin), "sky_margin")?;

        check(pos(self.turn_time_secs), "turn_time_secs")?;
        check(non_neg(self.turn_gap_secs), "turn_gap_secs")?;
        check(pos(self.max_flight_secs), "max_flight_secs")?;

        check(pos(self.character_radius), "character_radius")?;
        check(pos(self.character_mass), "character_mass")?;
        check(self.character_max_health > 0, "character_max_health")?;
        check(unit(self.character_restitution), "character_restitution")?;
        check(unit(self.character_friction), "character_friction")?;
        check(non_neg(self.walk_speed), "walk_speed")?;
        check(non_neg(self.jump_speed), "jump_speed")?;
        check(self.jump_horizontal_speed.is_finite(), "jump_horizontal_speed")?;
        check(non_neg(self.fall_damage_threshold), "fall_damage_threshold")?;
        check(non_neg(self.fall_damage_factor), "fall_damage_factor")?;

        check(
            self.aim_min_degrees.is_finite()
                && self.aim_max_degrees.is_finite()
                && self.aim_min_degrees <= self.aim_max_degrees,
            "aim_min_degrees",
        )?;
        check(
            (self.aim_min_degrees..=self.aim_max_degrees).contains(&self.default_aim_degrees),
            "default_aim_degrees",
        )?;
        check(pos(self.max_launch_speed), "max_launch_speed")?;

        check(unit(self.occlusion_factor), "occlusion_factor")?;
        check(non_neg(self.knockback_upward_bias), "knockback_upward_bias")?;
        Ok(())
    }
}
