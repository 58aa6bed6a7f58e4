//! Simulation constants and default tuning parameters.
//!
//! World units are terrain cells; time is in seconds. The y axis points down,
//! matching the row order of the terrain mask.

/// Default simulation tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick at the default tick rate.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Largest `dt` a single tick will integrate. Longer frames are clamped.
pub const MAX_TICK_DT: f64 = 0.1;

// --- Physics ---

/// Gravitational acceleration (cells/s², positive = down).
pub const GRAVITY: f64 = 500.0;

/// Constant horizontal wind acceleration (cells/s², positive = right).
pub const WIND: f64 = 0.0;

/// Speed below which a grounded body is considered settled (cells/s).
pub const SETTLE_SPEED: f64 = 20.0;

/// Maximum distance a body may travel in one sub-step (cells).
pub const MAX_SUBSTEP_DISTANCE: f64 = 1.0;

/// Hard cap on sub-steps per tick per body.
pub const MAX_SUBSTEPS: u32 = 64;

/// Bisection iterations when locating a terrain contact point.
pub const CONTACT_BISECTION_STEPS: u32 = 12;

/// Open air above the top row of the map that still counts as in-bounds (cells).
pub const SKY_MARGIN: f64 = 2000.0;

// --- Turn timing ---

/// Seconds the active character has to act before forfeiting.
pub const TURN_TIME_SECS: f64 = 20.0;

/// Minimum seconds spent in Resolving before the next turn starts.
pub const TURN_GAP_SECS: f64 = 1.0;

/// Maximum seconds a fired action may stay in flight.
pub const MAX_FLIGHT_SECS: f64 = 30.0;

// --- Characters ---

/// Character collision radius (cells).
pub const CHARACTER_RADIUS: f64 = 6.0;

/// Character mass (arbitrary units; only ratios with drag matter).
pub const CHARACTER_MASS: f64 = 1.0;

/// Starting and maximum health.
pub const CHARACTER_MAX_HEALTH: u32 = 100;

/// Fraction of normal speed kept when a character bounces off terrain.
pub const CHARACTER_RESTITUTION: f64 = 0.4;

/// Fraction of tangential speed kept when a character bounces off terrain.
pub const CHARACTER_FRICTION: f64 = 0.8;

/// Walking speed (cells/s).
pub const WALK_SPEED: f64 = 60.0;

/// Highest step a walking character can climb or descend per cell moved.
pub const MAX_CLIMB: u32 = 3;

/// Upward launch speed of a jump (cells/s).
pub const JUMP_SPEED: f64 = 250.0;

/// Horizontal speed of a jump in the facing direction (cells/s).
pub const JUMP_HORIZONTAL_SPEED: f64 = 100.0;

/// Impact speed above which landing hurts (cells/s).
pub const FALL_DAMAGE_THRESHOLD: f64 = 500.0;

/// Health lost per cell/s of impact speed above the threshold.
pub const FALL_DAMAGE_FACTOR: f64 = 0.04;

// --- Aiming ---

/// Lowest aim angle (degrees above horizontal).
pub const AIM_MIN_DEGREES: f64 = -50.0;

/// Highest aim angle (degrees above horizontal).
pub const AIM_MAX_DEGREES: f64 = 88.0;

/// Aim angle characters start with.
pub const DEFAULT_AIM_DEGREES: f64 = 30.0;

/// Launch speed at full power (cells/s).
pub const MAX_LAUNCH_SPEED: f64 = 1000.0;

// --- Explosions ---

/// Damage multiplier applied when terrain blocks line of sight to the blast.
pub const OCCLUSION_FACTOR: f64 = 0.5;

/// Upward offset added to the blast direction when flinging characters (cells).
pub const KNOCKBACK_UPWARD_BIAS: f64 = 25.0;

/// Sharpness of the inverse-square falloff curve.
pub const INVERSE_SQUARE_SHARPNESS: f64 = 9.0;

// --- Terrain ---

/// Line-of-sight sampling interval (cells).
pub const LOS_SAMPLE_INTERVAL: f64 = 0.5;
