//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

use crate::types::TeamId;

/// Contents of a single terrain cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Solid,
}

/// Character condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterStatus {
    /// Standing and able to act on its turn.
    #[default]
    Active,
    /// Flung by an explosion; cannot act until it settles.
    Incapacitated,
    /// Health reached zero. Terminal.
    Dead,
}

/// Direction a character faces. Aim angles are measured from this direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Horizontal unit sign: -1 for left, +1 for right.
    pub fn sign(self) -> f64 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Turn lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    /// The active character may move, aim and fire.
    #[default]
    AwaitingInput,
    /// A weapon was fired; waiting for every body to settle.
    ActionInFlight,
    /// Between turns: bodies settle, then the next character is chosen.
    Resolving,
    /// The battle is over. Absorbs all further events.
    Ended,
}

/// Final result of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "team")]
pub enum BattleOutcome {
    Victor(TeamId),
    Draw,
}

/// Why an input event was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// The character is not the one whose turn it is.
    NotActive,
    /// No such character in the roster.
    UnknownCharacter,
    /// The character is dead.
    CharacterDead,
    /// The character is incapacitated or airborne.
    CharacterBusy,
    /// The weapon id is not in the catalogue.
    UnknownWeapon,
    /// Input is only accepted while awaiting input.
    InputLocked,
    /// A numeric argument was NaN or infinite.
    NonFiniteValue,
}

/// Velocity-dependent drag law.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DragModel {
    /// Deceleration proportional to velocity.
    Linear,
    /// Deceleration proportional to speed times velocity.
    #[default]
    Quadratic,
}

/// Explosion damage falloff over normalised distance `d / R`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Falloff {
    /// `1 - t`.
    #[default]
    Linear,
    /// `(1 - t)^2`.
    Quadratic,
    /// `1 / (1 + k t^2)`, shifted and rescaled so it reaches exactly 0 at `t = 1`.
    InverseSquare,
}

impl Falloff {
    /// Damage multiplier at normalised distance `t`. 1 at the centre, 0 at and beyond 1.
    pub fn factor(self, t: f64) -> f64 {
        if !t.is_finite() || t >= 1.0 {
            return 0.0;
        }
        let t = t.max(0.0);
        match self {
            Falloff::Linear => 1.0 - t,
            Falloff::Quadratic => (1.0 - t) * (1.0 - t),
            Falloff::InverseSquare => {
                let k = crate::constants::INVERSE_SQUARE_SHARPNESS;
                let edge = 1.0 / (1.0 + k);
                (1.0 / (1.0 + k * t * t) - edge) / (1.0 - edge)
            }
        }
    }
}
