//! Abstract input events fed into the battle.
//!
//! Commands are validated against the turn state at the start of each tick;
//! anything not addressed to the active character is rejected.

use serde::{Deserialize, Serialize};

use crate::types::{CharacterId, WeaponId};

/// All possible character actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Face left and walk one tick's worth of distance.
    MoveLeft,
    /// Face right and walk one tick's worth of distance.
    MoveRight,
    /// Leap upward in the facing direction. Only while grounded.
    Jump,
    /// Raise (positive) or lower (negative) the aim angle in degrees.
    AimAdjust { delta: f64 },
    /// Switch the selected weapon.
    SelectWeapon { weapon: WeaponId },
    /// Fire the selected weapon. Power is clamped to [0, 1].
    Fire { power: f64 },
}

/// One command addressed to one character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub character: CharacterId,
    pub command: Command,
}

impl InputEvent {
    pub fn new(character: CharacterId, command: Command) -> Self {
        Self { character, command }
    }
}
