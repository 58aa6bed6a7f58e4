//! Events emitted by the simulation for presentation feedback.

use serde::{Deserialize, Serialize};

use crate::commands::Command;
use crate::enums::*;
use crate::types::{BodyId, CharacterId, DVec2, TeamId, WeaponId};

/// Something that happened during a tick, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BattleEvent {
    /// A projectile left the barrel.
    WeaponFired {
        character: CharacterId,
        weapon: WeaponId,
        body: BodyId,
    },
    /// A body touched solid terrain.
    TerrainImpact {
        body: BodyId,
        position: DVec2,
        incoming_velocity: DVec2,
    },
    /// A projectile touched a character's body.
    BodyImpact { a: BodyId, b: BodyId, position: DVec2 },
    /// An area effect went off.
    Explosion {
        position: DVec2,
        radius: f64,
        cells_removed: usize,
    },
    /// A builder effect added terrain.
    Deposit { position: DVec2, cells_added: usize },
    /// A character lost health.
    CharacterDamaged {
        character: CharacterId,
        amount: u32,
        health: u32,
    },
    /// A character's health reached zero or it left the world.
    CharacterDied {
        character: CharacterId,
        team: TeamId,
        /// The character whose weapon caused the death, if any.
        caused_by: Option<CharacterId>,
    },
    /// A body left the world or timed out and was removed.
    BodyExpired { body: BodyId },
    /// An input event was discarded.
    CommandRejected {
        character: CharacterId,
        command: Command,
        reason: RejectReason,
    },
    /// A new turn began.
    TurnStarted {
        turn: u32,
        team: TeamId,
        character: CharacterId,
    },
    /// The active turn was closed.
    TurnEnded { turn: u32, forfeited: bool },
    /// The battle finished.
    BattleEnded { outcome: BattleOutcome },
}
