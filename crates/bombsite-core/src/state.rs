//! Battle state exports: the per-tick report and the on-demand full snapshot.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::BattleEvent;
use crate::types::{BodyId, CellCoord, CharacterId, DVec2, SimTime, TeamId, WeaponId};

/// Turn bookkeeping owned by the turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    /// 1-based turn counter.
    pub turn: u32,
    pub phase: TurnPhase,
    pub team: TeamId,
    pub character: CharacterId,
    /// Seconds left to act (only counts down in AwaitingInput).
    pub timer_remaining: f64,
    /// Seconds spent in the current phase.
    pub phase_elapsed: f64,
}

/// Terrain cells that changed during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainDelta {
    /// Cells that went from solid to empty.
    pub removed: Vec<CellCoord>,
    /// Cells that went from empty to solid.
    pub added: Vec<CellCoord>,
}

impl TerrainDelta {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// A character as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterView {
    pub id: CharacterId,
    pub team: TeamId,
    pub name: String,
    pub health: u32,
    pub status: CharacterStatus,
    pub position: DVec2,
    pub velocity: DVec2,
    pub facing: Facing,
    /// Degrees above horizontal in the facing direction.
    pub aim_degrees: f64,
    pub weapon: WeaponId,
    pub grounded: bool,
}

/// A free projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyView {
    pub id: BodyId,
    pub weapon: WeaponId,
    pub position: DVec2,
    pub velocity: DVec2,
    pub radius: f64,
    /// Seconds until the fuse fires, for fused projectiles.
    pub fuse_remaining: Option<f64>,
}

/// Result of one `tick` call. Character deltas only list characters whose
/// visible state changed this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub time: SimTime,
    pub terrain_delta: TerrainDelta,
    pub character_deltas: Vec<CharacterView>,
    pub bodies: Vec<BodyView>,
    pub turn: TurnState,
    pub events: Vec<BattleEvent>,
    pub outcome: Option<BattleOutcome>,
}

/// Team summary inside a full snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamView {
    pub id: TeamId,
    pub name: String,
    pub members: Vec<CharacterId>,
    pub alive: u32,
}

/// Terrain mask packed one bit per cell, row-major, least significant bit first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainRows {
    pub width: u32,
    pub height: u32,
    /// One entry per row, each `ceil(width / 64)` words long.
    pub rows: Vec<Vec<u64>>,
}

/// Complete battle state, built on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub time: SimTime,
    pub terrain: TerrainRows,
    pub teams: Vec<TeamView>,
    pub characters: Vec<CharacterView>,
    pub bodies: Vec<BodyView>,
    pub turn: TurnState,
    pub outcome: Option<BattleOutcome>,
}
