//! Systems that operate on the battle world each tick.
//!
//! Systems are free functions that take `&mut World` (or `&World` for
//! read-only work) plus the engine state they need. They do not own state;
//! everything they produce for the tick report is appended to a `TickLog`.

use bombsite_core::events::BattleEvent;
use bombsite_core::state::TerrainDelta;
use bombsite_core::types::CharacterId;

pub mod cleanup;
pub mod collision;
pub mod damage;
pub mod movement;
pub mod snapshot;
pub mod walking;

/// Everything observable that happened during one tick.
#[derive(Debug, Default)]
pub struct TickLog {
    pub events: Vec<BattleEvent>,
    pub terrain_delta: TerrainDelta,
    /// Characters that died this tick, in order of death.
    pub deaths: Vec<CharacterId>,
}

impl TickLog {
    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }
}
