//! Battle engine for BOMBSITE.
//!
//! Owns the hecs world of physics bodies, the character roster and the turn
//! machine, runs systems at a fixed tick rate and produces tick reports and
//! snapshots for a presentation layer.

pub mod components;
pub mod engine;
pub mod physics;
pub mod roster;
pub mod systems;
pub mod turn;
pub mod world_setup;

pub use bombsite_core as core;
pub use engine::{BattleEngine, BattleSetup};
