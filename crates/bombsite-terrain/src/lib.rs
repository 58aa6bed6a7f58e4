//! Terrain system for BOMBSITE.
//!
//! Destructible solid/empty mask, circle carving and deposition,
//! and line-of-sight through the mask.

pub use bombsite_core as core;

pub mod field;
pub mod los;

// Re-export key types for convenience.
pub use field::TerrainField;
pub use los::has_line_of_sight;
