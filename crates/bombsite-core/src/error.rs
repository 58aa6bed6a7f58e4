//! Error types for battle construction and configuration loading.

use thiserror::Error;

use crate::types::{DVec2, WeaponId};

/// Why a battle could not be started.
#[derive(Debug, Error)]
pub enum MapConstructionError {
    #[error("terrain extent {width}x{height} is empty")]
    EmptyTerrain { width: u32, height: u32 },

    #[error("terrain mask has {actual} cells, expected {expected}")]
    MaskSizeMismatch { expected: usize, actual: usize },

    #[error("terrain row {row} has width {actual}, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("heightfield has {actual} columns, expected {expected}")]
    HeightfieldWidth { expected: usize, actual: usize },

    #[error("battle needs at least two teams, got {0}")]
    TooFewTeams(usize),

    #[error("team `{0}` has no spawn points")]
    EmptyTeam(String),

    #[error("spawn {position} of team `{team}` is outside the terrain extent")]
    SpawnOutOfBounds { team: String, position: DVec2 },

    #[error("spawn {position} of team `{team}` overlaps solid terrain")]
    SpawnInsideTerrain { team: String, position: DVec2 },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Why a configuration or weapon catalogue was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tuning value `{field}` is out of range")]
    InvalidTuning { field: &'static str },

    #[error("weapon catalogue is empty")]
    EmptyCatalogue,

    #[error("weapon {0} is defined more than once")]
    DuplicateWeapon(WeaponId),

    #[error("weapon {id} has an invalid `{field}`")]
    InvalidWeapon { id: WeaponId, field: &'static str },
}
