//! Seeded procedural battlefield generation.
//!
//! Produces a rolling heightfield terrain from a few octaves of randomly
//! phased sine waves, then spreads the teams' spawn points evenly across the
//! map with the teams interleaved left to right.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use bombsite_core::constants::CHARACTER_RADIUS;
use bombsite_core::error::MapConstructionError;
use bombsite_core::setup::TeamSetup;
use bombsite_core::types::DVec2;
use bombsite_terrain::TerrainField;

/// Inputs to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapParams {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    pub team_names: Vec<String>,
    pub members_per_team: u32,
    /// Mean ground surface as a fraction of the height, measured from the top.
    pub ground_level: f64,
    /// Peak deviation of the surface as a fraction of the height.
    pub amplitude: f64,
    pub octaves: u32,
    /// Distance kept between a spawn's centre and the ground below it.
    pub spawn_clearance: f64,
}

impl Default for MapParams {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            seed: 0,
            team_names: vec!["Red".into(), "Blue".into()],
            members_per_team: 3,
            ground_level: 0.6,
            amplitude: 0.2,
            octaves: 4,
            spawn_clearance: CHARACTER_RADIUS + 1.0,
        }
    }
}

/// Generated terrain plus team setups ready for a battle.
#[derive(Debug, Clone)]
pub struct GeneratedMap {
    pub terrain: TerrainField,
    pub teams: Vec<TeamSetup>,
}

/// Generate a map. The same parameters always give the same map.
pub fn generate(params: &MapParams) -> Result<GeneratedMap, MapConstructionError> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let surface = heightfield(params, &mut rng);
    let terrain = TerrainField::from_heightfield(params.width, params.height, &surface)?;
    let spawns = interleaved_spawns(
        &terrain,
        params.team_names.len(),
        params.members_per_team,
        params.spawn_clearance,
    );
    let teams = params
        .team_names
        .iter()
        .zip(spawns)
        .map(|(name, spawns)| TeamSetup::new(name.clone(), spawns))
        .collect();
    Ok(GeneratedMap { terrain, teams })
}

/// Surface row for every column.
pub fn heightfield(params: &MapParams, rng: &mut ChaCha8Rng) -> Vec<u32> {
    let width = params.width as f64;
    let height = params.height as f64;

    let mut waves = Vec::with_capacity(params.octaves as usize);
    let mut amp = 1.0;
    let mut freq = 1.5;
    for _ in 0..params.octaves {
        let phase = rng.gen_range(0.0..std::f64::consts::TAU);
        let jitter = rng.gen_range(0.75..1.25);
        waves.push((amp * jitter, freq, phase));
        amp *= 0.5;
        freq *= 2.0;
    }
    let norm: f64 = waves.iter().map(|(a, _, _)| a).sum::<f64>().max(1e-9);

    // Keep a sky band at the top and at least one solid row at the bottom.
    let top = (height * 0.1).floor();
    let bottom = (height - 1.0).max(0.0);

    (0..params.width)
        .map(|x| {
            let u = x as f64 / width.max(1.0);
            let offset: f64 = waves
                .iter()
                .map(|(a, f, p)| a * (std::f64::consts::TAU * f * u + p).sin())
                .sum::<f64>()
                / norm;
            let y = height * params.ground_level - height * params.amplitude * offset;
            y.round().clamp(top.min(bottom), bottom) as u32
        })
        .collect()
}

/// Spawn points for `teams × members` characters at even spacing, with team
/// order cycling left to right: slot `i` belongs to team `i % teams`.
/// Each point hovers `clearance` above the highest ground within reach.
pub fn interleaved_spawns(
    terrain: &TerrainField,
    teams: usize,
    members: u32,
    clearance: f64,
) -> Vec<Vec<DVec2>> {
    let mut spawns = vec![Vec::new(); teams];
    let total = teams * members as usize;
    if total == 0 {
        return spawns;
    }
    let spacing = terrain.width() as f64 / total as f64;
    let reach = clearance.ceil().max(0.0) as i64;

    for slot in 0..total {
        let x = (slot as f64 + 0.5) * spacing;
        let col = x.floor() as i64;
        let ground = (col - reach..=col + reach)
            .filter(|&c| c >= 0 && c < terrain.width() as i64)
            .filter_map(|c| terrain.surface_y(c as u32))
            .min()
            .unwrap_or(terrain.height());
        let y = ground as f64 - clearance;
        spawns[slot % teams].push(DVec2::new(x, y));
    }
    spawns
}
