//! Line-of-sight through the terrain mask.
//!
//! Uses stepped ray traversal: the segment is sampled at a fixed interval and
//! each interior sample is tested against the mask. Endpoints are excluded so
//! that a point resting on the surface can still see and be seen.

use bombsite_core::constants::LOS_SAMPLE_INTERVAL;
use bombsite_core::types::DVec2;

use crate::field::TerrainField;

/// Check line-of-sight between two world points.
///
/// Returns true if no interior sample of the segment `from → to` lies in a
/// solid cell.
pub fn has_line_of_sight(field: &TerrainField, from: DVec2, to: DVec2) -> bool {
    let delta = to - from;
    let dist = delta.length();
    if !dist.is_finite() {
        return false;
    }
    if dist < LOS_SAMPLE_INTERVAL {
        return true;
    }

    let num_samples = ((dist / LOS_SAMPLE_INTERVAL).ceil() as usize).max(2);
    for i in 1..num_samples {
        let t = i as f64 / num_samples as f64;
        if field.is_solid(from + delta * t) {
            return false;
        }
    }
    true
}

impl TerrainField {
    /// Whether the straight segment between `a` and `b` is clear of terrain.
    pub fn line_of_sight(&self, a: DVec2, b: DVec2) -> bool {
        has_line_of_sight(self, a, b)
    }
}
