//! Ground movement: walking with step climbing, jumping, and freeing bodies
//! buried by deposited terrain.

use bombsite_core::types::DVec2;
use bombsite_terrain::TerrainField;

use crate::physics::{self, PhysicsBody};

/// Bisection iterations when snapping onto the ground.
const SNAP_BISECTION_STEPS: u32 = 10;

/// What happened to a walking body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkResult {
    /// Moved along the ground.
    Moved,
    /// A wall higher than the climb limit was in the way; nothing moved.
    Blocked,
    /// Walked off a ledge and is now falling.
    Airborne,
}

/// Walk a settled body `distance` cells in `direction` (-1 or +1), one cell
/// at a time, climbing or descending at most `max_climb` cells per cell moved.
pub fn walk(
    field: &TerrainField,
    body: &mut PhysicsBody,
    direction: f64,
    distance: f64,
    max_climb: u32,
    walk_speed: f64,
) -> WalkResult {
    let r = body.radius;
    let mut pos = body.position;
    let mut remaining = distance.max(0.0);
    let mut moved = false;

    while remaining > 1e-9 {
        let dx = remaining.min(1.0) * direction;
        remaining -= dx.abs();

        let Some(next) = (0..=max_climb)
            .map(|k| pos + DVec2::new(dx, -(k as f64)))
            .find(|&c| !field.overlaps_circle(c, r))
        else {
            break;
        };
        pos = next;
        moved = true;

        match snap_down(field, pos, r, max_climb as f64 + 1.0) {
            Some(ground) => pos = ground,
            None => {
                body.position = pos;
                body.launch(DVec2::new(direction * walk_speed, 0.0));
                return WalkResult::Airborne;
            }
        }
    }

    body.position = pos;
    if moved {
        WalkResult::Moved
    } else {
        WalkResult::Blocked
    }
}

/// Launch a settled body into a jump. Returns false if it was airborne.
pub fn jump(body: &mut PhysicsBody, direction: f64, vertical: f64, horizontal: f64) -> bool {
    if !body.settled {
        return false;
    }
    body.launch(DVec2::new(direction * horizontal, -vertical));
    true
}

/// Lower a free disc onto the ground below it. Returns `None` when there is
/// no ground within `max_drop` cells.
pub fn snap_down(field: &TerrainField, position: DVec2, radius: f64, max_drop: f64) -> Option<DVec2> {
    if physics::is_supported(field, position, radius) {
        return Some(position);
    }
    let mut free = position;
    let mut dropped = 0.0;
    while dropped < max_drop {
        let next = free + DVec2::new(0.0, 1.0);
        if field.overlaps_circle(next, radius) {
            let (ground, _) = physics::bisect_contact(field, free, next, radius, SNAP_BISECTION_STEPS);
            return Some(ground);
        }
        free = next;
        dropped += 1.0;
    }
    None
}

/// Move a disc buried in terrain straight up until it is free, by at most
/// `max_lift` cells.
pub fn lift_out(field: &TerrainField, position: DVec2, radius: f64, max_lift: u32) -> Option<DVec2> {
    (0..=max_lift)
        .map(|k| position - DVec2::new(0.0, k as f64))
        .find(|&c| !field.overlaps_circle(c, radius))
}
