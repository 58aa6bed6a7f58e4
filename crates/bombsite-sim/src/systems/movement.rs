//! Body integration system.
//!
//! Advances every unsettled body by one tick against the terrain, and keeps
//! the roster's view of character bodies in sync afterwards.

use hecs::{Entity, World};

use bombsite_core::enums::CharacterStatus;
use bombsite_core::types::{BodyId, DVec2};
use bombsite_terrain::TerrainField;

use crate::components::CharacterBody;
use crate::physics::{self, Forces, PhysicsBody, StepLimits, TerrainContact};
use crate::roster::Roster;

/// Path of one body over the tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyStep {
    pub entity: Entity,
    pub body: BodyId,
    pub start: DVec2,
    pub end: DVec2,
    pub contact: Option<TerrainContact>,
}

/// Integrate all bodies. Settled bodies whose support was removed start
/// falling first. Returns the moving bodies' paths in ascending body id.
pub fn run(
    world: &mut World,
    field: &TerrainField,
    forces: &Forces,
    limits: &StepLimits,
    dt: f64,
) -> Vec<BodyStep> {
    let mut steps = Vec::new();
    for (entity, (id, body)) in world.query_mut::<(&BodyId, &mut PhysicsBody)>() {
        if body.settled && !physics::is_supported(field, body.position, body.radius) {
            body.settled = false;
        }
        if body.settled {
            continue;
        }
        let outcome = physics::step(body, field, forces, limits, dt);
        steps.push(BodyStep {
            entity,
            body: *id,
            start: outcome.start,
            end: body.position,
            contact: outcome.contact,
        });
    }
    steps.sort_by_key(|s| s.body);
    steps
}

/// Copy body positions into the roster and bring flung characters that have
/// come to rest back to Active.
pub fn sync_characters(world: &World, roster: &mut Roster) {
    for (_entity, (link, body)) in world.query::<(&CharacterBody, &PhysicsBody)>().iter() {
        let Some(c) = roster.get_mut(link.character) else {
            continue;
        };
        c.last_position = body.position;
        if body.settled && c.status == CharacterStatus::Incapacitated {
            c.status = CharacterStatus::Active;
            c.last_hit_by = None;
        }
    }
}

/// Whether every body in the world is at rest.
pub fn all_settled(world: &World) -> bool {
    world
        .query::<&PhysicsBody>()
        .iter()
        .all(|(_, body)| body.settled)
}

/// Force every body to rest where it is.
pub fn settle_all(world: &mut World) {
    for (_entity, body) in world.query_mut::<&mut PhysicsBody>() {
        body.settle();
    }
}
