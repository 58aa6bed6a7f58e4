//! Cleanup system: removes bodies that left the world or outlived their flight.

use hecs::{Entity, World};
use tracing::debug;

use bombsite_core::events::BattleEvent;
use bombsite_core::types::BodyId;
use bombsite_terrain::TerrainField;

use crate::components::{CharacterBody, Projectile};
use crate::physics::PhysicsBody;
use crate::roster::Roster;
use crate::systems::damage;
use crate::systems::TickLog;

/// Remove every body outside the world extent. A character whose body leaves
/// the world dies, credited to whoever last flung it.
pub fn run(
    world: &mut World,
    roster: &mut Roster,
    field: &TerrainField,
    sky_margin: f64,
    despawn_buffer: &mut Vec<(Entity, BodyId)>,
    log: &mut TickLog,
) {
    despawn_buffer.clear();

    for (entity, (id, body)) in world.query_mut::<(&BodyId, &PhysicsBody)>() {
        if !field.in_extent(body.position, sky_margin) {
            despawn_buffer.push((entity, *id));
        }
    }
    despawn_buffer.sort_by_key(|(_, id)| *id);

    for (entity, id) in despawn_buffer.drain(..) {
        let character = world.get::<&CharacterBody>(entity).map(|c| c.character).ok();
        debug!(body = %id, "body left the world");
        log.push(BattleEvent::BodyExpired { body: id });

        match character {
            Some(character) if roster.kill(character) => {
                let cause = roster.get(character).and_then(|c| c.last_hit_by);
                damage::record_death(world, roster, character, cause, log);
            }
            _ => {
                let _ = world.despawn(entity);
            }
        }
    }
}

/// Remove every projectile still in flight.
pub fn expire_projectiles(world: &mut World, log: &mut TickLog) {
    let mut expired: Vec<(Entity, BodyId)> = world
        .query_mut::<(&BodyId, &Projectile)>()
        .into_iter()
        .map(|(entity, (id, _))| (entity, *id))
        .collect();
    expired.sort_by_key(|(_, id)| *id);

    for (entity, id) in expired {
        debug!(body = %id, "projectile expired");
        let _ = world.despawn(entity);
        log.push(BattleEvent::BodyExpired { body: id });
    }
}

/// Whether any projectile is still in the world.
pub fn projectiles_remaining(world: &World) -> bool {
    world.query::<&Projectile>().iter().next().is_some()
}
