//! Damage and destruction engine.
//!
//! Applies weapon effects at detonation points: terrain carving and
//! deposits, radial blast damage with falloff and occlusion, knockback, and
//! the bookkeeping around character deaths.

use hecs::World;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use bombsite_core::config::Tuning;
use bombsite_core::enums::CharacterStatus;
use bombsite_core::events::BattleEvent;
use bombsite_core::types::{CharacterId, DVec2};
use bombsite_core::weapons::{BlastSpec, WeaponEffect};
use bombsite_terrain::TerrainField;

use crate::physics::{self, PhysicsBody};
use crate::roster::{DamageOutcome, Roster};
use crate::systems::collision::{HardLanding, PendingDetonation};
use crate::systems::walking;
use crate::systems::TickLog;
use crate::world_setup::{self, BodyIds};

/// Apply one detonation. The projectile is removed from the world first.
#[allow(clippy::too_many_arguments)]
pub fn detonate(
    world: &mut World,
    roster: &mut Roster,
    field: &mut TerrainField,
    tuning: &Tuning,
    ids: &mut BodyIds,
    rng: &mut ChaCha8Rng,
    detonation: &PendingDetonation,
    log: &mut TickLog,
) {
    let _ = world.despawn(detonation.entity);
    let center = detonation.position;
    let cause = detonation.owner;

    match detonation.effect {
        WeaponEffect::DirectHit {
            damage,
            crater_radius,
        } => match detonation.struck {
            Some(target) => {
                damage_character(world, roster, target, damage, cause, log);
            }
            None => {
                carve(field, center, crater_radius, log);
            }
        },
        WeaponEffect::Explosion { blast } => {
            apply_explosion(world, roster, field, tuning, center, &blast, cause, log);
        }
        WeaponEffect::Cluster {
            blast,
            fragments,
            scatter_speed,
            fragment,
            fragment_blast,
        } => {
            apply_explosion(world, roster, field, tuning, center, &blast, cause, log);
            world_setup::scatter_fragments(
                world,
                ids,
                rng,
                center,
                fragments,
                scatter_speed,
                fragment,
                fragment_blast,
                detonation.weapon,
                cause,
            );
        }
        WeaponEffect::Deposit { radius } => {
            deposit(world, field, center, radius, log);
        }
    }
}

/// Remove terrain in a disc and report it.
fn carve(field: &mut TerrainField, center: DVec2, radius: f64, log: &mut TickLog) -> usize {
    let removed = field.carve_circle(center, radius);
    let cells_removed = removed.len();
    log.terrain_delta.removed.extend(removed);
    log.push(BattleEvent::Explosion {
        position: center,
        radius,
        cells_removed,
    });
    debug!(x = center.x, y = center.y, radius, cells_removed, "explosion");
    cells_removed
}

/// Carve the crater, then damage and fling every living character within the
/// damage radius. Damage is `floor(max_damage * falloff(d / R) * occlusion)`,
/// at least 1 for anyone inside the radius, where occlusion applies when the
/// carved terrain still blocks line of sight.
#[allow(clippy::too_many_arguments)]
pub fn apply_explosion(
    world: &mut World,
    roster: &mut Roster,
    field: &mut TerrainField,
    tuning: &Tuning,
    center: DVec2,
    blast: &BlastSpec,
    cause: Option<CharacterId>,
    log: &mut TickLog,
) {
    carve(field, center, blast.carve_radius, log);
    if blast.damage_radius <= 0.0 {
        return;
    }

    let targets: Vec<(CharacterId, hecs::Entity)> = roster
        .characters()
        .filter(|c| c.is_alive())
        .filter_map(|c| c.body.map(|entity| (c.id, entity)))
        .collect();

    for (character, entity) in targets {
        let Ok(position) = world.get::<&PhysicsBody>(entity).map(|b| b.position) else {
            continue;
        };
        let proximity = tuning
            .falloff
            .factor(position.distance(center) / blast.damage_radius);
        if proximity <= 0.0 {
            continue;
        }
        let occlusion = if field.line_of_sight(center, position) {
            1.0
        } else {
            tuning.occlusion_factor
        };

        let amount = blast_damage(blast.max_damage, proximity * occlusion);
        let outcome = damage_character(world, roster, character, amount, cause, log);
        if outcome.died || blast.knockback <= 0.0 {
            continue;
        }

        let away = (position - center) + DVec2::new(0.0, -tuning.knockback_upward_bias);
        let dir = away.try_normalize().unwrap_or(DVec2::new(0.0, -1.0));
        if let Ok(mut body) = world.get::<&mut PhysicsBody>(entity) {
            body.launch(dir * blast.knockback * proximity);
        }
        if let Some(c) = roster.get_mut(character) {
            c.status = CharacterStatus::Incapacitated;
            c.last_hit_by = cause;
        }
    }
}

/// Whole damage for a target inside the radius. Never exceeds `max_damage`
/// and never rounds a hit down to nothing.
fn blast_damage(max_damage: u32, factor: f64) -> u32 {
    if max_damage == 0 {
        return 0;
    }
    let raw = (max_damage as f64 * factor).floor();
    (raw as u32).clamp(1, max_damage)
}

/// Add terrain in a disc and push any body it buried back out on top.
fn deposit(
    world: &mut World,
    field: &mut TerrainField,
    center: DVec2,
    radius: f64,
    log: &mut TickLog,
) {
    let added = field.deposit_circle(center, radius);
    let cells_added = added.len();
    log.terrain_delta.added.extend(added);
    log.push(BattleEvent::Deposit {
        position: center,
        cells_added,
    });

    for (_entity, body) in world.query_mut::<&mut PhysicsBody>() {
        if !field.overlaps_circle(body.position, body.radius) {
            continue;
        }
        let max_lift = (2.0 * radius + body.radius).ceil() as u32;
        if let Some(free) = walking::lift_out(field, body.position, body.radius, max_lift) {
            body.position = free;
            if physics::is_supported(field, free, body.radius) {
                body.settle();
            } else {
                body.settled = false;
            }
        }
    }
}

/// Apply damage to a character and report it. A lethal hit removes the
/// character's body from the world.
pub fn damage_character(
    world: &mut World,
    roster: &mut Roster,
    character: CharacterId,
    amount: u32,
    cause: Option<CharacterId>,
    log: &mut TickLog,
) -> DamageOutcome {
    let outcome = roster.damage(character, amount);
    if outcome.applied > 0 {
        log.push(BattleEvent::CharacterDamaged {
            character,
            amount: outcome.applied,
            health: outcome.health,
        });
    }
    if outcome.died {
        record_death(world, roster, character, cause, log);
    }
    outcome
}

/// Apply fall damage from hard landings, credited to whoever flung the
/// character.
pub fn apply_fall_damage(
    world: &mut World,
    roster: &mut Roster,
    landings: &[HardLanding],
    log: &mut TickLog,
) {
    for landing in landings {
        let cause = roster.get(landing.character).and_then(|c| c.last_hit_by);
        damage_character(world, roster, landing.character, landing.damage, cause, log);
    }
}

/// Bookkeeping for a character that just died: its body leaves the world and
/// the death is reported.
pub fn record_death(
    world: &mut World,
    roster: &mut Roster,
    character: CharacterId,
    cause: Option<CharacterId>,
    log: &mut TickLog,
) {
    let Some(c) = roster.get_mut(character) else {
        return;
    };
    debug_assert_eq!(c.status, CharacterStatus::Dead);
    if let Some(entity) = c.body.take() {
        let _ = world.despawn(entity);
    }
    let team = c.team;
    debug!(%character, %team, ?cause, "character died");
    log.push(BattleEvent::CharacterDied {
        character,
        team,
        caused_by: cause,
    });
    log.deaths.push(character);
}
