//! Collision resolver.
//!
//! Turns the movement system's paths into contacts (terrain contacts from the
//! physics step, and projectile-vs-character contacts from a swept circle
//! test), then classifies each one: impact-fused projectiles detonate, fused
//! projectiles bounce, characters bounce or land and take fall damage.

use hecs::{Entity, World};
use tracing::debug;

use bombsite_core::config::Tuning;
use bombsite_core::events::BattleEvent;
use bombsite_core::types::{BodyId, CharacterId, DVec2, WeaponId};
use bombsite_core::weapons::{Detonation, WeaponEffect};

use crate::components::{CharacterBody, Projectile};
use crate::physics::{self, PhysicsBody};
use crate::systems::movement::BodyStep;
use crate::systems::TickLog;

/// What a body touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactKind {
    Terrain {
        normal: DVec2,
    },
    Character {
        body: BodyId,
        character: CharacterId,
        /// Points from the character's centre towards the projectile.
        normal: DVec2,
    },
}

/// A single contact found this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub entity: Entity,
    pub body: BodyId,
    pub position: DVec2,
    pub incoming_velocity: DVec2,
    /// Fraction of the tick elapsed at contact.
    pub time: f64,
    pub kind: ContactKind,
}

impl Contact {
    fn normal(&self) -> DVec2 {
        match self.kind {
            ContactKind::Terrain { normal } | ContactKind::Character { normal, .. } => normal,
        }
    }
}

/// A projectile that has to go off this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingDetonation {
    pub entity: Entity,
    pub body: BodyId,
    pub position: DVec2,
    /// Character hit directly, if any.
    pub struck: Option<CharacterId>,
    pub owner: Option<CharacterId>,
    pub weapon: WeaponId,
    pub effect: WeaponEffect,
}

/// A character that landed hard enough to get hurt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardLanding {
    pub character: CharacterId,
    pub damage: u32,
}

#[derive(Debug, Default)]
pub struct CollisionOutcome {
    pub detonations: Vec<PendingDetonation>,
    pub landings: Vec<HardLanding>,
}

struct Target {
    body: BodyId,
    character: CharacterId,
    position: DVec2,
    radius: f64,
}

/// Earliest time in [0, 1] at which a point moving `start → end` comes within
/// `reach` of `center`. Already inside counts as time 0.
pub fn sweep_circle(start: DVec2, end: DVec2, center: DVec2, reach: f64) -> Option<f64> {
    let f = start - center;
    let c = f.length_squared() - reach * reach;
    if c <= 0.0 {
        return Some(0.0);
    }
    let d = end - start;
    let a = d.length_squared();
    if a <= f64::EPSILON {
        return None;
    }
    let b = 2.0 * f.dot(d);
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Collect the first contact of every moving body, ordered by body id and
/// then contact time.
pub fn detect(world: &World, steps: &[BodyStep]) -> Vec<Contact> {
    let targets: Vec<Target> = world
        .query::<(&BodyId, &PhysicsBody, &CharacterBody)>()
        .iter()
        .map(|(_, (id, body, link))| Target {
            body: *id,
            character: link.character,
            position: body.position,
            radius: body.radius,
        })
        .collect();

    let mut contacts = Vec::new();
    for step in steps {
        let terrain = step.contact.map(|c| Contact {
            entity: step.entity,
            body: step.body,
            position: c.position,
            incoming_velocity: c.incoming_velocity,
            time: c.time,
            kind: ContactKind::Terrain { normal: c.normal },
        });

        let Ok(projectile) = world.get::<&Projectile>(step.entity).map(|p| *p) else {
            contacts.extend(terrain);
            continue;
        };
        let Ok((radius, velocity)) = world
            .get::<&PhysicsBody>(step.entity)
            .map(|b| (b.radius, b.velocity))
        else {
            continue;
        };
        let (path_end, span) = terrain.map_or((step.end, 1.0), |t| (t.position, t.time));

        let mut hit: Option<Contact> = None;
        for target in &targets {
            let reach = radius + target.radius;
            let Some(t) = sweep_circle(step.start, path_end, target.position, reach) else {
                continue;
            };
            // A shot never strikes its shooter at the muzzle.
            if t == 0.0 && projectile.owner == Some(target.character) {
                continue;
            }
            let time = t * span;
            if hit.is_some_and(|h| h.time <= time) {
                continue;
            }
            let position = step.start.lerp(path_end, t);
            let normal = (position - target.position)
                .try_normalize()
                .unwrap_or(DVec2::new(0.0, -1.0));
            hit = Some(Contact {
                entity: step.entity,
                body: step.body,
                position,
                incoming_velocity: velocity,
                time,
                kind: ContactKind::Character {
                    body: target.body,
                    character: target.character,
                    normal,
                },
            });
        }

        match (hit, terrain) {
            (Some(h), Some(t)) if t.time < h.time => contacts.push(t),
            (Some(h), _) => contacts.push(h),
            (None, t) => contacts.extend(t),
        }
    }

    contacts.sort_by(|a, b| a.body.cmp(&b.body).then(a.time.total_cmp(&b.time)));
    contacts
}

/// Classify and apply contacts. Emits an impact event per contact and
/// returns the detonations and hard landings for the damage engine.
pub fn resolve(
    world: &mut World,
    contacts: &[Contact],
    tuning: &Tuning,
    log: &mut TickLog,
) -> CollisionOutcome {
    let mut outcome = CollisionOutcome::default();
    let mut handled: Vec<BodyId> = Vec::new();

    for contact in contacts {
        if handled.contains(&contact.body) {
            continue;
        }
        handled.push(contact.body);

        log.push(match contact.kind {
            ContactKind::Terrain { .. } => BattleEvent::TerrainImpact {
                body: contact.body,
                position: contact.position,
                incoming_velocity: contact.incoming_velocity,
            },
            ContactKind::Character { body, .. } => BattleEvent::BodyImpact {
                a: contact.body,
                b: body,
                position: contact.position,
            },
        });

        let projectile = world.get::<&Projectile>(contact.entity).map(|p| *p).ok();
        let character = world.get::<&CharacterBody>(contact.entity).map(|c| c.character).ok();
        let Ok(mut body) = world.get::<&mut PhysicsBody>(contact.entity) else {
            continue;
        };
        body.position = contact.position;
        body.velocity = contact.incoming_velocity;

        if let Some(projectile) = projectile {
            match projectile.detonation {
                Detonation::OnImpact => outcome.detonations.push(PendingDetonation {
                    entity: contact.entity,
                    body: contact.body,
                    position: contact.position,
                    struck: match contact.kind {
                        ContactKind::Character { character, .. } => Some(character),
                        ContactKind::Terrain { .. } => None,
                    },
                    owner: projectile.owner,
                    weapon: projectile.weapon,
                    effect: projectile.effect,
                }),
                Detonation::Fuse { .. } => {
                    bounce_or_settle(&mut body, contact, tuning.settle_speed);
                }
            }
        } else if let Some(character) = character {
            let speed = contact.incoming_velocity.length();
            if matches!(contact.kind, ContactKind::Terrain { .. })
                && speed > tuning.fall_damage_threshold
            {
                let damage = (tuning.fall_damage_factor * speed).round() as u32;
                debug!(%character, speed, damage, "hard landing");
                outcome.landings.push(HardLanding { character, damage });
            }
            bounce_or_settle(&mut body, contact, tuning.settle_speed);
        }
    }

    outcome
}

/// Bounce a body off its contact surface, or bring it to rest when it is
/// slow and the surface is a floor.
fn bounce_or_settle(body: &mut PhysicsBody, contact: &Contact, settle_speed: f64) {
    let normal = contact.normal();
    let bounced = physics::bounce(body.velocity, normal, body.restitution, body.friction);
    let on_floor = matches!(contact.kind, ContactKind::Terrain { .. }) && physics::is_floor(normal);
    if on_floor && bounced.length() < settle_speed {
        body.settle();
    } else {
        body.velocity = bounced;
    }
}

/// Burn down fuses. Returns the fused projectiles whose time ran out, in
/// ascending body id.
pub fn tick_fuses(world: &mut World, dt: f64) -> Vec<PendingDetonation> {
    let mut expired = Vec::new();
    for (entity, (id, body, projectile)) in
        world.query_mut::<(&BodyId, &PhysicsBody, &mut Projectile)>()
    {
        let Some(fuse) = projectile.fuse_remaining.as_mut() else {
            continue;
        };
        let before = *fuse;
        *fuse = (before - dt).max(0.0);
        if before > 0.0 && *fuse <= 0.0 {
            expired.push(PendingDetonation {
                entity,
                body: *id,
                position: body.position,
                struck: None,
                owner: projectile.owner,
                weapon: projectile.weapon,
                effect: projectile.effect,
            });
        }
    }
    expired.sort_by_key(|d| d.body);
    expired
}
