//! Entity spawn factories for the battle world.
//!
//! Creates character bodies, fired projectiles and cluster fragments with
//! the appropriate component bundles.

use hecs::{Entity, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use bombsite_core::config::Tuning;
use bombsite_core::enums::Facing;
use bombsite_core::types::{BodyId, CharacterId, DVec2, WeaponId};
use bombsite_core::weapons::{
    BlastSpec, Detonation, ProjectileSpec, WeaponDescriptor, WeaponEffect,
};
use bombsite_terrain::TerrainField;

use crate::components::{CharacterBody, Projectile};
use crate::physics::{self, PhysicsBody};

/// Hands out monotonically increasing body ids. Ids are never reused.
#[derive(Debug, Clone, Default)]
pub struct BodyIds {
    next: u32,
}

impl BodyIds {
    pub fn allocate(&mut self) -> BodyId {
        let id = BodyId(self.next);
        self.next += 1;
        id
    }
}

/// What a projectile is and who fired it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Munition {
    pub weapon: WeaponId,
    pub owner: Option<CharacterId>,
    pub spec: ProjectileSpec,
    pub detonation: Detonation,
    pub effect: WeaponEffect,
}

/// Spawn the physics body for a character. It starts settled when terrain
/// supports it, otherwise it falls.
pub fn spawn_character_body(
    world: &mut World,
    ids: &mut BodyIds,
    field: &TerrainField,
    tuning: &Tuning,
    character: CharacterId,
    position: DVec2,
) -> (Entity, BodyId) {
    let id = ids.allocate();
    let body = PhysicsBody {
        position,
        velocity: DVec2::ZERO,
        mass: tuning.character_mass,
        drag: 0.0,
        radius: tuning.character_radius,
        restitution: tuning.character_restitution,
        friction: tuning.character_friction,
        gravity_scale: 1.0,
        settled: physics::is_supported(field, position, tuning.character_radius),
    };
    let entity = world.spawn((id, body, CharacterBody { character }));
    (entity, id)
}

/// Unit vector for an aim angle in degrees above horizontal, mirrored by facing.
pub fn aim_direction(facing: Facing, aim_degrees: f64) -> DVec2 {
    let theta = aim_degrees.to_radians();
    DVec2::new(facing.sign() * theta.cos(), -theta.sin())
}

/// Spawn a single projectile.
pub fn spawn_projectile(
    world: &mut World,
    ids: &mut BodyIds,
    munition: &Munition,
    position: DVec2,
    velocity: DVec2,
) -> BodyId {
    let id = ids.allocate();
    let spec = &munition.spec;
    let body = PhysicsBody {
        position,
        velocity,
        mass: spec.mass,
        drag: spec.drag,
        radius: spec.radius,
        restitution: spec.restitution,
        friction: spec.friction,
        gravity_scale: spec.gravity_scale,
        settled: false,
    };
    let fuse_remaining = match munition.detonation {
        Detonation::OnImpact => None,
        Detonation::Fuse { secs } => Some(secs),
    };
    world.spawn((
        id,
        body,
        Projectile {
            weapon: munition.weapon,
            owner: munition.owner,
            detonation: munition.detonation,
            effect: munition.effect,
            fuse_remaining,
        },
    ));
    id
}

/// Fire `weapon` from a character standing at `origin`. Power is clamped to
/// [0, 1]. Multi-projectile weapons fan their shots evenly across the spread.
#[allow(clippy::too_many_arguments)]
pub fn fire_weapon(
    world: &mut World,
    ids: &mut BodyIds,
    tuning: &Tuning,
    shooter: CharacterId,
    origin: DVec2,
    facing: Facing,
    aim_degrees: f64,
    weapon: &WeaponDescriptor,
    power: f64,
) -> Vec<BodyId> {
    let munition = Munition {
        weapon: weapon.id,
        owner: Some(shooter),
        spec: weapon.projectile,
        detonation: weapon.detonation,
        effect: weapon.effect,
    };
    let speed = power.clamp(0.0, 1.0) * tuning.max_launch_speed * weapon.projectile.launch_speed_scale;
    let offset = tuning.character_radius + weapon.projectile.radius + 1.0;
    let count = weapon.projectile_count.max(1);

    (0..count)
        .map(|i| {
            let spread = if count > 1 {
                weapon.spread_degrees * (i as f64 / (count - 1) as f64 - 0.5)
            } else {
                0.0
            };
            let dir = aim_direction(facing, aim_degrees + spread);
            spawn_projectile(world, ids, &munition, origin + dir * offset, dir * speed)
        })
        .collect()
}

/// Scatter impact-fused cluster fragments upward from `center`. Directions are
/// drawn between 20 and 160 degrees above horizontal; each fragment gets a
/// random share in [0.5, 1] of `scatter_speed`.
#[allow(clippy::too_many_arguments)]
pub fn scatter_fragments(
    world: &mut World,
    ids: &mut BodyIds,
    rng: &mut ChaCha8Rng,
    center: DVec2,
    count: u32,
    scatter_speed: f64,
    fragment: ProjectileSpec,
    fragment_blast: BlastSpec,
    weapon: WeaponId,
    owner: Option<CharacterId>,
) -> Vec<BodyId> {
    let munition = Munition {
        weapon,
        owner,
        spec: fragment,
        detonation: Detonation::OnImpact,
        effect: WeaponEffect::Explosion {
            blast: fragment_blast,
        },
    };
    (0..count)
        .map(|_| {
            let angle = rng.gen_range(20.0_f64..160.0).to_radians();
            let speed = scatter_speed * rng.gen_range(0.5..=1.0);
            let dir = DVec2::new(angle.cos(), -angle.sin());
            spawn_projectile(world, ids, &munition, center, dir * speed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bombsite_core::weapons::{ids as weapon_ids, WeaponCatalogue};
    use rand::SeedableRng;

    #[test]
    fn test_body_ids_monotonic() {
        let mut ids = BodyIds::default();
        assert_eq!(ids.allocate(), BodyId(0));
        assert_eq!(ids.allocate(), BodyId(1));
        assert_eq!(ids.allocate(), BodyId(2));
    }

    #[test]
    fn test_aim_direction() {
        let right = aim_direction(Facing::Right, 0.0);
        assert!((right - DVec2::new(1.0, 0.0)).length() < 1e-12);
        let up_left = aim_direction(Facing::Left, 90.0);
        assert!((up_left - DVec2::new(0.0, -1.0)).length() < 1e-12);
        let diag = aim_direction(Facing::Left, 45.0);
        assert!(diag.x < 0.0 && diag.y < 0.0);
    }

    #[test]
    fn test_character_body_settles_when_supported() {
        let field = TerrainField::from_heightfield(50, 50, &[30; 50]).unwrap();
        let tuning = Tuning::default();
        let mut world = World::new();
        let mut ids = BodyIds::default();
        let (standing, _) = spawn_character_body(
            &mut world,
            &mut ids,
            &field,
            &tuning,
            CharacterId(0),
            DVec2::new(10.0, 30.0 - tuning.character_radius - 0.1),
        );
        let (hovering, _) = spawn_character_body(
            &mut world,
            &mut ids,
            &field,
            &tuning,
            CharacterId(1),
            DVec2::new(20.0, 5.0),
        );
        assert!(world.get::<&PhysicsBody>(standing).unwrap().settled);
        assert!(!world.get::<&PhysicsBody>(hovering).unwrap().settled);
    }

    #[test]
    fn test_fire_weapon_spawns_outside_shooter() {
        let catalogue = WeaponCatalogue::default();
        let rocket = catalogue.get(weapon_ids::ROCKET).unwrap();
        let tuning = Tuning::default();
        let mut world = World::new();
        let mut ids = BodyIds::default();
        let origin = DVec2::new(100.0, 100.0);
        let bodies = fire_weapon(
            &mut world,
            &mut ids,
            &tuning,
            CharacterId(0),
            origin,
            Facing::Right,
            45.0,
            rocket,
            0.5,
        );
        assert_eq!(bodies.len(), 1);
        let mut q = world.query::<(&PhysicsBody, &Projectile)>();
        let (_, (body, projectile)) = q.iter().next().unwrap();
        assert!(body.position.distance(origin) > tuning.character_radius + body.radius);
        assert!((body.velocity.length() - 500.0).abs() < 1e-9);
        assert!(body.velocity.x > 0.0 && body.velocity.y < 0.0);
        assert_eq!(projectile.owner, Some(CharacterId(0)));
        assert_eq!(projectile.fuse_remaining, None);
    }

    #[test]
    fn test_multi_projectile_spread() {
        let mut weapon = WeaponCatalogue::default()
            .get(weapon_ids::RIFLE)
            .unwrap()
            .clone();
        weapon.projectile_count = 3;
        weapon.spread_degrees = 20.0;
        let mut world = World::new();
        let mut ids = BodyIds::default();
        let bodies = fire_weapon(
            &mut world,
            &mut ids,
            &Tuning::default(),
            CharacterId(0),
            DVec2::new(50.0, 50.0),
            Facing::Right,
            30.0,
            &weapon,
            1.0,
        );
        assert_eq!(bodies, vec![BodyId(0), BodyId(1), BodyId(2)]);
        let mut angles: Vec<f64> = world
            .query::<&PhysicsBody>()
            .iter()
            .map(|(_, b)| (-b.velocity.y).atan2(b.velocity.x).to_degrees())
            .collect();
        angles.sort_by(f64::total_cmp);
        assert!((angles[0] - 20.0).abs() < 1e-9);
        assert!((angles[1] - 30.0).abs() < 1e-9);
        assert!((angles[2] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_fragments_are_seeded() {
        let spread = |seed: u64| {
            let mut world = World::new();
            let mut ids = BodyIds::default();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            scatter_fragments(
                &mut world,
                &mut ids,
                &mut rng,
                DVec2::new(10.0, 10.0),
                4,
                200.0,
                ProjectileSpec::default(),
                BlastSpec::uniform(10.0, 10, 0.0),
                WeaponId(2),
                None,
            );
            let mut v: Vec<(BodyId, DVec2)> = world
                .query::<(&BodyId, &PhysicsBody)>()
                .iter()
                .map(|(_, (id, b))| (*id, b.velocity))
                .collect();
            v.sort_by_key(|(id, _)| *id);
            v
        };
        let a = spread(5);
        assert_eq!(a, spread(5));
        assert_ne!(a, spread(6));
        for (_, v) in &a {
            assert!(v.y < 0.0, "fragment launched downward: {v}");
            assert!(v.length() >= 100.0 - 1e-9 && v.length() <= 200.0 + 1e-9);
        }
    }
}
