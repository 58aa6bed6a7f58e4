//! Weapon descriptors and the catalogue that maps ids to them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::WeaponId;

/// Physical properties of a fired projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    /// Collision radius (cells).
    pub radius: f64,
    pub mass: f64,
    /// Drag coefficient fed into the configured drag model.
    pub drag: f64,
    /// Multiplier on world gravity.
    pub gravity_scale: f64,
    /// Fraction of normal speed kept on a bounce.
    pub restitution: f64,
    /// Fraction of tangential speed kept on a bounce.
    pub friction: f64,
    /// Multiplier on the launch speed derived from fire power.
    pub launch_speed_scale: f64,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            radius: 2.0,
            mass: 1.0,
            drag: 0.0,
            gravity_scale: 1.0,
            restitution: 0.0,
            friction: 1.0,
            launch_speed_scale: 1.0,
        }
    }
}

/// When a projectile goes off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Detonation {
    /// On first contact with terrain or a character.
    OnImpact,
    /// After a fixed time, bouncing until then.
    Fuse { secs: f64 },
}

/// Parameters of an area explosion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlastSpec {
    /// Radius of terrain removed (cells).
    pub carve_radius: f64,
    /// Radius within which characters take damage (cells).
    pub damage_radius: f64,
    /// Damage at the centre of the blast.
    pub max_damage: u32,
    /// Knockback speed imparted at the centre (cells/s).
    pub knockback: f64,
}

impl BlastSpec {
    /// A blast whose carve and damage radii coincide.
    pub fn uniform(radius: f64, max_damage: u32, knockback: f64) -> Self {
        Self {
            carve_radius: radius,
            damage_radius: radius,
            max_damage,
            knockback,
        }
    }
}

/// What happens when a projectile detonates. Each variant carries only its own data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WeaponEffect {
    /// Full damage to the character struck; a small crater if it hits terrain.
    DirectHit { damage: u32, crater_radius: f64 },
    /// Single area explosion.
    Explosion { blast: BlastSpec },
    /// Area explosion followed by impact-fused fragments scattered upward.
    Cluster {
        blast: BlastSpec,
        fragments: u32,
        /// Fragment launch speed (cells/s); each fragment gets a random share in [0.5, 1].
        scatter_speed: f64,
        fragment: ProjectileSpec,
        fragment_blast: BlastSpec,
    },
    /// Adds solid terrain in a disc.
    Deposit { radius: f64 },
}

/// Immutable weapon definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDescriptor {
    pub id: WeaponId,
    pub name: String,
    pub projectile: ProjectileSpec,
    pub detonation: Detonation,
    pub effect: WeaponEffect,
    /// Projectiles per shot.
    #[serde(default = "one")]
    pub projectile_count: u32,
    /// Total angular spread across all projectiles of one shot (degrees).
    #[serde(default)]
    pub spread_degrees: f64,
}

fn one() -> u32 {
    1
}

/// Weapon ids of the default catalogue.
pub mod ids {
    use crate::types::WeaponId;

    pub const ROCKET: WeaponId = WeaponId(0);
    pub const GRENADE: WeaponId = WeaponId(1);
    pub const CLUSTER_BOMB: WeaponId = WeaponId(2);
    pub const RIFLE: WeaponId = WeaponId(3);
    pub const BUILDER: WeaponId = WeaponId(4);
}

/// Maps weapon ids to descriptors. Iteration order is by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WeaponDescriptor>", into = "Vec<WeaponDescriptor>")]
pub struct WeaponCatalogue {
    weapons: BTreeMap<WeaponId, WeaponDescriptor>,
}

impl WeaponCatalogue {
    /// Build a catalogue, rejecting duplicate ids and nonsensical numbers.
    pub fn new(weapons: Vec<WeaponDescriptor>) -> Result<Self, ConfigError> {
        if weapons.is_empty() {
            return Err(ConfigError::EmptyCatalogue);
        }
        let mut map = BTreeMap::new();
        for w in weapons {
            validate_weapon(&w)?;
            let id = w.id;
            if map.insert(id, w).is_some() {
                return Err(ConfigError::DuplicateWeapon(id));
            }
        }
        Ok(Self { weapons: map })
    }

    /// Parse a JSON array of weapon descriptors.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let list: Vec<WeaponDescriptor> = serde_json::from_str(json)?;
        Self::new(list)
    }

    pub fn get(&self, id: WeaponId) -> Option<&WeaponDescriptor> {
        self.weapons.get(&id)
    }

    pub fn contains(&self, id: WeaponId) -> bool {
        self.weapons.contains_key(&id)
    }

    /// Lowest weapon id; what characters start with.
    pub fn first_id(&self) -> Option<WeaponId> {
        self.weapons.keys().next().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeaponDescriptor> {
        self.weapons.values()
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }
}

impl TryFrom<Vec<WeaponDescriptor>> for WeaponCatalogue {
    type Error = ConfigError;

    fn try_from(list: Vec<WeaponDescriptor>) -> Result<Self, Self::Error> {
        Self::new(list)
    }
}

impl From<WeaponCatalogue> for Vec<WeaponDescriptor> {
    fn from(catalogue: WeaponCatalogue) -> Self {
        catalogue.weapons.into_values().collect()
    }
}

impl Default for WeaponCatalogue {
    fn default() -> Self {
        let rocket = ProjectileSpec {
            radius: 2.0,
            drag: 0.0001,
            ..ProjectileSpec::default()
        };
        let grenade = ProjectileSpec {
            radius: 2.5,
            drag: 0.0002,
            restitution: 0.6,
            friction: 0.9,
            launch_speed_scale: 0.8,
            ..ProjectileSpec::default()
        };
        let fragment = ProjectileSpec {
            radius: 1.5,
            ..ProjectileSpec::default()
        };
        let bullet = ProjectileSpec {
            radius: 1.0,
            gravity_scale: 0.2,
            launch_speed_scale: 2.0,
            ..ProjectileSpec::default()
        };

        let weapons = vec![
            WeaponDescriptor {
                id: ids::ROCKET,
                name: "Rocket Launcher".into(),
                projectile: rocket,
                detonation: Detonation::OnImpact,
                effect: WeaponEffect::Explosion {
                    blast: BlastSpec::uniform(40.0, 50, 300.0),
                },
                projectile_count: 1,
                spread_degrees: 0.0,
            },
            WeaponDescriptor {
                id: ids::GRENADE,
                name: "Grenade".into(),
                projectile: grenade,
                detonation: Detonation::Fuse { secs: 3.0 },
                effect: WeaponEffect::Explosion {
                    blast: BlastSpec::uniform(35.0, 45, 280.0),
                },
                projectile_count: 1,
                spread_degrees: 0.0,
            },
            WeaponDescriptor {
                id: ids::CLUSTER_BOMB,
                name: "Cluster Bomb".into(),
                projectile: grenade,
                detonation: Detonation::Fuse { secs: 3.0 },
                effect: WeaponEffect::Cluster {
                    blast: BlastSpec::uniform(25.0, 25, 200.0),
                    fragments: 5,
                    scatter_speed: 250.0,
                    fragment,
                    fragment_blast: BlastSpec::uniform(15.0, 15, 120.0),
                },
                projectile_count: 1,
                spread_degrees: 0.0,
            },
            WeaponDescriptor {
                id: ids::RIFLE,
                name: "Rifle".into(),
                projectile: bullet,
                detonation: Detonation::OnImpact,
                effect: WeaponEffect::DirectHit {
                    damage: 30,
                    crater_radius: 3.0,
                },
                projectile_count: 1,
                spread_degrees: 0.0,
            },
            WeaponDescriptor {
                id: ids::BUILDER,
                name: "Builder".into(),
                projectile: ProjectileSpec {
                    launch_speed_scale: 0.6,
                    ..ProjectileSpec::default()
                },
                detonation: Detonation::OnImpact,
                effect: WeaponEffect::Deposit { radius: 12.0 },
                projectile_count: 1,
                spread_degrees: 0.0,
            },
        ];

        Self {
            weapons: weapons.into_iter().map(|w| (w.id, w)).collect(),
        }
    }
}

fn validate_weapon(w: &WeaponDescriptor) -> Result<(), ConfigError> {
    let bad = |field: &'static str| ConfigError::InvalidWeapon { id: w.id, field };
    validate_projectile(&w.projectile).map_err(bad)?;
    if w.projectile_count == 0 {
        return Err(bad("projectile_count"));
    }
    if !w.spread_degrees.is_finite() || w.spread_degrees < 0.0 {
        return Err(bad("spread_degrees"));
    }
    if let Detonation::Fuse { secs } = w.detonation {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(bad("detonation.secs"));
        }
    }
    match w.effect {
        WeaponEffect::DirectHit { crater_radius, .. } => {
            if !crater_radius.is_finite() || crater_radius < 0.0 {
                return Err(bad("effect.crater_radius"));
            }
        }
        WeaponEffect::Explosion { blast } => validate_blast(&blast).map_err(bad)?,
        WeaponEffect::Cluster {
            blast,
            scatter_speed,
            fragment,
            fragment_blast,
            ..
        } => {
            validate_blast(&blast).map_err(bad)?;
            validate_blast(&fragment_blast).map_err(bad)?;
            validate_projectile(&fragment).map_err(bad)?;
            if !scatter_speed.is_finite() || scatter_speed < 0.0 {
                return Err(bad("effect.scatter_speed"));
            }
        }
        WeaponEffect::Deposit { radius } => {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(bad("effect.radius"));
            }
        }
    }
    Ok(())
}

fn validate_projectile(p: &ProjectileSpec) -> Result<(), &'static str> {
    if !(p.radius.is_finite() && p.radius > 0.0) {
        return Err("projectile.radius");
    }
    if !(p.mass.is_finite() && p.mass > 0.0) {
        return Err("projectile.mass");
    }
    if !(p.drag.is_finite() && p.drag >= 0.0) {
        return Err("projectile.drag");
    }
    if !p.gravity_scale.is_finite() {
        return Err("projectile.gravity_scale");
    }
    if !(0.0..=1.0).contains(&p.restitution) {
        return Err("projectile.restitution");
    }
    if !(0.0..=1.0).contains(&p.friction) {
        return Err("projectile.friction");
    }
    if !(p.launch_speed_scale.is_finite() && p.launch_speed_scale > 0.0) {
        return Err("projectile.launch_speed_scale");
    }
    Ok(())
}

fn validate_blast(b: &BlastSpec) -> Result<(), &'static str> {
    if !(b.carve_radius.is_finite() && b.carve_radius >= 0.0) {
        return Err("blast.carve_radius");
    }
    if !(b.damage_radius.is_finite() && b.damage_radius >= 0.0) {
        return Err("blast.damage_radius");
    }
    if !(b.knockback.is_finite() && b.knockback >= 0.0) {
        return Err("blast.knockback");
    }
    Ok(())
}
