//! ECS components attached to physics body entities.
//!
//! Every body entity carries a `BodyId` and a `PhysicsBody`, plus exactly one
//! of `Projectile` or `CharacterBody`.

use bombsite_core::types::{CharacterId, WeaponId};
use bombsite_core::weapons::{Detonation, WeaponEffect};

/// A free projectile fired by a weapon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub weapon: WeaponId,
    /// Character that fired it; credited with any damage it causes.
    pub owner: Option<CharacterId>,
    pub detonation: Detonation,
    pub effect: WeaponEffect,
    /// Seconds left on the fuse, for fused projectiles.
    pub fuse_remaining: Option<f64>,
}

/// Links a body to its character in the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterBody {
    pub character: CharacterId,
}
