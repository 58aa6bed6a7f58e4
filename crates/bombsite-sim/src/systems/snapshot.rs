//! Snapshot system: queries the world and roster and builds state exports.
//!
//! This system is read-only. Every list is ordered by id.

use hecs::World;

use bombsite_core::enums::BattleOutcome;
use bombsite_core::state::*;
use bombsite_core::types::{BodyId, DVec2, SimTime};
use bombsite_terrain::TerrainField;

use crate::components::Projectile;
use crate::physics::PhysicsBody;
use crate::roster::{Character, Roster};

/// Build a complete BattleSnapshot from the current battle state.
pub fn build_snapshot(
    world: &World,
    roster: &Roster,
    field: &TerrainField,
    time: SimTime,
    turn: TurnState,
    outcome: Option<BattleOutcome>,
) -> BattleSnapshot {
    BattleSnapshot {
        time,
        terrain: field.to_rows(),
        teams: build_teams(roster),
        characters: build_characters(world, roster),
        bodies: build_bodies(world),
        turn,
        outcome,
    }
}

/// View of one character. Dead characters keep their last known position.
pub fn character_view(world: &World, character: &Character) -> CharacterView {
    let body = character
        .body
        .and_then(|entity| world.get::<&PhysicsBody>(entity).ok().map(|b| *b));
    let (position, velocity, grounded) = match body {
        Some(b) => (b.position, b.velocity, b.settled),
        None => (character.last_position, DVec2::ZERO, false),
    };
    CharacterView {
        id: character.id,
        team: character.team,
        name: character.name.clone(),
        health: character.health,
        status: character.status,
        position,
        velocity,
        facing: character.facing,
        aim_degrees: character.aim_degrees,
        weapon: character.weapon,
        grounded,
    }
}

pub fn build_characters(world: &World, roster: &Roster) -> Vec<CharacterView> {
    roster
        .characters()
        .map(|c| character_view(world, c))
        .collect()
}

/// Projectiles currently in the world.
pub fn build_bodies(world: &World) -> Vec<BodyView> {
    let mut bodies: Vec<BodyView> = world
        .query::<(&BodyId, &PhysicsBody, &Projectile)>()
        .iter()
        .map(|(_, (id, body, projectile))| BodyView {
            id: *id,
            weapon: projectile.weapon,
            position: body.position,
            velocity: body.velocity,
            radius: body.radius,
            fuse_remaining: projectile.fuse_remaining,
        })
        .collect();
    bodies.sort_by_key(|b| b.id);
    bodies
}

pub fn build_teams(roster: &Roster) -> Vec<TeamView> {
    roster
        .teams()
        .map(|t| TeamView {
            id: t.id,
            name: t.name.clone(),
            members: t.members.clone(),
            alive: roster.alive_count_for(t.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bombsite_core::config::Tuning;
    use bombsite_core::types::{CharacterId, TeamId, WeaponId};
    use bombsite_core::weapons::WeaponCatalogue;

    use crate::world_setup::{fire_weapon, spawn_character_body, BodyIds};

    #[test]
    fn test_views_follow_bodies_and_ids() {
        let field = TerrainField::from_heightfield(200, 100, &[80; 200]).unwrap();
        let tuning = Tuning::default();
        let mut world = World::new();
        let mut ids = BodyIds::default();
        let mut roster = Roster::new();
        let team = roster.add_team("Red");
        let spawn = DVec2::new(40.0, 80.0 - tuning.character_radius - 0.1);
        let a = roster.spawn(team, "a", 100, WeaponId(0), 30.0, spawn).unwrap();
        let b = roster.spawn(team, "b", 100, WeaponId(0), 30.0, DVec2::ZERO).unwrap();
        let (entity, _) = spawn_character_body(&mut world, &mut ids, &field, &tuning, a, spawn);
        roster.get_mut(a).unwrap().body = Some(entity);

        let catalogue = WeaponCatalogue::default();
        let weapon = catalogue.iter().next().unwrap();
        for _ in 0..2 {
            fire_weapon(
                &mut world,
                &mut ids,
                &tuning,
                a,
                spawn,
                Default::default(),
                45.0,
                weapon,
                0.5,
            );
        }

        let characters = build_characters(&world, &roster);
        assert_eq!(characters.len(), 2);
        assert_eq!(characters[0].id, a);
        assert!(characters[0].grounded);
        assert_eq!(characters[0].position, spawn);
        assert_eq!(characters[1].id, b);
        assert!(!characters[1].grounded);

        let bodies = build_bodies(&world);
        assert_eq!(bodies.len(), 2);
        assert!(bodies[0].id < bodies[1].id);

        let teams = build_teams(&roster);
        assert_eq!(teams[0].id, TeamId(0));
        assert_eq!(teams[0].members, vec![CharacterId(0), CharacterId(1)]);
        assert_eq!(teams[0].alive, 2);
    }
}
