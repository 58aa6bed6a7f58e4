//! Character and team roster.
//!
//! Stored in `BattleEngine` as an arena indexed by `CharacterId`, NOT as ECS
//! entities. Each character links to its physics body entity while alive.

use bombsite_core::enums::{CharacterStatus, Facing};
use bombsite_core::types::{CharacterId, DVec2, TeamId, WeaponId};

/// A controllable combatant.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub id: CharacterId,
    pub team: TeamId,
    pub name: String,
    pub health: u32,
    pub max_health: u32,
    pub status: CharacterStatus,
    pub facing: Facing,
    /// Degrees above horizontal in the facing direction.
    pub aim_degrees: f64,
    pub weapon: WeaponId,
    /// Body entity while alive. Removed on death.
    pub body: Option<hecs::Entity>,
    /// Last known body position; kept after the body is removed.
    pub last_position: DVec2,
    /// Character whose weapon last flung this one, until it settles.
    pub last_hit_by: Option<CharacterId>,
}

impl Character {
    pub fn is_alive(&self) -> bool {
        self.status != CharacterStatus::Dead
    }
}

/// A team and its members in turn order.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub members: Vec<CharacterId>,
    /// Index into `members` of the character that acted last.
    cursor: Option<usize>,
}

/// Result of applying damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Health actually removed.
    pub applied: u32,
    pub health: u32,
    /// This damage took the character from alive to dead.
    pub died: bool,
}

/// Arena of characters and teams.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    characters: Vec<Character>,
    teams: Vec<Team>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_team(&mut self, name: impl Into<String>) -> TeamId {
        let id = TeamId(self.teams.len() as u32);
        self.teams.push(Team {
            id,
            name: name.into(),
            members: Vec::new(),
            cursor: None,
        });
        id
    }

    /// Add a character to `team` at full health. Returns `None` for an unknown team.
    pub fn spawn(
        &mut self,
        team: TeamId,
        name: impl Into<String>,
        max_health: u32,
        weapon: WeaponId,
        aim_degrees: f64,
        position: DVec2,
    ) -> Option<CharacterId> {
        let id = CharacterId(self.characters.len() as u32);
        let team_entry = self.teams.get_mut(team.0 as usize)?;
        team_entry.members.push(id);
        self.characters.push(Character {
            id,
            team,
            name: name.into(),
            health: max_health,
            max_health,
            status: CharacterStatus::Active,
            facing: Facing::default(),
            aim_degrees,
            weapon,
            body: None,
            last_position: position,
            last_hit_by: None,
        });
        Some(id)
    }

    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(id.0 as usize)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(id.0 as usize)
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter()
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn is_alive(&self, id: CharacterId) -> bool {
        self.get(id).is_some_and(Character::is_alive)
    }

    pub fn alive_count_for(&self, team: TeamId) -> u32 {
        self.team(team).map_or(0, |t| {
            t.members.iter().filter(|&&m| self.is_alive(m)).count() as u32
        })
    }

    /// Teams with at least one living member, in turn order.
    pub fn alive_teams(&self) -> Vec<TeamId> {
        self.teams
            .iter()
            .filter(|t| self.alive_count_for(t.id) > 0)
            .map(|t| t.id)
            .collect()
    }

    /// Remove up to `amount` health. Reaching zero kills. Damage to the dead is
    /// ignored.
    pub fn damage(&mut self, id: CharacterId, amount: u32) -> DamageOutcome {
        let Some(c) = self.get_mut(id) else {
            return DamageOutcome {
                applied: 0,
                health: 0,
                died: false,
            };
        };
        if !c.is_alive() {
            return DamageOutcome {
                applied: 0,
                health: 0,
                died: false,
            };
        }
        let applied = amount.min(c.health);
        c.health -= applied;
        let died = c.health == 0;
        if died {
            c.status = CharacterStatus::Dead;
        }
        debug_assert!(c.health <= c.max_health);
        DamageOutcome {
            applied,
            health: c.health,
            died,
        }
    }

    /// Kill outright (left the world). Returns whether the character was alive.
    pub fn kill(&mut self, id: CharacterId) -> bool {
        match self.get_mut(id) {
            Some(c) if c.is_alive() => {
                c.health = 0;
                c.status = CharacterStatus::Dead;
                true
            }
            _ => false,
        }
    }

    /// Next living member of `team` after the one that acted last, advancing
    /// the team's cursor.
    pub fn next_member(&mut self, team: TeamId) -> Option<CharacterId> {
        let idx = team.0 as usize;
        let team_entry = self.teams.get(idx)?;
        let len = team_entry.members.len();
        let start = team_entry.cursor.map_or(0, |c| c + 1);
        let pick = (0..len)
            .map(|k| (start + k) % len)
            .find(|&i| self.is_alive(team_entry.members[i]))?;
        let team_entry = &mut self.teams[idx];
        team_entry.cursor = Some(pick);
        Some(team_entry.members[pick])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_teams() -> (Roster, Vec<CharacterId>) {
        let mut roster = Roster::new();
        let a = roster.add_team("A");
        let b = roster.add_team("B");
        let mut ids = Vec::new();
        for (team, name) in [(a, "a1"), (b, "b1"), (a, "a2"), (b, "b2")] {
            ids.push(
                roster
                    .spawn(team, name, 100, WeaponId(0), 30.0, DVec2::ZERO)
                    .unwrap(),
            );
        }
        (roster, ids)
    }

    #[test]
    fn test_spawn_assigns_sequential_ids() {
        let (roster, ids) = two_teams();
        assert_eq!(ids, vec![CharacterId(0), CharacterId(1), CharacterId(2), CharacterId(3)]);
        assert_eq!(roster.team(TeamId(0)).unwrap().members, vec![ids[0], ids[2]]);
        assert_eq!(roster.alive_count_for(TeamId(1)), 2);
    }

    #[test]
    fn test_spawn_unknown_team() {
        let mut roster = Roster::new();
        assert!(roster
            .spawn(TeamId(3), "x", 100, WeaponId(0), 0.0, DVec2::ZERO)
            .is_none());
    }

    #[test]
    fn test_damage_clamps_and_kills() {
        let (mut roster, ids) = two_teams();
        let out = roster.damage(ids[0], 30);
        assert_eq!(out, DamageOutcome { applied: 30, health: 70, died: false });

        let out = roster.damage(ids[0], 500);
        assert_eq!(out, DamageOutcome { applied: 70, health: 0, died: true });
        assert!(!roster.is_alive(ids[0]));
        assert_eq!(roster.get(ids[0]).unwrap().status, CharacterStatus::Dead);

        // The dead stay dead and stay in the roster.
        let out = roster.damage(ids[0], 10);
        assert_eq!(out.applied, 0);
        assert!(!out.died);
        assert_eq!(roster.characters().count(), 4);
    }

    #[test]
    fn test_exact_lethal_damage() {
        let (mut roster, ids) = two_teams();
        let out = roster.damage(ids[1], 100);
        assert!(out.died);
        assert_eq!(out.health, 0);
    }

    #[test]
    fn test_kill_only_once() {
        let (mut roster, ids) = two_teams();
        assert!(roster.kill(ids[3]));
        assert!(!roster.kill(ids[3]));
        assert_eq!(roster.alive_count_for(TeamId(1)), 1);
    }

    #[test]
    fn test_alive_teams() {
        let (mut roster, ids) = two_teams();
        assert_eq!(roster.alive_teams(), vec![TeamId(0), TeamId(1)]);
        roster.kill(ids[1]);
        roster.kill(ids[3]);
        assert_eq!(roster.alive_teams(), vec![TeamId(0)]);
    }

    #[test]
    fn test_next_member_round_robin_skips_dead() {
        let mut roster = Roster::new();
        let t = roster.add_team("T");
        let ids: Vec<_> = (0..3)
            .map(|i| {
                roster
                    .spawn(t, format!("m{i}"), 100, WeaponId(0), 0.0, DVec2::ZERO)
                    .unwrap()
            })
            .collect();
        assert_eq!(roster.next_member(t), Some(ids[0]));
        assert_eq!(roster.next_member(t), Some(ids[1]));
        roster.kill(ids[2]);
        assert_eq!(roster.next_member(t), Some(ids[0]));
        roster.kill(ids[0]);
        roster.kill(ids[1]);
        assert_eq!(roster.next_member(t), None);
    }
}
