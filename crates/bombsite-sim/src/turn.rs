//! Turn state machine.
//!
//! An explicit phase plus a transition table driven by discrete events. The
//! machine knows nothing about physics: the engine observes the world and
//! feeds it events.
//!
//! ```text
//! AwaitingInput --WeaponFired--------------> ActionInFlight
//! AwaitingInput --TimerExpired-------------> Resolving
//! AwaitingInput --ActiveCharacterDied------> Resolving
//! ActionInFlight --AllBodiesSettled--------> Resolving
//! ActionInFlight --FlightTimedOut----------> Resolving
//! Resolving --NextTurn---------------------> AwaitingInput
//! Resolving --BattleOver-------------------> Ended
//! ```

use bombsite_core::enums::TurnPhase;
use bombsite_core::state::TurnState;
use bombsite_core::types::{CharacterId, TeamId};

use crate::roster::Roster;

/// Inputs to the turn machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    WeaponFired,
    TimerExpired,
    ActiveCharacterDied,
    AllBodiesSettled,
    FlightTimedOut,
    /// Resolution finished and this character acts next.
    NextTurn { team: TeamId, character: CharacterId },
    /// Resolution finished with at most one team standing.
    BattleOver,
}

/// The transition table. `None` means the event does not apply in `phase`.
pub fn next_phase(phase: TurnPhase, event: TurnEvent) -> Option<TurnPhase> {
    use TurnEvent::*;
    use TurnPhase::*;
    match (phase, event) {
        (AwaitingInput, WeaponFired) => Some(ActionInFlight),
        (AwaitingInput, TimerExpired) => Some(Resolving),
        (AwaitingInput, ActiveCharacterDied) => Some(Resolving),
        (ActionInFlight, AllBodiesSettled) => Some(Resolving),
        (ActionInFlight, FlightTimedOut) => Some(Resolving),
        (Resolving, NextTurn { .. }) => Some(AwaitingInput),
        (Resolving, BattleOver) => Some(Ended),
        _ => None,
    }
}

/// Owns the `TurnState` and applies transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnMachine {
    state: TurnState,
    turn_time_secs: f64,
    /// The closing turn ended without a shot.
    forfeited: bool,
}

impl TurnMachine {
    /// Start turn 1 with `character` of `team` awaiting input.
    pub fn new(team: TeamId, character: CharacterId, turn_time_secs: f64) -> Self {
        Self {
            state: TurnState {
                turn: 1,
                phase: TurnPhase::AwaitingInput,
                team,
                character,
                timer_remaining: turn_time_secs,
                phase_elapsed: 0.0,
            },
            turn_time_secs,
            forfeited: false,
        }
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.phase
    }

    /// Whether the turn that moved into Resolving ended without a shot.
    pub fn forfeited(&self) -> bool {
        self.forfeited
    }

    /// Apply an event. Returns the new phase when a transition happened.
    pub fn handle(&mut self, event: TurnEvent) -> Option<TurnPhase> {
        let next = next_phase(self.state.phase, event)?;
        match event {
            TurnEvent::TimerExpired | TurnEvent::ActiveCharacterDied => self.forfeited = true,
            TurnEvent::WeaponFired => self.forfeited = false,
            TurnEvent::NextTurn { team, character } => {
                self.state.turn += 1;
                self.state.team = team;
                self.state.character = character;
                self.state.timer_remaining = self.turn_time_secs;
                self.forfeited = false;
            }
            _ => {}
        }
        self.state.phase = next;
        self.state.phase_elapsed = 0.0;
        Some(next)
    }

    /// Advance the phase clock. The turn timer only runs while awaiting input.
    pub fn advance_clock(&mut self, dt: f64) {
        self.state.phase_elapsed += dt;
        if self.state.phase == TurnPhase::AwaitingInput {
            self.state.timer_remaining = (self.state.timer_remaining - dt).max(0.0);
        }
    }

    pub fn timer_expired(&self) -> bool {
        self.state.phase == TurnPhase::AwaitingInput && self.state.timer_remaining <= 0.0
    }
}

/// Pick who acts after `current`: the first team after it in turn order with
/// a living member, and that team's next living member. The current team is
/// considered last. Returns `None` when at most one team is still alive.
pub fn next_eligible(current: TeamId, roster: &mut Roster) -> Option<(TeamId, CharacterId)> {
    if roster.alive_teams().len() <= 1 {
        return None;
    }
    let count = roster.team_count() as u32;
    let team = (1..=count)
        .map(|k| TeamId((current.0 + k) % count))
        .find(|&t| roster.alive_count_for(t) > 0)?;
    let character = roster.next_member(team)?;
    Some((team, character))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bombsite_core::types::{DVec2, WeaponId};

    fn roster(sizes: &[usize]) -> (Roster, Vec<Vec<CharacterId>>) {
        let mut roster = Roster::new();
        let mut ids = Vec::new();
        for (t, &n) in sizes.iter().enumerate() {
            let team = roster.add_team(format!("T{t}"));
            ids.push(
                (0..n)
                    .map(|i| {
                        roster
                            .spawn(team, format!("c{i}"), 100, WeaponId(0), 0.0, DVec2::ZERO)
                            .unwrap()
                    })
                    .collect(),
            );
        }
        (roster, ids)
    }

    #[test]
    fn test_transition_table() {
        use TurnEvent::*;
        use TurnPhase::*;
        let next = NextTurn {
            team: TeamId(0),
            character: CharacterId(0),
        };
        assert_eq!(next_phase(AwaitingInput, WeaponFired), Some(ActionInFlight));
        assert_eq!(next_phase(AwaitingInput, TimerExpired), Some(Resolving));
        assert_eq!(next_phase(AwaitingInput, ActiveCharacterDied), Some(Resolving));
        assert_eq!(next_phase(ActionInFlight, AllBodiesSettled), Some(Resolving));
        assert_eq!(next_phase(ActionInFlight, FlightTimedOut), Some(Resolving));
        assert_eq!(next_phase(Resolving, next), Some(AwaitingInput));
        assert_eq!(next_phase(Resolving, BattleOver), Some(Ended));

        assert_eq!(next_phase(ActionInFlight, WeaponFired), None);
        assert_eq!(next_phase(ActionInFlight, TimerExpired), None);
        assert_eq!(next_phase(AwaitingInput, AllBodiesSettled), None);
        assert_eq!(next_phase(AwaitingInput, BattleOver), None);
    }

    #[test]
    fn test_ended_absorbs_everything() {
        use TurnEvent::*;
        let events = [
            WeaponFired,
            TimerExpired,
            ActiveCharacterDied,
            AllBodiesSettled,
            FlightTimedOut,
            BattleOver,
            NextTurn {
                team: TeamId(1),
                character: CharacterId(1),
            },
        ];
        for e in events {
            assert_eq!(next_phase(TurnPhase::Ended, e), None, "{e:?}");
        }
    }

    #[test]
    fn test_full_turn_cycle() {
        let mut m = TurnMachine::new(TeamId(0), CharacterId(0), 10.0);
        assert_eq!(m.phase(), TurnPhase::AwaitingInput);
        assert_eq!(m.handle(TurnEvent::WeaponFired), Some(TurnPhase::ActionInFlight));
        assert_eq!(m.handle(TurnEvent::WeaponFired), None);
        m.advance_clock(3.0);
        assert_eq!(m.state().phase_elapsed, 3.0);
        assert_eq!(m.state().timer_remaining, 10.0, "timer frozen in flight");
        assert_eq!(m.handle(TurnEvent::AllBodiesSettled), Some(TurnPhase::Resolving));
        assert!(!m.forfeited());
        assert_eq!(m.state().phase_elapsed, 0.0);

        let next = TurnEvent::NextTurn {
            team: TeamId(1),
            character: CharacterId(1),
        };
        assert_eq!(m.handle(next), Some(TurnPhase::AwaitingInput));
        assert_eq!(m.state().turn, 2);
        assert_eq!(m.state().team, TeamId(1));
        assert_eq!(m.state().character, CharacterId(1));
        assert_eq!(m.state().timer_remaining, 10.0);
    }

    #[test]
    fn test_timer_expiry_forfeits() {
        let mut m = TurnMachine::new(TeamId(0), CharacterId(0), 1.0);
        m.advance_clock(0.6);
        assert!(!m.timer_expired());
        m.advance_clock(0.6);
        assert!(m.timer_expired());
        assert_eq!(m.state().timer_remaining, 0.0);
        assert_eq!(m.handle(TurnEvent::TimerExpired), Some(TurnPhase::Resolving));
        assert!(m.forfeited());
    }

    #[test]
    fn test_next_eligible_round_robin() {
        let (mut r, ids) = roster(&[2, 2, 2]);
        assert_eq!(next_eligible(TeamId(0), &mut r), Some((TeamId(1), ids[1][0])));
        assert_eq!(next_eligible(TeamId(1), &mut r), Some((TeamId(2), ids[2][0])));
        assert_eq!(next_eligible(TeamId(2), &mut r), Some((TeamId(0), ids[0][0])));
        assert_eq!(next_eligible(TeamId(0), &mut r), Some((TeamId(1), ids[1][1])));
    }

    #[test]
    fn test_next_eligible_skips_dead_teams_and_members() {
        let (mut r, ids) = roster(&[2, 1, 2]);
        r.kill(ids[1][0]);
        r.kill(ids[2][0]);
        assert_eq!(next_eligible(TeamId(0), &mut r), Some((TeamId(2), ids[2][1])));
    }

    #[test]
    fn test_next_eligible_wraps_around() {
        let (mut r, ids) = roster(&[2, 1, 1]);
        r.kill(ids[1][0]);
        assert_eq!(next_eligible(TeamId(2), &mut r), Some((TeamId(0), ids[0][0])));
    }

    #[test]
    fn test_next_eligible_none_when_one_team_left() {
        let (mut r, ids) = roster(&[1, 1]);
        r.kill(ids[1][0]);
        assert_eq!(next_eligible(TeamId(0), &mut r), None);
        r.kill(ids[0][0]);
        assert_eq!(next_eligible(TeamId(0), &mut r), None);
    }
}
