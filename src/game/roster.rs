//! Roster Validation
//!
//! Strict checks run before an event reaches the engine. The engine itself
//! accepts anything; this is where ghost players and malformed events are
//! turned away.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::ids::{PlayerId, TeamId};
use crate::game::events::{EventType, ScoreEvent};
use crate::game::state::{Match, Side, Sport};

/// Registered players per team.
///
/// Teams with no entry are not checked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    teams: BTreeMap<TeamId, BTreeSet<PlayerId>>,
}

impl Roster {
    /// Empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a team's squad, replacing any previous one.
    pub fn set_team<I, P>(&mut self, team: impl Into<TeamId>, players: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PlayerId>,
    {
        self.teams
            .insert(team.into(), players.into_iter().map(Into::into).collect());
    }

    /// Builder form of [`Roster::set_team`].
    pub fn with_team<I, P>(mut self, team: impl Into<TeamId>, players: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PlayerId>,
    {
        self.set_team(team, players);
        self
    }

    /// Add one player to a team's squad.
    pub fn add_player(&mut self, team: impl Into<TeamId>, player: impl Into<PlayerId>) {
        self.teams.entry(team.into()).or_default().insert(player.into());
    }

    /// Whether the team has a registered squad.
    pub fn has_team(&self, team: &TeamId) -> bool {
        self.teams.contains_key(team)
    }

    /// Whether `player` may appear for `team`.
    ///
    /// Always true for teams with no registered squad.
    pub fn allows(&self, team: &TeamId, player: &PlayerId) -> bool {
        self.teams
            .get(team)
            .map_or(true, |squad| squad.contains(player))
    }
}

/// Reasons an event is rejected before scoring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Event names a team that is not playing
    #[error("team {team_id} is not a participant in match {match_id}")]
    UnknownTeam {
        /// Match being scored
        match_id: String,
        /// Offending team
        team_id: TeamId,
    },

    /// Player is not registered for the side they appear for
    #[error("player {player_id} ({role}) is not on the roster of team {team_id}")]
    NotOnRoster {
        /// Team whose roster was checked
        team_id: TeamId,
        /// Offending player
        player_id: PlayerId,
        /// Field the player appeared in
        role: &'static str,
    },

    /// Card event without a colour
    #[error("card event {0} has no card type")]
    MissingCardType(String),

    /// Card event without a player
    #[error("card event {0} names no player")]
    MissingCardPlayer(String),

    /// Dismissal details on an event that is not a wicket
    #[error("event {0} carries a dismissal but is not marked as a wicket")]
    DismissalWithoutWicket(String),

    /// The previous over finished and no new bowler was named
    #[error("a bowler must be selected before the next delivery in match {0}")]
    BowlerRequired(String),
}

/// Check an event against the match and roster without applying it.
pub fn validate_event(state: &Match, event: &ScoreEvent, roster: &Roster) -> Result<(), ValidationError> {
    if let Some(team_id) = &event.team_id {
        if state.side_of(team_id).is_none() {
            return Err(ValidationError::UnknownTeam {
                match_id: state.id.to_string(),
                team_id: team_id.clone(),
            });
        }
    }

    if event.event_type == EventType::Card {
        if event.card_type.is_none() {
            return Err(ValidationError::MissingCardType(event.id.to_string()));
        }
        if event.scorer_id.is_none() {
            return Err(ValidationError::MissingCardPlayer(event.id.to_string()));
        }
    }

    if event.dismissal.is_some() && !event.is_wicket {
        return Err(ValidationError::DismissalWithoutWicket(event.id.to_string()));
    }

    let acting = acting_side(state, event);

    match state.sport {
        Sport::Football => {
            let team = &state.participant(acting).id;
            check(roster, team, event.scorer_id.as_ref(), "scorer")?;
            check(roster, team, event.assist_id.as_ref(), "assist")?;
        }
        _ => {
            let batting = &state.participant(acting).id;
            let bowling = &state.participant(acting.other()).id;
            check(roster, batting, event.batter_id.as_ref(), "batter")?;
            check(roster, batting, event.non_striker_id.as_ref(), "non-striker")?;
            check(roster, bowling, event.bowler_id.as_ref(), "bowler")?;
            let fielder = event.dismissal.as_ref().and_then(|d| d.fielder_id.as_ref());
            check(roster, bowling, fielder, "fielder")?;

            let is_ball = matches!(
                event.event_type,
                EventType::Delivery | EventType::Wicket | EventType::Extra
            );
            let bowler_known = event.bowler_id.is_some()
                || state
                    .live_state
                    .as_ref()
                    .is_some_and(|live| live.bowler_id.is_some());
            if is_ball && !bowler_known {
                return Err(ValidationError::BowlerRequired(state.id.to_string()));
            }
        }
    }

    Ok(())
}

/// Same resolution order as the engine; an unrecognised batting team is home.
fn acting_side(state: &Match, event: &ScoreEvent) -> Side {
    event
        .team_id
        .as_ref()
        .or(state.current_batting_team_id.as_ref())
        .and_then(|team| state.side_of(team))
        .unwrap_or(Side::Home)
}

fn check(
    roster: &Roster,
    team: &TeamId,
    player: Option<&PlayerId>,
    role: &'static str,
) -> Result<(), ValidationError> {
    match player {
        Some(player) if !roster.allows(team, player) => Err(ValidationError::NotOnRoster {
            team_id: team.clone(),
            player_id: player.clone(),
            role,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use crate::core::ids::MatchId;
    use crate::game::engine::apply_event;
    use crate::game::events::{CardType, DismissalType};
    use crate::game::state::Participant;

    fn cricket_match() -> Match {
        let mut m = Match::new(
            MatchId::new("m1"),
            Sport::Cricket,
            Participant::new("home", "Home XI"),
            Participant::new("away", "Away XI"),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        );
        m.current_batting_team_id = Some(TeamId::new("home"));
        m
    }

    fn roster() -> Roster {
        Roster::new()
            .with_team("home", ["h1", "h2", "h3"])
            .with_team("away", ["a1", "a2", "a3"])
    }

    #[test]
    fn test_valid_delivery_passes() {
        let event = ScoreEvent::delivery("h1", "a1", 4).with_non_striker("h2");
        assert_eq!(validate_event(&cricket_match(), &event, &roster()), Ok(()));
    }

    #[test]
    fn test_unknown_team_rejected() {
        let event = ScoreEvent::delivery("h1", "a1", 0).with_team("ghosts");
        let err = validate_event(&cricket_match(), &event, &roster()).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownTeam { .. }));
    }

    #[test]
    fn test_ghost_batter_rejected() {
        let event = ScoreEvent::delivery("nobody", "a1", 1);
        let err = validate_event(&cricket_match(), &event, &roster()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotOnRoster {
                team_id: TeamId::new("home"),
                player_id: PlayerId::new("nobody"),
                role: "batter",
            }
        );
    }

    #[test]
    fn test_bowler_from_batting_side_rejected() {
        let event = ScoreEvent::delivery("h1", "h2", 0);
        let err = validate_event(&cricket_match(), &event, &roster()).unwrap_err();
        assert!(matches!(err, ValidationError::NotOnRoster { role: "bowler", .. }));
    }

    #[test]
    fn test_fielder_checked_against_bowling_side() {
        let event = ScoreEvent::wicket("h1", "a1", DismissalType::Caught, Some(PlayerId::new("h3")));
        let err = validate_event(&cricket_match(), &event, &roster()).unwrap_err();
        assert!(matches!(err, ValidationError::NotOnRoster { role: "fielder", .. }));

        let event = ScoreEvent::wicket("h1", "a1", DismissalType::Caught, Some(PlayerId::new("a3")));
        assert!(validate_event(&cricket_match(), &event, &roster()).is_ok());
    }

    #[test]
    fn test_dismissal_requires_wicket_flag() {
        let mut event = ScoreEvent::wicket("h1", "a1", DismissalType::Bowled, None);
        event.is_wicket = false;
        let err = validate_event(&cricket_match(), &event, &roster()).unwrap_err();
        assert!(matches!(err, ValidationError::DismissalWithoutWicket(_)));
    }

    #[test]
    fn test_bowler_required_after_over() {
        let mut m = cricket_match();
        for _ in 0..6 {
            m = apply_event(&m, &ScoreEvent::delivery("h1", "a1", 0));
        }

        let mut event = ScoreEvent::delivery("h1", "a2", 0);
        event.bowler_id = None;
        let err = validate_event(&m, &event, &roster()).unwrap_err();
        assert!(matches!(err, ValidationError::BowlerRequired(_)));

        // naming the new bowler on the event is enough
        let event = ScoreEvent::delivery("h1", "a2", 0);
        assert!(validate_event(&m, &event, &roster()).is_ok());
    }

    #[test]
    fn test_bowler_carried_within_over() {
        let m = apply_event(&cricket_match(), &ScoreEvent::delivery("h1", "a1", 0));
        let mut event = ScoreEvent::delivery("h1", "a1", 0);
        event.bowler_id = None;
        assert!(validate_event(&m, &event, &roster()).is_ok());
    }

    #[test]
    fn test_football_checks() {
        let mut m = cricket_match();
        m.sport = Sport::Football;
        m.current_batting_team_id = None;

        let goal = ScoreEvent::goal("away", "a1", Some(PlayerId::new("a2")));
        assert!(validate_event(&m, &goal, &roster()).is_ok());

        let goal = ScoreEvent::goal("away", "h1", None);
        let err = validate_event(&m, &goal, &roster()).unwrap_err();
        assert!(matches!(err, ValidationError::NotOnRoster { role: "scorer", .. }));

        let mut card = ScoreEvent::card("home", "h1", CardType::Yellow);
        card.card_type = None;
        let err = validate_event(&m, &card, &roster()).unwrap_err();
        assert!(matches!(err, ValidationError::MissingCardType(_)));

        let mut card = ScoreEvent::card("home", "h1", CardType::Red);
        card.scorer_id = None;
        let err = validate_event(&m, &card, &roster()).unwrap_err();
        assert!(matches!(err, ValidationError::MissingCardPlayer(_)));
    }

    #[test]
    fn test_unregistered_team_is_unchecked() {
        let roster = Roster::new().with_team("away", ["a1"]);
        let event = ScoreEvent::delivery("anyone", "a1", 0);
        assert!(validate_event(&cricket_match(), &event, &roster).is_ok());
        assert!(!roster.has_team(&TeamId::new("home")));
    }

    #[test]
    fn test_add_player() {
        let mut roster = Roster::new();
        roster.add_player("home", "h9");
        assert!(roster.allows(&TeamId::new("home"), &PlayerId::new("h9")));
        assert!(!roster.allows(&TeamId::new("home"), &PlayerId::new("h8")));
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::BowlerRequired("m1".to_string());
        assert_eq!(err.to_string(), "a bowler must be selected before the next delivery in match m1");
    }
}
