//! Match State Definitions
//!
//! Value types for a fixture, its two participants and per-player stats.
//! Everything here is `Clone`; the engine never mutates a caller's copy.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::hash::{compute_fingerprint, Fingerprint, StateHasher};
use crate::core::ids::{MatchId, PlayerId, TeamId, TournamentId};
use crate::game::events::ScoreEvent;

/// Legal deliveries in an over.
pub const BALLS_PER_OVER: u32 = 6;

// =============================================================================
// SPORT
// =============================================================================

/// Sport a match is played under.
///
/// Only football has its own scoring branch; every other sport is scored
/// with the cricket rules. Unrecognised ids are kept verbatim so a stored
/// match is written back with the sport it was read with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sport {
    /// Cricket (default)
    #[default]
    Cricket,
    /// Association football
    Football,
    /// Basketball
    Basketball,
    /// Any other sport id
    Other(String),
}

impl Sport {
    /// Wire identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Sport::Cricket => "cricket",
            Sport::Football => "football",
            Sport::Basketball => "basketball",
            Sport::Other(id) => id,
        }
    }
}

impl From<String> for Sport {
    fn from(id: String) -> Self {
        match id.as_str() {
            "cricket" => Sport::Cricket,
            "football" => Sport::Football,
            "basketball" => Sport::Basketball,
            _ => Sport::Other(id),
        }
    }
}

impl From<&str> for Sport {
    fn from(id: &str) -> Self {
        Sport::from(id.to_owned())
    }
}

impl From<Sport> for String {
    fn from(sport: Sport) -> Self {
        match sport {
            Sport::Other(id) => id,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// MATCH STATUS
// =============================================================================

/// Lifecycle status of a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Fixture created, not started
    #[default]
    Scheduled,
    /// Manually created, not yet published
    Draft,
    /// Being scored
    Live,
    /// Result final
    Completed,
    /// Result final and frozen by an official
    Locked,
    /// Will not be played
    Cancelled,
}

impl MatchStatus {
    /// Terminal statuses accept no further scoring.
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Locked | MatchStatus::Cancelled)
    }

    fn tag(self) -> u8 {
        self as u8
    }
}

/// Outcome for one participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamResult {
    /// Won the match
    Win,
    /// Lost the match
    Loss,
    /// Tied / drawn
    Draw,
}

/// Which slot a participant occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Home slot
    Home,
    /// Away slot
    Away,
}

impl Side {
    /// The opposing slot.
    pub fn other(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

// =============================================================================
// PLAYER STATS
// =============================================================================

/// Per-player statistics for one match.
///
/// Superset of cricket and football fields; unused fields stay zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    /// Player identifier
    pub player_id: PlayerId,

    // Cricket
    /// Runs off the bat
    pub runs: u32,
    /// Balls faced
    pub balls: u32,
    /// Wickets taken as a bowler
    pub wickets: u32,
    /// Legal balls bowled
    pub balls_bowled: u32,
    /// Runs charged to the bowler
    pub runs_conceded: u32,
    /// Catches taken
    pub catches: u32,
    /// Run-outs effected
    pub runouts: u32,

    // Football
    /// Goals scored
    pub goals: u32,
    /// Assists provided
    pub assists: u32,
    /// Yellow cards
    pub yellow_cards: u32,
    /// Red cards
    pub red_cards: u32,
}

impl PlayerStats {
    /// Zero-valued stats for a player.
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            ..Default::default()
        }
    }

    /// Runs per 100 balls, if the player has faced a ball.
    pub fn strike_rate(&self) -> Option<f64> {
        (self.balls > 0).then(|| self.runs as f64 / self.balls as f64 * 100.0)
    }

    /// Runs conceded per six legal balls, if the player has bowled.
    pub fn economy(&self) -> Option<f64> {
        (self.balls_bowled > 0)
            .then(|| self.runs_conceded as f64 / (self.balls_bowled as f64 / BALLS_PER_OVER as f64))
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_str(self.player_id.as_str());
        for value in [
            self.runs,
            self.balls,
            self.wickets,
            self.balls_bowled,
            self.runs_conceded,
            self.catches,
            self.runouts,
            self.goals,
            self.assists,
            self.yellow_cards,
            self.red_cards,
        ] {
            hasher.update_u32(value);
        }
    }
}

// =============================================================================
// PARTICIPANT
// =============================================================================

/// A team inside one match. Owned by its match, never shared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Team identifier
    pub id: TeamId,
    /// Display name
    pub name: String,
    /// Runs (cricket) or goals (football)
    #[serde(default)]
    pub score: u32,
    /// Wickets fallen (cricket)
    #[serde(default)]
    pub wickets: u32,
    /// Legal balls faced (cricket)
    #[serde(default)]
    pub balls: u32,
    /// Completed overs (cricket)
    #[serde(default)]
    pub overs: u32,
    /// Final outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TeamResult>,
    /// Everyone who has touched the match for this side
    #[serde(default)]
    pub players: Vec<PlayerStats>,
}

impl Participant {
    /// Create a participant with a blank scorecard.
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a player's stats.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerStats> {
        self.players.iter().find(|p| &p.player_id == id)
    }

    /// Get a player's stats, creating a zero-valued row on first reference.
    ///
    /// Returns the row and whether it was just created.
    pub fn player_entry(&mut self, id: &PlayerId) -> (&mut PlayerStats, bool) {
        match self.players.iter().position(|p| &p.player_id == id) {
            Some(idx) => (&mut self.players[idx], false),
            None => {
                self.players.push(PlayerStats::new(id.clone()));
                let last = self.players.len() - 1;
                (&mut self.players[last], true)
            }
        }
    }

    /// Overs in the conventional `overs.balls` notation, e.g. `"12.3"`.
    pub fn overs_display(&self) -> String {
        format!("{}.{}", self.balls / BALLS_PER_OVER, self.balls % BALLS_PER_OVER)
    }

    /// Zero every aggregate and drop the player rows.
    pub fn clear_scorecard(&mut self) {
        self.score = 0;
        self.wickets = 0;
        self.balls = 0;
        self.overs = 0;
        self.result = None;
        self.players.clear();
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_str(self.id.as_str());
        hasher.update_u32(self.score);
        hasher.update_u32(self.wickets);
        hasher.update_u32(self.balls);
        hasher.update_u32(self.overs);
        hasher.update_u8(match self.result {
            None => 0,
            Some(TeamResult::Win) => 1,
            Some(TeamResult::Loss) => 2,
            Some(TeamResult::Draw) => 3,
        });
        hasher.update_u32(self.players.len() as u32);
        for player in &self.players {
            player.hash_into(hasher);
        }
    }
}

// =============================================================================
// LIVE STATE
// =============================================================================

/// Transient cricket scoring state.
///
/// A cleared `bowler_id` means the next bowler must be selected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveState {
    /// Zero-based over in progress
    #[serde(default)]
    pub current_over: u32,
    /// Legal balls bowled in the current over (0-5)
    #[serde(default)]
    pub balls_in_current_over: u32,
    /// Batter on strike
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub striker_id: Option<PlayerId>,
    /// Batter at the other end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_striker_id: Option<PlayerId>,
    /// Current bowler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowler_id: Option<PlayerId>,
}

impl LiveState {
    /// Swap striker and non-striker.
    #[inline]
    pub fn rotate_strike(&mut self) {
        std::mem::swap(&mut self.striker_id, &mut self.non_striker_id);
    }

    /// Whether the scorer has to pick a bowler before the next ball.
    pub fn needs_bowler(&self) -> bool {
        self.bowler_id.is_none()
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.current_over);
        hasher.update_u32(self.balls_in_current_over);
        hasher.update_opt_str(self.striker_id.as_ref().map(PlayerId::as_str));
        hasher.update_opt_str(self.non_striker_id.as_ref().map(PlayerId::as_str));
        hasher.update_opt_str(self.bowler_id.as_ref().map(PlayerId::as_str));
    }
}

// =============================================================================
// MATCH
// =============================================================================

/// One fixture and its full scoring state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Match identifier
    pub id: MatchId,
    /// Sport the match is scored under
    #[serde(rename = "sportId", default)]
    pub sport: Sport,
    /// Owning tournament, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<TournamentId>,
    /// Tournament stage label, e.g. "League"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Scheduled start
    pub date: DateTime<Utc>,
    /// Venue
    #[serde(default)]
    pub location: String,
    /// Lifecycle status
    #[serde(default)]
    pub status: MatchStatus,
    /// Home participant
    pub home_team: Participant,
    /// Away participant
    pub away_team: Participant,
    /// Team currently batting (cricket)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_batting_team_id: Option<TeamId>,
    /// Scoring events, newest first
    #[serde(default)]
    pub events: Vec<ScoreEvent>,
    /// Match officials
    #[serde(default)]
    pub officials: Vec<String>,
    /// Live cricket state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_state: Option<LiveState>,
    /// Winning team; always one of the two participants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<TeamId>,
}

impl Match {
    /// Create a scheduled match with blank scorecards.
    pub fn new(
        id: MatchId,
        sport: Sport,
        home_team: Participant,
        away_team: Participant,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sport,
            tournament_id: None,
            stage: None,
            date,
            location: String::new(),
            status: MatchStatus::Scheduled,
            home_team,
            away_team,
            current_batting_team_id: None,
            events: Vec::new(),
            officials: Vec::new(),
            live_state: None,
            winner_id: None,
        }
    }

    /// Which slot a team occupies, if it is a participant.
    pub fn side_of(&self, team_id: &TeamId) -> Option<Side> {
        if &self.home_team.id == team_id {
            Some(Side::Home)
        } else if &self.away_team.id == team_id {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// Borrow a participant by slot.
    pub fn participant(&self, side: Side) -> &Participant {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// Borrow a participant mutably by slot.
    pub fn participant_mut(&mut self, side: Side) -> &mut Participant {
        match side {
            Side::Home => &mut self.home_team,
            Side::Away => &mut self.away_team,
        }
    }

    /// Look up a participant by team id.
    pub fn team(&self, team_id: &TeamId) -> Option<&Participant> {
        self.side_of(team_id).map(|side| self.participant(side))
    }

    /// Whether `winner_id` is absent or names a participant.
    pub fn winner_is_valid(&self) -> bool {
        self.winner_id
            .as_ref()
            .map_or(true, |w| self.side_of(w).is_some())
    }

    /// Events in the order they happened.
    pub fn events_chronological(&self) -> impl Iterator<Item = &ScoreEvent> {
        self.events.iter().rev()
    }

    /// Copy of this match with every aggregate zeroed and no events.
    ///
    /// Identity, schedule, status and batting order are kept.
    pub fn blank_scorecard(&self) -> Match {
        let mut blank = self.clone();
        blank.home_team.clear_scorecard();
        blank.away_team.clear_scorecard();
        blank.events.clear();
        blank.live_state = None;
        blank.winner_id = None;
        blank
    }

    /// Deterministic fingerprint of the scorecard.
    pub fn fingerprint(&self) -> Fingerprint {
        compute_fingerprint(self.id.as_str(), self.events.len() as u32, |hasher| {
            hasher.update_u8(self.status.tag());
            hasher.update_u64(self.date.timestamp() as u64);
            self.home_team.hash_into(hasher);
            self.away_team.hash_into(hasher);
            hasher.update_opt_str(self.current_batting_team_id.as_ref().map(TeamId::as_str));
            hasher.update_opt_str(self.winner_id.as_ref().map(TeamId::as_str));

            match &self.live_state {
                Some(live) => {
                    hasher.update_bool(true);
                    live.hash_into(hasher);
                }
                None => hasher.update_bool(false),
            }

            for event in &self.events {
                hasher.update_str(event.id.as_str());
                hasher.update_u8(event.event_type.tag());
                hasher.update_u32(event.points);
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
