//! Score Events
//!
//! One atomic scoring occurrence. Events are immutable once created and are
//! only ever prepended to a match's event list.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::ids::{EventId, PlayerId, TeamId};

/// Kind of scoring occurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A cricket ball bowled
    Delivery,
    /// A cricket dismissal
    Wicket,
    /// A cricket extra (wide, no-ball, bye, leg-bye)
    Extra,
    /// A football goal
    Goal,
    /// A football booking
    Card,
    /// A foul with no scoring effect
    Foul,
    /// A basketball basket
    Basket,
    /// Anything the engine does not recognise
    #[serde(other)]
    Other,
}

impl EventType {
    /// Stable tag used when fingerprinting.
    pub fn tag(self) -> u8 {
        match self {
            EventType::Delivery => 0,
            EventType::Wicket => 1,
            EventType::Extra => 2,
            EventType::Goal => 3,
            EventType::Card => 4,
            EventType::Foul => 5,
            EventType::Basket => 6,
            EventType::Other => 255,
        }
    }
}

/// Type of cricket extra.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraType {
    /// Wide: not a legal ball, not faced
    Wide,
    /// No-ball: not a legal ball, not faced
    NoBall,
    /// Byes: legal ball, not charged to the bowler
    Bye,
    /// Leg-byes: legal ball, not charged to the bowler
    LegBye,
    /// Penalty runs and anything else: legal ball, not charged to the bowler
    #[serde(other)]
    Other,
}

impl ExtraType {
    /// Wides and no-balls do not count toward the over.
    #[inline]
    pub fn is_illegal_delivery(self) -> bool {
        matches!(self, ExtraType::Wide | ExtraType::NoBall)
    }
}

/// Extra runs attached to a delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extras {
    /// Kind of extra
    #[serde(rename = "type")]
    pub kind: ExtraType,
    /// Runs awarded as extras
    #[serde(default)]
    pub runs: u32,
}

/// How a batter was dismissed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalType {
    /// Bowled
    Bowled,
    /// Caught by a fielder
    Caught,
    /// Leg before wicket
    Lbw,
    /// Run out (never credited to the bowler)
    RunOut,
    /// Stumped
    Stumped,
    /// Hit wicket
    HitWicket,
    /// Retired, obstructing, timed out, ...
    #[serde(other)]
    Other,
}

/// Dismissal details for a wicket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dismissal {
    /// How the batter was out
    #[serde(rename = "type")]
    pub kind: DismissalType,
    /// Catcher or run-out fielder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fielder_id: Option<PlayerId>,
}

/// Football card colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    /// Caution
    Yellow,
    /// Sending off
    Red,
    /// Any other card; recorded on the event, not counted
    #[serde(other)]
    Other,
}

/// A single scoring event.
///
/// `points` is the authoritative amount added to the acting team's score;
/// every other field refines how that amount is attributed to players.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEvent {
    /// Unique event id
    pub id: EventId,

    /// When the event was recorded
    pub timestamp: DateTime<Utc>,

    /// Acting (batting / scoring) team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,

    /// Striker facing the delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batter_id: Option<PlayerId>,

    /// Batter at the non-striker's end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_striker_id: Option<PlayerId>,

    /// Bowler delivering the ball
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowler_id: Option<PlayerId>,

    /// Goal scorer, or the booked player on a card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer_id: Option<PlayerId>,

    /// Provider of the final pass on a goal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assist_id: Option<PlayerId>,

    /// Runs or goals added to the team total
    #[serde(default)]
    pub points: u32,

    /// Free-text commentary line
    #[serde(default)]
    pub description: String,

    /// Event kind
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Whether a batter was dismissed
    #[serde(default)]
    pub is_wicket: bool,

    /// Runs off the bat (excludes extras)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs_scored: Option<u32>,

    /// Extras on this ball, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,

    /// Dismissal details when `is_wicket`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissal: Option<Dismissal>,

    /// Card colour on a `card` event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<CardType>,
}

impl ScoreEvent {
    /// Create a bare event with a fresh id and the current time.
    pub fn new(event_type: EventType, points: u32) -> Self {
        Self {
            id: EventId::generate(),
            timestamp: Utc::now(),
            team_id: None,
            batter_id: None,
            non_striker_id: None,
            bowler_id: None,
            scorer_id: None,
            assist_id: None,
            points,
            description: String::new(),
            event_type,
            is_wicket: false,
            runs_scored: None,
            extras: None,
            dismissal: None,
            card_type: None,
        }
    }

    /// Create a delivery with runs off the bat.
    pub fn delivery(batter: impl Into<PlayerId>, bowler: impl Into<PlayerId>, runs: u32) -> Self {
        let mut event = Self::new(EventType::Delivery, runs);
        event.batter_id = Some(batter.into());
        event.bowler_id = Some(bowler.into());
        event.runs_scored = Some(runs);
        event.description = format!("{} run(s)", runs);
        event
    }

    /// Create an extra. `points` is the extra runs plus any runs off the bat.
    pub fn extra(
        kind: ExtraType,
        extra_runs: u32,
        batter: impl Into<PlayerId>,
        bowler: impl Into<PlayerId>,
        runs_off_bat: u32,
    ) -> Self {
        let mut event = Self::new(EventType::Extra, extra_runs + runs_off_bat);
        event.batter_id = Some(batter.into());
        event.bowler_id = Some(bowler.into());
        event.runs_scored = Some(runs_off_bat);
        event.extras = Some(Extras { kind, runs: extra_runs });
        event.description = format!("{:?} +{}", kind, extra_runs);
        event
    }

    /// Create a wicket on a legal delivery.
    pub fn wicket(
        batter: impl Into<PlayerId>,
        bowler: impl Into<PlayerId>,
        kind: DismissalType,
        fielder: Option<PlayerId>,
    ) -> Self {
        let mut event = Self::new(EventType::Wicket, 0);
        event.batter_id = Some(batter.into());
        event.bowler_id = Some(bowler.into());
        event.runs_scored = Some(0);
        event.is_wicket = true;
        event.dismissal = Some(Dismissal { kind, fielder_id: fielder });
        event.description = format!("OUT ({:?})", kind);
        event
    }

    /// Create a football goal.
    pub fn goal(team: impl Into<TeamId>, scorer: impl Into<PlayerId>, assist: Option<PlayerId>) -> Self {
        let mut event = Self::new(EventType::Goal, 1);
        event.team_id = Some(team.into());
        event.scorer_id = Some(scorer.into());
        event.assist_id = assist;
        event.description = "Goal".to_owned();
        event
    }

    /// Create a football card.
    pub fn card(team: impl Into<TeamId>, player: impl Into<PlayerId>, card: CardType) -> Self {
        let mut event = Self::new(EventType::Card, 0);
        event.team_id = Some(team.into());
        event.scorer_id = Some(player.into());
        event.card_type = Some(card);
        event.description = format!("{:?} card", card);
        event
    }

    /// Set the acting team.
    pub fn with_team(mut self, team: impl Into<TeamId>) -> Self {
        self.team_id = Some(team.into());
        self
    }

    /// Set the non-striker.
    pub fn with_non_striker(mut self, player: impl Into<PlayerId>) -> Self {
        self.non_striker_id = Some(player.into());
        self
    }

    /// Whether this delivery is a wide or no-ball.
    #[inline]
    pub fn is_illegal_delivery(&self) -> bool {
        self.extras.is_some_and(|e| e.kind.is_illegal_delivery())
    }

    /// Runs off the bat, treating absent as zero.
    #[inline]
    pub fn bat_runs(&self) -> u32 {
        self.runs_scored.unwrap_or(0)
    }
}
