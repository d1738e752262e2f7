//! Scoring Logic Module
//!
//! Everything that turns events into scorecards. Synchronous and pure:
//! no I/O, no locks, no clock reads outside of id/timestamp generation.
//!
//! ## Module Structure
//!
//! - `state`: Match, participants, player stats, live cricket state
//! - `events`: Score events and their constructors
//! - `engine`: Event application, replay and result finalization
//! - `impact`: Player impact scores and match rankings
//! - `fixtures`: Round-robin fixture generation
//! - `roster`: Strict pre-scoring validation

pub mod state;
pub mod events;
pub mod engine;
pub mod impact;
pub mod fixtures;
pub mod roster;

// Re-export key types
pub use state::{Match, MatchStatus, Participant, PlayerStats, LiveState, Sport, Side, TeamResult};
pub use events::{ScoreEvent, EventType, ExtraType, DismissalType, CardType};
pub use engine::{apply, apply_event, complete_match, rebuild, replay_events, Applied, NewPlayer};
pub use impact::{get_match_impact_rankings, player_of_the_match, ImpactScore, Role};
pub use fixtures::{generate_round_robin_matches, generate_double_round_robin_matches, Team};
pub use roster::{validate_event, Roster, ValidationError};
