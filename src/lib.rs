//! # Pitchside Scoring Engine
//!
//! Live scoring, player impact ranking and fixture generation for cricket
//! and football matches.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PITCHSIDE ENGINE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Shared primitives                         │
//! │  ├── ids.rs      - String-backed identifiers                 │
//! │  └── hash.rs     - Match fingerprinting                      │
//! │                                                              │
//! │  game/           - Scoring logic (pure)                      │
//! │  ├── state.rs    - Match, participants, player stats         │
//! │  ├── events.rs   - Score events                              │
//! │  ├── engine.rs   - Event application and replay              │
//! │  ├── impact.rs   - Impact scores and rankings                │
//! │  ├── fixtures.rs - Round-robin fixture generation            │
//! │  └── roster.rs   - Pre-scoring validation                    │
//! │                                                              │
//! │  audit/          - Scorebook transcripts                     │
//! │  ├── transcript.rs - Event log with checkpoints              │
//! │  └── verify.rs   - Verification by replay                    │
//! │                                                              │
//! │  session/        - Persistence and concurrency               │
//! │  ├── store.rs    - Versioned match store                     │
//! │  └── manager.rs  - Single-writer scoring sessions            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity
//!
//! `game::engine::apply_event` takes the current match by reference and
//! returns a new one. It performs no I/O, takes no locks and never fails.
//! Replaying the same events onto the same starting scorecard always yields
//! the same fingerprint.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod audit;
pub mod session;

// Re-export commonly used types
pub use core::ids::{EventId, MatchId, PlayerId, TeamId, TournamentId};
pub use game::engine::{apply, apply_event, complete_match, rebuild};
pub use game::events::ScoreEvent;
pub use game::impact::{calculate_impact_score, get_match_impact_rankings, ImpactScore};
pub use game::fixtures::generate_round_robin_matches;
pub use game::state::{Match, MatchStatus, Participant, PlayerStats, Sport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
