//! Core primitives.
//!
//! Identifiers and the state hasher shared by scoring, audit and storage.

pub mod ids;
pub mod hash;

// Re-export core types
pub use ids::{EventId, MatchId, PlayerId, TeamId, TournamentId};
pub use hash::{compute_fingerprint, Fingerprint, StateHasher};
