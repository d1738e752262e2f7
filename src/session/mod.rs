//! Scoring Sessions
//!
//! The non-pure edge of the crate: persistence, per-match locking and
//! update fan-out. Everything that decides a score lives in `game`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SESSION LAYER                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  store.rs        - Versioned match persistence              │
//! │  manager.rs      - Single-writer sessions, update broadcast │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod store;
pub mod manager;

// Re-export key types
pub use store::{MatchStore, InMemoryStore, StoredMatch, StoreError};
pub use manager::{SessionManager, ScoringSession, SessionConfig, SessionError, ScoreUpdate};
