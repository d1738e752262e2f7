//! Match Storage
//!
//! Persistence boundary for scorecards. Writes are optimistic: every save
//! names the version it was derived from and fails if someone else got
//! there first.

use std::collections::BTreeMap;
use std::sync::RwLock;

use thiserror::Error;
use tracing::debug;

use crate::core::ids::MatchId;
use crate::game::state::Match;

/// A persisted match and its version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredMatch {
    /// Monotonic version, starting at 1 on insert.
    pub version: u64,
    /// Stored scorecard.
    pub state: Match,
}

/// Errors raised by a [`MatchStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The stored version moved on since the caller loaded it.
    #[error("version conflict on match {match_id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Match being saved
        match_id: MatchId,
        /// Version the caller based its write on
        expected: u64,
        /// Version currently stored (0 if absent)
        actual: u64,
    },

    /// Storage backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Versioned match persistence.
pub trait MatchStore: Send + Sync + 'static {
    /// Load a match, if stored.
    fn load(&self, id: &MatchId) -> Result<Option<StoredMatch>, StoreError>;

    /// Save a match derived from `expected_version` and return the new version.
    ///
    /// `expected_version == 0` inserts and fails if the match already exists.
    fn save(&self, state: &Match, expected_version: u64) -> Result<u64, StoreError>;

    /// Identifiers of every stored match.
    fn ids(&self) -> Result<Vec<MatchId>, StoreError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    matches: RwLock<BTreeMap<MatchId, StoredMatch>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored matches.
    pub fn len(&self) -> usize {
        self.matches.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("match store lock poisoned".to_string())
}

impl MatchStore for InMemoryStore {
    fn load(&self, id: &MatchId) -> Result<Option<StoredMatch>, StoreError> {
        let matches = self.matches.read().map_err(poisoned)?;
        Ok(matches.get(id).cloned())
    }

    fn save(&self, state: &Match, expected_version: u64) -> Result<u64, StoreError> {
        let mut matches = self.matches.write().map_err(poisoned)?;

        let actual = matches.get(&state.id).map_or(0, |stored| stored.version);
        if actual != expected_version {
            return Err(StoreError::VersionConflict {
                match_id: state.id.clone(),
                expected: expected_version,
                actual,
            });
        }

        let version = actual + 1;
        matches.insert(
            state.id.clone(),
            StoredMatch {
                version,
                state: state.clone(),
            },
        );

        debug!(match_id = %state.id, version, "match saved");
        Ok(version)
    }

    fn ids(&self) -> Result<Vec<MatchId>, StoreError> {
        let matches = self.matches.read().map_err(poisoned)?;
        Ok(matches.keys().cloned().collect())
    }
}
