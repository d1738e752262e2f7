//! Scorebook Transcript Recording
//!
//! Records everything needed to re-derive a match result: the scorecard the
//! session started from, each accepted event, and periodic fingerprints.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::Fingerprint;
use crate::core::ids::{MatchId, TeamId};
use crate::game::events::ScoreEvent;
use crate::game::state::{Match, Sport};

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// Default number of events between checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u32 = 6;

/// Complete scorebook for one match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreTranscript {
    /// Version for forward compatibility.
    pub version: u8,

    /// Who played, where and when.
    pub metadata: TranscriptMetadata,

    /// Events between checkpoints (0 disables checkpoints).
    pub checkpoint_interval: u32,

    /// Scorecard recording started from.
    pub initial_state: Match,

    /// Fingerprint of `initial_state` at recording time.
    pub initial_fingerprint: Fingerprint,

    /// Accepted events, oldest first.
    pub events: Vec<ScoreEvent>,

    /// Fingerprint checkpoints.
    pub checkpoints: Vec<Checkpoint>,

    /// Final result, once the match is completed.
    pub result: Option<TranscriptResult>,
}

/// Match metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    /// Match identifier.
    pub match_id: MatchId,

    /// Sport the match is scored under.
    pub sport: Sport,

    /// Home team.
    pub home_team_id: TeamId,

    /// Away team.
    pub away_team_id: TeamId,

    /// Unix timestamp of the scheduled start.
    pub start_timestamp: i64,
}

/// Fingerprint taken after a given number of recorded events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Events applied when the fingerprint was taken.
    pub event_count: u32,

    /// Match fingerprint at that point.
    pub fingerprint: Fingerprint,
}

/// Final outcome as recorded at completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Winner, absent on a draw.
    pub winner_id: Option<TeamId>,

    /// Final home score.
    pub home_score: u32,

    /// Final away score.
    pub away_score: u32,

    /// Fingerprint of the completed match.
    pub final_fingerprint: Fingerprint,
}

impl TranscriptMetadata {
    /// Metadata for a match.
    pub fn from_match(state: &Match) -> Self {
        Self {
            match_id: state.id.clone(),
            sport: state.sport.clone(),
            home_team_id: state.home_team.id.clone(),
            away_team_id: state.away_team.id.clone(),
            start_timestamp: state.date.timestamp(),
        }
    }
}

impl ScoreTranscript {
    /// Start recording from the given scorecard.
    pub fn begin(initial: &Match, checkpoint_interval: u32) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            metadata: TranscriptMetadata::from_match(initial),
            checkpoint_interval,
            initial_fingerprint: initial.fingerprint(),
            initial_state: initial.clone(),
            events: Vec::new(),
            checkpoints: Vec::new(),
            result: None,
        }
    }

    /// Record an accepted event and the state it produced.
    ///
    /// A checkpoint is taken every `checkpoint_interval` events.
    pub fn record(&mut self, event: &ScoreEvent, state_after: &Match) {
        self.events.push(event.clone());

        let count = self.events.len() as u32;
        if self.checkpoint_interval > 0 && count % self.checkpoint_interval == 0 {
            self.add_checkpoint(count, state_after.fingerprint());
        }
    }

    /// Record a checkpoint.
    pub fn add_checkpoint(&mut self, event_count: u32, fingerprint: Fingerprint) {
        self.checkpoints.push(Checkpoint {
            event_count,
            fingerprint,
        });
    }

    /// Finalize with the completed match.
    pub fn finalize(&mut self, completed: &Match) {
        self.result = Some(TranscriptResult {
            winner_id: completed.winner_id.clone(),
            home_score: completed.home_team.score,
            away_score: completed.away_team.score,
            final_fingerprint: completed.fingerprint(),
        });
    }

    /// Check if transcript is complete.
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Number of recorded events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        let envelope = Envelope {
            version: self.version,
            metadata: self.metadata.clone(),
            checkpoint_interval: self.checkpoint_interval,
            initial_state: serde_json::to_vec(&self.initial_state)
                .map_err(|e| TranscriptError::SerializationFailed(e.to_string()))?,
            initial_fingerprint: self.initial_fingerprint,
            events: self
                .events
                .iter()
                .map(serde_json::to_vec)
                .collect::<Result<_, _>>()
                .map_err(|e| TranscriptError::SerializationFailed(e.to_string()))?,
            checkpoints: self.checkpoints.clone(),
            result: self.result.clone(),
        };

        bincode::serialize(&envelope).map_err(|e| TranscriptError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        let envelope: Envelope = bincode::deserialize(data)
            .map_err(|e| TranscriptError::DeserializationFailed(e.to_string()))?;

        if envelope.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: envelope.version,
            });
        }

        let initial_state = serde_json::from_slice(&envelope.initial_state)
            .map_err(|e| TranscriptError::DeserializationFailed(e.to_string()))?;
        let events = envelope
            .events
            .iter()
            .map(|raw| serde_json::from_slice(raw))
            .collect::<Result<_, _>>()
            .map_err(|e| TranscriptError::DeserializationFailed(e.to_string()))?;

        Ok(Self {
            version: envelope.version,
            metadata: envelope.metadata,
            checkpoint_interval: envelope.checkpoint_interval,
            initial_state,
            initial_fingerprint: envelope.initial_fingerprint,
            events,
            checkpoints: envelope.checkpoints,
            result: envelope.result,
        })
    }
}

/// Binary layout. `Match` and `ScoreEvent` omit absent fields when
/// serialized, which bincode cannot read back, so they travel as JSON.
#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u8,
    metadata: TranscriptMetadata,
    checkpoint_interval: u32,
    initial_state: Vec<u8>,
    initial_fingerprint: Fingerprint,
    events: Vec<Vec<u8>>,
    checkpoints: Vec<Checkpoint>,
    result: Option<TranscriptResult>,
}

/// Errors that can occur with transcripts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// Serialization failed.
    #[error("transcript serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization failed.
    #[error("transcript deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Version mismatch.
    #[error("transcript version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version.
        expected: u8,
        /// Version found in the data.
        got: u8,
    },
}
