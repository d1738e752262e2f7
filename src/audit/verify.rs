//! Verification API
//!
//! Verify a scorebook by deterministic replay.

use thiserror::Error;
use tracing::{debug, warn};

use crate::audit::transcript::{ScoreTranscript, TRANSCRIPT_VERSION};
use crate::core::hash::Fingerprint;
use crate::core::ids::TeamId;
use crate::game::engine::{apply_event, complete_match};

/// Verification result.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Final fingerprint from replay.
    pub computed_final_fingerprint: Fingerprint,

    /// Final fingerprint from the transcript.
    pub expected_final_fingerprint: Fingerprint,

    /// Checkpoints compared so far.
    pub checkpoint_results: Vec<CheckpointResult>,

    /// First mismatch, if verification failed.
    pub error: Option<VerificationError>,
}

/// Result of verifying a single checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointResult {
    /// Events applied at the checkpoint.
    pub event_count: u32,
    /// Expected fingerprint from transcript.
    pub expected: Fingerprint,
    /// Computed fingerprint from replay.
    pub computed: Fingerprint,
    /// Did this checkpoint match?
    pub valid: bool,
}

/// Errors that can occur during verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Transcript version mismatch.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Expected version.
        expected: u8,
        /// Actual version.
        got: u8,
    },

    /// Initial snapshot does not hash to the recorded fingerprint.
    #[error("initial state fingerprint mismatch")]
    InitialStateMismatch,

    /// Checkpoint fingerprint mismatch.
    #[error("checkpoint mismatch after {event_count} events")]
    CheckpointMismatch {
        /// Events applied at the failing checkpoint.
        event_count: u32,
    },

    /// Checkpoint refers to more events than were recorded.
    #[error("checkpoint at {event_count} events is beyond the {recorded} recorded events")]
    CheckpointOutOfRange {
        /// Events claimed by the checkpoint.
        event_count: u32,
        /// Events actually recorded.
        recorded: u32,
    },

    /// Checkpoints are not listed in strictly ascending event order.
    #[error("checkpoint at {event_count} events follows checkpoint at {previous}")]
    CheckpointOutOfOrder {
        /// Event count of the preceding checkpoint.
        previous: u32,
        /// Event count of the offending checkpoint.
        event_count: u32,
    },

    /// Final fingerprint mismatch.
    #[error("final state fingerprint mismatch")]
    FinalStateMismatch,

    /// Recorded result disagrees with the replayed result.
    #[error("result mismatch: recorded winner {expected:?}, replayed winner {computed:?}")]
    ResultMismatch {
        /// Winner in the transcript.
        expected: Option<TeamId>,
        /// Winner after replay.
        computed: Option<TeamId>,
    },

    /// Transcript is incomplete.
    #[error("transcript is incomplete")]
    IncompleteTranscript,
}

impl VerificationResult {
    fn failed(
        error: VerificationError,
        computed: Fingerprint,
        expected: Fingerprint,
        checkpoint_results: Vec<CheckpointResult>,
    ) -> Self {
        warn!(%error, "transcript verification failed");
        Self {
            valid: false,
            computed_final_fingerprint: computed,
            expected_final_fingerprint: expected,
            checkpoint_results,
            error: Some(error),
        }
    }
}

/// Verify a transcript by full replay.
///
/// Replays every recorded event from the initial snapshot, compares each
/// checkpoint, completes the match and compares the final fingerprint and
/// winner. Stops at the first mismatch.
pub fn verify_transcript(transcript: &ScoreTranscript) -> VerificationResult {
    if transcript.version != TRANSCRIPT_VERSION {
        return VerificationResult::failed(
            VerificationError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: transcript.version,
            },
            [0; 32],
            [0; 32],
            vec![],
        );
    }

    let Some(result) = &transcript.result else {
        return VerificationResult::failed(VerificationError::IncompleteTranscript, [0; 32], [0; 32], vec![]);
    };

    // 1. Initial snapshot
    let mut state = transcript.initial_state.clone();
    let initial = state.fingerprint();
    if initial != transcript.initial_fingerprint {
        return VerificationResult::failed(
            VerificationError::InitialStateMismatch,
            initial,
            transcript.initial_fingerprint,
            vec![],
        );
    }

    // 2. Replay with checkpoint verification
    let recorded = transcript.events.len() as u32;
    if let Some(stray) = transcript.checkpoints.iter().find(|c| c.event_count > recorded) {
        return VerificationResult::failed(
            VerificationError::CheckpointOutOfRange {
                event_count: stray.event_count,
                recorded,
            },
            initial,
            stray.fingerprint,
            vec![],
        );
    }

    if let Some(pair) = transcript
        .checkpoints
        .windows(2)
        .find(|pair| pair[1].event_count <= pair[0].event_count)
    {
        return VerificationResult::failed(
            VerificationError::CheckpointOutOfOrder {
                previous: pair[0].event_count,
                event_count: pair[1].event_count,
            },
            initial,
            pair[1].fingerprint,
            vec![],
        );
    }

    let mut checkpoint_results = Vec::new();
    let mut checkpoints = transcript.checkpoints.iter().peekable();

    // checkpoints taken before any event was recorded
    let mut applied = 0u32;
    loop {
        while let Some(checkpoint) = checkpoints.next_if(|c| c.event_count == applied) {
            let computed = state.fingerprint();
            let valid = computed == checkpoint.fingerprint;

            checkpoint_results.push(CheckpointResult {
                event_count: checkpoint.event_count,
                expected: checkpoint.fingerprint,
                computed,
                valid,
            });

            if !valid {
                return VerificationResult::failed(
                    VerificationError::CheckpointMismatch {
                        event_count: checkpoint.event_count,
                    },
                    computed,
                    checkpoint.fingerprint,
                    checkpoint_results,
                );
            }
        }

        let Some(event) = transcript.events.get(applied as usize) else {
            break;
        };
        state = apply_event(&state, event);
        applied += 1;
    }

    // 3. Final state
    let completed = complete_match(&state);
    let computed = completed.fingerprint();

    if computed != result.final_fingerprint {
        return VerificationResult::failed(
            VerificationError::FinalStateMismatch,
            computed,
            result.final_fingerprint,
            checkpoint_results,
        );
    }

    if completed.winner_id != result.winner_id
        || completed.home_team.score != result.home_score
        || completed.away_team.score != result.away_score
    {
        return VerificationResult::failed(
            VerificationError::ResultMismatch {
                expected: result.winner_id.clone(),
                computed: completed.winner_id.clone(),
            },
            computed,
            result.final_fingerprint,
            checkpoint_results,
        );
    }

    debug!(
        match_id = %transcript.metadata.match_id,
        events = recorded,
        checkpoints = checkpoint_results.len(),
        "transcript verified"
    );

    VerificationResult {
        valid: true,
        computed_final_fingerprint: computed,
        expected_final_fingerprint: result.final_fingerprint,
        checkpoint_results,
        error: None,
    }
}
