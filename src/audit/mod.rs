//! Scorebook Audit
//!
//! Provides verifiable match results through:
//! - Transcript recording (initial snapshot, events, checkpoints, result)
//! - Compact binary encoding
//! - Verification by deterministic replay
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SCOREBOOK AUDIT                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  transcript.rs   - Event log + fingerprint checkpoints      │
//! │  verify.rs       - Verification by replay                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod transcript;
pub mod verify;

// Re-export key types
pub use transcript::{
    ScoreTranscript, TranscriptMetadata, TranscriptResult, Checkpoint, TranscriptError,
    TRANSCRIPT_VERSION, DEFAULT_CHECKPOINT_INTERVAL,
};
pub use verify::{verify_transcript, VerificationResult, VerificationError, CheckpointResult};
