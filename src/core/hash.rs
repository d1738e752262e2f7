//! Match Fingerprinting
//!
//! Deterministic hashing of match state, used for scorebook checkpoints
//! and for checking that a rebuilt scorecard matches the stored one.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type Fingerprint = [u8; 32];

/// Deterministic hasher for match state.
///
/// Wraps SHA-256 with length-prefixed helpers so that adjacent
/// variable-length fields cannot collide. Order of updates is critical.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for match state.
    pub fn for_match_state() -> Self {
        Self::new(b"PITCHSIDE_MATCH_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Update with an optional string (presence tag, then the value).
    pub fn update_opt_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.update_u8(1);
                self.update_str(s);
            }
            None => self.update_u8(0),
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Fingerprint {
        self.hasher.finalize().into()
    }
}

/// Compute the fingerprint of a match.
///
/// Identity and event count are always hashed first; the closure adds
/// the scorecard-specific data.
pub fn compute_fingerprint<F>(match_id: &str, event_count: u32, add_state: F) -> Fingerprint
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_match_state();

    hasher.update_str(match_id);
    hasher.update_u32(event_count);

    add_state(&mut hasher);

    hasher.finalize()
}
