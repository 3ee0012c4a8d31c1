//! A deterministic light client for tests and local development networks.
//!
//! Proofs are preimages: a membership proof is valid iff it equals the
//! digest of the prefixed path and expected value, so handler tests fail
//! whenever a handler checks the wrong path or expected bytes. Nothing
//! about this variant is consensus-verified; never deploy it between
//! mutually distrusting chains.

use ibc_aegis_types::height::Height;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// State of a mock client instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockClientState {
    /// Height of the newest recorded consensus state.
    pub latest_height: Height,
    /// Expiry window in nanoseconds; zero disables expiry.
    pub trusting_period_ns: u64,
    /// Set when misbehaviour froze the client.
    pub is_frozen: bool,
}

/// A mock consensus snapshot; carries only a timestamp for expiry and
/// timeout checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConsensusState {
    /// Claimed block time, unix nanoseconds.
    pub timestamp_ns: u64,
}

/// A mock header, JSON-encoded in `MsgUpdateClient`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockHeader {
    /// The height the header commits to.
    pub height: Height,
    /// Claimed block time, unix nanoseconds.
    pub timestamp_ns: u64,
}

/// The proof bytes that make a mock membership check pass.
#[must_use]
pub fn membership_proof(prefix: &[u8], path: &str, value: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(b"member:");
    hasher.update(prefix);
    hasher.update(b"/");
    hasher.update(path.as_bytes());
    hasher.update(b":");
    hasher.update(value);
    hasher.finalize().to_vec()
}

/// The proof bytes that make a mock non-membership check pass.
#[must_use]
pub fn absence_proof(prefix: &[u8], path: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(b"absent:");
    hasher.update(prefix);
    hasher.update(b"/");
    hasher.update(path.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::{absence_proof, membership_proof};

    #[test]
    fn proofs_bind_prefix_path_and_value() {
        let base = membership_proof(b"ibc", "some/path", b"value");
        assert_ne!(base, membership_proof(b"ibc", "some/path", b"other"));
        assert_ne!(base, membership_proof(b"ibc", "other/path", b"value"));
        assert_ne!(base, membership_proof(b"cbi", "some/path", b"value"));
        assert_ne!(base, absence_proof(b"ibc", "some/path"));
    }
}
