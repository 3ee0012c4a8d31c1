//! Host-side state of a sandboxed client instance.

use ibc_aegis_types::height::Height;
use ibc_aegis_types::serde_util::base64bytes;
use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;

/// What the host persists for a sandboxed client: the code binding, an
/// opaque blob the sandbox manages, and bookkeeping the host needs to
/// gate proofs. Everything else lives in the client's sandbox namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasmClientState {
    /// Checksum of the code verifying for this client. Changed only by a
    /// governance-gated migration.
    pub checksum: Checksum,
    /// Opaque client state blob owned by the sandboxed code.
    #[serde(with = "base64bytes")]
    pub data: Vec<u8>,
    /// Height of the newest recorded consensus state.
    pub latest_height: Height,
    /// Set when misbehaviour froze the client.
    pub is_frozen: bool,
}

impl WasmClientState {
    /// The same client bound to different code. Used when a migration is
    /// accepted; id and accumulated consensus states are untouched.
    #[must_use]
    pub fn rebound(mut self, new_checksum: Checksum) -> Self {
        self.checksum = new_checksum;
        self
    }
}

/// The consensus state blob handed to the engine at instantiation. The
/// sandbox manages consensus states afterwards; the host does not mirror
/// them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasmConsensusState {
    /// Opaque consensus state blob owned by the sandboxed code.
    #[serde(with = "base64bytes")]
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use ibc_aegis_types::height::Height;

    use super::WasmClientState;
    use crate::checksum::Checksum;

    #[test]
    fn rebinding_changes_only_the_checksum() {
        let state = WasmClientState {
            checksum: Checksum::of(b"old code"),
            data: b"opaque".to_vec(),
            latest_height: Height::new(0, 12),
            is_frozen: false,
        };
        let rebound = state.clone().rebound(Checksum::of(b"new code"));
        assert_eq!(rebound.checksum, Checksum::of(b"new code"));
        assert_eq!(rebound.data, state.data);
        assert_eq!(rebound.latest_height, state.latest_height);
    }
}
