//! The counterparty-provided ("lite") light client.
//!
//! This variant skips consensus-header verification entirely: a dedicated
//! provisioning message binds a counterparty identifier and commitment
//! prefix out of band, and submitted headers are recorded as-is. Membership
//! proofs still use the same ICS-23 Merkle verification as the native
//! client, but against roots nothing on this chain has independently
//! verified.
//!
//! The security of this variant rests entirely on whatever process
//! performs the provisioning; it is strictly weaker than the
//! native-consensus client and must not be treated as equivalent.
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

use ibc_aegis_client_cometbft::membership;
use ibc_aegis_types::height::Height;
use ibc_aegis_types::serde_util::base64bytes;
use serde::{Deserialize, Serialize};

/// Errors raised by the lite client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteError {
    /// The submitted header bytes do not decode or are malformed.
    #[error("invalid lite header: {reason}")]
    InvalidHeader {
        /// Decode or validation failure.
        reason: String,
    },

    /// The client already has a provisioned counterparty. Provisioning is
    /// one-shot.
    #[error("counterparty is already provisioned for this client")]
    CounterpartyAlreadySet,

    /// No counterparty has been provisioned yet.
    #[error("no counterparty provisioned for this client")]
    CounterpartyNotSet,

    /// A membership or non-membership proof failed.
    #[error("invalid proof: {reason}")]
    InvalidProof {
        /// Decode or verification failure.
        reason: String,
    },
}

/// The out-of-band-provisioned counterparty binding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteCounterparty {
    /// The counterparty's identifier for its own client of this chain.
    pub client_id: String,
    /// Key prefix the counterparty commits its state under.
    #[serde(with = "base64bytes")]
    pub merkle_prefix: Vec<u8>,
}

/// Host-side state of a lite client instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteClientState {
    /// The provisioned counterparty, once bound.
    pub counterparty: Option<LiteCounterparty>,
    /// Height of the newest recorded consensus state.
    pub latest_height: Height,
    /// Set when conflicting headers froze the client.
    pub is_frozen: bool,
}

/// A recorded (unverified) snapshot of the counterparty at one height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteConsensusState {
    /// The claimed app-state commitment root.
    #[serde(with = "base64bytes")]
    pub root: Vec<u8>,
    /// The claimed block time, unix nanoseconds.
    pub timestamp_ns: u64,
}

/// A lite header: a bare claimed root at a height, JSON-encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteHeader {
    /// The height the header commits to.
    pub height: Height,
    /// The claimed commitment root.
    #[serde(with = "base64bytes")]
    pub root: Vec<u8>,
    /// The claimed block time, unix nanoseconds.
    pub timestamp_ns: u64,
}

/// Decode and sanity-check a lite header.
///
/// No consensus verification happens here; the header is trusted as
/// provisioned.
///
/// # Errors
/// Returns [`LiteError::InvalidHeader`] on malformed input.
pub fn decode_header(header_bytes: &[u8]) -> Result<LiteHeader, LiteError> {
    let header: LiteHeader =
        serde_json::from_slice(header_bytes).map_err(|e| LiteError::InvalidHeader {
            reason: e.to_string(),
        })?;
    if header.height.revision_height == 0 {
        return Err(LiteError::InvalidHeader {
            reason: "height must be greater than zero".to_string(),
        });
    }
    if header.root.is_empty() {
        return Err(LiteError::InvalidHeader {
            reason: "root must not be empty".to_string(),
        });
    }
    Ok(header)
}

/// Misbehaviour evidence for a lite client: two headers claiming different
/// roots for the same height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteMisbehaviour {
    /// First conflicting header.
    pub header_1: LiteHeader,
    /// Second conflicting header.
    pub header_2: LiteHeader,
}

/// Decode and check lite misbehaviour evidence. Success means the client
/// must be frozen by the caller.
///
/// # Errors
/// Returns [`LiteError::InvalidHeader`] if the evidence is malformed or the
/// headers do not conflict.
pub fn verify_misbehaviour(misbehaviour_bytes: &[u8]) -> Result<LiteMisbehaviour, LiteError> {
    let evidence: LiteMisbehaviour =
        serde_json::from_slice(misbehaviour_bytes).map_err(|e| LiteError::InvalidHeader {
            reason: e.to_string(),
        })?;
    if evidence.header_1.height != evidence.header_2.height {
        return Err(LiteError::InvalidHeader {
            reason: "conflicting headers must be for the same height".to_string(),
        });
    }
    if evidence.header_1.root == evidence.header_2.root {
        return Err(LiteError::InvalidHeader {
            reason: "headers do not conflict".to_string(),
        });
    }
    Ok(evidence)
}

/// The consensus state a header records.
#[must_use]
pub fn consensus_state(header: &LiteHeader) -> LiteConsensusState {
    LiteConsensusState {
        root: header.root.clone(),
        timestamp_ns: header.timestamp_ns,
    }
}

/// Verify an inclusion proof against a recorded root.
///
/// # Errors
/// Returns [`LiteError::InvalidProof`] if the proof does not verify.
pub fn verify_membership(
    consensus: &LiteConsensusState,
    prefix: &[u8],
    path: &[u8],
    value: &[u8],
    proof: &[u8],
) -> Result<(), LiteError> {
    membership::verify_membership(&consensus.root, prefix, path, value, proof).map_err(|e| {
        LiteError::InvalidProof {
            reason: e.to_string(),
        }
    })
}

/// Verify an exclusion proof against a recorded root.
///
/// # Errors
/// Returns [`LiteError::InvalidProof`] if the proof does not verify.
pub fn verify_non_membership(
    consensus: &LiteConsensusState,
    prefix: &[u8],
    path: &[u8],
    proof: &[u8],
) -> Result<(), LiteError> {
    membership::verify_non_membership(&consensus.root, prefix, path, proof).map_err(|e| {
        LiteError::InvalidProof {
            reason: e.to_string(),
        }
    })
}
