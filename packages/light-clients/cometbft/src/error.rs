//! Error type for CometBFT light-client operations.

use ibc_aegis_types::height::Height;

/// Errors raised by CometBFT client verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CometBftError {
    /// The client state parameters are malformed.
    #[error("invalid client state: {reason}")]
    InvalidClientState {
        /// What is wrong with the parameters.
        reason: String,
    },

    /// The submitted header bytes do not decode or are internally
    /// inconsistent.
    #[error("invalid header: {reason}")]
    InvalidHeader {
        /// Decode or validation failure.
        reason: String,
    },

    /// The submitted misbehaviour evidence does not decode or is
    /// internally inconsistent.
    #[error("invalid misbehaviour evidence: {reason}")]
    InvalidMisbehaviour {
        /// Decode or validation failure.
        reason: String,
    },

    /// No consensus state is stored at the height the evidence trusts.
    #[error("no consensus state stored at trusted height {height}")]
    ConsensusStateNotFound {
        /// The missing trusted height.
        height: Height,
    },

    /// Header verification against the trusted state failed.
    #[error("header verification failed: {reason}")]
    HeaderVerification {
        /// The verifier's failure description.
        reason: String,
    },

    /// Misbehaviour evidence verified but the two headers do not conflict.
    #[error("submitted headers do not constitute misbehaviour")]
    NotMisbehaviour,

    /// A membership or non-membership proof failed to decode or verify.
    #[error("invalid proof: {reason}")]
    InvalidProof {
        /// Decode or verification failure.
        reason: String,
    },

    /// A stored timestamp is outside the representable time range.
    #[error("invalid timestamp: {reason}")]
    InvalidTimestamp {
        /// The conversion failure.
        reason: String,
    },
}
