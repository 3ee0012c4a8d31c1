//! Entry-point message surface of sandboxed light-client code.
//!
//! The host serializes these payloads to JSON and hands them to the engine;
//! responses come back as JSON bytes. State-mutating calls go through
//! [`SudoMsg`], read-only calls through [`QueryMsg`], and code migration
//! through [`MigrateMsg`] dispatched to the *new* code.

use ibc_aegis_types::height::Height;
use ibc_aegis_types::serde_util::{base64bytes, base64bytes_list};
use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;

/// Payload for instantiating a fresh client instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantiateMsg {
    /// Opaque client state blob the sandbox manages.
    #[serde(with = "base64bytes")]
    pub client_state: Vec<u8>,
    /// Opaque initial consensus state blob.
    #[serde(with = "base64bytes")]
    pub consensus_state: Vec<u8>,
    /// Checksum of the code the instance is bound to.
    pub checksum: Checksum,
}

/// State-mutating entry points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SudoMsg {
    /// Verify an inclusion proof against a verified consensus state.
    VerifyMembership(VerifyMembershipMsg),
    /// Verify an exclusion proof against a verified consensus state.
    VerifyNonMembership(VerifyNonMembershipMsg),
    /// Record the consensus state(s) carried by a verified client message.
    UpdateState(UpdateStateMsg),
    /// React to verified misbehaviour evidence before the host freezes the
    /// client.
    UpdateStateOnMisbehaviour(UpdateStateOnMisbehaviourMsg),
}

/// Read-only entry points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMsg {
    /// Check a client message (header) against the tracked consensus.
    VerifyClientMessage(VerifyClientMessageMsg),
    /// Ask whether a client message evidences misbehaviour.
    CheckForMisbehaviour(CheckForMisbehaviourMsg),
    /// The consensus timestamp recorded at a height.
    TimestampAtHeight(TimestampAtHeightMsg),
    /// The client's own lifecycle status.
    Status(StatusMsg),
}

/// Payload of [`SudoMsg::VerifyMembership`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyMembershipMsg {
    /// Height of the consensus state to verify against.
    pub height: Height,
    /// Commitment-prefixed key path segments.
    #[serde(with = "base64bytes_list")]
    pub merkle_path: Vec<Vec<u8>>,
    /// The value expected under the path.
    #[serde(with = "base64bytes")]
    pub value: Vec<u8>,
    /// The serialized proof.
    #[serde(with = "base64bytes")]
    pub proof: Vec<u8>,
}

/// Payload of [`SudoMsg::VerifyNonMembership`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyNonMembershipMsg {
    /// Height of the consensus state to verify against.
    pub height: Height,
    /// Commitment-prefixed key path segments.
    #[serde(with = "base64bytes_list")]
    pub merkle_path: Vec<Vec<u8>>,
    /// The serialized proof.
    #[serde(with = "base64bytes")]
    pub proof: Vec<u8>,
}

/// Payload of [`SudoMsg::UpdateState`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStateMsg {
    /// The client message previously verified via
    /// [`QueryMsg::VerifyClientMessage`].
    #[serde(with = "base64bytes")]
    pub client_message: Vec<u8>,
}

/// Payload of [`SudoMsg::UpdateStateOnMisbehaviour`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStateOnMisbehaviourMsg {
    /// The offending client message.
    #[serde(with = "base64bytes")]
    pub client_message: Vec<u8>,
}

/// Payload of [`QueryMsg::VerifyClientMessage`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyClientMessageMsg {
    /// The submitted client message (header or misbehaviour).
    #[serde(with = "base64bytes")]
    pub client_message: Vec<u8>,
}

/// Payload of [`QueryMsg::CheckForMisbehaviour`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckForMisbehaviourMsg {
    /// The submitted client message.
    #[serde(with = "base64bytes")]
    pub client_message: Vec<u8>,
}

/// Payload of [`QueryMsg::TimestampAtHeight`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampAtHeightMsg {
    /// The height to look up.
    pub height: Height,
}

/// Payload of [`QueryMsg::Status`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMsg {}

/// Payload handed to the *new* code's migrate entry point when a client is
/// being rebound to a different checksum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateMsg {
    /// Checksum the client is currently bound to.
    pub old_checksum: Checksum,
    /// Caller-supplied migration payload.
    #[serde(with = "base64bytes")]
    pub msg: Vec<u8>,
}

/// Result of [`SudoMsg::UpdateState`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStateResult {
    /// Heights at which new consensus states were recorded.
    pub heights: Vec<Height>,
}

/// Result of [`QueryMsg::CheckForMisbehaviour`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckForMisbehaviourResult {
    /// Whether the message evidences misbehaviour.
    pub found_misbehaviour: bool,
}

/// Result of [`QueryMsg::TimestampAtHeight`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampAtHeightResult {
    /// Consensus timestamp at the height, unix nanoseconds.
    pub timestamp_ns: u64,
}

/// Result of [`QueryMsg::Status`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    /// The status rendered as `Active`, `Frozen` or `Expired`.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use ibc_aegis_types::height::Height;

    use super::{SudoMsg, VerifyMembershipMsg};

    #[test]
    fn sudo_msg_json_shape_is_tagged() {
        let msg = SudoMsg::VerifyMembership(VerifyMembershipMsg {
            height: Height::new(0, 5),
            merkle_path: vec![b"ibc".to_vec(), b"key".to_vec()],
            value: b"value".to_vec(),
            proof: b"proof".to_vec(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("VerifyMembership").is_some());
        let back: SudoMsg = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
