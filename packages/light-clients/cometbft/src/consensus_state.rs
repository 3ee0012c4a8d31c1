//! CometBFT consensus state and conversions to the verifier's types.

use ibc_aegis_types::serde_util::base64bytes;
use ibc_client_tendermint::types::ConsensusState as TmConsensusState;
use ibc_core_commitment_types::commitment::CommitmentRoot;
use serde::{Deserialize, Serialize};
use tendermint::hash::Algorithm;
use tendermint::{Hash, Time};

use crate::error::CometBftError;

/// A verified snapshot of the counterparty chain at one height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusState {
    /// Block time, unix nanoseconds.
    pub timestamp_ns: u64,
    /// The app-state commitment root proofs are verified against.
    #[serde(with = "base64bytes")]
    pub root: Vec<u8>,
    /// Hash of the validator set authorized to sign the next block.
    #[serde(with = "base64bytes")]
    pub next_validators_hash: Vec<u8>,
}

#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
impl TryFrom<&ConsensusState> for TmConsensusState {
    type Error = CometBftError;

    fn try_from(cs: &ConsensusState) -> Result<Self, Self::Error> {
        let secs = (cs.timestamp_ns / 1_000_000_000) as i64;
        let nanos = (cs.timestamp_ns % 1_000_000_000) as u32;
        let timestamp = Time::from_unix_timestamp(secs, nanos).map_err(|e| {
            CometBftError::InvalidTimestamp {
                reason: e.to_string(),
            }
        })?;
        let next_validators_hash = Hash::from_bytes(Algorithm::Sha256, &cs.next_validators_hash)
            .map_err(|e| CometBftError::InvalidClientState {
                reason: format!("next validators hash: {e}"),
            })?;
        Ok(Self {
            timestamp,
            root: CommitmentRoot::from_bytes(&cs.root),
            next_validators_hash,
        })
    }
}

impl TryFrom<TmConsensusState> for ConsensusState {
    type Error = CometBftError;

    fn try_from(cs: TmConsensusState) -> Result<Self, Self::Error> {
        let timestamp_ns = u64::try_from(cs.timestamp.unix_timestamp_nanos()).map_err(|_| {
            CometBftError::InvalidTimestamp {
                reason: "block time precedes the unix epoch".to_string(),
            }
        })?;
        Ok(Self {
            timestamp_ns,
            root: cs.root.as_bytes().to_vec(),
            next_validators_hash: cs.next_validators_hash.as_bytes().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use ibc_client_tendermint::types::ConsensusState as TmConsensusState;

    use super::ConsensusState;

    fn sample() -> ConsensusState {
        ConsensusState {
            timestamp_ns: 1_700_000_000_123_456_789,
            root: vec![7; 32],
            next_validators_hash: vec![9; 32],
        }
    }

    #[test]
    fn converts_to_verifier_type_and_back() {
        let ours = sample();
        let theirs = TmConsensusState::try_from(&ours).unwrap();
        let back = ConsensusState::try_from(theirs).unwrap();
        assert_eq!(back, ours);
    }

    #[test]
    fn malformed_validator_hash_is_rejected() {
        let mut cs = sample();
        cs.next_validators_hash = vec![9; 31];
        assert!(TmConsensusState::try_from(&cs).is_err());
    }

    #[test]
    fn stored_encoding_is_stable_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("timestamp_ns").is_some());
        assert!(json["root"].is_string());
    }
}
