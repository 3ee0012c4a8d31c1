//! The proof verifier: resolves a client and dispatches proof checks.
//!
//! Every membership check is scoped to a consensus state at an explicit
//! height and to the counterparty's commitment prefix. Frozen and expired
//! clients reject all proofs.

use ibc_aegis_client_cometbft as cometbft;
use ibc_aegis_client_lite as lite;
use ibc_aegis_client_wasm::engine::parse_response;
use ibc_aegis_client_wasm::msgs::{
    QueryMsg, SudoMsg, TimestampAtHeightMsg, TimestampAtHeightResult, VerifyMembershipMsg,
    VerifyNonMembershipMsg,
};
use ibc_aegis_types::height::Height;
use ibc_aegis_types::identifiers::ClientId;
use ibc_aegis_types::store::HostStore;

use crate::client::{mock, AnyClientState, AnyConsensusState};
use crate::errors::ClientError;
use crate::{Env, IbcHost, WasmEngine};

impl<S: HostStore, E: WasmEngine> IbcHost<S, E> {
    /// Verify that `value` is committed under `prefix/path` in the
    /// counterparty state root the client verified at `proof_height`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidProof`] on verification failure, and
    /// status/lookup errors if the client cannot verify at this height.
    pub(crate) fn verify_client_membership(
        &mut self,
        env: &Env,
        client_id: &ClientId,
        proof_height: Height,
        prefix: &[u8],
        path: &str,
        value: &[u8],
        proof: &[u8],
    ) -> Result<(), ClientError> {
        self.ensure_client_active(env, client_id)?;
        match self.read_client_state(client_id)? {
            AnyClientState::CometBft(_) => {
                let consensus = self.expect_consensus(client_id, proof_height)?;
                let AnyConsensusState::CometBft(consensus) = consensus else {
                    return Err(variant_mismatch());
                };
                cometbft::membership::verify_membership(
                    &consensus.root,
                    prefix,
                    path.as_bytes(),
                    value,
                    proof,
                )
                .map_err(invalid_proof)
            }
            AnyClientState::Wasm(cs) => {
                self.wasm_sudo(
                    client_id,
                    &cs.checksum,
                    &SudoMsg::VerifyMembership(VerifyMembershipMsg {
                        height: proof_height,
                        merkle_path: vec![prefix.to_vec(), path.as_bytes().to_vec()],
                        value: value.to_vec(),
                        proof: proof.to_vec(),
                    }),
                )
                .map_err(|e| ClientError::InvalidProof {
                    reason: e.to_string(),
                })?;
                Ok(())
            }
            AnyClientState::Lite(_) => {
                let consensus = self.expect_consensus(client_id, proof_height)?;
                let AnyConsensusState::Lite(consensus) = consensus else {
                    return Err(variant_mismatch());
                };
                lite::verify_membership(&consensus, prefix, path.as_bytes(), value, proof)
                    .map_err(invalid_proof)
            }
            AnyClientState::Mock(_) => {
                self.expect_consensus(client_id, proof_height)?;
                if proof == mock::membership_proof(prefix, path, value) {
                    Ok(())
                } else {
                    Err(ClientError::InvalidProof {
                        reason: "mock proof does not match expected commitment".to_string(),
                    })
                }
            }
        }
    }

    /// Verify that nothing is committed under `prefix/path` in the
    /// counterparty state root the client verified at `proof_height`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidProof`] on verification failure, and
    /// status/lookup errors if the client cannot verify at this height.
    pub(crate) fn verify_client_non_membership(
        &mut self,
        env: &Env,
        client_id: &ClientId,
        proof_height: Height,
        prefix: &[u8],
        path: &str,
        proof: &[u8],
    ) -> Result<(), ClientError> {
        self.ensure_client_active(env, client_id)?;
        match self.read_client_state(client_id)? {
            AnyClientState::CometBft(_) => {
                let consensus = self.expect_consensus(client_id, proof_height)?;
                let AnyConsensusState::CometBft(consensus) = consensus else {
                    return Err(variant_mismatch());
                };
                cometbft::membership::verify_non_membership(
                    &consensus.root,
                    prefix,
                    path.as_bytes(),
                    proof,
                )
                .map_err(invalid_proof)
            }
            AnyClientState::Wasm(cs) => {
                self.wasm_sudo(
                    client_id,
                    &cs.checksum,
                    &SudoMsg::VerifyNonMembership(VerifyNonMembershipMsg {
                        height: proof_height,
                        merkle_path: vec![prefix.to_vec(), path.as_bytes().to_vec()],
                        proof: proof.to_vec(),
                    }),
                )
                .map_err(|e| ClientError::InvalidProof {
                    reason: e.to_string(),
                })?;
                Ok(())
            }
            AnyClientState::Lite(_) => {
                let consensus = self.expect_consensus(client_id, proof_height)?;
                let AnyConsensusState::Lite(consensus) = consensus else {
                    return Err(variant_mismatch());
                };
                lite::verify_non_membership(&consensus, prefix, path.as_bytes(), proof)
                    .map_err(invalid_proof)
            }
            AnyClientState::Mock(_) => {
                self.expect_consensus(client_id, proof_height)?;
                if proof == mock::absence_proof(prefix, path) {
                    Ok(())
                } else {
                    Err(ClientError::InvalidProof {
                        reason: "mock proof does not match expected absence".to_string(),
                    })
                }
            }
        }
    }

    /// The counterparty consensus timestamp the client recorded at
    /// `height`, used for packet timeout checks.
    ///
    /// # Errors
    /// Fails if no consensus state exists at the height or the variant
    /// does not expose one.
    pub(crate) fn client_timestamp_at_height(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<u64, ClientError> {
        match self.read_client_state(client_id)? {
            AnyClientState::Wasm(cs) => {
                let bytes = self.wasm_query(
                    client_id,
                    &cs.checksum,
                    &QueryMsg::TimestampAtHeight(TimestampAtHeightMsg { height }),
                )?;
                let result: TimestampAtHeightResult =
                    parse_response("timestamp_at_height", &bytes)?;
                Ok(result.timestamp_ns)
            }
            _ => {
                let consensus = self.expect_consensus(client_id, height)?;
                consensus
                    .timestamp_ns()
                    .ok_or_else(|| ClientError::InvalidClientState {
                        reason: "stored consensus state variant mismatch".to_string(),
                    })
            }
        }
    }

    fn expect_consensus(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<AnyConsensusState, ClientError> {
        self.read_consensus_state(client_id, height)?.ok_or_else(|| {
            ClientError::ConsensusStateNotFound {
                client_id: client_id.clone(),
                height,
            }
        })
    }
}

fn invalid_proof(err: impl std::fmt::Display) -> ClientError {
    ClientError::InvalidProof {
        reason: err.to_string(),
    }
}

fn variant_mismatch() -> ClientError {
    ClientError::InvalidClientState {
        reason: "stored consensus state variant does not match the client".to_string(),
    }
}
