//! Conflicting-header misbehaviour verification.

use ibc_aegis_types::height::Height;
use ibc_client_tendermint::client_state::{
    check_for_misbehaviour_on_misbehavior, verify_misbehaviour as tm_verify_misbehaviour,
};
use ibc_client_tendermint::types::{
    ConsensusState as TmConsensusState, Misbehaviour, TENDERMINT_CLIENT_TYPE,
};
use ibc_core_host_types::identifiers::{ChainId, ClientId};
use ibc_proto::ibc::lightclients::tendermint::v1::Misbehaviour as RawMisbehaviour;
use ibc_proto::Protobuf;
use tendermint_light_client_verifier::ProdVerifier;

use crate::client_state::ClientState;
use crate::consensus_state::ConsensusState;
use crate::error::CometBftError;
use crate::validation::TrustedStateCtx;

/// Verify submitted misbehaviour evidence: two headers that are
/// individually valid against their trusted consensus states but
/// mutually conflicting.
///
/// Success means the client must be frozen by the caller.
///
/// # Errors
/// Returns a typed error if the evidence does not decode, references an
/// unknown trusted height, fails header verification, or the two headers
/// do not actually conflict.
pub fn verify_misbehaviour(
    client_state: &ClientState,
    misbehaviour_bytes: &[u8],
    now_ns: u64,
    trusted_lookup: impl Fn(Height) -> Option<ConsensusState>,
) -> Result<(), CometBftError> {
    let misbehaviour = <Misbehaviour as Protobuf<RawMisbehaviour>>::decode_vec(misbehaviour_bytes)
        .map_err(|e| CometBftError::InvalidMisbehaviour {
            reason: e.to_string(),
        })?;

    // header2's chain id is cross-checked by `verify_misbehaviour`.
    let header1_chain_id = misbehaviour
        .header1()
        .signed_header
        .header
        .chain_id
        .to_string();
    if header1_chain_id != client_state.chain_id {
        return Err(CometBftError::InvalidMisbehaviour {
            reason: format!(
                "evidence chain id `{header1_chain_id}` does not match client chain id `{}`",
                client_state.chain_id
            ),
        });
    }

    let client_id = ClientId::new(TENDERMINT_CLIENT_TYPE, 0).map_err(|e| {
        CometBftError::InvalidClientState {
            reason: e.to_string(),
        }
    })?;
    let chain_id =
        ChainId::new(&client_state.chain_id).map_err(|e| CometBftError::InvalidClientState {
            reason: e.to_string(),
        })?;
    let options = client_state.options()?;

    let mut ctx = TrustedStateCtx::new(now_ns);
    for header in [misbehaviour.header1(), misbehaviour.header2()] {
        let trusted_height = Height::new(
            header.trusted_height.revision_number(),
            header.trusted_height.revision_height(),
        );
        let trusted =
            trusted_lookup(trusted_height).ok_or(CometBftError::ConsensusStateNotFound {
                height: trusted_height,
            })?;
        let trusted_tm: TmConsensusState = (&trusted).try_into()?;
        ctx.insert_trusted_consensus_state(
            client_id.clone(),
            trusted_height.revision_number,
            trusted_height.revision_height,
            trusted_tm,
        );
    }

    tm_verify_misbehaviour::<_, sha2::Sha256>(
        &ctx,
        &misbehaviour,
        &client_id,
        &chain_id,
        &options,
        &ProdVerifier::default(),
    )
    .map_err(|e| CometBftError::HeaderVerification {
        reason: e.to_string(),
    })?;

    let conflicting =
        check_for_misbehaviour_on_misbehavior(misbehaviour.header1(), misbehaviour.header2())
            .map_err(|e| CometBftError::InvalidMisbehaviour {
                reason: e.to_string(),
            })?;
    if !conflicting {
        return Err(CometBftError::NotMisbehaviour);
    }
    Ok(())
}
