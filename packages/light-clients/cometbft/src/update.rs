//! Header verification for client updates.

use ibc_aegis_types::height::Height;
use ibc_client_tendermint::client_state::verify_header as tm_verify_header;
use ibc_client_tendermint::types::{
    ConsensusState as TmConsensusState, Header, TENDERMINT_CLIENT_TYPE,
};
use ibc_core_host_types::identifiers::{ChainId, ClientId};
use ibc_proto::ibc::lightclients::tendermint::v1::Header as RawHeader;
use ibc_proto::Protobuf;
use tendermint_light_client_verifier::ProdVerifier;

use crate::client_state::ClientState;
use crate::consensus_state::ConsensusState;
use crate::error::CometBftError;
use crate::validation::TrustedStateCtx;

/// The outcome of a successful header verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedHeader {
    /// The height the header commits to.
    pub height: Height,
    /// The new consensus state to record at that height.
    pub consensus_state: ConsensusState,
}

/// Decode a protobuf-encoded header.
///
/// # Errors
/// Returns [`CometBftError::InvalidHeader`] if the bytes do not decode.
pub fn decode_header(header_bytes: &[u8]) -> Result<Header, CometBftError> {
    <Header as Protobuf<RawHeader>>::decode_vec(header_bytes).map_err(|e| {
        CometBftError::InvalidHeader {
            reason: e.to_string(),
        }
    })
}

/// Verify a counterparty header against a trusted consensus state and
/// produce the consensus state to record.
///
/// `trusted_lookup` resolves a consensus state previously stored for this
/// client; the header names the height it trusts.
///
/// # Errors
/// Returns a typed error if the header does not decode, no consensus state
/// exists at the trusted height, or signature/trusting-period verification
/// fails. Verification is never retried here; the caller must resubmit
/// with fresh evidence.
pub fn verify_header(
    client_state: &ClientState,
    header_bytes: &[u8],
    now_ns: u64,
    trusted_lookup: impl Fn(Height) -> Option<ConsensusState>,
) -> Result<VerifiedHeader, CometBftError> {
    let header = decode_header(header_bytes)?;

    let trusted_height = Height::new(
        header.trusted_height.revision_number(),
        header.trusted_height.revision_height(),
    );
    let trusted = trusted_lookup(trusted_height).ok_or(CometBftError::ConsensusStateNotFound {
        height: trusted_height,
    })?;
    let trusted_tm: TmConsensusState = (&trusted).try_into()?;

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
    ctx.insert_trusted_consensus_state(
        client_id.clone(),
        trusted_height.revision_number,
        trusted_height.revision_height,
        trusted_tm,
    );

    tm_verify_header::<_, sha2::Sha256>(
        &ctx,
        &header,
        &client_id,
        &chain_id,
        &options,
        &ProdVerifier::default(),
    )
    .map_err(|e| CometBftError::HeaderVerification {
        reason: e.to_string(),
    })?;

    let height = Height::new(
        header.height().revision_number(),
        header.height().revision_height(),
    );
    let consensus_state = TmConsensusState::from(header).try_into()?;

    Ok(VerifiedHeader {
        height,
        consensus_state,
    })
}

#[cfg(test)]
mod tests {
    use ibc_aegis_types::height::Height;

    use super::verify_header;
    use crate::client_state::{ClientState, TrustThreshold};

    fn client_state() -> ClientState {
        ClientState {
            chain_id: "aegis-1".to_string(),
            trust_level: TrustThreshold::ONE_THIRD,
            trusting_period_secs: 1_209_600,
            unbonding_period_secs: 1_814_400,
            max_clock_drift_secs: 15,
            latest_height: Height::new(1, 10),
            frozen_height: None,
        }
    }

    #[test]
    fn garbage_header_bytes_are_a_typed_error() {
        let err = verify_header(&client_state(), b"not a header", 0, |_| None).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CometBftError::InvalidHeader { .. }
        ));
    }

    #[test]
    fn empty_header_bytes_are_a_typed_error() {
        // An empty protobuf message decodes structurally but carries no
        // signed header, which must surface as an error, not a panic.
        assert!(verify_header(&client_state(), &[], 0, |_| None).is_err());
    }
}
