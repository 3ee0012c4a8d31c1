//! The validation context handed to the `ibc-client-tendermint` verifier.

use std::collections::HashMap;

use ibc_client_tendermint::client_state::ClientState as ClientStateWrapper;
use ibc_client_tendermint::consensus_state::ConsensusState as ConsensusStateWrapper;
use ibc_client_tendermint::types::ConsensusState;
use ibc_core_client::context::{ClientValidationContext, ExtClientValidationContext};
use ibc_core_client::types::Height;
use ibc_core_host_types::error::HostError;
use ibc_core_host_types::identifiers::ClientId;
use ibc_core_host_types::path::ClientConsensusStatePath;
use ibc_primitives::Timestamp;

/// Client validation context seeded with the trusted consensus states an
/// update or misbehaviour submission declares.
///
/// Invariant: callers insert every trusted height the evidence references
/// before verification runs, so lookups cannot miss.
pub(crate) struct TrustedStateCtx {
    now_ns: u64,
    trusted: HashMap<ClientConsensusStatePath, ConsensusState>,
}

impl TrustedStateCtx {
    /// Create a context evaluated at the given host time.
    pub(crate) fn new(now_ns: u64) -> Self {
        Self {
            now_ns,
            trusted: HashMap::new(),
        }
    }

    /// Insert a trusted consensus state at a height.
    pub(crate) fn insert_trusted_consensus_state(
        &mut self,
        client_id: ClientId,
        revision_number: u64,
        revision_height: u64,
        consensus_state: ConsensusState,
    ) {
        self.trusted.insert(
            ClientConsensusStatePath::new(client_id, revision_number, revision_height),
            consensus_state,
        );
    }
}

impl ClientValidationContext for TrustedStateCtx {
    type ClientStateRef = ClientStateWrapper;
    type ConsensusStateRef = ConsensusStateWrapper;

    fn consensus_state(
        &self,
        path: &ClientConsensusStatePath,
    ) -> Result<Self::ConsensusStateRef, HostError> {
        Ok(self.trusted[path].clone().into())
    }

    fn client_state(&self, _client_id: &ClientId) -> Result<Self::ClientStateRef, HostError> {
        // not needed by `verify_header` / `verify_misbehaviour`
        unimplemented!()
    }

    fn client_update_meta(
        &self,
        _client_id: &ClientId,
        _height: &Height,
    ) -> Result<(Timestamp, Height), HostError> {
        // not needed by `verify_header` / `verify_misbehaviour`
        unimplemented!()
    }
}

impl ExtClientValidationContext for TrustedStateCtx {
    fn host_timestamp(&self) -> Result<Timestamp, HostError> {
        Ok(Timestamp::from_nanoseconds(self.now_ns))
    }

    fn host_height(&self) -> Result<Height, HostError> {
        // not needed by `verify_header` / `verify_misbehaviour`
        unimplemented!()
    }

    fn consensus_state_heights(&self, _client_id: &ClientId) -> Result<Vec<Height>, HostError> {
        // not needed by `verify_header` / `verify_misbehaviour`
        unimplemented!()
    }

    fn next_consensus_state(
        &self,
        _client_id: &ClientId,
        _height: &Height,
    ) -> Result<Option<Self::ConsensusStateRef>, HostError> {
        // not needed by `verify_header` / `verify_misbehaviour`
        unimplemented!()
    }

    fn prev_consensus_state(
        &self,
        _client_id: &ClientId,
        _height: &Height,
    ) -> Result<Option<Self::ConsensusStateRef>, HostError> {
        // not needed by `verify_header` / `verify_misbehaviour`
        unimplemented!()
    }
}
