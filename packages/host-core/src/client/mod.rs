//! The client keeper: registration, updates, misbehaviour and status.
//!
//! Light clients are a closed set of tagged variants behind one
//! verification surface; the keeper dispatches on the stored tag. The
//! sandboxed variant forwards every call to the engine with a store view
//! scoped to the client instance.

pub mod mock;

use ibc_aegis_client_cometbft as cometbft;
use ibc_aegis_client_lite as lite;
use ibc_aegis_client_wasm::engine::parse_response;
use ibc_aegis_client_wasm::msgs::{
    CheckForMisbehaviourMsg, CheckForMisbehaviourResult, InstantiateMsg, QueryMsg, StatusMsg,
    StatusResult, SudoMsg, UpdateStateMsg, UpdateStateOnMisbehaviourMsg, UpdateStateResult,
    VerifyClientMessageMsg,
};
use ibc_aegis_client_wasm::{code_store, EngineError, WasmClientState, WasmConsensusState};
use ibc_aegis_types::client::Status;
use ibc_aegis_types::height::Height;
use ibc_aegis_types::identifiers::{ClientId, ClientType};
use ibc_aegis_types::path;
use ibc_aegis_types::store::{
    get_json, set_json, HostStore, PrefixedStore, ReadPrefixedStore, StoreError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{ClientError, HostError};
use crate::msgs::{MsgCreateClient, MsgProvideCounterparty, MsgSubmitMisbehaviour, MsgUpdateClient};
use crate::{Env, IbcHost, WasmEngine};

use self::mock::{MockClientState, MockConsensusState, MockHeader};

/// The closed set of client states, tagged by client type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnyClientState {
    /// Native CometBFT consensus verification.
    #[serde(rename = "07-cometbft")]
    CometBft(cometbft::ClientState),
    /// Verification forwarded to sandboxed bytecode.
    #[serde(rename = "08-wasm")]
    Wasm(WasmClientState),
    /// Counterparty provisioned out of band.
    #[serde(rename = "09-lite")]
    Lite(lite::LiteClientState),
    /// Deterministic test client.
    #[serde(rename = "00-mock")]
    Mock(MockClientState),
}

impl AnyClientState {
    /// The variant tag.
    #[must_use]
    pub const fn client_type(&self) -> ClientType {
        match self {
            Self::CometBft(_) => ClientType::CometBft,
            Self::Wasm(_) => ClientType::Wasm,
            Self::Lite(_) => ClientType::Lite,
            Self::Mock(_) => ClientType::Mock,
        }
    }

    /// Height of the newest recorded consensus state.
    #[must_use]
    pub const fn latest_height(&self) -> Height {
        match self {
            Self::CometBft(cs) => cs.latest_height,
            Self::Wasm(cs) => cs.latest_height,
            Self::Lite(cs) => cs.latest_height,
            Self::Mock(cs) => cs.latest_height,
        }
    }

    /// Whether misbehaviour froze the client.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        match self {
            Self::CometBft(cs) => cs.frozen_height.is_some(),
            Self::Wasm(cs) => cs.is_frozen,
            Self::Lite(cs) => cs.is_frozen,
            Self::Mock(cs) => cs.is_frozen,
        }
    }
}

/// The closed set of consensus states, tagged by client type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnyConsensusState {
    /// Native CometBFT snapshot.
    #[serde(rename = "07-cometbft")]
    CometBft(cometbft::ConsensusState),
    /// Opaque sandbox-managed blob, only handed to the engine at
    /// instantiation.
    #[serde(rename = "08-wasm")]
    Wasm(WasmConsensusState),
    /// Unverified counterparty-claimed snapshot.
    #[serde(rename = "09-lite")]
    Lite(lite::LiteConsensusState),
    /// Mock snapshot.
    #[serde(rename = "00-mock")]
    Mock(MockConsensusState),
}

impl AnyConsensusState {
    /// The variant tag.
    #[must_use]
    pub const fn client_type(&self) -> ClientType {
        match self {
            Self::CometBft(_) => ClientType::CometBft,
            Self::Wasm(_) => ClientType::Wasm,
            Self::Lite(_) => ClientType::Lite,
            Self::Mock(_) => ClientType::Mock,
        }
    }

    /// The snapshot's timestamp, if the host tracks it for this variant.
    #[must_use]
    pub const fn timestamp_ns(&self) -> Option<u64> {
        match self {
            Self::CometBft(cs) => Some(cs.timestamp_ns),
            Self::Lite(cs) => Some(cs.timestamp_ns),
            Self::Mock(cs) => Some(cs.timestamp_ns),
            Self::Wasm(_) => None,
        }
    }
}

/// The outcome of a client update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The message verified; consensus states were recorded at `heights`.
    /// Empty when the update duplicated an already-recorded state.
    Updated {
        /// Newly recorded heights.
        heights: Vec<Height>,
    },
    /// The message evidenced misbehaviour; the client is now frozen.
    Misbehaviour,
}

/// Host-side bookkeeping recorded with every consensus state, consumed by
/// external retention/pruning policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUpdateMeta {
    /// Host height when the consensus state was recorded.
    pub host_height: Height,
    /// Host time when the consensus state was recorded.
    pub host_timestamp_ns: u64,
}

fn from_cometbft_err(client_id: &ClientId, err: cometbft::CometBftError) -> ClientError {
    use cometbft::CometBftError as E;
    match err {
        E::ConsensusStateNotFound { height } => ClientError::ConsensusStateNotFound {
            client_id: client_id.clone(),
            height,
        },
        E::InvalidHeader { reason } | E::HeaderVerification { reason } => {
            ClientError::InvalidHeader { reason }
        }
        E::InvalidMisbehaviour { reason } => ClientError::InvalidMisbehaviour { reason },
        E::NotMisbehaviour => ClientError::InvalidMisbehaviour {
            reason: "headers do not conflict".to_string(),
        },
        E::InvalidProof { reason } => ClientError::InvalidProof { reason },
        E::InvalidClientState { reason } | E::InvalidTimestamp { reason } => {
            ClientError::InvalidClientState { reason }
        }
    }
}

impl<S: HostStore, E: WasmEngine> IbcHost<S, E> {
    /// Register a new light client and return its allocated identifier.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidClientState`] (wrapped) for malformed
    /// or mismatched initial states.
    pub fn create_client(&mut self, env: &Env, msg: MsgCreateClient) -> Result<ClientId, HostError> {
        let MsgCreateClient {
            client_state,
            consensus_state,
        } = msg;

        let client_type = client_state.client_type();
        if consensus_state.client_type() != client_type {
            return Err(ClientError::InvalidClientState {
                reason: format!(
                    "consensus state variant {} does not match client state variant {client_type}",
                    consensus_state.client_type()
                ),
            }
            .into());
        }
        if client_state.is_frozen() {
            return Err(ClientError::InvalidClientState {
                reason: "new client must not be frozen".to_string(),
            }
            .into());
        }

        let counter_path = path::next_client_sequence(client_type.prefix());
        let counter: u64 = get_json(&self.store, &counter_path)
            .map_err(ClientError::Store)?
            .unwrap_or(0);
        let client_id = ClientId::new(client_type, counter);

        match (&client_state, &consensus_state) {
            (AnyClientState::CometBft(cs), AnyConsensusState::CometBft(_)) => {
                cs.validate()
                    .map_err(|e| from_cometbft_err(&client_id, e))?;
            }
            (AnyClientState::Wasm(cs), AnyConsensusState::Wasm(cons)) => {
                if !code_store::has_code(&self.store, &cs.checksum) {
                    return Err(ClientError::InvalidClientState {
                        reason: format!("no code stored for checksum {}", cs.checksum),
                    }
                    .into());
                }
                let instantiate = InstantiateMsg {
                    client_state: cs.data.clone(),
                    consensus_state: cons.data.clone(),
                    checksum: cs.checksum,
                };
                let prefix = path::client_sandbox_prefix(&client_id);
                let Self { store, engine, .. } = self;
                let mut scoped = PrefixedStore::new(prefix, store);
                engine
                    .instantiate(&cs.checksum, &mut scoped, &instantiate)
                    .map_err(ClientError::Engine)?;
            }
            (AnyClientState::Lite(_) | AnyClientState::Mock(_), _) => {}
            _ => {
                return Err(ClientError::InvalidClientState {
                    reason: "client and consensus state variants do not match".to_string(),
                }
                .into());
            }
        }

        let latest_height = client_state.latest_height();
        self.write_client_state(&client_id, &client_state)
            .map_err(ClientError::Store)?;
        if !matches!(consensus_state, AnyConsensusState::Wasm(_)) {
            self.write_consensus_state(env, &client_id, latest_height, &consensus_state)
                .map_err(ClientError::Store)?;
        }
        set_json(&mut self.store, &counter_path, &(counter + 1)).map_err(ClientError::Store)?;

        info!(client_id = %client_id, client_type = %client_type, height = %latest_height, "created client");
        Ok(client_id)
    }

    /// Apply a client update message (header).
    ///
    /// A verified header that conflicts with an already-recorded consensus
    /// state at the same height is misbehaviour and freezes the client.
    ///
    /// # Errors
    /// Returns a [`ClientError`] (wrapped) if the client is missing, not
    /// active, or the message does not verify.
    pub fn update_client(
        &mut self,
        env: &Env,
        msg: &MsgUpdateClient,
    ) -> Result<UpdateOutcome, HostError> {
        let client_id = &msg.client_id;
        self.ensure_client_active(env, client_id)?;
        let state = self.read_client_state(client_id)?;

        let outcome = match state {
            AnyClientState::CometBft(mut cs) => {
                let verified = cometbft::update::verify_header(
                    &cs,
                    &msg.client_message,
                    env.timestamp_ns,
                    |height| self.cometbft_consensus_at(client_id, height),
                )
                .map_err(|e| from_cometbft_err(client_id, e))?;

                match self.read_consensus_state(client_id, verified.height)? {
                    Some(AnyConsensusState::CometBft(existing))
                        if existing != verified.consensus_state =>
                    {
                        cs.frozen_height = Some(verified.height);
                        self.write_client_state(client_id, &AnyClientState::CometBft(cs))
                            .map_err(ClientError::Store)?;
                        warn!(client_id = %client_id, height = %verified.height, "conflicting header, client frozen");
                        UpdateOutcome::Misbehaviour
                    }
                    Some(_) => {
                        debug!(client_id = %client_id, height = %verified.height, "duplicate header, no-op");
                        UpdateOutcome::Updated { heights: vec![] }
                    }
                    None => {
                        if verified.height > cs.latest_height {
                            cs.latest_height = verified.height;
                        }
                        self.write_consensus_state(
                            env,
                            client_id,
                            verified.height,
                            &AnyConsensusState::CometBft(verified.consensus_state),
                        )
                        .map_err(ClientError::Store)?;
                        self.write_client_state(client_id, &AnyClientState::CometBft(cs))
                            .map_err(ClientError::Store)?;
                        UpdateOutcome::Updated {
                            heights: vec![verified.height],
                        }
                    }
                }
            }
            AnyClientState::Wasm(mut cs) => {
                let checksum = cs.checksum;
                self.wasm_query(
                    client_id,
                    &checksum,
                    &QueryMsg::VerifyClientMessage(VerifyClientMessageMsg {
                        client_message: msg.client_message.clone(),
                    }),
                )
                .map_err(|e| ClientError::InvalidHeader {
                    reason: e.to_string(),
                })?;

                let found: CheckForMisbehaviourResult = {
                    let bytes = self.wasm_query(
                        client_id,
                        &checksum,
                        &QueryMsg::CheckForMisbehaviour(CheckForMisbehaviourMsg {
                            client_message: msg.client_message.clone(),
                        }),
                    )?;
                    parse_response("check_for_misbehaviour", &bytes).map_err(ClientError::Engine)?
                };

                if found.found_misbehaviour {
                    self.wasm_sudo(
                        client_id,
                        &checksum,
                        &SudoMsg::UpdateStateOnMisbehaviour(UpdateStateOnMisbehaviourMsg {
                            client_message: msg.client_message.clone(),
                        }),
                    )?;
                    cs.is_frozen = true;
                    self.write_client_state(client_id, &AnyClientState::Wasm(cs))
                        .map_err(ClientError::Store)?;
                    warn!(client_id = %client_id, "sandboxed client reported misbehaviour, client frozen");
                    UpdateOutcome::Misbehaviour
                } else {
                    let bytes = self.wasm_sudo(
                        client_id,
                        &checksum,
                        &SudoMsg::UpdateState(UpdateStateMsg {
                            client_message: msg.client_message.clone(),
                        }),
                    )?;
                    let result: UpdateStateResult =
                        parse_response("update_state", &bytes).map_err(ClientError::Engine)?;
                    for height in &result.heights {
                        self.write_update_meta(env, client_id, *height)
                            .map_err(ClientError::Store)?;
                        if *height > cs.latest_height {
                            cs.latest_height = *height;
                        }
                    }
                    self.write_client_state(client_id, &AnyClientState::Wasm(cs))
                        .map_err(ClientError::Store)?;
                    UpdateOutcome::Updated {
                        heights: result.heights,
                    }
                }
            }
            AnyClientState::Lite(mut cs) => {
                let header = lite::decode_header(&msg.client_message).map_err(|e| {
                    ClientError::InvalidHeader {
                        reason: e.to_string(),
                    }
                })?;
                let new_consensus = lite::consensus_state(&header);

                match self.read_consensus_state(client_id, header.height)? {
                    Some(AnyConsensusState::Lite(existing)) if existing != new_consensus => {
                        cs.is_frozen = true;
                        self.write_client_state(client_id, &AnyClientState::Lite(cs))
                            .map_err(ClientError::Store)?;
                        warn!(client_id = %client_id, height = %header.height, "conflicting lite header, client frozen");
                        UpdateOutcome::Misbehaviour
                    }
                    Some(_) => UpdateOutcome::Updated { heights: vec![] },
                    None => {
                        if header.height > cs.latest_height {
                            cs.latest_height = header.height;
                        }
                        self.write_consensus_state(
                            env,
                            client_id,
                            header.height,
                            &AnyConsensusState::Lite(new_consensus),
                        )
                        .map_err(ClientError::Store)?;
                        self.write_client_state(client_id, &AnyClientState::Lite(cs))
                            .map_err(ClientError::Store)?;
                        UpdateOutcome::Updated {
                            heights: vec![header.height],
                        }
                    }
                }
            }
            AnyClientState::Mock(mut cs) => {
                let header: MockHeader = serde_json::from_slice(&msg.client_message)
                    .map_err(|e| ClientError::InvalidHeader {
                        reason: e.to_string(),
                    })?;
                let new_consensus = MockConsensusState {
                    timestamp_ns: header.timestamp_ns,
                };

                match self.read_consensus_state(client_id, header.height)? {
                    Some(AnyConsensusState::Mock(existing)) if existing != new_consensus => {
                        cs.is_frozen = true;
                        self.write_client_state(client_id, &AnyClientState::Mock(cs))
                            .map_err(ClientError::Store)?;
                        UpdateOutcome::Misbehaviour
                    }
                    Some(_) => UpdateOutcome::Updated { heights: vec![] },
                    None => {
                        if header.height > cs.latest_height {
                            cs.latest_height = header.height;
                        }
                        self.write_consensus_state(
                            env,
                            client_id,
                            header.height,
                            &AnyConsensusState::Mock(new_consensus),
                        )
                        .map_err(ClientError::Store)?;
                        self.write_client_state(client_id, &AnyClientState::Mock(cs))
                            .map_err(ClientError::Store)?;
                        UpdateOutcome::Updated {
                            heights: vec![header.height],
                        }
                    }
                }
            }
        };

        if let UpdateOutcome::Updated { heights } = &outcome {
            if let Some(height) = heights.last() {
                info!(client_id = %client_id, height = %height, "client updated");
            }
        }
        Ok(outcome)
    }

    /// Verify misbehaviour evidence and freeze the client on success.
    ///
    /// # Errors
    /// Returns a [`ClientError`] (wrapped) if the client is missing, not
    /// active, or the evidence does not hold up.
    pub fn submit_misbehaviour(
        &mut self,
        env: &Env,
        msg: &MsgSubmitMisbehaviour,
    ) -> Result<(), HostError> {
        let client_id = &msg.client_id;
        self.ensure_client_active(env, client_id)?;
        let state = self.read_client_state(client_id)?;

        let frozen_state = match state {
            AnyClientState::CometBft(mut cs) => {
                cometbft::misbehaviour::verify_misbehaviour(
                    &cs,
                    &msg.misbehaviour,
                    env.timestamp_ns,
                    |height| self.cometbft_consensus_at(client_id, height),
                )
                .map_err(|e| from_cometbft_err(client_id, e))?;
                cs.frozen_height = Some(cs.latest_height);
                AnyClientState::CometBft(cs)
            }
            AnyClientState::Wasm(mut cs) => {
                let checksum = cs.checksum;
                self.wasm_query(
                    client_id,
                    &checksum,
                    &QueryMsg::VerifyClientMessage(VerifyClientMessageMsg {
                        client_message: msg.misbehaviour.clone(),
                    }),
                )
                .map_err(|e| ClientError::InvalidMisbehaviour {
                    reason: e.to_string(),
                })?;
                let found: CheckForMisbehaviourResult = {
                    let bytes = self.wasm_query(
                        client_id,
                        &checksum,
                        &QueryMsg::CheckForMisbehaviour(CheckForMisbehaviourMsg {
                            client_message: msg.misbehaviour.clone(),
                        }),
                    )?;
                    parse_response("check_for_misbehaviour", &bytes).map_err(ClientError::Engine)?
                };
                if !found.found_misbehaviour {
                    return Err(ClientError::InvalidMisbehaviour {
                        reason: "evidence does not show misbehaviour".to_string(),
                    }
                    .into());
                }
                self.wasm_sudo(
                    client_id,
                    &checksum,
                    &SudoMsg::UpdateStateOnMisbehaviour(UpdateStateOnMisbehaviourMsg {
                        client_message: msg.misbehaviour.clone(),
                    }),
                )?;
                cs.is_frozen = true;
                AnyClientState::Wasm(cs)
            }
            AnyClientState::Lite(mut cs) => {
                lite::verify_misbehaviour(&msg.misbehaviour).map_err(|e| {
                    ClientError::InvalidMisbehaviour {
                        reason: e.to_string(),
                    }
                })?;
                cs.is_frozen = true;
                AnyClientState::Lite(cs)
            }
            AnyClientState::Mock(mut cs) => {
                cs.is_frozen = true;
                AnyClientState::Mock(cs)
            }
        };

        self.write_client_state(client_id, &frozen_state)
            .map_err(ClientError::Store)?;
        warn!(client_id = %client_id, "misbehaviour accepted, client frozen");
        Ok(())
    }

    /// Bind the out-of-band counterparty of a lite client. One-shot.
    ///
    /// # Errors
    /// Fails for non-lite clients and for clients already provisioned.
    pub fn provide_counterparty(&mut self, msg: &MsgProvideCounterparty) -> Result<(), HostError> {
        let client_id = &msg.client_id;
        match self.read_client_state(client_id)? {
            AnyClientState::Lite(mut cs) => {
                if cs.counterparty.is_some() {
                    return Err(ClientError::Lite(lite::LiteError::CounterpartyAlreadySet).into());
                }
                cs.counterparty = Some(lite::LiteCounterparty {
                    client_id: msg.counterparty_client_id.clone(),
                    merkle_prefix: msg.counterparty_prefix.clone(),
                });
                self.write_client_state(client_id, &AnyClientState::Lite(cs))
                    .map_err(ClientError::Store)?;
                info!(client_id = %client_id, counterparty = %msg.counterparty_client_id, "lite counterparty provisioned");
                Ok(())
            }
            other => Err(ClientError::WrongClientType {
                client_id: client_id.clone(),
                expected: ClientType::Lite,
                actual: other.client_type(),
            }
            .into()),
        }
    }

    /// The lifecycle status of a client at the current host time.
    ///
    /// # Errors
    /// Returns [`ClientError::NotFound`] for unknown clients, or a store/
    /// engine error if state cannot be read.
    pub fn client_status(&self, env: &Env, client_id: &ClientId) -> Result<Status, ClientError> {
        let state = self.read_client_state(client_id)?;
        if state.is_frozen() {
            return Ok(Status::Frozen);
        }
        match state {
            AnyClientState::CometBft(cs) => {
                let consensus = self
                    .read_consensus_state(client_id, cs.latest_height)?
                    .ok_or_else(|| ClientError::ConsensusStateNotFound {
                        client_id: client_id.clone(),
                        height: cs.latest_height,
                    })?;
                let timestamp_ns =
                    consensus
                        .timestamp_ns()
                        .ok_or_else(|| ClientError::InvalidClientState {
                            reason: "stored consensus state variant mismatch".to_string(),
                        })?;
                if cs.expired(timestamp_ns, env.timestamp_ns) {
                    Ok(Status::Expired)
                } else {
                    Ok(Status::Active)
                }
            }
            AnyClientState::Wasm(cs) => {
                let bytes =
                    self.wasm_query(client_id, &cs.checksum, &QueryMsg::Status(StatusMsg {}))?;
                let result: StatusResult = parse_response("status", &bytes)?;
                result
                    .status
                    .parse()
                    .map_err(|e: ibc_aegis_types::client::UnknownStatus| {
                        ClientError::Engine(EngineError::InvalidResponse {
                            context: "status",
                            reason: e.to_string(),
                        })
                    })
            }
            AnyClientState::Lite(_) => Ok(Status::Active),
            AnyClientState::Mock(cs) => {
                if cs.trusting_period_ns == 0 {
                    return Ok(Status::Active);
                }
                let consensus = self
                    .read_consensus_state(client_id, cs.latest_height)?
                    .ok_or_else(|| ClientError::ConsensusStateNotFound {
                        client_id: client_id.clone(),
                        height: cs.latest_height,
                    })?;
                match consensus.timestamp_ns() {
                    Some(ts) if env.timestamp_ns >= ts + cs.trusting_period_ns => {
                        Ok(Status::Expired)
                    }
                    _ => Ok(Status::Active),
                }
            }
        }
    }

    /// Error unless the client exists and is `Active`.
    pub(crate) fn ensure_client_active(
        &self,
        env: &Env,
        client_id: &ClientId,
    ) -> Result<(), ClientError> {
        match self.client_status(env, client_id)? {
            Status::Active => Ok(()),
            Status::Frozen => Err(ClientError::Frozen {
                client_id: client_id.clone(),
            }),
            Status::Expired => Err(ClientError::Expired {
                client_id: client_id.clone(),
            }),
        }
    }

    pub(crate) fn read_client_state(
        &self,
        client_id: &ClientId,
    ) -> Result<AnyClientState, ClientError> {
        get_json(&self.store, &path::client_state(client_id))?.ok_or_else(|| {
            ClientError::NotFound {
                client_id: client_id.clone(),
            }
        })
    }

    pub(crate) fn write_client_state(
        &mut self,
        client_id: &ClientId,
        state: &AnyClientState,
    ) -> Result<(), StoreError> {
        set_json(&mut self.store, &path::client_state(client_id), state)
    }

    pub(crate) fn read_consensus_state(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<Option<AnyConsensusState>, ClientError> {
        Ok(get_json(
            &self.store,
            &path::consensus_state(client_id, height),
        )?)
    }

    fn write_consensus_state(
        &mut self,
        env: &Env,
        client_id: &ClientId,
        height: Height,
        consensus: &AnyConsensusState,
    ) -> Result<(), StoreError> {
        set_json(
            &mut self.store,
            &path::consensus_state(client_id, height),
            consensus,
        )?;
        self.write_update_meta(env, client_id, height)
    }

    fn write_update_meta(
        &mut self,
        env: &Env,
        client_id: &ClientId,
        height: Height,
    ) -> Result<(), StoreError> {
        set_json(
            &mut self.store,
            &path::client_update_meta(client_id, height),
            &ClientUpdateMeta {
                host_height: env.height,
                host_timestamp_ns: env.timestamp_ns,
            },
        )
    }

    /// The host-side metadata recorded when the consensus state at
    /// `height` was stored, if any.
    ///
    /// # Errors
    /// Returns a store error if the record is corrupt.
    pub fn client_update_meta(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<Option<ClientUpdateMeta>, ClientError> {
        Ok(get_json(
            &self.store,
            &path::client_update_meta(client_id, height),
        )?)
    }

    fn cometbft_consensus_at(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Option<cometbft::ConsensusState> {
        match self.read_consensus_state(client_id, height) {
            Ok(Some(AnyConsensusState::CometBft(cs))) => Some(cs),
            _ => None,
        }
    }

    pub(crate) fn wasm_sudo(
        &mut self,
        client_id: &ClientId,
        checksum: &ibc_aegis_client_wasm::Checksum,
        msg: &SudoMsg,
    ) -> Result<Vec<u8>, ClientError> {
        let prefix = path::client_sandbox_prefix(client_id);
        let Self { store, engine, .. } = self;
        let mut scoped = PrefixedStore::new(prefix, store);
        engine
            .sudo(checksum, &mut scoped, msg)
            .map_err(ClientError::Engine)
    }

    pub(crate) fn wasm_query(
        &self,
        client_id: &ClientId,
        checksum: &ibc_aegis_client_wasm::Checksum,
        msg: &QueryMsg,
    ) -> Result<Vec<u8>, ClientError> {
        let prefix = path::client_sandbox_prefix(client_id);
        let scoped = ReadPrefixedStore::new(prefix, &self.store);
        self.engine
            .query(checksum, &scoped, msg)
            .map_err(ClientError::Engine)
    }
}
