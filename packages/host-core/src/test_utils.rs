//! Shared helpers for handshake and packet-lifecycle tests: two in-process
//! chains driven with mock clients, so proofs are computed from the actual
//! bytes the other chain stored. A handler that builds the wrong expected
//! record or path fails these proofs.

use std::cell::RefCell;
use std::rc::Rc;

use ibc_aegis_client_wasm::msgs::{
    CheckForMisbehaviourResult, InstantiateMsg, MigrateMsg, QueryMsg, StatusResult, SudoMsg,
    TimestampAtHeightResult, UpdateStateResult,
};
use ibc_aegis_client_wasm::{Checksum, EngineError, WasmEngine};
use ibc_aegis_types::channel::{ChannelCounterparty, Order};
use ibc_aegis_types::height::Height;
use ibc_aegis_types::identifiers::{ChannelId, ClientId, ConnectionId, PortId};
use ibc_aegis_types::packet::{Acknowledgement, Packet};
use ibc_aegis_types::path;
use ibc_aegis_types::store::{HostStore, MemStore};

use crate::client::mock::{MockClientState, MockConsensusState, MockHeader};
use crate::client::{mock, AnyClientState, AnyConsensusState};
use crate::config::HostConfig;
use crate::errors::AppError;
use crate::msgs::{
    MsgChanOpenAck, MsgChanOpenConfirm, MsgChanOpenInit, MsgChanOpenTry, MsgConnOpenAck,
    MsgConnOpenConfirm, MsgConnOpenInit, MsgConnOpenTry, MsgCreateClient, MsgUpdateClient,
};
use crate::router::{IbcApp, PortRouter};
use crate::{Env, IbcHost};

pub const PORT: &str = "transfer";
pub const CHANNEL_VERSION: &str = "ics20-1";
pub const AUTHORITY: &str = "aegis1authority";

/// What the test application observed and how it should behave.
#[derive(Default)]
pub struct AppRecord {
    pub received: Vec<Packet>,
    pub acknowledged: Vec<(Packet, Acknowledgement)>,
    pub timed_out: Vec<Packet>,
    pub veto_handshake: Option<String>,
    pub veto_packet: Option<String>,
}

/// Port-bound application that records every callback.
pub struct TestApp {
    pub record: Rc<RefCell<AppRecord>>,
}

impl TestApp {
    fn handshake_gate(&self) -> Result<(), AppError> {
        match &self.record.borrow().veto_handshake {
            Some(reason) => Err(AppError::new(reason.clone())),
            None => Ok(()),
        }
    }

    fn packet_gate(&self) -> Result<(), AppError> {
        match &self.record.borrow().veto_packet {
            Some(reason) => Err(AppError::new(reason.clone())),
            None => Ok(()),
        }
    }
}

impl IbcApp for TestApp {
    fn on_chan_open_init(
        &mut self,
        _ordering: Order,
        _connection_id: &ConnectionId,
        _port_id: &PortId,
        _channel_id: &ChannelId,
        _counterparty: &ChannelCounterparty,
        version: &str,
    ) -> Result<String, AppError> {
        self.handshake_gate()?;
        Ok(version.to_string())
    }

    fn on_chan_open_try(
        &mut self,
        _ordering: Order,
        _connection_id: &ConnectionId,
        _port_id: &PortId,
        _channel_id: &ChannelId,
        _counterparty: &ChannelCounterparty,
        counterparty_version: &str,
    ) -> Result<String, AppError> {
        self.handshake_gate()?;
        Ok(counterparty_version.to_string())
    }

    fn on_chan_open_ack(
        &mut self,
        _port_id: &PortId,
        _channel_id: &ChannelId,
        _counterparty_channel_id: &ChannelId,
        _counterparty_version: &str,
    ) -> Result<(), AppError> {
        self.handshake_gate()
    }

    fn on_chan_open_confirm(
        &mut self,
        _port_id: &PortId,
        _channel_id: &ChannelId,
    ) -> Result<(), AppError> {
        self.handshake_gate()
    }

    fn on_recv_packet(&mut self, packet: &Packet) -> Acknowledgement {
        self.record.borrow_mut().received.push(packet.clone());
        Acknowledgement::success(b"ok")
    }

    fn on_acknowledgement_packet(
        &mut self,
        packet: &Packet,
        acknowledgement: &Acknowledgement,
    ) -> Result<(), AppError> {
        self.packet_gate()?;
        self.record
            .borrow_mut()
            .acknowledged
            .push((packet.clone(), acknowledgement.clone()));
        Ok(())
    }

    fn on_timeout_packet(&mut self, packet: &Packet) -> Result<(), AppError> {
        self.packet_gate()?;
        self.record.borrow_mut().timed_out.push(packet.clone());
        Ok(())
    }
}

/// Programmable engine behavior shared with the test body.
pub struct EngineState {
    pub verify_ok: bool,
    pub found_misbehaviour: bool,
    pub update_heights: Vec<Height>,
    pub status: String,
    pub timestamp_ns: u64,
    pub migrate_result: Result<(), String>,
    pub calls: Vec<String>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            verify_ok: true,
            found_misbehaviour: false,
            update_heights: vec![],
            status: "Active".to_string(),
            timestamp_ns: 0,
            migrate_result: Ok(()),
            calls: vec![],
        }
    }
}

/// An in-process stand-in for the sandbox engine.
#[derive(Clone)]
pub struct MockEngine {
    pub state: Rc<RefCell<EngineState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(EngineState::default())),
        }
    }

    fn contract_gate(&self, call: &str) -> Result<(), EngineError> {
        self.state.borrow_mut().calls.push(call.to_string());
        if self.state.borrow().verify_ok {
            Ok(())
        } else {
            Err(EngineError::Contract {
                message: "sandbox rejected the call".to_string(),
            })
        }
    }
}

impl WasmEngine for MockEngine {
    fn instantiate(
        &mut self,
        _checksum: &Checksum,
        store: &mut dyn HostStore,
        msg: &InstantiateMsg,
    ) -> Result<(), EngineError> {
        self.state.borrow_mut().calls.push("instantiate".to_string());
        store.set(b"state", &msg.client_state);
        Ok(())
    }

    fn sudo(
        &mut self,
        _checksum: &Checksum,
        _store: &mut dyn HostStore,
        msg: &SudoMsg,
    ) -> Result<Vec<u8>, EngineError> {
        match msg {
            SudoMsg::VerifyMembership(_) => {
                self.contract_gate("verify_membership")?;
                Ok(b"null".to_vec())
            }
            SudoMsg::VerifyNonMembership(_) => {
                self.contract_gate("verify_non_membership")?;
                Ok(b"null".to_vec())
            }
            SudoMsg::UpdateState(_) => {
                self.state.borrow_mut().calls.push("update_state".to_string());
                let result = UpdateStateResult {
                    heights: self.state.borrow().update_heights.clone(),
                };
                Ok(serde_json::to_vec(&result).unwrap())
            }
            SudoMsg::UpdateStateOnMisbehaviour(_) => {
                self.state
                    .borrow_mut()
                    .calls
                    .push("update_state_on_misbehaviour".to_string());
                Ok(b"null".to_vec())
            }
        }
    }

    fn query(
        &self,
        _checksum: &Checksum,
        _store: &dyn HostStore,
        msg: &QueryMsg,
    ) -> Result<Vec<u8>, EngineError> {
        match msg {
            QueryMsg::VerifyClientMessage(_) => {
                self.contract_gate("verify_client_message")?;
                Ok(b"null".to_vec())
            }
            QueryMsg::CheckForMisbehaviour(_) => {
                let result = CheckForMisbehaviourResult {
                    found_misbehaviour: self.state.borrow().found_misbehaviour,
                };
                Ok(serde_json::to_vec(&result).unwrap())
            }
            QueryMsg::TimestampAtHeight(_) => {
                let result = TimestampAtHeightResult {
                    timestamp_ns: self.state.borrow().timestamp_ns,
                };
                Ok(serde_json::to_vec(&result).unwrap())
            }
            QueryMsg::Status(_) => {
                let result = StatusResult {
                    status: self.state.borrow().status.clone(),
                };
                Ok(serde_json::to_vec(&result).unwrap())
            }
        }
    }

    fn migrate(
        &mut self,
        _checksum: &Checksum,
        _store: &mut dyn HostStore,
        _msg: &MigrateMsg,
    ) -> Result<Vec<u8>, EngineError> {
        self.state.borrow_mut().calls.push("migrate".to_string());
        match &self.state.borrow().migrate_result {
            Ok(()) => Ok(b"null".to_vec()),
            Err(message) => Err(EngineError::Contract {
                message: message.clone(),
            }),
        }
    }
}

/// One chain under test.
pub struct TestChain {
    pub host: IbcHost<MemStore, MockEngine>,
    pub env: Env,
    pub app: Rc<RefCell<AppRecord>>,
    pub engine: Rc<RefCell<EngineState>>,
}

impl TestChain {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let app = Rc::new(RefCell::new(AppRecord::default()));
        let engine = MockEngine::new();
        let engine_state = engine.state.clone();

        let mut router = PortRouter::new();
        router.register(port(), Box::new(TestApp { record: app.clone() }));

        let config = HostConfig {
            authority: AUTHORITY.to_string(),
            ..HostConfig::default()
        };

        Self {
            host: IbcHost::new(MemStore::new(), engine, router, config),
            env: Env {
                height: Height::new(0, 100),
                timestamp_ns: 1_000_000_000_000,
            },
            app,
            engine: engine_state,
        }
    }

    /// Create a mock client with a consensus state at height `0-1`.
    pub fn create_mock_client(&mut self) -> ClientId {
        self.host
            .create_client(
                &self.env,
                MsgCreateClient {
                    client_state: AnyClientState::Mock(MockClientState {
                        latest_height: Height::new(0, 1),
                        trusting_period_ns: 0,
                        is_frozen: false,
                    }),
                    consensus_state: AnyConsensusState::Mock(MockConsensusState {
                        timestamp_ns: self.env.timestamp_ns,
                    }),
                },
            )
            .unwrap()
    }

    /// Record a mock consensus state at `height`.
    pub fn update_mock_client(&mut self, client_id: &ClientId, height: Height) {
        let header = MockHeader {
            height,
            timestamp_ns: self.env.timestamp_ns,
        };
        self.host
            .update_client(
                &self.env,
                &MsgUpdateClient {
                    client_id: client_id.clone(),
                    client_message: serde_json::to_vec(&header).unwrap(),
                },
            )
            .unwrap();
    }

    /// The raw bytes this chain stored at `store_path`.
    pub fn stored(&self, store_path: &str) -> Vec<u8> {
        self.host
            .store()
            .get(store_path.as_bytes())
            .unwrap_or_else(|| panic!("nothing stored at {store_path}"))
    }

    /// A mock proof of what this chain actually stored at `store_path`.
    pub fn proof_of(&self, store_path: &str) -> Vec<u8> {
        mock::membership_proof(b"ibc", store_path, &self.stored(store_path))
    }

    /// A mock proof that this chain stored nothing at `store_path`.
    pub fn absence_proof_of(&self, store_path: &str) -> Vec<u8> {
        mock::absence_proof(b"ibc", store_path)
    }
}

pub fn port() -> PortId {
    PORT.parse().unwrap()
}

/// The proof height the helpers record consensus states at.
pub fn proof_height() -> Height {
    Height::new(0, 50)
}

/// Drive a full connection handshake between two chains.
pub fn connect(
    a: &mut TestChain,
    b: &mut TestChain,
) -> (ClientId, ClientId, ConnectionId, ConnectionId) {
    let client_a = a.create_mock_client();
    let client_b = b.create_mock_client();
    let height = proof_height();

    let conn_a = a
        .host
        .conn_open_init(
            &a.env,
            &MsgConnOpenInit {
                client_id: client_a.clone(),
                counterparty_client_id: client_b.clone(),
                counterparty_prefix: b"ibc".to_vec(),
                version: None,
            },
        )
        .unwrap();

    b.update_mock_client(&client_b, height);
    let consensus_height = Height::new(0, 1);
    let client_state_path = path::client_state(&client_a);
    let consensus_state_path = path::consensus_state(&client_a, consensus_height);
    let conn_b = b
        .host
        .conn_open_try(
            &b.env,
            &MsgConnOpenTry {
                client_id: client_b.clone(),
                counterparty_client_id: client_a.clone(),
                counterparty_connection_id: conn_a.clone(),
                counterparty_prefix: b"ibc".to_vec(),
                counterparty_versions: vec!["1".to_string()],
                proof_height: height,
                proof_init: a.proof_of(&path::connection(&conn_a)),
                proof_client: a.proof_of(&client_state_path),
                proof_consensus: a.proof_of(&consensus_state_path),
                counterparty_client_state: a.stored(&client_state_path),
                consensus_height,
                counterparty_consensus_state: a.stored(&consensus_state_path),
            },
        )
        .unwrap();

    a.update_mock_client(&client_a, height);
    a.host
        .conn_open_ack(
            &a.env,
            &MsgConnOpenAck {
                connection_id: conn_a.clone(),
                counterparty_connection_id: conn_b.clone(),
                version: "1".to_string(),
                counterparty_versions: vec!["1".to_string()],
                proof_height: height,
                proof_try: b.proof_of(&path::connection(&conn_b)),
            },
        )
        .unwrap();

    b.host
        .conn_open_confirm(
            &b.env,
            &MsgConnOpenConfirm {
                connection_id: conn_b.clone(),
                version: "1".to_string(),
                proof_height: height,
                proof_ack: a.proof_of(&path::connection(&conn_a)),
            },
        )
        .unwrap();

    (client_a, client_b, conn_a, conn_b)
}

/// Drive a full channel handshake over an established connection.
pub fn open_channel(
    a: &mut TestChain,
    b: &mut TestChain,
    conn_a: &ConnectionId,
    conn_b: &ConnectionId,
    ordering: Order,
) -> (ChannelId, ChannelId) {
    let height = proof_height();

    let chan_a = a
        .host
        .chan_open_init(
            &a.env,
            &MsgChanOpenInit {
                port_id: port(),
                connection_id: conn_a.clone(),
                ordering,
                counterparty_port_id: port(),
                version: CHANNEL_VERSION.to_string(),
            },
        )
        .unwrap();

    let chan_b = b
        .host
        .chan_open_try(
            &b.env,
            &MsgChanOpenTry {
                port_id: port(),
                connection_id: conn_b.clone(),
                ordering,
                counterparty_port_id: port(),
                counterparty_channel_id: chan_a.clone(),
                counterparty_version: CHANNEL_VERSION.to_string(),
                proof_height: height,
                proof_init: a.proof_of(&path::channel(&port(), &chan_a)),
            },
        )
        .unwrap();

    a.host
        .chan_open_ack(
            &a.env,
            &MsgChanOpenAck {
                port_id: port(),
                channel_id: chan_a.clone(),
                counterparty_channel_id: chan_b.clone(),
                counterparty_version: CHANNEL_VERSION.to_string(),
                proof_height: height,
                proof_try: b.proof_of(&path::channel(&port(), &chan_b)),
            },
        )
        .unwrap();

    b.host
        .chan_open_confirm(
            &b.env,
            &MsgChanOpenConfirm {
                port_id: port(),
                channel_id: chan_b.clone(),
                proof_height: height,
                proof_ack: a.proof_of(&path::channel(&port(), &chan_a)),
            },
        )
        .unwrap();

    (chan_a, chan_b)
}

/// Two chains with an open connection and an open channel.
pub fn connected_chains(
    ordering: Order,
) -> (TestChain, TestChain, ConnectionId, ConnectionId, ChannelId, ChannelId) {
    let mut a = TestChain::new();
    let mut b = TestChain::new();
    let (_client_a, _client_b, conn_a, conn_b) = connect(&mut a, &mut b);
    let (chan_a, chan_b) = open_channel(&mut a, &mut b, &conn_a, &conn_b, ordering);
    (a, b, conn_a, conn_b, chan_a, chan_b)
}
