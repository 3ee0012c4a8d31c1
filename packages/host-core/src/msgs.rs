//! Transaction messages accepted by the host, one per handler.

use ibc_aegis_client_wasm::Checksum;
use ibc_aegis_types::channel::Order;
use ibc_aegis_types::height::Height;
use ibc_aegis_types::identifiers::{ChannelId, ClientId, ConnectionId, PortId};
use ibc_aegis_types::packet::{Acknowledgement, Packet};
use ibc_aegis_types::serde_util::base64bytes;
use serde::{Deserialize, Serialize};

use crate::client::{AnyClientState, AnyConsensusState};

/// Register a new light client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateClient {
    /// The initial client state; its variant selects the client type.
    pub client_state: AnyClientState,
    /// The initial consensus state; must match the client state variant.
    pub consensus_state: AnyConsensusState,
}

/// Submit a new header to an existing client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateClient {
    /// The client to update.
    pub client_id: ClientId,
    /// The variant-specific client message (header), serialized.
    #[serde(with = "base64bytes")]
    pub client_message: Vec<u8>,
}

/// Submit misbehaviour evidence against a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSubmitMisbehaviour {
    /// The client the evidence is against.
    pub client_id: ClientId,
    /// The variant-specific evidence, serialized.
    #[serde(with = "base64bytes")]
    pub misbehaviour: Vec<u8>,
}

/// Open a connection handshake (first step, no proofs).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConnOpenInit {
    /// The local client verifying the counterparty chain.
    pub client_id: ClientId,
    /// The counterparty's client for this chain.
    pub counterparty_client_id: ClientId,
    /// The counterparty's commitment prefix.
    #[serde(with = "base64bytes")]
    pub counterparty_prefix: Vec<u8>,
    /// An optional single version proposal; defaults to the host's
    /// supported set.
    pub version: Option<String>,
}

/// Respond to a counterparty's connection-open initiation (second step).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConnOpenTry {
    /// The local client verifying the counterparty chain.
    pub client_id: ClientId,
    /// The counterparty's client for this chain.
    pub counterparty_client_id: ClientId,
    /// The counterparty's connection, in INIT.
    pub counterparty_connection_id: ConnectionId,
    /// The counterparty's commitment prefix.
    #[serde(with = "base64bytes")]
    pub counterparty_prefix: Vec<u8>,
    /// The versions the counterparty proposed at init.
    pub counterparty_versions: Vec<String>,
    /// Height of the counterparty state the proofs are taken at.
    pub proof_height: Height,
    /// Proof that the counterparty connection exists in INIT.
    #[serde(with = "base64bytes")]
    pub proof_init: Vec<u8>,
    /// Proof of the counterparty's stored client state for this chain.
    #[serde(with = "base64bytes")]
    pub proof_client: Vec<u8>,
    /// Proof of the counterparty's stored consensus state of this chain.
    #[serde(with = "base64bytes")]
    pub proof_consensus: Vec<u8>,
    /// The counterparty's claimed client state bytes for this chain.
    #[serde(with = "base64bytes")]
    pub counterparty_client_state: Vec<u8>,
    /// The height of this chain the counterparty claims to have verified.
    pub consensus_height: Height,
    /// The counterparty's claimed consensus state bytes at that height.
    #[serde(with = "base64bytes")]
    pub counterparty_consensus_state: Vec<u8>,
}

/// Accept the counterparty's try step (third step).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConnOpenAck {
    /// The local connection, in INIT.
    pub connection_id: ConnectionId,
    /// The counterparty's connection created at its try step.
    pub counterparty_connection_id: ConnectionId,
    /// The finally-agreed single version.
    pub version: String,
    /// The version set the counterparty stored at its try step.
    pub counterparty_versions: Vec<String>,
    /// Height of the counterparty state the proof is taken at.
    pub proof_height: Height,
    /// Proof that the counterparty connection is in TRYOPEN.
    #[serde(with = "base64bytes")]
    pub proof_try: Vec<u8>,
}

/// Complete the handshake on the try side (fourth step).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConnOpenConfirm {
    /// The local connection, in TRYOPEN.
    pub connection_id: ConnectionId,
    /// The version the counterparty settled on at its ack step.
    pub version: String,
    /// Height of the counterparty state the proof is taken at.
    pub proof_height: Height,
    /// Proof that the counterparty connection is OPEN.
    #[serde(with = "base64bytes")]
    pub proof_ack: Vec<u8>,
}

/// Open a channel handshake (first step, no proofs).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChanOpenInit {
    /// The local application port.
    pub port_id: PortId,
    /// The open connection the channel rides on.
    pub connection_id: ConnectionId,
    /// Delivery ordering for the channel.
    pub ordering: Order,
    /// The counterparty application port.
    pub counterparty_port_id: PortId,
    /// Proposed application version.
    pub version: String,
}

/// Respond to a counterparty's channel-open initiation (second step).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChanOpenTry {
    /// The local application port.
    pub port_id: PortId,
    /// The open connection the channel rides on.
    pub connection_id: ConnectionId,
    /// Delivery ordering; must match the counterparty's.
    pub ordering: Order,
    /// The counterparty application port.
    pub counterparty_port_id: PortId,
    /// The counterparty's channel, in INIT.
    pub counterparty_channel_id: ChannelId,
    /// The version the counterparty proposed.
    pub counterparty_version: String,
    /// Height of the counterparty state the proof is taken at.
    pub proof_height: Height,
    /// Proof that the counterparty channel exists in INIT.
    #[serde(with = "base64bytes")]
    pub proof_init: Vec<u8>,
}

/// Accept the counterparty's try step (third step).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChanOpenAck {
    /// The local application port.
    pub port_id: PortId,
    /// The local channel, in INIT.
    pub channel_id: ChannelId,
    /// The counterparty's channel created at its try step.
    pub counterparty_channel_id: ChannelId,
    /// The version the counterparty settled on.
    pub counterparty_version: String,
    /// Height of the counterparty state the proof is taken at.
    pub proof_height: Height,
    /// Proof that the counterparty channel is in TRYOPEN.
    #[serde(with = "base64bytes")]
    pub proof_try: Vec<u8>,
}

/// Complete the handshake on the try side (fourth step).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChanOpenConfirm {
    /// The local application port.
    pub port_id: PortId,
    /// The local channel, in TRYOPEN.
    pub channel_id: ChannelId,
    /// Height of the counterparty state the proof is taken at.
    pub proof_height: Height,
    /// Proof that the counterparty channel is OPEN.
    #[serde(with = "base64bytes")]
    pub proof_ack: Vec<u8>,
}

/// Close a channel from this side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChanCloseInit {
    /// The local application port.
    pub port_id: PortId,
    /// The channel to close.
    pub channel_id: ChannelId,
}

/// Close a channel because the counterparty closed its end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChanCloseConfirm {
    /// The local application port.
    pub port_id: PortId,
    /// The channel to close.
    pub channel_id: ChannelId,
    /// Height of the counterparty state the proof is taken at.
    pub proof_height: Height,
    /// Proof that the counterparty channel is CLOSED.
    #[serde(with = "base64bytes")]
    pub proof_init: Vec<u8>,
}

/// Deliver a packet sent by the counterparty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRecvPacket {
    /// The packet, as emitted by the sender.
    pub packet: Packet,
    /// Height of the counterparty state the proof is taken at.
    pub proof_height: Height,
    /// Proof that the sender committed to the packet.
    #[serde(with = "base64bytes")]
    pub proof_commitment: Vec<u8>,
}

/// Deliver the counterparty's acknowledgement for a sent packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAcknowledgement {
    /// The packet this chain sent.
    pub packet: Packet,
    /// The acknowledgement the counterparty's application produced.
    pub acknowledgement: Acknowledgement,
    /// Height of the counterparty state the proof is taken at.
    pub proof_height: Height,
    /// Proof that the counterparty committed the acknowledgement.
    #[serde(with = "base64bytes")]
    pub proof_acked: Vec<u8>,
}

/// Claim a sent packet timed out unreceived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTimeout {
    /// The packet this chain sent.
    pub packet: Packet,
    /// Height of the counterparty state the proof is taken at; the timeout
    /// must have elapsed at this height.
    pub proof_height: Height,
    /// Proof that the counterparty never recorded a receipt (unordered)
    /// or acknowledgement (ordered) for the sequence.
    #[serde(with = "base64bytes")]
    pub proof_unreceived: Vec<u8>,
}

/// Upload light-client bytecode. Governance gated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgStoreCode {
    /// The submitting address; must be the protocol authority.
    pub signer: String,
    /// The bytecode, optionally gzip compressed.
    #[serde(with = "base64bytes")]
    pub code: Vec<u8>,
}

/// Rebind an existing sandboxed client to new code. Governance gated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMigrateClientCode {
    /// The submitting address; must be the protocol authority.
    pub signer: String,
    /// The sandboxed client to migrate.
    pub client_id: ClientId,
    /// Checksum of the already-uploaded code to bind to.
    pub new_checksum: Checksum,
    /// Payload handed to the new code's migrate entry point.
    #[serde(with = "base64bytes")]
    pub migrate_msg: Vec<u8>,
}

/// Bind the out-of-band counterparty of a lite client. One-shot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgProvideCounterparty {
    /// The lite client to provision.
    pub client_id: ClientId,
    /// The counterparty's identifier for its client of this chain.
    pub counterparty_client_id: String,
    /// The counterparty's commitment prefix.
    #[serde(with = "base64bytes")]
    pub counterparty_prefix: Vec<u8>,
}
