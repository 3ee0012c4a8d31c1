//! The host error taxonomy.
//!
//! Every handler is atomic: any error below aborts the whole operation
//! with no partial state mutation. [`PacketError::RedundantRelay`] is the
//! one deliberately soft classification — execution paths report it as a
//! no-op success, and only re-validation surfaces it as an error so
//! duplicate relays can be rejected cheaply.

use ibc_aegis_client_lite::LiteError;
use ibc_aegis_client_wasm::{CodeRegistryError, EngineError};
use ibc_aegis_types::channel::ChannelState;
use ibc_aegis_types::connection::ConnectionState;
use ibc_aegis_types::height::Height;
use ibc_aegis_types::identifiers::{
    ChannelId, ClientId, ClientType, ConnectionId, PortId, Sequence,
};
use ibc_aegis_types::store::StoreError;
use thiserror::Error;

/// Errors raised by client keeper operations and proof verification.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No client is registered under the identifier.
    #[error("client `{client_id}` not found")]
    NotFound {
        /// The unknown identifier.
        client_id: ClientId,
    },

    /// The client was frozen by misbehaviour and permanently rejects
    /// proofs.
    #[error("client `{client_id}` is frozen")]
    Frozen {
        /// The frozen client.
        client_id: ClientId,
    },

    /// The client's newest consensus state has outlived its trusting
    /// period.
    #[error("client `{client_id}` is expired")]
    Expired {
        /// The expired client.
        client_id: ClientId,
    },

    /// Client state parameters are malformed.
    #[error("invalid client state: {reason}")]
    InvalidClientState {
        /// What is wrong with the parameters.
        reason: String,
    },

    /// A submitted header failed to decode or verify.
    #[error("invalid header: {reason}")]
    InvalidHeader {
        /// Decode or verification failure.
        reason: String,
    },

    /// Submitted misbehaviour evidence failed to decode or verify.
    #[error("invalid misbehaviour evidence: {reason}")]
    InvalidMisbehaviour {
        /// Decode or verification failure.
        reason: String,
    },

    /// No consensus state is stored at the height a proof references.
    #[error("no consensus state for client `{client_id}` at height {height}")]
    ConsensusStateNotFound {
        /// The client.
        client_id: ClientId,
        /// The missing height.
        height: Height,
    },

    /// A membership or non-membership proof failed.
    #[error("invalid proof: {reason}")]
    InvalidProof {
        /// Decode or verification failure.
        reason: String,
    },

    /// The operation applies to a different client variant.
    #[error("client `{client_id}` is a {actual} client, expected {expected}")]
    WrongClientType {
        /// The client.
        client_id: ClientId,
        /// The variant the operation requires.
        expected: ClientType,
        /// The variant the client actually is.
        actual: ClientType,
    },

    /// The sandbox engine failed or rejected a call.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A lite-client operation failed.
    #[error(transparent)]
    Lite(#[from] LiteError),

    /// A stored record failed to decode or encode.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the connection handshake.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// No connection exists under the identifier.
    #[error("connection `{connection_id}` not found")]
    NotFound {
        /// The unknown identifier.
        connection_id: ConnectionId,
    },

    /// The connection is not in the state the handshake step requires.
    /// Re-submitting an already-applied step lands here and changes
    /// nothing.
    #[error("connection `{connection_id}` is in state {actual}, expected {expected}")]
    InvalidState {
        /// The connection.
        connection_id: ConnectionId,
        /// The state the step requires.
        expected: ConnectionState,
        /// The state found.
        actual: ConnectionState,
    },

    /// The connection has not completed its handshake.
    #[error("connection `{connection_id}` is not open")]
    NotOpen {
        /// The connection.
        connection_id: ConnectionId,
    },

    /// The version proposals have an empty intersection.
    #[error("no common version between the connection proposals")]
    NoCommonVersion,

    /// The named version is not among the negotiated set.
    #[error("version `{version}` was not negotiated")]
    VersionNotNegotiated {
        /// The rejected version.
        version: String,
    },

    /// The counterparty commitment prefix must not be empty.
    #[error("counterparty commitment prefix must not be empty")]
    EmptyCounterpartyPrefix,

    /// The stored end lacks a counterparty connection id although its
    /// state implies one was recorded.
    #[error("connection `{connection_id}` has no counterparty connection recorded")]
    MissingCounterpartyConnection {
        /// The connection.
        connection_id: ConnectionId,
    },

    /// The claimed self-consensus height has not been reached locally.
    #[error("consensus height {height} is not yet committed on this chain (host height {host_height})")]
    InvalidConsensusHeight {
        /// The claimed height.
        height: Height,
        /// The host's current height.
        host_height: Height,
    },

    /// A client operation or proof check failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A stored record failed to decode or encode.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the channel handshake and close steps.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No channel exists under the port/channel pair.
    #[error("channel `{port_id}/{channel_id}` not found")]
    NotFound {
        /// The port.
        port_id: PortId,
        /// The channel.
        channel_id: ChannelId,
    },

    /// The channel is not in the state the step requires. Re-submitting an
    /// already-applied step lands here and changes nothing.
    #[error("channel `{port_id}/{channel_id}` is in state {actual}, expected {expected}")]
    InvalidState {
        /// The port.
        port_id: PortId,
        /// The channel.
        channel_id: ChannelId,
        /// The state the step requires.
        expected: ChannelState,
        /// The state found.
        actual: ChannelState,
    },

    /// The channel is closed and will never reopen.
    #[error("channel `{port_id}/{channel_id}` is closed")]
    Closed {
        /// The port.
        port_id: PortId,
        /// The channel.
        channel_id: ChannelId,
    },

    /// The stored end lacks a counterparty channel id although its state
    /// implies one was recorded.
    #[error("channel `{port_id}/{channel_id}` has no counterparty channel recorded")]
    MissingCounterpartyChannel {
        /// The port.
        port_id: PortId,
        /// The channel.
        channel_id: ChannelId,
    },

    /// The underlying connection is missing or not open.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The application bound to the port vetoed the step.
    #[error(transparent)]
    App(#[from] AppError),

    /// No application is bound to the port.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// A stored record failed to decode or encode.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the packet lifecycle.
#[derive(Debug, Error)]
pub enum PacketError {
    /// Packets may only be sent and received on open channels.
    #[error("channel `{port_id}/{channel_id}` is in state {state}, packets require OPEN")]
    ChannelNotOpen {
        /// The port.
        port_id: PortId,
        /// The channel.
        channel_id: ChannelId,
        /// The state found.
        state: ChannelState,
    },

    /// The packet's routing does not match the channel's counterparty.
    #[error(
        "packet routes to `{packet_port}/{packet_channel}` but the channel counterparty is \
         `{expected_port}/{expected_channel}`"
    )]
    CounterpartyMismatch {
        /// Port named in the packet.
        packet_port: PortId,
        /// Channel named in the packet.
        packet_channel: ChannelId,
        /// Counterparty port recorded on the channel.
        expected_port: PortId,
        /// Counterparty channel recorded on the channel, rendered;
        /// `unset` if the handshake has not bound one yet.
        expected_channel: String,
    },

    /// A packet must declare at least one timeout bound.
    #[error("packet must declare a timeout height or a timeout timestamp")]
    EmptyTimeout,

    /// The packet's timeout has already elapsed.
    #[error(
        "packet timeout has elapsed (timeout height {timeout_height}, \
         timeout timestamp {timeout_timestamp_ns}ns)"
    )]
    TimeoutElapsed {
        /// The packet's height bound.
        timeout_height: Height,
        /// The packet's time bound.
        timeout_timestamp_ns: u64,
    },

    /// The packet's timeout has not elapsed at the proven height, so a
    /// timeout cannot be claimed yet.
    #[error("packet timeout has not elapsed at proof height {proof_height}")]
    TimeoutNotElapsed {
        /// The height the proof was taken at.
        proof_height: Height,
    },

    /// An ordered channel saw a sequence other than the cursor.
    #[error("expected sequence {expected}, got {actual}")]
    SequenceMismatch {
        /// The cursor value.
        expected: Sequence,
        /// The sequence submitted.
        actual: Sequence,
    },

    /// A commitment exists for the sequence but does not match the packet.
    #[error("stored commitment for sequence {sequence} does not match the packet")]
    CommitmentMismatch {
        /// The sequence.
        sequence: Sequence,
    },

    /// No commitment is stored for the sequence.
    #[error("no commitment stored for sequence {sequence}")]
    CommitmentNotFound {
        /// The sequence.
        sequence: Sequence,
    },

    /// The message duplicates an already-applied effect. Soft: execution
    /// reports a no-op success; re-validation reports this error so
    /// duplicate submissions are rejected cheaply, not penalized.
    #[error("packet `{port_id}/{channel_id}` sequence {sequence} was already relayed")]
    RedundantRelay {
        /// The port.
        port_id: PortId,
        /// The channel.
        channel_id: ChannelId,
        /// The duplicated sequence.
        sequence: Sequence,
    },

    /// A channel-level precondition failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A proof check or client precondition failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The application callback rejected the packet operation.
    #[error(transparent)]
    App(#[from] AppError),

    /// A stored record failed to decode or encode.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An application callback rejected a handshake step or packet operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("application callback rejected: {reason}")]
pub struct AppError {
    /// The application's reason.
    pub reason: String,
}

impl AppError {
    /// Build an error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors raised by the port router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// No application module is bound to the port.
    #[error("no application bound to port `{port_id}`")]
    UnknownPort {
        /// The unbound port.
        port_id: PortId,
    },
}

/// Top-level error for host transaction handlers.
#[derive(Debug, Error)]
pub enum HostError {
    /// The caller is not the configured protocol authority.
    #[error("signer `{signer}` is not the protocol authority")]
    Unauthorized {
        /// The rejected signer.
        signer: String,
    },

    /// The new code's migrate entry point rejected the transition. The
    /// reason is the sandboxed code's message, verbatim.
    #[error("code migration rejected: {reason}")]
    CodeMigrationRejected {
        /// The rejection message from the sandboxed code.
        reason: String,
    },

    /// A client operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A connection handshake step failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A channel handshake or close step failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A packet operation failed.
    #[error(transparent)]
    Packet(#[from] PacketError),

    /// A code registry operation failed.
    #[error(transparent)]
    CodeRegistry(#[from] CodeRegistryError),

    /// A stored record failed to decode or encode.
    #[error(transparent)]
    Store(#[from] StoreError),
}
