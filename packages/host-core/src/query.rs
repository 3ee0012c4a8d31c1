//! Read-only state accessors.

use ibc_aegis_client_wasm::{code_store, Checksum};
use ibc_aegis_types::channel::ChannelEnd;
use ibc_aegis_types::connection::ConnectionEnd;
use ibc_aegis_types::height::Height;
use ibc_aegis_types::identifiers::{ChannelId, ClientId, ConnectionId, PortId, Sequence};
use ibc_aegis_types::path;
use ibc_aegis_types::store::{get_json, HostStore};

use crate::client::{AnyClientState, AnyConsensusState};
use crate::errors::HostError;
use crate::{IbcHost, WasmEngine};

impl<S: HostStore, E: WasmEngine> IbcHost<S, E> {
    /// The stored client state, if the client exists.
    ///
    /// # Errors
    /// Returns a store error if the record is corrupt.
    pub fn client_state(&self, client_id: &ClientId) -> Result<Option<AnyClientState>, HostError> {
        Ok(get_json(&self.store, &path::client_state(client_id))?)
    }

    /// The stored consensus state at a height, if recorded. Sandboxed
    /// clients manage their consensus states internally and return `None`
    /// here.
    ///
    /// # Errors
    /// Returns a store error if the record is corrupt.
    pub fn consensus_state(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<Option<AnyConsensusState>, HostError> {
        Ok(get_json(&self.store, &path::consensus_state(client_id, height))?)
    }

    /// The stored connection end, if it exists.
    ///
    /// # Errors
    /// Returns a store error if the record is corrupt.
    pub fn connection_end(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<ConnectionEnd>, HostError> {
        Ok(get_json(&self.store, &path::connection(connection_id))?)
    }

    /// The stored channel end, if it exists.
    ///
    /// # Errors
    /// Returns a store error if the record is corrupt.
    pub fn channel_end(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Option<ChannelEnd>, HostError> {
        Ok(get_json(&self.store, &path::channel(port_id, channel_id))?)
    }

    /// The stored packet commitment, if the packet is in flight.
    #[must_use]
    pub fn packet_commitment(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
    ) -> Option<Vec<u8>> {
        self.store
            .get(path::packet_commitment(port_id, channel_id, sequence).as_bytes())
    }

    /// Whether a receipt exists for the sequence (unordered channels).
    #[must_use]
    pub fn packet_receipt(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
    ) -> bool {
        self.store
            .has(path::packet_receipt(port_id, channel_id, sequence).as_bytes())
    }

    /// The stored acknowledgement commitment, if one was written.
    #[must_use]
    pub fn packet_ack_commitment(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
    ) -> Option<Vec<u8>> {
        self.store
            .get(path::packet_ack(port_id, channel_id, sequence).as_bytes())
    }

    /// The next sequence to assign on send.
    ///
    /// # Errors
    /// Returns a store error if the counter is corrupt.
    pub fn next_sequence_send(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Sequence, HostError> {
        Ok(get_json(&self.store, &path::next_sequence_send(port_id, channel_id))?
            .unwrap_or(Sequence::START))
    }

    /// The receive cursor (meaningful on ordered channels).
    ///
    /// # Errors
    /// Returns a store error if the counter is corrupt.
    pub fn next_sequence_recv(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Sequence, HostError> {
        Ok(get_json(&self.store, &path::next_sequence_recv(port_id, channel_id))?
            .unwrap_or(Sequence::START))
    }

    /// The acknowledgement cursor (meaningful on ordered channels).
    ///
    /// # Errors
    /// Returns a store error if the counter is corrupt.
    pub fn next_sequence_ack(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Sequence, HostError> {
        Ok(get_json(&self.store, &path::next_sequence_ack(port_id, channel_id))?
            .unwrap_or(Sequence::START))
    }

    /// The stored (decompressed) code bytes for a checksum.
    #[must_use]
    pub fn code(&self, checksum: &Checksum) -> Option<Vec<u8>> {
        code_store::code(&self.store, checksum)
    }
}
