//! ICS-24 store path layout.
//!
//! Every persisted record lives under a well-known string path; the same
//! paths, prefixed with the chain's commitment prefix, are what counterparty
//! membership proofs are verified against.

use crate::height::Height;
use crate::identifiers::{ChannelId, ClientId, ConnectionId, PortId, Sequence};

/// Path of a client's state record.
#[must_use]
pub fn client_state(client_id: &ClientId) -> String {
    format!("clients/{client_id}/clientState")
}

/// Path of a client's consensus state at `height`.
#[must_use]
pub fn consensus_state(client_id: &ClientId, height: Height) -> String {
    format!("clients/{client_id}/consensusStates/{height}")
}

/// Path of the host-side metadata recorded alongside a consensus state.
#[must_use]
pub fn client_update_meta(client_id: &ClientId, height: Height) -> String {
    format!("clients/{client_id}/updateMeta/{height}")
}

/// Key prefix scoping a sandboxed client's self-managed state.
#[must_use]
pub fn client_sandbox_prefix(client_id: &ClientId) -> String {
    format!("clients/{client_id}/sandbox/")
}

/// Path of the id-allocation counter for a client type prefix.
#[must_use]
pub fn next_client_sequence(type_prefix: &str) -> String {
    format!("nextClientSequence/{type_prefix}")
}

/// Path of the connection id-allocation counter.
#[must_use]
pub fn next_connection_sequence() -> String {
    "nextConnectionSequence".to_string()
}

/// Path of the channel id-allocation counter.
#[must_use]
pub fn next_channel_sequence() -> String {
    "nextChannelSequence".to_string()
}

/// Path of a connection end.
#[must_use]
pub fn connection(connection_id: &ConnectionId) -> String {
    format!("connections/{connection_id}")
}

/// Path of a channel end.
#[must_use]
pub fn channel(port_id: &PortId, channel_id: &ChannelId) -> String {
    format!("channelEnds/ports/{port_id}/channels/{channel_id}")
}

/// Path of a channel's next send sequence.
#[must_use]
pub fn next_sequence_send(port_id: &PortId, channel_id: &ChannelId) -> String {
    format!("nextSequenceSend/ports/{port_id}/channels/{channel_id}")
}

/// Path of a channel's next receive sequence (ordered channels).
#[must_use]
pub fn next_sequence_recv(port_id: &PortId, channel_id: &ChannelId) -> String {
    format!("nextSequenceRecv/ports/{port_id}/channels/{channel_id}")
}

/// Path of a channel's next acknowledgement sequence (ordered channels).
#[must_use]
pub fn next_sequence_ack(port_id: &PortId, channel_id: &ChannelId) -> String {
    format!("nextSequenceAck/ports/{port_id}/channels/{channel_id}")
}

/// Path of a packet commitment.
#[must_use]
pub fn packet_commitment(port_id: &PortId, channel_id: &ChannelId, sequence: Sequence) -> String {
    format!("commitments/ports/{port_id}/channels/{channel_id}/sequences/{sequence}")
}

/// Path of a packet receipt (unordered channels).
#[must_use]
pub fn packet_receipt(port_id: &PortId, channel_id: &ChannelId, sequence: Sequence) -> String {
    format!("receipts/ports/{port_id}/channels/{channel_id}/sequences/{sequence}")
}

/// Path of an acknowledgement commitment.
#[must_use]
pub fn packet_ack(port_id: &PortId, channel_id: &ChannelId, sequence: Sequence) -> String {
    format!("acks/ports/{port_id}/channels/{channel_id}/sequences/{sequence}")
}

/// Path of uploaded code bytes, content-addressed by checksum.
#[must_use]
pub fn code(checksum_hex: &str) -> String {
    format!("codes/{checksum_hex}")
}

#[cfg(test)]
mod tests {
    use crate::height::Height;
    use crate::identifiers::{ClientId, ClientType, Sequence};

    #[test]
    fn paths_are_stable() {
        let client = ClientId::new(ClientType::CometBft, 0);
        assert_eq!(
            super::client_state(&client),
            "clients/07-cometbft-0/clientState"
        );
        assert_eq!(
            super::consensus_state(&client, Height::new(1, 9)),
            "clients/07-cometbft-0/consensusStates/1-9"
        );
        assert_eq!(
            super::packet_commitment(
                &"transfer".parse().unwrap(),
                &"channel-2".parse().unwrap(),
                Sequence(7),
            ),
            "commitments/ports/transfer/channels/channel-2/sequences/7"
        );
    }
}
