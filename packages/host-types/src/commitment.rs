//! Packet and acknowledgement commitments.
//!
//! A commitment binds a sent packet's timeout bounds and payload hash into
//! 32 bytes stored under the packet's sequence. Its later absence is the
//! durable proof that the packet completed or timed out.

use sha2::{Digest, Sha256};

use crate::packet::{Acknowledgement, Packet};

/// Compute the commitment stored for a sent packet.
///
/// Layout: `sha256(timeout_timestamp_be ‖ timeout_revision_number_be ‖
/// timeout_revision_height_be ‖ sha256(data))`.
#[must_use]
pub fn packet_commitment(packet: &Packet) -> [u8; 32] {
    let data_hash: [u8; 32] = Sha256::digest(&packet.data).into();

    let mut hasher = Sha256::new();
    hasher.update(packet.timeout_timestamp_ns.to_be_bytes());
    hasher.update(packet.timeout_height.revision_number.to_be_bytes());
    hasher.update(packet.timeout_height.revision_height.to_be_bytes());
    hasher.update(data_hash);
    hasher.finalize().into()
}

/// Compute the commitment stored for a written acknowledgement.
#[must_use]
pub fn ack_commitment(ack: &Acknowledgement) -> [u8; 32] {
    Sha256::digest(ack.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::{ack_commitment, packet_commitment};
    use crate::height::Height;
    use crate::identifiers::Sequence;
    use crate::packet::{Acknowledgement, Packet};

    fn base_packet() -> Packet {
        Packet {
            source_port: "transfer".parse().unwrap(),
            source_channel: "channel-0".parse().unwrap(),
            dest_port: "transfer".parse().unwrap(),
            dest_channel: "channel-1".parse().unwrap(),
            sequence: Sequence(1),
            data: b"payload".to_vec(),
            timeout_height: Height::new(0, 100),
            timeout_timestamp_ns: 5_000,
        }
    }

    #[test]
    fn commitment_binds_timeouts_and_payload() {
        let base = packet_commitment(&base_packet());

        let mut other_data = base_packet();
        other_data.data = b"payload!".to_vec();
        assert_ne!(packet_commitment(&other_data), base);

        let mut other_height = base_packet();
        other_height.timeout_height = Height::new(0, 101);
        assert_ne!(packet_commitment(&other_height), base);

        let mut other_time = base_packet();
        other_time.timeout_timestamp_ns = 5_001;
        assert_ne!(packet_commitment(&other_time), base);
    }

    #[test]
    fn commitment_ignores_routing_fields() {
        // The commitment is checked under a path that already pins the
        // routing; only timeout bounds and payload are hashed.
        let mut rerouted = base_packet();
        rerouted.sequence = Sequence(9);
        rerouted.dest_channel = "channel-9".parse().unwrap();
        assert_eq!(packet_commitment(&rerouted), packet_commitment(&base_packet()));
    }

    #[test]
    fn ack_commitment_is_payload_hash() {
        let ack = Acknowledgement::success(b"ok");
        assert_eq!(ack_commitment(&ack).len(), 32);
        assert_ne!(
            ack_commitment(&ack),
            ack_commitment(&Acknowledgement::error("nope"))
        );
    }
}
