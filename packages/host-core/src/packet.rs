//! The packet lifecycle: send, receive, acknowledge, timeout.
//!
//! The sender stores a commitment per packet; the receiver stores a
//! receipt (unordered) or advances a cursor (ordered) plus an
//! acknowledgement commitment. Deleting the sender's commitment on
//! acknowledgement or timeout is the durable proof of completion.
//! Relayers race and duplicate freely; replays resolve to no-op successes
//! in execution and to [`PacketError::RedundantRelay`] in re-validation.

use ibc_aegis_types::channel::{ChannelState, Order};
use ibc_aegis_types::commitment::{ack_commitment, packet_commitment};
use ibc_aegis_types::height::Height;
use ibc_aegis_types::identifiers::{ChannelId, PortId, Sequence};
use ibc_aegis_types::packet::{Acknowledgement, Packet};
use ibc_aegis_types::path;
use ibc_aegis_types::store::{get_json, set_json, HostStore, StoreError};
use tracing::{debug, info, warn};

use crate::errors::{ChannelError, HostError, PacketError};
use crate::msgs::{MsgAcknowledgement, MsgRecvPacket, MsgTimeout};
use crate::{Env, IbcHost, WasmEngine};

/// Receipt marker value; only presence matters.
const RECEIPT_MARKER: [u8; 1] = [1];

/// The outcome of delivering a packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecvOutcome {
    /// First delivery: the application ran and produced this
    /// acknowledgement.
    Received {
        /// The acknowledgement to relay back to the sender.
        acknowledgement: Acknowledgement,
    },
    /// The packet was already received on this unordered channel; nothing
    /// changed and the application did not run again.
    Redundant,
}

/// The outcome of processing an acknowledgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckOutcome {
    /// The commitment was deleted and the application notified.
    Acknowledged,
    /// The commitment was already gone; a competing relay won the race.
    Redundant,
}

/// The outcome of processing a timeout claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutOutcome {
    /// The commitment was deleted; on an ordered channel the channel is
    /// now closed.
    TimedOut,
    /// The commitment was already gone; a competing relay won the race.
    Redundant,
}

impl<S: HostStore, E: WasmEngine> IbcHost<S, E> {
    /// Send a packet on an open channel: assign the next send sequence and
    /// store the packet commitment.
    ///
    /// # Errors
    /// Fails with [`PacketError::ChannelNotOpen`] off an open channel and
    /// [`PacketError::TimeoutElapsed`] if the declared timeout is not in
    /// the future relative to local state.
    pub fn send_packet(
        &mut self,
        env: &Env,
        source_port: &PortId,
        source_channel: &ChannelId,
        data: Vec<u8>,
        timeout_height: Height,
        timeout_timestamp_ns: u64,
    ) -> Result<Packet, HostError> {
        let channel = self.read_channel(source_port, source_channel)?;
        if channel.state != ChannelState::Open {
            return Err(PacketError::ChannelNotOpen {
                port_id: source_port.clone(),
                channel_id: source_channel.clone(),
                state: channel.state,
            }
            .into());
        }
        self.read_open_connection(&channel.connection_id)
            .map_err(|e| PacketError::Channel(ChannelError::Connection(e)))?;

        let dest_channel = channel.counterparty.channel_id.clone().ok_or_else(|| {
            PacketError::Channel(ChannelError::MissingCounterpartyChannel {
                port_id: source_port.clone(),
                channel_id: source_channel.clone(),
            })
        })?;

        let sequence = self
            .read_sequence(&path::next_sequence_send(source_port, source_channel))
            .map_err(PacketError::Store)?;
        let packet = Packet {
            source_port: source_port.clone(),
            source_channel: source_channel.clone(),
            dest_port: channel.counterparty.port_id.clone(),
            dest_channel,
            sequence,
            data,
            timeout_height,
            timeout_timestamp_ns,
        };

        if packet.has_no_timeout() {
            return Err(PacketError::EmptyTimeout.into());
        }
        if packet.timed_out(env.height, env.timestamp_ns) {
            return Err(PacketError::TimeoutElapsed {
                timeout_height,
                timeout_timestamp_ns,
            }
            .into());
        }

        let commitment = packet_commitment(&packet);
        self.store.set(
            path::packet_commitment(source_port, source_channel, sequence).as_bytes(),
            &commitment,
        );
        self.write_sequence(
            &path::next_sequence_send(source_port, source_channel),
            sequence.increment(),
        )
        .map_err(PacketError::Store)?;

        info!(
            port_id = %source_port,
            channel_id = %source_channel,
            sequence = %sequence,
            "packet sent"
        );
        Ok(packet)
    }

    /// Deliver a packet sent by the counterparty: verify the sender's
    /// commitment, apply the ordering policy, run the application and
    /// commit its acknowledgement.
    ///
    /// # Errors
    /// Hard errors for unknown/closed channels, counterparty mismatches,
    /// elapsed timeouts, failed proofs and ordered-sequence mismatches.
    /// A duplicate delivery on an unordered channel is a no-op success.
    pub fn recv_packet(&mut self, env: &Env, msg: &MsgRecvPacket) -> Result<RecvOutcome, HostError> {
        let packet = &msg.packet;
        let channel = self.read_channel(&packet.dest_port, &packet.dest_channel)?;
        self.ensure_channel_open(&packet.dest_port, &packet.dest_channel, &channel)
            .map_err(PacketError::Channel)?;

        if channel.counterparty.port_id != packet.source_port
            || channel.counterparty.channel_id.as_ref() != Some(&packet.source_channel)
        {
            return Err(counterparty_mismatch(packet, &channel).into());
        }
        let connection = self
            .read_open_connection(&channel.connection_id)
            .map_err(|e| PacketError::Channel(ChannelError::Connection(e)))?;

        if packet.timed_out(env.height, env.timestamp_ns) {
            return Err(PacketError::TimeoutElapsed {
                timeout_height: packet.timeout_height,
                timeout_timestamp_ns: packet.timeout_timestamp_ns,
            }
            .into());
        }

        let commitment = packet_commitment(packet);
        let commitment_path = path::packet_commitment(
            &packet.source_port,
            &packet.source_channel,
            packet.sequence,
        );
        self.verify_client_membership(
            env,
            &connection.client_id,
            msg.proof_height,
            &connection.counterparty.merkle_prefix,
            &commitment_path,
            &commitment,
            &msg.proof_commitment,
        )
        .map_err(PacketError::Client)?;

        match channel.ordering {
            Order::Ordered => {
                let next_recv_path =
                    path::next_sequence_recv(&packet.dest_port, &packet.dest_channel);
                let next_recv = self.read_sequence(&next_recv_path).map_err(PacketError::Store)?;
                if packet.sequence != next_recv {
                    return Err(PacketError::SequenceMismatch {
                        expected: next_recv,
                        actual: packet.sequence,
                    }
                    .into());
                }
                self.write_sequence(&next_recv_path, next_recv.increment())
                    .map_err(PacketError::Store)?;
            }
            Order::Unordered => {
                let receipt_path = path::packet_receipt(
                    &packet.dest_port,
                    &packet.dest_channel,
                    packet.sequence,
                );
                if self.store.has(receipt_path.as_bytes()) {
                    debug!(
                        port_id = %packet.dest_port,
                        channel_id = %packet.dest_channel,
                        sequence = %packet.sequence,
                        "redundant relay, no-op"
                    );
                    return Ok(RecvOutcome::Redundant);
                }
                self.store.set(receipt_path.as_bytes(), &RECEIPT_MARKER);
            }
        }

        let acknowledgement = self
            .router
            .app_mut(&packet.dest_port)
            .map_err(|e| PacketError::Channel(ChannelError::Router(e)))?
            .on_recv_packet(packet);

        self.store.set(
            path::packet_ack(&packet.dest_port, &packet.dest_channel, packet.sequence).as_bytes(),
            &ack_commitment(&acknowledgement),
        );

        info!(
            port_id = %packet.dest_port,
            channel_id = %packet.dest_channel,
            sequence = %packet.sequence,
            "packet received"
        );
        Ok(RecvOutcome::Received { acknowledgement })
    }

    /// Re-validate a delivery without executing it, classifying duplicate
    /// relays separately from structural failures so mempools can drop
    /// them cheaply instead of penalizing the relayer.
    ///
    /// # Errors
    /// [`PacketError::RedundantRelay`] for an already-applied delivery;
    /// hard errors (unknown channel) surface as themselves.
    pub fn recv_packet_recheck(&self, packet: &Packet) -> Result<(), PacketError> {
        let channel = self.read_channel(&packet.dest_port, &packet.dest_channel)?;
        match channel.ordering {
            Order::Ordered => {
                let next_recv = self.read_sequence(&path::next_sequence_recv(
                    &packet.dest_port,
                    &packet.dest_channel,
                ))?;
                if packet.sequence < next_recv {
                    return Err(redundant(packet));
                }
            }
            Order::Unordered => {
                let receipt_path = path::packet_receipt(
                    &packet.dest_port,
                    &packet.dest_channel,
                    packet.sequence,
                );
                if self.store.has(receipt_path.as_bytes()) {
                    return Err(redundant(packet));
                }
            }
        }
        Ok(())
    }

    /// Process the counterparty's acknowledgement of a sent packet:
    /// verify the acknowledgement commitment, notify the application and
    /// delete the local packet commitment.
    ///
    /// # Errors
    /// Hard errors for mismatched commitments, failed proofs, ordered
    /// cursor mismatches and application vetoes. A missing commitment is
    /// a no-op success (a competing relay already completed the packet).
    pub fn acknowledge_packet(
        &mut self,
        env: &Env,
        msg: &MsgAcknowledgement,
    ) -> Result<AckOutcome, HostError> {
        let packet = &msg.packet;
        let channel = self.read_channel(&packet.source_port, &packet.source_channel)?;
        self.ensure_channel_open(&packet.source_port, &packet.source_channel, &channel)
            .map_err(PacketError::Channel)?;

        if channel.counterparty.port_id != packet.dest_port
            || channel.counterparty.channel_id.as_ref() != Some(&packet.dest_channel)
        {
            return Err(counterparty_mismatch_dest(packet, &channel).into());
        }
        let connection = self
            .read_open_connection(&channel.connection_id)
            .map_err(|e| PacketError::Channel(ChannelError::Connection(e)))?;

        let commitment_path = path::packet_commitment(
            &packet.source_port,
            &packet.source_channel,
            packet.sequence,
        );
        let Some(stored) = self.store.get(commitment_path.as_bytes()) else {
            debug!(
                port_id = %packet.source_port,
                channel_id = %packet.source_channel,
                sequence = %packet.sequence,
                "acknowledgement for completed packet, no-op"
            );
            return Ok(AckOutcome::Redundant);
        };
        if stored != packet_commitment(packet) {
            return Err(PacketError::CommitmentMismatch {
                sequence: packet.sequence,
            }
            .into());
        }

        if channel.ordering == Order::Ordered {
            let next_ack = self
                .read_sequence(&path::next_sequence_ack(
                    &packet.source_port,
                    &packet.source_channel,
                ))
                .map_err(PacketError::Store)?;
            if packet.sequence != next_ack {
                return Err(PacketError::SequenceMismatch {
                    expected: next_ack,
                    actual: packet.sequence,
                }
                .into());
            }
        }

        let ack_path = path::packet_ack(&packet.dest_port, &packet.dest_channel, packet.sequence);
        self.verify_client_membership(
            env,
            &connection.client_id,
            msg.proof_height,
            &connection.counterparty.merkle_prefix,
            &ack_path,
            &ack_commitment(&msg.acknowledgement),
            &msg.proof_acked,
        )
        .map_err(PacketError::Client)?;

        self.router
            .app_mut(&packet.source_port)
            .map_err(|e| PacketError::Channel(ChannelError::Router(e)))?
            .on_acknowledgement_packet(packet, &msg.acknowledgement)
            .map_err(PacketError::App)?;

        self.store.remove(commitment_path.as_bytes());
        if channel.ordering == Order::Ordered {
            let next_ack_path =
                path::next_sequence_ack(&packet.source_port, &packet.source_channel);
            let next_ack = self.read_sequence(&next_ack_path).map_err(PacketError::Store)?;
            self.write_sequence(&next_ack_path, next_ack.increment())
                .map_err(PacketError::Store)?;
        }

        info!(
            port_id = %packet.source_port,
            channel_id = %packet.source_channel,
            sequence = %packet.sequence,
            "packet acknowledged"
        );
        Ok(AckOutcome::Acknowledged)
    }

    /// Claim a sent packet timed out: prove the timeout elapsed on the
    /// counterparty and that it never processed the packet, then delete
    /// the commitment. An ordered channel closes; the ordering guarantee
    /// cannot survive a permanent gap.
    ///
    /// # Errors
    /// [`PacketError::TimeoutNotElapsed`] if the proof height/time has not
    /// passed the packet's timeout; hard errors for mismatched commitments
    /// and failed non-membership proofs. A missing commitment is a no-op
    /// success.
    pub fn timeout_packet(&mut self, env: &Env, msg: &MsgTimeout) -> Result<TimeoutOutcome, HostError> {
        let packet = &msg.packet;
        let mut channel = self.read_channel(&packet.source_port, &packet.source_channel)?;
        self.ensure_channel_open(&packet.source_port, &packet.source_channel, &channel)
            .map_err(PacketError::Channel)?;

        if channel.counterparty.port_id != packet.dest_port
            || channel.counterparty.channel_id.as_ref() != Some(&packet.dest_channel)
        {
            return Err(counterparty_mismatch_dest(packet, &channel).into());
        }
        let connection = self
            .read_open_connection(&channel.connection_id)
            .map_err(|e| PacketError::Channel(ChannelError::Connection(e)))?;

        let commitment_path = path::packet_commitment(
            &packet.source_port,
            &packet.source_channel,
            packet.sequence,
        );
        let Some(stored) = self.store.get(commitment_path.as_bytes()) else {
            debug!(
                port_id = %packet.source_port,
                channel_id = %packet.source_channel,
                sequence = %packet.sequence,
                "timeout for completed packet, no-op"
            );
            return Ok(TimeoutOutcome::Redundant);
        };
        if stored != packet_commitment(packet) {
            return Err(PacketError::CommitmentMismatch {
                sequence: packet.sequence,
            }
            .into());
        }

        // Elapsed is judged against the counterparty as evidenced at the
        // proof height, not against the local clock: the proof speaks
        // about the counterparty's state.
        let height_elapsed =
            !packet.timeout_height.is_zero() && msg.proof_height >= packet.timeout_height;
        let time_elapsed = packet.timeout_timestamp_ns != 0
            && self
                .client_timestamp_at_height(&connection.client_id, msg.proof_height)
                .map_err(PacketError::Client)?
                >= packet.timeout_timestamp_ns;
        if !height_elapsed && !time_elapsed {
            return Err(PacketError::TimeoutNotElapsed {
                proof_height: msg.proof_height,
            }
            .into());
        }

        // Ordered channels acknowledge in order, so a missing ack proves
        // the packet was never processed; unordered channels record
        // receipts for exactly this purpose.
        let unreceived_path = match channel.ordering {
            Order::Ordered => {
                path::packet_ack(&packet.dest_port, &packet.dest_channel, packet.sequence)
            }
            Order::Unordered => {
                path::packet_receipt(&packet.dest_port, &packet.dest_channel, packet.sequence)
            }
        };
        self.verify_client_non_membership(
            env,
            &connection.client_id,
            msg.proof_height,
            &connection.counterparty.merkle_prefix,
            &unreceived_path,
            &msg.proof_unreceived,
        )
        .map_err(PacketError::Client)?;

        self.router
            .app_mut(&packet.source_port)
            .map_err(|e| PacketError::Channel(ChannelError::Router(e)))?
            .on_timeout_packet(packet)
            .map_err(PacketError::App)?;

        self.store.remove(commitment_path.as_bytes());
        if channel.ordering == Order::Ordered {
            channel.state = ChannelState::Closed;
            self.write_channel(&packet.source_port, &packet.source_channel, &channel)
                .map_err(PacketError::Store)?;
            warn!(
                port_id = %packet.source_port,
                channel_id = %packet.source_channel,
                "ordered channel closed by timeout"
            );
        }

        info!(
            port_id = %packet.source_port,
            channel_id = %packet.source_channel,
            sequence = %packet.sequence,
            "packet timed out"
        );
        Ok(TimeoutOutcome::TimedOut)
    }

    fn read_sequence(&self, sequence_path: &str) -> Result<Sequence, StoreError> {
        Ok(get_json(&self.store, sequence_path)?.unwrap_or(Sequence::START))
    }

    fn write_sequence(&mut self, sequence_path: &str, sequence: Sequence) -> Result<(), StoreError> {
        set_json(&mut self.store, sequence_path, &sequence)
    }
}

fn redundant(packet: &Packet) -> PacketError {
    PacketError::RedundantRelay {
        port_id: packet.dest_port.clone(),
        channel_id: packet.dest_channel.clone(),
        sequence: packet.sequence,
    }
}

fn rendered_counterparty_channel(channel: &ibc_aegis_types::channel::ChannelEnd) -> String {
    channel
        .counterparty
        .channel_id
        .as_ref()
        .map_or_else(|| "unset".to_string(), ToString::to_string)
}

fn counterparty_mismatch(
    packet: &Packet,
    channel: &ibc_aegis_types::channel::ChannelEnd,
) -> PacketError {
    PacketError::CounterpartyMismatch {
        packet_port: packet.source_port.clone(),
        packet_channel: packet.source_channel.clone(),
        expected_port: channel.counterparty.port_id.clone(),
        expected_channel: rendered_counterparty_channel(channel),
    }
}

fn counterparty_mismatch_dest(
    packet: &Packet,
    channel: &ibc_aegis_types::channel::ChannelEnd,
) -> PacketError {
    PacketError::CounterpartyMismatch {
        packet_port: packet.dest_port.clone(),
        packet_channel: packet.dest_channel.clone(),
        expected_port: channel.counterparty.port_id.clone(),
        expected_channel: rendered_counterparty_channel(channel),
    }
}

#[cfg(test)]
mod tests {
    use ibc_aegis_types::channel::{ChannelState, Order};
    use ibc_aegis_types::height::Height;
    use ibc_aegis_types::identifiers::Sequence;
    use ibc_aegis_types::packet::Packet;
    use ibc_aegis_types::path;

    use super::{AckOutcome, RecvOutcome, TimeoutOutcome};
    use crate::errors::{ChannelError, ClientError, HostError, PacketError};
    use crate::msgs::{MsgAcknowledgement, MsgChanCloseInit, MsgRecvPacket, MsgTimeout};
    use crate::test_utils::{connected_chains, port, proof_height, TestChain};

    const FUTURE_HEIGHT: Height = Height::new(0, 1_000);

    fn send(
        a: &mut TestChain,
        chan: &ibc_aegis_types::identifiers::ChannelId,
        data: &[u8],
    ) -> Packet {
        a.host
            .send_packet(
                &a.env,
                &port(),
                chan,
                data.to_vec(),
                FUTURE_HEIGHT,
                0,
            )
            .unwrap()
    }

    fn recv_msg(a: &TestChain, packet: &Packet) -> MsgRecvPacket {
        let commitment_path = path::packet_commitment(
            &packet.source_port,
            &packet.source_channel,
            packet.sequence,
        );
        MsgRecvPacket {
            packet: packet.clone(),
            proof_height: proof_height(),
            proof_commitment: a.proof_of(&commitment_path),
        }
    }

    #[test]
    fn send_assigns_strictly_increasing_sequences() {
        let (mut a, _b, _ca, _cb, chan_a, _chan_b) = connected_chains(Order::Unordered);

        let p1 = send(&mut a, &chan_a, b"one");
        let p2 = send(&mut a, &chan_a, b"two");
        assert_eq!(p1.sequence, Sequence(1));
        assert_eq!(p2.sequence, Sequence(2));
        assert_eq!(
            a.host.next_sequence_send(&port(), &chan_a).unwrap(),
            Sequence(3)
        );
        assert!(a.host.packet_commitment(&port(), &chan_a, Sequence(1)).is_some());
        assert!(a.host.packet_commitment(&port(), &chan_a, Sequence(2)).is_some());
    }

    #[test]
    fn send_requires_an_open_channel_and_a_future_timeout() {
        let (mut a, _b, _ca, _cb, chan_a, _chan_b) = connected_chains(Order::Unordered);

        // A timeout in the past relative to local state is born dead.
        let err = a
            .host
            .send_packet(&a.env, &port(), &chan_a, b"dead".to_vec(), Height::new(0, 1), 0)
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Packet(PacketError::TimeoutElapsed { .. })
        ));

        // A packet with no timeout at all is rejected.
        let err = a
            .host
            .send_packet(&a.env, &port(), &chan_a, b"open-ended".to_vec(), Height::default(), 0)
            .unwrap_err();
        assert!(matches!(err, HostError::Packet(PacketError::EmptyTimeout)));

        a.host
            .chan_close_init(
                &a.env,
                &MsgChanCloseInit {
                    port_id: port(),
                    channel_id: chan_a.clone(),
                },
            )
            .unwrap();
        let err = a
            .host
            .send_packet(&a.env, &port(), &chan_a, b"late".to_vec(), FUTURE_HEIGHT, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Packet(PacketError::ChannelNotOpen {
                state: ChannelState::Closed,
                ..
            })
        ));
    }

    #[test]
    fn unordered_round_trip_with_redundant_relays() {
        let (mut a, mut b, _ca, _cb, chan_a, chan_b) = connected_chains(Order::Unordered);

        // Chain A sends seq=1; chain B receives it with a valid proof.
        let packet = send(&mut a, &chan_a, b"payload");
        let outcome = b.host.recv_packet(&b.env, &recv_msg(&a, &packet)).unwrap();
        let RecvOutcome::Received { acknowledgement } = outcome else {
            panic!("first delivery must reach the application");
        };
        assert!(b.host.packet_receipt(&port(), &chan_b, Sequence(1)));
        assert!(b
            .host
            .packet_ack_commitment(&port(), &chan_b, Sequence(1))
            .is_some());
        assert_eq!(b.app.borrow().received.len(), 1);

        // A duplicate relay is a no-op success and the application does
        // not run again.
        let outcome = b.host.recv_packet(&b.env, &recv_msg(&a, &packet)).unwrap();
        assert_eq!(outcome, RecvOutcome::Redundant);
        assert_eq!(b.app.borrow().received.len(), 1);

        // Re-validation classifies the duplicate as redundant, distinct
        // from structural failures.
        let err = b.host.recv_packet_recheck(&packet).unwrap_err();
        assert!(matches!(err, PacketError::RedundantRelay { .. }));

        // Chain A processes the acknowledgement: the commitment is gone.
        let ack_path = path::packet_ack(&packet.dest_port, &packet.dest_channel, packet.sequence);
        a.host
            .acknowledge_packet(
                &a.env,
                &MsgAcknowledgement {
                    packet: packet.clone(),
                    acknowledgement: acknowledgement.clone(),
                    proof_height: proof_height(),
                    proof_acked: b.proof_of(&ack_path),
                },
            )
            .unwrap();
        assert!(a.host.packet_commitment(&port(), &chan_a, Sequence(1)).is_none());
        assert_eq!(a.app.borrow().acknowledged.len(), 1);

        // A racing duplicate acknowledgement no-ops.
        let outcome = a
            .host
            .acknowledge_packet(
                &a.env,
                &MsgAcknowledgement {
                    packet,
                    acknowledgement,
                    proof_height: proof_height(),
                    proof_acked: b"stale".to_vec(),
                },
            )
            .unwrap();
        assert_eq!(outcome, AckOutcome::Redundant);
        assert_eq!(a.app.borrow().acknowledged.len(), 1);
    }

    #[test]
    fn recv_rejects_bad_proofs_without_state_changes() {
        let (mut a, mut b, _ca, _cb, chan_a, chan_b) = connected_chains(Order::Unordered);
        let packet = send(&mut a, &chan_a, b"payload");

        let mut msg = recv_msg(&a, &packet);
        msg.proof_commitment = b"forged".to_vec();
        let err = b.host.recv_packet(&b.env, &msg).unwrap_err();
        assert!(matches!(
            err,
            HostError::Packet(PacketError::Client(ClientError::InvalidProof { .. }))
        ));
        assert!(!b.host.packet_receipt(&port(), &chan_b, Sequence(1)));
        assert!(b.app.borrow().received.is_empty());
    }

    #[test]
    fn recv_rejects_locally_elapsed_timeouts() {
        let (mut a, mut b, _ca, _cb, chan_a, _chan_b) = connected_chains(Order::Unordered);
        // Valid at send time on A, elapsed at receive time on B.
        let packet = a
            .host
            .send_packet(
                &a.env,
                &port(),
                &chan_a,
                b"expiring".to_vec(),
                Height::default(),
                a.env.timestamp_ns + 1_000,
            )
            .unwrap();
        b.env.timestamp_ns = a.env.timestamp_ns + 2_000;
        let err = b.host.recv_packet(&b.env, &recv_msg(&a, &packet)).unwrap_err();
        assert!(matches!(
            err,
            HostError::Packet(PacketError::TimeoutElapsed { .. })
        ));
    }

    #[test]
    fn recheck_keeps_structural_errors_hard() {
        let (mut a, b, _ca, _cb, chan_a, _chan_b) = connected_chains(Order::Unordered);
        let mut packet = send(&mut a, &chan_a, b"payload");
        packet.dest_channel = "channel-404".parse().unwrap();
        let err = b.host.recv_packet_recheck(&packet).unwrap_err();
        assert!(matches!(
            err,
            PacketError::Channel(ChannelError::NotFound { .. })
        ));
    }

    #[test]
    fn ordered_channels_enforce_the_receive_cursor() {
        let (mut a, mut b, _ca, _cb, chan_a, chan_b) = connected_chains(Order::Ordered);
        let p1 = send(&mut a, &chan_a, b"first");
        let p2 = send(&mut a, &chan_a, b"second");

        // Out-of-order delivery is a hard error, no buffering.
        let err = b.host.recv_packet(&b.env, &recv_msg(&a, &p2)).unwrap_err();
        assert!(matches!(
            err,
            HostError::Packet(PacketError::SequenceMismatch {
                expected: Sequence(1),
                actual: Sequence(2),
            })
        ));

        // In-order delivery advances the cursor by exactly one.
        b.host.recv_packet(&b.env, &recv_msg(&a, &p1)).unwrap();
        assert_eq!(
            b.host.next_sequence_recv(&port(), &chan_b).unwrap(),
            Sequence(2)
        );
        // Ordered channels keep no receipt set; the cursor is the record.
        assert!(!b.host.packet_receipt(&port(), &chan_b, Sequence(1)));

        // Replaying the consumed sequence is a hard mismatch in execution
        // but classifies as redundant in re-validation.
        let err = b.host.recv_packet(&b.env, &recv_msg(&a, &p1)).unwrap_err();
        assert!(matches!(
            err,
            HostError::Packet(PacketError::SequenceMismatch { .. })
        ));
        assert!(matches!(
            b.host.recv_packet_recheck(&p1).unwrap_err(),
            PacketError::RedundantRelay { .. }
        ));

        b.host.recv_packet(&b.env, &recv_msg(&a, &p2)).unwrap();
        assert_eq!(
            b.host.next_sequence_recv(&port(), &chan_b).unwrap(),
            Sequence(3)
        );
    }

    #[test]
    fn ordered_acknowledgements_gate_on_the_ack_cursor() {
        let (mut a, mut b, _ca, _cb, chan_a, _chan_b) = connected_chains(Order::Ordered);
        let p1 = send(&mut a, &chan_a, b"first");
        let p2 = send(&mut a, &chan_a, b"second");

        let RecvOutcome::Received { acknowledgement: ack1 } =
            b.host.recv_packet(&b.env, &recv_msg(&a, &p1)).unwrap()
        else {
            panic!("delivery expected");
        };
        let RecvOutcome::Received { acknowledgement: ack2 } =
            b.host.recv_packet(&b.env, &recv_msg(&a, &p2)).unwrap()
        else {
            panic!("delivery expected");
        };

        // Acknowledging out of order violates the cursor.
        let ack2_path = path::packet_ack(&p2.dest_port, &p2.dest_channel, p2.sequence);
        let err = a
            .host
            .acknowledge_packet(
                &a.env,
                &MsgAcknowledgement {
                    packet: p2.clone(),
                    acknowledgement: ack2.clone(),
                    proof_height: proof_height(),
                    proof_acked: b.proof_of(&ack2_path),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Packet(PacketError::SequenceMismatch { .. })
        ));

        let ack1_path = path::packet_ack(&p1.dest_port, &p1.dest_channel, p1.sequence);
        a.host
            .acknowledge_packet(
                &a.env,
                &MsgAcknowledgement {
                    packet: p1,
                    acknowledgement: ack1,
                    proof_height: proof_height(),
                    proof_acked: b.proof_of(&ack1_path),
                },
            )
            .unwrap();
        a.host
            .acknowledge_packet(
                &a.env,
                &MsgAcknowledgement {
                    packet: p2,
                    acknowledgement: ack2,
                    proof_height: proof_height(),
                    proof_acked: b.proof_of(&ack2_path),
                },
            )
            .unwrap();
        assert_eq!(
            a.host.next_sequence_ack(&port(), &chan_a).unwrap(),
            Sequence(3)
        );
    }

    #[test]
    fn tampered_packets_fail_the_commitment_check() {
        let (mut a, _b, _ca, _cb, chan_a, _chan_b) = connected_chains(Order::Unordered);
        let mut packet = send(&mut a, &chan_a, b"payload");
        packet.data = b"tampered".to_vec();

        let err = a
            .host
            .acknowledge_packet(
                &a.env,
                &MsgAcknowledgement {
                    packet,
                    acknowledgement: ibc_aegis_types::packet::Acknowledgement::success(b"ok"),
                    proof_height: proof_height(),
                    proof_acked: vec![],
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Packet(PacketError::CommitmentMismatch { .. })
        ));
    }

    /// Prepare a timestamp-timeout packet and a consensus state on the
    /// sender's client recording that the counterparty passed it.
    fn timed_out_packet(a: &mut TestChain, chan_a: &ibc_aegis_types::identifiers::ChannelId) -> (Packet, Height) {
        let timeout_ns = a.env.timestamp_ns + 1_000;
        let packet = a
            .host
            .send_packet(
                &a.env,
                &port(),
                chan_a,
                b"doomed".to_vec(),
                Height::default(),
                timeout_ns,
            )
            .unwrap();

        // The sender's client later records a counterparty consensus
        // state whose time is past the packet's timeout.
        let evidence_height = Height::new(0, 60);
        a.env.timestamp_ns = timeout_ns + 1;
        let client_a: ibc_aegis_types::identifiers::ClientId = "00-mock-0".parse().unwrap();
        a.update_mock_client(&client_a, evidence_height);
        (packet, evidence_height)
    }

    #[test]
    fn timeout_requires_the_deadline_to_have_passed() {
        let (mut a, b, _ca, _cb, chan_a, _chan_b) = connected_chains(Order::Unordered);
        let packet = send(&mut a, &chan_a, b"patient");

        let receipt_path =
            path::packet_receipt(&packet.dest_port, &packet.dest_channel, packet.sequence);
        let err = a
            .host
            .timeout_packet(
                &a.env,
                &MsgTimeout {
                    packet,
                    proof_height: proof_height(),
                    proof_unreceived: b.absence_proof_of(&receipt_path),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Packet(PacketError::TimeoutNotElapsed { .. })
        ));
    }

    #[test]
    fn unordered_timeout_removes_the_commitment_and_keeps_the_channel() {
        let (mut a, b, _ca, _cb, chan_a, _chan_b) = connected_chains(Order::Unordered);
        let (packet, evidence_height) = timed_out_packet(&mut a, &chan_a);

        let receipt_path =
            path::packet_receipt(&packet.dest_port, &packet.dest_channel, packet.sequence);
        let outcome = a
            .host
            .timeout_packet(
                &a.env,
                &MsgTimeout {
                    packet: packet.clone(),
                    proof_height: evidence_height,
                    proof_unreceived: b.absence_proof_of(&receipt_path),
                },
            )
            .unwrap();
        assert_eq!(outcome, TimeoutOutcome::TimedOut);
        assert!(a
            .host
            .packet_commitment(&port(), &chan_a, packet.sequence)
            .is_none());
        assert_eq!(a.app.borrow().timed_out.len(), 1);

        // Unordered channels survive timeouts.
        let end = a.host.channel_end(&port(), &chan_a).unwrap().unwrap();
        assert_eq!(end.state, ChannelState::Open);

        // A racing duplicate timeout no-ops.
        let outcome = a
            .host
            .timeout_packet(
                &a.env,
                &MsgTimeout {
                    packet,
                    proof_height: evidence_height,
                    proof_unreceived: b"stale".to_vec(),
                },
            )
            .unwrap();
        assert_eq!(outcome, TimeoutOutcome::Redundant);
    }

    #[test]
    fn ordered_timeout_closes_the_channel() {
        let (mut a, b, _ca, _cb, chan_a, _chan_b) = connected_chains(Order::Ordered);
        let (packet, evidence_height) = timed_out_packet(&mut a, &chan_a);

        // On ordered channels absence of the acknowledgement is the
        // unreceived evidence.
        let ack_path = path::packet_ack(&packet.dest_port, &packet.dest_channel, packet.sequence);
        a.host
            .timeout_packet(
                &a.env,
                &MsgTimeout {
                    packet: packet.clone(),
                    proof_height: evidence_height,
                    proof_unreceived: b.absence_proof_of(&ack_path),
                },
            )
            .unwrap();

        let end = a.host.channel_end(&port(), &chan_a).unwrap().unwrap();
        assert_eq!(end.state, ChannelState::Closed);

        // The ordering guarantee is gone for good: no further sends.
        let err = a
            .host
            .send_packet(&a.env, &port(), &chan_a, b"more".to_vec(), FUTURE_HEIGHT, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Packet(PacketError::ChannelNotOpen { .. })
        ));
    }
}
