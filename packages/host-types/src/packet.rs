//! Packets and acknowledgements.

use serde::{Deserialize, Serialize};

use crate::height::Height;
use crate::identifiers::{ChannelId, PortId, Sequence};
use crate::serde_util::base64bytes;

/// An authenticated data packet in flight between two chains.
///
/// Packets are never persisted whole; only the derived commitment is
/// stored on the sender and a receipt/acknowledgement on the receiver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Port the packet was sent from.
    pub source_port: PortId,
    /// Channel the packet was sent on.
    pub source_channel: ChannelId,
    /// Port the packet is addressed to.
    pub dest_port: PortId,
    /// Channel the packet is addressed to.
    pub dest_channel: ChannelId,
    /// Per-channel sequence number assigned at send time.
    pub sequence: Sequence,
    /// Opaque application payload.
    #[serde(with = "base64bytes")]
    pub data: Vec<u8>,
    /// Receiving-chain height after which the packet times out. Zero means
    /// no height bound.
    pub timeout_height: Height,
    /// Receiving-chain time (unix nanoseconds) after which the packet times
    /// out. Zero means no time bound.
    pub timeout_timestamp_ns: u64,
}

impl Packet {
    /// Whether the packet declares no timeout bound at all.
    #[must_use]
    pub const fn has_no_timeout(&self) -> bool {
        self.timeout_height.is_zero() && self.timeout_timestamp_ns == 0
    }

    /// Whether the packet's timeout has passed at the given height and time.
    #[must_use]
    pub fn timed_out(&self, height: Height, now_ns: u64) -> bool {
        let height_elapsed = !self.timeout_height.is_zero() && height >= self.timeout_height;
        let time_elapsed = self.timeout_timestamp_ns != 0 && now_ns >= self.timeout_timestamp_ns;
        height_elapsed || time_elapsed
    }
}

/// An acknowledgement payload produced by the receiving application.
///
/// The payload is opaque to the transport; the conventional envelope is a
/// JSON object with either a `result` or an `error` field, and an error
/// acknowledgement is a successful delivery at the protocol level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement(#[serde(with = "base64bytes")] Vec<u8>);

impl Acknowledgement {
    /// A success acknowledgement wrapping an application result.
    #[must_use]
    pub fn success(result: &[u8]) -> Self {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        Self(format!("{{\"result\":\"{}\"}}", STANDARD.encode(result)).into_bytes())
    }

    /// An error acknowledgement carrying an application failure reason.
    #[must_use]
    pub fn error(reason: &str) -> Self {
        let escaped = serde_json::Value::String(reason.to_string()).to_string();
        Self(format!("{{\"error\":{escaped}}}").into_bytes())
    }

    /// The raw acknowledgement bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Acknowledgement {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
