//! Channel end records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifiers::{ChannelId, ConnectionId, PortId};

/// Handshake state of a channel end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    /// Created by `ChanOpenInit`.
    Init,
    /// Created by `ChanOpenTry`.
    TryOpen,
    /// Handshake complete; packets flow.
    Open,
    /// Closed explicitly, or forced by an ordered-channel timeout.
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("INIT"),
            Self::TryOpen => f.write_str("TRYOPEN"),
            Self::Open => f.write_str("OPEN"),
            Self::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Packet delivery ordering guarantee of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    /// Strict sequence delivery; the channel closes if a timeout creates an
    /// unrecoverable gap.
    Ordered,
    /// Any-order delivery; duplicates are tolerated via receipts.
    Unordered,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordered => f.write_str("ORDERED"),
            Self::Unordered => f.write_str("UNORDERED"),
        }
    }
}

/// The counterparty half of a channel pairing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounterparty {
    /// The application port on the counterparty chain.
    pub port_id: PortId,
    /// The counterparty's channel id; unknown until the try step.
    pub channel_id: Option<ChannelId>,
}

/// A channel end as persisted in the host store, keyed by
/// `(port_id, channel_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEnd {
    /// Handshake state.
    pub state: ChannelState,
    /// Delivery ordering. Immutable after creation.
    pub ordering: Order,
    /// The counterparty half of the pairing.
    pub counterparty: ChannelCounterparty,
    /// The connection the channel rides on. Immutable after creation.
    pub connection_id: ConnectionId,
    /// Application version agreed during the handshake.
    pub version: String,
}

impl ChannelEnd {
    /// Whether the channel has completed its handshake and is not closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }
}
