//! Connection end records and version negotiation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifiers::{ClientId, ConnectionId};
use crate::serde_util::base64bytes;

/// Handshake state of a connection end. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Created by `ConnOpenInit`; waiting for the counterparty's try step.
    Init,
    /// Created by `ConnOpenTry`; waiting for the counterparty's ack.
    TryOpen,
    /// Handshake complete. Terminal.
    Open,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("INIT"),
            Self::TryOpen => f.write_str("TRYOPEN"),
            Self::Open => f.write_str("OPEN"),
        }
    }
}

/// The counterparty half of a connection pairing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCounterparty {
    /// The counterparty's client for this chain.
    pub client_id: ClientId,
    /// The counterparty's connection id; unknown until the try step.
    pub connection_id: Option<ConnectionId>,
    /// Key prefix the counterparty commits its state under.
    #[serde(with = "base64bytes")]
    pub merkle_prefix: Vec<u8>,
}

/// A connection end as persisted in the host store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEnd {
    /// Handshake state.
    pub state: ConnectionState,
    /// The local client verifying the counterparty chain.
    pub client_id: ClientId,
    /// The counterparty half of the pairing.
    pub counterparty: ConnectionCounterparty,
    /// Negotiable version strings. Narrowed to the intersection at the try
    /// step and to the single agreed version once open.
    pub versions: Vec<String>,
}

impl ConnectionEnd {
    /// Whether the connection has completed its handshake.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }
}

/// The version proposed when a caller does not name one.
pub const DEFAULT_VERSION: &str = "1";

/// Order-preserving intersection of two version proposals.
#[must_use]
pub fn intersect_versions(ours: &[String], theirs: &[String]) -> Vec<String> {
    ours.iter()
        .filter(|v| theirs.contains(v))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::intersect_versions;

    fn versions(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn intersection_keeps_local_preference_order() {
        let ours = versions(&["2", "1", "3"]);
        let theirs = versions(&["1", "2"]);
        assert_eq!(intersect_versions(&ours, &theirs), versions(&["2", "1"]));
    }

    #[test]
    fn disjoint_proposals_intersect_to_empty() {
        assert!(intersect_versions(&versions(&["1"]), &versions(&["2"])).is_empty());
    }
}
