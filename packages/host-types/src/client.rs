//! Client status shared between the host and the light-client crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The lifecycle status of a light-client instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// The client verifies proofs.
    Active,
    /// Misbehaviour was detected; the client permanently rejects proofs.
    Frozen,
    /// The newest consensus state is older than the trusting period.
    Expired,
}

impl Status {
    /// Whether proofs may be verified against this client.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("Active"),
            Self::Frozen => f.write_str("Frozen"),
            Self::Expired => f.write_str("Expired"),
        }
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Frozen" => Ok(Self::Frozen),
            "Expired" => Ok(Self::Expired),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Error for a status string outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown client status `{0}`")]
pub struct UnknownStatus(pub String);
