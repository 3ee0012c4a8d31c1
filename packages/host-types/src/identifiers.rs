//! Validated identifier newtypes for clients, connections, channels and ports.
//!
//! Generated identifiers follow the `{kind}-{counter}` convention; all
//! identifiers are validated against the ICS-24 charset and length rules on
//! construction and on deserialization, so a stored or wire-supplied
//! identifier that reaches a handler is always well formed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when parsing or validating an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The identifier length is outside the allowed range.
    #[error("identifier `{id}` has invalid length, expected between {min} and {max} characters")]
    InvalidLength {
        /// The offending identifier.
        id: String,
        /// Minimum allowed length.
        min: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// The identifier contains a character outside the ICS-24 charset.
    #[error("identifier `{id}` contains an invalid character")]
    InvalidCharacter {
        /// The offending identifier.
        id: String,
    },

    /// The identifier does not follow the `{kind}-{counter}` convention.
    #[error("identifier `{id}` does not match the expected `{prefix}-{{counter}}` format")]
    InvalidFormat {
        /// The offending identifier.
        id: String,
        /// The expected prefix.
        prefix: String,
    },

    /// The client identifier prefix does not name a known client type.
    #[error("client identifier `{id}` does not carry a known client type prefix")]
    UnknownClientType {
        /// The offending identifier.
        id: String,
    },
}

/// Check a single character against the ICS-24 identifier charset.
const fn is_valid_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '.' | '_' | '+' | '-' | '#' | '[' | ']' | '<' | '>')
}

/// Validate an identifier against ICS-24 charset and length bounds.
fn validate_identifier(id: &str, min: usize, max: usize) -> Result<(), IdentifierError> {
    if id.len() < min || id.len() > max {
        return Err(IdentifierError::InvalidLength {
            id: id.to_string(),
            min,
            max,
        });
    }
    if !id.chars().all(is_valid_id_char) {
        return Err(IdentifierError::InvalidCharacter { id: id.to_string() });
    }
    Ok(())
}

/// Parse the `{counter}` suffix of a `{prefix}-{counter}` identifier.
fn parse_counter(id: &str, prefix: &str) -> Result<u64, IdentifierError> {
    let invalid = || IdentifierError::InvalidFormat {
        id: id.to_string(),
        prefix: prefix.to_string(),
    };
    let suffix = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or_else(invalid)?;
    suffix.parse::<u64>().map_err(|_| invalid())
}

/// The closed set of light-client variants understood by the host.
///
/// The tag doubles as the client-identifier prefix, so the variant a client
/// belongs to is recoverable from its identifier alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientType {
    /// Native BFT consensus verification (CometBFT headers and commits).
    #[serde(rename = "07-cometbft")]
    CometBft,
    /// Verification forwarded to sandboxed, content-addressed bytecode.
    #[serde(rename = "08-wasm")]
    Wasm,
    /// Counterparty provisioned out of band; no consensus verification.
    #[serde(rename = "09-lite")]
    Lite,
    /// Deterministic client for tests and local development networks.
    #[serde(rename = "00-mock")]
    Mock,
}

impl ClientType {
    /// The identifier prefix for this client type.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::CometBft => "07-cometbft",
            Self::Wasm => "08-wasm",
            Self::Lite => "09-lite",
            Self::Mock => "00-mock",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Identifier of a light-client instance, `{type-prefix}-{counter}`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Build the identifier for the `counter`-th client of a type.
    #[must_use]
    pub fn new(client_type: ClientType, counter: u64) -> Self {
        Self(format!("{}-{counter}", client_type.prefix()))
    }

    /// The client type encoded in the identifier prefix.
    #[must_use]
    pub fn client_type(&self) -> ClientType {
        // Constructed/parsed ids always carry a known prefix.
        for ty in [
            ClientType::CometBft,
            ClientType::Wasm,
            ClientType::Lite,
            ClientType::Mock,
        ] {
            if self.0.starts_with(ty.prefix()) {
                return ty;
            }
        }
        unreachable!("client id validated on construction")
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = IdentifierError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        validate_identifier(&id, 9, 64)?;
        let ty = [
            ClientType::CometBft,
            ClientType::Wasm,
            ClientType::Lite,
            ClientType::Mock,
        ]
        .into_iter()
        .find(|ty| id.starts_with(ty.prefix()))
        .ok_or_else(|| IdentifierError::UnknownClientType { id: id.clone() })?;
        parse_counter(&id, ty.prefix())?;
        Ok(Self(id))
    }
}

impl FromStr for ClientId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a connection end, `connection-{counter}`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Prefix shared by all connection identifiers.
    pub const PREFIX: &'static str = "connection";

    /// Build the identifier for the `counter`-th connection.
    #[must_use]
    pub fn new(counter: u64) -> Self {
        Self(format!("{}-{counter}", Self::PREFIX))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = IdentifierError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        validate_identifier(&id, 10, 64)?;
        parse_counter(&id, Self::PREFIX)?;
        Ok(Self(id))
    }
}

impl FromStr for ConnectionId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<ConnectionId> for String {
    fn from(id: ConnectionId) -> Self {
        id.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a channel end, `channel-{counter}`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Prefix shared by all channel identifiers.
    pub const PREFIX: &'static str = "channel";

    /// Build the identifier for the `counter`-th channel.
    #[must_use]
    pub fn new(counter: u64) -> Self {
        Self(format!("{}-{counter}", Self::PREFIX))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChannelId {
    type Error = IdentifierError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        validate_identifier(&id, 8, 64)?;
        parse_counter(&id, Self::PREFIX)?;
        Ok(Self(id))
    }
}

impl FromStr for ChannelId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an application port. Free form within ICS-24 rules.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortId(String);

impl PortId {
    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PortId {
    type Error = IdentifierError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        validate_identifier(&id, 2, 128)?;
        Ok(Self(id))
    }
}

impl FromStr for PortId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<PortId> for String {
    fn from(id: PortId) -> Self {
        id.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A per-channel packet sequence number. Strictly increasing, never reused.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Sequence(pub u64);

impl Sequence {
    /// The first sequence assigned on a fresh channel.
    pub const START: Self = Self(1);

    /// The raw counter value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The next sequence.
    #[must_use]
    pub const fn increment(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u64> for Sequence {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
