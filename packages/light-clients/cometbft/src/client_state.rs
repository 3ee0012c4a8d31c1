//! CometBFT client state.

use std::time::Duration;

use ibc_aegis_types::height::Height;
use serde::{Deserialize, Serialize};
use tendermint::trust_threshold::TrustThresholdFraction;
use tendermint_light_client_verifier::options::Options;

use crate::error::CometBftError;

/// Fraction of the trusted validator set that must sign a new header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustThreshold {
    /// Fraction numerator.
    pub numerator: u64,
    /// Fraction denominator.
    pub denominator: u64,
}

impl TrustThreshold {
    /// The conventional one-third threshold.
    pub const ONE_THIRD: Self = Self {
        numerator: 1,
        denominator: 3,
    };

    /// The two-thirds threshold used by chains that want supermajority
    /// overlap on every update.
    pub const TWO_THIRDS: Self = Self {
        numerator: 2,
        denominator: 3,
    };
}

/// Parameters of a CometBFT light client instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    /// Chain id of the counterparty chain.
    pub chain_id: String,
    /// Signature overlap required between trusted and new validator sets.
    pub trust_level: TrustThreshold,
    /// How long a consensus state remains trustable, in seconds.
    pub trusting_period_secs: u64,
    /// The counterparty's unbonding period, in seconds. Must exceed the
    /// trusting period or a long-range attack window opens.
    pub unbonding_period_secs: u64,
    /// Tolerated clock skew between the chains, in seconds.
    pub max_clock_drift_secs: u64,
    /// Height of the newest verified consensus state.
    pub latest_height: Height,
    /// Set when misbehaviour froze the client.
    pub frozen_height: Option<Height>,
}

impl ClientState {
    /// Validate the parameters of a new client.
    ///
    /// # Errors
    /// Returns [`CometBftError::InvalidClientState`] naming the first
    /// malformed parameter.
    pub fn validate(&self) -> Result<(), CometBftError> {
        let invalid = |reason: &str| CometBftError::InvalidClientState {
            reason: reason.to_string(),
        };
        if self.chain_id.is_empty() {
            return Err(invalid("chain id must not be empty"));
        }
        if self.trusting_period_secs == 0 {
            return Err(invalid("trusting period must be greater than zero"));
        }
        if self.unbonding_period_secs <= self.trusting_period_secs {
            return Err(invalid("unbonding period must exceed the trusting period"));
        }
        if self.trust_level.denominator == 0 || self.trust_level.numerator == 0 {
            return Err(invalid("trust level must be a positive fraction"));
        }
        if self.trust_level.numerator > self.trust_level.denominator {
            return Err(invalid("trust level must not exceed 1"));
        }
        if self.trust_level.numerator * 3 < self.trust_level.denominator {
            return Err(invalid("trust level must be at least 1/3"));
        }
        if self.latest_height.revision_height == 0 {
            return Err(invalid("latest height must be greater than zero"));
        }
        if self.frozen_height.is_some() {
            return Err(invalid("new client must not be frozen"));
        }
        Ok(())
    }

    /// Whether misbehaviour froze this client.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen_height.is_some()
    }

    /// Whether a consensus state recorded at `timestamp_ns` has outlived
    /// the trusting period at `now_ns`.
    #[must_use]
    pub const fn expired(&self, timestamp_ns: u64, now_ns: u64) -> bool {
        let trusting_period_ns = self.trusting_period_secs * 1_000_000_000;
        now_ns >= timestamp_ns + trusting_period_ns
    }

    /// Build the verifier options for this client.
    ///
    /// # Errors
    /// Returns [`CometBftError::InvalidClientState`] if the trust level is
    /// rejected by the verifier.
    pub fn options(&self) -> Result<Options, CometBftError> {
        let trust_threshold =
            TrustThresholdFraction::new(self.trust_level.numerator, self.trust_level.denominator)
                .map_err(|e| CometBftError::InvalidClientState {
                    reason: format!("trust level: {e}"),
                })?;
        Ok(Options {
            trust_threshold,
            trusting_period: Duration::from_secs(self.trusting_period_secs),
            clock_drift: Duration::from_secs(self.max_clock_drift_secs),
        })
    }
}
