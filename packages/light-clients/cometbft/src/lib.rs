//! The native-consensus light client.
//!
//! Verifies counterparty CometBFT headers against a tracked validator set
//! and trusting period, detects conflicting-header misbehaviour, and checks
//! ICS-23 Merkle membership/non-membership proofs against a verified state
//! root. All consensus-critical checks delegate to `ibc-client-tendermint`
//! and `tendermint-light-client-verifier`.
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod client_state;
pub mod consensus_state;
pub mod error;
pub mod membership;
pub mod misbehaviour;
pub mod update;

mod validation;

pub use client_state::{ClientState, TrustThreshold};
pub use consensus_state::ConsensusState;
pub use error::CometBftError;
