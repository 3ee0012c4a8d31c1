//! The aegis IBC host state machine.
//!
//! Two mutually distrusting chains exchange authenticated packets whose
//! delivery, ordering and timeout are proven with membership and
//! non-membership proofs against each other's state roots. This crate
//! carries the host side of that protocol: the client keeper and proof
//! verifier over the closed set of light-client variants, the connection
//! and channel handshake state machines, the packet lifecycle, and the
//! governance-gated code registry for the sandboxed client variant.
//!
//! Execution is single-threaded and deterministic: each message handler
//! runs synchronously, verifies everything before its first write, and
//! either fully applies or fully fails. The asynchrony of the protocol
//! lives outside, in the untrusted relayers that carry messages between
//! chains.
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod channel;
pub mod client;
pub mod config;
pub mod connection;
pub mod errors;
pub mod msgs;
pub mod packet;
pub mod router;

mod proof;
mod query;
mod registry;

#[cfg(test)]
mod test_utils;

use ibc_aegis_types::height::Height;
use ibc_aegis_types::store::HostStore;

pub use ibc_aegis_client_wasm::engine::NoopEngine;
pub use ibc_aegis_client_wasm::WasmEngine;

use crate::config::HostConfig;
use crate::router::PortRouter;

/// The host chain's view of "now", passed into every handler by the
/// embedding chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Env {
    /// Current block height.
    pub height: Height,
    /// Current block time, unix nanoseconds.
    pub timestamp_ns: u64,
}

/// An IBC host instance: the state machine over a backing store, a
/// sandbox engine, the application router and static configuration.
pub struct IbcHost<S, E> {
    store: S,
    engine: E,
    router: PortRouter,
    config: HostConfig,
}

impl<S: HostStore, E: WasmEngine> IbcHost<S, E> {
    /// Assemble a host from its collaborators.
    pub const fn new(store: S, engine: E, router: PortRouter, config: HostConfig) -> Self {
        Self {
            store,
            engine,
            router,
            config,
        }
    }

    /// The host configuration.
    pub const fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Read access to the backing store, for embedders that serve raw
    /// state queries (and for proofs over this chain's own state).
    pub const fn store(&self) -> &S {
        &self.store
    }
}
