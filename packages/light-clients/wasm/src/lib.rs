//! The sandboxed-code light client.
//!
//! Every verification call is forwarded unchanged to externally uploaded
//! bytecode identified by the sha256 checksum of its decompressed bytes.
//! The host only knows the checksum, an opaque data blob the sandbox
//! manages, and the entry-point message surface defined here; the sandbox
//! engine itself is an external collaborator behind [`engine::WasmEngine`].
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod checksum;
pub mod client_state;
pub mod code_store;
pub mod engine;
pub mod error;
pub mod msgs;

pub use checksum::Checksum;
pub use client_state::{WasmClientState, WasmConsensusState};
pub use engine::WasmEngine;
pub use error::{CodeRegistryError, EngineError};
