//! The capability contract a sandbox execution engine must satisfy.

use ibc_aegis_types::store::HostStore;
use serde::de::DeserializeOwned;

use crate::checksum::Checksum;
use crate::error::EngineError;
use crate::msgs::{InstantiateMsg, MigrateMsg, QueryMsg, SudoMsg};

/// Executes uploaded light-client bytecode on behalf of the host.
///
/// The engine is an external collaborator; the host never interprets the
/// bytecode itself. Every call is scoped to one client instance: `store`
/// is a view of that client's own namespace, so sandboxed code can manage
/// its state without being able to reach host records. Responses are JSON
/// bytes matching the result types in [`crate::msgs`].
pub trait WasmEngine {
    /// Run the code's instantiate entry point for a fresh client.
    ///
    /// # Errors
    /// Returns [`EngineError`] if the code is unknown or rejects the call.
    fn instantiate(
        &mut self,
        checksum: &Checksum,
        store: &mut dyn HostStore,
        msg: &InstantiateMsg,
    ) -> Result<(), EngineError>;

    /// Run a state-mutating entry point.
    ///
    /// # Errors
    /// Returns [`EngineError`] if the code is unknown or rejects the call.
    fn sudo(
        &mut self,
        checksum: &Checksum,
        store: &mut dyn HostStore,
        msg: &SudoMsg,
    ) -> Result<Vec<u8>, EngineError>;

    /// Run a read-only entry point.
    ///
    /// # Errors
    /// Returns [`EngineError`] if the code is unknown or rejects the call.
    fn query(
        &self,
        checksum: &Checksum,
        store: &dyn HostStore,
        msg: &QueryMsg,
    ) -> Result<Vec<u8>, EngineError>;

    /// Run the migrate entry point of the code identified by `checksum`
    /// (the *new* code) against an existing client's state.
    ///
    /// # Errors
    /// Returns [`EngineError::Contract`] with the code's verbatim message
    /// if the migration is rejected.
    fn migrate(
        &mut self,
        checksum: &Checksum,
        store: &mut dyn HostStore,
        msg: &MigrateMsg,
    ) -> Result<Vec<u8>, EngineError>;
}

/// Decode an engine response as the expected result type.
///
/// # Errors
/// Returns [`EngineError::InvalidResponse`] if the bytes do not decode.
pub fn parse_response<T: DeserializeOwned>(
    context: &'static str,
    bytes: &[u8],
) -> Result<T, EngineError> {
    serde_json::from_slice(bytes).map_err(|e| EngineError::InvalidResponse {
        context,
        reason: e.to_string(),
    })
}

/// An engine for hosts that do not execute sandboxed code. Every call
/// fails with [`EngineError::Unsupported`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEngine;

impl WasmEngine for NoopEngine {
    fn instantiate(
        &mut self,
        _checksum: &Checksum,
        _store: &mut dyn HostStore,
        _msg: &InstantiateMsg,
    ) -> Result<(), EngineError> {
        Err(EngineError::Unsupported)
    }

    fn sudo(
        &mut self,
        _checksum: &Checksum,
        _store: &mut dyn HostStore,
        _msg: &SudoMsg,
    ) -> Result<Vec<u8>, EngineError> {
        Err(EngineError::Unsupported)
    }

    fn query(
        &self,
        _checksum: &Checksum,
        _store: &dyn HostStore,
        _msg: &QueryMsg,
    ) -> Result<Vec<u8>, EngineError> {
        Err(EngineError::Unsupported)
    }

    fn migrate(
        &mut self,
        _checksum: &Checksum,
        _store: &mut dyn HostStore,
        _msg: &MigrateMsg,
    ) -> Result<Vec<u8>, EngineError> {
        Err(EngineError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::parse_response;
    use crate::error::EngineError;
    use crate::msgs::StatusResult;

    #[test]
    fn responses_decode_or_fail_typed() {
        let ok: StatusResult = parse_response("status", b"{\"status\":\"Active\"}").unwrap();
        assert_eq!(ok.status, "Active");

        let err = parse_response::<StatusResult>("status", b"garbage").unwrap_err();
        assert!(matches!(err, EngineError::InvalidResponse { .. }));
    }
}
