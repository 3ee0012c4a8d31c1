//! Governance-gated code upload and client-code migration.

use ibc_aegis_client_wasm::msgs::MigrateMsg;
use ibc_aegis_client_wasm::{code_store, Checksum, EngineError};
use ibc_aegis_types::path;
use ibc_aegis_types::store::{HostStore, PrefixedStore};
use tracing::info;

use crate::client::AnyClientState;
use crate::errors::{ClientError, HostError};
use crate::msgs::{MsgMigrateClientCode, MsgStoreCode};
use crate::{IbcHost, WasmEngine};

impl<S: HostStore, E: WasmEngine> IbcHost<S, E> {
    /// Upload light-client bytecode, content-addressed by the sha256 of
    /// its decompressed bytes. Only the protocol authority may upload.
    ///
    /// # Errors
    /// [`HostError::Unauthorized`] for any other signer; registry errors
    /// for empty, oversized, corrupt or duplicate uploads.
    pub fn store_code(&mut self, msg: &MsgStoreCode) -> Result<Checksum, HostError> {
        self.ensure_authority(&msg.signer)?;
        let checksum = code_store::store_code(&mut self.store, self.config.max_code_size, &msg.code)?;
        info!(checksum = %checksum, size = msg.code.len(), "client code stored");
        Ok(checksum)
    }

    /// Rebind an existing sandboxed client to already-uploaded code. The
    /// *new* code's migrate entry point decides; a rejection aborts the
    /// whole operation with the sandboxed code's message verbatim, leaving
    /// the prior binding untouched.
    ///
    /// # Errors
    /// [`HostError::Unauthorized`] for non-authority signers,
    /// [`HostError::CodeMigrationRejected`] when the new code declines,
    /// and client/registry errors for unknown clients or checksums.
    pub fn migrate_client_code(&mut self, msg: &MsgMigrateClientCode) -> Result<(), HostError> {
        self.ensure_authority(&msg.signer)?;

        let client_state = match self.read_client_state(&msg.client_id)? {
            AnyClientState::Wasm(client_state) => client_state,
            other => {
                return Err(ClientError::WrongClientType {
                    client_id: msg.client_id.clone(),
                    expected: ibc_aegis_types::identifiers::ClientType::Wasm,
                    actual: other.client_type(),
                }
                .into());
            }
        };
        if !code_store::has_code(&self.store, &msg.new_checksum) {
            return Err(ibc_aegis_client_wasm::CodeRegistryError::NotFound {
                checksum: msg.new_checksum,
            }
            .into());
        }

        let old_checksum = client_state.checksum;
        let migrate = MigrateMsg {
            old_checksum,
            msg: msg.migrate_msg.clone(),
        };
        {
            let prefix = path::client_sandbox_prefix(&msg.client_id);
            let Self { store, engine, .. } = self;
            let mut scoped = PrefixedStore::new(prefix, store);
            engine
                .migrate(&msg.new_checksum, &mut scoped, &migrate)
                .map_err(|e| match e {
                    EngineError::Contract { message } => {
                        HostError::CodeMigrationRejected { reason: message }
                    }
                    other => ClientError::Engine(other).into(),
                })?;
        }

        let rebound = client_state.rebound(msg.new_checksum);
        self.write_client_state(&msg.client_id, &AnyClientState::Wasm(rebound))
            .map_err(ClientError::Store)?;

        info!(
            client_id = %msg.client_id,
            old_checksum = %old_checksum,
            new_checksum = %msg.new_checksum,
            "client code migrated"
        );
        Ok(())
    }

    fn ensure_authority(&self, signer: &str) -> Result<(), HostError> {
        if signer == self.config.authority {
            Ok(())
        } else {
            Err(HostError::Unauthorized {
                signer: signer.to_string(),
            })
        }
    }
}
