//! The four-step connection handshake.
//!
//! `UNINITIALIZED → INIT → TRYOPEN → OPEN`, advanced by one message per
//! step. Every proof-carrying step verifies the counterparty's stored end
//! (and, at the try step, that the counterparty's light client models this
//! chain) before any local write; a failed verification changes nothing.

use ibc_aegis_types::connection::{
    intersect_versions, ConnectionCounterparty, ConnectionEnd, ConnectionState,
};
use ibc_aegis_types::identifiers::ConnectionId;
use ibc_aegis_types::path;
use ibc_aegis_types::store::{encode_json, get_json, set_json, HostStore, StoreError};
use tracing::info;

use crate::client::AnyClientState;
use crate::errors::{ClientError, ConnectionError, HostError};
use crate::msgs::{MsgConnOpenAck, MsgConnOpenConfirm, MsgConnOpenInit, MsgConnOpenTry};
use crate::{Env, IbcHost, WasmEngine};

impl<S: HostStore, E: WasmEngine> IbcHost<S, E> {
    /// First handshake step: create a connection in `INIT`. No proof is
    /// required; there is nothing to verify yet.
    ///
    /// # Errors
    /// Fails if the client is missing or inactive, the proposed version is
    /// unsupported, or the counterparty prefix is empty.
    pub fn conn_open_init(
        &mut self,
        env: &Env,
        msg: &MsgConnOpenInit,
    ) -> Result<ConnectionId, HostError> {
        self.ensure_client_active(env, &msg.client_id)
            .map_err(ConnectionError::Client)?;
        if msg.counterparty_prefix.is_empty() {
            return Err(ConnectionError::EmptyCounterpartyPrefix.into());
        }

        let versions = match &msg.version {
            Some(version) if self.config.supported_versions.contains(version) => {
                vec![version.clone()]
            }
            Some(_) => return Err(ConnectionError::NoCommonVersion.into()),
            None => self.config.supported_versions.clone(),
        };

        let counter = self.next_connection_counter().map_err(ConnectionError::Store)?;
        let connection_id = ConnectionId::new(counter);
        let end = ConnectionEnd {
            state: ConnectionState::Init,
            client_id: msg.client_id.clone(),
            counterparty: ConnectionCounterparty {
                client_id: msg.counterparty_client_id.clone(),
                connection_id: None,
                merkle_prefix: msg.counterparty_prefix.clone(),
            },
            versions,
        };

        self.write_connection(&connection_id, &end)
            .map_err(ConnectionError::Store)?;
        self.bump_connection_counter(counter)
            .map_err(ConnectionError::Store)?;

        info!(connection_id = %connection_id, client_id = %msg.client_id, "connection handshake initiated");
        Ok(connection_id)
    }

    /// Second handshake step: verify the counterparty's `INIT` end and
    /// that its light client models this chain, then create the local end
    /// in `TRYOPEN` with the version intersection.
    ///
    /// # Errors
    /// Fails with `InvalidProof` (wrapped) on any failed verification and
    /// `NoCommonVersion` on an empty intersection; nothing is written on
    /// failure.
    pub fn conn_open_try(
        &mut self,
        env: &Env,
        msg: &MsgConnOpenTry,
    ) -> Result<ConnectionId, HostError> {
        self.ensure_client_active(env, &msg.client_id)
            .map_err(ConnectionError::Client)?;
        if msg.counterparty_prefix.is_empty() {
            return Err(ConnectionError::EmptyCounterpartyPrefix.into());
        }
        if msg.consensus_height >= env.height {
            return Err(ConnectionError::InvalidConsensusHeight {
                height: msg.consensus_height,
                host_height: env.height,
            }
            .into());
        }

        let versions = intersect_versions(&self.config.supported_versions, &msg.counterparty_versions);
        if versions.is_empty() {
            return Err(ConnectionError::NoCommonVersion.into());
        }

        // The claimed client state must at least be a well-formed client
        // state for this chain; deeper parameter audits are host policy.
        serde_json::from_slice::<AnyClientState>(&msg.counterparty_client_state).map_err(|e| {
            ConnectionError::Client(ClientError::InvalidClientState {
                reason: format!("counterparty client state: {e}"),
            })
        })?;

        let expected = ConnectionEnd {
            state: ConnectionState::Init,
            client_id: msg.counterparty_client_id.clone(),
            counterparty: ConnectionCounterparty {
                client_id: msg.client_id.clone(),
                connection_id: None,
                merkle_prefix: self.config.commitment_prefix_bytes(),
            },
            versions: msg.counterparty_versions.clone(),
        };
        let counterparty_path = path::connection(&msg.counterparty_connection_id);
        let expected_bytes =
            encode_json(&counterparty_path, &expected).map_err(ConnectionError::Store)?;
        self.verify_client_membership(
            env,
            &msg.client_id,
            msg.proof_height,
            &msg.counterparty_prefix,
            &counterparty_path,
            &expected_bytes,
            &msg.proof_init,
        )
        .map_err(ConnectionError::Client)?;

        let client_path = path::client_state(&msg.counterparty_client_id);
        self.verify_client_membership(
            env,
            &msg.client_id,
            msg.proof_height,
            &msg.counterparty_prefix,
            &client_path,
            &msg.counterparty_client_state,
            &msg.proof_client,
        )
        .map_err(ConnectionError::Client)?;

        let consensus_path =
            path::consensus_state(&msg.counterparty_client_id, msg.consensus_height);
        self.verify_client_membership(
            env,
            &msg.client_id,
            msg.proof_height,
            &msg.counterparty_prefix,
            &consensus_path,
            &msg.counterparty_consensus_state,
            &msg.proof_consensus,
        )
        .map_err(ConnectionError::Client)?;

        let counter = self.next_connection_counter().map_err(ConnectionError::Store)?;
        let connection_id = ConnectionId::new(counter);
        let end = ConnectionEnd {
            state: ConnectionState::TryOpen,
            client_id: msg.client_id.clone(),
            counterparty: ConnectionCounterparty {
                client_id: msg.counterparty_client_id.clone(),
                connection_id: Some(msg.counterparty_connection_id.clone()),
                merkle_prefix: msg.counterparty_prefix.clone(),
            },
            versions,
        };

        self.write_connection(&connection_id, &end)
            .map_err(ConnectionError::Store)?;
        self.bump_connection_counter(counter)
            .map_err(ConnectionError::Store)?;

        info!(
            connection_id = %connection_id,
            counterparty_connection_id = %msg.counterparty_connection_id,
            "connection handshake tried"
        );
        Ok(connection_id)
    }

    /// Third handshake step: verify the counterparty's `TRYOPEN` end and
    /// open the local `INIT` end with the finally-agreed version.
    ///
    /// # Errors
    /// Fails cleanly (no state change) if the local end is not in `INIT`,
    /// the version was not negotiated, or the proof does not verify.
    pub fn conn_open_ack(&mut self, env: &Env, msg: &MsgConnOpenAck) -> Result<(), HostError> {
        let mut end = self.read_connection(&msg.connection_id)?;
        if end.state != ConnectionState::Init {
            return Err(ConnectionError::InvalidState {
                connection_id: msg.connection_id.clone(),
                expected: ConnectionState::Init,
                actual: end.state,
            }
            .into());
        }
        if !end.versions.contains(&msg.version) || !msg.counterparty_versions.contains(&msg.version)
        {
            return Err(ConnectionError::VersionNotNegotiated {
                version: msg.version.clone(),
            }
            .into());
        }

        let expected = ConnectionEnd {
            state: ConnectionState::TryOpen,
            client_id: end.counterparty.client_id.clone(),
            counterparty: ConnectionCounterparty {
                client_id: end.client_id.clone(),
                connection_id: Some(msg.connection_id.clone()),
                merkle_prefix: self.config.commitment_prefix_bytes(),
            },
            versions: msg.counterparty_versions.clone(),
        };
        let counterparty_path = path::connection(&msg.counterparty_connection_id);
        let expected_bytes =
            encode_json(&counterparty_path, &expected).map_err(ConnectionError::Store)?;
        self.verify_client_membership(
            env,
            &end.client_id,
            msg.proof_height,
            &end.counterparty.merkle_prefix,
            &counterparty_path,
            &expected_bytes,
            &msg.proof_try,
        )
        .map_err(ConnectionError::Client)?;

        end.state = ConnectionState::Open;
        end.versions = vec![msg.version.clone()];
        end.counterparty.connection_id = Some(msg.counterparty_connection_id.clone());
        self.write_connection(&msg.connection_id, &end)
            .map_err(ConnectionError::Store)?;

        info!(connection_id = %msg.connection_id, version = %msg.version, "connection open (ack)");
        Ok(())
    }

    /// Fourth handshake step: verify the counterparty's `OPEN` end and
    /// open the local `TRYOPEN` end.
    ///
    /// # Errors
    /// Fails cleanly (no state change) if the local end is not in
    /// `TRYOPEN`, the version was not negotiated, or the proof does not
    /// verify.
    pub fn conn_open_confirm(
        &mut self,
        env: &Env,
        msg: &MsgConnOpenConfirm,
    ) -> Result<(), HostError> {
        let mut end = self.read_connection(&msg.connection_id)?;
        if end.state != ConnectionState::TryOpen {
            return Err(ConnectionError::InvalidState {
                connection_id: msg.connection_id.clone(),
                expected: ConnectionState::TryOpen,
                actual: end.state,
            }
            .into());
        }
        if !end.versions.contains(&msg.version) {
            return Err(ConnectionError::VersionNotNegotiated {
                version: msg.version.clone(),
            }
            .into());
        }
        let counterparty_connection_id = end.counterparty.connection_id.clone().ok_or_else(|| {
            ConnectionError::MissingCounterpartyConnection {
                connection_id: msg.connection_id.clone(),
            }
        })?;

        let expected = ConnectionEnd {
            state: ConnectionState::Open,
            client_id: end.counterparty.client_id.clone(),
            counterparty: ConnectionCounterparty {
                client_id: end.client_id.clone(),
                connection_id: Some(msg.connection_id.clone()),
                merkle_prefix: self.config.commitment_prefix_bytes(),
            },
            versions: vec![msg.version.clone()],
        };
        let counterparty_path = path::connection(&counterparty_connection_id);
        let expected_bytes =
            encode_json(&counterparty_path, &expected).map_err(ConnectionError::Store)?;
        self.verify_client_membership(
            env,
            &end.client_id,
            msg.proof_height,
            &end.counterparty.merkle_prefix,
            &counterparty_path,
            &expected_bytes,
            &msg.proof_ack,
        )
        .map_err(ConnectionError::Client)?;

        end.state = ConnectionState::Open;
        end.versions = vec![msg.version.clone()];
        self.write_connection(&msg.connection_id, &end)
            .map_err(ConnectionError::Store)?;

        info!(connection_id = %msg.connection_id, "connection open (confirm)");
        Ok(())
    }

    pub(crate) fn read_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionEnd, ConnectionError> {
        get_json(&self.store, &path::connection(connection_id))?.ok_or_else(|| {
            ConnectionError::NotFound {
                connection_id: connection_id.clone(),
            }
        })
    }

    /// The connection, required to be `OPEN` (used by the channel and
    /// packet layers).
    pub(crate) fn read_open_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionEnd, ConnectionError> {
        let end = self.read_connection(connection_id)?;
        if !end.is_open() {
            return Err(ConnectionError::NotOpen {
                connection_id: connection_id.clone(),
            });
        }
        Ok(end)
    }

    fn write_connection(
        &mut self,
        connection_id: &ConnectionId,
        end: &ConnectionEnd,
    ) -> Result<(), StoreError> {
        set_json(&mut self.store, &path::connection(connection_id), end)
    }

    fn next_connection_counter(&self) -> Result<u64, StoreError> {
        Ok(get_json(&self.store, &path::next_connection_sequence())?.unwrap_or(0))
    }

    fn bump_connection_counter(&mut self, current: u64) -> Result<(), StoreError> {
        set_json(
            &mut self.store,
            &path::next_connection_sequence(),
            &(current + 1),
        )
    }
}

#[cfg(test)]
mod tests {
    use ibc_aegis_types::connection::ConnectionState;
    use ibc_aegis_types::height::Height;
    use ibc_aegis_types::path;

    use crate::errors::{ClientError, ConnectionError, HostError};
    use crate::msgs::{MsgConnOpenAck, MsgConnOpenInit, MsgConnOpenTry};
    use crate::test_utils::{connect, proof_height, TestChain};

    #[test]
    fn full_handshake_opens_both_ends() {
        let mut a = TestChain::new();
        let mut b = TestChain::new();
        let (client_a, client_b, conn_a, conn_b) = connect(&mut a, &mut b);

        let end_a = a.host.connection_end(&conn_a).unwrap().unwrap();
        assert_eq!(end_a.state, ConnectionState::Open);
        assert_eq!(end_a.client_id, client_a);
        assert_eq!(end_a.counterparty.client_id, client_b);
        assert_eq!(end_a.counterparty.connection_id, Some(conn_b.clone()));
        assert_eq!(end_a.versions, vec!["1".to_string()]);

        let end_b = b.host.connection_end(&conn_b).unwrap().unwrap();
        assert_eq!(end_b.state, ConnectionState::Open);
        assert_eq!(end_b.counterparty.connection_id, Some(conn_a));
        assert_eq!(end_b.versions, vec!["1".to_string()]);
    }

    #[test]
    fn duplicate_ack_fails_cleanly_and_never_regresses() {
        let mut a = TestChain::new();
        let mut b = TestChain::new();
        let (_, _, conn_a, conn_b) = connect(&mut a, &mut b);

        let err = a
            .host
            .conn_open_ack(
                &a.env,
                &MsgConnOpenAck {
                    connection_id: conn_a.clone(),
                    counterparty_connection_id: conn_b,
                    version: "1".to_string(),
                    counterparty_versions: vec!["1".to_string()],
                    proof_height: proof_height(),
                    proof_try: b"stale".to_vec(),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Connection(ConnectionError::InvalidState {
                expected: ConnectionState::Init,
                actual: ConnectionState::Open,
                ..
            })
        ));

        let end = a.host.connection_end(&conn_a).unwrap().unwrap();
        assert_eq!(end.state, ConnectionState::Open);
    }

    #[test]
    fn init_rejects_unsupported_version() {
        let mut a = TestChain::new();
        let client = a.create_mock_client();
        let err = a
            .host
            .conn_open_init(
                &a.env,
                &MsgConnOpenInit {
                    client_id: client.clone(),
                    counterparty_client_id: client,
                    counterparty_prefix: b"ibc".to_vec(),
                    version: Some("99".to_string()),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Connection(ConnectionError::NoCommonVersion)
        ));
    }

    #[test]
    fn try_rejects_disjoint_versions_and_bad_proofs() {
        let mut a = TestChain::new();
        let mut b = TestChain::new();
        let client_a = a.create_mock_client();
        let client_b = b.create_mock_client();
        let conn_a = a
            .host
            .conn_open_init(
                &a.env,
                &MsgConnOpenInit {
                    client_id: client_a.clone(),
                    counterparty_client_id: client_b.clone(),
                    counterparty_prefix: b"ibc".to_vec(),
                    version: None,
                },
            )
            .unwrap();
        b.update_mock_client(&client_b, proof_height());

        let consensus_height = Height::new(0, 1);
        let client_state_path = path::client_state(&client_a);
        let consensus_state_path = path::consensus_state(&client_a, consensus_height);
        let base_msg = MsgConnOpenTry {
            client_id: client_b.clone(),
            counterparty_client_id: client_a.clone(),
            counterparty_connection_id: conn_a.clone(),
            counterparty_prefix: b"ibc".to_vec(),
            counterparty_versions: vec!["1".to_string()],
            proof_height: proof_height(),
            proof_init: a.proof_of(&path::connection(&conn_a)),
            proof_client: a.proof_of(&client_state_path),
            proof_consensus: a.proof_of(&consensus_state_path),
            counterparty_client_state: a.stored(&client_state_path),
            consensus_height,
            counterparty_consensus_state: a.stored(&consensus_state_path),
        };

        let mut disjoint = base_msg.clone();
        disjoint.counterparty_versions = vec!["99".to_string()];
        assert!(matches!(
            b.host.conn_open_try(&b.env, &disjoint).unwrap_err(),
            HostError::Connection(ConnectionError::NoCommonVersion)
        ));

        let mut tampered = base_msg.clone();
        tampered.proof_init = b"forged".to_vec();
        assert!(matches!(
            b.host.conn_open_try(&b.env, &tampered).unwrap_err(),
            HostError::Connection(ConnectionError::Client(ClientError::InvalidProof { .. }))
        ));
        // Nothing was written for the failed attempts.
        let first_id = ibc_aegis_types::identifiers::ConnectionId::new(0);
        assert!(b.host.connection_end(&first_id).unwrap().is_none());

        // The untampered message still goes through.
        b.host.conn_open_try(&b.env, &base_msg).unwrap();
        assert!(b.host.connection_end(&first_id).unwrap().is_some());
    }

    #[test]
    fn try_rejects_future_self_consensus_height() {
        let mut a = TestChain::new();
        let mut b = TestChain::new();
        let client_a = a.create_mock_client();
        let client_b = b.create_mock_client();
        let conn_a = a
            .host
            .conn_open_init(
                &a.env,
                &MsgConnOpenInit {
                    client_id: client_a.clone(),
                    counterparty_client_id: client_b.clone(),
                    counterparty_prefix: b"ibc".to_vec(),
                    version: None,
                },
            )
            .unwrap();
        b.update_mock_client(&client_b, proof_height());

        let msg = MsgConnOpenTry {
            client_id: client_b,
            counterparty_client_id: client_a,
            counterparty_connection_id: conn_a.clone(),
            counterparty_prefix: b"ibc".to_vec(),
            counterparty_versions: vec!["1".to_string()],
            proof_height: proof_height(),
            proof_init: a.proof_of(&path::connection(&conn_a)),
            proof_client: vec![],
            proof_consensus: vec![],
            counterparty_client_state: vec![],
            consensus_height: b.env.height,
            counterparty_consensus_state: vec![],
        };
        assert!(matches!(
            b.host.conn_open_try(&b.env, &msg).unwrap_err(),
            HostError::Connection(ConnectionError::InvalidConsensusHeight { .. })
        ));
    }
}
