//! The four-step channel handshake and the close steps.
//!
//! Channels are scoped to `(port_id, channel_id)`, ride exactly one open
//! connection, and invoke the application callbacks of the port at every
//! step; a callback error aborts the step with nothing written.

use ibc_aegis_types::channel::{ChannelCounterparty, ChannelEnd, ChannelState};
use ibc_aegis_types::identifiers::{ChannelId, PortId, Sequence};
use ibc_aegis_types::path;
use ibc_aegis_types::store::{encode_json, get_json, set_json, HostStore, StoreError};
use tracing::info;

use crate::errors::{ChannelError, ConnectionError, HostError};
use crate::msgs::{
    MsgChanCloseConfirm, MsgChanCloseInit, MsgChanOpenAck, MsgChanOpenConfirm, MsgChanOpenInit,
    MsgChanOpenTry,
};
use crate::{Env, IbcHost, WasmEngine};

impl<S: HostStore, E: WasmEngine> IbcHost<S, E> {
    /// First handshake step: create a channel in `INIT` on an open
    /// connection. No proof required.
    ///
    /// # Errors
    /// Fails if the connection is not open, no application is bound to
    /// the port, or the application vetoes the step.
    pub fn chan_open_init(
        &mut self,
        _env: &Env,
        msg: &MsgChanOpenInit,
    ) -> Result<ChannelId, HostError> {
        self.read_open_connection(&msg.connection_id)
            .map_err(ChannelError::Connection)?;

        let counter = self.next_channel_counter().map_err(ChannelError::Store)?;
        let channel_id = ChannelId::new(counter);
        let counterparty = ChannelCounterparty {
            port_id: msg.counterparty_port_id.clone(),
            channel_id: None,
        };

        let version = self
            .router
            .app_mut(&msg.port_id)
            .map_err(ChannelError::Router)?
            .on_chan_open_init(
                msg.ordering,
                &msg.connection_id,
                &msg.port_id,
                &channel_id,
                &counterparty,
                &msg.version,
            )
            .map_err(ChannelError::App)?;

        let end = ChannelEnd {
            state: ChannelState::Init,
            ordering: msg.ordering,
            counterparty,
            connection_id: msg.connection_id.clone(),
            version,
        };
        self.write_channel(&msg.port_id, &channel_id, &end)
            .map_err(ChannelError::Store)?;
        self.init_channel_sequences(&msg.port_id, &channel_id)
            .map_err(ChannelError::Store)?;
        self.bump_channel_counter(counter)
            .map_err(ChannelError::Store)?;

        info!(port_id = %msg.port_id, channel_id = %channel_id, ordering = %msg.ordering, "channel handshake initiated");
        Ok(channel_id)
    }

    /// Second handshake step: verify the counterparty's `INIT` channel and
    /// create the local end in `TRYOPEN`.
    ///
    /// # Errors
    /// Fails with `InvalidProof` (wrapped) if the counterparty end cannot
    /// be proven, and with the application's error on veto.
    pub fn chan_open_try(
        &mut self,
        env: &Env,
        msg: &MsgChanOpenTry,
    ) -> Result<ChannelId, HostError> {
        let connection = self
            .read_open_connection(&msg.connection_id)
            .map_err(ChannelError::Connection)?;
        let counterparty_connection_id = connection
            .counterparty
            .connection_id
            .clone()
            .ok_or_else(|| {
                ChannelError::Connection(ConnectionError::MissingCounterpartyConnection {
                    connection_id: msg.connection_id.clone(),
                })
            })?;

        let expected = ChannelEnd {
            state: ChannelState::Init,
            ordering: msg.ordering,
            counterparty: ChannelCounterparty {
                port_id: msg.port_id.clone(),
                channel_id: None,
            },
            connection_id: counterparty_connection_id,
            version: msg.counterparty_version.clone(),
        };
        let counterparty_path =
            path::channel(&msg.counterparty_port_id, &msg.counterparty_channel_id);
        let expected_bytes =
            encode_json(&counterparty_path, &expected).map_err(ChannelError::Store)?;
        self.verify_client_membership(
            env,
            &connection.client_id,
            msg.proof_height,
            &connection.counterparty.merkle_prefix,
            &counterparty_path,
            &expected_bytes,
            &msg.proof_init,
        )
        .map_err(|e| ChannelError::Connection(ConnectionError::Client(e)))?;

        let counter = self.next_channel_counter().map_err(ChannelError::Store)?;
        let channel_id = ChannelId::new(counter);
        let counterparty = ChannelCounterparty {
            port_id: msg.counterparty_port_id.clone(),
            channel_id: Some(msg.counterparty_channel_id.clone()),
        };

        let version = self
            .router
            .app_mut(&msg.port_id)
            .map_err(ChannelError::Router)?
            .on_chan_open_try(
                msg.ordering,
                &msg.connection_id,
                &msg.port_id,
                &channel_id,
                &counterparty,
                &msg.counterparty_version,
            )
            .map_err(ChannelError::App)?;

        let end = ChannelEnd {
            state: ChannelState::TryOpen,
            ordering: msg.ordering,
            counterparty,
            connection_id: msg.connection_id.clone(),
            version,
        };
        self.write_channel(&msg.port_id, &channel_id, &end)
            .map_err(ChannelError::Store)?;
        self.init_channel_sequences(&msg.port_id, &channel_id)
            .map_err(ChannelError::Store)?;
        self.bump_channel_counter(counter)
            .map_err(ChannelError::Store)?;

        info!(port_id = %msg.port_id, channel_id = %channel_id, "channel handshake tried");
        Ok(channel_id)
    }

    /// Third handshake step: verify the counterparty's `TRYOPEN` channel
    /// and open the local `INIT` end with the counterparty's version.
    ///
    /// # Errors
    /// Fails cleanly (no state change) if the channel is not in `INIT`,
    /// the proof does not verify, or the application vetoes.
    pub fn chan_open_ack(&mut self, env: &Env, msg: &MsgChanOpenAck) -> Result<(), HostError> {
        let mut channel = self.read_channel(&msg.port_id, &msg.channel_id)?;
        if channel.state != ChannelState::Init {
            return Err(ChannelError::InvalidState {
                port_id: msg.port_id.clone(),
                channel_id: msg.channel_id.clone(),
                expected: ChannelState::Init,
                actual: channel.state,
            }
            .into());
        }
        let connection = self
            .read_open_connection(&channel.connection_id)
            .map_err(ChannelError::Connection)?;
        let counterparty_connection_id = connection
            .counterparty
            .connection_id
            .clone()
            .ok_or_else(|| {
                ChannelError::Connection(ConnectionError::MissingCounterpartyConnection {
                    connection_id: channel.connection_id.clone(),
                })
            })?;

        let expected = ChannelEnd {
            state: ChannelState::TryOpen,
            ordering: channel.ordering,
            counterparty: ChannelCounterparty {
                port_id: msg.port_id.clone(),
                channel_id: Some(msg.channel_id.clone()),
            },
            connection_id: counterparty_connection_id,
            version: msg.counterparty_version.clone(),
        };
        let counterparty_path = path::channel(
            &channel.counterparty.port_id,
            &msg.counterparty_channel_id,
        );
        let expected_bytes =
            encode_json(&counterparty_path, &expected).map_err(ChannelError::Store)?;
        self.verify_client_membership(
            env,
            &connection.client_id,
            msg.proof_height,
            &connection.counterparty.merkle_prefix,
            &counterparty_path,
            &expected_bytes,
            &msg.proof_try,
        )
        .map_err(|e| ChannelError::Connection(ConnectionError::Client(e)))?;

        self.router
            .app_mut(&msg.port_id)
            .map_err(ChannelError::Router)?
            .on_chan_open_ack(
                &msg.port_id,
                &msg.channel_id,
                &msg.counterparty_channel_id,
                &msg.counterparty_version,
            )
            .map_err(ChannelError::App)?;

        channel.state = ChannelState::Open;
        channel.counterparty.channel_id = Some(msg.counterparty_channel_id.clone());
        channel.version = msg.counterparty_version.clone();
        self.write_channel(&msg.port_id, &msg.channel_id, &channel)
            .map_err(ChannelError::Store)?;

        info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel open (ack)");
        Ok(())
    }

    /// Fourth handshake step: verify the counterparty's `OPEN` channel and
    /// open the local `TRYOPEN` end.
    ///
    /// # Errors
    /// Fails cleanly (no state change) if the channel is not in `TRYOPEN`,
    /// the proof does not verify, or the application vetoes.
    pub fn chan_open_confirm(
        &mut self,
        env: &Env,
        msg: &MsgChanOpenConfirm,
    ) -> Result<(), HostError> {
        let mut channel = self.read_channel(&msg.port_id, &msg.channel_id)?;
        if channel.state != ChannelState::TryOpen {
            return Err(ChannelError::InvalidState {
                port_id: msg.port_id.clone(),
                channel_id: msg.channel_id.clone(),
                expected: ChannelState::TryOpen,
                actual: channel.state,
            }
            .into());
        }
        let connection = self
            .read_open_connection(&channel.connection_id)
            .map_err(ChannelError::Connection)?;
        let (counterparty_connection_id, counterparty_channel_id) =
            self.counterparty_ids(&msg.port_id, &msg.channel_id, &channel, &connection)?;

        let expected = ChannelEnd {
            state: ChannelState::Open,
            ordering: channel.ordering,
            counterparty: ChannelCounterparty {
                port_id: msg.port_id.clone(),
                channel_id: Some(msg.channel_id.clone()),
            },
            connection_id: counterparty_connection_id,
            version: channel.version.clone(),
        };
        let counterparty_path =
            path::channel(&channel.counterparty.port_id, &counterparty_channel_id);
        let expected_bytes =
            encode_json(&counterparty_path, &expected).map_err(ChannelError::Store)?;
        self.verify_client_membership(
            env,
            &connection.client_id,
            msg.proof_height,
            &connection.counterparty.merkle_prefix,
            &counterparty_path,
            &expected_bytes,
            &msg.proof_ack,
        )
        .map_err(|e| ChannelError::Connection(ConnectionError::Client(e)))?;

        self.router
            .app_mut(&msg.port_id)
            .map_err(ChannelError::Router)?
            .on_chan_open_confirm(&msg.port_id, &msg.channel_id)
            .map_err(ChannelError::App)?;

        channel.state = ChannelState::Open;
        self.write_channel(&msg.port_id, &msg.channel_id, &channel)
            .map_err(ChannelError::Store)?;

        info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel open (confirm)");
        Ok(())
    }

    /// Close an open channel from this side.
    ///
    /// # Errors
    /// Fails if the channel is not open or the application vetoes.
    pub fn chan_close_init(&mut self, _env: &Env, msg: &MsgChanCloseInit) -> Result<(), HostError> {
        let mut channel = self.read_channel(&msg.port_id, &msg.channel_id)?;
        self.ensure_channel_open(&msg.port_id, &msg.channel_id, &channel)
            .map_err(HostError::Channel)?;
        self.read_open_connection(&channel.connection_id)
            .map_err(ChannelError::Connection)?;

        self.router
            .app_mut(&msg.port_id)
            .map_err(ChannelError::Router)?
            .on_chan_close_init(&msg.port_id, &msg.channel_id)
            .map_err(ChannelError::App)?;

        channel.state = ChannelState::Closed;
        self.write_channel(&msg.port_id, &msg.channel_id, &channel)
            .map_err(ChannelError::Store)?;

        info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel closed (init)");
        Ok(())
    }

    /// Close a channel because the counterparty's end is proven `CLOSED`.
    ///
    /// # Errors
    /// Fails if the channel is not open, the proof does not verify, or
    /// the application vetoes.
    pub fn chan_close_confirm(
        &mut self,
        env: &Env,
        msg: &MsgChanCloseConfirm,
    ) -> Result<(), HostError> {
        let mut channel = self.read_channel(&msg.port_id, &msg.channel_id)?;
        self.ensure_channel_open(&msg.port_id, &msg.channel_id, &channel)
            .map_err(HostError::Channel)?;
        let connection = self
            .read_open_connection(&channel.connection_id)
            .map_err(ChannelError::Connection)?;
        let (counterparty_connection_id, counterparty_channel_id) =
            self.counterparty_ids(&msg.port_id, &msg.channel_id, &channel, &connection)?;

        let expected = ChannelEnd {
            state: ChannelState::Closed,
            ordering: channel.ordering,
            counterparty: ChannelCounterparty {
                port_id: msg.port_id.clone(),
                channel_id: Some(msg.channel_id.clone()),
            },
            connection_id: counterparty_connection_id,
            version: channel.version.clone(),
        };
        let counterparty_path =
            path::channel(&channel.counterparty.port_id, &counterparty_channel_id);
        let expected_bytes =
            encode_json(&counterparty_path, &expected).map_err(ChannelError::Store)?;
        self.verify_client_membership(
            env,
            &connection.client_id,
            msg.proof_height,
            &connection.counterparty.merkle_prefix,
            &counterparty_path,
            &expected_bytes,
            &msg.proof_init,
        )
        .map_err(|e| ChannelError::Connection(ConnectionError::Client(e)))?;

        self.router
            .app_mut(&msg.port_id)
            .map_err(ChannelError::Router)?
            .on_chan_close_confirm(&msg.port_id, &msg.channel_id)
            .map_err(ChannelError::App)?;

        channel.state = ChannelState::Closed;
        self.write_channel(&msg.port_id, &msg.channel_id, &channel)
            .map_err(ChannelError::Store)?;

        info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel closed (confirm)");
        Ok(())
    }

    fn counterparty_ids(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        channel: &ChannelEnd,
        connection: &ibc_aegis_types::connection::ConnectionEnd,
    ) -> Result<(ibc_aegis_types::identifiers::ConnectionId, ChannelId), ChannelError> {
        let counterparty_connection_id = connection
            .counterparty
            .connection_id
            .clone()
            .ok_or_else(|| {
                ChannelError::Connection(ConnectionError::MissingCounterpartyConnection {
                    connection_id: channel.connection_id.clone(),
                })
            })?;
        let counterparty_channel_id = channel.counterparty.channel_id.clone().ok_or_else(|| {
            ChannelError::MissingCounterpartyChannel {
                port_id: port_id.clone(),
                channel_id: channel_id.clone(),
            }
        })?;
        Ok((counterparty_connection_id, counterparty_channel_id))
    }

    pub(crate) fn ensure_channel_open(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        channel: &ChannelEnd,
    ) -> Result<(), ChannelError> {
        match channel.state {
            ChannelState::Open => Ok(()),
            ChannelState::Closed => Err(ChannelError::Closed {
                port_id: port_id.clone(),
                channel_id: channel_id.clone(),
            }),
            actual => Err(ChannelError::InvalidState {
                port_id: port_id.clone(),
                channel_id: channel_id.clone(),
                expected: ChannelState::Open,
                actual,
            }),
        }
    }

    pub(crate) fn read_channel(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<ChannelEnd, ChannelError> {
        get_json(&self.store, &path::channel(port_id, channel_id))?.ok_or_else(|| {
            ChannelError::NotFound {
                port_id: port_id.clone(),
                channel_id: channel_id.clone(),
            }
        })
    }

    pub(crate) fn write_channel(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
        end: &ChannelEnd,
    ) -> Result<(), StoreError> {
        set_json(&mut self.store, &path::channel(port_id, channel_id), end)
    }

    fn init_channel_sequences(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<(), StoreError> {
        set_json(
            &mut self.store,
            &path::next_sequence_send(port_id, channel_id),
            &Sequence::START,
        )?;
        set_json(
            &mut self.store,
            &path::next_sequence_recv(port_id, channel_id),
            &Sequence::START,
        )?;
        set_json(
            &mut self.store,
            &path::next_sequence_ack(port_id, channel_id),
            &Sequence::START,
        )
    }

    fn next_channel_counter(&self) -> Result<u64, StoreError> {
        Ok(get_json(&self.store, &path::next_channel_sequence())?.unwrap_or(0))
    }

    fn bump_channel_counter(&mut self, current: u64) -> Result<(), StoreError> {
        set_json(
            &mut self.store,
            &path::next_channel_sequence(),
            &(current + 1),
        )
    }
}
