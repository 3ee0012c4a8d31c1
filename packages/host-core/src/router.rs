//! The application callback capability and the port router.

use std::collections::BTreeMap;

use ibc_aegis_types::channel::{ChannelCounterparty, Order};
use ibc_aegis_types::identifiers::{ChannelId, ConnectionId, PortId};
use ibc_aegis_types::packet::{Acknowledgement, Packet};

use crate::errors::{AppError, RouterError};

/// Callbacks an application module supplies for its port.
///
/// Handshake callbacks may veto a step by returning an error; the open
/// callbacks return the application version to record. `on_recv_packet` is
/// infallible: application-level failure is expressed as an error
/// acknowledgement, which is still a successful delivery at the transport
/// level.
#[allow(clippy::missing_errors_doc)]
pub trait IbcApp {
    /// A channel handshake was initiated locally on this port.
    fn on_chan_open_init(
        &mut self,
        ordering: Order,
        connection_id: &ConnectionId,
        port_id: &PortId,
        channel_id: &ChannelId,
        counterparty: &ChannelCounterparty,
        version: &str,
    ) -> Result<String, AppError>;

    /// A channel handshake was initiated by the counterparty.
    fn on_chan_open_try(
        &mut self,
        ordering: Order,
        connection_id: &ConnectionId,
        port_id: &PortId,
        channel_id: &ChannelId,
        counterparty: &ChannelCounterparty,
        counterparty_version: &str,
    ) -> Result<String, AppError>;

    /// The counterparty accepted the locally initiated channel.
    fn on_chan_open_ack(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
        counterparty_channel_id: &ChannelId,
        counterparty_version: &str,
    ) -> Result<(), AppError>;

    /// The handshake completed on the counterparty's side.
    fn on_chan_open_confirm(&mut self, port_id: &PortId, channel_id: &ChannelId)
        -> Result<(), AppError>;

    /// The channel is being closed locally.
    fn on_chan_close_init(
        &mut self,
        _port_id: &PortId,
        _channel_id: &ChannelId,
    ) -> Result<(), AppError> {
        Ok(())
    }

    /// The counterparty closed the channel.
    fn on_chan_close_confirm(
        &mut self,
        _port_id: &PortId,
        _channel_id: &ChannelId,
    ) -> Result<(), AppError> {
        Ok(())
    }

    /// A packet arrived. The returned acknowledgement is committed and
    /// relayed back to the sender.
    fn on_recv_packet(&mut self, packet: &Packet) -> Acknowledgement;

    /// The counterparty acknowledged a packet this chain sent.
    fn on_acknowledgement_packet(
        &mut self,
        packet: &Packet,
        acknowledgement: &Acknowledgement,
    ) -> Result<(), AppError>;

    /// A packet this chain sent timed out unreceived.
    fn on_timeout_packet(&mut self, packet: &Packet) -> Result<(), AppError>;
}

/// Routes channel and packet callbacks to the application bound to a port.
#[derive(Default)]
pub struct PortRouter {
    apps: BTreeMap<PortId, Box<dyn IbcApp>>,
}

impl PortRouter {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an application to a port.
    ///
    /// # Panics
    /// Panics if the port is already bound; port bindings are wiring, not
    /// runtime state.
    pub fn register(&mut self, port_id: PortId, app: Box<dyn IbcApp>) {
        assert!(
            !self.apps.contains_key(&port_id),
            "port `{port_id}` is already bound"
        );
        self.apps.insert(port_id, app);
    }

    /// The application bound to a port.
    ///
    /// # Errors
    /// Returns [`RouterError::UnknownPort`] if nothing is bound.
    pub fn app_mut(&mut self, port_id: &PortId) -> Result<&mut Box<dyn IbcApp>, RouterError> {
        self.apps.get_mut(port_id).ok_or_else(|| RouterError::UnknownPort {
            port_id: port_id.clone(),
        })
    }

    /// Whether any application is bound to the port.
    #[must_use]
    pub fn is_bound(&self, port_id: &PortId) -> bool {
        self.apps.contains_key(port_id)
    }
}
