//! Message Bus Boundary
//!
//! The broker never touches the bus wire format. Everything it needs from the
//! message bus is expressed by the [`MessageBus`] trait: publishing transport
//! objects, watching clients for disappearance, answering calls and emitting
//! property change signals.
//!
//! Replies to `Acquire` are deferred until the backend finishes resuming. The
//! bus hands the broker a [`PendingCall`] for every method call; the token is
//! neither `Clone` nor `Copy`, so a call can be answered at most once and
//! answering it consumes it.

use crate::constants::MAX_BUS_NAME_LENGTH;
use crate::properties::{PropertyChange, TransportProperties};
use crate::{OwnerToken, StreamFd, TransportError};

/// Bus client identity (unique connection name such as `:1.42`)
pub type ClientName = heapless::String<MAX_BUS_NAME_LENGTH>;

/// Handle of a registered disconnect watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchId(pub u32);

/// An unanswered method call
///
/// Created by the bus glue when a call arrives and consumed when it is
/// answered through [`MessageBus::send_reply`].
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingCall {
    serial: u32,
}

impl PendingCall {
    /// Wrap the serial of an incoming method call
    #[must_use]
    pub const fn new(serial: u32) -> Self {
        Self { serial }
    }

    /// Serial of the call this reply will answer
    #[must_use]
    pub const fn serial(&self) -> u32 {
        self.serial
    }
}

/// Successful method return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Empty method return (`Release`, `SetProperty`)
    Empty,
    /// Descriptor passed out-of-band (`Acquire`, signature `h`)
    Fd(StreamFd),
    /// Property snapshot (`GetProperties`, signature `a{sv}`)
    Properties(TransportProperties),
}

/// Failure to deliver a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The caller is no longer connected
    Disconnected,
    /// The bus refused to queue the message
    SendFailed,
}

/// Message bus collaborator
pub trait MessageBus {
    /// Publish the transport interface at `path`
    ///
    /// Returns `false` if the object could not be registered.
    fn register_transport(&mut self, path: &str) -> bool;

    /// Withdraw the transport interface at `path`
    fn unregister_transport(&mut self, path: &str);

    /// Watch `client` and report its disappearance for `owner`
    ///
    /// When the client leaves the bus the glue must feed
    /// [`Event::ClientExited`](crate::processor::Event::ClientExited) with
    /// the same token.
    fn add_disconnect_watch(&mut self, client: &str, owner: OwnerToken) -> Option<WatchId>;

    /// Remove a watch previously returned by `add_disconnect_watch`
    fn remove_watch(&mut self, watch: WatchId);

    /// Answer a method call
    ///
    /// # Errors
    /// Returns a `BusError` if the reply could not be delivered.
    fn send_reply(
        &mut self,
        call: PendingCall,
        reply: Result<Reply, TransportError>,
    ) -> Result<(), BusError>;

    /// Emit `PropertyChanged` on the transport at `path`
    fn emit_property_changed(&mut self, path: &str, change: PropertyChange);
}
