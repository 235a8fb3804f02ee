#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

#[macro_use]
mod fmt;

mod access;
mod address;
pub mod backend;
mod broker;
mod bus;
pub mod constants;
mod device;
pub mod interface;
mod owner;
pub mod processor;
mod properties;
mod transport;

use core::fmt::{Display, Formatter};

use crate::constants::DEFAULT_SCO_MTU;

pub use access::AccessType;
pub use bt_hci::param::BdAddr;
pub use address::BluetoothAddress;
pub use backend::{
    A2dpStack, AudioStack, AvdtpError, Backend, HeadsetStack, RequestId, SessionId,
    StreamTransport,
};
pub use broker::MediaBroker;
pub use bus::{BusError, ClientName, MessageBus, PendingCall, Reply, WatchId};
pub use device::{AudioDevice, MediaEndpoint, ObjectPath, Profile, StreamEndpointId};
pub use interface::Method;
pub use owner::{AcquireRequest, Owner, OwnerId, OwnerToken};
pub use processor::Event;
pub use properties::{BackendProperties, PropertyChange, PropertyValue, TransportProperties};
pub use transport::{Transport, TransportId};

/// Raw stream descriptor handed to the owner that acquired a transport
///
/// The broker never reads or writes through it; it only stores the value the
/// profile layer produced and passes it on in the `Acquire` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamFd(pub i32);

impl StreamFd {
    /// Raw descriptor number
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

/// Media transport errors as reported to bus clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Lock conflict, duplicate owner, unknown access type or release mismatch
    PermissionDenied,
    /// The backend could not start or finish resuming the stream
    ResumeFailed,
    /// Operation not supported by the transport's backend
    NotSupported,
    /// Malformed or oversized argument
    InvalidArguments,
    /// No transport at the given object path
    DoesNotExist,
    /// A fixed-capacity table is full
    OutOfResources,
    /// The bus refused to publish the transport object
    RegistrationFailed,
}

impl TransportError {
    /// Error name under `org.bluez.Error`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PermissionDenied
            | Self::ResumeFailed
            | Self::OutOfResources
            | Self::RegistrationFailed => "Failed",
            Self::NotSupported => "NotSupported",
            Self::InvalidArguments => "InvalidArguments",
            Self::DoesNotExist => "DoesNotExist",
        }
    }

    /// Human readable message sent with the error
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::PermissionDenied => "Permission denied",
            Self::ResumeFailed => "Input/output error",
            Self::NotSupported => "Operation is not supported",
            Self::InvalidArguments => "Invalid arguments in method call",
            Self::DoesNotExist => "Does Not Exist",
            Self::OutOfResources => "Cannot allocate memory",
            Self::RegistrationFailed => "Unable to register object",
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Synchronous rejection of an `Acquire` call
///
/// Carries the call back to the caller, unanswered, so it can be replied to
/// with `error`.
#[derive(Debug, PartialEq, Eq)]
pub struct Rejected {
    /// Why the call was rejected
    pub error: TransportError,
    /// The unanswered call
    pub call: PendingCall,
}

impl Rejected {
    /// Pair an error with the call it rejects
    #[must_use]
    pub const fn new(error: TransportError, call: PendingCall) -> Self {
        Self { error, call }
    }
}

/// Options for configuring a `MediaBroker` instance
///
/// # Examples
///
/// ```rust
/// use media_transport::{AccessType, BrokerOptions};
///
/// // Voice transports that only ever play to the headset
/// let options = BrokerOptions {
///     voice_lock: AccessType::WRITE,
///     ..BrokerOptions::default()
/// };
/// assert_eq!(options.sco_imtu, 48);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerOptions {
    /// Input MTU reported for SCO descriptors
    ///
    /// SCO links carry fixed-size frames, so the MTU is not negotiated.
    pub sco_imtu: u16,
    /// Output MTU reported for SCO descriptors
    pub sco_omtu: u16,
    /// Voice channel locks taken by the headset backend on resume
    pub voice_lock: AccessType,
}

impl Default for BrokerOptions {
    fn default() -> Self {
        Self {
            sco_imtu: DEFAULT_SCO_MTU,
            sco_omtu: DEFAULT_SCO_MTU,
            voice_lock: AccessType::READ_WRITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names() {
        assert_eq!(TransportError::PermissionDenied.name(), "Failed");
        assert_eq!(TransportError::ResumeFailed.name(), "Failed");
        assert_eq!(TransportError::NotSupported.name(), "NotSupported");
        assert_eq!(TransportError::DoesNotExist.name(), "DoesNotExist");
        assert_eq!(TransportError::InvalidArguments.name(), "InvalidArguments");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TransportError::PermissionDenied.message(),
            "Permission denied"
        );
        assert_eq!(TransportError::ResumeFailed.message(), "Input/output error");
    }

    #[test]
    fn test_broker_options_default() {
        let options = BrokerOptions::default();
        assert_eq!(options.sco_imtu, 48);
        assert_eq!(options.sco_omtu, 48);
        assert_eq!(options.voice_lock, AccessType::READ_WRITE);
    }

    #[test]
    fn test_rejected_hands_back_call() {
        let rejected = Rejected::new(TransportError::PermissionDenied, PendingCall::new(7));
        assert_eq!(rejected.call.serial(), 7);
        assert_eq!(rejected.error, TransportError::PermissionDenied);
    }
}
