//! Media Transports
//!
//! A transport is one negotiated streaming endpoint between a local media
//! endpoint and a remote device. It carries the immutable codec configuration,
//! the live descriptor (once a resume has succeeded) with its MTUs, the two
//! lock bits shared out to owners, and the backend selected from the endpoint
//! profile at creation.
//!
//! The lock/ownership protocol lives in [`acquire`](self::acquire) and the
//! handling of backend completions in [`resume`](self::resume); both are
//! `impl Transport` blocks driven by the broker.
//!
//! ## Invariants
//!
//! - a lock bit is set only while an owner holds it
//! - when the last owner goes away the backend is suspended exactly once
//! - configuration, endpoint and backend never change after creation

mod acquire;
mod resume;

pub(crate) use resume::Completion;

use core::fmt::Write;

use heapless::Vec;

use crate::access::AccessType;
use crate::backend::{AudioStack, Backend, StreamTransport};
use crate::bus::MessageBus;
use crate::constants::{MAX_CONFIGURATION_SIZE, MAX_OWNERS};
use crate::device::{AudioDevice, MediaEndpoint, ObjectPath};
use crate::owner::{Owner, OwnerId};
use crate::properties::{PropertyChange, PropertyValue, TransportProperties};
use crate::{BrokerOptions, StreamFd, TransportError};

/// Broker-unique transport identifier
///
/// The number is also the `fdN` suffix of the transport object path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportId(pub u32);

/// One negotiated audio stream and its ownership state
#[derive(Debug)]
pub struct Transport {
    id: TransportId,
    path: ObjectPath,
    device: AudioDevice,
    endpoint: MediaEndpoint,
    configuration: Vec<u8, MAX_CONFIGURATION_SIZE>,
    fd: Option<StreamFd>,
    imtu: u16,
    omtu: u16,
    delay: u16,
    read_lock: bool,
    write_lock: bool,
    in_use: bool,
    owners: Vec<Owner, MAX_OWNERS>,
    backend: Backend,
}

impl Transport {
    /// Create a transport for a negotiated endpoint
    ///
    /// # Errors
    /// - `TransportError::NotSupported` if the endpoint profile has no backend
    /// - `TransportError::InvalidArguments` if the configuration or the
    ///   object path exceed their capacity
    pub fn new(
        id: TransportId,
        endpoint: MediaEndpoint,
        device: AudioDevice,
        configuration: &[u8],
        options: &BrokerOptions,
    ) -> Result<Self, TransportError> {
        let backend =
            Backend::for_endpoint(&endpoint, options).ok_or(TransportError::NotSupported)?;
        let configuration =
            Vec::from_slice(configuration).map_err(|()| TransportError::InvalidArguments)?;

        let mut path = ObjectPath::new();
        write!(path, "{}/fd{}", device.path, id.0).map_err(|_| TransportError::InvalidArguments)?;

        Ok(Self {
            id,
            path,
            device,
            endpoint,
            configuration,
            fd: None,
            imtu: 0,
            omtu: 0,
            delay: 0,
            read_lock: false,
            write_lock: false,
            in_use: false,
            owners: Vec::new(),
            backend,
        })
    }

    /// Transport identifier
    #[must_use]
    pub const fn id(&self) -> TransportId {
        self.id
    }

    /// Object path, `<device path>/fdN`
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Device the transport streams to or from
    #[must_use]
    pub const fn device(&self) -> &AudioDevice {
        &self.device
    }

    /// Endpoint the transport was negotiated on
    #[must_use]
    pub const fn endpoint(&self) -> &MediaEndpoint {
        &self.endpoint
    }

    /// Negotiated codec configuration
    #[must_use]
    pub fn configuration(&self) -> &[u8] {
        &self.configuration
    }

    /// Live descriptor, `None` until a resume has succeeded
    #[must_use]
    pub const fn fd(&self) -> Option<StreamFd> {
        self.fd
    }

    /// Input MTU of the live descriptor
    #[must_use]
    pub const fn imtu(&self) -> u16 {
        self.imtu
    }

    /// Output MTU of the live descriptor
    #[must_use]
    pub const fn omtu(&self) -> u16 {
        self.omtu
    }

    /// A2DP delay last reported for the stream
    #[must_use]
    pub const fn delay(&self) -> u16 {
        self.delay
    }

    /// Read lock state
    #[must_use]
    pub const fn read_lock(&self) -> bool {
        self.read_lock
    }

    /// Write lock state
    #[must_use]
    pub const fn write_lock(&self) -> bool {
        self.write_lock
    }

    /// Both lock bits as an access type
    #[must_use]
    pub const fn locks(&self) -> AccessType {
        AccessType::from_locks(self.read_lock, self.write_lock)
    }

    /// Whether the backend stream lock is held
    #[must_use]
    pub const fn in_use(&self) -> bool {
        self.in_use
    }

    /// Backend selected for the transport
    #[must_use]
    pub const fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Current owners
    #[must_use]
    pub fn owners(&self) -> &[Owner] {
        &self.owners
    }

    /// Owner registered for a client
    #[must_use]
    pub fn owner(&self, client: &str) -> Option<&Owner> {
        self.owners.iter().find(|owner| owner.name() == client)
    }

    pub(crate) fn owner_index(&self, id: OwnerId) -> Option<usize> {
        self.owners.iter().position(|owner| owner.id == id)
    }

    fn owner_index_by_name(&self, client: &str) -> Option<usize> {
        self.owners.iter().position(|owner| owner.name() == client)
    }

    /// Snapshot of every property
    #[must_use]
    pub fn properties<S: AudioStack>(&self, stack: &S) -> TransportProperties {
        TransportProperties {
            device: self.device.path.clone(),
            read_lock: self.read_lock,
            write_lock: self.write_lock,
            imtu: self.imtu,
            omtu: self.omtu,
            uuid: self.endpoint.uuid(),
            codec: self.endpoint.codec,
            configuration: self.configuration.clone(),
            backend: self
                .backend
                .describe_properties(self.delay, &self.device, stack),
        }
    }

    /// Write a property through the backend
    ///
    /// # Errors
    /// Returns `TransportError::NotSupported` when the backend declines the
    /// write, which every current backend does.
    pub fn set_property(
        &mut self,
        name: &str,
        value: PropertyValue<'_>,
    ) -> Result<(), TransportError> {
        self.backend
            .set_property(name, value)
            .ok_or(TransportError::NotSupported)
    }

    /// Install the descriptor produced by a resume
    ///
    /// Installing the descriptor already in place is a no-op.
    pub(crate) fn set_fd<B: MessageBus>(&mut self, stream: StreamTransport, bus: &mut B) {
        if self.fd == Some(stream.fd) {
            return;
        }

        self.fd = Some(stream.fd);
        self.imtu = stream.imtu;
        self.omtu = stream.omtu;

        info!("{}: fd({}) ready", self.path.as_str(), stream.fd.raw());

        bus.emit_property_changed(&self.path, PropertyChange::Imtu(self.imtu));
        bus.emit_property_changed(&self.path, PropertyChange::Omtu(self.omtu));
    }

    /// Store a new A2DP delay, announcing it only if it changed
    ///
    /// Other backends have no `Delay` property, so the report is dropped.
    pub(crate) fn update_delay<B: MessageBus>(&mut self, delay: u16, bus: &mut B) {
        if !self.backend.is_a2dp() {
            debug!("Transport {}: delay ignored, not A2DP", self.path.as_str());
            return;
        }
        if self.delay == delay {
            return;
        }

        self.delay = delay;
        bus.emit_property_changed(&self.path, PropertyChange::Delay(delay));
    }

    /// Drop what the backend keeps for the transport's lifetime
    pub(crate) fn release_session<S: AudioStack>(&mut self, stack: &mut S) {
        self.backend.release_session(stack);
    }

    fn take_locks(&mut self, access: AccessType) {
        if access.read() {
            self.read_lock = true;
            trace!("Transport {}: read lock acquired", self.path.as_str());
        }
        if access.write() {
            self.write_lock = true;
            trace!("Transport {}: write lock acquired", self.path.as_str());
        }
    }

    fn release_locks(&mut self, access: AccessType) {
        if access.read() {
            self.read_lock = false;
            trace!("Transport {}: read lock released", self.path.as_str());
        }
        if access.write() {
            self.write_lock = false;
            trace!("Transport {}: write lock released", self.path.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BluetoothAddress;
    use crate::constants::{A2DP_SOURCE_UUID, HSP_AG_UUID};
    use crate::device::Profile;

    fn device() -> AudioDevice {
        AudioDevice::new(
            "/org/bluez/hci0",
            BluetoothAddress::new([0x00, 0x01, 0x02, 0x03, 0x04, 0x05]),
            BluetoothAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
        )
        .unwrap()
    }

    #[test]
    fn test_transport_creation_a2dp() {
        let endpoint = MediaEndpoint::new(A2DP_SOURCE_UUID, 0x00, Some(1)).unwrap();
        let transport = Transport::new(
            TransportId(3),
            endpoint,
            device(),
            &[0xFF, 0xFF, 2, 53],
            &BrokerOptions::default(),
        )
        .unwrap();

        assert_eq!(
            transport.path(),
            "/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF/fd3"
        );
        assert_eq!(transport.configuration(), &[0xFF, 0xFF, 2, 53]);
        assert_eq!(transport.fd(), None);
        assert_eq!(transport.locks(), AccessType::NONE);
        assert!(!transport.in_use());
        assert!(transport.backend().is_a2dp());
        assert!(transport.owners().is_empty());
    }

    #[test]
    fn test_transport_creation_headset() {
        let endpoint = MediaEndpoint::new(HSP_AG_UUID, 0x01, None).unwrap();
        assert_eq!(endpoint.profile, Profile::HspAudioGateway);

        let transport = Transport::new(
            TransportId(0),
            endpoint,
            device(),
            &[],
            &BrokerOptions::default(),
        )
        .unwrap();
        assert!(!transport.backend().is_a2dp());
        assert!(!transport.backend().defers_failure_teardown());
    }

    #[test]
    fn test_transport_configuration_too_large() {
        let endpoint = MediaEndpoint::new(A2DP_SOURCE_UUID, 0x00, Some(1)).unwrap();
        let blob = [0u8; MAX_CONFIGURATION_SIZE + 1];
        let result = Transport::new(
            TransportId(0),
            endpoint,
            device(),
            &blob,
            &BrokerOptions::default(),
        );
        assert!(matches!(result, Err(TransportError::InvalidArguments)));
    }

    #[test]
    fn test_lock_bookkeeping() {
        let endpoint = MediaEndpoint::new(A2DP_SOURCE_UUID, 0x00, Some(1)).unwrap();
        let mut transport = Transport::new(
            TransportId(0),
            endpoint,
            device(),
            &[],
            &BrokerOptions::default(),
        )
        .unwrap();

        transport.take_locks(AccessType::READ_WRITE);
        assert!(transport.read_lock() && transport.write_lock());

        transport.release_locks(AccessType::READ);
        assert_eq!(transport.locks(), AccessType::WRITE);

        transport.release_locks(AccessType::WRITE);
        assert_eq!(transport.locks(), AccessType::NONE);
    }
}
