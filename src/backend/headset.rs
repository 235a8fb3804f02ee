//! Headset Backend
//!
//! HSP/HFP audio gateway transports stream over the device's SCO link. Resume
//! takes the headset audio locks (unless already held) and asks the headset
//! layer for the voice socket. SCO MTUs are not negotiated; the broker
//! reports the configured nominal frame size for both directions.

use super::{RequestId, StreamTransport};
use crate::access::AccessType;
use crate::device::AudioDevice;
use crate::properties::{BackendProperties, PropertyValue};
use crate::{BrokerOptions, OwnerToken, StreamFd};

/// Headset/hands-free audio gateway layer
pub trait HeadsetStack {
    /// Take the device's voice channel locks
    fn headset_lock(&mut self, device: &AudioDevice, lock: AccessType) -> bool;

    /// Release locks taken with `headset_lock`
    fn headset_unlock(&mut self, device: &AudioDevice, lock: AccessType);

    /// Ask for the SCO link to be established
    ///
    /// The completion must be reported for `owner` later, never from inside
    /// this call. Returns `None` if the request could not be started.
    fn request_stream(&mut self, device: &AudioDevice, owner: OwnerToken) -> Option<RequestId>;

    /// Abort a request started by `request_stream`
    fn cancel_stream(&mut self, device: &AudioDevice, request: RequestId);

    /// Descriptor of the connected SCO socket
    fn sco_fd(&self, device: &AudioDevice) -> Option<StreamFd>;

    /// Noise reduction / echo cancelling state
    fn nrec(&self, device: &AudioDevice) -> bool;

    /// In-band ringtone state
    fn inband_ringtone(&self, device: &AudioDevice) -> bool;
}

/// Per-transport headset state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadsetBackend {
    lock: AccessType,
    imtu: u16,
    omtu: u16,
}

impl HeadsetBackend {
    /// Create the backend using the SCO settings of the broker
    #[must_use]
    pub const fn new(options: &BrokerOptions) -> Self {
        Self {
            lock: options.voice_lock,
            imtu: options.sco_imtu,
            omtu: options.sco_omtu,
        }
    }

    pub(super) fn resume<S: HeadsetStack>(
        &mut self,
        in_use: &mut bool,
        device: &AudioDevice,
        stack: &mut S,
        owner: OwnerToken,
    ) -> Option<RequestId> {
        if !*in_use {
            *in_use = stack.headset_lock(device, self.lock);
            if !*in_use {
                debug!("[HEADSET] voice channel locked elsewhere");
                return None;
            }
        }

        stack.request_stream(device, owner)
    }

    pub(super) fn suspend<S: HeadsetStack>(
        &mut self,
        in_use: &mut bool,
        device: &AudioDevice,
        stack: &mut S,
    ) {
        if *in_use {
            stack.headset_unlock(device, self.lock);
        }
        *in_use = false;
    }

    pub(super) fn completed_stream<S: HeadsetStack>(
        &self,
        device: &AudioDevice,
        stack: &S,
    ) -> Option<StreamTransport> {
        stack.sco_fd(device).map(|fd| StreamTransport {
            fd,
            imtu: self.imtu,
            omtu: self.omtu,
        })
    }

    pub(super) fn describe_properties<S: HeadsetStack>(
        device: &AudioDevice,
        stack: &S,
    ) -> BackendProperties {
        BackendProperties::Headset {
            nrec: stack.nrec(device),
            inband_ringtone: stack.inband_ringtone(device),
        }
    }

    pub(super) fn set_property(&mut self, _name: &str, _value: PropertyValue<'_>) -> Option<()> {
        None
    }
}
