//! Streaming Backends
//!
//! A transport streams either over an AVDTP media channel (A2DP) or over a
//! SCO voice link (HSP/HFP audio gateway). Each profile supplies the same
//! small capability set to the broker:
//!
//! - **resume**: start an asynchronous operation that ends with a live
//!   descriptor, returning a request id that can cancel it
//! - **suspend**: drop the backend-side stream lock once nobody owns the
//!   transport
//! - **cancel**: abort an in-flight resume
//! - **describe properties**: profile-specific extras for `GetProperties`
//! - **set property**: reserved, every current backend declines
//!
//! The profile is chosen once, from the endpoint UUID, when the transport is
//! created. [`Backend`] is the tagged variant holding the per-profile state;
//! the profile layers themselves are external and reached through the
//! [`A2dpStack`] and [`HeadsetStack`] traits.

pub mod a2dp;
pub mod headset;

use core::num::NonZeroU32;

pub use a2dp::{A2dpBackend, A2dpStack, AvdtpError, SessionId};
pub use headset::{HeadsetBackend, HeadsetStack};

use crate::device::{AudioDevice, MediaEndpoint};
use crate::properties::{BackendProperties, PropertyValue};
use crate::{BrokerOptions, OwnerToken, StreamFd};

/// Identifier of an in-flight resume, usable to cancel it
///
/// Backends never hand out zero, so "no request" is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestId(NonZeroU32);

impl RequestId {
    /// Wrap a raw request id; zero yields `None`
    #[must_use]
    pub const fn new(id: u32) -> Option<Self> {
        match NonZeroU32::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Raw value of the id
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

/// Live descriptor together with its MTUs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamTransport {
    /// Stream descriptor
    pub fd: StreamFd,
    /// Input MTU
    pub imtu: u16,
    /// Output MTU
    pub omtu: u16,
}

/// Both profile layers, as needed by a broker serving every profile
pub trait AudioStack: A2dpStack + HeadsetStack {}

impl<T: A2dpStack + HeadsetStack> AudioStack for T {}

/// Per-profile backend of a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// A2DP source or sink over AVDTP
    A2dp(A2dpBackend),
    /// HSP/HFP audio gateway over SCO
    Headset(HeadsetBackend),
}

impl Backend {
    /// Select the backend for an endpoint
    #[must_use]
    pub fn for_endpoint(endpoint: &MediaEndpoint, options: &BrokerOptions) -> Option<Self> {
        if endpoint.profile.is_a2dp() {
            endpoint.sep.map(|sep| Self::A2dp(A2dpBackend::new(sep)))
        } else {
            Some(Self::Headset(HeadsetBackend::new(options)))
        }
    }

    /// Whether this is the A2DP backend
    #[must_use]
    pub const fn is_a2dp(&self) -> bool {
        matches!(self, Self::A2dp(_))
    }

    /// Whether a failed resume must be torn down on a later scheduling turn
    ///
    /// A2DP failures are reported from inside the stream state-change
    /// notification, which must finish unwinding before the owner goes away.
    #[must_use]
    pub const fn defers_failure_teardown(&self) -> bool {
        self.is_a2dp()
    }

    pub(crate) fn resume<S: AudioStack>(
        &mut self,
        in_use: &mut bool,
        device: &AudioDevice,
        stack: &mut S,
        owner: OwnerToken,
    ) -> Option<RequestId> {
        match self {
            Self::A2dp(backend) => backend.resume(in_use, device, stack, owner),
            Self::Headset(backend) => backend.resume(in_use, device, stack, owner),
        }
    }

    pub(crate) fn suspend<S: AudioStack>(
        &mut self,
        in_use: &mut bool,
        device: &AudioDevice,
        stack: &mut S,
    ) {
        match self {
            Self::A2dp(backend) => backend.suspend(in_use, stack),
            Self::Headset(backend) => backend.suspend(in_use, device, stack),
        }
    }

    pub(crate) fn cancel<S: AudioStack>(
        &self,
        device: &AudioDevice,
        stack: &mut S,
        request: RequestId,
    ) {
        match self {
            Self::A2dp(_) => A2dpStack::cancel(stack, device, request),
            Self::Headset(_) => stack.cancel_stream(device, request),
        }
    }

    /// Descriptor produced by a completed resume, if the profile layer has one
    pub(crate) fn completed_stream<S: AudioStack>(
        &self,
        device: &AudioDevice,
        stack: &S,
    ) -> Option<StreamTransport> {
        match self {
            Self::A2dp(backend) => backend.completed_stream(stack),
            Self::Headset(backend) => backend.completed_stream(device, stack),
        }
    }

    pub(crate) fn describe_properties<S: AudioStack>(
        &self,
        delay: u16,
        device: &AudioDevice,
        stack: &S,
    ) -> BackendProperties {
        match self {
            Self::A2dp(_) => BackendProperties::A2dp { delay },
            Self::Headset(_) => HeadsetBackend::describe_properties(device, stack),
        }
    }

    /// Returns `None` when the backend declines the write
    pub(crate) fn set_property(&mut self, name: &str, value: PropertyValue<'_>) -> Option<()> {
        match self {
            Self::A2dp(backend) => backend.set_property(name, value),
            Self::Headset(backend) => backend.set_property(name, value),
        }
    }

    /// Drop the signalling session reference held by the transport
    pub(crate) fn release_session<S: AudioStack>(&mut self, stack: &mut S) {
        if let Self::A2dp(backend) = self {
            backend.release_session(stack);
        }
    }
}
