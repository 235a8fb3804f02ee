//! A2DP Backend
//!
//! Resuming an A2DP transport means: get (lazily) the AVDTP signalling session
//! to the device, take the stream endpoint lock unless this transport already
//! holds it, then ask the profile layer to start the stream. The result comes
//! back later as a resume completion carrying an optional AVDTP error; the
//! descriptor and negotiated MTUs are then read from the opened stream.

use bt_hci::param::BdAddr;

use super::{RequestId, StreamTransport};
use crate::OwnerToken;
use crate::device::{AudioDevice, StreamEndpointId};
use crate::properties::PropertyValue;

/// Handle of an AVDTP signalling session held by the profile layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionId(pub u16);

/// Error reported by AVDTP when a resume fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AvdtpError {
    /// Remote rejected the signal with an AVDTP error code
    Rejected(u8),
    /// Signalling channel went away
    Disconnected,
    /// Remote did not answer in time
    Timeout,
}

/// A2DP/AVDTP profile layer
pub trait A2dpStack {
    /// Get (creating if needed) a signalling session between two adapters
    ///
    /// The returned session holds a reference released by `session_unref`.
    fn session_get(&mut self, src: BdAddr, dst: BdAddr) -> Option<SessionId>;

    /// Release a session reference taken by `session_get`
    fn session_unref(&mut self, session: SessionId);

    /// Lock a local stream endpoint for exclusive use on a session
    fn sep_lock(&mut self, sep: StreamEndpointId, session: SessionId) -> bool;

    /// Unlock a stream endpoint locked by `sep_lock`
    fn sep_unlock(&mut self, sep: StreamEndpointId, session: SessionId);

    /// Start (or confirm) streaming on the endpoint
    ///
    /// The completion must be reported for `owner` later, never from inside
    /// this call. Returns `None` if the request could not be started.
    fn resume(
        &mut self,
        session: SessionId,
        sep: StreamEndpointId,
        owner: OwnerToken,
    ) -> Option<RequestId>;

    /// Abort a resume started by `resume`
    fn cancel(&mut self, device: &AudioDevice, request: RequestId);

    /// Descriptor and MTUs of the stream open on the endpoint
    fn stream_transport(&self, sep: StreamEndpointId) -> Option<StreamTransport>;
}

/// Per-transport A2DP state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A2dpBackend {
    sep: StreamEndpointId,
    session: Option<SessionId>,
}

impl A2dpBackend {
    /// Create the backend for a local stream endpoint
    #[must_use]
    pub const fn new(sep: StreamEndpointId) -> Self {
        Self { sep, session: None }
    }

    /// Local stream endpoint of the transport
    #[must_use]
    pub const fn sep(&self) -> StreamEndpointId {
        self.sep
    }

    /// Signalling session, once established
    #[must_use]
    pub const fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub(super) fn resume<S: A2dpStack>(
        &mut self,
        in_use: &mut bool,
        device: &AudioDevice,
        stack: &mut S,
        owner: OwnerToken,
    ) -> Option<RequestId> {
        let session = match self.session {
            Some(session) => session,
            None => {
                let session = stack.session_get(device.src.into(), device.dst.into())?;
                debug!("[A2DP] signalling session {} established", session.0);
                self.session = Some(session);
                session
            }
        };

        if !*in_use {
            *in_use = stack.sep_lock(self.sep, session);
            if !*in_use {
                debug!("[A2DP] stream endpoint {} is locked elsewhere", self.sep);
                return None;
            }
        }

        stack.resume(session, self.sep, owner)
    }

    pub(super) fn suspend<S: A2dpStack>(&mut self, in_use: &mut bool, stack: &mut S) {
        // Only an endpoint this transport locked may be unlocked
        if let Some(session) = self.session.filter(|_| *in_use) {
            stack.sep_unlock(self.sep, session);
        }
        *in_use = false;
    }

    pub(super) fn completed_stream<S: A2dpStack>(&self, stack: &S) -> Option<StreamTransport> {
        stack.stream_transport(self.sep)
    }

    pub(super) fn set_property(&mut self, _name: &str, _value: PropertyValue<'_>) -> Option<()> {
        None
    }

    pub(super) fn release_session<S: A2dpStack>(&mut self, stack: &mut S) {
        if let Some(session) = self.session.take() {
            stack.session_unref(session);
        }
    }
}
