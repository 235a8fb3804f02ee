//! Transport Owners
//!
//! An owner is one bus client's claim on a transport: the lock bits it holds,
//! the watch that reports the client leaving the bus, and at most one
//! in-flight acquire request.
//!
//! Owners are referenced from outside the broker (disconnect watches, backend
//! completions) by [`OwnerToken`]. Owner ids are never reused within a broker,
//! so a token that outlives its owner simply stops resolving.

use crate::access::AccessType;
use crate::backend::RequestId;
use crate::bus::{ClientName, PendingCall, WatchId};
use crate::transport::TransportId;

/// Broker-unique owner identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OwnerId(pub u32);

/// Completion context identifying one owner of one transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OwnerToken {
    /// Transport the owner belongs to
    pub transport: TransportId,
    /// Owner within the transport
    pub owner: OwnerId,
}

/// Outstanding asynchronous resume of an owner
///
/// Lives from the moment the acquire is admitted until the backend completes
/// or the owner is torn down.
#[derive(Debug, PartialEq, Eq)]
pub struct AcquireRequest {
    /// Deferred reply of the originating `Acquire` call
    ///
    /// `None` once the reply has been spent, even if delivery failed.
    pub reply: Option<PendingCall>,
    /// Backend request id; `None` once resolved or if never started
    pub id: Option<RequestId>,
}

impl AcquireRequest {
    pub(crate) const fn new(reply: PendingCall) -> Self {
        Self {
            reply: Some(reply),
            id: None,
        }
    }
}

/// A client's claim on a transport
#[derive(Debug, PartialEq, Eq)]
pub struct Owner {
    pub(crate) id: OwnerId,
    pub(crate) name: ClientName,
    pub(crate) access: AccessType,
    pub(crate) watch: Option<WatchId>,
    pub(crate) request: Option<AcquireRequest>,
    pub(crate) teardown_scheduled: bool,
}

impl Owner {
    pub(crate) fn new(id: OwnerId, name: ClientName, access: AccessType) -> Self {
        Self {
            id,
            name,
            access,
            watch: None,
            request: None,
            teardown_scheduled: false,
        }
    }

    /// Owner identifier
    #[must_use]
    pub const fn id(&self) -> OwnerId {
        self.id
    }

    /// Bus name of the client
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Access currently held
    #[must_use]
    pub const fn access(&self) -> AccessType {
        self.access
    }

    /// Whether an acquire request is still waiting on the backend
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.request.is_some()
    }
}
