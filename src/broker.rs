//! Media Broker
//!
//! The broker owns every transport published on the bus together with the
//! two collaborators they need: the profile layers ([`AudioStack`]) and the
//! message bus ([`MessageBus`]). It is the single entry point for method
//! calls, client disappearance and backend completions, all of which are
//! expected to be fed from one task (see [`crate::processor`]).
//!
//! ## Completion Routing
//!
//! Backends report completions with the [`OwnerToken`] they were given at
//! resume time. Owner ids are never reused, so a completion for an owner that
//! has already gone away resolves to nothing and is dropped.
//!
//! ## Deferred Teardown
//!
//! A failed A2DP resume must not tear its owner down from inside the
//! completion. The owner is marked and its token queued; the processor drains
//! the queue with [`MediaBroker::run_deferred`] after yielding once.

use heapless::{Deque, FnvIndexMap};

use crate::backend::{AudioStack, AvdtpError};
use crate::bus::{MessageBus, PendingCall};
use crate::constants::{MAX_DEFERRED, MAX_TRANSPORTS, MEDIA_TRANSPORT_INTERFACE};
use crate::device::{AudioDevice, MediaEndpoint};
use crate::owner::{OwnerId, OwnerToken};
use crate::properties::{PropertyValue, TransportProperties};
use crate::transport::{Completion, Transport, TransportId};
use crate::{BrokerOptions, Rejected, TransportError};

/// Registry of media transports and their owners
pub struct MediaBroker<S: AudioStack, B: MessageBus> {
    stack: S,
    bus: B,
    options: BrokerOptions,
    transports: FnvIndexMap<TransportId, Transport, MAX_TRANSPORTS>,
    next_transport: u32,
    next_owner: u32,
    deferred: Deque<OwnerToken, MAX_DEFERRED>,
}

impl<S: AudioStack, B: MessageBus> MediaBroker<S, B> {
    /// Create an empty broker
    #[must_use]
    pub fn new(stack: S, bus: B, options: BrokerOptions) -> Self {
        Self {
            stack,
            bus,
            options,
            transports: FnvIndexMap::new(),
            next_transport: 0,
            next_owner: 0,
            deferred: Deque::new(),
        }
    }

    /// Broker settings
    #[must_use]
    pub const fn options(&self) -> &BrokerOptions {
        &self.options
    }

    /// Profile layers
    #[must_use]
    pub const fn stack(&self) -> &S {
        &self.stack
    }

    /// Profile layers, mutably
    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    /// Message bus
    #[must_use]
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Message bus, mutably
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Create a transport and publish it on the bus
    ///
    /// The object path is `<device path>/fdN`, `N` counting transports
    /// created by this broker.
    ///
    /// # Errors
    /// - `TransportError::OutOfResources` if no transport slot is free
    /// - `TransportError::RegistrationFailed` if the bus refuses the object
    /// - any error of [`Transport::new`]
    ///
    /// Nothing is published when an error is returned.
    pub fn create_transport(
        &mut self,
        endpoint: MediaEndpoint,
        device: AudioDevice,
        configuration: &[u8],
    ) -> Result<TransportId, TransportError> {
        if self.transports.len() == self.transports.capacity() {
            return Err(TransportError::OutOfResources);
        }

        let id = TransportId(self.next_transport);
        let transport = Transport::new(id, endpoint, device, configuration, &self.options)?;

        if !self.bus.register_transport(transport.path()) {
            error!("Could not register transport {}", transport.path());
            return Err(TransportError::RegistrationFailed);
        }

        info!(
            "Transport {} registered ({})",
            transport.path(),
            MEDIA_TRANSPORT_INTERFACE
        );
        self.next_transport = self.next_transport.wrapping_add(1);

        if let Err((_, transport)) = self.transports.insert(id, transport) {
            self.bus.unregister_transport(transport.path());
            return Err(TransportError::OutOfResources);
        }
        Ok(id)
    }

    /// Destroy a transport
    ///
    /// The object is withdrawn from the bus, every owner is torn down (a
    /// pending `Acquire` is answered with a failure) and the signalling
    /// session reference is dropped. Returns `false` for an unknown id.
    pub fn remove_transport(&mut self, id: TransportId) -> bool {
        let Some(mut transport) = self.transports.remove(&id) else {
            return false;
        };

        self.bus.unregister_transport(transport.path());
        transport.remove_all_owners(&mut self.stack, &mut self.bus);
        transport.release_session(&mut self.stack);

        info!("Transport {} removed", transport.path());
        true
    }

    /// Number of live transports
    #[must_use]
    pub fn transport_count(&self) -> usize {
        self.transports.len()
    }

    /// Look up a transport by id
    #[must_use]
    pub fn transport(&self, id: TransportId) -> Option<&Transport> {
        self.transports.get(&id)
    }

    /// Look up a transport by object path
    #[must_use]
    pub fn transport_by_path(&self, path: &str) -> Option<&Transport> {
        self.transports
            .values()
            .find(|transport| transport.path() == path)
    }

    /// Id of the transport published at `path`
    #[must_use]
    pub fn transport_id(&self, path: &str) -> Option<TransportId> {
        self.transport_by_path(path).map(Transport::id)
    }

    /// `GetProperties` on the transport at `path`
    ///
    /// # Errors
    /// Returns `TransportError::DoesNotExist` for an unknown path.
    pub fn get_properties(&self, path: &str) -> Result<TransportProperties, TransportError> {
        self.transport_by_path(path)
            .map(|transport| transport.properties(&self.stack))
            .ok_or(TransportError::DoesNotExist)
    }

    /// `Acquire` on the transport at `path`
    ///
    /// On success the call is kept and answered once the backend resume
    /// completes (or the owner is torn down first).
    ///
    /// # Errors
    /// Returns the unanswered call inside [`Rejected`]: `DoesNotExist` for an
    /// unknown path, otherwise the rejection of the transport itself.
    pub fn acquire(
        &mut self,
        path: &str,
        sender: &str,
        accesstype: &str,
        call: PendingCall,
    ) -> Result<(), Rejected> {
        let Some(id) = self.transport_id(path) else {
            return Err(Rejected::new(TransportError::DoesNotExist, call));
        };
        let Some(transport) = self.transports.get_mut(&id) else {
            return Err(Rejected::new(TransportError::DoesNotExist, call));
        };

        let owner = OwnerId(self.next_owner);
        self.next_owner = self.next_owner.wrapping_add(1);

        transport.acquire(
            sender,
            accesstype,
            call,
            owner,
            &mut self.stack,
            &mut self.bus,
        )
    }

    /// `Release` on the transport at `path`
    ///
    /// # Errors
    /// - `TransportError::DoesNotExist` for an unknown path
    /// - `TransportError::PermissionDenied` if the sender holds nothing that
    ///   matches `accesstype`
    pub fn release(
        &mut self,
        path: &str,
        sender: &str,
        accesstype: &str,
    ) -> Result<(), TransportError> {
        let id = self.transport_id(path).ok_or(TransportError::DoesNotExist)?;
        let transport = self
            .transports
            .get_mut(&id)
            .ok_or(TransportError::DoesNotExist)?;

        transport.release(sender, accesstype, &mut self.stack, &mut self.bus)
    }

    /// `SetProperty` on the transport at `path`
    ///
    /// # Errors
    /// - `TransportError::DoesNotExist` for an unknown path
    /// - `TransportError::NotSupported` when the backend declines the write
    pub fn set_property(
        &mut self,
        path: &str,
        name: &str,
        value: PropertyValue<'_>,
    ) -> Result<(), TransportError> {
        let id = self.transport_id(path).ok_or(TransportError::DoesNotExist)?;
        let transport = self
            .transports
            .get_mut(&id)
            .ok_or(TransportError::DoesNotExist)?;

        transport.set_property(name, value)
    }

    /// A watched client left the bus
    ///
    /// Returns `false` if the owner no longer exists.
    pub fn client_exited(&mut self, token: OwnerToken) -> bool {
        let Some(transport) = self.transports.get_mut(&token.transport) else {
            return false;
        };

        debug!("Owner {} of {} left the bus", token.owner.0, transport.path());
        transport.client_exited(token.owner, &mut self.stack, &mut self.bus)
    }

    /// AVDTP finished resuming the stream started for `token`
    pub fn a2dp_resume_complete(&mut self, token: OwnerToken, result: Result<(), AvdtpError>) {
        let Some(transport) = self.transports.get_mut(&token.transport) else {
            warn!("A2DP completion for unknown transport {}", token.transport.0);
            return;
        };
        if !transport.backend().is_a2dp() {
            warn!("A2DP completion on non-A2DP transport {}", transport.path());
            return;
        }

        if let Err(e) = result {
            debug!("Transport {}: resume failed: {}", transport.path(), e);
        }

        let completion = transport.resume_complete(
            token.owner,
            result.is_ok(),
            &mut self.stack,
            &mut self.bus,
        );
        self.route_completion(token, completion);
    }

    /// The SCO link requested for `token` is connected (or failed to)
    pub fn headset_stream_complete(&mut self, token: OwnerToken, connected: bool) {
        let Some(transport) = self.transports.get_mut(&token.transport) else {
            warn!("Headset completion for unknown transport {}", token.transport.0);
            return;
        };
        if transport.backend().is_a2dp() {
            warn!("Headset completion on A2DP transport {}", transport.path());
            return;
        }

        let completion =
            transport.resume_complete(token.owner, connected, &mut self.stack, &mut self.bus);
        self.route_completion(token, completion);
    }

    /// Store a new A2DP delay reported by the stream
    ///
    /// A report for a headset transport is ignored.
    ///
    /// # Errors
    /// Returns `TransportError::DoesNotExist` for an unknown transport.
    pub fn update_delay(&mut self, id: TransportId, delay: u16) -> Result<(), TransportError> {
        let transport = self
            .transports
            .get_mut(&id)
            .ok_or(TransportError::DoesNotExist)?;

        transport.update_delay(delay, &mut self.bus);
        Ok(())
    }

    /// Whether owner teardowns are waiting for [`MediaBroker::run_deferred`]
    #[must_use]
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Run every queued teardown
    ///
    /// Returns how many owners were actually torn down; entries whose owner
    /// or transport went away in the meantime are skipped.
    pub fn run_deferred(&mut self) -> usize {
        let mut count = 0;
        while let Some(token) = self.deferred.pop_front() {
            if self.run_teardown(token) {
                count += 1;
            }
        }
        count
    }

    fn route_completion(&mut self, token: OwnerToken, completion: Completion) {
        match completion {
            Completion::Delivered => {
                debug!("Owner {}: descriptor delivered", token.owner.0);
            }
            Completion::TornDown => {
                debug!("Owner {}: resume failed, owner removed", token.owner.0);
            }
            Completion::Deferred => self.defer(token),
            Completion::Stale => {
                warn!("Stale completion for owner {}", token.owner.0);
            }
        }
    }

    fn defer(&mut self, token: OwnerToken) {
        if let Err(token) = self.deferred.push_back(token) {
            // One slot per possible owner, so this only happens if the
            // processor stopped draining the queue
            warn!("Deferred queue full, tearing down owner {} now", token.owner.0);
            self.run_teardown(token);
        }
    }

    fn run_teardown(&mut self, token: OwnerToken) -> bool {
        self.transports
            .get_mut(&token.transport)
            .is_some_and(|transport| {
                transport.run_scheduled_teardown(token.owner, &mut self.stack, &mut self.bus)
            })
    }
}
