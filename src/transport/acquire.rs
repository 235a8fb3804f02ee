//! Acquire / Release Protocol
//!
//! Locks are exclusive per bit, not per transport: one client may hold read
//! while another holds write. A client owns a transport at most once; a
//! second `Acquire` from the same client is rejected whatever it asks for.
//!
//! Every way an owner can end (full release, resume failure, client leaving
//! the bus, transport destruction) goes through [`Transport::remove_owner`],
//! which always clears the owner's lock bits, drops its watch, fails its
//! pending request, removes it and suspends the backend once nobody is left.

use crate::access::AccessType;
use crate::backend::AudioStack;
use crate::bus::{ClientName, MessageBus, PendingCall};
use crate::owner::{AcquireRequest, Owner, OwnerId, OwnerToken};
use crate::{Rejected, TransportError};

use super::Transport;

impl Transport {
    /// Admit an `Acquire` call and start resuming the backend
    ///
    /// On admission the requested lock bits are taken, an owner is created
    /// and the backend resume is started; the reply is sent later, when the
    /// resume completes. If the backend cannot even start, the owner is torn
    /// down right away and the call is answered with a failure.
    ///
    /// # Errors
    /// The call is handed back, unanswered, inside [`Rejected`] when:
    /// - the client already owns the transport (`PermissionDenied`)
    /// - the access type has neither `r` nor `w` (`PermissionDenied`)
    /// - a requested bit is held by another owner (`PermissionDenied`)
    /// - the client name does not fit (`InvalidArguments`)
    /// - the owner table is full (`OutOfResources`)
    pub(crate) fn acquire<S: AudioStack, B: MessageBus>(
        &mut self,
        client: &str,
        accesstype: &str,
        call: PendingCall,
        owner_id: OwnerId,
        stack: &mut S,
        bus: &mut B,
    ) -> Result<(), Rejected> {
        if self.owner_index_by_name(client).is_some() {
            return Err(Rejected::new(TransportError::PermissionDenied, call));
        }

        let Some(access) = AccessType::parse(accesstype) else {
            return Err(Rejected::new(TransportError::PermissionDenied, call));
        };

        if access.intersects(self.locks()) {
            return Err(Rejected::new(TransportError::PermissionDenied, call));
        }

        let Ok(name) = ClientName::try_from(client) else {
            return Err(Rejected::new(TransportError::InvalidArguments, call));
        };

        let index = self.owners.len();
        if self.owners.push(Owner::new(owner_id, name, access)).is_err() {
            return Err(Rejected::new(TransportError::OutOfResources, call));
        }

        self.take_locks(access);

        let token = OwnerToken {
            transport: self.id,
            owner: owner_id,
        };
        let owner = &mut self.owners[index];
        owner.watch = bus.add_disconnect_watch(client, token);
        owner.request = Some(AcquireRequest::new(call));

        debug!("Owner created: sender={} accesstype={}", client, access.as_str());

        let request_id = self
            .backend
            .resume(&mut self.in_use, &self.device, stack, token);

        match request_id {
            Some(id) => {
                if let Some(request) = self.owners[index].request.as_mut() {
                    request.id = Some(id);
                }
            }
            None => {
                debug!("Transport {}: resume could not be started", self.path.as_str());
                self.remove_owner(index, stack, bus);
            }
        }

        Ok(())
    }

    /// Give back some or all of the access held by a client
    ///
    /// Releasing exactly the held access removes the owner; releasing a
    /// strict subset narrows it and keeps it alive.
    ///
    /// # Errors
    /// Returns `TransportError::PermissionDenied`, with nothing changed, when
    /// the client owns nothing here, the access type is unrecognized, or it
    /// is neither equal to nor a subset of what the client holds.
    pub(crate) fn release<S: AudioStack, B: MessageBus>(
        &mut self,
        client: &str,
        accesstype: &str,
        stack: &mut S,
        bus: &mut B,
    ) -> Result<(), TransportError> {
        let index = self
            .owner_index_by_name(client)
            .ok_or(TransportError::PermissionDenied)?;
        let access = AccessType::parse(accesstype).ok_or(TransportError::PermissionDenied)?;
        let held = self.owners[index].access;

        if access == held {
            self.remove_owner(index, stack, bus);
        } else if access.is_subset_of(held) {
            self.release_locks(access);
            self.owners[index].access = held.difference(access);
            debug!(
                "Owner narrowed: sender={} accesstype={}",
                client,
                self.owners[index].access.as_str()
            );
        } else {
            return Err(TransportError::PermissionDenied);
        }

        Ok(())
    }

    /// The client behind an owner left the bus
    ///
    /// The watch has already fired, and a pending request is cancelled
    /// without a reply since nobody is left to receive it.
    pub(crate) fn client_exited<S: AudioStack, B: MessageBus>(
        &mut self,
        owner: OwnerId,
        stack: &mut S,
        bus: &mut B,
    ) -> bool {
        let Some(index) = self.owner_index(owner) else {
            return false;
        };

        // The watch already fired and the caller is gone; teardown still
        // cancels the backend request in its usual place
        let owner = &mut self.owners[index];
        owner.watch = None;
        if let Some(request) = owner.request.as_mut() {
            request.reply = None;
        }

        self.remove_owner(index, stack, bus);
        true
    }

    /// Tear down every owner, as when the transport is destroyed
    pub(crate) fn remove_all_owners<S: AudioStack, B: MessageBus>(
        &mut self,
        stack: &mut S,
        bus: &mut B,
    ) {
        while !self.owners.is_empty() {
            self.remove_owner(0, stack, bus);
        }
    }

    /// Shared terminal path of every owner
    pub(crate) fn remove_owner<S: AudioStack, B: MessageBus>(
        &mut self,
        index: usize,
        stack: &mut S,
        bus: &mut B,
    ) {
        let access = self.owners[index].access;
        self.release_locks(access);

        if let Some(watch) = self.owners[index].watch.take() {
            bus.remove_watch(watch);
        }

        if let Some(request) = self.owners[index].request.take() {
            if let Some(id) = request.id {
                self.backend.cancel(&self.device, stack, id);
            }
            if let Some(call) = request.reply {
                if bus
                    .send_reply(call, Err(TransportError::ResumeFailed))
                    .is_err()
                {
                    warn!(
                        "Transport {}: failure reply could not be delivered",
                        self.path.as_str()
                    );
                }
            }
        }

        let owner = self.owners.remove(index);

        if self.owners.is_empty() {
            self.backend
                .suspend(&mut self.in_use, &self.device, stack);
        }

        debug!(
            "Owner removed: sender={} accesstype={}",
            owner.name(),
            owner.access.as_str()
        );
    }
}
