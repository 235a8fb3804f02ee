//! Resume Completion
//!
//! The backend reports the end of a resume for one owner. Success installs
//! the descriptor on the transport and answers the deferred `Acquire` reply
//! with it; the owner and its locks stay in place. Failure, including a
//! reply that can no longer be delivered, ends the owner.
//!
//! A2DP failures arrive from inside the AVDTP stream state-change
//! notification, so their teardown is scheduled for the next turn rather
//! than run inline. The broker owns that queue; here the owner is only
//! marked and the caller told.

use crate::backend::AudioStack;
use crate::bus::{MessageBus, Reply};
use crate::owner::OwnerId;

use super::Transport;

/// Outcome of routing a resume completion to an owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Completion {
    /// Descriptor delivered, owner kept
    Delivered,
    /// Owner torn down inline
    TornDown,
    /// Owner must be torn down on the next scheduling turn
    Deferred,
    /// No pending request for this owner (already gone or resolved)
    Stale,
}

impl Transport {
    pub(crate) fn resume_complete<S: AudioStack, B: MessageBus>(
        &mut self,
        owner: OwnerId,
        success: bool,
        stack: &mut S,
        bus: &mut B,
    ) -> Completion {
        let Some(index) = self.owner_index(owner) else {
            return Completion::Stale;
        };
        if self.owners[index].teardown_scheduled {
            return Completion::Stale;
        }
        let Some(request) = self.owners[index].request.as_mut() else {
            return Completion::Stale;
        };

        // Resolved: nothing left to cancel
        request.id = None;

        if success {
            if let Some(stream) = self.backend.completed_stream(&self.device, stack) {
                self.set_fd(stream, bus);

                let reply = self.owners[index]
                    .request
                    .take()
                    .and_then(|request| request.reply);
                if let Some(call) = reply {
                    match bus.send_reply(call, Ok(Reply::Fd(stream.fd))) {
                        Ok(()) => return Completion::Delivered,
                        Err(e) => warn!(
                            "Transport {}: Acquire reply could not be delivered: {}",
                            self.path.as_str(),
                            e
                        ),
                    }
                }
            } else {
                debug!("Transport {}: resume left no stream", self.path.as_str());
            }
        }

        if self.backend.defers_failure_teardown() {
            self.owners[index].teardown_scheduled = true;
            Completion::Deferred
        } else {
            self.remove_owner(index, stack, bus);
            Completion::TornDown
        }
    }

    /// Run a teardown scheduled by a failed completion
    ///
    /// Returns `false` if the owner already went away in between.
    pub(crate) fn run_scheduled_teardown<S: AudioStack, B: MessageBus>(
        &mut self,
        owner: OwnerId,
        stack: &mut S,
        bus: &mut B,
    ) -> bool {
        match self.owner_index(owner) {
            Some(index) if self.owners[index].teardown_scheduled => {
                self.remove_owner(index, stack, bus);
                true
            }
            _ => false,
        }
    }
}
