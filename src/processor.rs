//! Processor Task - broker event loop
//!
//! Everything that changes broker state arrives as an [`Event`] on one
//! embassy channel: method calls decoded by the bus glue, client
//! disappearance reported by disconnect watches, and completions from the
//! profile layers. The processor handles one event at a time, to completion,
//! so the broker itself needs no locking.
//!
//! # Deferred Work
//!
//! Handling an event may queue owner teardowns that must not run in the same
//! turn (failed A2DP resumes). After such an event the processor yields once
//! to the executor and then drains the queue, before taking the next event.
//!
//! # Usage
//!
//! ```rust,no_run
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use embassy_sync::channel::Channel;
//! use media_transport::constants::EVENT_QUEUE_SIZE;
//! use media_transport::processor::{self, Event};
//! use media_transport::{AudioStack, MediaBroker, MessageBus};
//!
//! async fn serve<S: AudioStack, B: MessageBus>(mut broker: MediaBroker<S, B>) {
//!     let events: Channel<NoopRawMutex, Event, EVENT_QUEUE_SIZE> = Channel::new();
//!     // Bus glue and profile layers send into `events`
//!     processor::run(&mut broker, &events).await
//! }
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::backend::{AudioStack, AvdtpError};
use crate::broker::MediaBroker;
use crate::bus::{ClientName, MessageBus, PendingCall};
use crate::device::ObjectPath;
use crate::interface::Method;
use crate::owner::OwnerToken;
use crate::transport::TransportId;

/// Input of the broker event loop
#[derive(Debug)]
pub enum Event {
    /// Method call on a transport object
    MethodCall {
        /// Object path the call was sent to
        path: ObjectPath,
        /// Unique bus name of the caller
        sender: ClientName,
        /// Reply token of the call
        call: PendingCall,
        /// Decoded method and arguments
        method: Method,
    },
    /// A watched client left the bus
    ClientExited(OwnerToken),
    /// AVDTP resume finished
    A2dpResumeComplete {
        /// Owner the resume was started for
        owner: OwnerToken,
        /// AVDTP outcome
        result: Result<(), AvdtpError>,
    },
    /// SCO stream request finished
    HeadsetStreamComplete {
        /// Owner the request was started for
        owner: OwnerToken,
        /// Whether the link is connected
        connected: bool,
    },
    /// The A2DP stream reported a new delay
    DelayChanged {
        /// Transport of the stream
        transport: TransportId,
        /// Delay in 1/10 milliseconds
        delay: u16,
    },
}

impl<S: AudioStack, B: MessageBus> MediaBroker<S, B> {
    /// Handle one event to completion
    ///
    /// Teardowns queued by the event are left for [`MediaBroker::run_deferred`].
    pub fn process_event(&mut self, event: Event) {
        match event {
            Event::MethodCall {
                path,
                sender,
                call,
                method,
            } => self.dispatch(&path, &sender, call, method),
            Event::ClientExited(owner) => {
                if !self.client_exited(owner) {
                    debug!("[PROCESSOR] exit of unknown owner {}", owner.owner.0);
                }
            }
            Event::A2dpResumeComplete { owner, result } => {
                self.a2dp_resume_complete(owner, result);
            }
            Event::HeadsetStreamComplete { owner, connected } => {
                self.headset_stream_complete(owner, connected);
            }
            Event::DelayChanged { transport, delay } => {
                if self.update_delay(transport, delay).is_err() {
                    debug!("[PROCESSOR] delay for unknown transport {}", transport.0);
                }
            }
        }
    }
}

/// Run the broker event loop
///
/// Never returns; spawn it as its own task or select it against others.
pub async fn run<S, B, M, const N: usize>(
    broker: &mut MediaBroker<S, B>,
    events: &Channel<M, Event, N>,
) -> !
where
    S: AudioStack,
    B: MessageBus,
    M: RawMutex,
{
    let receiver = events.receiver();

    loop {
        let event = receiver.receive().await;
        broker.process_event(event);

        if broker.has_deferred() {
            embassy_futures::yield_now().await;
            let count = broker.run_deferred();
            debug!("[PROCESSOR] ran {} deferred teardowns", count);
        }
    }
}
