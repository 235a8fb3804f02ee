mod common;

use common::*;
use embassy_futures::select::select;
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use media_transport::constants::EVENT_QUEUE_SIZE;
use media_transport::interface::Method;
use media_transport::processor::{self, Event};
use media_transport::{AccessType, AvdtpError, PendingCall, Reply, StreamFd, TransportError};

type Events = Channel<NoopRawMutex, Event, EVENT_QUEUE_SIZE>;

fn method_call(client: &str, serial: u32, method: Method) -> Event {
    Event::MethodCall {
        path: heapless::String::try_from(TRANSPORT_PATH).unwrap(),
        sender: heapless::String::try_from(client).unwrap(),
        call: PendingCall::new(serial),
        method,
    }
}

fn acquire(client: &str, serial: u32, accesstype: &str) -> Event {
    method_call(
        client,
        serial,
        Method::Acquire {
            accesstype: heapless::String::try_from(accesstype).unwrap(),
        },
    )
}

/// Let the processor work through queued events for a few scheduling turns
async fn drive(broker: &mut Broker, events: &Events) {
    select(processor::run(broker, events), async {
        for _ in 0..8 {
            yield_now().await;
        }
    })
    .await;
}

#[futures_test::test]
async fn test_processor_delivers_descriptor() {
    let (mut broker, log, _) = a2dp_broker();
    let events = Events::new();

    events.try_send(acquire(CLIENT_A, 1, "rw")).unwrap();
    events
        .try_send(Event::A2dpResumeComplete {
            owner: token(0),
            result: Ok(()),
        })
        .unwrap();
    drive(&mut broker, &events).await;

    assert_eq!(replies(&log), vec![(1, Ok(Reply::Fd(StreamFd(7))))]);
    assert_eq!(transport(&broker).locks(), AccessType::READ_WRITE);
}

#[futures_test::test]
async fn test_processor_runs_deferred_teardown() {
    let (mut broker, log, _) = a2dp_broker();
    let events = Events::new();

    events.try_send(acquire(CLIENT_A, 1, "rw")).unwrap();
    events
        .try_send(Event::A2dpResumeComplete {
            owner: token(0),
            result: Err(AvdtpError::Disconnected),
        })
        .unwrap();
    drive(&mut broker, &events).await;

    assert!(!broker.has_deferred());
    assert_eq!(replies(&log), vec![(1, Err(TransportError::ResumeFailed))]);
    assert!(transport(&broker).owners().is_empty());
    assert_eq!(count(&log, &Call::SepUnlock), 1);
}

#[futures_test::test]
async fn test_processor_client_exit() {
    let (mut broker, log, _) = headset_broker();
    let events = Events::new();

    events.try_send(acquire(CLIENT_A, 1, "r")).unwrap();
    events.try_send(acquire(CLIENT_B, 2, "r")).unwrap();
    events.try_send(Event::ClientExited(token(0))).unwrap();
    drive(&mut broker, &events).await;

    // B was refused while A held the read lock
    assert_eq!(
        replies(&log),
        vec![(2, Err(TransportError::PermissionDenied))]
    );
    assert!(transport(&broker).owners().is_empty());
    assert_eq!(count(&log, &Call::HeadsetUnlock), 1);
}

#[futures_test::test]
async fn test_processor_delay_and_properties() {
    let (mut broker, log, id) = a2dp_broker();
    let events = Events::new();

    events
        .try_send(Event::DelayChanged {
            transport: id,
            delay: 300,
        })
        .unwrap();
    events
        .try_send(method_call(CLIENT_A, 1, Method::GetProperties))
        .unwrap();
    drive(&mut broker, &events).await;

    let replies = replies(&log);
    let Some((1, Ok(Reply::Properties(properties)))) = replies.first() else {
        panic!("expected a property snapshot, got {replies:?}");
    };
    assert_eq!(properties.backend, media_transport::BackendProperties::A2dp { delay: 300 });
    assert_eq!(transport(&broker).delay(), 300);
}
