#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use media_transport::constants::{A2DP_SINK_UUID, HFP_AG_UUID};
use media_transport::{
    A2dpStack, AccessType, AudioDevice, BdAddr, BluetoothAddress, BrokerOptions, BusError, HeadsetStack,
    MediaBroker, MediaEndpoint, MessageBus, OwnerId, OwnerToken, PendingCall, PropertyChange,
    Reply, RequestId, SessionId, StreamEndpointId, StreamFd, StreamTransport, Transport,
    TransportError, TransportId, WatchId,
};

pub const ADAPTER_PATH: &str = "/org/bluez/hci0";
pub const DEVICE_PATH: &str = "/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF";
pub const TRANSPORT_PATH: &str = "/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF/fd0";
pub const SBC_CONFIGURATION: [u8; 4] = [0xFF, 0xFF, 2, 53];

pub const CLIENT_A: &str = ":1.10";
pub const CLIENT_B: &str = ":1.11";
pub const CLIENT_C: &str = ":1.12";

// ---------------------------------------------------------------------------
// Shared call log
// ---------------------------------------------------------------------------

/// Every collaborator call, in the order the broker made them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(String),
    Unregister(String),
    AddWatch(String),
    RemoveWatch(WatchId),
    Reply(u32, Result<Reply, TransportError>),
    PropertyChanged(PropertyChange),
    SessionGet,
    SessionUnref,
    SepLock,
    SepUnlock,
    A2dpResume(OwnerToken),
    A2dpCancel(RequestId),
    HeadsetLock(AccessType),
    HeadsetUnlock,
    RequestStream(OwnerToken),
    CancelStream(RequestId),
}

pub type Log = Rc<RefCell<Vec<Call>>>;

pub fn count(log: &Log, call: &Call) -> usize {
    log.borrow().iter().filter(|c| *c == call).count()
}

pub fn replies(log: &Log) -> Vec<(u32, Result<Reply, TransportError>)> {
    log.borrow()
        .iter()
        .filter_map(|call| match call {
            Call::Reply(serial, result) => Some((*serial, result.clone())),
            _ => None,
        })
        .collect()
}

pub fn signals(log: &Log) -> Vec<PropertyChange> {
    log.borrow()
        .iter()
        .filter_map(|call| match call {
            Call::PropertyChanged(change) => Some(*change),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Mock message bus
// ---------------------------------------------------------------------------

pub struct MockBus {
    log: Log,
    pub register_ok: bool,
    pub deliver_replies: bool,
    next_watch: u32,
}

impl MockBus {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            register_ok: true,
            deliver_replies: true,
            next_watch: 0,
        }
    }
}

impl MessageBus for MockBus {
    fn register_transport(&mut self, path: &str) -> bool {
        self.log.borrow_mut().push(Call::Register(path.into()));
        self.register_ok
    }

    fn unregister_transport(&mut self, path: &str) {
        self.log.borrow_mut().push(Call::Unregister(path.into()));
    }

    fn add_disconnect_watch(&mut self, client: &str, _owner: OwnerToken) -> Option<WatchId> {
        self.next_watch += 1;
        self.log.borrow_mut().push(Call::AddWatch(client.into()));
        Some(WatchId(self.next_watch))
    }

    fn remove_watch(&mut self, watch: WatchId) {
        self.log.borrow_mut().push(Call::RemoveWatch(watch));
    }

    fn send_reply(
        &mut self,
        call: PendingCall,
        reply: Result<Reply, TransportError>,
    ) -> Result<(), BusError> {
        self.log
            .borrow_mut()
            .push(Call::Reply(call.serial(), reply));
        if self.deliver_replies {
            Ok(())
        } else {
            Err(BusError::Disconnected)
        }
    }

    fn emit_property_changed(&mut self, _path: &str, change: PropertyChange) {
        self.log.borrow_mut().push(Call::PropertyChanged(change));
    }
}

// ---------------------------------------------------------------------------
// Mock profile layers
// ---------------------------------------------------------------------------

pub struct MockStack {
    log: Log,
    pub session: Option<SessionId>,
    pub peer: Option<BdAddr>,
    pub sep_lock_ok: bool,
    pub headset_lock_ok: bool,
    pub start_ok: bool,
    pub stream: Option<StreamTransport>,
    pub sco_fd: Option<StreamFd>,
    pub nrec: bool,
    pub inband_ringtone: bool,
    next_request: u32,
}

impl MockStack {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            session: Some(SessionId(1)),
            peer: None,
            sep_lock_ok: true,
            headset_lock_ok: true,
            start_ok: true,
            stream: Some(StreamTransport {
                fd: StreamFd(7),
                imtu: 672,
                omtu: 895,
            }),
            sco_fd: Some(StreamFd(9)),
            nrec: true,
            inband_ringtone: false,
            next_request: 0,
        }
    }

    fn start_request(&mut self) -> Option<RequestId> {
        if !self.start_ok {
            return None;
        }
        self.next_request += 1;
        RequestId::new(self.next_request)
    }
}

impl A2dpStack for MockStack {
    fn session_get(&mut self, _src: BdAddr, dst: BdAddr) -> Option<SessionId> {
        self.log.borrow_mut().push(Call::SessionGet);
        self.peer = Some(dst);
        self.session
    }

    fn session_unref(&mut self, _session: SessionId) {
        self.log.borrow_mut().push(Call::SessionUnref);
    }

    fn sep_lock(&mut self, _sep: StreamEndpointId, _session: SessionId) -> bool {
        self.log.borrow_mut().push(Call::SepLock);
        self.sep_lock_ok
    }

    fn sep_unlock(&mut self, _sep: StreamEndpointId, _session: SessionId) {
        self.log.borrow_mut().push(Call::SepUnlock);
    }

    fn resume(
        &mut self,
        _session: SessionId,
        _sep: StreamEndpointId,
        owner: OwnerToken,
    ) -> Option<RequestId> {
        self.log.borrow_mut().push(Call::A2dpResume(owner));
        self.start_request()
    }

    fn cancel(&mut self, _device: &AudioDevice, request: RequestId) {
        self.log.borrow_mut().push(Call::A2dpCancel(request));
    }

    fn stream_transport(&self, _sep: StreamEndpointId) -> Option<StreamTransport> {
        self.stream
    }
}

impl HeadsetStack for MockStack {
    fn headset_lock(&mut self, _device: &AudioDevice, lock: AccessType) -> bool {
        self.log.borrow_mut().push(Call::HeadsetLock(lock));
        self.headset_lock_ok
    }

    fn headset_unlock(&mut self, _device: &AudioDevice, _lock: AccessType) {
        self.log.borrow_mut().push(Call::HeadsetUnlock);
    }

    fn request_stream(&mut self, _device: &AudioDevice, owner: OwnerToken) -> Option<RequestId> {
        self.log.borrow_mut().push(Call::RequestStream(owner));
        self.start_request()
    }

    fn cancel_stream(&mut self, _device: &AudioDevice, request: RequestId) {
        self.log.borrow_mut().push(Call::CancelStream(request));
    }

    fn sco_fd(&self, _device: &AudioDevice) -> Option<StreamFd> {
        self.sco_fd
    }

    fn nrec(&self, _device: &AudioDevice) -> bool {
        self.nrec
    }

    fn inband_ringtone(&self, _device: &AudioDevice) -> bool {
        self.inband_ringtone
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub type Broker = MediaBroker<MockStack, MockBus>;

pub fn device() -> AudioDevice {
    AudioDevice::new(
        ADAPTER_PATH,
        BluetoothAddress::new([0x00, 0x01, 0x02, 0x03, 0x04, 0x05]),
        BluetoothAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
    )
    .unwrap()
}

pub fn empty_broker() -> (Broker, Log) {
    let log = Log::default();
    let broker = MediaBroker::new(
        MockStack::new(&log),
        MockBus::new(&log),
        BrokerOptions::default(),
    );
    (broker, log)
}

fn broker_with(endpoint: MediaEndpoint) -> (Broker, Log, TransportId) {
    let (mut broker, log) = empty_broker();
    let id = broker
        .create_transport(endpoint, device(), &SBC_CONFIGURATION)
        .unwrap();
    log.borrow_mut().clear();
    (broker, log, id)
}

/// Broker with one A2DP sink transport at `TRANSPORT_PATH`
pub fn a2dp_broker() -> (Broker, Log, TransportId) {
    broker_with(MediaEndpoint::new(A2DP_SINK_UUID, 0x00, Some(1)).unwrap())
}

/// Broker with one hands-free gateway transport at `TRANSPORT_PATH`
pub fn headset_broker() -> (Broker, Log, TransportId) {
    broker_with(MediaEndpoint::new(HFP_AG_UUID, 0x01, None).unwrap())
}

/// Token of the n-th owner created on the first transport
pub fn token(owner: u32) -> OwnerToken {
    OwnerToken {
        transport: TransportId(0),
        owner: OwnerId(owner),
    }
}

pub fn transport(broker: &Broker) -> &Transport {
    broker.transport_by_path(TRANSPORT_PATH).unwrap()
}

/// Lock bits equal the union of the owners' access, and owners never overlap
pub fn assert_lock_invariant(transport: &Transport) {
    let mut union = AccessType::NONE;
    for owner in transport.owners() {
        assert!(!owner.access().is_empty());
        assert!(!owner.access().intersects(union));
        union = union.union(owner.access());
    }
    assert_eq!(transport.locks(), union);
}
