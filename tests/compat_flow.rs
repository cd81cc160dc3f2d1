// ============================================================================
// tests/compat_flow.rs - Firmware call surface end to end
// ============================================================================

use std::sync::{Arc, Mutex, MutexGuard};

use spectranet_compat::global;
use spectranet_compat::types::{IPPROTO_TCP, IPPROTO_UDP, SO_REUSEADDR, SOCK_DGRAM, SOL_SOCKET};
use spectranet_compat::{
    CompatConfig, CompatError, FdSet, Ipv4Address, MAX_SOCKETS, NicDevice, Protocol, SockAddrIn,
    SocketFd,
};

/// グローバル状態を共有するためテストを直列化する
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Opened(u8, Protocol),
    Closed(u8),
    Bind(u8, u16),
    Transmit(u8, Ipv4Address, u16, Vec<u8>),
}

#[derive(Clone, Default)]
struct SharedNic {
    events: Arc<Mutex<Vec<Event>>>,
}

impl SharedNic {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl NicDevice for SharedNic {
    fn socket_opened(&mut self, fd: SocketFd, protocol: Protocol) {
        self.events.lock().unwrap().push(Event::Opened(fd.as_u8(), protocol));
    }

    fn socket_closed(&mut self, fd: SocketFd) {
        self.events.lock().unwrap().push(Event::Closed(fd.as_u8()));
    }

    fn bind(&mut self, fd: SocketFd, port: u16) {
        self.events.lock().unwrap().push(Event::Bind(fd.as_u8(), port));
    }

    fn transmit(&mut self, fd: SocketFd, address: Ipv4Address, port: u16, payload: &[u8]) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Transmit(fd.as_u8(), address, port, payload.to_vec()));
    }

    fn send(&mut self, _fd: SocketFd, _payload: &[u8]) {}

    fn connect(&mut self, _fd: SocketFd, _address: Ipv4Address, _port: u16) {}
}

/// 送信をそのまま受信側へ折り返し、接続要求には即座に完了を返すNIC
struct LoopbackNic;

impl NicDevice for LoopbackNic {
    fn socket_opened(&mut self, _fd: SocketFd, _protocol: Protocol) {}

    fn socket_closed(&mut self, _fd: SocketFd) {}

    fn bind(&mut self, _fd: SocketFd, _port: u16) {}

    fn transmit(&mut self, fd: SocketFd, _address: Ipv4Address, _port: u16, payload: &[u8]) {
        global::compat_rx_data(fd.as_raw(), payload);
    }

    fn send(&mut self, fd: SocketFd, payload: &[u8]) {
        global::compat_rx_data(fd.as_raw(), payload);
    }

    fn connect(&mut self, fd: SocketFd, _address: Ipv4Address, _port: u16) {
        global::compat_connected(fd.as_raw(), true);
    }
}

fn setup() -> SharedNic {
    let nic = SharedNic::default();
    global::init(Box::new(nic.clone()), CompatConfig::default());
    nic
}

#[test]
fn udp_request_response_cycle() {
    let _guard = serial();
    let nic = setup();

    let fd = global::socket(0, SOCK_DGRAM, IPPROTO_UDP).unwrap();
    let raw = fd.as_raw();
    global::setsockopt(raw, SOL_SOCKET, SO_REUSEADDR).unwrap();
    assert_eq!(global::socket_protocol(raw), Ok(Protocol::Udp));
    global::bind(raw, &SockAddrIn::any(68)).unwrap();
    assert_eq!(global::socket_protocol(raw), Ok(Protocol::Dhcp));

    let server = SockAddrIn::new(Ipv4Address::BROADCAST, 67);
    assert_eq!(global::sendto(raw, b"DISCOVER", &server), Ok(8));

    // 応答前は準備未完了
    let mut set = FdSet::new();
    set.insert(fd);
    assert_eq!(global::select(&mut set), Ok(0));
    assert!(!set.contains(fd));

    assert_eq!(global::compat_rx_data(raw, b"OFFER"), 5);

    let mut set = FdSet::new();
    set.insert(fd);
    assert_eq!(global::select(&mut set), Ok(1));
    assert!(set.contains(fd));

    let mut buf = [0u8; 16];
    let (n, _source) = global::recvfrom(raw, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"OFFER");

    global::compat_socket_close(raw).unwrap();
    assert_eq!(global::recv(raw, &mut buf), Err(CompatError::InvalidDescriptor));

    assert_eq!(
        nic.events(),
        vec![
            Event::Opened(0, Protocol::Udp),
            Event::Bind(0, 68),
            Event::Transmit(0, Ipv4Address::BROADCAST, 67, b"DISCOVER".to_vec()),
            Event::Closed(0),
        ]
    );

    let stats = global::stats().unwrap();
    assert_eq!(stats.sockets_opened, 1);
    assert_eq!(stats.sockets_closed, 1);
    assert_eq!(stats.rx_bytes, 5);
}

#[test]
fn pool_exhaustion_and_last_error() {
    let _guard = serial();
    setup();

    for i in 0..MAX_SOCKETS {
        assert_eq!(global::socket(0, 0, IPPROTO_TCP), Ok(SocketFd::new(i as u8)));
    }
    assert_eq!(global::socket(0, 0, IPPROTO_TCP), Err(CompatError::PoolExhausted));
    assert_eq!(global::compat_socket_get_strerror(), "Error!");

    assert_eq!(global::socket(0, 0, 42), Err(CompatError::NoProtocolMatch));
    assert_eq!(
        global::compat_socket_get_error(),
        CompatError::NoProtocolMatch.code()
    );
    assert_eq!(global::compat_socket_get_strerror(), "Protocol is not recognized");
}

#[test]
fn invalid_descriptors_from_firmware() {
    let _guard = serial();
    setup();

    assert_eq!(global::compat_socket_close(-1), Err(CompatError::InvalidDescriptor));
    assert_eq!(global::send(99, b"x"), Err(CompatError::InvalidDescriptor));
    assert_eq!(global::compat_rx_data(-1, b"x"), 0);
    assert_eq!(global::compat_rx_data(3, b"x"), 0);
    assert!(!global::compat_connected(3, true));
    assert_eq!(global::socket_protocol(3), Err(CompatError::InvalidDescriptor));
}

#[test]
fn setsockopt_accepts_any_descriptor() {
    let _guard = serial();
    setup();

    assert_eq!(global::setsockopt(-1, SOL_SOCKET, SO_REUSEADDR), Ok(()));
    assert_eq!(global::setsockopt(5, SOL_SOCKET, SO_REUSEADDR), Ok(()));
    assert_eq!(global::setsockopt(0, 99, 99), Ok(()));
}

#[test]
fn nic_callbacks_from_inside_nic_calls() {
    let _guard = serial();
    global::init(Box::new(LoopbackNic), CompatConfig::default());

    let fd = global::socket(0, SOCK_DGRAM, IPPROTO_UDP).unwrap();
    let raw = fd.as_raw();
    global::bind(raw, &SockAddrIn::any(1024)).unwrap();

    let echo = SockAddrIn::new(Ipv4Address::new([10, 0, 0, 1]), 7);
    assert_eq!(global::sendto(raw, b"ping", &echo), Ok(4));

    let mut set = FdSet::new();
    set.insert(fd);
    assert_eq!(global::select(&mut set), Ok(1));

    let mut buf = [0u8; 8];
    let (n, source) = global::recvfrom(raw, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"ping");
    assert_eq!(source, SockAddrIn::UNSPECIFIED);

    let stream = global::socket(0, 0, IPPROTO_TCP).unwrap();
    global::connect(stream.as_raw(), &echo).unwrap();
    assert_eq!(global::send(stream.as_raw(), b"hello"), Ok(5));

    let (n, source) = global::recvfrom(stream.as_raw(), &mut buf).unwrap();
    assert_eq!(&buf[..n], b"hello");
    assert_eq!(source, echo);

    global::compat_socket_close(raw).unwrap();
    global::compat_socket_close(stream.as_raw()).unwrap();
    assert_eq!(global::stats().unwrap().rx_bytes, 9);
}

#[test]
fn calls_before_init_fail() {
    let _guard = serial();
    global::shutdown();

    assert!(!global::is_initialized());
    assert_eq!(global::socket(0, 0, IPPROTO_UDP), Err(CompatError::NotInitialized));
    assert_eq!(global::compat_rx_data(0, b"data"), 0);
    assert_eq!(global::compat_socket_get_error(), 0);
    assert!(global::stats().is_none());
}
