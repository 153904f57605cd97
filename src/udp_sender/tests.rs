//! Tests for the UDP sender implementation.

use std::{
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, UdpSocket},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use chrono::{TimeZone, Utc};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use rstest::{fixture, rstest};
use static_assertions::assert_impl_all;

use crate::{
    error::SendError,
    error_reporter::ChannelErrorReporter,
    level::Level,
    log_event::{EVENT_ID_PROPERTY, LogEvent},
    packet::{DecodedPacket, FIXED_HEADER_LEN},
};

use super::{
    AddressSource, DatagramTransport, LocalAddressResolver, SendOutcome, SenderStats, UdpSender,
    UdpSenderConfig, UdpTransport, UdpTransportConfig, select_first_ipv4,
};

assert_impl_all!(UdpSender: Send, Sync);
assert_impl_all!(LocalAddressResolver: Send, Sync);

/// Transport that records every payload and can be told to fail.
#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingTransport {
    fn packets(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl DatagramTransport for RecordingTransport {
    fn send_datagram(&self, payload: &[u8]) -> io::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "collector unreachable",
            ));
        }
        self.sent.lock().push(payload.to_vec());
        Ok(())
    }
}

/// Address source returning a fixed answer and counting lookups.
struct StaticSource {
    result: Result<Vec<IpAddr>, io::ErrorKind>,
    calls: Arc<AtomicUsize>,
}

impl StaticSource {
    fn new(result: Result<Vec<IpAddr>, io::ErrorKind>) -> Self {
        Self {
            result,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl AddressSource for StaticSource {
    fn host_addresses(&self) -> io::Result<Vec<IpAddr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(io::Error::from)
    }
}

struct Harness {
    sender: UdpSender,
    transport: RecordingTransport,
    reports: Receiver<String>,
}

fn harness_with_source(source: StaticSource) -> Harness {
    let transport = RecordingTransport::default();
    let (reporter, reports) = ChannelErrorReporter::bounded(16);
    let sender = UdpSender::new(transport.clone())
        .with_resolver(LocalAddressResolver::with_source(None, source))
        .with_reporter(Arc::new(reporter));
    Harness {
        sender,
        transport,
        reports,
    }
}

#[fixture]
fn harness() -> Harness {
    harness_with_source(StaticSource::new(Ok(vec![IpAddr::V4(Ipv4Addr::new(
        172, 16, 0, 9,
    ))])))
}

#[fixture]
fn event() -> LogEvent {
    LogEvent::new(Level::WARN, "queue backlog growing")
        .with_timestamp(
            Utc.timestamp_millis_opt(1_650_000_000_000)
                .single()
                .expect("timestamp in range"),
        )
        .with_origin("Orders.Worker")
        .with_event_id(42)
}

#[rstest]
fn send_delivers_encoded_packet(harness: Harness, event: LogEvent) {
    assert_eq!(harness.sender.send(&event), SendOutcome::Delivered);

    let packets = harness.transport.packets();
    assert_eq!(packets.len(), 1);
    let decoded = DecodedPacket::parse(&packets[0]).expect("decode packet");
    assert_eq!(decoded.event_id, 42);
    assert_eq!(decoded.local_ip, Ipv4Addr::new(172, 16, 0, 9));
    assert_eq!(decoded.message, "queue backlog growing");
    assert!(harness.reports.try_recv().is_err());
}

#[rstest]
fn identical_sends_produce_identical_packets(harness: Harness, event: LogEvent) {
    harness.sender.send(&event);
    harness.sender.send(&event);
    let packets = harness.transport.packets();
    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0], packets[1]);
}

#[rstest]
fn transport_failure_is_reported_once(harness: Harness, event: LogEvent) {
    harness.transport.set_failing(true);
    assert_eq!(
        harness.sender.send(&event),
        SendOutcome::TransportErrorReported
    );

    let report = harness.reports.try_recv().expect("one report");
    assert!(report.starts_with("UDP send failed: "), "got {report:?}");
    assert!(report.contains("collector unreachable"));
    assert!(harness.reports.try_recv().is_err(), "exactly one report");

    harness.transport.set_failing(false);
    assert_eq!(harness.sender.send(&event), SendOutcome::Delivered);
    assert_eq!(harness.transport.packets().len(), 1);
    assert_eq!(
        harness.sender.stats(),
        SenderStats {
            delivered: 1,
            encode_failures: 0,
            transport_failures: 1,
        }
    );
}

#[rstest]
fn oversized_assembly_name_is_reported_and_not_sent(harness: Harness, event: LogEvent) {
    let event = event.with_origin("x".repeat(256));
    assert_eq!(harness.sender.send(&event), SendOutcome::EncodeErrorReported);
    assert!(harness.transport.packets().is_empty());

    let report = harness.reports.try_recv().expect("one report");
    assert!(report.starts_with("UDP packet encoding failed: "), "got {report:?}");
    assert!(harness.reports.try_recv().is_err());
    assert_eq!(harness.sender.stats().encode_failures, 1);
}

#[rstest]
fn non_numeric_event_id_is_reported(harness: Harness, event: LogEvent) {
    let event = event.with_property(EVENT_ID_PROPERTY, "not-a-number");
    assert_eq!(harness.sender.send(&event), SendOutcome::EncodeErrorReported);
    assert!(harness.transport.packets().is_empty());
    assert!(harness.reports.try_recv().is_ok());
}

#[rstest]
fn try_send_returns_errors_without_reporting(harness: Harness, event: LogEvent) {
    harness.transport.set_failing(true);
    let err = harness.sender.try_send(&event).expect_err("transport fails");
    assert!(matches!(err, SendError::Transport(_)));
    assert!(harness.reports.try_recv().is_err());
}

#[rstest]
fn override_wins_over_host_addresses(harness: Harness, event: LogEvent) {
    harness.sender.set_local_ip(Some("10.0.0.5".into()));
    harness.sender.send(&event);
    let packet = &harness.transport.packets()[0];
    assert_eq!(&packet[15..19], &[10, 0, 0, 5]);
}

#[rstest]
fn override_change_invalidates_cache(harness: Harness) {
    assert_eq!(harness.sender.local_ip(), Ipv4Addr::new(172, 16, 0, 9));
    harness.sender.set_local_ip(Some("10.1.2.3".into()));
    assert_eq!(harness.sender.local_ip(), Ipv4Addr::new(10, 1, 2, 3));
    harness.sender.set_local_ip(None);
    assert_eq!(harness.sender.local_ip(), Ipv4Addr::new(172, 16, 0, 9));
}

#[rstest]
#[case(Some("fe80::1"))]
#[case(Some("not an address"))]
#[case(Some("  "))]
#[case(None)]
fn unusable_override_falls_back_to_detection(#[case] local_ip: Option<&str>) {
    let resolver = LocalAddressResolver::with_source(
        local_ip.map(str::to_owned),
        StaticSource::new(Ok(vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7))])),
    );
    assert_eq!(resolver.resolve(), Ipv4Addr::new(192, 0, 2, 7));
}

#[rstest]
fn detection_skips_ipv6_addresses() {
    let addrs = [
        IpAddr::V6(Ipv6Addr::LOCALHOST),
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2)),
    ];
    assert_eq!(select_first_ipv4(&addrs), Some(Ipv4Addr::new(192, 0, 2, 1)));
}

#[rstest]
#[case(Ok(vec![]))]
#[case(Ok(vec![IpAddr::V6(Ipv6Addr::LOCALHOST)]))]
#[case(Err(io::ErrorKind::NotFound))]
fn no_ipv4_address_falls_back_to_loopback(#[case] result: Result<Vec<IpAddr>, io::ErrorKind>) {
    let harness = harness_with_source(StaticSource::new(result));
    assert_eq!(harness.sender.local_ip(), Ipv4Addr::LOCALHOST);

    let event = LogEvent::new(Level::INFO, "hi");
    assert_eq!(harness.sender.send(&event), SendOutcome::Delivered);
    assert_eq!(&harness.transport.packets()[0][15..19], &[127, 0, 0, 1]);
    assert!(harness.reports.try_recv().is_err(), "resolution never reports");
}

#[rstest]
fn resolution_is_cached() {
    let source = StaticSource::new(Ok(vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 3))]));
    let calls = Arc::clone(&source.calls);
    let resolver = LocalAddressResolver::with_source(None, source);
    resolver.resolve();
    resolver.resolve();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    resolver.invalidate();
    resolver.resolve();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Address source that blocks inside the lookup until released.
struct BlockingSource {
    entered: crossbeam_channel::Sender<()>,
    release: Receiver<()>,
}

impl AddressSource for BlockingSource {
    fn host_addresses(&self) -> io::Result<Vec<IpAddr>> {
        let _ = self.entered.send(());
        let _ = self.release.recv_timeout(Duration::from_secs(5));
        Ok(vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 50))])
    }
}

#[rstest]
fn override_change_does_not_wait_for_host_lookup() {
    let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
    let (release_tx, release_rx) = crossbeam_channel::bounded(1);
    let resolver = LocalAddressResolver::with_source(
        None,
        BlockingSource {
            entered: entered_tx,
            release: release_rx,
        },
    );

    thread::scope(|scope| {
        let lookup = scope.spawn(|| resolver.resolve());
        entered_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("lookup started");

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let resolver_ref = &resolver;
        scope.spawn(move || {
            let resolver = resolver_ref;
            resolver.set_local_ip(Some("10.9.8.7".into()));
            let _ = done_tx.send(());
        });
        let updated = done_rx.recv_timeout(Duration::from_secs(2));
        release_tx.send(()).expect("release lookup");
        assert!(updated.is_ok(), "set_local_ip blocked behind the lookup");

        // The stale lookup result is discarded in favour of the new override.
        let resolved = lookup.join().expect("lookup thread panicked");
        assert_eq!(resolved, Ipv4Addr::new(10, 9, 8, 7));
    });
    assert_eq!(resolver.resolve(), Ipv4Addr::new(10, 9, 8, 7));
}

#[rstest]
fn host_lookup_resolves_without_override() {
    let resolver = LocalAddressResolver::new(None);
    let first = resolver.resolve();
    assert_eq!(resolver.resolve(), first);
}

#[rstest]
fn replacing_resolver_keeps_earlier_override() {
    let source = StaticSource::new(Ok(vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 3))]));
    let sender = UdpSender::new(RecordingTransport::default())
        .with_local_ip(Some("10.0.0.5".into()))
        .with_resolver(LocalAddressResolver::with_source(None, source));
    assert_eq!(sender.local_ip(), Ipv4Addr::new(10, 0, 0, 5));
}

#[rstest]
fn resolver_override_wins_when_replacing() {
    let source = StaticSource::new(Ok(vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 3))]));
    let resolver = LocalAddressResolver::with_source(Some("10.4.4.4".into()), source);
    let sender = UdpSender::new(RecordingTransport::default())
        .with_local_ip(Some("10.0.0.5".into()))
        .with_resolver(resolver);
    assert_eq!(sender.local_ip(), Ipv4Addr::new(10, 4, 4, 4));
}

#[rstest]
fn concurrent_sends_are_all_delivered(harness: Harness, event: LogEvent) {
    let Harness {
        sender, transport, ..
    } = harness;
    let sender = Arc::new(sender);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let sender = Arc::clone(&sender);
            let event = event.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    sender.send(&event);
                    if i == 0 {
                        sender.set_local_ip(Some("10.0.0.5".into()));
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("sender thread panicked");
    }

    let packets = transport.packets();
    assert_eq!(packets.len(), 200);
    assert!(packets
        .iter()
        .all(|p| DecodedPacket::parse(p).is_ok()));
    assert_eq!(sender.stats().delivered, 200);
}

#[fixture]
fn collector() -> UdpSocket {
    let socket = UdpSocket::bind(("127.0.0.1", 0)).expect("bind collector");
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("set read timeout");
    socket
}

fn transport_config(collector: &UdpSocket) -> UdpTransportConfig {
    let addr = collector.local_addr().expect("collector address");
    UdpTransportConfig {
        remote_host: addr.ip().to_string(),
        remote_port: addr.port(),
        local_port: 0,
        write_timeout: Duration::from_millis(500),
    }
}

#[rstest]
fn udp_transport_delivers_datagrams(collector: UdpSocket) {
    let transport = UdpTransport::open(&transport_config(&collector)).expect("open transport");
    transport.send_datagram(b"ping").expect("send datagram");

    let mut buf = [0u8; 16];
    let (len, from) = collector.recv_from(&mut buf).expect("receive datagram");
    assert_eq!(&buf[..len], b"ping");
    assert_eq!(from.port(), transport.local_addr().expect("local addr").port());
}

#[rstest]
fn sender_from_config_ships_packets(collector: UdpSocket, event: LogEvent) {
    let config = UdpSenderConfig {
        local_ip: Some("10.0.0.5".into()),
        ..UdpSenderConfig::default()
    }
    .with_transport(transport_config(&collector));
    let sender = UdpSender::with_config(config).expect("build sender");
    assert_eq!(sender.send(&event), SendOutcome::Delivered);

    let mut buf = [0u8; 512];
    let len = collector.recv(&mut buf).expect("receive packet");
    assert_eq!(len, FIXED_HEADER_LEN + "Orders.Worker".len() + event.message.len());
    let decoded = DecodedPacket::parse(&buf[..len]).expect("decode packet");
    assert_eq!(decoded.local_ip, Ipv4Addr::new(10, 0, 0, 5));
    assert_eq!(decoded.timestamp_millis, 1_650_000_000_000);
}

#[rstest]
fn unresolvable_collector_fails_to_open() {
    let config = UdpTransportConfig {
        remote_host: "collector.invalid".into(),
        remote_port: 9020,
        local_port: 0,
        write_timeout: Duration::from_millis(100),
    };
    assert!(UdpTransport::open(&config).is_err());
}
