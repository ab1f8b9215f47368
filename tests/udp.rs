use std::net::UdpSocket;
use std::time::Duration;
use tempo::prelude::*;
use tempo::{BufferedMetricSink, StatsdClient, UdpMetricSink, DEFAULT_PORT};

mod utils;
use utils::run_arc_threaded_test;

const TARGET_HOST: (&str, u16) = ("127.0.0.1", DEFAULT_PORT);

fn new_udp_client(prefix: &str) -> StatsdClient {
    let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    let sink = UdpMetricSink::from(TARGET_HOST, socket).unwrap();
    StatsdClient::from_sink(prefix, sink)
}

fn new_buffered_udp_client(prefix: &str) -> StatsdClient {
    let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    let sink = BufferedMetricSink::udp(TARGET_HOST, socket).unwrap();
    StatsdClient::from_sink(prefix, sink)
}

#[test]
fn test_statsd_client_udp_sink_single_threaded() {
    let client = new_udp_client("tempo");
    run_arc_threaded_test(client, 1, 1);
}

#[test]
fn test_statsd_client_buffered_udp_sink_single_threaded() {
    let client = new_buffered_udp_client("tempo");
    run_arc_threaded_test(client, 1, 1);
}

#[test]
fn test_statsd_client_buffered_udp_sink_round_trip() {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    server.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let addr = server.local_addr().unwrap();

    let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    let sink = BufferedMetricSink::udp(addr, socket).unwrap();
    let client = StatsdClient::from_sink("test", sink);

    client.count("requests", 3).unwrap();
    client.time("latency", 20).unwrap();
    drop(client);

    let mut buf = [0u8; 1500];
    let (len, _from) = server.recv_from(&mut buf).unwrap();
    assert_eq!(b"test.requests:3|c\ntest.latency:20|ms", &buf[..len]);
}
