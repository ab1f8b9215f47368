use crossbeam_channel::Receiver;
use std::time::Duration;
use tempo::prelude::*;
use tempo::{BufferedMetricSink, SpyMetricSink, SpyTransport, StatsdClient};

mod utils;
use utils::{run_arc_threaded_test, NUM_ITERATIONS, NUM_THREADS};

// The receiver half is returned along with the client so the channel the
// sink writes to stays connected for the duration of a test.
fn new_spy_client(prefix: &str) -> (Receiver<Vec<u8>>, StatsdClient) {
    let (rx, sink) = SpyMetricSink::new();
    (rx, StatsdClient::from_sink(prefix, sink))
}

fn new_buffered_spy_client(prefix: &str) -> (Receiver<Vec<u8>>, StatsdClient) {
    let (rx, transport) = SpyTransport::new();
    let sink = BufferedMetricSink::from(transport);
    (rx, StatsdClient::from_sink(prefix, sink))
}

#[test]
fn test_statsd_client_spy_sink_single_threaded() {
    let (_rx, client) = new_spy_client("tempo");
    run_arc_threaded_test(client, 1, 1);
}

#[test]
fn test_statsd_client_buffered_spy_sink_single_threaded() {
    let (_rx, client) = new_buffered_spy_client("tempo");
    run_arc_threaded_test(client, 1, 1);
}

#[test]
fn test_statsd_client_buffered_spy_sink_one_packet() {
    let (rx, transport) = SpyTransport::new();
    let sink = BufferedMetricSink::builder(transport)
        .flush_bytes(1024)
        .flush_interval(Duration::from_millis(100))
        .build();
    let client = StatsdClient::from_sink("test", sink);

    client.gauge("gauge", 1i64).unwrap();
    client.count_with_rate("count", 1, 0.999999).try_send().unwrap();
    client.incr("count").unwrap();
    client.decr("count").unwrap();
    client.time("timing", 1).unwrap();
    client.gauge_delta("gauge", 1).unwrap();
    client.gauge_delta("gauge", -1).unwrap();

    // Dropping the client closes the sink, flushing everything buffered.
    drop(client);

    let expected = concat!(
        "test.gauge:1|g\n",
        "test.count:1|c|@0.999999\n",
        "test.count:1|c\n",
        "test.count:-1|c\n",
        "test.timing:1|ms\n",
        "test.gauge:+1|g\n",
        "test.gauge:-1|g",
    );

    let packet = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(expected.as_bytes(), packet.as_slice());
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn test_statsd_client_buffered_spy_sink_split_packets() {
    let (rx, transport) = SpyTransport::new();
    let sink = BufferedMetricSink::builder(transport)
        .flush_bytes(32)
        .flush_interval(Duration::from_secs(100))
        .build();
    let client = StatsdClient::from_sink("test", sink);

    for _ in 0..10 {
        client.incr("some.counter").unwrap();
    }

    drop(client);

    let mut lines = Vec::new();
    while let Ok(packet) = rx.recv_timeout(Duration::from_secs(2)) {
        assert!(packet.len() <= 32, "packet over threshold: {}", packet.len());
        let text = String::from_utf8(packet).unwrap();
        assert!(!text.ends_with('\n'));
        lines.extend(text.lines().map(String::from));
    }

    assert_eq!(vec!["test.some.counter:1|c"; 10], lines);
}

#[ignore]
#[test]
fn test_statsd_client_spy_sink_many_threaded() {
    let (_rx, client) = new_spy_client("tempo");
    run_arc_threaded_test(client, NUM_THREADS, NUM_ITERATIONS);
}

#[ignore]
#[test]
fn test_statsd_client_buffered_spy_sink_many_threaded() {
    let (_rx, client) = new_buffered_spy_client("tempo");
    run_arc_threaded_test(client, NUM_THREADS, NUM_ITERATIONS);
}
