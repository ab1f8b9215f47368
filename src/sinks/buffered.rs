// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crossbeam_channel::{bounded, never, select, tick, Receiver, Sender};
use log::{debug, warn};
use std::fmt;
use std::io;
use std::net::{ToSocketAddrs, UdpSocket};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use crate::pool::BufferPool;
use crate::sinks::core::{MetricSink, SinkStats};
use crate::transport::{Transport, UdpTransport};
use crate::types::{ErrorKind, MetricError, MetricResult};

/// Default maximum number of bytes accumulated before a packet is sent.
///
/// Chosen so that the packet fits in a single Ethernet frame after IP and
/// UDP headers. Deployments sending over the public internet should prefer
/// a more conservative 512 bytes.
pub const DEFAULT_FLUSH_BYTES: usize = 1432;

/// Default upper bound on how long a buffered metric waits before being sent.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(300);

// Submissions waiting for the worker beyond this count block the callers.
const QUEUE_SIZE: usize = 8;

/// Implementation of a `MetricSink` that coalesces metrics from many
/// threads into size-bounded packets before sending them.
///
/// Metrics submitted while the sink is running are copied into pooled
/// buffers and handed to a single background worker thread over a bounded
/// channel. The worker appends each metric to an accumulation buffer with
/// a `\n` separator and sends the buffer as one packet whenever adding a
/// metric would exceed the configured byte threshold, whenever the buffer
/// reaches the threshold, or when a flush interval elapses with buffered
/// data. Packets never exceed the threshold except for a single metric
/// that is itself larger than the threshold, which is sent alone.
///
/// Calling `.close()` stops the sink: queued metrics are drained and sent,
/// the underlying transport is closed exactly once, and the result is
/// returned to the caller that triggered shutdown. Submissions after close
/// fail with `ErrorKind::NotRunning` until `.start()` is called again.
/// Dropping the sink closes it.
///
/// Delivery shares the transport's semantics: packets are fire-and-forget
/// and send failures on periodic flushes are logged and discarded.
pub struct BufferedMetricSink {
    transport: Arc<dyn Transport + 'static>,
    pool: Arc<BufferPool>,
    state: RwLock<Option<Handles>>,
    flush_bytes: usize,
    flush_interval: Duration,
}

// Channel halves retained while the worker is running. Present in the
// state lock only between start() and close().
#[derive(Debug)]
struct Handles {
    lines: Sender<Vec<u8>>,
    control: Sender<ControlMessage>,
}

// Requests serviced by the worker outside of the line flow. Each carries
// the sender half of a rendezvous channel for reporting the result.
enum ControlMessage {
    Flush(Sender<io::Result<()>>),
    Shutdown(Sender<io::Result<()>>),
}

impl BufferedMetricSink {
    /// Construct a new `BufferedMetricSink` over the given transport with
    /// a default byte threshold of 1432 and flush interval of 300ms.
    ///
    /// The worker thread is started as part of construction.
    ///
    /// # Example
    ///
    /// ```
    /// use tempo::{BufferedMetricSink, NopTransport};
    ///
    /// let sink = BufferedMetricSink::from(NopTransport);
    /// ```
    pub fn from<T>(transport: T) -> BufferedMetricSink
    where
        T: Transport + 'static,
    {
        Self::builder(transport).build()
    }

    /// Construct a new `BufferedMetricSink` sending UDP packets to the
    /// given address, with a default byte threshold of 1432 and flush
    /// interval of 300ms.
    ///
    /// The socket should already be bound to a local address with any
    /// desired configuration applied (blocking vs non-blocking, timeouts,
    /// etc.).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::net::UdpSocket;
    /// use tempo::{BufferedMetricSink, DEFAULT_PORT};
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// let host = ("metrics.example.com", DEFAULT_PORT);
    /// let sink = BufferedMetricSink::udp(host, socket);
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed
    pub fn udp<A>(to_addr: A, socket: UdpSocket) -> MetricResult<BufferedMetricSink>
    where
        A: ToSocketAddrs,
    {
        Ok(Self::builder(UdpTransport::from(to_addr, socket)?).build())
    }

    /// Creates a `BufferedMetricSinkBuilder` to configure a
    /// `BufferedMetricSink` with a custom byte threshold or flush interval.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::net::UdpSocket;
    /// use std::time::Duration;
    /// use tempo::{BufferedMetricSink, UdpTransport, DEFAULT_PORT};
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// let transport = UdpTransport::from(("metrics.example.com", DEFAULT_PORT), socket).unwrap();
    /// let sink = BufferedMetricSink::builder(transport)
    ///     .flush_bytes(512)
    ///     .flush_interval(Duration::from_millis(100))
    ///     .build();
    /// ```
    pub fn builder<T>(transport: T) -> BufferedMetricSinkBuilder
    where
        T: Transport + 'static,
    {
        BufferedMetricSinkBuilder::new(transport)
    }

    /// Start the background worker if it is not already running.
    ///
    /// Called automatically when the sink is built. Only needed by callers
    /// that want to resume sending after a `.close()`.
    pub fn start(&self) {
        let mut state = self.state.write().unwrap();
        if state.is_some() {
            return;
        }

        let (lines_tx, lines_rx) = bounded(QUEUE_SIZE);
        let (control_tx, control_rx) = bounded(0);

        let worker = Worker {
            lines: lines_rx,
            control: control_rx,
            transport: Arc::clone(&self.transport),
            pool: Arc::clone(&self.pool),
            buffer: Vec::with_capacity(self.flush_bytes),
            flush_bytes: self.flush_bytes,
        };

        let interval = self.flush_interval;
        thread::spawn(move || worker.run(interval));

        *state = Some(Handles {
            lines: lines_tx,
            control: control_tx,
        });
    }

    /// Submit a single metric line for eventual transmission, returning
    /// the number of bytes accepted.
    ///
    /// The line must not contain a newline; the sink adds the separator
    /// itself. The line is copied before this method returns so the caller
    /// is free to reuse its memory. When the worker's inbound queue is
    /// full this method blocks until space is available.
    ///
    /// # Failures
    ///
    /// Returns an `ErrorKind::NotRunning` error if the sink has been
    /// closed and not restarted. The metric was not accepted and the
    /// caller may retry after calling `.start()`.
    pub fn send(&self, line: &[u8]) -> MetricResult<usize> {
        let state = self.state.read().unwrap();
        let handles = state
            .as_ref()
            .ok_or_else(|| MetricError::from((ErrorKind::NotRunning, "sender is not running")))?;

        let mut buf = self.pool.acquire();
        buf.extend_from_slice(line);
        handles
            .lines
            .send(buf)
            .map_err(|_| MetricError::from((ErrorKind::NotRunning, "sender is not running")))?;
        Ok(line.len())
    }

    /// Stop the sink, blocking until all accepted metrics have been sent
    /// and the underlying transport has been closed.
    ///
    /// Exactly one call performs the shutdown: queued metrics are drained
    /// into packets under the usual threshold rule, the accumulation
    /// buffer is flushed a final time, and the transport is closed. If
    /// both the final flush and the transport close fail, the close error
    /// is the one returned.
    ///
    /// Closing an already closed sink does nothing and returns `Ok(())`.
    /// Concurrent callers serialize; the one that triggered shutdown
    /// receives the worker's result.
    pub fn close(&self) -> MetricResult<()> {
        let mut state = self.state.write().unwrap();
        let handles = match state.take() {
            Some(handles) => handles,
            None => return Ok(()),
        };

        let (tx, rx) = bounded(0);
        if handles.control.send(ControlMessage::Shutdown(tx)).is_err() {
            return Ok(());
        }

        match rx.recv() {
            Ok(res) => Ok(res?),
            Err(_) => Ok(()),
        }
    }

    // Push queued metrics and the accumulation buffer out through the
    // worker without stopping it.
    fn request_flush(&self) -> io::Result<()> {
        let state = self.state.read().unwrap();
        let handles = match state.as_ref() {
            Some(handles) => handles,
            None => return Ok(()),
        };

        let (tx, rx) = bounded(0);
        if handles.control.send(ControlMessage::Flush(tx)).is_err() {
            return Ok(());
        }

        rx.recv().unwrap_or(Ok(()))
    }
}

impl MetricSink for BufferedMetricSink {
    fn emit(&self, metric: &str) -> io::Result<usize> {
        Ok(self.send(metric.as_bytes())?)
    }

    fn flush(&self) -> io::Result<()> {
        self.request_flush()
    }

    fn stats(&self) -> SinkStats {
        self.transport.stats()
    }
}

impl Drop for BufferedMetricSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("error closing buffered metric sink during drop: {}", e);
        }
    }
}

impl fmt::Debug for BufferedMetricSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedMetricSink")
            .field("flush_bytes", &self.flush_bytes)
            .field("flush_interval", &self.flush_interval)
            .field("running", &self.state.read().unwrap().is_some())
            .finish()
    }
}

/// Builder for configuring and starting a `BufferedMetricSink`.
#[must_use]
pub struct BufferedMetricSinkBuilder {
    transport: Arc<dyn Transport + 'static>,
    flush_bytes: usize,
    flush_interval: Duration,
}

impl BufferedMetricSinkBuilder {
    fn new<T>(transport: T) -> BufferedMetricSinkBuilder
    where
        T: Transport + 'static,
    {
        BufferedMetricSinkBuilder {
            transport: Arc::new(transport),
            flush_bytes: DEFAULT_FLUSH_BYTES,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }

    /// Set the maximum packet size in bytes.
    ///
    /// The accumulation buffer is flushed before appending a metric that
    /// would push it past this threshold and immediately after reaching
    /// it. A zero threshold is replaced with the 1432 byte default. For
    /// guidance on sizing see the
    /// [Statsd docs](https://github.com/etsy/statsd/blob/master/docs/metric_types.md#multi-metric-packets).
    pub fn flush_bytes(self, bytes: usize) -> Self {
        Self {
            flush_bytes: bytes,
            ..self
        }
    }

    /// Set the maximum interval a buffered metric waits before being sent.
    ///
    /// Note that this is an upper bound: applications emitting metrics at
    /// a high volume will send more often as packets fill. A zero interval
    /// is replaced with the 300ms default.
    pub fn flush_interval(self, interval: Duration) -> Self {
        Self {
            flush_interval: interval,
            ..self
        }
    }

    /// Returns a running `BufferedMetricSink` using this configuration.
    pub fn build(self) -> BufferedMetricSink {
        let flush_interval = if self.flush_interval.is_zero() {
            DEFAULT_FLUSH_INTERVAL
        } else {
            self.flush_interval
        };

        let flush_bytes = if self.flush_bytes == 0 {
            DEFAULT_FLUSH_BYTES
        } else {
            self.flush_bytes
        };

        let sink = BufferedMetricSink {
            transport: self.transport,
            pool: Arc::new(BufferPool::new()),
            state: RwLock::new(None),
            flush_bytes,
            flush_interval,
        };

        sink.start();
        sink
    }
}

// State owned by the background thread: the accumulation buffer plus the
// receiving halves of the line and control channels.
struct Worker {
    lines: Receiver<Vec<u8>>,
    control: Receiver<ControlMessage>,
    transport: Arc<dyn Transport + 'static>,
    pool: Arc<BufferPool>,
    buffer: Vec<u8>,
    flush_bytes: usize,
}

impl Worker {
    fn run(mut self, interval: Duration) {
        let ticker = tick(interval);
        let control = self.control.clone();
        let mut inbound = self.lines.clone();

        loop {
            select! {
                recv(ticker) -> _ => {
                    if !self.buffer.is_empty() {
                        if let Err(e) = self.flush() {
                            warn!("periodic flush of metric buffer failed: {}", e);
                        }
                    }
                }
                recv(inbound) -> msg => match msg {
                    Ok(line) => {
                        if let Err(e) = self.append(line) {
                            warn!("flush of full metric buffer failed: {}", e);
                        }
                    }
                    // All senders gone without a shutdown request. Stop
                    // selecting on the disconnected channel so the loop
                    // doesn't spin while waiting for control traffic.
                    Err(_) => {
                        inbound = never();
                    }
                },
                recv(control) -> msg => match msg {
                    Ok(ControlMessage::Flush(reply)) => {
                        let res = self.drain();
                        let _ = reply.send(res);
                    }
                    Ok(ControlMessage::Shutdown(reply)) => {
                        let flush_res = self.drain();
                        let close_res = self.transport.close();
                        let res = match close_res {
                            Err(e) => Err(e),
                            Ok(()) => flush_res,
                        };

                        debug!("buffered metric sink worker stopping");
                        let _ = reply.send(res);
                        return;
                    }
                    Err(_) => {
                        return;
                    }
                },
            }
        }
    }

    // Append a single line to the accumulation buffer, flushing before
    // the append if the line wouldn't fit and after it if the buffer
    // reached the threshold. The line's memory goes back to the pool.
    fn append(&mut self, line: Vec<u8>) -> io::Result<()> {
        let mut res = Ok(());
        if self.buffer.len() + line.len() + 1 > self.flush_bytes {
            res = self.flush();
        }

        self.buffer.extend_from_slice(&line);
        self.buffer.push(b'\n');
        self.pool.release(line);

        if self.buffer.len() >= self.flush_bytes {
            let full = self.flush();
            if res.is_ok() {
                res = full;
            }
        }

        res
    }

    // Consume everything queued on the line channel and flush whatever
    // ends up buffered, returning the final flush result.
    fn drain(&mut self) -> io::Result<()> {
        while let Ok(line) = self.lines.try_recv() {
            if let Err(e) = self.append(line) {
                warn!("flush of full metric buffer failed: {}", e);
            }
        }

        self.flush()
    }

    // Send the buffer as a single packet, minus the trailing newline.
    // The buffer is cleared whether or not the send succeeded.
    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        if self.buffer.ends_with(b"\n") {
            self.buffer.pop();
        }

        let res = self.transport.send(&self.buffer).map(|_| ());
        self.buffer.clear();
        res
    }
}

#[cfg(test)]
mod tests {
    use super::{BufferedMetricSink, MetricSink, Transport};
    use crate::types::ErrorKind;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    #[derive(Debug, Clone, Default)]
    struct MockTransport {
        packets: Arc<Mutex<Vec<Vec<u8>>>>,
        closed: Arc<AtomicUsize>,
    }

    impl MockTransport {
        fn packets(&self) -> Vec<Vec<u8>> {
            self.packets.lock().unwrap().clone()
        }

        fn close_count(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }
    }

    impl Transport for MockTransport {
        fn send(&self, packet: &[u8]) -> io::Result<usize> {
            self.packets.lock().unwrap().push(packet.to_vec());
            Ok(packet.len())
        }

        fn close(&self) -> io::Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_send_and_close_flushes_residual() {
        let transport = MockTransport::default();
        let sink = BufferedMetricSink::builder(transport.clone())
            .flush_bytes(1024)
            .flush_interval(Duration::from_secs(10))
            .build();

        assert_eq!(7, sink.send(b"foo:1|c").unwrap());
        sink.close().unwrap();

        assert_eq!(vec![b"foo:1|c".to_vec()], transport.packets());
    }

    #[test]
    fn test_metrics_share_packets_newline_separated() {
        let transport = MockTransport::default();
        let sink = BufferedMetricSink::builder(transport.clone())
            .flush_bytes(1024)
            .flush_interval(Duration::from_secs(10))
            .build();

        sink.send(b"foo:54|c").unwrap();
        sink.send(b"foo:67|c").unwrap();
        sink.close().unwrap();

        assert_eq!(vec![b"foo:54|c\nfoo:67|c".to_vec()], transport.packets());
    }

    #[test]
    fn test_flush_before_threshold_overflow() {
        let transport = MockTransport::default();
        let sink = BufferedMetricSink::builder(transport.clone())
            .flush_bytes(16)
            .flush_interval(Duration::from_secs(10))
            .build();

        // Second line would push the buffer past 16 bytes so the first
        // goes out alone before the second is appended.
        sink.send(b"aaaa:1|c").unwrap();
        sink.send(b"bbbb:1|c").unwrap();
        sink.close().unwrap();

        let packets = transport.packets();
        assert_eq!(2, packets.len());
        assert_eq!(b"aaaa:1|c".to_vec(), packets[0]);
        assert_eq!(b"bbbb:1|c".to_vec(), packets[1]);
    }

    #[test]
    fn test_zero_flush_bytes_uses_default() {
        let transport = MockTransport::default();
        let sink = BufferedMetricSink::builder(transport.clone())
            .flush_bytes(0)
            .flush_interval(Duration::from_secs(10))
            .build();

        // Under the defaulted 1432 byte threshold both lines coalesce
        // into a single packet instead of going out one per line.
        sink.send(b"foo:1|c").unwrap();
        sink.send(b"bar:2|c").unwrap();
        sink.close().unwrap();

        assert_eq!(vec![b"foo:1|c\nbar:2|c".to_vec()], transport.packets());
    }

    #[test]
    fn test_oversized_line_sent_alone() {
        let transport = MockTransport::default();
        let sink = BufferedMetricSink::builder(transport.clone())
            .flush_bytes(16)
            .flush_interval(Duration::from_secs(10))
            .build();

        let line = b"a.very.long.counter.name.indeed:1|c";
        sink.send(line).unwrap();
        sink.close().unwrap();

        assert_eq!(vec![line.to_vec()], transport.packets());
    }

    #[test]
    fn test_periodic_flush_without_close() {
        let transport = MockTransport::default();
        let sink = BufferedMetricSink::builder(transport.clone())
            .flush_bytes(1024)
            .flush_interval(Duration::from_millis(10))
            .build();

        sink.send(b"foo:1|c").unwrap();

        // Wait out a few timer ticks rather than closing the sink.
        thread::sleep(Duration::from_millis(100));
        assert_eq!(vec![b"foo:1|c".to_vec()], transport.packets());

        sink.close().unwrap();
    }

    #[test]
    fn test_flush_method_pushes_queued_metrics() {
        let transport = MockTransport::default();
        let sink = BufferedMetricSink::builder(transport.clone())
            .flush_bytes(1024)
            .flush_interval(Duration::from_secs(10))
            .build();

        sink.emit("foo:1|c").unwrap();
        sink.flush().unwrap();

        assert_eq!(vec![b"foo:1|c".to_vec()], transport.packets());
        sink.close().unwrap();
    }

    #[test]
    fn test_send_after_close_not_running() {
        let transport = MockTransport::default();
        let sink = BufferedMetricSink::from(transport);

        sink.close().unwrap();
        let err = sink.send(b"foo:1|c").unwrap_err();
        assert_eq!(ErrorKind::NotRunning, err.kind());
    }

    #[test]
    fn test_close_idempotent_transport_closed_once() {
        let transport = MockTransport::default();
        let sink = BufferedMetricSink::from(transport.clone());

        sink.close().unwrap();
        sink.close().unwrap();
        assert_eq!(1, transport.close_count());
    }

    #[test]
    fn test_close_concurrent_transport_closed_once() {
        let transport = MockTransport::default();
        let sink = Arc::new(BufferedMetricSink::from(transport.clone()));

        let threads: Vec<_> = (0..10)
            .map(|_| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || sink.close().unwrap())
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(1, transport.close_count());
    }

    #[test]
    fn test_restart_after_close() {
        let transport = MockTransport::default();
        let sink = BufferedMetricSink::builder(transport.clone())
            .flush_bytes(1024)
            .flush_interval(Duration::from_secs(10))
            .build();

        sink.send(b"foo:1|c").unwrap();
        sink.close().unwrap();

        sink.start();
        sink.send(b"bar:2|c").unwrap();
        sink.close().unwrap();

        let packets = transport.packets();
        assert_eq!(vec![b"foo:1|c".to_vec(), b"bar:2|c".to_vec()], packets);
        assert_eq!(2, transport.close_count());
    }

    #[test]
    fn test_drop_closes_sink() {
        let transport = MockTransport::default();
        {
            let sink = BufferedMetricSink::builder(transport.clone())
                .flush_bytes(1024)
                .flush_interval(Duration::from_secs(10))
                .build();
            sink.send(b"foo:1|c").unwrap();
        }

        assert_eq!(vec![b"foo:1|c".to_vec()], transport.packets());
        assert_eq!(1, transport.close_count());
    }

    #[test]
    fn test_close_reports_send_error() {
        #[derive(Clone)]
        struct FailingTransport;

        impl Transport for FailingTransport {
            fn send(&self, _packet: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "send failed"))
            }
        }

        let sink = BufferedMetricSink::builder(FailingTransport)
            .flush_bytes(1024)
            .flush_interval(Duration::from_secs(10))
            .build();

        sink.send(b"foo:1|c").unwrap();
        let err = sink.close().unwrap_err();
        assert_eq!(ErrorKind::IoError, err.kind());
    }

    #[test]
    fn test_close_error_wins_over_flush_error() {
        #[derive(Clone)]
        struct BrokenTransport;

        impl Transport for BrokenTransport {
            fn send(&self, _packet: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "send failed"))
            }

            fn close(&self) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::Other, "close failed"))
            }
        }

        let sink = BufferedMetricSink::builder(BrokenTransport)
            .flush_bytes(1024)
            .flush_interval(Duration::from_secs(10))
            .build();

        sink.send(b"foo:1|c").unwrap();
        let err = sink.close().unwrap_err();
        assert_eq!("close failed", format!("{}", err));
    }

    #[test]
    fn test_concurrent_senders() {
        let transport = MockTransport::default();
        let sink = Arc::new(
            BufferedMetricSink::builder(transport.clone())
                .flush_bytes(64)
                .flush_interval(Duration::from_secs(10))
                .build(),
        );

        let threads: Vec<_> = (0..4)
            .map(|i| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for j in 0..50 {
                        let line = format!("t{}.counter{}:1|c", i, j);
                        sink.send(line.as_bytes()).unwrap();
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }

        sink.close().unwrap();

        let mut lines = Vec::new();
        for packet in transport.packets() {
            assert!(packet.len() <= 64);
            for line in packet.split(|b| *b == b'\n') {
                lines.push(String::from_utf8(line.to_vec()).unwrap());
            }
        }

        assert_eq!(200, lines.len());
        for i in 0..4 {
            for j in 0..50 {
                let expected = format!("t{}.counter{}:1|c", i, j);
                assert!(lines.contains(&expected), "missing {}", expected);
            }
        }
    }
}
