// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::sinks::core::{SinkStats, SocketStats};
use crate::types::{ErrorKind, MetricError, MetricResult};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Trait for the connectionless, unreliable write side of a sink.
///
/// A transport sends a fully assembled packet to a remote endpoint in a
/// single unacknowledged write. There is no framing beyond the packet
/// boundary and no retrying: the payload either goes out or the error is
/// returned to whoever asked for the write.
///
/// Implementations must be safe to share between the caller's thread and
/// the background worker of a buffered sink.
pub trait Transport: Send + Sync {
    /// Send a single packet, returning the number of bytes written.
    fn send(&self, packet: &[u8]) -> io::Result<usize>;

    /// Release any resources held by this transport.
    ///
    /// Transports that have nothing to clean up may rely on the default
    /// implementation which does nothing.
    fn close(&self) -> io::Result<()> {
        Ok(())
    }

    /// Return I/O telemetry like bytes / packets sent or dropped.
    ///
    /// Note that not all transports keep counters and the default
    /// implementation returns zeros.
    fn stats(&self) -> SinkStats {
        SinkStats::default()
    }
}

/// Attempt to convert anything implementing the `ToSocketAddrs` trait
/// into a concrete `SocketAddr` instance, returning an `InvalidInput`
/// error if the address could not be parsed.
// Public portion of the API (the transport constructors) is pass by value
// so there's no point in changing this to be pass by reference yet.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn get_addr<A: ToSocketAddrs>(addr: A) -> MetricResult<SocketAddr> {
    match addr.to_socket_addrs()?.next() {
        Some(addr) => Ok(addr),
        None => Err(MetricError::from((
            ErrorKind::InvalidInput,
            "No socket addresses yielded",
        ))),
    }
}

/// `Transport` implementation that writes each packet as a single UDP
/// datagram to a fixed remote address.
///
/// The socket should already be bound to a local address with any desired
/// configuration applied (blocking vs non-blocking, timeouts, etc.). The
/// remote address is resolved once at construction time.
#[derive(Debug)]
pub struct UdpTransport {
    addr: SocketAddr,
    socket: UdpSocket,
    stats: SocketStats,
}

impl UdpTransport {
    /// Construct a new `UdpTransport` instance sending to the given address.
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed
    pub fn from<A>(to_addr: A, socket: UdpSocket) -> MetricResult<UdpTransport>
    where
        A: ToSocketAddrs,
    {
        let addr = get_addr(to_addr)?;
        let stats = SocketStats::default();
        Ok(UdpTransport { addr, socket, stats })
    }
}

impl Transport for UdpTransport {
    fn send(&self, packet: &[u8]) -> io::Result<usize> {
        self.stats.update(self.socket.send_to(packet, self.addr), packet.len())
    }

    fn stats(&self) -> SinkStats {
        (&self.stats).into()
    }
}

/// `Transport` implementation that discards all packets.
///
/// Useful for benchmarks and for disabling metric delivery entirely.
#[derive(Debug, Clone)]
pub struct NopTransport;

impl Transport for NopTransport {
    fn send(&self, packet: &[u8]) -> io::Result<usize> {
        Ok(packet.len())
    }
}
