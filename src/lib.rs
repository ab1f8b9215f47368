// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A buffering Statsd client for Rust!
//!
//! Tempo is a fast way to emit Statsd metrics from your application without
//! getting in its way. Metrics are formatted in the thread of the caller and
//! handed to a background worker that coalesces them into size-bounded UDP
//! packets, flushed on a byte threshold or a timer.
//!
//! ## Features
//!
//! * Support for emitting counters, timers, gauges, gauge deltas, sets, and
//!   raw preformatted values to Statsd over UDP.
//! * A buffered, batching sink that packs many metrics into each packet on a
//!   background thread, with a clean-shutdown guarantee: metrics accepted
//!   before `.close()` are sent before it returns.
//! * Per-metric sample rates for high-volume call sites.
//! * Support for alternate backends via the `MetricSink` trait.
//! * A simple yet flexible API for sending metrics.
//!
//! ## Install
//!
//! To make use of `tempo` in your project, add it as a dependency in your
//! `Cargo.toml` file.
//!
//! ```toml
//! [dependencies]
//! tempo = "x.y.z"
//! ```
//!
//! That's all you need!
//!
//! ## Usage
//!
//! Some examples of how to use Tempo are shown below. The examples start
//! simple and work up to how you should be using Tempo in a production
//! application.
//!
//! ### Simple Use
//!
//! Simple usage of Tempo is shown below. In this example, we just import
//! the client, create an instance that will write to some imaginary metrics
//! server, and send a few metrics.
//!
//! ```rust,no_run
//! use std::net::UdpSocket;
//! use tempo::prelude::*;
//! use tempo::{StatsdClient, UdpMetricSink, DEFAULT_PORT};
//!
//! // Create client that will write to the given host over UDP.
//! //
//! // Note that you'll probably want to actually handle any errors creating
//! // the client when you use it for real in your application. We're just
//! // using .unwrap() here since this is an example!
//! let host = ("metrics.example.com", DEFAULT_PORT);
//! let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
//! let sink = UdpMetricSink::from(host, socket).unwrap();
//! let client = StatsdClient::from_sink("my.metrics", sink);
//!
//! // Emit metrics!
//! client.incr("some.counter");
//! client.time("some.methodCall", 42);
//! client.gauge("some.thing", 7i64);
//! client.set("some.value", 5);
//! ```
//!
//! ### Buffered Sink
//!
//! While sending a metric over UDP is very fast, the overhead of frequent
//! network calls can start to add up. This is especially true if you are
//! writing a high performance application that emits a lot of metrics.
//!
//! To make sure that metrics aren't interfering with the performance of
//! your application, you'll want to use the `BufferedMetricSink`. It hands
//! each metric to a background worker thread that packs as many metrics as
//! fit into each UDP packet, flushing when a packet fills or when a timer
//! fires so that metrics never sit in the buffer for long. This is the
//! preferred way to use Tempo in production.
//!
//! ```rust,no_run
//! use std::net::UdpSocket;
//! use tempo::prelude::*;
//! use tempo::{StatsdClient, BufferedMetricSink, DEFAULT_PORT};
//!
//! let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
//!
//! let host = ("metrics.example.com", DEFAULT_PORT);
//! let sink = BufferedMetricSink::udp(host, socket).unwrap();
//! let client = StatsdClient::from_sink("my.prefix", sink);
//!
//! client.count("my.counter.thing", 29);
//! client.time("my.service.call", 214);
//! client.incr("some.event");
//! ```
//!
//! The buffer size and flush interval can be customized via the sink's
//! builder. The defaults, a 1432 byte threshold and a 300 millisecond
//! interval, suit applications emitting metrics on a local network. Use a
//! smaller threshold such as 512 bytes when packets cross the public
//! internet.
//!
//! ```rust,no_run
//! use std::net::UdpSocket;
//! use std::time::Duration;
//! use tempo::{BufferedMetricSink, UdpTransport, DEFAULT_PORT};
//!
//! let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
//! let host = ("metrics.example.com", DEFAULT_PORT);
//! let transport = UdpTransport::from(host, socket).unwrap();
//!
//! let sink = BufferedMetricSink::builder(transport)
//!     .flush_bytes(512)
//!     .flush_interval(Duration::from_millis(100))
//!     .build();
//! ```
//!
//! Submissions block only while the worker's small inbound queue is full,
//! which bounds how far behind a slow network can push your application.
//! When the sink is closed, all accepted metrics are flushed before the
//! close call returns.
//!
//! ### Sample Rates
//!
//! Metrics emitted from very hot paths can be sampled: only the given
//! fraction of submissions are sent over the network, carrying an `|@rate`
//! marker so the server scales them back up.
//!
//! ```rust,no_run
//! use tempo::prelude::*;
//! use tempo::{StatsdClient, NopMetricSink};
//!
//! let client = StatsdClient::from_sink("my.prefix", NopMetricSink);
//!
//! // Sent for roughly one in ten calls, as "my.prefix.some.hot.path:1|c|@0.1"
//! client.count_with_rate("some.hot.path", 1, 0.1).send();
//! ```
//!
//! ### Implemented Traits
//!
//! Each of the methods that the Tempo `StatsdClient` struct uses to send
//! metrics are implemented as a trait. There is also a trait that combines
//! all of these other traits. If we want, we can just use one of the trait
//! types to refer to the client instance. This might be useful to you if
//! you'd like to swap out the actual Tempo client with a dummy version
//! when you are unit testing your code or want to abstract away all the
//! implementation details of the client being used behind a trait and
//! pointer.
//!
//! Each of these traits are exported in the prelude module. They are also
//! available in the main module but aren't typically used like that.
//!
//! ```rust,no_run
//! use std::net::UdpSocket;
//! use tempo::prelude::*;
//! use tempo::{StatsdClient, UdpMetricSink, DEFAULT_PORT};
//!
//! pub struct User {
//!     id: u64,
//!     username: String,
//!     email: String
//! }
//!
//!
//! // Here's a simple DAO (Data Access Object) that doesn't do anything but
//! // uses a metric client to keep track of the number of times the
//! // 'getUserById' method gets called.
//! pub struct MyUserDao {
//!     metrics: Box<dyn MetricClient>
//! }
//!
//!
//! impl MyUserDao {
//!     // Create a new instance that will use the StatsdClient
//!     pub fn new<T: MetricClient + 'static>(metrics: T) -> MyUserDao {
//!         MyUserDao { metrics: Box::new(metrics) }
//!     }
//!
//!     /// Get a new user by their ID
//!     pub fn get_user_by_id(&self, id: u64) -> Option<User> {
//!         self.metrics.incr("getUserById");
//!         None
//!     }
//! }
//!
//!
//! // Create a new Statsd client that writes to "metrics.example.com"
//! let host = ("metrics.example.com", DEFAULT_PORT);
//! let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
//! let sink = UdpMetricSink::from(host, socket).unwrap();
//! let metrics = StatsdClient::from_sink("counter.example", sink);
//!
//! // Create a new instance of the DAO that will use the client
//! let dao = MyUserDao::new(metrics);
//!
//! // Try to lookup a user by ID!
//! match dao.get_user_by_id(123) {
//!     Some(u) => println!("Found a user!"),
//!     None => println!("No user!")
//! };
//! ```
//!
//! ### Quiet Metric Sending and Error Handling
//!
//! When sending metrics sometimes you don't really care about the `Result` of
//! trying to send it or maybe you just don't want to deal with it inline with
//! the rest of your code. In order to handle this, Tempo allows you to set a
//! default error handler. This handler is invoked when there are errors sending
//! metrics so that the calling code doesn't have to deal with them.
//!
//! An example of configuring an error handler and an example of when it might
//! be invoked is given below.
//!
//! ```rust,no_run
//! use tempo::prelude::*;
//! use tempo::{MetricError, StatsdClient, NopMetricSink};
//!
//! fn my_error_handler(err: MetricError) {
//!     println!("Metric error! {}", err);
//! }
//!
//! let client = StatsdClient::builder("prefix", NopMetricSink)
//!     .with_error_handler(my_error_handler)
//!     .build();
//!
//! // When sending metrics via the `MetricBuilder` used for applying sample
//! // rates, callers may opt into sending metrics quietly via the `.send()`
//! // method as opposed to the `.try_send()` method
//! client.count_with_rate("some.counter", 42, 0.5).send();
//! ```
//!
//! ### Custom Metric Sinks
//!
//! The Tempo `StatsdClient` uses implementations of the `MetricSink`
//! trait to send metrics to a metric server. Most users of the Tempo
//! library probably want to use the `BufferedMetricSink`.
//!
//! However, maybe you want to do something not covered by an existing sink.
//! An example of creating a custom sink is below.
//!
//! ```rust,no_run
//! use std::io;
//! use tempo::prelude::*;
//! use tempo::{StatsdClient, MetricSink, DEFAULT_PORT};
//!
//! pub struct MyMetricSink;
//!
//!
//! impl MetricSink for MyMetricSink {
//!     fn emit(&self, metric: &str) -> io::Result<usize> {
//!         // Your custom metric sink implementation goes here!
//!         Ok(0)
//!     }
//! }
//!
//!
//! let sink = MyMetricSink;
//! let client = StatsdClient::from_sink("my.prefix", sink);
//!
//! client.count("my.counter.thing", 42);
//! client.time("my.method.time", 25);
//! client.incr("some.other.counter");
//! ```
//!
//! ### Custom UDP Socket
//!
//! Most users of the Tempo `StatsdClient` will be using it to send metrics
//! over a UDP socket. If you need to customize the socket, for example you
//! want to use the socket in blocking mode but set a write timeout, you can
//! do that as demonstrated below.
//!
//! ```rust,no_run
//! use std::net::UdpSocket;
//! use std::time::Duration;
//! use tempo::prelude::*;
//! use tempo::{StatsdClient, UdpMetricSink, DEFAULT_PORT};
//!
//! let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
//! socket.set_write_timeout(Some(Duration::from_millis(1))).unwrap();
//!
//! let host = ("metrics.example.com", DEFAULT_PORT);
//! let sink = UdpMetricSink::from(host, socket).unwrap();
//! let client = StatsdClient::from_sink("my.prefix", sink);
//!
//! client.count("my.counter.thing", 29);
//! client.time("my.service.call", 214);
//! client.incr("some.event");
//! client.set("users.uniques", 42);
//! ```

#![forbid(unsafe_code)]

pub const DEFAULT_PORT: u16 = 8125;

pub use self::builder::MetricBuilder;

pub use self::client::{
    Counted, CountedExt, Gauged, MetricClient, Rawed, Setted, StatsdClient, StatsdClientBuilder, Timed,
};

pub use self::pool::BufferPool;

pub use self::sinks::{
    BufferedMetricSink, BufferedMetricSinkBuilder, MetricSink, NopMetricSink, SinkStats, SocketStats, SpyMetricSink,
    SpyTransport, UdpMetricSink, DEFAULT_FLUSH_BYTES, DEFAULT_FLUSH_INTERVAL,
};

pub use self::transport::{NopTransport, Transport, UdpTransport};

pub use self::types::{Counter, ErrorKind, Gauge, Metric, MetricError, MetricResult, Raw, Set, Timer};

mod builder;
mod client;
pub mod ext;
mod pool;
pub mod prelude;
mod sinks;
mod transport;
mod types;

mod sealed {
    pub trait Sealed {}
}
