// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::{MetricBuilder, MetricFormatter, MetricValue};
use crate::sealed::Sealed;
use crate::sinks::MetricSink;
use crate::types::{Counter, ErrorKind, Gauge, Metric, MetricError, MetricResult, Raw, Set, Timer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Conversion trait for valid values for counters
///
/// This trait must be implemented for any types that are used as counter
/// values (currently only `i64`). This trait is internal to how values are
/// formatted as part of metrics but is exposed publicly for documentation
/// purposes.
///
/// Typical use of Tempo shouldn't require interacting with this trait.
pub trait ToCounterValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToCounterValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Signed(self))
    }
}

/// Conversion trait for valid values for timers
///
/// This trait must be implemented for any types that are used as timer
/// values (currently `u64` and `Duration`). This trait is internal to how
/// values are formatted as part of metrics but is exposed publicly for
/// documentation purposes.
///
/// Typical use of Tempo shouldn't require interacting with this trait.
pub trait ToTimerValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToTimerValue for u64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Unsigned(self))
    }
}

impl ToTimerValue for Duration {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        // sub-millisecond timings keep their fractional part
        Ok(MetricValue::Float(self.as_secs_f64() * 1000.0))
    }
}

/// Conversion trait for valid values for gauges
///
/// This trait must be implemented for any types that are used as gauge
/// values (currently `i64` and `f64`). Only `i64` values may be used as
/// gauge deltas. This trait is internal to how values are formatted as
/// part of metrics but is exposed publicly for documentation purposes.
///
/// Note that there is intentionally a single integer impl: a second one
/// would leave the value type of bare integer literals ambiguous at every
/// call site.
///
/// Typical use of Tempo shouldn't require interacting with this trait.
pub trait ToGaugeValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;

    fn try_to_delta(self) -> MetricResult<MetricValue>
    where
        Self: Sized,
    {
        Err(MetricError::from((
            ErrorKind::InvalidInput,
            "Gauge deltas require signed values",
        )))
    }
}

impl ToGaugeValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Signed(self))
    }

    fn try_to_delta(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Delta(self))
    }
}

impl ToGaugeValue for f64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Float(self))
    }
}

/// Conversion trait for valid values for sets
///
/// This trait must be implemented for any types that are used as set
/// values (currently `i64` and `&str`). This trait is internal to how
/// values are formatted as part of metrics but is exposed publicly for
/// documentation purposes.
///
/// Typical use of Tempo shouldn't require interacting with this trait.
pub trait ToSetValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToSetValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Signed(self))
    }
}

impl ToSetValue for &str {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Text(self.to_string()))
    }
}

/// Trait for incrementing and decrementing counters.
///
/// Counters are simple values incremented or decremented by a client. The
/// rates at which these events occur or average values will be determined
/// by the server receiving them. Examples of counter uses include number
/// of logins to a system or requests received.
///
/// The following types are valid for counters:
/// * `i64`
///
/// See the [Statsd spec](https://github.com/b/statsd_spec) for more
/// information.
pub trait Counted<T>
where
    T: ToCounterValue,
{
    /// Increment or decrement the counter by the given amount
    fn count(&self, key: &str, count: T) -> MetricResult<Counter> {
        self.count_with_rate(key, count, 1.0).try_send()
    }

    /// Increment or decrement the counter by the given amount and return
    /// a `MetricBuilder` holding the given sample rate.
    fn count_with_rate<'a>(&'a self, key: &'a str, count: T, rate: f32) -> MetricBuilder<'_, '_, Counter>;
}

/// Trait for convenience methods for counters
///
/// This trait specifically implements increment and decrement convenience
/// methods for counters with `i64` types.
pub trait CountedExt: Counted<i64> {
    /// Increment the counter by 1
    fn incr(&self, key: &str) -> MetricResult<Counter> {
        self.incr_with_rate(key, 1.0).try_send()
    }

    /// Increment the counter by 1 and return a `MetricBuilder` holding
    /// the given sample rate.
    fn incr_with_rate<'a>(&'a self, key: &'a str, rate: f32) -> MetricBuilder<'_, '_, Counter> {
        self.count_with_rate(key, 1, rate)
    }

    /// Decrement the counter by 1
    fn decr(&self, key: &str) -> MetricResult<Counter> {
        self.decr_with_rate(key, 1.0).try_send()
    }

    /// Decrement the counter by 1 and return a `MetricBuilder` holding
    /// the given sample rate.
    fn decr_with_rate<'a>(&'a self, key: &'a str, rate: f32) -> MetricBuilder<'_, '_, Counter> {
        self.count_with_rate(key, -1, rate)
    }
}

/// Trait for recording timings in milliseconds.
///
/// Timings are a positive number of milliseconds between a start and end
/// time. Examples include time taken to render a web page or time taken
/// for a database call to return. `Duration` values are converted to
/// milliseconds, keeping any fractional part, before being recorded.
///
/// The following types are valid for timers:
/// * `u64`
/// * `Duration`
///
/// See the [Statsd spec](https://github.com/b/statsd_spec) for more
/// information.
pub trait Timed<T>
where
    T: ToTimerValue,
{
    /// Record a timing in milliseconds with the given key
    fn time(&self, key: &str, time: T) -> MetricResult<Timer> {
        self.time_with_rate(key, time, 1.0).try_send()
    }

    /// Record a timing in milliseconds with the given key and return a
    /// `MetricBuilder` holding the given sample rate.
    fn time_with_rate<'a>(&'a self, key: &'a str, time: T, rate: f32) -> MetricBuilder<'_, '_, Timer>;
}

/// Trait for recording gauge values.
///
/// Gauge values are an instantaneous measurement of a value determined
/// by the client. They do not change unless changed by the client. Examples
/// include things like load average or how many connections are active.
///
/// Gauges may also be adjusted by a signed delta, emitted with an explicit
/// leading `+` or `-`, which servers apply to the current gauge value.
///
/// The following types are valid for gauges:
/// * `i64`
/// * `f64`
///
/// Only `i64` values are valid for gauge deltas.
///
/// See the [Statsd spec](https://github.com/b/statsd_spec) for more
/// information.
pub trait Gauged<T>
where
    T: ToGaugeValue,
{
    /// Record a gauge value with the given key
    fn gauge(&self, key: &str, value: T) -> MetricResult<Gauge> {
        self.gauge_with_rate(key, value, 1.0).try_send()
    }

    /// Record a gauge value with the given key and return a `MetricBuilder`
    /// holding the given sample rate.
    fn gauge_with_rate<'a>(&'a self, key: &'a str, value: T, rate: f32) -> MetricBuilder<'_, '_, Gauge>;

    /// Adjust the gauge by a signed delta with the given key
    fn gauge_delta(&self, key: &str, delta: T) -> MetricResult<Gauge> {
        self.gauge_delta_with_rate(key, delta, 1.0).try_send()
    }

    /// Adjust the gauge by a signed delta with the given key and return a
    /// `MetricBuilder` holding the given sample rate.
    fn gauge_delta_with_rate<'a>(&'a self, key: &'a str, delta: T, rate: f32) -> MetricBuilder<'_, '_, Gauge>;
}

/// Trait for recording set values.
///
/// Sets count the number of unique elements in a group. You can use them to,
/// for example, count the unique visitors to your site.
///
/// The following types are valid for sets:
/// * `i64`
/// * `&str`
///
/// See the [Statsd spec](https://github.com/b/statsd_spec) for more
/// information.
pub trait Setted<T>
where
    T: ToSetValue,
{
    /// Record a single set value with the given key
    fn set(&self, key: &str, value: T) -> MetricResult<Set> {
        self.set_with_rate(key, value, 1.0).try_send()
    }

    /// Record a single set value with the given key and return a
    /// `MetricBuilder` holding the given sample rate.
    fn set_with_rate<'a>(&'a self, key: &'a str, value: T, rate: f32) -> MetricBuilder<'_, '_, Set>;
}

/// Trait for emitting preformatted values.
///
/// Raw metrics are emitted as `key:value` with no type suffix, leaving the
/// interpretation of the value entirely to the server. They are an escape
/// hatch for protocol extensions this library has no typed support for.
pub trait Rawed<T>
where
    T: ToSetValue,
{
    /// Emit a raw value with the given key
    fn raw(&self, key: &str, value: T) -> MetricResult<Raw> {
        self.raw_with_rate(key, value, 1.0).try_send()
    }

    /// Emit a raw value with the given key and return a `MetricBuilder`
    /// holding the given sample rate.
    fn raw_with_rate<'a>(&'a self, key: &'a str, value: T, rate: f32) -> MetricBuilder<'_, '_, Raw>;
}

/// Trait that encompasses all other traits for sending metrics.
///
/// If you wish to use `StatsdClient` with a generic type or place a
/// `StatsdClient` instance behind a pointer (such as a `Box`) this will allow
/// you to reference all the implemented methods for recording metrics, while
/// using a single trait. An example of this is shown below.
///
/// ```
/// use std::time::Duration;
/// use tempo::{MetricClient, StatsdClient, NopMetricSink};
///
/// let client: Box<dyn MetricClient> = Box::new(StatsdClient::from_sink(
///     "prefix", NopMetricSink));
///
/// client.count("some.counter", 1).unwrap();
/// client.time("some.timer", 42).unwrap();
/// client.time("some.timer", Duration::from_millis(42)).unwrap();
/// client.gauge("some.gauge", 8).unwrap();
/// client.gauge_delta("some.gauge", -4).unwrap();
/// client.set("some.set", 5).unwrap();
/// client.set("some.set", "visitor-id").unwrap();
/// client.raw("some.raw", "1|c").unwrap();
/// ```
pub trait MetricClient:
    Counted<i64>
    + CountedExt
    + Timed<u64>
    + Timed<Duration>
    + Gauged<i64>
    + Gauged<f64>
    + Setted<i64>
    + for<'v> Setted<&'v str>
    + for<'v> Rawed<&'v str>
{
}

/// Typically internal client methods for sending metrics and handling errors.
///
/// This trait exposes methods of the client that would normally be internal
/// but may be useful for consumers of the library to extend it in unforseen
/// ways. Most consumers of the library shouldn't need to make use of this
/// extension point.
///
/// NOTE: This is a sealed trait and so it cannot be implemented outside of the
/// library.
///
/// # Example
///
/// ```
/// use tempo::{Metric, MetricResult, StatsdClient, NopMetricSink};
/// use tempo::ext::MetricBackend;
///
/// struct CustomMetric {
///     repr: String,
/// }
///
/// impl Metric for CustomMetric {
///     fn as_metric_str(&self) -> &str {
///         &self.repr
///     }
/// }
///
/// impl From<String> for CustomMetric {
///     fn from(v: String) -> Self {
///         CustomMetric { repr: v }
///     }
/// }
///
/// let client = StatsdClient::from_sink("some.prefix", NopMetricSink);
/// let metric = CustomMetric::from("some.prefix.some.event:123|e".to_string());
/// client.send_metric(&metric).unwrap();
/// ```
pub trait MetricBackend: Sealed {
    /// Send a full formed `Metric` implementation via the underlying `MetricSink`
    ///
    /// Obtain a `&str` representation of a metric, encode it as UTF-8 bytes, and
    /// send it to the underlying `MetricSink`, verbatim. Note that the metric is
    /// expected to be full formed already, including any prefix.
    ///
    /// Note that if you simply want to emit standard metrics, you don't need to
    /// use this method. This is only useful if you are extending Tempo with a
    /// custom metric type or something similar.
    fn send_metric<M>(&self, metric: &M) -> MetricResult<()>
    where
        M: Metric;

    /// Consume a possible error from attempting to send a metric.
    ///
    /// When callers have elected to quietly send metrics via the `MetricBuilder::send()`
    /// method, this method will be invoked if an error is encountered. By default the
    /// handler is a no-op, meaning that errors are discarded.
    fn consume_error(&self, err: MetricError);
}

/// Builder for creating and customizing `StatsdClient` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `StatsdClient` struct.
///
/// # Example
///
/// ```
/// use tempo::prelude::*;
/// use tempo::{MetricError, StatsdClient, NopMetricSink};
///
/// fn my_error_handler(err: MetricError) {
///     println!("Metric error! {}", err);
/// }
///
/// let client = StatsdClient::builder("prefix", NopMetricSink)
///     .with_error_handler(my_error_handler)
///     .build();
///
/// client.count("something", 123);
/// client.count_with_rate("some.counter", 42, 0.5).send();
/// ```
pub struct StatsdClientBuilder {
    prefix: String,
    sink: Arc<dyn MetricSink + Sync + Send>,
    errors: Arc<dyn Fn(MetricError) + Sync + Send>,
}

impl StatsdClientBuilder {
    // Set the required fields and defaults for optional fields
    fn new<T>(prefix: &str, sink: T) -> Self
    where
        T: MetricSink + Sync + Send + 'static,
    {
        StatsdClientBuilder {
            // required
            prefix: Self::formatted_prefix(prefix),
            sink: Arc::new(sink),

            // optional with defaults
            errors: Arc::new(nop_error_handler),
        }
    }

    /// Set an error handler to use for metrics sent via `MetricBuilder::send()`
    ///
    /// The error handler is only invoked when metrics are not able to be sent
    /// correctly. Either due to invalid input, I/O errors encountered when trying
    /// to send them via a `MetricSink`, or some other reason.
    ///
    /// The error handler should consume the error without panicking. The error
    /// may be logged, printed to stderr, discarded, etc. - this is up to the
    /// implementation.
    pub fn with_error_handler<F>(mut self, errors: F) -> Self
    where
        F: Fn(MetricError) + Sync + Send + 'static,
    {
        self.errors = Arc::new(errors);
        self
    }

    /// Construct a new `StatsdClient` instance based on current settings.
    pub fn build(self) -> StatsdClient {
        StatsdClient::from_builder(self)
    }

    fn formatted_prefix(prefix: &str) -> String {
        if prefix.is_empty() {
            String::new()
        } else {
            format!("{}.", prefix.trim_end_matches('.'))
        }
    }
}

/// Client for Statsd that implements various traits to record metrics.
///
/// # Traits
///
/// The client is the main entry point for users of this library. It supports
/// several traits for recording metrics of different types.
///
/// * `Counted` for emitting counters.
/// * `Timed` for emitting timings.
/// * `Gauged` for emitting gauge values and deltas.
/// * `Setted` for emitting set values.
/// * `Rawed` for emitting preformatted values.
/// * `MetricClient` for a combination of all of the above.
///
/// For more information about the uses for each type of metric, see the
/// documentation for each mentioned trait.
///
/// # Sinks
///
/// The client uses some implementation of a `MetricSink` to emit the metrics.
///
/// In simple use cases when performance isn't critical, the `UdpMetricSink`
/// is an acceptable choice since it is the simplest to use and understand.
///
/// When performance is more important, users will want to use the
/// `BufferedMetricSink` which batches metrics into shared packets on a
/// background thread for minimum overhead when sending metrics.
///
/// # Threading
///
/// The `StatsdClient` is designed to work in a multithreaded application. All
/// parts of the client can be shared between threads (i.e. it is `Send` and
/// `Sync`). An example of how to use the client in a multithreaded environment
/// is given below.
///
/// ## Wrapping With An `Arc`
///
/// In order to share a client between multiple threads, you'll need to wrap it
/// with an atomic reference counting pointer (`std::sync::Arc`). You should refer
/// to the client by the trait of all its methods for recording metrics
/// (`MetricClient`) as well as the `Send` and `Sync` traits since the idea is to
/// share this between threads.
///
/// ``` no_run
/// use std::net::UdpSocket;
/// use std::sync::Arc;
/// use std::thread;
/// use tempo::prelude::*;
/// use tempo::{StatsdClient, BufferedMetricSink, DEFAULT_PORT};
///
/// struct MyRequestHandler {
///     metrics: Arc<dyn MetricClient + Send + Sync>,
/// }
///
/// impl MyRequestHandler {
///     fn new() -> MyRequestHandler {
///         let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
///         let host = ("localhost", DEFAULT_PORT);
///         let sink = BufferedMetricSink::udp(host, socket).unwrap();
///         MyRequestHandler {
///             metrics: Arc::new(StatsdClient::from_sink("some.prefix", sink))
///         }
///     }
///
///     fn handle_some_request(&self) -> Result<(), String> {
///         let metric_ref = self.metrics.clone();
///         let _t = thread::spawn(move || {
///             println!("Hello from the thread!");
///             metric_ref.count("request.handler", 1);
///         });
///
///         Ok(())
///     }
/// }
/// ```
pub struct StatsdClient {
    prefix: String,
    sink: Arc<dyn MetricSink + Sync + Send>,
    errors: Arc<dyn Fn(MetricError) + Sync + Send>,
}

impl StatsdClient {
    /// Create a new client instance that will use the given prefix for
    /// all metrics emitted to the given `MetricSink` implementation.
    ///
    /// Note that this client will discard errors encountered when
    /// sending metrics via the `MetricBuilder::send()` method.
    ///
    /// # No-op Example
    ///
    /// ```
    /// use tempo::{StatsdClient, NopMetricSink};
    ///
    /// let prefix = "my.stats";
    /// let client = StatsdClient::from_sink(prefix, NopMetricSink);
    /// ```
    ///
    /// # UDP Socket Example
    ///
    /// ```
    /// use std::net::UdpSocket;
    /// use tempo::{StatsdClient, UdpMetricSink, DEFAULT_PORT};
    ///
    /// let prefix = "my.stats";
    /// let host = ("127.0.0.1", DEFAULT_PORT);
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// socket.set_nonblocking(true).unwrap();
    ///
    /// let sink = UdpMetricSink::from(host, socket).unwrap();
    /// let client = StatsdClient::from_sink(prefix, sink);
    /// ```
    ///
    /// # Buffered UDP Socket Example
    ///
    /// ```
    /// use std::net::UdpSocket;
    /// use tempo::{StatsdClient, BufferedMetricSink, DEFAULT_PORT};
    ///
    /// let prefix = "my.stats";
    /// let host = ("127.0.0.1", DEFAULT_PORT);
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    ///
    /// let sink = BufferedMetricSink::udp(host, socket).unwrap();
    /// let client = StatsdClient::from_sink(prefix, sink);
    /// ```
    pub fn from_sink<T>(prefix: &str, sink: T) -> Self
    where
        T: MetricSink + Sync + Send + 'static,
    {
        Self::builder(prefix, sink).build()
    }

    /// Create a new builder with the provided prefix and metric sink.
    ///
    /// A prefix and a metric sink are required to create a new client
    /// instance. All other optional customizations can be set by calling
    /// methods on the returned builder. Any customizations that aren't
    /// set by the caller will use defaults.
    ///
    /// Note, though a metric prefix is required, you may pass an empty
    /// string as a prefix. In this case, the metrics emitted will use only
    /// the bare keys supplied when you call the various methods to emit
    /// metrics.
    ///
    /// General defaults:
    ///
    /// * A no-op error handler will be used by default. Note that this
    ///   only affects errors encountered when using the `MetricBuilder::send()`
    ///   method (as opposed to `.try_send()` or any other method for sending
    ///   metrics).
    ///
    /// # Example
    ///
    /// ```
    /// use tempo::prelude::*;
    /// use tempo::{StatsdClient, MetricError, NopMetricSink};
    ///
    /// fn my_handler(err: MetricError) {
    ///     println!("Metric error: {}", err);
    /// }
    ///
    /// let client = StatsdClient::builder("some.prefix", NopMetricSink)
    ///     .with_error_handler(my_handler)
    ///     .build();
    ///
    /// client.gauge_with_rate("some.key", 7, 0.5).send();
    /// ```
    pub fn builder<T>(prefix: &str, sink: T) -> StatsdClientBuilder
    where
        T: MetricSink + Sync + Send + 'static,
    {
        StatsdClientBuilder::new(prefix, sink)
    }

    /// Flush the underlying metric sink.
    ///
    /// This is helpful for when you'd like to buffer metrics
    /// but still want strong control over when to emit them.
    /// For example, you are using a `BufferedMetricSink` and
    /// have just emitted some time-sensitive metrics, but you
    /// aren't sure if the buffer is full or not. Thus, you can
    /// use `flush` to force the sink to flush your metrics now.
    ///
    /// # Buffered UDP Socket Example
    ///
    /// ```
    /// use std::net::UdpSocket;
    /// use tempo::prelude::*;
    /// use tempo::{StatsdClient, BufferedMetricSink, DEFAULT_PORT};
    ///
    /// let prefix = "my.stats";
    /// let host = ("127.0.0.1", DEFAULT_PORT);
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    ///
    /// let sink = BufferedMetricSink::udp(host, socket).unwrap();
    /// let client = StatsdClient::from_sink(prefix, sink);
    ///
    /// client.count("time-sensitive.keyA", 1);
    /// client.count("time-sensitive.keyB", 2);
    /// client.count("time-sensitive.keyC", 3);
    /// // Any number of time-sensitive metrics ... //
    /// client.flush();
    /// ```
    pub fn flush(&self) -> MetricResult<()> {
        Ok(self.sink.flush()?)
    }

    /// Create a child client that emits metrics under an extended prefix.
    ///
    /// The child shares the sink and error handler of this client; only
    /// the prefix differs, with the given suffix joined to the parent
    /// prefix by a `.` separator. This is useful for handing a component
    /// its own namespace (`my.app.database`, `my.app.cache`, ...) while
    /// all metrics still flow through one sink and one socket.
    ///
    /// An empty suffix yields a client with the same prefix as the parent.
    ///
    /// # Example
    ///
    /// ```
    /// use tempo::prelude::*;
    /// use tempo::{StatsdClient, NopMetricSink};
    ///
    /// let client = StatsdClient::from_sink("my.app", NopMetricSink);
    /// let db_metrics = client.sub_client("database");
    ///
    /// // Emitted as "my.app.database.queries:1|c"
    /// db_metrics.incr("queries");
    /// ```
    pub fn sub_client(&self, prefix: &str) -> StatsdClient {
        StatsdClient {
            prefix: StatsdClientBuilder::formatted_prefix(&format!("{}{}", self.prefix, prefix)),
            sink: Arc::clone(&self.sink),
            errors: Arc::clone(&self.errors),
        }
    }

    // Create a new StatsdClient by consuming the builder
    fn from_builder(builder: StatsdClientBuilder) -> Self {
        StatsdClient {
            prefix: builder.prefix,
            sink: builder.sink,
            errors: builder.errors,
        }
    }
}

impl Sealed for StatsdClient {}

impl MetricBackend for StatsdClient {
    fn send_metric<M>(&self, metric: &M) -> MetricResult<()>
    where
        M: Metric,
    {
        let metric_string = metric.as_metric_str();
        self.sink.emit(metric_string)?;
        Ok(())
    }

    fn consume_error(&self, err: MetricError) {
        (self.errors)(err);
    }
}

impl fmt::Debug for StatsdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StatsdClient {{ prefix: {:?}, sink: ..., errors: ... }}",
            self.prefix,
        )
    }
}

impl<T> Counted<T> for StatsdClient
where
    T: ToCounterValue,
{
    fn count_with_rate<'a>(&'a self, key: &'a str, value: T, rate: f32) -> MetricBuilder<'_, '_, Counter> {
        match value.try_to_value() {
            Ok(v) => MetricBuilder::from_fmt(MetricFormatter::counter(&self.prefix, key, v), self)
                .with_sample_rate(rate),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }
}

impl CountedExt for StatsdClient {}

impl<T> Timed<T> for StatsdClient
where
    T: ToTimerValue,
{
    fn time_with_rate<'a>(&'a self, key: &'a str, time: T, rate: f32) -> MetricBuilder<'_, '_, Timer> {
        match time.try_to_value() {
            Ok(v) => MetricBuilder::from_fmt(MetricFormatter::timer(&self.prefix, key, v), self).with_sample_rate(rate),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }
}

impl<T> Gauged<T> for StatsdClient
where
    T: ToGaugeValue,
{
    fn gauge_with_rate<'a>(&'a self, key: &'a str, value: T, rate: f32) -> MetricBuilder<'_, '_, Gauge> {
        match value.try_to_value() {
            Ok(v) => MetricBuilder::from_fmt(MetricFormatter::gauge(&self.prefix, key, v), self).with_sample_rate(rate),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }

    fn gauge_delta_with_rate<'a>(&'a self, key: &'a str, delta: T, rate: f32) -> MetricBuilder<'_, '_, Gauge> {
        match delta.try_to_delta() {
            Ok(v) => MetricBuilder::from_fmt(MetricFormatter::gauge(&self.prefix, key, v), self).with_sample_rate(rate),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }
}

impl<T> Setted<T> for StatsdClient
where
    T: ToSetValue,
{
    fn set_with_rate<'a>(&'a self, key: &'a str, value: T, rate: f32) -> MetricBuilder<'_, '_, Set> {
        match value.try_to_value() {
            Ok(v) => MetricBuilder::from_fmt(MetricFormatter::set(&self.prefix, key, v), self).with_sample_rate(rate),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }
}

impl<T> Rawed<T> for StatsdClient
where
    T: ToSetValue,
{
    fn raw_with_rate<'a>(&'a self, key: &'a str, value: T, rate: f32) -> MetricBuilder<'_, '_, Raw> {
        match value.try_to_value() {
            Ok(v) => MetricBuilder::from_fmt(MetricFormatter::raw(&self.prefix, key, v), self).with_sample_rate(rate),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }
}

impl MetricClient for StatsdClient {}

#[allow(clippy::needless_pass_by_value)]
fn nop_error_handler(_err: MetricError) {
    // nothing
}
