// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::sample_rate::SampleRate;
use crate::builder::sampler::Sampler;
use crate::client::{MetricBackend, StatsdClient};
use crate::types::{Metric, MetricError, MetricResult};
use std::fmt::{self, Write};
use std::marker::PhantomData;

pub(crate) mod sample_rate;
pub(crate) mod sampler;

/// Type of metric that knows how to display itself
#[derive(Debug, Clone, Copy)]
enum MetricType {
    Counter,
    Timer,
    Gauge,
    Set,
    Raw,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricType::Counter => "c".fmt(f),
            MetricType::Timer => "ms".fmt(f),
            MetricType::Gauge => "g".fmt(f),
            MetricType::Set => "s".fmt(f),
            // raw metrics carry no type suffix and never display this
            MetricType::Raw => Ok(()),
        }
    }
}

/// Holder for primitive metric values that knows how to display itself
///
/// This struct is internal to how various types that are valid for each type
/// of metric (e.g. types for which `ToCounterValue`, `ToTimerValue`, etc) are
/// implemented but is exposed for documentation purposes and advanced use cases.
///
/// Typical use of Tempo shouldn't require interacting with this type.
#[derive(Debug, Clone)]
pub enum MetricValue {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    /// Signed value emitted with an explicit leading sign, used for
    /// gauge deltas (`+4` or `-4`).
    Delta(i64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricValue::Signed(v) => v.fmt(f),
            MetricValue::Unsigned(v) => v.fmt(f),
            MetricValue::Float(v) => v.fmt(f),
            MetricValue::Delta(v) => {
                if v >= 0 {
                    write!(f, "+{}", v)
                } else {
                    v.fmt(f)
                }
            }
            MetricValue::Text(ref v) => v.fmt(f),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MetricFormatter<'a> {
    prefix: &'a str,
    key: &'a str,
    val: MetricValue,
    type_: MetricType,
    sample_rate: Option<SampleRate>,
    base_size: usize,
}

impl<'a> MetricFormatter<'a> {
    pub(crate) fn counter(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Counter)
    }

    pub(crate) fn timer(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Timer)
    }

    pub(crate) fn gauge(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Gauge)
    }

    pub(crate) fn set(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Set)
    }

    pub(crate) fn raw(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Raw)
    }

    #[rustfmt::skip]
    fn from_val(prefix: &'a str, key: &'a str, val: MetricValue, type_: MetricType) -> Self {
        MetricFormatter {
            prefix,
            key,
            type_,
            val,
            sample_rate: None,
            base_size: prefix.len() + key.len() + 1 /* : */ + 10 /* value */ + 1 /* | */ + 2, /* type */
        }
    }

    pub(crate) fn with_sample_rate(&mut self, rate: SampleRate) {
        self.sample_rate = Some(rate);
    }

    // Draw against the sample rate; metrics without a rate always pass.
    pub(crate) fn sample(&self) -> bool {
        match self.sample_rate {
            None => true,
            Some(ref rate) => Sampler::new_with_rate(rate.value()).sample(()).is_some(),
        }
    }

    fn write_base_metric(&self, out: &mut String) {
        let _ = write!(out, "{}{}:{}", self.prefix, self.key, self.val);
        if !matches!(self.type_, MetricType::Raw) {
            let _ = write!(out, "|{}", self.type_);
        }
    }

    fn write_sample_rate(&self, out: &mut String) {
        if let Some(ref rate) = self.sample_rate {
            if rate.is_applicable() {
                out.push('|');
                out.push_str(rate.as_str());
            }
        }
    }

    fn rate_size_hint(&self) -> usize {
        match self.sample_rate {
            Some(ref rate) if rate.is_applicable() => 1 + rate.as_str().len(),
            _ => 0,
        }
    }

    pub(crate) fn format(&self) -> String {
        let size_hint = self.base_size + self.rate_size_hint();
        let mut metric_string = String::with_capacity(size_hint);
        self.write_base_metric(&mut metric_string);
        self.write_sample_rate(&mut metric_string);
        metric_string
    }
}

/// Internal state of a `MetricBuilder`
///
/// The builder can either be in the process of formatting a metric to send
/// via a client or it can be simply holding on to an error that it will be
/// dealt with when `.try_send()` or `.send()` is finally invoked.
#[derive(Debug)]
enum BuilderRepr<'m, 'c> {
    Success(MetricFormatter<'m>, &'c StatsdClient),
    Error(MetricError, &'c StatsdClient),
}

/// Builder for applying a sample rate to in-progress metrics.
///
/// This builder holds a metric that was previously constructed by a call to
/// a method on `StatsdClient` and sends it when `MetricBuilder::send()` or
/// `MetricBuilder::try_send()` is invoked. Any errors encountered
/// constructing, validating, or sending the metric will be propagated and
/// returned when those methods are finally invoked.
///
/// Metrics with a sample rate below 1.0 are only sent for a matching
/// fraction of submissions; the rendered metric carries an `|@rate` suffix
/// so the server can compensate. A sampled-out submission still yields the
/// formatted metric, it just performs no sink I/O.
///
/// NOTE: The only way to instantiate an instance of this builder is via
/// methods in the `StatsdClient` client.
///
/// # Examples
///
/// ## `.try_send()`
///
/// An example of how the metric builder is used with a `StatsdClient`
/// instance is given below.
///
/// ```
/// use tempo::prelude::*;
/// use tempo::{StatsdClient, NopMetricSink, Metric};
///
/// let client = StatsdClient::from_sink("some.prefix", NopMetricSink);
/// let res = client.count_with_rate("some.key", 1, 0.25).try_send();
///
/// assert_eq!("some.prefix.some.key:1|c|@0.25", res.unwrap().as_metric_str());
/// ```
///
/// ## `.send()`
///
/// An example of the "quiet" method that discards successful results and
/// routes errors to the handler registered with the client.
///
/// ```
/// use tempo::prelude::*;
/// use tempo::{StatsdClient, NopMetricSink, Metric};
///
/// let client = StatsdClient::builder("some.prefix", NopMetricSink)
///     .with_error_handler(|e| eprintln!("metric error: {}", e))
///     .build();
/// client.count_with_rate("some.key", 1, 0.25).send();
/// ```
///
/// Note that nothing is returned from the `.send()` method. Any errors
/// encountered in this case will be passed to the error handler we
/// registered.
#[must_use = "Did you forget to call .send() after setting a sample rate?"]
#[derive(Debug)]
pub struct MetricBuilder<'m, 'c, T>
where
    T: Metric + From<String>,
{
    repr: BuilderRepr<'m, 'c>,
    type_: PhantomData<T>,
}

impl<'m, 'c, T> MetricBuilder<'m, 'c, T>
where
    T: Metric + From<String>,
{
    pub(crate) fn from_fmt(formatter: MetricFormatter<'m>, client: &'c StatsdClient) -> Self {
        MetricBuilder {
            repr: BuilderRepr::Success(formatter, client),
            type_: PhantomData,
        }
    }

    pub(crate) fn from_error(err: MetricError, client: &'c StatsdClient) -> Self {
        MetricBuilder {
            repr: BuilderRepr::Error(err, client),
            type_: PhantomData,
        }
    }

    /// Set the sample rate for this metric.
    ///
    /// The rate must be in the range `(0.0, 1.0]`; anything else turns into
    /// an `ErrorKind::InvalidInput` error when the metric is finally sent.
    /// A rate of 1.0 sends every submission and adds nothing to the wire
    /// format.
    ///
    /// # Example
    ///
    /// ```
    /// use tempo::prelude::*;
    /// use tempo::{StatsdClient, NopMetricSink, Metric};
    ///
    /// let client = StatsdClient::from_sink("some.prefix", NopMetricSink);
    /// let res = client.count_with_rate("some.key", 1, 1.0)
    ///    .with_sample_rate(0.5)
    ///    .try_send();
    ///
    /// assert_eq!("some.prefix.some.key:1|c|@0.5", res.unwrap().as_metric_str());
    /// ```
    pub fn with_sample_rate(mut self, rate: f32) -> Self {
        if let BuilderRepr::Success(ref mut formatter, client) = self.repr {
            match SampleRate::try_from(rate) {
                Ok(rate) => formatter.with_sample_rate(rate),
                Err(e) => return Self::from_error(e, client),
            }
        }
        self
    }

    /// Send a metric using the client that created this builder.
    ///
    /// Note that the builder is consumed by this method and thus `.try_send()`
    /// can only be called a single time per builder.
    ///
    /// # Example
    ///
    /// ```
    /// use tempo::prelude::*;
    /// use tempo::{StatsdClient, NopMetricSink, Metric};
    ///
    /// let client = StatsdClient::from_sink("some.prefix", NopMetricSink);
    /// let res = client.gauge_with_rate("some.key", 7, 1.0).try_send();
    ///
    /// assert_eq!("some.prefix.some.key:7|g", res.unwrap().as_metric_str());
    /// ```
    pub fn try_send(self) -> MetricResult<T> {
        match self.repr {
            BuilderRepr::Error(err, _) => Err(err),
            BuilderRepr::Success(ref formatter, client) => {
                let metric = T::from(formatter.format());
                if formatter.sample() {
                    client.send_metric(&metric)?;
                }
                Ok(metric)
            }
        }
    }

    /// Send a metric using the client that created this builder, discarding
    /// successful results and invoking a custom handler for error results.
    ///
    /// By default, if no handler is given, a "no-op" handler is used that
    /// simply discards all errors. If this isn't desired, a custom handler
    /// should be supplied when creating a new `StatsdClient` instance.
    ///
    /// Note that the builder is consumed by this method and thus `.send()`
    /// can only be called a single time per builder.
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
    pub fn send(self) {
        match self.repr {
            BuilderRepr::Error(err, client) => client.consume_error(err),
            BuilderRepr::Success(_, client) => {
                if let Err(e) = self.try_send() {
                    client.consume_error(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MetricBuilder, MetricFormatter, MetricValue, SampleRate};
    use crate::client::StatsdClient;
    use crate::sinks::{MetricSink, NopMetricSink, SpyMetricSink};
    use crate::types::{Counter, ErrorKind, Metric};
    use std::io;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct ErrorMetricSink;

    impl MetricSink for ErrorMetricSink {
        fn emit(&self, _metric: &str) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "simulated failure"))
        }
    }

    #[test]
    fn test_metric_formatter_counter() {
        let fmt = MetricFormatter::counter("prefix.", "some.key", MetricValue::Signed(4));
        assert_eq!("prefix.some.key:4|c", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_counter_negative() {
        let fmt = MetricFormatter::counter("prefix.", "some.key", MetricValue::Signed(-1));
        assert_eq!("prefix.some.key:-1|c", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_timer() {
        let fmt = MetricFormatter::timer("prefix.", "some.method", MetricValue::Unsigned(21));
        assert_eq!("prefix.some.method:21|ms", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_timer_fractional() {
        let fmt = MetricFormatter::timer("prefix.", "some.method", MetricValue::Float(21.5));
        assert_eq!("prefix.some.method:21.5|ms", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_gauge() {
        let fmt = MetricFormatter::gauge("prefix.", "num.failures", MetricValue::Signed(7));
        assert_eq!("prefix.num.failures:7|g", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_gauge_delta_positive() {
        let fmt = MetricFormatter::gauge("prefix.", "num.failures", MetricValue::Delta(4));
        assert_eq!("prefix.num.failures:+4|g", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_gauge_delta_negative() {
        let fmt = MetricFormatter::gauge("prefix.", "num.failures", MetricValue::Delta(-4));
        assert_eq!("prefix.num.failures:-4|g", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_set() {
        let fmt = MetricFormatter::set("prefix.", "users.uniques", MetricValue::Signed(44));
        assert_eq!("prefix.users.uniques:44|s", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_set_text() {
        let fmt = MetricFormatter::set("prefix.", "users.uniques", MetricValue::Text("abc123".to_string()));
        assert_eq!("prefix.users.uniques:abc123|s", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_raw_no_type() {
        let fmt = MetricFormatter::raw("prefix.", "some.raw", MetricValue::Text("1:2|s".to_string()));
        assert_eq!("prefix.some.raw:1:2|s", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_counter_with_sample_rate() {
        let mut fmt = MetricFormatter::counter("prefix.", "some.key", MetricValue::Signed(4));
        fmt.with_sample_rate(SampleRate::try_from(0.5).unwrap());

        assert_eq!("prefix.some.key:4|c|@0.5", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_doesnt_write_default_sample_rate() {
        let mut fmt = MetricFormatter::counter("prefix.", "some.key", MetricValue::Signed(4));
        fmt.with_sample_rate(SampleRate::try_from(1.0).unwrap());

        assert_eq!("prefix.some.key:4|c", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_gauge_with_sample_rate() {
        let mut fmt = MetricFormatter::gauge("prefix.", "some.key", MetricValue::Signed(4));
        fmt.with_sample_rate(SampleRate::try_from(0.999999).unwrap());

        assert_eq!("prefix.some.key:4|g|@0.999999", &fmt.format());
    }

    #[test]
    fn test_metric_builder_invalid_sample_rate() {
        let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(11));
        let client = StatsdClient::from_sink("prefix.", NopMetricSink);

        let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
        let res = builder.with_sample_rate(1.5).try_send();

        assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind());
    }

    #[test]
    fn test_metric_builder_send_success() {
        let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(11));
        let client = StatsdClient::builder("prefix.", NopMetricSink)
            .with_error_handler(|e| {
                panic!("unexpected error sending metric: {}", e);
            })
            .build();

        // if the send failed the test would have called the error handler and panicked
        let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
        builder.send();
    }

    #[test]
    fn test_metric_builder_send_error() {
        let errors = Arc::new(AtomicU64::new(0));
        let errors_ref = errors.clone();

        let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(11));
        let client = StatsdClient::builder("prefix.", ErrorMetricSink)
            .with_error_handler(move |_e| {
                errors_ref.fetch_add(1, Ordering::Release);
            })
            .build();

        let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
        builder.send();

        assert_eq!(1, errors.load(Ordering::Acquire));
    }

    #[test]
    fn test_metric_builder_try_send_success() {
        let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(11));
        let client = StatsdClient::from_sink("prefix.", NopMetricSink);

        let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
        let res = builder.try_send();

        assert!(res.is_ok(), "expected Ok result from try_send");
    }

    #[test]
    fn test_metric_builder_try_send_error() {
        let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(11));
        let client = StatsdClient::from_sink("prefix.", ErrorMetricSink);

        let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
        let res = builder.try_send();

        assert!(res.is_err(), "expected Err result from try_send");
    }

    #[test]
    fn test_metric_builder_try_send_actually_samples() {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::from_sink("prefix.", sink);

        for i in 0..100 {
            let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(i));
            let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
            builder.with_sample_rate(0.5).try_send().unwrap();
        }

        drop(client);
        let sent_metrics: Vec<_> = rx.iter().collect();

        // always happening (probably)
        assert!(!sent_metrics.is_empty());
        // never happening (probably)
        assert!(sent_metrics.len() < 100);
    }

    #[test]
    fn test_metric_builder_sampled_out_still_formats() {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::from_sink("prefix.", sink);

        for _ in 0..100 {
            let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(1));
            let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
            let metric = builder.with_sample_rate(0.25).try_send().unwrap();
            assert_eq!("prefix.some.counter:1|c|@0.25", metric.as_metric_str());
        }

        drop(client);
        assert!(rx.iter().count() < 100);
    }
}
