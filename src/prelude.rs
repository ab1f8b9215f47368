// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Export commonly used parts of Tempo for easy glob imports
//!
//! # Example
//!
//! ```
//! use tempo::prelude::*;
//! use tempo::{StatsdClient, NopMetricSink};
//!
//! let client = StatsdClient::from_sink("some.prefix", NopMetricSink);
//!
//! client.count("some.counter", 1).unwrap();
//! client.time("some.timer", 23).unwrap();
//! client.gauge("some.gauge", 45i64).unwrap();
//! client.gauge_delta("some.gauge", -2).unwrap();
//! client.set("some.set", 123).unwrap();
//! client.raw("some.raw", "67|c").unwrap();
//! ```

pub use crate::client::{Counted, CountedExt, Gauged, MetricClient, Rawed, Setted, Timed};
