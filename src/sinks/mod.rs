// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod buffered;
pub(crate) mod core;
mod spy;
mod udp;

pub use crate::sinks::buffered::{
    BufferedMetricSink, BufferedMetricSinkBuilder, DEFAULT_FLUSH_BYTES, DEFAULT_FLUSH_INTERVAL,
};
pub use crate::sinks::core::{MetricSink, NopMetricSink, SinkStats, SocketStats};
pub use crate::sinks::spy::{SpyMetricSink, SpyTransport};
pub use crate::sinks::udp::UdpMetricSink;
