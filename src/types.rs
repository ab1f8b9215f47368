// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error;
use std::fmt;
use std::io;

/// Trait for metrics that have been sent, or could be sent, to a server.
///
/// Typical use of Tempo doesn't require interacting with this trait beyond
/// calling `.as_metric_str()` to inspect the line that was emitted.
pub trait Metric {
    fn as_metric_str(&self) -> &str;
}

macro_rules! metric_wrapper {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Eq, PartialEq)]
        pub struct $name {
            repr: String,
        }

        impl From<String> for $name {
            fn from(repr: String) -> Self {
                $name { repr }
            }
        }

        impl Metric for $name {
            fn as_metric_str(&self) -> &str {
                &self.repr
            }
        }
    };
}

metric_wrapper!(Counter, "Counters are simple values incremented or decremented by a client.");
metric_wrapper!(Timer, "Timers are a positive number of milliseconds between a start and end point.");
metric_wrapper!(Gauge, "Gauges are an instantaneous value or a signed delta applied to one.");
metric_wrapper!(Set, "Sets count the number of unique elements in a group.");
metric_wrapper!(Raw, "Raw metrics are preformatted values emitted without a type suffix.");

/// Potential categories an error from this library falls into.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// A bad address, value, or dependency was supplied by the caller.
    InvalidInput,
    /// The underlying transport failed to send or close.
    IoError,
    /// A submission was attempted while the sender was stopped. Callers
    /// may retry after calling `.start()` on the sender.
    NotRunning,
}

/// Error generated by this library potentially wrapping the cause.
#[derive(Debug)]
pub struct MetricError {
    repr: ErrorRepr,
}

#[derive(Debug)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    IoError(io::Error),
}

impl MetricError {
    /// Return the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::IoError(_) => ErrorKind::IoError,
            ErrorRepr::WithDescription(kind, _) => kind,
        }
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            ErrorRepr::IoError(ref err) => err.fmt(f),
            ErrorRepr::WithDescription(_, desc) => desc.fmt(f),
        }
    }
}

impl error::Error for MetricError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.repr {
            ErrorRepr::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MetricError {
    fn from(err: io::Error) -> MetricError {
        MetricError {
            repr: ErrorRepr::IoError(err),
        }
    }
}

impl From<(ErrorKind, &'static str)> for MetricError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> MetricError {
        MetricError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

impl From<MetricError> for io::Error {
    fn from(err: MetricError) -> io::Error {
        match err.repr {
            ErrorRepr::IoError(err) => err,
            ErrorRepr::WithDescription(_, desc) => io::Error::new(io::ErrorKind::Other, desc),
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;
