// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::{ErrorKind, MetricError};

/// Represents the sample rate of a metric, a value in (0.0, 1.0] that
/// determines what fraction of submissions are actually sent to the
/// server. The rate is formatted once at construction so repeated use
/// doesn't re-render it.
#[derive(Debug, Clone)]
pub(crate) struct SampleRate {
    value: f32,
    repr: String,
}

impl SampleRate {
    // Shortest possible rendering, e.g. "@0.5"
    const MIN_SIZE: usize = 4;

    fn new(value: f32) -> Self {
        let mut repr = format!("@{:.6}", value);
        while repr.len() > Self::MIN_SIZE && repr.ends_with('0') {
            repr.pop();
        }

        SampleRate { value, repr }
    }

    /// Rate of 1.0 means "always send" and is left off the wire format.
    pub fn is_applicable(&self) -> bool {
        self.value != 1.0
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.repr
    }
}

impl TryFrom<f32> for SampleRate {
    type Error = MetricError;

    fn try_from(rate: f32) -> Result<Self, Self::Error> {
        if rate > 0.0 && rate <= 1.0 {
            Ok(Self::new(rate))
        } else {
            let err = MetricError::from((ErrorKind::InvalidInput, "Sample rate must be between 0.0 and 1.0"));
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SampleRate;
    use crate::types::ErrorKind;

    #[test]
    fn test_sample_rate_trims_trailing_zeros() {
        let sr = SampleRate::try_from(0.5).unwrap();
        assert_eq!("@0.5", sr.as_str());

        let sr = SampleRate::try_from(0.25).unwrap();
        assert_eq!("@0.25", sr.as_str());
    }

    #[test]
    fn test_sample_rate_keeps_significant_digits() {
        let sr = SampleRate::try_from(0.999999).unwrap();
        assert_eq!("@0.999999", sr.as_str());
    }

    #[test]
    fn test_sample_rate_one_not_applicable() {
        let sr = SampleRate::try_from(1.0).unwrap();
        assert!(!sr.is_applicable());
    }

    #[test]
    fn test_sample_rate_zero_invalid() {
        let err = SampleRate::try_from(0.0).unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());
    }

    #[test]
    fn test_sample_rate_above_one_invalid() {
        let err = SampleRate::try_from(1.5).unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());
    }
}
