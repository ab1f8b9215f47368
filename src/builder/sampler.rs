// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use rand::Rng;

/// Probabilistic filter that passes items through with a fixed rate.
///
/// A rate at or above 1.0 passes everything. Draws use the thread-local
/// generator so samplers are cheap to construct per call.
pub(crate) struct Sampler(f32);

impl Sampler {
    pub(crate) fn new_with_rate(rate: f32) -> Self {
        Sampler(rate)
    }

    pub(crate) fn sample<T>(&self, item: T) -> Option<T> {
        if self.0 >= 1.0 || rand::thread_rng().gen::<f32>() < self.0 {
            Some(item)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Sampler;

    #[test]
    fn test_sampler_rate_one_always_passes() {
        let sampler = Sampler::new_with_rate(1.0);
        for i in 0..100 {
            assert_eq!(Some(i), sampler.sample(i));
        }
    }

    #[test]
    fn test_sampler_fractional_rate_drops_some() {
        let sampler = Sampler::new_with_rate(0.5);
        let passed = (0..1000).filter(|i| sampler.sample(i).is_some()).count();

        // always happening (probably)
        assert!(passed > 0);
        // never happening (probably)
        assert!(passed < 1000);
    }
}
