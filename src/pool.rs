// Tempo - A buffering Statsd client for Rust!
//
// Copyright 2016-2024 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::Mutex;

// Big enough for a typical metric line (prefix, key, value, type, and
// sample rate) without growing.
const DEFAULT_BUFFER_CAPACITY: usize = 128;

/// Pool of reusable byte buffers for assembling and handing off metric
/// lines without allocating on every submission.
///
/// Buffers handed out by `acquire` always have zero length and at least
/// the baseline capacity the pool was created with. Buffers returned via
/// `release` are truncated and kept for reuse by any future caller. The
/// pool never evicts: under sustained concurrency it grows to the high
/// water mark of simultaneously held buffers and stays there.
///
/// Each buffered sink owns its own pool instance, shared with its
/// background worker via `Arc`. There is deliberately no process-global
/// pool.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    capacity: usize,
}

impl BufferPool {
    /// Create a new pool handing out buffers with a default baseline
    /// capacity suitable for single metric lines.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a new pool handing out buffers with the given baseline capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        BufferPool {
            buffers: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Get an empty buffer from the pool, allocating a new one only when
    /// the pool has no idle buffers.
    pub fn acquire(&self) -> Vec<u8> {
        let mut buffers = self.buffers.lock().unwrap();
        buffers.pop().unwrap_or_else(|| Vec::with_capacity(self.capacity))
    }

    /// Truncate a buffer and return it to the pool for reuse.
    ///
    /// Ownership transfers fully to the pool; the buffer must not be
    /// referenced elsewhere after release.
    pub fn release(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        let mut buffers = self.buffers.lock().unwrap();
        buffers.push(buffer);
    }

    #[cfg(test)]
    fn idle(&self) -> usize {
        self.buffers.lock().unwrap().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}
