//! Reusable byte buffers for rendered log lines.
//!
//! The formatter takes one buffer per record and the writer hands it back once
//! the bytes have reached the sink. Buffers return on drop, so a buffer is held
//! by exactly one formatting operation at a time. The pool is a lock-free
//! `ArrayQueue` and may be shared by any number of threads.

use crossbeam::queue::ArrayQueue;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Buffers that grew beyond this are dropped instead of being pooled again.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

const INITIAL_CAPACITY: usize = 256;

/// Shared pool of growable byte buffers.
#[derive(Clone, Debug)]
pub struct BufferPool {
    slots: Arc<ArrayQueue<Vec<u8>>>,
}

impl BufferPool {
    /// Create a pool that retains at most `capacity` idle buffers.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(ArrayQueue::new(capacity.max(1))),
        }
    }

    /// Borrow an empty buffer, allocating one if the pool is empty.
    pub fn get(&self) -> PooledBuffer {
        let mut buf = self
            .slots
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY));
        buf.clear();
        PooledBuffer {
            buf,
            pool: Arc::clone(&self.slots),
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.slots.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(crate::defaults::POOL_CAPACITY)
    }
}

/// A buffer on loan from a [`BufferPool`]; returns itself when dropped.
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<ArrayQueue<Vec<u8>>>,
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if self.buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        // A full pool just drops the buffer.
        let _ = self.pool.push(buf);
    }
}
