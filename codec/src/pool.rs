//! Pool of reusable packing buffers.
//!
//! Packing an object for every outgoing message or database write would otherwise allocate a
//! fresh buffer each time. [BufferPool] keeps a bounded freelist of [BytesMut] buffers that
//! packing archives check out and return.
//!
//! # Scoped Checkout
//!
//! A checked-out buffer is wrapped in a [PooledBuffer], which returns the (cleared) buffer to the
//! pool when dropped. This happens on every exit path, including a `Serialize` implementation
//! that fails halfway through or a panic that unwinds through the archive.
//!
//! # Pool Lifecycle
//!
//! Buffers hold a weak reference to the pool. A buffer dropped after its pool is gone is
//! deallocated instead of returned.
//!
//! # Thread Safety
//!
//! [BufferPool] is `Send + Sync` and cheap to clone. The freelist is a lock-free
//! [crossbeam_queue::ArrayQueue].

use bytes::BytesMut;
use crossbeam_queue::ArrayQueue;
use prometheus_client::{
    metrics::{counter::Counter, gauge::Gauge},
    registry::Registry,
};
use std::{
    num::NonZeroUsize,
    ops::{Deref, DerefMut},
    sync::{Arc, Weak},
};
use tracing::{debug, trace};

/// Buffers that grew beyond this multiple of [Config::buffer_capacity] are not retained.
const MAX_GROWTH_FACTOR: usize = 4;

const fn nz(value: usize) -> NonZeroUsize {
    match NonZeroUsize::new(value) {
        Some(value) => value,
        None => panic!("value must be non-zero"),
    }
}

/// Configuration for a [BufferPool].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Initial capacity of a newly allocated buffer, in bytes.
    pub buffer_capacity: NonZeroUsize,

    /// Maximum number of idle buffers kept in the freelist.
    pub max_buffers: NonZeroUsize,

    /// Whether to allocate all `max_buffers` buffers when the pool is created.
    pub prefill: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_network()
    }
}

impl Config {
    /// Network preset: many small buffers for per-message replication archives.
    pub const fn for_network() -> Self {
        Self {
            buffer_capacity: nz(1024),
            max_buffers: nz(1024),
            prefill: false,
        }
    }

    /// Storage preset: a few large buffers for persisted entity blobs.
    pub const fn for_storage() -> Self {
        Self {
            buffer_capacity: nz(64 * 1024),
            max_buffers: nz(32),
            prefill: false,
        }
    }

    fn max_retained_capacity(&self) -> usize {
        self.buffer_capacity.get().saturating_mul(MAX_GROWTH_FACTOR)
    }
}

/// Metrics for the buffer pool.
struct Metrics {
    /// Number of buffers currently checked out.
    checked_out: Gauge,
    /// Number of idle buffers in the freelist.
    available: Gauge,
    /// Total number of checkouts.
    checkouts: Counter,
    /// Total number of buffers allocated because the freelist was empty.
    allocations: Counter,
    /// Total number of returned buffers that were dropped instead of retained.
    discards: Counter,
}

impl Metrics {
    fn new(registry: &mut Registry) -> Self {
        let metrics = Self {
            checked_out: Gauge::default(),
            available: Gauge::default(),
            checkouts: Counter::default(),
            allocations: Counter::default(),
            discards: Counter::default(),
        };
        registry.register(
            "archive_buffers_checked_out",
            "Number of archive buffers currently checked out",
            metrics.checked_out.clone(),
        );
        registry.register(
            "archive_buffers_available",
            "Number of idle archive buffers in the pool",
            metrics.available.clone(),
        );
        registry.register(
            "archive_buffer_checkouts",
            "Total number of archive buffer checkouts",
            metrics.checkouts.clone(),
        );
        registry.register(
            "archive_buffer_allocations",
            "Total number of archive buffers allocated because the pool was empty",
            metrics.allocations.clone(),
        );
        registry.register(
            "archive_buffer_discards",
            "Total number of returned archive buffers that were not retained",
            metrics.discards.clone(),
        );
        metrics
    }
}

struct Inner {
    config: Config,
    freelist: ArrayQueue<BytesMut>,
    metrics: Metrics,
}

impl Inner {
    fn release(&self, mut buffer: BytesMut) {
        self.metrics.checked_out.dec();
        let capacity = buffer.capacity();
        if capacity > self.config.max_retained_capacity() {
            self.metrics.discards.inc();
            debug!(capacity, "discarding oversized archive buffer");
            return;
        }

        buffer.clear();
        match self.freelist.push(buffer) {
            Ok(()) => {
                self.metrics.available.inc();
                trace!(capacity, "returned archive buffer");
            }
            Err(_) => {
                self.metrics.discards.inc();
                debug!(capacity, "archive buffer pool full");
            }
        }
    }
}

/// A bounded pool of packing buffers.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("config", &self.inner.config)
            .field("available", &self.inner.freelist.len())
            .finish()
    }
}

impl BufferPool {
    /// Creates a new pool and registers its metrics with `registry`.
    pub fn new(config: Config, registry: &mut Registry) -> Self {
        let metrics = Metrics::new(registry);
        let freelist = ArrayQueue::new(config.max_buffers.get());
        if config.prefill {
            for _ in 0..config.max_buffers.get() {
                let _ = freelist.push(BytesMut::with_capacity(config.buffer_capacity.get()));
            }
            metrics.available.set(freelist.len() as i64);
        }

        Self {
            inner: Arc::new(Inner {
                config,
                freelist,
                metrics,
            }),
        }
    }

    /// Checks out an empty buffer, allocating one if the freelist is empty.
    pub fn checkout(&self) -> PooledBuffer {
        let metrics = &self.inner.metrics;
        let buffer = match self.inner.freelist.pop() {
            Some(buffer) => {
                metrics.available.dec();
                buffer
            }
            None => {
                metrics.allocations.inc();
                BytesMut::with_capacity(self.inner.config.buffer_capacity.get())
            }
        };
        metrics.checkouts.inc();
        metrics.checked_out.inc();
        trace!(capacity = buffer.capacity(), "checked out archive buffer");

        PooledBuffer {
            buffer,
            pool: Some(Arc::downgrade(&self.inner)),
        }
    }

    /// Returns the number of idle buffers in the freelist.
    pub fn available(&self) -> usize {
        self.inner.freelist.len()
    }

    /// Returns the configuration of the pool.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

/// A buffer that returns itself to its [BufferPool] when dropped.
pub struct PooledBuffer {
    buffer: BytesMut,
    pool: Option<Weak<Inner>>,
}

impl PooledBuffer {
    /// Creates a buffer that does not belong to any pool.
    pub fn detached() -> Self {
        Self {
            buffer: BytesMut::new(),
            pool: None,
        }
    }

    /// Returns true if the buffer will be returned to a pool on drop.
    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    /// Takes ownership of the underlying buffer. The buffer is not returned to the pool.
    pub fn detach(mut self) -> BytesMut {
        if let Some(inner) = self.pool.take().and_then(|pool| pool.upgrade()) {
            inner.metrics.checked_out.dec();
        }
        std::mem::take(&mut self.buffer)
    }
}

impl Deref for PooledBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(inner) = self.pool.take().and_then(|pool| pool.upgrade()) {
            inner.release(std::mem::take(&mut self.buffer));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    fn small_config() -> Config {
        Config {
            buffer_capacity: nz(64),
            max_buffers: nz(2),
            prefill: false,
        }
    }

    #[test]
    fn test_checkout_and_return() {
        let mut registry = Registry::default();
        let pool = BufferPool::new(small_config(), &mut registry);
        assert_eq!(pool.available(), 0);

        {
            let mut buffer = pool.checkout();
            assert!(buffer.is_pooled());
            assert!(buffer.capacity() >= 64);
            buffer.put_slice(b"hello");
        }
        assert_eq!(pool.available(), 1);

        // Reused buffers come back empty.
        let buffer = pool.checkout();
        assert!(buffer.is_empty());
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_prefill() {
        let mut registry = Registry::default();
        let config = Config {
            prefill: true,
            ..small_config()
        };
        let pool = BufferPool::new(config, &mut registry);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_freelist_bound() {
        let mut registry = Registry::default();
        let pool = BufferPool::new(small_config(), &mut registry);
        let buffers: Vec<_> = (0..3).map(|_| pool.checkout()).collect();
        drop(buffers);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_oversized_buffer_discarded() {
        let mut registry = Registry::default();
        let pool = BufferPool::new(small_config(), &mut registry);
        {
            let mut buffer = pool.checkout();
            buffer.put_slice(&[0u8; 1024]);
        }
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_detach() {
        let mut registry = Registry::default();
        let pool = BufferPool::new(small_config(), &mut registry);
        let mut buffer = pool.checkout();
        buffer.put_u8(7);
        let bytes = buffer.detach();
        assert_eq!(&bytes[..], &[7]);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_outlives_pool() {
        let mut registry = Registry::default();
        let pool = BufferPool::new(small_config(), &mut registry);
        let mut buffer = pool.checkout();
        drop(pool);
        buffer.put_u8(1);
        drop(buffer);
    }

    #[test]
    fn test_detached_buffer() {
        let buffer = PooledBuffer::detached();
        assert!(!buffer.is_pooled());
        assert!(buffer.detach().is_empty());
    }
}
