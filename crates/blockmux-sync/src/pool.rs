use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

/// Default number of idle objects a pool retains.
pub const DEFAULT_MAX_IDLE: usize = 1024;

/// A pool of byte blocks.
pub type BlockPool = Pool<Vec<u8>>;

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

struct Inner<T> {
    idle: Mutex<Vec<T>>,
    factory: Factory<T>,
    max_idle: usize,
    outstanding: AtomicUsize,
    created: AtomicUsize,
}

/// A thread-safe object pool.
///
/// [`Pool::acquire`] hands out a [`Pooled`] guard. The object goes back to the
/// pool when the guard is dropped, so every exit path releases it. Cloning a
/// pool yields another handle to the same storage.
pub struct Pool<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Pool<T> {
    /// Create a pool that builds new objects with `factory`.
    pub fn new(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self::with_max_idle(factory, DEFAULT_MAX_IDLE)
    }

    /// Create a pool that keeps at most `max_idle` released objects.
    pub fn with_max_idle(factory: impl Fn() -> T + Send + Sync + 'static, max_idle: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                idle: Mutex::new(Vec::new()),
                factory: Box::new(factory),
                max_idle,
                outstanding: AtomicUsize::new(0),
                created: AtomicUsize::new(0),
            }),
        }
    }

    /// Take an object from the pool, building one if none is idle.
    pub fn acquire(&self) -> Pooled<T> {
        let reused = self
            .inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let value = match reused {
            Some(value) => value,
            None => {
                let created = self.inner.created.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(created, "pool allocating new object");
                (self.inner.factory)()
            }
        };
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        Pooled {
            value: Some(value),
            pool: Arc::clone(&self.inner),
        }
    }

    /// Number of objects currently checked out.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Number of released objects waiting for reuse.
    pub fn idle(&self) -> usize {
        self.inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Total objects the factory has built.
    pub fn created(&self) -> usize {
        self.inner.created.load(Ordering::Relaxed)
    }
}

impl BlockPool {
    /// A pool of zeroed blocks of `size` bytes.
    pub fn blocks(size: usize) -> Self {
        Self::new(move || vec![0u8; size])
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("max_idle", &self.inner.max_idle)
            .field("outstanding", &self.inner.outstanding.load(Ordering::Relaxed))
            .field("created", &self.inner.created.load(Ordering::Relaxed))
            .finish()
    }
}

/// An object checked out of a [`Pool`].
pub struct Pooled<T> {
    value: Option<T>,
    pool: Arc<Inner<T>>,
}

impl<T> Pooled<T> {
    /// Return the object to its pool now.
    pub fn release(self) {
        drop(self);
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `Drop` takes the value.
        self.value.as_ref().expect("pooled value present until drop")
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("pooled value present until drop")
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        let Some(value) = self.value.take() else {
            return;
        };
        self.pool.outstanding.fetch_sub(1, Ordering::AcqRel);
        let mut idle = self
            .pool
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.pool.max_idle {
            idle.push(value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_builds_then_reuses() {
        let pool = BlockPool::blocks(8);

        let mut block = pool.acquire();
        assert_eq!(block.len(), 8);
        block[0] = 42;
        block.release();

        let block = pool.acquire();
        assert_eq!(block[0], 42, "released block should be handed out again");
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn outstanding_tracks_guards() {
        let pool = BlockPool::blocks(4);
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.outstanding(), 2);
        assert_eq!(pool.idle(), 0);

        drop(a);
        assert_eq!(pool.outstanding(), 1);
        assert_eq!(pool.idle(), 1);

        drop(b);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn max_idle_caps_retained_objects() {
        let pool = Pool::with_max_idle(|| vec![0u8; 2], 1);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn guard_released_when_thread_panics() {
        let pool = BlockPool::blocks(4);
        let worker_pool = pool.clone();
        let result = std::thread::spawn(move || {
            let _block = worker_pool.acquire();
            panic!("worker failed");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn guards_move_across_threads() {
        let pool = BlockPool::blocks(16);
        let (tx, rx) = crossbeam::channel::bounded(4);

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..4u8 {
                    let mut block = pool.acquire();
                    block[0] = i;
                    tx.send(block).unwrap();
                }
            });
            for i in 0..4u8 {
                let block = rx.recv().unwrap();
                assert_eq!(block[0], i);
            }
        });

        assert_eq!(pool.outstanding(), 0);
    }
}
