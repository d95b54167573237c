//! # Shared Pools
//!
//! Mutex-guarded wrappers for hosts that drive pools from more than one thread.
//!
//! The plain pools assume one logical thread (the game's update loop) and
//! take no locks. When a pool has to be reached from worker threads, wrap it
//! here instead of adding locking to the pools themselves.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::entity::EntityHost;
use crate::registry::PoolRegistry;
use crate::stats::PoolCounts;
use crate::typed::TypedPool;

/// A cloneable, thread-safe handle to one typed pool.
///
/// # Example
///
/// ```rust
/// use guildmaster_pool::{SharedPool, TypedPool};
///
/// let pool = SharedPool::new(TypedPool::new(|| vec![0u8; 256], 4));
/// let worker = pool.clone();
///
/// std::thread::spawn(move || {
///     let scratch = worker.get();
///     worker.release(scratch);
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(pool.counts().inactive, 1);
/// ```
#[derive(Debug)]
pub struct SharedPool<T> {
    inner: Arc<Mutex<TypedPool<T>>>,
}

impl<T> Clone for SharedPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedPool<T> {
    /// Wraps a pool for shared use.
    #[must_use]
    pub fn new(pool: TypedPool<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    /// Takes a value out of the pool. See [`TypedPool::get`].
    pub fn get(&self) -> T {
        self.inner.lock().get()
    }

    /// Returns a value to the pool. See [`TypedPool::release`].
    pub fn release(&self, item: T) {
        self.inner.lock().release(item);
    }

    /// Builds values ahead of time. See [`TypedPool::prewarm`].
    pub fn prewarm(&self, count: usize) -> usize {
        self.inner.lock().prewarm(count)
    }

    /// Drops every shelved value. See [`TypedPool::clear`].
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Snapshot of the pool's counters.
    #[must_use]
    pub fn counts(&self) -> PoolCounts {
        self.inner.lock().counts()
    }
}

/// A registry behind a mutex.
///
/// Every access goes through [`SharedRegistry::with`], which holds the lock
/// for the duration of the closure.
pub struct SharedRegistry<H: EntityHost> {
    inner: Mutex<PoolRegistry<H>>,
}

impl<H: EntityHost> SharedRegistry<H> {
    /// Wraps a registry for shared use.
    #[must_use]
    pub fn new(registry: PoolRegistry<H>) -> Self {
        Self {
            inner: Mutex::new(registry),
        }
    }

    /// Runs `f` with exclusive access to the registry.
    pub fn with<R>(&self, f: impl FnOnce(&mut PoolRegistry<H>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Human-readable dump of every pool's counters.
    #[must_use]
    pub fn describe_state(&self) -> String {
        self.inner.lock().describe_state()
    }

    /// Unwraps the registry, typically to call [`PoolRegistry::shutdown`].
    #[must_use]
    pub fn into_inner(self) -> PoolRegistry<H> {
        self.inner.into_inner()
    }
}

impl<H: EntityHost> std::fmt::Debug for SharedRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_shared_pool_across_threads() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let pool = SharedPool::new(TypedPool::new(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Vec::<u64>::new()
            },
            16,
        ));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let pool = pool.clone();
                scope.spawn(move || {
                    for _ in 0..100 {
                        let buffer = pool.get();
                        pool.release(buffer);
                    }
                });
            }
        });

        let counts = pool.counts();
        assert_eq!(counts.active, 0);
        assert!(counts.inactive <= 4);
        assert_eq!(counts.inactive, created.load(Ordering::SeqCst));
    }

    /// Host whose entities are plain counters, safe to move across threads.
    #[derive(Default)]
    struct TickHost {
        next: u64,
        destroyed: usize,
    }

    impl EntityHost for TickHost {
        type Entity = u64;
        type Template = ();
        type Scope = ();

        fn instantiate(&mut self, _template: &(), _scope: &()) -> u64 {
            self.next += 1;
            self.next
        }

        fn set_active(&mut self, _entity: &mut u64, _active: bool) {}

        fn destroy(&mut self, _entity: u64) {
            self.destroyed += 1;
        }
    }

    #[test]
    fn test_shared_registry_across_threads() {
        let mut registry = PoolRegistry::init(TickHost::default(), ());
        registry.register_entity_pool("Spark", (), 0, 8);
        let shared = SharedRegistry::new(registry);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let spark = shared.with(|pools| pools.get("Spark"));
                        if let Some(spark) = spark {
                            shared.with(|pools| pools.release("Spark", spark));
                        }
                    }
                });
            }
        });

        assert!(shared.describe_state().contains("Spark: active=0"));
        let host = shared.into_inner().shutdown();
        assert!(host.next <= 4);
        assert_eq!(host.destroyed as u64, host.next);
    }
}
