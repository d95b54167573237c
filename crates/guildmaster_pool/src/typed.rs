//! # Typed Pool
//!
//! Free-list pool for plain values that are frequently created and thrown away.

use std::any::Any;
use std::fmt;

use crate::stats::PoolCounts;

/// Default number of inactive instances a pool retains.
pub const DEFAULT_MAX_SIZE: usize = 100;

type Factory<T> = Box<dyn FnMut() -> T + Send>;
type Reset<T> = Box<dyn FnMut(&mut T) + Send>;

/// A free-list pool for values of type `T`.
///
/// Released values go on a LIFO free list, so the next `get` hands back the
/// most recently released value. The free list never grows past
/// `max_inactive`; values released into a full pool are dropped.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Use one pool per thread or wrap it in
/// [`SharedPool`](crate::SharedPool).
///
/// # Example
///
/// ```rust
/// use guildmaster_pool::TypedPool;
///
/// let mut pool = TypedPool::new(|| Vec::<f32>::with_capacity(64), 8)
///     .with_reset(Vec::clear);
///
/// let mut buffer = pool.get();
/// buffer.push(1.5);
/// pool.release(buffer);
///
/// assert_eq!(pool.count_inactive(), 1);
/// assert!(pool.get().is_empty());
/// ```
pub struct TypedPool<T> {
    /// Inactive values, most recently released last.
    free_list: Vec<T>,
    /// Values handed out and not yet released.
    active_count: usize,
    /// Upper bound on `free_list.len()`.
    max_inactive: usize,
    factory: Factory<T>,
    reset: Option<Reset<T>>,
}

impl<T> TypedPool<T> {
    /// Creates an empty pool.
    ///
    /// # Arguments
    ///
    /// * `factory` - Builds a fresh value when the free list is empty
    /// * `max_inactive` - Maximum number of released values retained
    #[must_use]
    pub fn new(factory: impl FnMut() -> T + Send + 'static, max_inactive: usize) -> Self {
        Self {
            free_list: Vec::new(),
            active_count: 0,
            max_inactive,
            factory: Box::new(factory),
            reset: None,
        }
    }

    /// Sets the callback that clears transient state on release.
    #[must_use]
    pub fn with_reset(mut self, reset: impl FnMut(&mut T) + Send + 'static) -> Self {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Takes a value out of the pool.
    ///
    /// Pops the most recently released value, or builds a new one with the
    /// factory when the free list is empty. **O(1)** amortized.
    pub fn get(&mut self) -> T {
        let item = match self.free_list.pop() {
            Some(item) => item,
            None => (self.factory)(),
        };
        self.active_count += 1;
        item
    }

    /// Returns a value to the pool.
    ///
    /// Under capacity the value is reset and shelved. At capacity it is
    /// dropped; that is the memory bound working, not a failure.
    pub fn release(&mut self, mut item: T) {
        self.active_count = self.active_count.saturating_sub(1);

        if self.free_list.len() < self.max_inactive {
            if let Some(reset) = self.reset.as_mut() {
                reset(&mut item);
            }
            self.free_list.push(item);
        } else {
            tracing::trace!("Free list full (max: {}), dropping released value", self.max_inactive);
        }
    }

    /// Builds up to `count` values ahead of time, stopping at capacity.
    ///
    /// # Returns
    ///
    /// The number of values actually created.
    pub fn prewarm(&mut self, count: usize) -> usize {
        let room = self.max_inactive.saturating_sub(self.free_list.len());
        let count = count.min(room);
        self.free_list.reserve(count);
        for _ in 0..count {
            let item = (self.factory)();
            self.free_list.push(item);
        }
        count
    }

    /// Drops every shelved value and zeroes the active counter.
    ///
    /// Values already checked out are unaffected and may still be released.
    pub fn clear(&mut self) {
        self.free_list.clear();
        self.active_count = 0;
    }

    /// Values handed out and not yet released.
    #[inline]
    #[must_use]
    pub const fn count_active(&self) -> usize {
        self.active_count
    }

    /// Values sitting on the free list.
    #[inline]
    #[must_use]
    pub fn count_inactive(&self) -> usize {
        self.free_list.len()
    }

    /// Active plus inactive values.
    #[inline]
    #[must_use]
    pub fn count_all(&self) -> usize {
        self.active_count + self.free_list.len()
    }

    /// Maximum number of inactive values retained.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_inactive
    }

    /// Snapshot of all counters.
    #[must_use]
    pub fn counts(&self) -> PoolCounts {
        PoolCounts {
            active: self.active_count,
            inactive: self.free_list.len(),
            capacity: self.max_inactive,
        }
    }
}

impl<T: Default + 'static> TypedPool<T> {
    /// Creates a pool whose factory is `T::default`.
    #[must_use]
    pub fn with_default(max_inactive: usize) -> Self {
        Self::new(T::default, max_inactive)
    }
}

impl<T> fmt::Debug for TypedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedPool")
            .field("type", &std::any::type_name::<T>())
            .field("active", &self.active_count)
            .field("inactive", &self.free_list.len())
            .field("max_inactive", &self.max_inactive)
            .finish_non_exhaustive()
    }
}

/// The part of a typed pool the registry can drive without knowing `T`.
pub(crate) trait ErasedPool: Any + Send {
    fn clear(&mut self);
    fn counts(&self) -> PoolCounts;
    fn type_name(&self) -> &'static str;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + 'static> ErasedPool for TypedPool<T> {
    fn clear(&mut self) {
        TypedPool::clear(self);
    }

    fn counts(&self) -> PoolCounts {
        TypedPool::counts(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
