//! # Entity Pool
//!
//! Free-list pool for heavyweight entities owned by a host system (the engine).
//!
//! The pool never builds or tears down entities itself. It asks the
//! [`EntityHost`] to instantiate them from a template, to toggle them between
//! active and inactive, and to destroy the ones it will not keep.
//!
//! ## Lifecycle
//!
//! ```text
//!   Free ──get──▶ Active ──release (room left)──▶ Free
//!                   │
//!                   └──release (pool full)──▶ Destroyed
//!   Free ──clear──▶ Destroyed
//! ```
//!
//! `release` takes the entity by value: ownership goes back to the pool, and
//! the pool alone decides whether it is kept or destroyed.

use std::fmt;

use crate::error::{PoolError, PoolResult};
use crate::stats::PoolCounts;

/// The system that owns entities: builds, toggles, and destroys them.
pub trait EntityHost {
    /// Handle to a live entity.
    type Entity: PartialEq + fmt::Debug;
    /// Description an entity is instantiated from (a prefab, a blueprint, ...).
    type Template;
    /// Owning context new entities are attached to (a parent node, a layer, ...).
    type Scope;

    /// Builds a new entity from `template` under `scope`.
    fn instantiate(&mut self, template: &Self::Template, scope: &Self::Scope) -> Self::Entity;

    /// Makes the entity visible and operational, or hides and parks it.
    fn set_active(&mut self, entity: &mut Self::Entity, active: bool);

    /// Permanently destroys the entity. Irreversible.
    fn destroy(&mut self, entity: Self::Entity);

    /// Whether the entity still exists. Hosts that can lose entities behind
    /// the pool's back (scene unloads) should override this.
    fn is_alive(&self, _entity: &Self::Entity) -> bool {
        true
    }

    /// Runs after an entity is activated by a pool checkout.
    fn on_spawn(&mut self, _entity: &mut Self::Entity) {}
}

/// A narrowed view of an entity, such as a projectile or a damage label.
pub trait Capability<E>: Sized {
    /// Narrows the entity, or hands it back untouched if it lacks the capability.
    ///
    /// # Errors
    ///
    /// Returns the original entity when it does not support this capability.
    fn narrow(entity: E) -> Result<Self, E>;

    /// Recovers the underlying entity.
    fn widen(self) -> E;
}

/// A free-list pool of host entities sharing one template.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. It is driven from the host's update loop.
pub struct EntityPool<H: EntityHost> {
    /// Pool name, used in diagnostics.
    name: String,
    template: H::Template,
    scope: H::Scope,
    /// Inactive entities, most recently released last.
    free_list: Vec<H::Entity>,
    /// Entities handed out and not yet released.
    active_count: usize,
    /// Upper bound on `free_list.len()`.
    max_inactive: usize,
}

impl<H: EntityHost> EntityPool<H> {
    /// Creates an empty pool.
    ///
    /// # Arguments
    ///
    /// * `name` - Diagnostic name
    /// * `template` - What new entities are instantiated from
    /// * `scope` - Where new entities are attached
    /// * `max_inactive` - Maximum number of parked entities retained
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        template: H::Template,
        scope: H::Scope,
        max_inactive: usize,
    ) -> Self {
        Self {
            name: name.into(),
            template,
            scope,
            free_list: Vec::new(),
            active_count: 0,
            max_inactive,
        }
    }

    /// Pool name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks out an active entity.
    ///
    /// Reuses the most recently parked entity that is still alive, otherwise
    /// instantiates a new one. The entity is activated and the host's spawn
    /// hook runs before it is returned.
    pub fn get(&mut self, host: &mut H) -> H::Entity {
        let mut entity = loop {
            match self.free_list.pop() {
                Some(entity) if host.is_alive(&entity) => break entity,
                Some(_) => {}
                None => break host.instantiate(&self.template, &self.scope),
            }
        };

        host.set_active(&mut entity, true);
        host.on_spawn(&mut entity);
        self.active_count += 1;
        entity
    }

    /// Checks out an entity and narrows it to capability `C`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::CapabilityMismatch`] if the entity does not
    /// support `C`. The entity is released back to this pool first.
    pub fn get_as<C: Capability<H::Entity>>(&mut self, host: &mut H) -> PoolResult<C> {
        let entity = self.get(host);
        match C::narrow(entity) {
            Ok(view) => Ok(view),
            Err(entity) => {
                let capability = std::any::type_name::<C>();
                tracing::error!("Entity from pool '{}' lacks capability {}", self.name, capability);
                self.release(host, entity);
                Err(PoolError::CapabilityMismatch {
                    pool: self.name.clone(),
                    capability,
                })
            }
        }
    }

    /// Returns an entity to the pool.
    ///
    /// The entity is deactivated, then parked if there is room or destroyed
    /// if the pool is full. Entities the host already tore down are only
    /// counted back in.
    pub fn release(&mut self, host: &mut H, mut entity: H::Entity) {
        if cfg!(debug_assertions) && self.free_list.contains(&entity) {
            tracing::error!("Entity {:?} released twice to pool '{}', ignoring", entity, self.name);
            return;
        }

        self.active_count = self.active_count.saturating_sub(1);

        if !host.is_alive(&entity) {
            return;
        }

        host.set_active(&mut entity, false);
        if self.free_list.len() < self.max_inactive {
            self.free_list.push(entity);
        } else {
            tracing::trace!(
                "Pool '{}' full (max: {}), destroying entity",
                self.name,
                self.max_inactive
            );
            host.destroy(entity);
        }
    }

    /// Returns a narrowed view's entity to the pool.
    pub fn release_view<C: Capability<H::Entity>>(&mut self, host: &mut H, view: C) {
        self.release(host, view.widen());
    }

    /// Instantiates up to `count` parked entities, stopping at capacity.
    ///
    /// # Returns
    ///
    /// The number of entities actually created.
    pub fn prewarm(&mut self, host: &mut H, count: usize) -> usize {
        let room = self.max_inactive.saturating_sub(self.free_list.len());
        let count = count.min(room);
        self.free_list.reserve(count);
        for _ in 0..count {
            let mut entity = host.instantiate(&self.template, &self.scope);
            host.set_active(&mut entity, false);
            self.free_list.push(entity);
        }
        count
    }

    /// Destroys every parked entity and zeroes the active counter.
    ///
    /// Entities already checked out are unaffected.
    pub fn clear(&mut self, host: &mut H) {
        for entity in self.free_list.drain(..) {
            if host.is_alive(&entity) {
                host.destroy(entity);
            }
        }
        self.active_count = 0;
    }

    /// Entities handed out and not yet released.
    #[inline]
    #[must_use]
    pub const fn count_active(&self) -> usize {
        self.active_count
    }

    /// Entities parked on the free list.
    #[inline]
    #[must_use]
    pub fn count_inactive(&self) -> usize {
        self.free_list.len()
    }

    /// Active plus parked entities.
    #[inline]
    #[must_use]
    pub fn count_all(&self) -> usize {
        self.active_count + self.free_list.len()
    }

    /// Maximum number of parked entities retained.
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

impl<H: EntityHost> fmt::Debug for EntityPool<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityPool")
            .field("name", &self.name)
            .field("active", &self.active_count)
            .field("inactive", &self.free_list.len())
            .field("max_inactive", &self.max_inactive)
            .finish_non_exhaustive()
    }
}
