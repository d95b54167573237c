//! # Pool Registry
//!
//! One directory for every pool in a running game: entity pools keyed by
//! name, typed pools keyed by element type.
//!
//! ## Lifecycle
//!
//! The registry is an owned value, not a global. Build it once at startup
//! with [`PoolRegistry::init`], pass `&mut` to the systems that spawn and
//! recycle, and call [`PoolRegistry::shutdown`] on scene or process teardown
//! so parked entities are destroyed through the host.
//!
//! ## Degraded Lookups
//!
//! Looking up a pool that was never registered is not fatal. `get` logs a
//! warning and returns `None`, `get_typed` falls back to `T::default()`, and
//! `release` destroys the entity rather than leaking it. The `try_*`
//! variants report [`PoolError`] instead.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::config::{PoolManifest, RegistrySettings};
use crate::entity::{Capability, EntityHost, EntityPool};
use crate::error::{PoolError, PoolResult};
use crate::stats::{PoolKind, PoolReport, PoolStats};
use crate::typed::{ErasedPool, TypedPool};

/// Named entity pools and typed value pools behind one API.
///
/// # Example
///
/// ```rust
/// use guildmaster_pool::{EntityHost, PoolRegistry, TypedPool};
///
/// struct Stage { next: u32 }
///
/// impl EntityHost for Stage {
///     type Entity = u32;
///     type Template = &'static str;
///     type Scope = ();
///     fn instantiate(&mut self, _: &&'static str, _: &()) -> u32 {
///         self.next += 1;
///         self.next
///     }
///     fn set_active(&mut self, _: &mut u32, _: bool) {}
///     fn destroy(&mut self, _: u32) {}
/// }
///
/// let mut pools = PoolRegistry::init(Stage { next: 0 }, ());
/// pools.register_entity_pool("Arrow", "prefabs/arrow", 4, 16);
/// pools.register_typed_pool(TypedPool::new(Vec::<f32>::new, 8).with_reset(Vec::clear), 0);
///
/// let arrow = pools.get("Arrow").unwrap();
/// pools.release("Arrow", arrow);
///
/// let buffer: Vec<f32> = pools.get_typed();
/// pools.release_typed(buffer);
///
/// let _stage = pools.shutdown();
/// ```
pub struct PoolRegistry<H: EntityHost> {
    /// The system that owns every pooled entity.
    host: H,
    /// Scope for entity pools registered without one of their own.
    scope: H::Scope,
    /// Defaults for manifests that carry no `[settings]` table.
    settings: RegistrySettings,
    entity_pools: BTreeMap<String, EntityPool<H>>,
    typed_pools: HashMap<TypeId, Box<dyn ErasedPool>>,
}

impl<H: EntityHost> PoolRegistry<H> {
    /// Creates an empty registry with default settings.
    ///
    /// # Arguments
    ///
    /// * `host` - Owner of every pooled entity
    /// * `scope` - Where entity pools attach new entities, unless registered
    ///   with [`PoolRegistry::register_entity_pool_in`]
    #[must_use]
    pub fn init(host: H, scope: H::Scope) -> Self {
        Self::with_settings(host, scope, RegistrySettings::default())
    }

    /// Creates an empty registry with explicit defaults.
    #[must_use]
    pub fn with_settings(host: H, scope: H::Scope, settings: RegistrySettings) -> Self {
        tracing::info!(
            "Pool registry initialized (default max: {}, default prewarm: {})",
            settings.default_max_size,
            settings.default_prewarm
        );
        Self {
            host,
            scope,
            settings,
            entity_pools: BTreeMap::new(),
            typed_pools: HashMap::new(),
        }
    }

    /// Clears every pool and hands the host back.
    ///
    /// Parked entities are destroyed through the host before it is returned.
    #[must_use = "the host still owns any entities that were checked out"]
    pub fn shutdown(mut self) -> H {
        self.clear_all();
        tracing::info!("Pool registry shut down");
        self.host
    }

    /// The entity host.
    #[inline]
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The entity host, mutably.
    #[inline]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Registry-wide defaults.
    #[inline]
    #[must_use]
    pub const fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Registers an entity pool under `name`, in the registry's scope.
    ///
    /// The first registration wins: if `name` is taken the call does nothing.
    ///
    /// # Returns
    ///
    /// `true` if a new pool was created.
    pub fn register_entity_pool(
        &mut self,
        name: &str,
        template: H::Template,
        prewarm: usize,
        max_size: usize,
    ) -> bool
    where
        H::Scope: Clone,
    {
        let scope = self.scope.clone();
        self.register_entity_pool_in(name, template, scope, prewarm, max_size)
    }

    /// Registers an entity pool under `name` whose entities are created in
    /// `scope` instead of the registry's scope.
    ///
    /// The first registration wins: if `name` is taken the call does nothing
    /// and `template` and `scope` are dropped.
    ///
    /// # Returns
    ///
    /// `true` if a new pool was created.
    pub fn register_entity_pool_in(
        &mut self,
        name: &str,
        template: H::Template,
        scope: H::Scope,
        prewarm: usize,
        max_size: usize,
    ) -> bool {
        if self.entity_pools.contains_key(name) {
            tracing::debug!("Entity pool '{}' already registered", name);
            return false;
        }

        let mut pool = EntityPool::new(name, template, scope, max_size);
        let warmed = if prewarm > 0 {
            pool.prewarm(&mut self.host, prewarm)
        } else {
            0
        };
        tracing::debug!(
            "Entity pool '{}' registered (max: {}, prewarmed: {})",
            name,
            max_size,
            warmed
        );

        self.entity_pools.insert(name.to_owned(), pool);
        true
    }

    /// Registers every pool in a manifest, applying its defaults.
    ///
    /// A manifest without a `[settings]` table uses the registry's settings.
    ///
    /// # Returns
    ///
    /// The number of pools newly created.
    pub fn register_manifest(&mut self, manifest: PoolManifest<H::Template>) -> usize
    where
        H::Scope: Clone,
    {
        let settings = manifest.settings_or(self.settings);
        let mut created = 0;
        for spec in manifest.pools {
            let prewarm = spec.prewarm_or(&settings);
            let max_size = spec.max_size_or(&settings);
            if self.register_entity_pool(&spec.name, spec.template, prewarm, max_size) {
                created += 1;
            }
        }
        created
    }

    /// Registers a typed pool for `T`.
    ///
    /// Only one pool per type is supported. The first registration wins;
    /// later pools for the same `T` are dropped unused.
    ///
    /// # Returns
    ///
    /// `true` if the pool was stored.
    pub fn register_typed_pool<T: Send + 'static>(
        &mut self,
        mut pool: TypedPool<T>,
        prewarm: usize,
    ) -> bool {
        let type_name = std::any::type_name::<T>();
        if self.typed_pools.contains_key(&TypeId::of::<T>()) {
            tracing::debug!("Typed pool for {} already registered", type_name);
            return false;
        }

        let warmed = pool.prewarm(prewarm);
        tracing::debug!(
            "Typed pool for {} registered (max: {}, prewarmed: {})",
            type_name,
            pool.capacity(),
            warmed
        );

        self.typed_pools.insert(TypeId::of::<T>(), Box::new(pool));
        true
    }

    /// Registers a typed pool for `T` from a factory, without a reset callback.
    pub fn register_typed<T: Send + 'static>(
        &mut self,
        factory: impl FnMut() -> T + Send + 'static,
        prewarm: usize,
        max_size: usize,
    ) -> bool {
        self.register_typed_pool(TypedPool::new(factory, max_size), prewarm)
    }

    /// Whether an entity pool is registered under `name`.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.entity_pools.contains_key(name)
    }

    /// Whether a typed pool is registered for `T`.
    #[must_use]
    pub fn is_typed_registered<T: 'static>(&self) -> bool {
        self.typed_pools.contains_key(&TypeId::of::<T>())
    }

    /// The entity pool registered under `name`.
    #[must_use]
    pub fn entity_pool(&self, name: &str) -> Option<&EntityPool<H>> {
        self.entity_pools.get(name)
    }

    /// The typed pool registered for `T`.
    pub fn typed_pool_mut<T: Send + 'static>(&mut self) -> Option<&mut TypedPool<T>> {
        self.typed_pools
            .get_mut(&TypeId::of::<T>())
            .and_then(|pool| pool.as_any_mut().downcast_mut::<TypedPool<T>>())
    }

    // ------------------------------------------------------------------
    // Entity pools
    // ------------------------------------------------------------------

    /// Checks out an entity from the pool named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] if no such pool is registered.
    pub fn try_get(&mut self, name: &str) -> PoolResult<H::Entity> {
        let pool = self
            .entity_pools
            .get_mut(name)
            .ok_or_else(|| PoolError::PoolNotFound {
                name: name.to_owned(),
            })?;
        Ok(pool.get(&mut self.host))
    }

    /// Checks out an entity from the pool named `name`.
    ///
    /// Returns `None` and logs a warning if no such pool is registered.
    pub fn get(&mut self, name: &str) -> Option<H::Entity> {
        match self.try_get(name) {
            Ok(entity) => Some(entity),
            Err(err) => {
                tracing::warn!("Entity get failed: {}", err);
                None
            }
        }
    }

    /// Checks out an entity and narrows it to capability `C`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] if no such pool is registered, or
    /// [`PoolError::CapabilityMismatch`] if the entity does not support `C`.
    pub fn get_as<C: Capability<H::Entity>>(&mut self, name: &str) -> PoolResult<C> {
        let pool = self
            .entity_pools
            .get_mut(name)
            .ok_or_else(|| PoolError::PoolNotFound {
                name: name.to_owned(),
            })?;
        pool.get_as(&mut self.host)
    }

    /// Returns an entity to the pool named `name`.
    ///
    /// If no such pool is registered the entity is destroyed immediately.
    pub fn release(&mut self, name: &str, entity: H::Entity) {
        if let Some(pool) = self.entity_pools.get_mut(name) {
            pool.release(&mut self.host, entity);
            return;
        }

        tracing::warn!("Entity pool '{}' not found, destroying released entity", name);
        if self.host.is_alive(&entity) {
            self.host.destroy(entity);
        }
    }

    /// Returns a narrowed view's entity to the pool named `name`.
    pub fn release_view<C: Capability<H::Entity>>(&mut self, name: &str, view: C) {
        self.release(name, view.widen());
    }

    /// Creates up to `count` more parked entities in the pool named `name`,
    /// stopping at its capacity.
    ///
    /// # Returns
    ///
    /// The number of entities actually created.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] if no such pool is registered.
    pub fn prewarm(&mut self, name: &str, count: usize) -> PoolResult<usize> {
        let Some(pool) = self.entity_pools.get_mut(name) else {
            tracing::warn!("Entity pool '{}' not found, nothing to prewarm", name);
            return Err(PoolError::PoolNotFound {
                name: name.to_owned(),
            });
        };
        let warmed = pool.prewarm(&mut self.host, count);
        tracing::debug!("Entity pool '{}' prewarmed {} of {}", name, warmed, count);
        Ok(warmed)
    }

    /// Destroys the parked entities of one pool and zeroes its counters.
    ///
    /// # Returns
    ///
    /// `false` if no such pool is registered.
    pub fn clear_pool(&mut self, name: &str) -> bool {
        if let Some(pool) = self.entity_pools.get_mut(name) {
            pool.clear(&mut self.host);
            tracing::debug!("Entity pool '{}' cleared", name);
            true
        } else {
            tracing::warn!("Entity pool '{}' not found, nothing to clear", name);
            false
        }
    }

    // ------------------------------------------------------------------
    // Typed pools
    // ------------------------------------------------------------------

    /// Takes a value from the pool for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::TypedPoolNotFound`] if no pool is registered for `T`.
    pub fn try_get_typed<T: Send + 'static>(&mut self) -> PoolResult<T> {
        self.typed_pool_mut::<T>()
            .map(TypedPool::get)
            .ok_or(PoolError::TypedPoolNotFound {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Takes a value from the pool for `T`, or builds one with `fallback`.
    pub fn get_typed_or_else<T: Send + 'static>(&mut self, fallback: impl FnOnce() -> T) -> T {
        match self.try_get_typed() {
            Ok(item) => item,
            Err(err) => {
                tracing::warn!("Typed get failed, using fallback: {}", err);
                fallback()
            }
        }
    }

    /// Takes a value from the pool for `T`, or `T::default()` if none is registered.
    pub fn get_typed<T: Default + Send + 'static>(&mut self) -> T {
        self.get_typed_or_else(T::default)
    }

    /// Returns a value to the pool for `T`.
    ///
    /// If no pool is registered for `T` the value is dropped.
    pub fn release_typed<T: Send + 'static>(&mut self, item: T) {
        match self.typed_pool_mut::<T>() {
            Some(pool) => pool.release(item),
            None => tracing::debug!(
                "Typed pool for {} not found, dropping released value",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Builds up to `count` more values in the pool for `T`, stopping at its
    /// capacity.
    ///
    /// # Returns
    ///
    /// The number of values actually built.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::TypedPoolNotFound`] if no pool is registered for `T`.
    pub fn prewarm_typed<T: Send + 'static>(&mut self, count: usize) -> PoolResult<usize> {
        let type_name = std::any::type_name::<T>();
        let Some(pool) = self.typed_pool_mut::<T>() else {
            tracing::warn!("Typed pool for {} not found, nothing to prewarm", type_name);
            return Err(PoolError::TypedPoolNotFound { type_name });
        };
        let warmed = pool.prewarm(count);
        tracing::debug!("Typed pool for {} prewarmed {} of {}", type_name, warmed, count);
        Ok(warmed)
    }

    // ------------------------------------------------------------------
    // Whole registry
    // ------------------------------------------------------------------

    /// Clears every registered pool. Registrations are kept.
    pub fn clear_all(&mut self) {
        for pool in self.entity_pools.values_mut() {
            pool.clear(&mut self.host);
        }
        for pool in self.typed_pools.values_mut() {
            pool.clear();
        }
        tracing::debug!(
            "All pools cleared ({} entity, {} typed)",
            self.entity_pools.len(),
            self.typed_pools.len()
        );
    }

    /// Counters for every registered pool: entity pools by name, then typed
    /// pools by type name.
    #[must_use]
    pub fn stats(&self) -> PoolReport {
        let mut pools: Vec<PoolStats> = self
            .entity_pools
            .iter()
            .map(|(name, pool)| PoolStats {
                name: name.clone(),
                kind: PoolKind::Entity,
                counts: pool.counts(),
            })
            .collect();

        let mut typed: Vec<PoolStats> = self
            .typed_pools
            .values()
            .map(|pool| PoolStats {
                name: pool.type_name().to_owned(),
                kind: PoolKind::Typed,
                counts: pool.counts(),
            })
            .collect();
        typed.sort_by(|a, b| a.name.cmp(&b.name));

        pools.extend(typed);
        PoolReport { pools }
    }

    /// Human-readable dump of every pool's counters.
    #[must_use]
    pub fn describe_state(&self) -> String {
        self.stats().to_string()
    }
}

impl<H: EntityHost> fmt::Debug for PoolRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("settings", &self.settings)
            .field("entity_pools", &self.entity_pools)
            .field("typed_pools", &self.typed_pools.len())
            .finish_non_exhaustive()
    }
}
