//! # Pool Behaviour Tests
//!
//! End-to-end checks of the pooling contract through the public API:
//!
//! 1. **Bounds**: active never underflows, inactive never exceeds capacity
//! 2. **Reuse**: LIFO order, prewarm, clear
//! 3. **Registry**: degraded lookups, fail-safe release, first registration wins
//!
//! Run with: cargo test -p guildmaster_pool --test pool_properties

use std::cell::Cell;
use std::rc::Rc;

use guildmaster_pool::{
    Capability, EntityHost, PoolError, PoolManifest, PoolRegistry, TypedPool,
};
use serde::Deserialize;

// ============================================================================
// FAKE HOST
// ============================================================================

/// A battle-scene stand-in: entities are numbered actors, destruction is
/// counted through a shared cell so tests can watch it after shutdown.
struct Stage {
    next_id: u32,
    visible: Vec<u32>,
    /// Layer each actor was spawned under, by id.
    layers: Vec<(u32, &'static str)>,
    destroyed: Rc<Cell<usize>>,
}

impl Stage {
    fn new(destroyed: &Rc<Cell<usize>>) -> Self {
        Self {
            next_id: 0,
            visible: Vec::new(),
            layers: Vec::new(),
            destroyed: Rc::clone(destroyed),
        }
    }
}

/// Prefab an actor is cloned from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
enum Prefab {
    Arrow,
    DamageText,
}

/// Actor handle: prefab plus id.
#[derive(Debug, PartialEq, Eq)]
struct Actor {
    id: u32,
    prefab: Prefab,
}

impl EntityHost for Stage {
    type Entity = Actor;
    type Template = Prefab;
    type Scope = &'static str;

    fn instantiate(&mut self, template: &Prefab, scope: &&'static str) -> Actor {
        self.next_id += 1;
        self.layers.push((self.next_id, *scope));
        Actor {
            id: self.next_id,
            prefab: *template,
        }
    }

    fn set_active(&mut self, entity: &mut Actor, active: bool) {
        self.visible.retain(|id| *id != entity.id);
        if active {
            self.visible.push(entity.id);
        }
    }

    fn destroy(&mut self, entity: Actor) {
        self.visible.retain(|id| *id != entity.id);
        self.destroyed.set(self.destroyed.get() + 1);
    }
}

/// Narrowed view of an arrow actor.
struct Arrow(Actor);

impl Capability<Actor> for Arrow {
    fn narrow(entity: Actor) -> Result<Self, Actor> {
        if entity.prefab == Prefab::Arrow {
            Ok(Self(entity))
        } else {
            Err(entity)
        }
    }

    fn widen(self) -> Actor {
        self.0
    }
}

fn battle_registry() -> (PoolRegistry<Stage>, Rc<Cell<usize>>) {
    let destroyed = Rc::new(Cell::new(0));
    let registry = PoolRegistry::init(Stage::new(&destroyed), "BattleLayer");
    (registry, destroyed)
}

// ============================================================================
// TYPED POOL
// ============================================================================

#[test]
fn typed_pool_counts_stay_within_bounds() {
    const MAX: usize = 4;
    let mut pool = TypedPool::new(Vec::<u8>::new, MAX);
    let mut held = Vec::new();

    // Deterministic mix of gets and releases.
    for step in 0u32..500 {
        let roll = step.wrapping_mul(0x9E37_79B9) >> 29;
        if roll < 4 || held.is_empty() {
            held.push(pool.get());
        } else {
            pool.release(held.pop().unwrap());
        }
        assert!(pool.count_inactive() <= MAX);
        assert_eq!(pool.count_active(), held.len());
        assert_eq!(pool.count_all(), held.len() + pool.count_inactive());
    }
}

#[test]
fn typed_pool_lifo_reuse() {
    let mut next = 0u32;
    let mut pool = TypedPool::new(
        move || {
            next += 1;
            next
        },
        2,
    );

    let a = pool.get();
    let b = pool.get();
    pool.release(a);
    pool.release(b);

    assert_eq!(pool.get(), b);
    assert_eq!(pool.get(), a);
}

#[test]
fn typed_pool_prewarm_and_clear() {
    let mut pool = TypedPool::new(String::new, 10);

    assert_eq!(pool.prewarm(5), 5);
    assert_eq!(pool.count_inactive(), 5);
    assert_eq!(pool.count_active(), 0);

    let _held = pool.get();
    pool.clear();
    assert_eq!(pool.count_active(), 0);
    assert_eq!(pool.count_inactive(), 0);
}

#[test]
fn typed_pool_release_beyond_capacity() {
    let mut pool = TypedPool::new(String::new, 1);

    let a = pool.get();
    let b = pool.get();
    pool.release(a);
    pool.release(b);

    assert_eq!(pool.count_inactive(), 1);
}

// ============================================================================
// REGISTRY
// ============================================================================

#[test]
fn registry_unregistered_get_is_absent() {
    let (mut pools, _) = battle_registry();

    assert!(pools.get("Fireball").is_none());
    assert!(matches!(
        pools.get_as::<Arrow>("Fireball"),
        Err(PoolError::PoolNotFound { .. })
    ));
}

#[test]
fn registry_unregistered_release_destroys() {
    let (mut pools, destroyed) = battle_registry();
    pools.register_entity_pool("Arrow", Prefab::Arrow, 0, 4);

    let arrow = pools.get("Arrow").unwrap();
    pools.release("Fireball", arrow);

    assert_eq!(destroyed.get(), 1);
    assert!(pools.host().visible.is_empty());
}

#[test]
fn registry_typed_registration_is_idempotent() {
    let (mut pools, _) = battle_registry();

    assert!(pools.register_typed_pool(TypedPool::new(|| vec![1u8], 2), 0));
    assert!(!pools.register_typed_pool(TypedPool::new(|| vec![2u8, 2], 50), 10));

    assert_eq!(pools.get_typed::<Vec<u8>>(), vec![1u8]);
    let pool = pools.typed_pool_mut::<Vec<u8>>().unwrap();
    assert_eq!(pool.capacity(), 2);
    assert_eq!(pool.count_inactive(), 0);
}

#[test]
fn registry_entities_toggle_visibility() {
    let (mut pools, destroyed) = battle_registry();
    pools.register_entity_pool("Arrow", Prefab::Arrow, 2, 2);
    assert!(pools.host().visible.is_empty());

    let first = pools.get("Arrow").unwrap();
    let second = pools.get("Arrow").unwrap();
    let third = pools.get("Arrow").unwrap();
    assert_eq!(pools.host().visible.len(), 3);

    pools.release("Arrow", first);
    pools.release("Arrow", second);
    pools.release("Arrow", third);

    assert!(pools.host().visible.is_empty());
    assert_eq!(destroyed.get(), 1);
    let arrow = pools.entity_pool("Arrow").unwrap();
    assert_eq!(arrow.count_inactive(), 2);
    assert_eq!(arrow.count_active(), 0);
}

#[test]
fn registry_capability_views() {
    let (mut pools, _) = battle_registry();
    pools.register_entity_pool("Arrow", Prefab::Arrow, 0, 4);
    pools.register_entity_pool("DamageText", Prefab::DamageText, 0, 4);

    let arrow: Arrow = pools.get_as("Arrow").unwrap();
    pools.release_view("Arrow", arrow);
    assert_eq!(pools.entity_pool("Arrow").unwrap().count_inactive(), 1);

    let mismatch = pools.get_as::<Arrow>("DamageText");
    assert!(matches!(
        mismatch,
        Err(PoolError::CapabilityMismatch { ref pool, .. }) if pool == "DamageText"
    ));
    let text = pools.entity_pool("DamageText").unwrap();
    assert_eq!(text.count_active(), 0);
    assert_eq!(text.count_inactive(), 1);
}

#[test]
fn registry_pools_spawn_under_their_own_layer() {
    let (mut pools, _) = battle_registry();
    assert!(pools.register_entity_pool("Arrow", Prefab::Arrow, 1, 4));
    assert!(pools.register_entity_pool_in("DamageText", Prefab::DamageText, "UiLayer", 1, 4));
    assert!(!pools.register_entity_pool_in("Arrow", Prefab::Arrow, "UiLayer", 0, 4));

    assert_eq!(pools.prewarm("DamageText", 1), Ok(1));
    let arrow = pools.get("Arrow").unwrap();
    let text = pools.get("DamageText").unwrap();

    let layer_of = |id: u32| {
        pools
            .host()
            .layers
            .iter()
            .find(|(actor, _)| *actor == id)
            .map(|(_, layer)| *layer)
    };
    assert_eq!(layer_of(arrow.id), Some("BattleLayer"));
    assert_eq!(layer_of(text.id), Some("UiLayer"));
    assert_eq!(
        pools.host().layers.iter().filter(|(_, layer)| *layer == "UiLayer").count(),
        2
    );
}

#[test]
fn registry_manifest_and_shutdown() {
    let manifest = PoolManifest::<Prefab>::from_toml_str(
        r#"
        [settings]
        default_max_size = 8

        [[pool]]
        name = "Arrow"
        template = "Arrow"
        prewarm = 3

        [[pool]]
        name = "DamageText"
        template = "DamageText"
        prewarm = 2
        max_size = 2
        "#,
    )
    .unwrap();

    let (mut pools, destroyed) = battle_registry();
    assert_eq!(pools.register_manifest(manifest), 2);

    let held = pools.get("Arrow").unwrap();
    let report = pools.stats();
    assert_eq!(report.find("Arrow").unwrap().counts.active, 1);
    assert_eq!(report.find("Arrow").unwrap().counts.inactive, 2);
    assert_eq!(report.find("DamageText").unwrap().counts.capacity, 2);
    assert!(pools.describe_state().contains("DamageText: active=0, inactive=2, max=2"));

    let mut stage = pools.shutdown();
    assert_eq!(destroyed.get(), 4);

    stage.destroy(held);
    assert_eq!(destroyed.get(), 5);
}
