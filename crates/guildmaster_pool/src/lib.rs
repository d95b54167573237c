//! # GuildMaster Pools
//!
//! Object pooling for objects the game recycles every frame: battle
//! projectiles, floating damage numbers, scratch buffers for stat math.
//!
//! ## Pieces
//!
//! 1. **[`TypedPool`]** - free-list pool for plain values, keyed by type
//! 2. **[`EntityPool`]** - free-list pool for entities owned by an [`EntityHost`]
//!    (the engine), toggled active/inactive instead of rebuilt
//! 3. **[`PoolRegistry`]** - named entity pools and typed pools behind one
//!    API, with an explicit `init` / `shutdown` lifecycle
//!
//! ## Rules
//!
//! - Free lists are LIFO and never grow past a pool's capacity
//! - Over-capacity releases are dropped (values) or destroyed (entities)
//! - Missing pools degrade instead of aborting: see [`registry`]
//! - Single-threaded by default; see [`sync`] for multi-threaded hosts
//!
//! ## Example
//!
//! ```rust,ignore
//! use guildmaster_pool::{PoolManifest, PoolRegistry};
//!
//! let manifest = PoolManifest::from_toml_file("data/pools.toml")?;
//! let mut pools = PoolRegistry::init(stage, battle_layer);
//! pools.register_manifest(manifest);
//!
//! let arrow = pools.get("Arrow");
//! // ...
//! let stage = pools.shutdown();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod entity;
pub mod error;
pub mod registry;
pub mod stats;
pub mod sync;
pub mod typed;

pub use config::{EntityPoolSpec, PoolManifest, RegistrySettings};
pub use entity::{Capability, EntityHost, EntityPool};
pub use error::{PoolError, PoolResult};
pub use registry::PoolRegistry;
pub use stats::{PoolCounts, PoolKind, PoolReport, PoolStats};
pub use sync::{SharedPool, SharedRegistry};
pub use typed::{TypedPool, DEFAULT_MAX_SIZE};
