//! # Pool Manifest
//!
//! Entity pools declared in an external TOML file, loaded once at startup.
//!
//! ```toml
//! [settings]
//! default_max_size = 64
//!
//! [[pool]]
//! name = "Arrow"
//! template = "prefabs/arrow"
//! prewarm = 16
//!
//! [[pool]]
//! name = "DamageText"
//! template = "prefabs/damage_text"
//! max_size = 200
//! ```
//!
//! The template type is chosen by the host, so any `Deserialize` type works
//! (a prefab path, a blueprint table, ...).

use std::collections::HashSet;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};
use crate::typed::DEFAULT_MAX_SIZE;

/// Defaults applied to pools that leave a value unspecified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Capacity for pools without an explicit `max_size`.
    pub default_max_size: usize,
    /// Prewarm count for pools without an explicit `prewarm`.
    pub default_prewarm: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            default_max_size: DEFAULT_MAX_SIZE,
            default_prewarm: 0,
        }
    }
}

/// One entity pool declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPoolSpec<T> {
    /// Registry key.
    pub name: String,
    /// What the host instantiates entities from.
    pub template: T,
    /// Entities to create up front.
    #[serde(default)]
    pub prewarm: Option<usize>,
    /// Maximum number of parked entities retained.
    #[serde(default)]
    pub max_size: Option<usize>,
}

impl<T> EntityPoolSpec<T> {
    /// Prewarm count, falling back to the settings default.
    #[must_use]
    pub fn prewarm_or(&self, settings: &RegistrySettings) -> usize {
        self.prewarm.unwrap_or(settings.default_prewarm)
    }

    /// Capacity, falling back to the settings default.
    #[must_use]
    pub fn max_size_or(&self, settings: &RegistrySettings) -> usize {
        self.max_size.unwrap_or(settings.default_max_size)
    }
}

/// A full manifest: settings plus every entity pool declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolManifest<T> {
    /// Defaults for this manifest's pools. When the `[settings]` table is
    /// absent the registry's own settings apply.
    #[serde(default)]
    pub settings: Option<RegistrySettings>,
    /// Entity pools, in declaration order.
    #[serde(default = "Vec::new", rename = "pool")]
    pub pools: Vec<EntityPoolSpec<T>>,
}

impl<T> Default for PoolManifest<T> {
    fn default() -> Self {
        Self {
            settings: None,
            pools: Vec::new(),
        }
    }
}

impl<T: DeserializeOwned> PoolManifest<T> {
    /// Parses and validates a manifest from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidManifest`] on malformed TOML, an empty pool
    /// name, or a duplicated pool name.
    pub fn from_toml_str(text: &str) -> PoolResult<Self> {
        let manifest: Self =
            toml::from_str(text).map_err(|e| PoolError::InvalidManifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reads, parses, and validates a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ManifestIo`] if the file cannot be read, otherwise
    /// the same errors as [`PoolManifest::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> PoolResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PoolError::ManifestIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }
}

impl<T> PoolManifest<T> {
    /// The manifest's own settings, or `fallback` if it declares none.
    #[must_use]
    pub fn settings_or(&self, fallback: RegistrySettings) -> RegistrySettings {
        self.settings.unwrap_or(fallback)
    }

    /// Checks that every pool has a unique, non-empty name.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidManifest`] naming the offending pool.
    pub fn validate(&self) -> PoolResult<()> {
        let mut seen = HashSet::with_capacity(self.pools.len());
        for (index, spec) in self.pools.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(PoolError::InvalidManifest(format!(
                    "pool #{index} has an empty name"
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(PoolError::InvalidManifest(format!(
                    "pool '{}' is declared more than once",
                    spec.name
                )));
            }
        }
        Ok(())
    }
}
