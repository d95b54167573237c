//! # Pool Statistics
//!
//! Count snapshots and the human-readable registry report.
//!
//! The report text is for logs and debug overlays. It is not a stable format.

use std::fmt;

/// A snapshot of one pool's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolCounts {
    /// Instances currently checked out by callers.
    pub active: usize,
    /// Instances sitting on the free list.
    pub inactive: usize,
    /// Maximum number of inactive instances retained.
    pub capacity: usize,
}

impl PoolCounts {
    /// Total instances known to the pool (active + inactive).
    #[inline]
    #[must_use]
    pub const fn all(&self) -> usize {
        self.active + self.inactive
    }
}

/// Which side of the registry a pool lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PoolKind {
    /// Keyed by name, holds host entities.
    Entity,
    /// Keyed by type, holds plain values.
    Typed,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => f.write_str("entity"),
            Self::Typed => f.write_str("typed"),
        }
    }
}

/// Counters for a single registered pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolStats {
    /// Pool name, or the element type name for typed pools.
    pub name: String,
    /// Registry side.
    pub kind: PoolKind,
    /// Counter snapshot.
    pub counts: PoolCounts,
}

/// Counters for every pool in a registry, entity pools first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// One entry per registered pool.
    pub pools: Vec<PoolStats>,
}

impl PoolReport {
    /// Looks up a pool's counters by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&PoolStats> {
        self.pools.iter().find(|stats| stats.name == name)
    }

    /// Sum of active instances across all pools.
    #[must_use]
    pub fn total_active(&self) -> usize {
        self.pools.iter().map(|stats| stats.counts.active).sum()
    }

    /// Sum of inactive instances across all pools.
    #[must_use]
    pub fn total_inactive(&self) -> usize {
        self.pools.iter().map(|stats| stats.counts.inactive).sum()
    }

    fn write_section(&self, f: &mut fmt::Formatter<'_>, kind: PoolKind) -> fmt::Result {
        let mut any = false;
        for stats in self.pools.iter().filter(|stats| stats.kind == kind) {
            any = true;
            writeln!(
                f,
                "  {}: active={}, inactive={}, max={}",
                stats.name, stats.counts.active, stats.counts.inactive, stats.counts.capacity
            )?;
        }
        if !any {
            writeln!(f, "  (none)")?;
        }
        Ok(())
    }
}

impl fmt::Display for PoolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pool Registry ===")?;
        writeln!(f, "Entity pools:")?;
        self.write_section(f, PoolKind::Entity)?;
        writeln!(f, "Typed pools:")?;
        self.write_section(f, PoolKind::Typed)
    }
}
