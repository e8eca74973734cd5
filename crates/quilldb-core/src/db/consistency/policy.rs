use crate::db::{
    consistency::{AccessKind, ConsistencyLevel, scope},
    options::Options,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

///
/// TableConsistency
///
/// Per-table default levels in configuration. Either direction may be left
/// unset to fall through to the global default.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableConsistency {
    #[serde(default)]
    pub read: Option<ConsistencyLevel>,
    #[serde(default)]
    pub write: Option<ConsistencyLevel>,
}

///
/// ConsistencyConfig
///
/// Startup configuration for the policy: global read/write defaults plus
/// per-table sections.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ConsistencyConfig {
    #[serde(default = "default_level")]
    pub read: ConsistencyLevel,
    #[serde(default = "default_level")]
    pub write: ConsistencyLevel,
    #[serde(default)]
    pub tables: BTreeMap<String, TableConsistency>,
}

const fn default_level() -> ConsistencyLevel {
    ConsistencyLevel::One
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            read: default_level(),
            write: default_level(),
            tables: BTreeMap::new(),
        }
    }
}

///
/// ConsistencyPolicy
///
/// Resolves the effective consistency level for every operation. Globals are
/// fixed at construction; per-table defaults are runtime-reconfigurable and
/// shared, so they sit behind an `RwLock` and readers never block each other.
///
/// Resolution order, highest priority first: explicit level on the
/// operation's `Options`, scoped override for the active unit of work,
/// per-table default for the direction, global default for the direction.
///

#[derive(Debug)]
pub struct ConsistencyPolicy {
    global_read: ConsistencyLevel,
    global_write: ConsistencyLevel,
    table_read: RwLock<BTreeMap<String, ConsistencyLevel>>,
    table_write: RwLock<BTreeMap<String, ConsistencyLevel>>,
}

impl ConsistencyPolicy {
    #[must_use]
    pub fn new(global_read: ConsistencyLevel, global_write: ConsistencyLevel) -> Self {
        Self {
            global_read,
            global_write,
            table_read: RwLock::new(BTreeMap::new()),
            table_write: RwLock::new(BTreeMap::new()),
        }
    }

    /// Build the policy from startup configuration.
    #[must_use]
    pub fn from_config(config: &ConsistencyConfig) -> Self {
        let policy = Self::new(config.read, config.write);
        for (table, levels) in &config.tables {
            if let Some(level) = levels.read {
                policy.set_table_default(table.clone(), AccessKind::Read, level);
            }
            if let Some(level) = levels.write {
                policy.set_table_default(table.clone(), AccessKind::Write, level);
            }
        }

        policy
    }

    /// Effective level for a read against `table`.
    #[must_use]
    pub fn resolve_read(&self, table: &str, options: &Options) -> ConsistencyLevel {
        self.resolve(AccessKind::Read, table, options.consistency())
    }

    /// Effective level for a write against `table`.
    #[must_use]
    pub fn resolve_write(&self, table: &str, options: &Options) -> ConsistencyLevel {
        self.resolve(AccessKind::Write, table, options.consistency())
    }

    /// Set or replace the per-table default for one direction.
    pub fn set_table_default(
        &self,
        table: impl Into<String>,
        kind: AccessKind,
        level: ConsistencyLevel,
    ) {
        self.table_map(kind)
            .write()
            .expect("consistency table map lock poisoned")
            .insert(table.into(), level);
    }

    /// Remove the per-table default for one direction, if set.
    pub fn clear_table_default(&self, table: &str, kind: AccessKind) {
        self.table_map(kind)
            .write()
            .expect("consistency table map lock poisoned")
            .remove(table);
    }

    /// Current per-table default for one direction, if set.
    #[must_use]
    pub fn table_default(&self, table: &str, kind: AccessKind) -> Option<ConsistencyLevel> {
        self.table_map(kind)
            .read()
            .expect("consistency table map lock poisoned")
            .get(table)
            .copied()
    }

    #[must_use]
    pub const fn global_default(&self, kind: AccessKind) -> ConsistencyLevel {
        match kind {
            AccessKind::Read => self.global_read,
            AccessKind::Write => self.global_write,
        }
    }

    fn resolve(
        &self,
        kind: AccessKind,
        table: &str,
        explicit: Option<ConsistencyLevel>,
    ) -> ConsistencyLevel {
        if let Some(level) = explicit {
            return level;
        }
        if let Some(level) = scope::current_override(kind) {
            return level;
        }
        if let Some(level) = self.table_default(table, kind) {
            return level;
        }

        self.global_default(kind)
    }

    const fn table_map(&self, kind: AccessKind) -> &RwLock<BTreeMap<String, ConsistencyLevel>> {
        match kind {
            AccessKind::Read => &self.table_read,
            AccessKind::Write => &self.table_write,
        }
    }
}

/// Replace an operation's consistency with the batch's level at flush time.
///
/// The batch level always wins, whether or not the operation carried its own
/// level; TTL, timestamp, conditions, and listener pass through untouched.
#[must_use]
pub fn apply_batch_override(options: &Options, batch_level: ConsistencyLevel) -> Options {
    options.with_consistency(batch_level)
}
