//! Scoped consistency overrides for one unit of work.
//!
//! The override is thread-local and only reachable through a guard, so it is
//! restored on every exit path, including unwind. There is no bare set/clear
//! surface.

use crate::db::consistency::{AccessKind, ConsistencyLevel};
use std::cell::Cell;
use std::thread::LocalKey;

thread_local! {
    static READ_OVERRIDE: Cell<Option<ConsistencyLevel>> = const { Cell::new(None) };
    static WRITE_OVERRIDE: Cell<Option<ConsistencyLevel>> = const { Cell::new(None) };
}

const fn slot(kind: AccessKind) -> &'static LocalKey<Cell<Option<ConsistencyLevel>>> {
    match kind {
        AccessKind::Read => &READ_OVERRIDE,
        AccessKind::Write => &WRITE_OVERRIDE,
    }
}

/// Current scoped override for the calling thread, if one is active.
pub(crate) fn current_override(kind: AccessKind) -> Option<ConsistencyLevel> {
    slot(kind).with(Cell::get)
}

///
/// ScopedOverride
///
/// RAII guard forcing one consistency level for the current unit of work.
/// Dropping the guard restores whatever was in effect before, so nested
/// scopes compose and an unwinding scope never leaks its level into later
/// work on the same thread.
///

#[must_use = "the override is cleared as soon as the guard drops"]
pub struct ScopedOverride {
    kind: AccessKind,
    prev: Option<ConsistencyLevel>,
}

impl ScopedOverride {
    /// Install `level` as the scoped override for `kind` on this thread.
    pub fn set(kind: AccessKind, level: ConsistencyLevel) -> Self {
        let prev = slot(kind).with(|cell| cell.replace(Some(level)));

        Self { kind, prev }
    }

    #[must_use]
    pub const fn kind(&self) -> AccessKind {
        self.kind
    }
}

impl Drop for ScopedOverride {
    fn drop(&mut self) {
        slot(self.kind).with(|cell| cell.set(self.prev));
    }
}

/// Run a closure with a scoped consistency override installed.
pub fn with_scoped_override<R>(
    kind: AccessKind,
    level: ConsistencyLevel,
    f: impl FnOnce() -> R,
) -> R {
    let _guard = ScopedOverride::set(kind, level);

    f()
}
