//! QuillDB: a consistency-aware execution runtime for replicated
//! column-family stores.
//!
//! ## Crate layout
//! - `core`: options, consistency policy, statement cache, slice cursors,
//!   conditional-write settlement, and observability counters.
//!
//! The `prelude` module mirrors the runtime surface a mapping layer drives.

pub use quilldb_core as core;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use quilldb_core::error::RuntimeError;

///
/// Prelude
///

pub mod prelude {
    pub use quilldb_core::prelude::*;
}
