//! Module: db::consistency
//! Responsibility: the consistency level vocabulary and the policy that
//! resolves an effective level per operation from overlapping scopes.
//! Does not own: wire semantics of levels, option construction, batching.

mod level;
mod policy;
mod scope;

#[cfg(test)]
mod tests;

pub use level::{AccessKind, ConsistencyLevel};
pub use policy::{ConsistencyConfig, ConsistencyPolicy, TableConsistency, apply_batch_override};
pub use scope::{ScopedOverride, with_scoped_override};
