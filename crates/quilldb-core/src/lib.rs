//! Core runtime for QuillDB: the execution layer between an object/row
//! mapping layer and a replicated column-family store. Per-operation
//! options, consistency resolution, prepared-statement caching, keyset
//! slice cursors, and conditional-write settlement.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod error;
pub mod obs;
pub mod value;

///
/// Prelude
///
/// The surface a mapping layer drives: option construction, policy
/// resolution, cache, cursor, and the write path.
///

pub mod prelude {
    pub use crate::{
        db::{
            Direction,
            batch::{BatchWindow, PendingWrite},
            consistency::{
                AccessKind, ConsistencyConfig, ConsistencyLevel, ConsistencyPolicy,
                ScopedOverride, apply_batch_override, with_scoped_override,
            },
            cursor::{PageBound, PageRequest, SliceBounds, SliceCursor, SliceFetcher},
            lwt::{LwtListener, LwtOutcome, LwtResult, WriteOp},
            metadata::TableProfile,
            options::{Options, OptionsBuilder},
            port::{BoundStatement, PreparedStatement, RowSet, StatementPort},
            row::Row,
            statement::{StatementCache, StatementKind, StatementShape},
            write::execute_conditional,
        },
        error::RuntimeError,
        value::Value,
    };
}
