//! Module: db::port
//! Responsibility: the narrow seam to the host's statement execution facility.
//! Does not own: CQL text generation, row hydration, retry policy, or pooling.
//! Boundary: everything that crosses the wire goes through `StatementPort`.

use crate::{db::consistency::ConsistencyLevel, db::row::Row, error::RuntimeError, value::Value};
use std::sync::Arc;

///
/// PreparedStatement
///
/// Handle for a statement the store has already parsed. Opaque to this
/// runtime beyond the text it was prepared from; the port owns any
/// driver-side identity.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PreparedStatement {
    cql: String,
}

impl PreparedStatement {
    #[must_use]
    pub fn new(cql: impl Into<String>) -> Self {
        Self { cql: cql.into() }
    }

    #[must_use]
    pub fn cql(&self) -> &str {
        &self.cql
    }
}

///
/// BoundStatement
///
/// A prepared statement plus its positional bind values, ready to execute.
///

#[derive(Clone, Debug)]
pub struct BoundStatement {
    statement: Arc<PreparedStatement>,
    values: Vec<Value>,
}

impl BoundStatement {
    #[must_use]
    pub const fn new(statement: Arc<PreparedStatement>, values: Vec<Value>) -> Self {
        Self { statement, values }
    }

    #[must_use]
    pub fn statement(&self) -> &PreparedStatement {
        &self.statement
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

///
/// RowSet
///
/// Result of one execute: raw rows plus, for conditional writes, the
/// store's applied flag. A rejected conditional write echoes the row's
/// current column values as its only row.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowSet {
    rows: Vec<Row>,
    applied: Option<bool>,
}

impl RowSet {
    /// Result of a plain read or unconditional write.
    #[must_use]
    pub const fn of_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            applied: None,
        }
    }

    /// Result of a conditional write whose predicate held.
    #[must_use]
    pub const fn write_applied() -> Self {
        Self {
            rows: Vec::new(),
            applied: Some(true),
        }
    }

    /// Result of a conditional write whose predicate did not hold; `current`
    /// is the row the store echoed back.
    #[must_use]
    pub fn write_rejected(current: Row) -> Self {
        Self {
            rows: vec![current],
            applied: Some(false),
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// `None` for non-conditional statements.
    #[must_use]
    pub const fn applied(&self) -> Option<bool> {
        self.applied
    }
}

///
/// StatementPort
///
/// Execution facility implemented by the host driver. Calls are blocking
/// from this runtime's point of view; an asynchronous host wraps them
/// without changing the contract.
///

pub trait StatementPort {
    /// Parse and register a parameterized statement with the store.
    fn prepare(&self, cql: &str) -> Result<PreparedStatement, RuntimeError>;

    /// Execute a bound statement at the given consistency level.
    fn execute(
        &self,
        statement: &BoundStatement,
        consistency: ConsistencyLevel,
    ) -> Result<RowSet, RuntimeError>;
}
