use crate::{db::row::Row, error::RuntimeError, value::Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

///
/// WriteOp
///
/// Which conditional statement kind produced an outcome.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum WriteOp {
    Insert,
    Update,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
        };
        write!(f, "{label}")
    }
}

///
/// LwtResult
///
/// Payload of a conditional write whose predicate did not hold: the
/// operation kind and the row's current column values as echoed by the
/// store. Built only on the not-applied path.
///

#[derive(Clone, Debug, PartialEq)]
pub struct LwtResult {
    operation: WriteOp,
    current_values: BTreeMap<String, Value>,
}

impl LwtResult {
    #[must_use]
    pub const fn new(operation: WriteOp, current_values: BTreeMap<String, Value>) -> Self {
        Self {
            operation,
            current_values,
        }
    }

    /// Build the payload from the echoed row of a rejected write.
    #[must_use]
    pub fn from_row(operation: WriteOp, current: Row) -> Self {
        Self::new(operation, current.into_columns())
    }

    #[must_use]
    pub const fn operation(&self) -> WriteOp {
        self.operation
    }

    #[must_use]
    pub const fn current_values(&self) -> &BTreeMap<String, Value> {
        &self.current_values
    }

    #[must_use]
    pub fn current_value(&self, column: &str) -> Option<&Value> {
        self.current_values.get(column)
    }
}

impl fmt::Display for LwtResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "conditional {} was not applied ({} current column(s))",
            self.operation,
            self.current_values.len()
        )
    }
}

///
/// LwtOutcome
///
/// Tagged outcome of a conditional write. Callers pattern-match it directly
/// or adapt it to a listener via `Options`.
///

#[derive(Clone, Debug, PartialEq)]
pub enum LwtOutcome {
    Applied,
    Rejected(LwtResult),
}

impl LwtOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    #[must_use]
    pub const fn rejected(&self) -> Option<&LwtResult> {
        match self {
            Self::Applied => None,
            Self::Rejected(result) => Some(result),
        }
    }

    /// Convert to a `Result`, turning a rejection into the typed error.
    pub fn into_result(self) -> Result<(), RuntimeError> {
        match self {
            Self::Applied => Ok(()),
            Self::Rejected(result) => Err(RuntimeError::lwt_rejected(result)),
        }
    }
}

///
/// LwtListener
///
/// Callback contract for conditional-write outcomes. A registered listener
/// converts what would otherwise be a rejected-write error into a hook
/// invocation.
///

pub trait LwtListener: Send + Sync {
    /// Predicate held and the write applied. Default is a no-op.
    fn on_applied(&self) {}

    /// Predicate did not hold; `result` carries the row's current values.
    fn on_rejected(&self, result: &LwtResult);
}
