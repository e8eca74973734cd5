//! Module: db::options
//! Responsibility: the immutable per-operation configuration bundle and its
//! construction-time validation.
//! Does not own: consistency resolution (policy), write settlement, batching.


use crate::{db::consistency::ConsistencyLevel, db::lwt::LwtListener, value::Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// Options
///
/// Immutable per-operation configuration: consistency, TTL, write timestamp,
/// conditional-write predicate, and an optional LWT listener. Built through
/// [`OptionsBuilder`]; the only derivations are [`Options::with_consistency`]
/// and [`Options::without_ttl_and_timestamp`], both pure.
///

#[derive(Clone, Default)]
pub struct Options {
    consistency: Option<ConsistencyLevel>,
    ttl_seconds: Option<u32>,
    timestamp_micros: Option<i64>,
    condition: Option<WriteCondition>,
    lwt_listener: Option<Arc<dyn LwtListener>>,
}

impl Options {
    /// Options with every field unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    #[must_use]
    pub const fn consistency(&self) -> Option<ConsistencyLevel> {
        self.consistency
    }

    #[must_use]
    pub const fn ttl_seconds(&self) -> Option<u32> {
        self.ttl_seconds
    }

    #[must_use]
    pub const fn timestamp_micros(&self) -> Option<i64> {
        self.timestamp_micros
    }

    #[must_use]
    pub const fn condition(&self) -> Option<&WriteCondition> {
        self.condition.as_ref()
    }

    #[must_use]
    pub fn lwt_listener(&self) -> Option<&dyn LwtListener> {
        self.lwt_listener.as_deref()
    }

    /// Derive options with only the consistency field replaced.
    /// TTL, timestamp, conditions, and listener are untouched.
    #[must_use]
    pub fn with_consistency(&self, level: ConsistencyLevel) -> Self {
        let mut next = self.clone();
        next.consistency = Some(level);
        next
    }

    /// Derive options keeping only the consistency field.
    ///
    /// Used when a secondary statement inherits the caller's consistency but
    /// must not repeat its TTL, timestamp, or conditional predicate.
    #[must_use]
    pub fn without_ttl_and_timestamp(&self) -> Self {
        Self {
            consistency: self.consistency,
            ..Self::default()
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("consistency", &self.consistency)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("timestamp_micros", &self.timestamp_micros)
            .field("condition", &self.condition)
            .field("lwt_listener", &self.lwt_listener.is_some())
            .finish()
    }
}

///
/// WriteCondition
///
/// Conditional-write predicate. Existence and equality strategies are
/// incompatible by contract, so the enum makes the exclusion structural;
/// the builder rejects the mixed combinations at call time.
///

#[derive(Clone, Debug, PartialEq)]
pub enum WriteCondition {
    IfExists,
    IfNotExists,
    /// Per-column equality predicates, in insertion order.
    IfEqual(Vec<(String, Value)>),
}

impl WriteCondition {
    #[must_use]
    pub const fn existence(&self) -> Option<ExistenceKind> {
        match self {
            Self::IfExists => Some(ExistenceKind::IfExists),
            Self::IfNotExists => Some(ExistenceKind::IfNotExists),
            Self::IfEqual(_) => None,
        }
    }
}

///
/// ExistenceKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ExistenceKind {
    IfExists,
    IfNotExists,
}

impl fmt::Display for ExistenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::IfExists => "IF EXISTS",
            Self::IfNotExists => "IF NOT EXISTS",
        };
        write!(f, "{label}")
    }
}

///
/// OptionsError
///
/// Invalid option combinations, rejected at the offending builder call,
/// before any network activity.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum OptionsError {
    #[error("equality condition cannot be combined with {existing}")]
    EqualityAfterExistence { existing: ExistenceKind },

    #[error("{requested} cannot be combined with equality conditions")]
    ExistenceAfterEquality { requested: ExistenceKind },

    #[error("{requested} conflicts with previously set {existing}")]
    ExistenceAlreadySet {
        requested: ExistenceKind,
        existing: ExistenceKind,
    },
}

///
/// OptionsBuilder
///
/// Fluent construction for [`Options`]. Condition setters are fallible so an
/// incompatible combination fails at the call that introduces it.
///

#[derive(Clone, Default)]
pub struct OptionsBuilder {
    inner: Options,
}

impl OptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.inner.consistency = Some(level);
        self
    }

    #[must_use]
    pub fn ttl_seconds(mut self, seconds: u32) -> Self {
        self.inner.ttl_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn timestamp_micros(mut self, micros: i64) -> Self {
        self.inner.timestamp_micros = Some(micros);
        self
    }

    #[must_use]
    pub fn lwt_listener(mut self, listener: Arc<dyn LwtListener>) -> Self {
        self.inner.lwt_listener = Some(listener);
        self
    }

    /// Require the row to exist.
    pub fn if_exists(self) -> Result<Self, OptionsError> {
        self.existence(ExistenceKind::IfExists)
    }

    /// Require the row to not exist.
    pub fn if_not_exists(self) -> Result<Self, OptionsError> {
        self.existence(ExistenceKind::IfNotExists)
    }

    /// Require a column to currently equal a value. May be called repeatedly;
    /// predicates keep their insertion order.
    pub fn if_equal(
        mut self,
        column: impl Into<String>,
        expected: Value,
    ) -> Result<Self, OptionsError> {
        match &mut self.inner.condition {
            None => {
                self.inner.condition =
                    Some(WriteCondition::IfEqual(vec![(column.into(), expected)]));
                Ok(self)
            }
            Some(WriteCondition::IfEqual(conditions)) => {
                conditions.push((column.into(), expected));
                Ok(self)
            }
            Some(WriteCondition::IfExists) => Err(OptionsError::EqualityAfterExistence {
                existing: ExistenceKind::IfExists,
            }),
            Some(WriteCondition::IfNotExists) => Err(OptionsError::EqualityAfterExistence {
                existing: ExistenceKind::IfNotExists,
            }),
        }
    }

    #[must_use]
    pub fn build(self) -> Options {
        self.inner
    }

    fn existence(mut self, requested: ExistenceKind) -> Result<Self, OptionsError> {
        match &self.inner.condition {
            None => {
                self.inner.condition = Some(match requested {
                    ExistenceKind::IfExists => WriteCondition::IfExists,
                    ExistenceKind::IfNotExists => WriteCondition::IfNotExists,
                });
                Ok(self)
            }
            Some(WriteCondition::IfEqual(_)) => {
                Err(OptionsError::ExistenceAfterEquality { requested })
            }
            Some(WriteCondition::IfExists) => Err(OptionsError::ExistenceAlreadySet {
                requested,
                existing: ExistenceKind::IfExists,
            }),
            Some(WriteCondition::IfNotExists) => Err(OptionsError::ExistenceAlreadySet {
                requested,
                existing: ExistenceKind::IfNotExists,
            }),
        }
    }
}

impl fmt::Debug for OptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsBuilder")
            .field("inner", &self.inner)
            .finish()
    }
}
