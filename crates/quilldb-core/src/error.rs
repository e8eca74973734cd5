use crate::db::{cursor::BoundsError, lwt::LwtResult, options::OptionsError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// RuntimeError
///
/// Structured runtime error with a stable internal classification.
/// Every failure this runtime can surface is a `RuntimeError`; the
/// class/origin pair is the taxonomy, `detail` carries structured payloads
/// where a caller needs more than a message.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct RuntimeError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `class`.
    pub detail: Option<ErrorDetail>,
}

impl RuntimeError {
    /// Construct a `RuntimeError` with no structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a storage error for an I/O failure reported by the host
    /// driver. Public so port and fetcher implementations can classify their
    /// failures the way the runtime expects.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Storage, ErrorOrigin::Port, message)
    }

    /// Construct a preparation error for a failed statement generator.
    pub fn preparation(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Preparation, ErrorOrigin::Statement, message)
    }

    /// Construct a cursor-origin storage error.
    pub(crate) fn cursor_storage(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Storage, ErrorOrigin::Cursor, message)
    }

    /// Construct an unsupported-operation error.
    pub(crate) fn unsupported(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, origin, message)
    }

    /// Construct the conditional-write-rejected error for a write with no
    /// registered listener.
    #[must_use]
    pub fn lwt_rejected(result: LwtResult) -> Self {
        Self {
            class: ErrorClass::Rejected,
            origin: ErrorOrigin::Write,
            message: result.to_string(),
            detail: Some(ErrorDetail::Lwt(result)),
        }
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self.class, ErrorClass::Rejected)
    }

    /// Borrow the rejected conditional-write payload, if this error carries one.
    #[must_use]
    pub const fn lwt_result(&self) -> Option<&LwtResult> {
        match &self.detail {
            Some(ErrorDetail::Lwt(result)) => Some(result),
            None => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<OptionsError> for RuntimeError {
    fn from(err: OptionsError) -> Self {
        Self::new(
            ErrorClass::Configuration,
            ErrorOrigin::Options,
            err.to_string(),
        )
    }
}

impl From<BoundsError> for RuntimeError {
    fn from(err: BoundsError) -> Self {
        Self::new(ErrorClass::Validation, ErrorOrigin::Cursor, err.to_string())
    }
}

///
/// ErrorDetail
///
/// Structured, class-specific error detail carried by [`RuntimeError`].
/// This enum is intentionally extensible.
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Lwt(LwtResult),
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    /// Invalid `Options` combination; raised at build time, never at execute time.
    Configuration,
    /// Statement generator failure (schema drift, unknown column); never cached.
    Preparation,
    /// Conditional-write predicate not satisfied with no listener registered.
    Rejected,
    /// I/O failure during a fetch or an execute; never retried here.
    Storage,
    /// Operation the runtime refuses by contract.
    Unsupported,
    /// Slice bounds violate an invariant; raised before any I/O.
    Validation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::Preparation => "preparation",
            Self::Rejected => "rejected",
            Self::Storage => "storage",
            Self::Unsupported => "unsupported",
            Self::Validation => "validation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    Batch,
    Cursor,
    Options,
    Policy,
    Port,
    Statement,
    Write,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Batch => "batch",
            Self::Cursor => "cursor",
            Self::Options => "options",
            Self::Policy => "policy",
            Self::Port => "port",
            Self::Statement => "statement",
            Self::Write => "write",
        };
        write!(f, "{label}")
    }
}
