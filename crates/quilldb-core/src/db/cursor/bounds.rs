use crate::{
    db::direction::Direction,
    db::metadata::TableProfile,
    value::{Value, ValueKind},
};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error as ThisError;

pub const DEFAULT_BATCH_SIZE: usize = 100;

///
/// SliceBounds
///
/// One partition's clustering range: the partition key, optional start/end
/// clustering tuples (each possibly a prefix of the full clustering arity),
/// traversal ordering, and page size. Validated before any I/O.
///

#[derive(Clone, Debug, PartialEq)]
pub struct SliceBounds {
    partition_key: Vec<Value>,
    start: Option<Vec<Value>>,
    end: Option<Vec<Value>>,
    ordering: Direction,
    batch_size: usize,
}

impl SliceBounds {
    /// Unbounded ascending slice over one partition with the default page size.
    #[must_use]
    pub const fn new(partition_key: Vec<Value>) -> Self {
        Self {
            partition_key,
            start: None,
            end: None,
            ordering: Direction::Asc,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Inclusive start clustering bound, possibly partially specified.
    #[must_use]
    pub fn start_at(mut self, clustering: Vec<Value>) -> Self {
        self.start = Some(clustering);
        self
    }

    /// Inclusive end clustering bound, possibly partially specified.
    #[must_use]
    pub fn end_at(mut self, clustering: Vec<Value>) -> Self {
        self.end = Some(clustering);
        self
    }

    #[must_use]
    pub const fn with_ordering(mut self, ordering: Direction) -> Self {
        self.ordering = ordering;
        self
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn partition_key(&self) -> &[Value] {
        &self.partition_key
    }

    #[must_use]
    pub fn start(&self) -> Option<&[Value]> {
        self.start.as_deref()
    }

    #[must_use]
    pub fn end(&self) -> Option<&[Value]> {
        self.end.as_deref()
    }

    #[must_use]
    pub const fn ordering(&self) -> Direction {
        self.ordering
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Check every bound invariant against the table's key layout.
    pub fn validate(&self, profile: &TableProfile) -> Result<(), BoundsError> {
        if self.partition_key.is_empty() {
            return Err(BoundsError::EmptyPartitionKey);
        }
        if self.partition_key.len() != profile.partition_columns().len() {
            return Err(BoundsError::PartitionArityMismatch {
                expected: profile.partition_columns().len(),
                found: self.partition_key.len(),
            });
        }
        if self.batch_size == 0 {
            return Err(BoundsError::ZeroBatchSize);
        }

        let arity = profile.clustering_arity();
        for (side, bound) in [
            (BoundSide::Start, self.start.as_deref()),
            (BoundSide::End, self.end.as_deref()),
        ] {
            if let Some(bound) = bound
                && bound.len() > arity
            {
                return Err(BoundsError::ClusteringArityExceeded {
                    side,
                    found: bound.len(),
                    arity,
                });
            }
        }

        if let (Some(start), Some(end)) = (self.start.as_deref(), self.end.as_deref()) {
            check_ordering(start, end, self.ordering)?;
        }

        Ok(())
    }
}

// Compare component-by-component up to the first pair of differing non-null
// values; components after the first divergence are unconstrained.
fn check_ordering(start: &[Value], end: &[Value], ordering: Direction) -> Result<(), BoundsError> {
    for (index, (s, e)) in start.iter().zip(end.iter()).enumerate() {
        if s.is_null() || e.is_null() {
            continue;
        }
        match s.compare(e) {
            None => {
                return Err(BoundsError::IncomparableComponents {
                    index,
                    start: s.kind(),
                    end: e.kind(),
                });
            }
            Some(Ordering::Equal) => {}
            Some(order) => {
                let well_ordered = match ordering {
                    Direction::Asc => order == Ordering::Less,
                    Direction::Desc => order == Ordering::Greater,
                };
                if well_ordered {
                    return Ok(());
                }
                return Err(BoundsError::InvertedBounds { ordering, index });
            }
        }
    }

    Ok(())
}

///
/// BoundSide
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum BoundSide {
    End,
    Start,
}

impl fmt::Display for BoundSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::End => "end",
            Self::Start => "start",
        };
        write!(f, "{label}")
    }
}

///
/// BoundsError
///
/// Slice-bound invariant violations, raised at cursor construction before
/// any fetch is issued.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum BoundsError {
    #[error(
        "{side} clustering bound has {found} components but the table declares {arity} clustering columns"
    )]
    ClusteringArityExceeded {
        side: BoundSide,
        found: usize,
        arity: usize,
    },

    #[error("partition key must not be empty")]
    EmptyPartitionKey,

    #[error("clustering bound component {index} compares {start} against {end}")]
    IncomparableComponents {
        index: usize,
        start: ValueKind,
        end: ValueKind,
    },

    #[error("start bound must not pass the end bound under {ordering} ordering (component {index})")]
    InvertedBounds { ordering: Direction, index: usize },

    #[error("partition key has {found} components but the table declares {expected}")]
    PartitionArityMismatch { expected: usize, found: usize },

    #[error("batch size must be positive")]
    ZeroBatchSize,
}
