//! Module: db::cursor
//! Responsibility: lazy, bounded, ordered iteration over one partition's
//! clustering range via keyset pagination.
//! Does not own: CQL generation, row hydration, consistency resolution, or
//! retry policy (a failed fetch is terminal here).

mod bounds;

#[cfg(test)]
mod tests;

pub use bounds::{BoundSide, BoundsError, DEFAULT_BATCH_SIZE, SliceBounds};

use crate::{
    db::consistency::ConsistencyLevel,
    db::direction::Direction,
    db::metadata::TableProfile,
    db::row::Row,
    error::{ErrorOrigin, RuntimeError},
    obs::{self, MetricsEvent},
    value::Value,
};
use std::collections::VecDeque;

///
/// PageBound
///
/// One side of a page request's clustering window.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageBound<'a> {
    pub values: &'a [Value],
    pub inclusive: bool,
}

///
/// PageRequest
///
/// One keyset page fetch, expressed in traversal order: `from` is the moving
/// anchor bound (the slice start on the first fetch, the last clustering
/// values seen afterwards), `to` is the fixed terminal bound. The fetcher
/// translates the window into the store's comparison operators.
///

#[derive(Clone, Debug, PartialEq)]
pub struct PageRequest<'a> {
    pub partition_key: &'a [Value],
    pub from: Option<PageBound<'a>>,
    pub to: Option<PageBound<'a>>,
    pub direction: Direction,
    pub limit: usize,
    pub consistency: ConsistencyLevel,
}

///
/// SliceFetcher
///
/// The externally supplied row-fetch function. One cursor drives one fetcher
/// strictly sequentially; a new page is never requested while the previous
/// page's rows are still being drained.
///

pub trait SliceFetcher {
    fn fetch_page(&mut self, request: &PageRequest<'_>) -> Result<Vec<Row>, RuntimeError>;
}

impl<F> SliceFetcher for F
where
    F: FnMut(&PageRequest<'_>) -> Result<Vec<Row>, RuntimeError>,
{
    fn fetch_page(&mut self, request: &PageRequest<'_>) -> Result<Vec<Row>, RuntimeError> {
        self(request)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CursorState {
    /// Constructed and validated; nothing fetched yet.
    Primed,
    /// At least one page fetched, more may remain.
    Ready,
    /// A fetch returned fewer rows than the batch size; never fetch again.
    Exhausted,
    /// A fetch failed; the cursor is unusable.
    Failed,
}

///
/// SliceCursor
///
/// Lazy, finite, forward-only, non-restartable stream of hydrated entities
/// for one partition. Single-threaded by construction: every accessor takes
/// `&mut self` and position state is private.
///

pub struct SliceCursor<E, F, H>
where
    F: SliceFetcher,
    H: Fn(&Row) -> Result<E, RuntimeError>,
{
    profile: TableProfile,
    bounds: SliceBounds,
    consistency: ConsistencyLevel,
    fetcher: F,
    hydrate: H,
    state: CursorState,
    page: VecDeque<Row>,
    anchor: Option<Vec<Value>>,
}

impl<E, F, H> SliceCursor<E, F, H>
where
    F: SliceFetcher,
    H: Fn(&Row) -> Result<E, RuntimeError>,
{
    /// Validate `bounds` against `profile` and prime a cursor. No I/O
    /// happens until the first `has_next`/`try_next` call.
    pub fn open(
        profile: TableProfile,
        bounds: SliceBounds,
        consistency: ConsistencyLevel,
        fetcher: F,
        hydrate: H,
    ) -> Result<Self, RuntimeError> {
        bounds.validate(&profile)?;

        Ok(Self {
            profile,
            bounds,
            consistency,
            fetcher,
            hydrate,
            state: CursorState::Primed,
            page: VecDeque::new(),
            anchor: None,
        })
    }

    /// Whether another row is available, fetching the next page if the
    /// current one is drained.
    pub fn has_next(&mut self) -> Result<bool, RuntimeError> {
        if !self.page.is_empty() {
            return Ok(true);
        }
        match self.state {
            CursorState::Exhausted => Ok(false),
            CursorState::Failed => Err(Self::poisoned()),
            CursorState::Primed | CursorState::Ready => {
                self.fetch_next_page()?;
                Ok(!self.page.is_empty())
            }
        }
    }

    /// Hydrate and return the next entity, or `None` once the slice is
    /// exhausted.
    pub fn try_next(&mut self) -> Result<Option<E>, RuntimeError> {
        if !self.has_next()? {
            return Ok(None);
        }
        let Some(row) = self.page.pop_front() else {
            return Ok(None);
        };
        let entity = (self.hydrate)(&row)?;

        Ok(Some(entity))
    }

    /// Slice cursors are read-only; removal always fails.
    pub fn remove(&self) -> Result<(), RuntimeError> {
        Err(RuntimeError::unsupported(
            ErrorOrigin::Cursor,
            "slice cursors are read-only; remove is not supported",
        ))
    }

    #[must_use]
    pub const fn consistency(&self) -> ConsistencyLevel {
        self.consistency
    }

    #[must_use]
    pub const fn bounds(&self) -> &SliceBounds {
        &self.bounds
    }

    fn fetch_next_page(&mut self) -> Result<(), RuntimeError> {
        let from = match (&self.anchor, self.bounds.start()) {
            (Some(anchor), _) => Some(PageBound {
                values: anchor,
                inclusive: false,
            }),
            (None, Some(start)) => Some(PageBound {
                values: start,
                inclusive: true,
            }),
            (None, None) => None,
        };
        let to = self.bounds.end().map(|end| PageBound {
            values: end,
            inclusive: true,
        });
        let request = PageRequest {
            partition_key: self.bounds.partition_key(),
            from,
            to,
            direction: self.bounds.ordering(),
            limit: self.bounds.batch_size(),
            consistency: self.consistency,
        };

        let rows = match self.fetcher.fetch_page(&request) {
            Ok(rows) => rows,
            Err(err) => {
                self.state = CursorState::Failed;
                self.page.clear();
                return Err(err);
            }
        };

        obs::record(MetricsEvent::SliceFetch {
            rows: rows.len() as u64,
        });
        self.state = if rows.len() < self.bounds.batch_size() {
            CursorState::Exhausted
        } else {
            CursorState::Ready
        };

        if let Some(last) = rows.last() {
            match clustering_of(&self.profile, last) {
                Ok(anchor) => self.anchor = Some(anchor),
                Err(err) => {
                    self.state = CursorState::Failed;
                    self.page.clear();
                    return Err(err);
                }
            }
        }
        self.page = rows.into();

        Ok(())
    }

    fn poisoned() -> RuntimeError {
        RuntimeError::cursor_storage(
            "slice cursor previously failed a fetch; open a new cursor to resume",
        )
    }
}

impl<E, F, H> Iterator for SliceCursor<E, F, H>
where
    F: SliceFetcher,
    H: Fn(&Row) -> Result<E, RuntimeError>,
{
    type Item = Result<E, RuntimeError>;

    /// A failed cursor keeps yielding its terminal error; callers are
    /// expected to stop at the first `Err`.
    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().transpose()
    }
}

/// Extract the row's clustering values in declared column order.
fn clustering_of(profile: &TableProfile, row: &Row) -> Result<Vec<Value>, RuntimeError> {
    profile
        .clustering_columns()
        .iter()
        .map(|column| {
            row.value(column).cloned().ok_or_else(|| {
                RuntimeError::cursor_storage(format!(
                    "fetched row is missing clustering column '{column}'"
                ))
            })
        })
        .collect()
}
