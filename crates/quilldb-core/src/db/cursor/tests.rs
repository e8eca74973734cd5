use crate::{
    db::consistency::ConsistencyLevel,
    db::cursor::{BoundsError, PageBound, PageRequest, SliceBounds, SliceCursor},
    db::direction::Direction,
    db::metadata::TableProfile,
    db::row::Row,
    error::RuntimeError,
    value::Value,
};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

fn profile() -> TableProfile {
    TableProfile::new(
        "user_events",
        vec!["stream".to_string()],
        vec!["seq".to_string()],
    )
}

fn event_row(seq: i64) -> Row {
    Row::new()
        .with("seq", Value::Int(seq))
        .with("body", Value::Text(format!("event-{seq}")))
}

fn partition(len: i64) -> Vec<Row> {
    (0..len).map(event_row).collect()
}

#[derive(Debug, PartialEq)]
struct Event {
    seq: i64,
    body: String,
}

fn hydrate(row: &Row) -> Result<Event, RuntimeError> {
    let Some(Value::Int(seq)) = row.value("seq") else {
        return Err(RuntimeError::storage("row is missing 'seq'"));
    };
    let Some(Value::Text(body)) = row.value("body") else {
        return Err(RuntimeError::storage("row is missing 'body'"));
    };

    Ok(Event {
        seq: *seq,
        body: body.clone(),
    })
}

/// Recorded page request, detached from the borrowed request lifetime.
#[derive(Clone, Debug, PartialEq)]
struct SeenRequest {
    from: Option<(Vec<Value>, bool)>,
    to: Option<(Vec<Value>, bool)>,
    direction: Direction,
    limit: usize,
    consistency: ConsistencyLevel,
}

impl SeenRequest {
    fn record(request: &PageRequest<'_>) -> Self {
        let snap = |bound: &PageBound<'_>| (bound.values.to_vec(), bound.inclusive);

        Self {
            from: request.from.as_ref().map(snap),
            to: request.to.as_ref().map(snap),
            direction: request.direction,
            limit: request.limit,
            consistency: request.consistency,
        }
    }
}

fn seq_of(row: &Row) -> i64 {
    // Rows deref to their column map.
    match row.get("seq") {
        Some(Value::Int(seq)) => *seq,
        _ => panic!("fixture rows always carry an int 'seq'"),
    }
}

fn in_window(seq: i64, request: &SeenRequest) -> bool {
    let passes = |bound: &Option<(Vec<Value>, bool)>, forward: bool| {
        let Some((values, inclusive)) = bound else {
            return true;
        };
        let Some(Value::Int(edge)) = values.first() else {
            return true;
        };
        let ahead = if forward { seq > *edge } else { seq < *edge };
        ahead || (*inclusive && seq == *edge)
    };

    match request.direction {
        Direction::Asc => passes(&request.from, true) && passes(&request.to, false),
        Direction::Desc => passes(&request.from, false) && passes(&request.to, true),
    }
}

/// Keyset fetcher over an in-memory partition, recording every request.
fn scripted_fetcher(
    rows: Vec<Row>,
    seen: Rc<RefCell<Vec<SeenRequest>>>,
) -> impl FnMut(&PageRequest<'_>) -> Result<Vec<Row>, RuntimeError> {
    move |request: &PageRequest<'_>| {
        let seen_request = SeenRequest::record(request);
        seen.borrow_mut().push(seen_request.clone());

        let mut page: Vec<Row> = rows
            .iter()
            .filter(|row| in_window(seq_of(row), &seen_request))
            .cloned()
            .collect();
        if seen_request.direction == Direction::Desc {
            page.reverse();
        }
        page.truncate(seen_request.limit);

        Ok(page)
    }
}

#[test]
fn full_consumption_issues_exactly_the_needed_fetches() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let bounds = SliceBounds::new(vec![Value::Text("stream-1".into())]).with_batch_size(99);
    let mut cursor = SliceCursor::open(
        profile(),
        bounds,
        ConsistencyLevel::LocalQuorum,
        scripted_fetcher(partition(250), Rc::clone(&seen)),
        hydrate,
    )
    .expect("bounds should validate");

    let mut events = Vec::new();
    while let Some(event) = cursor.try_next().expect("fetches should succeed") {
        events.push(event);
    }

    assert_eq!(events.len(), 250);
    assert_eq!(events.first().map(|event| event.seq), Some(0));
    assert_eq!(events.last().map(|event| event.seq), Some(249));

    // 99 + 99 + 52: the short page ends iteration.
    let requests = seen.borrow();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|request| request.limit == 99));
    assert!(
        requests
            .iter()
            .all(|request| request.consistency == ConsistencyLevel::LocalQuorum)
    );

    drop(requests);
    // Exhaustion is remembered; no further fetch is attempted.
    assert!(!cursor.has_next().expect("exhausted cursor is not an error"));
    assert_eq!(seen.borrow().len(), 3);
}

#[test]
fn keyset_anchor_advances_past_the_last_seen_row() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let bounds = SliceBounds::new(vec![Value::Text("stream-1".into())])
        .start_at(vec![Value::Int(10)])
        .with_batch_size(50);
    let mut cursor = SliceCursor::open(
        profile(),
        bounds,
        ConsistencyLevel::One,
        scripted_fetcher(partition(120), Rc::clone(&seen)),
        hydrate,
    )
    .expect("bounds should validate");

    let mut count = 0;
    while cursor.try_next().expect("fetches should succeed").is_some() {
        count += 1;
    }
    // Rows 10..=119 inclusive.
    assert_eq!(count, 110);

    let requests = seen.borrow();
    assert_eq!(requests.len(), 3);
    // First fetch starts at the slice's own start bound, inclusively.
    assert_eq!(requests[0].from, Some((vec![Value::Int(10)], true)));
    // Later fetches resume exclusively after the last clustering value seen.
    assert_eq!(requests[1].from, Some((vec![Value::Int(59)], false)));
    assert_eq!(requests[2].from, Some((vec![Value::Int(109)], false)));
}

#[test]
fn descending_slices_traverse_backwards() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let bounds = SliceBounds::new(vec![Value::Text("stream-1".into())])
        .start_at(vec![Value::Int(12)])
        .end_at(vec![Value::Int(3)])
        .with_ordering(Direction::Desc)
        .with_batch_size(4);
    let mut cursor = SliceCursor::open(
        profile(),
        bounds,
        ConsistencyLevel::One,
        scripted_fetcher(partition(40), Rc::clone(&seen)),
        hydrate,
    )
    .expect("inverted bounds are well-ordered under descending traversal");

    let mut seqs = Vec::new();
    while let Some(event) = cursor.try_next().expect("fetches should succeed") {
        seqs.push(event.seq);
    }

    assert_eq!(seqs, vec![12, 11, 10, 9, 8, 7, 6, 5, 4, 3]);
    let requests = seen.borrow();
    assert!(
        requests
            .iter()
            .all(|request| request.direction == Direction::Desc)
    );
    assert_eq!(requests[1].from, Some((vec![Value::Int(9)], false)));
}

#[test]
fn empty_partition_exhausts_after_one_fetch() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut cursor = SliceCursor::open(
        profile(),
        SliceBounds::new(vec![Value::Text("stream-1".into())]),
        ConsistencyLevel::One,
        scripted_fetcher(Vec::new(), Rc::clone(&seen)),
        hydrate,
    )
    .expect("bounds should validate");

    assert!(!cursor.has_next().expect("empty slice is not an error"));
    assert!(!cursor.has_next().expect("still not an error"));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn inverted_bounds_fail_before_any_io() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let bounds = SliceBounds::new(vec![Value::Text("stream-1".into())])
        .start_at(vec![Value::Int(12)])
        .end_at(vec![Value::Int(11)]);

    let err = SliceCursor::open(
        profile(),
        bounds.clone(),
        ConsistencyLevel::One,
        scripted_fetcher(partition(20), Rc::clone(&seen)),
        hydrate,
    )
    .map(|_| ())
    .expect_err("ascending 12..11 must fail validation");

    assert_eq!(
        err.display_with_class(),
        "cursor:validation: start bound must not pass the end bound under ascending ordering (component 0)"
    );
    assert!(seen.borrow().is_empty());

    // The same bounds are well-ordered descending.
    SliceCursor::open(
        profile(),
        bounds.with_ordering(Direction::Desc),
        ConsistencyLevel::One,
        scripted_fetcher(partition(20), Rc::clone(&seen)),
        hydrate,
    )
    .map(|_| ())
    .expect("descending 12..11 must validate");
}

#[test]
fn bound_validation_rejects_malformed_slices() {
    let profile = profile();

    let empty_pk = SliceBounds::new(Vec::new());
    assert_eq!(
        empty_pk.validate(&profile),
        Err(BoundsError::EmptyPartitionKey)
    );

    let zero_batch = SliceBounds::new(vec![Value::Text("s".into())]).with_batch_size(0);
    assert_eq!(zero_batch.validate(&profile), Err(BoundsError::ZeroBatchSize));

    let too_many = SliceBounds::new(vec![Value::Text("s".into())])
        .start_at(vec![Value::Int(1), Value::Int(2)]);
    assert!(matches!(
        too_many.validate(&profile),
        Err(BoundsError::ClusteringArityExceeded { found: 2, arity: 1, .. })
    ));

    let mixed = SliceBounds::new(vec![Value::Text("s".into())])
        .start_at(vec![Value::Int(1)])
        .end_at(vec![Value::Text("z".into())]);
    assert!(matches!(
        mixed.validate(&profile),
        Err(BoundsError::IncomparableComponents { index: 0, .. })
    ));
}

#[test]
fn null_components_are_skipped_up_to_first_divergence() {
    let profile = TableProfile::new(
        "user_events",
        vec!["stream".to_string()],
        vec!["bucket".to_string(), "seq".to_string()],
    );

    // First components null on one side: unconstrained; second pair decides.
    let bounds = SliceBounds::new(vec![Value::Text("s".into())])
        .start_at(vec![Value::Null, Value::Int(5)])
        .end_at(vec![Value::Int(9), Value::Int(1)]);
    assert_eq!(
        bounds.validate(&profile),
        Err(BoundsError::InvertedBounds {
            ordering: Direction::Asc,
            index: 1,
        })
    );

    // Components after the first divergence are unconstrained.
    let diverged = SliceBounds::new(vec![Value::Text("s".into())])
        .start_at(vec![Value::Int(1), Value::Int(99)])
        .end_at(vec![Value::Int(2), Value::Int(0)]);
    assert_eq!(diverged.validate(&profile), Ok(()));
}

#[test]
fn remove_is_unsupported() {
    let cursor = SliceCursor::open(
        profile(),
        SliceBounds::new(vec![Value::Text("stream-1".into())]),
        ConsistencyLevel::One,
        scripted_fetcher(partition(5), Rc::new(RefCell::new(Vec::new()))),
        hydrate,
    )
    .expect("bounds should validate");

    let err = cursor.remove().expect_err("remove must be unsupported");
    assert_eq!(
        err.display_with_class(),
        "cursor:unsupported: slice cursors are read-only; remove is not supported"
    );
}

#[test]
fn fetch_failure_poisons_the_cursor() {
    let calls = Rc::new(RefCell::new(0usize));
    let fetch_calls = Rc::clone(&calls);
    let failing = move |_: &PageRequest<'_>| -> Result<Vec<Row>, RuntimeError> {
        *fetch_calls.borrow_mut() += 1;
        Err(RuntimeError::storage("connection reset by peer"))
    };

    let mut cursor = SliceCursor::open(
        profile(),
        SliceBounds::new(vec![Value::Text("stream-1".into())]),
        ConsistencyLevel::One,
        failing,
        hydrate,
    )
    .expect("bounds should validate");

    let err = cursor.has_next().expect_err("fetch failure must propagate");
    assert_eq!(
        err.display_with_class(),
        "port:storage: connection reset by peer"
    );

    // Poisoned: no further fetch is attempted, every call reports it.
    let err = cursor.has_next().expect_err("poisoned cursor must not recover");
    assert!(err.message.contains("previously failed"));
    let err = cursor.try_next().map(|_| ()).expect_err("try_next too");
    assert!(err.message.contains("previously failed"));
    assert_eq!(*calls.borrow(), 1);
}

#[test]
fn hydration_failures_propagate_per_row() {
    let mut cursor = SliceCursor::open(
        profile(),
        SliceBounds::new(vec![Value::Text("stream-1".into())]),
        ConsistencyLevel::One,
        scripted_fetcher(
            vec![
                event_row(0),
                Row::new().with("seq", Value::Int(1)), // no body
                event_row(2),
            ],
            Rc::new(RefCell::new(Vec::new())),
        ),
        hydrate,
    )
    .expect("bounds should validate");

    assert_eq!(
        cursor.try_next().expect("first row hydrates").map(|e| e.seq),
        Some(0)
    );
    let err = cursor
        .try_next()
        .map(|_| ())
        .expect_err("malformed row must fail hydration");
    assert!(err.message.contains("missing 'body'"));
    // The hydration failure consumed its row; iteration continues after it.
    assert_eq!(
        cursor.try_next().expect("third row hydrates").map(|e| e.seq),
        Some(2)
    );
}

#[test]
fn iterator_adapter_yields_hydrated_entities() {
    let cursor = SliceCursor::open(
        profile(),
        SliceBounds::new(vec![Value::Text("stream-1".into())]).with_batch_size(2),
        ConsistencyLevel::One,
        scripted_fetcher(partition(5), Rc::new(RefCell::new(Vec::new()))),
        hydrate,
    )
    .expect("bounds should validate");

    let seqs: Vec<i64> = cursor
        .map(|event| event.expect("fetches should succeed").seq)
        .collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
}

proptest! {
    // Single-component bounds: validity under one ordering mirrors the other.
    #[test]
    fn bound_ordering_symmetry(start in any::<i64>(), end in any::<i64>()) {
        let bounds = SliceBounds::new(vec![Value::Text("s".into())])
            .start_at(vec![Value::Int(start)])
            .end_at(vec![Value::Int(end)]);

        let asc = bounds.clone().validate(&profile()).is_ok();
        let desc = bounds
            .with_ordering(Direction::Desc)
            .validate(&profile())
            .is_ok();

        prop_assert_eq!(asc, start <= end);
        prop_assert_eq!(desc, start >= end);
    }
}
