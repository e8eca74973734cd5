use crate::db::{
    consistency::{
        AccessKind, ConsistencyConfig, ConsistencyLevel, ConsistencyPolicy, ScopedOverride,
        apply_batch_override, with_scoped_override,
    },
    options::Options,
};
use proptest::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};

const TABLE: &str = "user_events";

fn policy() -> ConsistencyPolicy {
    ConsistencyPolicy::new(ConsistencyLevel::One, ConsistencyLevel::One)
}

#[test]
fn resolution_precedence_walks_down_the_chain() {
    let policy = policy();
    policy.set_table_default(TABLE, AccessKind::Read, ConsistencyLevel::LocalQuorum);

    let explicit = Options::builder()
        .consistency(ConsistencyLevel::All)
        .build();

    with_scoped_override(AccessKind::Read, ConsistencyLevel::Quorum, || {
        // Explicit options level wins over everything.
        assert_eq!(
            policy.resolve_read(TABLE, &explicit),
            ConsistencyLevel::All
        );
        // Without an explicit level the scoped override wins.
        assert_eq!(
            policy.resolve_read(TABLE, &Options::new()),
            ConsistencyLevel::Quorum
        );
    });

    // Override gone: per-table default.
    assert_eq!(
        policy.resolve_read(TABLE, &Options::new()),
        ConsistencyLevel::LocalQuorum
    );

    // Table default gone: global default.
    policy.clear_table_default(TABLE, AccessKind::Read);
    assert_eq!(
        policy.resolve_read(TABLE, &Options::new()),
        ConsistencyLevel::One
    );
}

#[test]
fn read_and_write_directions_resolve_independently() {
    let policy = policy();
    policy.set_table_default(TABLE, AccessKind::Write, ConsistencyLevel::EachQuorum);

    assert_eq!(
        policy.resolve_write(TABLE, &Options::new()),
        ConsistencyLevel::EachQuorum
    );
    assert_eq!(
        policy.resolve_read(TABLE, &Options::new()),
        ConsistencyLevel::One
    );

    with_scoped_override(AccessKind::Read, ConsistencyLevel::Three, || {
        // A read override must not leak into write resolution.
        assert_eq!(
            policy.resolve_write(TABLE, &Options::new()),
            ConsistencyLevel::EachQuorum
        );
    });
}

#[test]
fn scoped_overrides_nest_and_restore() {
    let policy = policy();

    with_scoped_override(AccessKind::Read, ConsistencyLevel::Two, || {
        with_scoped_override(AccessKind::Read, ConsistencyLevel::All, || {
            assert_eq!(
                policy.resolve_read(TABLE, &Options::new()),
                ConsistencyLevel::All
            );
        });
        // Inner scope restored to the outer level, not to none.
        assert_eq!(
            policy.resolve_read(TABLE, &Options::new()),
            ConsistencyLevel::Two
        );
    });

    assert_eq!(
        policy.resolve_read(TABLE, &Options::new()),
        ConsistencyLevel::One
    );
}

#[test]
fn scoped_override_is_cleared_on_panic() {
    let policy = policy();

    let panicked = catch_unwind(AssertUnwindSafe(|| {
        let _guard = ScopedOverride::set(AccessKind::Write, ConsistencyLevel::All);
        panic!("intentional panic for guard test");
    }))
    .is_err();
    assert!(panicked);

    // The unwound scope left nothing behind.
    assert_eq!(
        policy.resolve_write(TABLE, &Options::new()),
        ConsistencyLevel::One
    );
}

#[test]
fn config_deserializes_with_defaults_and_table_sections() {
    let config: ConsistencyConfig = serde_json::from_str(
        r#"{
            "read": "LOCAL_QUORUM",
            "tables": {
                "user_events": { "write": "EACH_QUORUM" }
            }
        }"#,
    )
    .expect("config fixture should deserialize");

    assert_eq!(config.read, ConsistencyLevel::LocalQuorum);
    assert_eq!(config.write, ConsistencyLevel::One);

    let policy = ConsistencyPolicy::from_config(&config);
    assert_eq!(
        policy.resolve_read(TABLE, &Options::new()),
        ConsistencyLevel::LocalQuorum
    );
    assert_eq!(
        policy.resolve_write(TABLE, &Options::new()),
        ConsistencyLevel::EachQuorum
    );
    assert_eq!(policy.table_default("other", AccessKind::Write), None);
}

#[test]
fn batch_override_replaces_consistency_and_preserves_the_rest() {
    let options = Options::builder()
        .consistency(ConsistencyLevel::One)
        .ttl_seconds(10)
        .timestamp_micros(100)
        .build();

    let flushed = apply_batch_override(&options, ConsistencyLevel::All);

    assert_eq!(flushed.consistency(), Some(ConsistencyLevel::All));
    assert_eq!(flushed.ttl_seconds(), Some(10));
    assert_eq!(flushed.timestamp_micros(), Some(100));
    assert_eq!(options.consistency(), Some(ConsistencyLevel::One));
}

static ALL_LEVELS: [ConsistencyLevel; 11] = [
    ConsistencyLevel::Any,
    ConsistencyLevel::One,
    ConsistencyLevel::Two,
    ConsistencyLevel::Three,
    ConsistencyLevel::Quorum,
    ConsistencyLevel::All,
    ConsistencyLevel::LocalQuorum,
    ConsistencyLevel::EachQuorum,
    ConsistencyLevel::Serial,
    ConsistencyLevel::LocalSerial,
    ConsistencyLevel::LocalOne,
];

fn arb_level() -> impl Strategy<Value = ConsistencyLevel> {
    proptest::sample::select(&ALL_LEVELS[..])
}

proptest! {
    // The batch level always wins, whatever the options carried before.
    #[test]
    fn batch_override_invariant(
        prior in proptest::option::of(arb_level()),
        batch in arb_level(),
        ttl in proptest::option::of(0u32..=86_400),
        timestamp in proptest::option::of(0i64..=i64::MAX),
    ) {
        let mut builder = Options::builder();
        if let Some(level) = prior {
            builder = builder.consistency(level);
        }
        if let Some(ttl) = ttl {
            builder = builder.ttl_seconds(ttl);
        }
        if let Some(timestamp) = timestamp {
            builder = builder.timestamp_micros(timestamp);
        }
        let options = builder.build();

        let flushed = apply_batch_override(&options, batch);

        prop_assert_eq!(flushed.consistency(), Some(batch));
        prop_assert_eq!(flushed.ttl_seconds(), ttl);
        prop_assert_eq!(flushed.timestamp_micros(), timestamp);
    }
}
