use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use admind::errors::AdmindError;
use admind::workthread::aggregate;
use admind::workthread::barrier::BarrierCoordinator;

#[test]
fn precedence_prefers_metadata_corruption_over_everything() {
    let results = vec![
        AdmindError::Success,
        AdmindError::NodeDown(3),
        AdmindError::MetadataCorruption("sb mismatch".into()),
        AdmindError::InvalidParam("bad size".into()),
    ];
    assert_eq!(
        aggregate(results),
        AdmindError::MetadataCorruption("sb mismatch".into())
    );
}

#[test]
fn node_down_precedence_example_from_the_spec() {
    // `§8` scenario 3: node 0 -> SUCCESS, node 1 -> INVALID_PARAM, node 2
    // drops entirely -> the cluster-wide result is NODE_DOWN.
    let results = vec![
        AdmindError::Success,
        AdmindError::InvalidParam("bad size".into()),
        AdmindError::NodeDown(2),
    ];
    assert_eq!(aggregate(results), AdmindError::NodeDown(2));
}

#[test]
fn nothing_to_do_beats_success_but_loses_to_any_real_error() {
    assert_eq!(
        aggregate(vec![AdmindError::Success, AdmindError::NothingToDo]),
        AdmindError::NothingToDo
    );
    assert_eq!(
        aggregate(vec![
            AdmindError::NothingToDo,
            AdmindError::InvalidParam("x".into())
        ]),
        AdmindError::InvalidParam("x".into())
    );
}

#[test]
fn empty_result_set_aggregates_to_success() {
    assert_eq!(aggregate(Vec::<AdmindError>::new()), AdmindError::Success);
}

#[tokio::test]
async fn barrier_resolves_once_every_expected_member_has_crossed() {
    let expected = BTreeSet::from([0, 1, 2]);
    let barrier = Arc::new(BarrierCoordinator::new(expected));

    let b0 = barrier.clone();
    let b1 = barrier.clone();
    let b2 = barrier.clone();

    let (r0, r1, r2) = tokio::join!(
        b0.cross("dgcreate/prepare", 0, AdmindError::Success),
        b1.cross("dgcreate/prepare", 1, AdmindError::InvalidParam("bad".into())),
        b2.cross("dgcreate/prepare", 2, AdmindError::Success),
    );

    assert_eq!(r0, AdmindError::InvalidParam("bad".into()));
    assert_eq!(r1, r0);
    assert_eq!(r2, r0);
}

#[tokio::test]
async fn membership_drop_during_a_barrier_resolves_waiters_as_node_down() {
    let expected = BTreeSet::from([0, 1, 2]);
    let barrier = Arc::new(BarrierCoordinator::new(expected));

    let waiter = {
        let barrier = barrier.clone();
        tokio::spawn(async move { barrier.cross("dgstop/drain", 0, AdmindError::Success).await })
    };

    // Give the waiter a chance to register before the membership changes.
    tokio::time::sleep(Duration::from_millis(20)).await;
    barrier.on_membership_change(BTreeSet::from([0, 1])).await;

    let result = waiter.await.expect("waiter task panicked");
    assert!(matches!(result, AdmindError::NodeDown(_)));
}
