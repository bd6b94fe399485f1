use admind::model::sb_version::{SbVersion, SbVersionError};

#[test]
fn prepare_then_commit_advances_committed_by_one() {
    let mut sb = SbVersion::new();
    assert_eq!(sb.prepare().unwrap(), 1);
    assert!(sb.in_flight);
    assert_eq!(sb.commit().unwrap(), 1);
    assert_eq!(sb.committed, 1);
    assert_eq!(sb.prepared, None);
    assert!(!sb.in_flight);
}

#[test]
fn a_second_prepare_while_one_is_outstanding_is_rejected() {
    let mut sb = SbVersion::new();
    sb.prepare().unwrap();
    assert_eq!(sb.prepare().unwrap_err(), SbVersionError::AlreadyInFlight);
}

#[test]
fn recover_discards_the_prepared_candidate_without_committing() {
    let mut sb = SbVersion::new();
    sb.prepare().unwrap();
    sb.recover();
    assert_eq!(sb.committed, 0);
    assert_eq!(sb.prepared, None);
    assert!(!sb.in_flight);
    // A fresh prepare is now possible again.
    assert_eq!(sb.prepare().unwrap(), 1);
}

#[test]
fn commit_without_a_prior_prepare_fails() {
    let mut sb = SbVersion::new();
    assert_eq!(sb.commit().unwrap_err(), SbVersionError::NoPreparedVersion);
}

#[test]
fn merge_committed_only_ever_moves_forward() {
    let mut sb = SbVersion::new();
    sb.prepare().unwrap();
    sb.commit().unwrap();
    assert_eq!(sb.committed, 1);

    sb.merge_committed(0);
    assert_eq!(sb.committed, 1, "merging an older peer version must not regress");

    sb.merge_committed(5);
    assert_eq!(sb.committed, 5);
}

#[test]
fn repeated_prepare_commit_cycles_are_strictly_increasing() {
    let mut sb = SbVersion::new();
    let mut last = 0;
    for _ in 0..5 {
        let candidate = sb.prepare().unwrap();
        assert!(candidate > last);
        last = sb.commit().unwrap();
    }
    assert_eq!(sb.committed, 5);
}
