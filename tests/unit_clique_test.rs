use std::collections::{BTreeMap, BTreeSet};

use admind::membership::{compute_clique, clique::coordinator_of};

fn seen(pairs: &[(u32, &[u32])]) -> BTreeMap<u32, BTreeSet<u32>> {
    pairs
        .iter()
        .map(|(id, seen)| (*id, seen.iter().copied().collect()))
        .collect()
}

#[test]
fn full_mesh_yields_full_clique() {
    let seen = seen(&[(0, &[0, 1, 2]), (1, &[0, 1, 2]), (2, &[0, 1, 2])]);
    let clique = compute_clique(0, &seen);
    assert_eq!(clique, BTreeSet::from([0, 1, 2]));
    assert_eq!(coordinator_of(&clique), Some(0));
}

#[test]
fn asymmetric_link_loss_scenario() {
    // Node 2 cannot hear node 4; every other pair is bidirectional (`§8` scenario 1).
    let seen = seen(&[
        (0, &[0, 1, 2, 3, 4]),
        (1, &[0, 1, 2, 3, 4]),
        (2, &[0, 1, 2, 3]),
        (3, &[0, 1, 2, 3, 4]),
        (4, &[0, 1, 3, 4]),
    ]);
    let clique = compute_clique(0, &seen);
    assert_eq!(clique, BTreeSet::from([0, 1, 2, 3]));
    assert_eq!(coordinator_of(&clique), Some(0));
}

#[test]
fn self_always_present_even_when_isolated() {
    let seen = seen(&[(5, &[5]), (1, &[1, 2]), (2, &[1, 2])]);
    let clique = compute_clique(5, &seen);
    assert!(clique.contains(&5));
}

#[test]
fn deterministic_across_every_members_perspective() {
    let seen = seen(&[(0, &[0, 1, 2]), (1, &[0, 1, 2]), (2, &[0, 1, 2])]);
    let from_0 = compute_clique(0, &seen);
    let from_1 = compute_clique(1, &seen);
    let from_2 = compute_clique(2, &seen);
    assert_eq!(from_0, from_1);
    assert_eq!(from_1, from_2);
}
