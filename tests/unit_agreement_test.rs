use std::collections::BTreeMap;

use admind::membership::agreement::{Agreement, PeerAdvert, Transition};
use admind::model::node::ViewState;

fn advert(clique: &[u32], coord: u32, accepted: u64, committed: u64) -> PeerAdvert {
    PeerAdvert {
        clique: clique.iter().copied().collect(),
        coord: Some(coord),
        accepted,
        committed,
    }
}

#[test]
fn coordinator_moves_change_to_accept_then_commit() {
    let agreement = Agreement::new(0);
    let clique = std::collections::BTreeSet::from([0, 1, 2]);
    let mut state = ViewState::Change;
    let mut accepted = 0u64;
    let mut committed = 0u64;

    let mut adverts: BTreeMap<u32, PeerAdvert> = BTreeMap::new();
    adverts.insert(0, advert(&[0, 1, 2], 0, 0, 0));
    adverts.insert(1, advert(&[0, 1, 2], 0, 0, 0));
    adverts.insert(2, advert(&[0, 1, 2], 0, 0, 0));

    let t = agreement.advance(&mut state, &mut accepted, &mut committed, &clique, &adverts);
    assert_eq!(t, Transition::Accept { generation: 1 });
    assert_eq!(state, ViewState::Accept);

    adverts.insert(0, advert(&[0, 1, 2], 0, 1, 0));
    adverts.insert(1, advert(&[0, 1, 2], 0, 1, 0));
    adverts.insert(2, advert(&[0, 1, 2], 0, 1, 0));

    let t = agreement.advance(&mut state, &mut accepted, &mut committed, &clique, &adverts);
    assert_eq!(t, Transition::Commit { generation: 1, clique: clique.clone() });
    assert_eq!(committed, 1);
}

#[test]
fn follower_adopts_coordinators_generation() {
    let agreement = Agreement::new(1);
    let clique = std::collections::BTreeSet::from([0, 1, 2]);
    let mut state = ViewState::Change;
    let mut accepted = 0u64;
    let mut committed = 0u64;

    let mut adverts: BTreeMap<u32, PeerAdvert> = BTreeMap::new();
    adverts.insert(0, advert(&[0, 1, 2], 0, 5, 4));

    let t = agreement.advance(&mut state, &mut accepted, &mut committed, &clique, &adverts);
    assert_eq!(t, Transition::Accept { generation: 5 });
    assert_eq!(accepted, 5);
}

#[test]
fn membership_generation_strictly_increases_across_a_restart() {
    // `§8` scenario 2: {0,1,2} at generation 1, node 1 dies -> {0,2} at
    // generation 2, node 1 rejoins with a new incarnation -> {0,1,2} at
    // generation 3, never reusing 1 or 2.
    let agreement = Agreement::new(0);
    let mut state = ViewState::Change;
    let mut accepted = 0u64;
    let mut committed = 0u64;

    let full = std::collections::BTreeSet::from([0, 1, 2]);
    let mut adverts: BTreeMap<u32, PeerAdvert> = BTreeMap::new();
    for id in [0, 1, 2] {
        adverts.insert(id, advert(&[0, 1, 2], 0, 0, 0));
    }
    agreement.advance(&mut state, &mut accepted, &mut committed, &full, &adverts);
    for id in [0, 1, 2] {
        adverts.insert(id, advert(&[0, 1, 2], 0, 1, 0));
    }
    agreement.advance(&mut state, &mut accepted, &mut committed, &full, &adverts);
    assert_eq!(committed, 1);

    let without_1 = std::collections::BTreeSet::from([0, 2]);
    state = ViewState::Change;
    adverts.clear();
    adverts.insert(0, advert(&[0, 2], 0, 0, 1));
    adverts.insert(2, advert(&[0, 2], 0, 0, 1));
    agreement.advance(&mut state, &mut accepted, &mut committed, &without_1, &adverts);
    adverts.insert(0, advert(&[0, 2], 0, 2, 1));
    adverts.insert(2, advert(&[0, 2], 0, 2, 1));
    agreement.advance(&mut state, &mut accepted, &mut committed, &without_1, &adverts);
    assert_eq!(committed, 2);

    state = ViewState::Change;
    adverts.clear();
    for id in [0, 1, 2] {
        adverts.insert(id, advert(&[0, 1, 2], 0, 0, 2));
    }
    let t = agreement.advance(&mut state, &mut accepted, &mut committed, &full, &adverts);
    assert_eq!(t, Transition::Accept { generation: 3 });
    for id in [0, 1, 2] {
        adverts.insert(id, advert(&[0, 1, 2], 0, 3, 2));
    }
    agreement.advance(&mut state, &mut accepted, &mut committed, &full, &adverts);
    assert_eq!(committed, 3);
}
