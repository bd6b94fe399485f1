//! Clique computation (`§4.2`): the largest mutually-visible node subset
//! containing `self`, with deterministic tie-breaking so every node
//! independently computes the same result.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::node::NodeId;

/// Greedy refinement: sort candidates ascending by `|nodes_seen|` (ties by
/// node-id), grow a clique by admitting the next candidate iff it is seen
/// by every already-admitted member. If `self` ends up excluded, drop the
/// clique found so far from the candidate pool and retry — self always
/// sees itself, so the loop terminates with self included, possibly alone.
pub fn compute_clique(
    self_id: NodeId,
    nodes_seen: &BTreeMap<NodeId, BTreeSet<NodeId>>,
) -> BTreeSet<NodeId> {
    let mut pool: Vec<NodeId> = nodes_seen.keys().copied().collect();

    loop {
        let mut candidates = pool.clone();
        candidates.sort_by_key(|id| {
            let seen_count = nodes_seen.get(id).map(|s| s.len()).unwrap_or(0);
            (seen_count, *id)
        });

        let mut clique: BTreeSet<NodeId> = BTreeSet::new();
        for candidate in candidates {
            let sees_all_admitted = clique.iter().all(|member| {
                nodes_seen
                    .get(&candidate)
                    .is_some_and(|seen| seen.contains(member))
            });
            let admitted_see_candidate = clique.iter().all(|member| {
                nodes_seen
                    .get(member)
                    .is_some_and(|seen| seen.contains(&candidate))
            });
            if sees_all_admitted && admitted_see_candidate {
                clique.insert(candidate);
            }
        }

        if clique.contains(&self_id) {
            return clique;
        }

        if clique.is_empty() {
            // Self sees nobody (not even itself recorded yet): trivial clique.
            return BTreeSet::from([self_id]);
        }

        pool.retain(|id| !clique.contains(id));
        if pool.is_empty() {
            return BTreeSet::from([self_id]);
        }
    }
}

/// Lowest-id member of the clique is the coordinator.
pub fn coordinator_of(clique: &BTreeSet<NodeId>) -> Option<NodeId> {
    clique.iter().min().copied()
}
