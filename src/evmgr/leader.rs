//! Leader election and up/going_up/going_down set computation (`§4.3`).

use std::collections::BTreeSet;

use crate::membership::CommittedMembership;
use crate::model::node::NodeId;

/// Tracks the previous committed membership so each new delivery can be
/// diffed into `up`/`going_up`/`going_down`, and derives the leader
/// (lowest-id member of the *current* membership).
pub struct EventManager {
    previous: BTreeSet<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipDiff {
    pub generation: u64,
    pub leader: NodeId,
    pub up: BTreeSet<NodeId>,
    pub going_up: BTreeSet<NodeId>,
    pub going_down: BTreeSet<NodeId>,
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EventManager {
    pub fn new() -> Self {
        EventManager { previous: BTreeSet::new() }
    }

    pub fn on_committed(&mut self, membership: CommittedMembership) -> MembershipDiff {
        let current = membership.clique;
        let up: BTreeSet<NodeId> = current.intersection(&self.previous).copied().collect();
        let going_up: BTreeSet<NodeId> = current.difference(&self.previous).copied().collect();
        let going_down: BTreeSet<NodeId> = self.previous.difference(&current).copied().collect();
        let leader = *current.iter().min().expect("clique always contains self");
        self.previous = current;
        MembershipDiff {
            generation: membership.generation,
            leader,
            up,
            going_up,
            going_down,
        }
    }

    pub fn is_leader(&self, self_id: NodeId) -> bool {
        self.previous.iter().min() == Some(&self_id)
    }
}
