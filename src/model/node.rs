//! Node identity and the per-node membership view (`§3`, `§4.2`).

use std::collections::BTreeSet;
use std::time::Instant;

/// Small integer node identifier, unique within the cluster.
pub type NodeId = u32;

/// A node's local knowledge of the membership protocol, per `§4.2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Unknown,
    Change,
    Accept,
    Commit,
}

/// A node's local agreement state: who it currently sees, what clique it
/// has chosen, and where that clique stands in the CHANGE/ACCEPT/COMMIT
/// protocol.
#[derive(Debug, Clone)]
pub struct View {
    pub state: ViewState,
    pub nodes_seen: BTreeSet<NodeId>,
    pub clique: BTreeSet<NodeId>,
    pub coord: Option<NodeId>,
    pub accepted: u64,
    pub committed: u64,
}

impl Default for View {
    fn default() -> Self {
        View {
            state: ViewState::Unknown,
            nodes_seen: BTreeSet::new(),
            clique: BTreeSet::new(),
            coord: None,
            accepted: 0,
            committed: 0,
        }
    }
}

/// One entry in the local node table. `last_seen` is a wall-clock instant
/// refreshed by the messaging substrate on every accepted datagram from
/// this peer; the membership loop compares it against the configured ping
/// timeout to decide liveness.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub incarnation: u32,
    pub view: View,
    pub last_seen: Option<Instant>,
    pub fenced: bool,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, incarnation: u32) -> Self {
        Node {
            id,
            name: name.into(),
            incarnation,
            view: View::default(),
            last_seen: None,
            fenced: false,
        }
    }

    /// Whether this node has been heard from within `timeout` of now.
    pub fn is_alive(&self, timeout: std::time::Duration, now: Instant) -> bool {
        !self.fenced
            && self
                .last_seen
                .is_some_and(|t| now.saturating_duration_since(t) < timeout)
    }
}
