//! Logical volume record (`§3`).

use std::collections::BTreeSet;
use uuid::Uuid;

use super::node::NodeId;

/// A logical volume within a group. The three `goal_*` bitsets are
/// per-node: each node tracks, for every volume it hosts, whether that
/// node wants it started, stopped, or read-only once started.
#[derive(Debug, Clone)]
pub struct Volume {
    pub uuid: Uuid,
    pub group_uuid: Uuid,
    pub name: String,
    pub size_kb: u64,
    pub goal_started: BTreeSet<NodeId>,
    pub goal_stopped: BTreeSet<NodeId>,
    pub goal_readonly: BTreeSet<NodeId>,
    pub started: bool,
    pub readonly: bool,
    pub exported: bool,
    pub committed: bool,
    pub read_ahead_kb: Option<u32>,
    pub lun: Option<u32>,
}

impl Volume {
    pub fn new(uuid: Uuid, group_uuid: Uuid, name: impl Into<String>, size_kb: u64) -> Self {
        Volume {
            uuid,
            group_uuid,
            name: name.into(),
            size_kb,
            goal_started: BTreeSet::new(),
            goal_stopped: BTreeSet::new(),
            goal_readonly: BTreeSet::new(),
            started: false,
            readonly: false,
            exported: false,
            committed: false,
            read_ahead_kb: None,
            lun: None,
        }
    }

    pub fn set_goal_started(&mut self, node: NodeId) {
        self.goal_stopped.remove(&node);
        self.goal_started.insert(node);
    }

    pub fn set_goal_stopped(&mut self, node: NodeId) {
        self.goal_started.remove(&node);
        self.goal_stopped.insert(node);
    }
}
