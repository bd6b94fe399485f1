//! Cluster-wide node registry (`§3`).

use std::collections::BTreeMap;

use super::node::{Node, NodeId};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("node {0} is already known")]
    DuplicateNode(NodeId),
    #[error("node {0} is unknown")]
    UnknownNode(NodeId),
}

/// Maps node-id to [`Node`] and tracks which node is `self`.
///
/// Mirrors the project's "global registries become an explicit context"
/// convention (`context::CoreContext` owns one of these): no module-level
/// statics, every reader/writer goes through an owned or shared `Cluster`.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    nodes: BTreeMap<NodeId, Node>,
    self_id: Option<NodeId>,
}

impl Cluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node) -> Result<(), ClusterError> {
        if self.nodes.contains_key(&node.id) {
            return Err(ClusterError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    pub fn set_self(&mut self, id: NodeId) -> Result<(), ClusterError> {
        if !self.nodes.contains_key(&id) {
            return Err(ClusterError::UnknownNode(id));
        }
        self.self_id = Some(id);
        Ok(())
    }

    pub fn self_id(&self) -> Option<NodeId> {
        self.self_id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn remove(&mut self, id: NodeId) -> Result<Node, ClusterError> {
        self.nodes.remove(&id).ok_or(ClusterError::UnknownNode(id))
    }

    pub fn known_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
