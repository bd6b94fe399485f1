//! The explicit core context every command handler, service callback and
//! background task is handed instead of reaching into module-level
//! globals (`§9` design note). Grounded on the project's `ServerState`
//! (`core/state/core.rs`): one `Arc`-wrapped struct built by a single
//! `initialize` factory and threaded through every task.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::model::cluster::Cluster;
use crate::model::disk::Disk;
use crate::model::export::ExportList;
use crate::model::group::Group;
use crate::model::node::{Node, NodeId};
use crate::model::volume::Volume;
use crate::workthread::barrier::BarrierCoordinator;
use crate::workthread::exec::WorkThread;

pub struct CoreContext {
    pub config: Config,
    pub cluster: RwLock<Cluster>,
    pub groups: RwLock<IndexMap<Uuid, Group>>,
    pub disks: RwLock<IndexMap<Uuid, Disk>>,
    pub volumes: RwLock<IndexMap<Uuid, Volume>>,
    pub exports: RwLock<ExportList>,
    pub metrics: Arc<Metrics>,
    /// The RPC-fanout primitive, bound in once `Transport` exists
    /// (`server::spawner::spawn_all`); `None` only before that point.
    pub work_thread: RwLock<Option<Arc<WorkThread>>>,
    /// Single shared barrier used by every clustered command to rendezvous
    /// on a named step before acknowledging the caller (`§4.4`).
    pub barrier: Arc<BarrierCoordinator>,
}

impl CoreContext {
    /// Build the shared context from a resolved configuration: seeds the
    /// node registry from `known_nodes`, marks the local node as self, and
    /// starts every other registry empty.
    pub fn initialize(config: Config) -> crate::errors::Result<Arc<Self>> {
        let mut cluster = Cluster::new();
        for known in &config.known_nodes {
            cluster.insert(Node::new(known.node_id, known.name.clone(), config.incarnation))
                .map_err(|e| crate::errors::AdmindError::Config(e.to_string()))?;
        }
        cluster
            .set_self(config.node_id)
            .map_err(|e| crate::errors::AdmindError::Config(e.to_string()))?;

        let metrics = Arc::new(Metrics::new());
        // Seeded to just this node: the real expected set tracks the live
        // clique and is kept current by `BarrierCoordinator::on_membership_change`
        // as membership commits arrive (`server::spawner::spawn_all`), not
        // the static configured node list.
        let expected: std::collections::BTreeSet<NodeId> = std::iter::once(config.node_id).collect();

        Ok(Arc::new(CoreContext {
            cluster: RwLock::new(cluster),
            groups: RwLock::new(IndexMap::new()),
            disks: RwLock::new(IndexMap::new()),
            volumes: RwLock::new(IndexMap::new()),
            exports: RwLock::new(ExportList::new()),
            metrics,
            work_thread: RwLock::new(None),
            barrier: Arc::new(BarrierCoordinator::new(expected)),
            config,
        }))
    }

    /// Bind the live work-thread once the transport is up; called exactly
    /// once during startup (`server::spawner::spawn_all`).
    pub fn set_work_thread(&self, wt: Arc<WorkThread>) {
        *self.work_thread.write() = Some(wt);
    }

    /// Every known cluster member other than this node, in ascending id
    /// order; the fan-out target set for a clustered command.
    pub fn peer_nodes(&self) -> Vec<NodeId> {
        let self_id = self.config.node_id;
        self.cluster
            .read()
            .iter()
            .map(|n| n.id)
            .filter(|id| *id != self_id)
            .collect()
    }
}
