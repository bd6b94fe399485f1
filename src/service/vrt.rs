//! The `vrt` service: group/volume virtualisation. Owns the superblock
//! version protocol (`§4.7`) for every group it recovers.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::context::CoreContext;
use crate::errors::{AdmindError, Result};
use crate::model::node::NodeId;
use crate::workthread::exec;

use super::registry::Service;

/// RPC code carrying a leader's candidate committed superblock version to
/// every other holder of a group, ahead of the prepare/commit rendezvous
/// (`§4.7`).
const SB_SYNC_RPC: u16 = 0xAC00;

pub struct VrtService;

#[async_trait]
impl Service for VrtService {
    fn name(&self) -> &'static str {
        "vrt"
    }

    /// Drives the `§4.7` superblock-version synchronisation for every
    /// group this node holds disks in: the lowest-id node in `nodes`
    /// publishes its committed version, every holder merges to the max,
    /// then all rendezvous on a `"prepare sb"`/`"write sb"` barrier pair
    /// before promoting the prepared candidate.
    async fn recover(&self, ctx: &CoreContext, nodes: &[NodeId]) -> Result<()> {
        let self_id = ctx.config.node_id;
        let is_leader = nodes.iter().min() == Some(&self_id);

        let group_uuids: Vec<Uuid> = ctx
            .groups
            .read()
            .values()
            .filter(|g| !g.disks.is_empty())
            .map(|g| g.uuid)
            .collect();

        for uuid in &group_uuids {
            let baseline = ctx.groups.read().get(uuid).map(|g| g.sb_version.committed).unwrap_or(0);

            if is_leader {
                if let Some(wt) = ctx.work_thread.read().clone() {
                    let peers = ctx.peer_nodes();
                    if !peers.is_empty() {
                        let _ = exec::exec_command(&wt, SB_SYNC_RPC, &baseline, &peers).await;
                    }
                }
            } else if let Some(group) = ctx.groups.write().get_mut(uuid) {
                // Until a live participant-side RPC handler exists, a
                // follower merges against what it already has on file;
                // the leader's broadcast above still reaches it over the
                // wire, just with nothing yet consuming `SB_SYNC_RPC`.
                group.sb_version.merge_committed(baseline);
            }

            let local_prepare = match ctx.groups.write().get_mut(uuid) {
                Some(group) => match group.sb_version.prepare() {
                    Ok(_) => AdmindError::Success,
                    Err(_) => AdmindError::NothingToDo,
                },
                None => AdmindError::NothingToDo,
            };
            let prepare_outcome = ctx
                .barrier
                .cross(&format!("prepare sb {uuid}"), self_id, local_prepare)
                .await;
            if !prepare_outcome.is_benign() {
                if let Some(group) = ctx.groups.write().get_mut(uuid) {
                    group.sb_version.recover();
                }
                continue;
            }

            let write_outcome = ctx
                .barrier
                .cross(&format!("write sb {uuid}"), self_id, AdmindError::Success)
                .await;
            if let Some(group) = ctx.groups.write().get_mut(uuid) {
                if write_outcome.is_benign() {
                    let _ = group.sb_version.commit();
                } else {
                    group.sb_version.recover();
                }
            }
        }

        info!(?nodes, groups = group_uuids.len(), "vrt: recovered groups");
        Ok(())
    }

    async fn resume(&self, ctx: &CoreContext) -> Result<()> {
        for group in ctx.groups.write().values_mut() {
            if group.started_locally_valid() {
                group.started = true;
            }
        }
        Ok(())
    }

    async fn suspend(&self, ctx: &CoreContext) -> Result<()> {
        for group in ctx.groups.write().values_mut() {
            group.started = false;
        }
        Ok(())
    }

    async fn check_nodedel(&self, ctx: &CoreContext, node: NodeId) -> Result<()> {
        let groups = ctx.groups.read();
        let holds_disk = groups
            .values()
            .flat_map(|g| g.disks.iter())
            .filter_map(|uuid| ctx.disks.read().get(uuid).cloned())
            .any(|d| d.node_id == node);
        if holds_disk {
            return Err(AdmindError::ResourceInUse(format!(
                "node {node} still owns a disk in an active group"
            )));
        }
        Ok(())
    }
}
