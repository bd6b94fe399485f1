//! The `rdev` service: per-node physical disk import/export. Second in
//! service order: `vrt` groups cannot be recovered until their member
//! disks are imported.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::context::CoreContext;
use crate::errors::{AdmindError, Result};
use crate::model::node::NodeId;

use super::registry::Service;

pub struct RdevService;

#[async_trait]
impl Service for RdevService {
    fn name(&self) -> &'static str {
        "rdev"
    }

    async fn recover(&self, ctx: &CoreContext, nodes: &[NodeId]) -> Result<()> {
        info!(?nodes, "rdev: recovering disk imports");
        let cluster = ctx.cluster.read();
        for node in nodes {
            if cluster.get(*node).is_none() {
                return Err(AdmindError::UnknownNode(*node));
            }
        }
        Ok(())
    }

    async fn diskadd(&self, _ctx: &CoreContext, node: NodeId, disk: Uuid, path: &str) -> Result<()> {
        info!(node, %disk, path, "rdev: disk added");
        Ok(())
    }

    async fn diskdel(&self, _ctx: &CoreContext, node: NodeId, disk: Uuid) {
        info!(node, %disk, "rdev: disk removed");
    }
}
