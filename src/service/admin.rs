//! The `admin` service: cluster-configuration bookkeeping. First in
//! service order since every other service depends on the node/group
//! registries it seeds during `init`.

use async_trait::async_trait;
use tracing::info;

use crate::context::CoreContext;
use crate::errors::Result;
use crate::model::node::NodeId;

use super::registry::Service;

pub struct AdminService;

#[async_trait]
impl Service for AdminService {
    fn name(&self) -> &'static str {
        "admin"
    }

    async fn init(&self, _ctx: &CoreContext, nodes: &[NodeId]) -> Result<()> {
        info!(?nodes, "admin: init");
        Ok(())
    }

    async fn check_up(&self, _ctx: &CoreContext) -> Result<()> {
        Ok(())
    }
}
