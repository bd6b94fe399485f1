//! The `nbd` service: block-device export of started volumes.

use async_trait::async_trait;
use tracing::info;

use crate::context::CoreContext;
use crate::errors::Result;
use crate::model::export::Export;
use crate::model::node::NodeId;

use super::registry::Service;

pub struct NbdService;

#[async_trait]
impl Service for NbdService {
    fn name(&self) -> &'static str {
        "nbd"
    }

    async fn resume(&self, ctx: &CoreContext) -> Result<()> {
        let volumes = ctx.volumes.read();
        let mut exports = ctx.exports.write();
        for volume in volumes.values().filter(|v| v.started && v.exported) {
            if !exports.exports.iter().any(|e| e.volume_uuid() == volume.uuid) {
                exports.push(Export::Bdev {
                    volume_uuid: volume.uuid,
                    path: format!("/dev/exa/{}", volume.name),
                });
            }
        }
        Ok(())
    }

    async fn stop(&self, ctx: &CoreContext, nodes_to_stop: &[NodeId]) -> Result<()> {
        info!(?nodes_to_stop, "nbd: tearing down exports on stopped nodes");
        Ok(())
    }
}
