//! The `Service` trait and its ordered registry (`§4.5`).

use async_trait::async_trait;

use crate::context::CoreContext;
use crate::errors::Result;
use crate::model::node::NodeId;

/// Every clustered lifecycle callback a service can be asked to run.
/// Default implementations are `NothingToDo`-equivalent no-ops so a
/// service only needs to override the callbacks it actually cares about —
/// the registry always calls the full set in order.
#[async_trait]
pub trait Service: Send + Sync {
    /// Stable name, used in logs and for startup collision detection.
    fn name(&self) -> &'static str;

    async fn init(&self, _ctx: &CoreContext, _nodes: &[NodeId]) -> Result<()> {
        Ok(())
    }

    async fn recover(&self, _ctx: &CoreContext, _nodes: &[NodeId]) -> Result<()> {
        Ok(())
    }

    async fn resume(&self, _ctx: &CoreContext) -> Result<()> {
        Ok(())
    }

    async fn suspend(&self, _ctx: &CoreContext) -> Result<()> {
        Ok(())
    }

    async fn stop(&self, _ctx: &CoreContext, _nodes_to_stop: &[NodeId]) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&self, _ctx: &CoreContext) -> Result<()> {
        Ok(())
    }

    async fn check_up(&self, _ctx: &CoreContext) -> Result<()> {
        Ok(())
    }

    async fn nodeadd(&self, _ctx: &CoreContext, _node: NodeId) -> Result<()> {
        Ok(())
    }

    async fn nodeadd_commit(&self, _ctx: &CoreContext, _node: NodeId) -> Result<()> {
        Ok(())
    }

    async fn nodedel(&self, _ctx: &CoreContext, _node: NodeId) {}

    /// Veto a node deletion if this service still holds a resource owned
    /// by `node`. `Ok(())` means "no objection".
    async fn check_nodedel(&self, _ctx: &CoreContext, _node: NodeId) -> Result<()> {
        Ok(())
    }

    async fn diskadd(&self, _ctx: &CoreContext, _node: NodeId, _disk: uuid::Uuid, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn diskdel(&self, _ctx: &CoreContext, _node: NodeId, _disk: uuid::Uuid) {}
}

/// An ordered list of services. Recovery-up walks it forward; shutdown and
/// `nodedel` walk it in reverse (`§4.5`'s ordering invariant, grounded on
/// the original `adm_service_for_each`/`adm_service_for_each_reverse`
/// iteration macros).
#[derive(Default)]
pub struct ServiceRegistry {
    services: Vec<Box<dyn Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, service: Box<dyn Service>) {
        self.services.push(service);
    }

    pub fn forward(&self) -> impl Iterator<Item = &dyn Service> {
        self.services.iter().map(|s| s.as_ref())
    }

    pub fn reverse(&self) -> impl Iterator<Item = &dyn Service> {
        self.services.iter().rev().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
