//! The recovery driver: walks the service registry forward for
//! recovery-up, in reverse for shutdown, per `§4.3`/`§4.5`.

use tracing::{error, info, warn};

use crate::context::CoreContext;
use crate::errors::AdmindError;
use crate::evmgr::leader::MembershipDiff;
use crate::model::node::NodeId;
use crate::service::ServiceRegistry;

/// State machine for one recovery attempt: `START -> init -> recover ->
/// resume -> DONE`, with a forced jump to `ABORTED` on `NodeDown` and to
/// `FATAL` on `MetadataCorruption` (`§4.3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Start,
    Init,
    Recover,
    Resume,
    Done,
    Aborted,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Done,
    Aborted { at: RecoveryState, reason: String },
    Fatal { at: RecoveryState, reason: String },
}

pub struct RecoveryDriver;

impl RecoveryDriver {
    /// Run the recovery-up pipeline for one membership delivery. Only the
    /// leader drives this; callers must check `EventManager::is_leader`
    /// before calling.
    pub async fn run_up(
        ctx: &CoreContext,
        registry: &ServiceRegistry,
        diff: &MembershipDiff,
    ) -> RecoveryOutcome {
        let mut state = RecoveryState::Start;
        let up_and_going_up: Vec<NodeId> = diff
            .up
            .union(&diff.going_up)
            .copied()
            .collect();

        info!(generation = diff.generation, leader = diff.leader, "recovery-up starting");

        state = RecoveryState::Init;
        for service in registry.forward() {
            if let Err(e) = service.init(ctx, &up_and_going_up).await {
                return Self::classify(state, service.name(), e);
            }
        }
        if let Some(e) = Self::rendezvous(ctx, &format!("recovery-init {}", diff.generation)).await {
            return Self::classify(state, "recovery pipeline", e);
        }

        state = RecoveryState::Recover;
        for service in registry.forward() {
            if let Err(e) = service.recover(ctx, &up_and_going_up).await {
                return Self::classify(state, service.name(), e);
            }
        }
        if let Some(e) = Self::rendezvous(ctx, &format!("recovery-recover {}", diff.generation)).await {
            return Self::classify(state, "recovery pipeline", e);
        }

        state = RecoveryState::Resume;
        for service in registry.forward() {
            if let Err(e) = service.resume(ctx).await {
                return Self::classify(state, service.name(), e);
            }
        }
        if let Some(e) = Self::rendezvous(ctx, &format!("recovery-resume {}", diff.generation)).await {
            return Self::classify(state, "recovery pipeline", e);
        }

        info!(generation = diff.generation, "recovery-up done");
        RecoveryOutcome::Done
    }

    /// Cross a barrier naming the just-finished phase, so every node in
    /// the membership agrees the phase is done before the next one
    /// starts (`§4.3`, `§4.4`). `None` means every participant reported a
    /// benign outcome; `Some` carries the worst-precedence failure.
    async fn rendezvous(ctx: &CoreContext, step: &str) -> Option<AdmindError> {
        let outcome = ctx.barrier.cross(step, ctx.config.node_id, AdmindError::Success).await;
        if outcome.is_benign() {
            None
        } else {
            Some(outcome)
        }
    }

    /// Shutdown pipeline: reverse service order, `suspend` then `stop`
    /// then `shutdown`.
    pub async fn run_shutdown(
        ctx: &CoreContext,
        registry: &ServiceRegistry,
        nodes_to_stop: &[NodeId],
    ) -> RecoveryOutcome {
        for service in registry.reverse() {
            if let Err(e) = service.suspend(ctx).await {
                warn!(service = service.name(), error = %e, "suspend failed during shutdown");
            }
        }
        for service in registry.reverse() {
            if let Err(e) = service.stop(ctx, nodes_to_stop).await {
                return RecoveryOutcome::Aborted {
                    at: RecoveryState::Start,
                    reason: format!("{}: {e}", service.name()),
                };
            }
        }
        // Rendezvous with the rest of the membership before tearing
        // services down for good, so a slow peer can't be left running
        // against a group the others have already stopped.
        if let Some(e) = Self::rendezvous(ctx, "shutdown").await {
            return RecoveryOutcome::Aborted {
                at: RecoveryState::Start,
                reason: format!("shutdown barrier: {e}"),
            };
        }
        for service in registry.reverse() {
            let _ = service.shutdown(ctx).await;
        }
        RecoveryOutcome::Done
    }

    /// `nodedel` walks services in reverse order (`§4.5`).
    pub async fn run_nodedel(ctx: &CoreContext, registry: &ServiceRegistry, node: NodeId) {
        for service in registry.reverse() {
            service.nodedel(ctx, node).await;
        }
    }

    fn classify(state: RecoveryState, service_name: &str, err: AdmindError) -> RecoveryOutcome {
        match err {
            AdmindError::NodeDown(n) => {
                warn!(service = service_name, node = n, "recovery aborted: node down");
                RecoveryOutcome::Aborted {
                    at: state,
                    reason: format!("{service_name}: node {n} down"),
                }
            }
            AdmindError::MetadataCorruption(msg) => {
                error!(service = service_name, %msg, "recovery fatal: metadata corruption");
                RecoveryOutcome::Fatal { at: state, reason: format!("{service_name}: {msg}") }
            }
            other => RecoveryOutcome::Aborted {
                at: state,
                reason: format!("{service_name}: {other}"),
            },
        }
    }
}
