//! Spawns every long-running task into a `JoinSet`-style handle list, each
//! subscribed to the same shutdown broadcast. Grounded on the project's
//! `server::spawner::spawn_all`.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

use crate::context::CoreContext;
use crate::messaging::mailbox::{Mailbox, MailboxId, MailboxTable};
use crate::messaging::transport::Transport;
use crate::membership::Supervisor;
use crate::workthread::exec::WorkThread;

pub async fn spawn_all(
    ctx: Arc<CoreContext>,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::new();

    let transport = Arc::new(Transport::bind(&ctx.config).await?);
    ctx.set_work_thread(Arc::new(WorkThread::new(transport.clone())));

    let membership_mailbox = Mailbox::new(MailboxId::Membership);
    let mut table = MailboxTable::new();
    table.register(&membership_mailbox);

    handles.push(transport.clone().spawn_receive_loop(table, shutdown_tx.subscribe()));

    let (deliveries_tx, mut deliveries_rx) = mpsc::channel(16);
    let supervisor = Supervisor::new(&ctx.config);
    let cluster = Arc::new(parking_lot::RwLock::new(ctx.cluster.read().clone()));
    {
        let cluster = cluster.clone();
        let transport = transport.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            supervisor
                .run(cluster, transport, membership_mailbox, deliveries_tx, shutdown_rx)
                .await;
        }));
    }

    {
        let ctx = ctx.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            use crate::evmgr::leader::EventManager;
            use crate::evmgr::recovery::RecoveryDriver;
            use crate::service::{admin::AdminService, lum::LumService, nbd::NbdService, rdev::RdevService, vrt::VrtService, ServiceRegistry};

            let mut registry = ServiceRegistry::new();
            registry.register(Box::new(AdminService));
            registry.register(Box::new(RdevService));
            registry.register(Box::new(VrtService));
            registry.register(Box::new(NbdService));
            registry.register(Box::new(LumService));

            let mut evmgr = EventManager::new();
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    delivery = deliveries_rx.recv() => {
                        let Some(membership) = delivery else { break };
                        let diff = evmgr.on_committed(membership);
                        let current: std::collections::BTreeSet<_> =
                            diff.up.union(&diff.going_up).copied().collect();
                        ctx.barrier.on_membership_change(current).await;
                        if diff.leader == ctx.config.node_id {
                            ctx.metrics.membership_generation.set(diff.generation as i64);
                            ctx.metrics.clique_size.set((diff.up.len() + diff.going_up.len()) as i64);
                            let outcome = RecoveryDriver::run_up(&ctx, &registry, &diff).await;
                            info!(?outcome, "recovery-up pipeline finished");
                        }
                    }
                }
            }
        }));
    }

    if ctx.config.metrics.enabled {
        let ctx = ctx.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            if let Err(e) = super::metrics_server::run(ctx, shutdown_rx).await {
                tracing::error!(error = %e, "metrics server exited");
            }
        }));
    }

    Ok(handles)
}
