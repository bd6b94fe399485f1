//! The membership supervisor task: periodic ping, peer-advert bookkeeping,
//! and delivery of committed memberships to the event manager. Grounded on
//! the project's cluster gossip loop (`tokio::select!` over a ping
//! interval plus a mailbox receive).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::messaging::mailbox::Mailbox;
use crate::messaging::transport::Transport;
use crate::messaging::wire::{MailboxId, PingPayload};
use crate::model::cluster::Cluster;
use crate::model::node::{NodeId, ViewState};

use super::agreement::{Agreement, PeerAdvert, Transition};
use super::clique::compute_clique;

/// A membership delivered to the event manager: a monotonically
/// increasing generation plus the agreed clique (`§4.2`, `§4.3`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedMembership {
    pub generation: u64,
    pub clique: BTreeSet<NodeId>,
}

pub struct Supervisor {
    self_id: NodeId,
    ping_period: Duration,
    ping_timeout: Duration,
    agreement: Agreement,
    adverts: BTreeMap<NodeId, PeerAdvert>,
    accepted: u64,
    committed: u64,
    state: ViewState,
    last_clique: BTreeSet<NodeId>,
    last_coord: Option<NodeId>,
    /// Peers whose incarnation just changed without an intervening
    /// down-mark: excluded from the next clique computation only, per
    /// `§4.2`'s "forced dead for one round".
    forced_dead: BTreeSet<NodeId>,
}

impl Supervisor {
    pub fn new(config: &Config) -> Self {
        Supervisor {
            self_id: config.node_id,
            ping_period: config.ping_period,
            ping_timeout: config.ping_timeout,
            agreement: Agreement::new(config.node_id),
            adverts: BTreeMap::new(),
            accepted: 0,
            committed: 0,
            state: ViewState::Unknown,
            last_clique: BTreeSet::new(),
            last_coord: None,
            forced_dead: BTreeSet::new(),
        }
    }

    fn record_self_seen(&mut self, cluster: &Cluster, now: Instant) -> BTreeSet<NodeId> {
        cluster
            .iter()
            .filter(|n| n.id == self.self_id || n.is_alive(self.ping_timeout, now))
            .map(|n| n.id)
            .collect()
    }

    fn ingest_ping(&mut self, sender: NodeId, p: &PingPayload) {
        self.adverts.insert(
            sender,
            PeerAdvert {
                clique: p.clique.iter().copied().collect(),
                coord: p.coord,
                accepted: p.accepted,
                committed: p.committed,
            },
        );
    }

    /// One iteration: recompute the local clique from current liveness,
    /// advance the agreement state machine, and return a committed
    /// membership if one was just reached.
    #[instrument(skip_all, fields(node = self.self_id))]
    fn tick(&mut self, cluster: &Cluster, now: Instant) -> Option<CommittedMembership> {
        let mut nodes_seen: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
        nodes_seen.insert(self.self_id, self.record_self_seen(cluster, now));
        for (id, advert) in &self.adverts {
            nodes_seen.insert(*id, advert.clique.clone());
        }

        // A peer detected mid-reboot is excluded from this round's clique
        // even if its advert is still on file, so we don't carry over
        // sequence/agreement state from before the reboot.
        for dead in std::mem::take(&mut self.forced_dead) {
            nodes_seen.remove(&dead);
            for seen in nodes_seen.values_mut() {
                seen.remove(&dead);
            }
        }

        let clique = compute_clique(self.self_id, &nodes_seen);

        // Self's own advert participates in the coordinator's view.
        let coord = super::clique::coordinator_of(&clique);
        self.adverts.insert(
            self.self_id,
            PeerAdvert {
                clique: clique.clone(),
                coord,
                accepted: self.accepted,
                committed: self.committed,
            },
        );

        let transition = self.agreement.advance(
            &mut self.state,
            &mut self.accepted,
            &mut self.committed,
            &clique,
            &self.adverts,
        );

        self.last_clique = clique.clone();
        self.last_coord = coord;

        match transition {
            Transition::Commit { generation, clique } => {
                info!(generation, clique = ?clique, "membership committed");
                Some(CommittedMembership { generation, clique })
            }
            Transition::Accept { generation } => {
                info!(generation, "membership accepted, awaiting commit");
                None
            }
            Transition::NoChange => None,
        }
    }

    /// Run the supervisor loop until `shutdown` fires, sending committed
    /// memberships on `deliveries`.
    pub async fn run(
        mut self,
        cluster: Arc<parking_lot::RwLock<Cluster>>,
        transport: Arc<Transport>,
        mut mailbox: Mailbox,
        deliveries: mpsc::Sender<CommittedMembership>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(self.ping_period);
        // §4.2's Byzantine watchdog: a process that can't make timely
        // progress on its own failure-detection loop can't be trusted to
        // hold an accurate view of the cluster, so it takes itself down
        // rather than risk acting on stale liveness state.
        let watchdog_limit = self.ping_timeout / 2;
        let mut last_iteration = Instant::now();
        loop {
            let iter_start = Instant::now();
            let stalled = iter_start.saturating_duration_since(last_iteration);
            if stalled > watchdog_limit {
                tracing::error!(
                    stalled_ms = stalled.as_millis() as u64,
                    limit_ms = watchdog_limit.as_millis() as u64,
                    "membership loop made no progress for longer than half the ping timeout, aborting"
                );
                std::process::abort();
            }
            last_iteration = iter_start;
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let delivery = {
                        let guard = cluster.read();
                        self.tick(&guard, now)
                    };
                    let ping = PingPayload {
                        next_sequence: 0,
                        clique: self.last_clique.iter().copied().collect(),
                        coord: self.last_coord,
                        accepted: self.accepted,
                        committed: self.committed,
                    };
                    let peers: Vec<NodeId> = cluster.read().known_ids().filter(|id| *id != self.self_id).collect();
                    if let Err(e) = transport.send_special(MailboxId::Membership, peers, &ping).await {
                        warn!(error = %e, "failed to send membership ping");
                    }
                    if let Some(membership) = delivery {
                        let _ = deliveries.send(membership).await;
                    }
                }
                msg = mailbox.recv() => {
                    let Some(msg) = msg else { break };
                    if let Ok(payload) = crate::messaging::wire::decode::<PingPayload>(&msg.payload) {
                        let sender = msg.header.sender_id;
                        let rebooted = {
                            let mut guard = cluster.write();
                            match guard.get_mut(sender) {
                                Some(node) => {
                                    // A node that reboots faster than the ping
                                    // timeout never passes through a down-mark;
                                    // the only signal is its incarnation jumping
                                    // while we still think it's alive.
                                    let rebooted = node.incarnation != msg.header.incarnation
                                        && node.last_seen.is_some();
                                    node.incarnation = msg.header.incarnation;
                                    if !rebooted {
                                        node.last_seen = Some(Instant::now());
                                    }
                                    rebooted
                                }
                                None => false,
                            }
                        };
                        if rebooted {
                            warn!(sender, incarnation = msg.header.incarnation, "peer incarnation changed, forcing dead for one round");
                            self.forced_dead.insert(sender);
                            self.adverts.remove(&sender);
                        } else {
                            self.ingest_ping(sender, &payload);
                        }
                    }
                }
            }
        }
    }
}
