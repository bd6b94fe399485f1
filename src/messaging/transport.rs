//! UDP multicast transport: the send/receive loop every higher layer rides
//! on. Grounded on the project's gossip transport (`tokio::select!` over a
//! periodic tick plus a spawned receive task, bincode-encoded datagrams)
//! generalised here to ordered, retransmitted, per-sender sequenced
//! delivery instead of advisory gossip.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::{AdmindError, Result};
use crate::model::node::NodeId;

use super::mailbox::MailboxTable;
use super::retransmit::{Backoff, RetransmitScheduler};
use super::wire::{self, Header, MailboxId, MessageFlags, WireMessage};

/// Per-sender sequencing state the receiver maintains to detect gaps.
#[derive(Debug, Default)]
struct PeerRxState {
    incarnation: u32,
    next_expected: u32,
    seen_up: bool,
}

/// The live transport: an open multicast socket plus the bookkeeping
/// needed to honour `§4.1`'s ordering, dedup and fencing guarantees.
pub struct Transport {
    socket: Arc<UdpSocket>,
    dest: SocketAddr,
    cluster_uuid: String,
    self_id: NodeId,
    self_name: String,
    incarnation: u32,
    tx_sequence: Mutex<u32>,
    backoff: Mutex<Backoff>,
    rx_state: Mutex<HashMap<NodeId, PeerRxState>>,
    retransmit: Mutex<RetransmitScheduler>,
    fenced: Mutex<std::collections::HashSet<NodeId>>,
}

impl Transport {
    pub async fn bind(config: &Config) -> Result<Self> {
        let bind_addr: SocketAddr = ([0, 0, 0, 0], config.multicast_port).into();
        let socket = UdpSocket::bind(bind_addr).await?;
        if let std::net::IpAddr::V4(group) = config.multicast_group {
            socket.join_multicast_v4(group, std::net::Ipv4Addr::UNSPECIFIED)?;
        }
        let dest = SocketAddr::new(config.multicast_group, config.multicast_port);

        Ok(Transport {
            socket: Arc::new(socket),
            dest,
            cluster_uuid: config.cluster_uuid.clone(),
            self_id: config.node_id,
            self_name: config.node_name.clone(),
            incarnation: config.incarnation,
            tx_sequence: Mutex::new(0),
            backoff: Mutex::new(Backoff::default()),
            rx_state: Mutex::new(HashMap::new()),
            retransmit: Mutex::new(RetransmitScheduler::new()),
            fenced: Mutex::new(std::collections::HashSet::new()),
        })
    }

    pub fn fence(&self, node: NodeId) {
        self.fenced.lock().insert(node);
        self.rx_state.lock().remove(&node);
    }

    pub fn unfence(&self, node: NodeId) {
        self.fenced.lock().remove(&node);
    }

    /// Send a normal (sequenced) message to the given mailbox, fanning out
    /// to `dest_nodes`. Respects the current adaptive backoff.
    pub async fn send(
        &self,
        recipient: MailboxId,
        dest_nodes: Vec<NodeId>,
        payload: &impl serde::Serialize,
    ) -> Result<()> {
        let delay = self.backoff.lock().duration();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let sequence = {
            let mut seq = self.tx_sequence.lock();
            *seq = seq.wrapping_add(1);
            *seq
        };
        self.send_raw(recipient, dest_nodes, MessageFlags::empty(), sequence, payload)
            .await?;
        self.backoff.lock().on_successful_send();
        Ok(())
    }

    /// Send a ping / other out-of-band special message; not sequence-checked.
    pub async fn send_special(
        &self,
        recipient: MailboxId,
        dest_nodes: Vec<NodeId>,
        payload: &impl serde::Serialize,
    ) -> Result<()> {
        let next = *self.tx_sequence.lock() + 1;
        self.send_raw(recipient, dest_nodes, MessageFlags::SPECIAL, next, payload)
            .await
    }

    /// Ask `dest_nodes` to resend starting at `sequence`, flagged so the
    /// recipient can tell this apart from a normal delivery. Bypasses the
    /// send backoff and instead feeds the adaptive backoff's increase side,
    /// since a gap means the link to that peer is already under strain
    /// (`§4.1`).
    pub async fn retransmit(
        &self,
        recipient: MailboxId,
        dest_nodes: Vec<NodeId>,
        sequence: u32,
        payload: &impl serde::Serialize,
    ) -> Result<()> {
        self.backoff.lock().on_retransmit();
        self.send_raw(recipient, dest_nodes, MessageFlags::RETRANSMIT_REQUEST, sequence, payload)
            .await
    }

    async fn send_raw(
        &self,
        recipient: MailboxId,
        dest_nodes: Vec<NodeId>,
        flags: MessageFlags,
        sequence: u32,
        payload: &impl serde::Serialize,
    ) -> Result<()> {
        let body = wire::encode(payload)?;
        if body.len() > wire::MAX_PAYLOAD_BYTES {
            return Err(AdmindError::InvalidParam(
                "payload exceeds maximum datagram size".into(),
            ));
        }
        let msg = WireMessage {
            header: Header {
                protocol: wire::PROTOCOL_VERSION,
                cluster_uuid: self.cluster_uuid.clone(),
                sender_id: self.self_id,
                sender_name: self.self_name.clone(),
                recipient,
                flags,
                dest_nodes,
                incarnation: self.incarnation,
                sequence,
            },
            payload: body,
        };
        let datagram = wire::encode(&msg)?;
        self.socket.send_to(&datagram, self.dest).await?;
        Ok(())
    }

    /// Validate and sequence-check an inbound datagram. Returns `Some` when
    /// the message should be delivered, annotated with whether a gap was
    /// detected (caller should then issue a retransmit request).
    pub fn accept(&self, msg: &WireMessage) -> AcceptOutcome {
        if msg.header.protocol != wire::PROTOCOL_VERSION {
            return AcceptOutcome::Drop;
        }
        if msg.header.cluster_uuid != self.cluster_uuid {
            return AcceptOutcome::Drop;
        }
        if self.fenced.lock().contains(&msg.header.sender_id) {
            return AcceptOutcome::Drop;
        }

        let mut rx = self.rx_state.lock();
        let state = rx.entry(msg.header.sender_id).or_default();

        if state.incarnation != msg.header.incarnation {
            if !state.seen_up {
                state.incarnation = msg.header.incarnation;
                state.next_expected = msg.header.sequence;
            } else {
                // Stale incarnation until the next special message re-syncs us.
                return AcceptOutcome::Drop;
            }
        }

        if msg.is_special() {
            let gap = msg.header.sequence > state.next_expected;
            state.seen_up = true;
            return if gap {
                AcceptOutcome::DeliverWithGap { from_sequence: state.next_expected }
            } else {
                AcceptOutcome::Deliver
            };
        }

        if msg.header.sequence < state.next_expected {
            debug!(sender = msg.header.sender_id, "duplicate message dropped");
            return AcceptOutcome::Drop;
        }
        if msg.header.sequence > state.next_expected {
            warn!(sender = msg.header.sender_id, expected = state.next_expected, got = msg.header.sequence, "sequence gap");
            return AcceptOutcome::DeliverWithGap { from_sequence: state.next_expected };
        }
        state.next_expected = state.next_expected.wrapping_add(1);
        AcceptOutcome::Deliver
    }

    pub fn should_retransmit(&self, sender: NodeId, from_sequence: u32) -> bool {
        self.retransmit.lock().request(sender, from_sequence, std::time::Instant::now())
    }

    /// Spawn the receive loop, routing accepted datagrams into `table`.
    pub fn spawn_receive_loop(
        self: Arc<Self>,
        table: MailboxTable,
        mut shutdown: tokio::sync::broadcast::Receiver<()>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut buf = vec![0u8; 16 * 1024];
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    recv = self.socket.recv_from(&mut buf) => {
                        match recv {
                            Ok((n, _from)) => {
                                if let Ok(msg) = wire::decode::<WireMessage>(&buf[..n]) {
                                    match self.accept(&msg) {
                                        AcceptOutcome::Deliver => {
                                            table.route(msg).await;
                                        }
                                        AcceptOutcome::DeliverWithGap { from_sequence } => {
                                            let sender = msg.header.sender_id;
                                            let recipient = msg.header.recipient;
                                            table.route(msg).await;
                                            if self.should_retransmit(sender, from_sequence) {
                                                let request = wire::RetransmitRequest { from_sequence };
                                                if let Err(e) = self
                                                    .retransmit(recipient, vec![sender], from_sequence, &request)
                                                    .await
                                                {
                                                    warn!(error = %e, sender, "failed to send retransmit request");
                                                }
                                            }
                                        }
                                        AcceptOutcome::Drop => {}
                                    }
                                }
                            }
                            Err(e) => warn!(error = %e, "transport receive error"),
                        }
                    }
                }
            }
        })
    }
}

pub enum AcceptOutcome {
    Deliver,
    DeliverWithGap { from_sequence: u32 },
    Drop,
}
