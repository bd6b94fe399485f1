//! The on-the-wire message shape (`§6` RPC wire format).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::model::node::NodeId;

pub const PROTOCOL_VERSION: u32 = 2;
/// Conservative ceiling keeping a whole message inside a UDP datagram.
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MessageFlags: u8 {
        /// This message is a retransmit request, not a normal delivery.
        const RETRANSMIT_REQUEST = 0b01;
        /// Out-of-band message (ping or similar); not sequence-checked.
        const SPECIAL            = 0b10;
    }
}

/// The per-component mailbox a message is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MailboxId {
    Membership,
    WorkThread,
    Recovery,
}

/// Fixed header carried by every datagram, mirroring `§6`'s byte layout
/// (cluster uuid, sender identity, recipient mailbox, flags, size,
/// destination set, incarnation, sequence).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub protocol: u32,
    pub cluster_uuid: String,
    pub sender_id: NodeId,
    pub sender_name: String,
    pub recipient: MailboxId,
    pub flags: MessageFlags,
    pub dest_nodes: Vec<NodeId>,
    pub incarnation: u32,
    pub sequence: u32,
}

/// A complete wire message: header plus an opaque, bincode-encoded body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl WireMessage {
    pub fn is_special(&self) -> bool {
        self.header.flags.contains(MessageFlags::SPECIAL)
    }

    pub fn is_retransmit_request(&self) -> bool {
        self.header.flags.contains(MessageFlags::RETRANSMIT_REQUEST)
    }
}

/// Ping payload: announces the sender's next sequence number so a peer
/// that has fallen behind can ask for a retransmission, plus the sender's
/// current membership-agreement view (`§4.2`) so peers can drive the
/// CHANGE/ACCEPT/COMMIT state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingPayload {
    pub next_sequence: u32,
    pub clique: Vec<NodeId>,
    pub coord: Option<NodeId>,
    pub accepted: u64,
    pub committed: u64,
}

/// Body of a retransmit-request special message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetransmitRequest {
    pub from_sequence: u32,
}

pub fn encode<T: Serialize>(value: &T) -> crate::errors::Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| crate::errors::AdmindError::Serialization(e.to_string()))
}

pub fn decode<T: for<'a> Deserialize<'a>>(bytes: &[u8]) -> crate::errors::Result<T> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| crate::errors::AdmindError::Serialization(e.to_string()))
}
