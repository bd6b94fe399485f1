//! Messaging substrate (`§4.1`): mailboxes, wire framing, UDP transport and
//! retransmission. Grounded on the gossip transport loop of the project's
//! cluster module — `tokio::select!` over a periodic tick and a spawned
//! receive task, signed/encoded datagrams — generalised from advisory
//! gossip to the ordered, retransmitted delivery this engine requires.

pub mod mailbox;
pub mod retransmit;
pub mod transport;
pub mod wire;

pub use mailbox::{Mailbox, MailboxId};
pub use transport::Transport;
pub use wire::{Header, MessageFlags, WireMessage};
