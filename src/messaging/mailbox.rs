//! In-process mailboxes: bounded channels keyed by component id.

use tokio::sync::mpsc;

use super::wire::WireMessage;

pub use super::wire::MailboxId;

const MAILBOX_CAPACITY: usize = 256;

/// One bounded inbox for a component (membership, work-thread, recovery).
pub struct Mailbox {
    pub id: MailboxId,
    tx: mpsc::Sender<WireMessage>,
    rx: mpsc::Receiver<WireMessage>,
}

impl Mailbox {
    pub fn new(id: MailboxId) -> Self {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        Mailbox { id, tx, rx }
    }

    pub fn sender(&self) -> mpsc::Sender<WireMessage> {
        self.tx.clone()
    }

    pub async fn recv(&mut self) -> Option<WireMessage> {
        self.rx.recv().await
    }
}

/// A lightweight table of mailbox senders, handed to the receive loop so
/// it can route an incoming datagram without knowing about consumers.
#[derive(Clone, Default)]
pub struct MailboxTable {
    membership: Option<mpsc::Sender<WireMessage>>,
    workthread: Option<mpsc::Sender<WireMessage>>,
    recovery: Option<mpsc::Sender<WireMessage>>,
}

impl MailboxTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, mailbox: &Mailbox) {
        let sender = mailbox.sender();
        match mailbox.id {
            MailboxId::Membership => self.membership = Some(sender),
            MailboxId::WorkThread => self.workthread = Some(sender),
            MailboxId::Recovery => self.recovery = Some(sender),
        }
    }

    pub async fn route(&self, msg: WireMessage) -> bool {
        let sender = match msg.header.recipient {
            MailboxId::Membership => &self.membership,
            MailboxId::WorkThread => &self.workthread,
            MailboxId::Recovery => &self.recovery,
        };
        match sender {
            Some(tx) => tx.send(msg).await.is_ok(),
            None => false,
        }
    }
}
