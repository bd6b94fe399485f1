//! Per-peer send backoff and retransmit-request coalescing (`§4.1`).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::model::node::NodeId;

const MIN_BACKOFF_MS: u64 = 0;
const MAX_BACKOFF_MS: u64 = 80;
const COALESCE_WINDOW: Duration = Duration::from_millis(400);

/// Adaptive per-peer backoff: multiplicative increase on retransmission,
/// proportional decrease on a successful plain send, clamped to
/// `[0, 80ms]` per `§4.1`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    current_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff { current_ms: MIN_BACKOFF_MS }
    }
}

impl Backoff {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.current_ms)
    }

    pub fn on_retransmit(&mut self) {
        self.current_ms = ((self.current_ms * 2).max(1)).min(MAX_BACKOFF_MS);
    }

    pub fn on_successful_send(&mut self) {
        self.current_ms = self.current_ms.saturating_sub(self.current_ms / 4);
    }
}

/// Tracks outstanding retransmit requests per sender so that overlapping
/// requests from multiple receivers coalesce into a single retransmission
/// (`§8` scenario 6).
#[derive(Debug, Default)]
pub struct RetransmitScheduler {
    /// sender -> (oldest requested sequence, when the window opened)
    pending: HashMap<NodeId, (u32, Instant)>,
}

impl RetransmitScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a retransmit request for `sender` starting at `from_sequence`.
    /// Returns `true` if this request should actually trigger a
    /// retransmission (i.e. it opened the window or lowered the floor);
    /// `false` if it was absorbed by an already-pending, equal-or-older
    /// request within the coalescing window.
    pub fn request(&mut self, sender: NodeId, from_sequence: u32, now: Instant) -> bool {
        match self.pending.get_mut(&sender) {
            Some((seq, opened)) if now.saturating_duration_since(*opened) < COALESCE_WINDOW => {
                if from_sequence < *seq {
                    *seq = from_sequence;
                    true
                } else {
                    false
                }
            }
            _ => {
                self.pending.insert(sender, (from_sequence, now));
                true
            }
        }
    }

    pub fn clear(&mut self, sender: NodeId) {
        self.pending.remove(&sender);
    }
}
