//! Result aggregation precedence and the named-barrier rendez-vous
//! (`§4.4`): `METADATA_CORRUPTION > NODE_DOWN > any other nonzero > NOTHING_TO_DO > SUCCESS`.

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::{oneshot, Mutex};

use crate::errors::AdmindError;
use crate::model::node::NodeId;

/// Rank used to pick the single worst-in-precedence result out of a set of
/// per-node outcomes. Higher wins.
fn precedence_rank(e: &AdmindError) -> u8 {
    match e {
        AdmindError::MetadataCorruption(_) => 4,
        AdmindError::NodeDown(_) => 3,
        AdmindError::Success => 0,
        AdmindError::NothingToDo => 1,
        _ => 2,
    }
}

/// Fold per-node outcomes into the single cluster-wide result, per the
/// precedence in `§4.4`. An empty set of results is `Success` (there was
/// simply nobody to report from).
pub fn aggregate(results: impl IntoIterator<Item = AdmindError>) -> AdmindError {
    let mut best: Option<AdmindError> = None;
    for r in results {
        best = match best {
            None => Some(r),
            Some(ref current) if precedence_rank(&r) > precedence_rank(current) => Some(r),
            Some(current) => Some(current),
        };
    }
    best.unwrap_or(AdmindError::Success)
}

/// Synchronises one named barrier step across the current membership.
/// Every member must call `cross` with the same `step_name` in the same
/// order as every other member; the call resolves once every expected
/// member has arrived (or is known to have dropped out of the
/// membership, in which case the aggregate becomes `NODE_DOWN`).
pub struct BarrierCoordinator {
    inner: Mutex<BarrierState>,
}

struct BarrierState {
    expected: BTreeSet<NodeId>,
    current_step: Option<String>,
    arrived: BTreeMap<NodeId, AdmindError>,
    waiters: Vec<oneshot::Sender<AdmindError>>,
}

impl BarrierCoordinator {
    pub fn new(expected: BTreeSet<NodeId>) -> Self {
        BarrierCoordinator {
            inner: Mutex::new(BarrierState {
                expected,
                current_step: None,
                arrived: BTreeMap::new(),
                waiters: Vec::new(),
            }),
        }
    }

    /// Update the set of nodes still considered live. Any node dropped
    /// from membership while a barrier is outstanding resolves that
    /// barrier's aggregate as `NODE_DOWN` for the caller still waiting.
    pub async fn on_membership_change(&self, new_membership: BTreeSet<NodeId>) {
        let mut state = self.inner.lock().await;
        let dropped: Vec<NodeId> = state
            .expected
            .difference(&new_membership)
            .copied()
            .collect();
        state.expected = new_membership;
        if !dropped.is_empty() && state.current_step.is_some() {
            for tx in state.waiters.drain(..) {
                let _ = tx.send(AdmindError::NodeDown(dropped[0]));
            }
            state.current_step = None;
            state.arrived.clear();
        }
    }

    /// Cross the named barrier, contributing this node's local result.
    /// Returns the aggregated cluster-wide result once every expected
    /// member has arrived for this step.
    pub async fn cross(&self, step_name: &str, node: NodeId, local_result: AdmindError) -> AdmindError {
        let mut rx_opt = None;
        {
            let mut state = self.inner.lock().await;
            match &state.current_step {
                Some(name) if name == step_name => {}
                Some(_) => {
                    // A stale call for a step we've already moved past.
                    // Must not touch `arrived`: it belongs to the current,
                    // differently-named step, and inserting into it here
                    // could spuriously complete that unrelated barrier.
                    return AdmindError::Success;
                }
                None => state.current_step = Some(step_name.to_string()),
            }
            state.arrived.insert(node, local_result);

            if state.arrived.len() >= state.expected.len() {
                let result = aggregate(state.arrived.values().cloned());
                for tx in state.waiters.drain(..) {
                    let _ = tx.send(result.clone());
                }
                state.current_step = None;
                state.arrived.clear();
                return result;
            }

            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            rx_opt = Some(rx);
        }
        match rx_opt {
            Some(rx) => rx.await.unwrap_or(AdmindError::NodeDown(node)),
            None => AdmindError::Success,
        }
    }
}
