//! The CHANGE -> ACCEPT -> COMMIT agreement protocol (`§4.2`).

use std::collections::{BTreeMap, BTreeSet};

use crate::model::node::{NodeId, ViewState};

use super::clique::coordinator_of;

/// One node's advertised state, as carried in its periodic ping (`§4.2`).
#[derive(Debug, Clone)]
pub struct PeerAdvert {
    pub clique: BTreeSet<NodeId>,
    pub coord: Option<NodeId>,
    pub accepted: u64,
    pub committed: u64,
}

/// Drives one node's local view through the protocol. Pure state machine:
/// callers feed in the current clique and a snapshot of what peers are
/// advertising, and get back the next state plus, on `Commit`, the
/// membership to deliver to the event manager.
pub struct Agreement {
    self_id: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// No change: still converging.
    NoChange,
    /// Became (or remains) ACCEPT with this generation.
    Accept { generation: u64 },
    /// Became COMMIT: deliver this membership.
    Commit { generation: u64, clique: BTreeSet<NodeId> },
}

impl Agreement {
    pub fn new(self_id: NodeId) -> Self {
        Agreement { self_id }
    }

    /// Advance the local view given the current clique and the adverts
    /// observed from clique members (including, if present, our own).
    pub fn advance(
        &self,
        state: &mut ViewState,
        accepted: &mut u64,
        committed: &mut u64,
        clique: &BTreeSet<NodeId>,
        adverts: &BTreeMap<NodeId, PeerAdvert>,
    ) -> Transition {
        let coord = match coordinator_of(clique) {
            Some(c) => c,
            None => return Transition::NoChange,
        };

        let clique_agrees = clique.iter().all(|member| {
            adverts
                .get(member)
                .is_some_and(|a| &a.clique == clique && a.coord == Some(coord))
        });

        if coord == self.self_id {
            match state {
                ViewState::Unknown | ViewState::Change if clique_agrees => {
                    let next_gen = clique
                        .iter()
                        .filter_map(|m| adverts.get(m))
                        .map(|a| a.accepted.max(a.committed))
                        .max()
                        .unwrap_or(*committed)
                        + 1;
                    *state = ViewState::Accept;
                    *accepted = next_gen;
                    Transition::Accept { generation: next_gen }
                }
                ViewState::Accept => {
                    let all_accepted = clique
                        .iter()
                        .all(|m| adverts.get(m).is_some_and(|a| a.accepted == *accepted));
                    if all_accepted {
                        *state = ViewState::Commit;
                        *committed = *accepted;
                        Transition::Commit {
                            generation: *committed,
                            clique: clique.clone(),
                        }
                    } else {
                        Transition::NoChange
                    }
                }
                _ => Transition::NoChange,
            }
        } else {
            // Follower: adopt what the coordinator is advertising.
            let coord_advert = match adverts.get(&coord) {
                Some(a) if &a.clique == clique => a,
                _ => return Transition::NoChange,
            };

            match state {
                ViewState::Unknown | ViewState::Change
                    if coord_advert.accepted > (*accepted).max(*committed) =>
                {
                    *state = ViewState::Accept;
                    *accepted = coord_advert.accepted;
                    Transition::Accept { generation: *accepted }
                }
                ViewState::Accept if coord_advert.committed == *accepted => {
                    *state = ViewState::Commit;
                    *committed = coord_advert.committed;
                    Transition::Commit {
                        generation: *committed,
                        clique: clique.clone(),
                    }
                }
                _ => Transition::NoChange,
            }
        }
    }

    /// A membership change (clique changed under us) forces a fresh round.
    pub fn reset_for_new_clique(&self, state: &mut ViewState) {
        *state = ViewState::Change;
    }
}
