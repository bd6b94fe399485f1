//! Membership supervisor (`§4.2`): clique computation and the
//! CHANGE/ACCEPT/COMMIT agreement protocol. Grounded on the project's
//! cluster failure-detection loop (periodic ping, timeout-based dead
//! marking) but implements the clique/agreement state machine fresh —
//! the teacher's advisory PFAIL/FAIL voting has no formal quorum
//! agreement to generalise from.

pub mod agreement;
pub mod clique;
pub mod supervisor;

pub use agreement::Agreement;
pub use clique::compute_clique;
pub use supervisor::{CommittedMembership, Supervisor};
