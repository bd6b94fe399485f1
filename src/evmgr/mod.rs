//! Event manager and recovery driver (`§4.3`). Grounded on the project's
//! warden `MasterMonitor` tick-loop/state-machine pattern, adapted from
//! Sentinel-style failover voting to the ordered service-pipeline recovery
//! this engine runs on every membership change.

pub mod leader;
pub mod recovery;

pub use leader::EventManager;
pub use recovery::{RecoveryDriver, RecoveryOutcome, RecoveryState};
