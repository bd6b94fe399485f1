//! The RPC-and-barrier coordination kernel (`§4.4`): the sole primitive
//! every clustered command rides on.

pub mod barrier;
pub mod exec;

pub use barrier::{aggregate, BarrierCoordinator};
pub use exec::{exec_command, LocalOutcome, WorkThread};
