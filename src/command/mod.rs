//! Cluster command dispatcher (`§4.6`). Grounded on the project's
//! handler/command_router pipeline-of-checks pattern (state check, then
//! routing, then execution), adapted from per-connection RESP commands to
//! per-cluster administrative commands, and on the original
//! implementation's `adm_command_code_t`/`AdmCommand` registration table.

pub mod catalogue;
pub mod codes;
pub mod dispatcher;

pub use codes::CommandCode;
pub use dispatcher::{AdmindState, CommandDispatcher, CommandSpec};
