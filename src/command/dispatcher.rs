//! The dispatcher: validates admind state, recovery-in-progress, and
//! cluster-uuid stamp before routing to a command's cluster handler
//! (`§4.6`). Grounded on the project's `command_router` pipeline-of-checks
//! (emergency check, ACL check, state check, execution) and the original
//! implementation's `AdmCommand` registration table.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bitflags::bitflags;

use crate::context::CoreContext;
use crate::errors::{AdmindError, ErrorDescriptor, Result};

use super::codes::CommandCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmindState {
    NoConfig,
    Stopped,
    Starting,
    Started,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StateMask: u8 {
        const NOCONFIG = 0b0001;
        const STOPPED  = 0b0010;
        const STARTING = 0b0100;
        const STARTED  = 0b1000;
    }
}

impl AdmindState {
    fn as_mask(self) -> StateMask {
        match self {
            AdmindState::NoConfig => StateMask::NOCONFIG,
            AdmindState::Stopped => StateMask::STOPPED,
            AdmindState::Starting => StateMask::STARTING,
            AdmindState::Started => StateMask::STARTED,
        }
    }
}

type ClusterHandler = Arc<
    dyn Fn(Arc<CoreContext>, Vec<u8>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>
        + Send
        + Sync,
>;

/// Mirrors the original `AdmCommand` registration record: code, allowed
/// admind-state mask, whether it must match the running cluster's uuid,
/// whether it may run during a recovery, and the cluster-side handler.
#[derive(Clone)]
pub struct CommandSpec {
    pub code: CommandCode,
    pub allowed_states: StateMask,
    pub match_cluster_uuid: bool,
    pub handler: ClusterHandler,
}

#[derive(Default)]
pub struct CommandDispatcher {
    commands: HashMap<CommandCode, CommandSpec>,
    local_rpc_codes: std::collections::HashSet<u16>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: CommandSpec) -> Result<()> {
        if self.commands.contains_key(&spec.code) {
            return Err(AdmindError::InvalidParam(format!(
                "command {:?} already registered",
                spec.code
            )));
        }
        self.commands.insert(spec.code, spec);
        Ok(())
    }

    /// Register an rpc code as claimed by a command or service's local
    /// handler table; startup fails if two registrants collide.
    pub fn register_rpc_code(&mut self, rpc_code: u16) -> Result<()> {
        if !self.local_rpc_codes.insert(rpc_code) {
            return Err(AdmindError::DuplicateRpcRegistration(rpc_code));
        }
        Ok(())
    }

    /// Validate and route one CLI request (`§4.6`):
    /// 1. admind state must be in the command's allowed mask;
    /// 2. cluster uuid must match, if the command requires it;
    /// 3. no recovery in progress, unless the command allows it;
    /// then invoke the cluster handler on the leader.
    pub async fn dispatch(
        &self,
        code: CommandCode,
        ctx: Arc<CoreContext>,
        current_state: AdmindState,
        recovery_in_progress: bool,
        request_cluster_uuid: Option<&str>,
        payload: Vec<u8>,
    ) -> std::result::Result<(), ErrorDescriptor> {
        let spec = self
            .commands
            .get(&code)
            .ok_or_else(|| AdmindError::UnknownCommand(code as u32).to_descriptor())?;

        if !spec.allowed_states.contains(current_state.as_mask()) {
            return Err(AdmindError::StateMismatch(command_name(code)).to_descriptor());
        }

        if spec.match_cluster_uuid {
            match request_cluster_uuid {
                Some(uuid) if uuid == ctx.config.cluster_uuid => {}
                _ => return Err(AdmindError::ClusterUuidMismatch.to_descriptor()),
            }
        }

        if recovery_in_progress && !code.allowed_in_recovery() {
            return Err(AdmindError::RecoveryInProgress(command_name(code)).to_descriptor());
        }

        match (spec.handler)(ctx, payload).await {
            Ok(()) => Ok(()),
            // A benign outcome (e.g. `NothingToDo`) is a non-error status
            // on the CLI channel, not a failure (`§7`).
            Err(e) if e.is_benign() => Ok(()),
            Err(e) => Err(e.to_descriptor()),
        }
    }
}

fn command_name(code: CommandCode) -> &'static str {
    match code {
        CommandCode::clcreate => "clcreate",
        CommandCode::cldelete => "cldelete",
        CommandCode::clstart => "clstart",
        CommandCode::clstop => "clstop",
        CommandCode::clnodeadd => "clnodeadd",
        CommandCode::clnodedel => "clnodedel",
        CommandCode::clnodestart => "clnodestart",
        CommandCode::clnodestop => "clnodestop",
        CommandCode::cldiskadd => "cldiskadd",
        CommandCode::cldiskdel => "cldiskdel",
        CommandCode::cltune => "cltune",
        CommandCode::clinfo => "clinfo",
        CommandCode::cltrace => "cltrace",
        CommandCode::clstats => "clstats",
        CommandCode::dgcreate => "dgcreate",
        CommandCode::dgdelete => "dgdelete",
        CommandCode::dgstart => "dgstart",
        CommandCode::dgstop => "dgstop",
        CommandCode::dgresync => "dgresync",
        CommandCode::vlcreate => "vlcreate",
        CommandCode::vldelete => "vldelete",
        CommandCode::vlstart => "vlstart",
        CommandCode::vlstop => "vlstop",
        CommandCode::vlresize => "vlresize",
    }
}
