//! The closed cluster-command code enum, grounded on the original
//! implementation's `adm_command_code_t` (`admind/src/adm_command.h`).

use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString)]
#[allow(non_camel_case_types)]
pub enum CommandCode {
    /// Cluster create.
    clcreate,
    /// Cluster delete.
    cldelete,
    /// Cluster start.
    clstart,
    /// Cluster stop.
    clstop,
    /// Node add.
    clnodeadd,
    /// Node delete.
    clnodedel,
    /// Node start.
    clnodestart,
    /// Node stop.
    clnodestop,
    /// Disk add.
    cldiskadd,
    /// Disk delete.
    cldiskdel,
    /// Tunable get/set.
    cltune,
    /// Information query (read-only, allowed during recovery).
    clinfo,
    /// Trace level control.
    cltrace,
    /// Statistics query (read-only, allowed during recovery).
    clstats,
    /// Disk group create.
    dgcreate,
    /// Disk group delete.
    dgdelete,
    /// Disk group start.
    dgstart,
    /// Disk group stop.
    dgstop,
    /// Disk group resync.
    dgresync,
    /// Volume create.
    vlcreate,
    /// Volume delete.
    vldelete,
    /// Volume start.
    vlstart,
    /// Volume stop.
    vlstop,
    /// Volume resize.
    vlresize,
}

impl CommandCode {
    /// Whether a command is a pure read/inspection command; these are
    /// allowed even while a recovery is in progress (`§4.6`).
    pub fn allowed_in_recovery(self) -> bool {
        matches!(self, CommandCode::clinfo | CommandCode::clstats | CommandCode::cltrace)
    }
}
