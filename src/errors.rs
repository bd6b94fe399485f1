//! Closed error-kind taxonomy shared by every layer of the engine.
//!
//! A handler never invents a new failure shape: it returns one of these
//! variants and lets `?` carry it up to the work-thread primitive, which
//! aggregates it (see `workthread::barrier`), and ultimately to the command
//! dispatcher, which renders it as the `(code, message)` descriptor sent
//! back over the CLI channel.

use std::io;
use std::sync::Arc;

/// The full, closed set of outcomes a clustered operation can produce.
///
/// `Success` and `NothingToDo` are both non-errors from the caller's point
/// of view but are kept distinct internally: the aggregation precedence in
/// `workthread::barrier::aggregate` and the rollback logic both need to
/// know whether a node actually performed the side effect.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AdmindError {
    #[error("success")]
    Success,

    #[error("nothing to do")]
    NothingToDo,

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("unknown node: {0}")]
    UnknownNode(u32),

    #[error("unknown group: {0}")]
    UnknownGroup(String),

    #[error("unknown volume: {0}")]
    UnknownVolume(String),

    #[error("unknown disk: {0}")]
    UnknownDisk(String),

    #[error("resource in use: {0}")]
    ResourceInUse(String),

    #[error("resource invalid: {0}")]
    ResourceInvalid(String),

    #[error("group not started: {0}")]
    GroupNotStarted(String),

    #[error("group not stopped: {0}")]
    GroupNotStopped(String),

    #[error("group offline: {0}")]
    GroupOffline(String),

    #[error("group not administrable: {0}")]
    GroupNotAdministrable(String),

    #[error("volume not started: {0}")]
    VolumeNotStarted(String),

    #[error("volume not stopped: {0}")]
    VolumeNotStopped(String),

    #[error("node down: {0}")]
    NodeDown(u32),

    #[error("network down")]
    NetworkDown,

    #[error("network firewalled")]
    NetworkFirewalled,

    #[error("out of memory")]
    OutOfMemory,

    #[error("metadata corruption: {0}")]
    MetadataCorruption(String),

    #[error("license error: {0}")]
    License(String),

    #[error("quorum would be broken by this operation")]
    QuorumPreserve,

    #[error("too many disks in cluster")]
    TooManyDisks,

    #[error("too many disks on node {0}")]
    TooManyDisksInNode(u32),

    #[error("command code {0} is not registered")]
    UnknownCommand(u32),

    #[error("rpc code {0} is already registered by another command or service")]
    DuplicateRpcRegistration(u16),

    #[error("command {0} is not allowed in current admind state")]
    StateMismatch(&'static str),

    #[error("command {0} is not allowed while a recovery is in progress")]
    RecoveryInProgress(&'static str),

    #[error("cluster uuid mismatch")]
    ClusterUuidMismatch,

    #[error("io error: {0}")]
    Io(#[from] Arc<io::Error>),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AdmindError {
    /// Whether this variant is a non-error outcome (`Success`/`NothingToDo`).
    pub fn is_benign(&self) -> bool {
        matches!(self, AdmindError::Success | AdmindError::NothingToDo)
    }

    /// Stable integer code exposed on the CLI channel (`§6` of the design).
    pub fn code(&self) -> i32 {
        match self {
            AdmindError::Success => 0,
            AdmindError::NothingToDo => 1,
            AdmindError::InvalidParam(_) => 2,
            AdmindError::UnknownNode(_) => 3,
            AdmindError::UnknownGroup(_) => 4,
            AdmindError::UnknownVolume(_) => 5,
            AdmindError::UnknownDisk(_) => 6,
            AdmindError::ResourceInUse(_) => 7,
            AdmindError::ResourceInvalid(_) => 8,
            AdmindError::GroupNotStarted(_) => 9,
            AdmindError::GroupNotStopped(_) => 10,
            AdmindError::GroupOffline(_) => 11,
            AdmindError::GroupNotAdministrable(_) => 12,
            AdmindError::VolumeNotStarted(_) => 13,
            AdmindError::VolumeNotStopped(_) => 14,
            AdmindError::NodeDown(_) => 15,
            AdmindError::NetworkDown => 16,
            AdmindError::NetworkFirewalled => 17,
            AdmindError::OutOfMemory => 18,
            AdmindError::MetadataCorruption(_) => 19,
            AdmindError::License(_) => 20,
            AdmindError::QuorumPreserve => 21,
            AdmindError::TooManyDisks => 22,
            AdmindError::TooManyDisksInNode(_) => 23,
            AdmindError::UnknownCommand(_) => 24,
            AdmindError::DuplicateRpcRegistration(_) => 25,
            AdmindError::StateMismatch(_) => 26,
            AdmindError::RecoveryInProgress(_) => 27,
            AdmindError::ClusterUuidMismatch => 28,
            AdmindError::Io(_) => 29,
            AdmindError::Serialization(_) => 30,
            AdmindError::Config(_) => 31,
        }
    }

    /// Render as the `(code, message)` descriptor returned on the CLI channel.
    pub fn to_descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<io::Error> for AdmindError {
    fn from(e: io::Error) -> Self {
        AdmindError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for AdmindError {
    fn from(e: serde_json::Error) -> Self {
        AdmindError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for AdmindError {
    fn from(e: toml::de::Error) -> Self {
        AdmindError::Config(e.to_string())
    }
}

/// The `(code, message)` pair reported on the CLI channel (`§6`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorDescriptor {
    pub code: i32,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, AdmindError>;
