//! The cluster-wide data model: nodes, views, disk groups, disks, volumes,
//! exports and their superblock versions (`§3`).

pub mod cluster;
pub mod disk;
pub mod export;
pub mod group;
pub mod node;
pub mod sb_version;
pub mod volume;

pub use cluster::{Cluster, ClusterError};
pub use disk::Disk;
pub use export::{Export, ExportList, IscsiAclEntry, IscsiFilterPolicy};
pub use group::{Group, GroupGoal};
pub use node::{Node, NodeId, View, ViewState};
pub use sb_version::SbVersion;
pub use volume::Volume;
