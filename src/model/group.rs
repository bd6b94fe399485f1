//! Disk group record (`§3`).

use indexmap::IndexSet;
use uuid::Uuid;

use super::sb_version::SbVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupGoal {
    Started,
    Stopped,
    Undefined,
}

/// A named, UUID-identified virtualised storage pool.
///
/// `disks` and `volumes` are kept in ascending-UUID order: the storage
/// engine this daemon drives depends on deterministic iteration order when
/// replaying metadata across nodes.
#[derive(Debug, Clone)]
pub struct Group {
    pub uuid: Uuid,
    pub name: String,
    pub layout: String,
    pub goal: GroupGoal,
    pub committed: bool,
    pub tainted: bool,
    pub started: bool,
    pub offline: bool,
    pub synched: bool,
    pub disks: IndexSet<Uuid>,
    pub volumes: IndexSet<Uuid>,
    pub sb_version: SbVersion,
}

impl Group {
    pub fn new(uuid: Uuid, name: impl Into<String>, layout: impl Into<String>) -> Self {
        Group {
            uuid,
            name: name.into(),
            layout: layout.into(),
            goal: GroupGoal::Undefined,
            committed: false,
            tainted: false,
            started: false,
            offline: false,
            synched: false,
            disks: IndexSet::new(),
            volumes: IndexSet::new(),
            sb_version: SbVersion::new(),
        }
    }

    pub fn add_disk(&mut self, disk_uuid: Uuid) {
        self.disks.insert(disk_uuid);
        self.disks.sort_unstable();
    }

    pub fn add_volume(&mut self, volume_uuid: Uuid) {
        self.volumes.insert(volume_uuid);
        self.volumes.sort_unstable();
    }

    /// `offline ⇒ ¬synched` (`§3`).
    pub fn is_consistent(&self) -> bool {
        !self.offline || !self.synched
    }

    pub fn started_locally_valid(&self) -> bool {
        !self.started || self.goal == GroupGoal::Started
    }
}
