//! Physical disk record (`§3`).

use bitflags::bitflags;
use uuid::Uuid;

use super::node::NodeId;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DiskFlags: u8 {
        const IMPORTED    = 0b0001;
        const UP_IN_VRT   = 0b0010;
        const SUSPENDED   = 0b0100;
        const BROKEN      = 0b1000;
    }
}

/// A physical disk contributed to a group by one node.
///
/// `uuid` is the stable identity used everywhere a disk is referenced;
/// `vrt_uuid` is re-issued whenever the physical device behind it is
/// replaced, so the virtualiser can tell "same slot, different spindle"
/// apart from "same spindle".
#[derive(Debug, Clone)]
pub struct Disk {
    pub uuid: Uuid,
    pub vrt_uuid: Uuid,
    pub node_id: NodeId,
    pub group_uuid: Uuid,
    pub path: String,
    pub flags: DiskFlags,
}

impl Disk {
    pub fn new(uuid: Uuid, node_id: NodeId, group_uuid: Uuid, path: impl Into<String>) -> Self {
        Disk {
            uuid,
            vrt_uuid: Uuid::new_v4(),
            node_id,
            group_uuid,
            path: path.into(),
            flags: DiskFlags::empty(),
        }
    }

    /// `up-in-vrt ⇒ imported` (`§3`).
    pub fn is_consistent(&self) -> bool {
        !self.flags.contains(DiskFlags::UP_IN_VRT) || self.flags.contains(DiskFlags::IMPORTED)
    }

    pub fn replace_spindle(&mut self, new_path: impl Into<String>) {
        self.path = new_path.into();
        self.vrt_uuid = Uuid::new_v4();
        self.flags.remove(DiskFlags::IMPORTED | DiskFlags::UP_IN_VRT);
    }
}
