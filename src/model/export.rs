//! Volume export presentation and the per-node, versioned export list
//! (`§3`, `§6` persisted state, `§8` round-trip property).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IscsiFilterPolicy {
    AcceptAll,
    RejectAll,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IscsiAclEntry {
    pub iqn_pattern: String,
    pub accept: bool,
}

/// A volume's external presentation: a raw block device path, or an
/// iSCSI LUN behind an IQN filter policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Export {
    Bdev { volume_uuid: Uuid, path: String },
    Iscsi {
        volume_uuid: Uuid,
        lun: u32,
        iqn: String,
        policy: IscsiFilterPolicy,
        acl: Vec<IscsiAclEntry>,
    },
}

impl Export {
    pub fn volume_uuid(&self) -> Uuid {
        match self {
            Export::Bdev { volume_uuid, .. } => *volume_uuid,
            Export::Iscsi { volume_uuid, .. } => *volume_uuid,
        }
    }
}

/// The per-node export list document: a format version, a monotonic
/// version incremented on every mutation, and the list itself.
///
/// `§8` requires this document to round-trip: `parse(serialize(doc)) == doc`
/// for every valid document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportList {
    pub format_version: u32,
    pub version: u64,
    pub exports: Vec<Export>,
}

pub const EXPORT_LIST_FORMAT_VERSION: u32 = 1;

impl ExportList {
    pub fn new() -> Self {
        ExportList {
            format_version: EXPORT_LIST_FORMAT_VERSION,
            version: 0,
            exports: Vec::new(),
        }
    }

    pub fn push(&mut self, export: Export) {
        self.exports.push(export);
        self.version += 1;
    }

    pub fn remove_for_volume(&mut self, volume_uuid: Uuid) -> bool {
        let before = self.exports.len();
        self.exports.retain(|e| e.volume_uuid() != volume_uuid);
        let removed = self.exports.len() != before;
        if removed {
            self.version += 1;
        }
        removed
    }

    pub fn to_json(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> crate::errors::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Default for ExportList {
    fn default() -> Self {
        Self::new()
    }
}
