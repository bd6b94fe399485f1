//! Per-group superblock-version triplet (`§3`, `§4.7`).

/// `(committed, prepared, in_flight)`. A *prepare* produces a candidate
/// strictly greater than `committed`; *commit* promotes it; *recover*
/// discards it. After any successful command this triplet is identical
/// on every node that holds the group (`§8` universal invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SbVersion {
    pub committed: u64,
    pub prepared: Option<u64>,
    pub in_flight: bool,
}

impl SbVersion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a prepare: candidate = committed + 1. Fails if a prepare is
    /// already outstanding.
    pub fn prepare(&mut self) -> Result<u64, SbVersionError> {
        if self.in_flight {
            return Err(SbVersionError::AlreadyInFlight);
        }
        let candidate = self.committed + 1;
        self.prepared = Some(candidate);
        self.in_flight = true;
        Ok(candidate)
    }

    /// Promote the prepared candidate to committed.
    pub fn commit(&mut self) -> Result<u64, SbVersionError> {
        let candidate = self.prepared.ok_or(SbVersionError::NoPreparedVersion)?;
        self.committed = candidate;
        self.prepared = None;
        self.in_flight = false;
        Ok(candidate)
    }

    /// Discard the prepared candidate without committing it.
    pub fn recover(&mut self) {
        self.prepared = None;
        self.in_flight = false;
    }

    /// Merge a peer's advertised committed version into ours, keeping the
    /// maximum, per the sb-synchronisation step in `§4.7`.
    pub fn merge_committed(&mut self, peer_committed: u64) {
        self.committed = self.committed.max(peer_committed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SbVersionError {
    #[error("a prepare is already in flight for this group")]
    AlreadyInFlight,
    #[error("no prepared version to commit")]
    NoPreparedVersion,
}
