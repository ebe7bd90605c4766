//! Single-process group
//!
//! Degenerate group of size 1. Collectives complete immediately since the
//! caller is the only member.

use super::{GroupError, ProcessGroup};

/// Group containing only the calling process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoloGroup;

impl SoloGroup {
    pub fn new() -> Self {
        SoloGroup
    }
}

impl ProcessGroup for SoloGroup {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> Result<(), GroupError> {
        Ok(())
    }

    fn sum_all(&self, local: i64) -> Result<i64, GroupError> {
        Ok(local)
    }
}
