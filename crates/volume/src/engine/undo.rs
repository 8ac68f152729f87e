//! Undo by replaying the last edit in restore mode

use tracing::debug;

use super::region_growth::Growth;
use super::{UndoReport, VolumeEngine};
use crate::cylinder::Cylinder;
use crate::history::EditOperation;

impl VolumeEngine {
    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Revert the most recent edit
    ///
    /// Cylinder edits replay the region growth with the recorded cylinder
    /// and make every erased voxel it reaches visible, including voxels
    /// erased by other edits. Floods re-run the span fill in undo mode.
    pub fn undo(&mut self) -> Option<UndoReport> {
        let Some(op) = self.history.pop() else {
            debug!("Undo: no edits recorded");
            return None;
        };

        let voxels = match op {
            EditOperation::Flood { target } => self.span_fill(target, true),
            EditOperation::Tangential(edit) | EditOperation::Normal(edit) => {
                let cylinder = Cylinder::from_edit(&edit, self.dims().xz_ratio());
                self.grow_region(edit.target, &cylinder, Growth::Restore)
            }
        };

        debug!(
            "Undid {:?} edit at {:?}: {} voxels restored ({} left)",
            op.kind(),
            op.target(),
            voxels,
            self.history.len()
        );
        Some(UndoReport {
            kind: op.kind(),
            voxels,
        })
    }
}
