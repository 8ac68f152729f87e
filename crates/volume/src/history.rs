//! Bounded undo history of destructive edits
//!
//! Edits are stored as replayable parameters, not as captured mask bytes:
//! undo re-runs the same region growth or flood fill with the sense
//! inverted. When a push would exceed the capacity the whole history is
//! dropped, including the operation being pushed.

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::EditKind;

/// Parameters of one cylindrical erase, enough to replay it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderEdit {
    /// Centre voxel
    pub target: UVec3,
    /// Cylinder radius in voxels
    pub size: f32,
    /// Half height along the axis
    pub depth: f32,
    /// Euler XYZ angles of the cylinder orientation
    pub rotation: Vec3,
    /// Lowest local z included
    pub back_distance: f32,
}

/// One entry of the undo history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EditOperation {
    Tangential(CylinderEdit),
    Normal(CylinderEdit),
    Flood { target: UVec3 },
}

impl EditOperation {
    #[inline]
    pub fn kind(&self) -> EditKind {
        match self {
            Self::Tangential(_) => EditKind::Tangential,
            Self::Normal(_) => EditKind::Normal,
            Self::Flood { .. } => EditKind::Flood,
        }
    }

    /// Seed voxel of the edit
    #[inline]
    pub fn target(&self) -> UVec3 {
        match self {
            Self::Tangential(edit) | Self::Normal(edit) => edit.target,
            Self::Flood { target } => *target,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoHistory {
    ops: Vec<EditOperation>,
    capacity: usize,
}

impl UndoHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an edit. Overflowing the capacity clears everything.
    pub fn push(&mut self, op: EditOperation) {
        if self.ops.len() >= self.capacity {
            warn!(
                "Undo history full ({} entries); clearing it and dropping {:?}",
                self.capacity,
                op.kind()
            );
            self.ops.clear();
            return;
        }
        self.ops.push(op);
        debug!("Recorded {:?} edit ({} in history)", op.kind(), self.ops.len());
    }

    pub fn pop(&mut self) -> Option<EditOperation> {
        self.ops.pop()
    }

    /// Most recent edit without removing it
    pub fn last(&self) -> Option<&EditOperation> {
        self.ops.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}
