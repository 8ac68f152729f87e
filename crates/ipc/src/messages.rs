//! Messages sent from the volume engine back to the UI.

use serde::{Deserialize, Serialize};

use crate::commands::EditTag;

/// Why an eraser call left the mask untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Pointer released, drag state reset
    Released,
    /// Drag continuity throttle rejected the event
    Throttled,
    /// Nothing inside the tool footprint qualified
    NoChange,
    /// Engine has no renderer (or buffers) for this request yet
    NotReady,
}

/// Messages from the engine to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EngineToUi {
    /// An erase changed the mask
    EditApplied {
        tag: EditTag,
        voxels: usize,
        dirty_slices: Vec<u32>,
    },

    /// An erase call was a no-op
    EditSkipped { reason: SkipReason },

    /// The last edit was reverted
    UndoApplied {
        tag: EditTag,
        voxels: usize,
        dirty_slices: Vec<u32>,
    },

    /// Undo requested with an empty history
    NothingToUndo,

    /// All voxels visible again
    MaskReset { dirty_slices: Vec<u32> },

    /// Slice filter pass finished
    Filtered { slices: u32 },

    /// Error notification
    Error { code: String, message: String },
}
