//! Eraser command types for the voxel editing tools.

use serde::{Deserialize, Serialize};

/// Which edit tool produced (or is being undone by) a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditTag {
    /// Cylinder aligned with the view direction
    Tangential,
    /// Cylinder aligned with the estimated surface normal
    Normal,
    /// Threshold flood fill
    Flood,
}

/// Parameters of one surface eraser call (one pointer event).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceEraseRequest {
    /// Picked point in normalized volume coordinates (0.0-1.0 per axis)
    pub target: [f32; 3],
    /// Cylinder radius in voxels
    pub size: f32,
    /// Cylinder half height in voxels
    pub depth: f32,
    /// Camera view direction in volume space
    pub view_direction: [f32; 3],
    /// Isosurface threshold (0.0-1.0)
    pub iso_threshold: f32,
    /// First event of a drag
    #[serde(default)]
    pub is_start: bool,
    /// Pointer released
    #[serde(default)]
    pub is_mouse_up: bool,
    /// Orient the cylinder along the surface normal instead of the view
    #[serde(default)]
    pub use_surface_normal: bool,
    /// Accumulated stroke length reported by the UI
    #[serde(default)]
    pub stroke_length: f32,
}

/// Commands for controlling the volume erasers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EraserCommand {
    /// Cylindrical erase at a picked surface point
    SurfaceErase(SurfaceEraseRequest),
    /// Flood erase from a picked point
    FloodErase {
        target: [f32; 3],
        #[serde(default)]
        is_start: bool,
        #[serde(default)]
        is_mouse_up: bool,
    },
    /// Undo the last erase
    Undo,
    /// Make every voxel visible again
    ResetMask,
    /// Re-run the slice filter with a new sigma
    Refilter { sigma: f32 },
}
