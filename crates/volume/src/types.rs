use serde::{Deserialize, Serialize};

/// How voxels are laid out in every buffer of a loaded volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum AddressingMode {
    /// Z-slices tiled into one square 2D atlas (no 3D texture support)
    Atlas2D = 0,
    /// Plain x-fastest 3D layout
    #[default]
    Native3D = 1,
}

/// Volume dimensions in voxels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeDims {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl VolumeDims {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Number of voxels, `None` on overflow
    pub fn checked_voxel_count(&self) -> Option<usize> {
        (self.x as usize)
            .checked_mul(self.y as usize)?
            .checked_mul(self.z as usize)
    }

    /// Number of voxels
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    /// Whether a signed voxel coordinate lies inside the volume
    #[inline]
    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        x >= 0 && y >= 0 && z >= 0 && x < self.x as i64 && y < self.y as i64 && z < self.z as i64
    }

    /// Ratio used to scale z offsets into the cylinder frame
    #[inline]
    pub fn xz_ratio(&self) -> f32 {
        if self.z == 0 {
            1.0
        } else {
            self.x as f32 / self.z as f32
        }
    }
}

/// Shape of a buffer as the rendering layer must allocate it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureDesc {
    pub mode: AddressingMode,
    /// Texture width (atlas width in Atlas2D)
    pub width: u32,
    /// Texture height (atlas height in Atlas2D)
    pub height: u32,
    /// Depth in Native3D, tiles per atlas side in Atlas2D
    pub depth: u32,
    /// Bytes per texel
    pub channels: u32,
}

/// Kind of a destructive edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EditKind {
    /// Cylinder along the view direction
    Tangential = 0,
    /// Cylinder along the estimated surface normal
    Normal = 1,
    /// Threshold flood fill
    Flood = 2,
}
