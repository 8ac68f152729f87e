use glam::{UVec3, Vec3};
use thiserror::Error;

use crate::address::tile_count_for_depth;
use crate::types::{AddressingMode, VolumeDims};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("Volume has a zero dimension: {x}x{y}x{z}")]
    EmptyDimension { x: u32, y: u32, z: u32 },
    #[error("Volume of {voxels} voxels cannot hold {len} bytes (expected 1 or 4 bytes per voxel)")]
    LengthMismatch { voxels: usize, len: usize },
    #[error("Volume is {actual:?} but the buffers are laid out for {expected:?}")]
    DimensionMismatch {
        expected: VolumeDims,
        actual: VolumeDims,
    },
    #[error("ROI requested but the volume has a single byte per voxel")]
    RoiNeedsFourChannels,
    #[error("Volume buffers would overflow the address space")]
    TooLarge,
}

/// Validate dimensions for the given addressing mode
pub fn validate_dims(dims: VolumeDims, mode: AddressingMode) -> Result<(), LoadError> {
    if dims.x == 0 || dims.y == 0 || dims.z == 0 {
        return Err(LoadError::EmptyDimension {
            x: dims.x,
            y: dims.y,
            z: dims.z,
        });
    }

    let voxels = dims.checked_voxel_count().ok_or(LoadError::TooLarge)?;
    // RGBA buffers are four times the voxel count
    voxels.checked_mul(4).ok_or(LoadError::TooLarge)?;

    if mode == AddressingMode::Atlas2D {
        let tiles = tile_count_for_depth(dims.z) as usize;
        let width = (dims.x as usize).checked_mul(tiles).ok_or(LoadError::TooLarge)?;
        let height = (dims.y as usize).checked_mul(tiles).ok_or(LoadError::TooLarge)?;
        if width > u32::MAX as usize || height > u32::MAX as usize {
            return Err(LoadError::TooLarge);
        }
        width
            .checked_mul(height)
            .and_then(|texels| texels.checked_mul(4))
            .ok_or(LoadError::TooLarge)?;
    }

    Ok(())
}

/// Convert one normalized coordinate to a voxel index by truncation,
/// clamped into `0..dim`
#[inline]
pub fn uv_to_index(u: f32, dim: u32) -> u32 {
    let scaled = (u * dim as f32).floor();
    // NaN casts to 0
    (scaled as i64).clamp(0, dim.saturating_sub(1) as i64) as u32
}

/// Convert a normalized `[0, 1]` position to integer voxel coordinates
pub fn uv_to_voxel(uv: Vec3, dims: VolumeDims) -> UVec3 {
    UVec3::new(
        uv_to_index(uv.x, dims.x),
        uv_to_index(uv.y, dims.y),
        uv_to_index(uv.z, dims.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_truncates() {
        let dims = VolumeDims::new(10, 20, 4);
        assert_eq!(uv_to_voxel(Vec3::new(0.0, 0.0, 0.0), dims), UVec3::ZERO);
        assert_eq!(uv_to_voxel(Vec3::new(0.55, 0.5, 0.74), dims), UVec3::new(5, 10, 2));
    }

    #[test]
    fn test_uv_clamps_to_volume() {
        let dims = VolumeDims::new(10, 20, 4);
        assert_eq!(uv_to_voxel(Vec3::ONE, dims), UVec3::new(9, 19, 3));
        assert_eq!(uv_to_voxel(Vec3::splat(-0.5), dims), UVec3::ZERO);
        assert_eq!(uv_to_index(f32::NAN, 8), 0);
    }

    #[test]
    fn test_validate_dims() {
        assert!(validate_dims(VolumeDims::new(4, 4, 4), AddressingMode::Native3D).is_ok());
        assert!(validate_dims(VolumeDims::new(4, 4, 4), AddressingMode::Atlas2D).is_ok());
        assert_eq!(
            validate_dims(VolumeDims::new(4, 0, 4), AddressingMode::Native3D),
            Err(LoadError::EmptyDimension { x: 4, y: 0, z: 4 })
        );
        assert_eq!(
            validate_dims(
                VolumeDims::new(u32::MAX, u32::MAX, 16),
                AddressingMode::Atlas2D
            ),
            Err(LoadError::TooLarge)
        );
    }
}
