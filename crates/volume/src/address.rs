//! Voxel addressing for the two buffer layouts
//!
//! Every buffer the engine owns (intensity, mask, ROI, filter source) is
//! laid out by one [`AddressMapper`]. All reads and writes go through it, so
//! switching between the atlas and the native 3D layout never leaks into the
//! edit or filter code.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{AddressingMode, TextureDesc, VolumeDims};

/// Number of tiles per atlas side for a volume of `z_dim` slices.
///
/// `2^(1 + floor(log2(sqrt(z_dim))))`. A non-integer result is tolerated:
/// it is logged and truncated.
pub fn tile_count_for_depth(z_dim: u32) -> u32 {
    let exponent = 1.0 + (z_dim as f64).sqrt().log2().floor();
    let tiles = 2f64.powf(exponent);
    if !tiles.is_finite() || tiles.fract() != 0.0 {
        warn!(
            "tile count for depth {} should be an integer, got {}; truncating",
            z_dim, tiles
        );
    }
    tiles as u32
}

/// Tile grid of a 2D atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayout {
    /// Tiles per atlas side
    pub tile_count: u32,
    /// Atlas width in texels (`x_dim * tile_count`)
    pub tex_width: usize,
    /// Atlas height in texels (`y_dim * tile_count`)
    pub tex_height: usize,
}

impl TileLayout {
    pub fn new(dims: VolumeDims) -> Self {
        let tile_count = tile_count_for_depth(dims.z);
        Self {
            tile_count,
            tex_width: dims.x as usize * tile_count as usize,
            tex_height: dims.y as usize * tile_count as usize,
        }
    }

    /// Texels in the whole atlas
    #[inline]
    pub fn texel_count(&self) -> usize {
        self.tex_width * self.tex_height
    }

    /// (row, column) of the tile holding slice `z`
    #[inline]
    pub fn tile_of(&self, z: u32) -> (u32, u32) {
        (z / self.tile_count, z % self.tile_count)
    }
}

/// Maps voxel coordinates to linear buffer offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressMapper {
    Atlas2D { dims: VolumeDims, layout: TileLayout },
    Native3D { dims: VolumeDims },
}

impl AddressMapper {
    pub fn new(mode: AddressingMode, dims: VolumeDims) -> Self {
        match mode {
            AddressingMode::Atlas2D => Self::Atlas2D {
                dims,
                layout: TileLayout::new(dims),
            },
            AddressingMode::Native3D => Self::Native3D { dims },
        }
    }

    #[inline]
    pub fn mode(&self) -> AddressingMode {
        match self {
            Self::Atlas2D { .. } => AddressingMode::Atlas2D,
            Self::Native3D { .. } => AddressingMode::Native3D,
        }
    }

    #[inline]
    pub fn dims(&self) -> VolumeDims {
        match *self {
            Self::Atlas2D { dims, .. } | Self::Native3D { dims } => dims,
        }
    }

    /// Atlas tile grid, `None` in Native3D
    pub fn tile_layout(&self) -> Option<TileLayout> {
        match *self {
            Self::Atlas2D { layout, .. } => Some(layout),
            Self::Native3D { .. } => None,
        }
    }

    /// Buffer offset of an in-bounds voxel
    #[inline]
    pub fn offset(&self, x: u32, y: u32, z: u32) -> usize {
        let (x, y) = (x as usize, y as usize);
        match *self {
            Self::Atlas2D { dims, layout } => {
                let (row, col) = layout.tile_of(z);
                row as usize * dims.y as usize * layout.tex_width
                    + col as usize * dims.x as usize
                    + y * layout.tex_width
                    + x
            }
            Self::Native3D { dims } => {
                let (xd, yd) = (dims.x as usize, dims.y as usize);
                x + y * xd + z as usize * xd * yd
            }
        }
    }

    /// Buffer offset of a signed voxel coordinate, `None` outside the volume
    #[inline]
    pub fn checked_offset(&self, x: i64, y: i64, z: i64) -> Option<usize> {
        if !self.dims().contains(x, y, z) {
            return None;
        }
        Some(self.offset(x as u32, y as u32, z as u32))
    }

    /// Elements per single-channel buffer in this layout
    pub fn buffer_len(&self) -> usize {
        match *self {
            Self::Atlas2D { layout, .. } => layout.texel_count(),
            Self::Native3D { dims } => dims.voxel_count(),
        }
    }

    /// Texture shape for a buffer with `channels` bytes per texel
    pub fn texture_desc(&self, channels: u32) -> TextureDesc {
        let dims = self.dims();
        match *self {
            Self::Atlas2D { layout, .. } => TextureDesc {
                mode: AddressingMode::Atlas2D,
                width: layout.tex_width as u32,
                height: layout.tex_height as u32,
                depth: layout.tile_count,
                channels,
            },
            Self::Native3D { .. } => TextureDesc {
                mode: AddressingMode::Native3D,
                width: dims.x,
                height: dims.y,
                depth: dims.z,
                channels,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_offsets(mapper: &AddressMapper) -> Vec<usize> {
        let dims = mapper.dims();
        let mut offsets = Vec::with_capacity(dims.voxel_count());
        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    offsets.push(mapper.offset(x, y, z));
                }
            }
        }
        offsets
    }

    #[test]
    fn test_tile_count_formula() {
        assert_eq!(tile_count_for_depth(1), 2);
        assert_eq!(tile_count_for_depth(4), 4);
        assert_eq!(tile_count_for_depth(7), 4);
        assert_eq!(tile_count_for_depth(16), 8);
        assert_eq!(tile_count_for_depth(100), 16);
    }

    #[test]
    fn test_tile_grid_holds_every_slice() {
        for z in 1..=1024u32 {
            let tiles = tile_count_for_depth(z);
            assert!(tiles * tiles >= z, "depth {} tiles {}", z, tiles);
        }
    }

    #[test]
    fn test_native_offsets() {
        let mapper = AddressMapper::new(AddressingMode::Native3D, VolumeDims::new(4, 3, 2));
        assert_eq!(mapper.offset(0, 0, 0), 0);
        assert_eq!(mapper.offset(3, 0, 0), 3);
        assert_eq!(mapper.offset(0, 1, 0), 4);
        assert_eq!(mapper.offset(1, 2, 1), 1 + 8 + 12);
        assert_eq!(mapper.buffer_len(), 24);
    }

    #[test]
    fn test_native_stride_uses_y_dim() {
        // Non-cubic volume: the slice stride must be x*y, not x*x
        let mapper = AddressMapper::new(AddressingMode::Native3D, VolumeDims::new(2, 5, 3));
        assert_eq!(mapper.offset(0, 0, 1), 10);
        assert_eq!(mapper.offset(1, 4, 2), 1 + 8 + 20);
    }

    #[test]
    fn test_atlas_offsets() {
        let mapper = AddressMapper::new(AddressingMode::Atlas2D, VolumeDims::new(3, 2, 5));
        let layout = mapper.tile_layout().unwrap();
        assert_eq!(layout.tile_count, 4);
        assert_eq!(layout.tex_width, 12);
        assert_eq!(layout.tex_height, 8);

        // slice 1 sits in tile (0, 1)
        assert_eq!(mapper.offset(2, 0, 1), 3 + 2);
        // slice 4 starts the second tile row
        assert_eq!(mapper.offset(1, 1, 4), 2 * 12 + 12 + 1);
        assert_eq!(mapper.buffer_len(), 96);
    }

    #[test]
    fn test_offsets_injective() {
        for mode in [AddressingMode::Native3D, AddressingMode::Atlas2D] {
            let mapper = AddressMapper::new(mode, VolumeDims::new(5, 3, 7));
            let offsets = all_offsets(&mapper);
            let unique: HashSet<_> = offsets.iter().copied().collect();
            assert_eq!(unique.len(), offsets.len(), "{:?}", mode);
            assert!(offsets.iter().all(|&o| o < mapper.buffer_len()));
        }
    }

    #[test]
    fn test_checked_offset_bounds() {
        let mapper = AddressMapper::new(AddressingMode::Atlas2D, VolumeDims::new(4, 4, 3));
        assert_eq!(mapper.checked_offset(-1, 0, 0), None);
        assert_eq!(mapper.checked_offset(0, 4, 0), None);
        assert_eq!(mapper.checked_offset(0, 0, 3), None);
        assert_eq!(mapper.checked_offset(3, 3, 2), Some(mapper.offset(3, 3, 2)));
    }

    #[test]
    fn test_texture_desc() {
        let dims = VolumeDims::new(8, 6, 10);
        let native = AddressMapper::new(AddressingMode::Native3D, dims).texture_desc(1);
        assert_eq!((native.width, native.height, native.depth), (8, 6, 10));

        let atlas = AddressMapper::new(AddressingMode::Atlas2D, dims).texture_desc(4);
        assert_eq!((atlas.width, atlas.height, atlas.depth), (32, 24, 4));
        assert_eq!(atlas.channels, 4);
    }
}
