//! Packing of raw scan bytes into addressed CPU buffers
//!
//! The builder takes a caller-owned [`Volume`] and produces the buffers the
//! renderer uploads: the intensity buffer (later overwritten by the slice
//! filter), the unfiltered filter source, and an optional ROI buffer. Every
//! destination offset comes from the [`AddressMapper`], so the same loops
//! serve the atlas and the native layout. In the atlas, tiles past the last
//! slice are never visited and stay zero.

use tracing::{debug, info};

use crate::address::AddressMapper;
use crate::constants::{INTENSITY_CHANNEL, RGBA_CHANNELS, ROI_CHANNEL};
use crate::types::{AddressingMode, VolumeDims};
use crate::validation::LoadError;

/// Bytes per source voxel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelFormat {
    /// Intensity only
    Gray8,
    /// Intensity in channel 0, ROI id in channel 3
    Rgba8,
}

impl VoxelFormat {
    #[inline]
    pub fn bytes_per_voxel(&self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Rgba8 => RGBA_CHANNELS,
        }
    }
}

/// Immutable scan input, borrowed from the loader
#[derive(Debug, Clone, Copy)]
pub struct Volume<'a> {
    dims: VolumeDims,
    format: VoxelFormat,
    data: &'a [u8],
}

impl<'a> Volume<'a> {
    /// Wrap raw scan bytes, inferring the voxel format from the length
    pub fn new(dims: VolumeDims, data: &'a [u8]) -> Result<Self, LoadError> {
        if dims.x == 0 || dims.y == 0 || dims.z == 0 {
            return Err(LoadError::EmptyDimension {
                x: dims.x,
                y: dims.y,
                z: dims.z,
            });
        }
        let voxels = dims.checked_voxel_count().ok_or(LoadError::TooLarge)?;
        let format = if data.len() == voxels {
            VoxelFormat::Gray8
        } else if Some(data.len()) == voxels.checked_mul(RGBA_CHANNELS) {
            VoxelFormat::Rgba8
        } else {
            return Err(LoadError::LengthMismatch {
                voxels,
                len: data.len(),
            });
        };
        Ok(Self { dims, format, data })
    }

    #[inline]
    pub fn dims(&self) -> VolumeDims {
        self.dims
    }

    #[inline]
    pub fn format(&self) -> VoxelFormat {
        self.format
    }

    #[inline]
    fn source_index(&self, x: u32, y: u32, z: u32) -> usize {
        let (xd, yd) = (self.dims.x as usize, self.dims.y as usize);
        (x as usize + y as usize * xd + z as usize * xd * yd) * self.format.bytes_per_voxel()
    }

    /// Raw intensity of a voxel
    #[inline]
    pub fn intensity(&self, x: u32, y: u32, z: u32) -> u8 {
        self.data[self.source_index(x, y, z) + INTENSITY_CHANNEL]
    }

    /// ROI id of a voxel, `None` for single-channel volumes
    #[inline]
    pub fn roi(&self, x: u32, y: u32, z: u32) -> Option<u8> {
        match self.format {
            VoxelFormat::Gray8 => None,
            VoxelFormat::Rgba8 => Some(self.data[self.source_index(x, y, z) + ROI_CHANNEL]),
        }
    }
}

/// CPU-side buffers of one loaded volume
#[derive(Debug, Clone)]
pub struct VolumeBuffers {
    /// Filtered intensity (1 or 4 bytes per texel), uploaded for rendering
    pub intensity: Vec<u8>,
    /// Bytes per texel of `intensity`
    pub channels: usize,
    /// Unfiltered intensity, the raw-volume input of the filter shader
    pub source: Vec<u8>,
    /// Per-voxel ROI ids
    pub roi: Option<Vec<u8>>,
}

/// Packs raw volumes according to one address mapper
pub struct VolumeBufferBuilder {
    mapper: AddressMapper,
    /// Native3D volumes deeper than this get zeroed caps
    boundary_clamp_min_depth: u32,
}

impl VolumeBufferBuilder {
    pub fn new(mapper: AddressMapper, boundary_clamp_min_depth: u32) -> Self {
        Self {
            mapper,
            boundary_clamp_min_depth,
        }
    }

    /// Build intensity, source and optional ROI buffers for `volume`
    pub fn build(&self, volume: &Volume<'_>, has_roi: bool) -> Result<VolumeBuffers, LoadError> {
        if volume.dims() != self.mapper.dims() {
            return Err(LoadError::DimensionMismatch {
                expected: self.mapper.dims(),
                actual: volume.dims(),
            });
        }

        let buffers = match (volume.format(), has_roi) {
            (VoxelFormat::Gray8, true) => return Err(LoadError::RoiNeedsFourChannels),
            (VoxelFormat::Rgba8, true) => self.build_roi(volume),
            (_, false) => self.build_gray(volume),
        };

        info!(
            "Built {:?} buffers for {}x{}x{} volume ({} channel(s), roi: {})",
            self.mapper.mode(),
            volume.dims().x,
            volume.dims().y,
            volume.dims().z,
            buffers.channels,
            buffers.roi.is_some()
        );
        Ok(buffers)
    }

    /// Single-channel path, also used for 4-byte volumes loaded without ROI
    fn build_gray(&self, volume: &Volume<'_>) -> VolumeBuffers {
        let dims = volume.dims();
        let len = self.mapper.buffer_len();
        let mut intensity = vec![0u8; len];
        let mut source = vec![0u8; len];

        let clamp_caps =
            self.mapper.mode() == AddressingMode::Native3D && dims.z > self.boundary_clamp_min_depth;
        if clamp_caps {
            debug!("Zeroing first and last slice of {} slices", dims.z);
        }

        for z in 0..dims.z {
            let is_cap = clamp_caps && (z == 0 || z == dims.z - 1);
            for y in 0..dims.y {
                for x in 0..dims.x {
                    let value = if is_cap { 0 } else { volume.intensity(x, y, z) };
                    let dst = self.mapper.offset(x, y, z);
                    intensity[dst] = value;
                    source[dst] = value;
                }
            }
        }

        VolumeBuffers {
            intensity,
            channels: 1,
            source,
            roi: None,
        }
    }

    /// ROI path: RGBA intensity plus a separate ROI buffer
    fn build_roi(&self, volume: &Volume<'_>) -> VolumeBuffers {
        let dims = volume.dims();
        let len = self.mapper.buffer_len();
        let mut intensity = vec![0u8; len * RGBA_CHANNELS];
        let mut source = vec![0u8; len];
        let mut roi = vec![0u8; len];

        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    let value = volume.intensity(x, y, z);
                    let dst = self.mapper.offset(x, y, z);
                    intensity[dst * RGBA_CHANNELS..(dst + 1) * RGBA_CHANNELS].fill(value);
                    source[dst] = value;
                    roi[dst] = volume.roi(x, y, z).unwrap_or(0);
                }
            }
        }

        VolumeBuffers {
            intensity,
            channels: RGBA_CHANNELS,
            source,
            roi: Some(roi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(dims: VolumeDims) -> Vec<u8> {
        (0..dims.voxel_count()).map(|i| (i % 251) as u8 + 1).collect()
    }

    fn builder(mode: AddressingMode, dims: VolumeDims) -> VolumeBufferBuilder {
        VolumeBufferBuilder::new(AddressMapper::new(mode, dims), 5)
    }

    #[test]
    fn test_format_inferred_from_length() {
        let dims = VolumeDims::new(2, 2, 2);
        assert_eq!(Volume::new(dims, &[0; 8]).unwrap().format(), VoxelFormat::Gray8);
        assert_eq!(Volume::new(dims, &[0; 32]).unwrap().format(), VoxelFormat::Rgba8);
        assert_eq!(
            Volume::new(dims, &[0; 9]).unwrap_err(),
            LoadError::LengthMismatch { voxels: 8, len: 9 }
        );
    }

    #[test]
    fn test_gray_round_trip_atlas() {
        let dims = VolumeDims::new(5, 4, 7);
        let data = ramp(dims);
        let volume = Volume::new(dims, &data).unwrap();
        let b = builder(AddressingMode::Atlas2D, dims);
        let buffers = b.build(&volume, false).unwrap();

        assert_eq!(buffers.intensity.len(), 20 * 16);
        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    let off = b.mapper.offset(x, y, z);
                    assert_eq!(buffers.intensity[off], volume.intensity(x, y, z));
                    assert_eq!(buffers.source[off], volume.intensity(x, y, z));
                }
            }
        }
        // 7 slices in a 4x4 grid: the 9 trailing tiles stay zero
        let written = buffers.intensity.iter().filter(|&&v| v != 0).count();
        assert_eq!(written, dims.voxel_count());
    }

    #[test]
    fn test_gray_round_trip_native_with_caps() {
        let dims = VolumeDims::new(3, 3, 8);
        let data = ramp(dims);
        let volume = Volume::new(dims, &data).unwrap();
        let b = builder(AddressingMode::Native3D, dims);
        let buffers = b.build(&volume, false).unwrap();

        assert_eq!(buffers.intensity.len(), dims.voxel_count());
        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    let off = b.mapper.offset(x, y, z);
                    let expected = if z == 0 || z == 7 { 0 } else { volume.intensity(x, y, z) };
                    assert_eq!(buffers.intensity[off], expected);
                }
            }
        }
    }

    #[test]
    fn test_thin_volume_keeps_caps() {
        let dims = VolumeDims::new(2, 2, 5);
        let data = vec![9u8; dims.voxel_count()];
        let volume = Volume::new(dims, &data).unwrap();
        let buffers = builder(AddressingMode::Native3D, dims)
            .build(&volume, false)
            .unwrap();
        assert!(buffers.intensity.iter().all(|&v| v == 9));
    }

    #[test]
    fn test_roi_split() {
        let dims = VolumeDims::new(2, 2, 3);
        let mut data = Vec::new();
        for i in 0..dims.voxel_count() {
            data.extend_from_slice(&[10 + i as u8, 0, 0, i as u8 % 3]);
        }
        let volume = Volume::new(dims, &data).unwrap();
        for mode in [AddressingMode::Native3D, AddressingMode::Atlas2D] {
            let b = builder(mode, dims);
            let buffers = b.build(&volume, true).unwrap();
            let roi = buffers.roi.as_ref().unwrap();
            assert_eq!(buffers.channels, 4);
            assert_eq!(buffers.intensity.len(), b.mapper.buffer_len() * 4);
            for z in 0..dims.z {
                for y in 0..dims.y {
                    for x in 0..dims.x {
                        let off = b.mapper.offset(x, y, z);
                        let value = volume.intensity(x, y, z);
                        assert_eq!(&buffers.intensity[off * 4..off * 4 + 4], &[value; 4]);
                        assert_eq!(Some(roi[off]), volume.roi(x, y, z));
                    }
                }
            }
        }
    }

    #[test]
    fn test_rgba_without_roi_uses_channel_zero() {
        let dims = VolumeDims::new(2, 1, 1);
        let data = [7, 1, 1, 3, 8, 1, 1, 4];
        let volume = Volume::new(dims, &data).unwrap();
        let buffers = builder(AddressingMode::Native3D, dims)
            .build(&volume, false)
            .unwrap();
        assert_eq!(buffers.channels, 1);
        assert_eq!(buffers.intensity, vec![7, 8]);
        assert!(buffers.roi.is_none());
    }

    #[test]
    fn test_roi_on_gray_rejected() {
        let dims = VolumeDims::new(2, 2, 2);
        let data = [0u8; 8];
        let volume = Volume::new(dims, &data).unwrap();
        let result = builder(AddressingMode::Native3D, dims).build(&volume, true);
        assert_eq!(result.unwrap_err(), LoadError::RoiNeedsFourChannels);
    }
}
