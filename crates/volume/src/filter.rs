//! Per-slice GPU filter pass with CPU readback
//!
//! The blur shader itself lives outside this crate. The engine talks to it
//! through [`SliceRenderer`]: upload the source textures once, then for every
//! inner z-slice set the uniforms, render the full-screen quad into an
//! `x_dim * y_dim` RGBA target and read the pixels back. Slices run strictly
//! one after another; each readback is a blocking round trip.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::address::{AddressMapper, tile_count_for_depth};
use crate::constants::RGBA_CHANNELS;
use crate::types::{AddressingMode, TextureDesc};

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Readback returned {actual} bytes, expected {expected}")]
    ReadbackSize { expected: usize, actual: usize },
    #[error("Renderer failure: {0}")]
    Backend(String),
}

/// Uniform block of the blur shader
///
/// Layout matches the std140 block on the GPU (eight 4-byte scalars).
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct FilterUniforms {
    /// Gaussian sigma
    pub blur_sigma: f32,
    /// Current slice, normalized as `z / z_dim`
    pub cur_z: f32,
    /// Tiles per atlas side
    pub tile_count_x: u32,
    /// Number of slices
    pub volume_size_z: u32,
    pub x_dim: u32,
    pub y_dim: u32,
    /// 1 when sampling a native 3D texture
    pub use_webgl2: u32,
    /// 1 when the volume carries ROI ids (shader writes RGBA)
    pub render_roi_map: u32,
}

impl FilterUniforms {
    /// Raw bytes for a uniform buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Source textures bound to the blur shader
#[derive(Debug, Clone, Copy)]
pub struct SourceTextures<'a> {
    /// Unfiltered intensity
    pub volume: &'a [u8],
    /// ROI ids, if the volume has them
    pub roi: Option<&'a [u8]>,
    /// Shape shared by both textures
    pub desc: TextureDesc,
}

/// GPU side of the filter, implemented by the rendering layer
pub trait SliceRenderer {
    /// Upload the source textures. Called once per attached volume.
    fn upload_sources(&mut self, sources: &SourceTextures<'_>) -> Result<(), FilterError>;

    /// Render one slice with `uniforms` and read the RGBA pixels into
    /// `frame`. Returns the number of bytes written.
    fn render_slice(
        &mut self,
        uniforms: &FilterUniforms,
        frame: &mut [u8],
    ) -> Result<usize, FilterError>;
}

/// Summary of one filter pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterReport {
    /// Slices rendered and scattered back
    pub slices: u32,
}

/// Drives the per-slice render + readback loop for one volume
pub struct SliceFilterPipeline {
    mapper: AddressMapper,
    channels: usize,
    /// Readback scratch buffer, `x_dim * y_dim * 4`
    frame: Vec<u8>,
}

impl SliceFilterPipeline {
    pub fn new(mapper: AddressMapper, channels: usize) -> Self {
        let dims = mapper.dims();
        Self {
            mapper,
            channels,
            frame: vec![0u8; dims.x as usize * dims.y as usize * RGBA_CHANNELS],
        }
    }

    /// Uniform block for `sigma`, with `cur_z` left at zero
    pub fn base_uniforms(&self, sigma: f32) -> FilterUniforms {
        let dims = self.mapper.dims();
        FilterUniforms {
            blur_sigma: sigma,
            cur_z: 0.0,
            tile_count_x: tile_count_for_depth(dims.z),
            volume_size_z: dims.z,
            x_dim: dims.x,
            y_dim: dims.y,
            use_webgl2: (self.mapper.mode() == AddressingMode::Native3D) as u32,
            render_roi_map: (self.channels == RGBA_CHANNELS) as u32,
        }
    }

    /// Filter slices `1..z_dim-1` into `intensity`
    ///
    /// Atlas2D volumes are not filtered: the buffer is left as built.
    pub fn run(
        &mut self,
        renderer: &mut dyn SliceRenderer,
        intensity: &mut [u8],
        sigma: f32,
    ) -> Result<FilterReport, FilterError> {
        if self.mapper.mode() == AddressingMode::Atlas2D {
            warn!("Slice filter is not available for Atlas2D volumes; keeping unfiltered data");
            return Ok(FilterReport { slices: 0 });
        }

        let dims = self.mapper.dims();
        let mut uniforms = self.base_uniforms(sigma);
        let expected = self.frame.len();
        let mut slices = 0;

        for z in 1..dims.z.saturating_sub(1) {
            uniforms.cur_z = z as f32 / dims.z as f32;
            let written = renderer.render_slice(&uniforms, &mut self.frame)?;
            if written != expected {
                return Err(FilterError::ReadbackSize {
                    expected,
                    actual: written,
                });
            }

            for y in 0..dims.y {
                for x in 0..dims.x {
                    let src = RGBA_CHANNELS * (x as usize + y as usize * dims.x as usize);
                    let dst = self.mapper.offset(x, y, z);
                    if self.channels == RGBA_CHANNELS {
                        intensity[dst * RGBA_CHANNELS..(dst + 1) * RGBA_CHANNELS]
                            .copy_from_slice(&self.frame[src..src + RGBA_CHANNELS]);
                    } else {
                        intensity[dst] = self.frame[src];
                    }
                }
            }
            slices += 1;
        }

        debug!("Filtered {} slices with sigma {}", slices, sigma);
        info!("Slice filter pass done ({} slices)", slices);
        Ok(FilterReport { slices })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::VolumeDims;

    /// Renderer that fills every pixel with a value derived from the slice
    pub(crate) struct SliceIdRenderer {
        pub calls: Vec<FilterUniforms>,
        pub short_readback: bool,
    }

    impl SliceIdRenderer {
        pub fn new() -> Self {
            Self {
                calls: Vec::new(),
                short_readback: false,
            }
        }

        /// Pixel value the renderer writes for slice `z`
        pub fn value_for(uniforms: &FilterUniforms) -> u8 {
            (uniforms.cur_z * uniforms.volume_size_z as f32).round() as u8 + 100
        }
    }

    impl SliceRenderer for SliceIdRenderer {
        fn upload_sources(&mut self, sources: &SourceTextures<'_>) -> Result<(), FilterError> {
            let desc = sources.desc;
            if desc.mode == AddressingMode::Native3D {
                let texels = desc.width as usize * desc.height as usize * desc.depth as usize;
                assert_eq!(sources.volume.len(), texels);
            }
            Ok(())
        }

        fn render_slice(
            &mut self,
            uniforms: &FilterUniforms,
            frame: &mut [u8],
        ) -> Result<usize, FilterError> {
            self.calls.push(*uniforms);
            let value = Self::value_for(uniforms);
            for (i, px) in frame.chunks_exact_mut(4).enumerate() {
                px.copy_from_slice(&[value, value, value, i as u8]);
            }
            if self.short_readback {
                return Ok(frame.len() - 4);
            }
            Ok(frame.len())
        }
    }

    #[test]
    fn test_uniform_block_layout() {
        assert_eq!(std::mem::size_of::<FilterUniforms>(), 32);
        let pipeline = SliceFilterPipeline::new(
            AddressMapper::new(AddressingMode::Native3D, VolumeDims::new(4, 3, 9)),
            1,
        );
        let uniforms = pipeline.base_uniforms(0.8);
        assert_eq!(uniforms.as_bytes().len(), 32);
        assert_eq!(uniforms.tile_count_x, 4);
        assert_eq!(uniforms.use_webgl2, 1);
        assert_eq!(uniforms.render_roi_map, 0);
    }

    #[test]
    fn test_filters_inner_slices_only() {
        let dims = VolumeDims::new(3, 2, 6);
        let mapper = AddressMapper::new(AddressingMode::Native3D, dims);
        let mut intensity = vec![7u8; mapper.buffer_len()];
        let mut pipeline = SliceFilterPipeline::new(mapper, 1);
        let mut renderer = SliceIdRenderer::new();

        let report = pipeline.run(&mut renderer, &mut intensity, 0.8).unwrap();
        assert_eq!(report.slices, 4);
        assert_eq!(renderer.calls.len(), 4);
        assert!((renderer.calls[0].cur_z - 1.0 / 6.0).abs() < 1e-6);
        assert!(renderer.calls.iter().all(|u| u.blur_sigma == 0.8));

        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    let expected = if z == 0 || z == 5 { 7 } else { 100 + z as u8 };
                    assert_eq!(intensity[mapper.offset(x, y, z)], expected);
                }
            }
        }
    }

    #[test]
    fn test_roi_readback_keeps_four_channels() {
        let dims = VolumeDims::new(2, 2, 3);
        let mapper = AddressMapper::new(AddressingMode::Native3D, dims);
        let mut intensity = vec![0u8; mapper.buffer_len() * 4];
        let mut pipeline = SliceFilterPipeline::new(mapper, 4);
        let mut renderer = SliceIdRenderer::new();

        pipeline.run(&mut renderer, &mut intensity, 1.0).unwrap();
        assert_eq!(renderer.calls[0].render_roi_map, 1);
        let off = mapper.offset(1, 1, 1);
        // pixel index 3 in the frame
        assert_eq!(&intensity[off * 4..off * 4 + 4], &[101, 101, 101, 3]);
    }

    #[test]
    fn test_atlas_is_skipped() {
        let dims = VolumeDims::new(2, 2, 4);
        let mapper = AddressMapper::new(AddressingMode::Atlas2D, dims);
        let mut intensity = vec![5u8; mapper.buffer_len()];
        let mut pipeline = SliceFilterPipeline::new(mapper, 1);
        let mut renderer = SliceIdRenderer::new();

        let report = pipeline.run(&mut renderer, &mut intensity, 0.8).unwrap();
        assert_eq!(report.slices, 0);
        assert!(renderer.calls.is_empty());
        assert!(intensity.iter().all(|&v| v == 5));
    }

    #[test]
    fn test_short_readback_is_an_error() {
        let mapper = AddressMapper::new(AddressingMode::Native3D, VolumeDims::new(2, 2, 4));
        let mut intensity = vec![0u8; mapper.buffer_len()];
        let mut pipeline = SliceFilterPipeline::new(mapper, 1);
        let mut renderer = SliceIdRenderer::new();
        renderer.short_readback = true;

        let err = pipeline.run(&mut renderer, &mut intensity, 0.8).unwrap_err();
        assert!(matches!(
            err,
            FilterError::ReadbackSize {
                expected: 16,
                actual: 12
            }
        ));
    }
}
