//! Volume engine
//!
//! This module provides the owner of one loaded volume. It ties together:
//! - Buffer packing (intensity, filter source, ROI) through the address mapper
//! - The visibility mask edited by the surface and flood erasers
//! - The slice filter, once a renderer is attached
//! - Undo history and dirty slice tracking for partial uploads
//!
//! All mutation goes through `&mut self`, so there is exactly one writer for
//! the mask and the intensity buffer at any time.

mod commands;
mod dirty_tracking;
mod flood;
mod region_growth;
mod surface_erase;
mod undo;

use glam::{UVec3, Vec3};
use tracing::{debug, info, warn};
use voxview_config::EngineConfig;

use crate::address::AddressMapper;
use crate::builder::{Volume, VolumeBufferBuilder, VolumeBuffers};
use crate::constants::MASK_VISIBLE;
use crate::filter::{FilterError, FilterReport, SliceFilterPipeline, SliceRenderer, SourceTextures};
use crate::history::UndoHistory;
use crate::types::{AddressingMode, EditKind, TextureDesc, VolumeDims};
use crate::validation::{LoadError, uv_to_voxel, validate_dims};

pub use dirty_tracking::DirtyTracker;
pub use surface_erase::SurfaceEraseParams;

/// Result of one eraser call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseOutcome {
    /// Pointer released; drag state was reset
    Released,
    /// Rejected by the drag continuity gate
    Throttled,
    /// Nothing inside the tool footprint qualified
    NoChange,
    /// Mask changed and the edit was recorded
    Erased { kind: EditKind, voxels: usize },
}

/// Result of a successful undo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoReport {
    pub kind: EditKind,
    /// Voxels made visible again
    pub voxels: usize,
}

/// Drag continuity state of the surface eraser
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct DragState {
    /// Stroke length of the last accepted event
    pub(crate) previous_length: Option<f32>,
    /// Set when the gate rejected an event; cleared on start or mouse-up
    pub(crate) reset: bool,
}

/// Attached renderer and its slice loop
struct FilterStage {
    renderer: Box<dyn SliceRenderer>,
    pipeline: SliceFilterPipeline,
}

/// One loaded volume with its edit state
pub struct VolumeEngine {
    pub(crate) config: EngineConfig,
    pub(crate) mapper: AddressMapper,
    pub(crate) buffers: VolumeBuffers,
    /// Visibility per voxel, same layout as the intensity buffer
    pub(crate) mask: Vec<u8>,
    pub(crate) history: UndoHistory,
    pub(crate) drag: DragState,
    /// Last flood position, forgotten at the start of a drag
    pub(crate) last_flood_position: Option<UVec3>,
    pub(crate) dirty: DirtyTracker,
    filter: Option<FilterStage>,
}

impl VolumeEngine {
    /// Pack `volume` into engine buffers and create an all-visible mask
    pub fn load(
        volume: &Volume<'_>,
        mode: AddressingMode,
        has_roi: bool,
        config: EngineConfig,
    ) -> Result<Self, LoadError> {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                warn!("{}; falling back to the default engine config", err);
                EngineConfig::default()
            }
        };

        let dims = volume.dims();
        validate_dims(dims, mode)?;

        let mapper = AddressMapper::new(mode, dims);
        let builder = VolumeBufferBuilder::new(mapper, config.filter.boundary_clamp_min_depth);
        let buffers = builder.build(volume, has_roi)?;
        let mask = vec![MASK_VISIBLE; mapper.buffer_len()];

        info!(
            "Loaded {}x{}x{} volume ({:?}, {} mask bytes)",
            dims.x,
            dims.y,
            dims.z,
            mode,
            mask.len()
        );

        Ok(Self {
            history: UndoHistory::new(config.history.capacity),
            config,
            mapper,
            buffers,
            mask,
            drag: DragState::default(),
            last_flood_position: None,
            dirty: DirtyTracker::default(),
            filter: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn mapper(&self) -> &AddressMapper {
        &self.mapper
    }

    #[inline]
    pub fn dims(&self) -> VolumeDims {
        self.mapper.dims()
    }

    #[inline]
    pub fn mode(&self) -> AddressingMode {
        self.mapper.mode()
    }

    /// Filtered intensity, 1 or 4 bytes per texel
    pub fn intensity(&self) -> &[u8] {
        &self.buffers.intensity
    }

    pub fn intensity_desc(&self) -> TextureDesc {
        self.mapper.texture_desc(self.buffers.channels as u32)
    }

    /// Unfiltered intensity uploaded as the filter input
    pub fn source(&self) -> &[u8] {
        &self.buffers.source
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn mask_desc(&self) -> TextureDesc {
        self.mapper.texture_desc(1)
    }

    pub fn roi(&self) -> Option<&[u8]> {
        self.buffers.roi.as_deref()
    }

    /// Same shape as the mask; `None` without ROI data
    pub fn roi_desc(&self) -> Option<TextureDesc> {
        self.buffers.roi.as_ref().map(|_| self.mapper.texture_desc(1))
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// Last flood position of the current drag
    pub fn last_flood_position(&self) -> Option<UVec3> {
        self.last_flood_position
    }

    /// Normalized position to voxel, truncating and clamping into the volume
    #[inline]
    pub fn uv_to_voxel(&self, uv: Vec3) -> UVec3 {
        uv_to_voxel(uv, self.dims())
    }

    /// Intensity at a buffer offset (channel 0 for RGBA buffers)
    #[inline]
    pub(crate) fn intensity_at(&self, offset: usize) -> u8 {
        self.buffers.intensity[offset * self.buffers.channels]
    }

    /// Write one mask byte and mark its slice dirty
    #[inline]
    pub(crate) fn set_mask(&mut self, offset: usize, z: u32, value: u8) {
        self.mask[offset] = value;
        self.dirty.mark_slice(z);
    }

    /// Make every voxel visible again. The history is kept.
    pub fn reset_mask(&mut self) {
        self.mask.fill(MASK_VISIBLE);
        self.dirty.mark_all_slices(self.dims().z);
        debug!("Mask reset ({} undo entries kept)", self.history.len());
    }

    /// Whether a renderer is attached and the filter can run
    pub fn is_filter_ready(&self) -> bool {
        self.filter.is_some()
    }

    /// Upload the filter sources to `renderer` and run the first pass with
    /// the configured sigma
    pub fn attach_renderer(
        &mut self,
        mut renderer: Box<dyn SliceRenderer>,
    ) -> Result<FilterReport, FilterError> {
        let sources = SourceTextures {
            volume: &self.buffers.source,
            roi: self.buffers.roi.as_deref(),
            desc: self.mapper.texture_desc(1),
        };
        renderer.upload_sources(&sources)?;

        let mut pipeline = SliceFilterPipeline::new(self.mapper, self.buffers.channels);
        let report = pipeline.run(
            renderer.as_mut(),
            &mut self.buffers.intensity,
            self.config.filter.blur_sigma,
        )?;
        if report.slices > 0 {
            self.dirty.mark_intensity();
        }

        self.filter = Some(FilterStage { renderer, pipeline });
        Ok(report)
    }

    /// Re-run the slice filter with `sigma`
    ///
    /// Returns `Ok(None)` when no renderer is attached yet.
    pub fn refilter(&mut self, sigma: f32) -> Result<Option<FilterReport>, FilterError> {
        let Some(stage) = self.filter.as_mut() else {
            warn!("Refilter requested before a renderer was attached; ignoring");
            return Ok(None);
        };

        let report = stage
            .pipeline
            .run(stage.renderer.as_mut(), &mut self.buffers.intensity, sigma)?;
        if report.slices > 0 {
            self.dirty.mark_intensity();
        }
        Ok(Some(report))
    }
}
