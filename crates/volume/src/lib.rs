//! Volumetric data engine for voxview
//!
//! This crate holds the CPU side of a volume viewer:
//! - Packing scans into atlas or native 3D buffers ([`AddressMapper`], [`VolumeBufferBuilder`])
//! - Per-slice GPU filtering with readback ([`SliceFilterPipeline`], [`SliceRenderer`])
//! - The visibility mask and its erasers (surface cylinder, threshold flood)
//! - Bounded undo of mask edits
//!
//! Rendering and shaders live in the host application; it implements
//! [`SliceRenderer`] and uploads the buffers the engine exposes.

pub mod address;
pub mod builder;
pub mod constants;
pub mod cylinder;
pub mod engine;
pub mod filter;
pub mod history;
pub mod types;
pub mod validation;

pub use address::{AddressMapper, TileLayout, tile_count_for_depth};
pub use builder::{Volume, VolumeBufferBuilder, VolumeBuffers, VoxelFormat};
pub use engine::{DirtyTracker, EraseOutcome, SurfaceEraseParams, UndoReport, VolumeEngine};
pub use filter::{FilterError, FilterReport, FilterUniforms, SliceFilterPipeline, SliceRenderer, SourceTextures};
pub use history::{CylinderEdit, EditOperation, UndoHistory};
pub use types::{AddressingMode, EditKind, TextureDesc, VolumeDims};
pub use validation::LoadError;
pub use voxview_config::EngineConfig;
