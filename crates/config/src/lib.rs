//! Shared configuration for voxview
//!
//! This crate provides the single source of truth for the tunables of the
//! volume engine: the slice filter, the voxel erasers and the undo history.
//! Every struct deserializes with defaults, so a partial JSON document only
//! overrides the fields it names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default Gaussian sigma for the slice filter pass
pub const DEFAULT_BLUR_SIGMA: f32 = 0.8;

/// Volumes deeper than this get their first and last slice zeroed (Native3D)
pub const DEFAULT_BOUNDARY_CLAMP_MIN_DEPTH: u32 = 5;

/// Neighbourhood radius for surface normal estimation
pub const DEFAULT_NORMAL_RADIUS: u32 = 2;

/// Gaussian sigma for surface normal estimation
pub const DEFAULT_NORMAL_SIGMA: f32 = 1.4;

/// Maximum stroke length change between two erase calls of one drag
pub const DEFAULT_DRAG_TOLERANCE: f32 = 0.05;

/// Back clip plane of the cylinder in surface-normal mode (voxels)
pub const DEFAULT_NORMAL_BACK_DISTANCE: f32 = -5.0;

/// Width of the isosurface inclusion band, as a fraction of full intensity
pub const DEFAULT_ISO_BORDER: f32 = 0.01;

/// Number of edit operations kept for undo
pub const DEFAULT_UNDO_CAPACITY: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Slice filter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Gaussian sigma handed to the blur shader on the first pass
    pub blur_sigma: f32,
    /// First/last slice are zeroed when the volume is deeper than this
    pub boundary_clamp_min_depth: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blur_sigma: DEFAULT_BLUR_SIGMA,
            boundary_clamp_min_depth: DEFAULT_BOUNDARY_CLAMP_MIN_DEPTH,
        }
    }
}

/// Surface and flood eraser settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EraserConfig {
    /// Half-width of the gradient neighbourhood used for normals
    pub normal_radius: u32,
    /// Sigma of the gradient weighting
    pub normal_sigma: f32,
    /// Drag continuity throttle
    pub drag_tolerance: f32,
    /// Back clip distance in surface-normal mode
    pub normal_back_distance: f32,
    /// Isosurface inclusion band below the threshold (0..1)
    pub iso_border: f32,
}

impl Default for EraserConfig {
    fn default() -> Self {
        Self {
            normal_radius: DEFAULT_NORMAL_RADIUS,
            normal_sigma: DEFAULT_NORMAL_SIGMA,
            drag_tolerance: DEFAULT_DRAG_TOLERANCE,
            normal_back_distance: DEFAULT_NORMAL_BACK_DISTANCE,
            iso_border: DEFAULT_ISO_BORDER,
        }
    }
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of stored operations. A push beyond this clears the
    /// whole history.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_UNDO_CAPACITY,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub filter: FilterConfig,
    pub eraser: EraserConfig,
    pub history: HistoryConfig,
}

impl EngineConfig {
    /// Parse a config from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make the engine misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.filter.blur_sigma.is_finite() && self.filter.blur_sigma >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "filter.blur_sigma",
                reason: format!("must be a non-negative number, got {}", self.filter.blur_sigma),
            });
        }
        if !(self.eraser.normal_sigma.is_finite() && self.eraser.normal_sigma > 0.0) {
            return Err(ConfigError::Invalid {
                field: "eraser.normal_sigma",
                reason: format!("must be positive, got {}", self.eraser.normal_sigma),
            });
        }
        // the gate is a strict `<`, so zero would reject every event
        if !(self.eraser.drag_tolerance.is_finite() && self.eraser.drag_tolerance > 0.0) {
            return Err(ConfigError::Invalid {
                field: "eraser.drag_tolerance",
                reason: format!("must be positive, got {}", self.eraser.drag_tolerance),
            });
        }
        if !self.eraser.normal_back_distance.is_finite() {
            return Err(ConfigError::Invalid {
                field: "eraser.normal_back_distance",
                reason: format!("must be finite, got {}", self.eraser.normal_back_distance),
            });
        }
        if !(0.0..=1.0).contains(&self.eraser.iso_border) {
            return Err(ConfigError::Invalid {
                field: "eraser.iso_border",
                reason: format!("must be within 0..=1, got {}", self.eraser.iso_border),
            });
        }
        Ok(())
    }
}
