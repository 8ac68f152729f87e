/// Mask value of a visible voxel.
pub const MASK_VISIBLE: u8 = 255;

/// Mask value of an erased voxel.
pub const MASK_ERASED: u8 = 0;

/// Full-scale intensity as a float, for threshold math.
pub const FULL_INTENSITY: f32 = 255.0;

/// Channels per voxel of an ROI-bearing (RGBA) buffer and of filter readback.
pub const RGBA_CHANNELS: usize = 4;

/// Channel of a 4-byte source voxel holding the intensity.
pub const INTENSITY_CHANNEL: usize = 0;

/// Channel of a 4-byte source voxel holding the ROI id.
pub const ROI_CHANNEL: usize = 3;
