//! Dirty slice tracking for partial texture uploads

use std::collections::BTreeSet;

use tracing::debug;

use super::VolumeEngine;

/// Mask z-slices and intensity changes not yet uploaded
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    mask_slices: BTreeSet<u32>,
    intensity: bool,
}

impl DirtyTracker {
    /// Mark one mask slice as modified
    #[inline]
    pub fn mark_slice(&mut self, z: u32) {
        self.mask_slices.insert(z);
    }

    /// Mark every slice of a `z_dim` deep mask
    pub fn mark_all_slices(&mut self, z_dim: u32) {
        self.mask_slices.extend(0..z_dim);
        debug!("mark_all_slices: {} slices dirty", self.mask_slices.len());
    }

    #[inline]
    pub fn mark_intensity(&mut self) {
        self.intensity = true;
    }

    /// Get all dirty slices in ascending order and clear the set
    pub fn take_mask_slices(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.mask_slices).into_iter().collect()
    }

    /// Read and clear the intensity flag
    pub fn take_intensity(&mut self) -> bool {
        std::mem::replace(&mut self.intensity, false)
    }

    #[inline]
    pub fn has_dirty_mask(&self) -> bool {
        !self.mask_slices.is_empty()
    }

    #[inline]
    pub fn dirty_slice_count(&self) -> usize {
        self.mask_slices.len()
    }

    #[inline]
    pub fn is_intensity_dirty(&self) -> bool {
        self.intensity
    }
}

impl VolumeEngine {
    /// Mask slices changed since the last call, ascending
    pub fn take_dirty_mask_slices(&mut self) -> Vec<u32> {
        self.dirty.take_mask_slices()
    }

    /// Whether the intensity buffer changed since the last call
    pub fn take_intensity_dirty(&mut self) -> bool {
        self.dirty.take_intensity()
    }

    #[inline]
    pub fn has_dirty_mask(&self) -> bool {
        self.dirty.has_dirty_mask()
    }

    #[inline]
    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_drains_sorted_slices() {
        let mut dirty = DirtyTracker::default();
        dirty.mark_slice(7);
        dirty.mark_slice(2);
        dirty.mark_slice(7);
        assert!(dirty.has_dirty_mask());
        assert_eq!(dirty.dirty_slice_count(), 2);
        assert_eq!(dirty.take_mask_slices(), vec![2, 7]);
        assert!(!dirty.has_dirty_mask());
        assert!(dirty.take_mask_slices().is_empty());
    }

    #[test]
    fn test_mark_all_slices() {
        let mut dirty = DirtyTracker::default();
        dirty.mark_all_slices(4);
        assert_eq!(dirty.take_mask_slices(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_intensity_flag() {
        let mut dirty = DirtyTracker::default();
        assert!(!dirty.take_intensity());
        dirty.mark_intensity();
        assert!(dirty.is_intensity_dirty());
        assert!(dirty.take_intensity());
        assert!(!dirty.take_intensity());
    }
}
