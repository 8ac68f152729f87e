//! Threshold flood eraser
//!
//! Scanline fill along x. Each popped seed is widened to the full run of
//! qualifying voxels on its row, then the four neighbour rows (±y, ±z) are
//! scanned and one seed is pushed per contiguous qualifying stretch.
//!
//! The same fill runs in undo mode with the sense inverted: it walks erased
//! voxels and makes them visible again.

use glam::{I64Vec3, UVec3, Vec3};
use tracing::debug;

use super::{EraseOutcome, VolumeEngine};
use crate::constants::{MASK_ERASED, MASK_VISIBLE};
use crate::history::EditOperation;
use crate::types::EditKind;

/// Neighbour rows as (dy, dz)
const NEIGHBOUR_ROWS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl VolumeEngine {
    /// Intensity as the flood fill sees it
    ///
    /// Forward: raw intensity, 0 for erased voxels. Undo: raw intensity,
    /// 0 for visible voxels. `None` outside the volume.
    pub fn visible_intensity(&self, x: i64, y: i64, z: i64, undo: bool) -> Option<u8> {
        let off = self.mapper.checked_offset(x, y, z)?;
        Some(self.visible_intensity_at(off, undo))
    }

    #[inline]
    fn visible_intensity_at(&self, off: usize, undo: bool) -> u8 {
        let hidden = if undo { MASK_VISIBLE } else { MASK_ERASED };
        if self.mask[off] == hidden {
            0
        } else {
            self.intensity_at(off)
        }
    }

    /// Whether `p` is still in the state being toggled and at or above the
    /// fill threshold
    fn flood_qualifies(&self, p: I64Vec3, undo: bool, threshold: u8) -> bool {
        let Some(off) = self.mapper.checked_offset(p.x, p.y, p.z) else {
            return false;
        };
        let toggled_from = if undo { MASK_ERASED } else { MASK_VISIBLE };
        self.mask[off] == toggled_from && self.visible_intensity_at(off, undo) >= threshold
    }

    /// Span fill from `seed`, erasing (or restoring in undo mode) every
    /// connected voxel at or above the seed's visible intensity. Returns the
    /// number of mask bytes flipped.
    pub(crate) fn span_fill(&mut self, seed: UVec3, undo: bool) -> usize {
        let seed = seed.as_i64vec3();
        let Some(seed_off) = self.mapper.checked_offset(seed.x, seed.y, seed.z) else {
            return 0;
        };
        let threshold = self.visible_intensity_at(seed_off, undo);
        let value = if undo { MASK_VISIBLE } else { MASK_ERASED };

        let mut stack = vec![seed];
        let mut flipped = 0;

        while let Some(point) = stack.pop() {
            // already taken by an earlier span
            if !self.flood_qualifies(point, undo, threshold) {
                continue;
            }

            let mut left = point.x;
            while self.flood_qualifies(I64Vec3::new(left - 1, point.y, point.z), undo, threshold) {
                left -= 1;
            }
            let mut right = point.x;
            while self.flood_qualifies(I64Vec3::new(right + 1, point.y, point.z), undo, threshold) {
                right += 1;
            }

            let mut open = [false; 4];
            for x in left..=right {
                let off = self.mapper.offset(x as u32, point.y as u32, point.z as u32);
                self.set_mask(off, point.z as u32, value);
                flipped += 1;

                for (i, (dy, dz)) in NEIGHBOUR_ROWS.iter().enumerate() {
                    let next = I64Vec3::new(x, point.y + dy, point.z + dz);
                    let qualifies = self.flood_qualifies(next, undo, threshold);
                    if !open[i] && qualifies {
                        stack.push(next);
                        open[i] = true;
                    } else if open[i] && !qualifies {
                        open[i] = false;
                    }
                }
            }
        }

        flipped
    }

    /// Flood erase from a picked point
    pub fn flood_erase(&mut self, target_uv: Vec3, is_start: bool, is_mouse_up: bool) -> EraseOutcome {
        let target = self.uv_to_voxel(target_uv);
        if is_start {
            self.last_flood_position = None;
        }
        if is_mouse_up {
            self.last_flood_position = Some(target);
            return EraseOutcome::Released;
        }
        if self.last_flood_position.is_none() {
            self.last_flood_position = Some(target);
        }

        let erased = self.span_fill(target, false);
        if erased == 0 {
            debug!("Flood erase at {:?}: nothing to erase", target);
            return EraseOutcome::NoChange;
        }

        self.history.push(EditOperation::Flood { target });
        debug!("Flood erase at {:?}: {} voxels", target, erased);
        EraseOutcome::Erased {
            kind: EditKind::Flood,
            voxels: erased,
        }
    }
}
