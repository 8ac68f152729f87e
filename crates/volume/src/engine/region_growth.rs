//! 26-neighbour region growth bounded by a cylinder

use glam::{IVec3, UVec3};

use super::VolumeEngine;
use crate::constants::{MASK_ERASED, MASK_VISIBLE};
use crate::cylinder::Cylinder;

/// What the growth does to the voxels it reaches
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Growth {
    /// Erase visible voxels with intensity at or above `iso_level`
    Erase { iso_level: f32 },
    /// Make erased voxels visible again
    Restore,
}

impl VolumeEngine {
    /// Grow from `target` through every voxel inside `cylinder` that the
    /// growth applies to. Returns the number of mask bytes flipped.
    ///
    /// Each accepted voxel flips its mask byte before it is pushed, so no
    /// voxel enters the stack twice.
    pub(crate) fn grow_region(&mut self, target: UVec3, cylinder: &Cylinder, growth: Growth) -> usize {
        let centre = target.as_ivec3();
        let mut stack = vec![IVec3::ZERO];
        let mut flipped = 0;

        while let Some(point) = stack.pop() {
            for dz in -1..=1 {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let offset = point + IVec3::new(dx, dy, dz);
                        let voxel = centre + offset;
                        let Some(off) = self.mapper.checked_offset(
                            voxel.x as i64,
                            voxel.y as i64,
                            voxel.z as i64,
                        ) else {
                            continue;
                        };

                        let erased = self.mask[off] == MASK_ERASED;
                        let (qualifies, value) = match growth {
                            Growth::Erase { iso_level } => (
                                !erased && f32::from(self.intensity_at(off)) >= iso_level,
                                MASK_ERASED,
                            ),
                            Growth::Restore => (erased, MASK_VISIBLE),
                        };
                        if !qualifies || !cylinder.contains(offset) {
                            continue;
                        }

                        self.set_mask(off, voxel.z as u32, value);
                        flipped += 1;
                        stack.push(offset);
                    }
                }
            }
        }

        flipped
    }
}
