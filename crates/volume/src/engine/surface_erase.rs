//! Surface eraser: cylinder-bounded erase at a picked point
//!
//! One call handles one pointer event of a drag:
//! 1. Estimate the surface gradient around the target voxel
//! 2. Orient a cylinder along the surface normal or the view direction
//! 3. Gate the event on stroke length continuity
//! 4. Grow the erased region from the target inside the cylinder

use glam::{UVec3, Vec3};
use tracing::debug;

use super::region_growth::Growth;
use super::{DragState, EraseOutcome, VolumeEngine};
use crate::constants::FULL_INTENSITY;
use crate::cylinder::{Cylinder, tangential_back_distance};
use crate::history::{CylinderEdit, EditOperation};
use crate::types::EditKind;

/// Parameters of one surface eraser event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceEraseParams {
    /// Picked point, normalized to `[0, 1]` per axis
    pub target_uv: Vec3,
    /// Cylinder radius in voxels
    pub size: f32,
    /// Cylinder half height in voxels
    pub depth: f32,
    pub view_direction: Vec3,
    /// Intensity threshold as a fraction of full scale
    pub iso_threshold: f32,
    pub is_start: bool,
    pub is_mouse_up: bool,
    /// Orient along the estimated normal instead of the view
    pub use_surface_normal: bool,
    /// Accumulated stroke length reported by the UI
    pub stroke_length: f32,
}

impl VolumeEngine {
    /// Gaussian-weighted intensity gradient around `target`
    ///
    /// The neighbourhood is clipped to the volume, so voxels on a border get
    /// a one-sided estimate. Not normalized; zero in a flat neighbourhood
    /// only by symmetry.
    pub fn estimate_gradient(&self, target: UVec3) -> Vec3 {
        let dims = self.dims();
        let radius = self.config.eraser.normal_radius as i64;
        let sigma2 = self.config.eraser.normal_sigma * self.config.eraser.normal_sigma;
        let (tx, ty, tz) = (target.x as i64, target.y as i64, target.z as i64);

        let mut sum = Vec3::ZERO;
        let mut weight = 0.0f32;
        for k in -(radius.min(tz))..=radius.min(dims.z as i64 - 1 - tz) {
            for j in -(radius.min(ty))..=radius.min(dims.y as i64 - 1 - ty) {
                for i in -(radius.min(tx))..=radius.min(dims.x as i64 - 1 - tx) {
                    let Some(off) = self.mapper.checked_offset(tx + i, ty + j, tz + k) else {
                        continue;
                    };
                    let dist2 = (i * i + j * j + k * k) as f32;
                    let gauss = 1.0 - (-dist2 / (2.0 * sigma2)).exp();
                    weight += gauss;

                    let value = f32::from(self.intensity_at(off));
                    let dir = Vec3::new(-i as f32, -j as f32, -k as f32) / sigma2;
                    sum += value * gauss * dir;
                }
            }
        }

        if weight > 0.0 { sum / weight } else { Vec3::ZERO }
    }

    /// Erase the surface around a picked point
    pub fn erase_surface(&mut self, params: &SurfaceEraseParams) -> EraseOutcome {
        if params.is_mouse_up {
            self.drag = DragState::default();
            debug!("Surface erase: pointer released");
            return EraseOutcome::Released;
        }

        let target = self.uv_to_voxel(params.target_uv);
        let gradient = self.estimate_gradient(target);
        let towards_viewer = -params.view_direction;

        let (kind, normal) = if params.use_surface_normal {
            let normal = gradient
                .try_normalize()
                .or_else(|| towards_viewer.try_normalize())
                .unwrap_or(Vec3::Z);
            (EditKind::Normal, normal)
        } else {
            (EditKind::Tangential, towards_viewer.normalize_or(Vec3::Z))
        };

        if params.is_start {
            self.drag = DragState {
                previous_length: Some(params.stroke_length),
                reset: false,
            };
        }
        if self.drag.reset {
            return EraseOutcome::Throttled;
        }
        match self.drag.previous_length {
            Some(prev)
                if (params.stroke_length - prev).abs() < self.config.eraser.drag_tolerance =>
            {
                self.drag.previous_length = Some(params.stroke_length);
            }
            prev => {
                debug!(
                    "Surface erase throttled: stroke length {} after {:?}",
                    params.stroke_length, prev
                );
                self.drag.reset = true;
                return EraseOutcome::Throttled;
            }
        }

        let back_distance = match kind {
            EditKind::Normal => self.config.eraser.normal_back_distance,
            _ => tangential_back_distance(params.view_direction, gradient, params.size),
        };
        let cylinder = Cylinder::from_axis(
            normal,
            params.size,
            params.depth,
            back_distance,
            self.dims().xz_ratio(),
        );

        let iso_level = (params.iso_threshold - self.config.eraser.iso_border) * FULL_INTENSITY;
        let erased = self.grow_region(target, &cylinder, Growth::Erase { iso_level });
        if erased == 0 {
            debug!("Surface erase at {:?}: nothing above {}", target, iso_level);
            return EraseOutcome::NoChange;
        }

        let edit = CylinderEdit {
            target,
            size: params.size,
            depth: params.depth,
            rotation: cylinder.rotation(),
            back_distance,
        };
        self.history.push(match kind {
            EditKind::Normal => EditOperation::Normal(edit),
            _ => EditOperation::Tangential(edit),
        });

        debug!("Surface erase ({:?}) at {:?}: {} voxels", kind, target, erased);
        EraseOutcome::Erased { kind, voxels: erased }
    }
}
