//! Oriented cylinder used to bound surface erasure
//!
//! The cylinder's local +z runs against the chosen normal. Offsets from the
//! centre voxel are taken into the local frame after scaling their z
//! component by `x_dim / z_dim`; membership is then a radius test in xy plus
//! a depth window in z.

use glam::{EulerRot, IVec3, Quat, Vec3};

use crate::history::CylinderEdit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    /// Euler XYZ angles of the orientation
    rotation: Vec3,
    radius: f32,
    depth: f32,
    back_distance: f32,
    z_scale: f32,
    /// World to local rotation
    inverse: Quat,
}

/// Orientation taking local +z onto `-axis`
pub fn rotation_for_axis(axis: Vec3) -> Quat {
    let axis = axis.normalize_or(Vec3::Z);
    Quat::from_rotation_arc(Vec3::Z, -axis)
}

/// `-round(|tan(angle(view, gradient))| * size)`, zero when the angle is
/// undefined
pub fn tangential_back_distance(view: Vec3, gradient: Vec3, size: f32) -> f32 {
    let (Some(view), Some(gradient)) = (view.try_normalize(), gradient.try_normalize()) else {
        return 0.0;
    };
    let angle = view.dot(gradient).clamp(-1.0, 1.0).acos();
    -(angle.tan().abs() * size).round()
}

impl Cylinder {
    fn with_orientation(
        orientation: Quat,
        radius: f32,
        depth: f32,
        back_distance: f32,
        z_scale: f32,
    ) -> Self {
        let (rx, ry, rz) = orientation.to_euler(EulerRot::XYZ);
        let rotation = Vec3::new(rx, ry, rz);
        Self {
            rotation,
            radius,
            depth,
            back_distance,
            z_scale,
            inverse: Quat::from_euler(EulerRot::XYZ, rx, ry, rz).inverse(),
        }
    }

    /// Cylinder whose local +z points against `axis`
    pub fn from_axis(axis: Vec3, radius: f32, depth: f32, back_distance: f32, z_scale: f32) -> Self {
        Self::with_orientation(rotation_for_axis(axis), radius, depth, back_distance, z_scale)
    }

    /// Rebuild the cylinder of a recorded edit
    pub fn from_edit(edit: &CylinderEdit, z_scale: f32) -> Self {
        let r = edit.rotation;
        Self {
            rotation: r,
            radius: edit.size,
            depth: edit.depth,
            back_distance: edit.back_distance,
            z_scale,
            inverse: Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z).inverse(),
        }
    }

    #[inline]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn depth(&self) -> f32 {
        self.depth
    }

    #[inline]
    pub fn back_distance(&self) -> f32 {
        self.back_distance
    }

    /// Zero radius or depth: only the centre voxel can be reached
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.radius <= 0.0 || self.depth <= 0.0
    }

    /// Offset from the centre voxel in the cylinder frame
    #[inline]
    pub fn to_local(&self, offset: IVec3) -> Vec3 {
        let mut p = offset.as_vec3();
        p.z *= self.z_scale;
        self.inverse * p
    }

    /// Whether the voxel at `offset` from the centre lies inside
    pub fn contains(&self, offset: IVec3) -> bool {
        if offset == IVec3::ZERO {
            return true;
        }
        if self.is_degenerate() {
            return false;
        }
        let local = self.to_local(offset);
        local.x.hypot(local.y) <= self.radius
            && local.z.abs() <= self.depth
            && local.z >= self.back_distance
    }
}
