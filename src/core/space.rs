//! Mapping between the body-fixed pipeline frame (f64 meters) and Bevy world space (f32).
//!
//! Mapping: Bevy (x,y,z) = (fixed.y, fixed.z, fixed.x), so the body's north pole points up (+Y).

use bevy::math::{DMat3, DQuat, DVec3, Quat, Vec3};

/// Convert a pipeline position (meters, f64) to Bevy world units.
pub fn fixed_to_world(p: DVec3, world_units_per_meter: f64) -> Vec3 {
    let s = p * world_units_per_meter;
    Vec3::new(s.y as f32, s.z as f32, s.x as f32)
}

/// Inverse of [`fixed_to_world`].
pub fn world_to_fixed(w: Vec3, world_units_per_meter: f64) -> DVec3 {
    DVec3::new(w.z as f64, w.x as f64, w.y as f64) / world_units_per_meter
}

/// Re-express a pipeline rotation in world axes (the axis permutation is a proper rotation).
pub fn rotation_to_world(q: DQuat) -> Quat {
    Quat::from_xyzw(q.y as f32, q.z as f32, q.x as f32, q.w as f32).normalize()
}

/// Rotation matrix -> world quaternion.
pub fn matrix_to_world(m: DMat3) -> Quat {
    rotation_to_world(DQuat::from_mat3(&m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_are_permuted() {
        let w = fixed_to_world(DVec3::new(1000.0, 2000.0, 3000.0), 1e-3);
        assert_eq!(w, Vec3::new(2.0, 3.0, 1.0));
        let back = world_to_fixed(w, 1e-3);
        assert!((back - DVec3::new(1000.0, 2000.0, 3000.0)).length() < 1e-6);
    }

    #[test]
    fn rotation_commutes_with_mapping() {
        let q = DQuat::from_rotation_z(0.7) * DQuat::from_rotation_x(-0.3);
        let p = DVec3::new(1.0, -2.0, 0.5);
        let rotated_then_mapped = fixed_to_world(q * p, 1.0);
        let mapped_then_rotated = rotation_to_world(q) * fixed_to_world(p, 1.0);
        assert!((rotated_then_mapped - mapped_then_rotated).length() < 1e-5);
    }

    #[test]
    fn polar_spin_is_about_world_up() {
        let q = matrix_to_world(DMat3::from_rotation_z(1.0));
        let (axis, angle) = q.to_axis_angle();
        assert!((axis - Vec3::Y).length() < 1e-5);
        assert!((angle - 1.0).abs() < 1e-5);
    }
}
