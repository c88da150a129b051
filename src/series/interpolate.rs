//! Linear interpolation for sample values

use bevy::math::{DMat3, DQuat, DVec3};

/// A value that can be blended between two samples.
///
/// `t` is the normalized position between `self` (t = 0) and `other` (t = 1).
pub trait Interpolate: Clone {
    fn interpolate(&self, other: &Self, t: f64) -> Self;
}

impl Interpolate for f64 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for DVec3 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.lerp(*other, t)
    }
}

impl Interpolate for DQuat {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.slerp(*other, t)
    }
}

/// Component-wise blend. The result is not re-orthonormalized; matrix series are
/// normally sampled densely enough that the drift is far below display precision.
impl Interpolate for DMat3 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        DMat3::from_cols(
            self.x_axis.lerp(other.x_axis, t),
            self.y_axis.lerp(other.y_axis, t),
            self.z_axis.lerp(other.z_axis, t),
        )
    }
}
