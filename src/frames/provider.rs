//! Frame providers: rotation between the body-fixed and inertial frames at an instant.

use bevy::math::DMat3;
use bevy::prelude::*;
use chrono::{DateTime, Duration, Utc};

use crate::core::days_since_j2000;

/// Source of body-fixed <-> inertial rotations.
///
/// `None` means "not available for this instant" (not preloaded, outside coverage).
pub trait FrameProvider {
    fn fixed_to_inertial(&self, time: DateTime<Utc>) -> Option<DMat3>;

    fn inertial_to_fixed(&self, time: DateTime<Utc>) -> Option<DMat3> {
        self.fixed_to_inertial(time).map(|m| m.transpose())
    }
}

/// Uniform spin of Mars about its pole, IAU rotational elements: `W = W0 + rate * d`.
///
/// Pole precession and nutation are ignored, so the inertial frame here is the body's
/// equatorial frame at J2000 rather than ICRF proper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarsRotationModel {
    pub prime_meridian_deg: f64,
    pub rate_deg_per_day: f64,
}

impl Default for MarsRotationModel {
    fn default() -> Self {
        Self {
            prime_meridian_deg: 176.630,
            rate_deg_per_day: 350.891_982_26,
        }
    }
}

impl MarsRotationModel {
    /// Prime meridian angle in radians, wrapped to `[0, TAU)`.
    pub fn prime_meridian_rad(&self, time: DateTime<Utc>) -> f64 {
        let w = self.prime_meridian_deg + self.rate_deg_per_day * days_since_j2000(time);
        w.rem_euclid(360.0).to_radians()
    }
}

impl FrameProvider for MarsRotationModel {
    fn fixed_to_inertial(&self, time: DateTime<Utc>) -> Option<DMat3> {
        Some(DMat3::from_rotation_z(self.prime_meridian_rad(time)))
    }
}

/// Frame provider that only answers inside the preloaded time window.
///
/// Mirrors a kernel-backed provider where matrices exist only for the loaded date range.
#[derive(Resource)]
pub struct PreloadedFrames {
    inner: Box<dyn FrameProvider + Send + Sync>,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl PreloadedFrames {
    pub fn new(inner: impl FrameProvider + Send + Sync + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            window: None,
        }
    }

    /// Preload `[start - margin, end + margin]`.
    pub fn preload(&mut self, start: DateTime<Utc>, end: DateTime<Utc>, margin: Duration) {
        self.window = Some((start - margin, end + margin));
        debug!("frame matrices preloaded for {} .. {}", start - margin, end + margin);
    }

    fn covers(&self, time: DateTime<Utc>) -> bool {
        matches!(self.window, Some((start, end)) if time >= start && time <= end)
    }
}

impl Default for PreloadedFrames {
    fn default() -> Self {
        Self::new(MarsRotationModel::default())
    }
}

impl FrameProvider for PreloadedFrames {
    fn fixed_to_inertial(&self, time: DateTime<Utc>) -> Option<DMat3> {
        if !self.covers(time) {
            return None;
        }
        self.inner.fixed_to_inertial(time)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Always answers with the same matrix.
    pub struct FixedFrames(pub DMat3);

    impl FrameProvider for FixedFrames {
        fn fixed_to_inertial(&self, _time: DateTime<Utc>) -> Option<DMat3> {
            Some(self.0)
        }
    }

    /// Never has a matrix.
    pub struct NoFrames;

    impl FrameProvider for NoFrames {
        fn fixed_to_inertial(&self, _time: DateTime<Utc>) -> Option<DMat3> {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::DVec3;
    use chrono::TimeZone;

    #[test]
    fn prime_meridian_at_j2000() {
        let model = MarsRotationModel::default();
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((model.prime_meridian_rad(t) - 176.630_f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn one_sol_is_nearly_a_full_turn() {
        let model = MarsRotationModel::default();
        let t0 = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        // 360 / 350.89198226 days
        let sol = Duration::milliseconds((360.0 / 350.891_982_26 * 86_400_000.0) as i64);
        let a = model.prime_meridian_rad(t0);
        let b = model.prime_meridian_rad(t0 + sol);
        let diff = (a - b).abs();
        assert!(diff < 1e-6 || (std::f64::consts::TAU - diff) < 1e-6);
    }

    #[test]
    fn inverse_is_transpose() {
        let model = MarsRotationModel::default();
        let t = Utc.with_ymd_and_hms(2019, 6, 1, 5, 0, 0).unwrap();
        let forward = model.fixed_to_inertial(t).unwrap();
        let back = model.inertial_to_fixed(t).unwrap();
        let p = DVec3::new(1.0, 2.0, 3.0);
        assert!((back * (forward * p) - p).length() < 1e-12);
    }

    #[test]
    fn preload_window_bounds_availability() {
        let mut frames = PreloadedFrames::default();
        let start = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(1);
        assert!(frames.fixed_to_inertial(start).is_none());

        frames.preload(start, end, Duration::days(1));
        assert!(frames.fixed_to_inertial(start).is_some());
        assert!(frames.fixed_to_inertial(end + Duration::hours(23)).is_some());
        assert!(frames.fixed_to_inertial(end + Duration::days(2)).is_none());
        assert!(frames.inertial_to_fixed(start - Duration::days(3)).is_none());
    }
}
