//! Rotation that carries the model's sub-solar point onto the observed one.

use bevy::math::{DQuat, DVec3};
use chrono::{DateTime, Utc};

use crate::core::Ellipsoid;
use crate::series::SampleSeries;

pub struct RotationBasis<'a> {
    /// Model sub-solar `(lat, lon)` in degrees.
    pub model_subsolar_deg: (f64, f64),
    /// Observed body-fixed sub-solar positions.
    pub observed: Option<&'a SampleSeries<DVec3>>,
}

/// Spin about the pole to match longitude, then tilt along the observed meridian to match
/// latitude. Identity when there is nothing observed at `time`.
pub fn compute_rotation(time: DateTime<Utc>, basis: &RotationBasis, ellipsoid: &Ellipsoid) -> DQuat {
    let Some(observed) = basis.observed.and_then(|series| series.value_at(time)) else {
        return DQuat::IDENTITY;
    };
    let geo = ellipsoid.to_geodetic(observed);
    let (model_lat, model_lon) = basis.model_subsolar_deg;

    let r1 = DQuat::from_rotation_z((geo.lon_deg - model_lon).to_radians());
    // at a pole the meridian is undefined
    let axis = DVec3::Z.cross(observed);
    if axis.length() <= observed.length() * 1e-9 {
        return r1;
    }
    let r2 = DQuat::from_axis_angle(axis.normalize(), (model_lat - geo.lat_deg).to_radians());
    r2 * r1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Geodetic;
    use crate::series::InterpolationPolicy;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 6, 1, 12, 0, 0).unwrap()
    }

    fn observed_at(ellipsoid: &Ellipsoid, lat: f64, lon: f64) -> SampleSeries<DVec3> {
        let mut series = SampleSeries::new(InterpolationPolicy::Hold);
        series
            .add_sample(t0(), ellipsoid.to_cartesian(Geodetic::new(lat, lon, 80_000.0)))
            .unwrap();
        series
    }

    fn direction(ellipsoid: &Ellipsoid, lat: f64, lon: f64) -> DVec3 {
        ellipsoid
            .to_cartesian(Geodetic::new(lat, lon, 0.0))
            .normalize()
    }

    #[test]
    fn identity_without_observations() {
        let ellipsoid = Ellipsoid::default();
        let empty = SampleSeries::new(InterpolationPolicy::Linear);
        for observed in [None, Some(&empty)] {
            let basis = RotationBasis {
                model_subsolar_deg: (0.0, -10.0),
                observed,
            };
            assert_eq!(compute_rotation(t0(), &basis, &ellipsoid), DQuat::IDENTITY);
        }
    }

    #[test]
    fn longitude_only() {
        let ellipsoid = Ellipsoid::default();
        let observed = observed_at(&ellipsoid, 0.0, 20.0);
        let basis = RotationBasis {
            model_subsolar_deg: (0.0, -10.0),
            observed: Some(&observed),
        };
        let q = compute_rotation(t0(), &basis, &ellipsoid);
        let moved = q * direction(&ellipsoid, 0.0, -10.0);
        assert!((moved - direction(&ellipsoid, 0.0, 20.0)).length() < 1e-9);
    }

    #[test]
    fn model_point_lands_on_observed_point() {
        let ellipsoid = Ellipsoid::default();
        let observed = observed_at(&ellipsoid, 10.0, 50.0);
        let basis = RotationBasis {
            model_subsolar_deg: (-25.19, 11.75),
            observed: Some(&observed),
        };
        let q = compute_rotation(t0(), &basis, &ellipsoid);
        let moved = q * direction(&ellipsoid, -25.19, 11.75);
        assert!((moved - direction(&ellipsoid, 10.0, 50.0)).length() < 1e-9);
    }

    #[test]
    fn pole_skips_the_tilt() {
        let ellipsoid = Ellipsoid::default();
        let observed = observed_at(&ellipsoid, 90.0, 0.0);
        let basis = RotationBasis {
            model_subsolar_deg: (0.0, -10.0),
            observed: Some(&observed),
        };
        let q = compute_rotation(t0(), &basis, &ellipsoid);
        assert!(q.is_finite());
        assert!((q * DVec3::Z - DVec3::Z).length() < 1e-12);
    }
}
