//! Core coordinate utilities
//!
//! Geodetic positions on the configured body ellipsoid, conversion to and from body-fixed
//! Cartesian meters, and the Julian-date helpers used by the rotation model.

use bevy::math::DVec3;
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Mean radius used by the M-GITM products and the globe mesh (IAU 2000 sphere).
pub const MARS_RADIUS_M: f64 = 3_396_000.0;

/// Julian date of the J2000.0 epoch.
pub const J2000_JD: f64 = 2_451_545.0;

/// Latitude/longitude in degrees, altitude in meters above the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
}

impl Geodetic {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
        }
    }

    /// Point on the far side of the body at the surface: `(lon + 180, -lat, 0)`.
    pub fn antipode_on_surface(&self) -> Self {
        Self::new(-self.lat_deg, self.lon_deg + 180.0, 0.0)
    }
}

/// Oblate (or spherical) reference body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ellipsoid {
    pub equatorial_radius_m: f64,
    pub polar_radius_m: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::sphere(MARS_RADIUS_M)
    }
}

impl Ellipsoid {
    pub fn new(equatorial_radius_m: f64, polar_radius_m: f64) -> Self {
        Self {
            equatorial_radius_m,
            polar_radius_m,
        }
    }

    pub fn sphere(radius_m: f64) -> Self {
        Self::new(radius_m, radius_m)
    }

    /// First eccentricity squared.
    fn e2(&self) -> f64 {
        let a = self.equatorial_radius_m;
        let b = self.polar_radius_m;
        1.0 - (b * b) / (a * a)
    }

    /// Second eccentricity squared.
    fn ep2(&self) -> f64 {
        let a = self.equatorial_radius_m;
        let b = self.polar_radius_m;
        (a * a) / (b * b) - 1.0
    }

    /// Geodetic -> body-fixed Cartesian meters (+X at lon 0, +Z north).
    pub fn to_cartesian(&self, geo: Geodetic) -> DVec3 {
        let lat = geo.lat_deg.to_radians();
        let lon = geo.lon_deg.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();
        let e2 = self.e2();
        let n = self.equatorial_radius_m / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        DVec3::new(
            (n + geo.alt_m) * cos_lat * cos_lon,
            (n + geo.alt_m) * cos_lat * sin_lon,
            (n * (1.0 - e2) + geo.alt_m) * sin_lat,
        )
    }

    /// Body-fixed Cartesian -> geodetic using Bowring's closed form.
    ///
    /// On the polar axis longitude is undefined and reported as 0.
    pub fn to_geodetic(&self, p: DVec3) -> Geodetic {
        let a = self.equatorial_radius_m;
        let b = self.polar_radius_m;
        let rho = (p.x * p.x + p.y * p.y).sqrt();

        if rho < 1e-9 * a {
            let lat = if p.z >= 0.0 { 90.0 } else { -90.0 };
            return Geodetic::new(lat, 0.0, p.z.abs() - b);
        }

        let theta = (p.z * a).atan2(rho * b);
        let (sin_t, cos_t) = theta.sin_cos();
        let lat = (p.z + self.ep2() * b * sin_t.powi(3)).atan2(rho - self.e2() * a * cos_t.powi(3));
        let sin_lat = lat.sin();
        let n = a / (1.0 - self.e2() * sin_lat * sin_lat).sqrt();
        let alt = rho / lat.cos() - n;

        Geodetic::new(lat.to_degrees(), p.y.atan2(p.x).to_degrees(), alt)
    }
}

/// Compute the Julian Date (UTC) for a given timestamp.
/// Uses the standard Gregorian calendar to JD conversion.
pub fn julian_date_utc(t: DateTime<Utc>) -> f64 {
    let mut y = t.year();
    let mut m = t.month() as i32;
    let d = t.day() as i32;

    let hour = t.hour() as f64;
    let minute = t.minute() as f64;
    let sec = t.second() as f64 + (t.nanosecond() as f64) * 1e-9_f64;
    let day_fraction = (hour + (minute + sec / 60.0) / 60.0) / 24.0;

    if m <= 2 {
        y -= 1;
        m += 12;
    }

    let a = (y as f64 / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    let jd0 = (365.25 * (y as f64 + 4716.0)).floor()
        + (30.6001 * ((m + 1) as f64)).floor()
        + d as f64
        + b
        - 1524.5;

    jd0 + day_fraction
}

/// Days elapsed since J2000.0 (UTC treated as TDB; fine for display).
pub fn days_since_j2000(t: DateTime<Utc>) -> f64 {
    julian_date_utc(t) - J2000_JD
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn assert_relative(a: DVec3, b: DVec3, tol: f64) {
        let scale = b.length().max(1.0);
        assert!(
            (a - b).length() / scale < tol,
            "{a:?} vs {b:?} (relative {})",
            (a - b).length() / scale
        );
    }

    #[test]
    fn equator_prime_meridian_on_sphere() {
        let body = Ellipsoid::default();
        let p = body.to_cartesian(Geodetic::new(0.0, 0.0, 0.0));
        assert_relative(p, DVec3::new(MARS_RADIUS_M, 0.0, 0.0), 1e-12);
    }

    #[test]
    fn north_pole_and_east_axis() {
        let body = Ellipsoid::default();
        let pole = body.to_cartesian(Geodetic::new(90.0, 0.0, 100.0));
        assert!((pole.z - (MARS_RADIUS_M + 100.0)).abs() < 1e-6);
        let east = body.to_cartesian(Geodetic::new(0.0, 90.0, 0.0));
        assert!((east.y - MARS_RADIUS_M).abs() < 1e-6);
    }

    #[test]
    fn geodetic_round_trip_on_sphere() {
        let body = Ellipsoid::default();
        for (lat, lon, alt) in [
            (10.0, 20.0, 150_000.0),
            (-45.0, 170.0, 0.0),
            (89.0, -120.0, 6_000_000.0),
            (-33.3, -1.0, 80_000.0),
        ] {
            let geo = Geodetic::new(lat, lon, alt);
            let back = body.to_geodetic(body.to_cartesian(geo));
            assert!((back.lat_deg - lat).abs() < 1e-6, "lat {lat}");
            assert!((back.lon_deg - lon).abs() < 1e-6, "lon {lon}");
            assert!((back.alt_m - alt).abs() < 1e-3, "alt {alt}");
        }
    }

    #[test]
    fn geodetic_round_trip_on_oblate_body() {
        let body = Ellipsoid::new(3_396_190.0, 3_376_200.0);
        let geo = Geodetic::new(37.5, -75.0, 250_000.0);
        let p = body.to_cartesian(geo);
        let again = body.to_cartesian(body.to_geodetic(p));
        assert_relative(again, p, 1e-6);
    }

    #[test]
    fn pole_does_not_produce_nan() {
        let body = Ellipsoid::default();
        let geo = body.to_geodetic(DVec3::new(0.0, 0.0, -MARS_RADIUS_M - 10.0));
        assert_eq!(geo.lat_deg, -90.0);
        assert!((geo.alt_m - 10.0).abs() < 1e-9);
        assert!(geo.lon_deg.is_finite());
    }

    #[test]
    fn antipode_flips_latitude_and_longitude() {
        let anti = Geodetic::new(12.0, 30.0, 500.0).antipode_on_surface();
        assert_eq!(anti, Geodetic::new(-12.0, 210.0, 0.0));
    }

    #[test]
    fn julian_date_at_j2000() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((julian_date_utc(t) - J2000_JD).abs() < 1e-9);
        assert!(days_since_j2000(t).abs() < 1e-9);
    }

    #[test]
    fn julian_date_handles_january() {
        let t = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        assert!((julian_date_utc(t) - 2_458_484.5).abs() < 1e-9);
    }
}
