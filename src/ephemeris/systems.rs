use bevy::math::DVec3;
use bevy::prelude::*;
use chrono::{DateTime, Utc};

use crate::config::VizConfig;
use crate::ephemeris::path_color::PathColorState;
use crate::ephemeris::types::{EphemerisProducts, EphemerisState};
use crate::session::Session;
use crate::time::SimulationTime;
use crate::visualization::sink::{GizmoSink, LineSegment, PointMarker, RenderLayer, RenderableSink};

/// Orbit color when no path color parameter is loaded.
pub const TRAJECTORY_COLOR: [f32; 4] = [0.95, 0.85, 0.35, 1.0];
const SPACECRAFT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const GROUND_TRACK_COLOR: [f32; 4] = [0.2, 0.9, 0.4, 1.0];
const SUBSOLAR_COLOR: [f32; 4] = [1.0, 0.6, 0.1, 1.0];
const SUN_COLOR: [f32; 4] = [1.0, 0.95, 0.6, 1.0];

const SPACECRAFT_RADIUS_M: f64 = 60_000.0;
const MARKER_RADIUS_M: f64 = 40_000.0;
const SUN_RADIUS_M: f64 = 250_000.0;

/// One segment per consecutive pair of trajectory points, colored by the starting point.
pub fn trajectory_segments(trajectory: &[DVec3], colors: &[[f32; 4]]) -> Vec<LineSegment> {
    trajectory
        .windows(2)
        .enumerate()
        .map(|(i, pair)| LineSegment {
            start: pair[0],
            end: pair[1],
            color: colors.get(i).copied().unwrap_or(TRAJECTORY_COLOR),
        })
        .collect()
}

/// Surface markers at `time`: ground track, sub-solar point and the sun direction.
pub fn surface_markers(
    products: &EphemerisProducts,
    time: DateTime<Utc>,
    session: &Session,
    sun_marker_distance_m: f64,
) -> Vec<PointMarker> {
    let mut points = Vec::with_capacity(3);
    if session.show_ground_track
        && let Some(position) = products.ground_track.value_at(time)
    {
        points.push(PointMarker {
            position,
            radius_m: MARKER_RADIUS_M,
            color: GROUND_TRACK_COLOR,
        });
    }
    if session.show_subsolar
        && let Some(position) = products.subsolar.value_at(time)
    {
        points.push(PointMarker {
            position,
            radius_m: MARKER_RADIUS_M,
            color: SUBSOLAR_COLOR,
        });
    }
    if let Some(sun) = products.solar_positions.value_at(time) {
        let direction = sun.normalize_or_zero();
        if direction != DVec3::ZERO {
            points.push(PointMarker {
                position: direction * sun_marker_distance_m,
                radius_m: SUN_RADIUS_M,
                color: SUN_COLOR,
            });
        }
    }
    points
}

/// Redraw the orbit when the ephemeris or its coloring changes.
pub fn rebuild_trajectory(
    ephemeris: Res<EphemerisState>,
    path_color: Res<PathColorState>,
    mut sink: ResMut<GizmoSink>,
) {
    if !ephemeris.is_changed() && !path_color.is_changed() {
        return;
    }
    match &ephemeris.products {
        Some(products) => {
            let segments = trajectory_segments(&products.trajectory, &path_color.colors);
            debug!("trajectory: {} segments", segments.len());
            sink.replace_segments(RenderLayer::Trajectory, segments);
        }
        None => sink.clear(RenderLayer::Trajectory),
    }
}

/// Per-tick spacecraft and surface markers.
pub fn update_markers(
    sim_time: Res<SimulationTime>,
    ephemeris: Res<EphemerisState>,
    session: Res<Session>,
    config: Res<VizConfig>,
    mut sink: ResMut<GizmoSink>,
) {
    let Some(products) = &ephemeris.products else {
        sink.clear(RenderLayer::Spacecraft);
        sink.clear(RenderLayer::Surface);
        return;
    };
    let now = sim_time.current_utc;

    let spacecraft = products
        .positions
        .value_at(now)
        .map(|position| PointMarker {
            position,
            radius_m: SPACECRAFT_RADIUS_M,
            color: SPACECRAFT_COLOR,
        });
    sink.replace_points(RenderLayer::Spacecraft, spacecraft.into_iter().collect());
    sink.replace_points(
        RenderLayer::Surface,
        surface_markers(products, now, &session, config.render.sun_marker_distance_m),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{InterpolationPolicy, SampleSeries};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn t(sec: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap() + Duration::seconds(sec)
    }

    #[test]
    fn segments_follow_path_colors() {
        let points = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let colors = [[0.0; 4], [0.5; 4], [1.0; 4]];
        let segments = trajectory_segments(&points, &colors);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].start, DVec3::X);
        assert_eq!(segments[1].color, [0.5; 4]);
    }

    #[test]
    fn uncolored_path_uses_default() {
        let points = [DVec3::ZERO, DVec3::X];
        let segments = trajectory_segments(&points, &[]);
        assert_eq!(segments[0].color, TRAJECTORY_COLOR);
        assert!(trajectory_segments(&points[..1], &[]).is_empty());
    }

    #[test]
    fn markers_respect_toggles() {
        let mut products = EphemerisProducts::default();
        let mut series = SampleSeries::new(InterpolationPolicy::Hold);
        series.add_sample(t(0), DVec3::X).unwrap();
        products.ground_track = series.clone();
        products.subsolar = series.clone();
        series = SampleSeries::new(InterpolationPolicy::Linear);
        series.add_sample(t(0), DVec3::new(0.0, 2e9, 0.0)).unwrap();
        products.solar_positions = series;

        let mut session = Session::new(NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(), Default::default());
        let all = surface_markers(&products, t(0), &session, 1e7);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].position, DVec3::new(0.0, 1e7, 0.0));

        session.show_ground_track = false;
        session.show_subsolar = false;
        let sun_only = surface_markers(&products, t(0), &session, 1e7);
        assert_eq!(sun_only.len(), 1);
    }
}
