//! Simulation clock, looped over the selected date range.

use bevy::prelude::*;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::session::Session;

/// Simulation time resource
#[derive(Resource)]
pub struct SimulationTime {
    pub current_utc: DateTime<Utc>,
    /// Simulated seconds per real second.
    pub time_scale: f32,
}

impl SimulationTime {
    pub fn new(day: NaiveDate, time_scale: f32) -> Self {
        Self {
            current_utc: day_start(day),
            time_scale,
        }
    }
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self {
            current_utc: Utc::now(),
            time_scale: 1.0,
        }
    }
}

pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// `[start, start + 1 day)` for `day`.
pub fn day_window(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day_start(day);
    (start, start + Duration::days(1))
}

/// Step `current` by `delta_secs * scale`, wrapping back to the start of the window at its end.
pub fn advance(
    current: DateTime<Utc>,
    delta_secs: f32,
    scale: f32,
    window: (DateTime<Utc>, DateTime<Utc>),
) -> DateTime<Utc> {
    let (start, end) = window;
    let scaled = f64::from((delta_secs * scale).max(0.0));
    let step = Duration::nanoseconds((scaled * 1_000_000_000.0) as i64);
    let mut next = current + step;

    if next < start || end <= start {
        return start;
    }
    if next >= end {
        let span = (end - start).num_nanoseconds().unwrap_or(i64::MAX);
        let over = (next - start).num_nanoseconds().unwrap_or(0);
        next = start + Duration::nanoseconds(over.rem_euclid(span));
    }
    next
}

/// System to advance simulation UTC by scale
pub fn advance_simulation_clock(
    time: Res<Time>,
    session: Res<Session>,
    mut sim_time: ResMut<SimulationTime>,
) {
    if session.paused {
        return;
    }
    let next = advance(
        sim_time.current_utc,
        time.delta_secs(),
        sim_time.time_scale,
        day_window(session.day),
    );
    if next != sim_time.current_utc {
        sim_time.current_utc = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 6, 1).unwrap()
    }

    #[test]
    fn test_simulation_time_starts_at_day() {
        let sim_time = SimulationTime::new(day(), 600.0);
        assert_eq!(sim_time.time_scale, 600.0);
        assert_eq!(sim_time.current_utc.to_rfc3339(), "2019-06-01T00:00:00+00:00");
    }

    #[test]
    fn test_advance_scales_delta() {
        let window = day_window(day());
        let next = advance(window.0, 0.5, 600.0, window);
        assert_eq!(next - window.0, Duration::seconds(300));
    }

    #[test]
    fn test_advance_wraps_at_end_of_day() {
        let window = day_window(day());
        let near_end = window.1 - Duration::seconds(10);
        let next = advance(near_end, 1.0, 30.0, window);
        assert_eq!(next, window.0 + Duration::seconds(20));
    }

    #[test]
    fn test_outside_window_snaps_to_start() {
        let window = day_window(day());
        let earlier = window.0 - Duration::days(3);
        assert_eq!(advance(earlier, 0.1, 1.0, window), window.0);
    }
}
