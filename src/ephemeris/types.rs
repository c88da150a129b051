//! Ephemeris rows and the derived time series.

use bevy::math::DVec3;
use bevy::prelude::*;
use chrono::{DateTime, Utc};

use crate::datasource::parse_timestamp;
use crate::error::PipelineError;
use crate::frames::ReferenceFrame;
use crate::readiness::Generation;
use crate::series::SampleSeries;

/// One raw ephemeris record, in the column order of the spice key-parameter dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct EphemerisRow {
    pub time: DateTime<Utc>,
    pub solar_longitude_deg: f64,
    pub sun_distance_au: f64,
    pub spacecraft_altitude_km: f64,
    pub spacecraft_lat_deg: f64,
    pub spacecraft_lon_deg: f64,
    pub solar_zenith_angle_deg: f64,
    pub subsolar_lat_deg: f64,
    pub subsolar_lon_deg: f64,
}

impl EphemerisRow {
    pub const COLUMNS: usize = 9;

    /// Parse the cells of row `index`.
    pub fn from_cells(index: usize, cells: &[String]) -> Result<Self, PipelineError> {
        if cells.len() < Self::COLUMNS {
            return Err(PipelineError::MalformedRow {
                index,
                reason: format!("expected {} columns, got {}", Self::COLUMNS, cells.len()),
            });
        }
        let time = parse_timestamp(&cells[0]).ok_or_else(|| PipelineError::MalformedRow {
            index,
            reason: format!("bad timestamp {:?}", cells[0]),
        })?;
        let num = |column: usize| parse_number(index, column, &cells[column]);

        Ok(Self {
            time,
            solar_longitude_deg: num(1)?,
            sun_distance_au: num(2)?,
            spacecraft_altitude_km: num(3)?,
            spacecraft_lat_deg: num(4)?,
            spacecraft_lon_deg: num(5)?,
            solar_zenith_angle_deg: num(6)?,
            subsolar_lat_deg: num(7)?,
            subsolar_lon_deg: num(8)?,
        })
    }
}

/// Numeric cell, or a `MalformedRow` naming the column.
pub fn parse_number(index: usize, column: usize, cell: &str) -> Result<f64, PipelineError> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PipelineError::MalformedRow {
            index,
            reason: format!("column {column}: not a number: {cell:?}"),
        })
}

/// Everything derived from one ingestion pass.
#[derive(Debug, Clone, Default)]
pub struct EphemerisProducts {
    pub frame: ReferenceFrame,
    pub epochs: Vec<DateTime<Utc>>,
    /// Spacecraft positions in insertion order, in `frame`.
    pub trajectory: Vec<DVec3>,
    pub positions: SampleSeries<DVec3>,
    pub ground_track: SampleSeries<DVec3>,
    pub solar_positions: SampleSeries<DVec3>,
    pub subsolar: SampleSeries<DVec3>,
    pub opposite_hemisphere: SampleSeries<DVec3>,
    pub solar_zenith_angles: SampleSeries<f64>,
    pub mean_solar_longitude: f64,
    /// Samples transformed with the identity fallback.
    pub degraded_samples: usize,
    /// Rows dropped because they went back in time.
    pub skipped_rows: usize,
}

/// Raw rows of the current date range plus the products derived from them.
///
/// The rows are kept so that a frame change can re-derive locally without a new fetch.
#[derive(Resource, Default)]
pub struct EphemerisState {
    pub generation: Option<Generation>,
    pub rows: Vec<EphemerisRow>,
    pub products: Option<EphemerisProducts>,
}
