//! Whisker rows, intermediate vectors and the renderable result.

use bevy::math::DVec3;
use bevy::prelude::*;
use chrono::{DateTime, Utc};

use crate::datasource::{WhiskerParameter, parse_timestamp};
use crate::ephemeris::types::parse_number;
use crate::error::PipelineError;
use crate::frames::ReferenceFrame;
use crate::readiness::Generation;
use crate::visualization::sink::LineSegment;

/// One row of a 3D parameter dataset: `time, x, y, z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiskerRow {
    pub time: DateTime<Utc>,
    pub vector: DVec3,
}

impl WhiskerRow {
    pub fn from_cells(index: usize, cells: &[String]) -> Result<Self, PipelineError> {
        if cells.len() < 4 {
            return Err(PipelineError::MalformedRow {
                index,
                reason: format!("expected 4 columns, got {}", cells.len()),
            });
        }
        let time = parse_timestamp(&cells[0]).ok_or_else(|| PipelineError::MalformedRow {
            index,
            reason: format!("bad timestamp {:?}", cells[0]),
        })?;
        Ok(Self {
            time,
            vector: DVec3::new(
                parse_number(index, 1, &cells[1])?,
                parse_number(index, 2, &cells[2])?,
                parse_number(index, 3, &cells[3])?,
            ),
        })
    }
}

/// A row after orientation and log compression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiskerVector {
    pub time: DateTime<Utc>,
    /// Oriented and compressed.
    pub vector: DVec3,
    pub magnitude: f64,
}

/// Output of one whisker transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderableVectorSet {
    pub segments: Vec<LineSegment>,
    /// Rows selected by the stride.
    pub candidates: usize,
    pub skipped_malformed: usize,
    pub skipped_missing_matrix: usize,
    pub skipped_missing_position: usize,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
}

impl RenderableVectorSet {
    pub fn skipped(&self) -> usize {
        self.skipped_missing_matrix + self.skipped_missing_position
    }
}

/// Inputs a whisker set was derived from; a mismatch means the set is out of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhiskerSource {
    pub ephemeris: Generation,
    pub whiskers: Generation,
    pub frame_matrix: Option<Generation>,
    pub frame: ReferenceFrame,
}

#[derive(Resource, Default)]
pub struct WhiskerState {
    pub parameter: WhiskerParameter,
    /// Raw cells of the current generation, parsed at transform time.
    pub rows: Vec<Vec<String>>,
    pub derived_from: Option<WhiskerSource>,
}
