//! Vector rows -> oriented, log-compressed, colored line segments along the trajectory.

use bevy::math::{DMat3, DVec3};
use bevy::prelude::*;

use crate::config::WhiskerConfig;
use crate::error::PipelineError;
use crate::frames::{FrameProvider, ReferenceFrame};
use crate::series::SampleSeries;
use crate::visualization::colormaps::ColorMapper;
use crate::visualization::sink::LineSegment;
use crate::whiskers::types::{RenderableVectorSet, WhiskerRow, WhiskerVector};

/// `v * log10(|v| + 1) / |v|`; the zero vector maps to itself.
///
/// The direction is taken from the largest component so huge finite inputs keep their length.
/// Only a magnitude beyond `f64::MAX` comes back non-finite.
pub fn compress(v: DVec3) -> DVec3 {
    let scale = v.abs().max_element();
    if scale == 0.0 {
        return DVec3::ZERO;
    }
    let unit = v / scale;
    let magnitude = scale * unit.length();
    unit * ((magnitude + 1.0).log10() / unit.length())
}

/// Indices kept by the stride: `0, N, 2N, ...`, i.e. `ceil(len / N)` of them.
pub fn stride_indices(len: usize, stride: usize) -> impl Iterator<Item = usize> {
    (0..len).step_by(stride.max(1))
}

/// Displayed length for a compressed magnitude within `[min, max]`.
pub fn whisker_length(magnitude: f64, min: f64, max: f64, max_length_m: f64) -> f64 {
    if magnitude == 0.0 {
        return 0.0;
    }
    let span = max - min;
    if span <= 0.0 {
        return max_length_m;
    }
    (magnitude - min) / span * max_length_m
}

/// Everything a whisker transform reads.
pub struct WhiskerInputs<'a> {
    pub frame: ReferenceFrame,
    /// MSO->fixed, index-aligned with `rows`.
    pub matrices: &'a [Option<DMat3>],
    /// Spacecraft positions in `frame`.
    pub positions: &'a SampleSeries<DVec3>,
    pub provider: &'a dyn FrameProvider,
    pub mapper: &'a dyn ColorMapper,
    pub config: &'a WhiskerConfig,
}

/// Orient and compress every row, then emit segments for the stride-selected ones.
///
/// Segments are anchored at the body-fixed spacecraft position so they can be re-oriented
/// with the planet at render time.
pub fn transform(rows: &[Vec<String>], inputs: &WhiskerInputs) -> RenderableVectorSet {
    let mut out = RenderableVectorSet::default();

    let mut vectors: Vec<Option<WhiskerVector>> = Vec::with_capacity(rows.len());
    for (index, cells) in rows.iter().enumerate() {
        let vector = orient(index, cells, inputs).and_then(|row| {
            let vector = compress(row.vector);
            if !vector.is_finite() {
                return Err(PipelineError::MalformedRow {
                    index,
                    reason: format!("vector {} is out of range", row.vector),
                });
            }
            Ok(WhiskerVector {
                time: row.time,
                vector,
                magnitude: vector.length(),
            })
        });
        match vector {
            Ok(v) => vectors.push(Some(v)),
            Err(err @ PipelineError::MissingFrameMatrix { .. }) => {
                debug!("whisker row {index} skipped: {err}");
                out.skipped_missing_matrix += 1;
                vectors.push(None);
            }
            Err(err) => {
                debug!("whisker {err}");
                out.skipped_malformed += 1;
                vectors.push(None);
            }
        }
    }

    let (min, max) = vectors
        .iter()
        .flatten()
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| {
            (lo.min(v.magnitude), hi.max(v.magnitude))
        });
    if min > max {
        return out;
    }
    out.min_magnitude = min;
    out.max_magnitude = max;

    for index in stride_indices(vectors.len(), inputs.config.stride) {
        out.candidates += 1;
        let Some(v) = vectors[index] else {
            continue;
        };

        let Some(position) = inputs.positions.value_at(v.time) else {
            out.skipped_missing_position += 1;
            continue;
        };
        let anchor = match inputs.frame {
            ReferenceFrame::BodyFixed => position,
            ReferenceFrame::Inertial => match inputs.provider.inertial_to_fixed(v.time) {
                Some(to_fixed) => to_fixed * position,
                None => {
                    debug!(
                        "whisker row {index} skipped: {}",
                        PipelineError::MissingFrameMatrix { time: v.time }
                    );
                    out.skipped_missing_matrix += 1;
                    continue;
                }
            },
        };

        let length = whisker_length(v.magnitude, min, max, inputs.config.max_length_m);
        let direction = v.vector.normalize_or_zero();
        let mut color = inputs
            .mapper
            .interpolate(v.magnitude, min, max, inputs.config.palette);
        color[3] = inputs.config.alpha;

        out.segments.push(LineSegment {
            start: anchor,
            end: anchor + direction * length,
            color,
        });
    }

    if out.skipped() + out.skipped_malformed > 0 {
        warn!(
            "whiskers: {} malformed rows, {} of {} candidates without frame or position",
            out.skipped_malformed,
            out.skipped(),
            out.candidates
        );
    }
    out
}

/// Parse row `index` and rotate it into the body-fixed frame when that frame is selected.
fn orient(
    index: usize,
    cells: &[String],
    inputs: &WhiskerInputs,
) -> Result<WhiskerRow, PipelineError> {
    let mut row = WhiskerRow::from_cells(index, cells)?;
    if inputs.frame == ReferenceFrame::BodyFixed {
        let matrix = inputs
            .matrices
            .get(index)
            .copied()
            .flatten()
            .ok_or(PipelineError::MissingFrameMatrix { time: row.time })?;
        row.vector = matrix * row.vector;
    }
    Ok(row)
}
