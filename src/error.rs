//! Error taxonomy for the ephemeris pipeline

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::readiness::{Generation, InputKind};

/// Errors raised by the sample store, ingestion, whisker transform and readiness tracking.
///
/// Per-sample errors (`MissingFrameMatrix`) are recovered by skipping the sample;
/// generation-wide errors (`EmptyDataset`, `MalformedRow`) end up as a failed readiness state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("sample at {time} precedes last sample at {last}")]
    OutOfOrderSample {
        time: DateTime<Utc>,
        last: DateTime<Utc>,
    },
    #[error("no rows for the selected range")]
    EmptyDataset,
    #[error("row {index}: {reason}")]
    MalformedRow { index: usize, reason: String },
    #[error("no frame matrix available at {time}")]
    MissingFrameMatrix { time: DateTime<Utc> },
    #[error("{kind:?} result for generation {generation} superseded (current: {current:?})")]
    StaleGenerationResult {
        kind: InputKind,
        generation: Generation,
        current: Option<Generation>,
    },
}
