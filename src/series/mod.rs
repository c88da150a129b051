//! Time-indexed sample storage with per-series interpolation

pub mod interpolate;
pub mod store;

pub use interpolate::Interpolate;
pub use store::{InterpolationPolicy, SampleSeries, TimeSample, seconds_between};
