//! Append-only, time-ordered sample container

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::series::Interpolate;

/// How a series answers queries that fall between two samples.
///
/// Trajectory and scalar series interpolate. Surface markers (ground track, sub-solar point)
/// default to `Hold`: the marker stays on the latest sample until the next one arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationPolicy {
    #[default]
    Linear,
    Hold,
}

/// One `(time, value)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSample<T> {
    pub time: DateTime<Utc>,
    pub value: T,
}

/// Samples ordered by non-decreasing time.
#[derive(Debug, Clone)]
pub struct SampleSeries<T> {
    samples: Vec<TimeSample<T>>,
    policy: InterpolationPolicy,
}

impl<T> Default for SampleSeries<T> {
    fn default() -> Self {
        Self::new(InterpolationPolicy::Linear)
    }
}

impl<T> SampleSeries<T> {
    pub fn new(policy: InterpolationPolicy) -> Self {
        Self {
            samples: Vec::new(),
            policy,
        }
    }

    pub fn with_capacity(policy: InterpolationPolicy, capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            policy,
        }
    }

    pub fn policy(&self) -> InterpolationPolicy {
        self.policy
    }

    /// Append a sample. Rejects samples older than the last one without touching the series.
    pub fn add_sample(&mut self, time: DateTime<Utc>, value: T) -> Result<(), PipelineError> {
        if let Some(last) = self.samples.last()
            && time < last.time
        {
            return Err(PipelineError::OutOfOrderSample {
                time,
                last: last.time,
            });
        }
        self.samples.push(TimeSample { time, value });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.time)
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.time)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSample<T>> {
        self.samples.iter()
    }

    pub fn times(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.samples.iter().map(|s| s.time)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.samples.iter().map(|s| &s.value)
    }
}

impl<T: Interpolate> SampleSeries<T> {
    /// Value of the series at `time`, or `None` when the series has nothing to say.
    ///
    /// Linear series return `None` outside `[first, last]`; hold series return `None`
    /// only before the first sample.
    pub fn value_at(&self, time: DateTime<Utc>) -> Option<T> {
        // index of the first sample strictly after `time`
        let after = self.samples.partition_point(|s| s.time <= time);
        if after == 0 {
            return None;
        }
        let before = &self.samples[after - 1];
        if before.time == time {
            return Some(before.value.clone());
        }

        match self.policy {
            InterpolationPolicy::Hold => Some(before.value.clone()),
            InterpolationPolicy::Linear => {
                let next = self.samples.get(after)?;
                let span = seconds_between(before.time, next.time);
                if span <= 0.0 {
                    return Some(before.value.clone());
                }
                let t = seconds_between(before.time, time) / span;
                Some(before.value.interpolate(&next.value, t))
            }
        }
    }
}

/// Signed seconds from `a` to `b`, keeping sub-millisecond precision.
pub fn seconds_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    let delta = b - a;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 * 1e-9,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}
