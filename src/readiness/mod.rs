//! Readiness and staleness tracking for asynchronously arriving inputs.
//!
//! Every request for an input is stamped with a fresh [`Generation`]. Only a result carrying the
//! input's current generation can move it to `Ready`; anything older is rejected so a slow fetch
//! for yesterday's date range can never overwrite today's data.

use std::collections::HashMap;
use std::fmt;

use bevy::prelude::*;

use crate::error::PipelineError;

/// Monotonic request tag. Generations are global, so a value never repeats across inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inputs the pipeline waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Ephemeris,
    FrameMatrix,
    Whiskers,
    Model,
    PathColor,
}

impl InputKind {
    pub const ALL: [InputKind; 5] = [
        InputKind::Ephemeris,
        InputKind::FrameMatrix,
        InputKind::Whiskers,
        InputKind::Model,
        InputKind::PathColor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            InputKind::Ephemeris => "ephemeris",
            InputKind::FrameMatrix => "frame matrix",
            InputKind::Whiskers => "whiskers",
            InputKind::Model => "model",
            InputKind::PathColor => "path colour",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputState {
    #[default]
    Idle,
    Loading(Generation),
    Ready(Generation),
    Failed {
        generation: Generation,
        reason: String,
    },
}

impl InputState {
    pub fn generation(&self) -> Option<Generation> {
        match self {
            InputState::Idle => None,
            InputState::Loading(g) | InputState::Ready(g) => Some(*g),
            InputState::Failed { generation, .. } => Some(*generation),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, InputState::Ready(_))
    }
}

impl fmt::Display for InputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputState::Idle => write!(f, "idle"),
            InputState::Loading(g) => write!(f, "loading {g}"),
            InputState::Ready(g) => write!(f, "ready {g}"),
            InputState::Failed { generation, .. } => write!(f, "failed {generation}"),
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct ReadinessCoordinator {
    next: u64,
    states: HashMap<InputKind, InputState>,
}

impl ReadinessCoordinator {
    /// Start a new generation for `kind`, superseding whatever it was doing.
    pub fn begin(&mut self, kind: InputKind) -> Generation {
        self.next += 1;
        let generation = Generation(self.next);
        self.states.insert(kind, InputState::Loading(generation));
        info!("{} loading (generation {})", kind.label(), generation);
        generation
    }

    pub fn state(&self, kind: InputKind) -> &InputState {
        self.states.get(&kind).unwrap_or(&InputState::Idle)
    }

    pub fn current(&self, kind: InputKind) -> Option<Generation> {
        self.state(kind).generation()
    }

    pub fn is_ready(&self, kind: InputKind) -> bool {
        self.state(kind).is_ready()
    }

    /// Generation `kind` is ready at, if it is ready.
    pub fn ready_generation(&self, kind: InputKind) -> Option<Generation> {
        match self.state(kind) {
            InputState::Ready(g) => Some(*g),
            _ => None,
        }
    }

    fn check_current(&self, kind: InputKind, generation: Generation) -> Result<(), PipelineError> {
        match self.state(kind) {
            InputState::Loading(g) if *g == generation => Ok(()),
            other => Err(PipelineError::StaleGenerationResult {
                kind,
                generation,
                current: other.generation(),
            }),
        }
    }

    /// `Loading(g) -> Ready(g)`. Any other state or generation is a stale result.
    pub fn complete(&mut self, kind: InputKind, generation: Generation) -> Result<(), PipelineError> {
        self.check_current(kind, generation)?;
        self.states.insert(kind, InputState::Ready(generation));
        info!("{} ready (generation {})", kind.label(), generation);
        Ok(())
    }

    /// `Loading(g) -> Failed(g)`; stale failures are rejected like stale results.
    pub fn fail(
        &mut self,
        kind: InputKind,
        generation: Generation,
        reason: impl Into<String>,
    ) -> Result<(), PipelineError> {
        self.check_current(kind, generation)?;
        let reason = reason.into();
        warn!("{} failed (generation {}): {}", kind.label(), generation, reason);
        self.states.insert(kind, InputState::Failed { generation, reason });
        Ok(())
    }

    /// Drop `kind` back to `Idle`. Results still in flight become stale.
    pub fn reset(&mut self, kind: InputKind) {
        self.states.remove(&kind);
    }

    pub fn all_ready(&self, inputs: &[InputKind]) -> bool {
        inputs.iter().all(|kind| self.is_ready(*kind))
    }

    /// First failure among `inputs`, for status display.
    pub fn first_failure(&self, inputs: &[InputKind]) -> Option<(InputKind, &str)> {
        inputs.iter().find_map(|kind| match self.state(*kind) {
            InputState::Failed { reason, .. } => Some((*kind, reason.as_str())),
            _ => None,
        })
    }

    pub fn snapshot(&self) -> Vec<(InputKind, InputState)> {
        InputKind::ALL
            .iter()
            .map(|kind| (*kind, self.state(*kind).clone()))
            .collect()
    }
}

/// Log the pipeline status whenever an input changes state.
pub fn report_readiness(coordinator: Res<ReadinessCoordinator>) {
    if !coordinator.is_changed() {
        return;
    }
    let status: Vec<String> = coordinator
        .snapshot()
        .into_iter()
        .map(|(kind, state)| format!("{}={}", kind.label(), state))
        .collect();
    debug!("inputs: {}", status.join(", "));
}
