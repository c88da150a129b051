use bevy::prelude::*;

use crate::config::VizConfig;
use crate::ephemeris::EphemerisState;
use crate::frames::{FrameTransformer, PreloadedFrames, ReferenceFrame};
use crate::readiness::{InputKind, ReadinessCoordinator};
use crate::visualization::colormaps::PaletteMapper;
use crate::visualization::sink::{GizmoSink, RenderLayer, RenderableSink};
use crate::whiskers::matrices::FrameMatrixState;
use crate::whiskers::transform::{WhiskerInputs, transform};
use crate::whiskers::types::{WhiskerSource, WhiskerState};

/// The inputs a whisker set would be built from right now, or `None` while any is not ready.
pub fn whisker_source(
    coordinator: &ReadinessCoordinator,
    frame: ReferenceFrame,
) -> Option<WhiskerSource> {
    let frame_matrix = match frame {
        ReferenceFrame::BodyFixed => Some(coordinator.ready_generation(InputKind::FrameMatrix)?),
        ReferenceFrame::Inertial => None,
    };
    Some(WhiskerSource {
        ephemeris: coordinator.ready_generation(InputKind::Ephemeris)?,
        whiskers: coordinator.ready_generation(InputKind::Whiskers)?,
        frame_matrix,
        frame,
    })
}

/// Rebuild the whisker layer whenever the set of inputs it depends on changes.
#[allow(clippy::too_many_arguments)]
pub fn rebuild_whiskers(
    coordinator: Res<ReadinessCoordinator>,
    transformer: Res<FrameTransformer>,
    frames: Res<PreloadedFrames>,
    ephemeris: Res<EphemerisState>,
    matrices: Res<FrameMatrixState>,
    mapper: Res<PaletteMapper>,
    config: Res<VizConfig>,
    mut whiskers: ResMut<WhiskerState>,
    mut sink: ResMut<GizmoSink>,
) {
    let source = whisker_source(&coordinator, transformer.frame());
    if source == whiskers.derived_from {
        return;
    }

    let (Some(source), Some(products)) = (source, ephemeris.products.as_ref()) else {
        // inputs moved on; drop whiskers that belong to the previous ones
        if whiskers.derived_from.take().is_some() {
            sink.clear(RenderLayer::Whiskers);
        }
        return;
    };
    if products.frame != source.frame {
        return;
    }

    let set = transform(
        &whiskers.rows,
        &WhiskerInputs {
            frame: source.frame,
            matrices: &matrices.mso_to_fixed,
            positions: &products.positions,
            provider: &*frames,
            mapper: &*mapper,
            config: &config.whiskers,
        },
    );
    info!(
        "whiskers ({}, {}): {} segments from {} rows, {} skipped, |v| {:.3}..{:.3}",
        whiskers.parameter.label(),
        source.frame.label(),
        set.segments.len(),
        whiskers.rows.len(),
        set.skipped() + set.skipped_malformed,
        set.min_magnitude,
        set.max_magnitude,
    );

    sink.replace_segments(RenderLayer::Whiskers, set.segments);
    whiskers.derived_from = Some(source);
}
