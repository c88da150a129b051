//! Visualization module
//!
//! Planet, model shell texture target, lighting and the gizmo sink the pipeline hands its
//! geometry to.

use bevy::prelude::*;

use crate::core::matrix_to_world;
use crate::frames::{FrameProvider, FrameQuality, FrameTransformer, PreloadedFrames, ReferenceFrame};
use crate::time::SimulationTime;

pub mod colormaps;
pub mod globe;
pub mod lighting;
pub mod sink;

pub use colormaps::PaletteMapper;
pub use globe::{GlobeMesh, MarsBody};
pub use lighting::SunLight;
pub use sink::GizmoSink;

/// World-space orientation of the planet at the current simulation time.
///
/// Identity in the body-fixed frame. In the inertial frame it is `fixed_to_inertial(now)`,
/// falling back to identity (degraded) outside the preloaded window.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct BodyOrientation {
    pub world: Quat,
    pub quality: FrameQuality,
}

impl Default for BodyOrientation {
    fn default() -> Self {
        Self {
            world: Quat::IDENTITY,
            quality: FrameQuality::Exact,
        }
    }
}

pub fn body_orientation(
    frame: ReferenceFrame,
    provider: &dyn FrameProvider,
    time: chrono::DateTime<chrono::Utc>,
) -> BodyOrientation {
    match frame {
        ReferenceFrame::BodyFixed => BodyOrientation::default(),
        ReferenceFrame::Inertial => match provider.fixed_to_inertial(time) {
            Some(m) => BodyOrientation {
                world: matrix_to_world(m),
                quality: FrameQuality::Exact,
            },
            None => BodyOrientation {
                world: Quat::IDENTITY,
                quality: FrameQuality::Degraded,
            },
        },
    }
}

pub fn update_body_orientation(
    sim_time: Res<SimulationTime>,
    transformer: Res<FrameTransformer>,
    frames: Res<PreloadedFrames>,
    mut orientation: ResMut<BodyOrientation>,
) {
    let next = body_orientation(transformer.frame(), &*frames, sim_time.current_utc);
    if next.quality == FrameQuality::Degraded && orientation.quality != FrameQuality::Degraded {
        warn!(
            "no frame matrix at {}, planet drawn unrotated",
            sim_time.current_utc
        );
    }
    orientation.set_if_neq(next);
}

/// Plugin for visualization systems
pub struct VisualizationPlugin;

impl Plugin for VisualizationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BodyOrientation>()
            .init_resource::<GizmoSink>()
            .init_resource::<PaletteMapper>()
            .add_systems(Startup, globe::spawn_mars);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::provider::testing::{FixedFrames, NoFrames};
    use bevy::math::DMat3;
    use chrono::{TimeZone, Utc};

    #[test]
    fn body_fixed_is_identity() {
        let t = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        let spin = FixedFrames(DMat3::from_rotation_z(1.0));
        let o = body_orientation(ReferenceFrame::BodyFixed, &spin, t);
        assert_eq!(o, BodyOrientation::default());
    }

    #[test]
    fn inertial_follows_provider_or_degrades() {
        let t = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        let spin = FixedFrames(DMat3::from_rotation_z(1.0));
        let o = body_orientation(ReferenceFrame::Inertial, &spin, t);
        assert_eq!(o.quality, FrameQuality::Exact);
        // rotation about the body pole is rotation about world +Y
        let expected = Quat::from_rotation_y(1.0);
        assert!(o.world.angle_between(expected) < 1e-5);

        let none = body_orientation(ReferenceFrame::Inertial, &NoFrames, t);
        assert_eq!(none.quality, FrameQuality::Degraded);
        assert_eq!(none.world, Quat::IDENTITY);
    }
}
