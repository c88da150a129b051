//! Vector whiskers: 3D parameter samples drawn as short lines along the orbit.

use bevy::prelude::*;

pub mod matrices;
pub mod systems;
pub mod transform;
pub mod types;

pub use matrices::{FrameMatrixState, parse_matrix_table};
pub use types::{RenderableVectorSet, WhiskerState};

pub struct WhiskerPlugin;

impl Plugin for WhiskerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WhiskerState>()
            .init_resource::<FrameMatrixState>();
    }
}
