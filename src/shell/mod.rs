//! Atmospheric model shell drawn around the planet and rotated to match observed illumination.

use bevy::prelude::*;

pub mod model;
pub mod rotation;
pub mod systems;

pub use model::{ModelState, ShellGrid, model_season};
pub use rotation::{RotationBasis, compute_rotation};

pub struct ShellPlugin;

impl Plugin for ShellPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelState>()
            .init_resource::<systems::ShellRenderState>();
    }
}
