//! Ephemeris ingestion: spacecraft trajectory, surface markers and solar geometry.

use bevy::prelude::*;

pub mod ingest;
pub mod path_color;
pub mod systems;
pub mod types;

pub use ingest::EphemerisIngest;
pub use path_color::PathColorState;
pub use types::{EphemerisProducts, EphemerisRow, EphemerisState};

pub struct EphemerisPlugin;

impl Plugin for EphemerisPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EphemerisState>()
            .init_resource::<PathColorState>();
    }
}
