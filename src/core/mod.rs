//! Shared coordinate and world-space helpers.

pub mod coordinates;
pub mod space;

pub use coordinates::{Ellipsoid, Geodetic, MARS_RADIUS_M, days_since_j2000};
pub use space::{fixed_to_world, matrix_to_world, rotation_to_world, world_to_fixed};
