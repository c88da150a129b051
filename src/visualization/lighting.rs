//! Lighting configuration systems

use bevy::prelude::*;

use crate::core::fixed_to_world;
use crate::ephemeris::EphemerisState;
use crate::time::SimulationTime;
use crate::visualization::BodyOrientation;

/// Marker component for the sun directional light
#[derive(Component)]
pub struct SunLight;

/// Distance doesn't affect a DirectionalLight, it only keeps the transform readable.
const LIGHT_DISTANCE: f32 = 150_000.0;

/// Travel direction of sunlight in world space, from the body-fixed anti-solar point.
pub fn light_direction(opposite_hemisphere: bevy::math::DVec3, orientation: Quat) -> Option<Vec3> {
    let dir = orientation * fixed_to_world(opposite_hemisphere, 1.0).normalize_or_zero();
    (dir.length_squared() > 0.0).then_some(dir)
}

/// Point the sun light from the sub-solar side towards the opposite hemisphere.
pub fn update_sun_light_direction(
    sim_time: Res<SimulationTime>,
    ephemeris: Res<EphemerisState>,
    orientation: Res<BodyOrientation>,
    mut lights: Query<&mut Transform, With<SunLight>>,
) {
    let Some(products) = &ephemeris.products else {
        return;
    };
    let Some(dir) = products
        .opposite_hemisphere
        .value_at(sim_time.current_utc)
        .and_then(|p| light_direction(p, orientation.world))
    else {
        return;
    };

    for mut transform in lights.iter_mut() {
        // -Z (the light's forward) ends up along `dir`
        transform.translation = -dir * LIGHT_DISTANCE;
        transform.look_at(Vec3::ZERO, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::DVec3;

    #[test]
    fn light_travels_towards_the_night_side() {
        // anti-solar point on the prime meridian: the sun is at lon 180
        let dir = light_direction(DVec3::new(3_396_000.0, 0.0, 0.0), Quat::IDENTITY).unwrap();
        assert!((dir - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn follows_body_orientation() {
        let spin = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let dir = light_direction(DVec3::X, spin).unwrap();
        assert!((dir - Vec3::X).length() < 1e-6);
        assert!(light_direction(DVec3::ZERO, spin).is_none());
    }
}
