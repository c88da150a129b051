// Inspired by https://blog.graysonhead.net/posts/bevy-proc-earth-1/

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::picking::prelude::*;
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};

use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

#[cfg(feature = "dev")]
use bevy::dev_tools::fps_overlay::FpsOverlayPlugin;

mod config;
mod controls;
mod core;
mod datasource;
mod ephemeris;
mod error;
mod frames;
mod readiness;
mod series;
mod session;
mod shell;
mod time;
mod visualization;
mod whiskers;

use config::VizConfig;
use ephemeris::EphemerisPlugin;
use frames::{FrameTransformer, PreloadedFrames};
use readiness::ReadinessCoordinator;
use session::{Session, SessionPlugin};
use shell::ShellPlugin;
use time::SimulationTime;
use visualization::{SunLight, VisualizationPlugin};
use whiskers::WhiskerPlugin;

// Setup scene and cameras
pub fn setup(mut commands: Commands, config: Res<VizConfig>) {
    // Keep the night side readable.
    commands.insert_resource(GlobalAmbientLight {
        brightness: 150.0,
        ..default()
    });

    // ~4.5 planet radii
    let initial_distance =
        (config.ellipsoid.equatorial_radius_m * 4.5 * config.render.world_units_per_meter) as f32;

    let pan_orbit = PanOrbitCamera {
        focus: Vec3::ZERO,
        radius: Some(initial_distance),
        yaw: Some(0.0),
        pitch: Some(0.0),
        force_update: true,
        ..default()
    };

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            // the sun marker sits far outside the orbit
            near: 1.0,
            far: 250_000.0,
            ..default()
        }),
        Camera {
            order: 0,
            clear_color: ClearColorConfig::Custom(Color::BLACK),
            ..default()
        },
        pan_orbit,
        Tonemapping::TonyMcMapface,
        Transform::from_xyz(0.0, 0.0, initial_distance).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Re-aimed every frame once an ephemeris is loaded.
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            ..default()
        },
        SunLight,
        Transform::from_xyz(0.0, 0.0, 150_000.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn main() -> anyhow::Result<()> {
    let config = VizConfig::load()?;
    let session = Session::new(config.initial_date, config.initial_frame);
    let transformer = FrameTransformer::new(config.initial_frame, config.ellipsoid);
    let sim_time = SimulationTime::new(config.initial_date, config.time_scale);

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "MAVEN Mars Visualizer".to_string(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }));

    #[cfg(feature = "dev")]
    app.add_plugins(FpsOverlayPlugin::default());

    app.add_plugins(PanOrbitCameraPlugin);
    app.add_plugins(MeshPickingPlugin);

    app.insert_resource(config)
        .insert_resource(session)
        .insert_resource(transformer)
        .insert_resource(sim_time)
        .init_resource::<PreloadedFrames>()
        .init_resource::<ReadinessCoordinator>();

    app.add_plugins(SessionPlugin);
    app.add_plugins(EphemerisPlugin);
    app.add_plugins(WhiskerPlugin);
    app.add_plugins(ShellPlugin);
    app.add_plugins(VisualizationPlugin);

    app.add_systems(
        Startup,
        (
            setup,
            datasource::setup_data_worker,
            controls::log_bindings,
            session::pipeline::queue_initial_load,
        ),
    );
    app.add_systems(
        Update,
        (
            controls::keyboard_commands,
            session::pipeline::apply_session_commands,
            session::pipeline::receive_fetch_results,
            readiness::report_readiness,
            time::advance_simulation_clock,
            visualization::update_body_orientation,
            whiskers::systems::rebuild_whiskers,
            ephemeris::systems::rebuild_trajectory,
            ephemeris::systems::update_markers,
            shell::systems::update_shell_texture,
            shell::systems::orient_shell,
            visualization::globe::sync_mars_orientation,
            visualization::lighting::update_sun_light_direction,
            visualization::sink::draw_sink_layers,
        )
            .chain(),
    );

    app.run();
    Ok(())
}
