use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::config::VizConfig;
use crate::core::rotation_to_world;
use crate::ephemeris::EphemerisState;
use crate::frames::FrameTransformer;
use crate::readiness::{Generation, InputKind, ReadinessCoordinator};
use crate::shell::model::{ModelState, ShellGrid, model_subsolar_point, shell_radius_m};
use crate::shell::rotation::{RotationBasis, compute_rotation};
use crate::time::SimulationTime;
use crate::visualization::{BodyOrientation, GlobeMesh};

/// Marker for the model shell entity.
#[derive(Component)]
pub struct ModelShell;

#[derive(Resource, Default)]
pub struct ShellRenderState {
    pub image: Option<Handle<Image>>,
    pub material: Option<Handle<StandardMaterial>>,
    pub entity: Option<Entity>,
    /// Model generation currently uploaded to the texture.
    pub uploaded: Option<Generation>,
}

fn grid_image(grid: &ShellGrid) -> Image {
    Image::new(
        Extent3d {
            width: grid.width() as u32,
            height: grid.height() as u32,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        grid.rgba.clone(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    )
}

/// Upload a freshly built grid and show the shell once both the ephemeris and the model are
/// ready; hide it otherwise.
#[allow(clippy::too_many_arguments)]
pub fn update_shell_texture(
    mut commands: Commands,
    coordinator: Res<ReadinessCoordinator>,
    model: Res<ModelState>,
    globe: Option<Res<GlobeMesh>>,
    config: Res<VizConfig>,
    mut render_state: ResMut<ShellRenderState>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut shells: Query<&mut Visibility, With<ModelShell>>,
) {
    let Some(globe) = globe else { return };
    let ready = coordinator.all_ready(&[InputKind::Ephemeris, InputKind::Model]);

    if ready
        && render_state.uploaded != model.generation
        && let Some(grid) = &model.grid
    {
        let image = images.add(grid_image(grid));
        let existing = render_state
            .material
            .clone()
            .filter(|_| render_state.entity.is_some());
        match existing {
            Some(handle) => {
                if let Some(material) = materials.get_mut(&handle) {
                    material.base_color_texture = Some(image.clone());
                }
            }
            None => {
                let material = materials.add(StandardMaterial {
                    base_color_texture: Some(image.clone()),
                    alpha_mode: AlphaMode::Blend,
                    unlit: true,
                    cull_mode: None,
                    ..default()
                });
                let radius = (shell_radius_m(&config.shell, &config.ellipsoid)
                    * config.render.world_units_per_meter) as f32;
                let entity = commands
                    .spawn((
                        Mesh3d(globe.handle.clone()),
                        MeshMaterial3d(material.clone()),
                        Transform::from_scale(Vec3::splat(radius)),
                        Visibility::Visible,
                        ModelShell,
                        Name::new("Model Shell"),
                    ))
                    .id();
                render_state.material = Some(material);
                render_state.entity = Some(entity);
            }
        }
        if let Some(old) = render_state.image.replace(image) {
            images.remove(&old);
        }
        render_state.uploaded = model.generation;
        info!(
            "model shell: {}x{} grid, range {:.3e}..{:.3e}",
            grid.width(),
            grid.height(),
            grid.range.0,
            grid.range.1
        );
    }

    let visible =
        ready && render_state.uploaded.is_some() && render_state.uploaded == model.generation;
    for mut visibility in shells.iter_mut() {
        visibility.set_if_neq(if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        });
    }
}

/// Per-tick shell orientation: model sub-solar point onto the observed one, then the body's
/// own orientation.
pub fn orient_shell(
    sim_time: Res<SimulationTime>,
    ephemeris: Res<EphemerisState>,
    model: Res<ModelState>,
    transformer: Res<FrameTransformer>,
    orientation: Res<BodyOrientation>,
    mut shells: Query<&mut Transform, With<ModelShell>>,
) {
    let Some(season) = model.season else { return };
    let basis = RotationBasis {
        model_subsolar_deg: model_subsolar_point(season),
        observed: ephemeris.products.as_ref().map(|p| &p.subsolar),
    };
    let rotation = compute_rotation(sim_time.current_utc, &basis, transformer.ellipsoid());
    let world = orientation.world * rotation_to_world(rotation);
    for mut transform in shells.iter_mut() {
        transform.rotation = world;
    }
}
