use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use std::collections::HashMap;

use crate::config::VizConfig;
use crate::core::world_to_fixed;
use crate::frames::FrameTransformer;
use crate::visualization::BodyOrientation;

/// Unit icosphere shared by the planet and the model shell.
#[derive(Resource)]
pub struct GlobeMesh {
    pub handle: Handle<Mesh>,
}

/// Marker for the planet entity.
#[derive(Component)]
pub struct MarsBody;

pub fn spawn_mars(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<VizConfig>,
) {
    let mesh_handle = meshes.add(generate_icosphere(5)); // ~65k vertices
    commands.insert_resource(GlobeMesh {
        handle: mesh_handle.clone(),
    });

    let material_handle = materials.add(StandardMaterial {
        base_color: Color::srgb(0.72, 0.38, 0.22),
        perceptual_roughness: 1.0,
        ..default()
    });

    let radius = (config.ellipsoid.equatorial_radius_m * config.render.world_units_per_meter) as f32;
    commands
        .spawn((
            Mesh3d(mesh_handle),
            MeshMaterial3d(material_handle),
            Transform::from_scale(Vec3::splat(radius)),
            Visibility::Visible,
            MarsBody,
            Name::new("Mars"),
        ))
        .observe(
            |mut event: On<Pointer<Click>>,
             transformer: Res<FrameTransformer>,
             orientation: Res<BodyOrientation>,
             config: Res<VizConfig>| {
                if let Some(pos) = event.hit.position {
                    // undo the planet's current orientation before reading coordinates
                    let local = orientation.world.inverse() * pos;
                    let geo = transformer
                        .to_geodetic(world_to_fixed(local, config.render.world_units_per_meter));
                    info!(
                        "Selected point: Lat: {:.2}, Lon: {:.2}",
                        geo.lat_deg, geo.lon_deg
                    );
                }
                event.propagate(false);
            },
        );
}

/// The planet turns with the frame: identity body-fixed, `fixed_to_inertial(now)` inertial.
pub fn sync_mars_orientation(
    orientation: Res<BodyOrientation>,
    mut bodies: Query<&mut Transform, With<MarsBody>>,
) {
    if !orientation.is_changed() {
        return;
    }
    for mut transform in bodies.iter_mut() {
        transform.rotation = orientation.world;
    }
}

/// Equirectangular texture coordinates for a unit world-space direction.
///
/// World axes are body-fixed `(Y, Z, X)`, so +Y is north and +Z is longitude 0.
pub fn equirectangular_uv(direction: Vec3) -> [f32; 2] {
    let lat = direction.y.clamp(-1.0, 1.0).asin().to_degrees();
    let lon = direction.x.atan2(direction.z).to_degrees();
    [(lon + 180.0) / 360.0, (90.0 - lat) / 180.0]
}

/// Generate icosphere mesh with specified subdivision levels
/// Each subdivision level quadruples the triangle count
pub fn generate_icosphere(subdivisions: u32) -> Mesh {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0; // Golden ratio
    let mut vertex_positions = vec![
        Vec3::new(-1.0, phi, 0.0).normalize(),
        Vec3::new(1.0, phi, 0.0).normalize(),
        Vec3::new(-1.0, -phi, 0.0).normalize(),
        Vec3::new(1.0, -phi, 0.0).normalize(),
        Vec3::new(0.0, -1.0, phi).normalize(),
        Vec3::new(0.0, 1.0, phi).normalize(),
        Vec3::new(0.0, -1.0, -phi).normalize(),
        Vec3::new(0.0, 1.0, -phi).normalize(),
        Vec3::new(phi, 0.0, -1.0).normalize(),
        Vec3::new(phi, 0.0, 1.0).normalize(),
        Vec3::new(-phi, 0.0, -1.0).normalize(),
        Vec3::new(-phi, 0.0, 1.0).normalize(),
    ];

    let mut indices: Vec<u32> = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7,
        1, 8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9,
        8, 1,
    ];

    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    for _ in 0..subdivisions {
        let mut next = Vec::with_capacity(indices.len() * 4);
        midpoints.clear();
        for tri in indices.chunks(3) {
            let a = midpoint(&mut vertex_positions, &mut midpoints, tri[0], tri[1]);
            let b = midpoint(&mut vertex_positions, &mut midpoints, tri[1], tri[2]);
            let c = midpoint(&mut vertex_positions, &mut midpoints, tri[2], tri[0]);
            next.extend_from_slice(&[tri[0], a, c, tri[1], b, a, tri[2], c, b, a, b, c]);
        }
        indices = next;
    }

    let mut uvs: Vec<[f32; 2]> = vertex_positions.iter().map(|v| equirectangular_uv(*v)).collect();
    let mut normals = vertex_positions.clone();
    fix_texture_seams(&mut vertex_positions, &mut uvs, &mut normals, &mut indices);

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_indices(Indices::U32(indices));
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertex_positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh
}

fn midpoint(
    vertices: &mut Vec<Vec3>,
    cache: &mut HashMap<(u32, u32), u32>,
    v1: u32,
    v2: u32,
) -> u32 {
    let key = if v1 < v2 { (v1, v2) } else { (v2, v1) };
    if let Some(&index) = cache.get(&key) {
        return index;
    }
    let mid = ((vertices[v1 as usize] + vertices[v2 as usize]) / 2.0).normalize();
    vertices.push(mid);
    let index = vertices.len() as u32 - 1;
    cache.insert(key, index);
    index
}

/// Duplicate vertices of triangles that straddle the ±180° meridian so their `u` does not
/// wrap across the whole texture.
fn fix_texture_seams(
    vertices: &mut Vec<Vec3>,
    uvs: &mut Vec<[f32; 2]>,
    normals: &mut Vec<Vec3>,
    indices: &mut [u32],
) {
    for tri in indices.chunks_mut(3) {
        let u = [
            uvs[tri[0] as usize][0],
            uvs[tri[1] as usize][0],
            uvs[tri[2] as usize][0],
        ];
        let max_du = (u[0] - u[1]).abs().max((u[0] - u[2]).abs()).max((u[1] - u[2]).abs());
        if max_du <= 0.5 {
            continue;
        }
        for corner in tri.iter_mut() {
            let idx = *corner as usize;
            if uvs[idx][0] < 0.25 {
                vertices.push(vertices[idx]);
                normals.push(normals[idx]);
                uvs.push([uvs[idx][0] + 1.0, uvs[idx][1]]);
                *corner = vertices.len() as u32 - 1;
            }
        }
    }
}
