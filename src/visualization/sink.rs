//! Renderable sink: owns the geometry handed over by the pipeline and draws it with gizmos.

use std::collections::HashMap;

use bevy::math::DVec3;
use bevy::prelude::*;

use crate::config::VizConfig;
use crate::core::fixed_to_world;
use crate::visualization::BodyOrientation;

/// Groups of geometry that are replaced independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderLayer {
    /// Orbit path, in the selected frame.
    Trajectory,
    /// Current spacecraft position, in the selected frame.
    Spacecraft,
    /// Vector whiskers, body-fixed.
    Whiskers,
    /// Ground track, sub-solar and sun markers, body-fixed.
    Surface,
}

impl RenderLayer {
    /// Body-anchored layers follow the planet's orientation in the inertial frame.
    pub fn body_anchored(self) -> bool {
        matches!(self, RenderLayer::Whiskers | RenderLayer::Surface)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: DVec3,
    pub end: DVec3,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMarker {
    pub position: DVec3,
    pub radius_m: f64,
    pub color: [f32; 4],
}

/// Destination for renderable geometry.
pub trait RenderableSink {
    fn replace_segments(&mut self, layer: RenderLayer, segments: Vec<LineSegment>);
    fn replace_points(&mut self, layer: RenderLayer, points: Vec<PointMarker>);
    fn clear(&mut self, layer: RenderLayer);
}

#[derive(Default)]
struct LayerContents {
    segments: Vec<LineSegment>,
    points: Vec<PointMarker>,
}

/// Immediate-mode sink; contents are redrawn every frame until replaced.
#[derive(Resource, Default)]
pub struct GizmoSink {
    layers: HashMap<RenderLayer, LayerContents>,
}

impl GizmoSink {
    pub fn segments(&self, layer: RenderLayer) -> &[LineSegment] {
        self.layers
            .get(&layer)
            .map(|l| l.segments.as_slice())
            .unwrap_or_default()
    }

    pub fn points(&self, layer: RenderLayer) -> &[PointMarker] {
        self.layers
            .get(&layer)
            .map(|l| l.points.as_slice())
            .unwrap_or_default()
    }
}

impl RenderableSink for GizmoSink {
    fn replace_segments(&mut self, layer: RenderLayer, segments: Vec<LineSegment>) {
        self.layers.entry(layer).or_default().segments = segments;
    }

    fn replace_points(&mut self, layer: RenderLayer, points: Vec<PointMarker>) {
        self.layers.entry(layer).or_default().points = points;
    }

    fn clear(&mut self, layer: RenderLayer) {
        self.layers.remove(&layer);
    }
}

fn to_color(c: [f32; 4]) -> Color {
    Color::srgba(c[0], c[1], c[2], c[3])
}

pub fn draw_sink_layers(
    sink: Res<GizmoSink>,
    orientation: Res<BodyOrientation>,
    config: Res<VizConfig>,
    mut gizmos: Gizmos,
) {
    let scale = config.render.world_units_per_meter;
    for (layer, contents) in sink.layers.iter() {
        let rotation = if layer.body_anchored() {
            orientation.world
        } else {
            Quat::IDENTITY
        };
        let place = |p: DVec3| rotation * fixed_to_world(p, scale);

        for segment in &contents.segments {
            gizmos.line(place(segment.start), place(segment.end), to_color(segment.color));
        }
        for point in &contents.points {
            gizmos.sphere(
                Isometry3d::from_translation(place(point.position)),
                (point.radius_m * scale) as f32,
                to_color(point.color),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(x: f64) -> LineSegment {
        LineSegment {
            start: DVec3::ZERO,
            end: DVec3::new(x, 0.0, 0.0),
            color: [1.0; 4],
        }
    }

    #[test]
    fn replace_overwrites_only_that_layer() {
        let mut sink = GizmoSink::default();
        sink.replace_segments(RenderLayer::Whiskers, vec![segment(1.0), segment(2.0)]);
        sink.replace_segments(RenderLayer::Trajectory, vec![segment(3.0)]);
        sink.replace_segments(RenderLayer::Whiskers, vec![segment(4.0)]);

        assert_eq!(sink.segments(RenderLayer::Whiskers), &[segment(4.0)]);
        assert_eq!(sink.segments(RenderLayer::Trajectory), &[segment(3.0)]);
    }

    #[test]
    fn clear_drops_segments_and_points() {
        let mut sink = GizmoSink::default();
        sink.replace_segments(RenderLayer::Surface, vec![segment(1.0)]);
        sink.replace_points(
            RenderLayer::Surface,
            vec![PointMarker {
                position: DVec3::X,
                radius_m: 1.0,
                color: [1.0; 4],
            }],
        );
        sink.clear(RenderLayer::Surface);
        assert!(sink.segments(RenderLayer::Surface).is_empty());
        assert!(sink.points(RenderLayer::Surface).is_empty());
    }

    #[test]
    fn anchoring() {
        assert!(RenderLayer::Whiskers.body_anchored());
        assert!(RenderLayer::Surface.body_anchored());
        assert!(!RenderLayer::Trajectory.body_anchored());
        assert!(!RenderLayer::Spacecraft.body_anchored());
    }
}
