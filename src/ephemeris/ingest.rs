//! Ephemeris rows -> trajectory, surface markers and solar geometry.

use bevy::prelude::*;

use crate::config::IngestConfig;
use crate::core::Geodetic;
use crate::ephemeris::types::{EphemerisProducts, EphemerisRow};
use crate::error::PipelineError;
use crate::frames::{FrameProvider, FrameQuality, FrameTransformer, ReferenceFrame};
use crate::series::{InterpolationPolicy, SampleSeries};

/// Ingestion settings bound to the body shape.
pub struct EphemerisIngest<'a> {
    pub transformer: &'a FrameTransformer,
    pub config: &'a IngestConfig,
}

impl<'a> EphemerisIngest<'a> {
    pub fn new(transformer: &'a FrameTransformer, config: &'a IngestConfig) -> Self {
        Self {
            transformer,
            config,
        }
    }

    /// Derive every ephemeris series for `rows`.
    ///
    /// Only the spacecraft position depends on `frame`; surface markers and the sun stay
    /// body-fixed and are re-oriented at render time. Rows that go back in time are dropped.
    pub fn ingest(
        &self,
        rows: &[EphemerisRow],
        frame: ReferenceFrame,
        provider: &dyn FrameProvider,
    ) -> Result<EphemerisProducts, PipelineError> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        let markers = self.config.marker_interpolation;
        let linear = InterpolationPolicy::Linear;
        let mut out = EphemerisProducts {
            frame,
            epochs: Vec::with_capacity(rows.len()),
            trajectory: Vec::with_capacity(rows.len()),
            positions: SampleSeries::with_capacity(linear, rows.len()),
            ground_track: SampleSeries::with_capacity(markers, rows.len()),
            solar_positions: SampleSeries::with_capacity(linear, rows.len()),
            subsolar: SampleSeries::with_capacity(markers, rows.len()),
            opposite_hemisphere: SampleSeries::with_capacity(linear, rows.len()),
            solar_zenith_angles: SampleSeries::with_capacity(linear, rows.len()),
            ..default()
        };

        let mut solar_longitude_sum = 0.0;
        for (index, row) in rows.iter().enumerate() {
            let spacecraft = Geodetic::new(
                row.spacecraft_lat_deg,
                row.spacecraft_lon_deg,
                row.spacecraft_altitude_km * 1000.0,
            );
            let (position, quality) =
                self.transformer
                    .transform_position(spacecraft, row.time, frame, provider);

            if let Err(err) = out.positions.add_sample(row.time, position) {
                warn!("ephemeris row {index} skipped: {err}");
                out.skipped_rows += 1;
                continue;
            }
            if quality == FrameQuality::Degraded {
                out.degraded_samples += 1;
            }

            let ground = self.transformer.fixed_position(Geodetic::new(
                row.spacecraft_lat_deg,
                row.spacecraft_lon_deg,
                self.config.ground_track_altitude_m,
            ));
            let sun = self.transformer.fixed_position(Geodetic::new(
                row.subsolar_lat_deg,
                row.subsolar_lon_deg,
                row.sun_distance_au * self.config.sun_distance_m_per_au,
            ));
            let subsolar_geo = Geodetic::new(
                row.subsolar_lat_deg,
                row.subsolar_lon_deg,
                self.config.subsolar_altitude_m,
            );
            let subsolar = self.transformer.fixed_position(subsolar_geo);
            let opposite = self
                .transformer
                .fixed_position(subsolar_geo.antipode_on_surface());

            // times are already known to be ordered
            out.ground_track.add_sample(row.time, ground)?;
            out.solar_positions.add_sample(row.time, sun)?;
            out.subsolar.add_sample(row.time, subsolar)?;
            out.opposite_hemisphere.add_sample(row.time, opposite)?;
            out.solar_zenith_angles
                .add_sample(row.time, row.solar_zenith_angle_deg)?;

            out.epochs.push(row.time);
            out.trajectory.push(position);
            solar_longitude_sum += row.solar_longitude_deg;
        }

        out.mean_solar_longitude = mean(solar_longitude_sum, out.epochs.len());
        if out.degraded_samples > 0 {
            warn!(
                "{} of {} ephemeris samples used the identity frame fallback",
                out.degraded_samples,
                out.epochs.len()
            );
        }
        Ok(out)
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}
