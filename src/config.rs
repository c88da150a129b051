//! Application configuration loaded from `<config dir>/bevymars/config.json`.

use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Ellipsoid;
use crate::frames::ReferenceFrame;
use crate::series::InterpolationPolicy;
use crate::visualization::colormaps::Palette;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("ellipsoid {field} must be a finite positive radius, got {value}")]
    MissingEllipsoidRadius { field: &'static str, value: f64 },
    #[error("{field} must be positive")]
    NonPositive { field: &'static str },
}

/// Configuration for the whole visualizer.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VizConfig {
    pub latis_base_url: String,
    pub cache_expiration_hours: i64,
    pub initial_date: NaiveDate,
    pub initial_frame: ReferenceFrame,
    /// Simulated seconds per real second.
    pub time_scale: f32,
    pub ellipsoid: Ellipsoid,
    pub ingest: IngestConfig,
    pub whiskers: WhiskerConfig,
    pub shell: ShellConfig,
    pub render: RenderConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            latis_base_url: "https://lasp.colorado.edu/maven/sdc/public/latis/dap/".to_string(),
            cache_expiration_hours: 24,
            initial_date: NaiveDate::from_ymd_opt(2019, 6, 1).unwrap_or_default(),
            initial_frame: ReferenceFrame::Inertial,
            time_scale: 600.0,
            ellipsoid: Ellipsoid::default(),
            ingest: IngestConfig::default(),
            whiskers: WhiskerConfig::default(),
            shell: ShellConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    pub ground_track_altitude_m: f64,
    pub subsolar_altitude_m: f64,
    /// Display-tuned AU conversion, not the physical astronomical unit.
    pub sun_distance_m_per_au: f64,
    pub marker_interpolation: InterpolationPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            ground_track_altitude_m: 100.0,
            subsolar_altitude_m: 80_000.0,
            sun_distance_m_per_au: 1.496e9,
            marker_interpolation: InterpolationPolicy::Hold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WhiskerConfig {
    pub stride: usize,
    pub max_length_m: f64,
    pub alpha: f32,
    pub palette: Palette,
}

impl Default for WhiskerConfig {
    fn default() -> Self {
        Self {
            stride: 25,
            max_length_m: 5_000_000.0,
            alpha: 0.75,
            palette: Palette::Viridis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    pub altitude_km: f64,
    pub solar_flux: String,
    pub clearance_m: f64,
    pub alpha: f32,
    pub palette: Palette,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            altitude_km: 98.75,
            solar_flux: "130".to_string(),
            clearance_m: 10_000.0,
            alpha: 0.5,
            palette: Palette::Plasma,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub world_units_per_meter: f64,
    pub sun_marker_distance_m: f64,
    pub path_palette: Palette,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            world_units_per_meter: 1e-3,
            sun_marker_distance_m: 12_000_000.0,
            path_palette: Palette::Turbo,
        }
    }
}

impl VizConfig {
    /// Platform config path, e.g. `~/.config/bevymars/config.json` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "bevymars").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load from the platform path; a missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("no platform config directory, using default configuration");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let config = Self::from_json(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            info!("loaded configuration from {}", path.display());
            config
        } else {
            debug!("{} not found, using default configuration", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("equatorial_radius_m", self.ellipsoid.equatorial_radius_m),
            ("polar_radius_m", self.ellipsoid.polar_radius_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::MissingEllipsoidRadius { field, value });
            }
        }
        if self.whiskers.stride == 0 {
            return Err(ConfigError::NonPositive {
                field: "whiskers.stride",
            });
        }
        let scale = self.render.world_units_per_meter;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "render.world_units_per_meter",
            });
        }
        if self.cache_expiration_hours <= 0 {
            return Err(ConfigError::NonPositive {
                field: "cache_expiration_hours",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(test_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "bevymars-config-{}-{}-{}",
            test_name,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn defaults_are_valid() {
        let config = VizConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.whiskers.stride, 25);
        assert_eq!(config.initial_frame, ReferenceFrame::Inertial);
        assert_eq!(config.ellipsoid.equatorial_radius_m, 3_396_000.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = VizConfig::from_json(r#"{ "whiskers": { "stride": 10 } }"#).unwrap();
        assert_eq!(config.whiskers.stride, 10);
        assert_eq!(config.whiskers.max_length_m, 5_000_000.0);
        assert_eq!(config.shell.solar_flux, "130");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(VizConfig::from_json(r#"{ "wiskers": {} }"#).is_err());
    }

    #[test]
    fn zero_radius_is_fatal() {
        let mut config = VizConfig::default();
        config.ellipsoid.polar_radius_m = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEllipsoidRadius { field: "polar_radius_m", .. })
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = unique_temp_dir("missing").join("config.json");
        let config = VizConfig::load_from(&path).expect("missing file is not an error");
        assert_eq!(config, VizConfig::default());
    }

    #[test]
    fn load_from_disk() {
        let dir = unique_temp_dir("load");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(
            &path,
            r#"{ "initial_date": "2020-01-15", "initial_frame": "body_fixed" }"#,
        )
        .unwrap();
        let config = VizConfig::load_from(&path).unwrap();
        assert_eq!(config.initial_date, NaiveDate::from_ymd_opt(2020, 1, 15).unwrap());
        assert_eq!(config.initial_frame, ReferenceFrame::BodyFixed);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = unique_temp_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(VizConfig::load_from(&path), Err(ConfigError::Parse { .. })));
    }
}
