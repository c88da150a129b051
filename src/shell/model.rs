//! Atmospheric model shell: season selection and the lat/lon value grid.

use bevy::prelude::*;

use crate::config::ShellConfig;
use crate::core::Ellipsoid;
use crate::ephemeris::types::parse_number;
use crate::error::PipelineError;
use crate::readiness::Generation;
use crate::visualization::colormaps::{ColorMapper, Palette, to_rgba8};

/// Solar longitude the model was run at, nearest to `mean_ls`.
pub fn model_season(mean_ls: f64) -> u32 {
    let ls = mean_ls.rem_euclid(360.0);
    if !(45.0..315.0).contains(&ls) {
        0
    } else if ls < 135.0 {
        90
    } else if ls < 225.0 {
        180
    } else {
        270
    }
}

/// Sub-solar `(lat, lon)` in degrees the model assumed for `season`.
pub fn model_subsolar_point(season: u32) -> (f64, f64) {
    match season {
        90 => (-25.19, 11.75),
        270 => (25.19, 8.06),
        _ => (0.0, -10.0),
    }
}

pub fn shell_radius_m(shell: &ShellConfig, ellipsoid: &Ellipsoid) -> f64 {
    shell.altitude_km * 1000.0 + ellipsoid.equatorial_radius_m + shell.clearance_m
}

/// Model values on a latitude (north first) x longitude (ascending) grid, colored.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellGrid {
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    /// Row-major, `latitudes.len() * longitudes.len()` cells; `None` where no row supplied one.
    pub values: Vec<Option<f64>>,
    /// RGBA8 texels in the same layout as `values`.
    pub rgba: Vec<u8>,
    pub range: (f64, f64),
}

impl ShellGrid {
    /// Build from `(lat, lon, value)` rows. Rows with unparsable coordinates are dropped;
    /// a missing value leaves the cell transparent.
    pub fn from_rows(
        rows: &[Vec<String>],
        mapper: &dyn ColorMapper,
        palette: Palette,
        alpha: f32,
    ) -> Result<Self, PipelineError> {
        let mut cells = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() < 3 {
                warn!("model row {index} has {} columns, expected 3", row.len());
                continue;
            }
            let coords = parse_number(index, 0, &row[0]).and_then(|lat| {
                parse_number(index, 1, &row[1]).map(|lon| (lat, lon))
            });
            match coords {
                Ok((lat, lon)) => cells.push((lat, lon, parse_number(index, 2, &row[2]).ok())),
                Err(err) => warn!("model {err}"),
            }
        }
        if cells.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        let mut latitudes: Vec<f64> = cells.iter().map(|c| c.0).collect();
        latitudes.sort_by(|a, b| b.total_cmp(a));
        latitudes.dedup();
        let mut longitudes: Vec<f64> = cells.iter().map(|c| c.1).collect();
        longitudes.sort_by(f64::total_cmp);
        longitudes.dedup();

        let width = longitudes.len();
        let mut values = vec![None; latitudes.len() * width];
        for (lat, lon, value) in cells {
            let row = latitudes.partition_point(|l| *l > lat);
            let col = longitudes.partition_point(|l| *l < lon);
            values[row * width + col] = value;
        }

        let range = values
            .iter()
            .flatten()
            .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if range.0 > range.1 {
            return Err(PipelineError::EmptyDataset);
        }

        let rgba = values
            .iter()
            .flat_map(|value| match value {
                Some(v) => to_rgba8(mapper.interpolate(*v, range.0, range.1, palette), alpha),
                None => [0; 4],
            })
            .collect();

        Ok(Self {
            latitudes,
            longitudes,
            values,
            rgba,
            range,
        })
    }

    pub fn width(&self) -> usize {
        self.longitudes.len()
    }

    pub fn height(&self) -> usize {
        self.latitudes.len()
    }
}

/// An in-flight model fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRequest {
    pub generation: Generation,
    pub parameter: &'static str,
    pub season: u32,
}

/// The model grid on display and the request that will replace it.
#[derive(Resource, Default)]
pub struct ModelState {
    pub generation: Option<Generation>,
    pub parameter: Option<&'static str>,
    /// Season the current grid was computed for.
    pub season: Option<u32>,
    pub grid: Option<ShellGrid>,
    pub requested: Option<ModelRequest>,
}

impl ModelState {
    /// Drop the grid and any pending request.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Install `grid` if it answers the pending request for `generation`.
    pub fn accept(&mut self, generation: Generation, grid: ShellGrid) -> bool {
        match self.requested {
            Some(request) if request.generation == generation => {
                self.generation = Some(generation);
                self.parameter = Some(request.parameter);
                self.season = Some(request.season);
                self.grid = Some(grid);
                self.requested = None;
                true
            }
            _ => false,
        }
    }
}
