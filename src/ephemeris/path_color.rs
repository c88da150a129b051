//! Orbit path coloring from a one-dimensional parameter.

use bevy::prelude::*;
use chrono::{DateTime, Utc};

use crate::datasource::parse_timestamp;
use crate::visualization::colormaps::{ColorMapper, Palette};

/// Color used where the parameter has no value for an orbit point.
pub const GAP_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// Parameter values aligned with the ephemeris epochs, plus the resulting colors.
#[derive(Resource, Default)]
pub struct PathColorState {
    /// Raw `(time, value)` cells of the current generation.
    pub rows: Vec<Vec<String>>,
    pub values: Vec<Option<f64>>,
    pub colors: Vec<[f32; 4]>,
    pub range: Option<(f64, f64)>,
}

impl PathColorState {
    /// Re-align the stored rows with `epochs` and recolor. Without rows the path is uncolored.
    pub fn refresh(&mut self, epochs: &[DateTime<Utc>], mapper: &dyn ColorMapper, palette: Palette) {
        if self.rows.is_empty() {
            self.values.clear();
            self.colors.clear();
            self.range = None;
            return;
        }
        self.values = align_to_epochs(&self.rows, epochs);
        let (colors, range) = colorize(&self.values, mapper, palette);
        self.colors = colors;
        self.range = range;
    }
}

/// Align `(time, value)` rows with `epochs`.
///
/// A table shorter than the epochs is walked in step with them: a row is consumed only when
/// its time equals the current epoch, everything else is a gap. A table at least as long is
/// taken row by row.
pub fn align_to_epochs(rows: &[Vec<String>], epochs: &[DateTime<Utc>]) -> Vec<Option<f64>> {
    let value = |row: &Vec<String>| row.get(1).and_then(|cell| cell.trim().parse::<f64>().ok());

    if rows.len() >= epochs.len() {
        return rows.iter().map(value).collect();
    }

    let mut next = 0;
    epochs
        .iter()
        .map(|epoch| {
            let row = rows.get(next)?;
            let time = row.first().and_then(|cell| parse_timestamp(cell));
            if time == Some(*epoch) {
                next += 1;
                value(row)
            } else {
                None
            }
        })
        .collect()
}

/// Min/max of the present, finite values.
pub fn value_range(values: &[Option<f64>]) -> Option<(f64, f64)> {
    values
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

pub fn colorize(
    values: &[Option<f64>],
    mapper: &dyn ColorMapper,
    palette: Palette,
) -> (Vec<[f32; 4]>, Option<(f64, f64)>) {
    let range = value_range(values);
    let colors = values
        .iter()
        .map(|value| match (value, range) {
            (Some(v), Some((lo, hi))) if v.is_finite() => mapper.interpolate(*v, lo, hi, palette),
            _ => GAP_COLOR,
        })
        .collect();
    (colors, range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualization::colormaps::PaletteMapper;
    use chrono::{Duration, TimeZone};

    fn t(sec: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap() + Duration::seconds(sec)
    }

    fn data_row(sec: i64, value: &str) -> Vec<String> {
        vec![t(sec).to_rfc3339(), value.to_string()]
    }

    #[test]
    fn short_table_leaves_gaps() {
        let epochs = [t(0), t(10), t(20), t(30)];
        let rows = vec![data_row(10, "1.5"), data_row(30, "2.5")];
        assert_eq!(
            align_to_epochs(&rows, &epochs),
            vec![None, Some(1.5), None, Some(2.5)]
        );
    }

    #[test]
    fn unmatched_row_blocks_the_rest() {
        // rows are consumed in order, so a row with no matching epoch is never passed
        let epochs = [t(0), t(10), t(20)];
        let rows = vec![data_row(5, "1.0"), data_row(10, "2.0")];
        assert_eq!(align_to_epochs(&rows, &epochs), vec![None, None, None]);
    }

    #[test]
    fn long_table_is_used_as_is() {
        let epochs = [t(0), t(10)];
        let rows = vec![data_row(0, "1"), data_row(3, "2"), data_row(10, "x")];
        assert_eq!(align_to_epochs(&rows, &epochs), vec![Some(1.0), Some(2.0), None]);
    }

    #[test]
    fn gaps_are_grey() {
        let (colors, range) = colorize(&[Some(1.0), None, Some(3.0)], &PaletteMapper, Palette::BlueRed);
        assert_eq!(range, Some((1.0, 3.0)));
        assert_eq!(colors[0], [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(colors[1], GAP_COLOR);
        assert_eq!(colors[2], [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn refresh_realigns_stored_rows() {
        let mut state = PathColorState {
            rows: vec![data_row(10, "4")],
            ..default()
        };
        state.refresh(&[t(0), t(10)], &PaletteMapper, Palette::BlueRed);
        assert_eq!(state.values, vec![None, Some(4.0)]);
        assert_eq!(state.colors[0], GAP_COLOR);

        state.rows.clear();
        state.refresh(&[t(0), t(10)], &PaletteMapper, Palette::BlueRed);
        assert!(state.colors.is_empty());
        assert!(state.range.is_none());
    }

    #[test]
    fn all_gaps_have_no_range() {
        let (colors, range) = colorize(&[None, None], &PaletteMapper, Palette::Turbo);
        assert!(range.is_none());
        assert_eq!(colors, vec![GAP_COLOR, GAP_COLOR]);
    }
}
