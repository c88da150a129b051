//! MSO -> body-fixed rotation matrices, index-aligned with the whisker rows.

use bevy::math::DMat3;
use bevy::prelude::*;

use crate::ephemeris::types::parse_number;
use crate::error::PipelineError;

/// Index-aligned matrices; `None` where the source row was unusable.
#[derive(Resource, Default)]
pub struct FrameMatrixState {
    pub mso_to_fixed: Vec<Option<DMat3>>,
}

/// Parse one row of nine row-major fixed->MSO elements and return its transpose (MSO->fixed).
pub fn parse_matrix_row(index: usize, cells: &[String]) -> Result<DMat3, PipelineError> {
    if cells.len() < 9 {
        return Err(PipelineError::MalformedRow {
            index,
            reason: format!("expected 9 matrix elements, got {}", cells.len()),
        });
    }
    let mut elements = [0.0; 9];
    for (column, slot) in elements.iter_mut().enumerate() {
        *slot = parse_number(index, column, &cells[column])?;
    }
    // from_cols_array is column-major, so transposing yields the row-major matrix
    let fixed_to_mso = DMat3::from_cols_array(&elements).transpose();
    Ok(fixed_to_mso.transpose())
}

/// Parse a whole table; malformed rows keep their slot as `None` so indices stay aligned.
pub fn parse_matrix_table(rows: &[Vec<String>]) -> Vec<Option<DMat3>> {
    rows.iter()
        .enumerate()
        .map(|(index, cells)| match parse_matrix_row(index, cells) {
            Ok(m) => Some(m),
            Err(err) => {
                warn!("frame matrix {err}");
                None
            }
        })
        .collect()
}
