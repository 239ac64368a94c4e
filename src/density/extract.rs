//! Flattens a variable or coordinate of a [`GriddedField`] and records which
//! entries are present.

use crate::density::error::DensityError;
use crate::types::field::{
    FrameSelector, GriddedField, LATITUDE_COORD, LONGITUDE_COORD, TIME_COORD,
};
use ndarray::{s, Array1};
use std::ops::Range;

/// Result of [`extract`].
///
/// `valid_indices` are positions in `values` holding non-NaN entries, ascending,
/// so `values[valid_indices[k]] == values_clean[k]`. They can be reused as a mask
/// against any other array flattened the same way.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub values: Array1<f64>,
    pub values_clean: Array1<f64>,
    pub valid_indices: Vec<usize>,
}

impl Extraction {
    pub fn from_values(values: Array1<f64>) -> Self {
        let valid_indices: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(i, _)| i)
            .collect();
        let values_clean = valid_indices.iter().map(|&i| values[i]).collect();
        Self {
            values,
            values_clean,
            valid_indices,
        }
    }
}

/// Resolves a frame selector, turning an out-of-range index into an error.
pub(crate) fn resolve_frames(
    frame: &FrameSelector,
    n_time: usize,
) -> Result<Range<usize>, DensityError> {
    frame.resolve(n_time).ok_or(DensityError::FrameOutOfRange {
        // only `Index` can fail to resolve
        index: match frame {
            FrameSelector::Index(index) => *index,
            _ => n_time,
        },
        len: n_time,
    })
}

/// Extracts `name` from `field`.
///
/// * Axis coordinates come back as their 1-D values; `valid_time` is given in Unix
///   seconds and honours `frame`.
/// * Auxiliary (latitude × longitude) coordinates are repeated once per selected
///   time step, matching the flattened length of a data variable under the same
///   selector.
/// * Data variables are sliced along time by `frame` and flattened in
///   `(time, latitude, longitude)` order.
///
/// # Errors
///
/// [`DensityError::NotFound`] if `name` is neither a coordinate nor a variable, and
/// [`DensityError::FrameOutOfRange`] if `frame` indexes past the time axis.
pub fn extract(
    field: &GriddedField,
    name: &str,
    frame: &FrameSelector,
) -> Result<Extraction, DensityError> {
    let (n_time, _, _) = field.shape();

    let values = match name {
        LATITUDE_COORD => field.latitude().clone(),
        LONGITUDE_COORD => field.longitude().clone(),
        TIME_COORD => {
            let frames = resolve_frames(frame, n_time)?;
            field.valid_time()[frames]
                .iter()
                .map(|t| t.timestamp() as f64)
                .collect()
        }
        _ => {
            if let Some(coord) = field.aux_coord(name) {
                let frames = resolve_frames(frame, n_time)?;
                let mut repeated = Vec::with_capacity(frames.len() * coord.len());
                for _ in frames {
                    repeated.extend(coord.iter().copied());
                }
                Array1::from(repeated)
            } else if let Some(data) = field.variable(name) {
                let frames = resolve_frames(frame, n_time)?;
                data.slice(s![frames, .., ..]).iter().copied().collect()
            } else {
                return Err(DensityError::NotFound(name.to_string()));
            }
        }
    };

    Ok(Extraction::from_values(values))
}
