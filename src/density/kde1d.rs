//! Smoothed, normalised histogram of one variable.

use crate::density::error::DensityError;
use crate::density::extract::extract;
use crate::density::histogram::{bin_centers, histogram, to_density};
use crate::density::smoothing::gaussian_filter_1d;
use crate::density::{min_max, normalize_percent};
use crate::types::field::{FrameSelector, GriddedField};
use crate::types::variable::VariableRegistry;
use log::debug;
use ndarray::Array1;
use serde::Serialize;

pub const DEFAULT_BINS: usize = 100;
pub const DEFAULT_SMOOTH_SIGMA: f64 = 1.0;

/// Density estimate of a single variable, in display units.
///
/// * `hist` integrates to one over the bins (it is a density, not a count).
/// * `density` is `hist` after Gaussian smoothing.
/// * `ndensity` is `density` rescaled so its peak is `100.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityEstimate1D {
    pub bin_centers: Array1<f64>,
    pub hist: Array1<f64>,
    pub density: Array1<f64>,
    pub ndensity: Array1<f64>,
    pub v_min: f64,
    pub mean: f64,
    pub median: f64,
    pub v_max: f64,
    /// Number of non-missing values the estimate was built from.
    pub count: usize,
}

impl DensityEstimate1D {
    /// Width of each (equal-width) bin.
    pub fn bin_width(&self) -> f64 {
        (self.v_max - self.v_min) / self.bin_centers.len() as f64
    }
}

fn median(values: &Array1<f64>) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Builds a [`DensityEstimate1D`] for `variable`.
///
/// Values are converted to display units through `registry`, missing values are
/// dropped, and the histogram spans exactly the observed range.
///
/// # Errors
///
/// * [`DensityError::NotFound`] if the field has no such variable or coordinate.
/// * [`DensityError::EmptyData`] if every selected value is missing.
/// * [`DensityError::DegenerateRange`] if all remaining values are identical.
/// * [`DensityError::InvalidBinCount`] if `bins` is zero.
/// * [`DensityError::FrameOutOfRange`] if `frame` indexes past the time axis.
pub fn estimate_1d(
    field: &GriddedField,
    registry: &VariableRegistry,
    variable: &str,
    frame: &FrameSelector,
    bins: usize,
    smooth_sigma: f64,
) -> Result<DensityEstimate1D, DensityError> {
    if bins == 0 {
        return Err(DensityError::InvalidBinCount(
            "bucket count must be positive".to_string(),
        ));
    }

    let extraction = extract(field, variable, frame)?;
    let values = registry
        .conversion_for(variable)
        .apply_all(&extraction.values_clean);

    let (v_min, v_max) = min_max(&values).ok_or_else(|| DensityError::EmptyData {
        variable: variable.to_string(),
    })?;
    if v_min == v_max {
        return Err(DensityError::DegenerateRange {
            variable: variable.to_string(),
            value: v_min,
        });
    }

    let (counts, edges) = histogram(&values, bins, v_min, v_max);
    let hist = to_density(&counts, &edges);
    let density = gaussian_filter_1d(&hist, smooth_sigma);
    let ndensity = normalize_percent(&density);

    debug!(
        "1D density for '{}': {} values over {} bins in [{}, {}]",
        variable,
        values.len(),
        bins,
        v_min,
        v_max
    );

    Ok(DensityEstimate1D {
        bin_centers: bin_centers(&edges),
        hist,
        density,
        ndensity,
        v_min,
        mean: values.sum() / values.len() as f64,
        median: median(&values),
        v_max,
        count: values.len(),
    })
}
