//! Joint density of a positional axis (hour of day, latitude or longitude)
//! against a physical quantity.

use crate::density::error::DensityError;
use crate::density::extract::{extract, resolve_frames};
use crate::density::histogram::{histogram_2d, to_density_2d, uniform_edges};
use crate::density::smoothing::gaussian_filter_2d;
use crate::density::{min_max, normalize_percent};
use crate::types::axis::AxisVariable;
use crate::types::field::{FrameSelector, GriddedField};
use crate::types::variable::VariableRegistry;
use chrono::Timelike;
use log::debug;
use ndarray::{Array1, Array2};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

/// How the y (value) axis is bucketed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum YBins {
    /// Equal-width buckets over the observed range.
    Count(usize),
    /// Explicit, strictly increasing bucket edges. Values outside are ignored.
    Edges(Vec<f64>),
}

impl Default for YBins {
    fn default() -> Self {
        YBins::Count(100)
    }
}

impl From<usize> for YBins {
    fn from(count: usize) -> Self {
        YBins::Count(count)
    }
}

impl From<Vec<f64>> for YBins {
    fn from(edges: Vec<f64>) -> Self {
        YBins::Edges(edges)
    }
}

/// Tuning for the x-axis bucket counts of [`estimate_2d`].
///
/// Latitude and longitude axes get `n_points / divisor` buckets (at least one).
/// The hour-of-day axis always gets one bucket per distinct hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kde2dConfig {
    pub lat_divisor: usize,
    pub lon_divisor: usize,
}

impl Default for Kde2dConfig {
    fn default() -> Self {
        Self {
            lat_divisor: 10,
            lon_divisor: 10,
        }
    }
}

/// Joint density estimate. Matrices are shaped `(bins_x, bins_y)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityEstimate2D {
    pub x_edges: Array1<f64>,
    pub y_edges: Array1<f64>,
    pub hist: Array2<f64>,
    pub density: Array2<f64>,
    pub ndensity: Array2<f64>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Peak of the smoothed density.
    pub density_max: f64,
    /// Distinct x values, ascending.
    pub x_unique: Array1<f64>,
    /// Smallest y observed at each `x_unique` value.
    pub min_per_x: Array1<f64>,
    /// Largest y observed at each `x_unique` value.
    pub max_per_x: Array1<f64>,
}

impl DensityEstimate2D {
    pub fn bins_x(&self) -> usize {
        self.x_edges.len() - 1
    }

    pub fn bins_y(&self) -> usize {
        self.y_edges.len() - 1
    }

    /// Edge coordinate grids `(X, Y)`, both shaped `(y_edges, x_edges)`, for
    /// drawing the density as a mesh.
    pub fn mesh(&self) -> (Array2<f64>, Array2<f64>) {
        let shape = (self.y_edges.len(), self.x_edges.len());
        let x = Array2::from_shape_fn(shape, |(_, j)| self.x_edges[j]);
        let y = Array2::from_shape_fn(shape, |(i, _)| self.y_edges[i]);
        (x, y)
    }
}

/// Reconstructs the x coordinate of every flattened `(time, lat, lon)` cell in
/// the selected frames, along with the number of x buckets.
fn axis_values(
    field: &GriddedField,
    axis: AxisVariable,
    frames: Range<usize>,
    config: &Kde2dConfig,
) -> Result<(Vec<f64>, usize), DensityError> {
    let (_, n_lat, n_lon) = field.shape();
    let n_steps = frames.len();

    match axis {
        AxisVariable::TimeOfDay => {
            let mut hours = Vec::with_capacity(n_steps);
            for timestamp in &field.valid_time()[frames] {
                if timestamp.minute() != 0 || timestamp.second() != 0 || timestamp.nanosecond() != 0
                {
                    return Err(DensityError::IrregularTimeAxis {
                        timestamp: *timestamp,
                    });
                }
                hours.push(timestamp.hour());
            }
            let distinct = hours.iter().collect::<BTreeSet<_>>().len();
            let values = hours
                .iter()
                .flat_map(|&h| std::iter::repeat(h as f64).take(n_lat * n_lon))
                .collect();
            Ok((values, distinct))
        }
        AxisVariable::Latitude => {
            let divisor = checked_divisor(config.lat_divisor, "latitude")?;
            let per_step: Vec<f64> = field
                .latitude()
                .iter()
                .flat_map(|&lat| std::iter::repeat(lat).take(n_lon))
                .collect();
            Ok((per_step.repeat(n_steps), (n_lat / divisor).max(1)))
        }
        AxisVariable::Longitude => {
            let divisor = checked_divisor(config.lon_divisor, "longitude")?;
            let values = field.longitude().to_vec().repeat(n_steps * n_lat);
            Ok((values, (n_lon / divisor).max(1)))
        }
    }
}

fn checked_divisor(divisor: usize, axis: &str) -> Result<usize, DensityError> {
    if divisor == 0 {
        return Err(DensityError::InvalidBinCount(format!(
            "{} divisor must be positive",
            axis
        )));
    }
    Ok(divisor)
}

fn y_edges(spec: &YBins, lo: f64, hi: f64) -> Result<Array1<f64>, DensityError> {
    match spec {
        YBins::Count(0) => Err(DensityError::InvalidBinCount(
            "y bucket count must be positive".to_string(),
        )),
        YBins::Count(n) => Ok(uniform_edges(lo, hi, *n)),
        YBins::Edges(edges) => {
            if edges.len() < 2 || edges.windows(2).any(|w| !(w[0] < w[1])) {
                return Err(DensityError::InvalidBinCount(format!(
                    "y edges must be at least two strictly increasing values, got {:?}",
                    edges
                )));
            }
            Ok(Array1::from(edges.clone()))
        }
    }
}

/// Builds a [`DensityEstimate2D`] of `value_variable` against `axis`.
///
/// The value variable is extracted (and converted through `registry`) first; its
/// validity mask is then applied to the reconstructed axis values so both stay
/// paired cell by cell.
///
/// # Errors
///
/// * [`DensityError::NotFound`] if the field has no `value_variable`.
/// * [`DensityError::NotGridded`] if `value_variable` is a 1-D coordinate rather
///   than a gridded variable or auxiliary coordinate.
/// * [`DensityError::EmptyData`] if no non-missing pairs remain.
/// * [`DensityError::IrregularTimeAxis`] for a time-of-day axis whose selected
///   timestamps are not all on whole hours.
/// * [`DensityError::InvalidBinCount`] for a zero bucket count, a zero divisor, or
///   malformed explicit edges.
/// * [`DensityError::FrameOutOfRange`] if `frame` indexes past the time axis.
#[allow(clippy::too_many_arguments)]
pub fn estimate_2d(
    field: &GriddedField,
    registry: &VariableRegistry,
    config: &Kde2dConfig,
    axis: AxisVariable,
    value_variable: &str,
    y_bins: &YBins,
    smooth_sigma: f64,
    frame: &FrameSelector,
) -> Result<DensityEstimate2D, DensityError> {
    let extraction = extract(field, value_variable, frame)?;
    let p_y = registry
        .conversion_for(value_variable)
        .apply_all(&extraction.values_clean);

    let frames = resolve_frames(frame, field.shape().0)?;
    let (x_full, bins_x) = axis_values(field, axis, frames, config)?;
    // 1-D coordinates cannot be paired cell by cell with the axis
    if extraction.values.len() != x_full.len() {
        return Err(DensityError::NotGridded {
            variable: value_variable.to_string(),
            expected: x_full.len(),
            found: extraction.values.len(),
        });
    }
    let p_x: Array1<f64> = extraction
        .valid_indices
        .iter()
        .map(|&i| x_full[i])
        .collect();

    let empty = || DensityError::EmptyData {
        variable: value_variable.to_string(),
    };
    let x_range = min_max(&p_x).ok_or_else(empty)?;
    let y_range = min_max(&p_y).ok_or_else(empty)?;

    let mut envelope: BTreeMap<OrderedFloat<f64>, (f64, f64)> = BTreeMap::new();
    for (&x, &y) in p_x.iter().zip(p_y.iter()) {
        envelope
            .entry(OrderedFloat(x))
            .and_modify(|(lo, hi)| {
                *lo = lo.min(y);
                *hi = hi.max(y);
            })
            .or_insert((y, y));
    }

    let x_edges = uniform_edges(x_range.0, x_range.1, bins_x);
    let y_edges = y_edges(y_bins, y_range.0, y_range.1)?;
    let counts = histogram_2d(&p_x, &p_y, &x_edges, &y_edges);
    if counts.sum() == 0.0 {
        return Err(empty());
    }
    let hist = to_density_2d(&counts, &x_edges, &y_edges);
    let density = gaussian_filter_2d(&hist, smooth_sigma);
    let density_max = density.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let ndensity = normalize_percent(&density);

    debug!(
        "2D density of '{}' against {}: {} pairs on a {}x{} grid",
        value_variable,
        axis,
        p_x.len(),
        x_edges.len() - 1,
        y_edges.len() - 1
    );

    Ok(DensityEstimate2D {
        x_edges,
        y_edges,
        hist,
        density,
        ndensity,
        x_range,
        y_range,
        density_max,
        x_unique: envelope.keys().map(|x| x.into_inner()).collect(),
        min_per_x: envelope.values().map(|(lo, _)| *lo).collect(),
        max_per_x: envelope.values().map(|(_, hi)| *hi).collect(),
    })
}
