//! Density estimation over a [`GriddedField`](crate::types::field::GriddedField).
//!
//! [`kde1d`] builds the smoothed distribution of one variable, [`kde2d`] the joint
//! distribution of a positional axis and a variable. Both are pure functions of
//! their inputs.

pub mod error;
pub mod export;
pub mod extract;
pub mod histogram;
pub mod kde1d;
pub mod kde2d;
pub mod smoothing;

use ndarray::{Array, Array1, Dimension};

/// Smallest and largest value, or `None` for an empty array.
pub(crate) fn min_max(values: &Array1<f64>) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some((lo, hi))
}

/// Rescales so the peak is `100.0`. Arrays without a positive peak are returned
/// unchanged.
pub(crate) fn normalize_percent<D: Dimension>(density: &Array<f64, D>) -> Array<f64, D> {
    let max = density.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        density.mapv(|d| d / max * 100.0)
    } else {
        density.clone()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::field::GriddedField;
    use chrono::{Duration, TimeZone, Utc};
    use ndarray::{array, Array1, Array3};

    /// Two steps (00:00 and 06:00) on a 2x2 grid of 2m temperature in Kelvin,
    /// with one missing cell at the first step.
    pub fn temperature_field() -> GriddedField {
        let times = vec![
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap(),
        ];
        let t2m = Array3::from_shape_vec(
            (2, 2, 2),
            vec![300.0, 310.0, f64::NAN, 290.0, 305.0, 295.0, 315.0, 285.0],
        )
        .unwrap();
        GriddedField::new(times, array![30.0, 20.0], array![0.0, 10.0])
            .with_variable("t2m", t2m)
            .unwrap()
    }

    pub fn nan_field() -> GriddedField {
        let times = vec![Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()];
        GriddedField::new(times, array![30.0, 20.0], array![0.0, 10.0])
            .with_variable("t2m", Array3::from_elem((1, 2, 2), f64::NAN))
            .unwrap()
    }

    pub fn constant_field() -> GriddedField {
        let times = vec![Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()];
        GriddedField::new(times, array![30.0, 20.0], array![0.0, 10.0])
            .with_variable("sp", Array3::from_elem((1, 2, 2), 101_325.0))
            .unwrap()
    }

    /// Hourly steps on a regular grid with a smoothly varying `u10`.
    pub fn grid_field(n_time: usize, n_lat: usize, n_lon: usize) -> GriddedField {
        let start = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let times = (0..n_time)
            .map(|t| start + Duration::hours(t as i64))
            .collect();
        let latitude: Array1<f64> = (0..n_lat).map(|i| 40.0 - i as f64 * 0.25).collect();
        let longitude: Array1<f64> = (0..n_lon).map(|j| -20.0 + j as f64 * 0.25).collect();
        let u10 = Array3::from_shape_fn((n_time, n_lat, n_lon), |(t, i, j)| {
            (t as f64 * 0.7 + i as f64 * 0.3).sin() * 5.0 + j as f64 * 0.1
        });
        GriddedField::new(times, latitude, longitude)
            .with_variable("u10", u10)
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&array![3.0, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(min_max(&Array1::zeros(0)), None);
    }

    #[test]
    fn test_normalize_percent() {
        assert_eq!(
            normalize_percent(&array![1.0, 4.0, 2.0]),
            array![25.0, 100.0, 50.0]
        );
        assert_eq!(normalize_percent(&array![[0.0, 0.0]]), array![[0.0, 0.0]]);
    }
}
