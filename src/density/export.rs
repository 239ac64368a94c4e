//! Tabular views of density estimates, for writing alongside the plots.

use crate::density::error::DensityError;
use crate::density::kde1d::DensityEstimate1D;
use crate::density::kde2d::DensityEstimate2D;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

impl DensityEstimate1D {
    /// One row per bin: `bin_center`, `hist`, `density`, `ndensity`.
    pub fn to_dataframe(&self) -> Result<DataFrame, DensityError> {
        Ok(df!(
            "bin_center" => self.bin_centers.to_vec(),
            "hist" => self.hist.to_vec(),
            "density" => self.density.to_vec(),
            "ndensity" => self.ndensity.to_vec(),
        )?)
    }
}

impl DensityEstimate2D {
    /// One row per cell in `(x, y)` order, with the cell bounds and the three
    /// matrices flattened alongside.
    pub fn to_dataframe(&self) -> Result<DataFrame, DensityError> {
        let (bins_x, bins_y) = self.hist.dim();
        let cells = bins_x * bins_y;
        let mut x_lo = Vec::with_capacity(cells);
        let mut x_hi = Vec::with_capacity(cells);
        let mut y_lo = Vec::with_capacity(cells);
        let mut y_hi = Vec::with_capacity(cells);
        for i in 0..bins_x {
            for j in 0..bins_y {
                x_lo.push(self.x_edges[i]);
                x_hi.push(self.x_edges[i + 1]);
                y_lo.push(self.y_edges[j]);
                y_hi.push(self.y_edges[j + 1]);
            }
        }
        Ok(df!(
            "x_lo" => x_lo,
            "x_hi" => x_hi,
            "y_lo" => y_lo,
            "y_hi" => y_hi,
            "hist" => self.hist.iter().copied().collect::<Vec<f64>>(),
            "density" => self.density.iter().copied().collect::<Vec<f64>>(),
            "ndensity" => self.ndensity.iter().copied().collect::<Vec<f64>>(),
        )?)
    }

    /// One row per distinct x value with the y envelope observed there.
    pub fn envelope_dataframe(&self) -> Result<DataFrame, DensityError> {
        Ok(df!(
            "x" => self.x_unique.to_vec(),
            "min" => self.min_per_x.to_vec(),
            "max" => self.max_per_x.to_vec(),
        )?)
    }
}

/// Writes `df` as CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), DensityError> {
    let mut file =
        File::create(path).map_err(|e| DensityError::CsvCreate(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| DensityError::CsvWrite(path.to_path_buf(), e))?;
    info!("Wrote {} rows to {:?}", df.height(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::kde1d::estimate_1d;
    use crate::density::kde2d::{estimate_2d, Kde2dConfig, YBins};
    use crate::density::test_support::{grid_field, temperature_field};
    use crate::types::axis::AxisVariable;
    use crate::types::field::FrameSelector;
    use crate::types::variable::VariableRegistry;
    use tempfile::tempdir;

    #[test]
    fn test_1d_dataframe_and_csv() -> Result<(), Box<dyn std::error::Error>> {
        let field = temperature_field();
        let estimate = estimate_1d(
            &field,
            &VariableRegistry::era5(),
            "t2m",
            &FrameSelector::All,
            5,
            1.0,
        )?;
        let mut df = estimate.to_dataframe()?;
        assert_eq!(df.shape(), (5, 4));
        let peak = df.column("ndensity")?.f64()?.max();
        assert_eq!(peak, Some(100.0));

        let dir = tempdir()?;
        let path = dir.path().join("t2m.csv");
        write_csv(&mut df, &path)?;
        let written = std::fs::read_to_string(&path)?;
        assert!(written.starts_with("bin_center,hist,density,ndensity"));
        assert_eq!(written.lines().count(), 6);
        Ok(())
    }

    #[test]
    fn test_2d_dataframes() -> Result<(), Box<dyn std::error::Error>> {
        let field = grid_field(2, 20, 30);
        let estimate = estimate_2d(
            &field,
            &VariableRegistry::era5(),
            &Kde2dConfig::default(),
            AxisVariable::Longitude,
            "u10",
            &YBins::Count(4),
            1.0,
            &FrameSelector::All,
        )?;

        let cells = estimate.to_dataframe()?;
        assert_eq!(cells.shape(), (3 * 4, 7));
        let x_lo = cells.column("x_lo")?.f64()?;
        assert_eq!(x_lo.get(0), Some(estimate.x_edges[0]));
        assert_eq!(x_lo.get(4), Some(estimate.x_edges[1]));

        let envelope = estimate.envelope_dataframe()?;
        assert_eq!(envelope.height(), 30);
        Ok(())
    }
}
