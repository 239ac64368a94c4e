//! Parquet cache of a merged field.
//!
//! The file is long-format: one row per `(valid_time, latitude, longitude)` cell
//! in that order, `valid_time` as Unix seconds, then one nullable `f64` column
//! per variable with missing values stored as nulls.

use crate::preprocess::error::PreprocessError;
use crate::types::field::{GriddedField, LATITUDE_COORD, LONGITUDE_COORD, TIME_COORD};
use chrono::DateTime;
use ndarray::{Array1, Array3};
use polars::prelude::*;
use std::path::Path;
use tokio::task;

pub const CACHE_FILE_NAME: &str = "all_data.parquet";

pub fn field_to_dataframe(field: &GriddedField) -> Result<DataFrame, PreprocessError> {
    let (n_time, n_lat, n_lon) = field.shape();
    let rows = n_time * n_lat * n_lon;

    let mut times = Vec::with_capacity(rows);
    let mut lats = Vec::with_capacity(rows);
    let mut lons = Vec::with_capacity(rows);
    for t in field.valid_time() {
        for &lat in field.latitude() {
            for &lon in field.longitude() {
                times.push(t.timestamp());
                lats.push(lat);
                lons.push(lon);
            }
        }
    }

    let mut columns = vec![
        Column::new(TIME_COORD.into(), times),
        Column::new(LATITUDE_COORD.into(), lats),
        Column::new(LONGITUDE_COORD.into(), lons),
    ];
    for (name, data) in field.variables() {
        let values: Vec<Option<f64>> = data
            .iter()
            .map(|&v| if v.is_nan() { None } else { Some(v) })
            .collect();
        columns.push(Column::new(name.as_str().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, PreprocessError> {
    Ok(df
        .column(name)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Rebuilds a field from the layout written by [`field_to_dataframe`].
pub fn dataframe_to_field(df: &DataFrame) -> Result<GriddedField, PreprocessError> {
    let malformed = |msg: &str| PreprocessError::MalformedCache(msg.to_string());

    let raw_times: Vec<i64> = df
        .column(TIME_COORD)?
        .i64()?
        .into_iter()
        .collect::<Option<Vec<i64>>>()
        .ok_or_else(|| malformed("null valid_time"))?;
    let lats = f64_column(df, LATITUDE_COORD)?;
    let lons = f64_column(df, LONGITUDE_COORD)?;
    let rows = raw_times.len();

    let mut steps = raw_times.clone();
    steps.dedup();
    let n_time = steps.len();
    if n_time == 0 || rows % n_time != 0 {
        return Err(malformed("rows do not divide into time steps"));
    }
    let per_step = rows / n_time;
    let n_lon = lats[..per_step].iter().take_while(|&&lat| lat == lats[0]).count();
    if per_step % n_lon != 0 {
        return Err(malformed("rows do not divide into a grid"));
    }
    let n_lat = per_step / n_lon;

    let valid_time = steps
        .iter()
        .map(|&s| DateTime::from_timestamp(s, 0).ok_or_else(|| malformed("timestamp out of range")))
        .collect::<Result<Vec<_>, _>>()?;
    let latitude: Array1<f64> = (0..n_lat).map(|i| lats[i * n_lon]).collect();
    let longitude: Array1<f64> = lons[..n_lon].iter().copied().collect();

    let mut field = GriddedField::new(valid_time, latitude, longitude);
    for column in df.get_column_names() {
        let name = column.as_str();
        if [TIME_COORD, LATITUDE_COORD, LONGITUDE_COORD].contains(&name) {
            continue;
        }
        let data = Array3::from_shape_vec((n_time, n_lat, n_lon), f64_column(df, name)?)
            .map_err(|_| malformed("variable length does not match the grid"))?;
        field.insert_variable(name.to_string(), data)?;
    }
    Ok(field)
}

/// Writes `field` to `path` as Snappy-compressed parquet on a blocking thread.
pub async fn write_cache(field: &GriddedField, path: &Path) -> Result<(), PreprocessError> {
    let mut df = field_to_dataframe(field)?;
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        let file = std::fs::File::create(&path_buf)
            .map_err(|e| PreprocessError::ParquetWriteIo(path_buf.clone(), e))?;
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map_err(|e| PreprocessError::ParquetWritePolars(path_buf, e))?;
        Ok::<(), PreprocessError>(())
    })
    .await??;
    Ok(())
}

pub async fn read_cache(path: &Path) -> Result<GriddedField, PreprocessError> {
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        let df = LazyFrame::scan_parquet(&path_buf, Default::default())
            .and_then(|lf| lf.collect())
            .map_err(|e| PreprocessError::ParquetScan(path_buf.clone(), e))?;
        dataframe_to_field(&df)
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::test_support::{grid_field, temperature_field};
    use tempfile::tempdir;

    fn assert_same_field(a: &GriddedField, b: &GriddedField) {
        assert_eq!(a.shape(), b.shape());
        assert_eq!(a.valid_time(), b.valid_time());
        assert_eq!(a.latitude(), b.latitude());
        assert_eq!(a.longitude(), b.longitude());
        assert_eq!(
            a.variable_names().collect::<Vec<_>>(),
            b.variable_names().collect::<Vec<_>>()
        );
        for name in a.variable_names() {
            let (left, right) = (a.variable(name).unwrap(), b.variable(name).unwrap());
            for (x, y) in left.iter().zip(right.iter()) {
                assert!(x == y || (x.is_nan() && y.is_nan()), "{}: {} vs {}", name, x, y);
            }
        }
    }

    #[test]
    fn test_dataframe_layout() -> Result<(), PreprocessError> {
        let field = temperature_field();
        let df = field_to_dataframe(&field)?;
        assert_eq!(df.shape(), (8, 4));
        assert_eq!(
            df.get_column_names()
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>(),
            vec!["valid_time", "latitude", "longitude", "t2m"]
        );
        assert_eq!(df.column("t2m")?.null_count(), 1);
        assert_eq!(df.column("longitude")?.f64()?.get(1), Some(10.0));
        Ok(())
    }

    #[test]
    fn test_dataframe_round_trip() -> Result<(), PreprocessError> {
        let field = grid_field(3, 4, 5);
        let rebuilt = dataframe_to_field(&field_to_dataframe(&field)?)?;
        assert_same_field(&field, &rebuilt);

        let field = temperature_field();
        let rebuilt = dataframe_to_field(&field_to_dataframe(&field)?)?;
        assert_same_field(&field, &rebuilt);
        Ok(())
    }

    #[tokio::test]
    async fn test_parquet_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join(CACHE_FILE_NAME);
        let field = temperature_field();
        write_cache(&field, &path).await?;
        let loaded = read_cache(&path).await?;
        assert_same_field(&field, &loaded);
        Ok(())
    }
}
