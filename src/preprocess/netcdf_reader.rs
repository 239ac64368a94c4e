//! Reading CDS NetCDF files into a [`GriddedField`].
//!
//! The reader itself needs libnetcdf and is only compiled with the `netcdf`
//! feature. Time decoding is plain Rust and always available.

use crate::preprocess::error::PreprocessError;
use crate::types::field::GriddedField;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use std::path::Path;

/// Parses CF time units such as `"seconds since 1970-01-01"` into the length
/// of one unit in seconds and the reference instant.
pub fn parse_time_units(units: &str) -> Result<(f64, DateTime<Utc>), PreprocessError> {
    let invalid = || PreprocessError::TimeUnits(units.to_string());
    let (unit, reference) = units.split_once(" since ").ok_or_else(invalid)?;
    let seconds = match unit.trim() {
        "seconds" | "second" | "s" => 1.0,
        "minutes" | "minute" => 60.0,
        "hours" | "hour" | "h" => 3600.0,
        "days" | "day" | "d" => 86_400.0,
        _ => return Err(invalid()),
    };

    let reference = reference.trim().trim_end_matches(" UTC").trim_end_matches('Z');
    let epoch = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(reference, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(reference, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(invalid)?;
    Ok((seconds, epoch.and_utc()))
}

/// Converts raw time offsets to UTC timestamps, rounded to the nearest second.
pub fn decode_times(raw: &[f64], units: &str) -> Result<Vec<DateTime<Utc>>, PreprocessError> {
    let (seconds_per_unit, epoch) = parse_time_units(units)?;
    raw.iter()
        .map(|&value| {
            TimeDelta::try_seconds((value * seconds_per_unit).round() as i64)
                .and_then(|delta| epoch.checked_add_signed(delta))
                .ok_or_else(|| PreprocessError::TimeUnits(format!("{} {}", value, units)))
        })
        .collect()
}

#[cfg(feature = "netcdf")]
mod native {
    use super::decode_times;
    use crate::preprocess::error::PreprocessError;
    use crate::types::field::{GriddedField, LATITUDE_COORD, LONGITUDE_COORD, TIME_COORD};
    use log::{debug, info};
    use ndarray::{Array1, Array3};
    use netcdf::AttributeValue;
    use std::path::Path;

    fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
        var.attributes().any(|attr| attr.name() == name)
    }

    fn f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
        if !has_attr(var, name) {
            return None;
        }
        let value = var.attribute_value(name)?.ok()?;
        f64::try_from(value).ok()
    }

    fn string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
        if !has_attr(var, name) {
            return None;
        }
        match var.attribute_value(name)?.ok()? {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn coordinate(file: &netcdf::File, path: &Path, name: &str) -> Result<Vec<f64>, PreprocessError> {
        file.variable(name)
            .ok_or_else(|| PreprocessError::Netcdf {
                path: path.to_path_buf(),
                message: format!("missing coordinate '{}'", name),
            })?
            .get_values::<f64, _>(..)
            .map_err(|e| PreprocessError::Netcdf {
                path: path.to_path_buf(),
                message: format!("failed reading '{}': {}", name, e),
            })
    }

    pub fn read_netcdf(path: &Path) -> Result<GriddedField, PreprocessError> {
        let nc_err = |message: String| PreprocessError::Netcdf {
            path: path.to_path_buf(),
            message,
        };
        let file = netcdf::open(path).map_err(|e| nc_err(format!("failed to open: {}", e)))?;

        let time_var = file
            .variable(TIME_COORD)
            .ok_or_else(|| nc_err(format!("missing coordinate '{}'", TIME_COORD)))?;
        let units = string_attr(&time_var, "units")
            .unwrap_or_else(|| "seconds since 1970-01-01".to_string());
        let times = decode_times(&coordinate(&file, path, TIME_COORD)?, &units)?;
        let latitude = Array1::from(coordinate(&file, path, LATITUDE_COORD)?);
        let longitude = Array1::from(coordinate(&file, path, LONGITUDE_COORD)?);
        let shape = (times.len(), latitude.len(), longitude.len());

        let mut field = GriddedField::new(times, latitude, longitude);
        for var in file.variables() {
            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
            if dims != [TIME_COORD, LATITUDE_COORD, LONGITUDE_COORD] {
                continue;
            }
            let name = var.name();
            let raw: Vec<f64> = var
                .get_values::<f64, _>(..)
                .map_err(|e| nc_err(format!("failed reading '{}': {}", name, e)))?;

            let scale = f64_attr(&var, "scale_factor").unwrap_or(1.0);
            let offset = f64_attr(&var, "add_offset").unwrap_or(0.0);
            let missing: Vec<f64> = ["_FillValue", "missing_value"]
                .iter()
                .filter_map(|attr| f64_attr(&var, attr))
                .collect();
            let values: Vec<f64> = raw
                .into_iter()
                .map(|v| {
                    if v.is_nan() || missing.contains(&v) {
                        f64::NAN
                    } else {
                        v * scale + offset
                    }
                })
                .collect();

            let data = Array3::from_shape_vec(shape, values)
                .map_err(|e| nc_err(format!("'{}' has an unexpected size: {}", name, e)))?;
            debug!("Read variable '{}' from {:?}", name, path);
            field.insert_variable(name, data)?;
        }
        info!(
            "Read {:?}: {} time steps on a {}x{} grid, variables {:?}",
            path,
            shape.0,
            shape.1,
            shape.2,
            field.variable_names().collect::<Vec<_>>()
        );
        Ok(field)
    }
}

/// Reads every `(valid_time, latitude, longitude)` variable of a NetCDF file.
///
/// Packed values are unpacked with `scale_factor`/`add_offset`; `_FillValue` and
/// `missing_value` become `NaN`.
#[cfg(feature = "netcdf")]
pub fn read_netcdf(path: &Path) -> Result<GriddedField, PreprocessError> {
    native::read_netcdf(path)
}

/// Always fails: this build has no NetCDF support.
#[cfg(not(feature = "netcdf"))]
pub fn read_netcdf(path: &Path) -> Result<GriddedField, PreprocessError> {
    Err(PreprocessError::NetcdfUnsupported(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_time_units() -> Result<(), PreprocessError> {
        let (step, epoch) = parse_time_units("seconds since 1970-01-01")?;
        assert_eq!(step, 1.0);
        assert_eq!(epoch, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());

        let (step, epoch) = parse_time_units("hours since 1900-01-01 00:00:00")?;
        assert_eq!(step, 3600.0);
        assert_eq!(epoch, Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap());

        assert!(matches!(
            parse_time_units("fortnights since 2000-01-01"),
            Err(PreprocessError::TimeUnits(_))
        ));
        assert!(parse_time_units("seconds").is_err());
        Ok(())
    }

    #[test]
    fn test_decode_times() -> Result<(), PreprocessError> {
        let times = decode_times(&[1_735_689_600.0, 1_735_711_200.0], "seconds since 1970-01-01")?;
        assert_eq!(
            times,
            vec![
                Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap(),
            ]
        );

        let hours = decode_times(&[1.5], "hours since 2025-01-01T00:00:00")?;
        assert_eq!(hours[0], Utc.with_ymd_and_hms(2025, 1, 1, 1, 30, 0).unwrap());
        Ok(())
    }

    #[cfg(not(feature = "netcdf"))]
    #[test]
    fn test_reader_needs_feature() {
        let err = read_netcdf(Path::new("data.nc")).unwrap_err();
        assert!(matches!(err, PreprocessError::NetcdfUnsupported(_)));
    }
}
