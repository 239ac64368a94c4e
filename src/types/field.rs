//! The gridded field model: ERA5 variables laid out on a
//! `(valid_time, latitude, longitude)` grid.
//!
//! A [`GriddedField`] is assembled once (by the preprocessing step, a test, or a
//! caller that already holds the arrays) and only ever borrowed afterwards. Every
//! estimator and renderer reads from it; nothing writes back into it.

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, Array3};
use std::collections::BTreeMap;
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;

/// Name of the time coordinate in CDS NetCDF files.
pub const TIME_COORD: &str = "valid_time";
/// Name of the latitude coordinate.
pub const LATITUDE_COORD: &str = "latitude";
/// Name of the longitude coordinate.
pub const LONGITUDE_COORD: &str = "longitude";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error("Variable '{name}' has shape {found:?}, expected {expected:?}")]
    VariableShape {
        name: String,
        expected: [usize; 3],
        found: Vec<usize>,
    },

    #[error("Auxiliary coordinate '{name}' has shape {found:?}, expected {expected:?}")]
    CoordinateShape {
        name: String,
        expected: [usize; 2],
        found: Vec<usize>,
    },

    #[error("Name '{0}' is reserved for an axis coordinate")]
    ReservedName(String),
}

/// Selects time steps along the `valid_time` axis.
///
/// `Index` must address an existing step. `Range` behaves like a slice: bounds
/// past the end of the axis are clipped, so it never fails, but it may select
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FrameSelector {
    /// Every time step.
    #[default]
    All,
    /// A single time step.
    Index(usize),
    /// A half-open range of time steps.
    Range(Range<usize>),
}

impl FrameSelector {
    /// Resolves the selector against a time axis of length `n_time`.
    ///
    /// Returns `None` only for an `Index` past the end of the axis.
    pub fn resolve(&self, n_time: usize) -> Option<Range<usize>> {
        match self {
            FrameSelector::All => Some(0..n_time),
            FrameSelector::Index(i) if *i < n_time => Some(*i..*i + 1),
            FrameSelector::Index(_) => None,
            FrameSelector::Range(r) => {
                let end = r.end.min(n_time);
                let start = r.start.min(end);
                Some(start..end)
            }
        }
    }
}

/// Parses `all`, a single index such as `3`, or a half-open range such as `2..5`.
impl FromStr for FrameSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(FrameSelector::All);
        }
        let index = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid frame index '{}'", part))
        };
        match s.split_once("..") {
            Some((start, end)) => {
                let (start, end) = (index(start)?, index(end)?);
                if start > end {
                    return Err(format!("frame range {}..{} is reversed", start, end));
                }
                Ok(FrameSelector::Range(start..end))
            }
            None => Ok(FrameSelector::Index(index(s)?)),
        }
    }
}

impl From<usize> for FrameSelector {
    fn from(index: usize) -> Self {
        FrameSelector::Index(index)
    }
}

impl From<Range<usize>> for FrameSelector {
    fn from(range: Range<usize>) -> Self {
        FrameSelector::Range(range)
    }
}

impl From<Option<usize>> for FrameSelector {
    fn from(index: Option<usize>) -> Self {
        index.map_or(FrameSelector::All, FrameSelector::Index)
    }
}

/// ERA5 variables sharing one `(valid_time, latitude, longitude)` grid.
///
/// Missing observations are stored as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    valid_time: Vec<DateTime<Utc>>,
    latitude: Array1<f64>,
    longitude: Array1<f64>,
    aux_coords: BTreeMap<String, Array2<f64>>,
    variables: BTreeMap<String, Array3<f64>>,
}

impl GriddedField {
    /// Creates a field with the given axes and no variables.
    pub fn new(
        valid_time: Vec<DateTime<Utc>>,
        latitude: Array1<f64>,
        longitude: Array1<f64>,
    ) -> Self {
        Self {
            valid_time,
            latitude,
            longitude,
            aux_coords: BTreeMap::new(),
            variables: BTreeMap::new(),
        }
    }

    /// Adds a data variable shaped `(n_time, n_lat, n_lon)`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::VariableShape`] if the array does not match the axes and
    /// [`FieldError::ReservedName`] if `name` is one of the axis coordinates.
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        data: Array3<f64>,
    ) -> Result<Self, FieldError> {
        self.insert_variable(name.into(), data)?;
        Ok(self)
    }

    /// Adds a two-dimensional spatial coordinate shaped `(n_lat, n_lon)`, e.g. the
    /// cell latitudes of a curvilinear grid.
    pub fn with_aux_coord(
        mut self,
        name: impl Into<String>,
        data: Array2<f64>,
    ) -> Result<Self, FieldError> {
        let name = name.into();
        Self::check_reserved(&name)?;
        let expected = [self.latitude.len(), self.longitude.len()];
        if data.shape() != expected {
            return Err(FieldError::CoordinateShape {
                name,
                expected,
                found: data.shape().to_vec(),
            });
        }
        self.aux_coords.insert(name, data);
        Ok(self)
    }

    pub(crate) fn insert_variable(
        &mut self,
        name: String,
        data: Array3<f64>,
    ) -> Result<(), FieldError> {
        Self::check_reserved(&name)?;
        let (n_time, n_lat, n_lon) = self.shape();
        let expected = [n_time, n_lat, n_lon];
        if data.shape() != expected {
            return Err(FieldError::VariableShape {
                name,
                expected,
                found: data.shape().to_vec(),
            });
        }
        self.variables.insert(name, data);
        Ok(())
    }

    fn check_reserved(name: &str) -> Result<(), FieldError> {
        if [TIME_COORD, LATITUDE_COORD, LONGITUDE_COORD].contains(&name) {
            return Err(FieldError::ReservedName(name.to_string()));
        }
        Ok(())
    }

    /// Axis lengths as `(n_time, n_lat, n_lon)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (
            self.valid_time.len(),
            self.latitude.len(),
            self.longitude.len(),
        )
    }

    pub fn valid_time(&self) -> &[DateTime<Utc>] {
        &self.valid_time
    }

    pub fn latitude(&self) -> &Array1<f64> {
        &self.latitude
    }

    pub fn longitude(&self) -> &Array1<f64> {
        &self.longitude
    }

    pub fn variable(&self, name: &str) -> Option<&Array3<f64>> {
        self.variables.get(name)
    }

    pub fn aux_coord(&self, name: &str) -> Option<&Array2<f64>> {
        self.aux_coords.get(name)
    }

    /// Data variable names in sorted order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub(crate) fn variables(&self) -> &BTreeMap<String, Array3<f64>> {
        &self.variables
    }

    /// True for the three axis coordinates and any auxiliary coordinate.
    pub fn is_coordinate(&self, name: &str) -> bool {
        [TIME_COORD, LATITUDE_COORD, LONGITUDE_COORD].contains(&name)
            || self.aux_coords.contains_key(name)
    }
}
