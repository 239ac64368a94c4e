//! The body of a CDS retrieve request for ERA5 single-level data.

use crate::download::error::DownloadError;
use bon::Builder;
use serde::{Deserialize, Serialize};

/// CDS dataset identifier for ERA5 hourly data on single levels.
pub const ERA5_SINGLE_LEVELS: &str = "reanalysis-era5-single-levels";

/// Variables requested by default, by their CDS long names. On disk they appear
/// as `u10`, `v10`, `t2m`, `sst`, `sp`, `tp` and `skt`.
pub const DEFAULT_VARIABLES: [&str; 7] = [
    "10m_u_component_of_wind",
    "10m_v_component_of_wind",
    "2m_temperature",
    "sea_surface_temperature",
    "surface_pressure",
    "total_precipitation",
    "skin_temperature",
];

/// Bounding box in degrees. Serialised in the CDS order `[north, west, south, east]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 4]", from = "[f64; 4]")]
pub struct Area {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl Default for Area {
    fn default() -> Self {
        Self {
            north: 40.0,
            west: 20.0,
            south: 20.0,
            east: -20.0,
        }
    }
}

impl From<Area> for [f64; 4] {
    fn from(area: Area) -> Self {
        [area.north, area.west, area.south, area.east]
    }
}

impl From<[f64; 4]> for Area {
    fn from([north, west, south, east]: [f64; 4]) -> Self {
        Self {
            north,
            west,
            south,
            east,
        }
    }
}

/// Calendar window of a download. Years, months and days are expanded
/// independently, so `1..=2` months with `1..=3` days requests six dates per year.
///
/// # Examples
///
/// ```
/// use era5_explorer::DownloadWindow;
///
/// let window = DownloadWindow::builder().start_month(6).end_month(8).build();
/// assert_eq!(window.archive_name(), "era5-6-1-2025--8-31-2025.zip");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct DownloadWindow {
    #[builder(default = 2025)]
    pub start_year: i32,
    #[builder(default = 2025)]
    pub end_year: i32,
    #[builder(default = 1)]
    pub start_month: u32,
    #[builder(default = 12)]
    pub end_month: u32,
    #[builder(default = 1)]
    pub start_day: u32,
    #[builder(default = 31)]
    pub end_day: u32,
}

impl Default for DownloadWindow {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DownloadWindow {
    pub fn validate(&self) -> Result<(), DownloadError> {
        if self.start_year > self.end_year {
            return Err(DownloadError::InvalidWindow(format!(
                "start year {} is after end year {}",
                self.start_year, self.end_year
            )));
        }
        for (what, start, end, max) in [
            ("month", self.start_month, self.end_month, 12),
            ("day", self.start_day, self.end_day, 31),
        ] {
            if start < 1 || end > max {
                return Err(DownloadError::InvalidWindow(format!(
                    "{} range {}..={} outside 1..={}",
                    what, start, end, max
                )));
            }
            if start > end {
                return Err(DownloadError::InvalidWindow(format!(
                    "start {} {} is after end {} {}",
                    what, start, what, end
                )));
            }
        }
        Ok(())
    }

    /// File name of the zip archive this window downloads to.
    pub fn archive_name(&self) -> String {
        format!(
            "era5-{}-{}-{}--{}-{}-{}.zip",
            self.start_month,
            self.start_day,
            self.start_year,
            self.end_month,
            self.end_day,
            self.end_year
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrieveRequest {
    pub product_type: Vec<String>,
    pub variable: Vec<String>,
    pub year: Vec<String>,
    pub month: Vec<String>,
    pub day: Vec<String>,
    pub time: Vec<String>,
    pub data_format: String,
    pub download_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Area>,
}

impl RetrieveRequest {
    /// Hourly reanalysis for every date in `window`, as zipped NetCDF.
    pub fn new(
        window: &DownloadWindow,
        variables: &[&str],
        area: Option<Area>,
    ) -> Result<Self, DownloadError> {
        window.validate()?;
        Ok(Self {
            product_type: vec!["reanalysis".to_string()],
            variable: variables.iter().map(|v| v.to_string()).collect(),
            year: (window.start_year..=window.end_year)
                .map(|y| y.to_string())
                .collect(),
            month: (window.start_month..=window.end_month)
                .map(|m| format!("{:02}", m))
                .collect(),
            day: (window.start_day..=window.end_day)
                .map(|d| format!("{:02}", d))
                .collect(),
            time: (0..24).map(|h| format!("{:02}:00", h)).collect(),
            data_format: "netcdf".to_string(),
            download_format: "zip".to_string(),
            area,
        })
    }
}
