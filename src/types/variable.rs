//! Variable metadata: unit conversions and display attributes, keyed by the
//! short ERA5 variable identifier (`t2m`, `sp`, ...).
//!
//! The registry is plain configuration. Estimators and renderers look a variable
//! up here instead of special-casing names, so adding a variable means adding an
//! entry rather than touching the estimators.

use crate::render::colormap::Colormap;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// Affine conversion from the stored unit to the display unit: `v * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitConversion {
    pub scale: f64,
    pub offset: f64,
}

impl Default for UnitConversion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl UnitConversion {
    pub const IDENTITY: UnitConversion = UnitConversion {
        scale: 1.0,
        offset: 0.0,
    };

    /// Kelvin to degrees Celsius.
    pub const KELVIN_TO_CELSIUS: UnitConversion = UnitConversion::offset(-273.15);
    /// Pascal to millimetres of mercury.
    pub const PASCAL_TO_MMHG: UnitConversion = UnitConversion::scale(0.00750062);
    /// Metres to millimetres.
    pub const METRES_TO_MM: UnitConversion = UnitConversion::scale(1000.0);

    pub const fn offset(offset: f64) -> Self {
        Self { scale: 1.0, offset }
    }

    pub const fn scale(scale: f64) -> Self {
        Self { scale, offset: 0.0 }
    }

    pub fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    pub fn apply_all(&self, values: &Array1<f64>) -> Array1<f64> {
        values.mapv(|v| self.apply(v))
    }
}

/// Everything the crate knows about one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub title: String,
    pub units: String,
    #[serde(default)]
    pub colormap: Colormap,
    #[serde(default)]
    pub conversion: UnitConversion,
    /// Render on a logarithmic colour scale.
    #[serde(default)]
    pub log_scale: bool,
}

impl VariableSpec {
    pub fn new(name: &str, title: &str, units: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            units: units.to_string(),
            colormap: Colormap::default(),
            conversion: UnitConversion::IDENTITY,
            log_scale: false,
        }
    }

    pub fn with_conversion(mut self, conversion: UnitConversion) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    pub fn with_log_scale(mut self, log_scale: bool) -> Self {
        self.log_scale = log_scale;
        self
    }
}

/// Lookup table from variable identifier to [`VariableSpec`].
///
/// [`VariableRegistry::default`] holds the seven ERA5 single-level variables the
/// downloader requests. Unknown variables pass through unconverted.
///
/// # Examples
///
/// ```
/// use era5_explorer::{UnitConversion, VariableRegistry, VariableSpec};
///
/// let mut registry = VariableRegistry::default();
/// assert_eq!(registry.conversion_for("t2m").apply(273.15), 0.0);
/// assert_eq!(registry.conversion_for("unknown"), UnitConversion::IDENTITY);
///
/// registry.insert(
///     VariableSpec::new("d2m", "2m Dewpoint Temperature", "°C")
///         .with_conversion(UnitConversion::KELVIN_TO_CELSIUS),
/// );
/// assert!(registry.get("d2m").is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRegistry {
    specs: BTreeMap<String, VariableSpec>,
}

impl Default for VariableRegistry {
    fn default() -> Self {
        Self::era5()
    }
}

impl VariableRegistry {
    /// An empty registry: every variable is unconverted.
    pub fn empty() -> Self {
        Self {
            specs: BTreeMap::new(),
        }
    }

    /// The ERA5 single-level variables used by this crate.
    pub fn era5() -> Self {
        let mut registry = Self::empty();
        for spec in [
            VariableSpec::new("u10", "10m U Wind", "m/s"),
            VariableSpec::new("v10", "10m V Wind", "m/s"),
            VariableSpec::new("t2m", "2m Temperature", "°C")
                .with_conversion(UnitConversion::KELVIN_TO_CELSIUS),
            VariableSpec::new("sst", "Sea Surface Temperature", "°C")
                .with_conversion(UnitConversion::KELVIN_TO_CELSIUS),
            VariableSpec::new("sp", "Surface Pressure", "mmHg")
                .with_conversion(UnitConversion::PASCAL_TO_MMHG)
                .with_colormap(Colormap::Viridis),
            VariableSpec::new("skt", "Skin Temperature", "°C")
                .with_conversion(UnitConversion::KELVIN_TO_CELSIUS),
            VariableSpec::new("tp", "Total Precipitation", "mm")
                .with_conversion(UnitConversion::METRES_TO_MM)
                .with_colormap(Colormap::Blues)
                .with_log_scale(true),
        ] {
            registry.insert(spec);
        }
        registry
    }

    /// Reads a JSON array of [`VariableSpec`]s. Entries override the ERA5 defaults
    /// with the same name.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        let specs: Vec<VariableSpec> = serde_json::from_reader(reader)?;
        let mut registry = Self::era5();
        for spec in specs {
            registry.insert(spec);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, spec: VariableSpec) -> Option<VariableSpec> {
        self.specs.insert(spec.name.clone(), spec)
    }

    pub fn get(&self, name: &str) -> Option<&VariableSpec> {
        self.specs.get(name)
    }

    pub fn conversion_for(&self, name: &str) -> UnitConversion {
        self.get(name)
            .map(|spec| spec.conversion)
            .unwrap_or(UnitConversion::IDENTITY)
    }

    /// Returns the registered spec, or a neutral one titled after the variable.
    pub fn spec_or_default(&self, name: &str) -> VariableSpec {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| VariableSpec::new(name, name, ""))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_era5_conversions() {
        let registry = VariableRegistry::era5();
        assert_eq!(registry.conversion_for("t2m").apply(300.0), 300.0 - 273.15);
        assert_eq!(registry.conversion_for("skt").apply(273.15), 0.0);
        assert_eq!(
            registry.conversion_for("sp").apply(101_325.0),
            101_325.0 * 0.00750062
        );
        assert_eq!(registry.conversion_for("tp").apply(0.002), 2.0);
        assert_eq!(registry.conversion_for("u10").apply(-3.5), -3.5);
        assert_eq!(registry.names().count(), 7);
    }

    #[test]
    fn test_apply_all_keeps_nan() {
        let converted = UnitConversion::KELVIN_TO_CELSIUS.apply_all(&array![273.15, f64::NAN]);
        assert_eq!(converted[0], 0.0);
        assert!(converted[1].is_nan());
    }

    #[test]
    fn test_registry_from_json_overrides_defaults() -> Result<(), serde_json::Error> {
        let json = r#"[
            {"name": "t2m", "title": "Air temperature", "units": "K"},
            {"name": "swvl1", "title": "Soil water", "units": "m3/m3",
             "conversion": {"scale": 100.0, "offset": 0.0}, "colormap": "blues"}
        ]"#;
        let registry = VariableRegistry::from_json_reader(json.as_bytes())?;

        assert_eq!(registry.conversion_for("t2m"), UnitConversion::IDENTITY);
        assert_eq!(registry.get("t2m").unwrap().units, "K");
        assert_eq!(registry.conversion_for("swvl1").apply(0.25), 25.0);
        assert_eq!(registry.get("swvl1").unwrap().colormap, Colormap::Blues);
        // untouched defaults survive
        assert_eq!(registry.conversion_for("tp"), UnitConversion::METRES_TO_MM);
        Ok(())
    }

    #[test]
    fn test_spec_or_default() {
        let registry = VariableRegistry::empty();
        let spec = registry.spec_or_default("cape");
        assert_eq!(spec.title, "cape");
        assert_eq!(spec.conversion, UnitConversion::IDENTITY);
    }
}
