use crate::types::field::{LATITUDE_COORD, LONGITUDE_COORD, TIME_COORD};
use std::fmt;
use std::str::FromStr;

/// The positional variable on the x axis of a joint (2D) density estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisVariable {
    /// Hour of day (UTC) of each time step.
    TimeOfDay,
    Latitude,
    Longitude,
}

impl AxisVariable {
    /// The field coordinate this axis is reconstructed from.
    pub fn coordinate(&self) -> &'static str {
        match self {
            AxisVariable::TimeOfDay => TIME_COORD,
            AxisVariable::Latitude => LATITUDE_COORD,
            AxisVariable::Longitude => LONGITUDE_COORD,
        }
    }
}

impl fmt::Display for AxisVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.coordinate())
    }
}

impl FromStr for AxisVariable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "valid_time" | "time" | "hour" => Ok(AxisVariable::TimeOfDay),
            "latitude" | "lat" => Ok(AxisVariable::Latitude),
            "longitude" | "lon" => Ok(AxisVariable::Longitude),
            other => Err(format!(
                "axis must be 'valid_time', 'latitude' or 'longitude', got '{}'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis() {
        assert_eq!("valid_time".parse(), Ok(AxisVariable::TimeOfDay));
        assert_eq!("Hour".parse(), Ok(AxisVariable::TimeOfDay));
        assert_eq!("lat".parse(), Ok(AxisVariable::Latitude));
        assert_eq!("longitude".parse(), Ok(AxisVariable::Longitude));
        assert!("t2m".parse::<AxisVariable>().is_err());
        assert_eq!(AxisVariable::Latitude.to_string(), "latitude");
    }
}
