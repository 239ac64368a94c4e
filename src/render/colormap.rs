//! Colour maps and value normalisation for heat maps.

use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Colour drawn for missing values.
pub const MISSING_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

/// Named colour maps, sampled at five evenly spaced stops and interpolated
/// linearly in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Diverging blue to red.
    #[default]
    Coolwarm,
    Viridis,
    /// Sequential white to dark blue.
    Blues,
}

const COOLWARM: [[u8; 3]; 5] = [
    [59, 76, 192],
    [124, 159, 249],
    [221, 221, 221],
    [244, 154, 123],
    [180, 4, 38],
];

const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];

const BLUES: [[u8; 3]; 5] = [
    [247, 251, 255],
    [198, 219, 239],
    [107, 174, 214],
    [33, 113, 181],
    [8, 48, 107],
];

impl Colormap {
    fn stops(&self) -> &'static [[u8; 3]; 5] {
        match self {
            Colormap::Coolwarm => &COOLWARM,
            Colormap::Viridis => &VIRIDIS,
            Colormap::Blues => &BLUES,
        }
    }

    /// Colour at fraction `t` of the map; `t` is clamped to `[0, 1]`.
    pub fn color_at(&self, t: f64) -> Rgb<u8> {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f64;
        let lower = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - lower as f64;
        let (a, b) = (stops[lower], stops[lower + 1]);
        let mix = |i: usize| (a[i] as f64 + frac * (b[i] as f64 - a[i] as f64)).round() as u8;
        Rgb([mix(0), mix(1), mix(2)])
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Colormap::Coolwarm => "coolwarm",
            Colormap::Viridis => "viridis",
            Colormap::Blues => "blues",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Colormap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coolwarm" => Ok(Colormap::Coolwarm),
            "viridis" => Ok(Colormap::Viridis),
            "blues" => Ok(Colormap::Blues),
            other => Err(format!("unknown colour map '{}'", other)),
        }
    }
}

/// Maps data values onto `[0, 1]` for a colour map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Normalization {
    Linear { vmin: f64, vmax: f64 },
    /// Logarithmic; non-positive values are treated as missing.
    Log { vmin: f64, vmax: f64 },
}

impl Normalization {
    pub fn limits(&self) -> (f64, f64) {
        match *self {
            Normalization::Linear { vmin, vmax } | Normalization::Log { vmin, vmax } => {
                (vmin, vmax)
            }
        }
    }

    /// Position of `value` between the limits, clamped to `[0, 1]`. `None` for
    /// values that cannot be placed on the scale.
    pub fn fraction(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let t = match *self {
            Normalization::Linear { vmin, vmax } => {
                if vmax == vmin {
                    0.5
                } else {
                    (value - vmin) / (vmax - vmin)
                }
            }
            Normalization::Log { vmin, vmax } => {
                if value <= 0.0 {
                    return None;
                }
                if vmax <= vmin {
                    0.5
                } else {
                    (value.ln() - vmin.ln()) / (vmax.ln() - vmin.ln())
                }
            }
        };
        Some(t.clamp(0.0, 1.0))
    }

    /// Inverse of [`fraction`](Self::fraction) for `t` in `[0, 1]`.
    pub fn value_at(&self, t: f64) -> f64 {
        match *self {
            Normalization::Linear { vmin, vmax } => vmin + t * (vmax - vmin),
            Normalization::Log { vmin, vmax } => (vmin.ln() + t * (vmax.ln() - vmin.ln())).exp(),
        }
    }

    /// Colour bar tick values inside the limits, ascending.
    ///
    /// Linear scales get `count` evenly spaced ticks including both ends. Log
    /// scales get `k * 10^e` for `k` in `1..=9`.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match *self {
            Normalization::Linear { vmin, vmax } => {
                if count < 2 || vmax == vmin {
                    return vec![vmin];
                }
                (0..count)
                    .map(|i| vmin + (vmax - vmin) * i as f64 / (count - 1) as f64)
                    .collect()
            }
            Normalization::Log { vmin, vmax } => {
                if vmin <= 0.0 || vmax < vmin {
                    return Vec::new();
                }
                let first = vmin.log10().floor() as i32;
                let last = vmax.log10().ceil() as i32;
                let mut ticks = Vec::new();
                for exponent in first..=last {
                    for k in 1..=9 {
                        let tick = k as f64 * 10f64.powi(exponent);
                        if tick >= vmin * (1.0 - 1e-12) && tick <= vmax * (1.0 + 1e-12) {
                            ticks.push(tick);
                        }
                    }
                }
                ticks
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(Colormap::Coolwarm.color_at(0.0), Rgb([59, 76, 192]));
        assert_eq!(Colormap::Coolwarm.color_at(1.0), Rgb([180, 4, 38]));
        assert_eq!(Colormap::Coolwarm.color_at(0.5), Rgb([221, 221, 221]));
        assert_eq!(Colormap::Viridis.color_at(2.0), Rgb([253, 231, 37]));
        assert_eq!(Colormap::Blues.color_at(-1.0), Rgb([247, 251, 255]));
        // halfway between the first two stops
        assert_eq!(Colormap::Viridis.color_at(0.125), Rgb([64, 42, 112]));
    }

    #[test]
    fn test_colormap_names() {
        assert_eq!("Blues".parse::<Colormap>(), Ok(Colormap::Blues));
        assert_eq!(Colormap::Viridis.to_string(), "viridis");
        assert!("jet".parse::<Colormap>().is_err());
    }

    #[test]
    fn test_linear_fraction() {
        let norm = Normalization::Linear {
            vmin: -10.0,
            vmax: 30.0,
        };
        assert_eq!(norm.fraction(10.0), Some(0.5));
        assert_eq!(norm.fraction(100.0), Some(1.0));
        assert_eq!(norm.fraction(f64::NAN), None);
        assert_eq!(norm.value_at(0.25), 0.0);
        assert_eq!(norm.ticks(5), vec![-10.0, 0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_log_fraction_and_ticks() {
        let norm = Normalization::Log {
            vmin: 1e-4,
            vmax: 1e-2,
        };
        let mid = norm.fraction(1e-3).unwrap();
        assert!((mid - 0.5).abs() < 1e-12);
        assert_eq!(norm.fraction(0.0), None);
        assert_eq!(norm.fraction(1.0), Some(1.0));

        let ticks = norm.ticks(0);
        assert_eq!(ticks.len(), 19);
        assert!((ticks[0] - 1e-4).abs() < 1e-18);
        assert!((ticks[18] - 1e-2).abs() < 1e-15);
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    }
}
