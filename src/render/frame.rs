//! Rendering of a single time step as a heat map with a colour bar.
//!
//! Rendering is a pure function of the prepared [`FieldView`], the frame index
//! and the overlay of the previous frame. Nothing is kept between calls.

use crate::density::error::DensityError;
use crate::render::colormap::{Colormap, Normalization, MISSING_COLOR};
use crate::types::field::GriddedField;
use crate::types::variable::{VariableRegistry, VariableSpec};
use chrono::{DateTime, Utc};
use image::{Rgb, RgbImage};
use ndarray::{s, Array3, ArrayView2};
use serde::Serialize;

/// Floor applied to the lower colour limit of log-scaled variables.
pub const LOG_VMIN_FLOOR: f64 = 1e-4;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const TICK_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// One variable of a field, converted to display units, with colour limits
/// taken over every time step.
#[derive(Debug, Clone)]
pub struct FieldView {
    spec: VariableSpec,
    valid_time: Vec<DateTime<Utc>>,
    latitude_ascending: bool,
    longitude_descending: bool,
    data: Array3<f64>,
    normalization: Normalization,
}

impl FieldView {
    pub fn new(
        field: &GriddedField,
        registry: &VariableRegistry,
        variable: &str,
    ) -> Result<Self, DensityError> {
        let raw = field
            .variable(variable)
            .ok_or_else(|| DensityError::NotFound(variable.to_string()))?;
        let spec = registry.spec_or_default(variable);
        let conversion = spec.conversion;
        let data = raw.mapv(|v| conversion.apply(v));

        let (vmin, vmax) = data
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })
            .ok_or_else(|| DensityError::EmptyData {
                variable: variable.to_string(),
            })?;
        let normalization = if spec.log_scale {
            Normalization::Log {
                vmin: vmin.max(LOG_VMIN_FLOOR),
                vmax,
            }
        } else {
            Normalization::Linear { vmin, vmax }
        };

        let lat = field.latitude();
        let lon = field.longitude();
        Ok(Self {
            spec,
            valid_time: field.valid_time().to_vec(),
            latitude_ascending: lat.len() > 1 && lat[0] < lat[lat.len() - 1],
            longitude_descending: lon.len() > 1 && lon[0] > lon[lon.len() - 1],
            data,
            normalization,
        })
    }

    pub fn spec(&self) -> &VariableSpec {
        &self.spec
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn n_frames(&self) -> usize {
        self.valid_time.len()
    }

    pub fn timestamp(&self, frame: usize) -> Option<DateTime<Utc>> {
        self.valid_time.get(frame).copied()
    }

    fn frame_data(&self, frame: usize) -> ArrayView2<'_, f64> {
        self.data.slice(s![frame, .., ..])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Colorbar {
    pub label: String,
    pub colormap: Colormap,
    pub normalization: Normalization,
    pub ticks: Vec<f64>,
}

impl Colorbar {
    fn for_view(view: &FieldView) -> Self {
        Self {
            label: view.spec.units.clone(),
            colormap: view.spec.colormap,
            normalization: view.normalization,
            ticks: view.normalization.ticks(5),
        }
    }
}

/// The text and colour bar accompanying a rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOverlay {
    pub frame: usize,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub min_label: String,
    pub max_label: String,
    pub colorbar: Option<Colorbar>,
}

/// Lays out heat map cells and the colour bar strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRenderer {
    /// Edge length, in pixels, of one grid cell.
    pub cell_px: u32,
    pub colorbar_gap: u32,
    pub colorbar_width: u32,
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self {
            cell_px: 4,
            colorbar_gap: 8,
            colorbar_width: 16,
        }
    }
}

impl FrameRenderer {
    pub fn new(cell_px: u32) -> Self {
        Self {
            cell_px,
            ..Self::default()
        }
    }

    /// Renders time step `frame` of `view`.
    ///
    /// Frame 0 creates the colour bar; later frames carry forward the one in
    /// `prior`, creating it only when none was carried. The `min:`/`max:` labels
    /// describe this frame alone.
    pub fn render_frame(
        &self,
        view: &FieldView,
        frame: usize,
        prior: Option<&FrameOverlay>,
    ) -> Result<(RgbImage, FrameOverlay), DensityError> {
        let timestamp = view.timestamp(frame).ok_or(DensityError::FrameOutOfRange {
            index: frame,
            len: view.n_frames(),
        })?;
        let data = view.frame_data(frame);

        let colorbar = match prior.and_then(|p| p.colorbar.clone()) {
            Some(carried) if frame != 0 => carried,
            _ => Colorbar::for_view(view),
        };

        let (frame_min, frame_max) = data
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::NAN, f64::NAN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let overlay = FrameOverlay {
            frame,
            timestamp,
            title: format!(
                "{} ({}) — {} UTC",
                view.spec.title,
                view.spec.units,
                timestamp.format("%Y-%m-%dT%H")
            ),
            min_label: format!("min: {:.1}", frame_min),
            max_label: format!("max: {:.1}", frame_max),
            colorbar: Some(colorbar),
        };

        let image = self.draw(view, data, overlay.colorbar.as_ref());
        Ok((image, overlay))
    }

    fn draw(&self, view: &FieldView, data: ArrayView2<'_, f64>, colorbar: Option<&Colorbar>) -> RgbImage {
        let (n_lat, n_lon) = data.dim();
        let cell = self.cell_px.max(1);
        let map_width = n_lon as u32 * cell;
        let height = (n_lat as u32 * cell).max(1);
        let width = map_width + self.colorbar_gap + self.colorbar_width;
        let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

        for ((i, j), &value) in data.indexed_iter() {
            let color = view
                .normalization
                .fraction(value)
                .map(|t| view.spec.colormap.color_at(t))
                .unwrap_or(MISSING_COLOR);
            // north up, west left
            let row = (if view.latitude_ascending { n_lat - 1 - i } else { i }) as u32;
            let col = (if view.longitude_descending { n_lon - 1 - j } else { j }) as u32;
            for dy in 0..cell {
                for dx in 0..cell {
                    image.put_pixel(col * cell + dx, row * cell + dy, color);
                }
            }
        }

        if let Some(colorbar) = colorbar {
            let x0 = map_width + self.colorbar_gap;
            let span = (height - 1).max(1) as f64;
            for y in 0..height {
                let color = colorbar.colormap.color_at(1.0 - y as f64 / span);
                for x in x0..x0 + self.colorbar_width {
                    image.put_pixel(x, y, color);
                }
            }
            let tick_len = (self.colorbar_width / 4).max(1);
            for t in colorbar
                .ticks
                .iter()
                .filter_map(|&tick| colorbar.normalization.fraction(tick))
            {
                let y = ((1.0 - t) * span).round() as u32;
                for x in x0..x0 + tick_len {
                    image.put_pixel(x, y.min(height - 1), TICK_COLOR);
                }
            }
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::test_support::temperature_field;
    use chrono::TimeZone;
    use ndarray::array;

    fn t2m_view() -> FieldView {
        FieldView::new(&temperature_field(), &VariableRegistry::era5(), "t2m").unwrap()
    }

    #[test]
    fn test_view_limits() {
        let view = t2m_view();
        let (vmin, vmax) = view.normalization().limits();
        assert!((vmin - (285.0 - 273.15)).abs() < 1e-12);
        assert!((vmax - (315.0 - 273.15)).abs() < 1e-12);
        assert_eq!(view.n_frames(), 2);
    }

    #[test]
    fn test_log_floor() -> Result<(), DensityError> {
        let times = vec![Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()];
        let field = GriddedField::new(times, array![1.0], array![0.0, 1.0])
            .with_variable(
                "tp",
                Array3::from_shape_vec((1, 1, 2), vec![0.0, 0.5]).unwrap(),
            )
            .unwrap();
        let view = FieldView::new(&field, &VariableRegistry::era5(), "tp")?;
        assert_eq!(
            view.normalization(),
            Normalization::Log {
                vmin: LOG_VMIN_FLOOR,
                vmax: 500.0
            }
        );
        Ok(())
    }

    #[test]
    fn test_overlay_text() -> Result<(), DensityError> {
        let view = t2m_view();
        let renderer = FrameRenderer::new(3);
        let (_, first) = renderer.render_frame(&view, 0, None)?;

        assert_eq!(first.title, "2m Temperature (°C) — 2025-01-01T00 UTC");
        assert_eq!(first.min_label, "min: 16.9");
        assert_eq!(first.max_label, "max: 36.9");

        let (_, second) = renderer.render_frame(&view, 1, Some(&first))?;
        assert_eq!(second.title, "2m Temperature (°C) — 2025-01-01T06 UTC");
        assert_eq!(second.min_label, "min: 11.9");
        assert_eq!(second.max_label, "max: 41.9");
        Ok(())
    }

    #[test]
    fn test_colorbar_is_carried_forward() -> Result<(), DensityError> {
        let view = t2m_view();
        let renderer = FrameRenderer::default();
        let marker = Colorbar {
            label: "carried".to_string(),
            colormap: Colormap::Blues,
            normalization: Normalization::Linear { vmin: 0.0, vmax: 1.0 },
            ticks: vec![],
        };
        let prior = FrameOverlay {
            frame: 0,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            title: String::new(),
            min_label: String::new(),
            max_label: String::new(),
            colorbar: Some(marker.clone()),
        };

        let (_, later) = renderer.render_frame(&view, 1, Some(&prior))?;
        assert_eq!(later.colorbar, Some(marker));

        // frame 0 always starts a fresh one
        let (_, first) = renderer.render_frame(&view, 0, Some(&prior))?;
        assert_eq!(first.colorbar.map(|c| c.label), Some("°C".to_string()));
        Ok(())
    }

    #[test]
    fn test_image_layout() -> Result<(), DensityError> {
        let view = t2m_view();
        let renderer = FrameRenderer {
            cell_px: 2,
            colorbar_gap: 1,
            colorbar_width: 4,
        };
        let (image, _) = renderer.render_frame(&view, 0, None)?;
        assert_eq!(image.dimensions(), (2 * 2 + 1 + 4, 2 * 2));

        // latitude 20 / longitude 0 is missing at frame 0; it is the bottom-left cell
        assert_eq!(*image.get_pixel(0, 3), MISSING_COLOR);
        assert_ne!(*image.get_pixel(0, 0), MISSING_COLOR);
        assert_eq!(*image.get_pixel(4, 0), BACKGROUND);
        Ok(())
    }

    #[test]
    fn test_frame_out_of_range() {
        let view = t2m_view();
        let err = FrameRenderer::default()
            .render_frame(&view, 5, None)
            .unwrap_err();
        assert!(matches!(err, DensityError::FrameOutOfRange { index: 5, len: 2 }));
    }

    #[test]
    fn test_unknown_variable() {
        let err = FieldView::new(&temperature_field(), &VariableRegistry::era5(), "sst").unwrap_err();
        assert!(matches!(err, DensityError::NotFound(_)));
    }
}
