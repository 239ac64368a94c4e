//! Animated GIFs of a variable over every time step.

use crate::render::error::RenderError;
use crate::render::frame::{FieldView, FrameOverlay, FrameRenderer};
use crate::types::field::GriddedField;
use crate::types::variable::VariableRegistry;
use crate::utils::ProjectLayout;
use bon::Builder;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame};
use log::{debug, info};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct AnimationOptions {
    #[builder(default = 5)]
    pub fps: u32,
    /// Also write every frame as a PNG.
    #[builder(default = true)]
    pub save_frames: bool,
    #[builder(default = 4)]
    pub cell_px: u32,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Files written by [`Animator::animate`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationOutput {
    pub gif: PathBuf,
    pub overlays: PathBuf,
    /// Empty unless frames were saved.
    pub frames: Vec<PathBuf>,
}

pub struct Animator {
    layout: ProjectLayout,
}

impl Animator {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    /// Renders every time step of `variable` and writes
    /// `{variable}_animation.gif` plus `frames/{variable}/overlays.json` (and the
    /// individual PNG frames if requested).
    pub fn animate(
        &self,
        field: &GriddedField,
        registry: &VariableRegistry,
        variable: &str,
        options: &AnimationOptions,
    ) -> Result<AnimationOutput, RenderError> {
        if options.fps == 0 {
            return Err(RenderError::InvalidOptions("fps must be positive".to_string()));
        }
        if options.cell_px == 0 {
            return Err(RenderError::InvalidOptions(
                "cell size must be positive".to_string(),
            ));
        }

        let view = FieldView::new(field, registry, variable)?;
        let renderer = FrameRenderer::new(options.cell_px);
        let frames_dir = self.layout.frames_dir(variable);
        fs::create_dir_all(&frames_dir).map_err(|e| RenderError::Io(frames_dir.clone(), e))?;

        let gif_path = self.layout.animation_path(variable);
        if let Some(parent) = gif_path.parent() {
            fs::create_dir_all(parent).map_err(|e| RenderError::Io(parent.to_path_buf(), e))?;
        }
        let gif_file = File::create(&gif_path).map_err(|e| RenderError::Io(gif_path.clone(), e))?;
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(gif_file), 10);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| RenderError::Image(gif_path.clone(), e))?;

        let mut overlays: Vec<FrameOverlay> = Vec::with_capacity(view.n_frames());
        let mut frame_paths = Vec::new();
        for frame in 0..view.n_frames() {
            let (image, overlay) = renderer.render_frame(&view, frame, overlays.last())?;

            if options.save_frames {
                let path = frames_dir.join(format!(
                    "frame_{:03}_{}_UTC.png",
                    frame,
                    overlay.timestamp.format("%Y-%m-%dT%H")
                ));
                image
                    .save(&path)
                    .map_err(|e| RenderError::Image(path.clone(), e))?;
                frame_paths.push(path);
            }

            let rgba = DynamicImage::ImageRgb8(image).into_rgba8();
            encoder
                .encode_frame(Frame::from_parts(
                    rgba,
                    0,
                    0,
                    Delay::from_numer_denom_ms(1000, options.fps),
                ))
                .map_err(|e| RenderError::Image(gif_path.clone(), e))?;
            debug!("Rendered frame {} of '{}': {}", frame, variable, overlay.title);
            overlays.push(overlay);
        }
        drop(encoder);

        let overlays_path = frames_dir.join("overlays.json");
        let overlays_file =
            File::create(&overlays_path).map_err(|e| RenderError::Io(overlays_path.clone(), e))?;
        serde_json::to_writer_pretty(BufWriter::new(overlays_file), &overlays)
            .map_err(|e| RenderError::Json(overlays_path.clone(), e))?;

        info!(
            "Animation saved: {:?} ({} frames at {} fps)",
            gif_path,
            overlays.len(),
            options.fps
        );
        Ok(AnimationOutput {
            gif: gif_path,
            overlays: overlays_path,
            frames: frame_paths,
        })
    }
}
