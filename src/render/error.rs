use crate::density::error::DensityError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Density(#[from] DensityError),

    #[error("Invalid render options: {0}")]
    InvalidOptions(String),

    #[error("Failed to encode image '{0}'")]
    Image(PathBuf, #[source] image::ImageError),

    #[error("I/O error writing '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to write overlay file '{0}'")]
    Json(PathBuf, #[source] serde_json::Error),
}
