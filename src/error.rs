use crate::density::error::DensityError;
use crate::download::error::DownloadError;
use crate::preprocess::error::PreprocessError;
use crate::render::error::RenderError;
use crate::types::field::FieldError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Era5Error {
    #[error(transparent)]
    Density(#[from] DensityError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("Failed to create directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine project directory")]
    ProjectDirResolution(#[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
