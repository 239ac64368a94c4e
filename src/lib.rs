pub mod density;
pub mod download;
mod error;
mod explorer;
pub mod preprocess;
pub mod render;
pub mod types;
mod utils;

pub use error::Era5Error;
pub use explorer::*;
pub use utils::{ensure_dir_exists, ProjectLayout, PROJECT_DIR_ENV};

pub use types::axis::AxisVariable;
pub use types::field::{FieldError, FrameSelector, GriddedField};
pub use types::variable::{UnitConversion, VariableRegistry, VariableSpec};

pub use density::error::DensityError;
pub use density::export::write_csv;
pub use density::kde1d::{estimate_1d, DensityEstimate1D};
pub use density::kde2d::{estimate_2d, DensityEstimate2D, Kde2dConfig, YBins};

pub use download::credentials::CdsCredentials;
pub use download::error::DownloadError;
pub use download::request::{Area, DownloadWindow};

pub use preprocess::error::PreprocessError;
pub use preprocess::Preprocessor;

pub use render::animation::{AnimationOptions, AnimationOutput};
pub use render::colormap::{Colormap, Normalization};
pub use render::error::RenderError;
