//! This module provides the main entry point of the crate. An [`Era5Explorer`]
//! ties a project directory to the download, preprocessing, density and
//! animation steps so that each can be called with a few builder arguments.

use crate::density::kde1d::{estimate_1d, DensityEstimate1D, DEFAULT_BINS, DEFAULT_SMOOTH_SIGMA};
use crate::density::kde2d::{estimate_2d, DensityEstimate2D, Kde2dConfig, YBins};
use crate::download::client::{CdsClient, DEFAULT_POLL_INTERVAL};
use crate::download::credentials::CdsCredentials;
use crate::download::request::{
    Area, DownloadWindow, RetrieveRequest, DEFAULT_VARIABLES, ERA5_SINGLE_LEVELS,
};
use crate::error::Era5Error;
use crate::preprocess::Preprocessor;
use crate::render::animation::{AnimationOptions, AnimationOutput, Animator};
use crate::types::axis::AxisVariable;
use crate::types::field::{FrameSelector, GriddedField};
use crate::types::variable::VariableRegistry;
use crate::utils::{ensure_dir_exists, ProjectLayout};
use bon::bon;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task;

/// The main handle for working with ERA5 data in a project directory.
///
/// Create one with [`Era5Explorer::new()`] (rooted at `$PROJECT_DIR` or the
/// current directory) or [`Era5Explorer::with_project_dir()`].
///
/// # Examples
///
/// ```rust
/// # use era5_explorer::{AxisVariable, Era5Explorer, Era5Error};
/// # async fn run() -> Result<(), Era5Error> {
/// let explorer = Era5Explorer::new().await?;
/// let field = explorer.load_field().call().await?;
///
/// let t2m = explorer.kde1d().field(&field).variable("t2m").call()?;
/// println!("mean 2m temperature: {:.2}", t2m.mean);
///
/// let by_hour = explorer
///     .kde2d()
///     .field(&field)
///     .axis(AxisVariable::TimeOfDay)
///     .variable("t2m")
///     .call()?;
/// println!("{} hour buckets", by_hour.bins_x());
/// # Ok(())
/// # }
/// ```
pub struct Era5Explorer {
    layout: ProjectLayout,
    registry: VariableRegistry,
    kde2d_config: Kde2dConfig,
}

#[bon]
impl Era5Explorer {
    /// Creates an explorer rooted at `project_dir`, creating its raw data
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Era5Error::DirCreation`] if the directory cannot be created.
    pub async fn with_project_dir(project_dir: PathBuf) -> Result<Self, Era5Error> {
        let layout = ProjectLayout::new(project_dir);
        let raw_dir = layout.raw_dir();
        ensure_dir_exists(&raw_dir)
            .await
            .map_err(|e| Era5Error::DirCreation(raw_dir.clone(), e))?;
        Ok(Self {
            layout,
            registry: VariableRegistry::era5(),
            kde2d_config: Kde2dConfig::default(),
        })
    }

    /// Creates an explorer rooted at `$PROJECT_DIR`, or the current directory
    /// when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`Era5Error::ProjectDirResolution`] if the current directory cannot
    /// be read and [`Era5Error::DirCreation`] as [`Era5Explorer::with_project_dir`].
    pub async fn new() -> Result<Self, Era5Error> {
        let layout = ProjectLayout::from_env().map_err(Era5Error::ProjectDirResolution)?;
        Self::with_project_dir(layout.root().to_path_buf()).await
    }

    /// Replaces the variable registry used for unit conversion and display.
    pub fn with_registry(mut self, registry: VariableRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_kde2d_config(mut self, config: Kde2dConfig) -> Self {
        self.kde2d_config = config;
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Downloads an ERA5 archive into `data/raw`.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.window(DownloadWindow)`: Optional. Dates to request. Defaults to all of 2025.
    /// * `.area(Area)`: Optional. Bounding box. Defaults to [`Area::default`].
    /// * `.variables(Vec<String>)`: Optional. CDS variable names. Defaults to the seven
    ///   variables in [`DEFAULT_VARIABLES`].
    /// * `.credentials(CdsCredentials)`: Optional. Defaults to [`CdsCredentials::from_env`].
    /// * `.poll_interval(Duration)`: Optional. Delay between job status checks. Defaults to 5 s.
    ///
    /// # Returns
    ///
    /// The path of the archive. An archive already present under the same name is
    /// returned without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns [`Era5Error::Download`] for invalid windows, missing credentials,
    /// network or HTTP failures and failed retrieve jobs.
    #[builder]
    pub async fn download(
        &self,
        window: Option<DownloadWindow>,
        area: Option<Area>,
        variables: Option<Vec<String>>,
        credentials: Option<CdsCredentials>,
        poll_interval: Option<Duration>,
    ) -> Result<PathBuf, Era5Error> {
        let window = window.unwrap_or_default();
        let area = area.unwrap_or_default();
        let variables =
            variables.unwrap_or_else(|| DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect());
        let names: Vec<&str> = variables.iter().map(String::as_str).collect();
        let request = RetrieveRequest::new(&window, &names, Some(area))?;

        let credentials = match credentials {
            Some(credentials) => credentials,
            None => CdsCredentials::from_env()?,
        };
        let client = CdsClient::new(credentials)
            .with_poll_interval(poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL));
        let target = self.layout.raw_dir().join(window.archive_name());
        Ok(client
            .retrieve(ERA5_SINGLE_LEVELS, &request, &target)
            .await?)
    }

    /// Loads the merged field of an archive, preprocessing it on first use.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.archive(PathBuf)`: Optional. Archive to load. Defaults to the most recently
    ///   modified `.zip` in `data/raw`.
    ///
    /// # Errors
    ///
    /// Returns [`Era5Error::Preprocess`] if no archive exists, extraction or reading
    /// fails, the datasets cannot be merged, or the parquet cache cannot be used.
    #[builder]
    pub async fn load_field(&self, archive: Option<PathBuf>) -> Result<GriddedField, Era5Error> {
        let preprocessor = Preprocessor::new(self.layout.clone());
        Ok(preprocessor.load(archive.as_deref()).await?)
    }

    /// Smoothed distribution of one variable, in display units.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.field(&GriddedField)`: **Required.**
    /// * `.variable(&str)`: **Required.** Variable or coordinate name.
    /// * `.frame(FrameSelector)`: Optional. Time steps to include. Defaults to all.
    /// * `.bins(usize)`: Optional. Defaults to `100`.
    /// * `.smooth_sigma(f64)`: Optional. Gaussian smoothing in bins. Defaults to `1.0`.
    ///
    /// # Errors
    ///
    /// Returns [`Era5Error::Density`] as described on [`estimate_1d`].
    #[builder]
    pub fn kde1d(
        &self,
        field: &GriddedField,
        variable: &str,
        frame: Option<FrameSelector>,
        bins: Option<usize>,
        smooth_sigma: Option<f64>,
    ) -> Result<DensityEstimate1D, Era5Error> {
        Ok(estimate_1d(
            field,
            &self.registry,
            variable,
            &frame.unwrap_or_default(),
            bins.unwrap_or(DEFAULT_BINS),
            smooth_sigma.unwrap_or(DEFAULT_SMOOTH_SIGMA),
        )?)
    }

    /// Joint distribution of a positional axis and a variable.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.field(&GriddedField)`: **Required.**
    /// * `.axis(AxisVariable)`: **Required.** Hour of day, latitude or longitude.
    /// * `.variable(&str)`: **Required.**
    /// * `.y_bins(YBins)`: Optional. Defaults to 100 equal-width buckets.
    /// * `.smooth_sigma(f64)`: Optional. Defaults to `1.0`.
    /// * `.frame(FrameSelector)`: Optional. Defaults to all time steps.
    ///
    /// # Errors
    ///
    /// Returns [`Era5Error::Density`] as described on [`estimate_2d`].
    #[builder]
    pub fn kde2d(
        &self,
        field: &GriddedField,
        axis: AxisVariable,
        variable: &str,
        y_bins: Option<YBins>,
        smooth_sigma: Option<f64>,
        frame: Option<FrameSelector>,
    ) -> Result<DensityEstimate2D, Era5Error> {
        Ok(estimate_2d(
            field,
            &self.registry,
            &self.kde2d_config,
            axis,
            variable,
            &y_bins.unwrap_or_default(),
            smooth_sigma.unwrap_or(DEFAULT_SMOOTH_SIGMA),
            &frame.unwrap_or_default(),
        )?)
    }

    /// Renders an animated GIF of `variable` over every time step.
    ///
    /// Rendering runs on a blocking thread.
    ///
    /// # Arguments
    ///
    /// * `.field(&GriddedField)`: **Required.**
    /// * `.variable(&str)`: **Required.**
    /// * `.options(AnimationOptions)`: Optional. Defaults to 5 fps with frames saved.
    ///
    /// # Errors
    ///
    /// Returns [`Era5Error::Render`] if the variable is missing or entirely
    /// empty, or if any output cannot be written.
    #[builder]
    pub async fn animate(
        &self,
        field: &GriddedField,
        variable: &str,
        options: Option<AnimationOptions>,
    ) -> Result<AnimationOutput, Era5Error> {
        let options = options.unwrap_or_default();
        let field = field.clone();
        let registry = self.registry.clone();
        let animator = Animator::new(self.layout.clone());
        let variable = variable.to_string();
        let output = task::spawn_blocking(move || {
            animator.animate(&field, &registry, &variable, &options)
        })
        .await??;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::error::DensityError;
    use crate::density::test_support::temperature_field;
    use crate::download::request::DownloadWindow;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_explorer_estimates() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let explorer = Era5Explorer::with_project_dir(root.path().to_path_buf()).await?;
        assert!(explorer.layout().raw_dir().is_dir());

        let field = temperature_field();
        let stats = explorer.kde1d().field(&field).variable("t2m").bins(2).call()?;
        assert_eq!(stats.count, 7);

        let joint = explorer
            .kde2d()
            .field(&field)
            .axis(AxisVariable::TimeOfDay)
            .variable("t2m")
            .y_bins(YBins::Count(4))
            .call()?;
        assert_eq!(joint.hist.dim(), (2, 4));

        let err = explorer
            .kde1d()
            .field(&field)
            .variable("t2m")
            .frame(FrameSelector::Index(9))
            .call()
            .unwrap_err();
        assert!(matches!(
            err,
            Era5Error::Density(DensityError::FrameOutOfRange { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_explorer_animate() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let explorer = Era5Explorer::with_project_dir(root.path().to_path_buf()).await?;
        let output = explorer
            .animate()
            .field(&temperature_field())
            .variable("t2m")
            .options(AnimationOptions::builder().save_frames(false).build())
            .call()
            .await?;
        assert!(output.gif.is_file());
        Ok(())
    }

    #[tokio::test]
    async fn test_download_skips_existing_archive() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let explorer = Era5Explorer::with_project_dir(root.path().to_path_buf()).await?;
        let window = DownloadWindow::builder().end_month(1).build();
        let existing = explorer.layout().raw_dir().join(window.archive_name());
        std::fs::write(&existing, b"zip")?;

        let path = explorer
            .download()
            .window(window)
            .credentials(CdsCredentials::new("http://127.0.0.1:9/api", "key"))
            .call()
            .await?;
        assert_eq!(path, existing);
        Ok(())
    }
}
