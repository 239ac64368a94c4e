//! Turns a downloaded archive into one merged [`GriddedField`], cached as parquet.

pub mod archive;
pub mod cache;
pub mod error;
pub mod merge;
pub mod netcdf_reader;

use crate::preprocess::archive::{extract_archive, latest_archive, list_datasets};
use crate::preprocess::cache::{read_cache, write_cache, CACHE_FILE_NAME};
use crate::preprocess::error::PreprocessError;
use crate::preprocess::merge::merge;
use crate::preprocess::netcdf_reader::read_netcdf;
use crate::types::field::GriddedField;
use crate::utils::ProjectLayout;
use log::{info, warn};
use std::path::{Path, PathBuf};
use tokio::{fs, task};

pub struct Preprocessor {
    layout: ProjectLayout,
}

impl Preprocessor {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    /// Resolves `archive`, defaulting to the newest one in the raw directory.
    pub async fn resolve_archive(&self, archive: Option<&Path>) -> Result<PathBuf, PreprocessError> {
        match archive {
            Some(path) => Ok(path.to_path_buf()),
            None => {
                let raw_dir = self.layout.raw_dir();
                task::spawn_blocking(move || latest_archive(&raw_dir)).await?
            }
        }
    }

    /// Loads the merged field for `archive`.
    ///
    /// On a cache miss the archive is extracted (unless already extracted), every
    /// NetCDF file in it is read and merged in name order, and the result is
    /// written to `all_data.parquet` next to the extracted files.
    pub async fn load(&self, archive: Option<&Path>) -> Result<GriddedField, PreprocessError> {
        let archive = self.resolve_archive(archive).await?;
        let extracted = self.layout.extracted_dir(&archive);
        let cache_path = extracted.join(CACHE_FILE_NAME);

        if fs::metadata(&cache_path).await.is_ok() {
            info!("Cache hit for {:?} at {:?}", archive, cache_path);
            return read_cache(&cache_path).await;
        }
        warn!(
            "Cache miss for {:?}. Extracting and merging datasets.",
            archive
        );

        let dest = extracted.clone();
        let field = task::spawn_blocking(move || {
            extract_archive(&archive, &dest)?;
            let mut merged: Option<GriddedField> = None;
            for path in list_datasets(&dest)? {
                let field = read_netcdf(&path)?;
                merged = Some(match merged {
                    Some(acc) => merge(acc, &field)?,
                    None => field,
                });
            }
            merged.ok_or(PreprocessError::NoDatasets(dest))
        })
        .await??;

        write_cache(&field, &cache_path).await?;
        info!("Cached merged data to {:?}", cache_path);
        Ok(field)
    }
}
