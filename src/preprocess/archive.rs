//! Locating and unpacking downloaded zip archives.

use crate::preprocess::error::PreprocessError;
use log::{debug, info};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use zip::ZipArchive;

fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PreprocessError> {
    let entries = fs::read_dir(dir).map_err(|e| PreprocessError::ReadDir(dir.to_path_buf(), e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| PreprocessError::ReadDir(dir.to_path_buf(), e))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// The most recently modified `.zip` in `raw_dir`. Ties go to the later name.
pub fn latest_archive(raw_dir: &Path) -> Result<PathBuf, PreprocessError> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for path in files_with_extension(raw_dir, "zip")? {
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|e| PreprocessError::ReadDir(path.clone(), e))?;
        if newest.as_ref().map_or(true, |(t, _)| modified >= *t) {
            newest = Some((modified, path));
        }
    }
    newest
        .map(|(_, path)| path)
        .ok_or_else(|| PreprocessError::NoArchive(raw_dir.to_path_buf()))
}

/// NetCDF files directly inside `dir`, sorted by name.
pub fn list_datasets(dir: &Path) -> Result<Vec<PathBuf>, PreprocessError> {
    let datasets = files_with_extension(dir, "nc")?;
    if datasets.is_empty() {
        return Err(PreprocessError::NoDatasets(dir.to_path_buf()));
    }
    Ok(datasets)
}

/// Unpacks `archive` into `dest`, unless `dest` already holds something.
///
/// Returns the number of files written (zero when skipped). Members whose
/// names would escape `dest` abort the extraction.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize, PreprocessError> {
    fs::create_dir_all(dest).map_err(|e| PreprocessError::DirCreation(dest.to_path_buf(), e))?;
    let occupied = fs::read_dir(dest)
        .map_err(|e| PreprocessError::ReadDir(dest.to_path_buf(), e))?
        .next()
        .is_some();
    if occupied {
        info!("{:?} already extracted, skipping", dest);
        return Ok(0);
    }

    let file = File::open(archive).map_err(|e| PreprocessError::ArchiveOpen(archive.to_path_buf(), e))?;
    let mut zip =
        ZipArchive::new(file).map_err(|e| PreprocessError::Zip(archive.to_path_buf(), e))?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| PreprocessError::Zip(archive.to_path_buf(), e))?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| PreprocessError::UnsafeArchivePath(entry.name().to_string()))?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| PreprocessError::ExtractIo(out_path, e))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PreprocessError::ExtractIo(parent.to_path_buf(), e))?;
        }
        let mut out = File::create(&out_path)
            .map_err(|e| PreprocessError::ExtractIo(out_path.clone(), e))?;
        io::copy(&mut entry, &mut out).map_err(|e| PreprocessError::ExtractIo(out_path.clone(), e))?;
        debug!("Extracted {:?}", out_path);
        written += 1;
    }
    info!("Extracted {} files from {:?} into {:?}", written, archive, dest);
    Ok(written)
}
