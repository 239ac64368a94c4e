use log::info;
use std::io;
use std::path::{Path, PathBuf};

pub const PROJECT_DIR_ENV: &str = "PROJECT_DIR";

/// Where downloads, extracted files and rendered output live under a project
/// root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Rooted at `$PROJECT_DIR`, or the current directory when unset.
    pub fn from_env() -> io::Result<Self> {
        match std::env::var_os(PROJECT_DIR_ENV) {
            Some(dir) => Ok(Self::new(dir)),
            None => Ok(Self::new(std::env::current_dir()?)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Downloaded archives.
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("data").join("raw")
    }

    /// Extraction directory for `archive`, named after its file stem.
    pub fn extracted_dir(&self, archive: &Path) -> PathBuf {
        let stem = archive
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        self.root
            .join("data")
            .join("processed")
            .join("extracted")
            .join(stem)
    }

    pub fn frames_dir(&self, variable: &str) -> PathBuf {
        self.root.join("frames").join(variable)
    }

    pub fn animation_path(&self, variable: &str) -> PathBuf {
        self.root.join(format!("{}_animation.gif", variable))
    }
}

pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_paths() {
        let layout = ProjectLayout::new("/proj");
        assert_eq!(layout.raw_dir(), PathBuf::from("/proj/data/raw"));
        assert_eq!(
            layout.extracted_dir(Path::new("/proj/data/raw/era5-1-1-2025--12-31-2025.zip")),
            PathBuf::from("/proj/data/processed/extracted/era5-1-1-2025--12-31-2025")
        );
        assert_eq!(layout.frames_dir("t2m"), PathBuf::from("/proj/frames/t2m"));
        assert_eq!(
            layout.animation_path("tp"),
            PathBuf::from("/proj/tp_animation.gif")
        );
    }

    #[tokio::test]
    async fn test_ensure_dir_exists() -> io::Result<()> {
        let dir = tempdir()?;
        let nested = dir.path().join("a").join("b");
        ensure_dir_exists(&nested).await?;
        assert!(nested.is_dir());
        // idempotent
        ensure_dir_exists(&nested).await?;

        let file = dir.path().join("file");
        std::fs::write(&file, b"")?;
        assert!(ensure_dir_exists(&file).await.is_err());
        Ok(())
    }
}
