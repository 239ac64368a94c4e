use crate::download::error::DownloadError;
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CDS_URL: &str = "https://cds.climate.copernicus.eu/api";
const RC_FILE_NAME: &str = ".cdsapirc";

/// Endpoint and personal access token for the Climate Data Store.
#[derive(Clone, PartialEq, Eq)]
pub struct CdsCredentials {
    pub url: String,
    pub key: String,
}

impl fmt::Debug for CdsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdsCredentials")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Reads the `url:` and `key:` lines of a `.cdsapirc` file.
fn parse_rc(contents: &str) -> (Option<String>, Option<String>) {
    let mut url = None;
    let mut key = None;
    for line in contents.lines() {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim().to_string();
            match name.trim() {
                "url" => url = Some(value),
                "key" => key = Some(value),
                _ => {}
            }
        }
    }
    (url, key)
}

impl CdsCredentials {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
        }
    }

    /// `CDSAPI_URL` / `CDSAPI_KEY` from the environment, each falling back to
    /// `~/.cdsapirc`.
    pub fn from_env() -> Result<Self, DownloadError> {
        let rc_path = dirs::home_dir()
            .ok_or(DownloadError::HomeDirResolution)?
            .join(RC_FILE_NAME);
        Self::resolve(
            std::env::var("CDSAPI_URL").ok(),
            std::env::var("CDSAPI_KEY").ok(),
            &rc_path,
        )
    }

    /// Combines explicit values with the rc file at `rc_path`, explicit values
    /// winning. The rc file is only read when something is missing.
    pub fn resolve(
        url: Option<String>,
        key: Option<String>,
        rc_path: &Path,
    ) -> Result<Self, DownloadError> {
        let (url, key) = match (url, key) {
            (Some(url), Some(key)) => (Some(url), Some(key)),
            (url, key) => match std::fs::read_to_string(rc_path) {
                Ok(contents) => {
                    debug!("Reading CDS credentials from {:?}", rc_path);
                    let (rc_url, rc_key) = parse_rc(&contents);
                    (url.or(rc_url), key.or(rc_key))
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => (url, key),
                Err(e) => return Err(DownloadError::CredentialsRead(rc_path.to_path_buf(), e)),
            },
        };
        let key = key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DownloadError::MissingCredentials(PathBuf::from(rc_path)))?;
        let url = url.unwrap_or_else(|| DEFAULT_CDS_URL.to_string());
        Ok(Self::new(url.trim_end_matches('/'), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_rc() {
        let (url, key) = parse_rc("url: https://example.org/api\nkey: abc-123\nverify: 0\n");
        assert_eq!(url.as_deref(), Some("https://example.org/api"));
        assert_eq!(key.as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_explicit_values_skip_rc() -> Result<(), DownloadError> {
        let creds = CdsCredentials::resolve(
            Some("https://example.org/api/".to_string()),
            Some("k".to_string()),
            Path::new("/nonexistent/.cdsapirc"),
        )?;
        assert_eq!(creds, CdsCredentials::new("https://example.org/api", "k"));
        Ok(())
    }

    #[test]
    fn test_rc_fills_missing_key() -> Result<(), Box<dyn std::error::Error>> {
        let mut rc = NamedTempFile::new()?;
        writeln!(rc, "url: https://rc.example/api")?;
        writeln!(rc, "key: from-rc")?;
        let creds = CdsCredentials::resolve(None, None, rc.path())?;
        assert_eq!(creds.url, "https://rc.example/api");
        assert_eq!(creds.key, "from-rc");

        let mixed = CdsCredentials::resolve(Some("https://env/api".to_string()), None, rc.path())?;
        assert_eq!(mixed.url, "https://env/api");
        assert_eq!(mixed.key, "from-rc");
        Ok(())
    }

    #[test]
    fn test_missing_key() {
        let err = CdsCredentials::resolve(None, None, Path::new("/nonexistent/.cdsapirc"))
            .unwrap_err();
        assert!(matches!(err, DownloadError::MissingCredentials(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = CdsCredentials::new(DEFAULT_CDS_URL, "secret-token");
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("redacted"));
    }
}
