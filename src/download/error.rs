use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Invalid download window: {0}")]
    InvalidWindow(String),

    #[error("No CDS API key found in CDSAPI_KEY or '{0}'")]
    MissingCredentials(PathBuf),

    #[error("Failed to read CDS API configuration '{0}'")]
    CredentialsRead(PathBuf, #[source] std::io::Error),

    #[error("Could not determine home directory")]
    HomeDirResolution,

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Retrieve job {job_id} ended with status '{status}'")]
    JobFailed { job_id: String, status: String },

    #[error("Unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("Failed to create download directory '{0}'")]
    TargetDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to store download at '{0}'")]
    Persist(PathBuf, #[source] std::io::Error),

    #[error("Download stream failed")]
    DownloadIo(#[from] std::io::Error),
}
