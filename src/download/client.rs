//! Minimal client for the CDS retrieve API: submit a job, poll until it
//! finishes, stream the result to disk.

use crate::download::credentials::CdsCredentials;
use crate::download::error::DownloadError;
use crate::download::request::RetrieveRequest;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
struct JobStatus {
    #[serde(rename = "jobID")]
    job_id: String,
    status: String,
}

#[derive(Debug, Clone, Deserialize)]
struct JobResults {
    asset: Asset,
}

#[derive(Debug, Clone, Deserialize)]
struct Asset {
    value: AssetValue,
}

#[derive(Debug, Clone, Deserialize)]
struct AssetValue {
    href: String,
}

pub struct CdsClient {
    http: Client,
    credentials: CdsCredentials,
    poll_interval: Duration,
}

impl CdsClient {
    pub fn new(credentials: CdsCredentials) -> Self {
        Self {
            http: Client::new(),
            credentials,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn process_url(&self, dataset: &str) -> String {
        format!(
            "{}/retrieve/v1/processes/{}/execution",
            self.credentials.url, dataset
        )
    }

    fn job_url(&self, job_id: &str) -> String {
        format!("{}/retrieve/v1/jobs/{}", self.credentials.url, job_id)
    }

    /// Retrieves `request` from `dataset` into `target`.
    ///
    /// An existing `target` is kept as is and nothing is requested. Otherwise the
    /// result is streamed into a temporary file beside `target` and moved into
    /// place once complete, so an interrupted download never leaves a partial
    /// archive behind.
    pub async fn retrieve(
        &self,
        dataset: &str,
        request: &RetrieveRequest,
        target: &Path,
    ) -> Result<PathBuf, DownloadError> {
        if fs::metadata(target).await.is_ok() {
            info!("Archive {:?} already present, skipping download", target);
            return Ok(target.to_path_buf());
        }

        let job_id = self.submit(dataset, request).await?;
        self.wait_for_job(&job_id).await?;
        let href = self.result_href(&job_id).await?;
        self.download(&href, target).await?;
        Ok(target.to_path_buf())
    }

    async fn submit(&self, dataset: &str, request: &RetrieveRequest) -> Result<String, DownloadError> {
        let url = self.process_url(dataset);
        info!("Submitting retrieve request for {} to {}", dataset, url);
        let response = self
            .http
            .post(&url)
            .header("PRIVATE-TOKEN", &self.credentials.key)
            .json(&json!({ "inputs": request }))
            .send()
            .await
            .map_err(|e| DownloadError::NetworkRequest(url.clone(), e))?;
        let job: JobStatus = Self::parse(url, response).await?;
        info!("Retrieve job {} accepted with status '{}'", job.job_id, job.status);
        Ok(job.job_id)
    }

    async fn wait_for_job(&self, job_id: &str) -> Result<(), DownloadError> {
        let url = self.job_url(job_id);
        loop {
            let job: JobStatus = self.get_json(&url).await?;
            match job.status.as_str() {
                "successful" => return Ok(()),
                "failed" | "rejected" | "dismissed" => {
                    warn!("Retrieve job {} ended with status '{}'", job_id, job.status);
                    return Err(DownloadError::JobFailed {
                        job_id: job_id.to_string(),
                        status: job.status,
                    });
                }
                status => {
                    info!("Retrieve job {} is {}", job_id, status);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn result_href(&self, job_id: &str) -> Result<String, DownloadError> {
        let url = format!("{}/results", self.job_url(job_id));
        let results: JobResults = self.get_json(&url).await?;
        Ok(results.asset.value.href)
    }

    async fn download(&self, href: &str, target: &Path) -> Result<(), DownloadError> {
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::TargetDirCreation(parent.to_path_buf(), e))?;

        info!("Downloading {} to {:?}", href, target);
        let response = self
            .http
            .get(href)
            .send()
            .await
            .map_err(|e| DownloadError::NetworkRequest(href.to_string(), e))?;
        let response = Self::check_status(href.to_string(), response)?;

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let reader = StreamReader::new(stream);
        tokio::pin!(reader);

        let (file, temp_path) = NamedTempFile::new_in(parent)?.into_parts();
        let mut file = fs::File::from_std(file);
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        drop(file);

        temp_path
            .persist(target)
            .map_err(|e| DownloadError::Persist(target.to_path_buf(), e.error))?;
        info!("Downloaded {} bytes to {:?}", written, target);
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DownloadError> {
        let response = self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.credentials.key)
            .send()
            .await
            .map_err(|e| DownloadError::NetworkRequest(url.to_string(), e))?;
        Self::parse(url.to_string(), response).await
    }

    async fn parse<T: DeserializeOwned>(url: String, response: Response) -> Result<T, DownloadError> {
        let response = Self::check_status(url.clone(), response)?;
        response
            .json::<T>()
            .await
            .map_err(|e| DownloadError::UnexpectedResponse {
                url,
                message: e.to_string(),
            })
    }

    fn check_status(url: String, response: Response) -> Result<Response, DownloadError> {
        match response.error_for_status() {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                Err(if let Some(status) = e.status() {
                    DownloadError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    DownloadError::NetworkRequest(url, e)
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::request::{DownloadWindow, DEFAULT_VARIABLES};
    use tempfile::tempdir;

    fn client() -> CdsClient {
        CdsClient::new(CdsCredentials::new("http://127.0.0.1:9/api", "key"))
    }

    #[test]
    fn test_endpoints() {
        let client = client();
        assert_eq!(
            client.process_url("reanalysis-era5-single-levels"),
            "http://127.0.0.1:9/api/retrieve/v1/processes/reanalysis-era5-single-levels/execution"
        );
        assert_eq!(
            client.job_url("abc"),
            "http://127.0.0.1:9/api/retrieve/v1/jobs/abc"
        );
    }

    #[test]
    fn test_response_shapes() -> Result<(), serde_json::Error> {
        let job: JobStatus =
            serde_json::from_str(r#"{"jobID": "42", "status": "accepted", "type": "process"}"#)?;
        assert_eq!(job.job_id, "42");
        assert_eq!(job.status, "accepted");

        let results: JobResults = serde_json::from_str(
            r#"{"asset": {"value": {"href": "https://host/file.zip", "type": "application/zip"}}}"#,
        )?;
        assert_eq!(results.asset.value.href, "https://host/file.zip");
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_target_is_not_downloaded() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let target = dir.path().join("era5.zip");
        std::fs::write(&target, b"already here")?;

        let request = RetrieveRequest::new(&DownloadWindow::default(), &DEFAULT_VARIABLES, None)?;
        // the endpoint is unreachable, so any request would fail
        let path = client()
            .retrieve("reanalysis-era5-single-levels", &request, &target)
            .await?;
        assert_eq!(path, target);
        assert_eq!(std::fs::read(&target)?, b"already here");
        Ok(())
    }
}
