//! SwapClient - handles communication with the face-swap service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::photo::Capture;
use crate::selection::CharacterId;

/// Environment variable that overrides the configured service URL.
pub const SERVER_URL_ENV: &str = "PHOTOBOOTH_SERVER_URL";

/// Default base URL for the face-swap service.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fallback when a failed submission carries no `error` field.
pub const SUBMIT_FAILED_MESSAGE: &str = "Face swap failed";

/// Fallback when a failed job carries no `error` field.
pub const GENERATION_FAILED_MESSAGE: &str = "Generation failed";

/// Request body for `POST /swap-face`.
#[derive(Debug, Serialize)]
struct SwapRequest<'a> {
    child_photo: &'a str,
    character: &'a str,
}

/// Success body of `POST /swap-face`.
#[derive(Debug, Deserialize)]
pub struct SwapResponse {
    pub prediction_id: String,
}

/// Failure body shared by both endpoints.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

/// Body of `GET /check-status/{id}`.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    result_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// One status report for a swap job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    /// Anything that is not terminal, with the raw status string.
    Pending { status: String },
    Succeeded { result_url: String },
    Failed { error: Option<String> },
}

/// The remote service as seen by the orchestrator.
#[allow(async_fn_in_trait)]
pub trait SwapService {
    /// Start a job and return its prediction id.
    async fn start_job(&self, image: &Capture, character: &CharacterId)
        -> Result<String, SwapError>;

    /// Query the job once.
    async fn check_status(&self, prediction_id: &str) -> Result<JobUpdate, SwapError>;

    /// Save the finished image at `result_url` to `dest`.
    async fn fetch_result(&self, result_url: &str, dest: &Path) -> Result<PathBuf, SwapError>;
}

/// HTTP client for the face-swap service.
#[derive(Debug, Clone)]
pub struct SwapClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl SwapClient {
    /// Create a client for the service at `base_url`.
    ///
    /// Only a connect timeout is applied; request duration is left to the
    /// transport.
    pub fn new(base_url: &str) -> Result<Self, SwapError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client with an overall per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, SwapError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SwapError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SwapError::InvalidUrl(base_url.to_string()));
        }

        let mut builder = reqwest::Client::builder().connect_timeout(DEFAULT_CONNECT_TIMEOUT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url,
            http_client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Submit a photo and character to `POST /swap-face`.
    ///
    /// # Errors
    ///
    /// Returns `SwapError::Server` with the server's `error` message (or
    /// "Face swap failed") on a non-2xx response, or `SwapError::Http` if the
    /// request itself fails.
    pub async fn submit(
        &self,
        image: &Capture,
        character: &CharacterId,
    ) -> Result<String, SwapError> {
        let url = self.endpoint(&["swap-face"]);
        let body = SwapRequest {
            child_photo: image.data_uri(),
            character: character.as_str(),
        };

        log::info!("Sending request to {} (character: {})", url, character);
        let response = self.http_client.post(url).json(&body).send().await?;
        let status = response.status();
        log::info!("Response received: {}", status);

        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| SUBMIT_FAILED_MESSAGE.to_string());
            log::warn!("Swap submission rejected ({}): {}", status, message);
            return Err(SwapError::Server(message));
        }

        let swap: SwapResponse = response.json().await?;
        log::info!("Prediction ID: {}", swap.prediction_id);
        Ok(swap.prediction_id)
    }

    /// Query `GET /check-status/{id}` once.
    ///
    /// # Errors
    ///
    /// Any transport failure or non-2xx response is `SwapError::StatusCheck`;
    /// a `succeeded` report without `result_url` is
    /// `SwapError::MissingResultUrl`.
    pub async fn status(&self, prediction_id: &str) -> Result<JobUpdate, SwapError> {
        let url = self.endpoint(&["check-status", prediction_id]);

        let response = self.http_client.get(url).send().await.map_err(|e| {
            log::error!("Status check failed: {}", e);
            SwapError::StatusCheck
        })?;

        if !response.status().is_success() {
            log::error!("Status check returned {}", response.status());
            return Err(SwapError::StatusCheck);
        }

        let report: StatusResponse = response.json().await.map_err(|e| {
            log::error!("Unreadable status response: {}", e);
            SwapError::StatusCheck
        })?;

        match report.status.as_str() {
            "succeeded" => report
                .result_url
                .filter(|url| !url.is_empty())
                .map(|result_url| JobUpdate::Succeeded { result_url })
                .ok_or(SwapError::MissingResultUrl),
            "failed" => Ok(JobUpdate::Failed {
                error: report.error,
            }),
            _ => Ok(JobUpdate::Pending {
                status: report.status,
            }),
        }
    }

    /// Query `GET /health` and return the raw report.
    pub async fn health(&self) -> Result<serde_json::Value, SwapError> {
        let url = self.endpoint(&["health"]);
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SwapError::Server(format!(
                "Health check failed with status {}: {}",
                status, error_text
            )));
        }

        Ok(response.json().await?)
    }

    /// Download the result image to disk.
    ///
    /// Streams into `<dest>.part` and renames it over `dest` once the whole
    /// body has arrived, so an interrupted download never looks like a
    /// finished file.
    pub async fn download_result(&self, url: &str, dest: &Path) -> Result<PathBuf, SwapError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SwapError::Server(format!(
                "Result download failed with status {}: {}",
                status, error_text
            )));
        }

        let partial = partial_path(dest);
        if let Err(e) = write_body(response, &partial).await {
            if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
                log::warn!("Failed to remove {}: {}", partial.display(), remove_err);
            }
            return Err(e);
        }
        tokio::fs::rename(&partial, dest).await?;

        Ok(dest.to_path_buf())
    }
}

/// Sibling path a download is written to before it completes.
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<(), SwapError> {
    use futures_util::StreamExt;

    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

impl SwapService for SwapClient {
    async fn start_job(
        &self,
        image: &Capture,
        character: &CharacterId,
    ) -> Result<String, SwapError> {
        self.submit(image, character).await
    }

    async fn check_status(&self, prediction_id: &str) -> Result<JobUpdate, SwapError> {
        self.status(prediction_id).await
    }

    async fn fetch_result(&self, result_url: &str, dest: &Path) -> Result<PathBuf, SwapError> {
        self.download_result(result_url, dest).await
    }
}

/// Errors that can occur while talking to the face-swap service.
///
/// Display strings are what the kiosk shows in its alert.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("Please capture a photo and select a character")]
    MissingInput,

    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Server-supplied (or fallback) message from a rejected request.
    #[error("{0}")]
    Server(String),

    #[error("Failed to check status")]
    StatusCheck,

    #[error("{0}")]
    JobFailed(String),

    #[error("Failed to generate result")]
    MissingResultUrl,

    #[error("Timeout: Generation took too long")]
    Timeout {
        /// Status queries made before giving up
        attempts: u32,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
