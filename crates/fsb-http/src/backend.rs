//! `BackendPort` over the file-browser JSON API.

use std::time::Duration;

use async_trait::async_trait;
use fsb_core::{BackendError, BackendPort, StatusReport, TaskId, UploadSlot};
use tracing::{debug, warn};
use url::Url;

use crate::config::BackendConfig;
use crate::envelope::{DownloadPayload, Envelope};
use crate::error::{HttpError, HttpResult};
use crate::endpoint::endpoint_url;

/// Whether a request may be sent again after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retry {
    /// Reads; server errors (5xx) and network errors are retried.
    Idempotent,
    /// Requests that create, register or cancel a job. A lost response
    /// may still have taken effect, so they are sent exactly once.
    Once,
}

/// Production backend using reqwest.
///
/// Every job endpoint is a `GET`. Status polls are retried with exponential
/// backoff; the other endpoints change server state and get one attempt.
/// Responses are decoded as an envelope, so a 4xx that carries
/// `{status, message}` surfaces the server's message.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
    max_retries: u8,
    retry_base_delay: Duration,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a backend for the API described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(HttpError::from)?;

        Ok(Self {
            client,
            base: config.base_url.clone(),
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
            token: config.token.clone(),
        })
    }

    fn build_request(&self, url: &Url) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url.as_str());
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Fetch a URL, retrying transient errors if `retry` allows it.
    async fn fetch_with_retry(&self, url: &Url, retry: Retry) -> HttpResult<reqwest::Response> {
        let max_retries = match retry {
            Retry::Idempotent => self.max_retries,
            Retry::Once => 0,
        };
        let mut attempt: u8 = 0;
        loop {
            if attempt > 0 {
                let delay = self
                    .retry_base_delay
                    .saturating_mul(2u32.saturating_pow(u32::from(attempt) - 1));
                debug!(url = %url, attempt, ?delay, "Retrying request");
                tokio::time::sleep(delay).await;
            }

            match self.build_request(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_server_error() {
                        return Ok(response);
                    }
                    if attempt >= max_retries {
                        return Err(HttpError::Status {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }
                }
                Err(e) => {
                    if attempt >= max_retries {
                        return Err(e.into());
                    }
                    warn!(url = %url, error = %e, "Request failed, will retry");
                }
            }
            attempt += 1;
        }
    }

    /// Fetch `<endpoint>/<path>` and decode the envelope.
    async fn get_envelope(
        &self,
        endpoint: &str,
        path: &str,
        retry: Retry,
    ) -> Result<Envelope, BackendError> {
        let url = endpoint_url(&self.base, endpoint, path)?;
        let response = self.fetch_with_retry(&url, retry).await?;
        let status = response.status();
        let body = response.bytes().await.map_err(HttpError::from)?;

        match serde_json::from_slice::<Envelope>(&body) {
            Ok(envelope) if status.is_success() || !envelope.is_ok() => Ok(envelope),
            Ok(_) => Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into()),
            Err(e) if status.is_success() => Err(HttpError::from(e).into()),
            Err(_) => Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl BackendPort for HttpBackend {
    async fn request_download(&self, path: &str) -> Result<TaskId, BackendError> {
        let payload: DownloadPayload = self
            .get_envelope("download", path, Retry::Once)
            .await?
            .into_payload()?;
        Ok(payload.task)
    }

    async fn request_upload_slot(&self, path: &str) -> Result<UploadSlot, BackendError> {
        self.get_envelope("upload-url", path, Retry::Once)
            .await?
            .into_payload()
    }

    async fn status(&self, id: &TaskId) -> Result<StatusReport, BackendError> {
        self.get_envelope("status", id.as_str(), Retry::Idempotent)
            .await?
            .into_payload()
    }

    async fn confirm_upload(&self, id: &TaskId) -> Result<(), BackendError> {
        self.get_envelope("upload", id.as_str(), Retry::Once)
            .await?
            .into_unit()
    }

    async fn cancel(&self, id: &TaskId) -> Result<(), BackendError> {
        self.get_envelope("cancel", id.as_str(), Retry::Once)
            .await?
            .into_unit()
    }
}
