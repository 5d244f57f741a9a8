//! `TransferPort` as a streamed PUT to a pre-signed URL.

use std::io;

use async_trait::async_trait;
use fsb_core::{BackendError, ProgressCallback, TransferPayload, TransferPort, TransferRequest};
use futures_util::{Stream, StreamExt, stream};
use reqwest::header::CONTENT_LENGTH;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::HttpError;

/// Size of each body chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// Bucket transport using reqwest.
///
/// No request timeout is applied; abort with the cancellation token.
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    /// Create a transport sharing the user agent of `config`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(HttpError::from)?;
        Ok(Self { client })
    }
}

/// Report cumulative bytes as each chunk is pulled by the client.
fn counted<S, B>(
    inner: S,
    total: u64,
    progress: ProgressCallback,
) -> impl Stream<Item = io::Result<B>> + Send + Sync + 'static
where
    S: Stream<Item = io::Result<B>> + Send + Sync + 'static,
    B: AsRef<[u8]> + 'static,
{
    let mut sent = 0u64;
    inner.map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.as_ref().len() as u64;
            progress(sent, total);
        }
        chunk
    })
}

/// Build the request body and its length.
async fn body_for(
    payload: &TransferPayload,
    progress: ProgressCallback,
) -> io::Result<(reqwest::Body, u64)> {
    match payload {
        TransferPayload::File(path) => {
            let file = tokio::fs::File::open(path).await?;
            let total = file.metadata().await?.len();
            let chunks = ReaderStream::with_capacity(file, CHUNK_SIZE);
            Ok((
                reqwest::Body::wrap_stream(counted(chunks, total, progress)),
                total,
            ))
        }
        TransferPayload::Memory(data) => {
            let total = data.len() as u64;
            let chunks: Vec<io::Result<Vec<u8>>> =
                data.chunks(CHUNK_SIZE).map(|c| Ok(c.to_vec())).collect();
            Ok((
                reqwest::Body::wrap_stream(counted(stream::iter(chunks), total, progress)),
                total,
            ))
        }
    }
}

/// The URL without its query string, which holds the signature.
fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[async_trait]
impl TransferPort for HttpTransfer {
    async fn put(
        &self,
        request: &TransferRequest,
        progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<(), BackendError> {
        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let (body, total) = body_for(&request.payload, progress.clone())
            .await
            .map_err(HttpError::from)?;
        progress(0, total);

        let mut builder = self
            .client
            .put(&request.url)
            .header(CONTENT_LENGTH, total)
            .body(body);
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        debug!(url = redact(&request.url), total, "Starting bucket transfer");

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(url = redact(&request.url), "Bucket transfer aborted");
                return Err(BackendError::Cancelled);
            }
            result = builder.send() => result.map_err(HttpError::from)?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: redact(&request.url).to_string(),
            }
            .into());
        }
        Ok(())
    }
}
