//! Streaming HTTP fetcher with per-chunk progress reporting
//!
//! A [`Fetcher`] downloads one URL into memory and reports progress through a
//! [`ProgressSink`] as bytes arrive. The default implementation,
//! [`HttpFetcher`], streams the body with reqwest and reports once per
//! fixed-size chunk, so progress granularity does not depend on how the
//! network delivers frames.

use crate::error::FetchError;
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tracing::debug;

/// Default connect and per-read timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default progress chunk size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Receiver of per-item progress percentages (0 to 100)
pub trait ProgressSink: Send {
    /// Called once at start with 0 and after every chunk
    fn report(&mut self, percent: u8);
}

/// Downloads the full payload of one URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, reporting progress to `sink`
    ///
    /// Exactly one attempt is made; any failure is returned with a
    /// human-readable reason.
    async fn fetch(&self, url: &str, sink: &mut dyn ProgressSink) -> Result<Vec<u8>, FetchError>;
}

/// Compute the progress percentage for `received` bytes out of `total`
///
/// Unknown or zero lengths report 100 as soon as any chunk arrives, because
/// the bar cannot advance without a denominator.
pub fn percent_of(received: u64, total: Option<u64>) -> u8 {
    match total {
        Some(total) if total > 0 => (received.saturating_mul(100) / total).min(100) as u8,
        _ => 100,
    }
}

/// reqwest-backed [`Fetcher`]
///
/// The timeout bounds connecting, waiting for the response head, and every
/// gap between body reads. It does not cap the whole transfer: a slow image
/// that keeps delivering bytes is fetched to completion.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    chunk_size: usize,
}

impl HttpFetcher {
    /// Create a fetcher with the given connect/read timeout and progress chunk size
    pub fn new(timeout: Duration, chunk_size: usize) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            timeout,
            chunk_size: chunk_size.max(1),
        })
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            return FetchError::Timeout(self.timeout);
        }
        if err.is_connect() {
            return FetchError::Connect(err.to_string());
        }
        if err.is_body() || err.is_decode() {
            return FetchError::Body(err.to_string());
        }
        FetchError::Request(err.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, sink: &mut dyn ProgressSink) -> Result<Vec<u8>, FetchError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|err| FetchError::InvalidUrl(err.to_string()))?;

        sink.report(0);

        let response = tokio::time::timeout(self.timeout, self.client.get(parsed).send())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
            .map_err(|err| self.map_reqwest_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let total = response.content_length().filter(|&len| len > 0);
        debug!(url, ?total, "streaming response body");

        let mut payload = Vec::with_capacity(total.unwrap_or(0).min(16 * 1024 * 1024) as usize);
        // Bytes covered by the last report; frames are re-sliced into whole chunks
        let mut reported = 0usize;
        let mut stream = response.bytes_stream();
        // Each read gets its own deadline, like a socket read timeout
        loop {
            let frame = match tokio::time::timeout(self.timeout, stream.next()).await {
                Ok(Some(frame)) => frame.map_err(|err| self.map_reqwest_error(err))?,
                Ok(None) => break,
                Err(_) => return Err(FetchError::Timeout(self.timeout)),
            };
            payload.extend_from_slice(&frame);
            while payload.len() - reported >= self.chunk_size {
                reported += self.chunk_size;
                sink.report(percent_of(reported as u64, total));
            }
        }
        if payload.len() > reported {
            sink.report(percent_of(payload.len() as u64, total));
        }

        Ok(payload)
    }
}
