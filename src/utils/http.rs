//! HTTP client wrapper shared by all providers
//!
//! Wraps `reqwest::Client` with a bounded timeout, cancellation support, and
//! translation of transport failures into the crate error taxonomy at the
//! response boundary. Raw `reqwest::Error` values never leave this module.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::{AppError, AppResult};

/// Default per-request timeout, matching the upstream defaults the original
/// providers used.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("iconhub/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, timeout }
    }

    /// GET a JSON document. Non-2xx responses become `ProviderUnavailable`,
    /// except 429 which becomes `RateLimited` with the upstream Retry-After
    /// hint when one is present.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        provider: &str,
        url: &str,
        headers: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> AppResult<T> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        debug!(provider, url, "fetching JSON");

        let response = cancellable(cancel, self.send(url, headers))
            .await?
            .map_err(|e| self.translate_transport(provider, url, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::rate_limited(provider, retry_after(&response)));
        }
        if !status.is_success() {
            return Err(AppError::unavailable(
                provider,
                format!("HTTP {status} from {url}"),
            ));
        }

        cancellable(cancel, response.json::<T>())
            .await?
            .map_err(|e| AppError::unavailable(provider, format!("invalid JSON from {url}: {e}")))
    }

    /// GET raw bytes for an asset download. Failures become `FetchFailed`
    /// (timeouts stay `ProviderUnavailable` so the caller can tell a dead
    /// upstream from a missing asset).
    pub async fn get_bytes(
        &self,
        provider: &str,
        url: &str,
        headers: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> AppResult<Vec<u8>> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        debug!(provider, url, "fetching asset bytes");

        let response = cancellable(cancel, self.send(url, headers))
            .await?
            .map_err(|e| {
                if e.is_timeout() {
                    self.timeout_error(provider, url)
                } else {
                    AppError::fetch_failed(url, format!("transport error: {e}"))
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::rate_limited(provider, retry_after(&response)));
        }
        if !status.is_success() {
            return Err(AppError::fetch_failed(url, format!("HTTP {status}")));
        }

        let bytes = cancellable(cancel, response.bytes())
            .await?
            .map_err(|e| {
                if e.is_timeout() {
                    self.timeout_error(provider, url)
                } else {
                    AppError::fetch_failed(url, format!("failed to read body: {e}"))
                }
            })?;
        Ok(bytes.to_vec())
    }

    fn send(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> impl Future<Output = Result<Response, reqwest::Error>> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        request.send()
    }

    fn translate_transport(&self, provider: &str, url: &str, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            self.timeout_error(provider, url)
        } else {
            AppError::unavailable(provider, format!("transport error for {url}: {err}"))
        }
    }

    fn timeout_error(&self, provider: &str, url: &str) -> AppError {
        AppError::unavailable(
            provider,
            format!(
                "request to {url} timed out after {}ms",
                self.timeout.as_millis()
            ),
        )
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Race a future against caller cancellation. A cancelled call returns
/// immediately and performs no further side effects.
async fn cancellable<F, T>(cancel: &CancellationToken, future: F) -> AppResult<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        output = future => Ok(output),
    }
}

fn retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}
