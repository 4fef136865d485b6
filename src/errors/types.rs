//! Error type definitions for the iconhub library
//!
//! All failures that can cross a module boundary are expressed through the
//! `AppError` taxonomy below. Transport-level errors (reqwest) are translated
//! at the provider/HTTP boundary and never surface to registry or ledger
//! callers. Each variant carries enough context (provider name, URL, status,
//! retry hint) for a host application to render a single human-readable
//! message without issuing further network calls.

use thiserror::Error;

/// Convenience result alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed request-signing input. Programming error, not retryable.
    #[error("signing error: {message}")]
    Signing { message: String },

    /// An authenticated provider was invoked without credentials.
    /// User-actionable; raised before any network round trip.
    #[error("provider '{provider}' requires credentials that are not configured")]
    AuthRequired { provider: String },

    /// Transport failure, timeout, or unexpected upstream response.
    /// Retryable at the caller's discretion.
    #[error("provider '{provider}' unavailable: {message}")]
    ProviderUnavailable { provider: String, message: String },

    /// Upstream signalled throttling. Retryable after backoff; the hint is
    /// the upstream-declared wait in seconds when one was provided.
    #[error("provider '{provider}' is rate limited{}", retry_hint(.retry_after_secs))]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// Asset download returned non-2xx or failed in transit.
    #[error("asset download failed for {url}: {message}")]
    FetchFailed { url: String, message: String },

    /// Lookup of a provider name that was never registered.
    #[error("unknown provider: {name}")]
    UnknownProvider { name: String },

    /// Attempt to register a second provider under an existing name.
    #[error("duplicate provider name: {name}")]
    DuplicateProviderName { name: String },

    /// Operation not offered by this provider variant.
    #[error("provider '{provider}' does not support {operation}")]
    Unsupported { provider: String, operation: String },

    /// Caller-initiated cancellation. Not a failure to surface to end users.
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid provider configuration.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The attribution ledger could not accept a write or parse persisted
    /// state supplied by the host.
    #[error("ledger persistence error: {message}")]
    Persistence { message: String },
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {secs}s)"),
        None => String::new(),
    }
}

/// Convenience constructors, mirrored across the crate
impl AppError {
    pub fn signing<M: Into<String>>(message: M) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    pub fn auth_required<P: Into<String>>(provider: P) -> Self {
        Self::AuthRequired {
            provider: provider.into(),
        }
    }

    pub fn unavailable<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited<P: Into<String>>(provider: P, retry_after_secs: Option<u64>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after_secs,
        }
    }

    pub fn fetch_failed<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::FetchFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn unknown_provider<N: Into<String>>(name: N) -> Self {
        Self::UnknownProvider { name: name.into() }
    }

    pub fn duplicate_provider<N: Into<String>>(name: N) -> Self {
        Self::DuplicateProviderName { name: name.into() }
    }

    pub fn unsupported<P: Into<String>, O: Into<String>>(provider: P, operation: O) -> Self {
        Self::Unsupported {
            provider: provider.into(),
            operation: operation.into(),
        }
    }

    pub fn configuration<M: Into<String>>(message: M) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn persistence<M: Into<String>>(message: M) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Whether a caller-side retry (possibly after backoff) can help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::RateLimited { .. } | Self::FetchFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_display_includes_hint() {
        let err = AppError::rate_limited("noun-project", Some(30));
        assert_eq!(
            err.to_string(),
            "provider 'noun-project' is rate limited (retry after 30s)"
        );

        let err = AppError::rate_limited("noun-project", None);
        assert_eq!(err.to_string(), "provider 'noun-project' is rate limited");
    }

    #[test]
    fn retryability_classification() {
        assert!(AppError::unavailable("maki", "timeout").is_retryable());
        assert!(AppError::rate_limited("maki", None).is_retryable());
        assert!(AppError::fetch_failed("http://x/a.svg", "500").is_retryable());
        assert!(!AppError::auth_required("noun-project").is_retryable());
        assert!(!AppError::signing("empty method").is_retryable());
        assert!(!AppError::Cancelled.is_retryable());
    }
}
