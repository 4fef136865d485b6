//! Provider trait definitions
//!
//! One polymorphic interface over `{search, fetch_asset, list_bulk}`. Each
//! remote icon source is a concrete variant behind this trait; the registry
//! dispatches by name and never inspects the concrete type.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::AppResult;
use crate::models::{IconRecord, ProviderIdentity, SearchResult};

/// One implementation per remote icon source.
///
/// All network operations are blocking awaits with bounded timeouts and must
/// be driven from a worker context; they accept a [`CancellationToken`] and
/// return [`AppError::Cancelled`](crate::errors::AppError::Cancelled) without
/// further side effects once it fires. Implementations are safe to share
/// across tasks (`Send + Sync`); for a fixed upstream state, `search` is
/// deterministic in `(query, page, page_size)`.
#[async_trait]
pub trait IconProvider: Send + Sync {
    /// The identity this provider was constructed from.
    fn identity(&self) -> &ProviderIdentity;

    fn name(&self) -> &str {
        &self.identity().name
    }

    /// True when the provider needs credentials that were never supplied.
    /// The registry checks this before any network round trip.
    fn missing_credentials(&self) -> bool {
        let identity = self.identity();
        identity.requires_auth && identity.credentials.is_none()
    }

    /// Search for icons. Zero matches is a valid result with empty `items`,
    /// never an error.
    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
        cancel: &CancellationToken,
    ) -> AppResult<SearchResult>;

    /// Download the raw bytes of one asset. No automatic retries; retry
    /// policy belongs to the caller.
    async fn fetch_asset(&self, download_url: &str, cancel: &CancellationToken)
        -> AppResult<Vec<u8>>;

    /// Fetch the provider's full enumerable listing in one call, when the
    /// source is enumerable at all. Marketplace-style providers whose results
    /// are query-specific return
    /// [`AppError::Unsupported`](crate::errors::AppError::Unsupported).
    async fn list_bulk(&self, cancel: &CancellationToken) -> AppResult<Vec<IconRecord>>;
}
