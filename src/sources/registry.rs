//! Provider registry and construction
//!
//! The registry owns the configured provider set, resolves providers by
//! exact name, and is the fan-out point for a query. Construction goes
//! through [`ProviderFactory`], which maps a [`ProviderIdentity`] onto the
//! matching concrete handler; the registry itself never inspects concrete
//! provider types.

use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::ListingCache;
use crate::errors::{AppError, AppResult};
use crate::models::{ProviderIdentity, SearchResult, SourceLocator};
use crate::sources::github_directory::GitHubDirectoryProvider;
use crate::sources::noun_project::NounProjectProvider;
use crate::sources::traits::IconProvider;
use crate::utils::http::HttpClient;

/// Creates the concrete handler for one provider identity.
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(
        identity: ProviderIdentity,
        client: HttpClient,
        cache: Arc<ListingCache>,
    ) -> AppResult<Arc<dyn IconProvider>> {
        match &identity.source_locator {
            SourceLocator::Marketplace { .. } => {
                Ok(Arc::new(NounProjectProvider::new(identity, client)?))
            }
            SourceLocator::GithubDirectory { .. } => Ok(Arc::new(GitHubDirectoryProvider::new(
                identity, client, cache,
            )?)),
        }
    }
}

/// Named set of configured providers plus the listing cache they share.
///
/// The identity set is immutable for the registry's lifetime; to
/// reconfigure, build a new registry from the new identities (and let this
/// one drop). Safe to share behind an `Arc` across worker tasks.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn IconProvider>>,
    /// Registration order, used for stable enumeration
    order: Vec<String>,
    cache: Arc<ListingCache>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            order: Vec::new(),
            cache: Arc::new(ListingCache::new()),
        }
    }

    /// Build a registry from externally supplied identities, sharing one
    /// HTTP client and one listing cache across all providers.
    pub fn from_identities(identities: Vec<ProviderIdentity>) -> AppResult<Self> {
        Self::from_identities_with_client(identities, HttpClient::new())
    }

    pub fn from_identities_with_client(
        identities: Vec<ProviderIdentity>,
        client: HttpClient,
    ) -> AppResult<Self> {
        let mut registry = Self::new();
        for identity in identities {
            let provider =
                ProviderFactory::create(identity, client.clone(), registry.cache.clone())?;
            registry.register(provider)?;
        }
        info!(
            providers = registry.order.len(),
            "provider registry configured"
        );
        Ok(registry)
    }

    pub fn register(&mut self, provider: Arc<dyn IconProvider>) -> AppResult<()> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(AppError::duplicate_provider(name));
        }
        debug!(provider = %name, "registered provider");
        self.order.push(name.clone());
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> AppResult<Arc<dyn IconProvider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::unknown_provider(name))
    }

    /// Provider names in registration order, for the host to present as
    /// choices.
    pub fn provider_names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn cache(&self) -> &Arc<ListingCache> {
        &self.cache
    }

    /// Drop cached listings for one provider, e.g. after its upstream
    /// contents changed. Returns the number of entries removed.
    pub async fn invalidate_provider(&self, name: &str) -> usize {
        self.cache.invalidate(name).await
    }

    /// Search one provider by name.
    ///
    /// Fails fast with `AuthRequired` before any network round trip when the
    /// provider requires credentials that were never supplied.
    pub async fn search(
        &self,
        provider_name: &str,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> AppResult<SearchResult> {
        self.search_cancellable(
            provider_name,
            query,
            page,
            page_size,
            &CancellationToken::new(),
        )
        .await
    }

    pub async fn search_cancellable(
        &self,
        provider_name: &str,
        query: &str,
        page: u32,
        page_size: u32,
        cancel: &CancellationToken,
    ) -> AppResult<SearchResult> {
        let provider = self.resolve(provider_name)?;
        if provider.missing_credentials() {
            return Err(AppError::auth_required(provider_name));
        }
        provider.search(query, page, page_size, cancel).await
    }

    /// Download one asset through the named provider.
    pub async fn fetch_asset(&self, provider_name: &str, download_url: &str) -> AppResult<Vec<u8>> {
        self.fetch_asset_cancellable(provider_name, download_url, &CancellationToken::new())
            .await
    }

    pub async fn fetch_asset_cancellable(
        &self,
        provider_name: &str,
        download_url: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<u8>> {
        let provider = self.resolve(provider_name)?;
        if provider.missing_credentials() {
            return Err(AppError::auth_required(provider_name));
        }
        provider.fetch_asset(download_url, cancel).await
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
