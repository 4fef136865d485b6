//! GitHub-hosted icon directory providers
//!
//! Covers every open icon set hosted as a flat directory of SVG files in a
//! repository, plus arbitrary caller-configured repositories. The whole
//! directory listing is fetched once per process through the contents API,
//! cached, and every search is served by filtering the cached listing with a
//! case-insensitive substring match over the icon name, paginated in
//! filtered-index order.
//!
//! The contents API caps a single listing call; when the upstream truncates,
//! the provider keeps working on the truncated subset rather than failing.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::ListingCache;
use crate::errors::{AppError, AppResult};
use crate::models::{IconRecord, ProviderIdentity, SearchResult, SourceLocator};
use crate::sources::traits::IconProvider;
use crate::utils::http::HttpClient;

const BULK_CACHE_KEY: &str = "bulk-listing";
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const ICON_EXTENSIONS: &[&str] = &["svg"];

const DEFAULT_LICENSE: &str = "Check repository license";

pub struct GitHubDirectoryProvider {
    identity: ProviderIdentity,
    repo: String,
    path: String,
    api_base: String,
    license: String,
    attribution: String,
    client: HttpClient,
    cache: Arc<ListingCache>,
}

impl GitHubDirectoryProvider {
    pub fn new(
        identity: ProviderIdentity,
        client: HttpClient,
        cache: Arc<ListingCache>,
    ) -> AppResult<Self> {
        let (repo, path, api_base, license, attribution) = match &identity.source_locator {
            SourceLocator::GithubDirectory {
                repo,
                path,
                api_base,
                license,
                attribution,
            } => (
                repo.clone(),
                path.clone(),
                api_base.trim_end_matches('/').to_string(),
                license.clone().unwrap_or_else(|| DEFAULT_LICENSE.to_string()),
                attribution
                    .clone()
                    .unwrap_or_else(|| format!("Icons from {repo}")),
            ),
            other => {
                return Err(AppError::configuration(format!(
                    "provider '{}' needs a github_directory source locator, got {other:?}",
                    identity.name
                )))
            }
        };

        Ok(Self {
            identity,
            repo,
            path,
            api_base,
            license,
            attribution,
            client,
            cache,
        })
    }

    /// Maki map icons by Mapbox: a flat `icons/` directory of CC0 SVGs.
    pub fn maki_identity() -> ProviderIdentity {
        preset_identity(
            "Maki",
            "mapbox/maki",
            "icons",
            "CC0 1.0 Universal",
            "Maki Icons by Mapbox",
        )
    }

    /// Font Awesome Free, solid style.
    pub fn font_awesome_identity() -> ProviderIdentity {
        preset_identity(
            "Font Awesome Free",
            "FortAwesome/Font-Awesome",
            "svgs/solid",
            "CC BY 4.0",
            "Font Awesome Free by Fonticons",
        )
    }

    fn contents_url(&self) -> String {
        if self.path.is_empty() {
            format!("{}/repos/{}/contents", self.api_base, self.repo)
        } else {
            format!("{}/repos/{}/contents/{}", self.api_base, self.repo, self.path)
        }
    }

    /// Cached listing, fetching it on first use. Concurrent first fetches
    /// race benignly: the first cache write wins and losers discard theirs.
    async fn listing(&self, cancel: &CancellationToken) -> AppResult<Arc<Vec<IconRecord>>> {
        if let Some(listing) = self.cache.get(&self.identity.name, BULK_CACHE_KEY).await {
            debug!(provider = %self.identity.name, "serving listing from cache");
            return Ok(listing);
        }

        let listing = self.list_bulk(cancel).await?;

        // A cancelled caller must not publish state.
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        Ok(self
            .cache
            .put_if_absent(&self.identity.name, BULK_CACHE_KEY, listing)
            .await)
    }

    fn to_record(&self, entry: ContentsEntry, download_url: String) -> IconRecord {
        let stem = strip_extension(&entry.name);
        let source_url = entry.html_url.unwrap_or_else(|| {
            format!("https://github.com/{}/blob/main/{}", self.repo, entry.path)
        });

        IconRecord {
            id: stem.clone(),
            name: stem.clone(),
            source_url,
            preview_url: Some(download_url.clone()),
            download_url,
            license: self.license.clone(),
            attribution_text: Some(self.attribution.clone()),
            tags: vec![stem],
        }
    }
}

#[async_trait]
impl IconProvider for GitHubDirectoryProvider {
    fn identity(&self) -> &ProviderIdentity {
        &self.identity
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
        cancel: &CancellationToken,
    ) -> AppResult<SearchResult> {
        let page = page.max(1);
        let listing = self.listing(cancel).await?;

        let filtered = filter_listing(&listing, query);
        let total = filtered.len();

        let start = (page as usize - 1) * page_size as usize;
        let items: Vec<IconRecord> = filtered
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();

        debug!(
            provider = %self.identity.name,
            query,
            page,
            matches = total,
            "filtered cached listing"
        );

        Ok(SearchResult::paged(items, total as u64, page, page_size))
    }

    async fn fetch_asset(
        &self,
        download_url: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<u8>> {
        self.client
            .get_bytes(&self.identity.name, download_url, &[], cancel)
            .await
    }

    async fn list_bulk(&self, cancel: &CancellationToken) -> AppResult<Vec<IconRecord>> {
        let url = self.contents_url();
        debug!(provider = %self.identity.name, %url, "listing remote directory");

        let entries: Vec<ContentsEntry> = self
            .client
            .get_json(
                &self.identity.name,
                &url,
                &[("Accept", GITHUB_ACCEPT)],
                cancel,
            )
            .await?;

        let records: Vec<IconRecord> = entries
            .into_iter()
            .filter(|entry| entry.entry_type == "file" && is_icon_file(&entry.name))
            .filter_map(|entry| {
                let download_url = entry.download_url.clone()?;
                Some(self.to_record(entry, download_url))
            })
            .collect();

        info!(
            provider = %self.identity.name,
            count = records.len(),
            "listed icon directory"
        );
        Ok(records)
    }
}

fn preset_identity(
    name: &str,
    repo: &str,
    path: &str,
    license: &str,
    attribution: &str,
) -> ProviderIdentity {
    let mut identity = ProviderIdentity::github_repo(name, repo, path);
    if let SourceLocator::GithubDirectory {
        license: locator_license,
        attribution: locator_attribution,
        ..
    } = &mut identity.source_locator
    {
        *locator_license = Some(license.to_string());
        *locator_attribution = Some(attribution.to_string());
    }
    identity
}

/// Case-insensitive substring filter over record names. An empty query
/// matches everything.
fn filter_listing<'a>(listing: &'a [IconRecord], query: &str) -> Vec<&'a IconRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return listing.iter().collect();
    }
    listing
        .iter()
        .filter(|record| record.name.to_lowercase().contains(&needle))
        .collect()
}

fn is_icon_file(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => ICON_EXTENSIONS
            .iter()
            .any(|candidate| extension.eq_ignore_ascii_case(candidate)),
        _ => false,
    }
}

fn strip_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(rename = "type", default)]
    entry_type: String,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}
