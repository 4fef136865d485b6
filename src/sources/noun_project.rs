//! The Noun Project marketplace provider
//!
//! Searches the v2 icon API with one-legged OAuth 1.0a request signing.
//! Results are query-specific, so there is no bulk listing and nothing to
//! cache; the upstream-reported total is best-effort (the marketplace is
//! known to report inconsistent counts for the same query).

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::errors::{AppError, AppResult};
use crate::models::{IconRecord, ProviderIdentity, SearchResult, SourceLocator};
use crate::oauth::{authorization_header, RequestSigner};
use crate::sources::traits::IconProvider;
use crate::utils::http::HttpClient;

pub const DEFAULT_NAME: &str = "The Noun Project";
pub const DEFAULT_ENDPOINT: &str = "https://api.thenounproject.com/v2/icon";

/// Provider-declared maximum page size for one search call.
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct NounProjectProvider {
    identity: ProviderIdentity,
    endpoint: String,
    client: HttpClient,
}

impl NounProjectProvider {
    pub fn new(identity: ProviderIdentity, client: HttpClient) -> AppResult<Self> {
        let endpoint = match &identity.source_locator {
            SourceLocator::Marketplace { endpoint } => endpoint.clone(),
            other => {
                return Err(AppError::configuration(format!(
                    "provider '{}' needs a marketplace source locator, got {other:?}",
                    identity.name
                )))
            }
        };

        Ok(Self {
            identity,
            endpoint,
            client,
        })
    }

    /// Identity for the live marketplace, without credentials. The host
    /// supplies key and secret; the crate never embeds them.
    pub fn default_identity() -> ProviderIdentity {
        ProviderIdentity {
            name: DEFAULT_NAME.to_string(),
            requires_auth: true,
            credentials: None,
            source_locator: SourceLocator::Marketplace {
                endpoint: DEFAULT_ENDPOINT.to_string(),
            },
        }
    }

    fn signer(&self) -> AppResult<RequestSigner> {
        let credentials = self
            .identity
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::auth_required(&self.identity.name))?;
        Ok(RequestSigner::new(&credentials.key, &credentials.secret))
    }

    fn to_record(&self, icon: NounIcon) -> IconRecord {
        let uploader = icon
            .uploader
            .map(|u| u.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        IconRecord {
            id: stringify_id(&icon.id),
            name: if icon.term.is_empty() {
                "Unknown".to_string()
            } else {
                icon.term
            },
            source_url: icon.permalink,
            preview_url: icon.preview_url.or(icon.thumbnail_url),
            download_url: icon.icon_url.unwrap_or_default(),
            license: icon
                .license_description
                .unwrap_or_else(|| "Unknown".to_string()),
            attribution_text: Some(format!("Created by {uploader} from Noun Project")),
            tags: icon.tags,
        }
    }
}

#[async_trait]
impl IconProvider for NounProjectProvider {
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
        let signer = self.signer()?;
        let page = page.max(1);
        let limit = page_size.min(MAX_PAGE_SIZE);

        let mut params = BTreeMap::new();
        params.insert("query".to_string(), query.to_string());
        params.insert("limit".to_string(), limit.to_string());
        params.insert("page".to_string(), page.to_string());

        let signed = signer.sign("GET", &self.endpoint, &params)?;
        let header = authorization_header(&signed);

        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            AppError::configuration(format!("invalid endpoint '{}': {e}", self.endpoint))
        })?;
        for (key, value) in &params {
            url.query_pairs_mut().append_pair(key, value);
        }

        debug!(provider = %self.identity.name, query, page, "searching marketplace");

        let response: NounSearchResponse = self
            .client
            .get_json(
                &self.identity.name,
                url.as_str(),
                &[
                    ("Authorization", header.as_str()),
                    ("Accept", "application/json"),
                ],
                cancel,
            )
            .await?;

        let items: Vec<IconRecord> = response
            .icons
            .into_iter()
            .map(|icon| self.to_record(icon))
            .collect();

        debug!(
            provider = %self.identity.name,
            returned = items.len(),
            total = response.total,
            "marketplace search complete"
        );

        Ok(SearchResult::paged(items, response.total, page, limit))
    }

    async fn fetch_asset(
        &self,
        download_url: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<u8>> {
        let signer = self.signer()?;

        // Downloads are signed too. Any query string on the asset URL has to
        // participate in the signature, so split it off and sign the bare URL
        // with those pairs as parameters.
        let parsed = Url::parse(download_url)
            .map_err(|e| AppError::fetch_failed(download_url, format!("invalid URL: {e}")))?;
        let params: BTreeMap<String, String> = parsed
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        let mut bare = parsed.clone();
        bare.set_query(None);

        let signed = signer.sign("GET", bare.as_str(), &params)?;
        let header = authorization_header(&signed);

        self.client
            .get_bytes(
                &self.identity.name,
                download_url,
                &[("Authorization", header.as_str())],
                cancel,
            )
            .await
    }

    async fn list_bulk(&self, _cancel: &CancellationToken) -> AppResult<Vec<IconRecord>> {
        Err(AppError::unsupported(
            &self.identity.name,
            "bulk listing (results are query-specific)",
        ))
    }
}

#[derive(Debug, Deserialize)]
struct NounSearchResponse {
    #[serde(default)]
    icons: Vec<NounIcon>,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct NounIcon {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    term: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    license_description: Option<String>,
    #[serde(default)]
    icon_url: Option<String>,
    #[serde(default)]
    uploader: Option<NounUploader>,
}

#[derive(Debug, Deserialize)]
struct NounUploader {
    #[serde(default)]
    name: String,
}

/// The marketplace has served ids both as numbers and strings.
fn stringify_id(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Credentials;

    fn provider(credentials: Option<Credentials>) -> NounProjectProvider {
        let mut identity = NounProjectProvider::default_identity();
        identity.credentials = credentials;
        NounProjectProvider::new(identity, HttpClient::new()).unwrap()
    }

    #[tokio::test]
    async fn search_without_credentials_is_auth_required() {
        let provider = provider(None);
        let cancel = CancellationToken::new();
        let result = provider.search("star", 1, 20, &cancel).await;
        assert!(matches!(result, Err(AppError::AuthRequired { .. })));
    }

    #[tokio::test]
    async fn fetch_without_credentials_is_auth_required() {
        let provider = provider(None);
        let cancel = CancellationToken::new();
        let result = provider
            .fetch_asset("https://static.example.com/icon.svg", &cancel)
            .await;
        assert!(matches!(result, Err(AppError::AuthRequired { .. })));
    }

    #[tokio::test]
    async fn bulk_listing_is_unsupported() {
        let provider = provider(Some(Credentials::new("k", "s")));
        let cancel = CancellationToken::new();
        let result = provider.list_bulk(&cancel).await;
        assert!(matches!(result, Err(AppError::Unsupported { .. })));
    }

    #[test]
    fn rejects_non_marketplace_locator() {
        let identity = ProviderIdentity::github_repo("Maki", "mapbox/maki", "icons");
        let result = NounProjectProvider::new(identity, HttpClient::new());
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }

    #[test]
    fn record_mapping_fills_attribution_and_defaults() {
        let provider = provider(Some(Credentials::new("k", "s")));
        let icon: NounIcon = serde_json::from_value(serde_json::json!({
            "id": 4711,
            "term": "star",
            "permalink": "/icon/star-4711",
            "thumbnail_url": "https://static.example.com/star-thumb.png",
            "tags": ["star", "favorite"],
            "license_description": "creative-commons-attribution",
            "icon_url": "https://static.example.com/star.svg",
            "uploader": {"name": "Jane Doe"}
        }))
        .unwrap();

        let record = provider.to_record(icon);
        assert_eq!(record.id, "4711");
        assert_eq!(record.name, "star");
        assert_eq!(
            record.attribution_text.as_deref(),
            Some("Created by Jane Doe from Noun Project")
        );
        assert_eq!(
            record.preview_url.as_deref(),
            Some("https://static.example.com/star-thumb.png")
        );
        assert_eq!(record.tags, vec!["star", "favorite"]);
    }

    #[test]
    fn record_mapping_tolerates_sparse_payloads() {
        let provider = provider(Some(Credentials::new("k", "s")));
        let icon: NounIcon = serde_json::from_value(serde_json::json!({"id": "abc"})).unwrap();
        let record = provider.to_record(icon);
        assert_eq!(record.id, "abc");
        assert_eq!(record.name, "Unknown");
        assert_eq!(record.license, "Unknown");
        assert_eq!(
            record.attribution_text.as_deref(),
            Some("Created by Unknown from Noun Project")
        );
    }
}
