//! Data models for the iconhub library

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One normalized search result item. Immutable once constructed; every
/// provider maps its upstream payload into this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRecord {
    /// Provider-scoped identifier (marketplace numeric id, file stem, ...)
    pub id: String,
    pub name: String,
    /// Human-facing page for the icon (repository blob, marketplace permalink)
    pub source_url: String,
    pub preview_url: Option<String>,
    pub download_url: String,
    pub license: String,
    pub attribution_text: Option<String>,
    pub tags: Vec<String>,
}

/// One page of a query against a single provider.
///
/// Invariants enforced by [`SearchResult::paged`]:
/// `items.len() <= page_size` and `has_next == (page * page_size < total_count)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Items in provider relevance / listing order
    pub items: Vec<IconRecord>,
    /// Provider-reported or locally computed match count. Best-effort for
    /// marketplace providers, exact for bulk-directory providers.
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl SearchResult {
    /// Build a page, deriving the pagination flags from the reported total.
    pub fn paged(mut items: Vec<IconRecord>, total_count: u64, page: u32, page_size: u32) -> Self {
        items.truncate(page_size as usize);
        Self {
            items,
            total_count,
            page,
            page_size,
            has_next: (page as u64) * (page_size as u64) < total_count,
            has_previous: page > 1,
        }
    }

    /// A valid zero-match result. Not an error: empty results are success.
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self::paged(Vec::new(), 0, page, page_size)
    }
}

/// Consumer key/secret pair for an authenticated provider.
///
/// Treated as opaque throughout the crate; the `Debug` impl redacts both
/// halves so credentials can never leak through logging.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new<K: Into<String>, S: Into<String>>(key: K, secret: S) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"***")
            .field("secret", &"***")
            .finish()
    }
}

/// Where a provider's content lives and how it is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceLocator {
    /// OAuth-signed marketplace search endpoint
    Marketplace { endpoint: String },
    /// Flat directory of icon files in a hosted repository, listed through
    /// the repository API's contents endpoint
    GithubDirectory {
        /// `owner/repo`
        repo: String,
        /// Directory within the repository ("" for the repository root)
        #[serde(default)]
        path: String,
        #[serde(default = "default_github_api_base")]
        api_base: String,
        /// License to stamp on every record; repositories rarely expose one
        /// per file
        #[serde(default)]
        license: Option<String>,
        #[serde(default)]
        attribution: Option<String>,
    },
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

/// Configuration for one provider instance. Created at registry
/// initialization from external configuration; immutable for the process
/// lifetime. Reconfiguration means building a new registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderIdentity {
    /// Unique key within the registry
    pub name: String,
    pub requires_auth: bool,
    /// Absent unless `requires_auth`; sourced by the host (environment,
    /// secure settings, direct parameters) and never embedded in the crate
    #[serde(default)]
    pub credentials: Option<Credentials>,
    pub source_locator: SourceLocator,
}

impl ProviderIdentity {
    /// Identity for a caller-configured repository directory provider.
    pub fn github_repo<N: Into<String>, R: Into<String>, P: Into<String>>(
        name: N,
        repo: R,
        path: P,
    ) -> Self {
        Self {
            name: name.into(),
            requires_auth: false,
            credentials: None,
            source_locator: SourceLocator::GithubDirectory {
                repo: repo.into(),
                path: path.into(),
                api_base: default_github_api_base(),
                license: None,
                attribution: None,
            },
        }
    }
}

/// One row of the attribution ledger: the license obligations attached to a
/// single imported asset. Created exactly once per successful import and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionEntry {
    pub icon_id: String,
    pub icon_name: String,
    pub provider_name: String,
    pub license: String,
    pub attribution_text: Option<String>,
    pub source_url: String,
    pub imported_at: DateTime<Utc>,
    pub local_file_path: String,
}

impl AttributionEntry {
    /// Build an entry for an icon imported right now.
    pub fn from_record<P: Into<String>, F: Into<String>>(
        record: &IconRecord,
        provider_name: P,
        local_file_path: F,
    ) -> Self {
        Self {
            icon_id: record.id.clone(),
            icon_name: record.name.clone(),
            provider_name: provider_name.into(),
            license: record.license.clone(),
            attribution_text: record.attribution_text.clone(),
            source_url: record.source_url.clone(),
            imported_at: Utc::now(),
            local_file_path: local_file_path.into(),
        }
    }

    /// Merge identity: two entries with the same key describe the same
    /// compliance event.
    pub fn merge_key(&self) -> (String, String, DateTime<Utc>) {
        (
            self.icon_id.clone(),
            self.provider_name.clone(),
            self.imported_at,
        )
    }
}
