//! # iconhub
//!
//! Icon search aggregation core: a polymorphic provider abstraction over
//! heterogeneous remote icon sources (an OAuth 1.0a-signed marketplace and
//! GitHub-hosted icon directories), a per-provider listing cache, and an
//! attribution ledger tracking the license obligations of every imported
//! asset.
//!
//! The crate retrieves, normalizes, and tracks metadata and raw file bytes;
//! rendering, persistence, and retry policy belong to the host application.

pub mod attribution;
pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod oauth;
pub mod sources;
pub mod utils;

pub use attribution::AttributionLedger;
pub use cache::ListingCache;
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use models::{
    AttributionEntry, Credentials, IconRecord, ProviderIdentity, SearchResult, SourceLocator,
};
pub use sources::{GitHubDirectoryProvider, IconProvider, NounProjectProvider, ProviderRegistry};
pub use utils::http::HttpClient;
