//! Icon source providers
//!
//! Each remote icon source gets one handler implementing the common
//! [`IconProvider`](traits::IconProvider) trait:
//!
//! - [`noun_project`]: the OAuth-signed marketplace (query-specific results,
//!   no bulk listing)
//! - [`github_directory`]: open icon sets hosted as flat repository
//!   directories, fetched in bulk once and filtered locally; covers both the
//!   fixed presets and caller-configured repositories
//!
//! [`registry`] owns the configured set and is the fan-out point for a query.

pub mod github_directory;
pub mod noun_project;
pub mod registry;
pub mod traits;

pub use github_directory::GitHubDirectoryProvider;
pub use noun_project::NounProjectProvider;
pub use registry::{ProviderFactory, ProviderRegistry};
pub use traits::IconProvider;
