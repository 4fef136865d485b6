//! Provider configuration
//!
//! The host supplies provider identities; this module gives it the same
//! load path the rest of the stack uses: a TOML file whose location comes
//! from an environment variable, falling back to the built-in open-set
//! defaults. Marketplace credentials are sourced from the environment (or
//! written into the identities directly by the host) and are never embedded
//! in the crate.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

use crate::models::{Credentials, ProviderIdentity, SourceLocator};
use crate::sources::github_directory::GitHubDirectoryProvider;
use crate::sources::noun_project::NounProjectProvider;

/// Environment variable naming the config file path.
pub const CONFIG_FILE_ENV: &str = "ICONHUB_CONFIG";
/// Environment variables supplying marketplace credentials.
pub const MARKETPLACE_KEY_ENV: &str = "NOUN_PROJECT_API_KEY";
pub const MARKETPLACE_SECRET_ENV: &str = "NOUN_PROJECT_API_SECRET";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: Vec<ProviderIdentity>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: vec![
                NounProjectProvider::default_identity(),
                GitHubDirectoryProvider::maki_identity(),
                GitHubDirectoryProvider::font_awesome_identity(),
            ],
        }
    }
}

impl Config {
    /// Load from the file named by `ICONHUB_CONFIG` (default
    /// `iconhub.toml`), or fall back to the default provider set when the
    /// file does not exist. Environment credentials are applied afterwards
    /// in both cases.
    pub fn load() -> Result<Self> {
        let config_file =
            env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| "iconhub.toml".to_string());

        let mut config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)?;
            Self::from_toml_str(&contents)?
        } else {
            Self::default()
        };

        config.apply_env_credentials();
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Fill in credentials from the environment for authenticated
    /// marketplace identities that do not carry any yet.
    pub fn apply_env_credentials(&mut self) {
        let (key, secret) = match (
            env::var(MARKETPLACE_KEY_ENV),
            env::var(MARKETPLACE_SECRET_ENV),
        ) {
            (Ok(key), Ok(secret)) => (key, secret),
            _ => return,
        };

        for identity in &mut self.providers {
            let is_marketplace =
                matches!(identity.source_locator, SourceLocator::Marketplace { .. });
            if is_marketplace && identity.requires_auth && identity.credentials.is_none() {
                identity.credentials = Some(Credentials::new(key.clone(), secret.clone()));
            }
        }
    }

    pub fn into_identities(self) -> Vec<ProviderIdentity> {
        self.providers
    }
}
