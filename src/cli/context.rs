//! Shared command context
//!
//! Resolves configuration and builds the repository service once per run.

use org_automerge::config::{
    AutomergeConfig, ConfigOverrides, TokenSource, load_config_file, resolve_config,
};
use org_automerge::error::Result;
use org_automerge::platform::{GitHubService, RepositoryService};
use std::path::Path;
use tracing::debug;

/// Configuration and service for one automerge run
pub struct CommandContext {
    /// Resolved configuration
    pub config: AutomergeConfig,
    /// Repository service for the configured organization
    pub service: Box<dyn RepositoryService>,
}

impl CommandContext {
    /// Load configuration (file, then flag overrides) and create the service
    pub fn new(config_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let file = load_config_file(config_path)?;
        let config = resolve_config(file, overrides)?;

        let token_from = match config.token_source {
            TokenSource::Flag => "flag",
            TokenSource::ConfigFile => "config file",
            TokenSource::EnvVar => "environment",
        };
        debug!(
            organization = %config.organization,
            host = ?config.host,
            token_from,
            "resolved configuration"
        );

        let service = GitHubService::new(
            &config.token,
            config.organization.clone(),
            config.host.as_deref(),
        )?;

        Ok(Self {
            config,
            service: Box::new(service),
        })
    }
}
