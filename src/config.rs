//! Configuration loading
//!
//! Settings come from a TOML file and are overridden by command-line
//! flags. The resolved [`AutomergeConfig`] is built once per run and passed
//! explicitly to the service and the merge engine.

use crate::error::{Error, Result};
use crate::merge::{DEFAULT_COMMIT_MESSAGE, DEFAULT_CONCURRENCY, MergeOptions, PermissionGuard};
use crate::types::Permission;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "automerge.toml";

/// Environment variables consulted for a token, in order
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Raw contents of a config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// GitHub access token
    pub access_token: Option<String>,
    /// Organization to merge across
    pub organization: Option<String>,
    /// GitHub Enterprise host
    pub host: Option<String>,
    /// Permission levels allowed to merge
    pub allowed_permissions: Option<Vec<Permission>>,
    /// Commit message template
    pub commit_message: Option<String>,
    /// Merge attempts in flight per phase
    pub concurrency: Option<usize>,
}

/// Values given on the command line; they win over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `--token`
    pub token: Option<String>,
    /// `--org`
    pub organization: Option<String>,
    /// `--concurrency`
    pub concurrency: Option<usize>,
}

/// Where the access token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `--token` flag
    Flag,
    /// `access_token` in the config file
    ConfigFile,
    /// `GITHUB_TOKEN` / `GH_TOKEN`
    EnvVar,
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct AutomergeConfig {
    /// GitHub access token
    pub token: String,
    /// Where `token` came from
    pub token_source: TokenSource,
    /// Organization to merge across
    pub organization: String,
    /// GitHub Enterprise host (`None` for github.com)
    pub host: Option<String>,
    /// Permission levels allowed to merge
    pub allowed_permissions: Vec<Permission>,
    /// Commit message template
    pub commit_message: String,
    /// Merge attempts in flight per phase
    pub concurrency: usize,
}

impl AutomergeConfig {
    /// Build merge-engine options from this configuration
    #[must_use]
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            guard: PermissionGuard::new(self.allowed_permissions.clone()),
            commit_message: self.commit_message.clone(),
            concurrency: self.concurrency,
            cancel: None,
        }
    }
}

/// Default config path in the user's config directory
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("automerge").join("config.toml"))
}

/// Parse a config file from disk
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Load the config file.
///
/// An explicit path must exist. Otherwise `./automerge.toml` and then the
/// user config file are tried; when neither exists an empty config is
/// returned.
pub fn load_config_file(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return read_config_file(path);
    }

    let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)).chain(user_config_path());
    for path in candidates {
        if path.is_file() {
            debug!(path = %path.display(), "loading config file");
            return read_config_file(&path);
        }
    }

    debug!("no config file found, using defaults");
    Ok(ConfigFile::default())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn token_from_env() -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .find_map(|name| non_blank(std::env::var(name).ok()))
}

/// Resolve the final configuration (PURE apart from the environment lookup)
///
/// Flags override file values. The token falls back to `GITHUB_TOKEN`,
/// then `GH_TOKEN`.
pub fn resolve_config(file: ConfigFile, overrides: ConfigOverrides) -> Result<AutomergeConfig> {
    resolve_config_with_env(file, overrides, token_from_env)
}

fn resolve_config_with_env(
    file: ConfigFile,
    overrides: ConfigOverrides,
    env_token: impl FnOnce() -> Option<String>,
) -> Result<AutomergeConfig> {
    let (token, token_source) = if let Some(token) = non_blank(overrides.token) {
        (token, TokenSource::Flag)
    } else if let Some(token) = non_blank(file.access_token) {
        (token, TokenSource::ConfigFile)
    } else if let Some(token) = env_token() {
        (token, TokenSource::EnvVar)
    } else {
        return Err(Error::Config(
            "no access token: pass --token, set access_token in the config file, or export GITHUB_TOKEN"
                .to_string(),
        ));
    };

    let organization = non_blank(overrides.organization)
        .or_else(|| non_blank(file.organization))
        .ok_or_else(|| {
            Error::Config(
                "no organization: pass --org or set organization in the config file".to_string(),
            )
        })?;

    let allowed_permissions = file
        .allowed_permissions
        .unwrap_or_else(|| Permission::MERGE_DEFAULTS.to_vec());
    if allowed_permissions.is_empty() {
        return Err(Error::Config(
            "allowed_permissions must list at least one permission level".to_string(),
        ));
    }

    let concurrency = overrides
        .concurrency
        .or(file.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY);
    if concurrency == 0 {
        return Err(Error::Config("concurrency must be at least 1".to_string()));
    }

    Ok(AutomergeConfig {
        token,
        token_source,
        organization,
        host: non_blank(file.host),
        allowed_permissions,
        commit_message: non_blank(file.commit_message)
            .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
        concurrency,
    })
}
