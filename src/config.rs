//! Run configuration: where to mirror from, where to mirror to, and how.
//!
//! Configuration can come from a YAML file, CLI flags, or both (flags win).
//! Everything is validated exhaustively into a [`RunSpec`] before any
//! remote mutation happens.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::MirrorError;
use crate::model::{dedup_preserving, AccountKind, CloneProtocol, ProviderKind};

/// Raw mirror configuration as read from file/flags.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Source coordinate, e.g. "github/xiexianbin"
    pub source: String,

    /// Destination coordinate, e.g. "gitee/xiexianbin"
    pub destination: String,

    /// Token used to list repositories on the source provider
    #[serde(default)]
    pub source_token: Option<String>,

    /// Token used to create/update repositories on the destination provider
    #[serde(default)]
    pub dest_token: Option<String>,

    /// SSH private key used to push to the destination provider
    #[serde(default)]
    pub dest_ssh_key: Option<String>,

    /// Source account kind: "user" or "org"
    #[serde(default = "default_account_type")]
    pub account_type: String,

    /// Destination account kind, defaults to `account_type`
    #[serde(default)]
    pub dest_account_type: Option<String>,

    /// Clone/push transport: "ssh" or "https"
    #[serde(default = "default_clone_style")]
    pub clone_style: String,

    /// Local working-copy cache root, one directory per source repository
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Repositories to always skip (ignored when white_list is non-empty)
    #[serde(default)]
    pub black_list: Vec<String>,

    /// If non-empty, mirror exactly these repositories in this order
    #[serde(default)]
    pub white_list: Vec<String>,

    /// Source name -> destination name renames; not transitive
    #[serde(default)]
    pub mappings: HashMap<String, String>,

    /// Force-push the main refspec groups (deletions are never forced)
    #[serde(default)]
    pub force_update: bool,

    /// Per-git-operation timeout: "600" (seconds), "30m", "2h"
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

fn default_account_type() -> String {
    "user".to_string()
}
fn default_clone_style() -> String {
    "ssh".to_string()
}
fn default_cache_path() -> String {
    "${HOME}/.cache/repomirror".to_string()
}
fn default_timeout() -> String {
    "30m".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: String::new(),
            destination: String::new(),
            source_token: None,
            dest_token: None,
            dest_ssh_key: None,
            account_type: default_account_type(),
            dest_account_type: None,
            clone_style: default_clone_style(),
            cache_path: default_cache_path(),
            black_list: Vec::new(),
            white_list: Vec::new(),
            mappings: HashMap::new(),
            force_update: false,
            timeout: default_timeout(),
        }
    }
}

/// One side of a mirror run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinate<'a> {
    pub provider: ProviderKind,
    pub account: &'a str,
}

impl std::fmt::Display for Coordinate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.account)
    }
}

/// Fully validated, immutable run configuration consumed by the driver.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub source_provider: ProviderKind,
    pub source_account: String,
    pub source_kind: AccountKind,
    pub source_token: Option<String>,
    pub dest_provider: ProviderKind,
    pub dest_account: String,
    pub dest_kind: AccountKind,
    pub dest_token: Option<String>,
    pub dest_ssh_key: Option<PathBuf>,
    pub clone_protocol: CloneProtocol,
    pub cache_path: PathBuf,
    pub deny_list: Vec<String>,
    pub allow_list: Vec<String>,
    pub renames: HashMap<String, String>,
    pub force_update: bool,
    pub timeout: Duration,
}

impl RunSpec {
    pub fn source(&self) -> Coordinate<'_> {
        Coordinate {
            provider: self.source_provider,
            account: &self.source_account,
        }
    }

    pub fn destination(&self) -> Coordinate<'_> {
        Coordinate {
            provider: self.dest_provider,
            account: &self.dest_account,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Default configuration file path (XDG compliant).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repomirror").join("config.yml"))
    }

    /// Validate everything and produce the immutable run spec.
    ///
    /// Every configuration problem is reported here, before any catalog is
    /// listed or any remote resource is touched.
    pub fn resolve(&self) -> Result<RunSpec, MirrorError> {
        let (source_provider, source_account) = parse_coordinate(&self.source, "source")?;
        let (dest_provider, dest_account) = parse_coordinate(&self.destination, "destination")?;

        let source_kind = AccountKind::parse(&self.account_type).ok_or_else(|| {
            MirrorError::config(format!("un-support account-type {}", self.account_type))
        })?;
        let dest_kind = match &self.dest_account_type {
            Some(kind) => AccountKind::parse(kind).ok_or_else(|| {
                MirrorError::config(format!("un-support dest-account-type {}", kind))
            })?,
            None => source_kind,
        };

        let clone_protocol = CloneProtocol::parse(&self.clone_style).ok_or_else(|| {
            MirrorError::config(format!(
                "un-support clone-style {} (expected ssh or https)",
                self.clone_style
            ))
        })?;

        let timeout = parse_timeout(&self.timeout)?;

        if self.dest_token.is_none() && self.dest_ssh_key.is_none() {
            return Err(MirrorError::config(
                "destination requires a token or an SSH private key",
            ));
        }

        let cache_path = expand_path(&self.cache_path)?;
        let dest_ssh_key = match &self.dest_ssh_key {
            Some(key) => {
                let key = expand_path(key)?;
                if !key.exists() {
                    return Err(MirrorError::config(format!(
                        "destination SSH key {} does not exist",
                        key.display()
                    )));
                }
                Some(key)
            }
            None => None,
        };

        Ok(RunSpec {
            source_provider,
            source_account: source_account.to_string(),
            source_kind,
            source_token: self.source_token.clone(),
            dest_provider,
            dest_account: dest_account.to_string(),
            dest_kind,
            dest_token: self.dest_token.clone(),
            dest_ssh_key,
            clone_protocol,
            cache_path,
            deny_list: dedup_preserving(&self.black_list),
            allow_list: dedup_preserving(&self.white_list),
            renames: self.mappings.clone(),
            force_update: self.force_update,
            timeout,
        })
    }
}

fn expand_path(raw: &str) -> Result<PathBuf, MirrorError> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| MirrorError::config(format!("failed to expand path {}: {}", raw, e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn parse_coordinate<'a>(raw: &'a str, which: &str) -> Result<(ProviderKind, &'a str), MirrorError> {
    let (provider, account) = raw.split_once('/').ok_or_else(|| {
        MirrorError::config(format!(
            "{} must look like provider/account (e.g. github/xiexianbin), got {:?}",
            which, raw
        ))
    })?;

    let provider = ProviderKind::parse(provider)
        .ok_or_else(|| MirrorError::config(format!("un-support git {}", provider)))?;

    if account.is_empty() || account.contains('/') {
        return Err(MirrorError::config(format!(
            "{} account name {:?} is invalid",
            which, account
        )));
    }

    Ok((provider, account))
}

/// Parse a per-operation timeout: bare seconds ("600"), minutes ("30m") or
/// hours ("2h").
pub fn parse_timeout(raw: &str) -> Result<Duration, MirrorError> {
    let raw = raw.trim();
    let (digits, unit) = match raw.chars().last() {
        Some('s') => (&raw[..raw.len() - 1], 1),
        Some('m') => (&raw[..raw.len() - 1], 60),
        Some('h') => (&raw[..raw.len() - 1], 3600),
        Some(c) if c.is_ascii_digit() => (raw, 1),
        _ => {
            return Err(MirrorError::config(format!(
                "invalid timeout {:?} (expected e.g. 600, 30m, 2h)",
                raw
            )))
        }
    };

    let value: u64 = digits.parse().map_err(|_| {
        MirrorError::config(format!(
            "invalid timeout {:?} (expected e.g. 600, 30m, 2h)",
            raw
        ))
    })?;
    if value == 0 {
        return Err(MirrorError::config("timeout must be greater than zero"));
    }

    Ok(Duration::from_secs(value * unit))
}

/// Parse a CLI rename spec like "A=>B, C=>CC".
pub fn parse_mappings(raw: &str) -> Result<HashMap<String, String>, MirrorError> {
    let mut mappings = HashMap::new();
    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (from, to) = pair.split_once("=>").ok_or_else(|| {
            MirrorError::config(format!(
                "invalid mapping {:?} (expected 'A=>B, C=>CC')",
                pair
            ))
        })?;
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(MirrorError::config(format!(
                "invalid mapping {:?} (empty side)",
                pair
            )));
        }
        mappings.insert(from.to_string(), to.to_string());
    }
    Ok(mappings)
}

/// Parse a CLI list like "repo1,repo2,repo3".
pub fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
