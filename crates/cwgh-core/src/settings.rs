//! Credential storage and the host hooks that surround a save.

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::{self, CwghConfig, DEFAULT_BRANCH};
use crate::sync::RepoTarget;

pub const TOKEN: &str = "token";
pub const OWNER: &str = "owner";
pub const REPO: &str = "repo";
pub const BRANCH: &str = "branch";

/// Every credential name a store understands.
pub const CREDENTIAL_NAMES: &[&str] = &[TOKEN, OWNER, REPO, BRANCH];

/// Persistent key/value store for repository credentials.
pub trait SettingsStore: Send {
    fn get_credential(&self, name: &str) -> Option<String>;

    fn set_credential(&mut self, name: &str, value: &str) -> Result<()>;

    /// Token, owner and repo are set. Branch falls back to `main`.
    fn is_fully_configured(&self) -> bool {
        [TOKEN, OWNER, REPO]
            .iter()
            .all(|n| self.get_credential(n).is_some_and(|v| !v.trim().is_empty()))
    }
}

/// Asks the user to fill in missing settings. Returns whether they completed it.
pub trait ConfigurationPrompt: Send + Sync {
    fn request_configuration(&self, store: &mut dyn SettingsStore) -> bool;
}

/// Blocking user-visible message.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Credentials needed to reach the repository, read out of a store.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: String,
    pub target: RepoTarget,
}

impl Credentials {
    /// `None` unless the store is fully configured.
    pub fn from_store(store: &dyn SettingsStore) -> Option<Self> {
        if !store.is_fully_configured() {
            return None;
        }
        let get = |name: &str| store.get_credential(name).unwrap_or_default().trim().to_string();
        let branch = Some(get(BRANCH))
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        Some(Self {
            token: get(TOKEN),
            target: RepoTarget {
                owner: get(OWNER),
                repo: get(REPO),
                branch,
            },
        })
    }
}

fn check_name(name: &str) -> Result<()> {
    if !CREDENTIAL_NAMES.contains(&name) {
        bail!("unknown setting '{}' (expected one of {:?})", name, CREDENTIAL_NAMES);
    }
    Ok(())
}

/// Store backed by the `[github]` table of the config file. Writes go to disk
/// immediately.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
    config: CwghConfig,
}

impl TomlSettingsStore {
    /// Open the store at the default config location.
    pub fn open() -> Result<Self> {
        let config = config::load_or_init()?;
        Ok(Self {
            path: config::config_path()?,
            config,
        })
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let config = config::load_or_init_at(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    pub fn config(&self) -> &CwghConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn get_credential(&self, name: &str) -> Option<String> {
        let gh = &self.config.github;
        let value = match name {
            TOKEN => &gh.token,
            OWNER => &gh.owner,
            REPO => &gh.repo,
            BRANCH => &gh.branch,
            _ => return None,
        };
        Some(value.clone()).filter(|v| !v.is_empty())
    }

    fn is_fully_configured(&self) -> bool {
        self.config.github.is_complete()
    }

    fn set_credential(&mut self, name: &str, value: &str) -> Result<()> {
        check_name(name)?;
        let gh = &mut self.config.github;
        let slot = match name {
            TOKEN => &mut gh.token,
            OWNER => &mut gh.owner,
            REPO => &mut gh.repo,
            _ => &mut gh.branch,
        };
        *slot = value.trim().to_string();
        config::save_to_path(&self.config, &self.path)?;
        tracing::debug!(setting = name, "stored setting");
        Ok(())
    }
}

/// Process-local store, for hosts that keep credentials elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    values: BTreeMap<String, String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with token, owner, repo and branch already set.
    pub fn configured(token: &str, owner: &str, repo: &str, branch: &str) -> Self {
        let mut values = BTreeMap::new();
        for (k, v) in [(TOKEN, token), (OWNER, owner), (REPO, repo), (BRANCH, branch)] {
            values.insert(k.to_string(), v.to_string());
        }
        Self { values }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_credential(&self, name: &str) -> Option<String> {
        self.values.get(name).filter(|v| !v.is_empty()).cloned()
    }

    fn set_credential(&mut self, name: &str, value: &str) -> Result<()> {
        check_name(name)?;
        self.values.insert(name.to_string(), value.trim().to_string());
        Ok(())
    }
}
