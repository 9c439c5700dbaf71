use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_REPOSITORY_ROOT: &str = "Codewars";
pub const DEFAULT_BRANCH: &str = "main";

/// Repository coordinates and credential (the `[github]` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token sent as a bearer credential.
    #[serde(default)]
    pub token: String,
    /// Repository owner (user or organization).
    #[serde(default)]
    pub owner: String,
    /// Repository name.
    #[serde(default)]
    pub repo: String,
    /// The single branch every file is written to.
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
        }
    }
}

impl GitHubConfig {
    /// Token, owner and repo are set. An empty branch means `main`.
    pub fn is_complete(&self) -> bool {
        !self.token.trim().is_empty()
            && !self.owner.trim().is_empty()
            && !self.repo.trim().is_empty()
    }
}

/// Wait bounds and delays (optional `[timing]` table). Missing keys keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Bound on one readiness cycle.
    pub readiness_timeout_ms: u64,
    /// Bound on waiting for the editor widget before reading the solution.
    pub editor_wait_ms: u64,
    /// Delay after a navigation before the readiness cycle is re-armed.
    pub rearm_delay_ms: u64,
    /// Minimum time the trigger stays disabled after a save settles.
    pub cooldown_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            readiness_timeout_ms: 10_000,
            editor_wait_ms: 10_000,
            rearm_delay_ms: 500,
            cooldown_ms: 3_000,
        }
    }
}

impl TimingConfig {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn editor_wait(&self) -> Duration {
        Duration::from_millis(self.editor_wait_ms)
    }

    pub fn rearm_delay(&self) -> Duration {
        Duration::from_millis(self.rearm_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Global configuration loaded from `~/.config/cwgh/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CwghConfig {
    /// Base URL of the contents API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Top-level directory in the repository under which artifacts are stored.
    #[serde(default = "default_repository_root")]
    pub repository_root: String,
    /// Bound on every HTTP call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    /// Extra language id -> file extension entries, merged over the built-in table.
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_repository_root() -> String {
    DEFAULT_REPOSITORY_ROOT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for CwghConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            repository_root: default_repository_root(),
            request_timeout_secs: default_request_timeout_secs(),
            github: GitHubConfig::default(),
            timing: TimingConfig::default(),
            languages: BTreeMap::new(),
        }
    }
}

impl CwghConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cwgh")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CwghConfig> {
    load_or_init_at(&config_path()?)
}

/// Like `load_or_init` for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<CwghConfig> {
    if !path.exists() {
        let default_cfg = CwghConfig::default();
        save_to_path(&default_cfg, path)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: CwghConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

/// Write the configuration (creates the parent dir if needed).
pub fn save_to_path(cfg: &CwghConfig, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(cfg).context("serialize config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }
    fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
    Ok(())
}
