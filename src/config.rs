use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE: &str = "http://localhost:8080/api/v1";
const DEFAULT_TOP_K: usize = 20;
const DEFAULT_PAGE_SIZE: usize = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Upper bound for `top_k`, `page_size` and any `--limit` given on the command line.
pub const MAX_LIMIT: usize = 100;

const CONFIG_FILE: &str = "config.yaml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root of the search API, e.g. `http://localhost:8080/api/v1`
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Sent as `Authorization: Bearer <token>` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Number of results requested per search
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Number of memes per page when listing
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_token: None,
            top_k: DEFAULT_TOP_K,
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            base_path: PathBuf::new(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl Config {
    pub fn validate(&mut self) -> anyhow::Result<()> {
        let trimmed = self.api_base.trim().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&trimmed)
            .with_context(|| format!("api_base {:?} is not a valid url", self.api_base))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("api_base must be an http(s) url, got {:?}", self.api_base);
        }
        self.api_base = trimmed;

        if !(1..=MAX_LIMIT).contains(&self.top_k) {
            bail!("top_k must be between 1 and {MAX_LIMIT}, got {}", self.top_k);
        }

        if !(1..=MAX_LIMIT).contains(&self.page_size) {
            bail!("page_size must be between 1 and {MAX_LIMIT}, got {}", self.page_size);
        }

        if self.connect_timeout_secs == 0 {
            bail!("connect_timeout_secs must be greater than 0");
        }

        self.api_token = self
            .api_token
            .take()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(())
    }

    /// Load `config.yaml` from `base_path`, writing the defaults first if it
    /// doesn't exist yet.
    pub fn load_with(base_path: &Path) -> anyhow::Result<Self> {
        let path = base_path.join(CONFIG_FILE);

        if !path.exists() {
            std::fs::create_dir_all(base_path)
                .with_context(|| format!("failed to create {}", base_path.display()))?;
            std::fs::write(&path, serde_yml::to_string(&Self::default())?)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str)
            .with_context(|| format!("{} is malformed", path.display()))?;

        config.base_path = base_path.to_path_buf();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        config.apply_overrides(
            std::env::var("MEMEFIND_API_BASE").ok(),
            std::env::var("MEMEFIND_API_TOKEN").ok(),
        );
        config.validate()?;

        Ok(config)
    }

    /// Values from the environment take precedence over the file. They are
    /// never written back.
    pub fn apply_overrides(&mut self, api_base: Option<String>, api_token: Option<String>) {
        if let Some(api_base) = api_base.filter(|b| !b.trim().is_empty()) {
            self.api_base = api_base;
        }
        if let Some(api_token) = api_token {
            self.api_token = Some(api_token);
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = self.base_path.join(CONFIG_FILE);
        std::fs::write(&path, serde_yml::to_string(&self)?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn path(&self) -> PathBuf {
        self.base_path.join(CONFIG_FILE)
    }

    pub fn connect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.connect_timeout_secs)
    }
}
