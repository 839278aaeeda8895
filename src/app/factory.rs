use crate::{
    app::{backend::MemeBackend, remote::AppRemote},
    config::Config,
};
use anyhow::{Context, Result};
use homedir::my_home;
use std::path::PathBuf;
use std::sync::Arc;

/// Application factory for creating and configuring application components
pub struct AppFactory;

impl AppFactory {
    /// Directory holding `config.yaml`.
    ///
    /// `MEMEFIND_BASE_PATH` wins, otherwise `~/.config/memefind`.
    pub fn get_base_path() -> Result<PathBuf> {
        if let Ok(base_path) = std::env::var("MEMEFIND_BASE_PATH") {
            return Ok(PathBuf::from(base_path));
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;
        Ok(home.join(".config").join("memefind"))
    }

    pub fn create_config() -> Result<Config> {
        let base_path = Self::get_base_path()?;
        Config::load_with(&base_path)
            .with_context(|| format!("Failed to load config from {}", base_path.display()))
    }

    pub fn create_backend(config: &Config) -> Result<Arc<dyn MemeBackend>> {
        log::info!("Using search api: {}", config.api_base);
        let remote = AppRemote::new(
            &config.api_base,
            config.api_token.clone(),
            config.connect_timeout(),
        )
        .context("Failed to build http client")?;

        Ok(Arc::new(remote))
    }
}
