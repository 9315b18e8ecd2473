use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_CMC_BASE_URL: &str = "https://sandbox-api.coinmarketcap.com";
pub const API_KEY_ENV: &str = "CMC_PRO_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinMarketCapConfig {
    #[serde(default = "default_cmc_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
}

fn default_cmc_base_url() -> String {
    DEFAULT_CMC_BASE_URL.to_string()
}

impl Default for CoinMarketCapConfig {
    fn default() -> Self {
        CoinMarketCapConfig {
            base_url: default_cmc_base_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub coinmarketcap: CoinMarketCapConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    /// Loads the config at `path` when given. Otherwise the default location
    /// is used if a file exists there, and built-in defaults if not.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            debug!(path = %config_path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxcli", "fxcli")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// The configured API key, falling back to the `CMC_PRO_API_KEY`
    /// environment variable.
    pub fn api_key(&self) -> Result<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        Self::resolve_api_key(self.providers.coinmarketcap.api_key.as_deref(), from_env)
    }

    fn resolve_api_key(configured: Option<&str>, from_env: Option<String>) -> Result<String> {
        configured
            .filter(|key| !key.trim().is_empty())
            .map(str::to_string)
            .or_else(|| from_env.filter(|key| !key.trim().is_empty()))
            .with_context(|| {
                format!(
                    "Missing CoinMarketCap API key: set providers.coinmarketcap.api_key in the config file or {API_KEY_ENV}"
                )
            })
    }
}
