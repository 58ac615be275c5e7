use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::SetupError;

pub const DEFAULT_RELEASES_API_URL: &str = "https://api.github.com/repos/microsoft/kiota/releases";
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://github.com/microsoft/kiota/releases/download";
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

/// Run configuration (defaults target the public Kiota releases).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub releases_api_url: String,
    pub download_base_url: String,
    /// Root of the binary cache; the system temp dir when unset
    pub cache_root: Option<PathBuf>,
    pub user_agent: String,
    /// Sent as `X-GitHub-Api-Version`
    pub api_version: String,
    pub max_redirects: usize,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout for the release listing
    pub request_timeout_secs: u64,
    /// Abort a download when no bytes arrive for this long
    pub inactivity_timeout_secs: u64,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            releases_api_url: DEFAULT_RELEASES_API_URL.to_string(),
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
            cache_root: None,
            user_agent: concat!("kiota-setup/", env!("CARGO_PKG_VERSION")).to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_redirects: 10,
            connect_timeout_secs: 30,
            request_timeout_secs: 30,
            inactivity_timeout_secs: 300,
        }
    }
}

impl SetupConfig {
    /// Load from a TOML file when one is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, SetupError> {
        let cfg = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|e| {
                    SetupError::Config(format!("failed to read {}: {e}", path.display()))
                })?;
                toml::from_str(&raw).map_err(|e| {
                    SetupError::Config(format!("failed to parse {}: {e}", path.display()))
                })?
            }
            None => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.max_redirects == 0 {
            return Err(SetupError::Config("max_redirects must be at least 1".into()));
        }
        for (name, value) in [
            ("releases_api_url", &self.releases_api_url),
            ("download_base_url", &self.download_base_url),
        ] {
            Url::parse(value)
                .map_err(|e| SetupError::Config(format!("{name} is not a valid URL: {e}")))?;
        }
        Ok(())
    }

    pub fn cache_root(&self) -> PathBuf {
        self.cache_root.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }
}
