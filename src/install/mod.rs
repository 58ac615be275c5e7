//! Kiota binary cache and installer
//!
//! Ensures the release archive for a version is downloaded and unpacked into
//! the local cache exactly once. A cache directory that exists is trusted as a
//! complete install; any failure while creating one removes it again so a later
//! run never sees a partial install.

pub mod cache;
pub mod download;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::config::SetupConfig;
use crate::error::SetupError;
use cache::CachePaths;
use download::{Downloader, Platform, extract_archive};

pub struct Installer {
    platform: Platform,
    paths: CachePaths,
    downloader: Downloader,
    download_base_url: String,
}

impl Installer {
    pub fn new(config: &SetupConfig, platform: Platform) -> Result<Self, SetupError> {
        let downloader = Downloader::new(config)
            .map_err(|e| SetupError::Config(format!("{e:#}")))?;

        Ok(Self {
            platform,
            paths: CachePaths::new(config.cache_root()),
            downloader,
            download_base_url: config.download_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Cache directory holding `version`
    pub fn install_dir(&self, version: &str) -> PathBuf {
        self.paths.resolve(version, &self.platform, false)
    }

    /// Path of the `kiota` executable for `version`
    pub fn binary_path(&self, version: &str) -> PathBuf {
        self.paths.resolve(version, &self.platform, true)
    }

    pub fn download_url(&self, version: &str) -> String {
        format!("{}/{}/{}.zip", self.download_base_url, version, self.platform)
    }

    /// Make sure `version` is installed and return the executable path.
    ///
    /// Does nothing when the cache directory already exists.
    pub async fn ensure_present(&self, version: &str) -> Result<PathBuf, SetupError> {
        let install_dir = self.install_dir(version);
        let binary_path = self.binary_path(version);

        if install_dir.exists() {
            debug!("Using cached install at {}", install_dir.display());
            return Ok(binary_path);
        }

        let archive_path = self.paths.archive_path(version, &self.platform);
        let result = self
            .install(version, &install_dir, &archive_path, &binary_path)
            .await;
        remove_archive(&archive_path);

        match result {
            Ok(()) => {
                info!("Installed kiota {version} at {}", binary_path.display());
                Ok(binary_path)
            }
            Err(e) => {
                error!("Installing kiota {version} failed: {e:#}");
                if let Err(cleanup) = std::fs::remove_dir_all(&install_dir) {
                    warn!(
                        "Failed to remove partial install {}: {cleanup}",
                        install_dir.display()
                    );
                }
                Err(SetupError::install(e))
            }
        }
    }

    async fn install(
        &self,
        version: &str,
        install_dir: &Path,
        archive_path: &Path,
        binary_path: &Path,
    ) -> Result<()> {
        tokio::fs::create_dir_all(install_dir)
            .await
            .with_context(|| format!("Failed to create {}", install_dir.display()))?;

        let url = self.download_url(version);
        info!("Downloading {url}");
        self.downloader.download_to_file(&url, archive_path).await?;

        extract_archive(archive_path, install_dir).await?;

        if self.platform.os.needs_exec_bit() {
            make_executable(binary_path)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to make {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn remove_archive(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove archive {}: {e}", path.display()),
    }
}
