//! On-disk layout of the binary cache
//!
//! `<root>/kiotabin/<version>/<platform>/kiota[.exe]`

use std::path::PathBuf;

use super::download::Platform;

/// Directory under the cache root holding every installed version
pub const BINARIES_ROOT_DIRECTORY: &str = "kiotabin";

#[derive(Debug, Clone)]
pub struct CachePaths {
    root: PathBuf,
}

impl CachePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache directory for `(version, platform)`, or the binary inside it
    pub fn resolve(&self, version: &str, platform: &Platform, include_file_name: bool) -> PathBuf {
        let dir = self
            .root
            .join(BINARIES_ROOT_DIRECTORY)
            .join(version)
            .join(platform.to_string());
        if include_file_name {
            dir.join(platform.binary_name())
        } else {
            dir
        }
    }

    /// Archive file downloaded next to the cache directory
    pub fn archive_path(&self, version: &str, platform: &Platform) -> PathBuf {
        let mut path = self.resolve(version, platform, false).into_os_string();
        path.push(".zip");
        PathBuf::from(path)
    }
}
