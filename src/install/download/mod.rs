//! GitHub release download and archive extraction
//!
//! ## Module Organization
//!
//! - `platform` - Host platform tag used in asset names and cache paths
//! - `github` - Release listing and `latest` resolution
//! - `core` - Archive download with bounded redirect following
//! - `extract` - Zip extraction into the cache directory

mod core;
mod extract;
mod github;
mod platform;

pub use self::core::Downloader;
pub use extract::extract_archive;
pub use github::{Release, ReleaseClient, select_latest};
pub use platform::{OsFamily, Platform};
