//! Kiota setup library
//!
//! Resolves a Kiota version, installs the matching release binary into a
//! per-version cache under the temp directory, and reports its location to
//! a GitHub Actions workflow.

pub mod action;
pub mod cli;
pub mod config;
pub mod error;
pub mod install;

pub use action::{InstallResult, Inputs, Reporter};
pub use config::SetupConfig;
pub use error::SetupError;
pub use install::Installer;
