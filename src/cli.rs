use clap::Parser;
use std::path::PathBuf;

use crate::action::Inputs;

/// Inputs mirror the action's `with:` keys; the runner passes them as
/// `INPUT_<NAME>` environment variables.
#[derive(Parser, Debug)]
#[command(
    name = "kiota-setup",
    about = "Install the Kiota CLI and add it to the workflow PATH",
    disable_version_flag = true
)]
pub struct Args {
    /// Kiota version to install: `latest` or a release tag such as `v1.6.1`
    #[arg(long, env = "INPUT_VERSION")]
    pub version: Option<String>,

    /// Consider prereleases when resolving `latest` ("true" or "false")
    #[arg(long = "include-prerelease", env = "INPUT_INCLUDEPRERELEASE")]
    pub include_prerelease: Option<String>,

    /// Optional TOML file overriding endpoints, cache root and timeouts
    #[arg(long, short = 'c', env = "KIOTA_SETUP_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn inputs(&self) -> Inputs {
        Inputs {
            version: self.version.clone(),
            include_prerelease: self.include_prerelease.clone(),
        }
    }
}
