//! Error taxonomy for a setup run
//!
//! Every failure raised inside the orchestrated flow ends up as one of these
//! variants and is reported exactly once by `action::fail`.

use thiserror::Error;

/// Message shown to the workflow when installation fails. The underlying
/// cause is only written to the log.
pub const INSTALL_FAILED_MESSAGE: &str =
    "Kiota download failed. Check the extension host logs for more information.";

/// Message shown when the release listing cannot produce a version.
pub const RESOLUTION_FAILED_MESSAGE: &str = "Could not get the latest kiota version";

#[derive(Error, Debug)]
pub enum SetupError {
    /// Missing input or conflicting options
    #[error("{0}")]
    Input(String),

    /// Release listing query failed or had no eligible entry
    #[error("{message}")]
    Resolution {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Directory creation, download or extraction failed
    #[error("{message}")]
    Install {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration file could not be read or is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Writing an output, variable or path entry for the workflow failed
    #[error("Failed to report to the workflow: {0}")]
    Report(#[from] std::io::Error),
}

impl SetupError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Resolution failure carrying the cause for the log
    pub fn resolution(source: anyhow::Error) -> Self {
        Self::Resolution {
            message: RESOLUTION_FAILED_MESSAGE.to_string(),
            source: Some(source),
        }
    }

    /// Resolution failure because the filtered release list was empty
    pub fn no_eligible_release() -> Self {
        Self::Resolution {
            message: RESOLUTION_FAILED_MESSAGE.to_string(),
            source: None,
        }
    }

    /// Install failure with the generic caller-facing message
    pub fn install(source: anyhow::Error) -> Self {
        Self::Install {
            message: INSTALL_FAILED_MESSAGE.to_string(),
            source,
        }
    }
}
