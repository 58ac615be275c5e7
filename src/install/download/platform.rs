//! Platform detection for release asset selection

use std::fmt;

/// OS family token used in Kiota release asset names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Win,   // windows
    Osx,   // macOS
    Linux, // linux and any other unix-like host
}

impl OsFamily {
    /// Map a `std::env::consts::OS` value to its family
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => OsFamily::Win,
            "macos" => OsFamily::Osx,
            _ => OsFamily::Linux,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Win => "win",
            OsFamily::Osx => "osx",
            OsFamily::Linux => "linux",
        }
    }

    /// Whether the extracted binary needs its executable bits set
    pub fn needs_exec_bit(&self) -> bool {
        matches!(self, OsFamily::Osx | OsFamily::Linux)
    }
}

/// Host platform tag, rendered as `<os>-<arch>` (e.g. `linux-x64`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: OsFamily,
    pub arch: String,
}

impl Platform {
    pub fn new(os: OsFamily, arch: impl Into<String>) -> Self {
        Self {
            os,
            arch: arch.into(),
        }
    }

    /// Detect the current host platform
    pub fn detect() -> Self {
        Self::from_consts(std::env::consts::OS, std::env::consts::ARCH)
    }

    fn from_consts(os: &str, arch: &str) -> Self {
        Self::new(OsFamily::from_os(os), arch_token(arch))
    }

    /// Name of the executable inside the release archive
    pub fn binary_name(&self) -> &'static str {
        match self.os {
            OsFamily::Win => "kiota.exe",
            _ => "kiota",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch)
    }
}

/// Release assets use `x64`/`arm64` rather than Rust's target names
fn arch_token(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => other,
    }
}
