//! GitHub Actions workflow commands
//!
//! Outputs, environment variables and path entries go to the files the runner
//! names in `GITHUB_OUTPUT`, `GITHUB_ENV` and `GITHUB_PATH`. Without those
//! (older runners, local runs) outputs and path entries fall back to the
//! equivalent `::command::` lines. Variables and path entries are also applied
//! to this process's own environment.

use std::ffi::{OsStr, OsString};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::Reporter;

/// Runner-provided command files
#[derive(Debug, Clone, Default)]
pub struct CommandFiles {
    pub output: Option<PathBuf>,
    pub env: Option<PathBuf>,
    pub path: Option<PathBuf>,
}

impl CommandFiles {
    pub fn from_env() -> Self {
        Self {
            output: env_path("GITHUB_OUTPUT"),
            env: env_path("GITHUB_ENV"),
            path: env_path("GITHUB_PATH"),
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

pub struct WorkflowCommands<W: Write = io::Stdout> {
    out: W,
    files: CommandFiles,
    failed: bool,
}

impl WorkflowCommands<io::Stdout> {
    pub fn from_env() -> Self {
        Self::new(io::stdout(), CommandFiles::from_env())
    }
}

impl<W: Write> WorkflowCommands<W> {
    pub fn new(out: W, files: CommandFiles) -> Self {
        Self {
            out,
            files,
            failed: false,
        }
    }

    /// Whether `set_failed` was called; the process should exit non-zero
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn command(&mut self, name: &str, properties: &[(&str, &str)], message: &str) {
        let mut line = format!("::{name}");
        if !properties.is_empty() {
            let props: Vec<String> = properties
                .iter()
                .map(|(k, v)| format!("{k}={}", escape_property(v)))
                .collect();
            line.push(' ');
            line.push_str(&props.join(","));
        }
        line.push_str("::");
        line.push_str(&escape_data(message));
        // Best effort: stdout going away is not worth failing the run over
        let _ = writeln!(self.out, "{line}");
    }
}

impl<W: Write> Reporter for WorkflowCommands<W> {
    fn debug(&mut self, message: &str) {
        log::debug!("{message}");
        self.command("debug", &[], message);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
        let _ = writeln!(self.out, "{message}");
    }

    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()> {
        match self.files.output.clone() {
            Some(file) => append_line(&file, &key_value_message(name, value)?),
            None => {
                writeln!(self.out)?;
                self.command("set-output", &[("name", name)], value);
                Ok(())
            }
        }
    }

    fn export_variable(&mut self, name: &str, value: &str) -> io::Result<()> {
        set_process_var(name, value);
        match self.files.env.clone() {
            Some(file) => append_line(&file, &key_value_message(name, value)?),
            None => Ok(()),
        }
    }

    fn add_path(&mut self, dir: &Path) -> io::Result<()> {
        let search_path = prepend_path(dir, std::env::var_os("PATH"))?;
        set_process_var("PATH", &search_path);

        let dir = dir.to_string_lossy();
        match self.files.path.clone() {
            Some(file) => append_line(&file, &dir),
            None => {
                self.command("add-path", &[], &dir);
                Ok(())
            }
        }
    }

    fn set_failed(&mut self, message: &str) {
        self.failed = true;
        self.command("error", &[], message);
    }
}

fn set_process_var(name: &str, value: impl AsRef<OsStr>) {
    // SAFETY: the binary runs on a current-thread runtime and reports only
    // after every download and extraction has been awaited.
    unsafe { std::env::set_var(name, value) }
}

/// `dir` followed by the entries of `current`
fn prepend_path(dir: &Path, current: Option<OsString>) -> io::Result<OsString> {
    let rest = current
        .as_deref()
        .map(|p| std::env::split_paths(p).collect::<Vec<_>>())
        .unwrap_or_default();
    std::env::join_paths(std::iter::once(dir.to_path_buf()).chain(rest))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

/// `name<<delimiter` block understood by the runner's file commands
fn key_value_message(name: &str, value: &str) -> io::Result<String> {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    if name.contains(&delimiter) || value.contains(&delimiter) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("value for {name} contains the command delimiter"),
        ));
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}"))
}

fn append_line(file: &Path, message: &str) -> io::Result<()> {
    let mut f = OpenOptions::new().append(true).create(true).open(file)?;
    writeln!(f, "{message}")
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}
