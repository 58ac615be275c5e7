//! Entrypoint flow: read inputs, resolve the version, install, report.

pub mod workflow;

use log::{debug, error, info};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::SetupConfig;
use crate::error::SetupError;
use crate::install::Installer;
use crate::install::download::{Platform, ReleaseClient};

pub use workflow::WorkflowCommands;

pub const LATEST: &str = "latest";
pub const VERSION_REQUIRED: &str = "Version input is required";
pub const PRERELEASE_ONLY_WITH_LATEST: &str =
    "The includePreRelease option can only be used with the latest version";
pub const TUTORIAL_ENV_VAR: &str = "KIOTA_TUTORIAL_ENABLED";

/// Raw action inputs, as given by the workflow
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub version: Option<String>,
    pub include_prerelease: Option<String>,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub version: String,
    /// Executable path, including the file name
    pub path: PathBuf,
}

/// Where a run reports progress, outputs and failure.
pub trait Reporter {
    fn debug(&mut self, message: &str);
    fn info(&mut self, message: &str);
    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()>;
    fn export_variable(&mut self, name: &str, value: &str) -> io::Result<()>;
    /// Put `dir` in front of the search path of later steps
    fn add_path(&mut self, dir: &Path) -> io::Result<()>;
    fn set_failed(&mut self, message: &str);
}

/// Lowercase and trim; prefix `v` unless present or the selector is `latest`.
pub fn normalize_version(raw: &str) -> String {
    let version = raw.trim().to_lowercase();
    if version.starts_with('v') || version == LATEST {
        version
    } else {
        format!("v{version}")
    }
}

/// Boolean-like input; only a case-insensitive `true` enables it
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

/// The `version` input, or the missing-input error when absent or blank
pub fn required_version(inputs: &Inputs) -> Result<&str, SetupError> {
    inputs
        .version
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| SetupError::input(VERSION_REQUIRED))
}

pub async fn run(
    inputs: &Inputs,
    installer: &Installer,
    releases: &ReleaseClient,
    reporter: &mut dyn Reporter,
) -> Result<InstallResult, SetupError> {
    let raw_version = required_version(inputs)?;
    let include_prerelease = parse_flag(inputs.include_prerelease.as_deref());

    let mut version = normalize_version(raw_version);
    if version == LATEST {
        version = releases.latest_version(include_prerelease).await?;
        reporter.debug(&format!("Latest version is {version}"));
    } else if include_prerelease {
        return Err(SetupError::input(PRERELEASE_ONLY_WITH_LATEST));
    }

    reporter.debug(&format!("Installing version {version} ..."));
    let path = installer.ensure_present(&version).await?;

    reporter.set_output("version", &version)?;
    reporter.set_output("path", &path.to_string_lossy())?;
    reporter.export_variable(TUTORIAL_ENV_VAR, "false")?;
    reporter.add_path(&installer.install_dir(&version))?;
    reporter.info(&format!("kiota {version} is available at {}", path.display()));

    Ok(InstallResult { version, path })
}

/// Process entrypoint: check inputs, load configuration, build the clients
/// and run, reporting any failure once.
pub async fn launch(
    inputs: &Inputs,
    config_path: Option<&Path>,
    platform: Platform,
    reporter: &mut dyn Reporter,
) -> Option<InstallResult> {
    match prepare_and_run(inputs, config_path, platform, reporter).await {
        Ok(result) => Some(result),
        Err(e) => {
            fail(reporter, &e);
            None
        }
    }
}

async fn prepare_and_run(
    inputs: &Inputs,
    config_path: Option<&Path>,
    platform: Platform,
    reporter: &mut dyn Reporter,
) -> Result<InstallResult, SetupError> {
    // Nothing, not even configuration, is looked at before the version input
    required_version(inputs)?;

    let config = SetupConfig::load(config_path)?;
    info!(
        "Platform {platform}, cache root {}",
        config.cache_root().display()
    );
    let installer = Installer::new(&config, platform)?;
    let releases = ReleaseClient::new(&config)?;
    run(inputs, &installer, &releases, reporter).await
}

/// Run the flow and turn any error into a single failure report.
pub async fn execute(
    inputs: &Inputs,
    installer: &Installer,
    releases: &ReleaseClient,
    reporter: &mut dyn Reporter,
) -> Option<InstallResult> {
    match run(inputs, installer, releases, reporter).await {
        Ok(result) => Some(result),
        Err(e) => {
            fail(reporter, &e);
            None
        }
    }
}

pub fn fail(reporter: &mut dyn Reporter, err: &SetupError) {
    error!("{err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        debug!("caused by: {cause}");
        source = cause.source();
    }
    reporter.set_failed(&err.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::download::OsFamily;
    use crate::install::tests::{kiota_zip, test_config};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Debug(String),
        Info(String),
        Output(String, String),
        Variable(String, String),
        Path(PathBuf),
        Failed(String),
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: Vec<Event>,
    }

    impl RecordingReporter {
        fn outputs(&self) -> Vec<(String, String)> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Output(k, v) => Some((k.clone(), v.clone())),
                    _ => None,
                })
                .collect()
        }

        fn debugs(&self) -> Vec<&str> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Debug(m) => Some(m.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Reporter for RecordingReporter {
        fn debug(&mut self, message: &str) {
            self.events.push(Event::Debug(message.to_string()));
        }
        fn info(&mut self, message: &str) {
            self.events.push(Event::Info(message.to_string()));
        }
        fn set_output(&mut self, name: &str, value: &str) -> io::Result<()> {
            self.events.push(Event::Output(name.into(), value.into()));
            Ok(())
        }
        fn export_variable(&mut self, name: &str, value: &str) -> io::Result<()> {
            self.events.push(Event::Variable(name.into(), value.into()));
            Ok(())
        }
        fn add_path(&mut self, dir: &Path) -> io::Result<()> {
            self.events.push(Event::Path(dir.to_path_buf()));
            Ok(())
        }
        fn set_failed(&mut self, message: &str) {
            self.events.push(Event::Failed(message.to_string()));
        }
    }

    fn inputs(version: Option<&str>, include_prerelease: Option<&str>) -> Inputs {
        Inputs {
            version: version.map(String::from),
            include_prerelease: include_prerelease.map(String::from),
        }
    }

    struct Harness {
        _server: MockServer,
        cache: tempfile::TempDir,
        installer: Installer,
        releases: ReleaseClient,
    }

    async fn harness(server: MockServer) -> Harness {
        let cache = tempfile::tempdir().unwrap();
        let config = test_config(&server, cache.path());
        let installer = Installer::new(&config, Platform::new(OsFamily::Linux, "x64")).unwrap();
        let releases = ReleaseClient::new(&config).unwrap();
        Harness {
            _server: server,
            cache,
            installer,
            releases,
        }
    }

    async fn mount_release_list(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/repos/microsoft/kiota/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "url": "https://api.github.com/repos/microsoft/kiota/releases/120642190",
                "tag_name": "v1.6.1",
                "name": "v1.6.1",
                "draft": false,
                "prerelease": false,
                "created_at": "2023-09-11T13:08:41Z",
                "published_at": "2023-09-11T13:22:58Z"
            }])))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_download(server: &MockServer, version: &str) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/microsoft/kiota/releases/download/{version}/linux-x64.zip"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(kiota_zip()))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn untouched_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn normalizes_versions() {
        assert_eq!(normalize_version("1.5.1"), "v1.5.1");
        assert_eq!(normalize_version("V1.5.1"), "v1.5.1");
        assert_eq!(normalize_version("v1.5.1"), "v1.5.1");
        assert_eq!(normalize_version("  1.6.0-preview.1 "), "v1.6.0-preview.1");
        assert_eq!(normalize_version("Latest"), "latest");
    }

    #[test]
    fn parses_boolean_like_flag() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("TRUE")));
        assert!(parse_flag(Some(" True ")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("yes")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[tokio::test]
    async fn latest_sets_outputs_in_order() {
        let server = MockServer::start().await;
        mount_release_list(&server).await;
        mount_download(&server, "v1.6.1").await;
        let h = harness(server).await;
        let mut reporter = RecordingReporter::default();

        let result = execute(
            &inputs(Some("latest"), Some("false")),
            &h.installer,
            &h.releases,
            &mut reporter,
        )
        .await
        .unwrap();

        let install_dir = h.cache.path().join("kiotabin/v1.6.1/linux-x64");
        assert_eq!(result.version, "v1.6.1");
        assert_eq!(result.path, install_dir.join("kiota"));
        assert_eq!(
            reporter.debugs(),
            vec!["Latest version is v1.6.1", "Installing version v1.6.1 ..."]
        );
        assert_eq!(
            reporter.events[2..6],
            [
                Event::Output("version".into(), "v1.6.1".into()),
                Event::Output("path".into(), result.path.to_string_lossy().into_owned()),
                Event::Variable("KIOTA_TUTORIAL_ENABLED".into(), "false".into()),
                Event::Path(install_dir),
            ]
        );
        assert!(!reporter.events.iter().any(|e| matches!(e, Event::Failed(_))));
    }

    #[tokio::test]
    async fn missing_version_fails_first() {
        let h = harness(untouched_server().await).await;
        let mut reporter = RecordingReporter::default();

        let result = execute(&inputs(None, Some("true")), &h.installer, &h.releases, &mut reporter).await;

        assert!(result.is_none());
        assert_eq!(reporter.events, vec![Event::Failed(VERSION_REQUIRED.into())]);
        assert!(!h.cache.path().join("kiotabin").exists());
    }

    #[tokio::test]
    async fn missing_version_wins_over_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("kiota-setup.toml");
        std::fs::write(&config_path, "max_redirects = \"many\"").unwrap();
        let mut reporter = RecordingReporter::default();

        let result = launch(
            &inputs(None, None),
            Some(&config_path),
            Platform::new(OsFamily::Linux, "x64"),
            &mut reporter,
        )
        .await;

        assert!(result.is_none());
        assert_eq!(reporter.events, vec![Event::Failed(VERSION_REQUIRED.into())]);
    }

    #[tokio::test]
    async fn bad_config_fails_once_version_is_given() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("kiota-setup.toml");
        std::fs::write(&config_path, "max_redirects = 0").unwrap();
        let mut reporter = RecordingReporter::default();

        launch(
            &inputs(Some("v1.6.1"), None),
            Some(&config_path),
            Platform::new(OsFamily::Linux, "x64"),
            &mut reporter,
        )
        .await;

        assert!(matches!(
            reporter.events.as_slice(),
            [Event::Failed(message)] if message.starts_with("Invalid configuration")
        ));
    }

    #[tokio::test]
    async fn launch_uses_configured_endpoints() {
        let server = MockServer::start().await;
        mount_release_list(&server).await;
        mount_download(&server, "v1.6.1").await;
        let cache = tempfile::tempdir().unwrap();
        let config_path = cache.path().join("kiota-setup.toml");
        std::fs::write(
            &config_path,
            format!(
                "releases_api_url = \"{uri}/repos/microsoft/kiota/releases\"\n\
                 download_base_url = \"{uri}/microsoft/kiota/releases/download\"\n\
                 cache_root = \"{root}\"\n",
                uri = server.uri(),
                root = cache.path().display().to_string().replace('\\', "/"),
            ),
        )
        .unwrap();
        let mut reporter = RecordingReporter::default();

        let result = launch(
            &inputs(Some("latest"), None),
            Some(&config_path),
            Platform::new(OsFamily::Linux, "x64"),
            &mut reporter,
        )
        .await
        .unwrap();

        assert_eq!(result.version, "v1.6.1");
        assert!(result.path.starts_with(cache.path()));
        assert!(result.path.exists());
    }

    #[tokio::test]
    async fn blank_version_counts_as_missing() {
        let h = harness(untouched_server().await).await;
        let mut reporter = RecordingReporter::default();

        execute(&inputs(Some("   "), None), &h.installer, &h.releases, &mut reporter).await;
        assert_eq!(reporter.events, vec![Event::Failed(VERSION_REQUIRED.into())]);
    }

    #[tokio::test]
    async fn prerelease_with_explicit_version_fails_without_side_effects() {
        let h = harness(untouched_server().await).await;
        let mut reporter = RecordingReporter::default();

        execute(
            &inputs(Some("v1.5.1"), Some("true")),
            &h.installer,
            &h.releases,
            &mut reporter,
        )
        .await;

        assert_eq!(
            reporter.events,
            vec![Event::Failed(PRERELEASE_ONLY_WITH_LATEST.into())]
        );
        assert!(!h.cache.path().join("kiotabin").exists());
    }

    #[tokio::test]
    async fn adds_missing_prefix() {
        let server = MockServer::start().await;
        mount_download(&server, "v1.5.1").await;
        let h = harness(server).await;
        let mut reporter = RecordingReporter::default();

        execute(&inputs(Some("1.5.1"), None), &h.installer, &h.releases, &mut reporter)
            .await
            .unwrap();

        assert_eq!(reporter.outputs()[0], ("version".into(), "v1.5.1".into()));
        assert_eq!(reporter.debugs(), vec!["Installing version v1.5.1 ..."]);
    }

    #[tokio::test]
    async fn install_failure_reports_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let h = harness(server).await;
        let mut reporter = RecordingReporter::default();

        let result = execute(&inputs(Some("v1.6.1"), None), &h.installer, &h.releases, &mut reporter).await;

        assert!(result.is_none());
        assert_eq!(
            reporter.events.last(),
            Some(&Event::Failed(crate::error::INSTALL_FAILED_MESSAGE.into()))
        );
        assert!(reporter.outputs().is_empty());
        assert!(!h.installer.install_dir("v1.6.1").exists());
    }

    #[tokio::test]
    async fn resolution_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/microsoft/kiota/releases"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let h = harness(server).await;
        let mut reporter = RecordingReporter::default();

        execute(&inputs(Some("latest"), None), &h.installer, &h.releases, &mut reporter).await;

        assert_eq!(
            reporter.events,
            vec![Event::Failed(crate::error::RESOLUTION_FAILED_MESSAGE.into())]
        );
    }
}
