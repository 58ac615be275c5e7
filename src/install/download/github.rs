//! GitHub release API interaction

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::config::SetupConfig;
use crate::error::SetupError;

/// GitHub release metadata from API
#[derive(Deserialize, Debug, Clone)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    /// `null` for drafts
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Pick the most recently published release, optionally skipping prereleases.
///
/// Unpublished entries sort as the oldest. Ties on `published_at` keep the
/// order of the listing.
pub fn select_latest(releases: &[Release], include_prerelease: bool) -> Option<&Release> {
    let mut eligible: Vec<&Release> = releases
        .iter()
        .filter(|r| include_prerelease || !r.prerelease)
        .collect();
    // `None < Some(_)`, so drafts end up last
    eligible.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    eligible.into_iter().next()
}

/// Client for the Kiota release listing
pub struct ReleaseClient {
    client: reqwest::Client,
    url: String,
}

impl ReleaseClient {
    pub fn new(config: &SetupConfig) -> Result<Self, SetupError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_str(&config.api_version)
                .map_err(|e| SetupError::Config(format!("invalid api_version: {e}")))?,
        );
        if let Some(token) = github_token() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Ignoring GitHub token with invalid header characters"),
            }
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SetupError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.releases_api_url.clone(),
        })
    }

    /// Fetch every release in the listing
    pub async fn fetch_releases(&self) -> Result<Vec<Release>> {
        debug!("Fetching release list from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to query {}", self.url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "GitHub API error for {}: HTTP {}",
                self.url,
                response.status()
            ));
        }

        let releases: Vec<Release> = response
            .json()
            .await
            .context("Failed to parse release list")?;
        debug!("Release list has {} entries", releases.len());
        Ok(releases)
    }

    /// Resolve `latest` to a concrete release tag
    pub async fn latest_version(&self, include_prerelease: bool) -> Result<String, SetupError> {
        let releases = self.fetch_releases().await.map_err(|e| {
            log::error!("Release lookup failed: {e:#}");
            SetupError::resolution(e)
        })?;

        select_latest(&releases, include_prerelease)
            .map(|r| r.tag_name.clone())
            .ok_or_else(SetupError::no_eligible_release)
    }
}

fn github_token() -> Option<String> {
    ["GITHUB_TOKEN", "GH_TOKEN"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|token| !token.trim().is_empty())
}
