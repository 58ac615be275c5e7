//! Archive download with manual redirect following

use anyhow::{Context, Result, anyhow, bail};
use futures::StreamExt;
use log::{debug, info};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use url::Url;

use crate::config::SetupConfig;

/// Streams release archives to disk.
///
/// The underlying client never follows redirects itself: GitHub answers asset
/// URLs with a 302 to a storage host, and each hop is followed here up to
/// `max_redirects` times.
pub struct Downloader {
    client: reqwest::Client,
    max_redirects: usize,
    inactivity_timeout: Duration,
}

impl Downloader {
    pub fn new(config: &SetupConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to build download client")?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects,
            inactivity_timeout: config.inactivity_timeout(),
        })
    }

    /// Download `url` into `destination`, returning the number of bytes written
    pub async fn download_to_file(&self, url: &str, destination: &Path) -> Result<u64> {
        let mut current = Url::parse(url).with_context(|| format!("Invalid download URL {url}"))?;
        let mut hops = 0usize;

        let response = loop {
            debug!("GET {current}");
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .with_context(|| format!("Request to {current} failed"))?;

            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            match location {
                Some(location) if status.is_redirection() => {
                    if hops == self.max_redirects {
                        bail!(
                            "Too many redirects ({}) while downloading {url}",
                            self.max_redirects
                        );
                    }
                    hops += 1;
                    current = current
                        .join(&location)
                        .with_context(|| format!("Invalid redirect location {location}"))?;
                    debug!("Following redirect {hops} to {current}");
                }
                _ if status.is_success() => break response,
                _ => return Err(anyhow!("Download of {current} failed: HTTP {status}")),
            }
        };

        let mut file = tokio::fs::File::create(destination)
            .await
            .with_context(|| format!("Failed to create {}", destination.display()))?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        loop {
            let chunk = match timeout(self.inactivity_timeout, stream.next()).await {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => return Err(e).context("Download stream failed"),
                Ok(None) => break,
                Err(_) => {
                    return Err(anyhow!(
                        "Download timeout: no data received for {} seconds from {current} \
                         after {downloaded} bytes",
                        self.inactivity_timeout.as_secs()
                    ));
                }
            };

            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }

        file.flush().await?;
        info!("Downloaded {downloaded} bytes to {}", destination.display());
        Ok(downloaded)
    }
}
