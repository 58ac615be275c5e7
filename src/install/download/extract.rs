//! Release archive extraction

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::Path;
use zip::ZipArchive;

/// Extract every entry of the zip at `archive_path` into `destination`,
/// overwriting existing files. Returns the number of files written.
pub async fn extract_archive(archive_path: &Path, destination: &Path) -> Result<usize> {
    // CPU-bound, keep it off the async workers
    let archive_path = archive_path.to_path_buf();
    let destination = destination.to_path_buf();

    tokio::task::spawn_blocking(move || extract_archive_blocking(&archive_path, &destination))
        .await
        .context("Extraction task panicked")?
}

fn extract_archive_blocking(archive_path: &Path, destination: &Path) -> Result<usize> {
    let zip_file = fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;
    let mut archive = ZipArchive::new(zip_file).context("Failed to read ZIP archive")?;

    let mut written = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read ZIP entry at index {i}"))?;

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = fs::File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out_file)
            .with_context(|| format!("Failed to extract {}", entry.name()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))?;
        }

        written += 1;
    }

    debug!(
        "Extracted {written} files from {} into {}",
        archive_path.display(),
        destination.display()
    );
    Ok(written)
}
