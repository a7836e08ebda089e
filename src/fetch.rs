//! Archive fetcher
//!
//! Reads a source's `versions.txt` (one archive URL per line) and makes sure
//! every listed archive is present in the source's `zips/` directory,
//! skipping the ones already downloaded.

use crate::config::{FetchConfig, SourceConfig};
use crate::error::{Error, Result};
use crate::types::Event;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Derive the local filename for a source URL (the last path segment)
fn archive_filename(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|e| Error::InvalidSourceUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .ok_or_else(|| Error::InvalidSourceUrl {
            url: url.to_string(),
            reason: "URL has no filename path segment".to_string(),
        })
}

/// Download every archive listed in the source's versions.txt
///
/// Archives whose target file already exists are skipped (controlled by
/// `skip_existing`). Bodies are streamed to a `.part` file and renamed into
/// place on completion, so a partially downloaded archive never satisfies
/// the skip-existing check on the next run.
///
/// Returns the paths of all archives present after the run, downloaded or
/// pre-existing.
pub async fn fetch_archives(
    source: &SourceConfig,
    fetch: &FetchConfig,
    events: &broadcast::Sender<Event>,
) -> Result<Vec<PathBuf>> {
    let zips_dir = source.zips_dir();
    tokio::fs::create_dir_all(&zips_dir).await?;

    let listing = tokio::fs::read_to_string(source.versions_file()).await?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(fetch.timeout_secs))
        .build()?;

    let mut archives = Vec::new();

    for line in listing.lines() {
        let url = line.trim();
        if url.is_empty() {
            continue;
        }

        let filename = archive_filename(url)?;
        let target = zips_dir.join(&filename);

        if fetch.skip_existing && target.exists() {
            debug!(source = %source.name, %filename, "archive already present, skipping");
            let _ = events.send(Event::ArchiveSkipped {
                source: source.name.clone(),
                filename,
            });
            archives.push(target);
            continue;
        }

        info!(source = %source.name, %filename, "downloading archive");

        let response = client.get(url).send().await?.error_for_status()?;

        let part_path = zips_dir.join(format!("{filename}.part"));
        let mut file = tokio::fs::File::create(&part_path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&part_path, &target).await?;

        let _ = events.send(Event::ArchiveDownloaded {
            source: source.name.clone(),
            filename,
        });
        archives.push(target);
    }

    Ok(archives)
}
