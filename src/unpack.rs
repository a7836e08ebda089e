//! Archive unpacker
//!
//! Walks every downloaded archive and extracts only the music container
//! entries (`Music*.pck` and `Music*.pck.hdiff`) into per-version
//! directories under `extracted/`, skipping entries already extracted.

use crate::config::SourceConfig;
use crate::error::{Error, ProcessError, Result};
use crate::types::{Event, VersionToken};
use crate::version::version_token;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Whether a zip entry is a music container file
///
/// Filters on the entry basename: it must start with `Music` and end with
/// `.pck` (full container) or `.pck.hdiff` (binary patch against the
/// previous version's container).
pub fn is_music_entry(entry_name: &str) -> bool {
    let Some(basename) = Path::new(entry_name).file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    basename.starts_with("Music")
        && (basename.ends_with(".pck") || basename.ends_with(".pck.hdiff"))
}

/// A downloaded archive tagged with its version token
#[derive(Debug, Clone)]
struct VersionedArchive {
    path: PathBuf,
    version: VersionToken,
}

/// List the `.zip` archives in the source's zips directory, tagged and
/// sorted ascending by version token
fn versioned_archives(source: &SourceConfig) -> Result<Vec<VersionedArchive>> {
    let mut archives = Vec::new();

    for entry in std::fs::read_dir(source.zips_dir())? {
        let path = entry?.path();
        if path.is_dir() {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !filename.ends_with(".zip") {
            continue;
        }
        let version = version_token(filename)?;
        archives.push(VersionedArchive { path, version });
    }

    archives.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(archives)
}

/// Extract one archive's music entries into its version directory
///
/// Entries are flattened to their basename; output files that already exist
/// are left alone, making repeated extraction an at-least-once no-op.
/// Returns the number of files actually written.
fn extract_archive(archive_path: &Path, output_dir: &Path) -> Result<usize> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        Error::Process(ProcessError::ExtractionFailed {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to read ZIP archive: {}", e),
        })
    })?;

    std::fs::create_dir_all(output_dir)?;

    let music_indices: Vec<usize> = (0..archive.len())
        .filter(|&i| {
            archive
                .by_index(i)
                .map(|entry| !entry.is_dir() && is_music_entry(entry.name()))
                .unwrap_or(false)
        })
        .collect();

    let mut written = 0;
    for index in music_indices {
        let mut entry = archive.by_index(index).map_err(|e| {
            Error::Process(ProcessError::ExtractionFailed {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to read ZIP entry: {}", e),
            })
        })?;

        // Flattened output: the basename only, never the archive's path
        let Some(basename) = Path::new(entry.name())
            .file_name()
            .map(|n| n.to_owned())
        else {
            continue;
        };
        let output_path = output_dir.join(basename);

        if output_path.exists() {
            debug!(?output_path, "entry already extracted, skipping");
            continue;
        }

        let mut output = std::fs::File::create(&output_path)?;
        std::io::copy(&mut entry, &mut output)?;
        written += 1;
    }

    Ok(written)
}

/// Extract music entries from every downloaded archive
///
/// Archives are processed in ascending version order. Returns the sorted,
/// deduplicated list of version tokens that now have an extraction
/// directory.
pub fn extract_music(
    source: &SourceConfig,
    events: &broadcast::Sender<Event>,
) -> Result<Vec<VersionToken>> {
    let archives = versioned_archives(source)?;
    let extracted_dir = source.extracted_dir();
    std::fs::create_dir_all(&extracted_dir)?;

    let mut versions: Vec<VersionToken> = Vec::new();

    for archive in archives {
        info!(
            source = %source.name,
            version = %archive.version,
            archive = ?archive.path,
            "extracting music entries"
        );

        let output_dir = extracted_dir.join(archive.version.as_str());
        let written = extract_archive(&archive.path, &output_dir)?;

        let _ = events.send(Event::VersionExtracted {
            source: source.name.clone(),
            version: archive.version.clone(),
            files: written,
        });

        if !versions.contains(&archive.version) {
            versions.push(archive.version);
        }
    }

    Ok(versions)
}
