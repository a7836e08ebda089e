//! Stream deduplication
//!
//! Every extracted audio stream is identified by the SHA-256 of its full
//! byte content. A stream whose hash was already emitted in any prior
//! version is deleted instead of being processed again. Hash collisions are
//! treated as semantic duplicates; no secondary byte comparison is done.

use crate::error::Result;
use crate::types::Event;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::broadcast;
use tracing::debug;

/// Insertion-ordered set of hex-encoded SHA-256 digests
///
/// Keeps both a vector (the order hashes were first seen, which is the order
/// they are persisted in) and a set index for O(1) membership tests.
#[derive(Debug, Default, Clone)]
pub struct HashRegistry {
    order: Vec<String>,
    index: HashSet<String>,
}

impl HashRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from persisted lines, preserving their order
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for line in lines {
            registry.insert(line.into());
        }
        registry
    }

    /// Whether a digest is already recorded
    pub fn contains(&self, digest: &str) -> bool {
        self.index.contains(digest)
    }

    /// Record a digest; returns false if it was already present
    pub fn insert(&mut self, digest: String) -> bool {
        if self.index.contains(&digest) {
            return false;
        }
        self.index.insert(digest.clone());
        self.order.push(digest);
        true
    }

    /// Digests in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of recorded digests
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Whether a file is a raw extracted audio stream (`.wav` or `.wem`)
pub fn is_stream_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("wav") | Some("wem")
    )
}

/// Hex-encoded SHA-256 over a file's full content
pub fn content_digest(path: &Path) -> Result<String> {
    let content = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Deduplicate freshly extracted streams against the registry
///
/// Streams whose digest is already recorded are deleted; new digests are
/// recorded in the registry (the file is kept for transcoding). Returns the
/// number of duplicates removed.
pub async fn dedup_streams(
    dir: &Path,
    registry: &mut HashRegistry,
    events: &broadcast::Sender<Event>,
) -> Result<usize> {
    let mut removed = 0;

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| !p.is_dir() && is_stream_file(p))
        .collect();
    entries.sort();

    for path in entries {
        let digest = content_digest(&path)?;
        if registry.contains(&digest) {
            debug!(?path, %digest, "duplicate stream, discarding");
            tokio::fs::remove_file(&path).await?;
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                let _ = events.send(Event::StreamDeduplicated {
                    file: name.to_string(),
                });
            }
            removed += 1;
        } else {
            registry.insert(digest);
        }
    }

    Ok(removed)
}
