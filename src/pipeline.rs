//! Pipeline orchestration
//!
//! Sequences the whole run: fetch archives, unpack music entries, compute
//! pending versions, then for each pending version patch, scan, deduplicate,
//! transcode and repair, move the results out, and checkpoint.
//!
//! Execution is single-threaded and fully sequential: one version is
//! processed start-to-finish before the next begins, and every external
//! tool call is awaited to completion. The only shared mutable resources
//! are the working directory and the checkpoint files, which have no
//! concurrent writer.

use crate::checkpoint::CheckpointStore;
use crate::config::{Config, SourceConfig};
use crate::dedup::{HashRegistry, dedup_streams};
use crate::error::{Error, ProcessError, Result};
use crate::fetch::fetch_archives;
use crate::patch::apply_pending_patches;
use crate::tools::Toolchain;
use crate::transcode::{convert_streams, repair_streams};
use crate::types::{Event, VersionToken};
use crate::unpack::extract_music;
use crate::version::pending_versions;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Event channel capacity; slow subscribers miss events rather than
/// blocking the pipeline
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Counters for one full pipeline run
#[must_use]
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    /// Number of sources processed
    pub sources: usize,
    /// Versions processed (and checkpointed) across all sources
    pub versions_processed: usize,
    /// Streams converted across all sources
    pub streams_converted: usize,
    /// Streams that failed conversion and were skipped
    pub streams_failed: usize,
    /// Duplicate streams discarded before conversion
    pub duplicates_discarded: usize,
}

/// The incremental music extraction pipeline
///
/// Create with [`MusicPipeline::new`], subscribe to [`Event`]s if desired,
/// then call [`run`](MusicPipeline::run). Repeated runs are idempotent:
/// already-downloaded archives, already-extracted entries and
/// already-processed versions are skipped.
pub struct MusicPipeline {
    config: Arc<Config>,
    toolchain: Toolchain,
    event_tx: broadcast::Sender<Event>,
}

impl MusicPipeline {
    /// Create a pipeline, resolving the external toolchain from the config
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let toolchain = Toolchain::from_config(&config.tools)?;
        Ok(Self::assemble(config, toolchain))
    }

    /// Create a pipeline with a pre-built toolchain
    ///
    /// Used by tests to substitute fake tool implementations, and by
    /// embedders that resolve binaries themselves.
    pub fn with_toolchain(config: Config, toolchain: Toolchain) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, toolchain))
    }

    fn assemble(config: Config, toolchain: Toolchain) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            toolchain,
            event_tx,
        }
    }

    /// Subscribe to pipeline events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run the full pipeline over every configured source
    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for source in &self.config.sources {
            info!(source = %source.name, "processing source");
            self.run_source(source, &mut summary).await?;
            summary.sources += 1;
        }

        Ok(summary)
    }

    async fn run_source(&self, source: &SourceConfig, summary: &mut RunSummary) -> Result<()> {
        fetch_archives(source, &self.config.fetch, &self.event_tx).await?;
        extract_music(source, &self.event_tx)?;

        let store = CheckpointStore::new(source.current_dir())?;
        let processed = store.load_processed()?;
        // Loaded once per run; persisted once per version after it completes
        let mut registry = store.load_hashes()?;

        let discovered = discover_versions(source)?;
        let pending = pending_versions(&discovered, &processed);

        if pending.is_empty() {
            info!(source = %source.name, "no pending versions");
            return Ok(());
        }

        for version in pending {
            self.process_version(source, &version, &store, &mut registry, summary)
                .await?;
            summary.versions_processed += 1;
        }

        Ok(())
    }

    /// Process a single version start-to-finish
    ///
    /// The checkpoint is only touched at the very end, after every stage
    /// succeeded; a failure anywhere leaves the version unrecorded so it is
    /// retried from scratch on the next run.
    async fn process_version(
        &self,
        source: &SourceConfig,
        version: &VersionToken,
        store: &CheckpointStore,
        registry: &mut HashRegistry,
        summary: &mut RunSummary,
    ) -> Result<()> {
        info!(source = %source.name, %version, "processing version");
        let _ = self.event_tx.send(Event::VersionStarted {
            source: source.name.clone(),
            version: version.clone(),
        });

        let current_dir = source.current_dir();

        // Stage the version's files into the working directory. Containers
        // from earlier versions stay put: hdiff patches apply against them.
        copy_version_files(&source.extracted_dir().join(version.as_str()), &current_dir).await?;

        apply_pending_patches(&current_dir, self.toolchain.patcher.as_ref(), &self.event_tx)
            .await?;

        let output_dir = current_dir.join("output");
        tokio::fs::create_dir_all(&output_dir).await?;

        let outcome = self
            .toolchain
            .scanner
            .scan(&current_dir, &output_dir)
            .await?;
        if !outcome.success {
            // The scan tool exits nonzero on benign warnings, so this is not
            // fatal, but a systemic extraction failure would otherwise pass
            // silently. Surface it.
            warn!(
                source = %source.name,
                %version,
                exit_code = ?outcome.exit_code,
                stderr = %outcome.stderr.trim(),
                "container scan exited nonzero; continuing with whatever was extracted"
            );
        }
        let _ = self.event_tx.send(Event::ScanCompleted {
            success: outcome.success,
            exit_code: outcome.exit_code,
        });

        summary.duplicates_discarded +=
            dedup_streams(&output_dir, registry, &self.event_tx).await?;

        let (converted, failed) =
            convert_streams(&output_dir, self.toolchain.transcoder.as_ref(), &self.event_tx)
                .await?;
        summary.streams_converted += converted;
        summary.streams_failed += failed;

        repair_streams(&output_dir, self.toolchain.repairer.as_ref()).await?;

        let version_output = source.processed_dir().join(version.as_str());
        move_directory_files(&output_dir, &version_output).await?;

        store.append_processed(version)?;
        store.save_hashes(registry)?;

        info!(source = %source.name, %version, "version completed");
        let _ = self.event_tx.send(Event::VersionCompleted {
            source: source.name.clone(),
            version: version.clone(),
            output_dir: version_output,
        });

        Ok(())
    }
}

/// Discover version directories under `extracted/`
///
/// Every directory except the working directory `current` is a version,
/// keyed by its name.
fn discover_versions(source: &SourceConfig) -> Result<Vec<VersionToken>> {
    let mut versions = Vec::new();
    for entry in std::fs::read_dir(source.extracted_dir())? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name != "current" {
            versions.push(VersionToken::from(name));
        }
    }
    Ok(versions)
}

/// Copy every regular file from a version directory into the working
/// directory, overwriting files of the same name
async fn copy_version_files(version_dir: &Path, current_dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(current_dir).await?;
    let mut entries = tokio::fs::read_dir(version_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let target = current_dir.join(entry.file_name());
        tokio::fs::copy(&path, &target).await?;
    }
    Ok(())
}

/// Move every regular file from one directory into another
async fn move_directory_files(from: &Path, to: &Path) -> Result<()> {
    tokio::fs::create_dir_all(to).await?;
    let mut entries = tokio::fs::read_dir(from).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let target = to.join(entry.file_name());
        tokio::fs::rename(&path, &target).await.map_err(|e| {
            Error::Process(ProcessError::MoveFailed {
                source_path: path.clone(),
                dest_path: target.clone(),
                reason: e.to_string(),
            })
        })?;
    }
    Ok(())
}
