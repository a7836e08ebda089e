//! Error types for wwise-rip
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Fetch, Process, Config, etc.)
//! - Structured context (which file, which version, which tool)
//! - A clear split between per-file soft failures and per-run hard failures

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wwise-rip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wwise-rip
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "tools.hpatchz_path")
        key: Option<String>,
    },

    /// Per-version processing error (patch, scan, transcode, repair, move)
    #[error("processing error: {0}")]
    Process(#[from] ProcessError),

    /// Archive filename did not match any known version-token rule
    #[error("cannot derive version token from archive name: {0}")]
    InvalidArchiveName(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error while downloading an archive
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid source location in versions.txt
    #[error("invalid source URL '{url}': {reason}")]
    InvalidSourceUrl {
        /// The offending line from versions.txt
        url: String,
        /// Why it could not be used
        reason: String,
    },

    /// Serialization error (config file)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Checkpoint file could not be read or written
    #[error("checkpoint error at {path}: {reason}")]
    Checkpoint {
        /// The checkpoint file involved
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// External tool execution failed (hpatchz, quickbms, ww2ogg, revorb)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Required external binary could not be found
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Per-version pipeline errors (patch, container scan, transcode, repair)
///
/// Any of these aborts processing of the current version; the checkpoint is
/// left unmodified so the version is retried from scratch on the next run.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// hdiff patch application failed for a base/patch pair
    #[error("patch failed for {base}: {reason}")]
    PatchFailed {
        /// The base container file being patched
        base: PathBuf,
        /// The reason patching failed (exit status, stderr)
        reason: String,
    },

    /// A patch file has no readable base counterpart
    #[error("patch {patch} has no base file {base}")]
    MissingPatchBase {
        /// The orphaned patch file
        patch: PathBuf,
        /// The base file that was expected to co-exist
        base: PathBuf,
    },

    /// Archive entry extraction failed
    #[error("extraction failed for {archive}: {reason}")]
    ExtractionFailed {
        /// The archive file that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// Ogg framing repair failed (revorb nonzero exit)
    #[error("framing repair failed for {file}: {reason}")]
    RepairFailed {
        /// The converted file that could not be repaired
        file: PathBuf,
        /// The reason repair failed
        reason: String,
    },

    /// File move/rename failed
    #[error("failed to move {source_path} to {dest_path}: {reason}")]
    MoveFailed {
        /// The source path of the file being moved
        source_path: PathBuf,
        /// The destination path where the file should be moved
        dest_path: PathBuf,
        /// The reason the move failed
        reason: String,
    },
}
