//! Traits and types for the external tool seams
//!
//! Every external binary the pipeline shells out to sits behind one of these
//! capability traits, so the orchestration logic can be tested against fake
//! implementations without invoking real binaries.

use async_trait::async_trait;
use std::path::Path;

/// Result of a container scan run
///
/// The scan tool is known to exit nonzero on benign warnings, so instead of
/// turning a failed exit into an error the outcome carries the exit status
/// and captured streams and lets the caller decide whether to abort.
#[must_use]
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Whether the tool exited zero
    pub success: bool,
    /// Exit code, if the process terminated normally
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Binary patch application (hpatchz)
///
/// # Errors
///
/// A nonzero exit is an error: downstream extraction assumes a fully-patched
/// file set, so there is no partial-patch recovery.
#[async_trait]
pub trait Patcher: Send + Sync {
    /// Apply `patch` to `base`, writing the patched file to `output`
    async fn apply(&self, base: &Path, patch: &Path, output: &Path) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Embedded audio stream extraction (quickbms + wavescan script)
#[async_trait]
pub trait StreamScanner: Send + Sync {
    /// Scan every container in `input_dir`, writing extracted streams to
    /// `output_dir`
    ///
    /// # Errors
    ///
    /// Only failing to spawn the process is an error; a nonzero exit is
    /// reported through the returned [`ScanOutcome`].
    async fn scan(&self, input_dir: &Path, output_dir: &Path) -> crate::Result<ScanOutcome>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Wwise stream to Ogg conversion (ww2ogg)
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert `input` in place, producing a sibling `.ogg` file
    ///
    /// # Errors
    ///
    /// Returns an error on nonzero exit or process failure. Callers treat
    /// this as a per-file soft failure: log, discard the input, continue.
    async fn convert(&self, input: &Path) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Ogg granule framing repair (revorb)
#[async_trait]
pub trait Repairer: Send + Sync {
    /// Repair `file` in place
    ///
    /// # Errors
    ///
    /// A nonzero exit is an error and is fatal for the run: a malformed
    /// output container is considered unrecoverable.
    async fn repair(&self, file: &Path) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
