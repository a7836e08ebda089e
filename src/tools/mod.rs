//! External tool seams
//!
//! Every step of the pipeline that delegates to an external binary (binary
//! patching, container scanning, transcoding, framing repair) goes through a
//! capability trait defined here, with CLI implementations shelling out to
//! the real tools.

mod cli;
mod traits;

// Re-exports
pub use cli::{CliPatcher, CliRepairer, CliScanner, CliTranscoder};
pub use traits::{Patcher, Repairer, ScanOutcome, StreamScanner, Transcoder};

use crate::config::ToolsConfig;
use crate::error::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// The full set of external tools the pipeline needs
///
/// Bundles one implementation of each capability trait. Production code
/// builds this from [`ToolsConfig`] via [`Toolchain::from_config`]; tests
/// construct it from fakes.
#[derive(Clone)]
pub struct Toolchain {
    /// hdiff patch application
    pub patcher: Arc<dyn Patcher>,
    /// Embedded stream extraction
    pub scanner: Arc<dyn StreamScanner>,
    /// Wwise-to-Ogg conversion
    pub transcoder: Arc<dyn Transcoder>,
    /// Ogg framing repair
    pub repairer: Arc<dyn Repairer>,
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("patcher", &self.patcher.name())
            .field("scanner", &self.scanner.name())
            .field("transcoder", &self.transcoder.name())
            .field("repairer", &self.repairer.name())
            .finish()
    }
}

impl Toolchain {
    /// Resolve all four tools from the configuration
    ///
    /// Explicit paths win; otherwise each binary is searched for in PATH when
    /// `search_path` is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] naming the first binary that could not
    /// be resolved. There is no degraded mode: every tool is load-bearing.
    pub fn from_config(tools: &ToolsConfig) -> Result<Self> {
        let patcher = match &tools.hpatchz_path {
            Some(path) => CliPatcher::new(path.clone()),
            None => resolve(tools.search_path, "hpatchz", CliPatcher::from_path)?,
        };
        let scanner = match &tools.quickbms_path {
            Some(path) => CliScanner::new(path.clone(), tools.wavescan_script.clone()),
            None => {
                let script = tools.wavescan_script.clone();
                resolve(tools.search_path, "quickbms", move || {
                    CliScanner::from_path(script)
                })?
            }
        };
        let transcoder = match &tools.ww2ogg_path {
            Some(path) => CliTranscoder::new(path.clone(), tools.codebooks_path.clone()),
            None => {
                let codebooks = tools.codebooks_path.clone();
                resolve(tools.search_path, "ww2ogg", move || {
                    CliTranscoder::from_path(codebooks)
                })?
            }
        };
        let repairer = match &tools.revorb_path {
            Some(path) => CliRepairer::new(path.clone()),
            None => resolve(tools.search_path, "revorb", CliRepairer::from_path)?,
        };

        info!(
            patcher = patcher.name(),
            scanner = scanner.name(),
            transcoder = transcoder.name(),
            repairer = repairer.name(),
            "resolved external toolchain"
        );

        Ok(Self {
            patcher: Arc::new(patcher),
            scanner: Arc::new(scanner),
            transcoder: Arc::new(transcoder),
            repairer: Arc::new(repairer),
        })
    }

    /// Build a toolchain from pre-constructed implementations
    pub fn new(
        patcher: Arc<dyn Patcher>,
        scanner: Arc<dyn StreamScanner>,
        transcoder: Arc<dyn Transcoder>,
        repairer: Arc<dyn Repairer>,
    ) -> Self {
        Self {
            patcher,
            scanner,
            transcoder,
            repairer,
        }
    }
}

fn resolve<T>(search_path: bool, binary: &str, from_path: impl FnOnce() -> Option<T>) -> Result<T> {
    if !search_path {
        return Err(Error::NotSupported(format!(
            "no explicit path configured for {binary} and PATH search is disabled"
        )));
    }
    from_path().ok_or_else(|| Error::NotSupported(format!("{binary} binary not found in PATH")))
}
