//! CLI implementations of the tool seams using external binaries

use super::traits::{Patcher, Repairer, ScanOutcome, StreamScanner, Transcoder};
use crate::error::{Error, ProcessError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// hdiff patcher using the external `hpatchz` binary
///
/// Invoked as `hpatchz -f <base> <patch> <output>`; the `-f` flag forces
/// overwriting an existing output file.
pub struct CliPatcher {
    binary_path: PathBuf,
}

impl CliPatcher {
    /// Create a new CLI patcher with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find hpatchz in PATH
    pub fn from_path() -> Option<Self> {
        which::which("hpatchz").ok().map(Self::new)
    }
}

#[async_trait]
impl Patcher for CliPatcher {
    async fn apply(&self, base: &Path, patch: &Path, output: &Path) -> crate::Result<()> {
        debug!(?base, ?patch, ?output, "applying hdiff patch");

        let result = Command::new(&self.binary_path)
            .arg("-f")
            .arg(base)
            .arg(patch)
            .arg(output)
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to execute hpatchz: {}", e)))?;

        if !result.status.success() {
            return Err(Error::Process(ProcessError::PatchFailed {
                base: base.to_path_buf(),
                reason: format!(
                    "hpatchz exited with {}: {}",
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim()
                ),
            }));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "cli-hpatchz"
    }
}

/// Container scanner using the external `quickbms` binary and a wavescan script
///
/// Invoked as `quickbms -o <script> <input-dir> <output-dir>`.
pub struct CliScanner {
    binary_path: PathBuf,
    script: PathBuf,
}

impl CliScanner {
    /// Create a new CLI scanner with an explicit binary path and scan script
    pub fn new(binary_path: PathBuf, script: PathBuf) -> Self {
        Self {
            binary_path,
            script,
        }
    }

    /// Attempt to find quickbms in PATH
    pub fn from_path(script: PathBuf) -> Option<Self> {
        which::which("quickbms").ok().map(|p| Self::new(p, script))
    }
}

#[async_trait]
impl StreamScanner for CliScanner {
    async fn scan(&self, input_dir: &Path, output_dir: &Path) -> crate::Result<ScanOutcome> {
        debug!(?input_dir, ?output_dir, script = ?self.script, "scanning containers");

        let result = Command::new(&self.binary_path)
            .arg("-o")
            .arg(&self.script)
            .arg(input_dir)
            .arg(output_dir)
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to execute quickbms: {}", e)))?;

        Ok(ScanOutcome {
            success: result.status.success(),
            exit_code: result.status.code(),
            stdout: String::from_utf8_lossy(&result.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        })
    }

    fn name(&self) -> &'static str {
        "cli-quickbms"
    }
}

/// Wwise-to-Ogg transcoder using the external `ww2ogg` binary
///
/// Invoked as `ww2ogg <input> --pcb <codebooks>`; produces a sibling `.ogg`
/// file next to the input.
pub struct CliTranscoder {
    binary_path: PathBuf,
    codebooks: PathBuf,
}

impl CliTranscoder {
    /// Create a new CLI transcoder with an explicit binary path and codebooks file
    pub fn new(binary_path: PathBuf, codebooks: PathBuf) -> Self {
        Self {
            binary_path,
            codebooks,
        }
    }

    /// Attempt to find ww2ogg in PATH
    pub fn from_path(codebooks: PathBuf) -> Option<Self> {
        which::which("ww2ogg").ok().map(|p| Self::new(p, codebooks))
    }
}

#[async_trait]
impl Transcoder for CliTranscoder {
    async fn convert(&self, input: &Path) -> crate::Result<()> {
        debug!(?input, "converting stream");

        let result = Command::new(&self.binary_path)
            .arg(input)
            .arg("--pcb")
            .arg(&self.codebooks)
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to execute ww2ogg: {}", e)))?;

        if !result.status.success() {
            return Err(Error::ExternalTool(format!(
                "ww2ogg exited with {} for {}: {}",
                result.status,
                input.display(),
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "cli-ww2ogg"
    }
}

/// Ogg framing repairer using the external `revorb` binary
///
/// Invoked as `revorb <file>`; mutates the file in place.
pub struct CliRepairer {
    binary_path: PathBuf,
}

impl CliRepairer {
    /// Create a new CLI repairer with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find revorb in PATH
    pub fn from_path() -> Option<Self> {
        which::which("revorb").ok().map(Self::new)
    }
}

#[async_trait]
impl Repairer for CliRepairer {
    async fn repair(&self, file: &Path) -> crate::Result<()> {
        debug!(?file, "repairing stream framing");

        let result = Command::new(&self.binary_path)
            .arg(file)
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to execute revorb: {}", e)))?;

        if !result.status.success() {
            return Err(Error::Process(ProcessError::RepairFailed {
                file: file.to_path_buf(),
                reason: format!(
                    "revorb exited with {}: {}",
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim()
                ),
            }));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "cli-revorb"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_returns_none_for_nonexistent_binary() {
        // Passes as long as no binary has this name
        let result = which::which("nonexistent-hpatchz-binary-xyz");
        assert!(result.is_err());
    }

    #[test]
    fn from_path_consistency_with_which_crate() {
        // from_path() should agree with which::which() on binary presence
        assert_eq!(
            which::which("hpatchz").is_ok(),
            CliPatcher::from_path().is_some()
        );
        assert_eq!(
            which::which("revorb").is_ok(),
            CliRepairer::from_path().is_some()
        );
    }

    #[tokio::test]
    async fn patcher_with_invalid_binary_path_returns_external_tool_error() {
        let patcher = CliPatcher::new(PathBuf::from("/nonexistent/path/to/hpatchz"));

        let result = patcher
            .apply(
                Path::new("base.pck"),
                Path::new("base.pck.hdiff"),
                Path::new("out.pck"),
            )
            .await;

        match result {
            Err(Error::ExternalTool(msg)) => {
                assert!(msg.contains("failed to execute hpatchz"));
            }
            other => panic!("expected ExternalTool error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn scanner_with_invalid_binary_path_returns_external_tool_error() {
        let scanner = CliScanner::new(
            PathBuf::from("/nonexistent/path/to/quickbms"),
            PathBuf::from("wavescan.bms"),
        );

        let result = scanner.scan(Path::new("/tmp/in"), Path::new("/tmp/out")).await;
        assert!(matches!(result, Err(Error::ExternalTool(_))));
    }

    #[tokio::test]
    async fn transcoder_with_invalid_binary_path_returns_external_tool_error() {
        let transcoder = CliTranscoder::new(
            PathBuf::from("/nonexistent/path/to/ww2ogg"),
            PathBuf::from("codebooks.bin"),
        );

        let result = transcoder.convert(Path::new("stream.wem")).await;
        assert!(matches!(result, Err(Error::ExternalTool(_))));
    }

    #[tokio::test]
    async fn repairer_with_invalid_binary_path_returns_external_tool_error() {
        let repairer = CliRepairer::new(PathBuf::from("/nonexistent/path/to/revorb"));

        let result = repairer.repair(Path::new("stream.ogg")).await;
        assert!(matches!(result, Err(Error::ExternalTool(_))));
    }

    #[test]
    fn handler_names_identify_their_binaries() {
        assert_eq!(CliPatcher::new(PathBuf::from("x")).name(), "cli-hpatchz");
        assert_eq!(
            CliScanner::new(PathBuf::from("x"), PathBuf::from("y")).name(),
            "cli-quickbms"
        );
        assert_eq!(
            CliTranscoder::new(PathBuf::from("x"), PathBuf::from("y")).name(),
            "cli-ww2ogg"
        );
        assert_eq!(CliRepairer::new(PathBuf::from("x")).name(), "cli-revorb");
    }
}
