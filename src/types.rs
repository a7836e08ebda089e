//! Core types and events for wwise-rip

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Version token parsed from an archive filename
///
/// Tokens are short, zero-padded strings (e.g. `"1.5"`) compared as opaque
/// text: the source filenames use fixed-width tokens, so lexicographic and
/// numeric order coincide for valid inputs.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(pub String);

impl VersionToken {
    /// Create a new VersionToken
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for VersionToken {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for VersionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Events emitted by the pipeline
///
/// Consumers subscribe via [`crate::MusicPipeline::subscribe`] and receive
/// every event over a broadcast channel; no polling required.
#[derive(Clone, Debug)]
pub enum Event {
    /// An archive was downloaded into the zips directory
    ArchiveDownloaded {
        /// Source name
        source: String,
        /// Downloaded archive filename
        filename: String,
    },
    /// An archive was already present and the download was skipped
    ArchiveSkipped {
        /// Source name
        source: String,
        /// Archive filename that was already on disk
        filename: String,
    },
    /// Music entries for a version were extracted from its archive
    VersionExtracted {
        /// Source name
        source: String,
        /// The version whose entries were extracted
        version: VersionToken,
        /// Number of music files written (excluding already-present skips)
        files: usize,
    },
    /// Per-version processing started
    VersionStarted {
        /// Source name
        source: String,
        /// The version being processed
        version: VersionToken,
    },
    /// A base container was patched with its hdiff file
    FilePatched {
        /// The patched base filename
        file: String,
    },
    /// The container scan finished
    ScanCompleted {
        /// Whether the scan tool exited zero
        success: bool,
        /// Exit code if the process terminated normally
        exit_code: Option<i32>,
    },
    /// An extracted stream was discarded as a duplicate of earlier output
    StreamDeduplicated {
        /// The discarded stream filename
        file: String,
    },
    /// A stream was converted to the target container
    StreamConverted {
        /// The converted stream filename
        file: String,
    },
    /// A stream failed conversion and was skipped
    ConversionFailed {
        /// The skipped stream filename
        file: String,
        /// The conversion error message
        reason: String,
    },
    /// A version finished processing and was checkpointed
    VersionCompleted {
        /// Source name
        source: String,
        /// The completed version
        version: VersionToken,
        /// Final output directory for this version
        output_dir: PathBuf,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_tokens_order_lexicographically() {
        let mut tokens = vec![
            VersionToken::from("2.0"),
            VersionToken::from("1.0"),
            VersionToken::from("1.5"),
        ];
        tokens.sort();
        assert_eq!(
            tokens,
            vec![
                VersionToken::from("1.0"),
                VersionToken::from("1.5"),
                VersionToken::from("2.0"),
            ]
        );
    }

    #[test]
    fn version_token_display_and_parse() {
        let token: VersionToken = "4.2".parse().unwrap();
        assert_eq!(token.to_string(), "4.2");
        assert_eq!(token.as_str(), "4.2");
    }

    #[test]
    fn version_token_serde_is_transparent() {
        let token = VersionToken::from("1.5");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"1.5\"");
        let back: VersionToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }
}
