//! Configuration types for wwise-rip

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single game source to process
///
/// Each source is a directory containing a `versions.txt` listing archive
/// URLs, and grows `zips/`, `extracted/` and `processed/` subdirectories as
/// the pipeline runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Human-readable source name, used in logs and events
    pub name: String,

    /// Root directory for this source's files
    pub root: PathBuf,
}

impl SourceConfig {
    /// Create a source config with the directory name as its display name
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { name, root }
    }

    /// Path to the versions.txt source list
    pub fn versions_file(&self) -> PathBuf {
        self.root.join("versions.txt")
    }

    /// Directory holding downloaded archives
    pub fn zips_dir(&self) -> PathBuf {
        self.root.join("zips")
    }

    /// Directory holding per-version raw extractions
    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join("extracted")
    }

    /// Working directory reused across versions; also holds the checkpoint files
    pub fn current_dir(&self) -> PathBuf {
        self.extracted_dir().join("current")
    }

    /// Directory holding per-version final audio output
    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }
}

/// External tool paths (hpatchz, quickbms, ww2ogg, revorb) and their data files
///
/// Binary paths are auto-detected from PATH when not set explicitly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the hpatchz executable (auto-detected if None)
    #[serde(default)]
    pub hpatchz_path: Option<PathBuf>,

    /// Path to the quickbms executable (auto-detected if None)
    #[serde(default)]
    pub quickbms_path: Option<PathBuf>,

    /// Path to the wavescan .bms script passed to quickbms
    #[serde(default = "default_wavescan_script")]
    pub wavescan_script: PathBuf,

    /// Path to the ww2ogg executable (auto-detected if None)
    #[serde(default)]
    pub ww2ogg_path: Option<PathBuf>,

    /// Path to the packed codebooks file passed to ww2ogg via --pcb
    #[serde(default = "default_codebooks")]
    pub codebooks_path: PathBuf,

    /// Path to the revorb executable (auto-detected if None)
    #[serde(default)]
    pub revorb_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            hpatchz_path: None,
            quickbms_path: None,
            wavescan_script: default_wavescan_script(),
            ww2ogg_path: None,
            codebooks_path: default_codebooks(),
            revorb_path: None,
            search_path: true,
        }
    }
}

/// Archive download behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// HTTP request timeout in seconds for archive downloads (default: 3600)
    ///
    /// Game-client archives are multi-gigabyte files, so the timeout covers
    /// the whole transfer, not just the connection.
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip downloads whose target file already exists (default: true)
    #[serde(default = "default_true")]
    pub skip_existing: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            skip_existing: true,
        }
    }
}

/// Main configuration for the music pipeline
///
/// Fields are organized into logical sub-configs:
/// - [`sources`](SourceConfig) - the game sources to process, in order
/// - [`tools`](ToolsConfig) - external binary paths and data files
/// - [`fetch`](FetchConfig) - archive download behavior
///
/// Sub-config fields are flattened for serialization, so the JSON format
/// stays flat apart from the sources list.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Game sources to process, in order (at least one required)
    pub sources: Vec<SourceConfig>,

    /// External tool paths and data files
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Archive download behavior
    #[serde(flatten)]
    pub fetch: FetchConfig,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks that at least one source is configured and that no two sources
    /// share a root directory (the working directories would collide).
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::Config {
                message: "at least one source is required".to_string(),
                key: Some("sources".to_string()),
            });
        }

        for (i, a) in self.sources.iter().enumerate() {
            for b in &self.sources[i + 1..] {
                if a.root == b.root {
                    return Err(Error::Config {
                        message: format!(
                            "sources '{}' and '{}' share the root directory {}",
                            a.name,
                            b.name,
                            a.root.display()
                        ),
                        key: Some("sources".to_string()),
                    });
                }
            }
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_fetch_timeout_secs() -> u64 {
    3600
}

fn default_wavescan_script() -> PathBuf {
    PathBuf::from("Tools").join("wavescan.bms")
}

fn default_codebooks() -> PathBuf {
    PathBuf::from("Tools").join("packed_codebooks_aoTuV_603.bin")
}
