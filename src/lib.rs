//! # wwise-rip
//!
//! Incremental extraction pipeline for versioned Wwise game music.
//!
//! ## Design Philosophy
//!
//! wwise-rip is designed to be:
//! - **Incremental** - Every stage skips work already done; re-runs resume
//!   from the last checkpoint instead of starting over
//! - **Sensible defaults** - Works out of the box with a source list and
//!   the external tools on PATH
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use wwise_rip::{Config, MusicPipeline, SourceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         sources: vec![SourceConfig::new("/data/Genshin")],
//!         ..Default::default()
//!     };
//!
//!     let pipeline = MusicPipeline::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = pipeline.run().await?;
//!     println!("{} version(s) processed", summary.versions_processed);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Checkpoint persistence
pub mod checkpoint;
/// Configuration types
pub mod config;
/// Content-hash stream deduplication
pub mod dedup;
/// Error types
pub mod error;
/// Archive download
pub mod fetch;
/// Binary patch application
pub mod patch;
/// Pipeline orchestration
pub mod pipeline;
/// External tool integration
pub mod tools;
/// Stream conversion and repair
pub mod transcode;
/// Core types and events
pub mod types;
/// Music entry extraction from downloaded archives
pub mod unpack;
/// Version token parsing and sequencing
pub mod version;

// Re-export commonly used types
pub use checkpoint::CheckpointStore;
pub use config::{Config, FetchConfig, SourceConfig, ToolsConfig};
pub use dedup::HashRegistry;
pub use error::{Error, ProcessError, Result};
pub use pipeline::{MusicPipeline, RunSummary};
pub use tools::{
    CliPatcher, CliRepairer, CliScanner, CliTranscoder, Patcher, Repairer, ScanOutcome,
    StreamScanner, Toolchain, Transcoder,
};
pub use types::{Event, VersionToken};
pub use version::version_token;
