//! Full pipeline run example
//!
//! This example demonstrates the core functionality of wwise-rip:
//! - Configuring a game source
//! - Creating a pipeline instance
//! - Subscribing to events
//! - Running the incremental pipeline end to end

use wwise_rip::{Config, Event, MusicPipeline, SourceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    // Each source directory needs a versions.txt listing one archive URL
    // per line; everything else is created on demand.
    let config = Config {
        sources: vec![SourceConfig::new("data/Genshin")],
        ..Default::default()
    };

    // External tools (hpatchz, quickbms, ww2ogg, revorb) are resolved from
    // PATH; set the *_path fields on config.tools to pin explicit binaries.
    let pipeline = MusicPipeline::new(config)?;

    // Subscribe to events
    let mut events = pipeline.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::ArchiveDownloaded { source, filename } => {
                    println!("✓ Downloaded {filename} for {source}");
                }
                Event::VersionStarted { source, version } => {
                    println!("▶ {source} {version}");
                }
                Event::FilePatched { file } => {
                    println!("  patched {file}");
                }
                Event::ScanCompleted { success, exit_code } => {
                    if !success {
                        println!("  scan exited nonzero ({exit_code:?}), continuing");
                    }
                }
                Event::ConversionFailed { file, reason } => {
                    println!("  ✗ {file}: {reason}");
                }
                Event::VersionCompleted {
                    version,
                    output_dir,
                    ..
                } => {
                    println!("✓ {version} → {}", output_dir.display());
                }
                _ => {}
            }
        }
    });

    let summary = pipeline.run().await?;
    println!(
        "Done: {} version(s), {} stream(s) converted, {} duplicate(s) skipped",
        summary.versions_processed, summary.streams_converted, summary.duplicates_discarded
    );

    Ok(())
}
