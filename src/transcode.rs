//! Transcode pipeline
//!
//! Converts surviving raw streams to Ogg via the transcoder tool, then runs
//! the framing repairer over the converted files. Conversion failures are
//! per-file soft failures (logged and skipped); repair failures are fatal,
//! since a malformed output container is unrecoverable for the run.

use crate::dedup::is_stream_file;
use crate::error::Result;
use crate::tools::{Repairer, Transcoder};
use crate::types::Event;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{info, warn};

fn sorted_files(dir: &Path, filter: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| !p.is_dir() && filter(p))
        .collect();
    files.sort();
    Ok(files)
}

/// Convert every raw stream in the directory to the target container
///
/// A failed conversion is logged and the file skipped; a single corrupt or
/// unsupported stream must not abort the whole version. The pre-conversion
/// file is deleted whether conversion succeeded or not.
///
/// Returns `(converted, failed)` counts.
pub async fn convert_streams(
    dir: &Path,
    transcoder: &dyn Transcoder,
    events: &broadcast::Sender<Event>,
) -> Result<(usize, usize)> {
    let mut converted = 0;
    let mut failed = 0;

    for path in sorted_files(dir, is_stream_file)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!(file = %name, "converting");
        match transcoder.convert(&path).await {
            Ok(()) => {
                converted += 1;
                let _ = events.send(Event::StreamConverted { file: name });
            }
            Err(e) => {
                warn!(file = %name, error = %e, "conversion failed, skipping file");
                failed += 1;
                let _ = events.send(Event::ConversionFailed {
                    file: name,
                    reason: e.to_string(),
                });
            }
        }

        tokio::fs::remove_file(&path).await?;
    }

    Ok((converted, failed))
}

/// Run the framing repairer over every converted file in the directory
///
/// # Errors
///
/// A repair failure aborts the current version's processing entirely; the
/// checkpoint is left unmodified so the version is retried next run.
pub async fn repair_streams(dir: &Path, repairer: &dyn Repairer) -> Result<usize> {
    let ogg_files = sorted_files(dir, |p| {
        p.extension().and_then(|e| e.to_str()) == Some("ogg")
    })?;

    for path in &ogg_files {
        info!(file = ?path.file_name(), "repairing framing");
        repairer.repair(path).await?;
    }

    Ok(ogg_files.len())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ProcessError};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Fake transcoder: writes a sibling .ogg file, failing on configured names
    struct FakeTranscoder {
        fail_on: Vec<&'static str>,
    }

    #[async_trait]
    impl Transcoder for FakeTranscoder {
        async fn convert(&self, input: &Path) -> crate::Result<()> {
            let name = input.file_name().unwrap().to_str().unwrap();
            if self.fail_on.contains(&name) {
                return Err(Error::ExternalTool(format!("unsupported stream: {name}")));
            }
            fs::write(input.with_extension("ogg"), b"ogg-data")?;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "fake-transcoder"
        }
    }

    /// Fake repairer: records repaired files, failing on configured names
    struct FakeRepairer {
        fail_on: Vec<&'static str>,
        repaired: Mutex<Vec<String>>,
    }

    impl FakeRepairer {
        fn new(fail_on: Vec<&'static str>) -> Self {
            Self {
                fail_on,
                repaired: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Repairer for FakeRepairer {
        async fn repair(&self, file: &Path) -> crate::Result<()> {
            let name = file.file_name().unwrap().to_str().unwrap();
            if self.fail_on.contains(&name) {
                return Err(Error::Process(ProcessError::RepairFailed {
                    file: file.to_path_buf(),
                    reason: "exit status 1".into(),
                }));
            }
            self.repaired.lock().unwrap().push(name.to_string());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "fake-repairer"
        }
    }

    #[tokio::test]
    async fn converts_streams_and_deletes_sources() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("1.wem"), b"a").unwrap();
        fs::write(temp_dir.path().join("2.wav"), b"b").unwrap();

        let transcoder = FakeTranscoder { fail_on: vec![] };
        let (events, _rx) = broadcast::channel(16);
        let (converted, failed) = convert_streams(temp_dir.path(), &transcoder, &events)
            .await
            .unwrap();

        assert_eq!((converted, failed), (2, 0));
        assert!(temp_dir.path().join("1.ogg").exists());
        assert!(temp_dir.path().join("2.ogg").exists());
        assert!(!temp_dir.path().join("1.wem").exists());
        assert!(!temp_dir.path().join("2.wav").exists());
    }

    #[tokio::test]
    async fn one_failing_stream_does_not_abort_the_others() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["1.wem", "2.wem", "3.wem", "4.wem", "5.wem"] {
            fs::write(temp_dir.path().join(name), name.as_bytes()).unwrap();
        }

        let transcoder = FakeTranscoder {
            fail_on: vec!["3.wem"],
        };
        let (events, _rx) = broadcast::channel(16);
        let (converted, failed) = convert_streams(temp_dir.path(), &transcoder, &events)
            .await
            .unwrap();

        assert_eq!((converted, failed), (4, 1));
        for name in ["1.ogg", "2.ogg", "4.ogg", "5.ogg"] {
            assert!(temp_dir.path().join(name).exists(), "{name} should exist");
        }
        assert!(!temp_dir.path().join("3.ogg").exists());
        // Failed source is discarded too
        assert!(!temp_dir.path().join("3.wem").exists());
    }

    #[tokio::test]
    async fn conversion_failure_emits_event_with_reason() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("bad.wem"), b"x").unwrap();

        let transcoder = FakeTranscoder {
            fail_on: vec!["bad.wem"],
        };
        let (events, mut rx) = broadcast::channel(16);
        convert_streams(temp_dir.path(), &transcoder, &events)
            .await
            .unwrap();

        match rx.try_recv().unwrap() {
            Event::ConversionFailed { file, reason } => {
                assert_eq!(file, "bad.wem");
                assert!(reason.contains("unsupported stream"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn repairs_every_converted_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("1.ogg"), b"a").unwrap();
        fs::write(temp_dir.path().join("2.ogg"), b"b").unwrap();
        fs::write(temp_dir.path().join("skip.txt"), b"c").unwrap();

        let repairer = FakeRepairer::new(vec![]);
        let repaired = repair_streams(temp_dir.path(), &repairer).await.unwrap();

        assert_eq!(repaired, 2);
        assert_eq!(
            *repairer.repaired.lock().unwrap(),
            vec!["1.ogg".to_string(), "2.ogg".to_string()]
        );
    }

    #[tokio::test]
    async fn repair_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("1.ogg"), b"a").unwrap();
        fs::write(temp_dir.path().join("2.ogg"), b"b").unwrap();

        let repairer = FakeRepairer::new(vec!["2.ogg"]);
        let err = repair_streams(temp_dir.path(), &repairer).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Process(ProcessError::RepairFailed { .. })
        ));
    }
}
