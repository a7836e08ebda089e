//! Patch applier
//!
//! Applies every pending `.hdiff` binary patch in a working directory
//! against its base container, replacing the base in place. Patch and
//! pre-patch base are deleted afterwards, so re-running on an
//! already-patched directory is a no-op.

use crate::error::{Error, ProcessError, Result};
use crate::tools::Patcher;
use crate::types::Event;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::info;

/// Patch-file suffix
const HDIFF_SUFFIX: &str = ".hdiff";

/// Find pending patch files in directory-listing order
///
/// No cross-file dependency exists between patches, so listing order is as
/// good as any.
fn pending_patches(workdir: &Path) -> Result<Vec<PathBuf>> {
    let mut patches = Vec::new();
    for entry in std::fs::read_dir(workdir)? {
        let path = entry?.path();
        if path.is_dir() {
            continue;
        }
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(HDIFF_SUFFIX))
        {
            patches.push(path);
        }
    }
    Ok(patches)
}

/// Apply every pending patch in the working directory
///
/// For each `<name>.hdiff`, the expected base is `<name>` alongside it. The
/// patched output is produced under `workdir/patched/` and moved over the
/// base name once both the patch file and the pre-patch base are deleted,
/// leaving exactly one file under the original base name.
///
/// # Errors
///
/// A patch tool failure is fatal for the whole version: downstream
/// extraction assumes a fully-patched file set, so there is no
/// partial-patch recovery.
pub async fn apply_pending_patches(
    workdir: &Path,
    patcher: &dyn Patcher,
    events: &broadcast::Sender<Event>,
) -> Result<usize> {
    let patches = pending_patches(workdir)?;
    if patches.is_empty() {
        return Ok(0);
    }

    let patched_dir = workdir.join("patched");
    tokio::fs::create_dir_all(&patched_dir).await?;

    let mut applied = 0;
    for patch_path in patches {
        let Some(patch_name) = patch_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let base_name = &patch_name[..patch_name.len() - HDIFF_SUFFIX.len()];
        let base_path = workdir.join(base_name);
        let output_path = patched_dir.join(base_name);

        if !base_path.exists() {
            return Err(Error::Process(ProcessError::MissingPatchBase {
                patch: patch_path,
                base: base_path,
            }));
        }

        info!(file = base_name, "patching");
        patcher.apply(&base_path, &patch_path, &output_path).await?;

        tokio::fs::remove_file(&patch_path).await?;
        tokio::fs::remove_file(&base_path).await?;
        tokio::fs::rename(&output_path, &base_path).await?;

        let _ = events.send(Event::FilePatched {
            file: base_name.to_string(),
        });
        applied += 1;
    }

    Ok(applied)
}
