//! Locating the file a native tool produced.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Returns the most recently modified file in `dir` with the given
/// extension.
///
/// Native tools name their output themselves, so the newest matching file is
/// taken to be the one just produced. A stale file from an earlier run can
/// still win when the tool did not write anything new and timestamps are
/// coarse; the output directory is expected to be owned by one run at a time.
pub async fn newest_artifact(dir: &Path, extension: &str) -> Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .fs_context("reading output directory", dir)?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading output directory", dir)?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let metadata = entry
            .metadata()
            .await
            .fs_context("reading artifact metadata", &path)?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .fs_context("reading modification time of", &path)?;
        if newest.as_ref().is_none_or(|(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }

    newest.map(|(_, path)| path).ok_or_else(|| Error::ArtifactNotFound {
        dir: dir.to_path_buf(),
        extension: extension.to_string(),
    })
}
