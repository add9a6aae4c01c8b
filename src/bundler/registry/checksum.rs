//! SHA-256 digests of produced artifacts.

use crate::{bail, bundler::Result, bundler::error::ErrorExt};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Hex-encoded SHA-256 of a file, or of a directory tree such as an `.app`
/// bundle.
///
/// Directory digests cover each file's relative path followed by its
/// contents, in sorted path order.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading metadata of", path)?;

    let mut hasher = Sha256::new();
    if metadata.is_file() {
        hash_file(&mut hasher, path).await?;
    } else if metadata.is_dir() {
        let mut files: Vec<_> = walkdir::WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();
        for file in files {
            if let Ok(rel) = file.strip_prefix(path) {
                hasher.update(rel.to_string_lossy().as_bytes());
            }
            hash_file(&mut hasher, &file).await?;
        }
    } else {
        bail!("Path is neither file nor directory: {}", path.display());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Feeds a file to the hasher in 8 KiB chunks.
async fn hash_file(hasher: &mut Sha256, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut buffer = vec![0u8; 8192];
    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            return Ok(());
        }
        hasher.update(&buffer[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_digest_matches_known_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.rpm");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(
            calculate_sha256(&path).await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn directory_digest_depends_on_layout() {
        let a = tempfile::tempdir().unwrap();
        std::fs::write(a.path().join("x"), "same").unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(b.path().join("y"), "same").unwrap();

        let first = calculate_sha256(a.path()).await.unwrap();
        assert_eq!(first, calculate_sha256(a.path()).await.unwrap());
        assert_ne!(first, calculate_sha256(b.path()).await.unwrap());
    }
}
