// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for exporting photo and video artifacts
//!
//! Media stays in memory until the user asks for a download; only then is a
//! file written. Existing files are never overwritten.

use crate::config::APP_DIR;
use crate::errors::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default download location: `~/Pictures/filtercam`, or the current directory
pub fn default_download_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Write `data` into `dir` under `filename`
///
/// If `filename` is taken, ` (1)`, ` (2)`, ... is inserted before the
/// extension, the way browsers name repeated downloads.
pub async fn save_artifact(dir: PathBuf, filename: String, data: Vec<u8>) -> AppResult<PathBuf> {
    tokio::task::spawn_blocking(move || save_artifact_blocking(&dir, &filename, &data))
        .await
        .map_err(|e| AppError::Storage(format!("Download task failed: {}", e)))?
}

pub fn save_artifact_blocking(dir: &Path, filename: &str, data: &[u8]) -> AppResult<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| {
        AppError::Storage(format!("Failed to create {}: {}", dir.display(), e))
    })?;

    let path = available_path(dir, filename);
    debug!(path = %path.display(), bytes = data.len(), "Writing artifact");

    // The path may have been taken since available_path looked
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", path.display(), e)))?;
    std::io::Write::write_all(&mut file, data)
        .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

    info!(path = %path.display(), bytes = data.len(), "Artifact saved");
    Ok(path)
}

/// First free path for `filename` inside `dir`
pub fn available_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    };

    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_path_numbers_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(available_path(dir.path(), "photo.png"), dir.path().join("photo.png"));

        std::fs::write(dir.path().join("photo.png"), b"x").unwrap();
        assert_eq!(
            available_path(dir.path(), "photo.png"),
            dir.path().join("photo (1).png")
        );

        std::fs::write(dir.path().join("photo (1).png"), b"x").unwrap();
        assert_eq!(
            available_path(dir.path(), "photo.png"),
            dir.path().join("photo (2).png")
        );
    }

    #[test]
    fn test_save_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = save_artifact_blocking(dir.path(), "video.webm", b"one").unwrap();
        let second = save_artifact_blocking(dir.path(), "video.webm", b"two").unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }
}
