//! Photo discovery

use bracket_core::ItemSource;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info};

/// Extensions accepted as photos, compared case-insensitively
pub const PHOTO_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("photo directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("no photos (jpg, jpeg, png) found in {0}")]
    Empty(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PHOTO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Photos directly inside `dir`, oldest modification time first.
///
/// Files with equal times keep path order so item ids are stable across runs.
pub fn discover_photos(dir: &Path) -> Result<Vec<ItemSource>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::MissingDirectory(dir.to_path_buf()));
    }

    let io_err = |source| DiscoveryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        // Follows symlinks; a dangling link is skipped like any non-photo.
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !metadata.is_file() || !is_photo(&path) {
            debug!(path = %path.display(), "skipping non-photo entry");
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        found.push((modified, path));
    }

    if found.is_empty() {
        return Err(DiscoveryError::Empty(dir.to_path_buf()));
    }
    found.sort();
    info!(dir = %dir.display(), photos = found.len(), "discovered photos");

    Ok(found
        .into_iter()
        .map(|(modified, path)| {
            ItemSource::new(path.to_string_lossy().into_owned())
                .with_created_at(DateTime::<Utc>::from(modified))
        })
        .collect())
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod discovery_tests;
