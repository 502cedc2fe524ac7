use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, SubburnError};

/// Delete regular files directly inside `directory` whose modification time
/// is older than `max_age`. Returns how many files were removed.
///
/// Runs independently of the job table; a missing directory counts as empty.
pub async fn sweep_stale_uploads(directory: &Path, max_age: Duration) -> Result<usize> {
    let directory = directory.to_path_buf();
    tokio::task::spawn_blocking(move || sweep_blocking(&directory, max_age))
        .await
        .map_err(|e| SubburnError::Io(std::io::Error::other(e)))?
}

fn sweep_blocking(directory: &Path, max_age: Duration) -> Result<usize> {
    if !directory.is_dir() {
        debug!("Upload directory {} does not exist, nothing to sweep", directory.display());
        return Ok(0);
    }

    let now = SystemTime::now();
    let mut removed = 0;

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let modified = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
            Some(modified) => modified,
            None => continue,
        };
        // Files stamped in the future are treated as fresh.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age <= max_age {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!("Removed stale upload {}", entry.path().display());
                removed += 1;
            }
            Err(e) => warn!("Failed to remove stale upload {}: {}", entry.path().display(), e),
        }
    }

    info!("Swept {} stale uploads from {}", removed, directory.display());
    Ok(removed)
}
