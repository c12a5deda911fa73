//! Moves a classified document into place. This is the explicit,
//! user-confirmed step downstream of a `ClassificationResult`; it never
//! runs as part of classification itself.

use anyhow::{bail, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Moves `source` into `destination_folder` under `proposed` (which must
/// already carry its extension). Collisions auto-rename with `_2`, `_3`, ...
pub fn move_item(source: &Path, destination_folder: &Path, proposed: &str) -> Result<PathBuf> {
    if !source.exists() {
        bail!("source {} does not exist", source.display());
    }
    fs::create_dir_all(destination_folder)?;

    let mut target = destination_folder.join(proposed);
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();
    let ext = target
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();

    let mut attempt = 1;
    while target.exists() {
        attempt += 1;
        let name = if ext.is_empty() {
            format!("{stem}_{attempt}")
        } else {
            format!("{stem}_{attempt}.{ext}")
        };
        target = destination_folder.join(name);
    }

    match fs::rename(source, &target) {
        Ok(()) => Ok(target),
        Err(_) => {
            // Cross-device moves fall back to copy + remove.
            fs::copy(source, &target)?;
            fs::remove_file(source)?;
            Ok(target)
        }
    }
}
