//! Directory copies and archive extraction into the target directory

use crate::error::Result;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Recursively copy `src` into `dst`, overwriting existing files
/// Returns the number of files copied
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<usize> {
    std::fs::create_dir_all(dst)?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    debug!("Copied {} files from {} to {}", copied, src.display(), dst.display());
    Ok(copied)
}

/// Extract every entry of a zip archive into `dst`, overwriting existing files
/// Entries whose path would escape `dst` are skipped
pub fn extract_zip<R: Read + Seek>(reader: R, dst: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(reader)?;
    std::fs::create_dir_all(dst)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let relative = match file.enclosed_name() {
            Some(path) => path,
            None => {
                warn!("Skipping unsafe archive entry: {}", file.name());
                continue;
            }
        };
        let target = dst.join(relative);

        if file.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(&target)?;
        std::io::copy(&mut file, &mut out)?;
        extracted += 1;
    }

    debug!("Extracted {} files to {}", extracted, dst.display());
    Ok(extracted)
}
