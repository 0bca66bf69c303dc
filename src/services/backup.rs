use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use regex::Regex;
use tracing::debug;

use crate::error::{LocalizeError, Result};

const BACKUP_EXT: &str = "bckp";

/// Copies `path` to `<path>.<YYYYmmddHHMMSS>.bckp` and returns the copy's path.
///
/// A second backup within the same second gets a `-N` suffix on the stamp.
pub fn create_backup(path: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d%H%M%S").to_string();

    let mut backup = with_suffix(path, &format!(".{stamp}.{BACKUP_EXT}"));
    let mut n = 1;
    while backup.exists() {
        backup = with_suffix(path, &format!(".{stamp}-{n}.{BACKUP_EXT}"));
        n += 1;
    }

    fs::copy(path, &backup).map_err(|e| LocalizeError::io(path, e))?;
    debug!(from = %path.display(), to = %backup.display(), "backup created");

    Ok(backup)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Backups of `path` made by [`create_backup`], sorted by name.
pub fn list_backups(path: &Path) -> Result<Vec<PathBuf>> {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return Ok(Vec::new());
    };
    let name = name.to_string_lossy();

    let pattern = format!(r"^{}\.\d{{14}}(-\d+)?\.{BACKUP_EXT}$", regex::escape(&name));
    let re = Regex::new(&pattern).map_err(|e| LocalizeError::Config(e.to_string()))?;

    let mut found = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| LocalizeError::io(dir, e))?;
    for entry in entries.flatten() {
        if re.is_match(&entry.file_name().to_string_lossy()) {
            found.push(entry.path());
        }
    }
    found.sort();

    Ok(found)
}
