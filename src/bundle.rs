// Bundle discovery: the entries of the source directory, in the order the
// filesystem lists them.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A directory entry whose full contents make up one request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    path: PathBuf,
}

impl Bundle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Bundle { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole entry. Fails for directories and unreadable files.
    pub fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))
    }
}

/// List `dir` without recursing. Entries are not sorted and not filtered by
/// type: subdirectories and other non-regular entries are returned too.
///
/// Only a directory that cannot be opened is an error. An entry that fails
/// mid-iteration is logged and skipped.
pub fn discover(dir: &Path) -> Result<Vec<Bundle>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list bundle directory {}", dir.display()))?;

    let mut bundles = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => bundles.push(Bundle::new(dir.join(entry.file_name()))),
            Err(e) => warn!("Skipping unreadable entry in {}: {}", dir.display(), e),
        }
    }
    Ok(bundles)
}
