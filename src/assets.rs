//! Classification of extracted asset trees.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },
}

/// Classification of an asset file derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Js,
    Css,
    Other,
}

impl AssetKind {
    /// Derive an asset kind from a file path's extension.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("js") | Some("mjs") => AssetKind::Js,
            Some("css") => AssetKind::Css,
            _ => AssetKind::Other,
        }
    }
}

/// Counts and byte totals for an asset tree. Derived on demand from the
/// filesystem, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    pub js_count: u64,
    pub css_count: u64,
    pub other_count: u64,
    pub total_bytes: u64,
}

impl AssetSummary {
    /// Total number of regular files in the tree.
    pub fn file_count(&self) -> u64 {
        self.js_count + self.css_count + self.other_count
    }
}

/// Walk a directory tree and summarize its asset files.
///
/// Symlinks are not followed, so cycles cannot occur; directories
/// contribute zero bytes. Unreadable entries are skipped. Read-only and
/// safe to call repeatedly.
pub fn classify(dir: &Path) -> Result<AssetSummary, AssetError> {
    if !dir.is_dir() {
        return Err(AssetError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut summary = AssetSummary::default();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, dir = %dir.display(), "Skipping unreadable entry during classification");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::debug!(error = %e, path = %entry.path().display(), "Skipping unreadable file during classification");
                continue;
            }
        };

        match AssetKind::from_path(entry.path()) {
            AssetKind::Js => summary.js_count += 1,
            AssetKind::Css => summary.css_count += 1,
            AssetKind::Other => summary.other_count += 1,
        }
        summary.total_bytes += size;
    }

    Ok(summary)
}
