//! Structural validation and extraction of uploaded project archives.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive not found: {path}")]
    NotFound { path: PathBuf },
    #[error("archive is not readable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("'{name}' is not a supported archive type (expected a zip)")]
    UnsupportedType { name: String },
    #[error("archive could not be read as a zip: {0}")]
    Corrupt(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An upload source supplied by the transport layer: a readable file plus
/// the filename the caller declared for it.
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    path: PathBuf,
    declared_name: String,
}

impl ArchiveSource {
    pub fn new(path: impl Into<PathBuf>, declared_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            declared_name: declared_name.into(),
        }
    }

    /// Build a source from a local path, declaring its own filename.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let declared_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            declared_name,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }
}

/// Check that a source exists, is a readable regular file, and carries a
/// recognized archive filename. Purely structural: the archive contents
/// are not opened here.
pub fn validate(source: &ArchiveSource) -> Result<(), ArchiveError> {
    let metadata = match std::fs::metadata(source.path()) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ArchiveError::NotFound {
                path: source.path().to_path_buf(),
            })
        }
        Err(e) => {
            return Err(ArchiveError::Unreadable {
                path: source.path().to_path_buf(),
                source: e,
            })
        }
    };

    if !metadata.is_file() {
        return Err(ArchiveError::NotFound {
            path: source.path().to_path_buf(),
        });
    }

    // Confirm read permission without touching the contents.
    if let Err(e) = File::open(source.path()) {
        return Err(ArchiveError::Unreadable {
            path: source.path().to_path_buf(),
            source: e,
        });
    }

    let is_zip = mime_guess::from_path(source.declared_name())
        .first()
        .is_some_and(|mime| mime.essence_str() == "application/zip");
    if !is_zip {
        return Err(ArchiveError::UnsupportedType {
            name: source.declared_name().to_string(),
        });
    }

    Ok(())
}

/// Extract every file entry of a zip archive under `dest`, preserving the
/// entries' relative structure.
///
/// Entries whose names escape the destination (absolute paths or `..`
/// components) are skipped; symlink entries are materialized as regular
/// files, never as links.
pub fn extract(source: &ArchiveSource, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::open(source.path()).map_err(|e| ArchiveError::Unreadable {
        path: source.path().to_path_buf(),
        source: e,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;

    std::fs::create_dir_all(dest)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;

        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            tracing::debug!(
                entry = entry.name(),
                "Skipping archive entry that escapes the destination"
            );
            continue;
        };

        let target = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            std::io::copy(&mut entry, &mut out)?;
        }
    }

    Ok(())
}
