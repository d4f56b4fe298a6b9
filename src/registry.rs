//! The project lifecycle manager: upload (create-or-replace), delete,
//! info and list, with staging/commit ordering that keeps the metadata
//! store and the on-disk asset trees consistent.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::archive::{self, ArchiveError, ArchiveSource};
use crate::assets::{self, AssetError, AssetSummary};
use crate::config::Config;
use crate::storage::models::ProjectRecord;
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid slug '{0}': slugs may contain only lowercase letters, digits, and hyphens")]
    InvalidSlug(String),
    #[error("project '{0}' already exists (pass force to replace it)")]
    AlreadyExists(String),
    #[error("project '{0}' not found")]
    NotFound(String),
    #[error("archive contains no files")]
    EmptyArchive,
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error("storage error: {0}")]
    Storage(#[from] DatabaseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A non-fatal cleanup failure attached to an otherwise successful
/// operation. The metadata row is authoritative, so a stale directory is
/// cleanup debt rather than an error.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to remove stale directory {}: {}",
            self.path.display(),
            self.reason
        )
    }
}

#[derive(Debug)]
pub struct UploadRequest {
    pub slug: String,
    /// Display name; defaults to the slug.
    pub name: Option<String>,
    /// Embed identifier; defaults to the slug.
    pub shortcode: Option<String>,
    pub version: String,
    pub source: ArchiveSource,
    /// Replace an existing project under the same slug.
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub project: ProjectRecord,
    pub assets: AssetSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<CleanupWarning>,
}

#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub project: ProjectRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<CleanupWarning>,
}

/// A project row combined with a freshly computed asset summary.
#[derive(Debug, Serialize)]
pub struct ProjectInfo {
    pub project: ProjectRecord,
    pub assets: AssetSummary,
}

/// Check the `^[a-z0-9-]+$` slug pattern.
pub fn validate_slug(slug: &str) -> Result<(), RegistryError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidSlug(slug.to_string()))
    }
}

/// A staging directory that is removed on drop unless the upload commits.
/// This makes rollback automatic on every pre-commit failure path,
/// including cancellation.
struct StagedTree {
    path: PathBuf,
    keep: bool,
}

impl StagedTree {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The staged tree has been moved to its final home; stop tracking it.
    fn keep(mut self) {
        self.keep = true;
    }
}

impl Drop for StagedTree {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staging directory");
            }
        }
    }
}

/// The project registry. All operations are scoped to the configured
/// tenant; consistency between the store and the filesystem is this
/// type's responsibility.
pub struct Registry {
    tenant_id: String,
    projects_root: PathBuf,
    db: Database,
}

impl Registry {
    /// Create a registry rooted at the configured projects directory,
    /// creating it if needed.
    pub fn new(config: &Config, db: Database) -> Result<Self, RegistryError> {
        std::fs::create_dir_all(&config.projects_dir)?;
        let projects_root = std::fs::canonicalize(&config.projects_dir)?;
        Ok(Self {
            tenant_id: config.tenant_id.clone(),
            projects_root,
            db,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Upload a project archive, creating a new project or replacing an
    /// existing one when `force` is set.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, RegistryError> {
        validate_slug(&request.slug)?;
        archive::validate(&request.source)?;

        let existing = self.db.get_project(&self.tenant_id, &request.slug)?;
        if existing.is_some() && !request.force {
            return Err(RegistryError::AlreadyExists(request.slug.clone()));
        }
        // Captured before commit and never re-resolved afterward: a
        // concurrent replacement's directory must never be deleted by this
        // upload, only the tree this request observed.
        let old_path = existing.as_ref().map(|p| p.file_path.clone());

        // Extract into a fresh staging tree, never on top of an existing
        // directory. Any failure from here until commit drops the guard
        // and removes the staged tree.
        let staged = StagedTree::new(self.staging_dir());
        archive::extract(&request.source, staged.path())?;

        let summary = assets::classify(staged.path())?;
        if summary.file_count() == 0 {
            return Err(RegistryError::EmptyArchive);
        }

        let final_path = self.committed_dir(&request.slug);
        let now = Utc::now();

        let outcome = match existing {
            None => {
                let record = ProjectRecord {
                    tenant_id: self.tenant_id.clone(),
                    slug: request.slug.clone(),
                    project_name: request.name.unwrap_or_else(|| request.slug.clone()),
                    shortcode: request.shortcode.unwrap_or_else(|| request.slug.clone()),
                    version: request.version,
                    file_path: final_path.clone(),
                    created_at: now,
                    updated_at: now,
                };

                // The insert is the authoritative uniqueness guard: a
                // concurrent upload of the same slug loses here and backs
                // out without touching any existing directory.
                match self.db.insert_project(&record) {
                    Ok(()) => {}
                    Err(DatabaseError::DuplicateSlug { slug }) => {
                        return Err(RegistryError::AlreadyExists(slug));
                    }
                    Err(e) => return Err(e.into()),
                }

                if let Err(e) = tokio::fs::rename(staged.path(), &final_path).await {
                    // No row may outlive its directory.
                    if let Err(rollback) = self.db.delete_project(&self.tenant_id, &record.slug) {
                        tracing::error!(slug = %record.slug, error = %rollback, "Failed to roll back row after move failure");
                    }
                    return Err(e.into());
                }
                staged.keep();

                tracing::debug!(slug = %record.slug, path = %final_path.display(), "Created project");
                UploadOutcome {
                    project: record,
                    assets: summary,
                    warning: None,
                }
            }
            Some(_) => {
                // The new tree gets its own directory, so the move cannot
                // disturb the currently committed one.
                tokio::fs::rename(staged.path(), &final_path).await?;
                staged.keep();

                let record = match self.db.replace_project(
                    &self.tenant_id,
                    &request.slug,
                    request.name.as_deref(),
                    request.shortcode.as_deref(),
                    &request.version,
                    &final_path,
                ) {
                    Ok(record) => record,
                    Err(DatabaseError::NotFound { slug }) => {
                        // The row vanished between lookup and commit;
                        // withdraw the new tree and report the miss.
                        let _ = tokio::fs::remove_dir_all(&final_path).await;
                        return Err(RegistryError::NotFound(slug));
                    }
                    Err(e) => return Err(e.into()),
                };

                let warning = match old_path {
                    Some(old) => self.remove_tree(&old).await,
                    None => None,
                };

                tracing::debug!(slug = %record.slug, path = %final_path.display(), "Replaced project");
                UploadOutcome {
                    project: record,
                    assets: summary,
                    warning,
                }
            }
        };

        Ok(outcome)
    }

    /// Delete a project: the row first, then the asset directory
    /// best-effort.
    pub async fn delete(&self, slug: &str) -> Result<DeleteOutcome, RegistryError> {
        let removed = match self.db.delete_project(&self.tenant_id, slug) {
            Ok(record) => record,
            Err(DatabaseError::NotFound { slug }) => {
                return Err(RegistryError::NotFound(slug));
            }
            Err(e) => return Err(e.into()),
        };

        let warning = self.remove_tree(&removed.file_path).await;

        tracing::debug!(slug = %slug, "Deleted project");
        Ok(DeleteOutcome {
            project: removed,
            warning,
        })
    }

    /// Look up a project and compute a fresh asset summary for it.
    ///
    /// A missing or unreadable asset directory reports zero assets rather
    /// than failing: the row may legitimately outlive cleanup issues.
    pub fn info(&self, slug: &str) -> Result<ProjectInfo, RegistryError> {
        let project = self
            .db
            .get_project(&self.tenant_id, slug)?
            .ok_or_else(|| RegistryError::NotFound(slug.to_string()))?;

        let assets = match assets::classify(&project.file_path) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "Asset directory unavailable; reporting zero assets");
                AssetSummary::default()
            }
        };

        Ok(ProjectInfo { project, assets })
    }

    /// List the tenant's projects, newest first.
    pub fn list(&self) -> Result<Vec<ProjectRecord>, RegistryError> {
        Ok(self.db.list_projects(&self.tenant_id)?)
    }

    fn staging_dir(&self) -> PathBuf {
        self.projects_root
            .join(".staging")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Directory a committed upload lives in. Unique per upload so
    /// concurrent replacers can only ever remove the tree they observed.
    fn committed_dir(&self, slug: &str) -> PathBuf {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        self.projects_root.join(format!("{slug}-{}", &nonce[..8]))
    }

    async fn remove_tree(&self, path: &Path) -> Option<CleanupWarning> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => None,
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove asset directory");
                Some(CleanupWarning {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
