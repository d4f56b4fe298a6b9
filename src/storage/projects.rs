use chrono::Utc;
use redb::ReadableTable;
use std::path::Path;

use super::db::{Database, DatabaseError};
use super::models::ProjectRecord;
use super::tables::*;

/// Composite row key. Slugs cannot contain '/', so the separator is
/// unambiguous.
fn project_key(tenant_id: &str, slug: &str) -> String {
    format!("{tenant_id}/{slug}")
}

impl Database {
    // ========================================================================
    // Project operations
    // ========================================================================

    /// Insert a new project row.
    ///
    /// The existence check and the insert share one write transaction, so
    /// this is the authoritative uniqueness guard for (tenant, slug); any
    /// earlier lookup by the caller is only an optimization.
    pub fn insert_project(&self, project: &ProjectRecord) -> Result<(), DatabaseError> {
        debug_assert!(!project.slug.is_empty(), "project slug must not be empty");
        debug_assert!(
            !project.tenant_id.is_empty(),
            "project tenant_id must not be empty"
        );

        let key = project_key(&project.tenant_id, &project.slug);
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(PROJECTS)?;
            if table.get(key.as_str())?.is_some() {
                return Err(DatabaseError::DuplicateSlug {
                    slug: project.slug.clone(),
                });
            }
            let data = rmp_serde::to_vec_named(project)?;
            table.insert(key.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a project by slug. Returns None on miss.
    pub fn get_project(
        &self,
        tenant_id: &str,
        slug: &str,
    ) -> Result<Option<ProjectRecord>, DatabaseError> {
        let key = project_key(tenant_id, slug);
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PROJECTS)?;

        match table.get(key.as_str())? {
            Some(data) => {
                let project: ProjectRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    /// Update a project's mutable fields and refresh `updated_at`.
    ///
    /// `slug`, `tenant_id` and `created_at` are immutable; `name` and
    /// `shortcode` keep their current values when not provided. The read
    /// and the write happen in one transaction, so no reader can observe a
    /// half-updated row. Returns the updated record.
    pub fn replace_project(
        &self,
        tenant_id: &str,
        slug: &str,
        name: Option<&str>,
        shortcode: Option<&str>,
        version: &str,
        file_path: &Path,
    ) -> Result<ProjectRecord, DatabaseError> {
        let key = project_key(tenant_id, slug);
        let write_txn = self.begin_write()?;

        let updated = {
            let mut table = write_txn.open_table(PROJECTS)?;

            let mut project: ProjectRecord = match table.get(key.as_str())? {
                Some(data) => rmp_serde::from_slice(data.value())?,
                None => {
                    return Err(DatabaseError::NotFound {
                        slug: slug.to_string(),
                    })
                }
            };

            if let Some(name) = name {
                project.project_name = name.to_string();
            }
            if let Some(shortcode) = shortcode {
                project.shortcode = shortcode.to_string();
            }
            project.version = version.to_string();
            project.file_path = file_path.to_path_buf();
            project.updated_at = Utc::now();

            let data = rmp_serde::to_vec_named(&project)?;
            table.insert(key.as_str(), data.as_slice())?;
            project
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a project row, returning the removed record so the caller can
    /// clean up its asset directory.
    pub fn delete_project(
        &self,
        tenant_id: &str,
        slug: &str,
    ) -> Result<ProjectRecord, DatabaseError> {
        let key = project_key(tenant_id, slug);
        let write_txn = self.begin_write()?;

        let removed = {
            let mut table = write_txn.open_table(PROJECTS)?;
            let removed_value = table.remove(key.as_str())?;
            match removed_value {
                Some(data) => {
                    let project: ProjectRecord = rmp_serde::from_slice(data.value())?;
                    project
                }
                None => {
                    return Err(DatabaseError::NotFound {
                        slug: slug.to_string(),
                    })
                }
            }
        };

        write_txn.commit()?;
        Ok(removed)
    }

    /// List all projects for a tenant, newest first.
    pub fn list_projects(&self, tenant_id: &str) -> Result<Vec<ProjectRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PROJECTS)?;

        let mut projects = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let project: ProjectRecord = rmp_serde::from_slice(value.value())?;
            if project.tenant_id == tenant_id {
                projects.push(project);
            }
        }

        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }
}
