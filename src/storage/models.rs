use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project metadata row stored in redb.
///
/// The row is the source of truth for `file_path`: a directory with no
/// matching row is cleanup debt, a row pointing at a missing directory is
/// reported as zero assets rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Scoping key. Every query and the slug uniqueness constraint are
    /// scoped by it.
    pub tenant_id: String,
    /// Unique per tenant, immutable once created. Pattern `^[a-z0-9-]+$`.
    pub slug: String,
    /// Display name; defaults to the slug at upload time.
    pub project_name: String,
    /// Embed identifier used by content referencing the project. Not unique.
    pub shortcode: String,
    /// Free-form version string set at upload time.
    pub version: String,
    /// Absolute path of the extracted asset tree. Unique per accepted
    /// upload, never reused across replaces.
    pub file_path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
