//! embed-registry - a command-line registry for embeddable static web
//! asset bundles
//!
//! Projects (zipped single-page apps) are uploaded, listed, inspected and
//! deleted through the CLI:
//! - Archive validation and extraction with staging-directory commit
//! - Extension-based asset classification (JS/CSS/other)
//! - redb embedded database for metadata (ACID, MVCC, crash-safe)
//! - Tenant-scoped slug uniqueness enforced by the store

pub mod archive;
pub mod assets;
pub mod config;
pub mod registry;
pub mod storage;
