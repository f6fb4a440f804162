//! Base schema lookup.

use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// Project-relative locations of the base schema, in lookup order.
pub const BASE_SCHEMA_CANDIDATES: &[&str] = &[
    "vendor/shopware/core/schema.sql",
    "vendor/shopware/platform/src/Core/schema.sql",
];

/// Name of the table whose presence marks an already-initialised database.
pub const MIGRATION_TABLE: &str = "migration";

/// Return the first candidate that is a readable regular file.
pub fn locate_base_schema(project_dir: &Path, candidates: &[&str]) -> Result<PathBuf, CoreError> {
    candidates
        .iter()
        .map(|candidate| project_dir.join(candidate))
        .find(|path| path.is_file() && std::fs::File::open(path).is_ok())
        .ok_or_else(|| CoreError::SchemaNotFound {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        })
}

/// Locate and read the base schema script.
pub fn read_base_schema(project_dir: &Path) -> Result<String, CoreError> {
    let path = locate_base_schema(project_dir, BASE_SCHEMA_CANDIDATES)?;
    tracing::debug!(path = %path.display(), "Reading base schema");
    Ok(std::fs::read_to_string(path)?)
}
