//! Schema discovery on disk.
//!
//! Schemas live at `<dir>/<agent>/<action>.json`. Discovery is best effort:
//! anything that cannot be loaded is logged and skipped so one bad file
//! never hides the others.

use super::catalog::SchemaCatalog;
use super::types::{ActionSchema, SchemaError, SchemaFile};
use crate::types::validate_name;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// File extension of schema files.
pub const SCHEMA_EXTENSION: &str = "json";

/// Loads a single schema file.
///
/// The agent name is taken from the parent directory and the action name
/// from the file stem.
///
/// # Errors
///
/// Returns a [`SchemaError`] if the names are invalid, the file cannot be
/// read, or its contents are not a valid schema.
pub fn load_schema_file(path: &Path) -> Result<ActionSchema, SchemaError> {
    let (agent, action) = names_from_path(path)?;

    let contents = std::fs::read_to_string(path).map_err(|e| SchemaError::LoadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let file: SchemaFile =
        serde_json::from_str(&contents).map_err(|e| SchemaError::InvalidFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok(ActionSchema::from_file(agent, action, file).with_path(path))
}

/// Scans `dirs` for schema files and collects them into a catalog.
///
/// Missing directories, unreadable or malformed files, invalid names and
/// duplicate declarations are logged and skipped. When two directories
/// declare the same action the first one wins.
#[must_use]
pub fn discover(dirs: &[PathBuf]) -> SchemaCatalog {
    let mut catalog = SchemaCatalog::new();

    for dir in dirs {
        if !dir.is_dir() {
            tracing::warn!(dir = %dir.display(), "Schema directory not found, skipping");
            continue;
        }

        let walker = WalkDir::new(dir)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Failed to read schema directory entry");
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file()
                || !path.extension().is_some_and(|ext| ext == SCHEMA_EXTENSION)
            {
                continue;
            }

            match load_schema_file(path) {
                Ok(schema) => add_schema(&mut catalog, schema),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to load schema");
                }
            }
        }
    }

    tracing::info!(
        agents = catalog.agents().len(),
        actions = catalog.len(),
        "Schema discovery complete"
    );

    catalog
}

fn add_schema(catalog: &mut SchemaCatalog, schema: ActionSchema) {
    for field in schema.mistyped_defaults() {
        tracing::warn!(
            agent = %schema.agent,
            action = %schema.action,
            field = %field,
            "Output default does not match its declared type"
        );
    }

    let agent = schema.agent.clone();
    let action = schema.action.clone();
    let path = schema.path.clone();

    if catalog.insert(schema) {
        tracing::debug!(agent = %agent, action = %action, "Loaded action schema");
    } else {
        tracing::warn!(
            agent = %agent,
            action = %action,
            path = ?path,
            "Duplicate action schema ignored"
        );
    }
}

fn names_from_path(path: &Path) -> Result<(String, String), SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidName {
        path: path.to_path_buf(),
        reason,
    };

    let action = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| invalid("file name is not valid UTF-8".to_string()))?;

    let agent = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|s| s.to_str())
        .ok_or_else(|| invalid("schema must live in an agent directory".to_string()))?;

    validate_name(agent).map_err(|e| invalid(format!("agent {e}")))?;
    validate_name(action).map_err(|e| invalid(format!("action {e}")))?;

    Ok((agent.to_string(), action.to_string()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
