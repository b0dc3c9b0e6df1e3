//! Script resolution.

use crate::error::DispatchError;
use crate::types::validate_name;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Resolves an agent and action name to script source.
///
/// Implementations must not cache contents: every call reads the script
/// afresh so edits on disk apply to the next dispatch.
#[async_trait]
pub trait ScriptSource: Send + Sync + std::fmt::Debug {
    /// Returns the script bytes for `agent`/`action`.
    ///
    /// # Errors
    ///
    /// Returns a script unavailable [`DispatchError`] if the script is
    /// missing or unreadable.
    async fn resolve(&self, agent: &str, action: &str) -> Result<Vec<u8>, DispatchError>;
}

/// Scripts stored on disk as `<root>/<agent>/<action>.<extension>`.
#[derive(Debug, Clone)]
pub struct ScriptDirectory {
    root: PathBuf,
    extension: String,
}

impl ScriptDirectory {
    /// Creates a source reading scripts with `extension` below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path a script for `agent`/`action` is read from.
    #[must_use]
    pub fn script_path(&self, agent: &str, action: &str) -> PathBuf {
        self.root
            .join(agent)
            .join(format!("{}.{}", action, self.extension))
    }
}

#[async_trait]
impl ScriptSource for ScriptDirectory {
    async fn resolve(&self, agent: &str, action: &str) -> Result<Vec<u8>, DispatchError> {
        let path = self.script_path(agent, action);

        validate_name(agent)
            .map_err(|e| DispatchError::script_unavailable(&path, format!("agent {e}")))?;
        validate_name(action)
            .map_err(|e| DispatchError::script_unavailable(&path, format!("action {e}")))?;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DispatchError::script_unavailable(&path, e.to_string()))?;

        tracing::trace!(path = %path.display(), bytes = bytes.len(), "Read action script");
        Ok(bytes)
    }
}
