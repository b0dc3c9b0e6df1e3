//! Connector handle passed through at registration.

use std::fmt::Debug;

/// The host's connection to the messaging middleware.
///
/// Scripted agents never use the connector themselves; it is handed to the
/// host manager alongside each agent so the host can wire replies back.
pub trait Connector: Send + Sync + Debug {
    /// Name identifying the connection, used in logs.
    fn name(&self) -> &str;
}

/// A connector for in-process use and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConnector {
    name: String,
}

impl LocalConnector {
    /// Creates a connector named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LocalConnector {
    fn default() -> Self {
        Self::new("local")
    }
}

impl Connector for LocalConnector {
    fn name(&self) -> &str {
        &self.name
    }
}
