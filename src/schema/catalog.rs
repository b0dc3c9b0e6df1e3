//! Schema lookup.

use super::types::ActionSchema;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Read access to action schemas by agent and action name.
///
/// Implementations are shared across concurrent dispatches and must be
/// safe for concurrent reads.
pub trait SchemaSource: Send + Sync + Debug {
    /// Returns the schema for `agent`/`action`, if one is known.
    fn lookup(&self, agent: &str, action: &str) -> Option<Arc<ActionSchema>>;
}

/// Immutable-after-discovery collection of action schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    agents: BTreeMap<String, BTreeMap<String, Arc<ActionSchema>>>,
}

impl SchemaCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema.
    ///
    /// Returns `false` and keeps the existing entry if the agent already
    /// declares this action.
    pub fn insert(&mut self, schema: ActionSchema) -> bool {
        let actions = self.agents.entry(schema.agent.clone()).or_default();
        if actions.contains_key(&schema.action) {
            return false;
        }
        actions.insert(schema.action.clone(), Arc::new(schema));
        true
    }

    /// Returns the number of schemas across all agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.values().map(BTreeMap::len).sum()
    }

    /// Returns true if no schemas are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Returns the agent names in sorted order.
    #[must_use]
    pub fn agents(&self) -> Vec<&str> {
        self.agents.keys().map(String::as_str).collect()
    }

    /// Returns the schemas declared for `agent`, sorted by action name.
    #[must_use]
    pub fn actions(&self, agent: &str) -> Vec<Arc<ActionSchema>> {
        self.agents
            .get(agent)
            .map(|actions| actions.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Iterates over every schema, grouped by agent.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ActionSchema>> {
        self.agents.values().flat_map(BTreeMap::values)
    }
}

impl SchemaSource for SchemaCatalog {
    fn lookup(&self, agent: &str, action: &str) -> Option<Arc<ActionSchema>> {
        self.agents.get(agent)?.get(action).cloned()
    }
}
