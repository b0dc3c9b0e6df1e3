//! An agent whose actions are scripts.

use super::handler::ActionHandler;
use crate::error::ProviderError;
use crate::protocol::{Reply, Request};
use crate::script::ExecutionContext;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A named set of action handlers registered as one agent.
#[derive(Debug, Clone)]
pub struct ScriptedAgent {
    name: String,
    actions: BTreeMap<String, Arc<dyn ActionHandler>>,
}

impl ScriptedAgent {
    /// Creates an agent with no actions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: BTreeMap::new(),
        }
    }

    /// Returns the agent name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `handler` for `action`.
    ///
    /// # Errors
    ///
    /// Returns an error if the action already has a handler.
    pub fn register_action(
        &mut self,
        action: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<(), ProviderError> {
        let action = action.into();
        if self.actions.contains_key(&action) {
            return Err(ProviderError::action_already_registered(&self.name, action));
        }
        self.actions.insert(action, handler);
        Ok(())
    }

    /// Returns true if `action` has a handler.
    #[must_use]
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    /// Returns the registered action names in sorted order.
    #[must_use]
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }
}

#[async_trait]
impl ActionHandler for ScriptedAgent {
    async fn handle(&self, ctx: &ExecutionContext, req: &Request) -> Reply {
        match self.actions.get(&req.action) {
            Some(handler) => handler.handle(ctx, req).await,
            None => {
                tracing::warn!(agent = %self.name, action = %req.action, "Unknown action requested");
                Reply::unknown_action(format!(
                    "unknown action {} for agent {}",
                    req.action, self.name
                ))
            }
        }
    }
}
