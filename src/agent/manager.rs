//! Host agent manager interface and an in-process implementation.

use super::connector::Connector;
use super::handler::ActionHandler;
use crate::error::ProviderError;
use crate::protocol::{Reply, Request};
use crate::script::ExecutionContext;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The host component that owns request routing.
#[async_trait]
pub trait AgentManager: Send + Sync {
    /// Registers `handler` as agent `name`, reachable over `connector`.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager refuses the agent.
    async fn register_agent(
        &self,
        name: &str,
        handler: Arc<dyn ActionHandler>,
        connector: Arc<dyn Connector>,
    ) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone)]
struct RegisteredAgent {
    handler: Arc<dyn ActionHandler>,
    connector: Arc<dyn Connector>,
}

/// An [`AgentManager`] that routes requests in-process.
#[derive(Debug, Default)]
pub struct LocalAgentManager {
    agents: RwLock<BTreeMap<String, RegisteredAgent>>,
}

impl LocalAgentManager {
    /// Creates a manager with no agents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the registered agent names in sorted order.
    pub async fn agent_names(&self) -> Vec<String> {
        self.agents.read().await.keys().cloned().collect()
    }

    /// Returns true if an agent named `name` is registered.
    pub async fn is_registered(&self, name: &str) -> bool {
        self.agents.read().await.contains_key(name)
    }

    /// Returns the connector `name` was registered with.
    pub async fn connector(&self, name: &str) -> Option<Arc<dyn Connector>> {
        self.agents
            .read()
            .await
            .get(name)
            .map(|agent| Arc::clone(&agent.connector))
    }

    /// Routes `req` to the agent it names.
    ///
    /// An unknown agent gets an unknown action reply.
    pub async fn dispatch(&self, ctx: &ExecutionContext, req: &Request) -> Reply {
        let handler = self
            .agents
            .read()
            .await
            .get(&req.agent)
            .map(|agent| Arc::clone(&agent.handler));

        match handler {
            Some(handler) => handler.handle(ctx, req).await,
            None => {
                tracing::warn!(agent = %req.agent, "Request for unknown agent");
                Reply::unknown_action(format!("unknown agent {}", req.agent))
            }
        }
    }
}

#[async_trait]
impl AgentManager for LocalAgentManager {
    async fn register_agent(
        &self,
        name: &str,
        handler: Arc<dyn ActionHandler>,
        connector: Arc<dyn Connector>,
    ) -> Result<(), ProviderError> {
        let mut agents = self.agents.write().await;
        if agents.contains_key(name) {
            return Err(ProviderError::agent_already_registered(name));
        }

        tracing::debug!(agent = %name, connector = %connector.name(), "Registered agent");
        agents.insert(name.to_string(), RegisteredAgent { handler, connector });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::LocalConnector;
    use crate::protocol::StatusCode;
    use serde_json::{json, Map};

    #[derive(Debug)]
    struct Fixed(&'static str);

    #[async_trait]
    impl ActionHandler for Fixed {
        async fn handle(&self, _ctx: &ExecutionContext, _req: &Request) -> Reply {
            let mut data = Map::new();
            data.insert("from".to_string(), json!(self.0));
            Reply::ok(data)
        }
    }

    #[tokio::test]
    async fn routes_by_agent() {
        let manager = LocalAgentManager::new();
        let connector: Arc<dyn Connector> = Arc::new(LocalConnector::default());
        manager
            .register_agent("package", Arc::new(Fixed("package")), Arc::clone(&connector))
            .await
            .unwrap();
        manager
            .register_agent("service", Arc::new(Fixed("service")), connector)
            .await
            .unwrap();

        let req = Request::new("service", "restart", &json!({})).unwrap();
        let reply = manager.dispatch(&ExecutionContext::new(), &req).await;

        assert_eq!(reply.data["from"], json!("service"));
        assert_eq!(manager.agent_names().await, vec!["package", "service"]);
        assert_eq!(manager.connector("package").await.unwrap().name(), "local");
    }

    #[tokio::test]
    async fn unknown_agent_reply() {
        let manager = LocalAgentManager::new();
        let req = Request::new("nope", "x", &json!({})).unwrap();

        let reply = manager.dispatch(&ExecutionContext::new(), &req).await;

        assert_eq!(reply.status_code, StatusCode::UnknownAction);
        assert!(!manager.is_registered("nope").await);
    }

    #[tokio::test]
    async fn duplicate_agent_is_rejected() {
        let manager = LocalAgentManager::new();
        let connector: Arc<dyn Connector> = Arc::new(LocalConnector::default());
        manager
            .register_agent("package", Arc::new(Fixed("a")), Arc::clone(&connector))
            .await
            .unwrap();

        let err = manager
            .register_agent("package", Arc::new(Fixed("b")), connector)
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::agent_already_registered("package"));

        let req = Request::new("package", "x", &json!({})).unwrap();
        let reply = manager.dispatch(&ExecutionContext::new(), &req).await;
        assert_eq!(reply.data["from"], json!("a"));
    }
}
