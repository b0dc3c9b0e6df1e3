//! Discovers scripted actions and registers them with the host manager.

use crate::agent::{ActionHandler, AgentManager, Connector, ScriptedAgent};
use crate::config::ProviderConfig;
use crate::dispatch::ActionDispatcher;
use crate::error::ProviderError;
use crate::logging;
use crate::schema::{self, SchemaCatalog};
use crate::script::{RhaiEngine, ScriptDirectory, ScriptEngine};
use std::sync::Arc;

/// Name this provider reports itself under.
pub const PROVIDER_NAME: &str = "rhai";

/// Owns the discovered schemas and builds one [`ScriptedAgent`] per agent.
///
/// # Example
///
/// ```rust,ignore
/// use acton_script_agents::prelude::*;
///
/// let mut provider = Provider::new(config::load()?)?;
/// provider.discover();
///
/// let manager = LocalAgentManager::new();
/// let registered = provider
///     .register_all(&manager, Arc::new(LocalConnector::default()))
///     .await;
/// ```
#[derive(Debug)]
pub struct Provider<E: ScriptEngine = RhaiEngine> {
    config: ProviderConfig,
    engine: Arc<E>,
    schemas: Arc<SchemaCatalog>,
}

impl Provider<RhaiEngine> {
    /// Creates a provider running scripts on Rhai with the configured
    /// limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let engine = RhaiEngine::new().with_limits(config.limits);
        Self::with_engine(config, engine)
    }
}

impl<E: ScriptEngine> Provider<E> {
    /// Creates a provider running scripts on `engine`.
    ///
    /// Installs file logging first when `config.logging` enables it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the log
    /// directory cannot be written.
    pub fn with_engine(config: ProviderConfig, engine: E) -> Result<Self, ProviderError> {
        config.validate()?;
        logging::install(&config.logging)
            .map_err(|e| ProviderError::configuration("logging", e.to_string()))?;
        Ok(Self {
            config,
            engine: Arc::new(engine),
            schemas: Arc::new(SchemaCatalog::new()),
        })
    }

    /// Scans the configured schema directories, replacing any schemas
    /// found earlier. Returns the number of actions found.
    pub fn discover(&mut self) -> usize {
        self.schemas = Arc::new(schema::discover(&self.config.schema_dirs));
        self.schemas.len()
    }

    /// Returns the discovered schemas.
    #[must_use]
    pub fn schemas(&self) -> &SchemaCatalog {
        &self.schemas
    }

    /// Returns the discovered agent names.
    #[must_use]
    pub fn agents(&self) -> Vec<&str> {
        self.schemas.agents()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Reports the provider name and version.
    #[must_use]
    pub fn version(&self) -> String {
        format!("{} version {}", PROVIDER_NAME, env!("CARGO_PKG_VERSION"))
    }

    /// Builds a dispatcher over the discovered schemas.
    #[must_use]
    pub fn dispatcher(&self) -> ActionDispatcher<E> {
        let scripts = ScriptDirectory::new(&self.config.script_dir, self.engine.extension());
        ActionDispatcher::new(
            Arc::clone(&self.engine),
            Arc::new(scripts),
            Arc::clone(&self.schemas) as Arc<dyn schema::SchemaSource>,
        )
        .with_default_timeout(self.config.default_timeout())
    }

    /// Registers one agent per discovered agent name with `manager`.
    ///
    /// An agent the manager refuses is logged and skipped; the others still
    /// register. Returns the number of agents registered.
    pub async fn register_all(
        &self,
        manager: &dyn AgentManager,
        connector: Arc<dyn Connector>,
    ) -> usize {
        let dispatcher = Arc::new(self.dispatcher());
        let mut registered = 0;

        for name in self.schemas.agents() {
            let agent = match self.build_agent(name, &dispatcher) {
                Ok(agent) => agent,
                Err(e) => {
                    tracing::error!(agent = %name, error = %e, "Could not build scripted agent");
                    continue;
                }
            };

            tracing::debug!(
                agent = %name,
                actions = %agent.action_names().join(", "),
                "Registering scripted agent"
            );

            match manager
                .register_agent(name, Arc::new(agent), Arc::clone(&connector))
                .await
            {
                Ok(()) => registered += 1,
                Err(e) => {
                    tracing::error!(agent = %name, error = %e, "Could not register scripted agent");
                }
            }
        }

        tracing::info!(
            provider = PROVIDER_NAME,
            registered,
            discovered = self.schemas.agents().len(),
            "Scripted agents registered"
        );

        registered
    }

    fn build_agent(
        &self,
        name: &str,
        dispatcher: &Arc<ActionDispatcher<E>>,
    ) -> Result<ScriptedAgent, ProviderError> {
        let mut agent = ScriptedAgent::new(name);
        for schema in self.schemas.actions(name) {
            let handler = Arc::clone(dispatcher) as Arc<dyn ActionHandler>;
            agent.register_action(schema.action.clone(), handler)?;
        }
        Ok(agent)
    }
}
