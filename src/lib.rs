//! # Acton Script Agents
//!
//! Implements RPC actions as external scripts instead of compiled handlers.
//! Each action is a [Rhai](https://rhai.rs) script whose output is
//! constrained to the fields its JSON schema declares.
//!
//! ## Architecture
//!
//! - **Schema**: per-action output declarations discovered on disk
//! - **Script**: script loading, the `rpc`/`request`/`reply` bindings and the
//!   interpreter behind the [`ScriptEngine`](script::ScriptEngine) trait
//! - **Dispatch**: runs one script per request under a deadline and turns
//!   every failure into an aborted reply
//! - **Agent**: the handler and manager interfaces the host sees
//! - **Provider**: discovers schemas and registers one agent per name
//!
//! ## Layout on disk
//!
//! ```text
//! /etc/acton/scripts/
//! └── package/
//!     ├── install.json     # {"output": {"status": {"type": "string", "default": "unknown"}}}
//!     └── install.rhai     # reply["status"] = "ok";
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use acton_script_agents::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ProviderError> {
//!     let config = config::load()?;
//!     let mut provider = Provider::new(config)?;
//!     provider.discover();
//!
//!     let manager = LocalAgentManager::new();
//!     provider
//!         .register_all(&manager, Arc::new(LocalConnector::default()))
//!         .await;
//!
//!     let req = Request::new("package", "install", &serde_json::json!({"package": "zsh"}))
//!         .expect("payload serializes");
//!     let reply = manager.dispatch(&ExecutionContext::new(), &req).await;
//!     println!("{}: {:?}", reply.status_message, reply.data);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod provider;
pub mod schema;
pub mod script;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::agent::{
        ActionHandler, AgentManager, Connector, LocalAgentManager, LocalConnector, ScriptedAgent,
    };
    pub use crate::config::{self, ProviderConfig};
    pub use crate::dispatch::{ActionDispatcher, DispatchState};
    pub use crate::error::{DispatchError, DispatchErrorKind, ProviderError, ProviderErrorKind};
    pub use crate::logging::{LogLevel, LogRotation, LoggingConfig};
    pub use crate::protocol::{Filter, Reply, Request, StatusCode};
    pub use crate::provider::Provider;
    pub use crate::schema::{ActionSchema, OutputField, SchemaCatalog, SchemaSource};
    pub use crate::script::{
        ExecutionContext, ReplyObject, RhaiEngine, ScriptDirectory, ScriptEngine, ScriptLimits,
        ScriptSource,
    };
    pub use crate::types::RequestId;

    pub use std::sync::Arc;
}
