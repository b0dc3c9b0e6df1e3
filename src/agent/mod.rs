//! Host-facing agent interfaces.
//!
//! The host manager owns request routing. This module defines what it is
//! handed at registration ([`ActionHandler`], [`Connector`]) and the
//! interface it exposes ([`AgentManager`]), together with
//! [`ScriptedAgent`], which fans requests out to per-action handlers, and
//! [`LocalAgentManager`], an in-process manager.

mod connector;
mod handler;
mod manager;
mod scripted;

pub use connector::{Connector, LocalConnector};
pub use handler::ActionHandler;
pub use manager::{AgentManager, LocalAgentManager};
pub use scripted::ScriptedAgent;
