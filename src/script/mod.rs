//! Script loading, binding and execution.
//!
//! A dispatch reads the script through a [`ScriptSource`], builds its
//! [`Bindings`] with the [`RequestBridge`], then compiles and runs it on a
//! [`ScriptEngine`] under an [`ExecutionContext`].

mod bridge;
mod context;
mod engine;
mod reply;
mod rhai_engine;
mod source;

pub use bridge::{Bindings, RequestBridge, REPLY_BINDING, REQUEST_BINDING, RPC_BINDING};
pub use context::ExecutionContext;
pub use engine::{ScriptEngine, ScriptError, ScriptErrorKind};
pub use reply::{ReplyError, ReplyObject};
pub use rhai_engine::{RhaiEngine, RhaiScript, ScriptLimits, RHAI_EXTENSION};
pub use source::{ScriptDirectory, ScriptSource};
