//! The handler interface the host manager calls for each request.

use crate::dispatch::ActionDispatcher;
use crate::protocol::{Reply, Request};
use crate::script::{ExecutionContext, ScriptEngine};
use async_trait::async_trait;
use std::fmt::Debug;

/// Handles requests for one or more actions.
///
/// Handlers never fail: every outcome, including errors, is expressed as a
/// [`Reply`].
#[async_trait]
pub trait ActionHandler: Send + Sync + Debug {
    /// Handles `req` under `ctx`.
    async fn handle(&self, ctx: &ExecutionContext, req: &Request) -> Reply;
}

#[async_trait]
impl<E: ScriptEngine> ActionHandler for ActionDispatcher<E> {
    async fn handle(&self, ctx: &ExecutionContext, req: &Request) -> Reply {
        self.dispatch(ctx, req).await
    }
}
