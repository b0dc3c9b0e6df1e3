//! Builds the values a script sees.

use super::reply::ReplyObject;
use crate::error::DispatchError;
use crate::protocol::Request;
use crate::schema::{ActionSchema, SchemaSource};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Name of the binding holding the whole request.
pub const RPC_BINDING: &str = "rpc";
/// Name of the binding holding the decoded payload.
pub const REQUEST_BINDING: &str = "request";
/// Name of the binding holding the reply object.
pub const REPLY_BINDING: &str = "reply";

/// The three values injected into one script run.
///
/// Built fresh for every dispatch and consumed by the run.
#[derive(Debug, Clone)]
pub struct Bindings {
    /// Structural copy of the whole request
    pub rpc: Value,
    /// The decoded request payload
    pub request: Map<String, Value>,
    /// The schema-constrained reply
    pub reply: ReplyObject,
}

/// Builds [`Bindings`] from a request and the schema catalog.
pub struct RequestBridge;

impl RequestBridge {
    /// Builds the `rpc`, `request` and `reply` bindings in that order.
    ///
    /// # Errors
    ///
    /// Returns a binding error if the request cannot be projected or its
    /// payload is not a JSON object, and a schema lookup failure if no
    /// schema is declared for the request's agent and action.
    pub fn build(req: &Request, schemas: &dyn SchemaSource) -> Result<Bindings, DispatchError> {
        Self::prepare(req, schemas).map(|(_, bindings)| bindings)
    }

    /// Like [`build`](Self::build), also returning the schema the reply
    /// was shaped from.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn prepare(
        req: &Request,
        schemas: &dyn SchemaSource,
    ) -> Result<(Arc<ActionSchema>, Bindings), DispatchError> {
        let rpc = serde_json::to_value(req)
            .map_err(|e| DispatchError::binding(RPC_BINDING, e.to_string()))?;

        let request = req
            .decode_payload()
            .map_err(|e| DispatchError::binding(REQUEST_BINDING, e.to_string()))?;

        let schema = schemas
            .lookup(&req.agent, &req.action)
            .ok_or_else(|| DispatchError::schema_lookup_failure(&req.agent, &req.action))?;

        let bindings = Bindings {
            rpc,
            request,
            reply: ReplyObject::from_schema(&schema),
        };
        Ok((schema, bindings))
    }
}
