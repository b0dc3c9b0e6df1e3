//! Inbound RPC request.

use crate::types::RequestId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use std::fmt;

/// Default time-to-live, in seconds, for requests built in-process.
pub const DEFAULT_TTL: i64 = 60;

/// Node selection filter attached to a request.
///
/// The bridge never evaluates filters; they are carried so that scripts see
/// the complete request through the `rpc` binding. `fact` and `compound`
/// entries are kept as raw JSON so any filter shape survives untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    /// Fact filters (`{"fact": .., "operator": .., "value": ..}`)
    pub fact: Vec<Value>,
    /// Configuration management class filters
    pub cf_class: Vec<String>,
    /// Agent filters
    pub agent: Vec<String>,
    /// Identity filters
    pub identity: Vec<String>,
    /// Compound filter expressions
    pub compound: Vec<Value>,
}

impl Filter {
    /// Creates an empty filter matching every node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no filter of any kind is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fact.is_empty()
            && self.cf_class.is_empty()
            && self.agent.is_empty()
            && self.identity.is_empty()
            && self.compound.is_empty()
    }
}

/// An RPC request addressed to one action of one agent.
///
/// `data` holds the caller's payload exactly as it arrived on the wire.
/// It is decoded into the `request` binding once per dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Target agent name
    pub agent: String,
    /// Target action name
    pub action: String,
    /// Identity of the calling user
    #[serde(rename = "callerid")]
    pub caller_id: String,
    /// Collective the request was published to
    pub collective: String,
    /// Raw JSON payload
    pub data: Box<RawValue>,
    /// Node selection filter
    #[serde(default)]
    pub filter: Filter,
    /// Request identifier chosen by the sender
    #[serde(rename = "requestid")]
    pub request_id: String,
    /// Identity of the sending node
    #[serde(rename = "senderid")]
    pub sender_id: String,
    /// Time-to-live in seconds
    pub ttl: i64,
    /// Time the request was created
    pub time: DateTime<Utc>,
}

/// Error returned when a request payload is not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadError {
    reason: String,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid request payload: {}", self.reason)
    }
}

impl std::error::Error for PayloadError {}

impl Request {
    /// Builds a request for `agent`/`action` carrying `data` as payload.
    ///
    /// A fresh [`RequestId`] is minted, the time is set to now and the TTL to
    /// [`DEFAULT_TTL`].
    ///
    /// # Errors
    ///
    /// Returns an error if `data` cannot be serialized to JSON.
    pub fn new(
        agent: impl Into<String>,
        action: impl Into<String>,
        data: &impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            agent: agent.into(),
            action: action.into(),
            caller_id: String::new(),
            collective: String::new(),
            data: serde_json::value::to_raw_value(data)?,
            filter: Filter::new(),
            request_id: RequestId::new().to_string(),
            sender_id: String::new(),
            ttl: DEFAULT_TTL,
            time: Utc::now(),
        })
    }

    /// Sets the caller identity.
    #[must_use]
    pub fn with_caller(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = caller_id.into();
        self
    }

    /// Sets the collective.
    #[must_use]
    pub fn with_collective(mut self, collective: impl Into<String>) -> Self {
        self.collective = collective.into();
        self
    }

    /// Sets the sender identity.
    #[must_use]
    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = sender_id.into();
        self
    }

    /// Sets the time-to-live in seconds.
    #[must_use]
    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the node filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Returns the raw JSON text of the payload.
    #[must_use]
    pub fn payload(&self) -> &str {
        self.data.get()
    }

    /// Decodes the payload into a JSON object.
    ///
    /// A `null` payload decodes to an empty map.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] if the payload is malformed or is not an
    /// object.
    pub fn decode_payload(&self) -> Result<Map<String, Value>, PayloadError> {
        let value: Value = serde_json::from_str(self.data.get()).map_err(|e| PayloadError {
            reason: e.to_string(),
        })?;

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(PayloadError {
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_request(data: &str) -> Request {
        let wire = format!(
            r#"{{
                "agent": "package",
                "action": "install",
                "callerid": "choria=rip.mcollective",
                "collective": "mcollective",
                "data": {data},
                "filter": {{"fact": [], "cf_class": [], "agent": ["package"], "identity": [], "compound": []}},
                "requestid": "123",
                "senderid": "test.example.net",
                "ttl": 60,
                "time": "2024-05-01T10:00:00Z"
            }}"#
        );
        serde_json::from_str(&wire).unwrap()
    }

    #[test]
    fn deserializes_wire_shape() {
        let req = wire_request(r#"{"package": "zsh"}"#);

        assert_eq!(req.agent, "package");
        assert_eq!(req.action, "install");
        assert_eq!(req.caller_id, "choria=rip.mcollective");
        assert_eq!(req.request_id, "123");
        assert_eq!(req.ttl, 60);
        assert_eq!(req.filter.agent, vec!["package".to_string()]);
    }

    #[test]
    fn serializes_wire_field_names() {
        let req = wire_request("{}");
        let value = serde_json::to_value(&req).unwrap();

        for field in [
            "agent",
            "action",
            "callerid",
            "collective",
            "data",
            "filter",
            "requestid",
            "senderid",
            "ttl",
            "time",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn payload_is_embedded_as_json() {
        let req = wire_request(r#"{"package": "zsh", "version": 5}"#);
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["data"], json!({"package": "zsh", "version": 5}));
    }

    #[test]
    fn decode_payload_object() {
        let req = wire_request(r#"{"hello": "world"}"#);
        let map = req.decode_payload().unwrap();
        assert_eq!(map.get("hello"), Some(&json!("world")));
    }

    #[test]
    fn decode_payload_null_is_empty() {
        let req = wire_request("null");
        assert!(req.decode_payload().unwrap().is_empty());
    }

    #[test]
    fn decode_payload_rejects_non_objects() {
        let req = wire_request("[1, 2, 3]");
        let err = req.decode_payload().unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn new_builds_request_with_minted_id() {
        let req = Request::new("package", "install", &json!({"package": "zsh"}))
            .unwrap()
            .with_caller("choria=test")
            .with_ttl(30);

        assert!(req.request_id.starts_with("req_"));
        assert_eq!(req.caller_id, "choria=test");
        assert_eq!(req.ttl, 30);
        assert_eq!(req.payload(), r#"{"package":"zsh"}"#);
    }

    #[test]
    fn empty_filter() {
        assert!(Filter::new().is_empty());
        let filter = Filter {
            identity: vec!["node1".to_string()],
            ..Filter::default()
        };
        assert!(!filter.is_empty());
    }
}
