//! The schema-constrained reply object exposed to scripts.
//!
//! A [`ReplyObject`] holds exactly the output fields an action declares.
//! Scripts may overwrite the value of a declared field but can never add or
//! remove one: every write goes through [`ReplyObject::set`], which rejects
//! undeclared keys.

use crate::schema::ActionSchema;
use serde_json::{Map, Value};
use std::fmt;

/// Error returned when a reply write is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    /// The field is not declared in the action's schema
    UndeclaredField {
        /// Name the script tried to write
        field: String,
    },
    /// The value cannot be stored as JSON
    InvalidValue {
        /// Field being written
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndeclaredField { field } => write!(f, "undeclared output item {}", field),
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid value for output item {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ReplyError {}

/// Fixed-key map of an action's outputs.
///
/// Instances have no value equality; [`ReplyObject::is_same`] compares
/// identity. `Clone` is a deep copy.
#[derive(Debug, Clone)]
pub struct ReplyObject {
    data: Map<String, Value>,
}

impl ReplyObject {
    /// Name the type is registered under in the interpreter.
    pub const TYPE_NAME: &'static str = "reply";

    /// Creates a reply whose key set and initial values are `defaults`.
    #[must_use]
    pub fn new(defaults: Map<String, Value>) -> Self {
        Self { data: defaults }
    }

    /// Creates a reply holding every output `schema` declares, each set to
    /// its default.
    #[must_use]
    pub fn from_schema(schema: &ActionSchema) -> Self {
        Self::new(schema.defaults())
    }

    /// Reads a field. Undeclared fields read as `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Overwrites a declared field.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::UndeclaredField`] if `key` is not declared.
    /// The reply is left unchanged.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ReplyError> {
        match self.data.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ReplyError::UndeclaredField {
                field: key.to_string(),
            }),
        }
    }

    /// Declared field names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Returns true if `key` is declared.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A reply is falsy when it declares no fields.
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        self.is_empty()
    }

    /// Returns an independent copy.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Returns true if `other` is this very instance.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }

    /// The current field values.
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Consumes the reply, returning the field values.
    #[must_use]
    pub fn into_data(self) -> Map<String, Value> {
        self.data
    }
}

impl fmt::Display for ReplyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.data.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OutputField;
    use serde_json::json;

    fn install_schema() -> ActionSchema {
        ActionSchema::new("package", "install")
            .with_output("status", OutputField::new("string").with_default("unknown"))
            .with_output("version", OutputField::new("string"))
            .with_output("exitcode", OutputField::new("integer").with_default(0))
    }

    #[test]
    fn fresh_reply_holds_schema_defaults() {
        let schema = install_schema();
        let reply = ReplyObject::from_schema(&schema);

        assert_eq!(reply.len(), 3);
        assert_eq!(reply.data(), &schema.defaults());
        assert_eq!(reply.get("status"), Some(&json!("unknown")));
        assert_eq!(reply.get("version"), Some(&Value::Null));
    }

    #[test]
    fn set_declared_field() {
        let mut reply = ReplyObject::from_schema(&install_schema());

        reply.set("status", json!("ok")).unwrap();

        assert_eq!(reply.get("status"), Some(&json!("ok")));
        assert_eq!(reply.into_data()["status"], json!("ok"));
    }

    #[test]
    fn set_undeclared_field_is_rejected() {
        let mut reply = ReplyObject::from_schema(&install_schema());
        let before = reply.data().clone();

        let err = reply.set("bogus", json!(1)).unwrap_err();

        assert_eq!(
            err,
            ReplyError::UndeclaredField {
                field: "bogus".to_string()
            }
        );
        assert_eq!(err.to_string(), "undeclared output item bogus");
        assert_eq!(reply.data(), &before);
        assert!(!reply.contains("bogus"));
    }

    #[test]
    fn undeclared_read_is_absent() {
        let reply = ReplyObject::from_schema(&install_schema());
        assert!(reply.get("bogus").is_none());
    }

    #[test]
    fn keys_are_the_declared_names() {
        let reply = ReplyObject::from_schema(&install_schema());
        assert_eq!(
            reply.keys().collect::<Vec<_>>(),
            vec!["exitcode", "status", "version"]
        );
    }

    #[test]
    fn falsy_only_without_fields() {
        assert!(ReplyObject::new(Map::new()).is_falsy());
        assert!(!ReplyObject::from_schema(&install_schema()).is_falsy());
    }

    #[test]
    fn deep_copy_is_independent() {
        let original = ReplyObject::from_schema(&install_schema());
        let mut copy = original.deep_copy();

        copy.set("status", json!("changed")).unwrap();

        assert_eq!(original.get("status"), Some(&json!("unknown")));
        assert_eq!(copy.get("status"), Some(&json!("changed")));
        assert!(!original.is_same(&copy));
        assert!(original.is_same(&original));
    }

    #[test]
    fn display_is_json() {
        let reply = ReplyObject::new(
            [("status".to_string(), json!("ok"))]
                .into_iter()
                .collect(),
        );
        assert_eq!(reply.to_string(), r#"{"status":"ok"}"#);
    }
}
