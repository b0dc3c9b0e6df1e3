//! Action schema types.
//!
//! An [`ActionSchema`] declares the output fields one scripted action may
//! produce, together with their types and default values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Declared type of an output field.
///
/// Parsed leniently from the schema's `type` string; unknown hints are
/// treated as [`OutputType::Any`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    /// A string
    String,
    /// A whole number
    Integer,
    /// Any number
    Number,
    /// A floating point number
    Float,
    /// A boolean
    Boolean,
    /// A JSON object
    Hash,
    /// A JSON array
    Array,
    /// Anything
    Any,
}

impl OutputType {
    /// Maps a schema type hint onto an output type.
    #[must_use]
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "float" => Self::Float,
            "boolean" | "bool" => Self::Boolean,
            "hash" | "object" => Self::Hash,
            "array" => Self::Array,
            _ => Self::Any,
        }
    }

    /// Returns true if `value` is acceptable for this type.
    ///
    /// `null` is accepted by every type since it stands for "not set".
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (Self::Any, _) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Number | Self::Float, Value::Number(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Hash, Value::Object(_)) => true,
            (Self::Array, Value::Array(_)) => true,
            _ => false,
        }
    }
}

/// Declaration of a single output field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputField {
    /// Type hint as written in the schema
    #[serde(rename = "type", default)]
    pub type_hint: String,
    /// Value the field holds before the script writes it
    #[serde(default)]
    pub default: Value,
    /// Human readable description
    #[serde(default)]
    pub description: String,
    /// Label used when displaying the field
    #[serde(default)]
    pub display_as: String,
}

impl OutputField {
    /// Creates a field with the given type hint and a `null` default.
    #[must_use]
    pub fn new(type_hint: impl Into<String>) -> Self {
        Self {
            type_hint: type_hint.into(),
            default: Value::Null,
            description: String::new(),
            display_as: String::new(),
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the parsed output type.
    #[must_use]
    pub fn output_type(&self) -> OutputType {
        OutputType::from_hint(&self.type_hint)
    }
}

/// On-disk shape of a schema file.
///
/// Unknown keys (such as input declarations) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaFile {
    /// Action description
    #[serde(default)]
    pub description: String,
    /// Per-action timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Output declarations
    #[serde(default)]
    pub output: BTreeMap<String, OutputField>,
}

/// The output declaration of one action of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSchema {
    /// Agent name
    pub agent: String,
    /// Action name
    pub action: String,
    /// Action description
    pub description: String,
    /// Per-action timeout; the provider default applies when unset
    pub timeout: Option<Duration>,
    /// Declared outputs keyed by field name
    pub outputs: BTreeMap<String, OutputField>,
    /// File the schema was loaded from, if any
    pub path: Option<PathBuf>,
}

impl ActionSchema {
    /// Creates a schema with no outputs.
    #[must_use]
    pub fn new(agent: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            action: action.into(),
            description: String::new(),
            timeout: None,
            outputs: BTreeMap::new(),
            path: None,
        }
    }

    /// Builds a schema from a parsed schema file.
    #[must_use]
    pub fn from_file(agent: impl Into<String>, action: impl Into<String>, file: SchemaFile) -> Self {
        Self {
            agent: agent.into(),
            action: action.into(),
            description: file.description,
            timeout: file.timeout.filter(|secs| *secs > 0).map(Duration::from_secs),
            outputs: file.output,
            path: None,
        }
    }

    /// Adds an output field declaration.
    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>, field: OutputField) -> Self {
        self.outputs.insert(name.into(), field);
        self
    }

    /// Sets the action timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Records where the schema was loaded from.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Returns the declared output names in sorted order.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    /// Returns every declared output mapped to its default value.
    #[must_use]
    pub fn defaults(&self) -> Map<String, Value> {
        self.outputs
            .iter()
            .map(|(name, field)| (name.clone(), field.default.clone()))
            .collect()
    }

    /// Returns the names of outputs whose default does not match their type.
    #[must_use]
    pub fn mistyped_defaults(&self) -> Vec<&str> {
        self.outputs
            .iter()
            .filter(|(_, field)| !field.output_type().accepts(&field.default))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Errors that can occur when loading schema files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The file could not be read
    LoadFailed {
        /// Path that failed to load
        path: PathBuf,
        /// Reason for failure
        reason: String,
    },
    /// The file is not a valid schema
    InvalidFormat {
        /// Path to the invalid schema
        path: PathBuf,
        /// What was wrong with the format
        reason: String,
    },
    /// The agent or action name derived from the path is not valid
    InvalidName {
        /// Path to the schema
        path: PathBuf,
        /// Why the name was rejected
        reason: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailed { path, reason } => {
                write!(f, "failed to load schema from {}: {}", path.display(), reason)
            }
            Self::InvalidFormat { path, reason } => {
                write!(f, "invalid schema format in {}: {}", path.display(), reason)
            }
            Self::InvalidName { path, reason } => {
                write!(f, "invalid schema name for {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for SchemaError {}
