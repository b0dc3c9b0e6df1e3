//! Error types for scripted action dispatch and the provider.
//!
//! Each error type implements Display, Debug, Clone, PartialEq, Eq, and std::error::Error.
//!
//! No external error crates (anyhow, thiserror, eyre) are used.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A failure while dispatching one scripted action.
///
/// Dispatch errors never reach the host manager: the dispatcher turns every
/// one of them into an aborted reply whose status message is this error's
/// `Display` output.
///
/// This type uses Box<DispatchErrorKind> to keep the error size small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError {
    kind: Box<DispatchErrorKind>,
}

/// Specific dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchErrorKind {
    /// The script file is missing or unreadable
    ScriptUnavailable {
        /// Path that was tried
        path: PathBuf,
        /// Why it could not be read
        reason: String,
    },
    /// No schema is declared for the agent/action pair
    SchemaLookupFailure {
        /// Agent name
        agent: String,
        /// Action name
        action: String,
    },
    /// A binding could not be built
    BindingError {
        /// Name of the binding (`rpc`, `request` or `reply`)
        binding: String,
        /// Reason for failure
        reason: String,
    },
    /// The script does not compile
    CompileError {
        /// Interpreter diagnostic
        diagnostic: String,
    },
    /// The script wrote an output that the schema does not declare
    SchemaViolation {
        /// The undeclared field name
        field: String,
    },
    /// The script failed while running
    RuntimeError {
        /// Interpreter diagnostic
        reason: String,
    },
    /// The deadline passed or the request was cancelled
    Timeout {
        /// How long the dispatch ran before it was abandoned
        elapsed: Duration,
    },
}

impl DispatchError {
    /// Creates a new DispatchError with the given kind.
    #[must_use]
    pub fn new(kind: DispatchErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    /// Returns a reference to the error kind.
    #[must_use]
    pub fn kind(&self) -> &DispatchErrorKind {
        &self.kind
    }

    /// Creates a script unavailable error.
    #[must_use]
    pub fn script_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::ScriptUnavailable {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// Creates a schema lookup failure.
    #[must_use]
    pub fn schema_lookup_failure(agent: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::SchemaLookupFailure {
            agent: agent.into(),
            action: action.into(),
        })
    }

    /// Creates a binding error.
    #[must_use]
    pub fn binding(binding: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::BindingError {
            binding: binding.into(),
            reason: reason.into(),
        })
    }

    /// Creates a compile error.
    #[must_use]
    pub fn compile(diagnostic: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::CompileError {
            diagnostic: diagnostic.into(),
        })
    }

    /// Creates a schema violation error.
    #[must_use]
    pub fn schema_violation(field: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::SchemaViolation {
            field: field.into(),
        })
    }

    /// Creates a runtime error.
    #[must_use]
    pub fn runtime(reason: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::RuntimeError {
            reason: reason.into(),
        })
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(elapsed: Duration) -> Self {
        Self::new(DispatchErrorKind::Timeout { elapsed })
    }

    /// Short tag naming the failure class, used as a structured log field.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self.kind.as_ref() {
            DispatchErrorKind::ScriptUnavailable { .. } => "script_unavailable",
            DispatchErrorKind::SchemaLookupFailure { .. } => "schema_lookup_failure",
            DispatchErrorKind::BindingError { .. } => "binding_error",
            DispatchErrorKind::CompileError { .. } => "compile_error",
            DispatchErrorKind::SchemaViolation { .. } => "schema_violation",
            DispatchErrorKind::RuntimeError { .. } => "runtime_error",
            DispatchErrorKind::Timeout { .. } => "timeout",
        }
    }

    /// Returns true if the script was abandoned at its deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(*self.kind, DispatchErrorKind::Timeout { .. })
    }

    /// Returns true if the script wrote an undeclared output.
    #[must_use]
    pub fn is_schema_violation(&self) -> bool {
        matches!(*self.kind, DispatchErrorKind::SchemaViolation { .. })
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_ref() {
            DispatchErrorKind::ScriptUnavailable { path, reason } => {
                write!(
                    f,
                    "could not read action script {}: {}",
                    path.display(),
                    reason
                )
            }
            DispatchErrorKind::SchemaLookupFailure { agent, action } => {
                write!(
                    f,
                    "no schema declared for action {}#{}; add {}/{}.json to a schema directory",
                    agent, action, agent, action
                )
            }
            DispatchErrorKind::BindingError { binding, reason } => {
                write!(f, "could not set {} data: {}", binding, reason)
            }
            DispatchErrorKind::CompileError { diagnostic } => {
                write!(f, "could not compile action: {}", diagnostic)
            }
            DispatchErrorKind::SchemaViolation { field } => {
                write!(f, "undeclared output item {}", field)
            }
            DispatchErrorKind::RuntimeError { reason } => {
                write!(f, "could not run: {}", reason)
            }
            DispatchErrorKind::Timeout { elapsed } => {
                write!(
                    f,
                    "action timed out after {}ms; the deadline passed or the request was cancelled",
                    elapsed.as_millis()
                )
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// Errors raised while configuring the provider or registering agents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    /// The specific error that occurred
    pub kind: ProviderErrorKind,
}

/// Specific provider error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Configuration is missing or invalid
    Configuration {
        /// The configuration field involved
        field: String,
        /// Why it was rejected
        reason: String,
    },
    /// An agent with this name is already registered
    AgentAlreadyRegistered {
        /// Agent name
        agent: String,
    },
    /// An agent already has a handler for this action
    ActionAlreadyRegistered {
        /// Agent name
        agent: String,
        /// Action name
        action: String,
    },
    /// The host manager refused the agent
    RegistrationFailed {
        /// Agent name
        agent: String,
        /// Reason given by the host manager
        reason: String,
    },
}

impl ProviderError {
    /// Creates a new ProviderError with the given kind.
    #[must_use]
    pub fn new(kind: ProviderErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Configuration {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Creates an agent already registered error.
    #[must_use]
    pub fn agent_already_registered(agent: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::AgentAlreadyRegistered {
            agent: agent.into(),
        })
    }

    /// Creates an action already registered error.
    #[must_use]
    pub fn action_already_registered(agent: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ActionAlreadyRegistered {
            agent: agent.into(),
            action: action.into(),
        })
    }

    /// Creates a registration failure.
    #[must_use]
    pub fn registration_failed(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RegistrationFailed {
            agent: agent.into(),
            reason: reason.into(),
        })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, ProviderErrorKind::Configuration { .. })
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ProviderErrorKind::Configuration { field, reason } => {
                write!(f, "invalid configuration for '{}': {}", field, reason)
            }
            ProviderErrorKind::AgentAlreadyRegistered { agent } => {
                write!(
                    f,
                    "agent '{}' is already registered; agent names must be unique",
                    agent
                )
            }
            ProviderErrorKind::ActionAlreadyRegistered { agent, action } => {
                write!(
                    f,
                    "agent '{}' already has a handler for action '{}'",
                    agent, action
                )
            }
            ProviderErrorKind::RegistrationFailed { agent, reason } => {
                write!(f, "could not register agent '{}': {}", agent, reason)
            }
        }
    }
}

impl std::error::Error for ProviderError {}
