//! The interpreter seam.
//!
//! The dispatcher only talks to an interpreter through [`ScriptEngine`]:
//! compile source, run it against a set of [`Bindings`], then pull the
//! reply back out. Any interpreter that can bind named values, expose
//! structural maps and stop cooperatively can sit behind it.

use super::bridge::Bindings;
use super::context::ExecutionContext;
use super::reply::ReplyObject;
use crate::error::DispatchError;
use std::fmt;
use std::time::Duration;

/// An embedded script interpreter.
///
/// Engines are shared between concurrent dispatches, so they hold
/// configuration only. All per-run interpreter state lives in
/// [`ScriptEngine::Compiled`].
pub trait ScriptEngine: Send + Sync + fmt::Debug + 'static {
    /// A compiled script together with the state of its last run.
    type Compiled: Send + 'static;

    /// File extension of scripts for this engine, without the dot.
    fn extension(&self) -> &str;

    /// Compiles script source.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptErrorKind::Compile`] if the source is not valid
    /// UTF-8 or does not parse.
    fn compile(&self, source: &[u8]) -> Result<Self::Compiled, ScriptError>;

    /// Runs a compiled script against `bindings`.
    ///
    /// The run must stop once `ctx` reports [`ExecutionContext::should_stop`].
    ///
    /// # Errors
    ///
    /// Returns a binding error if the bindings cannot be converted into
    /// interpreter values, [`ScriptErrorKind::UndeclaredOutput`] if the
    /// script wrote an undeclared reply field, [`ScriptErrorKind::Interrupted`]
    /// if the context stopped the run, and [`ScriptErrorKind::Runtime`] for
    /// anything else the script raised.
    fn run(
        &self,
        compiled: &mut Self::Compiled,
        bindings: Bindings,
        ctx: &ExecutionContext,
    ) -> Result<(), ScriptError>;

    /// Returns the reply as left by the last run.
    ///
    /// # Errors
    ///
    /// Returns a binding error if the script replaced `reply` with a value
    /// of another type.
    fn extract_reply(&self, compiled: &Self::Compiled) -> Result<ReplyObject, ScriptError>;
}

/// Error raised by a [`ScriptEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    kind: ScriptErrorKind,
}

/// Specific engine failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptErrorKind {
    /// The source did not compile
    Compile {
        /// Interpreter diagnostic
        diagnostic: String,
    },
    /// A binding could not be converted into an interpreter value
    Binding {
        /// Binding name
        binding: String,
        /// Reason for failure
        reason: String,
    },
    /// The script wrote a reply field its schema does not declare
    UndeclaredOutput {
        /// Field name
        field: String,
    },
    /// The script raised an error
    Runtime {
        /// Interpreter diagnostic
        reason: String,
    },
    /// The run was stopped by its execution context
    Interrupted {
        /// How long the run lasted
        elapsed: Duration,
    },
}

impl ScriptError {
    /// Creates a script error of the given kind.
    #[must_use]
    pub fn new(kind: ScriptErrorKind) -> Self {
        Self { kind }
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> &ScriptErrorKind {
        &self.kind
    }

    /// Creates a compile error.
    #[must_use]
    pub fn compile(diagnostic: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Compile {
            diagnostic: diagnostic.into(),
        })
    }

    /// Creates a binding error.
    #[must_use]
    pub fn binding(binding: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Binding {
            binding: binding.into(),
            reason: reason.into(),
        })
    }

    /// Creates an undeclared output error.
    #[must_use]
    pub fn undeclared_output(field: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::UndeclaredOutput {
            field: field.into(),
        })
    }

    /// Creates a runtime error.
    #[must_use]
    pub fn runtime(reason: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Runtime {
            reason: reason.into(),
        })
    }

    /// Creates an interrupted error.
    #[must_use]
    pub fn interrupted(elapsed: Duration) -> Self {
        Self::new(ScriptErrorKind::Interrupted { elapsed })
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ScriptErrorKind::Compile { diagnostic } => write!(f, "compile error: {}", diagnostic),
            ScriptErrorKind::Binding { binding, reason } => {
                write!(f, "binding '{}' failed: {}", binding, reason)
            }
            ScriptErrorKind::UndeclaredOutput { field } => {
                write!(f, "undeclared output item {}", field)
            }
            ScriptErrorKind::Runtime { reason } => write!(f, "runtime error: {}", reason),
            ScriptErrorKind::Interrupted { elapsed } => {
                write!(f, "interrupted after {}ms", elapsed.as_millis())
            }
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<ScriptError> for DispatchError {
    fn from(err: ScriptError) -> Self {
        match err.kind {
            ScriptErrorKind::Compile { diagnostic } => DispatchError::compile(diagnostic),
            ScriptErrorKind::Binding { binding, reason } => DispatchError::binding(binding, reason),
            ScriptErrorKind::UndeclaredOutput { field } => DispatchError::schema_violation(field),
            ScriptErrorKind::Runtime { reason } => DispatchError::runtime(reason),
            ScriptErrorKind::Interrupted { elapsed } => DispatchError::timeout(elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchErrorKind;

    #[test]
    fn converts_into_dispatch_taxonomy() {
        let cases = [
            (ScriptError::compile("x"), "compile_error"),
            (ScriptError::binding("rpc", "x"), "binding_error"),
            (ScriptError::undeclared_output("bogus"), "schema_violation"),
            (ScriptError::runtime("x"), "runtime_error"),
            (ScriptError::interrupted(Duration::from_millis(5)), "timeout"),
        ];

        for (err, tag) in cases {
            assert_eq!(DispatchError::from(err).tag(), tag);
        }
    }

    #[test]
    fn undeclared_output_keeps_message() {
        let err = DispatchError::from(ScriptError::undeclared_output("bogus"));
        assert_eq!(err.to_string(), "undeclared output item bogus");
        assert_eq!(
            err.kind(),
            &DispatchErrorKind::SchemaViolation {
                field: "bogus".to_string()
            }
        );
    }
}
