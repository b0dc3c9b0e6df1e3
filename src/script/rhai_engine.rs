//! The [Rhai](https://rhai.rs) script engine.
//!
//! Scripts see three variables:
//!
//! - `rpc`: the whole request as an object map (constant)
//! - `request`: the decoded payload as an object map (constant)
//! - `reply`: the reply object; `reply["field"] = value` writes a declared
//!   output and fails the action for an undeclared one
//!
//! ```rhai
//! if request["package"] == "" {
//!     throw "package is required";
//! }
//! reply["status"] = `installed ${request["package"]}`;
//! ```

use super::bridge::{Bindings, REPLY_BINDING, REQUEST_BINDING, RPC_BINDING};
use super::context::ExecutionContext;
use super::engine::{ScriptEngine, ScriptError};
use super::reply::{ReplyError, ReplyObject};
use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Position, Scope, AST, INT};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::time::Instant;

/// File extension of Rhai scripts.
pub const RHAI_EXTENSION: &str = "rhai";

/// Resource limits applied to every script run.
///
/// A value of `0` leaves the corresponding limit unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptLimits {
    /// Maximum number of operations per run
    pub max_operations: u64,
    /// Maximum depth of nested function calls
    pub max_call_levels: usize,
    /// Maximum expression nesting depth at global level
    pub max_expr_depth: usize,
    /// Maximum expression nesting depth inside functions
    pub max_function_expr_depth: usize,
    /// Maximum length of a string in bytes
    pub max_string_size: usize,
    /// Maximum number of array elements
    pub max_array_size: usize,
    /// Maximum number of object map entries
    pub max_map_size: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 0,
            max_call_levels: 64,
            max_expr_depth: 64,
            max_function_expr_depth: 32,
            max_string_size: 1024 * 1024,
            max_array_size: 10_000,
            max_map_size: 10_000,
        }
    }
}

impl ScriptLimits {
    /// Limits with every setting disabled.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_operations: 0,
            max_call_levels: 0,
            max_expr_depth: 0,
            max_function_expr_depth: 0,
            max_string_size: 0,
            max_array_size: 0,
            max_map_size: 0,
        }
    }

    /// Sets the operation limit.
    #[must_use]
    pub fn with_max_operations(mut self, max_operations: u64) -> Self {
        self.max_operations = max_operations;
        self
    }

    fn apply(&self, engine: &mut Engine) {
        engine.set_max_operations(self.max_operations);
        if self.max_call_levels > 0 {
            engine.set_max_call_levels(self.max_call_levels);
        }
        engine.set_max_expr_depths(self.max_expr_depth, self.max_function_expr_depth);
        engine.set_max_string_size(self.max_string_size);
        engine.set_max_array_size(self.max_array_size);
        engine.set_max_map_size(self.max_map_size);
    }
}

/// A compiled Rhai script and the scope of its last run.
#[derive(Debug)]
pub struct RhaiScript {
    ast: AST,
    scope: Scope<'static>,
}

/// Raised from the reply setter to abort a script that writes an
/// undeclared field.
#[derive(Debug, Clone)]
struct UndeclaredOutput {
    field: String,
}

/// [`ScriptEngine`] backed by Rhai.
///
/// A fresh interpreter is built for every compile and every run, so no
/// interpreter state is ever shared between dispatches.
#[derive(Debug, Clone, Default)]
pub struct RhaiEngine {
    limits: ScriptLimits,
}

impl RhaiEngine {
    /// Creates an engine with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resource limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ScriptLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the resource limits.
    #[must_use]
    pub fn limits(&self) -> &ScriptLimits {
        &self.limits
    }

    fn interpreter(&self) -> Engine {
        let mut engine = Engine::new();
        self.limits.apply(&mut engine);

        engine.on_print(|text| tracing::info!(target: "acton_script_agents::script", "{}", text));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(
                target: "acton_script_agents::script",
                source = source.unwrap_or_default(),
                position = %pos,
                "{}",
                text
            );
        });

        register_reply_api(&mut engine);
        engine
    }
}

impl ScriptEngine for RhaiEngine {
    type Compiled = RhaiScript;

    fn extension(&self) -> &str {
        RHAI_EXTENSION
    }

    fn compile(&self, source: &[u8]) -> Result<RhaiScript, ScriptError> {
        let text = std::str::from_utf8(source)
            .map_err(|e| ScriptError::compile(format!("script is not valid UTF-8: {e}")))?;

        let ast = self
            .interpreter()
            .compile(text)
            .map_err(|e| ScriptError::compile(e.to_string()))?;

        Ok(RhaiScript {
            ast,
            scope: Scope::new(),
        })
    }

    fn run(
        &self,
        compiled: &mut RhaiScript,
        bindings: Bindings,
        ctx: &ExecutionContext,
    ) -> Result<(), ScriptError> {
        if let Some(number) = bindings.reply.data().values().find_map(oversized_integer) {
            return Err(out_of_range(REPLY_BINDING, number));
        }
        let request = script_value(&Value::Object(bindings.request), REQUEST_BINDING)?;
        let rpc = script_value(&bindings.rpc, RPC_BINDING)?;

        let mut scope = Scope::new();
        scope.push_constant_dynamic(RPC_BINDING, rpc);
        scope.push_constant_dynamic(REQUEST_BINDING, request);
        scope.push(REPLY_BINDING, bindings.reply);

        let mut engine = self.interpreter();
        let watch = ctx.clone();
        engine.on_progress(move |_| watch.should_stop().then_some(Dynamic::UNIT));

        let started = Instant::now();
        let result = engine.run_ast_with_scope(&mut scope, &compiled.ast);
        compiled.scope = scope;

        result.map_err(|err| classify(&err, started))
    }

    fn extract_reply(&self, compiled: &RhaiScript) -> Result<ReplyObject, ScriptError> {
        compiled
            .scope
            .get_value::<ReplyObject>(REPLY_BINDING)
            .ok_or_else(|| {
                ScriptError::binding(
                    REPLY_BINDING,
                    "the script replaced the reply object; write fields with reply[\"name\"] = value",
                )
            })
    }
}

fn register_reply_api(engine: &mut Engine) {
    engine.register_type_with_name::<ReplyObject>(ReplyObject::TYPE_NAME);

    engine.register_indexer_get(
        |reply: &mut ReplyObject, key: ImmutableString| -> Result<Dynamic, Box<EvalAltResult>> {
            match reply.get(&key) {
                Some(value) => to_dynamic(value),
                None => Ok(Dynamic::UNIT),
            }
        },
    );

    engine.register_indexer_set(
        |reply: &mut ReplyObject,
         key: ImmutableString,
         value: Dynamic|
         -> Result<(), Box<EvalAltResult>> {
            let value: Value = from_dynamic(&value).map_err(|e| {
                reply_error(ReplyError::InvalidValue {
                    field: key.to_string(),
                    reason: e.to_string(),
                })
            })?;
            reply.set(&key, value).map_err(reply_error)
        },
    );

    engine.register_fn("len", |reply: &mut ReplyObject| {
        INT::try_from(reply.len()).unwrap_or(INT::MAX)
    });
    engine.register_fn("is_empty", |reply: &mut ReplyObject| reply.is_falsy());
    engine.register_fn("contains", |reply: &mut ReplyObject, key: ImmutableString| {
        reply.contains(&key)
    });
    engine.register_fn("keys", |reply: &mut ReplyObject| -> Array {
        reply.keys().map(|key| Dynamic::from(key.to_string())).collect()
    });
    engine.register_fn("to_string", |reply: &mut ReplyObject| reply.to_string());
    engine.register_fn("to_debug", |reply: &mut ReplyObject| format!("reply {reply}"));

    engine.register_fn("==", |_: ReplyObject, _: Dynamic| false);
    engine.register_fn("!=", |_: ReplyObject, _: Dynamic| true);
}

/// Converts a binding into a script value.
///
/// Script integers are `i64`; a JSON integer above `i64::MAX` would come
/// back as a float, so it is refused instead.
fn script_value(value: &Value, binding: &str) -> Result<Dynamic, ScriptError> {
    if let Some(number) = oversized_integer(value) {
        return Err(out_of_range(binding, number));
    }
    to_dynamic(value).map_err(|e| ScriptError::binding(binding, e.to_string()))
}

fn oversized_integer(value: &Value) -> Option<&Number> {
    match value {
        Value::Number(number) if number.is_u64() && !number.is_i64() => Some(number),
        Value::Array(items) => items.iter().find_map(oversized_integer),
        Value::Object(map) => map.values().find_map(oversized_integer),
        _ => None,
    }
}

fn out_of_range(binding: &str, number: &Number) -> ScriptError {
    ScriptError::binding(
        binding,
        format!(
            "integer {number} is outside the script integer range {}..={}",
            INT::MIN,
            INT::MAX
        ),
    )
}

fn reply_error(err: ReplyError) -> Box<EvalAltResult> {
    let payload = match err {
        ReplyError::UndeclaredField { field } => Dynamic::from(UndeclaredOutput { field }),
        invalid @ ReplyError::InvalidValue { .. } => Dynamic::from(invalid.to_string()),
    };
    Box::new(EvalAltResult::ErrorRuntime(payload, Position::NONE))
}

fn classify(err: &EvalAltResult, started: Instant) -> ScriptError {
    match root_cause(err) {
        EvalAltResult::ErrorTerminated(_, _) => ScriptError::interrupted(started.elapsed()),
        EvalAltResult::ErrorRuntime(value, _) => match value.clone().try_cast::<UndeclaredOutput>() {
            Some(undeclared) => ScriptError::undeclared_output(undeclared.field),
            None => ScriptError::runtime(err.to_string()),
        },
        _ => ScriptError::runtime(err.to_string()),
    }
}

/// Unwraps errors raised inside script functions and modules.
fn root_cause(err: &EvalAltResult) -> &EvalAltResult {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _)
        | EvalAltResult::ErrorInModule(_, inner, _) => root_cause(inner),
        other => other,
    }
}
