//! Runs one scripted action per request.

use super::state::DispatchState;
use crate::error::DispatchError;
use crate::protocol::{Reply, Request};
use crate::schema::SchemaSource;
use crate::script::{ExecutionContext, RequestBridge, RhaiEngine, ScriptEngine, ScriptSource};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Timeout applied when neither the schema nor the configuration sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives script resolution, binding, compilation and execution for a
/// request and turns the outcome into a [`Reply`].
///
/// The dispatcher holds only shared, read-only state. Every call to
/// [`dispatch`](Self::dispatch) builds its own bindings and its own
/// interpreter, so concurrent dispatches never observe each other.
#[derive(Debug)]
pub struct ActionDispatcher<E: ScriptEngine = RhaiEngine> {
    engine: Arc<E>,
    scripts: Arc<dyn ScriptSource>,
    schemas: Arc<dyn SchemaSource>,
    default_timeout: Duration,
}

impl<E: ScriptEngine> ActionDispatcher<E> {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        engine: Arc<E>,
        scripts: Arc<dyn ScriptSource>,
        schemas: Arc<dyn SchemaSource>,
    ) -> Self {
        Self {
            engine,
            scripts,
            schemas,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the timeout used for actions whose schema declares none.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Returns the default timeout.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Dispatches `req`.
    ///
    /// Never fails: any error is logged and returned as an aborted reply
    /// whose status message describes it.
    pub async fn dispatch(&self, ctx: &ExecutionContext, req: &Request) -> Reply {
        let trace = DispatchTrace::new(req);
        let started = Instant::now();

        match self.execute(ctx, req, &trace, started).await {
            Ok(data) => {
                trace.enter(DispatchState::Completed);
                tracing::info!(
                    agent = %req.agent,
                    action = %req.action,
                    request_id = %req.request_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Scripted action completed"
                );
                Reply::ok(data)
            }
            Err(err) => {
                let stage = trace.state();
                trace.enter(DispatchState::Aborted);
                tracing::error!(
                    agent = %req.agent,
                    action = %req.action,
                    request_id = %req.request_id,
                    stage = %stage,
                    error = err.tag(),
                    "{}",
                    err
                );
                Reply::aborted(err.to_string())
            }
        }
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        req: &Request,
        trace: &DispatchTrace,
        started: Instant,
    ) -> Result<Map<String, Value>, DispatchError> {
        let source = self.scripts.resolve(&req.agent, &req.action).await?;
        trace.enter(DispatchState::Loaded);

        let (schema, bindings) = RequestBridge::prepare(req, self.schemas.as_ref())?;

        let timeout = schema.timeout.unwrap_or(self.default_timeout);
        let run_ctx = ctx.child().within(timeout);

        let engine = Arc::clone(&self.engine);
        let script_ctx = run_ctx.clone();
        let script_trace = trace.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let mut compiled = engine.compile(&source)?;
            script_trace.enter(DispatchState::Compiled);

            script_trace.enter(DispatchState::Running);
            engine.run(&mut compiled, bindings, &script_ctx)?;

            Ok::<_, DispatchError>(engine.extract_reply(&compiled)?)
        });

        tokio::select! {
            biased;
            joined = handle => match joined {
                Ok(result) => result.map(|reply| reply.into_data()),
                Err(e) if e.is_panic() => Err(DispatchError::runtime("script thread panicked")),
                Err(e) => Err(DispatchError::runtime(format!("script thread failed: {e}"))),
            },
            () = run_ctx.done() => {
                run_ctx.cancel();
                Err(DispatchError::timeout(started.elapsed()))
            }
        }
    }
}

/// Tracks and logs the state of one dispatch.
///
/// Clones share the current state so the blocking script thread can
/// advance it. Transitions [`DispatchState::can_transition_to`] rejects
/// are logged and ignored; once the dispatch is terminal, late updates
/// from an abandoned script thread are dropped.
#[derive(Debug, Clone)]
struct DispatchTrace {
    agent: String,
    action: String,
    request_id: String,
    state: Arc<Mutex<DispatchState>>,
}

impl DispatchTrace {
    fn new(req: &Request) -> Self {
        Self {
            agent: req.agent.clone(),
            action: req.action.clone(),
            request_id: req.request_id.clone(),
            state: Arc::new(Mutex::new(DispatchState::Pending)),
        }
    }

    fn state(&self) -> DispatchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves to `next`, returning false if the transition was refused.
    fn enter(&self, next: DispatchState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let current = *state;

        if current.is_terminal() {
            tracing::debug!(
                agent = %self.agent,
                action = %self.action,
                request_id = %self.request_id,
                state = %current,
                ignored = %next,
                "Dispatch already finished"
            );
            return false;
        }

        if !current.can_transition_to(next) {
            tracing::warn!(
                agent = %self.agent,
                action = %self.action,
                request_id = %self.request_id,
                from = %current,
                to = %next,
                "Illegal dispatch state transition"
            );
            return false;
        }

        *state = next;
        tracing::debug!(
            agent = %self.agent,
            action = %self.action,
            request_id = %self.request_id,
            state = %next,
            "Dispatch state changed"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::StatusCode;
    use crate::schema::{ActionSchema, OutputField, SchemaCatalog};
    use crate::script::ScriptDirectory;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_script(root: &Path, agent: &str, action: &str, body: &str) {
        let dir = root.join(agent);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{action}.rhai")), body).unwrap();
    }

    fn dispatcher(root: &Path) -> ActionDispatcher {
        let mut catalog = SchemaCatalog::new();
        catalog.insert(
            ActionSchema::new("package", "install")
                .with_output("status", OutputField::new("string").with_default("unknown")),
        );
        catalog.insert(
            ActionSchema::new("package", "slow")
                .with_output("status", OutputField::new("string"))
                .with_timeout(Duration::from_millis(100)),
        );
        catalog.insert(
            ActionSchema::new("package", "forever")
                .with_output("status", OutputField::new("string"))
                .with_timeout(Duration::from_secs(u64::MAX)),
        );

        ActionDispatcher::new(
            Arc::new(RhaiEngine::new()),
            Arc::new(ScriptDirectory::new(root, "rhai")),
            Arc::new(catalog),
        )
    }

    fn request(action: &str) -> Request {
        Request::new("package", action, &json!({"package": "zsh"})).unwrap()
    }

    #[tokio::test]
    async fn completed_dispatch_returns_reply_data() {
        let dir = TempDir::new().unwrap();
        write_script(
            dir.path(),
            "package",
            "install",
            r#"reply["status"] = "installed " + request["package"];"#,
        );

        let reply = dispatcher(dir.path())
            .dispatch(&ExecutionContext::new(), &request("install"))
            .await;

        assert_eq!(reply.status_code, StatusCode::Ok);
        assert_eq!(reply.data["status"], json!("installed zsh"));
    }

    #[tokio::test]
    async fn missing_script_aborts() {
        let dir = TempDir::new().unwrap();

        let reply = dispatcher(dir.path())
            .dispatch(&ExecutionContext::new(), &request("install"))
            .await;

        assert_eq!(reply.status_code, StatusCode::Aborted);
        assert!(reply.status_message.contains("install.rhai"));
    }

    #[tokio::test]
    async fn missing_schema_aborts() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "package", "remove", "1");

        let reply = dispatcher(dir.path())
            .dispatch(&ExecutionContext::new(), &request("remove"))
            .await;

        assert_eq!(reply.status_code, StatusCode::Aborted);
        assert!(reply.status_message.contains("no schema"));
    }

    #[tokio::test]
    async fn compile_error_aborts() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "package", "install", "reply[ = ;");

        let reply = dispatcher(dir.path())
            .dispatch(&ExecutionContext::new(), &request("install"))
            .await;

        assert_eq!(reply.status_code, StatusCode::Aborted);
        assert!(reply.status_message.starts_with("could not compile action"));
    }

    #[tokio::test]
    async fn schema_timeout_bounds_the_run() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "package", "slow", "loop { }");
        let started = Instant::now();

        let reply = dispatcher(dir.path())
            .dispatch(&ExecutionContext::new(), &request("slow"))
            .await;

        assert_eq!(reply.status_code, StatusCode::Aborted);
        assert!(reply.status_message.contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn caller_deadline_wins_when_earlier() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "package", "install", "loop { }");
        let started = Instant::now();

        let reply = dispatcher(dir.path())
            .dispatch(
                &ExecutionContext::with_timeout(Duration::from_millis(50)),
                &request("install"),
            )
            .await;

        assert_eq!(reply.status_code, StatusCode::Aborted);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn cancelled_context_aborts() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "package", "install", "loop { }");
        let ctx = ExecutionContext::new();
        ctx.cancel();

        let reply = dispatcher(dir.path())
            .dispatch(&ctx, &request("install"))
            .await;

        assert_eq!(reply.status_code, StatusCode::Aborted);
        assert!(reply.status_message.contains("timed out"));
    }

    #[tokio::test]
    async fn unrepresentable_schema_timeout_runs_without_deadline() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "package", "forever", r#"reply["status"] = "done";"#);

        let reply = dispatcher(dir.path())
            .dispatch(&ExecutionContext::new(), &request("forever"))
            .await;

        assert_eq!(reply.status_code, StatusCode::Ok);
        assert_eq!(reply.data["status"], json!("done"));
    }

    #[tokio::test]
    async fn caller_deadline_applies_over_unrepresentable_schema_timeout() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "package", "forever", "loop { }");
        let started = Instant::now();

        let reply = dispatcher(dir.path())
            .dispatch(
                &ExecutionContext::with_timeout(Duration::from_millis(50)),
                &request("forever"),
            )
            .await;

        assert_eq!(reply.status_code, StatusCode::Aborted);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn trace_follows_the_forward_path() {
        let trace = DispatchTrace::new(&request("install"));
        assert_eq!(trace.state(), DispatchState::Pending);

        for state in [
            DispatchState::Loaded,
            DispatchState::Compiled,
            DispatchState::Running,
            DispatchState::Completed,
        ] {
            assert!(trace.enter(state));
            assert_eq!(trace.state(), state);
        }
    }

    #[test]
    fn trace_refuses_skipped_states() {
        let trace = DispatchTrace::new(&request("install"));
        assert!(trace.enter(DispatchState::Loaded));

        assert!(!trace.enter(DispatchState::Running));
        assert_eq!(trace.state(), DispatchState::Loaded);

        assert!(trace.enter(DispatchState::Aborted));
    }

    #[test]
    fn trace_ignores_updates_after_finishing() {
        let trace = DispatchTrace::new(&request("install"));
        let script_side = trace.clone();
        assert!(trace.enter(DispatchState::Aborted));

        assert!(!script_side.enter(DispatchState::Loaded));
        assert!(!script_side.enter(DispatchState::Completed));
        assert_eq!(trace.state(), DispatchState::Aborted);
    }

    #[tokio::test]
    async fn default_timeout_is_configurable() {
        let dir = TempDir::new().unwrap();
        let dispatcher =
            dispatcher(dir.path()).with_default_timeout(Duration::from_millis(250));
        assert_eq!(dispatcher.default_timeout(), Duration::from_millis(250));
    }
}
