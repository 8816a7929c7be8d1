//! The ambient global scope
//!
//! One QuickJS runtime and context per process, owned by a dedicated worker
//! thread because rquickjs contexts cannot move between threads. Callers on
//! any thread send requests over a channel and block until the worker
//! replies, so requests run one at a time in arrival order.
//!
//! The scope is created once (explicitly with [`AmbientScope::initialize`] or
//! lazily on first use) and is never reset. Everything evaluated in it shares
//! the same globals.

use crate::config::VmConfig;
use crate::error::{Result, Thrown, VmError};
use crate::value::{self, ScriptValue};
use once_cell::sync::OnceCell;
use rquickjs::context::EvalOptions;
use rquickjs::{CatchResultExt, CaughtError, Context, Ctx, Object, Runtime};
use std::collections::BTreeMap;
use std::sync::mpsc;

type Reply<T> = mpsc::SyncSender<Result<T>>;

/// Requests handled by the worker thread
enum ScopeRequest {
    Evaluate {
        source: String,
        reply: Reply<ScriptValue>,
    },
    UserGlobals {
        reply: Reply<BTreeMap<String, serde_json::Value>>,
    },
}

/// Process-global ambient scope
static AMBIENT_SCOPE: OnceCell<AmbientScope> = OnceCell::new();

/// Handle to the process-wide global execution environment
pub struct AmbientScope {
    sender: mpsc::Sender<ScopeRequest>,
    config: VmConfig,
}

impl AmbientScope {
    /// Initialize the ambient scope with an explicit configuration
    ///
    /// Call once at process start. Fails with
    /// [`VmError::AlreadyInitialized`] if the scope already exists, including
    /// when it was lazily created by an earlier [`AmbientScope::global`].
    pub fn initialize(config: VmConfig) -> Result<&'static AmbientScope> {
        if AMBIENT_SCOPE.get().is_some() {
            return Err(VmError::AlreadyInitialized);
        }
        let scope = Self::spawn(config)?;
        AMBIENT_SCOPE
            .set(scope)
            .map_err(|_| VmError::AlreadyInitialized)?;
        AMBIENT_SCOPE
            .get()
            .ok_or_else(|| VmError::runtime("ambient scope vanished after initialization"))
    }

    /// Get the ambient scope, creating it from [`VmConfig::load`] on first use
    pub fn global() -> Result<&'static AmbientScope> {
        AMBIENT_SCOPE.get_or_try_init(|| Self::spawn(VmConfig::load()?))
    }

    /// Whether the ambient scope has been created yet
    pub fn is_initialized() -> bool {
        AMBIENT_SCOPE.get().is_some()
    }

    /// The configuration the scope was created with
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Evaluate source text as a global script
    ///
    /// Runs in sloppy mode, exactly like top-level code: `var` and function
    /// declarations become properties of the global object, `let`/`const`
    /// become global lexical bindings, and the completion value of the last
    /// statement is returned. Pending promise jobs are drained before
    /// returning.
    pub fn evaluate(&self, source: &str) -> Result<ScriptValue> {
        let source = source.to_string();
        self.send_request(|reply| ScopeRequest::Evaluate { source, reply })
    }

    /// Snapshot of user-defined global properties as JSON
    ///
    /// Skips builtins and functions. Top-level `let`/`const` bindings are not
    /// properties of the global object and are not included.
    pub fn user_globals(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        self.send_request(|reply| ScopeRequest::UserGlobals { reply })
    }

    /// Send a request to the worker and wait for the response
    fn send_request<T>(&self, make_request: impl FnOnce(Reply<T>) -> ScopeRequest) -> Result<T> {
        let (tx, rx) = mpsc::sync_channel(1);
        let request = make_request(tx);

        self.sender
            .send(request)
            .map_err(|_| VmError::runtime("ambient scope thread has stopped"))?;

        rx.recv()
            .map_err(|_| VmError::runtime("ambient scope thread did not respond"))?
    }

    /// Spawn the worker thread and wait for the engine to come up
    fn spawn(config: VmConfig) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<ScopeRequest>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);
        let worker_config = config.clone();

        std::thread::Builder::new()
            .name("scriptvm-ambient".to_string())
            .spawn(move || {
                let (rt, ctx) = match create_engine(&worker_config) {
                    Ok(engine) => {
                        let _ = ready_tx.send(Ok(()));
                        engine
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                worker_loop(&rt, &ctx, rx);
            })
            .map_err(|e| VmError::runtime(format!("Failed to spawn ambient scope thread: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| VmError::runtime("ambient scope thread exited during startup"))??;

        tracing::debug!("Ambient scope started with {:?}", config);

        Ok(Self {
            sender: tx,
            config,
        })
    }
}

/// Create the runtime and context, applying limits and injected globals
fn create_engine(config: &VmConfig) -> Result<(Runtime, Context)> {
    let rt = Runtime::new()
        .map_err(|e| VmError::runtime(format!("Failed to create JS runtime: {}", e)))?;
    if let Some(limit) = config.memory_limit {
        rt.set_memory_limit(limit);
    }
    if let Some(size) = config.max_stack_size {
        rt.set_max_stack_size(size);
    }
    if let Some(threshold) = config.gc_threshold {
        rt.set_gc_threshold(threshold);
    }

    let ctx = Context::full(&rt)
        .map_err(|e| VmError::runtime(format!("Failed to create JS context: {}", e)))?;

    if config.expose_env {
        ctx.with(|ctx| inject_env(&ctx))?;
    }

    Ok((rt, ctx))
}

/// Expose the process environment as `env` and `process.env`
fn inject_env(ctx: &Ctx<'_>) -> Result<()> {
    let to_err = |e: rquickjs::Error| VmError::runtime(format!("Failed to inject env: {}", e));
    let globals = ctx.globals();

    let env_obj = Object::new(ctx.clone()).map_err(to_err)?;
    let process_env_obj = Object::new(ctx.clone()).map_err(to_err)?;
    for (key, value) in std::env::vars() {
        env_obj.set(key.as_str(), value.as_str()).map_err(to_err)?;
        process_env_obj
            .set(key.as_str(), value.as_str())
            .map_err(to_err)?;
    }
    globals.set("env", env_obj).map_err(to_err)?;

    let process_obj = Object::new(ctx.clone()).map_err(to_err)?;
    process_obj.set("env", process_env_obj).map_err(to_err)?;
    globals.set("process", process_obj).map_err(to_err)?;

    Ok(())
}

/// Process requests until the scope handle is dropped
fn worker_loop(rt: &Runtime, ctx: &Context, rx: mpsc::Receiver<ScopeRequest>) {
    while let Ok(request) = rx.recv() {
        match request {
            ScopeRequest::Evaluate { source, reply } => {
                tracing::debug!("Evaluating {} bytes in ambient scope", source.len());
                let result = ctx.with(|ctx| evaluate_global(&ctx, &source));
                drain_pending_jobs(rt);
                let _ = reply.send(result);
            }
            ScopeRequest::UserGlobals { reply } => {
                let _ = reply.send(ctx.with(|ctx| collect_user_globals(&ctx)));
            }
        }
    }

    tracing::debug!("Ambient scope thread shutting down");
}

fn evaluate_global<'js>(ctx: &Ctx<'js>, source: &str) -> Result<ScriptValue> {
    let mut options = EvalOptions::default();
    options.global = true;
    options.strict = false;

    let result: rquickjs::Value = ctx
        .eval_with_options(source.as_bytes(), options)
        .catch(ctx)
        .map_err(|e| caught_to_error(ctx, e))?;

    value::from_js(ctx, result)
}

/// Carry whatever the script threw back to the caller
fn caught_to_error<'js>(ctx: &Ctx<'js>, caught: CaughtError<'js>) -> VmError {
    match caught {
        CaughtError::Exception(ex) => {
            let name = ex.get::<_, Option<String>>("name").ok().flatten();
            let message = ex.message().unwrap_or_default();
            let stack = ex.stack();
            let mut value = match value::from_js(ctx, ex.into_value()) {
                Ok(value) => value,
                Err(e) => return e,
            };
            if let ScriptValue::Object(serde_json::Value::Object(map)) = &mut value {
                map.insert("name".to_string(), name.clone().into());
                map.insert("message".to_string(), message.clone().into());
                if let Some(stack) = &stack {
                    map.insert("stack".to_string(), stack.clone().into());
                }
            }
            Thrown {
                name,
                message,
                stack,
                value,
            }
            .into()
        }
        CaughtError::Value(v) => match value::from_js(ctx, v) {
            Ok(value) => Thrown {
                name: None,
                message: value.to_string(),
                stack: None,
                value,
            }
            .into(),
            Err(e) => e,
        },
        CaughtError::Error(e) => VmError::runtime(e.to_string()),
    }
}

fn collect_user_globals(ctx: &Ctx<'_>) -> Result<BTreeMap<String, serde_json::Value>> {
    let globals = ctx.globals();
    let mut result = BTreeMap::new();
    let key_names: Vec<String> = globals.keys::<String>().flatten().collect();
    for key in key_names {
        if value::is_builtin(&key) {
            continue;
        }
        let val: std::result::Result<rquickjs::Value, _> = globals.get(key.as_str());
        if let Ok(js_value) = val {
            if js_value.is_function() || js_value.is_constructor() {
                continue;
            }
            let json = match value::from_js(ctx, js_value) {
                Ok(script_value) => script_value.to_json(),
                Err(e) => {
                    tracing::warn!("Global '{}' could not be converted: {}", key, e);
                    serde_json::Value::Null
                }
            };
            result.insert(key, json);
        }
    }
    Ok(result)
}

/// Drain all pending microtasks/Promise jobs from the runtime
fn drain_pending_jobs(rt: &Runtime) {
    loop {
        match rt.execute_pending_job() {
            Ok(false) => break,
            Ok(true) => continue,
            Err(e) => {
                tracing::warn!("error executing pending JS job: {:?}", e);
                break;
            }
        }
    }
}
