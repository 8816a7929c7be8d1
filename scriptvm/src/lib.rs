//! `vm`-style script execution for a process-global JavaScript scope
//!
//! This crate wraps source text in a [`Script`] and runs it in the single
//! ambient global scope of the process, using rquickjs (QuickJS-NG). Code run
//! this way behaves like top-level code: it sees every global, its top-level
//! declarations become globals, and the value of its last expression is
//! returned.
//!
//! # Architecture
//!
//! - **One Ambient Scope**: a single runtime and context per process, never reset
//! - **Dedicated Worker Thread**: the thread that owns the engine runs every request
//! - **Synchronous API**: callers block until their code has run
//! - **No Isolation**: context creation and isolated runs return
//!   [`VmError::NotImplemented`] naming the operation
//!
//! # Example
//!
//! ```rust,no_run
//! use scriptvm::{create_script, run_in_this_context, RunOptions, ScriptOptions, ScriptValue};
//!
//! let script = create_script("var answer = 40 + 2; answer", ScriptOptions::default());
//! let result = script.run_in_this_context(RunOptions::default()).unwrap();
//! assert_eq!(result, ScriptValue::Number(42.0));
//!
//! // Globals declared above are visible to later code
//! let result = run_in_this_context("answer + 1", RunOptions::default()).unwrap();
//! assert_eq!(result, ScriptValue::Number(43.0));
//! ```

pub mod config;
pub mod error;
pub mod options;
pub mod scope;
pub mod script;
pub mod source;
pub mod value;

pub use config::VmConfig;
pub use error::{Result, Thrown, VmError, VmOperation};
pub use options::{
    CompileFunctionOptions, ContextOptions, MeasureMemoryOptions, RunOptions, ScriptOptions,
};
pub use scope::AmbientScope;
pub use script::Script;
pub use source::SourceText;
pub use value::ScriptValue;

use script::unsupported;

/// Not supported: contexts cannot be created
pub fn create_context(
    _object: &serde_json::Value,
    _options: ContextOptions,
) -> Result<serde_json::Value> {
    Err(unsupported(VmOperation::CreateContext))
}

/// Create a script from source text
pub fn create_script(code: impl Into<SourceText>, options: ScriptOptions) -> Script {
    Script::new(code, options)
}

/// Not supported: code cannot run in a given context
pub fn run_in_context(
    _code: impl Into<SourceText>,
    _context: &serde_json::Value,
    _options: RunOptions,
) -> Result<ScriptValue> {
    Err(unsupported(VmOperation::RunInContext))
}

/// Not supported: code cannot run in a fresh context
pub fn run_in_new_context(
    _code: impl Into<SourceText>,
    _context: Option<&serde_json::Value>,
    _options: RunOptions,
) -> Result<ScriptValue> {
    Err(unsupported(VmOperation::RunInNewContext))
}

/// Run source text in the ambient global scope
///
/// Shorthand for `create_script(code, ..).run_in_this_context(options)`.
pub fn run_in_this_context(code: impl Into<SourceText>, options: RunOptions) -> Result<ScriptValue> {
    create_script(code, ScriptOptions::default()).run_in_this_context(options)
}

/// Not supported: there are no contexts to recognize
pub fn is_context(_value: &serde_json::Value) -> Result<bool> {
    Err(unsupported(VmOperation::IsContext))
}

/// Not supported
pub fn compile_function(
    _code: impl Into<SourceText>,
    _params: &[&str],
    _options: CompileFunctionOptions,
) -> Result<ScriptValue> {
    Err(unsupported(VmOperation::CompileFunction))
}

/// Not supported
pub fn measure_memory(_options: MeasureMemoryOptions) -> Result<serde_json::Value> {
    Err(unsupported(VmOperation::MeasureMemory))
}
