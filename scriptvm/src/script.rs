//! The script wrapper

use crate::error::{Result, VmError, VmOperation};
use crate::options::{RunOptions, ScriptOptions};
use crate::scope::AmbientScope;
use crate::source::SourceText;
use crate::value::ScriptValue;

/// A unit of source text that can be run in the ambient global scope
///
/// The text is captured at construction and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Script {
    code: String,
}

impl Script {
    /// Create a script from source text
    ///
    /// Non-text values are stored as their string conversion, so
    /// `Script::new(5, ..)` holds `"5"`. Options are accepted but unused.
    pub fn new(code: impl Into<SourceText>, options: ScriptOptions) -> Self {
        tracing::trace!("Ignoring script options: {:?}", options);
        Self {
            code: code.into().into_string(),
        }
    }

    /// The stored source text
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Run the script in the ambient global scope
    ///
    /// Equivalent to evaluating the text as top-level code: new top-level
    /// bindings become globals and the value of the last evaluated
    /// expression is returned. Anything the script throws comes back as
    /// [`VmError::Thrown`].
    pub fn run_in_this_context(&self, options: RunOptions) -> Result<ScriptValue> {
        tracing::trace!("Ignoring run options: {:?}", options);
        AmbientScope::global()?.evaluate(&self.code)
    }

    /// Not supported
    pub fn run_in_context(
        &self,
        _context: &serde_json::Value,
        _options: RunOptions,
    ) -> Result<ScriptValue> {
        Err(unsupported(VmOperation::ScriptRunInContext))
    }

    /// Not supported
    pub fn run_in_new_context(
        &self,
        _context: Option<&serde_json::Value>,
        _options: RunOptions,
    ) -> Result<ScriptValue> {
        Err(unsupported(VmOperation::ScriptRunInNewContext))
    }

    /// Not supported
    pub fn create_cached_data(&self) -> Result<Vec<u8>> {
        Err(unsupported(VmOperation::ScriptCreateCachedData))
    }
}

pub(crate) fn unsupported(operation: VmOperation) -> VmError {
    tracing::debug!("vm operation '{}' is not implemented", operation);
    VmError::not_implemented(operation)
}
