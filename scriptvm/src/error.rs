//! Error types for script execution

use crate::value::ScriptValue;
use std::fmt;
use thiserror::Error;

/// Result type alias for vm operations
pub type Result<T> = std::result::Result<T, VmError>;

/// Operations that are part of the vm surface but have no working behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VmOperation {
    CreateContext,
    RunInContext,
    RunInNewContext,
    IsContext,
    CompileFunction,
    MeasureMemory,
    ScriptRunInContext,
    ScriptRunInNewContext,
    ScriptCreateCachedData,
}

impl VmOperation {
    /// All unsupported operations, module-level first
    pub const ALL: [VmOperation; 9] = [
        VmOperation::CreateContext,
        VmOperation::RunInContext,
        VmOperation::RunInNewContext,
        VmOperation::IsContext,
        VmOperation::CompileFunction,
        VmOperation::MeasureMemory,
        VmOperation::ScriptRunInContext,
        VmOperation::ScriptRunInNewContext,
        VmOperation::ScriptCreateCachedData,
    ];

    /// The operation's name as callers know it
    pub fn name(&self) -> &'static str {
        match self {
            VmOperation::CreateContext => "createContext",
            VmOperation::RunInContext => "runInContext",
            VmOperation::RunInNewContext => "runInNewContext",
            VmOperation::IsContext => "isContext",
            VmOperation::CompileFunction => "compileFunction",
            VmOperation::MeasureMemory => "measureMemory",
            VmOperation::ScriptRunInContext => "script.runInContext",
            VmOperation::ScriptRunInNewContext => "script.runInNewContext",
            VmOperation::ScriptCreateCachedData => "script.createCachedData",
        }
    }
}

impl fmt::Display for VmOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure raised by evaluated code, as the code raised it
#[derive(Debug, Clone, PartialEq)]
pub struct Thrown {
    /// Error name (`TypeError`, `SyntaxError`, ...) when an Error object was thrown
    pub name: Option<String>,
    /// Error message, or the text of the thrown value
    pub message: String,
    /// Engine stack trace, when available
    pub stack: Option<String>,
    /// The thrown value itself
    pub value: ScriptValue,
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) if self.message.is_empty() => write!(f, "Uncaught {}", name),
            Some(name) => write!(f, "Uncaught {}: {}", name, self.message),
            None => write!(f, "Uncaught {}", self.message),
        }
    }
}

/// Errors that can occur while creating or running scripts
#[derive(Debug, Error)]
pub enum VmError {
    /// The operation exists in the interface but is not supported
    #[error("Not implemented: {operation}")]
    NotImplemented { operation: VmOperation },

    /// Evaluated code threw
    #[error("{0}")]
    Thrown(Box<Thrown>),

    /// The ambient scope was already initialized for this process
    #[error("Ambient scope is already initialized")]
    AlreadyInitialized,

    /// Configuration could not be loaded
    #[error("Failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Type conversion error between Rust and JS
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Runtime initialization or engine error
    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

impl VmError {
    /// Create a not-implemented error for an operation
    pub fn not_implemented(operation: VmOperation) -> Self {
        Self::NotImplemented { operation }
    }

    /// Create a type conversion error
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: msg.into(),
        }
    }

    /// Create a runtime error
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime {
            message: msg.into(),
        }
    }

    /// The unsupported operation, if this is a not-implemented error
    pub fn operation(&self) -> Option<VmOperation> {
        match self {
            Self::NotImplemented { operation } => Some(*operation),
            _ => None,
        }
    }

    /// The raised failure, if evaluated code threw
    pub fn thrown(&self) -> Option<&Thrown> {
        match self {
            Self::Thrown(thrown) => Some(thrown),
            _ => None,
        }
    }
}

impl From<figment::Error> for VmError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}

impl From<Thrown> for VmError {
    fn from(thrown: Thrown) -> Self {
        Self::Thrown(Box::new(thrown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_implemented_message_names_operation() {
        for op in VmOperation::ALL {
            let err = VmError::not_implemented(op);
            assert_eq!(err.to_string(), format!("Not implemented: {}", op.name()));
            assert_eq!(err.operation(), Some(op));
        }
    }

    #[test]
    fn test_operation_names_are_unique() {
        let mut names: Vec<_> = VmOperation::ALL.iter().map(|op| op.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), VmOperation::ALL.len());
    }

    #[test]
    fn test_thrown_display() {
        let thrown = Thrown {
            name: Some("TypeError".to_string()),
            message: "x is not a function".to_string(),
            stack: None,
            value: ScriptValue::Undefined,
        };
        assert_eq!(thrown.to_string(), "Uncaught TypeError: x is not a function");

        let thrown = Thrown {
            name: None,
            message: "42".to_string(),
            stack: None,
            value: ScriptValue::Number(42.0),
        };
        assert_eq!(VmError::from(thrown).to_string(), "Uncaught 42");
    }
}
