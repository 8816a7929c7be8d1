//! Option bags accepted by the vm operations
//!
//! These mirror the shape callers expect so existing call sites keep working.
//! None of them changes how code is executed.

use serde::{Deserialize, Serialize};

/// Options for creating a script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScriptOptions {
    pub filename: Option<String>,
    pub line_offset: i32,
    pub column_offset: i32,
    pub cached_data: Option<Vec<u8>>,
    pub produce_cached_data: bool,
}

/// Options for running a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunOptions {
    pub display_errors: bool,
    /// Milliseconds
    pub timeout: Option<u64>,
    pub break_on_sigint: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            display_errors: true,
            timeout: None,
            break_on_sigint: false,
        }
    }
}

/// Options for creating a context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextOptions {
    pub name: Option<String>,
    pub origin: Option<String>,
}

/// Options for compiling a function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileFunctionOptions {
    pub filename: Option<String>,
    pub parsing_context: Option<serde_json::Value>,
    pub context_extensions: Vec<serde_json::Value>,
}

/// Options for measuring memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeasureMemoryOptions {
    /// `summary` or `detailed`
    pub mode: Option<String>,
    /// `default` or `eager`
    pub execution: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_deserialize_from_camel_case() {
        let opts: ScriptOptions =
            serde_json::from_value(json!({"filename": "a.js", "lineOffset": 3})).unwrap();
        assert_eq!(opts.filename.as_deref(), Some("a.js"));
        assert_eq!(opts.line_offset, 3);
        assert!(!opts.produce_cached_data);

        let opts: RunOptions = serde_json::from_value(json!({"timeout": 100})).unwrap();
        assert_eq!(opts.timeout, Some(100));
        assert!(opts.display_errors);
    }

    #[test]
    fn test_empty_object_gives_defaults() {
        let opts: MeasureMemoryOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(opts, MeasureMemoryOptions::default());
    }
}
