//! Values produced by evaluating scripts
//!
//! Converts rquickjs values into [`ScriptValue`], which outlives the engine
//! context and can cross the worker thread boundary.

use crate::error::{Result, VmError};
use rquickjs::{Ctx, Function, Type, Value};
use serde::{Serialize, Serializer};
use std::fmt;

/// The completion value of an evaluated script
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Decimal digits of the bigint
    BigInt(String),
    /// Description in `Symbol(desc)` form
    Symbol(String),
    Function { name: String },
    /// Arrays and other objects, as `JSON.stringify` sees them
    Object(serde_json::Value),
}

impl ScriptValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, ScriptValue::Undefined)
    }

    /// Convert to JSON
    ///
    /// - undefined, functions and symbols become null
    /// - NaN and infinities become null
    /// - bigints become their decimal string
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ScriptValue::Undefined
            | ScriptValue::Null
            | ScriptValue::Function { .. }
            | ScriptValue::Symbol(_) => serde_json::Value::Null,
            ScriptValue::Boolean(b) => serde_json::Value::Bool(*b),
            ScriptValue::Number(n) => number_to_json(*n),
            ScriptValue::String(s) | ScriptValue::BigInt(s) => serde_json::Value::String(s.clone()),
            ScriptValue::Object(v) => v.clone(),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Undefined => f.write_str("undefined"),
            ScriptValue::Null => f.write_str("null"),
            ScriptValue::Boolean(b) => write!(f, "{}", b),
            ScriptValue::Number(n) => f.write_str(&number_to_string(*n)),
            ScriptValue::String(s) | ScriptValue::BigInt(s) | ScriptValue::Symbol(s) => {
                f.write_str(s)
            }
            ScriptValue::Function { name } if name.is_empty() => {
                f.write_str("[Function (anonymous)]")
            }
            ScriptValue::Function { name } => write!(f, "[Function: {}]", name),
            ScriptValue::Object(serde_json::Value::String(s)) => f.write_str(s),
            ScriptValue::Object(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for ScriptValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Format a number the way JavaScript's `Number.prototype.toString()` does
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }

    // Shortest round-trip digits and exponent, e.g. "1.2345e3"
    let sci = format!("{:e}", n);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let point = exponent + 1;

    if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", lead, sign, exponent.abs())
        } else {
            format!("{}.{}e{}{}", lead, rest, sign, exponent.abs())
        }
    }
}

/// Convert an rquickjs value into a [`ScriptValue`]
pub(crate) fn from_js<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Result<ScriptValue> {
    Ok(match value.type_of() {
        Type::Uninitialized | Type::Undefined => ScriptValue::Undefined,
        Type::Null => ScriptValue::Null,
        Type::Bool => ScriptValue::Boolean(value.as_bool().unwrap_or_default()),
        Type::Int | Type::Float => ScriptValue::Number(value.as_number().unwrap_or(f64::NAN)),
        Type::String => ScriptValue::String(
            value
                .get::<String>()
                .map_err(|e| VmError::type_conversion(format!("String conversion failed: {}", e)))?,
        ),
        Type::BigInt => ScriptValue::BigInt(js_string(ctx, value)?),
        Type::Symbol => ScriptValue::Symbol(js_string(ctx, value)?),
        Type::Function | Type::Constructor => ScriptValue::Function {
            name: property_string(&value, "name").unwrap_or_default(),
        },
        Type::Exception => {
            let name = property_string(&value, "name");
            let message = property_string(&value, "message");
            // Own enumerable properties (e.g. `code`) plus the non-enumerable name/message
            let mut json = stringify(ctx, value)?;
            if !json.is_object() {
                json = serde_json::Value::Object(serde_json::Map::new());
            }
            if let Some(map) = json.as_object_mut() {
                map.insert("name".to_string(), name.into());
                map.insert("message".to_string(), message.into());
            }
            ScriptValue::Object(json)
        }
        _ => ScriptValue::Object(stringify(ctx, value)?),
    })
}

/// Read a string property from an object value
fn property_string(value: &Value<'_>, key: &str) -> Option<String> {
    value
        .as_object()
        .and_then(|obj| obj.get::<_, Option<String>>(key).ok().flatten())
}

/// Apply the global `String()` conversion
fn js_string<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Result<String> {
    let to_string: Function = ctx
        .globals()
        .get("String")
        .map_err(|e| VmError::type_conversion(format!("String() unavailable: {}", e)))?;
    to_string
        .call((value,))
        .map_err(|e| VmError::type_conversion(format!("String() failed: {}", e)))
}

/// Round-trip an object through `JSON.stringify`
///
/// Objects that cannot be stringified (cycles, for one) fall back to their
/// `String()` form, and to [`UNCONVERTIBLE`] when that throws too.
fn stringify<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Result<serde_json::Value> {
    match ctx.json_stringify(value.clone()) {
        Ok(Some(json)) => {
            let s: String = json
                .to_string()
                .map_err(|e| VmError::type_conversion(format!("String conversion failed: {}", e)))?;
            serde_json::from_str(&s)
                .map_err(|e| VmError::type_conversion(format!("JSON parse failed: {}", e)))
        }
        Ok(None) => Ok(serde_json::Value::Null),
        Err(_) => {
            // Clear the pending TypeError before touching the context again
            let _ = ctx.catch();
            let text = match js_string(ctx, value) {
                Ok(text) => text,
                Err(e) => {
                    let _ = ctx.catch();
                    tracing::debug!("Object has no string form: {}", e);
                    UNCONVERTIBLE.to_string()
                }
            };
            Ok(serde_json::Value::String(text))
        }
    }
}

/// Stand-in text for objects whose `toJSON` and `toString` both throw
pub const UNCONVERTIBLE: &str = "[object Object]";

/// JS builtin global names to skip when scanning for user variables
pub const JS_BUILTINS: &[&str] = &[
    // Standard JS constructors and objects
    "Object",
    "Function",
    "Array",
    "Number",
    "parseFloat",
    "parseInt",
    "Infinity",
    "NaN",
    "undefined",
    "Boolean",
    "String",
    "Symbol",
    "Date",
    "Promise",
    "RegExp",
    "Error",
    "AggregateError",
    "EvalError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "TypeError",
    "URIError",
    "InternalError",
    "JSON",
    "Math",
    "Atomics",
    "console",
    "Reflect",
    "Proxy",
    "Map",
    "BigInt",
    "Set",
    "WeakMap",
    "WeakSet",
    "WeakRef",
    "FinalizationRegistry",
    "ArrayBuffer",
    "SharedArrayBuffer",
    "DataView",
    "Int8Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Int16Array",
    "Uint16Array",
    "Int32Array",
    "Uint32Array",
    "BigInt64Array",
    "BigUint64Array",
    "Float16Array",
    "Float32Array",
    "Float64Array",
    "escape",
    "unescape",
    "eval",
    "isFinite",
    "isNaN",
    "globalThis",
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    // Injected by the ambient scope
    "env",
    "process",
    // QuickJS-specific
    "__loadScript",
    "print",
    "scriptArgs",
    "gc",
];

/// Check if a global variable name is a JS builtin that should be skipped
pub fn is_builtin(name: &str) -> bool {
    JS_BUILTINS.contains(&name)
}
