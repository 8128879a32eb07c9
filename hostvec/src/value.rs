//! Host values: the dynamically-typed values crossing the call boundary

use crate::callback::Callback;
use crate::wrap::Handle;
use std::collections::BTreeMap;
use std::fmt;

/// A value as seen by the host caller
#[derive(Debug, Clone)]
pub enum HostValue {
    /// Absent value (`undefined`)
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Every number is a double; int32-ness is a property of the value
    Number(f64),
    /// String
    Str(String),
    /// Ordered array of values
    Array(Vec<HostValue>),
    /// Plain object with named fields
    Object(BTreeMap<String, HostValue>),
    /// Invocable host function
    Function(Callback),
    /// Reference to a native instance
    Handle(Handle),
}

/// Type tags used for argument validation and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Undefined,
    Null,
    Bool,
    /// Integral number representable as `i32`
    Int32,
    Number,
    String,
    Array,
    Object,
    /// Object or array, convertible to JSON
    Json,
    Function,
    /// Any wrapped native instance
    Handle,
    /// Wrapped native instance of the named class
    Instance(&'static str),
}

impl ValueType {
    /// Whether `value` satisfies this type
    pub fn matches(self, value: &HostValue) -> bool {
        match (self, value) {
            (ValueType::Undefined, HostValue::Undefined) => true,
            (ValueType::Null, HostValue::Null) => true,
            (ValueType::Bool, HostValue::Bool(_)) => true,
            (ValueType::Int32, v) => v.is_int32(),
            (ValueType::Number, HostValue::Number(_)) => true,
            (ValueType::String, HostValue::Str(_)) => true,
            (ValueType::Array, HostValue::Array(_)) => true,
            (ValueType::Object, HostValue::Object(_)) => true,
            (ValueType::Json, HostValue::Object(_) | HostValue::Array(_)) => true,
            (ValueType::Function, HostValue::Function(_)) => true,
            (ValueType::Handle, HostValue::Handle(_)) => true,
            (ValueType::Instance(class), HostValue::Handle(h)) => h.class() == class,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Undefined => "undefined",
            ValueType::Null => "null",
            ValueType::Bool => "boolean",
            ValueType::Int32 => "int32",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::Json => "json",
            ValueType::Function => "function",
            ValueType::Handle => "native object",
            ValueType::Instance(class) => class,
        };
        f.write_str(name)
    }
}

impl HostValue {
    /// Get type name for error messages
    pub fn type_name(&self) -> &str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Null => "null",
            HostValue::Bool(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::Str(_) => "string",
            HostValue::Array(_) => "array",
            HostValue::Object(_) => "object",
            HostValue::Function(_) => "function",
            HostValue::Handle(h) => h.class(),
        }
    }

    /// Integral, finite and within `i32` range
    pub fn is_int32(&self) -> bool {
        match self {
            HostValue::Number(n) => {
                n.fract() == 0.0 && *n >= i32::MIN as f64 && *n <= i32::MAX as f64
            }
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            HostValue::Handle(h) => Some(*h),
            _ => None,
        }
    }

    /// Named field of a plain object
    pub fn property(&self, name: &str) -> Option<&HostValue> {
        match self {
            HostValue::Object(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Build an object from `(name, value)` pairs
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, HostValue)>) -> Self {
        HostValue::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array of numbers
    pub fn numbers(values: impl IntoIterator<Item = f64>) -> Self {
        HostValue::Array(values.into_iter().map(HostValue::Number).collect())
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Number(f64::from(n))
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(s.to_string())
    }
}

impl From<Handle> for HostValue {
    fn from(h: Handle) -> Self {
        HostValue::Handle(h)
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "undefined"),
            HostValue::Null => write!(f, "null"),
            HostValue::Bool(b) => write!(f, "{b}"),
            HostValue::Number(n) => write!(f, "{}", format_number(*n)),
            HostValue::Str(s) => write!(f, "{s}"),
            HostValue::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            HostValue::Object(fields) => {
                write!(f, "{{ ")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, " }}")
            }
            HostValue::Function(cb) => write!(f, "[function {}]", cb.name()),
            HostValue::Handle(h) => write!(f, "{h}"),
        }
    }
}

/// Render a number the way the host prints it: integral values without a fraction
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Undefined, HostValue::Undefined) => true,
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Number(a), HostValue::Number(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => a == b,
            (HostValue::Function(a), HostValue::Function(b)) => a.ptr_eq(b),
            (HostValue::Handle(a), HostValue::Handle(b)) => a == b,
            _ => false,
        }
    }
}
