//! Argument extraction
//!
//! [`Args`] is the typed view of a [`CallRecord`] handed to native code. It
//! is parametrized by the wrapped class so that handle arguments can be
//! checked against that class. All accessors are zero-based.
//!
//! Two fallback policies exist and are deliberately different:
//! - [`Args::require_or`] falls back only when the argument is absent; a
//!   present argument of the wrong type is an error.
//! - [`Args::require_property`] falls back whenever the argument is absent,
//!   is not an object, or lacks the field. It is meant for optional fields of
//!   an options object.

mod signature;

pub use signature::{check_signature, describe, Param, Signature};

use crate::call::CallRecord;
use crate::callback::Callback;
use crate::error::{BindError, Result};
use crate::json::{to_json, JsonService};
use crate::value::{HostValue, ValueType};
use crate::wrap::{Handle, NativeClass};
use serde_json::Value as JsonValue;
use std::marker::PhantomData;

/// Conversion from a host value to a native value
pub trait FromHostValue: Sized {
    /// Type reported when the conversion fails
    fn value_type() -> ValueType;

    fn from_host(value: &HostValue) -> Option<Self>;
}

impl FromHostValue for i32 {
    fn value_type() -> ValueType {
        ValueType::Int32
    }

    fn from_host(value: &HostValue) -> Option<Self> {
        if value.is_int32() {
            value.as_number().map(|n| n as i32)
        } else {
            None
        }
    }
}

impl FromHostValue for f64 {
    fn value_type() -> ValueType {
        ValueType::Number
    }

    fn from_host(value: &HostValue) -> Option<Self> {
        value.as_number()
    }
}

impl FromHostValue for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn from_host(value: &HostValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromHostValue for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn from_host(value: &HostValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromHostValue for Callback {
    fn value_type() -> ValueType {
        ValueType::Function
    }

    fn from_host(value: &HostValue) -> Option<Self> {
        match value {
            HostValue::Function(cb) => Some(cb.clone()),
            _ => None,
        }
    }
}

impl FromHostValue for Handle {
    fn value_type() -> ValueType {
        ValueType::Handle
    }

    fn from_host(value: &HostValue) -> Option<Self> {
        value.as_handle()
    }
}

/// Typed view of one call's arguments for native class `T`
pub struct Args<'a, T> {
    call: &'a CallRecord,
    json: &'a dyn JsonService,
    strict_arity: bool,
    _class: PhantomData<fn() -> T>,
}

impl<'a, T: NativeClass> Args<'a, T> {
    pub fn new(call: &'a CallRecord, json: &'a dyn JsonService) -> Self {
        Args {
            call,
            json,
            strict_arity: false,
            _class: PhantomData,
        }
    }

    /// Reject arguments beyond a checked signature
    pub fn strict_arity(mut self, strict: bool) -> Self {
        self.strict_arity = strict;
        self
    }

    pub fn call(&self) -> &'a CallRecord {
        self.call
    }

    pub fn len(&self) -> usize {
        self.call.len()
    }

    pub fn is_empty(&self) -> bool {
        self.call.is_empty()
    }

    /// Validate the call against a declared parameter list
    pub fn check(&self, params: &[Param]) -> Result<()> {
        check_signature(params, self.call, self.strict_arity)
    }

    /// The receiver of a method call
    pub fn receiver(&self) -> Result<Handle> {
        match self.call.receiver {
            Some(handle) if handle.class() == T::CLASS_NAME => Ok(handle),
            Some(handle) => Err(BindError::ArgumentTypeMismatch {
                position: 0,
                expected: ValueType::Instance(T::CLASS_NAME),
                got: handle.class().to_string(),
            }),
            None => Err(BindError::ArgumentTypeMismatch {
                position: 0,
                expected: ValueType::Instance(T::CLASS_NAME),
                got: "undefined".to_string(),
            }),
        }
    }

    pub fn has_arg(&self, position: usize) -> bool {
        position < self.call.len()
    }

    fn arg(&self, position: usize) -> Result<&'a HostValue> {
        self.call
            .arg(position)
            .ok_or(BindError::ArgumentMissing { position })
    }

    /// Type test; a missing argument is an error, not `false`
    pub fn is_type(&self, position: usize, ty: ValueType) -> Result<bool> {
        Ok(ty.matches(self.arg(position)?))
    }

    pub fn require<V: FromHostValue>(&self, position: usize) -> Result<V> {
        let value = self.arg(position)?;
        V::from_host(value).ok_or_else(|| BindError::type_mismatch(position, V::value_type(), value))
    }

    /// Like [`Args::require`], with `default` when the argument is absent
    pub fn require_or<V: FromHostValue>(&self, position: usize, default: V) -> Result<V> {
        if self.has_arg(position) {
            self.require(position)
        } else {
            Ok(default)
        }
    }

    /// Whether argument `position` is an object carrying field `name`
    pub fn has_property(&self, position: usize, name: &str) -> bool {
        self.call
            .arg(position)
            .and_then(|v| v.property(name))
            .is_some()
    }

    /// Field `name` of an options object at `position`, or `default`
    pub fn require_property<V: FromHostValue>(
        &self,
        position: usize,
        name: &str,
        default: V,
    ) -> Result<V> {
        match self.call.arg(position).and_then(|v| v.property(name)) {
            Some(value) => V::from_host(value)
                .ok_or_else(|| BindError::property_mismatch(position, name, V::value_type(), value)),
            None => Ok(default),
        }
    }

    /// Serialize a structured argument to JSON text
    pub fn json_text(&self, position: usize) -> Result<String> {
        let value = self.arg(position)?;
        if !ValueType::Json.matches(value) {
            return Err(BindError::type_mismatch(position, ValueType::Json, value));
        }
        Ok(self.json.stringify(&to_json(value)))
    }

    /// Structured argument as a parsed JSON tree
    pub fn json(&self, position: usize) -> Result<JsonValue> {
        let text = self.json_text(position)?;
        self.parse(text)
    }

    /// Structured field `name` of the object at `position`
    pub fn json_property(&self, position: usize, name: &str) -> Result<JsonValue> {
        let object = self.arg(position)?;
        if !ValueType::Object.matches(object) {
            return Err(BindError::type_mismatch(position, ValueType::Object, object));
        }
        let Some(value) = object.property(name) else {
            return Err(missing_property(position, name, ValueType::Json));
        };
        if !ValueType::Json.matches(value) {
            return Err(BindError::property_mismatch(position, name, ValueType::Json, value));
        }
        let text = self.json.stringify(&to_json(value));
        self.parse(text)
    }

    fn parse(&self, text: String) -> Result<JsonValue> {
        match self.json.parse(&text) {
            Ok(value) => Ok(value),
            Err(_) => Err(BindError::JsonParseError { text }),
        }
    }

    /// Invocable argument, retained beyond this call
    pub fn callback(&self, position: usize) -> Result<Callback> {
        self.require(position)
    }

    /// Invocable field `name` of the object at `position`
    pub fn callback_property(&self, position: usize, name: &str) -> Result<Callback> {
        let object = self.arg(position)?;
        if !ValueType::Object.matches(object) {
            return Err(BindError::type_mismatch(position, ValueType::Object, object));
        }
        let Some(value) = object.property(name) else {
            return Err(missing_property(position, name, ValueType::Function));
        };
        Callback::from_host(value)
            .ok_or_else(|| BindError::property_mismatch(position, name, ValueType::Function, value))
    }

    /// Handle argument bound to an instance of `T`
    pub fn require_handle(&self, position: usize) -> Result<Handle> {
        let value = self.arg(position)?;
        let expected = ValueType::Instance(T::CLASS_NAME);
        match value.as_handle() {
            Some(handle) if expected.matches(value) => Ok(handle),
            _ => Err(BindError::type_mismatch(position, expected, value)),
        }
    }
}

fn missing_property(position: usize, name: &str, expected: ValueType) -> BindError {
    BindError::property_mismatch(position, name, expected, &HostValue::Undefined)
}
