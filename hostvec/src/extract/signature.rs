//! Declarative parameter lists
//!
//! Each callable member declares its parameters once; the list is checked
//! against the call record before the receiver is unwrapped.

use crate::call::CallRecord;
use crate::error::{BindError, Result};
use crate::value::ValueType;

/// One declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub ty: ValueType,
    pub optional: bool,
}

impl Param {
    pub const fn required(name: &'static str, ty: ValueType) -> Self {
        Param {
            name,
            ty,
            optional: false,
        }
    }

    pub const fn optional(name: &'static str, ty: ValueType) -> Self {
        Param {
            name,
            ty,
            optional: true,
        }
    }
}

/// Parameter list of a callable member, position = index
pub type Signature = &'static [Param];

/// Validate every declared position of `call`
///
/// Arguments past the declared list are ignored unless `strict_arity` is set.
pub fn check_signature(params: &[Param], call: &CallRecord, strict_arity: bool) -> Result<()> {
    for (position, param) in params.iter().enumerate() {
        match call.arg(position) {
            None if param.optional => {}
            None => return Err(BindError::ArgumentMissing { position }),
            Some(value) if param.ty.matches(value) => {}
            Some(value) => return Err(BindError::type_mismatch(position, param.ty, value)),
        }
    }
    if strict_arity && call.len() > params.len() {
        return Err(BindError::TooManyArguments {
            expected: params.len(),
            got: call.len(),
        });
    }
    Ok(())
}

/// Render a parameter list, e.g. `(index: int32, value: number)`
pub fn describe(params: &[Param]) -> String {
    let parts: Vec<String> = params
        .iter()
        .map(|p| {
            if p.optional {
                format!("{}?: {}", p.name, p.ty)
            } else {
                format!("{}: {}", p.name, p.ty)
            }
        })
        .collect();
    format!("({})", parts.join(", "))
}
