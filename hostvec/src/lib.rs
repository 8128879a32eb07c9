//! hostvec
//!
//! A native `f64` vector exposed to a dynamically-typed host through a typed
//! argument extractor, generational object handles and deferred callbacks.
//! The `lexer`, `parser` and `interp` modules implement a small call-script
//! language that plays the host.

pub mod ast;
pub mod call;
pub mod callback;
pub mod config;
pub mod error;
pub mod extract;
pub mod interp;
pub mod json;
pub mod lexer;
pub mod observe;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod value;
pub mod vector;
pub mod wrap;

pub use ast::Span;
pub use error::{BindError, Result, ScriptError};
pub use runtime::Runtime;
pub use value::HostValue;
pub use vector::FltVec;
