//! Script syntax tree
//!
//! A script is a list of statements; every node keeps its source span so
//! runtime failures can point at the call that raised them.

mod span;

pub use span::{Span, Spanned};

use serde::{Deserialize, Serialize};

/// A parsed script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `let name = value;`
    Let {
        name: Spanned<String>,
        value: Spanned<Expr>,
    },
    /// `expr;`
    Expr(Spanned<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Undefined,
    Null,
    Bool(bool),
    /// Integer literal
    Int(i64),
    Float(f64),
    Str(String),
    Var(String),
    Array(Vec<Spanned<Expr>>),
    Object(Vec<(String, Spanned<Expr>)>),
    Neg(Box<Spanned<Expr>>),
    /// `new Class(args)`
    New {
        class: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    /// `callee(args)`
    Call {
        callee: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    /// `receiver.method(args)`
    MethodCall {
        receiver: Box<Spanned<Expr>>,
        method: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    /// `object.name`
    Property {
        object: Box<Spanned<Expr>>,
        name: Spanned<String>,
    },
}
