//! Statement and expression evaluation

use crate::ast::{Expr, Script, Span, Spanned, Stmt};
use crate::call::CallRecord;
use crate::callback::Callback;
use crate::error::{BindError, ScriptError};
use crate::lexer::tokenize;
use crate::observe::StatsSnapshot;
use crate::parser::parse;
use crate::runtime::Runtime;
use crate::value::HostValue;
use crate::vector::FltVec;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::debug;

type EvalResult<T> = Result<T, ScriptError>;

/// Names handled by the evaluator itself
const RELEASE: &str = "release";
const TO_JSON: &str = "toJson";
const FROM_JSON: &str = "fromJson";

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Executes scripts against a runtime
pub struct Evaluator {
    runtime: Runtime,
    globals: HashMap<String, HostValue>,
    output: Rc<RefCell<Vec<String>>>,
}

impl Evaluator {
    pub fn new(runtime: Runtime) -> Self {
        let output = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&output);
        let print = Callback::new("print", move |args| {
            let line: Vec<String> = args.iter().map(ToString::to_string).collect();
            sink.borrow_mut().push(line.join(" "));
            Ok(HostValue::Undefined)
        });

        let mut globals = HashMap::new();
        globals.insert("print".to_string(), HostValue::Function(print));
        Evaluator {
            runtime,
            globals,
            output,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.runtime.stats()
    }

    /// Define or overwrite a global
    pub fn define(&mut self, name: &str, value: HostValue) {
        self.globals.insert(name.to_string(), value);
    }

    pub fn global(&self, name: &str) -> Option<&HostValue> {
        self.globals.get(name)
    }

    /// Lines printed since the last call
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    /// Tokenize, parse and run `source`; returns the value of the last statement
    pub fn run_source(&mut self, source: &str) -> EvalResult<HostValue> {
        let tokens = tokenize(source)?;
        let script = parse(tokens)?;
        self.run(&script)
    }

    pub fn run(&mut self, script: &Script) -> EvalResult<HostValue> {
        debug!(statements = script.stmts.len(), "running script");
        let mut last = HostValue::Undefined;
        for stmt in &script.stmts {
            last = self.exec(stmt)?;
        }
        Ok(last)
    }

    /// Run one statement, then deliver the callbacks it queued
    fn exec(&mut self, stmt: &Spanned<Stmt>) -> EvalResult<HostValue> {
        let value = match &stmt.node {
            Stmt::Let { name, value } => {
                let value = self.eval(value)?;
                self.globals.insert(name.node.clone(), value);
                HostValue::Undefined
            }
            Stmt::Expr(expr) => self.eval(expr)?,
        };
        self.runtime
            .run_pending()
            .map_err(|e| ScriptError::bind(e, stmt.span))?;
        Ok(value)
    }

    fn eval_all(&mut self, exprs: &[Spanned<Expr>]) -> EvalResult<Vec<HostValue>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    /// Evaluate with stack growth for deeply nested expressions
    fn eval(&mut self, expr: &Spanned<Expr>) -> EvalResult<HostValue> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>) -> EvalResult<HostValue> {
        let span = expr.span;
        match &expr.node {
            Expr::Undefined => Ok(HostValue::Undefined),
            Expr::Null => Ok(HostValue::Null),
            Expr::Bool(b) => Ok(HostValue::Bool(*b)),
            Expr::Int(n) => Ok(HostValue::Number(*n as f64)),
            Expr::Float(n) => Ok(HostValue::Number(*n)),
            Expr::Str(s) => Ok(HostValue::Str(s.clone())),

            Expr::Var(name) => self
                .globals
                .get(name)
                .cloned()
                .ok_or_else(|| ScriptError::UndefinedVariable {
                    name: name.clone(),
                    span,
                }),

            Expr::Array(items) => Ok(HostValue::Array(self.eval_all(items)?)),

            Expr::Object(fields) => {
                let mut map = BTreeMap::new();
                for (key, value) in fields {
                    map.insert(key.clone(), self.eval(value)?);
                }
                Ok(HostValue::Object(map))
            }

            Expr::Neg(operand) => match self.eval(operand)? {
                HostValue::Number(n) => Ok(HostValue::Number(-n)),
                other => Err(ScriptError::type_error(
                    format!("cannot negate {}", other.type_name()),
                    span,
                )),
            },

            Expr::New { class, args } => {
                let args = self.eval_all(args)?;
                self.dispatch(&CallRecord::construct(class.node.as_str(), args), span)
            }

            Expr::Call { callee, args } => {
                let args = self.eval_all(args)?;
                self.call(&callee.node, args, span)
            }

            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = match self.eval(receiver)? {
                    HostValue::Handle(h) => h,
                    other => {
                        return Err(ScriptError::type_error(
                            format!("cannot call {} on {}", method.node, other.type_name()),
                            span,
                        ));
                    }
                };
                let args = self.eval_all(args)?;
                self.dispatch(&CallRecord::method(receiver, method.node.as_str(), args), span)
            }

            Expr::Property { object, name } => {
                let object = self.eval(object)?;
                self.property(object, &name.node, span)
            }
        }
    }

    fn dispatch(&mut self, call: &CallRecord, span: Span) -> EvalResult<HostValue> {
        self.runtime
            .call(call)
            .map_err(|e| ScriptError::bind(e, span))
    }

    /// `callee(args)`: builtins first, then functions in scope, then classes
    fn call(&mut self, callee: &str, args: Vec<HostValue>, span: Span) -> EvalResult<HostValue> {
        let bind = |e: BindError| ScriptError::bind(e, span);
        match callee {
            RELEASE => {
                let handle = args
                    .first()
                    .and_then(HostValue::as_handle)
                    .ok_or_else(|| {
                        ScriptError::type_error("release expects a native object", span)
                    })?;
                self.runtime.release(handle).map_err(bind)?;
                Ok(HostValue::Undefined)
            }
            TO_JSON => {
                let value = args.first().unwrap_or(&HostValue::Undefined);
                Ok(HostValue::Str(self.runtime.to_json_text(value)))
            }
            FROM_JSON => match args.first() {
                Some(HostValue::Str(text)) => self.runtime.parse_json_text(text).map_err(bind),
                _ => Err(ScriptError::type_error("fromJson expects a string", span)),
            },
            _ => {
                if let Some(value) = self.globals.get(callee) {
                    return match value {
                        HostValue::Function(f) => f.invoke(&args).map_err(bind),
                        other => Err(bind(BindError::NotCallable {
                            got: other.type_name().to_string(),
                        })),
                    };
                }
                if self.runtime.classes().get(callee).is_some() {
                    return self.dispatch(&CallRecord::plain(callee, args), span);
                }
                Err(ScriptError::UndefinedVariable {
                    name: callee.to_string(),
                    span,
                })
            }
        }
    }

    fn property(&self, object: HostValue, name: &str, span: Span) -> EvalResult<HostValue> {
        match object {
            HostValue::Handle(h) => self
                .runtime
                .get_property(h, name)
                .map_err(|e| ScriptError::bind(e, span)),
            HostValue::Object(fields) => Ok(fields.get(name).cloned().unwrap_or(HostValue::Undefined)),
            HostValue::Array(items) if name == "length" => Ok(HostValue::Number(items.len() as f64)),
            HostValue::Str(s) if name == "length" => Ok(HostValue::Number(s.chars().count() as f64)),
            other => Err(ScriptError::type_error(
                format!("cannot read property {name} of {}", other.type_name()),
                span,
            )),
        }
    }

    /// Render a value for display; vectors show their contents
    pub fn render(&self, value: &HostValue) -> String {
        match value {
            HostValue::Handle(h) => match self.runtime.unwrap::<FltVec>(*h) {
                Ok(vec) => format!("{h} {}", HostValue::numbers(vec.values().iter().copied())),
                Err(BindError::StaleHandle { .. }) => format!("{h} (released)"),
                Err(_) => h.to_string(),
            },
            HostValue::Str(s) => format!("{s:?}"),
            other => other.to_string(),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Runtime::default())
    }
}
