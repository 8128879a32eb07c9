//! Error types and reporting

use crate::ast::Span;
use crate::value::{HostValue, ValueType};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, BindError>;

/// Failure of a call crossing the host boundary
///
/// Every variant is raised before the receiver is mutated, so a failed call
/// leaves native state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("missing argument {position}")]
    ArgumentMissing { position: usize },

    #[error("argument {position} expected to be {expected}, got {got}")]
    ArgumentTypeMismatch {
        position: usize,
        expected: ValueType,
        got: String,
    },

    #[error("argument {position}, property {property} expected to be {expected}, got {got}")]
    PropertyTypeMismatch {
        position: usize,
        property: String,
        expected: ValueType,
        got: String,
    },

    #[error("expected at most {expected} argument(s), got {got}")]
    TooManyArguments { expected: usize, got: usize },

    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("{class} must be called with new")]
    InvalidConstructionUsage { class: String },

    #[error("{operation} is undefined for an empty vector")]
    EmptyVectorOperation { operation: String },

    #[error("error parsing '{text}'")]
    JsonParseError { text: String },

    #[error("{operation} is not implemented")]
    NotImplemented { operation: String },

    #[error("unknown class: {name}")]
    UnknownClass { name: String },

    #[error("{class} has no member {name}")]
    UnknownMember { class: String, name: String },

    #[error("stale handle: {class}#{index} (generation {generation})")]
    StaleHandle {
        class: String,
        index: u32,
        generation: u32,
    },

    #[error("{got} is not a function")]
    NotCallable { got: String },

    #[error("callback {name} failed: {message}")]
    CallbackFailed { name: String, message: String },
}

impl BindError {
    pub fn type_mismatch(position: usize, expected: ValueType, got: &HostValue) -> Self {
        Self::ArgumentTypeMismatch {
            position,
            expected,
            got: got.type_name().to_string(),
        }
    }

    pub fn property_mismatch(
        position: usize,
        property: &str,
        expected: ValueType,
        got: &HostValue,
    ) -> Self {
        Self::PropertyTypeMismatch {
            position,
            property: property.to_string(),
            expected,
            got: got.type_name().to_string(),
        }
    }

    pub fn index_out_of_bounds(index: i64, length: usize) -> Self {
        Self::IndexOutOfBounds { index, length }
    }

    pub fn empty_vector(operation: &str) -> Self {
        Self::EmptyVectorOperation {
            operation: operation.to_string(),
        }
    }

    pub fn not_implemented(operation: impl Into<String>) -> Self {
        Self::NotImplemented {
            operation: operation.into(),
        }
    }

    /// Stable tag naming the kind of failure
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArgumentMissing { .. } => "ArgumentMissing",
            Self::ArgumentTypeMismatch { .. } => "ArgumentTypeMismatch",
            Self::PropertyTypeMismatch { .. } => "PropertyTypeMismatch",
            Self::TooManyArguments { .. } => "TooManyArguments",
            Self::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            Self::InvalidConstructionUsage { .. } => "InvalidConstructionUsage",
            Self::EmptyVectorOperation { .. } => "EmptyVectorOperation",
            Self::JsonParseError { .. } => "JsonParseError",
            Self::NotImplemented { .. } => "NotImplemented",
            Self::UnknownClass { .. } => "UnknownClass",
            Self::UnknownMember { .. } => "UnknownMember",
            Self::StaleHandle { .. } => "StaleHandle",
            Self::NotCallable { .. } => "NotCallable",
            Self::CallbackFailed { .. } => "CallbackFailed",
        }
    }

    /// Argument position the failure refers to, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::ArgumentMissing { position }
            | Self::ArgumentTypeMismatch { position, .. }
            | Self::PropertyTypeMismatch { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Failure of a host script
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("Lexer error at {span}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span}: {message}")]
    Parser { message: String, span: Span },

    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String, span: Span },

    #[error("type error: {message}")]
    Type { message: String, span: Span },

    /// A call rejected by the binding layer
    #[error("{error}")]
    Bind {
        #[source]
        error: BindError,
        span: Span,
    },
}

impl ScriptError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::Type {
            message: message.into(),
            span,
        }
    }

    pub fn bind(error: BindError, span: Span) -> Self {
        Self::Bind { error, span }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Lexer { span, .. }
            | Self::Parser { span, .. }
            | Self::UndefinedVariable { span, .. }
            | Self::Type { span, .. }
            | Self::Bind { span, .. } => *span,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Lexer { message, .. } | Self::Parser { message, .. } | Self::Type { message, .. } => {
                message.clone()
            }
            Self::UndefinedVariable { name, .. } => format!("undefined variable: {name}"),
            Self::Bind { error, .. } => error.to_string(),
        }
    }

    /// The binding-layer failure behind a `Bind` error
    pub fn bind_error(&self) -> Option<&BindError> {
        match self {
            Self::Bind { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Report error with ariadne
pub fn report_error(filename: &str, source: &str, error: &ScriptError) -> std::io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let title = match error {
        ScriptError::Lexer { .. } => "Lexer error".to_string(),
        ScriptError::Parser { .. } => "Parser error".to_string(),
        ScriptError::UndefinedVariable { .. } => "Reference error".to_string(),
        ScriptError::Type { .. } => "Type error".to_string(),
        ScriptError::Bind { error, .. } => error.kind().to_string(),
    };
    let span = error.span();

    Report::build(ReportKind::Error, (filename, span.start..span.end))
        .with_message(title)
        .with_label(
            Label::new((filename, span.start..span.end))
                .with_message(error.message())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)))
}
