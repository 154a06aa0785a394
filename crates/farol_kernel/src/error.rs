//! Evaluator errors.
//!
//! These abort the solution stream. Unification *failure* is not an error:
//! a branch that fails to unify simply yields no solutions.

use farol_base::{Diagnostic, Span, Stage};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalErrorKind {
    UnknownName { name: String },
    UnimplementedPrimitive { name: String },
    UnimplementedValueClass { description: String },
    UnimplementedExpression { description: String },
}

impl EvalErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            EvalErrorKind::UnknownName { .. } => "unknown-name",
            EvalErrorKind::UnimplementedPrimitive { .. } => "unimplemented-primitive",
            EvalErrorKind::UnimplementedValueClass { .. } => "unimplemented-value-class",
            EvalErrorKind::UnimplementedExpression { .. } => "unimplemented-expression",
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalErrorKind::UnknownName { name } => {
                write!(f, "`{}` is neither a variable, a constructor, nor a primitive", name)
            }
            EvalErrorKind::UnimplementedPrimitive { name } => {
                write!(f, "primitive `{}` is not implemented", name)
            }
            EvalErrorKind::UnimplementedValueClass { description } => {
                write!(f, "cannot operate on {}", description)
            }
            EvalErrorKind::UnimplementedExpression { description } => {
                write!(f, "cannot evaluate {}", description)
            }
        }
    }
}

/// An evaluator error with an optional source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub span: Option<Span>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        Self { kind, span: None }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for EvalError {}

impl From<EvalError> for Diagnostic {
    fn from(err: EvalError) -> Self {
        let diagnostic = Diagnostic::new(Stage::Evaluator, err.kind.code(), err.kind.to_string());
        match err.span {
            Some(span) => diagnostic.with_span(span),
            None => diagnostic,
        }
    }
}
