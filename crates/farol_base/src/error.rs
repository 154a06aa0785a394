//! Stage-tagged diagnostics with stable codes.
//!
//! Every error in the pipeline is ultimately a [`Diagnostic`]: the stage
//! that produced it, a stable kebab-case code such as `token-mismatch` or
//! `occurs-check`, an optional source span, and a human-readable message.
//! The CLI renders diagnostics as `<stage>:<code> at <line>:<column>`.
//!
//! Each pipeline crate defines its own richer error enum and converts it
//! into a `Diagnostic` at the boundary.

use crate::span::{line_col, Span};
use std::fmt;

/// The pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexer,
    Parser,
    TypeChecker,
    Evaluator,
}

impl Stage {
    /// The stage name used in rendered diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Lexer => "lexer",
            Stage::Parser => "parser",
            Stage::TypeChecker => "typechecker",
            Stage::Evaluator => "evaluator",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error annotated with its producing stage, stable code, and location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Stage that raised the error.
    pub stage: Stage,
    /// Stable kebab-case error code, e.g. `types-do-not-unify`.
    pub code: &'static str,
    /// Location in source, when known.
    pub span: Option<Span>,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic without a source location.
    pub fn new(stage: Stage, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            code,
            span: None,
            message: message.into(),
        }
    }

    /// Attaches a source span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Renders the diagnostic with a line/column position computed from
    /// `source`, in the form `stage:code at line:column: message`.
    pub fn render(&self, source: &str) -> String {
        match self.span {
            Some(span) => {
                let (line, col) = line_col(source, span.start);
                format!(
                    "{}:{} at {}:{}: {}",
                    self.stage, self.code, line, col, self.message
                )
            }
            None => format!("{}:{}: {}", self.stage, self.code, self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.stage, self.code, self.message)
    }
}

impl std::error::Error for Diagnostic {}
