//! Errors raised by the lexer and the mixfix parser.
//!
//! Every error carries a stable kebab-case code (used by the CLI's
//! `<stage>:<code>` rendering and by tests) and the span of the offending
//! token.

use farol_base::{Diagnostic, Span, Stage};
use std::fmt;

/// What went wrong while lexing or parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    // Lexer
    InvalidInteger { word: String },
    UnmatchedBrace,
    UnclosedBrace,
    MisplacedBrace,

    // Parser
    TokenMismatch { expected: String, got: String },
    NotAnOperator { name: String },
    OperatorAlreadyExists { name: String },
    MustBeBinaryOperator { name: String },
    OperatorPartIsNotAVariable { name: String },
    UndeclaredOperator { name: String },
    ExpectedOperatorPart { status: String },
    CannotParseExpression,
    ExpectedAtom { got: String },
    ExpectedValueDeclaration { got: String },
}

impl ParseErrorKind {
    /// The stable error code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::InvalidInteger { .. } => "invalid-integer",
            ParseErrorKind::UnmatchedBrace => "unmatched-brace",
            ParseErrorKind::UnclosedBrace => "unclosed-brace",
            ParseErrorKind::MisplacedBrace => "misplaced-brace",
            ParseErrorKind::TokenMismatch { .. } => "token-mismatch",
            ParseErrorKind::NotAnOperator { .. } => "not-an-operator",
            ParseErrorKind::OperatorAlreadyExists { .. } => "operator-already-exists",
            ParseErrorKind::MustBeBinaryOperator { .. } => "must-be-binary-operator",
            ParseErrorKind::OperatorPartIsNotAVariable { .. } => "operator-part-is-not-a-variable",
            ParseErrorKind::UndeclaredOperator { .. } => "undeclared-operator",
            ParseErrorKind::ExpectedOperatorPart { .. } => "expected-operator-part",
            ParseErrorKind::CannotParseExpression => "cannot-parse-expression",
            ParseErrorKind::ExpectedAtom { .. } => "expected-atom",
            ParseErrorKind::ExpectedValueDeclaration { .. } => "expected-value-declaration",
        }
    }

    /// Whether this kind is produced by the lexer (as opposed to the parser).
    fn is_lexical(&self) -> bool {
        matches!(
            self,
            ParseErrorKind::InvalidInteger { .. }
                | ParseErrorKind::UnmatchedBrace
                | ParseErrorKind::UnclosedBrace
                | ParseErrorKind::MisplacedBrace
        )
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidInteger { word } => {
                write!(f, "`{}` is not a valid integer literal", word)
            }
            ParseErrorKind::UnmatchedBrace => write!(f, "`}}` without a matching `{{`"),
            ParseErrorKind::UnclosedBrace => write!(f, "block opened with `{{` is never closed"),
            ParseErrorKind::MisplacedBrace => {
                write!(f, "`{{` is only allowed at the start of a block")
            }
            ParseErrorKind::TokenMismatch { expected, got } => {
                write!(f, "expected {}, found {}", expected, got)
            }
            ParseErrorKind::NotAnOperator { name } => {
                write!(f, "`{}` has no argument holes, it cannot be an operator", name)
            }
            ParseErrorKind::OperatorAlreadyExists { name } => {
                write!(f, "operator `{}` is already declared", name)
            }
            ParseErrorKind::MustBeBinaryOperator { name } => {
                write!(f, "`{}` must have the shape `_op_` to be `infixl`/`infixr`", name)
            }
            ParseErrorKind::OperatorPartIsNotAVariable { name } => {
                write!(f, "`{}` is an operator part, not a variable", name)
            }
            ParseErrorKind::UndeclaredOperator { name } => {
                write!(f, "operator `{}` is not declared", name)
            }
            ParseErrorKind::ExpectedOperatorPart { status } => {
                write!(f, "no declared operator continues `{}`", status)
            }
            ParseErrorKind::CannotParseExpression => write!(f, "cannot parse expression"),
            ParseErrorKind::ExpectedAtom { got } => {
                write!(f, "expected an atom, found {}", got)
            }
            ParseErrorKind::ExpectedValueDeclaration { got } => {
                write!(f, "expected a value declaration, found {}", got)
            }
        }
    }
}

/// A lexer or parser error with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The stable error code, e.g. `token-mismatch`.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        let stage = if err.kind.is_lexical() {
            Stage::Lexer
        } else {
            Stage::Parser
        };
        Diagnostic::new(stage, err.kind.code(), err.kind.to_string()).with_span(err.span)
    }
}
