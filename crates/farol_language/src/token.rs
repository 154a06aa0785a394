//! Token types for the farol lexer and parser.
//!
//! Tokens are the atomic syntactic units produced by the lexer and consumed
//! by the parser. Block structure is explicit in the stream: the layout
//! resolver wraps declaration lists in [`TokenKind::Begin`] /
//! [`TokenKind::Delim`] / [`TokenKind::End`] envelopes, so the parser never
//! sees indentation or braces.
//!
//! This module also defines the name-shape utilities for mixfix operators:
//! an operator name is an identifier containing underscores, each underscore
//! marking an argument hole (`_+_`, `if_then_else_`, `_!`).

use farol_base::{Span, Symbol};

/// The kind of a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Block structure, produced by the layout resolver
    Begin,
    Delim,
    End,
    Eof,

    // Keywords
    Data,
    Where,
    Infix,
    Infixl,
    Infixr,
    Fresh,
    /// `λ` or `\`
    Lambda,

    // Punctuation
    Eq,
    Colon,
    Dot,
    Underscore,
    LParen,
    RParen,

    // Literals and names
    Num(i64),
    Ident(Symbol),
}

impl TokenKind {
    /// A short description for diagnostics, e.g. ``"`=`"`` or `"identifier"`.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Begin => "start of block",
            TokenKind::Delim => "declaration separator",
            TokenKind::End => "end of block",
            TokenKind::Eof => "end of input",
            TokenKind::Data => "`data`",
            TokenKind::Where => "`where`",
            TokenKind::Infix => "`infix`",
            TokenKind::Infixl => "`infixl`",
            TokenKind::Infixr => "`infixr`",
            TokenKind::Fresh => "`fresh`",
            TokenKind::Lambda => "`λ`",
            TokenKind::Eq => "`=`",
            TokenKind::Colon => "`:`",
            TokenKind::Dot => "`.`",
            TokenKind::Underscore => "`_`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::Num(_) => "number",
            TokenKind::Ident(_) => "identifier",
        }
    }
}

/// A token with its source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// `true` if `name` is a mixfix operator name (contains an argument hole).
pub fn is_operator(name: &str) -> bool {
    name.contains('_')
}

/// The parts of an operator name, in order: each underscore becomes an
/// empty string marking an argument slot, each maximal non-underscore run
/// becomes itself. The parts of `_+_` are `["", "+", ""]`; the parts of
/// `if_then_else_` are `["if", "", "then", "", "else", ""]`.
pub fn operator_parts(name: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut run_start: Option<usize> = None;
    for (idx, c) in name.char_indices() {
        if c == '_' {
            if let Some(start) = run_start.take() {
                parts.push(&name[start..idx]);
            }
            parts.push("");
        } else if run_start.is_none() {
            run_start = Some(idx);
        }
    }
    if let Some(start) = run_start {
        parts.push(&name[start..]);
    }
    parts
}

/// Rebuilds an operator name from its parts (inverse of [`operator_parts`]).
pub fn operator_from_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| if p.is_empty() { "_" } else { *p })
        .collect()
}

/// Number of argument holes in an operator name.
pub fn operator_arity(name: &str) -> usize {
    name.matches('_').count()
}

/// `true` if `name` has the shape of a binary operator: exactly the parts
/// `["", p, ""]` for some non-empty `p`.
pub fn is_binary_operator(name: &str) -> bool {
    let parts = operator_parts(name);
    parts.len() == 3 && parts[0].is_empty() && !parts[1].is_empty() && parts[2].is_empty()
}
