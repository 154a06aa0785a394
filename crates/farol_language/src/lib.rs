//! # farol-language
//!
//! The farol front end: tokens, the layout-resolving lexer, the precedence
//! table, the mixfix parser, and the AST shared by every later stage.
//!
//! # Pipeline Position
//!
//! ```text
//! source text
//!     │  lexer + layout resolver
//!     ▼
//! tokens (BEGIN / DELIM / END envelopes)
//!     │  precedence-driven mixfix parser
//!     ▼
//! surface AST  ──▶  farol-compile (elaboration)  ──▶  farol-kernel (evaluation)
//! ```
//!
//! The AST defined here is shared: the type checker elaborates surface trees
//! into core trees of the same type, and the evaluator consumes core trees.

pub mod ast;
pub mod builtins;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod precedence;
pub mod token;

pub use ast::{DataDeclaration, Declaration, Definition, Expr, ExprKind, MetaId, Program, TypeDeclaration};
pub use builtins::Names;
pub use error::{ParseError, ParseErrorKind};
pub use lexer::Lexer;
pub use parser::Parser;
pub use precedence::{Fixity, PrecedenceTable};
pub use token::{Token, TokenKind};
