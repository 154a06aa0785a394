//! # farol-base
//!
//! Structural atoms for the farol interpreter pipeline.
//!
//! This crate provides the foundational types shared by every stage:
//!
//! - [`Span`] — source location tracking
//! - [`Interner`]/[`Symbol`] — string interning for O(1) name equality
//! - [`Diagnostic`]/[`Stage`] — stage-tagged errors with stable codes
//!
//! # Design Principles
//!
//! This crate has **no knowledge of farol syntax or semantics**. It provides
//! only generic infrastructure that the lexer, parser, type checker, and
//! evaluator build upon.

pub mod error;
pub mod intern;
pub mod span;

pub use error::{Diagnostic, Stage};
pub use intern::{Interner, Symbol};
pub use span::{line_col, Span};
