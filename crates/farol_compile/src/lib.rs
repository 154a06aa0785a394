//! # farol-compile
//!
//! The kind and type checker for farol, which doubles as the elaborator:
//! surface programs go in, core programs with inferred types come out.
//!
//! # Pipeline Position
//!
//! ```text
//! surface AST
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────┐
//! │ TypeChecker                                 │
//! │   kind-check data declarations              │
//! │   desugar equation groups                   │
//! │   infer + unify types (union-find store)    │
//! │   generalise let-bound metavariables        │
//! │   reconcile user type declarations          │
//! └─────────────────────────────────────────────┘
//!     │
//!     ▼
//! core AST (Lambda/Fresh/sequence/alternative/unify) ──▶ farol-kernel
//! ```
//!
//! Multi-equation pattern matching is compiled away here: each group of
//! equations becomes a single definition whose body is a lambda over fresh
//! parameters, alternating one branch per equation, each branch unifying
//! the parameters against the equation's patterns.

pub mod check;
pub mod error;
pub mod kinds;
pub mod meta;

pub use check::TypeChecker;
pub use error::{TypeError, TypeErrorKind};
pub use kinds::{Kind, KindStore};
pub use meta::TypeMetaStore;
