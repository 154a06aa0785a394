//! # farol-kernel
//!
//! The farol runtime: values, the metavariable store, environments, lazy
//! solution streams, and the backtracking evaluator.
//!
//! # Execution Model
//!
//! Evaluation is depth-first search over a mutable union-find store of
//! metavariables. The evaluator is a lazy producer: consumers pull one
//! solution at a time from a [`Stream`], and each pull advances the search.
//!
//! ```text
//! core AST
//!     │  eval (call-by-need, memoising environments)
//!     ▼
//! weak values ── seq / alt / unify ──▶ solution streams
//!     │                                    │
//!     │  strong evaluation                 │  instantiate / uninstantiate
//!     ▼                                    ▼
//! printable values                  MetaStore (undo on backtrack)
//! ```
//!
//! Every mutation of the store and every call-by-need rebinding is paired
//! with an undo that runs on all three exit paths: normal exhaustion,
//! failure, and abandonment (the consumer drops the stream).

pub mod env;
pub mod error;
pub mod eval;
pub mod stream;
pub mod value;

pub use env::Env;
pub use error::{EvalError, EvalErrorKind};
pub use eval::Evaluator;
pub use stream::{Step, Stream};
pub use value::{MetaId, MetaStore, Value};
