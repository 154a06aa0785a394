//! Pre-interned names of the built-in operators, types, and values.
//!
//! Every stage needs to recognise or construct applications of the three
//! primitive combinators and the primitive types, so their symbols are
//! interned once up front and passed around as a small `Copy` bundle.

use farol_base::{Interner, Symbol};

/// The built-in names: `_→_`, `_<>_`, `_>>_`, `_==_`, `Int`, `Unit`,
/// `unit`, and the entry point `main`.
#[derive(Debug, Clone, Copy)]
pub struct Names {
    /// `_→_` — the function type constructor.
    pub arrow: Symbol,
    /// `_<>_` — alternative (disjunctive choice).
    pub alt: Symbol,
    /// `_>>_` — sequence.
    pub seq: Symbol,
    /// `_==_` — unification.
    pub unify: Symbol,
    /// The `Int` type.
    pub int_type: Symbol,
    /// The `Unit` type.
    pub unit_type: Symbol,
    /// The `unit` value constructor.
    pub unit_value: Symbol,
    /// The program entry point.
    pub main: Symbol,
}

impl Names {
    pub fn new(interner: &mut Interner) -> Self {
        Self {
            arrow: interner.intern("_→_"),
            alt: interner.intern("_<>_"),
            seq: interner.intern("_>>_"),
            unify: interner.intern("_==_"),
            int_type: interner.intern("Int"),
            unit_type: interner.intern("Unit"),
            unit_value: interner.intern("unit"),
            main: interner.intern("main"),
        }
    }
}
