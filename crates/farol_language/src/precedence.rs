//! The table of declared mixfix operators.
//!
//! Operators live at a *level* keyed by `(precedence, fixity)`; lower
//! precedence binds looser, and levels parse outside-in in key order. Each
//! level owns its operator names together with their precomputed part lists
//! (`Symbol::EMPTY` marks an argument slot, so `_+_` is stored as
//! `["", "+", ""]`).
//!
//! The parser walks levels with [`PrecedenceTable::first_level`] /
//! [`PrecedenceTable::next_level`] and drives its status machine with the
//! `is_status_*` queries.

use std::collections::BTreeMap;
use std::ops::Bound;

use farol_base::{Interner, Span, Symbol};
use indexmap::{IndexMap, IndexSet};

use crate::error::{ParseError, ParseErrorKind};
use crate::token::{is_operator, operator_parts};

/// Operator fixity. The `Ord` instance fixes the relative order of levels
/// that share a precedence: plain `infix` parses outside `infixl`, which
/// parses outside `infixr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fixity {
    Infix,
    Infixl,
    Infixr,
}

impl Fixity {
    pub fn as_str(self) -> &'static str {
        match self {
            Fixity::Infix => "infix",
            Fixity::Infixl => "infixl",
            Fixity::Infixr => "infixr",
        }
    }
}

/// A `(precedence, fixity)` pair identifying one parse level.
pub type LevelKey = (u32, Fixity);

/// One precedence level: the operators declared at it, with part lists.
#[derive(Debug, Default)]
struct PrecedenceLevel {
    operators: IndexMap<Symbol, Vec<Symbol>>,
}

/// The registry of declared mixfix operators.
#[derive(Debug, Default)]
pub struct PrecedenceTable {
    levels: BTreeMap<LevelKey, PrecedenceLevel>,
    operators: IndexSet<Symbol>,
    parts: IndexSet<Symbol>,
}

impl PrecedenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` at `(precedence, fixity)`.
    ///
    /// Errors: `not-an-operator` if the name has no argument hole,
    /// `operator-already-exists` if it was declared before (at any level).
    pub fn declare_operator(
        &mut self,
        interner: &mut Interner,
        fixity: Fixity,
        precedence: u32,
        name: Symbol,
        span: Span,
    ) -> Result<(), ParseError> {
        let name_str = interner.resolve(name).to_string();
        if !is_operator(&name_str) {
            return Err(ParseError::new(
                ParseErrorKind::NotAnOperator { name: name_str },
                span,
            ));
        }
        if self.operators.contains(&name) {
            return Err(ParseError::new(
                ParseErrorKind::OperatorAlreadyExists { name: name_str },
                span,
            ));
        }
        let parts: Vec<Symbol> = operator_parts(&name_str)
            .into_iter()
            .map(|p| interner.intern(p))
            .collect();
        for &part in &parts {
            if part != Symbol::EMPTY {
                self.parts.insert(part);
            }
        }
        self.operators.insert(name);
        self.levels
            .entry((precedence, fixity))
            .or_default()
            .operators
            .insert(name, parts);
        Ok(())
    }

    /// The fixity of a level.
    pub fn fixity(&self, key: LevelKey) -> Fixity {
        key.1
    }

    /// The loosest level, if any operator has been declared.
    pub fn first_level(&self) -> Option<LevelKey> {
        self.levels.keys().next().copied()
    }

    /// The next tighter level after `key`.
    pub fn next_level(&self, key: LevelKey) -> Option<LevelKey> {
        self.levels
            .range((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(k, _)| *k)
    }

    pub fn is_declared_operator(&self, name: Symbol) -> bool {
        self.operators.contains(&name)
    }

    /// `true` if `sym` is a part of any declared operator (`+` for `_+_`).
    pub fn is_declared_part(&self, sym: Symbol) -> bool {
        self.parts.contains(&sym)
    }

    /// `true` if `status` is exactly the part list of an operator at `key`.
    pub fn is_status_in_level(&self, key: LevelKey, status: &[Symbol]) -> bool {
        self.levels
            .get(&key)
            .is_some_and(|level| level.operators.values().any(|parts| parts == status))
    }

    /// `true` if `status` is a prefix of some operator's part list at `key`.
    /// The empty status and a single filled slot are prefixes of everything.
    pub fn is_status_prefix_in_level(&self, key: LevelKey, status: &[Symbol]) -> bool {
        if status.is_empty() || (status.len() == 1 && status[0] == Symbol::EMPTY) {
            return true;
        }
        self.levels
            .get(&key)
            .is_some_and(|level| level.operators.values().any(|parts| parts.starts_with(status)))
    }

    /// `true` if some operator at `key` is the binary operator `_part_`.
    pub fn is_binop_in_level(&self, key: LevelKey, part: Symbol) -> bool {
        self.levels.get(&key).is_some_and(|level| {
            level.operators.values().any(|parts| {
                parts.len() == 3
                    && parts[0] == Symbol::EMPTY
                    && parts[1] == part
                    && parts[2] == Symbol::EMPTY
            })
        })
    }
}
