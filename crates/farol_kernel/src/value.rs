//! Runtime values and the metavariable store.
//!
//! # Values
//!
//! Weak evaluation produces [`Value`]s: integers, (possibly partially
//! applied) data constructors, closures, partially applied primitives,
//! suspended computations, and *flex structures*, which are logic variables
//! applied to arguments.
//!
//! A value is **decided** if it is not a thunk and not a flex structure
//! whose symbol has been instantiated; **strongly decided** further
//! requires recursively decided arguments.
//!
//! # The store
//!
//! Logic variables are indices into a central [`MetaStore`] holding one
//! indirection slot per variable. Instantiation is reversible:
//! [`MetaStore::uninstantiate`] undoes the most recent
//! [`MetaStore::instantiate`] of a cell, which is what makes backtracking
//! sound. [`MetaStore::representative`] chases chains of bare-metavariable
//! indirections with path compression.

use std::rc::Rc;

use farol_base::Symbol;
use farol_language::ast::Expr;

use crate::env::Env;

/// A logic-variable id, an index into the [`MetaStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaId(pub u32);

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    /// A data constructor applied to zero or more arguments.
    Rigid { constructor: Symbol, args: Vec<Value> },
    /// A logic variable applied to zero or more arguments.
    Flex { symbol: MetaId, args: Vec<Value> },
    Closure {
        var: Symbol,
        body: Rc<Expr>,
        env: Env,
    },
    /// A partially applied primitive; saturates at the primitive's arity.
    Primitive { name: Symbol, args: Vec<Value> },
    /// A suspended computation.
    Thunk { expr: Rc<Expr>, env: Env },
    /// A bare logic variable.
    Meta(MetaId),
}

impl Value {
    pub fn is_thunk(&self) -> bool {
        matches!(self, Value::Thunk { .. })
    }
}

/// One metavariable cell: a display prefix and the mutable indirection.
#[derive(Debug, Clone)]
struct MetaCell {
    prefix: &'static str,
    indirection: Option<Value>,
}

/// The central store of logic variables.
#[derive(Debug, Default)]
pub struct MetaStore {
    cells: Vec<MetaCell>,
}

impl MetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh, uninstantiated metavariable.
    pub fn fresh(&mut self, prefix: &'static str) -> MetaId {
        let id = MetaId(self.cells.len() as u32);
        self.cells.push(MetaCell {
            prefix,
            indirection: None,
        });
        id
    }

    pub fn is_instantiated(&self, id: MetaId) -> bool {
        self.cells[id.0 as usize].indirection.is_some()
    }

    /// Binds `id` to `value`. The cell must be uninstantiated.
    pub fn instantiate(&mut self, id: MetaId, value: Value) {
        let cell = &mut self.cells[id.0 as usize];
        debug_assert!(cell.indirection.is_none(), "metavariable bound twice");
        cell.indirection = Some(value);
    }

    /// Undoes the instantiation of `id`, restoring the cell to
    /// uninstantiated. Paired with every [`MetaStore::instantiate`] on the
    /// backtracking path.
    pub fn uninstantiate(&mut self, id: MetaId) {
        self.cells[id.0 as usize].indirection = None;
    }

    /// The current representative of `id`: the value at the end of its
    /// indirection chain, or `Value::Meta(id)` itself when uninstantiated.
    /// Chains of bare metavariables are path-compressed.
    pub fn representative(&mut self, id: MetaId) -> Value {
        match self.cells[id.0 as usize].indirection.clone() {
            None => Value::Meta(id),
            Some(Value::Meta(next)) => {
                let result = self.representative(next);
                self.cells[id.0 as usize].indirection = Some(result.clone());
                result
            }
            Some(other) => other,
        }
    }

    /// The raw indirection of a cell, without chasing.
    pub fn indirection(&self, id: MetaId) -> Option<&Value> {
        self.cells[id.0 as usize].indirection.as_ref()
    }

    /// Renders a metavariable as `?prefix index`.
    pub fn show_meta(&self, id: MetaId) -> String {
        format!("?{}{}", self.cells[id.0 as usize].prefix, id.0)
    }

    /// `true` when every cell is uninstantiated, the state an outside
    /// observer must find the store in after a consumer stops pulling.
    pub fn fully_uninstantiated(&self) -> bool {
        self.cells.iter().all(|cell| cell.indirection.is_none())
    }
}
