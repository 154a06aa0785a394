//! Persistent environments for the evaluator.
//!
//! An [`Env`] is a shared-mutable scope chain: [`Env::extended`] creates a
//! child that inherits lookups but isolates definitions, and dropping the
//! child restores the parent view.
//!
//! [`Env::set`] rebinds a name in the nearest scope where it is already
//! defined. The evaluator uses this for call-by-need memoisation: while a
//! solution for a variable is live downstream, the variable is rebound to
//! the forced value so every expression sharing the scope sees it, and the
//! original binding is restored symmetrically on resumption. Across
//! branches the environment appears immutable.
//!
//! Definition thunks in a `let` capture the extended environment itself,
//! which is what makes recursive definitions evaluable. (This also creates
//! reference cycles; environments live for the duration of a run, so no
//! collection is attempted.)

use std::cell::RefCell;
use std::rc::Rc;

use farol_base::Symbol;
use indexmap::IndexMap;

use crate::value::Value;

struct EnvNode {
    bindings: RefCell<IndexMap<Symbol, Value>>,
    parent: Option<Env>,
}

/// A scope chain mapping names to values. Cloning is cheap and shares the
/// underlying scopes.
#[derive(Clone)]
pub struct Env(Rc<EnvNode>);

impl Env {
    /// An empty root environment.
    pub fn new() -> Self {
        Env(Rc::new(EnvNode {
            bindings: RefCell::new(IndexMap::new()),
            parent: None,
        }))
    }

    /// A child scope: lookups fall through to `self`, definitions stay in
    /// the child.
    pub fn extended(&self) -> Env {
        Env(Rc::new(EnvNode {
            bindings: RefCell::new(IndexMap::new()),
            parent: Some(self.clone()),
        }))
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn define(&self, name: Symbol, value: Value) {
        self.0.bindings.borrow_mut().insert(name, value);
    }

    /// Rebinds `name` in the nearest scope where it is defined. Returns
    /// `false` if no scope defines it.
    pub fn set(&self, name: Symbol, value: Value) -> bool {
        let mut current = Some(self.clone());
        while let Some(env) = current {
            let mut bindings = env.0.bindings.borrow_mut();
            if bindings.contains_key(&name) {
                bindings.insert(name, value);
                return true;
            }
            drop(bindings);
            current = env.0.parent.clone();
        }
        false
    }

    pub fn is_defined(&self, name: Symbol) -> bool {
        self.value(name).is_some()
    }

    /// Looks `name` up through the scope chain.
    pub fn value(&self, name: Symbol) -> Option<Value> {
        let mut current = Some(self.clone());
        while let Some(env) = current {
            if let Some(value) = env.0.bindings.borrow().get(&name) {
                return Some(value.clone());
            }
            current = env.0.parent.clone();
        }
        None
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<env>")
    }
}
