//! The kind algebra: `* | k → k | ?k`.
//!
//! Kinds classify type expressions. A data declaration `data T a b where …`
//! gives `T` the kind `?k₁ → ?k₂ → *`, and kind checking the constructor
//! types unifies the metavariables away.
//!
//! Kind metavariables are indices into a central store, a union-find of
//! `Option<Kind>` bindings allocated by [`KindStore::fresh`].

use std::fmt::Write as _;

/// A kind metavariable id, an index into the [`KindStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KindId(pub u32);

/// A kind: the kind of value types `*`, type-constructor kinds `k → k`, or
/// an unsolved metavariable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Star,
    Arrow(Box<Kind>, Box<Kind>),
    Meta(KindId),
}

/// Why two kinds failed to unify.
#[derive(Debug, Clone)]
pub enum KindUnifyError {
    Mismatch(Kind, Kind),
    Occurs(KindId, Kind),
}

/// The central store of kind metavariable bindings.
#[derive(Debug, Default)]
pub struct KindStore {
    cells: Vec<Option<Kind>>,
}

impl KindStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh unbound kind metavariable.
    pub fn fresh(&mut self) -> Kind {
        let id = KindId(self.cells.len() as u32);
        self.cells.push(None);
        Kind::Meta(id)
    }

    /// `?k₁ → … → ?kₙ → *`, the kind of an `n`-parameter data type.
    pub fn fresh_kind(&mut self, arity: usize) -> Kind {
        let mut kind = Kind::Star;
        for _ in 0..arity {
            let domain = self.fresh();
            kind = Kind::Arrow(Box::new(domain), Box::new(kind));
        }
        kind
    }

    /// Follows metavariable bindings at the top of `kind`.
    pub fn resolve(&self, kind: &Kind) -> Kind {
        let mut current = kind.clone();
        while let Kind::Meta(id) = current {
            match &self.cells[id.0 as usize] {
                Some(bound) => current = bound.clone(),
                None => break,
            }
        }
        current
    }

    /// Fully resolves metavariables everywhere in `kind`.
    pub fn zonk(&self, kind: &Kind) -> Kind {
        match self.resolve(kind) {
            Kind::Star => Kind::Star,
            Kind::Arrow(domain, codomain) => Kind::Arrow(
                Box::new(self.zonk(&domain)),
                Box::new(self.zonk(&codomain)),
            ),
            meta @ Kind::Meta(_) => meta,
        }
    }

    fn occurs(&self, id: KindId, kind: &Kind) -> bool {
        match self.resolve(kind) {
            Kind::Star => false,
            Kind::Arrow(domain, codomain) => {
                self.occurs(id, &domain) || self.occurs(id, &codomain)
            }
            Kind::Meta(other) => other == id,
        }
    }

    /// Unifies two kinds, binding metavariables as needed.
    pub fn unify(&mut self, a: &Kind, b: &Kind) -> Result<(), KindUnifyError> {
        let a = self.resolve(a);
        let b = self.resolve(b);
        match (&a, &b) {
            (Kind::Meta(x), Kind::Meta(y)) if x == y => Ok(()),
            (Kind::Meta(x), _) => {
                if self.occurs(*x, &b) {
                    return Err(KindUnifyError::Occurs(*x, b.clone()));
                }
                self.cells[x.0 as usize] = Some(b.clone());
                Ok(())
            }
            (_, Kind::Meta(y)) => {
                if self.occurs(*y, &a) {
                    return Err(KindUnifyError::Occurs(*y, a.clone()));
                }
                self.cells[y.0 as usize] = Some(a.clone());
                Ok(())
            }
            (Kind::Star, Kind::Star) => Ok(()),
            (Kind::Arrow(d1, c1), Kind::Arrow(d2, c2)) => {
                let (d1, c1, d2, c2) = (
                    d1.as_ref().clone(),
                    c1.as_ref().clone(),
                    d2.as_ref().clone(),
                    c2.as_ref().clone(),
                );
                self.unify(&d1, &d2)?;
                self.unify(&c1, &c2)
            }
            _ => Err(KindUnifyError::Mismatch(a.clone(), b.clone())),
        }
    }

    /// Renders a kind for diagnostics, e.g. `(* → *) → *`.
    pub fn show(&self, kind: &Kind) -> String {
        let mut out = String::new();
        self.show_into(&self.zonk(kind), false, &mut out);
        out
    }

    fn show_into(&self, kind: &Kind, parenthesise: bool, out: &mut String) {
        match kind {
            Kind::Star => out.push('*'),
            Kind::Meta(id) => {
                let _ = write!(out, "?k{}", id.0);
            }
            Kind::Arrow(domain, codomain) => {
                if parenthesise {
                    out.push('(');
                }
                self.show_into(domain, true, out);
                out.push_str(" → ");
                self.show_into(codomain, false, out);
                if parenthesise {
                    out.push(')');
                }
            }
        }
    }
}
