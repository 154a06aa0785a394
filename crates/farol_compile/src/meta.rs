//! The central store of type metavariables, with first-order unification
//! over type expressions.
//!
//! Types are ordinary [`Expr`]s (variables, applications, arrows, `Forall`,
//! `Meta`). A `Meta` node carries only its id; the binding lives here, in a
//! `Vec<Option<Rc<Expr>>>` union-find. The checker allocates fresh
//! metavariables for unknown types and unifies them away; whatever remains
//! unbound at the end of a `let` scope is generalised into `Forall`s.
//!
//! Unification performs an occurs check, so cyclic types such as
//! `?a = ?a → ?a` are rejected rather than built.

use std::rc::Rc;

use farol_base::Span;
use farol_language::ast::{Declaration, Expr, ExprKind, MetaId};
use indexmap::IndexSet;

/// Why two types failed to unify.
#[derive(Debug, Clone)]
pub enum UnifyFailure {
    NotUnifiable(Rc<Expr>, Rc<Expr>),
    Occurs(MetaId, Rc<Expr>),
}

/// The store of type metavariable bindings.
#[derive(Debug, Default)]
pub struct TypeMetaStore {
    cells: Vec<Option<Rc<Expr>>>,
}

impl TypeMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh unbound metavariable as a type expression.
    pub fn fresh(&mut self, span: Span) -> Rc<Expr> {
        Expr::new(ExprKind::Meta(self.fresh_id()), span)
    }

    pub fn fresh_id(&mut self) -> MetaId {
        let id = MetaId(self.cells.len() as u32);
        self.cells.push(None);
        id
    }

    fn binding(&self, id: MetaId) -> Option<&Rc<Expr>> {
        self.cells[id.0 as usize].as_ref()
    }

    /// Follows metavariable bindings at the top of `ty`.
    pub fn resolve(&self, ty: &Rc<Expr>) -> Rc<Expr> {
        let mut current = Rc::clone(ty);
        while let ExprKind::Meta(id) = current.kind {
            match self.binding(id) {
                Some(bound) => current = Rc::clone(bound),
                None => break,
            }
        }
        current
    }

    /// Fully resolves bindings everywhere in `ty`; remaining `Meta` nodes
    /// are genuinely unbound.
    pub fn zonk(&self, ty: &Rc<Expr>) -> Rc<Expr> {
        let resolved = self.resolve(ty);
        match &resolved.kind {
            ExprKind::Integer(_)
            | ExprKind::Wildcard
            | ExprKind::Var(_)
            | ExprKind::Meta(_) => resolved,
            ExprKind::App(fun, arg) => Expr::new(
                ExprKind::App(self.zonk(fun), self.zonk(arg)),
                resolved.span,
            ),
            ExprKind::Lambda(var, body) => {
                Expr::new(ExprKind::Lambda(*var, self.zonk(body)), resolved.span)
            }
            ExprKind::Fresh(var, body) => {
                Expr::new(ExprKind::Fresh(*var, self.zonk(body)), resolved.span)
            }
            ExprKind::Forall(var, body) => {
                Expr::new(ExprKind::Forall(*var, self.zonk(body)), resolved.span)
            }
            ExprKind::Let(decls, body) => Expr::new(
                ExprKind::Let(decls.clone(), self.zonk(body)),
                resolved.span,
            ),
        }
    }

    /// Collects the unbound metavariables reachable from `ty`, following
    /// bindings, in first-occurrence order.
    pub fn free_metas(&self, ty: &Rc<Expr>, acc: &mut IndexSet<MetaId>) {
        match &ty.kind {
            ExprKind::Meta(id) => match self.binding(*id) {
                Some(bound) => self.free_metas(&Rc::clone(bound), acc),
                None => {
                    acc.insert(*id);
                }
            },
            ExprKind::App(fun, arg) => {
                self.free_metas(fun, acc);
                self.free_metas(arg, acc);
            }
            ExprKind::Lambda(_, body)
            | ExprKind::Fresh(_, body)
            | ExprKind::Forall(_, body) => self.free_metas(body, acc),
            ExprKind::Let(_, body) => self.free_metas(body, acc),
            ExprKind::Integer(_) | ExprKind::Wildcard | ExprKind::Var(_) => {}
        }
    }

    fn occurs(&self, id: MetaId, ty: &Rc<Expr>) -> bool {
        let mut metas = IndexSet::new();
        self.free_metas(ty, &mut metas);
        metas.contains(&id)
    }

    /// Unifies two types, binding metavariables as needed.
    pub fn unify(&mut self, a: &Rc<Expr>, b: &Rc<Expr>) -> Result<(), UnifyFailure> {
        let a = self.resolve(a);
        let b = self.resolve(b);
        match (&a.kind, &b.kind) {
            (ExprKind::Meta(x), ExprKind::Meta(y)) if x == y => Ok(()),
            (ExprKind::Meta(x), _) => {
                if self.occurs(*x, &b) {
                    return Err(UnifyFailure::Occurs(*x, Rc::clone(&b)));
                }
                self.cells[x.0 as usize] = Some(Rc::clone(&b));
                Ok(())
            }
            (_, ExprKind::Meta(y)) => {
                if self.occurs(*y, &a) {
                    return Err(UnifyFailure::Occurs(*y, Rc::clone(&a)));
                }
                self.cells[y.0 as usize] = Some(Rc::clone(&a));
                Ok(())
            }
            (ExprKind::Var(m), ExprKind::Var(n)) if m == n => Ok(()),
            (ExprKind::App(f1, a1), ExprKind::App(f2, a2)) => {
                let (f1, a1, f2, a2) =
                    (Rc::clone(f1), Rc::clone(a1), Rc::clone(f2), Rc::clone(a2));
                self.unify(&f1, &f2)?;
                self.unify(&a1, &a2)
            }
            _ => Err(UnifyFailure::NotUnifiable(Rc::clone(&a), Rc::clone(&b))),
        }
    }
}

/// Capture-respecting substitution of a type variable: occurrences of
/// `var` in `ty` become `replacement`, stopping under a binder that
/// shadows `var`.
pub fn subst_var(ty: &Rc<Expr>, var: farol_base::Symbol, replacement: &Rc<Expr>) -> Rc<Expr> {
    match &ty.kind {
        ExprKind::Var(name) if *name == var => Rc::clone(replacement),
        ExprKind::Var(_)
        | ExprKind::Integer(_)
        | ExprKind::Wildcard
        | ExprKind::Meta(_) => Rc::clone(ty),
        ExprKind::App(fun, arg) => Expr::new(
            ExprKind::App(
                subst_var(fun, var, replacement),
                subst_var(arg, var, replacement),
            ),
            ty.span,
        ),
        ExprKind::Lambda(bound, body) => {
            if *bound == var {
                Rc::clone(ty)
            } else {
                Expr::new(
                    ExprKind::Lambda(*bound, subst_var(body, var, replacement)),
                    ty.span,
                )
            }
        }
        ExprKind::Fresh(bound, body) => {
            if *bound == var {
                Rc::clone(ty)
            } else {
                Expr::new(
                    ExprKind::Fresh(*bound, subst_var(body, var, replacement)),
                    ty.span,
                )
            }
        }
        ExprKind::Forall(bound, body) => {
            if *bound == var {
                Rc::clone(ty)
            } else {
                Expr::new(
                    ExprKind::Forall(*bound, subst_var(body, var, replacement)),
                    ty.span,
                )
            }
        }
        ExprKind::Let(decls, body) => {
            let decls: Vec<Declaration> = decls.clone();
            Expr::new(
                ExprKind::Let(decls, subst_var(body, var, replacement)),
                ty.span,
            )
        }
    }
}

/// Replaces a (zonked, unbound) metavariable with another type. Used by
/// generalisation to turn `?t` into a `∀`-bound variable.
pub fn subst_meta(ty: &Rc<Expr>, target: MetaId, replacement: &Rc<Expr>) -> Rc<Expr> {
    match &ty.kind {
        ExprKind::Meta(id) if *id == target => Rc::clone(replacement),
        ExprKind::Meta(_)
        | ExprKind::Var(_)
        | ExprKind::Integer(_)
        | ExprKind::Wildcard => Rc::clone(ty),
        ExprKind::App(fun, arg) => Expr::new(
            ExprKind::App(
                subst_meta(fun, target, replacement),
                subst_meta(arg, target, replacement),
            ),
            ty.span,
        ),
        ExprKind::Lambda(var, body) => Expr::new(
            ExprKind::Lambda(*var, subst_meta(body, target, replacement)),
            ty.span,
        ),
        ExprKind::Fresh(var, body) => Expr::new(
            ExprKind::Fresh(*var, subst_meta(body, target, replacement)),
            ty.span,
        ),
        ExprKind::Forall(var, body) => Expr::new(
            ExprKind::Forall(*var, subst_meta(body, target, replacement)),
            ty.span,
        ),
        ExprKind::Let(decls, body) => Expr::new(
            ExprKind::Let(decls.clone(), subst_meta(body, target, replacement)),
            ty.span,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farol_base::{Interner, Symbol};
    use farol_language::ast;
    use farol_language::builtins::Names;

    fn setup() -> (Interner, Names) {
        let mut interner = Interner::new();
        let names = Names::new(&mut interner);
        (interner, names)
    }

    fn int(names: &Names) -> Rc<Expr> {
        Expr::var(names.int_type, Span::default())
    }

    #[test]
    fn unify_binds_and_resolve_follows() {
        let (_, names) = setup();
        let mut store = TypeMetaStore::new();
        let meta = store.fresh(Span::default());
        store.unify(&meta, &int(&names)).expect("unification failed");
        assert!(matches!(store.resolve(&meta).kind, ExprKind::Var(n) if n == names.int_type));
    }

    #[test]
    fn unify_chains_through_metas() {
        let (_, names) = setup();
        let mut store = TypeMetaStore::new();
        let m1 = store.fresh(Span::default());
        let m2 = store.fresh(Span::default());
        store.unify(&m1, &m2).expect("meta-meta unification failed");
        store.unify(&m2, &int(&names)).expect("binding failed");
        assert!(matches!(store.resolve(&m1).kind, ExprKind::Var(n) if n == names.int_type));
    }

    #[test]
    fn occurs_check_rejects_cyclic_types() {
        let (_, names) = setup();
        let mut store = TypeMetaStore::new();
        let meta = store.fresh(Span::default());
        let arrow = ast::function(&names, Rc::clone(&meta), Rc::clone(&meta));
        assert!(matches!(
            store.unify(&meta, &arrow),
            Err(UnifyFailure::Occurs(_, _))
        ));
    }

    #[test]
    fn mismatched_heads_do_not_unify() {
        let (_, names) = setup();
        let mut store = TypeMetaStore::new();
        let unit = Expr::var(names.unit_type, Span::default());
        let result = store.unify(&int(&names), &unit);
        assert!(matches!(result, Err(UnifyFailure::NotUnifiable(_, _))));
    }

    #[test]
    fn structural_unification_descends_into_applications() {
        let (mut interner, names) = setup();
        let mut store = TypeMetaStore::new();
        let list = interner.intern("List");
        let meta = store.fresh(Span::default());
        let list_meta = Expr::app(Expr::var(list, Span::default()), Rc::clone(&meta));
        let list_int = Expr::app(Expr::var(list, Span::default()), int(&names));
        store.unify(&list_meta, &list_int).expect("unification failed");
        assert!(matches!(store.resolve(&meta).kind, ExprKind::Var(n) if n == names.int_type));
    }

    #[test]
    fn zonk_expands_bindings_deeply() {
        let (_, names) = setup();
        let mut store = TypeMetaStore::new();
        let meta = store.fresh(Span::default());
        let arrow = ast::function(&names, Rc::clone(&meta), int(&names));
        store.unify(&meta, &int(&names)).expect("binding failed");
        let zonked = store.zonk(&arrow);
        let mut metas = IndexSet::new();
        store.free_metas(&zonked, &mut metas);
        assert!(metas.is_empty());
    }

    #[test]
    fn subst_var_respects_shadowing() {
        let (mut interner, names) = setup();
        let a = interner.intern("a");
        let body = ast::function(
            &names,
            Expr::var(a, Span::default()),
            Expr::var(a, Span::default()),
        );
        let shadowed = Expr::new(ExprKind::Forall(a, Rc::clone(&body)), Span::default());
        let replaced = subst_var(&shadowed, a, &int(&names));
        // the Forall binds `a`, so nothing changes underneath
        let ExprKind::Forall(_, inner) = &replaced.kind else {
            panic!("expected forall");
        };
        let mut free = inner.free_variables();
        assert!(free.shift_remove(&names.arrow));
        assert_eq!(free.len(), 1);
        assert!(free.contains(&a));
    }

    #[test]
    fn free_meta_collection_is_ordered() {
        let (_, names) = setup();
        let mut store = TypeMetaStore::new();
        let m1 = store.fresh(Span::default());
        let m2 = store.fresh(Span::default());
        let ty = ast::function(&names, Rc::clone(&m2), Rc::clone(&m1));
        let mut metas = IndexSet::new();
        store.free_metas(&ty, &mut metas);
        let ids: Vec<MetaId> = metas.into_iter().collect();
        assert_eq!(ids, vec![MetaId(1), MetaId(0)]);
    }
}
