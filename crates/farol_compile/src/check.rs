//! The kind and type checker, which doubles as the elaborator.
//!
//! # Data declarations
//!
//! All declaration left-hand sides are checked first, each defining its
//! type name with a fresh kind `?k₁ → … → ?kₙ → *`; right-hand sides are
//! checked second, so constructors may refer to other data types regardless
//! of textual order. A constructor type must close over its free type
//! variables, have kind `*` once closed, and syntactically return an
//! instance of the type being declared.
//!
//! # Let checking
//!
//! Inside a `Let`:
//!
//! 1. a pre-pass stages type declarations and groups defining equations by
//!    head name, pre-binding each head to a fresh type metavariable so
//!    recursion checks;
//! 2. every declared name must have at least one defining equation;
//! 3. each equation group is desugared into a single definition
//!    `λ p₁ … λ pₙ . eq₁ <> … <> eqₖ`, each equation becoming
//!    `fresh fvs . (p₁ == π₁ >> … >> pₙ == πₙ >> body)`;
//! 4. metavariables not visible from an enclosing scope are generalised
//!    into `Forall`s;
//! 5. each user-written type declaration is reconciled against the
//!    inferred type: both are instantiated (the user's `Forall`s with
//!    fresh *variables*, the inferred ones with fresh *metavariables*) and
//!    unified, so the user may declare a less general type but not a more
//!    general one;
//! 6. the body is elaborated.
//!
//! The elaborated `Let` carries, for each definition, a type declaration
//! holding the final inferred type followed by the desugared definition.

use std::rc::Rc;

use farol_base::{Interner, Span, Symbol};
use farol_language::ast::{
    self, DataDeclaration, Declaration, Definition, Expr, ExprKind, MetaId, Program,
    TypeDeclaration,
};
use farol_language::builtins::Names;
use indexmap::{IndexMap, IndexSet};

use crate::error::{TypeError, TypeErrorKind};
use crate::kinds::{Kind, KindStore, KindUnifyError};
use crate::meta::{subst_meta, subst_var, TypeMetaStore, UnifyFailure};

/// A stack of scopes ("ribs") mapping names to values, innermost last.
#[derive(Debug)]
struct Ribs<T> {
    ribs: Vec<IndexMap<Symbol, T>>,
}

impl<T> Ribs<T> {
    fn new() -> Self {
        Self {
            ribs: vec![IndexMap::new()],
        }
    }

    fn define(&mut self, name: Symbol, value: T) {
        if let Some(rib) = self.ribs.last_mut() {
            rib.insert(name, value);
        }
    }

    fn is_locally_defined(&self, name: Symbol) -> bool {
        self.ribs.last().is_some_and(|rib| rib.contains_key(&name))
    }

    fn is_defined(&self, name: Symbol) -> bool {
        self.ribs.iter().rev().any(|rib| rib.contains_key(&name))
    }

    fn value(&self, name: Symbol) -> Option<&T> {
        self.ribs.iter().rev().find_map(|rib| rib.get(&name))
    }

    fn open_scope(&mut self) {
        self.ribs.push(IndexMap::new());
    }

    fn close_scope(&mut self) {
        self.ribs.pop();
    }

    fn current_names(&self) -> Vec<Symbol> {
        self.ribs
            .last()
            .map(|rib| rib.keys().copied().collect())
            .unwrap_or_default()
    }

    fn parent_values(&self) -> impl Iterator<Item = &T> + '_ {
        let parents = self.ribs.len().saturating_sub(1);
        self.ribs[..parents].iter().flat_map(|rib| rib.values())
    }
}

/// The farol type checker. Create one per program and call
/// [`TypeChecker::check_program`].
pub struct TypeChecker<'i> {
    interner: &'i mut Interner,
    names: Names,
    kinds: KindStore,
    metas: TypeMetaStore,
    /// Type names and type variables to their kinds.
    typenv: Ribs<Kind>,
    /// Value names to their types (types are expressions).
    env: Ribs<Rc<Expr>>,
    fresh_counter: u32,
}

impl<'i> TypeChecker<'i> {
    pub fn new(interner: &'i mut Interner, names: Names) -> Self {
        let mut checker = Self {
            interner,
            names,
            kinds: KindStore::new(),
            metas: TypeMetaStore::new(),
            typenv: Ribs::new(),
            env: Ribs::new(),
            fresh_counter: 0,
        };
        checker.define_primitives();
        checker
    }

    fn define_primitives(&mut self) {
        let names = self.names;
        self.typenv.define(
            names.arrow,
            Kind::Arrow(
                Box::new(Kind::Star),
                Box::new(Kind::Arrow(Box::new(Kind::Star), Box::new(Kind::Star))),
            ),
        );
        self.typenv.define(names.int_type, Kind::Star);
        self.typenv.define(names.unit_type, Kind::Star);

        let a = self.interner.intern("a");
        let b = self.interner.intern("b");
        let span = Span::default();
        let var = |name: Symbol| Expr::var(name, span);

        // _<>_ : ∀a. a → a → a
        let alt_type = ast::forall_many(
            &[a],
            ast::function(&names, var(a), ast::function(&names, var(a), var(a))),
        );
        self.env.define(names.alt, alt_type);

        // _>>_ : ∀a. ∀b. a → b → b
        let seq_type = ast::forall_many(
            &[a, b],
            ast::function(&names, var(a), ast::function(&names, var(b), var(b))),
        );
        self.env.define(names.seq, seq_type);

        // _==_ : ∀a. a → a → Unit
        let unify_type = ast::forall_many(
            &[a],
            ast::function(
                &names,
                var(a),
                ast::function(&names, var(a), var(names.unit_type)),
            ),
        );
        self.env.define(names.unify, unify_type);

        // unit : Unit
        self.env.define(names.unit_value, var(names.unit_type));
    }

    /// Checks a whole program and returns its elaborated form.
    pub fn check_program(&mut self, program: &Program) -> Result<Program, TypeError> {
        for decl in &program.data_declarations {
            self.check_data_declaration_lhs(decl)?;
        }
        for decl in &program.data_declarations {
            self.check_data_declaration_rhs(decl)?;
        }
        let (_body_type, body) = self.check_expr(&program.body)?;
        Ok(Program {
            data_declarations: program.data_declarations.clone(),
            body,
            span: program.span,
        })
    }

    /// The type currently recorded for `name` (useful after checking for
    /// constructor types, which live in the outermost scope).
    pub fn value_type(&self, name: Symbol) -> Option<Rc<Expr>> {
        self.env.value(name).cloned()
    }

    /// Renders the recorded type of `name`, zonked. The checker owns the
    /// interner borrow, so callers that only need a display string use
    /// this instead of [`TypeChecker::value_type`].
    pub fn show_type_of(&self, name: &str) -> Option<String> {
        let sym = self.interner.lookup(name)?;
        let ty = self.value_type(sym)?;
        Some(self.show_type(&ty))
    }

    // ------------------------------------------------------------------
    // Data declarations
    // ------------------------------------------------------------------

    fn check_data_declaration_lhs(&mut self, decl: &DataDeclaration) -> Result<(), TypeError> {
        let mut arity = 0;
        let mut lhs: &Expr = &decl.lhs;
        while let ExprKind::App(fun, arg) = &lhs.kind {
            if !matches!(arg.kind, ExprKind::Var(_)) {
                return Err(TypeError::new(TypeErrorKind::DataLhsArgVariable {
                    got: arg.show(self.interner),
                })
                .with_span(arg.span));
            }
            lhs = fun;
            arity += 1;
        }
        let ExprKind::Var(name) = lhs.kind else {
            return Err(TypeError::new(TypeErrorKind::DataLhsTypeVariable {
                got: lhs.show(self.interner),
            })
            .with_span(lhs.span));
        };
        if self.typenv.is_locally_defined(name) {
            return Err(TypeError::new(TypeErrorKind::DataLhsTypeAlreadyDefined {
                name: self.interner.resolve(name).to_string(),
            })
            .with_span(lhs.span));
        }
        let kind = self.kinds.fresh_kind(arity);
        self.typenv.define(name, kind);
        Ok(())
    }

    fn check_data_declaration_rhs(&mut self, decl: &DataDeclaration) -> Result<(), TypeError> {
        let ExprKind::Var(type_name) = decl.lhs.application_head().kind else {
            return Err(TypeError::new(TypeErrorKind::DataLhsTypeVariable {
                got: decl.lhs.show(self.interner),
            })
            .with_span(decl.span));
        };
        for constructor in &decl.constructors {
            self.check_constructor_declaration(type_name, constructor)?;
        }
        Ok(())
    }

    fn check_constructor_declaration(
        &mut self,
        type_name: Symbol,
        decl: &TypeDeclaration,
    ) -> Result<(), TypeError> {
        if self.env.is_locally_defined(decl.name) {
            return Err(TypeError::new(TypeErrorKind::ConstructorAlreadyDefined {
                name: self.interner.resolve(decl.name).to_string(),
            })
            .with_span(decl.span));
        }
        let closed = self.close_type(&decl.ty);
        self.typenv.open_scope();
        let atomic = self.check_type_has_atomic_kind(&closed, decl.ty.span);
        self.typenv.close_scope();
        atomic?;
        if !self.constructor_returns_instance(type_name, &decl.ty) {
            return Err(TypeError::new(TypeErrorKind::ConstructorMustReturnInstance {
                type_name: self.interner.resolve(type_name).to_string(),
                constructor_name: self.interner.resolve(decl.name).to_string(),
            })
            .with_span(decl.ty.span));
        }
        self.env.define(decl.name, closed);
        Ok(())
    }

    /// ∀-quantifies the type variables of `ty` that are not already known
    /// type names, in first-occurrence order.
    fn close_type(&self, ty: &Rc<Expr>) -> Rc<Expr> {
        let free: Vec<Symbol> = ty
            .free_variables()
            .into_iter()
            .filter(|var| !self.typenv.is_defined(*var))
            .collect();
        ast::forall_many(&free, Rc::clone(ty))
    }

    fn check_type_has_atomic_kind(&mut self, ty: &Rc<Expr>, span: Span) -> Result<(), TypeError> {
        let kind = self.check_type_kind(ty)?;
        self.kinds.unify(&kind, &Kind::Star).map_err(|_| {
            TypeError::new(TypeErrorKind::ExpectedAtomicKind {
                ty: ty.show(self.interner),
                kind: self.kinds.show(&kind),
            })
            .with_span(span)
        })
    }

    fn check_type_kind(&mut self, ty: &Rc<Expr>) -> Result<Kind, TypeError> {
        match &ty.kind {
            ExprKind::Var(name) => match self.typenv.value(*name) {
                Some(kind) => Ok(kind.clone()),
                None => Err(TypeError::new(TypeErrorKind::UndefinedType {
                    name: self.interner.resolve(*name).to_string(),
                })
                .with_span(ty.span)),
            },
            ExprKind::App(fun, arg) => {
                let fun_kind = self.check_type_kind(fun)?;
                let arg_kind = self.check_type_kind(arg)?;
                let result = self.kinds.fresh();
                self.kinds
                    .unify(
                        &fun_kind,
                        &Kind::Arrow(Box::new(arg_kind), Box::new(result.clone())),
                    )
                    .map_err(|err| {
                        let (kind1, kind2) = match err {
                            KindUnifyError::Mismatch(k1, k2) => {
                                (self.kinds.show(&k1), self.kinds.show(&k2))
                            }
                            KindUnifyError::Occurs(id, k) => {
                                (format!("?k{}", id.0), self.kinds.show(&k))
                            }
                        };
                        TypeError::new(TypeErrorKind::KindsDoNotUnify { kind1, kind2 })
                            .with_span(ty.span)
                    })?;
                Ok(result)
            }
            ExprKind::Forall(var, body) => {
                let fresh = self.kinds.fresh();
                self.typenv.define(*var, fresh);
                self.check_type_kind(body)
            }
            _ => Err(TypeError::new(TypeErrorKind::ExpectedAType {
                got: ty.show(self.interner),
            })
            .with_span(ty.span)),
        }
    }

    /// Walks through `Forall`s, arrows, and applications to the head and
    /// requires it to be the declared type name.
    fn constructor_returns_instance(&self, type_name: Symbol, ty: &Rc<Expr>) -> bool {
        if let ExprKind::Var(name) = ty.kind {
            return name == type_name;
        }
        if let Some((_, codomain)) = ty.as_arrow(&self.names) {
            return self.constructor_returns_instance(type_name, codomain);
        }
        match &ty.kind {
            ExprKind::App(fun, _) => self.constructor_returns_instance(type_name, fun),
            ExprKind::Forall(_, body) => self.constructor_returns_instance(type_name, body),
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn check_expr(&mut self, expr: &Rc<Expr>) -> Result<(Rc<Expr>, Rc<Expr>), TypeError> {
        match &expr.kind {
            ExprKind::Integer(_) => Ok((Expr::var(self.names.int_type, expr.span), Rc::clone(expr))),
            ExprKind::Var(name) => self.check_variable(expr, *name),
            ExprKind::App(fun, arg) => self.check_application(expr, fun, arg),
            ExprKind::Lambda(var, body) => self.check_lambda(expr, *var, body),
            ExprKind::Fresh(var, body) => self.check_fresh(expr, *var, body),
            ExprKind::Let(decls, body) => self.check_let(decls, body, expr.span),
            ExprKind::Wildcard => {
                Err(TypeError::new(TypeErrorKind::WildcardOutsidePattern).with_span(expr.span))
            }
            ExprKind::Forall(_, _) | ExprKind::Meta(_) => {
                Err(TypeError::new(TypeErrorKind::ExpectedAValue {
                    got: expr.show(self.interner),
                })
                .with_span(expr.span))
            }
        }
    }

    /// Variable lookup instantiates the type: `Forall`s are eliminated with
    /// fresh metavariables.
    fn check_variable(
        &mut self,
        expr: &Rc<Expr>,
        name: Symbol,
    ) -> Result<(Rc<Expr>, Rc<Expr>), TypeError> {
        let Some(ty) = self.env.value(name) else {
            return Err(TypeError::new(TypeErrorKind::UnboundVariable {
                name: self.interner.resolve(name).to_string(),
            })
            .with_span(expr.span));
        };
        let mut ty = ty.clone();
        loop {
            ty = self.metas.resolve(&ty);
            if let ExprKind::Forall(var, body) = &ty.kind {
                let fresh = self.metas.fresh(expr.span);
                ty = subst_var(body, *var, &fresh);
            } else {
                break;
            }
        }
        Ok((ty, Rc::clone(expr)))
    }

    fn check_application(
        &mut self,
        expr: &Rc<Expr>,
        fun: &Rc<Expr>,
        arg: &Rc<Expr>,
    ) -> Result<(Rc<Expr>, Rc<Expr>), TypeError> {
        let (fun_type, fun_elab) = self.check_expr(fun)?;
        let (arg_type, arg_elab) = self.check_expr(arg)?;
        let result = self.metas.fresh(expr.span);
        let expected = ast::function(&self.names, arg_type, Rc::clone(&result));
        self.unify_types(&fun_type, &expected, expr.span)?;
        Ok((result, Expr::app(fun_elab, arg_elab)))
    }

    fn check_lambda(
        &mut self,
        expr: &Rc<Expr>,
        var: Symbol,
        body: &Rc<Expr>,
    ) -> Result<(Rc<Expr>, Rc<Expr>), TypeError> {
        self.env.open_scope();
        let var_type = self.metas.fresh(expr.span);
        self.env.define(var, Rc::clone(&var_type));
        let (body_type, body_elab) = self.check_expr(body)?;
        self.env.close_scope();
        Ok((
            ast::function(&self.names, var_type, body_type),
            Expr::new(ExprKind::Lambda(var, body_elab), expr.span),
        ))
    }

    fn check_fresh(
        &mut self,
        expr: &Rc<Expr>,
        var: Symbol,
        body: &Rc<Expr>,
    ) -> Result<(Rc<Expr>, Rc<Expr>), TypeError> {
        self.env.open_scope();
        let var_type = self.metas.fresh(expr.span);
        self.env.define(var, var_type);
        let (body_type, body_elab) = self.check_expr(body)?;
        self.env.close_scope();
        Ok((body_type, Expr::new(ExprKind::Fresh(var, body_elab), expr.span)))
    }

    // ------------------------------------------------------------------
    // Let checking
    // ------------------------------------------------------------------

    fn check_let(
        &mut self,
        decls: &[Declaration],
        body: &Rc<Expr>,
        span: Span,
    ) -> Result<(Rc<Expr>, Rc<Expr>), TypeError> {
        self.env.open_scope();

        let mut declared: IndexSet<Symbol> = IndexSet::new();
        let mut definitions: IndexMap<Symbol, Vec<Definition>> = IndexMap::new();
        let mut type_declarations: Vec<TypeDeclaration> = Vec::new();

        for decl in decls {
            match decl {
                Declaration::TypeSig(sig) => {
                    let checked = self.check_type_declaration(sig)?;
                    declared.insert(checked.name);
                    type_declarations.push(checked);
                }
                Declaration::Def(def) => {
                    let head = def.lhs.application_head();
                    let ExprKind::Var(name) = head.kind else {
                        return Err(TypeError::new(
                            TypeErrorKind::DeclarationHeadIsNotVariable {
                                got: head.show(self.interner),
                            },
                        )
                        .with_span(def.span));
                    };
                    declared.insert(name);
                    definitions.entry(name).or_default().push(def.clone());
                    if !self.env.is_locally_defined(name) {
                        let pre_bound = self.metas.fresh(def.span);
                        self.env.define(name, pre_bound);
                    }
                }
            }
        }

        for name in &declared {
            if !definitions.contains_key(name) {
                return Err(TypeError::new(TypeErrorKind::NameDeclaredButNotDefined {
                    name: self.interner.resolve(*name).to_string(),
                })
                .with_span(span));
            }
        }

        let mut elaborated_defs: Vec<Definition> = Vec::new();
        let grouped: Vec<(Symbol, Vec<Definition>)> = definitions.into_iter().collect();
        for (name, equations) in &grouped {
            elaborated_defs.push(self.desugar_definition(*name, equations)?);
        }

        self.generalize_current_scope();
        self.reconcile_declared(&type_declarations)?;

        let (body_type, body_elab) = self.check_expr(body)?;

        let mut out_decls: Vec<Declaration> = Vec::new();
        for def in elaborated_defs {
            let ExprKind::Var(name) = def.lhs.kind else {
                continue;
            };
            if let Some(ty) = self.env.value(name) {
                out_decls.push(Declaration::TypeSig(TypeDeclaration {
                    name,
                    ty: ty.clone(),
                    span: def.span,
                }));
            }
            out_decls.push(Declaration::Def(def));
        }

        self.env.close_scope();
        Ok((
            body_type,
            Expr::new(ExprKind::Let(out_decls, body_elab), span),
        ))
    }

    fn check_type_declaration(
        &mut self,
        sig: &TypeDeclaration,
    ) -> Result<TypeDeclaration, TypeError> {
        if self.env.is_locally_defined(sig.name) {
            return Err(TypeError::new(TypeErrorKind::ValueAlreadyDefined {
                name: self.interner.resolve(sig.name).to_string(),
            })
            .with_span(sig.span));
        }
        let closed = self.close_type(&sig.ty);
        self.typenv.open_scope();
        let atomic = self.check_type_has_atomic_kind(&closed, sig.ty.span);
        self.typenv.close_scope();
        atomic?;
        Ok(TypeDeclaration {
            name: sig.name,
            ty: closed,
            span: sig.span,
        })
    }

    // ------------------------------------------------------------------
    // Equation desugaring
    // ------------------------------------------------------------------

    fn desugar_definition(
        &mut self,
        name: Symbol,
        equations: &[Definition],
    ) -> Result<Definition, TypeError> {
        let span = equations[0].span;
        let first_patterns = equations[0].lhs.application_args();
        let params: Vec<Symbol> = first_patterns
            .iter()
            .map(|_| self.fresh_name("p"))
            .collect();

        let definition_type = match self.env.value(name) {
            Some(ty) => ty.clone(),
            None => {
                return Err(TypeError::new(TypeErrorKind::UnboundVariable {
                    name: self.interner.resolve(name).to_string(),
                })
                .with_span(span))
            }
        };

        self.env.open_scope(); // definition scope

        let mut param_types: Vec<Rc<Expr>> = Vec::new();
        for &param in &params {
            let param_type = self.metas.fresh(span);
            self.env.define(param, Rc::clone(&param_type));
            param_types.push(param_type);
        }
        let result_type = self.metas.fresh(span);

        let shape = ast::function_many(&self.names, param_types.clone(), Rc::clone(&result_type));
        self.unify_types(&definition_type, &shape, span)?;

        let mut alternatives: Vec<Rc<Expr>> = Vec::new();
        for equation in equations {
            alternatives.push(self.desugar_equation(
                name,
                &params,
                &param_types,
                &result_type,
                equation,
            )?);
        }

        let rhs = ast::lambda_many(&params, ast::alternative_many(&self.names, alternatives));
        self.env.close_scope();
        Ok(Definition {
            lhs: Expr::var(name, span),
            rhs,
            where_decls: Vec::new(),
            span,
        })
    }

    fn desugar_equation(
        &mut self,
        name: Symbol,
        params: &[Symbol],
        param_types: &[Rc<Expr>],
        result_type: &Rc<Expr>,
        equation: &Definition,
    ) -> Result<Rc<Expr>, TypeError> {
        let span = equation.span;
        let raw_patterns = equation.lhs.application_args();
        if raw_patterns.len() != params.len() {
            return Err(TypeError::new(TypeErrorKind::EquationsArityMismatch {
                name: self.interner.resolve(name).to_string(),
            })
            .with_span(span));
        }
        let patterns: Vec<Rc<Expr>> = raw_patterns
            .iter()
            .map(|pattern| self.replace_wildcards(pattern))
            .collect();

        self.env.open_scope(); // equation scope

        let mut fresh_vars: Vec<Symbol> = Vec::new();
        for pattern in &patterns {
            for var in pattern.free_variables() {
                if !self.env.is_defined(var) {
                    fresh_vars.push(var);
                    let meta = self.metas.fresh(span);
                    self.env.define(var, meta);
                }
            }
        }

        let (body_type, body_elab) = if equation.where_decls.is_empty() {
            self.check_expr(&equation.rhs)?
        } else {
            self.check_let(&equation.where_decls, &equation.rhs, span)?
        };
        self.unify_types(&body_type, result_type, span)?;

        let mut goals: Vec<Rc<Expr>> = Vec::new();
        for ((param, pattern), param_type) in params.iter().zip(&patterns).zip(param_types) {
            let (pattern_type, pattern_elab) = self.check_expr(pattern)?;
            self.unify_types(param_type, &pattern_type, pattern.span)?;
            goals.push(ast::unify_call(
                &self.names,
                Expr::var(*param, span),
                pattern_elab,
            ));
        }

        let alternative = ast::fresh_many(
            &fresh_vars,
            ast::sequence_many1(&self.names, goals, body_elab),
        );
        self.env.close_scope();
        Ok(alternative)
    }

    /// Pattern wildcards become fresh pattern variables, which then join
    /// the equation's `fresh` binders like any other pattern variable.
    fn replace_wildcards(&mut self, pattern: &Rc<Expr>) -> Rc<Expr> {
        match &pattern.kind {
            ExprKind::Wildcard => Expr::var(self.fresh_name("w"), pattern.span),
            ExprKind::App(fun, arg) => {
                let fun = self.replace_wildcards(fun);
                let arg = self.replace_wildcards(arg);
                Expr::new(ExprKind::App(fun, arg), pattern.span)
            }
            _ => Rc::clone(pattern),
        }
    }

    // ------------------------------------------------------------------
    // Generalisation and reconciliation
    // ------------------------------------------------------------------

    /// Promotes metavariables of the current scope that are not visible
    /// from an enclosing scope into `Forall`-bound variables.
    fn generalize_current_scope(&mut self) {
        let mut forbidden: IndexSet<MetaId> = IndexSet::new();
        for ty in self.env.parent_values() {
            self.metas.free_metas(ty, &mut forbidden);
        }
        for name in self.env.current_names() {
            let Some(ty) = self.env.value(name) else {
                continue;
            };
            let zonked = self.metas.zonk(&ty.clone());
            let mut free: IndexSet<MetaId> = IndexSet::new();
            self.metas.free_metas(&zonked, &mut free);
            let generalizable: Vec<MetaId> = free
                .into_iter()
                .filter(|meta| !forbidden.contains(meta))
                .collect();

            let used = zonked.free_variables();
            let mut bound: Vec<Symbol> = Vec::new();
            let mut ty_new = zonked;
            for meta in generalizable {
                let var = self.pick_type_var_name(&used, &bound);
                ty_new = subst_meta(&ty_new, meta, &Expr::var(var, ty_new.span));
                bound.push(var);
            }
            let ty_new = ast::forall_many(&bound, ty_new);
            self.env.define(name, ty_new);
        }
    }

    /// Checks that each user-written type declaration subsumes the
    /// inferred type, up to alpha-equivalence and instantiation.
    fn reconcile_declared(
        &mut self,
        type_declarations: &[TypeDeclaration],
    ) -> Result<(), TypeError> {
        for sig in type_declarations {
            // The user's Foralls become fresh (rigid) variables...
            let mut user = Rc::clone(&sig.ty);
            while let ExprKind::Forall(var, body) = &user.kind {
                let prefix = self.interner.resolve(*var).to_string();
                let skolem = self.fresh_name(&prefix);
                user = subst_var(body, *var, &Expr::var(skolem, sig.span));
            }
            // ...while the inferred Foralls become fresh metavariables.
            let Some(actual) = self.env.value(sig.name) else {
                continue;
            };
            let mut actual = actual.clone();
            loop {
                actual = self.metas.resolve(&actual);
                if let ExprKind::Forall(var, body) = &actual.kind {
                    let fresh = self.metas.fresh(sig.span);
                    actual = subst_var(body, *var, &fresh);
                } else {
                    break;
                }
            }
            self.unify_types(&actual, &user, sig.span)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn unify_types(&mut self, a: &Rc<Expr>, b: &Rc<Expr>, span: Span) -> Result<(), TypeError> {
        self.metas.unify(a, b).map_err(|failure| match failure {
            UnifyFailure::NotUnifiable(t1, t2) => {
                TypeError::new(TypeErrorKind::TypesDoNotUnify {
                    type1: self.show_type(&t1),
                    type2: self.show_type(&t2),
                })
                .with_span(span)
            }
            UnifyFailure::Occurs(id, ty) => TypeError::new(TypeErrorKind::OccursCheck {
                meta: format!("?{}", id.0),
                ty: self.show_type(&ty),
            })
            .with_span(span),
        })
    }

    fn show_type(&self, ty: &Rc<Expr>) -> String {
        self.metas.zonk(ty).show(self.interner)
    }

    /// Fresh names embed a `.`, which can never appear inside a lexed
    /// identifier, so they cannot collide with user names.
    fn fresh_name(&mut self, prefix: &str) -> Symbol {
        let name = format!("{}.{}", prefix, self.fresh_counter);
        self.fresh_counter += 1;
        self.interner.intern(&name)
    }

    /// A pretty name (`a`, `b`, …) for a generalised variable, avoiding
    /// the variables already free or bound in the type.
    fn pick_type_var_name(&mut self, used: &IndexSet<Symbol>, bound: &[Symbol]) -> Symbol {
        let mut round = 0u32;
        loop {
            for letter in b'a'..=b'z' {
                let candidate = if round == 0 {
                    (letter as char).to_string()
                } else {
                    format!("{}{}", letter as char, round)
                };
                let sym = self.interner.intern(&candidate);
                if !used.contains(&sym) && !bound.contains(&sym) {
                    return sym;
                }
            }
            round += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farol_language::lexer::Lexer;
    use farol_language::parser::Parser;

    fn check(source: &str) -> (Interner, Program) {
        let mut interner = Interner::new();
        let tokens = Lexer::new(source, &mut interner)
            .tokenize()
            .expect("lexing failed");
        let mut parser = Parser::new(tokens, &mut interner);
        let program = parser.parse_program().expect("parsing failed");
        let names = Names::new(&mut interner);
        let mut checker = TypeChecker::new(&mut interner, names);
        let elaborated = checker.check_program(&program).expect("checking failed");
        (interner, elaborated)
    }

    fn check_err(source: &str) -> TypeError {
        let mut interner = Interner::new();
        let tokens = Lexer::new(source, &mut interner)
            .tokenize()
            .expect("lexing failed");
        let mut parser = Parser::new(tokens, &mut interner);
        let program = parser.parse_program().expect("parsing failed");
        let names = Names::new(&mut interner);
        let mut checker = TypeChecker::new(&mut interner, names);
        checker
            .check_program(&program)
            .expect_err("checking should fail")
    }

    /// The recorded (generalised) type of `name` in the elaborated
    /// program's outer let.
    fn type_of(program: &Program, interner: &Interner, name: &str) -> String {
        let ExprKind::Let(decls, _) = &program.body.kind else {
            panic!("program body is not a let");
        };
        for decl in decls {
            if let Declaration::TypeSig(sig) = decl {
                if interner.resolve(sig.name) == name {
                    return sig.ty.show(interner);
                }
            }
        }
        panic!("no type recorded for {}", name);
    }

    #[test]
    fn constructor_types_close_over_their_variables() {
        let src = "data List a where { nil : List a ; cons : a → List a → List a }\nmain = nil";
        let mut interner = Interner::new();
        let tokens = Lexer::new(src, &mut interner).tokenize().unwrap();
        let mut parser = Parser::new(tokens, &mut interner);
        let program = parser.parse_program().unwrap();
        let names = Names::new(&mut interner);
        let mut checker = TypeChecker::new(&mut interner, names);
        checker.check_program(&program).expect("checking failed");
        assert_eq!(
            checker.show_type_of("cons").expect("cons has a type"),
            "∀a. a → (List a) → List a"
        );
        assert_eq!(
            checker.show_type_of("nil").expect("nil has a type"),
            "∀a. List a"
        );
    }

    #[test]
    fn identity_generalises_to_forall() {
        let (interner, program) = check("main x = x");
        assert_eq!(type_of(&program, &interner, "main"), "∀a. a → a");
    }

    #[test]
    fn integer_body_types_as_int() {
        let (interner, program) = check("main = 42");
        assert_eq!(type_of(&program, &interner, "main"), "Int");
    }

    #[test]
    fn self_application_fails_occurs_check() {
        let err = check_err("main x = x x");
        assert_eq!(err.code(), "occurs-check");
    }

    #[test]
    fn unbound_variable_is_reported() {
        let err = check_err("main = ghost");
        assert_eq!(err.code(), "unbound-variable");
    }

    #[test]
    fn declared_but_undefined_name_is_reported() {
        let err = check_err("f : Int\nmain = 1");
        assert_eq!(err.code(), "name-declared-but-not-defined");
    }

    #[test]
    fn equations_must_share_arity() {
        let err = check_err("f 1 = 1\nf 1 2 = 2\nmain = f 0");
        assert_eq!(err.code(), "equations-arity-mismatch");
    }

    #[test]
    fn declared_type_must_subsume_inferred() {
        let src = "id : a → a\nid x = x\nmain = id 1";
        let (interner, program) = check(src);
        assert_eq!(type_of(&program, &interner, "id"), "∀a. a → a");
    }

    #[test]
    fn too_general_declared_type_is_rejected() {
        let err = check_err("f : a → b\nf x = x\nmain = f 1");
        assert_eq!(err.code(), "types-do-not-unify");
    }

    #[test]
    fn declared_type_may_be_more_specific() {
        let src = "id : Int → Int\nid x = x\nmain = id 1";
        let (interner, program) = check(src);
        // the recorded type stays the inferred, more general one
        assert_eq!(type_of(&program, &interner, "id"), "∀a. a → a");
    }

    #[test]
    fn constructor_must_return_instance_of_its_type() {
        let err = check_err("data T where { c : Int }\nmain = c");
        assert_eq!(err.code(), "constructor-must-return-instance");
    }

    #[test]
    fn data_type_parameters_must_be_variables() {
        let err = check_err("data T 5 where { c : T 5 }\nmain = c");
        assert_eq!(err.code(), "data-lhs-arg-variable");
    }

    #[test]
    fn over_applied_type_constructor_is_a_kind_error() {
        let err = check_err("data T a where { c : T a }\nf : T Int Int\nf = c\nmain = f");
        assert_eq!(err.code(), "kinds-do-not-unify");
    }

    #[test]
    fn undefined_type_is_reported() {
        let err = check_err("f : Ghost\nf = 1\nmain = f");
        assert_eq!(err.code(), "undefined-type");
    }

    #[test]
    fn equations_desugar_to_fresh_unify_sequence() {
        let (interner, program) = check("data Nat where { zero : Nat ; succ : Nat → Nat }\nf zero = 1\nf (succ n) = 2\nmain = f zero");
        let ExprKind::Let(decls, _) = &program.body.kind else {
            panic!("not a let");
        };
        let def = decls
            .iter()
            .find_map(|d| match d {
                Declaration::Def(def)
                    if matches!(def.lhs.kind, ExprKind::Var(n) if interner.resolve(n) == "f") =>
                {
                    Some(def)
                }
                _ => None,
            })
            .expect("f is defined");
        // λ p . (p == zero >> 1) <> (fresh n . p == succ n >> 2)
        let ExprKind::Lambda(_, body) = &def.rhs.kind else {
            panic!("definition does not start with a lambda");
        };
        let shown = body.show(&interner);
        assert!(shown.contains("<>"), "alternatives missing: {}", shown);
        assert!(shown.contains(">>"), "goals missing: {}", shown);
        assert!(shown.contains("fresh n ."), "fresh binder missing: {}", shown);
    }

    #[test]
    fn where_clauses_check_as_inner_lets() {
        let (interner, program) = check("main = f 1\n  where\n    f x = x");
        assert_eq!(type_of(&program, &interner, "main"), "Int");
    }

    #[test]
    fn wildcard_patterns_become_fresh_variables() {
        let (interner, program) = check("f _ = 7\nmain = f 1");
        assert_eq!(type_of(&program, &interner, "f"), "∀a. a → Int");
    }

    #[test]
    fn wildcard_outside_pattern_is_rejected() {
        let err = check_err("main = _");
        assert_eq!(err.code(), "wildcard-outside-pattern");
    }

    #[test]
    fn lambda_infers_an_arrow() {
        let (interner, program) = check("main = λ x . x");
        assert_eq!(type_of(&program, &interner, "main"), "∀a. a → a");
    }

    #[test]
    fn primitives_are_typed() {
        let (interner, program) = check("main = 1 >> 2");
        assert_eq!(type_of(&program, &interner, "main"), "Int");
        let (interner, program) = check("main = 1 <> 2");
        assert_eq!(type_of(&program, &interner, "main"), "Int");
        let (interner, program) = check("main = fresh x . x == 5 >> x");
        assert_eq!(type_of(&program, &interner, "main"), "Int");
    }

    #[test]
    fn alternative_branches_must_agree() {
        let err = check_err("data B where { t : B }\nmain = 1 <> t");
        assert_eq!(err.code(), "types-do-not-unify");
    }

    #[test]
    fn recursive_definitions_typecheck() {
        let src = "data Nat where { zero : Nat ; succ : Nat → Nat }\n\
                   double zero = zero\n\
                   double (succ n) = succ (succ (double n))\n\
                   main = double (succ zero)";
        let (interner, program) = check(src);
        assert_eq!(type_of(&program, &interner, "double"), "Nat → Nat");
    }
}
