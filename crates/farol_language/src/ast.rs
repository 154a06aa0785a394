//! The abstract syntax tree shared by every pipeline stage.
//!
//! There is a single expression tree: the parser produces it, the type
//! checker elaborates surface trees into core trees of the same type (types
//! themselves are expressions: applications of type constructors, arrows,
//! `Forall`s, and metavariables), and the evaluator consumes the core tree.
//!
//! Children are reference-counted so that thunks and closures created
//! during evaluation can share subtrees without cloning them.
//!
//! Besides the tree itself this module provides:
//!
//! - the `application_head` / `application_args` / arrow helpers the checker
//!   walks declarations with,
//! - the builders the elaborator desugars equations with
//!   ([`function_many`], [`fresh_many`], [`sequence_many1`],
//!   [`alternative_many`], ...),
//! - the mixfix-aware pretty printer [`Expr::show`], which re-renders
//!   `_+_ a b` as `a + b` and `((→ a) b)` as `a → b`.

use std::rc::Rc;

use farol_base::{Interner, Span, Symbol};
use indexmap::IndexSet;

use crate::builtins::Names;
use crate::token::{operator_arity, operator_parts};

/// A type-level metavariable id. The indirection cell lives in the type
/// checker's central store, not in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaId(pub u32);

/// An expression (or type — the tree is shared).
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Integer(i64),
    /// `_` — allowed only in definition patterns.
    Wildcard,
    Var(Symbol),
    App(Rc<Expr>, Rc<Expr>),
    /// `λ x . e` — surface syntax, and produced by equation desugaring.
    Lambda(Symbol, Rc<Expr>),
    /// `fresh x . e` — introduces a logic variable.
    Fresh(Symbol, Rc<Expr>),
    Let(Vec<Declaration>, Rc<Expr>),
    /// Type-level only: `∀ a . t`.
    Forall(Symbol, Rc<Expr>),
    /// Type-level unification variable.
    Meta(MetaId),
}

/// A declaration inside a `Let` (or at top level, where the parser wraps
/// all value declarations into one outer `Let`).
#[derive(Debug, Clone)]
pub enum Declaration {
    TypeSig(TypeDeclaration),
    Def(Definition),
}

/// `name : type`
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub name: Symbol,
    pub ty: Rc<Expr>,
    pub span: Span,
}

/// `lhs = rhs [where decls]` — the lhs is an application whose head is the
/// defined name and whose arguments are patterns.
#[derive(Debug, Clone)]
pub struct Definition {
    pub lhs: Rc<Expr>,
    pub rhs: Rc<Expr>,
    pub where_decls: Vec<Declaration>,
    pub span: Span,
}

/// `data T a₁ .. aₙ where { c : Type; ... }`
#[derive(Debug, Clone)]
pub struct DataDeclaration {
    pub lhs: Rc<Expr>,
    pub constructors: Vec<TypeDeclaration>,
    pub span: Span,
}

/// A parsed program: the data declarations plus one outer `Let` whose body
/// is `Variable("main")`.
#[derive(Debug, Clone)]
pub struct Program {
    pub data_declarations: Vec<DataDeclaration>,
    pub body: Rc<Expr>,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Rc<Expr> {
        Rc::new(Expr { kind, span })
    }

    pub fn var(name: Symbol, span: Span) -> Rc<Expr> {
        Expr::new(ExprKind::Var(name), span)
    }

    pub fn integer(value: i64, span: Span) -> Rc<Expr> {
        Expr::new(ExprKind::Integer(value), span)
    }

    pub fn app(fun: Rc<Expr>, arg: Rc<Expr>) -> Rc<Expr> {
        let span = fun.span.merge(arg.span);
        Expr::new(ExprKind::App(fun, arg), span)
    }

    /// `true` for expressions that print without parentheses.
    pub fn is_atom(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Integer(_) | ExprKind::Wildcard | ExprKind::Var(_) | ExprKind::Meta(_)
        )
    }

    /// The head of a (possibly nested) application; `e` itself when it is
    /// not an application.
    pub fn application_head(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::App(fun, _) = &expr.kind {
            expr = fun;
        }
        expr
    }

    /// The arguments of a (possibly nested) application, outermost last.
    /// `application_head` applied to them reconstructs `e`.
    pub fn application_args(&self) -> Vec<Rc<Expr>> {
        let mut args = Vec::new();
        let mut expr = self;
        while let ExprKind::App(fun, arg) = &expr.kind {
            args.push(Rc::clone(arg));
            expr = fun;
        }
        args.reverse();
        args
    }

    /// Splits `((→ a) b)` into `(a, b)`.
    pub fn as_arrow(&self, names: &Names) -> Option<(&Rc<Expr>, &Rc<Expr>)> {
        if let ExprKind::App(fun, codomain) = &self.kind {
            if let ExprKind::App(head, domain) = &fun.kind {
                if matches!(head.kind, ExprKind::Var(n) if n == names.arrow) {
                    return Some((domain, codomain));
                }
            }
        }
        None
    }

    /// `true` exactly when the expression has the shape `((→ a) b)`.
    pub fn is_arrow_type(&self, names: &Names) -> bool {
        self.as_arrow(names).is_some()
    }

    /// The free variables, in first-occurrence order.
    pub fn free_variables(&self) -> IndexSet<Symbol> {
        let mut acc = IndexSet::new();
        let mut bound = Vec::new();
        self.collect_free(&mut bound, &mut acc);
        acc
    }

    fn collect_free(&self, bound: &mut Vec<Symbol>, acc: &mut IndexSet<Symbol>) {
        match &self.kind {
            ExprKind::Integer(_) | ExprKind::Wildcard | ExprKind::Meta(_) => {}
            ExprKind::Var(name) => {
                if !bound.contains(name) {
                    acc.insert(*name);
                }
            }
            ExprKind::App(fun, arg) => {
                fun.collect_free(bound, acc);
                arg.collect_free(bound, acc);
            }
            ExprKind::Lambda(var, body)
            | ExprKind::Fresh(var, body)
            | ExprKind::Forall(var, body) => {
                bound.push(*var);
                body.collect_free(bound, acc);
                bound.pop();
            }
            ExprKind::Let(decls, body) => {
                let before = bound.len();
                for decl in decls {
                    match decl {
                        Declaration::TypeSig(sig) => bound.push(sig.name),
                        Declaration::Def(def) => {
                            if let ExprKind::Var(name) = def.lhs.application_head().kind {
                                bound.push(name);
                            }
                        }
                    }
                }
                for decl in decls {
                    if let Declaration::Def(def) = decl {
                        def.rhs.collect_free(bound, acc);
                    }
                }
                body.collect_free(bound, acc);
                bound.truncate(before);
            }
        }
    }
}

// ============================================================================
// Builders used by the parser and the elaborator
// ============================================================================

/// `a → b`
pub fn function(names: &Names, a: Rc<Expr>, b: Rc<Expr>) -> Rc<Expr> {
    let span = a.span.merge(b.span);
    Expr::app(Expr::app(Expr::var(names.arrow, span), a), b)
}

/// `p₁ → … → pₙ → result`
pub fn function_many(names: &Names, params: Vec<Rc<Expr>>, result: Rc<Expr>) -> Rc<Expr> {
    params
        .into_iter()
        .rev()
        .fold(result, |acc, param| function(names, param, acc))
}

/// Wraps `body` in `Forall`s; the first variable becomes the outermost.
pub fn forall_many(vars: &[Symbol], body: Rc<Expr>) -> Rc<Expr> {
    vars.iter().rev().fold(body, |acc, &var| {
        let span = acc.span;
        Expr::new(ExprKind::Forall(var, acc), span)
    })
}

/// `λ v₁ . … λ vₙ . body`
pub fn lambda_many(vars: &[Symbol], body: Rc<Expr>) -> Rc<Expr> {
    vars.iter().rev().fold(body, |acc, &var| {
        let span = acc.span;
        Expr::new(ExprKind::Lambda(var, acc), span)
    })
}

/// `fresh v₁ . … fresh vₙ . body`
pub fn fresh_many(vars: &[Symbol], body: Rc<Expr>) -> Rc<Expr> {
    vars.iter().rev().fold(body, |acc, &var| {
        let span = acc.span;
        Expr::new(ExprKind::Fresh(var, acc), span)
    })
}

/// `g₁ >> … >> gₙ >> last` (just `last` when there are no goals).
pub fn sequence_many1(names: &Names, goals: Vec<Rc<Expr>>, last: Rc<Expr>) -> Rc<Expr> {
    goals.into_iter().rev().fold(last, |acc, goal| {
        let span = goal.span.merge(acc.span);
        Expr::app(Expr::app(Expr::var(names.seq, span), goal), acc)
    })
}

/// `a₁ <> … <> aₙ` — `alternatives` must be non-empty.
pub fn alternative_many(names: &Names, mut alternatives: Vec<Rc<Expr>>) -> Rc<Expr> {
    let last = alternatives.pop().expect("alternative_many needs at least one alternative");
    alternatives.into_iter().rev().fold(last, |acc, alt| {
        let span = alt.span.merge(acc.span);
        Expr::app(Expr::app(Expr::var(names.alt, span), alt), acc)
    })
}

/// `a == b`
pub fn unify_call(names: &Names, a: Rc<Expr>, b: Rc<Expr>) -> Rc<Expr> {
    let span = a.span.merge(b.span);
    Expr::app(Expr::app(Expr::var(names.unify, span), a), b)
}

// ============================================================================
// Pretty printing
// ============================================================================

impl Expr {
    /// Renders the expression in surface syntax, reconstructing mixfix
    /// notation: `_+_ a b` prints as `a + b`, arrows print infix.
    pub fn show(&self, interner: &Interner) -> String {
        match &self.kind {
            ExprKind::Integer(n) => n.to_string(),
            ExprKind::Wildcard => "_".to_string(),
            ExprKind::Var(name) => interner.resolve(*name).to_string(),
            ExprKind::Meta(id) => format!("?{}", id.0),
            ExprKind::Lambda(var, body) => {
                format!("λ {} . {}", interner.resolve(*var), body.show(interner))
            }
            ExprKind::Fresh(var, body) => {
                format!("fresh {} . {}", interner.resolve(*var), body.show(interner))
            }
            ExprKind::Forall(var, body) => {
                format!("∀{}. {}", interner.resolve(*var), body.show(interner))
            }
            ExprKind::Let(decls, body) => {
                let shown: Vec<String> = decls.iter().map(|d| d.show(interner)).collect();
                format!("let {{ {} }} in {}", shown.join(" ; "), body.show(interner))
            }
            ExprKind::App(_, _) => self.show_application(interner),
        }
    }

    /// Like [`Expr::show`], parenthesising non-atoms.
    pub fn showp(&self, interner: &Interner) -> String {
        if self.is_atom() {
            self.show(interner)
        } else {
            format!("({})", self.show(interner))
        }
    }

    fn show_application(&self, interner: &Interner) -> String {
        if self.is_arrow_by_name(interner) {
            return self.show_arrow_type(interner);
        }
        let head = self.application_head();
        let args = self.application_args();
        let mut wrap_head = true;
        let (head_str, rest) = match head.kind {
            ExprKind::Var(name) => {
                let name_str = interner.resolve(name);
                let arity = operator_arity(name_str);
                if arity == 0 {
                    wrap_head = false;
                }
                if args.len() >= arity {
                    let shown = show_mixfix(name_str, &args[..arity], interner);
                    (shown, args[arity..].to_vec())
                } else {
                    (name_str.to_string(), args)
                }
            }
            _ => (head.show(interner), args),
        };
        if rest.is_empty() {
            return head_str;
        }
        let head_str = if wrap_head {
            format!("({})", head_str)
        } else {
            head_str
        };
        let shown_args: Vec<String> = rest.iter().map(|a| a.showp(interner)).collect();
        format!("{} {}", head_str, shown_args.join(" "))
    }

    fn is_arrow_by_name(&self, interner: &Interner) -> bool {
        if let ExprKind::App(fun, _) = &self.kind {
            if let ExprKind::App(head, _) = &fun.kind {
                return matches!(head.kind, ExprKind::Var(n) if interner.resolve(n) == "_→_");
            }
        }
        false
    }

    fn show_arrow_type(&self, interner: &Interner) -> String {
        let mut parts = Vec::new();
        let mut current = self;
        loop {
            if current.is_arrow_by_name(interner) {
                if let ExprKind::App(fun, codomain) = &current.kind {
                    if let ExprKind::App(_, domain) = &fun.kind {
                        parts.push(domain.showp(interner));
                        current = codomain;
                        continue;
                    }
                }
            }
            parts.push(current.show(interner));
            break;
        }
        parts.join(" → ")
    }
}

/// Interleaves the parts of `name` with rendered arguments:
/// `show_mixfix("_+_", [a, b])` is `"a + b"`.
fn show_mixfix(name: &str, args: &[Rc<Expr>], interner: &Interner) -> String {
    let mut rendered = Vec::new();
    let mut next_arg = 0;
    for part in operator_parts(name) {
        if part.is_empty() {
            rendered.push(args[next_arg].showp(interner));
            next_arg += 1;
        } else {
            rendered.push(part.to_string());
        }
    }
    rendered.join(" ")
}

impl Declaration {
    pub fn show(&self, interner: &Interner) -> String {
        match self {
            Declaration::TypeSig(sig) => sig.show(interner),
            Declaration::Def(def) => def.show(interner),
        }
    }
}

impl TypeDeclaration {
    pub fn show(&self, interner: &Interner) -> String {
        format!("{} : {}", interner.resolve(self.name), self.ty.show(interner))
    }
}

impl Definition {
    pub fn show(&self, interner: &Interner) -> String {
        format!("{} = {}", self.lhs.show(interner), self.rhs.show(interner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Interner, Names) {
        let mut interner = Interner::new();
        let names = Names::new(&mut interner);
        (interner, names)
    }

    #[test]
    fn application_head_and_args_reconstruct() {
        let (mut interner, _) = setup();
        let f = interner.intern("f");
        let expr = Expr::app(
            Expr::app(Expr::var(f, Span::default()), Expr::integer(1, Span::default())),
            Expr::integer(2, Span::default()),
        );
        assert!(matches!(expr.application_head().kind, ExprKind::Var(n) if n == f));
        let args = expr.application_args();
        assert_eq!(args.len(), 2);
        assert!(matches!(args[0].kind, ExprKind::Integer(1)));
        assert!(matches!(args[1].kind, ExprKind::Integer(2)));
    }

    #[test]
    fn arrow_shape_is_recognised() {
        let (mut interner, names) = setup();
        let a = Expr::var(interner.intern("a"), Span::default());
        let b = Expr::var(interner.intern("b"), Span::default());
        let arrow = function(&names, a, b);
        assert!(arrow.is_arrow_type(&names));
        let (dom, cod) = arrow.as_arrow(&names).unwrap();
        assert!(matches!(dom.kind, ExprKind::Var(_)));
        assert!(matches!(cod.kind, ExprKind::Var(_)));
    }

    #[test]
    fn arrow_types_render_infix_right_associated() {
        let (mut interner, names) = setup();
        let a = Expr::var(interner.intern("a"), Span::default());
        let b = Expr::var(interner.intern("b"), Span::default());
        let c = Expr::var(interner.intern("c"), Span::default());
        let ty = function(&names, a, function(&names, b, c));
        assert_eq!(ty.show(&interner), "a → b → c");
    }

    #[test]
    fn mixfix_applications_render_with_parts() {
        let (mut interner, _) = setup();
        let plus = interner.intern("_+_");
        let x = interner.intern("x");
        let expr = Expr::app(
            Expr::app(Expr::var(plus, Span::default()), Expr::var(x, Span::default())),
            Expr::integer(2, Span::default()),
        );
        assert_eq!(expr.show(&interner), "x + 2");
    }

    #[test]
    fn saturated_constructor_head_is_not_wrapped() {
        let (mut interner, _) = setup();
        let cons = interner.intern("cons");
        let expr = Expr::app(
            Expr::app(Expr::var(cons, Span::default()), Expr::integer(1, Span::default())),
            Expr::var(interner.intern("xs"), Span::default()),
        );
        assert_eq!(expr.show(&interner), "cons 1 xs");
    }

    #[test]
    fn oversaturated_mixfix_wraps_the_folded_head() {
        let (mut interner, _) = setup();
        let bang = interner.intern("_!");
        let f = Expr::app(
            Expr::var(bang, Span::default()),
            Expr::var(interner.intern("f"), Span::default()),
        );
        let expr = Expr::app(f, Expr::integer(3, Span::default()));
        assert_eq!(expr.show(&interner), "(f !) 3");
    }

    #[test]
    fn free_variables_in_first_occurrence_order() {
        let (mut interner, _) = setup();
        let f = interner.intern("f");
        let x = interner.intern("x");
        let y = interner.intern("y");
        let expr = Expr::app(
            Expr::app(Expr::var(f, Span::default()), Expr::var(x, Span::default())),
            Expr::app(Expr::var(y, Span::default()), Expr::var(x, Span::default())),
        );
        let free: Vec<Symbol> = expr.free_variables().into_iter().collect();
        assert_eq!(free, vec![f, x, y]);
    }

    #[test]
    fn binders_remove_their_variable() {
        let (mut interner, _) = setup();
        let x = interner.intern("x");
        let y = interner.intern("y");
        let body = Expr::app(Expr::var(x, Span::default()), Expr::var(y, Span::default()));
        let lam = lambda_many(&[x], body);
        let free: Vec<Symbol> = lam.free_variables().into_iter().collect();
        assert_eq!(free, vec![y]);
    }

    #[test]
    fn sequence_many1_folds_right() {
        let (mut interner, names) = setup();
        let g1 = Expr::var(interner.intern("g1"), Span::default());
        let g2 = Expr::var(interner.intern("g2"), Span::default());
        let body = Expr::integer(7, Span::default());
        let expr = sequence_many1(&names, vec![g1, g2], body);
        assert_eq!(expr.show(&interner), "g1 >> (g2 >> 7)");
    }

    #[test]
    fn alternative_many_single_is_identity() {
        let (mut interner, names) = setup();
        let a = Expr::var(interner.intern("a"), Span::default());
        let expr = alternative_many(&names, vec![a]);
        assert_eq!(expr.show(&interner), "a");
    }
}
