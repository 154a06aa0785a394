//! The backtracking evaluator.
//!
//! # Weak evaluation
//!
//! [`Evaluator::eval_program`] reduces the program body to a lazy stream of
//! weak values. Variables are call-by-need: forcing a variable rebinds it
//! to each forced value while that solution is live downstream, restoring
//! the original binding on resumption (see [`MemoVar`]).
//!
//! # The three primitives
//!
//! - `_>>_` (sequence): for each solution of the left operand, every
//!   solution of the right; the left value is discarded, its store
//!   effects are kept.
//! - `_<>_` (alternative): every solution of the left operand, then every
//!   solution of the right.
//! - `_==_` (unify): one `unit` solution per consistent instantiation of
//!   metavariables, undone on backtracking.
//!
//! # Unification
//!
//! [`Evaluator::solve`] works through a goal list. Undecided sides are
//! forced one step at a time. An unapplied flex variable is bound to the
//! other side reversibly. A flex variable *with* arguments takes the
//! higher-order fallback: its symbol is bound to a synthesised function
//!
//! ```text
//! λ p₁ … pₙ . (p₁ == x₁ >> … >> pₙ == xₙ >> r) <> (F p₁ … pₙ)
//! ```
//!
//! which returns `r` when applied to the observed arguments and defers to
//! a fresh function variable `F` otherwise. The occurs check is omitted
//! here (unlike in the type checker): unifying a variable with a structure
//! containing it builds a cyclic solution that diverges if forced.
//!
//! # Strong evaluation
//!
//! [`Evaluator::strong_eval`] recursively forces argument lists until every
//! component is strongly decided, re-forcing values that lose decidedness
//! when a later sibling instantiates their variables.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use farol_base::{Interner, Span, Symbol};
use farol_language::ast::{self, Declaration, Expr, ExprKind, Program};
use farol_language::builtins::Names;
use farol_language::token::operator_parts;
use indexmap::{IndexMap, IndexSet};

use crate::env::Env;
use crate::error::{EvalError, EvalErrorKind};
use crate::stream::{Step, Stream, StreamNode};
use crate::value::{MetaId, MetaStore, Value};

/// The farol evaluator. Cloning is cheap; clones share the metavariable
/// store, the interner, and the constructor registry.
#[derive(Clone)]
pub struct Evaluator {
    store: Rc<RefCell<MetaStore>>,
    interner: Rc<RefCell<Interner>>,
    names: Names,
    constructors: Rc<IndexSet<Symbol>>,
    primitives: Rc<IndexMap<Symbol, usize>>,
    fresh_counter: Rc<Cell<u32>>,
}

impl Evaluator {
    pub fn new(interner: Rc<RefCell<Interner>>, names: Names, program: &Program) -> Self {
        let mut constructors = IndexSet::new();
        constructors.insert(names.unit_value);
        for data in &program.data_declarations {
            for constructor in &data.constructors {
                constructors.insert(constructor.name);
            }
        }
        let mut primitives = IndexMap::new();
        primitives.insert(names.alt, 2);
        primitives.insert(names.seq, 2);
        primitives.insert(names.unify, 2);
        Self {
            store: Rc::new(RefCell::new(MetaStore::new())),
            interner,
            names,
            constructors: Rc::new(constructors),
            primitives: Rc::new(primitives),
            fresh_counter: Rc::new(Cell::new(0)),
        }
    }

    /// The shared metavariable store (exposed for invariant checks).
    pub fn store(&self) -> Rc<RefCell<MetaStore>> {
        Rc::clone(&self.store)
    }

    /// Weak evaluation of the program body.
    pub fn eval_program(&self, program: &Program) -> Stream {
        self.eval_expr(&program.body, &Env::new())
    }

    /// Weak evaluation followed by strong evaluation of every solution,
    /// the strategy used for presenting results.
    pub fn strong_eval_program(&self, program: &Program) -> Stream {
        let ev = self.clone();
        self.eval_program(program)
            .and_then(move |value| ev.strong_eval(value))
    }

    // ------------------------------------------------------------------
    // Weak evaluation
    // ------------------------------------------------------------------

    fn eval_expr(&self, expr: &Rc<Expr>, env: &Env) -> Stream {
        match &expr.kind {
            ExprKind::Integer(n) => Stream::one(Value::Integer(*n)),
            ExprKind::Var(name) => self.eval_variable(*name, expr.span, env),
            ExprKind::Lambda(var, body) => Stream::one(Value::Closure {
                var: *var,
                body: Rc::clone(body),
                env: env.clone(),
            }),
            ExprKind::App(fun, arg) => {
                let ev = self.clone();
                let arg = Rc::clone(arg);
                let arg_env = env.clone();
                self.eval_expr(fun, env).and_then(move |function| {
                    let argument = Value::Thunk {
                        expr: Rc::clone(&arg),
                        env: arg_env.clone(),
                    };
                    ev.apply(function, argument)
                })
            }
            ExprKind::Let(decls, body) => {
                let extended = env.extended();
                for decl in decls {
                    if let Declaration::Def(def) = decl {
                        if let ExprKind::Var(name) = def.lhs.application_head().kind {
                            // thunks capture the extended environment so
                            // definitions can refer to each other
                            extended.define(
                                name,
                                Value::Thunk {
                                    expr: Rc::clone(&def.rhs),
                                    env: extended.clone(),
                                },
                            );
                        }
                    }
                }
                self.eval_expr(body, &extended)
            }
            ExprKind::Fresh(var, body) => {
                let symbol = self.store.borrow_mut().fresh("x");
                let scope = env.extended();
                scope.define(
                    *var,
                    Value::Flex {
                        symbol,
                        args: Vec::new(),
                    },
                );
                self.eval_expr(body, &scope)
            }
            ExprKind::Wildcard | ExprKind::Forall(_, _) | ExprKind::Meta(_) => Stream::fail(
                EvalError::new(EvalErrorKind::UnimplementedExpression {
                    description: expr.show(&self.interner.borrow()),
                })
                .with_span(expr.span),
            ),
        }
    }

    fn eval_variable(&self, name: Symbol, span: Span, env: &Env) -> Stream {
        if let Some(saved) = env.value(name) {
            let forced = self.force(saved.clone());
            Stream::from_node(MemoVar {
                inner: Some(forced),
                env: env.clone(),
                name,
                saved,
                live: false,
            })
        } else if self.constructors.contains(&name) {
            Stream::one(Value::Rigid {
                constructor: name,
                args: Vec::new(),
            })
        } else if self.primitives.contains_key(&name) {
            Stream::one(Value::Primitive {
                name,
                args: Vec::new(),
            })
        } else {
            let name = self.interner.borrow().resolve(name).to_string();
            Stream::fail(EvalError::new(EvalErrorKind::UnknownName { name }).with_span(span))
        }
    }

    /// Forces a value one step: thunks evaluate, flex structures whose
    /// symbol has been instantiated re-apply the representative. Decided
    /// values pass through.
    fn eval_value_step(&self, value: Value) -> Stream {
        match value {
            Value::Thunk { expr, env } => self.eval_expr(&expr, &env),
            Value::Flex { symbol, args } if self.store.borrow().is_instantiated(symbol) => {
                let representative = self.store.borrow_mut().representative(symbol);
                self.apply_many(representative, args)
            }
            decided => Stream::one(decided),
        }
    }

    /// Forces a value until it is decided.
    fn force(&self, value: Value) -> Stream {
        let ev = self.clone();
        Stream::defer(move || {
            if ev.is_decided(&value) {
                Stream::one(value)
            } else {
                let rec = ev.clone();
                ev.eval_value_step(value)
                    .and_then(move |next| rec.force(next))
            }
        })
    }

    fn is_decided(&self, value: &Value) -> bool {
        match value {
            Value::Thunk { .. } => false,
            Value::Flex { symbol, .. } => !self.store.borrow().is_instantiated(*symbol),
            _ => true,
        }
    }

    fn is_strongly_decided(&self, value: &Value) -> bool {
        match value {
            Value::Thunk { .. } => false,
            Value::Flex { symbol, args } => {
                !self.store.borrow().is_instantiated(*symbol)
                    && args.iter().all(|arg| self.is_strongly_decided(arg))
            }
            Value::Rigid { args, .. } | Value::Primitive { args, .. } => {
                args.iter().all(|arg| self.is_strongly_decided(arg))
            }
            _ => true,
        }
    }

    // ------------------------------------------------------------------
    // Application
    // ------------------------------------------------------------------

    fn apply(&self, function: Value, argument: Value) -> Stream {
        match function {
            Value::Thunk { .. } => {
                let ev = self.clone();
                self.force(function)
                    .and_then(move |f| ev.apply(f, argument.clone()))
            }
            Value::Rigid {
                constructor,
                mut args,
            } => {
                args.push(argument);
                Stream::one(Value::Rigid { constructor, args })
            }
            Value::Flex { symbol, mut args } => {
                args.push(argument);
                Stream::one(Value::Flex { symbol, args })
            }
            Value::Closure { var, body, env } => {
                let scope = env.extended();
                scope.define(var, argument);
                self.eval_expr(&body, &scope)
            }
            Value::Primitive { name, mut args } => {
                args.push(argument);
                let arity = self.primitives.get(&name).copied().unwrap_or(2);
                if args.len() < arity {
                    Stream::one(Value::Primitive { name, args })
                } else {
                    self.dispatch_primitive(name, args)
                }
            }
            other => {
                let description = format!("`{}` in function position", self.show_value(&other));
                Stream::fail(EvalError::new(EvalErrorKind::UnimplementedValueClass {
                    description,
                }))
            }
        }
    }

    fn apply_many(&self, function: Value, args: Vec<Value>) -> Stream {
        let mut iter = args.into_iter();
        let Some(first) = iter.next() else {
            return Stream::one(function);
        };
        let rest: Vec<Value> = iter.collect();
        let ev = self.clone();
        self.apply(function, first)
            .and_then(move |partial| ev.apply_many(partial, rest.clone()))
    }

    fn dispatch_primitive(&self, name: Symbol, args: Vec<Value>) -> Stream {
        let mut iter = args.into_iter();
        let (Some(first), Some(second)) = (iter.next(), iter.next()) else {
            let name = self.interner.borrow().resolve(name).to_string();
            return Stream::fail(EvalError::new(EvalErrorKind::UnimplementedPrimitive { name }));
        };
        if name == self.names.seq {
            let ev = self.clone();
            self.force(first).and_then(move |_| ev.force(second.clone()))
        } else if name == self.names.alt {
            let ev = self.clone();
            self.force(first).append(move || ev.force(second))
        } else if name == self.names.unify {
            self.solve(vec![(first, second)])
        } else {
            let name = self.interner.borrow().resolve(name).to_string();
            Stream::fail(EvalError::new(EvalErrorKind::UnimplementedPrimitive { name }))
        }
    }

    // ------------------------------------------------------------------
    // Unification
    // ------------------------------------------------------------------

    /// Solves a goal list, yielding `unit` once per consistent
    /// instantiation. A branch that cannot be unified yields no solutions;
    /// it is not an error.
    fn solve(&self, goals: Vec<(Value, Value)>) -> Stream {
        let ev = self.clone();
        Stream::defer(move || {
            let mut goals = goals;
            if goals.is_empty() {
                return Stream::one(Value::Rigid {
                    constructor: ev.names.unit_value,
                    args: Vec::new(),
                });
            }
            let (left, right) = goals.remove(0);
            let rest = goals;

            if !ev.is_decided(&left) {
                let rec = ev.clone();
                return ev.eval_value_step(left).and_then(move |forced| {
                    let mut goals = Vec::with_capacity(rest.len() + 1);
                    goals.push((forced, right.clone()));
                    goals.extend(rest.iter().cloned());
                    rec.solve(goals)
                });
            }
            if !ev.is_decided(&right) {
                let rec = ev.clone();
                return ev.eval_value_step(right).and_then(move |forced| {
                    let mut goals = Vec::with_capacity(rest.len() + 1);
                    goals.push((left.clone(), forced));
                    goals.extend(rest.iter().cloned());
                    rec.solve(goals)
                });
            }

            match (left, right) {
                (Value::Integer(m), Value::Integer(n)) => {
                    if m == n {
                        ev.solve(rest)
                    } else {
                        Stream::empty()
                    }
                }
                (
                    Value::Rigid {
                        constructor: c1,
                        args: a1,
                    },
                    Value::Rigid {
                        constructor: c2,
                        args: a2,
                    },
                ) => {
                    if c1 == c2 && a1.len() == a2.len() {
                        let mut subgoals: Vec<(Value, Value)> =
                            a1.into_iter().zip(a2).collect();
                        subgoals.extend(rest);
                        ev.solve(subgoals)
                    } else {
                        Stream::empty()
                    }
                }
                (Value::Flex { symbol, args }, right) => {
                    if args.is_empty() {
                        // reversible binding: undone on exhaustion, failure,
                        // and abandonment alike
                        ev.store.borrow_mut().instantiate(symbol, right);
                        let store = Rc::clone(&ev.store);
                        ev.solve(rest)
                            .finally(move || store.borrow_mut().uninstantiate(symbol))
                    } else {
                        ev.higher_order_bind(symbol, args, right, rest)
                    }
                }
                (left, right @ Value::Flex { .. }) => {
                    let mut goals = Vec::with_capacity(rest.len() + 1);
                    goals.push((right, left));
                    goals.extend(rest);
                    ev.solve(goals)
                }
                _ => Stream::empty(),
            }
        })
    }

    /// The higher-order fallback: binds `symbol` to a function that maps
    /// the observed arguments to `rhs` and anything else to a fresh
    /// function variable.
    fn higher_order_bind(
        &self,
        symbol: MetaId,
        args: Vec<Value>,
        rhs: Value,
        rest: Vec<(Value, Value)>,
    ) -> Stream {
        let span = Span::default();
        let names = self.names;
        let params: Vec<Symbol> = (0..args.len()).map(|_| self.fresh_name("p")).collect();
        let captured: Vec<Symbol> = (0..args.len()).map(|_| self.fresh_name("q")).collect();
        let result = self.fresh_name("r");
        let function = self.fresh_name("F");
        let function_meta = self.store.borrow_mut().fresh("f");

        // the observed arguments, the right-hand side, and the fresh
        // function variable all enter through the closure environment
        let capture_env = Env::new();
        for (name, value) in captured.iter().zip(&args) {
            capture_env.define(*name, value.clone());
        }
        capture_env.define(result, rhs);
        capture_env.define(
            function,
            Value::Flex {
                symbol: function_meta,
                args: Vec::new(),
            },
        );

        let var = |name: Symbol| Expr::var(name, span);
        let goals: Vec<Rc<Expr>> = params
            .iter()
            .zip(&captured)
            .map(|(p, q)| ast::unify_call(&names, var(*p), var(*q)))
            .collect();
        let solved = ast::sequence_many1(&names, goals, var(result));
        let recurse = params
            .iter()
            .fold(var(function), |acc, p| Expr::app(acc, var(*p)));
        let body = ast::lambda_many(
            &params,
            ast::alternative_many(&names, vec![solved, recurse]),
        );

        self.store.borrow_mut().instantiate(
            symbol,
            Value::Thunk {
                expr: body,
                env: capture_env,
            },
        );
        let store = Rc::clone(&self.store);
        self.solve(rest)
            .finally(move || store.borrow_mut().uninstantiate(symbol))
    }

    // ------------------------------------------------------------------
    // Strong evaluation
    // ------------------------------------------------------------------

    /// Forces a value and then its arguments, recursively, until every
    /// component is strongly decided.
    pub fn strong_eval(&self, value: Value) -> Stream {
        let ev = self.clone();
        self.force(value)
            .and_then(move |forced| ev.strong_eval_decided(forced))
    }

    fn strong_eval_decided(&self, value: Value) -> Stream {
        match value {
            Value::Integer(n) => Stream::one(Value::Integer(n)),
            Value::Meta(id) => Stream::one(Value::Meta(id)),
            Value::Closure { var, body, env } => Stream::one(Value::Closure { var, body, env }),
            Value::Thunk { expr, env } => {
                let ev = self.clone();
                self.force(Value::Thunk { expr, env })
                    .and_then(move |forced| ev.strong_eval_decided(forced))
            }
            Value::Rigid { constructor, args } => self
                .strong_eval_values(args)
                .and_then(move |args| Stream::one(Value::Rigid { constructor, args })),
            Value::Primitive { name, args } => self
                .strong_eval_values(args)
                .and_then(move |args| Stream::one(Value::Primitive { name, args })),
            Value::Flex { symbol, args } => {
                let ev = self.clone();
                self.strong_eval_values(args).and_then(move |args| {
                    if ev.store.borrow().is_instantiated(symbol) {
                        let representative = ev.store.borrow_mut().representative(symbol);
                        let rec = ev.clone();
                        ev.apply_many(representative, args)
                            .and_then(move |v| rec.strong_eval(v))
                    } else {
                        Stream::one(Value::Flex { symbol, args })
                    }
                })
            }
        }
    }

    /// Strongly evaluates a list of values left to right. Solving a later
    /// element can instantiate variables inside an earlier one, so the
    /// assembled list is re-forced until it is strongly decided throughout.
    fn strong_eval_values(&self, values: Vec<Value>) -> Stream<Vec<Value>> {
        if values.is_empty() {
            return Stream::one(Vec::new());
        }
        let first = values[0].clone();
        let rest: Vec<Value> = values[1..].to_vec();
        let ev = self.clone();
        self.strong_eval(first).and_then(move |head| {
            let ev2 = ev.clone();
            ev.strong_eval_values(rest.clone()).and_then(move |tail| {
                let mut assembled = Vec::with_capacity(tail.len() + 1);
                assembled.push(head.clone());
                assembled.extend(tail);
                if assembled.iter().all(|v| ev2.is_strongly_decided(v)) {
                    Stream::one(assembled)
                } else {
                    ev2.strong_eval_values(assembled)
                }
            })
        })
    }

    // ------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------

    /// Renders a value, reconstructing mixfix notation for operator
    /// constructors and chasing metavariable indirections.
    pub fn show_value(&self, value: &Value) -> String {
        let store = self.store.borrow();
        let interner = self.interner.borrow();
        show_value_impl(&store, &interner, value)
    }

    fn fresh_name(&self, prefix: &str) -> Symbol {
        let n = self.fresh_counter.get();
        self.fresh_counter.set(n + 1);
        self.interner.borrow_mut().intern(&format!("{}.{}", prefix, n))
    }
}

fn show_value_impl(store: &MetaStore, interner: &Interner, value: &Value) -> String {
    match value {
        Value::Integer(n) => n.to_string(),
        Value::Closure { .. } => "<closure>".to_string(),
        Value::Thunk { .. } => "<thunk>".to_string(),
        Value::Meta(id) => match store.indirection(*id) {
            Some(bound) => show_value_impl(store, interner, bound),
            None => store.show_meta(*id),
        },
        Value::Rigid { constructor, args } => {
            show_structure(store, interner, interner.resolve(*constructor), args)
        }
        Value::Primitive { name, args } => {
            show_structure(store, interner, interner.resolve(*name), args)
        }
        Value::Flex { symbol, args } => {
            let head = match store.indirection(*symbol) {
                Some(bound) => show_value_paren(store, interner, bound),
                None => store.show_meta(*symbol),
            };
            if args.is_empty() {
                head
            } else {
                let shown: Vec<String> = args
                    .iter()
                    .map(|arg| show_value_paren(store, interner, arg))
                    .collect();
                format!("{} {}", head, shown.join(" "))
            }
        }
    }
}

/// Heads that are mixfix operator names render with their parts
/// interleaved: `_:_ 1 nil` prints as `1 : nil`.
fn show_structure(store: &MetaStore, interner: &Interner, head: &str, args: &[Value]) -> String {
    let parts = operator_parts(head);
    let holes = parts.iter().filter(|p| p.is_empty()).count();
    if holes > 0 && args.len() >= holes {
        let mut rendered = Vec::new();
        let mut next = 0;
        for part in &parts {
            if part.is_empty() {
                rendered.push(show_value_paren(store, interner, &args[next]));
                next += 1;
            } else {
                rendered.push(part.to_string());
            }
        }
        let mut out = rendered.join(" ");
        for arg in &args[holes..] {
            out = format!("({}) {}", out, show_value_paren(store, interner, arg));
        }
        return out;
    }
    if args.is_empty() {
        return head.to_string();
    }
    let shown: Vec<String> = args
        .iter()
        .map(|arg| show_value_paren(store, interner, arg))
        .collect();
    format!("{} {}", head, shown.join(" "))
}

fn show_value_paren(store: &MetaStore, interner: &Interner, value: &Value) -> String {
    let atomic = match value {
        Value::Integer(_) | Value::Meta(_) => true,
        Value::Rigid { args, .. } | Value::Primitive { args, .. } | Value::Flex { args, .. } => {
            args.is_empty()
        }
        Value::Closure { .. } | Value::Thunk { .. } => true,
    };
    let shown = show_value_impl(store, interner, value);
    if atomic {
        shown
    } else {
        format!("({})", shown)
    }
}

/// Call-by-need memoisation: while a forced value for a variable is live
/// downstream, the variable is rebound to it; the original binding is
/// restored on resumption, and on abandonment after the inner stream's
/// own undo actions have run.
struct MemoVar {
    inner: Option<Stream>,
    env: Env,
    name: Symbol,
    saved: Value,
    live: bool,
}

impl MemoVar {
    fn restore(&mut self) {
        if self.live {
            self.env.set(self.name, self.saved.clone());
            self.live = false;
        }
    }
}

impl StreamNode<Value> for MemoVar {
    fn step(mut self: Box<Self>) -> Step {
        self.restore();
        let Some(inner) = self.inner.take() else {
            return Step::Done;
        };
        match inner.next() {
            Step::Done => Step::Done,
            Step::Fail(error) => Step::Fail(error),
            Step::Yield(value, tail) => {
                self.env.set(self.name, value.clone());
                self.live = true;
                self.inner = Some(tail);
                Step::Yield(value, Stream::from_node(*self))
            }
        }
    }
}

impl Drop for MemoVar {
    fn drop(&mut self) {
        // unwind the producing stream first, then restore the binding
        self.inner.take();
        self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farol_language::lexer::Lexer;
    use farol_language::parser::Parser;

    fn pipeline(source: &str) -> (Evaluator, Program) {
        let mut interner = Interner::new();
        let tokens = Lexer::new(source, &mut interner)
            .tokenize()
            .expect("lexing failed");
        let mut parser = Parser::new(tokens, &mut interner);
        let program = parser.parse_program().expect("parsing failed");
        let names = parser.names();
        let interner = Rc::new(RefCell::new(interner));
        let evaluator = Evaluator::new(interner, names, &program);
        (evaluator, program)
    }

    fn run(source: &str, limit: usize) -> Vec<String> {
        let (evaluator, program) = pipeline(source);
        let (values, error) = evaluator.strong_eval_program(&program).collect(limit);
        assert!(error.is_none(), "unexpected failure: {:?}", error);
        values.iter().map(|v| evaluator.show_value(v)).collect()
    }

    #[test]
    fn sequence_keeps_the_second_value() {
        assert_eq!(run("main = (1 >> 2)", 10), vec!["2"]);
    }

    #[test]
    fn alternative_yields_both_in_order() {
        assert_eq!(run("main = (1 <> 2)", 10), vec!["1", "2"]);
    }

    #[test]
    fn unify_binds_a_fresh_variable() {
        assert_eq!(run("main = fresh x . (x == 5 >> x)", 10), vec!["5"]);
    }

    #[test]
    fn backtracking_rebinds_across_alternatives() {
        assert_eq!(
            run("main = fresh x . ((x == 1 <> x == 2) >> x)", 10),
            vec!["1", "2"]
        );
    }

    #[test]
    fn unify_mismatch_is_a_silent_dead_branch() {
        assert_eq!(run("main = (1 == 2 >> 3)", 10), Vec::<String>::new());
    }

    #[test]
    fn unify_success_yields_unit() {
        assert_eq!(run("main = (1 == 1)", 10), vec!["unit"]);
    }

    #[test]
    fn constructor_applications_build_structures() {
        let src = "data Pair a b where { pair : a → b → Pair a b }\nmain = pair 1 2";
        assert_eq!(run(src, 10), vec!["pair 1 2"]);
    }

    #[test]
    fn unification_projects_constructor_arguments() {
        let src = "data Pair a b where { pair : a → b → Pair a b }\n\
                   main = fresh x . fresh y . (pair x y == pair 1 2 >> pair x y)";
        assert_eq!(run(src, 10), vec!["pair 1 2"]);
    }

    #[test]
    fn lambdas_apply_call_by_need() {
        assert_eq!(run("main = (λ x . x) 41", 10), vec!["41"]);
    }

    #[test]
    fn let_definitions_see_each_other() {
        assert_eq!(run("main = f\nf = g\ng = 7", 10), vec!["7"]);
    }

    #[test]
    fn higher_order_unification_solves_applied_variables() {
        let solutions = run("main = fresh f . (f 1 == 5 >> f 1)", 2);
        assert_eq!(solutions[0], "5");
    }

    #[test]
    fn unknown_names_abort_the_stream() {
        let (evaluator, program) = pipeline("main = ghost");
        let (_, error) = evaluator.strong_eval_program(&program).collect(10);
        assert_eq!(error.expect("should fail").code(), "unknown-name");
    }

    #[test]
    fn applying_an_integer_is_an_error() {
        let (evaluator, program) = pipeline("main = 1 2");
        let (_, error) = evaluator.strong_eval_program(&program).collect(10);
        assert_eq!(error.expect("should fail").code(), "unimplemented-value-class");
    }

    #[test]
    fn abandoning_the_stream_unwinds_all_bindings() {
        let (evaluator, program) = pipeline("main = fresh x . ((x == 1 <> x == 2) >> x)");
        let stream = evaluator.strong_eval_program(&program);
        let Step::Yield(first, rest) = stream.next() else {
            panic!("expected a solution");
        };
        assert_eq!(evaluator.show_value(&first), "1");
        drop(rest);
        assert!(evaluator.store().borrow().fully_uninstantiated());
    }

    #[test]
    fn exhausting_the_stream_unwinds_all_bindings() {
        let (evaluator, program) = pipeline("main = fresh x . ((x == 1 <> x == 2) >> x)");
        let (values, error) = evaluator.strong_eval_program(&program).collect(usize::MAX);
        assert!(error.is_none());
        assert_eq!(values.len(), 2);
        assert!(evaluator.store().borrow().fully_uninstantiated());
    }

    #[test]
    fn operator_constructors_render_mixfix() {
        let src = "data List where { nil : List ; _::_ : Int → List → List }\n\
                   main = 1 :: (2 :: nil)";
        assert_eq!(run(src, 10), vec!["1 :: (2 :: nil)"]);
    }
}
