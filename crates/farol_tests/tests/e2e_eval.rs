//! E2E: evaluation — the three primitives, unification, laziness.

mod common;

use common::{assert_solutions, solutions};
use pretty_assertions::assert_eq;

#[test]
fn sequence_yields_the_second_value() {
    assert_solutions("main = (1 >> 2)", &["2"]);
}

#[test]
fn alternative_yields_both_values_in_order() {
    assert_solutions("main = (1 <> 2)", &["1", "2"]);
}

#[test]
fn unify_binds_and_the_binding_is_observable() {
    assert_solutions("main = fresh x . (x == 5 >> x)", &["5"]);
}

#[test]
fn alternatives_of_bindings_enumerate_in_order() {
    assert_solutions("main = fresh x . ((x == 1 <> x == 2) >> x)", &["1", "2"]);
}

#[test]
fn constructor_unification_projects_arguments() {
    let src = "data Pair a b where { pair : a → b → Pair a b }\n\
               main = fresh x . fresh y . (pair x y == pair 1 2 >> pair x y)";
    assert_solutions(src, &["pair 1 2"]);
}

#[test]
fn failed_unification_is_a_dead_branch_not_an_error() {
    assert_solutions("main = (1 == 2 >> 1)", &[]);
    assert_solutions("main = (1 == 2 >> 1) <> 9", &["9"]);
}

#[test]
fn successful_unification_yields_unit() {
    assert_solutions("main = (1 == 1)", &["unit"]);
}

#[test]
fn nested_alternatives_preserve_depth_first_order() {
    assert_solutions("main = (1 <> 2) <> (3 <> 4)", &["1", "2", "3", "4"]);
}

#[test]
fn sequence_distributes_over_alternatives() {
    // every solution of the left runs the right afresh
    assert_solutions("main = (1 <> 2) >> (3 <> 4)", &["3", "4", "3", "4"]);
}

#[test]
fn where_clauses_evaluate() {
    assert_solutions("main = f 1\n  where\n    f x = x", &["1"]);
}

#[test]
fn multi_equation_functions_try_equations_in_order() {
    let src = "data Nat where { zero : Nat ; succ : Nat → Nat }\n\
               pred zero = zero\n\
               pred (succ n) = n\n\
               main = pred (succ (succ zero))";
    assert_solutions(src, &["succ zero"]);
}

#[test]
fn recursive_list_append_computes() {
    let src = "data List a where { nil : List a ; cons : a → List a → List a }\n\
               append nil ys = ys\n\
               append (cons x xs) ys = cons x (append xs ys)\n\
               main = append (cons 1 nil) (cons 2 nil)";
    assert_solutions(src, &["cons 1 (cons 2 nil)"]);
}

#[test]
fn append_runs_backwards_to_split_lists() {
    let src = "data List a where { nil : List a ; cons : a → List a → List a }\n\
               data Pair a b where { pair : a → b → Pair a b }\n\
               append nil ys = ys\n\
               append (cons x xs) ys = cons x (append xs ys)\n\
               main = fresh xs . fresh ys . (append xs ys == cons 1 nil >> pair xs ys)";
    assert_solutions(src, &["pair nil (cons 1 nil)", "pair (cons 1 nil) nil"]);
}

#[test]
fn infinite_streams_are_enumerable_lazily() {
    let src = "data Nat where { zero : Nat ; succ : Nat → Nat }\n\
               nats n = n <> nats (succ n)\n\
               main = nats zero";
    assert_eq!(
        solutions(src, 3),
        vec!["zero", "succ zero", "succ (succ zero)"]
    );
}

#[test]
fn higher_order_unification_returns_the_observed_result() {
    let produced = solutions("main = fresh f . (f 1 == 5 >> f 1)", 1);
    assert_eq!(produced, vec!["5"]);
}

#[test]
fn call_by_need_shares_solved_bindings() {
    // `x` is forced twice; the memoised binding must give both uses the
    // same solution within one branch
    let src = "data Pair a b where { pair : a → b → Pair a b }\n\
               main = fresh x . ((x == 1 <> x == 2) >> pair x x)";
    assert_solutions(src, &["pair 1 1", "pair 2 2"]);
}
