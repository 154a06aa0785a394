//! E2E: kind and type checking — inference, generalisation, rejection.

mod common;

use common::{failure_code, inferred_type};
use pretty_assertions::assert_eq;

#[test]
fn list_constructors_get_polymorphic_types() {
    let src = "data List a where { nil : List a ; cons : a → List a → List a }\nmain = nil";
    assert_eq!(inferred_type(src, "cons"), "∀a. a → (List a) → List a");
    assert_eq!(inferred_type(src, "nil"), "∀a. List a");
}

#[test]
fn identity_lambda_generalises() {
    assert_eq!(inferred_type("main = λx. x", "main"), "∀a. a → a");
}

#[test]
fn identity_equation_generalises() {
    assert_eq!(inferred_type("main x = x", "main"), "∀a. a → a");
}

#[test]
fn type_level_occurs_check_rejects_cyclic_types() {
    // x applied to itself forces α = α → β
    assert_eq!(failure_code("main x = x x"), "occurs-check");
}

#[test]
fn integers_have_type_int() {
    assert_eq!(inferred_type("main = 7", "main"), "Int");
}

#[test]
fn primitive_combinators_are_polymorphic() {
    assert_eq!(inferred_type("main = 1 >> 2", "main"), "Int");
    assert_eq!(inferred_type("main = 1 <> 2", "main"), "Int");
    assert_eq!(
        inferred_type("main = fresh x . x == 5 >> x", "main"),
        "Int"
    );
}

#[test]
fn branches_of_an_alternative_must_agree() {
    let src = "data B where { tt : B }\nmain = 1 <> tt";
    assert_eq!(failure_code(src), "types-do-not-unify");
}

#[test]
fn unify_operands_must_share_a_type() {
    let src = "data B where { tt : B }\nmain = tt == 1";
    assert_eq!(failure_code(src), "types-do-not-unify");
}

#[test]
fn declared_types_reconcile_with_inferred_ones() {
    let src = "id : a → a\nid x = x\nmain = id 1";
    assert_eq!(inferred_type(src, "id"), "∀a. a → a");
}

#[test]
fn too_general_declared_types_are_rejected() {
    assert_eq!(failure_code("f : a → b\nf x = x\nmain = f 1"), "types-do-not-unify");
}

#[test]
fn names_without_equations_are_rejected() {
    assert_eq!(failure_code("f : Int\nmain = 1"), "name-declared-but-not-defined");
}

#[test]
fn unbound_variables_are_rejected() {
    assert_eq!(failure_code("main = ghost"), "unbound-variable");
}

#[test]
fn equation_groups_must_share_arity() {
    let src = "f 1 = 1\nf 1 2 = 2\nmain = f 0";
    assert_eq!(failure_code(src), "equations-arity-mismatch");
}

#[test]
fn constructors_must_return_their_own_type() {
    let src = "data T where { c : Int }\nmain = c";
    assert_eq!(failure_code(src), "constructor-must-return-instance");
}

#[test]
fn kind_errors_are_detected() {
    let src = "data T a where { c : T a }\nf : T Int Int\nf = c\nmain = f";
    assert_eq!(failure_code(src), "kinds-do-not-unify");
}

#[test]
fn constructors_may_reference_later_data_declarations() {
    let src = "data A where { mk : B → A }\ndata B where { b : B }\nmain = mk b";
    assert_eq!(inferred_type(src, "mk"), "B → A");
}

#[test]
fn recursive_functions_infer_monomorphic_recursion() {
    let src = "data Nat where { zero : Nat ; succ : Nat → Nat }\n\
               double zero = zero\n\
               double (succ n) = succ (succ (double n))\n\
               main = double zero";
    assert_eq!(inferred_type(src, "double"), "Nat → Nat");
}

#[test]
fn wildcard_patterns_are_polymorphic() {
    assert_eq!(inferred_type("f _ = 1\nmain = f 9", "f"), "∀a. a → Int");
}

#[test]
fn wildcards_outside_patterns_are_rejected() {
    assert_eq!(failure_code("main = _"), "wildcard-outside-pattern");
}
