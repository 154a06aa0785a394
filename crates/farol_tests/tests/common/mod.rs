//! Shared harness: runs source strings through the full pipeline.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use farol_base::Interner;
use farol_compile::TypeChecker;
use farol_kernel::{Evaluator, Stream};
use farol_language::ast::{Declaration, ExprKind, Program};
use farol_language::{Lexer, Parser};

/// A fully checked program together with its evaluator.
pub struct Session {
    pub evaluator: Evaluator,
    pub program: Program,
}

impl Session {
    pub fn stream(&self) -> Stream {
        self.evaluator.strong_eval_program(&self.program)
    }
}

/// Lex, parse, and type-check; the `Err` variant is the stable error code.
pub fn compile(source: &str) -> Result<Session, &'static str> {
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner)
        .tokenize()
        .map_err(|err| err.code())?;
    let mut parser = Parser::new(tokens, &mut interner);
    let program = parser.parse_program().map_err(|err| err.code())?;
    let names = parser.names();
    let mut checker = TypeChecker::new(&mut interner, names);
    let program = checker.check_program(&program).map_err(|err| err.code())?;
    let interner = Rc::new(RefCell::new(interner));
    let evaluator = Evaluator::new(interner, names, &program);
    Ok(Session { evaluator, program })
}

/// Strong-evaluates the program and renders up to `limit` solutions.
pub fn solutions(source: &str, limit: usize) -> Vec<String> {
    let session = match compile(source) {
        Ok(session) => session,
        Err(code) => panic!("pipeline failed with `{}` for:\n{}", code, source),
    };
    let (values, error) = session.stream().collect(limit);
    assert!(error.is_none(), "evaluation failed: {:?}", error);
    values
        .iter()
        .map(|value| session.evaluator.show_value(value))
        .collect()
}

/// Asserts the program produces exactly `expected`, in order.
pub fn assert_solutions(source: &str, expected: &[&str]) {
    let produced = solutions(source, expected.len() + 3);
    assert_eq!(produced, expected, "for program:\n{}", source);
}

/// The error code the pipeline stops with.
pub fn failure_code(source: &str) -> &'static str {
    match compile(source) {
        Err(code) => code,
        Ok(_) => panic!("pipeline unexpectedly succeeded for:\n{}", source),
    }
}

/// The rendered (generalised) type recorded for `name`: the elaborated
/// outer let's signature when `name` is let-bound, the global record
/// (constructors, primitives) otherwise.
pub fn inferred_type(source: &str, name: &str) -> String {
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner)
        .tokenize()
        .expect("lexing failed");
    let mut parser = Parser::new(tokens, &mut interner);
    let program = parser.parse_program().expect("parsing failed");
    let names = parser.names();
    let mut checker = TypeChecker::new(&mut interner, names);
    let program = checker.check_program(&program).expect("checking failed");
    let global = checker.show_type_of(name);

    let ExprKind::Let(decls, _) = &program.body.kind else {
        panic!("program body is not a let");
    };
    for decl in decls {
        if let Declaration::TypeSig(sig) = decl {
            if interner.resolve(sig.name) == name {
                return sig.ty.show(&interner);
            }
        }
    }
    match global {
        Some(shown) => shown,
        None => panic!("no type recorded for `{}`", name),
    }
}
