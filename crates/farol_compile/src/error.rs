//! Type checker errors.
//!
//! Kinds mirror the checks: data-declaration shape, kind checking,
//! constructor discipline, the let pre-pass, equation desugaring, and type
//! unification. Each kind has a stable code used by the CLI and tests.

use farol_base::{Diagnostic, Span, Stage};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeErrorKind {
    DataLhsArgVariable { got: String },
    DataLhsTypeVariable { got: String },
    DataLhsTypeAlreadyDefined { name: String },
    ConstructorAlreadyDefined { name: String },
    ExpectedAtomicKind { ty: String, kind: String },
    UndefinedType { name: String },
    KindsDoNotUnify { kind1: String, kind2: String },
    ExpectedAType { got: String },
    ConstructorMustReturnInstance { type_name: String, constructor_name: String },
    UnboundVariable { name: String },
    ValueAlreadyDefined { name: String },
    NameDeclaredButNotDefined { name: String },
    DeclarationHeadIsNotVariable { got: String },
    EquationsArityMismatch { name: String },
    TypesDoNotUnify { type1: String, type2: String },
    OccursCheck { meta: String, ty: String },
    WildcardOutsidePattern,
    ExpectedAValue { got: String },
}

impl TypeErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            TypeErrorKind::DataLhsArgVariable { .. } => "data-lhs-arg-variable",
            TypeErrorKind::DataLhsTypeVariable { .. } => "data-lhs-type-variable",
            TypeErrorKind::DataLhsTypeAlreadyDefined { .. } => "data-lhs-type-already-defined",
            TypeErrorKind::ConstructorAlreadyDefined { .. } => "constructor-already-defined",
            TypeErrorKind::ExpectedAtomicKind { .. } => "expected-atomic-kind",
            TypeErrorKind::UndefinedType { .. } => "undefined-type",
            TypeErrorKind::KindsDoNotUnify { .. } => "kinds-do-not-unify",
            TypeErrorKind::ExpectedAType { .. } => "expected-a-type",
            TypeErrorKind::ConstructorMustReturnInstance { .. } => {
                "constructor-must-return-instance"
            }
            TypeErrorKind::UnboundVariable { .. } => "unbound-variable",
            TypeErrorKind::ValueAlreadyDefined { .. } => "value-already-defined",
            TypeErrorKind::NameDeclaredButNotDefined { .. } => "name-declared-but-not-defined",
            TypeErrorKind::DeclarationHeadIsNotVariable { .. } => {
                "declaration-head-is-not-variable"
            }
            TypeErrorKind::EquationsArityMismatch { .. } => "equations-arity-mismatch",
            TypeErrorKind::TypesDoNotUnify { .. } => "types-do-not-unify",
            TypeErrorKind::OccursCheck { .. } => "occurs-check",
            TypeErrorKind::WildcardOutsidePattern => "wildcard-outside-pattern",
            TypeErrorKind::ExpectedAValue { .. } => "expected-a-value",
        }
    }
}

impl fmt::Display for TypeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeErrorKind::DataLhsArgVariable { got } => {
                write!(f, "data declaration parameter must be a variable, found `{}`", got)
            }
            TypeErrorKind::DataLhsTypeVariable { got } => {
                write!(f, "data declaration head must be a type name, found `{}`", got)
            }
            TypeErrorKind::DataLhsTypeAlreadyDefined { name } => {
                write!(f, "type `{}` is already defined", name)
            }
            TypeErrorKind::ConstructorAlreadyDefined { name } => {
                write!(f, "constructor `{}` is already defined", name)
            }
            TypeErrorKind::ExpectedAtomicKind { ty, kind } => {
                write!(f, "`{}` must have kind `*`, but has kind `{}`", ty, kind)
            }
            TypeErrorKind::UndefinedType { name } => write!(f, "undefined type `{}`", name),
            TypeErrorKind::KindsDoNotUnify { kind1, kind2 } => {
                write!(f, "kinds `{}` and `{}` do not unify", kind1, kind2)
            }
            TypeErrorKind::ExpectedAType { got } => write!(f, "expected a type, found `{}`", got),
            TypeErrorKind::ConstructorMustReturnInstance {
                type_name,
                constructor_name,
            } => write!(
                f,
                "constructor `{}` must return an instance of `{}`",
                constructor_name, type_name
            ),
            TypeErrorKind::UnboundVariable { name } => write!(f, "unbound variable `{}`", name),
            TypeErrorKind::ValueAlreadyDefined { name } => {
                write!(f, "value `{}` is already defined", name)
            }
            TypeErrorKind::NameDeclaredButNotDefined { name } => {
                write!(f, "`{}` is declared but has no defining equation", name)
            }
            TypeErrorKind::DeclarationHeadIsNotVariable { got } => {
                write!(f, "definition head must be a name, found `{}`", got)
            }
            TypeErrorKind::EquationsArityMismatch { name } => {
                write!(f, "the equations for `{}` have different arities", name)
            }
            TypeErrorKind::TypesDoNotUnify { type1, type2 } => {
                write!(f, "types `{}` and `{}` do not unify", type1, type2)
            }
            TypeErrorKind::OccursCheck { meta, ty } => {
                write!(f, "`{}` occurs in `{}`", meta, ty)
            }
            TypeErrorKind::WildcardOutsidePattern => {
                write!(f, "`_` is only allowed in definition patterns")
            }
            TypeErrorKind::ExpectedAValue { got } => {
                write!(f, "expected a value expression, found `{}`", got)
            }
        }
    }
}

/// A type checker error with an optional source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub span: Option<Span>,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind) -> Self {
        Self { kind, span: None }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for TypeError {}

impl From<TypeError> for Diagnostic {
    fn from(err: TypeError) -> Self {
        let diagnostic =
            Diagnostic::new(Stage::TypeChecker, err.kind.code(), err.kind.to_string());
        match err.span {
            Some(span) => diagnostic.with_span(span),
            None => diagnostic,
        }
    }
}
