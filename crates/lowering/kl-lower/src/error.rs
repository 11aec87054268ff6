//! Fatal lowering errors
//!
//! Every variant aborts the run. Constructs that are merely outside coverage
//! at the declaration or statement level are reported as warnings through
//! [`crate::Diagnostics`] instead.

#![allow(unused_assignments, reason = "fields are read through the Diagnostic derive")]

use kl_ir::{IrError, IrType, VerifyError};
use kl_span::FileSpan;
use kl_syntax::SyntaxKind;
use kl_ty::TypeError;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that abort lowering
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum LowerError {
    /// Identifier not bound in any enclosing scope
    #[error("cannot find `{name}` in this scope")]
    #[diagnostic(code(lower::unresolved_name))]
    UnresolvedName {
        /// Identifier as written
        name: String,
        /// Use site
        span: FileSpan,
    },

    /// Expression form outside the supported subset
    #[error("unsupported {kind}: {detail}")]
    #[diagnostic(code(lower::unsupported_expression))]
    UnsupportedExpression {
        /// Syntax kind label
        kind: SyntaxKind,
        /// What exactly is not supported
        detail: String,
        /// Expression location
        span: FileSpan,
    },

    /// A namespace used where a value is required
    #[error("namespace `{name}` cannot be used as a value")]
    #[diagnostic(
        code(lower::namespace_as_value),
        help("access one of its members with `{name}.member`")
    )]
    NamespaceAsValue {
        /// Namespace name
        name: String,
        /// Use site
        span: FileSpan,
    },

    /// Assignment to a `const` binding or a parameter
    #[error("cannot assign to immutable binding `{name}`")]
    #[diagnostic(
        code(lower::assign_to_immutable),
        help("declare it with `let` to make it mutable")
    )]
    AssignToImmutable {
        /// Binding name
        name: String,
        /// Assignment location
        span: FileSpan,
    },

    /// Left side of `=` is not a variable
    #[error("invalid assignment target: {kind}")]
    #[diagnostic(code(lower::invalid_assignment_target))]
    InvalidAssignmentTarget {
        /// Kind of the left side
        kind: SyntaxKind,
        /// Location of the left side
        span: FileSpan,
    },

    /// Call with the wrong number of arguments
    #[error("`{callee}` expects {expected} argument(s), found {found}")]
    #[diagnostic(code(lower::arity_mismatch))]
    ArityMismatch {
        /// Called function
        callee: String,
        /// Parameter count
        expected: usize,
        /// Argument count
        found: usize,
        /// Call location
        span: FileSpan,
    },

    /// `void` call result used as a value
    #[error("`{callee}` returns void, its result cannot be used as a value")]
    #[diagnostic(code(lower::void_value))]
    VoidValue {
        /// Called function
        callee: String,
        /// Call location
        span: FileSpan,
    },

    /// Value of the wrong type
    #[error("type mismatch in {context}: expected `{expected}`, found `{found}`")]
    #[diagnostic(code(lower::type_mismatch))]
    TypeMismatch {
        /// Where the value is consumed
        context: &'static str,
        /// Required type
        expected: IrType,
        /// Actual type
        found: IrType,
        /// Location of the value
        span: FileSpan,
    },

    /// `const` without an initializer
    #[error("const binding `{name}` has no initializer")]
    #[diagnostic(code(lower::missing_initializer))]
    MissingInitializer {
        /// Binding name
        name: String,
        /// Declarator location
        span: FileSpan,
    },

    /// Mutable binding with neither a type nor an initializer
    #[error("cannot infer a type for `{name}`")]
    #[diagnostic(
        code(lower::untyped_binding),
        help("add a type annotation or an initializer")
    )]
    UntypedBinding {
        /// Binding name
        name: String,
        /// Declarator location
        span: FileSpan,
    },

    /// Source type without an IR translation
    #[error(transparent)]
    #[diagnostic(code(lower::type_error))]
    Type(#[from] TypeError),

    /// Builder rejected an instruction or symbol
    #[error(transparent)]
    #[diagnostic(code(lower::ir_error))]
    Ir(#[from] IrError),

    /// Finished IR is malformed
    #[error("verification failed: {0}")]
    #[diagnostic(code(lower::verification_failure))]
    Verification(#[from] VerifyError),
}

impl LowerError {
    /// Source location, when the error has one
    pub fn span(&self) -> Option<FileSpan> {
        match self {
            Self::UnresolvedName { span, .. }
            | Self::UnsupportedExpression { span, .. }
            | Self::NamespaceAsValue { span, .. }
            | Self::AssignToImmutable { span, .. }
            | Self::InvalidAssignmentTarget { span, .. }
            | Self::ArityMismatch { span, .. }
            | Self::VoidValue { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::MissingInitializer { span, .. }
            | Self::UntypedBinding { span, .. } => Some(*span),
            Self::Type(err) => err.span(),
            Self::Ir(_) | Self::Verification(_) => None,
        }
    }

    pub(crate) fn unsupported(kind: SyntaxKind, detail: impl Into<String>, span: FileSpan) -> Self {
        Self::UnsupportedExpression {
            kind,
            detail: detail.into(),
            span,
        }
    }
}
