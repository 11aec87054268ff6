//! Expression lowering

use crate::context::LoweringContext;
use crate::error::LowerError;
use crate::scope::{BoundValue, ScopeId, StackSlot};
use kl_intern::Symbol;
use kl_ir::{Constant, FunctionBuilder, IrError, IrType, Operand};
use kl_span::FileSpan;
use kl_syntax::{BinaryOp, Expr, SyntaxKind};

/// Result of lowering an expression
///
/// Slots are read through [`ExprValue::load`], which is the only place a
/// `load` is emitted for a variable read.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    /// Usable as an operand as-is
    Direct(Operand),
    /// Mutable variable that has to be loaded to be read
    Slot(StackSlot),
}

impl ExprValue {
    /// Turns the value into an operand, loading slots
    ///
    /// # Errors
    /// Fails when `fb` cannot emit the `load`.
    pub fn load(self, fb: &mut FunctionBuilder) -> Result<Operand, LowerError> {
        match self {
            Self::Direct(operand) => Ok(operand),
            Self::Slot(slot) => Ok(fb.build_load(slot.ty, slot.ptr)?.into()),
        }
    }
}

/// Lowers an expression whose value is used
pub fn lower_expr(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    expr: &Expr,
) -> Result<ExprValue, LowerError> {
    match expr {
        Expr::Identifier { name, span } => lower_identifier(cx, scope, *name, *span),
        Expr::Member {
            object,
            property,
            span,
        } => lower_member(cx, scope, object, *property, *span),
        Expr::Call { callee, args, span } => lower_call(cx, fb, scope, callee, args, *span)?
            .map(ExprValue::Direct)
            .ok_or_else(|| LowerError::VoidValue {
                callee: describe(cx, callee),
                span: *span,
            }),
        Expr::Binary {
            op: BinaryOp::Assign,
            lhs,
            rhs,
            ..
        } => lower_assign(cx, fb, scope, lhs, rhs),
        Expr::Binary {
            op: BinaryOp::Add,
            lhs,
            rhs,
            span,
        } => lower_add(cx, fb, scope, lhs, rhs, *span),
        Expr::Binary { op, span, .. } => Err(LowerError::unsupported(
            expr.kind(),
            format!("operator `{op}`"),
            *span,
        )),
        Expr::Unary { op, span, .. } => Err(LowerError::unsupported(
            expr.kind(),
            format!("operator `{op}`"),
            *span,
        )),
        Expr::Bool { value, .. } => Ok(ExprValue::Direct(Constant::Bool(*value).into())),
        Expr::Number { value, .. } => Ok(ExprValue::Direct(Constant::Double(*value).into())),
        Expr::String { value, span } => lower_string(cx, value, *span),
        Expr::Null { span } | Expr::Array { span, .. } | Expr::Index { span, .. } => Err(
            LowerError::unsupported(expr.kind(), "expression is not supported", *span),
        ),
    }
}

fn lower_identifier(
    cx: &LoweringContext<'_>,
    scope: ScopeId,
    name: Symbol,
    span: FileSpan,
) -> Result<ExprValue, LowerError> {
    let Some(bound) = cx.scopes.resolve(scope, name) else {
        return Err(LowerError::UnresolvedName {
            name: cx.name(name),
            span,
        });
    };
    bound_to_value(bound, cx.name(name), span)
}

/// `namespace.member`, one level deep
fn lower_member(
    cx: &LoweringContext<'_>,
    scope: ScopeId,
    object: &Expr,
    property: Symbol,
    span: FileSpan,
) -> Result<ExprValue, LowerError> {
    let Expr::Identifier {
        name: object_name,
        span: object_span,
    } = object
    else {
        return Err(LowerError::unsupported(
            SyntaxKind::PropertyAccessExpression,
            format!("member access on {}", object.kind()),
            span,
        ));
    };

    let namespace = match cx.scopes.resolve(scope, *object_name) {
        Some(BoundValue::Namespace(namespace)) => *namespace,
        Some(_) => {
            return Err(LowerError::unsupported(
                SyntaxKind::PropertyAccessExpression,
                format!("`{}` is not a namespace", cx.name(*object_name)),
                span,
            ));
        }
        None => {
            return Err(LowerError::UnresolvedName {
                name: cx.name(*object_name),
                span: *object_span,
            });
        }
    };

    let qualified = format!("{}.{}", cx.name(*object_name), cx.name(property));
    let Some(bound) = cx.scopes.resolve_qualified(namespace, property) else {
        return Err(LowerError::UnresolvedName {
            name: qualified,
            span,
        });
    };
    bound_to_value(bound, qualified, span)
}

fn bound_to_value(
    bound: &BoundValue,
    name: String,
    span: FileSpan,
) -> Result<ExprValue, LowerError> {
    match bound {
        BoundValue::Direct(operand) => Ok(ExprValue::Direct(operand.clone())),
        BoundValue::Slot(slot) => Ok(ExprValue::Slot(slot.clone())),
        BoundValue::Namespace(_) => Err(LowerError::NamespaceAsValue { name, span }),
    }
}

/// Lowers a call; `None` when the callee returns `void`
pub fn lower_call(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    callee: &Expr,
    args: &[Expr],
    span: FileSpan,
) -> Result<Option<Operand>, LowerError> {
    let ExprValue::Direct(Operand::Function(id)) = lower_expr(cx, fb, scope, callee)? else {
        return Err(LowerError::unsupported(
            SyntaxKind::CallExpression,
            format!("`{}` is not a function", describe(cx, callee)),
            callee.span(),
        ));
    };
    let signature = cx
        .module
        .function(id)
        .map(|function| function.ty.clone())
        .ok_or(IrError::UnknownFunction(id))?;

    if args.len() != signature.params.len() {
        return Err(LowerError::ArityMismatch {
            callee: describe(cx, callee),
            expected: signature.params.len(),
            found: args.len(),
            span,
        });
    }

    let mut operands = Vec::with_capacity(args.len());
    for (arg, expected) in args.iter().zip(&signature.params) {
        let value = lower_expr(cx, fb, scope, arg)?.load(fb)?;
        let found = fb.value_type(&value)?;
        if &found != expected {
            return Err(LowerError::TypeMismatch {
                context: "argument",
                expected: expected.clone(),
                found,
                span: arg.span(),
            });
        }
        operands.push(value);
    }

    Ok(fb.build_call(id, &signature, operands)?.map(Operand::Value))
}

/// `target = value`; evaluates to the stored value
fn lower_assign(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    target: &Expr,
    value: &Expr,
) -> Result<ExprValue, LowerError> {
    let slot = match lower_expr(cx, fb, scope, target)? {
        ExprValue::Slot(slot) => slot,
        ExprValue::Direct(Operand::Value(_) | Operand::Constant(_))
            if matches!(target, Expr::Identifier { .. } | Expr::Member { .. }) =>
        {
            return Err(LowerError::AssignToImmutable {
                name: describe(cx, target),
                span: target.span(),
            });
        }
        ExprValue::Direct(_) => {
            return Err(LowerError::InvalidAssignmentTarget {
                kind: target.kind(),
                span: target.span(),
            });
        }
    };

    let stored = lower_expr(cx, fb, scope, value)?.load(fb)?;
    let found = fb.value_type(&stored)?;
    if found != slot.ty {
        return Err(LowerError::TypeMismatch {
            context: "assignment",
            expected: slot.ty,
            found,
            span: value.span(),
        });
    }
    fb.build_store(stored.clone(), slot.ptr)?;
    Ok(ExprValue::Direct(stored))
}

fn lower_add(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    lhs: &Expr,
    rhs: &Expr,
    span: FileSpan,
) -> Result<ExprValue, LowerError> {
    let left = lower_expr(cx, fb, scope, lhs)?.load(fb)?;
    let right = lower_expr(cx, fb, scope, rhs)?.load(fb)?;
    let (left_ty, right_ty) = (fb.value_type(&left)?, fb.value_type(&right)?);
    if left_ty != IrType::Double || right_ty != IrType::Double {
        return Err(LowerError::unsupported(
            SyntaxKind::BinaryExpression,
            format!("`{left_ty} + {right_ty}`, only `double + double` is lowered"),
            span,
        ));
    }
    Ok(ExprValue::Direct(fb.build_fadd(left, right)?.into()))
}

/// Private byte buffer plus its length, packed as the string aggregate
fn lower_string(
    cx: &mut LoweringContext<'_>,
    value: &str,
    span: FileSpan,
) -> Result<ExprValue, LowerError> {
    let IrType::Struct(ty) = cx.types.string_type() else {
        return Err(LowerError::unsupported(
            SyntaxKind::StringLiteral,
            "string type is not an aggregate",
            span,
        ));
    };
    let len = i32::try_from(value.len()).map_err(|_| {
        LowerError::unsupported(
            SyntaxKind::StringLiteral,
            format!("literal of {} bytes is too long", value.len()),
            span,
        )
    })?;

    let global = cx.module.add_string_constant(value.as_bytes());
    let aggregate = Constant::Struct {
        ty,
        fields: vec![
            Constant::Global(global),
            Constant::Int {
                bits: 32,
                value: i64::from(len),
            },
        ],
    };
    Ok(ExprValue::Direct(aggregate.into()))
}

/// Readable name of a callee or assignment target
fn describe(cx: &LoweringContext<'_>, expr: &Expr) -> String {
    match expr {
        Expr::Identifier { name, .. } => cx.name(*name),
        Expr::Member {
            object, property, ..
        } => format!("{}.{}", describe(cx, object), cx.name(*property)),
        other => other.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::LowerError;
    use crate::test_utils::{function_text, lower_items};
    use expect_test::expect;
    use kl_syntax::make::AstFactory;
    use kl_syntax::{BinaryOp, Expr, SyntaxKind, TypeRef, UnaryOp};

    #[test]
    fn test_slot_read_is_one_load() {
        let (module, _) = lower_items(|f| {
            vec![f.function(
                "f",
                vec![],
                Some(TypeRef::Number),
                vec![
                    f.let_decl("x", None, Some(f.number(1.0))),
                    f.ret(Some(f.ident("x"))),
                ],
            )]
        })
        .unwrap();

        expect![[r#"
            define double @f() {
            entry:
              %x = alloca double
              store double 1.0, ptr %x
              %1 = load double, ptr %x
              ret double %1
            }
        "#]]
        .assert_eq(&function_text(&module, "f"));
    }

    #[test]
    fn test_direct_bindings_are_not_loaded() {
        let (module, _) = lower_items(|f| {
            vec![f.function(
                "g",
                vec![f.param("a", TypeRef::Number)],
                Some(TypeRef::Number),
                vec![
                    f.const_decl("b", None, f.add(f.ident("a"), f.number(1.0))),
                    f.ret(Some(f.add(f.ident("b"), f.ident("b")))),
                ],
            )]
        })
        .unwrap();

        expect![[r#"
            define double @g(double %a) {
            entry:
              %b = fadd double %a, 1.0
              %2 = fadd double %b, %b
              ret double %2
            }
        "#]]
        .assert_eq(&function_text(&module, "g"));
    }

    #[test]
    fn test_assignment_stores_once_and_yields_value() {
        let (module, _) = lower_items(|f| {
            vec![f.function(
                "h",
                vec![],
                Some(TypeRef::Number),
                vec![
                    f.let_decl("x", Some(TypeRef::Number), None),
                    f.ret(Some(f.assign(f.ident("x"), f.number(2.0)))),
                ],
            )]
        })
        .unwrap();

        expect![[r#"
            define double @h() {
            entry:
              %x = alloca double
              store double 2.0, ptr %x
              ret double 2.0
            }
        "#]]
        .assert_eq(&function_text(&module, "h"));
    }

    #[test]
    fn test_assign_to_const_is_fatal() {
        let err = lower_items(|f| {
            vec![f.function(
                "k",
                vec![],
                None,
                vec![
                    f.const_decl("c", None, f.number(1.0)),
                    f.expr_stmt(f.assign(f.ident("c"), f.number(2.0))),
                ],
            )]
        })
        .unwrap_err();
        assert!(matches!(err, LowerError::AssignToImmutable { ref name, .. } if name == "c"));
    }

    #[test]
    fn test_assign_to_literal_is_invalid_target() {
        let err = lower_items(|f| {
            vec![f.function(
                "k",
                vec![],
                None,
                vec![f.expr_stmt(f.assign(f.number(1.0), f.number(2.0)))],
            )]
        })
        .unwrap_err();
        assert!(matches!(
            err,
            LowerError::InvalidAssignmentTarget {
                kind: SyntaxKind::NumericLiteral,
                ..
            }
        ));
    }

    fn unsupported_kind(build: impl Fn(&AstFactory<'_>) -> Expr) -> SyntaxKind {
        let err = lower_items(|f| {
            vec![f.function("u", vec![], None, vec![f.expr_stmt(build(f))])]
        })
        .unwrap_err();
        match err {
            LowerError::UnsupportedExpression { kind, .. } => kind,
            other => panic!("expected UnsupportedExpression, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_expressions_carry_kind() {
        assert_eq!(
            unsupported_kind(|f| f.unary(UnaryOp::Neg, f.number(1.0))),
            SyntaxKind::PrefixUnaryExpression
        );
        assert_eq!(
            unsupported_kind(|f| f.binary(BinaryOp::Sub, f.number(1.0), f.number(2.0))),
            SyntaxKind::BinaryExpression
        );
        assert_eq!(unsupported_kind(|f| f.null()), SyntaxKind::NullLiteral);
        assert_eq!(
            unsupported_kind(|f| f.array(vec![])),
            SyntaxKind::ArrayLiteralExpression
        );
        assert_eq!(
            unsupported_kind(|f| f.index(f.ident("u"), f.number(0.0))),
            SyntaxKind::ElementAccessExpression
        );
        assert_eq!(
            unsupported_kind(|f| f.add(f.bool(true), f.number(1.0))),
            SyntaxKind::BinaryExpression
        );
    }

    #[test]
    fn test_unresolved_name() {
        let err = lower_items(|f| {
            vec![f.function("u", vec![], None, vec![f.expr_stmt(f.ident("missing"))])]
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "cannot find `missing` in this scope");
    }

    #[test]
    fn test_call_checks_arity_and_void_use() {
        let arity = lower_items(|f| {
            vec![
                f.extern_function("ext", vec![f.param("x", TypeRef::Number)], None),
                f.function("u", vec![], None, vec![f.expr_stmt(f.call(f.ident("ext"), vec![]))]),
            ]
        })
        .unwrap_err();
        assert!(matches!(
            arity,
            LowerError::ArityMismatch {
                expected: 1,
                found: 0,
                ..
            }
        ));

        let void = lower_items(|f| {
            vec![
                f.extern_function("ext", vec![], None),
                f.function(
                    "u",
                    vec![],
                    None,
                    vec![f.const_decl("v", None, f.call(f.ident("ext"), vec![]))],
                ),
            ]
        })
        .unwrap_err();
        assert!(matches!(void, LowerError::VoidValue { ref callee, .. } if callee == "ext"));
    }
}
