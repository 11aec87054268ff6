//! Statement lowering

use crate::context::LoweringContext;
use crate::error::LowerError;
use crate::expr::{lower_call, lower_expr};
use crate::scope::{BoundValue, ScopeId, StackSlot};
use kl_ir::{BlockId, FunctionBuilder, IrType, Operand};
use kl_span::FileSpan;
use kl_syntax::{Block, Expr, Stmt, VarDeclarator, VarKind};

/// Lowers statements in order, stopping at the first one that follows a
/// terminator
pub fn lower_stmts(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    stmts: &[Stmt],
) -> Result<(), LowerError> {
    for (index, stmt) in stmts.iter().enumerate() {
        if fb.is_terminated() {
            log::debug!(
                "{}: skipping {} unreachable statement(s)",
                stmt.span(),
                stmts.len() - index
            );
            break;
        }
        lower_stmt(cx, fb, scope, stmt)?;
    }
    Ok(())
}

fn lower_stmt(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    stmt: &Stmt,
) -> Result<(), LowerError> {
    match stmt {
        Stmt::Block(block) => lower_block(cx, fb, scope, block),
        Stmt::Expr { expr, .. } => lower_expr_stmt(cx, fb, scope, expr),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => lower_if(cx, fb, scope, condition, then_branch, else_branch.as_deref()),
        Stmt::Return { value, span } => lower_return(cx, fb, scope, value.as_ref(), *span),
        Stmt::Var {
            kind, declarators, ..
        } => declarators
            .iter()
            .try_for_each(|decl| lower_declarator(cx, fb, scope, *kind, decl)),
        Stmt::While { .. }
        | Stmt::Break { .. }
        | Stmt::Continue { .. }
        | Stmt::Empty { .. } => {
            cx.diagnostics.unhandled_syntax(stmt.kind(), stmt.span());
            Ok(())
        }
    }
}

fn lower_block(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    block: &Block,
) -> Result<(), LowerError> {
    let inner = cx.scopes.enter(scope, None);
    let result = lower_stmts(cx, fb, inner, &block.stmts);
    cx.scopes.discard(inner);
    result
}

fn lower_expr_stmt(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    expr: &Expr,
) -> Result<(), LowerError> {
    // Calls are lowered directly so that void results are accepted here
    if let Expr::Call { callee, args, span } = expr {
        lower_call(cx, fb, scope, callee, args, *span)?;
    } else {
        lower_expr(cx, fb, scope, expr)?;
    }
    Ok(())
}

fn lower_if(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    condition: &Expr,
    then_branch: &Stmt,
    else_branch: Option<&Stmt>,
) -> Result<(), LowerError> {
    let cond = lower_expr(cx, fb, scope, condition)?.load(fb)?;
    let cond_ty = fb.value_type(&cond)?;
    if cond_ty != IrType::Bool {
        return Err(LowerError::unsupported(
            condition.kind(),
            format!("condition must be a boolean, found `{cond_ty}`"),
            condition.span(),
        ));
    }

    let then_block = fb.append_block("then");
    let else_block = fb.append_block("else");
    let endif = fb.append_block("endif");
    fb.build_cond_br(cond, then_block, else_block)?;

    lower_branch(cx, fb, scope, then_block, Some(then_branch), endif)?;
    lower_branch(cx, fb, scope, else_block, else_branch, endif)?;
    fb.position_at_end(endif)?;
    Ok(())
}

/// Lowers `stmt` into `dest` and falls through to `continuation`
fn lower_branch(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    dest: BlockId,
    stmt: Option<&Stmt>,
    continuation: BlockId,
) -> Result<(), LowerError> {
    fb.position_at_end(dest)?;
    if let Some(stmt) = stmt {
        lower_stmt(cx, fb, scope, stmt)?;
    }
    if !fb.is_terminated() {
        fb.build_br(continuation)?;
    }
    Ok(())
}

fn lower_return(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    value: Option<&Expr>,
    span: FileSpan,
) -> Result<(), LowerError> {
    let expected = fb.return_type().clone();
    let Some(expr) = value else {
        if !expected.is_void() {
            return Err(LowerError::TypeMismatch {
                context: "return",
                expected,
                found: IrType::Void,
                span,
            });
        }
        fb.build_return(None)?;
        return Ok(());
    };

    let returned = lower_expr(cx, fb, scope, expr)?.load(fb)?;
    let found = fb.value_type(&returned)?;
    if found != expected {
        return Err(LowerError::TypeMismatch {
            context: "return",
            expected,
            found,
            span: expr.span(),
        });
    }
    fb.build_return(Some(returned))?;
    Ok(())
}

/// Lowers an initializer and checks it against the annotation, if any
fn lower_initializer(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    declared: Option<&IrType>,
    expr: &Expr,
) -> Result<(Operand, IrType), LowerError> {
    let value = lower_expr(cx, fb, scope, expr)?.load(fb)?;
    let ty = fb.value_type(&value)?;
    if let Some(expected) = declared.filter(|expected| **expected != ty) {
        return Err(LowerError::TypeMismatch {
            context: "initializer",
            expected: expected.clone(),
            found: ty,
            span: expr.span(),
        });
    }
    Ok((value, ty))
}

fn lower_declarator(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    scope: ScopeId,
    kind: VarKind,
    decl: &VarDeclarator,
) -> Result<(), LowerError> {
    let name = cx.name(decl.name);
    let declared = decl
        .ty
        .as_ref()
        .map(|ty| cx.types.resolve_type(ty))
        .transpose()?;
    let init = decl
        .init
        .as_ref()
        .map(|expr| lower_initializer(cx, fb, scope, declared.as_ref(), expr))
        .transpose()?;

    if !kind.is_mutable() {
        let Some((value, _)) = init else {
            return Err(LowerError::MissingInitializer {
                name,
                span: decl.span,
            });
        };
        if let Some(id) = value.as_value() {
            fb.set_value_name(id, &name)?;
        }
        cx.scopes.bind(scope, decl.name, BoundValue::Direct(value));
        return Ok(());
    }

    let ty = match (declared, &init) {
        (Some(ty), _) => ty,
        (None, Some((_, ty))) => ty.clone(),
        (None, None) => {
            return Err(LowerError::UntypedBinding {
                name,
                span: decl.span,
            });
        }
    };
    let ptr = fb.build_entry_alloca(ty.clone(), &name)?;
    if let Some((value, _)) = init {
        fb.build_store(value, ptr)?;
    }
    cx.scopes
        .bind(scope, decl.name, BoundValue::Slot(StackSlot { ptr, ty }));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{function_text, lower_items};
    use crate::{DiagnosticCode, LowerError};
    use expect_test::expect;
    use kl_syntax::{SyntaxKind, TypeRef, VarKind};

    #[test]
    fn test_if_else_with_returns_in_both_branches() {
        let (module, diagnostics) = lower_items(|f| {
            vec![f.function(
                "f",
                vec![f.param("c", TypeRef::Boolean)],
                Some(TypeRef::Number),
                vec![f.if_else(
                    f.ident("c"),
                    f.block_stmt(vec![f.ret(Some(f.number(1.0)))]),
                    Some(f.block_stmt(vec![f.ret(Some(f.number(2.0)))])),
                )],
            )]
        })
        .unwrap();

        assert!(diagnostics.is_empty());
        expect![[r#"
            define double @f(i1 %c) {
            entry:
              br i1 %c, label %then, label %else

            then:
              ret double 1.0

            else:
              ret double 2.0

            endif:
              unreachable
            }
        "#]]
        .assert_eq(&function_text(&module, "f"));
    }

    #[test]
    fn test_branches_fall_through_to_endif() {
        let (module, _) = lower_items(|f| {
            vec![f.function(
                "g",
                vec![f.param("c", TypeRef::Boolean)],
                None,
                vec![
                    f.let_decl("x", None, Some(f.number(0.0))),
                    f.if_else(
                        f.ident("c"),
                        f.expr_stmt(f.assign(f.ident("x"), f.number(1.0))),
                        None,
                    ),
                ],
            )]
        })
        .unwrap();

        expect![[r#"
            define void @g(i1 %c) {
            entry:
              %x = alloca double
              store double 0.0, ptr %x
              br i1 %c, label %then, label %else

            then:
              store double 1.0, ptr %x
              br label %endif

            else:
              br label %endif

            endif:
              ret void
            }
        "#]]
        .assert_eq(&function_text(&module, "g"));
    }

    #[test]
    fn test_statements_after_return_are_skipped() {
        let (module, _) = lower_items(|f| {
            vec![f.function(
                "s",
                vec![],
                Some(TypeRef::Number),
                vec![
                    f.ret(Some(f.number(1.0))),
                    f.let_decl("x", None, Some(f.number(2.0))),
                ],
            )]
        })
        .unwrap();

        expect![[r#"
            define double @s() {
            entry:
              ret double 1.0
            }
        "#]]
        .assert_eq(&function_text(&module, "s"));
    }

    #[test]
    fn test_loops_are_skipped_with_warning() {
        let (_, diagnostics) = lower_items(|f| {
            vec![f.function(
                "w",
                vec![],
                None,
                vec![f.while_loop(f.bool(true), f.block_stmt(vec![]))],
            )]
        })
        .unwrap();

        let warnings = diagnostics
            .with_code(DiagnosticCode::UnhandledSyntax)
            .map(|diag| diag.kind)
            .collect::<Vec<_>>();
        assert_eq!(warnings, vec![SyntaxKind::WhileStatement]);
    }

    #[test]
    fn test_condition_must_be_boolean() {
        let err = lower_items(|f| {
            vec![f.function(
                "c",
                vec![],
                None,
                vec![f.if_else(f.number(1.0), f.block_stmt(vec![]), None)],
            )]
        })
        .unwrap_err();
        assert!(matches!(
            err,
            LowerError::UnsupportedExpression {
                kind: SyntaxKind::NumericLiteral,
                ..
            }
        ));
    }

    #[test]
    fn test_binding_errors() {
        let missing = lower_items(|f| {
            vec![f.function(
                "m",
                vec![],
                None,
                vec![f.var(
                    VarKind::Const,
                    vec![f.declarator("c", Some(TypeRef::Number), None)],
                )],
            )]
        })
        .unwrap_err();
        assert!(matches!(missing, LowerError::MissingInitializer { ref name, .. } if name == "c"));

        let untyped = lower_items(|f| {
            vec![f.function("m", vec![], None, vec![f.let_decl("v", None, None)])]
        })
        .unwrap_err();
        assert!(matches!(untyped, LowerError::UntypedBinding { ref name, .. } if name == "v"));

        let mismatch = lower_items(|f| {
            vec![f.function(
                "m",
                vec![],
                None,
                vec![f.let_decl("v", Some(TypeRef::Boolean), Some(f.number(1.0)))],
            )]
        })
        .unwrap_err();
        assert!(matches!(
            mismatch,
            LowerError::TypeMismatch {
                context: "initializer",
                ..
            }
        ));
    }

    #[test]
    fn test_return_type_is_checked() {
        let err = lower_items(|f| {
            vec![f.function("r", vec![], Some(TypeRef::Number), vec![f.ret(None)])]
        })
        .unwrap_err();
        assert!(matches!(err, LowerError::TypeMismatch { context: "return", .. }));
    }

    #[test]
    fn test_block_bindings_end_with_the_block() {
        let err = lower_items(|f| {
            vec![f.function(
                "b",
                vec![],
                Some(TypeRef::Number),
                vec![
                    f.block_stmt(vec![f.let_decl("y", None, Some(f.number(1.0)))]),
                    f.ret(Some(f.ident("y"))),
                ],
            )]
        })
        .unwrap_err();
        assert!(matches!(err, LowerError::UnresolvedName { ref name, .. } if name == "y"));
    }

    #[test]
    fn test_inner_shadow_leaves_outer_slot() {
        let (module, _) = lower_items(|f| {
            vec![f.function(
                "s",
                vec![f.param("c", TypeRef::Boolean)],
                Some(TypeRef::Number),
                vec![
                    f.let_decl("x", None, Some(f.number(1.0))),
                    f.if_else(
                        f.ident("c"),
                        f.block_stmt(vec![
                            f.let_decl("x", None, Some(f.number(2.0))),
                            f.expr_stmt(f.assign(f.ident("x"), f.number(3.0))),
                        ]),
                        None,
                    ),
                    f.ret(Some(f.ident("x"))),
                ],
            )]
        })
        .unwrap();

        expect![[r#"
            define double @s(i1 %c) {
            entry:
              %x = alloca double
              %x.1 = alloca double
              store double 1.0, ptr %x
              br i1 %c, label %then, label %else

            then:
              store double 2.0, ptr %x.1
              store double 3.0, ptr %x.1
              br label %endif

            else:
              br label %endif

            endif:
              %3 = load double, ptr %x
              ret double %3
            }
        "#]]
        .assert_eq(&function_text(&module, "s"));
    }
}
