//! Declaration lowering: functions and namespaces

use crate::context::LoweringContext;
use crate::error::LowerError;
use crate::scope::{BoundValue, ScopeId};
use crate::stmt::lower_stmts;
use kl_ir::{FuncId, Function, FunctionBuilder, IrError, Operand, verify_function};
use kl_syntax::{Block, FunctionDecl, Item, NamespaceDecl};
use kl_ty::signature_of;

pub fn lower_item(
    cx: &mut LoweringContext<'_>,
    scope: ScopeId,
    item: &Item,
) -> Result<(), LowerError> {
    match item {
        Item::Function(decl) => lower_function_declaration(cx, scope, decl).map(drop),
        Item::Namespace(decl) => lower_namespace_declaration(cx, scope, decl).map(drop),
        Item::Class { .. } | Item::Interface { .. } | Item::TypeAlias { .. } => {
            cx.diagnostics.unhandled_syntax(item.kind(), item.span());
            Ok(())
        }
    }
}

/// Declares a function in `scope` and lowers its body, if it has one
///
/// The simple name is bound before the body is lowered so the function can
/// call itself. A bodiless declaration stays an external symbol. When the
/// body fails, the declaration, its binding and the string constants the
/// body created are removed again.
fn lower_function_declaration(
    cx: &mut LoweringContext<'_>,
    scope: ScopeId,
    decl: &FunctionDecl,
) -> Result<FuncId, LowerError> {
    let name = cx.name(decl.name);
    let signature = signature_of(cx.types, decl, cx.interner)?;
    let ty = signature.function_type();
    let mangled = cx.mangler.mangle(&name, scope, &cx.scopes, cx.interner);
    log::debug!("declaring `{mangled}`: {ty}");

    let id = cx.module.declare_function(mangled.clone(), ty)?;
    let previous = cx
        .scopes
        .bind(scope, decl.name, BoundValue::Direct(Operand::Function(id)));

    let Some(body) = &decl.body else {
        return Ok(id);
    };

    let globals = cx.module.globals().len();
    if let Err(err) = lower_body(cx, scope, id, decl, body) {
        log::debug!("dropping `{mangled}`: {err}");
        cx.module.retract_declaration(id)?;
        cx.module.truncate_globals(globals);
        cx.scopes.restore(scope, decl.name, previous);
        return Err(err);
    }
    log::debug!("lowered body of `{mangled}`");
    Ok(id)
}

/// Builds, verifies and installs the body of the declared function `id`
fn lower_body(
    cx: &mut LoweringContext<'_>,
    scope: ScopeId,
    id: FuncId,
    decl: &FunctionDecl,
    body: &Block,
) -> Result<(), LowerError> {
    let declared = cx
        .module
        .function(id)
        .ok_or(IrError::UnknownFunction(id))?;
    let mut fb = FunctionBuilder::new(Function::new(declared.name.clone(), declared.ty.clone()));

    let body_scope = cx.scopes.enter(scope, None);
    let params = fb.function().params().to_vec();
    for (param, value) in decl.params.iter().zip(params) {
        fb.set_value_name(value, &cx.name(param.name))?;
        cx.scopes
            .bind(body_scope, param.name, BoundValue::Direct(value.into()));
    }

    let entry = fb.append_block("entry");
    fb.position_at_end(entry)?;
    let lowered = lower_stmts(cx, &mut fb, body_scope, &body.stmts);
    cx.scopes.discard(body_scope);
    lowered?;

    seal_function(cx, &mut fb, decl)?;

    let function = fb.finish();
    verify_function(&function, &cx.module)?;
    cx.module.define_function(id, function)?;
    Ok(())
}

/// Terminates the block the body fell off of
///
/// `void` functions get an implicit `ret void`. Other functions get
/// `unreachable`, plus a warning when that point can actually be reached.
fn seal_function(
    cx: &mut LoweringContext<'_>,
    fb: &mut FunctionBuilder,
    decl: &FunctionDecl,
) -> Result<(), LowerError> {
    let Some(block) = fb.current_block() else {
        return Ok(());
    };
    if fb.has_terminator(block) {
        return Ok(());
    }
    if fb.return_type().is_void() {
        fb.build_return(None)?;
        return Ok(());
    }
    if fb.function().reachable_blocks().contains(&block) {
        cx.diagnostics.missing_return(&fb.function().name, decl.span);
    }
    fb.build_unreachable()?;
    Ok(())
}

/// Lowers the members of a namespace into a named child scope
fn lower_namespace_declaration(
    cx: &mut LoweringContext<'_>,
    scope: ScopeId,
    decl: &NamespaceDecl,
) -> Result<ScopeId, LowerError> {
    log::debug!("entering namespace `{}`", cx.name(decl.name));
    let namespace = cx.scopes.enter(scope, Some(decl.name));
    for item in &decl.items {
        lower_item(cx, namespace, item)?;
    }
    cx.scopes
        .bind(scope, decl.name, BoundValue::Namespace(namespace));
    Ok(namespace)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{function_text, lower_items};
    use crate::{BoundValue, DiagnosticCode, LowerError, LoweringContext, NameMangler};
    use expect_test::expect;
    use kl_intern::Interner;
    use kl_span::FileId;
    use kl_syntax::make::AstFactory;
    use kl_syntax::{SyntaxKind, TypeRef};
    use kl_ty::TargetTypes;

    #[test]
    fn test_namespace_members_are_mangled() {
        let (module, _) = lower_items(|f| {
            vec![f.namespace(
                "M",
                vec![f.namespace("N", vec![f.function("f", vec![], None, vec![])])],
            )]
        })
        .unwrap();
        assert!(module.function_by_name("M__N__f").is_some());
        assert!(module.function_by_name("f").is_none());
    }

    #[test]
    fn test_recursion_resolves_own_name() {
        let (module, _) = lower_items(|f| {
            vec![f.function(
                "loop_forever",
                vec![f.param("n", TypeRef::Number)],
                Some(TypeRef::Number),
                vec![f.ret(Some(f.call(f.ident("loop_forever"), vec![f.ident("n")])))],
            )]
        })
        .unwrap();

        expect![[r#"
            define double @loop_forever(double %n) {
            entry:
              %1 = call double @loop_forever(double %n)
              ret double %1
            }
        "#]]
        .assert_eq(&function_text(&module, "loop_forever"));
    }

    #[test]
    fn test_bodiless_function_stays_external() {
        let (module, _) = lower_items(|f| {
            vec![f.extern_function("print", vec![f.param("s", TypeRef::String)], None)]
        })
        .unwrap();
        let text = function_text(&module, "print");
        assert_eq!(text, "declare void @print(%string)\n");
    }

    #[test]
    fn test_missing_return_is_flagged() {
        let (module, diagnostics) = lower_items(|f| {
            vec![f.function(
                "m",
                vec![f.param("c", TypeRef::Boolean)],
                Some(TypeRef::Number),
                vec![f.if_else(
                    f.ident("c"),
                    f.block_stmt(vec![f.ret(Some(f.number(1.0)))]),
                    None,
                )],
            )]
        })
        .unwrap();

        let warnings = diagnostics
            .with_code(DiagnosticCode::MissingReturn)
            .collect::<Vec<_>>();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("`m`"));
        assert!(function_text(&module, "m").ends_with("endif:\n  unreachable\n}\n"));
    }

    #[test]
    fn test_type_level_items_are_skipped() {
        let (module, diagnostics) = lower_items(|f| {
            vec![
                f.class("Point"),
                f.type_alias("Id", TypeRef::Number),
                f.function("after", vec![], None, vec![]),
            ]
        })
        .unwrap();

        let kinds = diagnostics.iter().map(|diag| diag.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![SyntaxKind::ClassDeclaration, SyntaxKind::TypeAliasDeclaration]
        );
        assert!(module.function_by_name("after").is_some());
    }

    #[test]
    fn test_failed_body_restores_earlier_binding() {
        let interner = Interner::new();
        let f = AstFactory::new(&interner, FileId(0));
        let file = f.source_file(
            "test.ts",
            vec![
                f.namespace("dup", vec![f.function("g", vec![], None, vec![])]),
                f.function(
                    "dup",
                    vec![],
                    None,
                    vec![
                        f.expr_stmt(f.string("orphan")),
                        f.expr_stmt(f.ident("nowhere")),
                    ],
                ),
            ],
        );
        let types = TargetTypes::new(&interner);
        let mut cx = LoweringContext::new("test", &types, &interner, NameMangler::default());

        let err = cx.lower_source_file(&file).unwrap_err();
        assert!(matches!(err, LowerError::UnresolvedName { ref name, .. } if name == "nowhere"));

        let global = cx.scopes().global();
        let bound = cx.scopes().resolve(global, interner.intern("dup"));
        assert!(matches!(bound, Some(BoundValue::Namespace(_))));
        assert!(cx.module().function_by_name("dup").is_none());
        assert!(cx.module().function_by_name("dup__g").is_some());
        assert!(cx.module().globals().is_empty());
    }
}
