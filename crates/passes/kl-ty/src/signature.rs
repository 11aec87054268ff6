//! Function signatures derived from declarations

use crate::{TypeError, TypeResolver};
use kl_intern::Interner;
use kl_ir::{FunctionType, IrType};
use kl_syntax::FunctionDecl;

/// Return type and ordered parameter types of a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// Return type, `void` when the declaration has no annotation
    pub ret: IrType,
    /// Parameter types in declaration order
    pub params: Vec<IrType>,
}

impl FunctionSignature {
    /// The IR function type
    pub fn function_type(&self) -> FunctionType {
        FunctionType::new(self.params.clone(), self.ret.clone())
    }
}

/// Resolves every type in the declaration's header
///
/// # Errors
/// The first unresolvable type, or [`TypeError::VoidParameter`] for a
/// parameter declared as `void`.
pub fn signature_of(
    resolver: &dyn TypeResolver,
    decl: &FunctionDecl,
    interner: &Interner,
) -> Result<FunctionSignature, TypeError> {
    let ret = match &decl.return_type {
        Some(ty) => resolver.resolve_type(ty)?,
        None => IrType::Void,
    };

    let params = decl
        .params
        .iter()
        .map(|param| {
            let ty = resolver.resolve_type(&param.ty)?;
            if ty.is_void() {
                return Err(TypeError::VoidParameter {
                    param: interner.resolve(&param.name).to_owned(),
                    span: param.span,
                });
            }
            Ok(ty)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FunctionSignature { ret, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TargetTypes;
    use kl_span::FileId;
    use kl_syntax::make::AstFactory;
    use kl_syntax::{Item, TypeRef};

    fn decl(item: Item) -> FunctionDecl {
        match item {
            Item::Function(decl) => decl,
            other => panic!("expected a function, found {}", other.kind()),
        }
    }

    #[test]
    fn test_signature_defaults_to_void() {
        let interner = Interner::new();
        let f = AstFactory::new(&interner, FileId(0));
        let types = TargetTypes::new(&interner);

        let item = f.extern_function(
            "log",
            vec![f.param("message", TypeRef::String), f.param("level", TypeRef::Number)],
            None,
        );
        let signature = signature_of(&types, &decl(item), &interner).unwrap();
        assert_eq!(signature.ret, IrType::Void);
        assert_eq!(signature.params, vec![IrType::string(), IrType::Double]);
        assert_eq!(signature.function_type().to_string(), "void (%string, double)");
    }

    #[test]
    fn test_void_parameter_is_rejected() {
        let interner = Interner::new();
        let f = AstFactory::new(&interner, FileId(0));
        let types = TargetTypes::new(&interner);

        let item = f.extern_function("bad", vec![f.param("nothing", TypeRef::Void)], None);
        let err = signature_of(&types, &decl(item), &interner).unwrap_err();
        assert!(matches!(err, TypeError::VoidParameter { ref param, .. } if param == "nothing"));
    }
}
