//! Translation of source types into IR types
//!
//! The lowering engine only talks to [`TypeResolver`], so a front end with a
//! richer type system can plug in its own mapping. [`TargetTypes`] covers the
//! primitive types: `number`, `boolean`, `string` and `void`.

mod error;
mod signature;

pub use error::TypeError;
pub use signature::{FunctionSignature, signature_of};

use kl_intern::Interner;
use kl_ir::IrType;
use kl_syntax::TypeRef;

/// Maps source type descriptors to IR types
pub trait TypeResolver {
    /// IR type for a source type
    ///
    /// # Errors
    /// [`TypeError::Unsupported`] when the type has no IR translation.
    fn resolve_type(&self, ty: &TypeRef) -> Result<IrType, TypeError>;

    /// Representation of string values
    fn string_type(&self) -> IrType {
        IrType::string()
    }

    /// Prints a source type for diagnostics
    fn describe(&self, ty: &TypeRef) -> String;
}

/// Primitive type mapping
#[derive(Debug, Clone, Copy)]
pub struct TargetTypes<'src> {
    interner: &'src Interner,
}

impl<'src> TargetTypes<'src> {
    /// Creates the mapping; the interner is used to print named types
    pub fn new(interner: &'src Interner) -> Self {
        Self { interner }
    }
}

impl TypeResolver for TargetTypes<'_> {
    fn resolve_type(&self, ty: &TypeRef) -> Result<IrType, TypeError> {
        match ty {
            TypeRef::Number => Ok(IrType::Double),
            TypeRef::Boolean => Ok(IrType::Bool),
            TypeRef::String => Ok(self.string_type()),
            TypeRef::Void => Ok(IrType::Void),
            TypeRef::Named { span, .. } => Err(TypeError::Unsupported {
                name: self.describe(ty),
                span: Some(*span),
            }),
            TypeRef::Array(_) => Err(TypeError::Unsupported {
                name: self.describe(ty),
                span: None,
            }),
        }
    }

    fn describe(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Number => "number".to_owned(),
            TypeRef::Boolean => "boolean".to_owned(),
            TypeRef::String => "string".to_owned(),
            TypeRef::Void => "void".to_owned(),
            TypeRef::Named { name, .. } => self
                .interner
                .try_resolve(name)
                .unwrap_or("<unknown>")
                .to_owned(),
            TypeRef::Array(element) => format!("{}[]", self.describe(element)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kl_span::FileId;
    use kl_syntax::make::AstFactory;

    #[test]
    fn test_primitive_mapping() {
        let interner = Interner::new();
        let types = TargetTypes::new(&interner);
        assert_eq!(types.resolve_type(&TypeRef::Number), Ok(IrType::Double));
        assert_eq!(types.resolve_type(&TypeRef::Boolean), Ok(IrType::Bool));
        assert_eq!(types.resolve_type(&TypeRef::String), Ok(IrType::string()));
        assert_eq!(types.resolve_type(&TypeRef::Void), Ok(IrType::Void));
    }

    #[test]
    fn test_named_and_array_types_are_rejected() {
        let interner = Interner::new();
        let factory = AstFactory::new(&interner, FileId(0));
        let types = TargetTypes::new(&interner);

        let named = factory.named_type("Point");
        let err = types.resolve_type(&named).unwrap_err();
        assert_eq!(err.to_string(), "type `Point` cannot be lowered");
        assert!(err.span().is_some());

        let array = TypeRef::Array(Box::new(TypeRef::Number));
        assert_eq!(
            types.resolve_type(&array),
            Err(TypeError::Unsupported {
                name: "number[]".to_owned(),
                span: None
            })
        );
    }
}
