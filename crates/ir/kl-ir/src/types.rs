//! IR type system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the two-field string aggregate `{ ptr, i32 }`
pub const STRING_TYPE_NAME: &str = "string";

/// IR types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrType {
    /// No value
    Void,
    /// One-bit boolean (`i1`)
    Bool,
    /// Integer of the given bit width
    Int(u32),
    /// 64-bit float
    Double,
    /// Opaque pointer
    Ptr,
    /// Fixed-length array
    Array {
        /// Element type
        element: Box<IrType>,
        /// Number of elements
        len: u64,
    },
    /// Aggregate
    Struct(StructType),
    /// Function signature (only meaningful behind a pointer)
    Function(FunctionType),
}

impl IrType {
    /// The fixed string aggregate: a pointer to the bytes and their length
    pub fn string() -> Self {
        Self::Struct(StructType::named(
            STRING_TYPE_NAME,
            vec![Self::Ptr, Self::Int(32)],
        ))
    }

    /// `i8`
    pub fn byte() -> Self {
        Self::Int(8)
    }

    /// Whether this is `void`
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Whether values of this type can live in a stack slot or register
    pub fn is_sized(&self) -> bool {
        !matches!(self, Self::Void | Self::Function(_))
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Bool => write!(f, "i1"),
            Self::Int(bits) => write!(f, "i{bits}"),
            Self::Double => write!(f, "double"),
            Self::Ptr => write!(f, "ptr"),
            Self::Array { element, len } => write!(f, "[{len} x {element}]"),
            Self::Struct(ty) => write!(f, "{ty}"),
            Self::Function(ty) => write!(f, "{ty}"),
        }
    }
}

/// Aggregate type; named structs print by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructType {
    /// Type name, `None` for literal structs
    pub name: Option<String>,
    /// Field types in layout order
    pub fields: Vec<IrType>,
}

impl StructType {
    /// Named struct
    pub fn named(name: &str, fields: Vec<IrType>) -> Self {
        Self {
            name: Some(name.to_owned()),
            fields,
        }
    }

    /// `{ a, b }` regardless of the name
    pub fn body(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        if fields.is_empty() {
            "{}".to_owned()
        } else {
            format!("{{ {} }}", fields.join(", "))
        }
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "%{name}"),
            None => write!(f, "{}", self.body()),
        }
    }
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionType {
    /// Parameter types in order
    pub params: Vec<IrType>,
    /// Return type
    pub ret: Box<IrType>,
}

impl FunctionType {
    /// Creates a signature
    pub fn new(params: Vec<IrType>, ret: IrType) -> Self {
        Self {
            params,
            ret: Box::new(ret),
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        write!(f, "{} ({})", self.ret, params.join(", "))
    }
}
