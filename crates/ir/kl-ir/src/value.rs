//! Value handles, constants and operands

use crate::types::{IrType, StructType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a `u32` newtype index with `index()` and `Display`
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Position in the owning table
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[allow(dead_code, reason = "not every table is appended to by index")]
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// SSA value defined inside one function
    ValueId,
    "%"
);
id_type!(
    /// Basic block inside one function
    BlockId,
    "bb"
);
id_type!(
    /// Function inside a module
    FuncId,
    "fn#"
);
id_type!(
    /// Global constant inside a module
    GlobalId,
    "global#"
);

/// Compile-time constant
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// `i1` constant
    Bool(bool),
    /// Integer constant of the given width
    Int {
        /// Bit width
        bits: u32,
        /// Value
        value: i64,
    },
    /// `double` constant
    Double(f64),
    /// Constant aggregate
    Struct {
        /// Aggregate type
        ty: StructType,
        /// Field values in layout order
        fields: Vec<Constant>,
    },
    /// Address of a module global
    Global(GlobalId),
    /// Undefined value of a type
    Undef(IrType),
}

impl Constant {
    /// Type of the constant
    pub fn ty(&self) -> IrType {
        match self {
            Self::Bool(_) => IrType::Bool,
            Self::Int { bits, .. } => IrType::Int(*bits),
            Self::Double(_) => IrType::Double,
            Self::Struct { ty, .. } => IrType::Struct(ty.clone()),
            Self::Global(_) => IrType::Ptr,
            Self::Undef(ty) => ty.clone(),
        }
    }
}

/// Anything an instruction can consume
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Result of an instruction or a parameter
    Value(ValueId),
    /// Constant
    Constant(Constant),
    /// Address of a function
    Function(FuncId),
}

impl Operand {
    /// The SSA value, if this operand is one
    pub fn as_value(&self) -> Option<ValueId> {
        match self {
            Self::Value(value) => Some(*value),
            Self::Constant(_) | Self::Function(_) => None,
        }
    }
}

impl From<ValueId> for Operand {
    fn from(value: ValueId) -> Self {
        Self::Value(value)
    }
}

impl From<Constant> for Operand {
    fn from(constant: Constant) -> Self {
        Self::Constant(constant)
    }
}
