//! Typed source syntax tree
//!
//! The tree is produced by a front end (or by [`make::AstFactory`] in tests) and
//! consumed by the lowering engine. Every construct is a closed enum so lowering
//! is an exhaustive `match`; kinds the engine does not cover still have a variant
//! so they can be reported by name instead of being dropped silently.

pub mod make;

use derive_more::Display;
use kl_intern::Symbol;
use kl_span::{FileId, FileSpan};
use serde::{Deserialize, Serialize};

/// Syntax kind labels used in diagnostics
#[derive(Copy, Clone, Debug, Display, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum SyntaxKind {
    /// A whole compilation unit
    SourceFile,
    /// `function f(..) { .. }`
    FunctionDeclaration,
    /// `namespace N { .. }`
    NamespaceDeclaration,
    /// `class C { .. }`
    ClassDeclaration,
    /// `interface I { .. }`
    InterfaceDeclaration,
    /// `type T = ..`
    TypeAliasDeclaration,
    /// `{ .. }`
    Block,
    /// `expr;`
    ExpressionStatement,
    /// `if (..) .. else ..`
    IfStatement,
    /// `return ..;`
    ReturnStatement,
    /// `const`/`let`/`var` declarations
    VariableStatement,
    /// `while (..) ..`
    WhileStatement,
    /// `break;`
    BreakStatement,
    /// `continue;`
    ContinueStatement,
    /// `;`
    EmptyStatement,
    /// A bare name
    Identifier,
    /// `a.b`
    PropertyAccessExpression,
    /// `f(..)`
    CallExpression,
    /// `a op b`
    BinaryExpression,
    /// `op a`
    PrefixUnaryExpression,
    /// `true` / `false`
    BooleanLiteral,
    /// `1.5`
    NumericLiteral,
    /// `"text"`
    StringLiteral,
    /// `null`
    NullLiteral,
    /// `[a, b]`
    ArrayLiteralExpression,
    /// `a[i]`
    ElementAccessExpression,
}

/// A compilation unit
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// File identity used in spans
    pub file: FileId,
    /// Display name (usually the path)
    pub name: String,
    /// Top-level declarations in source order
    pub items: Vec<Item>,
}

/// Top-level or namespace-member declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Function declaration, with or without a body
    Function(FunctionDecl),
    /// Namespace declaration
    Namespace(NamespaceDecl),
    /// Class declaration
    Class {
        /// Class name
        name: Symbol,
        /// Source location
        span: FileSpan,
    },
    /// Interface declaration
    Interface {
        /// Interface name
        name: Symbol,
        /// Source location
        span: FileSpan,
    },
    /// Type alias declaration
    TypeAlias {
        /// Alias name
        name: Symbol,
        /// Aliased type
        ty: TypeRef,
        /// Source location
        span: FileSpan,
    },
}

impl Item {
    /// Kind label for diagnostics
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Self::Function(_) => SyntaxKind::FunctionDeclaration,
            Self::Namespace(_) => SyntaxKind::NamespaceDeclaration,
            Self::Class { .. } => SyntaxKind::ClassDeclaration,
            Self::Interface { .. } => SyntaxKind::InterfaceDeclaration,
            Self::TypeAlias { .. } => SyntaxKind::TypeAliasDeclaration,
        }
    }

    /// Source location
    pub fn span(&self) -> FileSpan {
        match self {
            Self::Function(decl) => decl.span,
            Self::Namespace(decl) => decl.span,
            Self::Class { span, .. }
            | Self::Interface { span, .. }
            | Self::TypeAlias { span, .. } => *span,
        }
    }
}

/// Function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// Simple (unmangled) name
    pub name: Symbol,
    /// Parameters in declaration order
    pub params: Vec<Param>,
    /// Declared return type; `None` means `void`
    pub return_type: Option<TypeRef>,
    /// Body; `None` for an external declaration
    pub body: Option<Block>,
    /// Source location
    pub span: FileSpan,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name
    pub name: Symbol,
    /// Declared type
    pub ty: TypeRef,
    /// Source location
    pub span: FileSpan,
}

/// Namespace declaration
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    /// Namespace name
    pub name: Symbol,
    /// Member declarations
    pub items: Vec<Item>,
    /// Source location
    pub span: FileSpan,
}

/// Braced statement list
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Statements in order
    pub stmts: Vec<Stmt>,
    /// Source location
    pub span: FileSpan,
}

/// Binding mutability of a variable statement
#[derive(Copy, Clone, Debug, Display, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum VarKind {
    /// `const`
    #[display("const")]
    Const,
    /// `let`
    #[display("let")]
    Let,
    /// `var`
    #[display("var")]
    Var,
}

impl VarKind {
    /// Whether bindings of this kind can be reassigned
    pub fn is_mutable(self) -> bool {
        !matches!(self, Self::Const)
    }
}

/// One `name: T = init` entry of a variable statement
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    /// Bound name
    pub name: Symbol,
    /// Type annotation
    pub ty: Option<TypeRef>,
    /// Initializer expression
    pub init: Option<Expr>,
    /// Source location
    pub span: FileSpan,
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Nested block
    Block(Block),
    /// Expression statement
    Expr {
        /// Expression
        expr: Expr,
        /// Source location
        span: FileSpan,
    },
    /// Conditional
    If {
        /// Condition
        condition: Expr,
        /// Then branch
        then_branch: Box<Stmt>,
        /// Optional else branch
        else_branch: Option<Box<Stmt>>,
        /// Source location
        span: FileSpan,
    },
    /// Return statement
    Return {
        /// Return value
        value: Option<Expr>,
        /// Source location
        span: FileSpan,
    },
    /// Variable statement with one or more declarators
    Var {
        /// `const`, `let` or `var`
        kind: VarKind,
        /// Declared bindings
        declarators: Vec<VarDeclarator>,
        /// Source location
        span: FileSpan,
    },
    /// While loop
    While {
        /// Loop condition
        condition: Expr,
        /// Loop body
        body: Box<Stmt>,
        /// Source location
        span: FileSpan,
    },
    /// `break;`
    Break {
        /// Source location
        span: FileSpan,
    },
    /// `continue;`
    Continue {
        /// Source location
        span: FileSpan,
    },
    /// `;`
    Empty {
        /// Source location
        span: FileSpan,
    },
}

impl Stmt {
    /// Kind label for diagnostics
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Self::Block(_) => SyntaxKind::Block,
            Self::Expr { .. } => SyntaxKind::ExpressionStatement,
            Self::If { .. } => SyntaxKind::IfStatement,
            Self::Return { .. } => SyntaxKind::ReturnStatement,
            Self::Var { .. } => SyntaxKind::VariableStatement,
            Self::While { .. } => SyntaxKind::WhileStatement,
            Self::Break { .. } => SyntaxKind::BreakStatement,
            Self::Continue { .. } => SyntaxKind::ContinueStatement,
            Self::Empty { .. } => SyntaxKind::EmptyStatement,
        }
    }

    /// Source location
    pub fn span(&self) -> FileSpan {
        match self {
            Self::Block(block) => block.span,
            Self::Expr { span, .. }
            | Self::If { span, .. }
            | Self::Return { span, .. }
            | Self::Var { span, .. }
            | Self::While { span, .. }
            | Self::Break { span }
            | Self::Continue { span }
            | Self::Empty { span } => *span,
        }
    }
}

/// Binary operators
#[derive(Copy, Clone, Debug, Display, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `=`
    #[display("=")]
    Assign,
    /// `+`
    #[display("+")]
    Add,
    /// `-`
    #[display("-")]
    Sub,
    /// `*`
    #[display("*")]
    Mul,
    /// `/`
    #[display("/")]
    Div,
    /// `<`
    #[display("<")]
    Lt,
    /// `>`
    #[display(">")]
    Gt,
    /// `===`
    #[display("===")]
    Eq,
    /// `!==`
    #[display("!==")]
    Ne,
    /// `&&`
    #[display("&&")]
    And,
    /// `||`
    #[display("||")]
    Or,
}

/// Prefix unary operators
#[derive(Copy, Clone, Debug, Display, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-`
    #[display("-")]
    Neg,
    /// `!`
    #[display("!")]
    Not,
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Name reference
    Identifier {
        /// Referenced name
        name: Symbol,
        /// Source location
        span: FileSpan,
    },
    /// `object.property`
    Member {
        /// Left-hand side
        object: Box<Expr>,
        /// Accessed member name
        property: Symbol,
        /// Source location
        span: FileSpan,
    },
    /// Function call
    Call {
        /// Callee expression
        callee: Box<Expr>,
        /// Arguments in source order
        args: Vec<Expr>,
        /// Source location
        span: FileSpan,
    },
    /// Binary operation (including assignment)
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
        /// Source location
        span: FileSpan,
    },
    /// Prefix unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
        /// Source location
        span: FileSpan,
    },
    /// `true` / `false`
    Bool {
        /// Literal value
        value: bool,
        /// Source location
        span: FileSpan,
    },
    /// Numeric literal
    Number {
        /// Literal value
        value: f64,
        /// Source location
        span: FileSpan,
    },
    /// String literal (already unescaped)
    String {
        /// Literal contents
        value: String,
        /// Source location
        span: FileSpan,
    },
    /// `null`
    Null {
        /// Source location
        span: FileSpan,
    },
    /// `[a, b, ..]`
    Array {
        /// Elements
        elements: Vec<Expr>,
        /// Source location
        span: FileSpan,
    },
    /// `object[index]`
    Index {
        /// Indexed expression
        object: Box<Expr>,
        /// Index expression
        index: Box<Expr>,
        /// Source location
        span: FileSpan,
    },
}

impl Expr {
    /// Kind label for diagnostics
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Self::Identifier { .. } => SyntaxKind::Identifier,
            Self::Member { .. } => SyntaxKind::PropertyAccessExpression,
            Self::Call { .. } => SyntaxKind::CallExpression,
            Self::Binary { .. } => SyntaxKind::BinaryExpression,
            Self::Unary { .. } => SyntaxKind::PrefixUnaryExpression,
            Self::Bool { .. } => SyntaxKind::BooleanLiteral,
            Self::Number { .. } => SyntaxKind::NumericLiteral,
            Self::String { .. } => SyntaxKind::StringLiteral,
            Self::Null { .. } => SyntaxKind::NullLiteral,
            Self::Array { .. } => SyntaxKind::ArrayLiteralExpression,
            Self::Index { .. } => SyntaxKind::ElementAccessExpression,
        }
    }

    /// Source location
    pub fn span(&self) -> FileSpan {
        match self {
            Self::Identifier { span, .. }
            | Self::Member { span, .. }
            | Self::Call { span, .. }
            | Self::Binary { span, .. }
            | Self::Unary { span, .. }
            | Self::Bool { span, .. }
            | Self::Number { span, .. }
            | Self::String { span, .. }
            | Self::Null { span }
            | Self::Array { span, .. }
            | Self::Index { span, .. } => *span,
        }
    }
}

/// Source-level type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `string`
    String,
    /// `void`
    Void,
    /// A named user type
    Named {
        /// Type name
        name: Symbol,
        /// Source location
        span: FileSpan,
    },
    /// `T[]`
    Array(Box<TypeRef>),
}
