//! Constructors for syntax trees
//!
//! There is no parser in this workspace; front ends and tests build trees
//! through [`AstFactory`]. Every node gets a distinct one-byte span so
//! diagnostics can be traced back to the node that produced them.

use crate::{
    BinaryOp, Block, Expr, FunctionDecl, Item, NamespaceDecl, Param, SourceFile, Stmt, TypeRef,
    UnaryOp, VarDeclarator, VarKind,
};
use kl_intern::Interner;
use kl_span::{FileId, FileSpan, Span};
use std::cell::Cell;

/// Builds syntax nodes for one file
pub struct AstFactory<'src> {
    interner: &'src Interner,
    file: FileId,
    next_offset: Cell<u32>,
}

impl<'src> AstFactory<'src> {
    /// Creates a factory for nodes of `file`
    pub fn new(interner: &'src Interner, file: FileId) -> Self {
        Self {
            interner,
            file,
            next_offset: Cell::new(0),
        }
    }

    fn span(&self) -> FileSpan {
        let start = self.next_offset.get();
        self.next_offset.set(start + 1);
        FileSpan::new(self.file, Span::new(start, start + 1))
    }

    /// `name`
    pub fn ident(&self, name: &str) -> Expr {
        Expr::Identifier {
            name: self.interner.intern(name),
            span: self.span(),
        }
    }

    /// `object.property`
    pub fn member(&self, object: Expr, property: &str) -> Expr {
        Expr::Member {
            object: Box::new(object),
            property: self.interner.intern(property),
            span: self.span(),
        }
    }

    /// `callee(args..)`
    pub fn call(&self, callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call {
            callee: Box::new(callee),
            args,
            span: self.span(),
        }
    }

    /// `lhs op rhs`
    pub fn binary(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span: self.span(),
        }
    }

    /// `lhs = rhs`
    pub fn assign(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Assign, lhs, rhs)
    }

    /// `lhs + rhs`
    pub fn add(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Add, lhs, rhs)
    }

    /// `op operand`
    pub fn unary(&self, op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
            span: self.span(),
        }
    }

    /// `true` / `false`
    pub fn bool(&self, value: bool) -> Expr {
        Expr::Bool {
            value,
            span: self.span(),
        }
    }

    /// Numeric literal
    pub fn number(&self, value: f64) -> Expr {
        Expr::Number {
            value,
            span: self.span(),
        }
    }

    /// String literal
    pub fn string(&self, value: &str) -> Expr {
        Expr::String {
            value: value.to_owned(),
            span: self.span(),
        }
    }

    /// `null`
    pub fn null(&self) -> Expr {
        Expr::Null { span: self.span() }
    }

    /// `[elements..]`
    pub fn array(&self, elements: Vec<Expr>) -> Expr {
        Expr::Array {
            elements,
            span: self.span(),
        }
    }

    /// `object[index]`
    pub fn index(&self, object: Expr, index: Expr) -> Expr {
        Expr::Index {
            object: Box::new(object),
            index: Box::new(index),
            span: self.span(),
        }
    }

    /// `expr;`
    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        Stmt::Expr {
            expr,
            span: self.span(),
        }
    }

    /// `return value;`
    pub fn ret(&self, value: Option<Expr>) -> Stmt {
        Stmt::Return {
            value,
            span: self.span(),
        }
    }

    /// `if (condition) then_branch else else_branch`
    pub fn if_else(&self, condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
        Stmt::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
            span: self.span(),
        }
    }

    /// `while (condition) body`
    pub fn while_loop(&self, condition: Expr, body: Stmt) -> Stmt {
        Stmt::While {
            condition,
            body: Box::new(body),
            span: self.span(),
        }
    }

    /// `{ stmts.. }`
    pub fn block(&self, stmts: Vec<Stmt>) -> Block {
        Block {
            stmts,
            span: self.span(),
        }
    }

    /// `{ stmts.. }` in statement position
    pub fn block_stmt(&self, stmts: Vec<Stmt>) -> Stmt {
        Stmt::Block(self.block(stmts))
    }

    /// One declarator for [`Self::var`]
    pub fn declarator(
        &self,
        name: &str,
        ty: Option<TypeRef>,
        init: Option<Expr>,
    ) -> VarDeclarator {
        VarDeclarator {
            name: self.interner.intern(name),
            ty,
            init,
            span: self.span(),
        }
    }

    /// Variable statement with several declarators
    pub fn var(&self, kind: VarKind, declarators: Vec<VarDeclarator>) -> Stmt {
        Stmt::Var {
            kind,
            declarators,
            span: self.span(),
        }
    }

    /// `const name: ty = init;`
    pub fn const_decl(&self, name: &str, ty: Option<TypeRef>, init: Expr) -> Stmt {
        let declarator = self.declarator(name, ty, Some(init));
        self.var(VarKind::Const, vec![declarator])
    }

    /// `let name: ty = init;`
    pub fn let_decl(&self, name: &str, ty: Option<TypeRef>, init: Option<Expr>) -> Stmt {
        let declarator = self.declarator(name, ty, init);
        self.var(VarKind::Let, vec![declarator])
    }

    /// Named user type
    pub fn named_type(&self, name: &str) -> TypeRef {
        TypeRef::Named {
            name: self.interner.intern(name),
            span: self.span(),
        }
    }

    /// `name: ty`
    pub fn param(&self, name: &str, ty: TypeRef) -> Param {
        Param {
            name: self.interner.intern(name),
            ty,
            span: self.span(),
        }
    }

    /// Function declaration with a body
    pub fn function(
        &self,
        name: &str,
        params: Vec<Param>,
        return_type: Option<TypeRef>,
        body: Vec<Stmt>,
    ) -> Item {
        let body = self.block(body);
        Item::Function(FunctionDecl {
            name: self.interner.intern(name),
            params,
            return_type,
            body: Some(body),
            span: self.span(),
        })
    }

    /// Bodiless (external) function declaration
    pub fn extern_function(
        &self,
        name: &str,
        params: Vec<Param>,
        return_type: Option<TypeRef>,
    ) -> Item {
        Item::Function(FunctionDecl {
            name: self.interner.intern(name),
            params,
            return_type,
            body: None,
            span: self.span(),
        })
    }

    /// `namespace name { items.. }`
    pub fn namespace(&self, name: &str, items: Vec<Item>) -> Item {
        Item::Namespace(NamespaceDecl {
            name: self.interner.intern(name),
            items,
            span: self.span(),
        })
    }

    /// `class name {}`
    pub fn class(&self, name: &str) -> Item {
        Item::Class {
            name: self.interner.intern(name),
            span: self.span(),
        }
    }

    /// `type name = ty;`
    pub fn type_alias(&self, name: &str, ty: TypeRef) -> Item {
        Item::TypeAlias {
            name: self.interner.intern(name),
            ty,
            span: self.span(),
        }
    }

    /// Wraps items into a compilation unit
    pub fn source_file(&self, name: &str, items: Vec<Item>) -> SourceFile {
        SourceFile {
            file: self.file,
            name: name.to_owned(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SyntaxKind, VarKind};

    #[test]
    fn test_nodes_get_distinct_spans() {
        let interner = Interner::new();
        let make = AstFactory::new(&interner, FileId::new(1));
        let first = make.ident("a");
        let second = make.ident("a");
        assert_ne!(first.span(), second.span());
        assert_eq!(first.span().file, FileId::new(1));
    }

    #[test]
    fn test_kind_labels() {
        let interner = Interner::new();
        let make = AstFactory::new(&interner, FileId::new(0));
        let expr = make.member(make.ident("M"), "g");
        assert_eq!(expr.kind(), SyntaxKind::PropertyAccessExpression);
        assert_eq!(expr.kind().to_string(), "PropertyAccessExpression");
        let loop_stmt = make.while_loop(make.bool(true), make.block_stmt(vec![]));
        assert_eq!(loop_stmt.kind(), SyntaxKind::WhileStatement);
        assert_eq!(BinaryOp::Ne.to_string(), "!==");
        assert!(!VarKind::Const.is_mutable());
    }
}
