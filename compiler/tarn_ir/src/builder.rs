//! Convenience constructor for syntax trees.
//!
//! Parsers, embedders and tests build trees through `AstBuilder` instead of
//! spelling out `Node::new(...)` with child positions by hand. Every node is
//! stamped with the builder's current location; move it with [`AstBuilder::at`].
//!
//! ```text
//! let b = AstBuilder::new(&interner, "main.tn");
//! let program = b.program(vec![
//!     b.let_mut("x", b.int(1)),
//!     b.at(2).assign("x", b.binary(BinaryOp::Add, b.sym("x"), b.int(2))),
//!     b.at(3).call("println", vec![b.sym("x")]),
//! ]);
//! ```

use std::cell::Cell;
use std::rc::Rc;

use crate::ast::{BinaryOp, FnDef, Literal, Mutability, Node, NodeKind, UnaryOp};
use crate::{Name, SharedInterner, SourceLoc};

pub struct AstBuilder {
    interner: SharedInterner,
    file: Name,
    line: Cell<u32>,
    column: Cell<u32>,
}

impl AstBuilder {
    pub fn new(interner: &SharedInterner, file: &str) -> Self {
        AstBuilder {
            file: interner.intern(file),
            interner: interner.clone(),
            line: Cell::new(1),
            column: Cell::new(1),
        }
    }

    /// Move the location stamped on subsequently built nodes to `line`, column 1.
    pub fn at(&self, line: u32) -> &Self {
        self.line.set(line);
        self.column.set(1);
        self
    }

    /// Move the location to `line:column`.
    pub fn at_col(&self, line: u32, column: u32) -> &Self {
        self.line.set(line);
        self.column.set(column);
        self
    }

    pub fn loc(&self) -> SourceLoc {
        SourceLoc::new(self.file, self.line.get(), self.column.get())
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn leaf(&self, kind: NodeKind) -> Node {
        Node::leaf(kind, self.loc())
    }

    fn node(&self, kind: NodeKind, children: Vec<Node>) -> Node {
        Node::new(kind, children, self.loc())
    }

    // Literals and symbols

    pub fn nil(&self) -> Node {
        self.leaf(NodeKind::Literal(Literal::Nil))
    }

    pub fn bool(&self, value: bool) -> Node {
        self.leaf(NodeKind::Literal(Literal::Bool(value)))
    }

    pub fn int(&self, value: i64) -> Node {
        self.leaf(NodeKind::Literal(Literal::Int(value)))
    }

    pub fn real(&self, value: f64) -> Node {
        self.leaf(NodeKind::Literal(Literal::Real(value)))
    }

    pub fn str(&self, value: &str) -> Node {
        self.leaf(NodeKind::Literal(Literal::Str(value.to_owned())))
    }

    pub fn sym(&self, name: &str) -> Node {
        self.leaf(NodeKind::Symbol(self.name(name)))
    }

    pub fn vector(&self, elements: Vec<Node>) -> Node {
        self.node(NodeKind::VectorLit, elements)
    }

    // Bindings

    pub fn let_mut(&self, name: &str, init: Node) -> Node {
        self.decl(name, Mutability::Mutable, init)
    }

    pub fn let_const(&self, name: &str, init: Node) -> Node {
        self.decl(name, Mutability::Immutable, init)
    }

    pub fn decl(&self, name: &str, mutability: Mutability, init: Node) -> Node {
        let kind = NodeKind::VarDecl {
            name: self.name(name),
            mutability,
        };
        self.node(kind, vec![init])
    }

    pub fn assign(&self, name: &str, value: Node) -> Node {
        let kind = NodeKind::Assign {
            name: self.name(name),
        };
        self.node(kind, vec![value])
    }

    // Operators

    pub fn binary(&self, op: BinaryOp, left: Node, right: Node) -> Node {
        self.node(NodeKind::Binary(op), vec![left, right])
    }

    pub fn unary(&self, op: UnaryOp, operand: Node) -> Node {
        self.node(NodeKind::Unary(op), vec![operand])
    }

    // Calls and access

    /// Call a function bound to `callee`.
    pub fn call(&self, callee: &str, args: Vec<Node>) -> Node {
        self.call_value(self.sym(callee), args)
    }

    /// Call an arbitrary callee expression.
    pub fn call_value(&self, callee: Node, args: Vec<Node>) -> Node {
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(callee);
        children.extend(args);
        self.node(NodeKind::Call, children)
    }

    pub fn method_call(&self, receiver: Node, method: &str, args: Vec<Node>) -> Node {
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(receiver);
        children.extend(args);
        self.node(NodeKind::MethodCall(self.name(method)), children)
    }

    pub fn member(&self, object: Node, member: &str) -> Node {
        self.node(NodeKind::Member(self.name(member)), vec![object])
    }

    pub fn index(&self, object: Node, index: Node) -> Node {
        self.node(NodeKind::Index, vec![object, index])
    }

    // Control flow

    pub fn if_(&self, cond: Node, then: Node, otherwise: Option<Node>) -> Node {
        let mut children = vec![cond, then];
        children.extend(otherwise);
        self.node(NodeKind::If, children)
    }

    pub fn while_(&self, cond: Node, body: Node) -> Node {
        self.node(NodeKind::While, vec![cond, body])
    }

    pub fn block(&self, statements: Vec<Node>) -> Node {
        self.node(NodeKind::Block, statements)
    }

    pub fn program(&self, statements: Vec<Node>) -> Node {
        self.node(NodeKind::Program, statements)
    }

    // Definitions

    fn fn_def(&self, name: &str, params: &[&str], variadic: bool, body: Vec<Node>) -> Rc<FnDef> {
        Rc::new(FnDef {
            name: self.name(name),
            params: params.iter().map(|p| self.name(p)).collect(),
            variadic,
            body: self.block(body),
        })
    }

    pub fn func(&self, name: &str, params: &[&str], body: Vec<Node>) -> Node {
        self.leaf(NodeKind::FnDecl(self.fn_def(name, params, false, body)))
    }

    /// A function whose last parameter collects surplus arguments.
    pub fn variadic_func(&self, name: &str, params: &[&str], body: Vec<Node>) -> Node {
        self.leaf(NodeKind::FnDecl(self.fn_def(name, params, true, body)))
    }

    /// A method installed on `type_name`; `self` is prepended to `params`.
    pub fn method(&self, type_name: &str, name: &str, params: &[&str], body: Vec<Node>) -> Node {
        let kind = NodeKind::MethodDecl {
            type_name: self.name(type_name),
            def: self.fn_def(name, params, false, body),
        };
        self.leaf(kind)
    }

    pub fn import(&self, module: &str) -> Node {
        self.leaf(NodeKind::Import(self.name(module)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nodes_carry_current_location() {
        let interner = SharedInterner::new();
        let b = AstBuilder::new(&interner, "main.tn");
        let first = b.int(1);
        let second = b.at_col(4, 9).int(2);
        assert_eq!(first.loc.line, 1);
        assert_eq!((second.loc.line, second.loc.column), (4, 9));
        assert_eq!(interner.lookup(second.loc.file), "main.tn");
    }

    #[test]
    fn test_call_puts_callee_first() {
        let interner = SharedInterner::new();
        let b = AstBuilder::new(&interner, "t");
        let call = b.call("f", vec![b.int(1), b.int(2)]);
        assert_eq!(call.kind, NodeKind::Call);
        assert_eq!(call.children.len(), 3);
        assert_eq!(call.children[0].kind, NodeKind::Symbol(interner.intern("f")));
    }

    #[test]
    fn test_func_wraps_body_in_block() {
        let interner = SharedInterner::new();
        let b = AstBuilder::new(&interner, "t");
        let NodeKind::FnDecl(def) = b.func("id", &["x"], vec![b.sym("x")]).kind else {
            panic!("expected FnDecl");
        };
        assert_eq!(def.params, vec![interner.intern("x")]);
        assert_eq!(def.body.kind, NodeKind::Block);
        assert!(!def.variadic);
    }
}
