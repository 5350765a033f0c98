//! Syntax tree handed from the parser to the evaluator.
//!
//! Every node carries a kind, an ordered child list and a source location.
//! Literal and symbol leaves carry their literal or symbol name in the kind;
//! the meaning of each child position is documented on the `NodeKind` variant.

use std::rc::Rc;

use crate::{Name, SourceLoc};

/// Whether a binding can be reassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// `mut x = ...`
    Mutable,
    /// `const x = ...`
    Immutable,
}

impl Mutability {
    /// Returns `true` if this is `Mutable`.
    #[inline]
    pub fn is_mutable(self) -> bool {
        matches!(self, Mutability::Mutable)
    }
}

/// Literal leaf payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
}

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Name of the method this operator dispatches to on its left operand.
    ///
    /// Logical operators never dispatch and return `None`.
    pub const fn method_name(self) -> Option<&'static str> {
        match self {
            Self::Add => Some("add"),
            Self::Sub => Some("sub"),
            Self::Mul => Some("mul"),
            Self::Div => Some("div"),
            Self::Mod => Some("mod"),
            Self::Pow => Some("pow"),
            Self::Eq => Some("eq"),
            Self::NotEq => Some("ne"),
            Self::Lt => Some("lt"),
            Self::LtEq => Some("le"),
            Self::Gt => Some("gt"),
            Self::GtEq => Some("ge"),
            Self::And | Self::Or => None,
        }
    }

    #[inline]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "not",
        }
    }

    pub const fn method_name(self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Not => "not",
        }
    }
}

/// A function definition: shared between the tree and every function value
/// created from it.
#[derive(Debug, PartialEq)]
pub struct FnDef {
    pub name: Name,
    pub params: Vec<Name>,
    /// Surplus arguments are collected into a vector bound to the last parameter.
    pub variadic: bool,
    pub body: Node,
}

/// Node kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Top-level statement list. Children: statements. Runs in the current scope.
    Program,
    /// Scoped statement list. Children: statements.
    Block,
    /// Literal leaf.
    Literal(Literal),
    /// Symbol reference leaf.
    Symbol(Name),
    /// Vector literal. Children: elements.
    VectorLit,
    /// `mut name = init` / `const name = init`. Children: `[init]`.
    VarDecl { name: Name, mutability: Mutability },
    /// `name = value`. Children: `[value]`.
    Assign { name: Name },
    /// Children: `[left, right]`.
    Binary(BinaryOp),
    /// Children: `[operand]`.
    Unary(UnaryOp),
    /// Children: `[callee, args...]`.
    Call,
    /// `receiver.name(args...)`. Children: `[receiver, args...]`.
    MethodCall(Name),
    /// `object.name`. Children: `[object]`.
    Member(Name),
    /// `object[index]`. Children: `[object, index]`.
    Index,
    /// Children: `[cond, then]` or `[cond, then, else]`.
    If,
    /// Children: `[cond, body]`.
    While,
    /// `fn name(params) body`. No children; the body lives in the definition.
    FnDecl(Rc<FnDef>),
    /// `fn TypeName.name(params) body`; installs a method, `self` is implicit.
    MethodDecl { type_name: Name, def: Rc<FnDef> },
    /// `import name`.
    Import(Name),
}

/// A syntax tree node.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Node>,
    pub loc: SourceLoc,
}

impl Node {
    #[inline]
    pub fn new(kind: NodeKind, children: Vec<Node>, loc: SourceLoc) -> Self {
        Node {
            kind,
            children,
            loc,
        }
    }

    #[inline]
    pub fn leaf(kind: NodeKind, loc: SourceLoc) -> Self {
        Node::new(kind, Vec::new(), loc)
    }

    /// Child at `index`, if present.
    #[inline]
    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_method_names() {
        assert_eq!(BinaryOp::Add.method_name(), Some("add"));
        assert_eq!(BinaryOp::LtEq.method_name(), Some("le"));
        assert_eq!(BinaryOp::And.method_name(), None);
    }

    #[test]
    fn test_comparison_classification() {
        assert!(BinaryOp::GtEq.is_comparison());
        assert!(!BinaryOp::Pow.is_comparison());
    }

    #[test]
    fn test_node_child_access() {
        let leaf = Node::leaf(NodeKind::Literal(Literal::Int(1)), SourceLoc::DUMMY);
        let node = Node::new(NodeKind::Block, vec![leaf.clone()], SourceLoc::DUMMY);
        assert_eq!(node.child(0), Some(&leaf));
        assert_eq!(node.child(1), None);
    }
}
