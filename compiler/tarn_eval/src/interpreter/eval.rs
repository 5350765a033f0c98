//! Node evaluation.
//!
//! `eval` is the node boundary: a fault raised while evaluating a node is
//! reported there with the node's location and the node evaluates to `nil`.
//! `eval_node` is the fallible inner step each node kind implements.

use std::rc::Rc;

use smallvec::SmallVec;
use tarn_ir::{BinaryOp, FnDef, Literal, Mutability, Name, Node, NodeKind, SourceLoc, UnaryOp};

use super::{ensure_sufficient_stack, Interpreter};
use crate::diagnostics::FaultKind;
use crate::errors::{AssignError, RuntimeError};
use crate::operators::{evaluate_neg, evaluate_numeric, Number, Outcome};
use crate::types::TypeId;
use crate::value::{Callable, EvalResult, Payload, UserFunction, ValueRef};

/// Evaluated call arguments; most calls take a handful.
pub(crate) type Args = SmallVec<[ValueRef; 4]>;

impl Interpreter {
    /// Evaluate `node`, reporting any fault it raises and yielding `nil` for it.
    pub fn eval(&mut self, node: &Node) -> ValueRef {
        ensure_sufficient_stack(|| match self.eval_node(node) {
            Ok(value) => value,
            Err(kind) => {
                self.report(kind, node.loc);
                ValueRef::Nil
            }
        })
    }

    fn eval_node(&mut self, node: &Node) -> EvalResult {
        match &node.kind {
            NodeKind::Program => Ok(self.eval_statements(&node.children)),
            NodeKind::Block => Ok(self.with_env_scope(|s| s.eval_statements(&node.children))),
            NodeKind::Literal(lit) => Ok(self.eval_literal(lit)),
            NodeKind::Symbol(name) => self.eval_symbol(*name),
            NodeKind::VectorLit => Ok(self.eval_vector(&node.children)),
            NodeKind::VarDecl { name, mutability } => {
                self.eval_decl(*name, *mutability, child(node, 0)?, node.loc)
            }
            NodeKind::Assign { name } => self.eval_assign(*name, child(node, 0)?),
            NodeKind::Binary(op) => self.eval_binary(*op, child(node, 0)?, child(node, 1)?, node.loc),
            NodeKind::Unary(op) => self.eval_unary(*op, child(node, 0)?, node.loc),
            NodeKind::Call => self.eval_call(node),
            NodeKind::MethodCall(method) => self.eval_method_call(*method, node),
            NodeKind::Member(member) => self.eval_member(child(node, 0)?, *member),
            NodeKind::Index => self.eval_index(child(node, 0)?, child(node, 1)?, node.loc),
            NodeKind::If => self.eval_if(node),
            NodeKind::While => self.eval_while(child(node, 0)?, child(node, 1)?),
            NodeKind::FnDecl(def) => self.eval_fn_decl(def, node.loc),
            NodeKind::MethodDecl { type_name, def } => {
                self.eval_method_decl(*type_name, def, node.loc)
            }
            NodeKind::Import(module) => self.eval_import(*module, node.loc),
        }
    }

    /// Evaluate statements in the current scope; the last value is the result.
    pub(crate) fn eval_statements(&mut self, statements: &[Node]) -> ValueRef {
        let mut last = ValueRef::Nil;
        for statement in statements {
            last = self.eval(statement);
        }
        last
    }

    fn eval_literal(&mut self, lit: &Literal) -> ValueRef {
        match lit {
            Literal::Nil => ValueRef::Nil,
            Literal::Bool(b) => ValueRef::bool(*b),
            Literal::Int(i) => self.alloc_int(*i),
            Literal::Real(r) => self.alloc_real(*r),
            Literal::Str(s) => self.alloc_str(s.as_str()),
        }
    }

    fn eval_symbol(&mut self, name: Name) -> EvalResult {
        self.env
            .find_nearest(name)
            .map(|entry| entry.value)
            .ok_or_else(|| FaultKind::UndefinedSymbol {
                name: self.interner().lookup(name).to_owned(),
            })
    }

    fn eval_vector(&mut self, elements: &[Node]) -> ValueRef {
        self.with_temp_roots(|this| {
            let items: Vec<ValueRef> = elements
                .iter()
                .map(|element| {
                    let v = this.eval(element);
                    this.root(v)
                })
                .collect();
            this.alloc_payload(TypeId::VECTOR, Payload::Vector(items))
        })
    }

    fn eval_decl(
        &mut self,
        name: Name,
        mutability: Mutability,
        init: &Node,
        loc: SourceLoc,
    ) -> EvalResult {
        let value = self.eval(init);
        self.bind(name, value, mutability, loc)?;
        Ok(value)
    }

    /// Bind in the current scope; a duplicate in the same scope is a fault.
    pub(super) fn bind(
        &mut self,
        name: Name,
        value: ValueRef,
        mutability: Mutability,
        loc: SourceLoc,
    ) -> Result<(), FaultKind> {
        self.env
            .insert(name, value, mutability, loc)
            .map_err(|_| FaultKind::AlreadyDefined {
                name: self.interner().lookup(name).to_owned(),
            })
    }

    fn eval_assign(&mut self, name: Name, value: &Node) -> EvalResult {
        // Refuse before evaluating so a rejected assignment has no effects.
        self.env
            .check_assign(name)
            .map_err(|e| self.assign_fault(e, name))?;
        let value = self.eval(value);
        self.env
            .assign(name, value)
            .map_err(|e| self.assign_fault(e, name))?;
        Ok(value)
    }

    fn assign_fault(&self, err: AssignError, name: Name) -> FaultKind {
        let name = self.interner().lookup(name).to_owned();
        match err {
            AssignError::Immutable => FaultKind::ImmutableBinding { name },
            AssignError::Undefined => FaultKind::UndefinedSymbol { name },
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Node, right: &Node, loc: SourceLoc) -> EvalResult {
        match op {
            BinaryOp::And => return self.eval_logical(op, left, right, false),
            BinaryOp::Or => return self.eval_logical(op, left, right, true),
            _ => {}
        }
        self.with_temp_roots(|this| {
            let l = this.eval(left);
            this.root(l);
            let r = this.eval(right);
            this.root(r);
            this.binary_op(op, l, r, loc)
        })
    }

    /// Apply `op` to evaluated operands: numeric fast path when both are
    /// numbers, otherwise dispatch on the left operand's type.
    pub(crate) fn binary_op(
        &mut self,
        op: BinaryOp,
        l: ValueRef,
        r: ValueRef,
        loc: SourceLoc,
    ) -> EvalResult {
        if let (Some(a), Some(b)) = (Number::of(self.value(l)), Number::of(self.value(r))) {
            let outcome = evaluate_numeric(op, a, b)?;
            return Ok(self.alloc_outcome(outcome));
        }
        let Some(method) = self.names.binary(op) else {
            return Err(FaultKind::InvalidOperand {
                op: op.as_symbol(),
                ty: self.type_name(l).to_owned(),
            });
        };
        self.call_method(l, method, &[r], loc)
    }

    /// `and` / `or`: strict booleans, right side evaluated only if needed.
    fn eval_logical(
        &mut self,
        op: BinaryOp,
        left: &Node,
        right: &Node,
        short_circuit_on: bool,
    ) -> EvalResult {
        let l = self.eval(left);
        let l = self.expect_bool(op, l)?;
        if l == short_circuit_on {
            return Ok(ValueRef::bool(l));
        }
        let r = self.eval(right);
        self.expect_bool(op, r).map(ValueRef::bool)
    }

    fn expect_bool(&self, op: BinaryOp, v: ValueRef) -> Result<bool, FaultKind> {
        v.as_bool().ok_or_else(|| FaultKind::InvalidOperand {
            op: op.as_symbol(),
            ty: self.type_name(v).to_owned(),
        })
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Node, loc: SourceLoc) -> EvalResult {
        self.with_temp_roots(|this| {
            let v = this.eval(operand);
            this.root(v);
            if op == UnaryOp::Neg {
                if let Some(n) = Number::of(this.value(v)) {
                    let outcome = evaluate_neg(n)?;
                    return Ok(this.alloc_outcome(outcome));
                }
            }
            let method = this.names.unary(op);
            this.call_method(v, method, &[], loc)
        })
    }

    /// Evaluate and root every node in `nodes`.
    fn eval_args(&mut self, nodes: &[Node]) -> Args {
        nodes
            .iter()
            .map(|node| {
                let v = self.eval(node);
                self.root(v)
            })
            .collect()
    }

    fn eval_call(&mut self, node: &Node) -> EvalResult {
        let callee = child(node, 0)?;
        self.with_temp_roots(|this| {
            let f = this.eval(callee);
            this.root(f);
            let args = this.eval_args(&node.children[1..]);
            this.call_value(f, &args, node.loc)
        })
    }

    /// `recv.method(args)`. On a module, `name.member(args)` calls the member.
    fn eval_method_call(&mut self, method: Name, node: &Node) -> EvalResult {
        let receiver = child(node, 0)?;
        self.with_temp_roots(|this| {
            let recv = this.eval(receiver);
            this.root(recv);
            let args = this.eval_args(&node.children[1..]);
            if let Payload::Module(module) = this.value(recv).payload {
                let member = this.module_member(module, method)?;
                return this.call_value(member, &args, node.loc);
            }
            this.call_method(recv, method, &args, node.loc)
        })
    }

    fn module_member(&self, module: Name, member: Name) -> EvalResult {
        let Some(table) = self.modules.get(module) else {
            return Err(FaultKind::UnknownModule {
                name: self.interner().lookup(module).to_owned(),
            });
        };
        table.get(member).ok_or_else(|| FaultKind::UnknownMember {
            owner: format!("<module {}>", self.interner().lookup(module)),
            member: self.interner().lookup(member).to_owned(),
        })
    }

    fn eval_member(&mut self, object: &Node, member: Name) -> EvalResult {
        let obj = self.eval(object);
        let value = self.value(obj);
        let found = match &value.payload {
            Payload::Module(module) => return self.module_member(*module, member),
            Payload::Instance(fields) => self
                .types
                .lookup_member(value.ty, member)
                .and_then(|(position, _)| fields.get(position).copied()),
            _ => None,
        };
        found.ok_or_else(|| FaultKind::UnknownMember {
            owner: self.render_default(obj),
            member: self.interner().lookup(member).to_owned(),
        })
    }

    fn eval_index(&mut self, object: &Node, index: &Node, loc: SourceLoc) -> EvalResult {
        self.with_temp_roots(|this| {
            let obj = this.eval(object);
            this.root(obj);
            let idx = this.eval(index);
            this.root(idx);
            this.index_value(obj, idx, loc)
        })
    }

    /// `obj[idx]`: Vector and String fast paths, `index` dispatch otherwise.
    pub(crate) fn index_value(&mut self, obj: ValueRef, idx: ValueRef, loc: SourceLoc) -> EvalResult {
        let Some(i) = self.value(idx).as_int() else {
            let method = self.names.index;
            return self.call_method(obj, method, &[idx], loc);
        };
        match &self.value(obj).payload {
            Payload::Vector(items) => {
                let len = items.len();
                position(i, len)
                    .and_then(|p| items.get(p).copied())
                    .ok_or(FaultKind::IndexOutOfBounds { index: i, len })
            }
            Payload::Str(s) => {
                let len = s.chars().count();
                let ch = position(i, len)
                    .and_then(|p| s.chars().nth(p))
                    .ok_or(FaultKind::IndexOutOfBounds { index: i, len })?;
                Ok(self.alloc_str(ch))
            }
            _ => {
                let method = self.names.index;
                self.call_method(obj, method, &[idx], loc)
            }
        }
    }

    fn eval_if(&mut self, node: &Node) -> EvalResult {
        let cond = child(node, 0)?;
        let then = child(node, 1)?;
        let otherwise = node.child(2);
        Ok(self.with_env_scope(|s| {
            if s.eval(cond).is_truthy() {
                s.eval(then)
            } else if let Some(otherwise) = otherwise {
                s.eval(otherwise)
            } else {
                ValueRef::Nil
            }
        }))
    }

    fn eval_while(&mut self, cond: &Node, body: &Node) -> EvalResult {
        loop {
            let keep_going = self.with_env_scope(|s| {
                if !s.eval(cond).is_truthy() {
                    return false;
                }
                s.eval(body);
                true
            });
            if !keep_going {
                return Ok(ValueRef::Nil);
            }
        }
    }

    fn eval_fn_decl(&mut self, def: &Rc<FnDef>, loc: SourceLoc) -> EvalResult {
        let function = UserFunction {
            def: Rc::clone(def),
            scope: self.env.current(),
            receiver: None,
        };
        let value = self.alloc_payload(TypeId::FUNCTION, Payload::Function(Rc::new(function)));
        self.bind(def.name, value, Mutability::Immutable, loc)?;
        Ok(value)
    }

    fn eval_method_decl(&mut self, type_name: Name, def: &Rc<FnDef>, loc: SourceLoc) -> EvalResult {
        let ty = self.types.find(type_name).ok_or_else(|| FaultKind::UnknownType {
            name: self.interner().lookup(type_name).to_owned(),
        })?;
        let method = UserFunction {
            def: Rc::clone(def),
            scope: self.env.current(),
            receiver: Some(self.names.self_),
        };
        self.types
            .insert_method(ty, Callable::User(Rc::new(method)), loc)
            .map_err(|_: RuntimeError| FaultKind::UnknownType {
                name: self.interner().lookup(type_name).to_owned(),
            })?;
        Ok(ValueRef::Nil)
    }

    fn eval_import(&mut self, module: Name, loc: SourceLoc) -> EvalResult {
        if !self.modules.contains(module) {
            return Err(FaultKind::UnknownModule {
                name: self.interner().lookup(module).to_owned(),
            });
        }
        let value = self.alloc_payload(TypeId::MODULE, Payload::Module(module));
        self.bind(module, value, Mutability::Immutable, loc)?;
        Ok(value)
    }

    pub(crate) fn alloc_outcome(&mut self, outcome: Outcome) -> ValueRef {
        match outcome {
            Outcome::Bool(b) => ValueRef::bool(b),
            Outcome::Int(i) => self.alloc_int(i),
            Outcome::Real(r) => self.alloc_real(r),
        }
    }
}

/// Child `index` of `node`. Trees come from a validated parse, so a missing
/// child means a malformed tree; report it rather than panic.
fn child(node: &Node, index: usize) -> Result<&Node, FaultKind> {
    node.child(index).ok_or_else(|| FaultKind::InvalidOperand {
        op: "<node>",
        ty: format!("{:?}", node.kind),
    })
}

/// Zero-based position for `index` into a sequence of `len`, if in bounds.
fn position(index: i64, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&p| p < len)
}
