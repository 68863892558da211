//! Assignable references
//!
//! Names, property and element accesses, and call results that are used as
//! assignment, increment or delete targets.

use super::Lowerer;
use crate::error::{LowerResult, LoweringDiagnostic};
use crate::ir::{IncDecFlags, IrNode, LogicalOp, NodeKind};
use kiln_syntax::ast::{self, AssignmentOperator, Expression, Pattern, UpdateOperator};
use kiln_syntax::Symbol;

/// Lowered form of an assignment target
pub(super) enum Reference {
    Name(Symbol),
    Prop { object: IrNode, key: IrNode },
    Elem { object: IrNode, index: IrNode },
    /// A call used as a reference (`f() = v`), as a `RefCall` node
    Call(IrNode),
}

impl<'a> Lowerer<'a> {
    /// Expressions `make_reference` accepts
    pub(super) fn is_reference_target(expr: &Expression) -> bool {
        matches!(
            expr.unparenthesized(),
            Expression::Identifier(_) | Expression::Member(_) | Expression::Index(_) | Expression::Call(_)
        )
    }

    /// Lower the parts of `expr` that identify a storage location
    pub(super) fn make_reference(&mut self, expr: &Expression) -> LowerResult<Option<Reference>> {
        let reference = match expr.unparenthesized() {
            Expression::Identifier(id) => {
                self.note_name_use(id.name);
                Reference::Name(id.name)
            }
            Expression::Member(member) => Reference::Prop {
                object: self.lower_expr(&member.object)?,
                key: IrNode::string(self.resolve(member.property.name), member.span.line),
            },
            Expression::Index(index) => Reference::Elem {
                object: self.lower_expr(&index.object)?,
                index: self.lower_expr(&index.index)?,
            },
            Expression::Call(call) => {
                let lowered = self.lower_call(call)?;
                let props = lowered.props().to_vec();
                let mut node = IrNode::with_children(NodeKind::RefCall, lowered.children, call.span.line);
                for (key, value) in props {
                    node.set_prop(key, value);
                }
                Reference::Call(node)
            }
            _ => return Ok(None),
        };
        Ok(Some(reference))
    }

    /// `SetName`/`SetConst` of a plain name
    pub(super) fn bind_name(name: Symbol, value: IrNode, is_const: bool, line: u32) -> IrNode {
        let kind = if is_const {
            NodeKind::SetConst
        } else {
            NodeKind::SetName
        };
        IrNode::binary(kind, IrNode::new(NodeKind::BindName(name), line), value, line)
    }

    /// Plain `target = value`
    pub(super) fn assign_reference(reference: Reference, value: IrNode, line: u32) -> IrNode {
        match reference {
            Reference::Name(name) => Self::bind_name(name, value, false, line),
            Reference::Prop { object, key } => {
                IrNode::with_children(NodeKind::SetProp, vec![object, key, value], line)
            }
            Reference::Elem { object, index } => {
                IrNode::with_children(NodeKind::SetElem, vec![object, index, value], line)
            }
            Reference::Call(call) => IrNode::binary(NodeKind::SetRef, call, value, line),
        }
    }

    /// The current value of a reference
    fn read_reference(reference: Reference, line: u32) -> IrNode {
        match reference {
            Reference::Name(name) => IrNode::name(name, line),
            Reference::Prop { object, key } => IrNode::binary(NodeKind::GetProp, object, key, line),
            Reference::Elem { object, index } => IrNode::binary(NodeKind::GetElem, object, index, line),
            Reference::Call(call) => IrNode::unary(NodeKind::GetRef, call, line),
        }
    }

    /// `target op= value`; for property targets the old value is read from the stack
    fn compound_assign(&self, reference: Reference, op: AssignmentOperator, value: IrNode, line: u32) -> IrNode {
        let combine = |current: IrNode| match op.binary_operator() {
            Some(binary) => self.folder.binary(binary.into(), current, value, line),
            None => value,
        };
        let stack = || IrNode::new(NodeKind::UseStack, line);

        match reference {
            Reference::Name(name) => {
                let updated = combine(IrNode::name(name, line));
                Self::bind_name(name, updated, false, line)
            }
            Reference::Prop { object, key } => {
                IrNode::with_children(NodeKind::SetPropOp, vec![object, key, combine(stack())], line)
            }
            Reference::Elem { object, index } => {
                IrNode::with_children(NodeKind::SetElemOp, vec![object, index, combine(stack())], line)
            }
            Reference::Call(call) => IrNode::binary(NodeKind::SetRefOp, call, combine(stack()), line),
        }
    }

    /// `target &&= value` and friends. The target's operands go into temporaries
    /// so the write can sit behind the short circuit:
    ///
    /// ```text
    /// o.p ??= v  =>  LetExpr $0 [o, Logical Nullish [GetProp [$0, "p"], SetProp [$0, "p", v]]]
    /// ```
    fn logical_assign(&mut self, reference: Reference, op: LogicalOp, value: IrNode, line: u32) -> IrNode {
        let logical = |current: IrNode, write: IrNode| IrNode::binary(NodeKind::Logical(op), current, write, line);
        match reference {
            Reference::Name(name) => logical(IrNode::name(name, line), Self::bind_name(name, value, false, line)),
            Reference::Prop { object, key } => {
                let temp = self.new_temp("$");
                let read = IrNode::binary(NodeKind::GetProp, IrNode::name(temp, line), key.clone(), line);
                let write =
                    IrNode::with_children(NodeKind::SetProp, vec![IrNode::name(temp, line), key, value], line);
                IrNode::binary(NodeKind::LetExpr(temp), object, logical(read, write), line)
            }
            Reference::Elem { object, index } => {
                let object_temp = self.new_temp("$");
                let index_temp = self.new_temp("$");
                let read = IrNode::binary(
                    NodeKind::GetElem,
                    IrNode::name(object_temp, line),
                    IrNode::name(index_temp, line),
                    line,
                );
                let write = IrNode::with_children(
                    NodeKind::SetElem,
                    vec![IrNode::name(object_temp, line), IrNode::name(index_temp, line), value],
                    line,
                );
                let inner = IrNode::binary(NodeKind::LetExpr(index_temp), index, logical(read, write), line);
                IrNode::binary(NodeKind::LetExpr(object_temp), object, inner, line)
            }
            Reference::Call(call) => {
                let temp = self.new_temp("$");
                let read = IrNode::unary(NodeKind::GetRef, IrNode::name(temp, line), line);
                let write = IrNode::binary(NodeKind::SetRef, IrNode::name(temp, line), value, line);
                IrNode::binary(NodeKind::LetExpr(temp), call, logical(read, write), line)
            }
        }
    }

    pub(super) fn lower_assignment(&mut self, assign: &ast::AssignmentExpression) -> LowerResult<IrNode> {
        let line = assign.span.line;

        if assign.target.is_destructuring() {
            let value = self.lower_expr(&assign.value)?;
            if assign.operator != AssignmentOperator::Assign {
                self.report(LoweringDiagnostic::BadDestructOp { span: assign.span });
                return Ok(value);
            }
            return self.destructure(&assign.target, value, false, line);
        }

        let reference = match &assign.target {
            Pattern::Identifier(id) => {
                self.note_name_use(id.name);
                Some(Reference::Name(id.name))
            }
            Pattern::Expression(expr) => self.make_reference(expr)?,
            Pattern::Array(_) | Pattern::Object(_) => None,
        };
        let Some(reference) = reference else {
            self.report(LoweringDiagnostic::BadAssignLeft {
                span: *assign.target.span(),
            });
            return self.lower_expr(&assign.value);
        };

        let value = self.lower_expr(&assign.value)?;
        Ok(match assign.operator {
            AssignmentOperator::Assign => Self::assign_reference(reference, value, line),
            op => match op.logical_operator() {
                Some(logical) => self.logical_assign(reference, logical.into(), value, line),
                None => self.compound_assign(reference, op, value, line),
            },
        })
    }

    pub(super) fn lower_update(&mut self, update: &ast::UpdateExpression) -> LowerResult<IrNode> {
        let line = update.span.line;
        let flags = IncDecFlags {
            decrement: update.operator == UpdateOperator::Decrement,
            postfix: !update.prefix,
        };
        match self.make_reference(&update.argument)? {
            Some(reference) => Ok(IrNode::unary(
                NodeKind::IncDec(flags),
                Self::read_reference(reference, line),
                line,
            )),
            None => {
                self.report(LoweringDiagnostic::BadIncDec { span: update.span });
                self.lower_expr(&update.argument)
            }
        }
    }

    pub(super) fn lower_delete(&mut self, operand: &Expression, line: u32) -> LowerResult<IrNode> {
        let node = match operand.unparenthesized() {
            Expression::Identifier(id) => IrNode::binary(
                NodeKind::DelProp,
                IrNode::new(NodeKind::BindName(id.name), line),
                IrNode::string(self.resolve(id.name), line),
                line,
            ),
            Expression::Member(member) => {
                let object = self.lower_expr(&member.object)?;
                let key = IrNode::string(self.resolve(member.property.name), line);
                IrNode::binary(NodeKind::DelProp, object, key, line)
            }
            Expression::Index(index) => {
                let object = self.lower_expr(&index.object)?;
                let key = self.lower_expr(&index.index)?;
                IrNode::binary(NodeKind::DelProp, object, key, line)
            }
            Expression::Call(_) => match self.make_reference(operand)? {
                Some(Reference::Call(call)) => IrNode::unary(NodeKind::DelRef, call, line),
                Some(other) => Self::read_reference(other, line),
                None => IrNode::new(NodeKind::True, line),
            },
            // Deleting a non-reference evaluates it and yields true
            other => {
                let value = self.lower_expr(other)?;
                IrNode::binary(NodeKind::DelProp, IrNode::new(NodeKind::True, line), value, line)
            }
        };
        Ok(node)
    }
}
