//! Structural IR validation
//!
//! Checks that every target referenced by a jump or a structural node is
//! placed exactly once in the same function body, and that local slots are
//! only used inside the `LocalBlock` that owns them.

use super::node::{IrNode, LocalId, NodeKind, TargetId, Unwind};
use crate::error::ValidateError;
use rustc_hash::FxHashSet;

pub(crate) fn validate_body(body: &IrNode) -> Result<(), ValidateError> {
    let mut validator = Validator::default();
    validator.visit(body)?;
    for &target in &validator.referenced {
        if !validator.placed.contains(&target) {
            return Err(ValidateError::DanglingTarget { target });
        }
    }
    Ok(())
}

#[derive(Default)]
struct Validator {
    placed: FxHashSet<TargetId>,
    referenced: Vec<TargetId>,
    locals: Vec<LocalId>,
}

impl Validator {
    fn visit(&mut self, node: &IrNode) -> Result<(), ValidateError> {
        match &node.kind {
            NodeKind::Target(id) => {
                if !self.placed.insert(*id) {
                    return Err(ValidateError::DuplicateTarget { target: *id });
                }
            }
            NodeKind::Jump {
                target, unwinds, ..
            } => {
                self.referenced.push(*target);
                self.reference_unwinds(unwinds);
            }
            NodeKind::Return { unwinds } => self.reference_unwinds(unwinds),
            NodeKind::Switch {
                break_target,
                default,
            } => {
                self.referenced.push(*break_target);
                self.referenced.extend(default.iter().copied());
            }
            NodeKind::Case(target) => self.referenced.push(*target),
            NodeKind::Loop {
                break_target,
                continue_target,
            } => {
                self.referenced.push(*break_target);
                self.referenced.push(*continue_target);
            }
            NodeKind::Label { break_target, .. } => self.referenced.push(*break_target),
            NodeKind::Try {
                catch_target,
                finally_target,
                handler,
            } => {
                self.referenced.push(*catch_target);
                self.referenced.extend(finally_target.iter().copied());
                self.check_local(*handler)?;
            }
            NodeKind::Rethrow(local)
            | NodeKind::UseLocal(local)
            | NodeKind::EnumNext(local)
            | NodeKind::EnumId(local)
            | NodeKind::EnumInit { local, .. }
            | NodeKind::CatchScope { local, .. } => self.check_local(*local)?,
            NodeKind::LocalBlock(local) => {
                self.locals.push(*local);
                for child in &node.children {
                    self.visit(child)?;
                }
                self.locals.pop();
                return Ok(());
            }
            _ => {}
        }

        for child in &node.children {
            self.visit(child)?;
        }
        Ok(())
    }

    fn reference_unwinds(&mut self, unwinds: &[Unwind]) {
        for unwind in unwinds {
            if let Unwind::Finally(target) = unwind {
                self.referenced.push(*target);
            }
        }
    }

    fn check_local(&self, local: LocalId) -> Result<(), ValidateError> {
        if self.locals.contains(&local) {
            Ok(())
        } else {
            Err(ValidateError::LocalOutOfScope { local })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::JumpKind;

    #[test]
    fn test_duplicate_target() {
        let body = IrNode::block(
            vec![IrNode::target(TargetId(0), 1), IrNode::target(TargetId(0), 2)],
            1,
        );
        assert_eq!(
            validate_body(&body),
            Err(ValidateError::DuplicateTarget { target: TargetId(0) })
        );
    }

    #[test]
    fn test_backward_and_forward_jumps() {
        let body = IrNode::block(
            vec![
                IrNode::goto(TargetId(1), 1),
                IrNode::target(TargetId(0), 1),
                IrNode::target(TargetId(1), 1),
                IrNode::branch(JumpKind::IfTrue, IrNode::new(NodeKind::True, 1), TargetId(0), 1),
            ],
            1,
        );
        assert!(validate_body(&body).is_ok());
    }

    #[test]
    fn test_finally_unwind_must_be_placed() {
        let body = IrNode::block(
            vec![IrNode::new(
                NodeKind::Return {
                    unwinds: vec![Unwind::Scope, Unwind::Finally(TargetId(9))],
                },
                1,
            )],
            1,
        );
        assert_eq!(
            validate_body(&body),
            Err(ValidateError::DanglingTarget { target: TargetId(9) })
        );
    }

    #[test]
    fn test_local_outside_block() {
        let inner = IrNode::new(NodeKind::UseLocal(LocalId(0)), 1);
        let ok = IrNode::with_children(NodeKind::LocalBlock(LocalId(0)), vec![inner.clone()], 1);
        assert!(validate_body(&ok).is_ok());

        let bad = IrNode::block(vec![ok, inner], 1);
        assert_eq!(
            validate_body(&bad),
            Err(ValidateError::LocalOutOfScope { local: LocalId(0) })
        );
    }
}
