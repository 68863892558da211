//! Control Flow Lowering Utilities
//!
//! Tracks the constructs that `break` and `continue` can leave: loops,
//! switches and labeled statements, innermost last.

use crate::ir::TargetId;
use kiln_syntax::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakableKind {
    Loop,
    Switch,
    Label,
}

/// One construct that `break`/`continue` may target
#[derive(Debug, Clone)]
pub struct JumpContext {
    pub kind: BreakableKind,
    /// Where `break` lands
    pub break_target: TargetId,
    /// Where `continue` lands (loops only)
    pub continue_target: Option<TargetId>,
    /// Labels of a labeled statement, or the labels a loop can be continued by
    pub labels: Vec<Symbol>,
    /// Number of unwind frames active when the construct was entered
    pub unwind_depth: usize,
}

impl JumpContext {
    pub fn for_loop(break_target: TargetId, continue_target: TargetId, labels: Vec<Symbol>, unwind_depth: usize) -> Self {
        Self {
            kind: BreakableKind::Loop,
            break_target,
            continue_target: Some(continue_target),
            labels,
            unwind_depth,
        }
    }

    pub fn for_switch(break_target: TargetId, unwind_depth: usize) -> Self {
        Self {
            kind: BreakableKind::Switch,
            break_target,
            continue_target: None,
            labels: Vec::new(),
            unwind_depth,
        }
    }

    pub fn for_label(break_target: TargetId, labels: Vec<Symbol>, unwind_depth: usize) -> Self {
        Self {
            kind: BreakableKind::Label,
            break_target,
            continue_target: None,
            labels,
            unwind_depth,
        }
    }
}

/// Why a `break`/`continue` has no destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpLookupError {
    /// Unlabeled jump with no enclosing construct
    NoTarget,
    /// No enclosing statement carries the label
    UndefinedLabel,
    /// `continue L` where `L` is not on a loop
    NotALoop,
}

/// Stack of active jump contexts
#[derive(Debug, Default)]
pub struct JumpStack {
    stack: Vec<JumpContext>,
}

impl JumpStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ctx: JumpContext) {
        self.stack.push(ctx);
    }

    pub fn pop(&mut self) -> Option<JumpContext> {
        self.stack.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Destination of `break` or `break label`
    pub fn break_context(&self, label: Option<Symbol>) -> Result<&JumpContext, JumpLookupError> {
        match label {
            None => self
                .stack
                .iter()
                .rev()
                .find(|ctx| ctx.kind != BreakableKind::Label)
                .ok_or(JumpLookupError::NoTarget),
            Some(l) => self
                .stack
                .iter()
                .rev()
                .find(|ctx| ctx.kind == BreakableKind::Label && ctx.labels.contains(&l))
                .ok_or(JumpLookupError::UndefinedLabel),
        }
    }

    /// Destination of `continue` or `continue label`
    pub fn continue_context(&self, label: Option<Symbol>) -> Result<&JumpContext, JumpLookupError> {
        match label {
            None => self
                .stack
                .iter()
                .rev()
                .find(|ctx| ctx.kind == BreakableKind::Loop)
                .ok_or(JumpLookupError::NoTarget),
            Some(l) => {
                if let Some(ctx) = self
                    .stack
                    .iter()
                    .rev()
                    .find(|ctx| ctx.kind == BreakableKind::Loop && ctx.labels.contains(&l))
                {
                    return Ok(ctx);
                }
                if self.stack.iter().any(|ctx| ctx.labels.contains(&l)) {
                    Err(JumpLookupError::NotALoop)
                } else {
                    Err(JumpLookupError::UndefinedLabel)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_syntax::Interner;

    #[test]
    fn test_unlabeled_break_skips_labels() {
        let mut interner = Interner::new();
        let outer = interner.intern("outer");

        let mut stack = JumpStack::new();
        assert_eq!(stack.break_context(None).err(), Some(JumpLookupError::NoTarget));

        stack.push(JumpContext::for_loop(TargetId(1), TargetId(2), vec![], 0));
        stack.push(JumpContext::for_label(TargetId(3), vec![outer], 0));
        assert_eq!(stack.break_context(None).map(|c| c.break_target), Ok(TargetId(1)));
        assert_eq!(stack.break_context(Some(outer)).map(|c| c.break_target), Ok(TargetId(3)));
    }

    #[test]
    fn test_switch_is_not_continuable() {
        let mut stack = JumpStack::new();
        stack.push(JumpContext::for_loop(TargetId(0), TargetId(1), vec![], 0));
        stack.push(JumpContext::for_switch(TargetId(2), 0));
        assert_eq!(stack.break_context(None).map(|c| c.break_target), Ok(TargetId(2)));
        assert_eq!(stack.continue_context(None).map(|c| c.break_target), Ok(TargetId(0)));
    }

    #[test]
    fn test_labeled_continue() {
        let mut interner = Interner::new();
        let l = interner.intern("l");
        let block = interner.intern("block");
        let missing = interner.intern("missing");

        let mut stack = JumpStack::new();
        stack.push(JumpContext::for_label(TargetId(0), vec![block], 0));
        stack.push(JumpContext::for_label(TargetId(1), vec![l], 0));
        stack.push(JumpContext::for_loop(TargetId(2), TargetId(3), vec![l], 0));

        assert_eq!(stack.continue_context(Some(l)).map(|c| c.continue_target), Ok(Some(TargetId(3))));
        assert_eq!(stack.continue_context(Some(block)).err(), Some(JumpLookupError::NotALoop));
        assert_eq!(stack.continue_context(Some(missing)).err(), Some(JumpLookupError::UndefinedLabel));
    }
}
