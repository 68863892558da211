//! Per-function lowering state
//!
//! One `FunctionContext` is live at a time. Entering a nested function swaps
//! a fresh context in; leaving it restores the parent.

use super::control_flow::JumpStack;
use crate::ir::{FunctionId, LocalId, ScopeKind, ScopeTable, TargetId, Unwind};
use kiln_syntax::Symbol;

#[derive(Debug)]
pub(super) struct FunctionContext {
    pub id: FunctionId,
    pub is_script: bool,
    pub strict: bool,
    /// Function-level `var`, parameter, function and temporary names
    pub symbols: ScopeTable,
    /// Block scopes, outermost first; index 0 is the function body scope
    pub scopes: Vec<ScopeTable>,
    pub jumps: JumpStack,
    /// Cleanup frames between the current point and the function boundary
    pub unwinds: Vec<Unwind>,
    /// Labels that the next loop statement can be continued by
    pub pending_labels: Vec<Symbol>,
    pub requires_activation: bool,
    pub nested: Vec<FunctionId>,
    next_target: u32,
    next_local: u32,
}

impl FunctionContext {
    pub fn new(id: FunctionId, is_script: bool, strict: bool) -> Self {
        Self {
            id,
            is_script,
            strict,
            symbols: ScopeTable::new(ScopeKind::Function),
            scopes: Vec::new(),
            jumps: JumpStack::new(),
            unwinds: Vec::new(),
            pending_labels: Vec::new(),
            requires_activation: false,
            nested: Vec::new(),
            next_target: 0,
            next_local: 0,
        }
    }

    pub fn new_target(&mut self) -> TargetId {
        let id = TargetId(self.next_target);
        self.next_target += 1;
        id
    }

    pub fn new_local(&mut self) -> LocalId {
        let id = LocalId(self.next_local);
        self.next_local += 1;
        id
    }

    pub fn target_count(&self) -> u32 {
        self.next_target
    }

    pub fn local_count(&self) -> u32 {
        self.next_local
    }

    pub fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(ScopeTable::new(kind));
    }

    pub fn pop_scope(&mut self) -> Option<ScopeTable> {
        self.scopes.pop()
    }

    /// Unwind frames to run when jumping out to a construct entered at `depth`,
    /// innermost first
    pub fn unwinds_from(&self, depth: usize) -> Vec<Unwind> {
        self.unwinds.get(depth..).unwrap_or_default().iter().rev().copied().collect()
    }

    /// `name` is bound by the function table or any open block scope
    pub fn is_declared(&self, name: Symbol) -> bool {
        self.symbols.contains(name) || self.scopes.iter().any(|s| s.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_per_context() {
        let mut ctx = FunctionContext::new(FunctionId(0), true, false);
        assert_eq!(ctx.new_target(), TargetId(0));
        assert_eq!(ctx.new_target(), TargetId(1));
        assert_eq!(ctx.new_local(), LocalId(0));
        assert_eq!(ctx.target_count(), 2);
        assert_eq!(ctx.local_count(), 1);

        let mut other = FunctionContext::new(FunctionId(1), false, false);
        assert_eq!(other.new_target(), TargetId(0));
    }

    #[test]
    fn test_unwinds_innermost_first() {
        let mut ctx = FunctionContext::new(FunctionId(0), false, false);
        ctx.unwinds.push(Unwind::Finally(TargetId(4)));
        ctx.unwinds.push(Unwind::Scope);

        assert_eq!(ctx.unwinds_from(0), vec![Unwind::Scope, Unwind::Finally(TargetId(4))]);
        assert_eq!(ctx.unwinds_from(1), vec![Unwind::Scope]);
        assert!(ctx.unwinds_from(2).is_empty());
        assert!(ctx.unwinds_from(7).is_empty());
    }
}
