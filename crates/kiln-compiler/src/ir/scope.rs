//! Scope tables
//!
//! Every `Scope` node and every function owns a table mapping declared names
//! to symbol descriptors. Insertion order is preserved so that dumps and
//! downstream slot assignment are deterministic.

use kiln_syntax::{Span, Symbol};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Function-level `var`/parameter/function table
    Function,
    /// `{ ... }` block or switch body
    Block,
    /// Loop head (`for (let ...)`, for-in/for-of declarations)
    Loop,
    /// Catch clause binding
    Catch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Var,
    Let,
    Const,
    Function,
    Param,
    CatchParam,
    /// Synthetic temporary introduced by lowering
    Temp,
}

impl SymbolKind {
    /// `let`, `const` and catch bindings cannot be redeclared in their scope
    pub fn is_lexical(self) -> bool {
        matches!(self, SymbolKind::Let | SymbolKind::Const | SymbolKind::CatchParam)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDescriptor {
    pub name: Symbol,
    pub kind: SymbolKind,
    /// An enclosing scope of the same function declares the same name
    pub shadowed: bool,
    pub span: Span,
}

/// Result of declaring a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declared {
    Added,
    /// The name was already declared in this table with the given kind
    Existing(SymbolKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeTable {
    pub kind: ScopeKind,
    symbols: Vec<SymbolDescriptor>,
    index: FxHashMap<Symbol, usize>,
}

impl ScopeTable {
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            symbols: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Declare `name`; an existing entry is left untouched
    pub fn declare(&mut self, name: Symbol, kind: SymbolKind, shadowed: bool, span: Span) -> Declared {
        if let Some(&idx) = self.index.get(&name) {
            return Declared::Existing(self.symbols[idx].kind);
        }
        self.index.insert(name, self.symbols.len());
        self.symbols.push(SymbolDescriptor {
            name,
            kind,
            shadowed,
            span,
        });
        Declared::Added
    }

    pub fn lookup(&self, name: Symbol) -> Option<&SymbolDescriptor> {
        self.index.get(&name).map(|&idx| &self.symbols[idx])
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.index.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolDescriptor> {
        self.symbols.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_syntax::Interner;

    #[test]
    fn test_declare_and_lookup() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");

        let mut table = ScopeTable::new(ScopeKind::Block);
        assert_eq!(table.declare(x, SymbolKind::Let, false, Span::default()), Declared::Added);
        assert_eq!(
            table.declare(x, SymbolKind::Var, false, Span::default()),
            Declared::Existing(SymbolKind::Let)
        );
        table.declare(y, SymbolKind::Const, true, Span::default());

        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(x).map(|s| s.kind), Some(SymbolKind::Let));
        assert!(table.lookup(y).map(|s| s.shadowed).unwrap_or(false));
    }

    #[test]
    fn test_insertion_order() {
        let mut interner = Interner::new();
        let names: Vec<_> = ["c", "a", "b"].iter().map(|n| interner.intern(n)).collect();

        let mut table = ScopeTable::new(ScopeKind::Function);
        for &n in &names {
            table.declare(n, SymbolKind::Var, false, Span::default());
        }
        let order: Vec<_> = table.iter().map(|s| s.name).collect();
        assert_eq!(order, names);
    }
}
