//! Identifier table shared by the parser and the lowering engine
//!
//! Every name is stored once in a single text buffer and referred to by a
//! `Symbol` index. Besides parsed identifiers, the lowering engine mints the
//! names of the temporaries and parameters it introduces with
//! [`Interner::fresh`], which never hands out a name the table already holds.

use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// Index of a name in an [`Interner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Default)]
pub struct Interner {
    /// All names, back to back
    text: String,
    /// Byte range of each symbol's name in `text`
    ranges: Vec<(u32, u32)>,
    by_name: FxHashMap<Box<str>, Symbol>,
    /// Symbols minted by `fresh`
    generated: FxHashSet<Symbol>,
    fresh_counter: u32,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbol for `name`, adding it on first sight
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.by_name.get(name) {
            return sym;
        }
        let start = self.text.len() as u32;
        self.text.push_str(name);
        let sym = Symbol(self.ranges.len() as u32);
        self.ranges.push((start, self.text.len() as u32));
        self.by_name.insert(name.into(), sym);
        sym
    }

    /// Symbol for `name` if it has been interned
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.by_name.get(name).copied()
    }

    /// A new name of the form `<prefix><n>` that no parsed identifier or
    /// earlier fresh name uses
    pub fn fresh(&mut self, prefix: &str) -> Symbol {
        loop {
            let candidate = format!("{}{}", prefix, self.fresh_counter);
            self.fresh_counter += 1;
            if self.by_name.contains_key(candidate.as_str()) {
                continue;
            }
            let sym = self.intern(&candidate);
            self.generated.insert(sym);
            return sym;
        }
    }

    /// Whether `sym` was minted by [`Interner::fresh`]
    pub fn is_generated(&self, sym: Symbol) -> bool {
        self.generated.contains(&sym)
    }

    /// # Panics
    ///
    /// Panics if `sym` comes from another interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        let (start, end) = self.ranges[sym.index()];
        &self.text[start as usize..end as usize]
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner")
            .field("names", &self.ranges.len())
            .field("generated", &self.generated.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_symbol() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");

        assert_eq!(interner.intern("x"), x);
        assert_ne!(x, y);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.resolve(y), "y");
        assert_eq!(interner.get("z"), None);
    }

    #[test]
    fn test_names_share_one_buffer() {
        let mut interner = Interner::new();
        let ab = interner.intern("ab");
        let a = interner.intern("a");
        let empty = interner.intern("");

        assert_eq!(interner.resolve(ab), "ab");
        assert_eq!(interner.resolve(a), "a");
        assert_eq!(interner.resolve(empty), "");
        assert_eq!(interner.text, "aba");
    }

    #[test]
    fn test_fresh_skips_taken_names() {
        let mut interner = Interner::new();
        let user = interner.intern("$1");

        let first = interner.fresh("$");
        let second = interner.fresh("$");
        assert_eq!(interner.resolve(first), "$0");
        assert_eq!(interner.resolve(second), "$2");
        assert!(interner.is_generated(first));
        assert!(!interner.is_generated(user));
    }

    #[test]
    fn test_fresh_counter_is_shared_across_prefixes() {
        let mut interner = Interner::new();
        let param = interner.fresh("$param");
        let temp = interner.fresh("$");

        assert_eq!(interner.resolve(param), "$param0");
        assert_eq!(interner.resolve(temp), "$1");
    }
}
