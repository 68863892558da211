//! Node property bag keys and values
//!
//! Properties are sparse annotations that do not change a node's kind:
//! literal layout details, call flavors, and markers for generated code.

use kiln_syntax::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropKey {
    /// Array literal/pattern: indexes of holes
    SkipIndexes,
    /// Destructuring array pattern: number of element slots
    DestructuringArrayLength,
    /// Destructuring: names bound by the pattern, left to right
    DestructuringNames,
    /// Array literal or call with spread elements
    HasSpread,
    /// `super(...)` call synthesized for a default constructor
    GeneratedSuper,
    /// Call that needs special runtime handling
    SpecialCall,
    /// `?.` member access or call
    OptionalChain,
    /// Call with partial-application placeholders
    PartialApplication,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Flag,
    Int(i64),
    IntList(Vec<u32>),
    Names(Vec<Symbol>),
    Special(SpecialCall),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialCall {
    /// `eval(...)` or `obj.eval(...)`; the property form is only known to be
    /// eval at run time
    Eval,
    /// `With(...)`
    With,
}
