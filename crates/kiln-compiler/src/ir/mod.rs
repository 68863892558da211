//! Intermediate Representation (IR) for Kiln
//!
//! The IR is an owned tree: every node has exactly one parent. Control flow is
//! explicit. Loops, switches, labels and try/catch/finally are spelled out with
//! `Jump` nodes and zero-effect `Target` anchors instead of recursive structure.
//!
//! # Structure
//!
//! - `IrScript` - flat function table of a compilation unit (root at index 0)
//! - `IrFunction` - one lowered function body plus its symbol table
//! - `IrNode` - a node: kind, children, line, property bag
//! - `ScopeTable` - declared names of a lexical scope
//! - `TargetId` / `LocalId` - jump anchors and block-scoped storage slots

pub mod function;
pub mod node;
pub mod pretty;
pub mod props;
pub mod scope;
pub mod validate;

pub use function::{IrFunction, IrScript};
pub use node::{
    BinaryOp, ClassMemberKind, DecoratorName, EnumMode, FunctionId, IncDecFlags, IrNode, JumpKind,
    LocalId, LogicalOp, NodeKind, TargetId, UnaryOp, Unwind,
};
pub use pretty::PrettyPrint;
pub use props::{PropKey, PropValue, SpecialCall};
pub use scope::{Declared, ScopeKind, ScopeTable, SymbolDescriptor, SymbolKind};
