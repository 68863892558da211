//! Kiln Syntax Tree
//!
//! The syntax tree consumed by the Kiln lowering engine. Trees are produced by
//! the parser (a separate component) and are only ever read by the compiler.
//!
//! - **Spans**: source positions attached to every node (`span` module)
//! - **Interner**: deduplicated identifier storage (`interner` module)
//! - **AST**: closed statement/expression/pattern enums (`ast` module)
//! - **Builder**: programmatic tree construction (`builder` module)

#![warn(rust_2018_idioms)]

pub mod ast;
pub mod builder;
pub mod interner;
pub mod span;

pub use builder::AstBuilder;
pub use interner::{Interner, Symbol};
pub use span::Span;
