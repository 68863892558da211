//! Abstract Syntax Tree (AST) for the Kiln scripting language.
//!
//! This module defines the tree handed to the lowering engine:
//! - Script structure
//! - Statements (declarations, control flow, etc.)
//! - Expressions (literals, operators, calls, generator expressions)
//! - Patterns (for destructuring)
//! - Functions, classes and decorators
//!
//! Every AST node includes a `Span` for precise source location tracking.

use crate::interner::Symbol;
use crate::span::Span;

pub mod expression;
pub mod function;
pub mod pattern;
pub mod statement;

pub use expression::*;
pub use function::*;
pub use pattern::*;
pub use statement::*;

/// Root node: one compilation unit
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// Top-level statements
    pub statements: Vec<Statement>,

    /// Whether the script starts with a "use strict" directive
    pub strict: bool,

    /// Name used for diagnostics and IR dumps
    pub source_name: String,

    /// Span covering the entire script
    pub span: Span,
}

impl Script {
    /// Create a new non-strict script
    pub fn new(source_name: impl Into<String>, statements: Vec<Statement>, span: Span) -> Self {
        Self {
            statements,
            strict: false,
            source_name: source_name.into(),
            span,
        }
    }

    /// Check if the script is empty
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Get the number of top-level statements
    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

/// Identifier
///
/// Represents a name for a variable, function, class, label, etc.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: Symbol,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: Symbol, span: Span) -> Self {
        Self { name, span }
    }
}
