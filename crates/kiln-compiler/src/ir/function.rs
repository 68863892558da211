//! IR Functions
//!
//! A lowered function owns its body tree and its function-level symbol table.
//! Functions of one compilation unit live in a flat `IrScript` table; nesting
//! is recorded by id.

use super::node::{FunctionId, IrNode};
use super::scope::{ScopeKind, ScopeTable};
use super::validate;
use crate::error::ValidateError;
use kiln_syntax::ast::FunctionKind;
use kiln_syntax::{Span, Symbol};

/// A lowered function (or the script root)
#[derive(Debug, Clone)]
pub struct IrFunction {
    pub id: FunctionId,
    /// Declared or synthesized name
    pub name: Option<Symbol>,
    /// `None` for the script root
    pub kind: Option<FunctionKind>,
    /// Parameter names, synthetic for destructuring parameters
    pub params: Vec<Symbol>,
    /// The last parameter collects remaining arguments
    pub has_rest: bool,
    /// Function-level `var`, parameter and function declarations
    pub symbols: ScopeTable,
    pub body: IrNode,
    /// Locals must live in a heap-allocated activation record
    pub requires_activation: bool,
    pub is_generator: bool,
    pub strict: bool,
    /// Directly nested function literals, in source order
    pub nested: Vec<FunctionId>,
    /// `@initialize` decorators to run when constructing instances
    pub initializers: Vec<IrNode>,
    /// Source span of the definition (default unless source generation is on)
    pub source_span: Span,
    /// Number of targets allocated
    pub target_count: u32,
    /// Number of local slots allocated
    pub local_count: u32,
}

impl IrFunction {
    pub fn new(id: FunctionId, name: Option<Symbol>, kind: Option<FunctionKind>) -> Self {
        Self {
            id,
            name,
            kind,
            params: Vec::new(),
            has_rest: false,
            symbols: ScopeTable::new(ScopeKind::Function),
            body: IrNode::block(Vec::new(), 0),
            requires_activation: false,
            is_generator: false,
            strict: false,
            nested: Vec::new(),
            initializers: Vec::new(),
            source_span: Span::default(),
            target_count: 0,
            local_count: 0,
        }
    }

    pub fn is_script(&self) -> bool {
        self.kind.is_none()
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Check the structural invariants of the body
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate::validate_body(&self.body)
    }
}

/// Function table of one compilation unit
#[derive(Debug, Clone)]
pub struct IrScript {
    pub name: String,
    pub functions: Vec<IrFunction>,
}

impl IrScript {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    /// The script root
    pub fn root(&self) -> Option<&IrFunction> {
        self.functions.first()
    }

    pub fn function(&self, id: FunctionId) -> Option<&IrFunction> {
        self.functions.get(id.index())
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn functions(&self) -> impl Iterator<Item = &IrFunction> {
        self.functions.iter()
    }

    /// Validate every function and every nested-function reference
    pub fn validate(&self) -> Result<(), (FunctionId, ValidateError)> {
        for func in &self.functions {
            func.validate().map_err(|e| (func.id, e))?;
            for &nested in &func.nested {
                if self.function(nested).is_none() {
                    return Err((func.id, ValidateError::UnknownFunction { function: nested }));
                }
            }
        }
        Ok(())
    }
}
