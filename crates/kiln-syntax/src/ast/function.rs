//! Function, class and decorator nodes

use super::*;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Declaration,
    Expression,
    Arrow,
    Method,
    Getter,
    Setter,
    Constructor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub name: Option<Identifier>,
    pub params: Vec<Parameter>,
    pub body: FunctionBody,
    pub kind: FunctionKind,
    pub is_generator: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(BlockStatement),
    /// Concise arrow body: `x => x * 2`
    Expression(Box<Expression>),
}

impl FunctionBody {
    pub fn span(&self) -> &Span {
        match self {
            FunctionBody::Block(b) => &b.span,
            FunctionBody::Expression(e) => e.span(),
        }
    }
}

/// Function parameter: `x`, `x = 1`, `[a, b]`, `...rest`
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub pattern: Pattern,
    pub default: Option<Expression>,
    pub rest: bool,
    pub span: Span,
}

// ============================================================================
// Classes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode {
    pub name: Option<Identifier>,
    pub heritage: Option<Expression>,
    pub constructor: Option<FunctionNode>,
    pub members: Vec<ClassMember>,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Method(ClassMethod),
    Field(ClassField),
}

impl ClassMember {
    pub fn decorators(&self) -> &[Decorator] {
        match self {
            ClassMember::Method(m) => &m.decorators,
            ClassMember::Field(f) => &f.decorators,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            ClassMember::Method(m) => m.is_static,
            ClassMember::Field(f) => f.is_static,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMethod {
    pub key: PropertyKey,
    pub function: FunctionNode,
    pub is_static: bool,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassField {
    pub key: PropertyKey,
    pub value: Option<Expression>,
    pub is_static: bool,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

// ============================================================================
// Decorators
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub kind: DecoratorKind,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecoratorKind {
    Wrap,
    Register,
    Initialize,
    NumericTemplate,
    /// A decorator declared with `@decorator name ...`
    User(Identifier),
}
