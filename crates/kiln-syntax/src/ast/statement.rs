//! Statement AST nodes
//!
//! This module defines all statement types in the Kiln language, including:
//! - Variable declarations (var, let, const)
//! - Function, class and decorator declarations
//! - Control flow statements (if, loops, switch, try, labels, with)

use super::*;
use crate::span::Span;

/// Top-level or block-level statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration: var/let/const
    VariableDecl(VariableDecl),

    /// Function declaration
    FunctionDecl(Box<FunctionNode>),

    /// Class declaration
    ClassDecl(Box<ClassNode>),

    /// User-defined decorator declaration: `@decorator name @wrap @register`
    DecoratorDecl(DecoratorDecl),

    /// Expression statement (e.g., function call)
    Expression(ExpressionStatement),

    /// If statement
    If(IfStatement),

    /// Switch statement
    Switch(SwitchStatement),

    /// While loop
    While(WhileStatement),

    /// Do-while loop
    DoWhile(DoWhileStatement),

    /// C-style for loop
    For(ForStatement),

    /// For-in and for-of loops
    ForIn(ForInStatement),

    /// Break statement
    Break(BreakStatement),

    /// Continue statement
    Continue(ContinueStatement),

    /// Return statement
    Return(ReturnStatement),

    /// Throw statement
    Throw(ThrowStatement),

    /// Try-catch-finally
    Try(TryStatement),

    /// Block statement: `{ ... }`
    Block(BlockStatement),

    /// One or more labels on a statement: `outer: inner: for (...) ...`
    Labeled(LabeledStatement),

    /// With statement
    With(WithStatement),

    /// Empty statement (;)
    Empty(Span),

    /// Debugger statement
    Debugger(Span),
}

impl Statement {
    /// Get the span of this statement
    pub fn span(&self) -> &Span {
        match self {
            Statement::VariableDecl(s) => &s.span,
            Statement::FunctionDecl(s) => &s.span,
            Statement::ClassDecl(s) => &s.span,
            Statement::DecoratorDecl(s) => &s.span,
            Statement::Expression(s) => &s.span,
            Statement::If(s) => &s.span,
            Statement::Switch(s) => &s.span,
            Statement::While(s) => &s.span,
            Statement::DoWhile(s) => &s.span,
            Statement::For(s) => &s.span,
            Statement::ForIn(s) => &s.span,
            Statement::Break(s) => &s.span,
            Statement::Continue(s) => &s.span,
            Statement::Return(s) => &s.span,
            Statement::Throw(s) => &s.span,
            Statement::Try(s) => &s.span,
            Statement::Block(s) => &s.span,
            Statement::Labeled(s) => &s.span,
            Statement::With(s) => &s.span,
            Statement::Empty(span) => span,
            Statement::Debugger(span) => span,
        }
    }

    /// Check if this statement is a loop (a valid `continue` label target)
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            Statement::While(_) | Statement::DoWhile(_) | Statement::For(_) | Statement::ForIn(_)
        )
    }
}

// ============================================================================
// Variable Declaration
// ============================================================================

/// Variable declaration: `var a = 1, [b, c] = pair;`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub kind: VariableKind,
    pub declarations: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

/// One `target = init` entry of a declaration
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub target: Pattern,
    pub init: Option<Expression>,
    pub span: Span,
}

/// `@decorator name @d1 @d2 ...;`
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratorDecl {
    pub name: Identifier,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

// ============================================================================
// Expression Statement
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

// ============================================================================
// Control Flow
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    pub span: Span,
}

/// `case test:` or `default:` (when `test` is `None`)
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Variable(VariableDecl),
    Expression(Expression),
}

/// `for (left in right)` or, with `is_of`, `for (left of right)`
#[derive(Debug, Clone, PartialEq)]
pub struct ForInStatement {
    pub left: ForInLeft,
    pub right: Expression,
    pub body: Box<Statement>,
    pub is_of: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInLeft {
    /// `var x`, `let [k, v]`, ...
    Variable(VariableDecl),
    /// An assignment target without a declaration keyword
    Pattern(Pattern),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakStatement {
    pub label: Option<Identifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinueStatement {
    pub label: Option<Identifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStatement {
    pub argument: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    pub block: BlockStatement,
    pub handlers: Vec<CatchClause>,
    pub finalizer: Option<BlockStatement>,
    pub span: Span,
}

/// `catch (e)`, `catch (e if guard)` or a parameterless `catch`
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Identifier>,
    pub guard: Option<Expression>,
    pub body: BlockStatement,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStatement {
    pub labels: Vec<Identifier>,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithStatement {
    pub object: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}
