//! Expression AST nodes
//!
//! This module defines all expression types in the Kiln language, including:
//! - Literal expressions (numbers, strings, templates, arrays, objects)
//! - Unary, update, binary and logical operations
//! - Assignments (simple, compound and destructuring)
//! - Calls, member access and generator expressions

use super::*;
use crate::span::Span;

/// Expression (produces a value)
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Number literal: 42, 3.14, 0xFF
    Number(NumberLiteral),

    /// String literal: "hello"
    String(StringLiteral),

    /// Template literal, optionally tagged: tag`a${b}c`
    Template(TemplateLiteral),

    /// Regular expression literal: /ab+c/g
    RegExp(RegExpLiteral),

    /// Boolean literal: true, false
    Boolean(BooleanLiteral),

    /// Null literal
    Null(Span),

    /// This expression
    This(Span),

    /// Identifier
    Identifier(Identifier),

    /// Array literal: [1, , ...rest]
    Array(ArrayExpression),

    /// Object literal: { x: 1, get y() {}, ...rest }
    Object(ObjectExpression),

    /// Function expression, arrow function or method
    Function(Box<FunctionNode>),

    /// Class expression
    Class(Box<ClassNode>),

    /// Unary expression: !x, -y, typeof z, delete o.p
    Unary(UnaryExpression),

    /// Increment/decrement: ++x, x--
    Update(UpdateExpression),

    /// Binary expression: x + y, a in b
    Binary(BinaryExpression),

    /// Comma expression: a, b, c
    Sequence(SequenceExpression),

    /// Logical expression: x && y, a || b, c ?? d
    Logical(LogicalExpression),

    /// Assignment: x = 42, y += 1, [a, b] = pair
    Assignment(AssignmentExpression),

    /// Ternary: x ? y : z
    Conditional(ConditionalExpression),

    /// Function call: foo(1, ...rest), foo?.(x), foo(?, 1)
    Call(CallExpression),

    /// New expression: new Point(1, 2)
    New(NewExpression),

    /// Member access: obj.prop, obj?.prop
    Member(MemberExpression),

    /// Index access: arr[0], arr?.[0]
    Index(IndexExpression),

    /// Parenthesized: (expr)
    Parenthesized(ParenthesizedExpression),

    /// Yield expression: yield value, yield* iterable
    Yield(YieldExpression),

    /// Generator expression: (x * 2 for (x of xs) if (x > 0))
    GeneratorExpr(GeneratorExpression),
}

impl Expression {
    /// Get the span of this expression
    pub fn span(&self) -> &Span {
        match self {
            Expression::Number(e) => &e.span,
            Expression::String(e) => &e.span,
            Expression::Template(e) => &e.span,
            Expression::RegExp(e) => &e.span,
            Expression::Boolean(e) => &e.span,
            Expression::Null(span) => span,
            Expression::This(span) => span,
            Expression::Identifier(e) => &e.span,
            Expression::Array(e) => &e.span,
            Expression::Object(e) => &e.span,
            Expression::Function(e) => &e.span,
            Expression::Class(e) => &e.span,
            Expression::Unary(e) => &e.span,
            Expression::Update(e) => &e.span,
            Expression::Binary(e) => &e.span,
            Expression::Sequence(e) => &e.span,
            Expression::Logical(e) => &e.span,
            Expression::Assignment(e) => &e.span,
            Expression::Conditional(e) => &e.span,
            Expression::Call(e) => &e.span,
            Expression::New(e) => &e.span,
            Expression::Member(e) => &e.span,
            Expression::Index(e) => &e.span,
            Expression::Parenthesized(e) => &e.span,
            Expression::Yield(e) => &e.span,
            Expression::GeneratorExpr(e) => &e.span,
        }
    }

    /// Check if this expression is a literal
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expression::Number(_)
                | Expression::String(_)
                | Expression::Boolean(_)
                | Expression::Null(_)
                | Expression::RegExp(_)
        )
    }

    /// Strip any number of enclosing parentheses
    pub fn unparenthesized(&self) -> &Expression {
        let mut expr = self;
        while let Expression::Parenthesized(p) = expr {
            expr = &p.expression;
        }
        expr
    }
}

// ============================================================================
// Literal Expressions
// ============================================================================

/// Number literal (all numbers are IEEE doubles)
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub value: f64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: String,
    pub span: Span,
}

/// Template literal: `quasis[0] ${expressions[0]} quasis[1] ...`
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLiteral {
    pub tag: Option<Box<Expression>>,
    pub quasis: Vec<String>,
    pub expressions: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegExpLiteral {
    pub pattern: String,
    pub flags: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub value: bool,
    pub span: Span,
}

// ============================================================================
// Array and Object Expressions
// ============================================================================

/// Array expression: `[1, , ...rest]`; `None` elements are holes
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpression {
    pub elements: Vec<Option<ArrayElement>>,
    pub span: Span,
}

/// Array element (expression or spread)
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    /// Regular expression: 42
    Expression(Expression),
    /// Spread element: ...arr
    Spread(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpression {
    pub properties: Vec<ObjectProperty>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    Property(Property),
    Spread(SpreadProperty),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expression,
    pub kind: PropertyKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `key: value` and shorthand `key`
    Init,
    /// `get key() {}`
    Get,
    /// `set key(v) {}`
    Set,
    /// `key() {}`
    Method,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Identifier(Identifier),
    String(StringLiteral),
    Number(NumberLiteral),
    /// Computed property name: [expr]
    Computed(Box<Expression>),
}

impl PropertyKey {
    pub fn span(&self) -> &Span {
        match self {
            PropertyKey::Identifier(id) => &id.span,
            PropertyKey::String(s) => &s.span,
            PropertyKey::Number(n) => &n.span,
            PropertyKey::Computed(e) => e.span(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpreadProperty {
    pub argument: Expression,
    pub span: Span,
}

// ============================================================================
// Unary & Binary Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,       // +x
    Minus,      // -x
    Not,        // !x
    BitwiseNot, // ~x
    Typeof,     // typeof x
    Void,       // void x
    Delete,     // delete x
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    pub operator: UpdateOperator,
    pub prefix: bool,
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
    Modulo,   // %
    Exponent, // **

    // Comparison
    Equal,          // ==
    NotEqual,       // !=
    StrictEqual,    // ===
    StrictNotEqual, // !==
    LessThan,       // <
    LessEqual,      // <=
    GreaterThan,    // >
    GreaterEqual,   // >=
    In,             // in
    InstanceOf,     // instanceof

    // Bitwise
    BitwiseAnd,         // &
    BitwiseOr,          // |
    BitwiseXor,         // ^
    LeftShift,          // <<
    RightShift,         // >>
    UnsignedRightShift, // >>>
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    pub operator: LogicalOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,               // &&
    Or,                // ||
    NullishCoalescing, // ??
}

/// Assignment expression: x = 42, o.p += 1, [a, b] = pair
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpression {
    pub operator: AssignmentOperator,
    pub target: Pattern,
    pub value: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    Assign,                   // =
    AddAssign,                // +=
    SubAssign,                // -=
    MulAssign,                // *=
    DivAssign,                // /=
    ModAssign,                // %=
    ExpAssign,                // **=
    BitAndAssign,             // &=
    BitOrAssign,              // |=
    BitXorAssign,             // ^=
    LeftShiftAssign,          // <<=
    RightShiftAssign,         // >>=
    UnsignedRightShiftAssign, // >>>=
    AndAssign,                // &&=
    OrAssign,                 // ||=
    NullishAssign,            // ??=
}

impl AssignmentOperator {
    /// The arithmetic/bitwise operator a compound assignment applies
    pub fn binary_operator(self) -> Option<BinaryOperator> {
        use AssignmentOperator::*;
        Some(match self {
            AddAssign => BinaryOperator::Add,
            SubAssign => BinaryOperator::Subtract,
            MulAssign => BinaryOperator::Multiply,
            DivAssign => BinaryOperator::Divide,
            ModAssign => BinaryOperator::Modulo,
            ExpAssign => BinaryOperator::Exponent,
            BitAndAssign => BinaryOperator::BitwiseAnd,
            BitOrAssign => BinaryOperator::BitwiseOr,
            BitXorAssign => BinaryOperator::BitwiseXor,
            LeftShiftAssign => BinaryOperator::LeftShift,
            RightShiftAssign => BinaryOperator::RightShift,
            UnsignedRightShiftAssign => BinaryOperator::UnsignedRightShift,
            Assign | AndAssign | OrAssign | NullishAssign => return None,
        })
    }

    /// The short-circuit operator of `&&=`, `||=` and `??=`
    pub fn logical_operator(self) -> Option<LogicalOperator> {
        match self {
            AssignmentOperator::AndAssign => Some(LogicalOperator::And),
            AssignmentOperator::OrAssign => Some(LogicalOperator::Or),
            AssignmentOperator::NullishAssign => Some(LogicalOperator::NullishCoalescing),
            _ => None,
        }
    }
}

// ============================================================================
// Complex Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: Span,
}

/// Call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Expression(Expression),
    /// `...args`
    Spread(Expression),
    /// Partial-application placeholder: `f(?, 1)`
    Placeholder(Span),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Argument>,
    /// `f?.()`
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: Identifier,
    pub optional: bool, // obj?.prop
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    pub object: Box<Expression>,
    pub index: Box<Expression>,
    pub optional: bool, // obj?.[i]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesizedExpression {
    pub expression: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldExpression {
    pub argument: Option<Box<Expression>>,
    /// `yield*`
    pub delegate: bool,
    pub span: Span,
}

/// `(result for (t1 in/of e1) for (t2 in/of e2) ... if (filter))`
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorExpression {
    pub result: Box<Expression>,
    pub loops: Vec<GeneratorLoop>,
    pub filter: Option<Box<Expression>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorLoop {
    pub target: Pattern,
    pub iterated: Expression,
    pub is_of: bool,
    pub span: Span,
}
