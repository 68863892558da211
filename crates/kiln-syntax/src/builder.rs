//! Programmatic syntax tree construction
//!
//! `AstBuilder` owns an `Interner` and hands out nodes whose spans sit on a
//! caller-controlled "current line". It exists so that the lowering engine
//! can be exercised and benchmarked without a parser.

use crate::ast::*;
use crate::interner::Interner;
use crate::span::Span;

/// Helper for building syntax trees by hand
pub struct AstBuilder {
    interner: Interner,
    line: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            interner: Interner::new(),
            line: 1,
        }
    }

    pub fn interner(&mut self) -> &mut Interner {
        &mut self.interner
    }

    pub fn into_interner(self) -> Interner {
        self.interner
    }

    /// Set the line attached to nodes built from now on
    pub fn at_line(&mut self, line: u32) -> &mut Self {
        self.line = line;
        self
    }

    pub fn span(&self) -> Span {
        Span::at_line(self.line)
    }

    // ------------------------------------------------------------------
    // Scripts and functions
    // ------------------------------------------------------------------

    pub fn script(&self, statements: Vec<Statement>) -> Script {
        Script::new("test.kiln", statements, Span::at_line(1))
    }

    pub fn function(&mut self, name: Option<&str>, params: &[&str], body: Vec<Statement>) -> FunctionNode {
        let name = name.map(|n| self.ident(n));
        let params = params
            .iter()
            .map(|p| Parameter {
                pattern: self.pat(p),
                default: None,
                rest: false,
                span: self.span(),
            })
            .collect();
        FunctionNode {
            name,
            params,
            body: FunctionBody::Block(self.block(body)),
            kind: FunctionKind::Expression,
            is_generator: false,
            span: self.span(),
        }
    }

    pub fn function_decl(&mut self, name: &str, params: &[&str], body: Vec<Statement>) -> Statement {
        let mut f = self.function(Some(name), params, body);
        f.kind = FunctionKind::Declaration;
        Statement::FunctionDecl(Box::new(f))
    }

    pub fn function_expr(&mut self, name: Option<&str>, params: &[&str], body: Vec<Statement>) -> Expression {
        Expression::Function(Box::new(self.function(name, params, body)))
    }

    pub fn arrow(&mut self, params: &[&str], body: Expression) -> Expression {
        let params = params
            .iter()
            .map(|p| Parameter {
                pattern: self.pat(p),
                default: None,
                rest: false,
                span: self.span(),
            })
            .collect();
        Expression::Function(Box::new(FunctionNode {
            name: None,
            params,
            body: FunctionBody::Expression(Box::new(body)),
            kind: FunctionKind::Arrow,
            is_generator: false,
            span: self.span(),
        }))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn ident(&mut self, name: &str) -> Identifier {
        Identifier::new(self.interner.intern(name), self.span())
    }

    pub fn name(&mut self, name: &str) -> Expression {
        Expression::Identifier(self.ident(name))
    }

    pub fn num(&self, value: f64) -> Expression {
        Expression::Number(NumberLiteral {
            value,
            span: self.span(),
        })
    }

    pub fn str(&self, value: &str) -> Expression {
        Expression::String(StringLiteral {
            value: value.to_string(),
            span: self.span(),
        })
    }

    pub fn bool(&self, value: bool) -> Expression {
        Expression::Boolean(BooleanLiteral {
            value,
            span: self.span(),
        })
    }

    pub fn null(&self) -> Expression {
        Expression::Null(self.span())
    }

    pub fn this(&self) -> Expression {
        Expression::This(self.span())
    }

    pub fn binary(&self, operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
        Expression::Binary(BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            span: self.span(),
        })
    }

    pub fn logical(&self, operator: LogicalOperator, left: Expression, right: Expression) -> Expression {
        Expression::Logical(LogicalExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            span: self.span(),
        })
    }

    pub fn unary(&self, operator: UnaryOperator, operand: Expression) -> Expression {
        Expression::Unary(UnaryExpression {
            operator,
            operand: Box::new(operand),
            span: self.span(),
        })
    }

    pub fn update(&self, operator: UpdateOperator, prefix: bool, argument: Expression) -> Expression {
        Expression::Update(UpdateExpression {
            operator,
            prefix,
            argument: Box::new(argument),
            span: self.span(),
        })
    }

    pub fn sequence(&self, expressions: Vec<Expression>) -> Expression {
        Expression::Sequence(SequenceExpression {
            expressions,
            span: self.span(),
        })
    }

    pub fn conditional(&self, test: Expression, consequent: Expression, alternate: Expression) -> Expression {
        Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span: self.span(),
        })
    }

    pub fn assign(&self, target: Pattern, value: Expression) -> Expression {
        self.assign_op(AssignmentOperator::Assign, target, value)
    }

    pub fn assign_op(&self, operator: AssignmentOperator, target: Pattern, value: Expression) -> Expression {
        Expression::Assignment(AssignmentExpression {
            operator,
            target,
            value: Box::new(value),
            span: self.span(),
        })
    }

    pub fn member(&mut self, object: Expression, property: &str) -> Expression {
        Expression::Member(MemberExpression {
            object: Box::new(object),
            property: self.ident(property),
            optional: false,
            span: self.span(),
        })
    }

    pub fn index(&self, object: Expression, index: Expression) -> Expression {
        Expression::Index(IndexExpression {
            object: Box::new(object),
            index: Box::new(index),
            optional: false,
            span: self.span(),
        })
    }

    pub fn call(&self, callee: Expression, arguments: Vec<Expression>) -> Expression {
        self.call_with(callee, arguments.into_iter().map(Argument::Expression).collect())
    }

    pub fn call_with(&self, callee: Expression, arguments: Vec<Argument>) -> Expression {
        Expression::Call(CallExpression {
            callee: Box::new(callee),
            arguments,
            optional: false,
            span: self.span(),
        })
    }

    pub fn new_expr(&self, callee: Expression, arguments: Vec<Expression>) -> Expression {
        Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments: arguments.into_iter().map(Argument::Expression).collect(),
            span: self.span(),
        })
    }

    /// Array literal; `None` entries are holes
    pub fn array(&self, elements: Vec<Option<Expression>>) -> Expression {
        Expression::Array(ArrayExpression {
            elements: elements
                .into_iter()
                .map(|e| e.map(ArrayElement::Expression))
                .collect(),
            span: self.span(),
        })
    }

    pub fn spread_array(&self, argument: Expression) -> Expression {
        Expression::Array(ArrayExpression {
            elements: vec![Some(ArrayElement::Spread(argument))],
            span: self.span(),
        })
    }

    /// Object literal with plain `name: value` properties
    pub fn object(&mut self, properties: Vec<(&str, Expression)>) -> Expression {
        let properties = properties
            .into_iter()
            .map(|(key, value)| {
                ObjectProperty::Property(Property {
                    key: PropertyKey::Identifier(self.ident(key)),
                    value,
                    kind: PropertyKind::Init,
                    span: self.span(),
                })
            })
            .collect();
        Expression::Object(ObjectExpression {
            properties,
            span: self.span(),
        })
    }

    pub fn paren(&self, expression: Expression) -> Expression {
        Expression::Parenthesized(ParenthesizedExpression {
            expression: Box::new(expression),
            span: self.span(),
        })
    }

    pub fn yield_expr(&self, argument: Option<Expression>) -> Expression {
        Expression::Yield(YieldExpression {
            argument: argument.map(Box::new),
            delegate: false,
            span: self.span(),
        })
    }

    // ------------------------------------------------------------------
    // Patterns
    // ------------------------------------------------------------------

    pub fn pat(&mut self, name: &str) -> Pattern {
        Pattern::Identifier(self.ident(name))
    }

    pub fn pat_expr(&self, expression: Expression) -> Pattern {
        Pattern::Expression(Box::new(expression))
    }

    /// Array pattern; `None` entries are skipped slots
    pub fn pat_array(&self, elements: Vec<Option<Pattern>>) -> Pattern {
        Pattern::Array(ArrayPattern {
            elements: elements
                .into_iter()
                .map(|p| {
                    p.map(|target| PatternElement {
                        target,
                        default: None,
                        span: self.span(),
                    })
                })
                .collect(),
            rest: None,
            span: self.span(),
        })
    }

    /// Object pattern with `key: target` properties
    pub fn pat_object(&mut self, properties: Vec<(&str, Pattern)>) -> Pattern {
        let properties = properties
            .into_iter()
            .map(|(key, value)| ObjectPatternProperty {
                shorthand: matches!(&value, Pattern::Identifier(id) if self.interner.resolve(id.name) == key),
                key: PropertyKey::Identifier(self.ident(key)),
                value,
                default: None,
                span: self.span(),
            })
            .collect();
        Pattern::Object(ObjectPattern {
            properties,
            rest: None,
            span: self.span(),
        })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn expr_stmt(&self, expression: Expression) -> Statement {
        Statement::Expression(ExpressionStatement {
            expression,
            span: self.span(),
        })
    }

    pub fn var_decl(&self, kind: VariableKind, target: Pattern, init: Option<Expression>) -> VariableDecl {
        VariableDecl {
            kind,
            declarations: vec![VariableDeclarator {
                target,
                init,
                span: self.span(),
            }],
            span: self.span(),
        }
    }

    pub fn var(&mut self, kind: VariableKind, name: &str, init: Option<Expression>) -> Statement {
        let target = self.pat(name);
        Statement::VariableDecl(self.var_decl(kind, target, init))
    }

    pub fn block(&self, statements: Vec<Statement>) -> BlockStatement {
        BlockStatement {
            statements,
            span: self.span(),
        }
    }

    pub fn block_stmt(&self, statements: Vec<Statement>) -> Statement {
        Statement::Block(self.block(statements))
    }

    pub fn if_stmt(&self, test: Expression, consequent: Statement, alternate: Option<Statement>) -> Statement {
        Statement::If(IfStatement {
            test,
            consequent: Box::new(consequent),
            alternate: alternate.map(Box::new),
            span: self.span(),
        })
    }

    pub fn while_stmt(&self, test: Expression, body: Statement) -> Statement {
        Statement::While(WhileStatement {
            test,
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn do_while(&self, body: Statement, test: Expression) -> Statement {
        Statement::DoWhile(DoWhileStatement {
            body: Box::new(body),
            test,
            span: self.span(),
        })
    }

    pub fn for_stmt(
        &self,
        init: Option<ForInit>,
        test: Option<Expression>,
        update: Option<Expression>,
        body: Statement,
    ) -> Statement {
        Statement::For(ForStatement {
            init,
            test,
            update,
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn for_in(&self, left: ForInLeft, right: Expression, body: Statement) -> Statement {
        Statement::ForIn(ForInStatement {
            left,
            right,
            body: Box::new(body),
            is_of: false,
            span: self.span(),
        })
    }

    pub fn for_of(&self, left: ForInLeft, right: Expression, body: Statement) -> Statement {
        Statement::ForIn(ForInStatement {
            left,
            right,
            body: Box::new(body),
            is_of: true,
            span: self.span(),
        })
    }

    pub fn break_stmt(&mut self, label: Option<&str>) -> Statement {
        let label = label.map(|l| self.ident(l));
        Statement::Break(BreakStatement {
            label,
            span: self.span(),
        })
    }

    pub fn continue_stmt(&mut self, label: Option<&str>) -> Statement {
        let label = label.map(|l| self.ident(l));
        Statement::Continue(ContinueStatement {
            label,
            span: self.span(),
        })
    }

    pub fn return_stmt(&self, argument: Option<Expression>) -> Statement {
        Statement::Return(ReturnStatement {
            argument,
            span: self.span(),
        })
    }

    pub fn throw_stmt(&self, argument: Expression) -> Statement {
        Statement::Throw(ThrowStatement {
            argument,
            span: self.span(),
        })
    }

    pub fn catch_clause(&mut self, param: Option<&str>, body: Vec<Statement>) -> CatchClause {
        let param = param.map(|p| self.ident(p));
        CatchClause {
            param,
            guard: None,
            body: self.block(body),
            span: self.span(),
        }
    }

    pub fn try_stmt(
        &self,
        block: Vec<Statement>,
        handlers: Vec<CatchClause>,
        finalizer: Option<Vec<Statement>>,
    ) -> Statement {
        Statement::Try(TryStatement {
            block: self.block(block),
            handlers,
            finalizer: finalizer.map(|f| self.block(f)),
            span: self.span(),
        })
    }

    /// Switch statement; a `None` test is the `default` clause
    pub fn switch_stmt(&self, discriminant: Expression, cases: Vec<(Option<Expression>, Vec<Statement>)>) -> Statement {
        Statement::Switch(SwitchStatement {
            discriminant,
            cases: cases
                .into_iter()
                .map(|(test, consequent)| SwitchCase {
                    test,
                    consequent,
                    span: self.span(),
                })
                .collect(),
            span: self.span(),
        })
    }

    pub fn labeled(&mut self, labels: &[&str], body: Statement) -> Statement {
        let labels = labels.iter().map(|l| self.ident(l)).collect();
        Statement::Labeled(LabeledStatement {
            labels,
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn with_stmt(&self, object: Expression, body: Statement) -> Statement {
        Statement::With(WithStatement {
            object,
            body: Box::new(body),
            span: self.span(),
        })
    }
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}
