//! Expression Lowering
//!
//! Converts AST expressions to IR nodes, folding constants as nodes are built.

use super::Lowerer;
use crate::error::{LowerResult, LoweringDiagnostic};
use crate::ir::{IrFunction, IrNode, NodeKind, PropKey, PropValue, ScopeKind, SpecialCall, UnaryOp};
use kiln_syntax::ast::{
    self, Argument, ArrayElement, Expression, FunctionKind, ObjectProperty, Pattern, PropertyKey,
    PropertyKind, UnaryOperator, VariableKind,
};
use kiln_syntax::Symbol;
use log::trace;

impl<'a> Lowerer<'a> {
    /// Lower an expression
    pub fn lower_expr(&mut self, expr: &Expression) -> LowerResult<IrNode> {
        let line = expr.span().line;
        match expr {
            Expression::Number(n) => Ok(IrNode::number(n.value, line)),
            Expression::String(s) => Ok(IrNode::string(s.value.clone(), line)),
            Expression::Template(template) => self.lower_template(template),
            Expression::RegExp(re) => Ok(IrNode::new(
                NodeKind::RegExp {
                    pattern: re.pattern.clone(),
                    flags: re.flags.clone(),
                },
                line,
            )),
            Expression::Boolean(b) => Ok(IrNode::new(
                if b.value { NodeKind::True } else { NodeKind::False },
                line,
            )),
            Expression::Null(_) => Ok(IrNode::new(NodeKind::Null, line)),
            Expression::This(_) => Ok(IrNode::new(NodeKind::This, line)),
            Expression::Identifier(id) => {
                self.note_name_use(id.name);
                Ok(IrNode::name(id.name, line))
            }
            Expression::Array(array) => self.lower_array(array),
            Expression::Object(object) => self.lower_object(object),
            Expression::Function(func) => {
                let id = self.lower_function(func)?;
                Ok(IrNode::new(NodeKind::Function(id), line))
            }
            Expression::Class(class) => self.lower_class(class),
            Expression::Unary(unary) => self.lower_unary(unary),
            Expression::Update(update) => self.lower_update(update),
            Expression::Binary(binary) => {
                let left = self.lower_expr(&binary.left)?;
                let right = self.lower_expr(&binary.right)?;
                Ok(self.folder.binary(binary.operator.into(), left, right, line))
            }
            Expression::Sequence(seq) => {
                let mut parts = seq
                    .expressions
                    .iter()
                    .map(|e| self.lower_expr(e))
                    .collect::<LowerResult<Vec<_>>>()?;
                if parts.len() == 1 {
                    Ok(parts.remove(0))
                } else {
                    Ok(IrNode::with_children(NodeKind::Comma, parts, line))
                }
            }
            Expression::Logical(logical) => {
                let left = self.lower_expr(&logical.left)?;
                let right = self.lower_expr(&logical.right)?;
                Ok(self.folder.logical(logical.operator.into(), left, right, line))
            }
            Expression::Assignment(assign) => self.lower_assignment(assign),
            Expression::Conditional(cond) => {
                let test = self.lower_expr(&cond.test)?;
                match self.folder.truthiness(&test) {
                    Some(true) => self.lower_expr(&cond.consequent),
                    Some(false) => self.lower_expr(&cond.alternate),
                    None => {
                        let then = self.lower_expr(&cond.consequent)?;
                        let otherwise = self.lower_expr(&cond.alternate)?;
                        Ok(self.folder.hook(test, then, otherwise, line))
                    }
                }
            }
            Expression::Call(call) => self.lower_call(call),
            Expression::New(new) => {
                let callee = self.lower_expr(&new.callee)?;
                let mut node = IrNode::unary(NodeKind::New, callee, line);
                self.lower_arguments(&new.arguments, &mut node)?;
                self.mark_special_call(&new.callee, &mut node);
                Ok(node)
            }
            Expression::Member(member) => {
                let object = self.lower_expr(&member.object)?;
                let key = IrNode::string(self.resolve(member.property.name), line);
                let mut node = IrNode::binary(NodeKind::GetProp, object, key, line);
                if member.optional {
                    node.set_prop(PropKey::OptionalChain, PropValue::Flag);
                }
                Ok(node)
            }
            Expression::Index(index) => {
                let object = self.lower_expr(&index.object)?;
                let key = self.lower_expr(&index.index)?;
                let mut node = IrNode::binary(NodeKind::GetElem, object, key, line);
                if index.optional {
                    node.set_prop(PropKey::OptionalChain, PropValue::Flag);
                }
                Ok(node)
            }
            Expression::Parenthesized(paren) => self.lower_expr(&paren.expression),
            Expression::Yield(y) => {
                let mut node = IrNode::new(NodeKind::Yield { delegate: y.delegate }, line);
                if let Some(argument) = &y.argument {
                    node.push(self.lower_expr(argument)?);
                }
                Ok(node)
            }
            Expression::GeneratorExpr(generator) => self.lower_generator_expr(generator),
        }
    }

    /// Record uses of names that change how the function stores its locals
    pub(super) fn note_name_use(&mut self, name: Symbol) {
        if self.resolve(name) == "arguments" {
            self.ctx.requires_activation = true;
        }
    }

    fn lower_template(&mut self, template: &ast::TemplateLiteral) -> LowerResult<IrNode> {
        let line = template.span.line;
        let mut node = IrNode::new(
            NodeKind::Template {
                tagged: template.tag.is_some(),
            },
            line,
        );
        if let Some(tag) = &template.tag {
            node.push(self.lower_expr(tag)?);
        }
        // Quasis and substitutions interleave: q0 e0 q1 e1 ... qn
        let mut expressions = template.expressions.iter();
        for quasi in &template.quasis {
            node.push(IrNode::string(quasi.clone(), line));
            if let Some(expr) = expressions.next() {
                node.push(self.lower_expr(expr)?);
            }
        }
        for expr in expressions {
            node.push(self.lower_expr(expr)?);
        }
        Ok(node)
    }

    fn lower_unary(&mut self, unary: &ast::UnaryExpression) -> LowerResult<IrNode> {
        let line = unary.span.line;
        let op = match unary.operator {
            UnaryOperator::Delete => return self.lower_delete(&unary.operand, line),
            UnaryOperator::Typeof => {
                if let Expression::Identifier(id) = unary.operand.unparenthesized() {
                    self.note_name_use(id.name);
                    return Ok(IrNode::new(NodeKind::TypeofName(id.name), line));
                }
                UnaryOp::Typeof
            }
            UnaryOperator::Plus => UnaryOp::Pos,
            UnaryOperator::Minus => UnaryOp::Neg,
            UnaryOperator::Not => UnaryOp::Not,
            UnaryOperator::BitwiseNot => UnaryOp::BitNot,
            UnaryOperator::Void => UnaryOp::Void,
        };
        let operand = self.lower_expr(&unary.operand)?;
        Ok(self.folder.unary(op, operand, line))
    }

    // ========================================================================
    // Literals
    // ========================================================================

    fn lower_array(&mut self, array: &ast::ArrayExpression) -> LowerResult<IrNode> {
        let line = array.span.line;
        let mut elements = Vec::with_capacity(array.elements.len());
        let mut skips = Vec::new();
        let mut has_spread = false;

        for element in &array.elements {
            match element {
                None => skips.push((elements.len() + skips.len()) as u32),
                Some(ArrayElement::Expression(expr)) => elements.push(self.lower_expr(expr)?),
                Some(ArrayElement::Spread(expr)) => {
                    if let Expression::String(s) = expr.unparenthesized() {
                        // Spreading a string literal yields its code points
                        elements.extend(s.value.chars().map(|c| IrNode::string(c.to_string(), line)));
                    } else {
                        has_spread = true;
                        let value = self.lower_expr(expr)?;
                        elements.push(IrNode::unary(NodeKind::Spread, value, line));
                    }
                }
            }
        }

        let mut node = IrNode::with_children(NodeKind::ArrayLit, elements, line);
        if !skips.is_empty() {
            node.set_prop(PropKey::SkipIndexes, PropValue::IntList(skips));
        }
        if has_spread {
            node.set_prop(PropKey::HasSpread, PropValue::Flag);
        }
        Ok(node)
    }

    fn lower_object(&mut self, object: &ast::ObjectExpression) -> LowerResult<IrNode> {
        let line = object.span.line;
        let mut node = IrNode::new(NodeKind::ObjectLit, line);

        for property in &object.properties {
            match property {
                ObjectProperty::Property(prop) => {
                    let (key, computed) = self.lower_property_key(&prop.key)?;
                    let value = self.lower_expr(&prop.value)?;
                    let value = match prop.kind {
                        PropertyKind::Init => value,
                        PropertyKind::Get => IrNode::unary(NodeKind::Unary(UnaryOp::Get), value, line),
                        PropertyKind::Set => IrNode::unary(NodeKind::Unary(UnaryOp::Set), value, line),
                        PropertyKind::Method => {
                            IrNode::unary(NodeKind::Unary(UnaryOp::Method), value, line)
                        }
                    };
                    node.push(IrNode::binary(
                        NodeKind::ObjectProperty { computed },
                        key,
                        value,
                        prop.span.line,
                    ));
                }
                ObjectProperty::Spread(spread) => {
                    let value = self.lower_expr(&spread.argument)?;
                    node.push(IrNode::unary(NodeKind::Spread, value, spread.span.line));
                    node.set_prop(PropKey::HasSpread, PropValue::Flag);
                }
            }
        }
        Ok(node)
    }

    /// Property key node and whether it is computed
    pub(super) fn lower_property_key(&mut self, key: &PropertyKey) -> LowerResult<(IrNode, bool)> {
        let line = key.span().line;
        Ok(match key {
            PropertyKey::Identifier(id) => (IrNode::string(self.resolve(id.name), line), false),
            PropertyKey::String(s) => (IrNode::string(s.value.clone(), line), false),
            PropertyKey::Number(n) => (IrNode::number(n.value, line), false),
            PropertyKey::Computed(expr) => (self.lower_expr(expr)?, true),
        })
    }

    // ========================================================================
    // Calls
    // ========================================================================

    pub(super) fn lower_call(&mut self, call: &ast::CallExpression) -> LowerResult<IrNode> {
        let line = call.span.line;
        let callee = self.lower_expr(&call.callee)?;
        let mut node = IrNode::unary(NodeKind::Call, callee, line);
        self.lower_arguments(&call.arguments, &mut node)?;

        self.mark_special_call(&call.callee, &mut node);
        if call.optional {
            node.set_prop(PropKey::OptionalChain, PropValue::Flag);
        }
        Ok(node)
    }

    fn lower_arguments(&mut self, arguments: &[Argument], node: &mut IrNode) -> LowerResult<()> {
        let line = node.line;
        for argument in arguments {
            match argument {
                Argument::Expression(expr) => node.push(self.lower_expr(expr)?),
                Argument::Spread(expr) => {
                    let value = self.lower_expr(expr)?;
                    node.push(IrNode::unary(NodeKind::Spread, value, line));
                    node.set_prop(PropKey::HasSpread, PropValue::Flag);
                }
                Argument::Placeholder(span) => {
                    node.push(IrNode::new(NodeKind::Placeholder, span.line));
                    node.set_prop(PropKey::PartialApplication, PropValue::Flag);
                }
            }
        }
        Ok(())
    }

    /// Tag calls and `new`s of `eval` and `With`. These can see and create
    /// locals of the caller, so the caller needs an activation.
    fn mark_special_call(&mut self, callee: &Expression, node: &mut IrNode) {
        let special = match callee.unparenthesized() {
            Expression::Identifier(id) => match self.resolve(id.name) {
                "eval" => Some(SpecialCall::Eval),
                "With" => Some(SpecialCall::With),
                _ => None,
            },
            Expression::Member(member) if self.resolve(member.property.name) == "eval" => Some(SpecialCall::Eval),
            _ => None,
        };
        if let Some(special) = special {
            node.set_prop(PropKey::SpecialCall, PropValue::Special(special));
            self.ctx.requires_activation = true;
        }
    }

    // ========================================================================
    // Generator expressions
    // ========================================================================

    /// `(result for (x of xs) ... if (filter))` becomes a call of a synthetic
    /// generator function whose body is the nested loops
    fn lower_generator_expr(&mut self, generator: &ast::GeneratorExpression) -> LowerResult<IrNode> {
        let line = generator.span.line;
        let name = self.new_temp("$gen");
        trace!("lowering generator expression at line {}", line);

        let id = self.enter_function(Some(name));
        self.ctx.requires_activation = true;

        // Each loop's iterated value is evaluated in the scopes of the loops around it
        let mut heads = Vec::with_capacity(generator.loops.len());
        for gen_loop in &generator.loops {
            let iterated = self.lower_expr(&gen_loop.iterated)?;
            self.ctx.push_scope(ScopeKind::Loop);
            let declaration = match &gen_loop.target {
                Pattern::Expression(expr) => {
                    self.report(LoweringDiagnostic::BadForInLhs { span: *expr.span() });
                    None
                }
                pattern => Some(self.declare_enum_names(pattern, VariableKind::Let, gen_loop.span.line)),
            };
            heads.push((iterated, declaration));
        }

        let result = self.lower_expr(&generator.result)?;
        let mut body = IrNode::unary(
            NodeKind::ExprVoid,
            IrNode::unary(NodeKind::Yield { delegate: false }, result, line),
            line,
        );
        if let Some(filter) = &generator.filter {
            let condition = self.lower_expr(filter)?;
            body = self.build_if(condition, body, None, line);
        }

        // Wrap innermost first
        for (gen_loop, (iterated, declaration)) in generator.loops.iter().zip(heads).rev() {
            let loop_line = gen_loop.span.line;
            let local = self.ctx.new_local();
            let looped = match declaration {
                Some(declaration) => {
                    self.check_enum_destructuring(gen_loop.is_of, &gen_loop.target);
                    let mode = self.enum_mode(gen_loop.is_of, &gen_loop.target);
                    let assign = self.enum_binding(&gen_loop.target, false, local, loop_line)?;
                    let targets = self.new_loop_targets(false);
                    Self::build_enum_loop(
                        targets,
                        Some(declaration),
                        local,
                        mode,
                        iterated,
                        assign,
                        body,
                        loop_line,
                    )
                }
                None => body,
            };
            let table = self.pop_scope()?;
            body = Self::scoped(table, vec![looped], loop_line);
        }

        let mut func = IrFunction::new(id, Some(name), Some(FunctionKind::Expression));
        func.is_generator = true;
        if self.options.generate_source {
            func.source_span = generator.span;
        }
        let end = IrNode::new(NodeKind::Return { unwinds: Vec::new() }, line);
        let finished = self.exit_function(func, vec![body, end], line)?;
        let callee = IrNode::new(NodeKind::Function(finished), line);
        Ok(IrNode::unary(NodeKind::Call, callee, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, EnumMode};
    use crate::options::LowerOptions;
    use crate::LowerOutput;
    use kiln_syntax::ast::{BinaryOperator, LogicalOperator, Script};
    use kiln_syntax::{AstBuilder, Interner};

    fn lower_with(b: AstBuilder, script: &Script, options: &LowerOptions) -> (LowerOutput, Interner) {
        let mut interner = b.into_interner();
        let output = crate::lower_script(script, &mut interner, options).expect("lowering failed");
        (output, interner)
    }

    fn lower_expr_stmt(b: AstBuilder, expr: Expression) -> (LowerOutput, Interner) {
        let stmt = b.expr_stmt(expr);
        let script = b.script(vec![stmt]);
        lower_with(b, &script, &LowerOptions::default())
    }

    /// The value of the single expression statement
    fn value(output: &LowerOutput) -> &IrNode {
        let body = &output.script.root().expect("root").body;
        let stmt = body.first_child().expect("statement");
        assert_eq!(stmt.kind, NodeKind::ExprResult);
        stmt.first_child().expect("value")
    }

    #[test]
    fn test_constant_folding() {
        let b = AstBuilder::new();
        let two = b.num(2.0);
        let three = b.num(3.0);
        let expr = b.binary(BinaryOperator::Multiply, two, three);
        let (output, _) = lower_expr_stmt(b, expr);
        assert_eq!(value(&output).number_value(), Some(6.0));
    }

    #[test]
    fn test_folding_can_be_disabled() {
        let b = AstBuilder::new();
        let two = b.num(2.0);
        let three = b.num(3.0);
        let expr = b.binary(BinaryOperator::Multiply, two, three);
        let stmt = b.expr_stmt(expr);
        let script = b.script(vec![stmt]);
        let options = LowerOptions {
            fold_constants: false,
            ..LowerOptions::default()
        };
        let (output, _) = lower_with(b, &script, &options);
        assert_eq!(value(&output).kind, NodeKind::Binary(BinaryOp::Mul));
    }

    #[test]
    fn test_string_concatenation_folds() {
        let b = AstBuilder::new();
        let left = b.str("a");
        let right = b.num(1.0);
        let expr = b.binary(BinaryOperator::Add, left, right);
        let (output, _) = lower_expr_stmt(b, expr);
        assert_eq!(value(&output).string_value(), Some("a1"));
    }

    #[test]
    fn test_logical_with_known_left() {
        let mut b = AstBuilder::new();
        let left = b.bool(false);
        let right = b.name("x");
        let expr = b.logical(LogicalOperator::And, left, right);
        let (output, _) = lower_expr_stmt(b, expr);
        assert_eq!(value(&output).kind, NodeKind::False);
    }

    #[test]
    fn test_conditional_with_known_test() {
        let mut b = AstBuilder::new();
        let test = b.bool(true);
        let yes = b.name("yes");
        let no = b.name("no");
        let expr = b.conditional(test, yes, no);
        let (output, interner) = lower_expr_stmt(b, expr);
        let yes = interner.get("yes").expect("interned");
        assert_eq!(value(&output).kind, NodeKind::Name(yes));
    }

    #[test]
    fn test_array_holes_and_spread() {
        let mut b = AstBuilder::new();
        let one = b.num(1.0);
        let rest = b.name("rest");
        let spread = b.spread_array(rest);
        let expr = match b.array(vec![Some(one), None]) {
            Expression::Array(mut array) => {
                if let Expression::Array(spread) = spread {
                    array.elements.extend(spread.elements);
                }
                Expression::Array(array)
            }
            other => other,
        };
        let (output, _) = lower_expr_stmt(b, expr);

        let array = value(&output);
        assert_eq!(array.kind, NodeKind::ArrayLit);
        assert_eq!(array.children.len(), 2);
        assert_eq!(array.prop(PropKey::SkipIndexes), Some(&PropValue::IntList(vec![1])));
        assert!(array.has_prop(PropKey::HasSpread));
    }

    #[test]
    fn test_string_spread_expands_code_points() {
        let b = AstBuilder::new();
        let s = b.str("ab");
        let expr = b.spread_array(s);
        let (output, _) = lower_expr_stmt(b, expr);

        let array = value(&output);
        let parts: Vec<_> = array.children.iter().filter_map(|c| c.string_value()).collect();
        assert_eq!(parts, vec!["a", "b"]);
        assert!(!array.has_prop(PropKey::HasSpread));
    }

    #[test]
    fn test_eval_call_is_special() {
        let mut b = AstBuilder::new();
        let eval = b.name("eval");
        let code = b.str("1");
        let expr = b.call(eval, vec![code]);
        let (output, _) = lower_expr_stmt(b, expr);

        let call = value(&output);
        assert_eq!(call.kind, NodeKind::Call);
        assert_eq!(
            call.prop(PropKey::SpecialCall),
            Some(&PropValue::Special(SpecialCall::Eval))
        );
        assert!(output.script.root().expect("root").requires_activation);
    }

    #[test]
    fn test_with_call_and_new_eval_are_special() {
        let mut b = AstBuilder::new();
        let with = b.name("With");
        let o = b.name("o");
        let call = b.call(with, vec![o]);
        let eval = b.name("eval");
        let new = b.new_expr(eval, vec![]);
        let stmts = vec![b.expr_stmt(call), b.expr_stmt(new)];
        let script = b.script(stmts);
        let mut interner = b.into_interner();
        let output = crate::lower_script(&script, &mut interner, &LowerOptions::default()).expect("lowering failed");

        let root = output.script.root().expect("root");
        assert!(root.requires_activation);
        let calls = root.body.find_all(|n| n.kind == NodeKind::Call);
        assert_eq!(calls[0].prop(PropKey::SpecialCall), Some(&PropValue::Special(SpecialCall::With)));
        let news = root.body.find_all(|n| n.kind == NodeKind::New);
        assert_eq!(news[0].prop(PropKey::SpecialCall), Some(&PropValue::Special(SpecialCall::Eval)));
    }

    #[test]
    fn test_plain_call_is_not_special() {
        let mut b = AstBuilder::new();
        let f = b.name("with");
        let expr = b.call(f, vec![]);
        let (output, _) = lower_expr_stmt(b, expr);

        assert!(!value(&output).has_prop(PropKey::SpecialCall));
        assert!(!output.script.root().expect("root").requires_activation);
    }

    #[test]
    fn test_typeof_name() {
        let mut b = AstBuilder::new();
        let x = b.name("x");
        let expr = b.unary(UnaryOperator::Typeof, x);
        let (output, interner) = lower_expr_stmt(b, expr);
        let x = interner.get("x").expect("interned");
        assert_eq!(value(&output).kind, NodeKind::TypeofName(x));
    }

    #[test]
    fn test_arguments_forces_activation() {
        let mut b = AstBuilder::new();
        let arguments = b.name("arguments");
        let stmt = b.expr_stmt(arguments);
        let func = b.function_decl("f", &[], vec![stmt]);
        let script = b.script(vec![func]);
        let (output, _) = lower_with(b, &script, &LowerOptions::default());

        let f = output.script.function(crate::ir::FunctionId(1)).expect("f");
        assert!(f.requires_activation);
    }

    #[test]
    fn test_object_literal_accessor() {
        let mut b = AstBuilder::new();
        let getter = b.function_expr(None, &[], vec![]);
        let one = b.num(1.0);
        let expr = match b.object(vec![("a", one), ("b", getter)]) {
            Expression::Object(mut object) => {
                if let Some(ObjectProperty::Property(prop)) = object.properties.get_mut(1) {
                    prop.kind = PropertyKind::Get;
                }
                Expression::Object(object)
            }
            other => other,
        };
        let (output, _) = lower_expr_stmt(b, expr);

        let object = value(&output);
        assert_eq!(object.kind, NodeKind::ObjectLit);
        assert_eq!(object.children.len(), 2);
        assert_eq!(object.children[0].kind, NodeKind::ObjectProperty { computed: false });
        assert_eq!(object.children[0].children[0].string_value(), Some("a"));
        assert_eq!(object.children[1].children[1].kind, NodeKind::Unary(UnaryOp::Get));
    }

    #[test]
    fn test_generator_expression() {
        let mut b = AstBuilder::new();
        let x = b.name("x");
        let target = b.pat("x");
        let xs = b.name("xs");
        let span = b.span();
        let expr = Expression::GeneratorExpr(ast::GeneratorExpression {
            result: Box::new(x),
            loops: vec![ast::GeneratorLoop {
                target,
                iterated: xs,
                is_of: true,
                span,
            }],
            filter: None,
            span,
        });
        let (output, _) = lower_expr_stmt(b, expr);

        let call = value(&output);
        assert_eq!(call.kind, NodeKind::Call);
        let NodeKind::Function(id) = call.children[0].kind else {
            panic!("expected a function callee");
        };
        let generator = output.script.function(id).expect("generator");
        assert!(generator.is_generator);
        assert!(generator.requires_activation);
        assert_eq!(generator.body.count(|n| matches!(n.kind, NodeKind::Yield { .. })), 1);
        assert_eq!(
            generator.body.count(|n| matches!(
                n.kind,
                NodeKind::EnumInit {
                    mode: EnumMode::ValuesInOrder,
                    ..
                }
            )),
            1
        );
        assert!(generator.validate().is_ok());
    }
}
