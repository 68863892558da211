//! Function, class and decorator lowering

use super::Lowerer;
use crate::error::{LowerResult, LoweringDiagnostic};
use crate::ir::{
    BinaryOp, ClassMemberKind, DecoratorName, FunctionId, IrFunction, IrNode, NodeKind, PropKey, PropValue,
    SymbolKind,
};
use kiln_syntax::ast::{
    BlockStatement, ClassField, ClassMember, ClassMethod, ClassNode, Decorator, DecoratorDecl,
    DecoratorKind, FunctionBody, FunctionKind, FunctionNode, Identifier, Parameter, Pattern,
    VariableKind,
};
use log::trace;

impl<'a> Lowerer<'a> {
    pub(super) fn lower_function_decl(&mut self, func: &FunctionNode) -> LowerResult<IrNode> {
        if let Some(name) = &func.name {
            self.declare(name.name, SymbolKind::Function, name.span);
        }
        let id = self.lower_function(func)?;
        Ok(IrNode::new(NodeKind::Function(id), func.span.line))
    }

    /// Lower a function literal into its own table entry
    pub(super) fn lower_function(&mut self, func: &FunctionNode) -> LowerResult<FunctionId> {
        let name = func.name.as_ref().map(|n| n.name);
        let id = self.enter_function(name);
        let mut ir = self.new_ir_function(id, func);
        let body = self.lower_function_body(func, &mut ir, Vec::new())?;
        self.exit_function(ir, body, func.span.line)
    }

    fn new_ir_function(&self, id: FunctionId, func: &FunctionNode) -> IrFunction {
        let mut ir = IrFunction::new(id, func.name.as_ref().map(|n| n.name), Some(func.kind));
        ir.is_generator = func.is_generator;
        if self.options.generate_source {
            ir.source_span = func.span;
        }
        ir
    }

    /// Parameters and body of the current function. `leading` runs after the
    /// parameter prologue and before the body statements.
    fn lower_function_body(
        &mut self,
        func: &FunctionNode,
        ir: &mut IrFunction,
        leading: Vec<IrNode>,
    ) -> LowerResult<Vec<IrNode>> {
        let line = func.span.line;
        let mut prologue = Vec::new();
        for param in &func.params {
            self.lower_param(param, ir, &mut prologue)?;
        }
        prologue.extend(leading);

        let mut body = match &func.body {
            FunctionBody::Block(block) => self.lower_statements(&block.statements)?,
            FunctionBody::Expression(expr) => {
                let value = self.lower_expr(expr)?;
                vec![IrNode::unary(NodeKind::Return { unwinds: Vec::new() }, value, expr.span().line)]
            }
        };
        if !matches!(body.last().map(|n| &n.kind), Some(NodeKind::Return { .. })) {
            body.push(IrNode::new(NodeKind::Return { unwinds: Vec::new() }, line));
        }

        // A named function expression can refer to itself unless a local hides the name
        let mut children = Vec::with_capacity(prologue.len() + body.len() + 1);
        if func.kind == FunctionKind::Expression {
            if let Some(name) = &func.name {
                if !self.ctx.is_declared(name.name) {
                    let this_fn = IrNode::new(NodeKind::ThisFn, line);
                    children.push(IrNode::unary(
                        NodeKind::ExprVoid,
                        Self::bind_name(name.name, this_fn, false, line),
                        line,
                    ));
                }
            }
        }
        children.extend(prologue);
        children.extend(body);
        Ok(children)
    }

    fn lower_param(&mut self, param: &Parameter, ir: &mut IrFunction, prologue: &mut Vec<IrNode>) -> LowerResult<()> {
        let line = param.span.line;
        let name = match &param.pattern {
            Pattern::Identifier(id) => id.name,
            Pattern::Array(_) | Pattern::Object(_) => self.synthetic_name("$param"),
            Pattern::Expression(expr) => {
                self.report(LoweringDiagnostic::BadAssignLeft { span: *expr.span() });
                self.synthetic_name("$param")
            }
        };
        self.declare(name, SymbolKind::Param, param.span);
        ir.params.push(name);
        ir.has_rest |= param.rest;

        if let Some(default) = &param.default {
            // p = p === undefined ? default : p
            let test = IrNode::binary(
                NodeKind::Binary(BinaryOp::ShEq),
                IrNode::name(name, line),
                IrNode::new(NodeKind::Undefined, line),
                line,
            );
            let fallback = self.lower_expr(default)?;
            let value = IrNode::with_children(
                NodeKind::Hook,
                vec![test, fallback, IrNode::name(name, line)],
                line,
            );
            prologue.push(IrNode::unary(
                NodeKind::ExprVoid,
                Self::bind_name(name, value, false, line),
                line,
            ));
        }

        if param.pattern.is_destructuring() {
            for id in param.pattern.bound_names() {
                self.declare(id.name, SymbolKind::Param, id.span);
            }
            let value = self.destructure(&param.pattern, IrNode::name(name, line), false, line)?;
            prologue.push(IrNode::unary(NodeKind::ExprVoid, value, line));
        }
        Ok(())
    }

    // ========================================================================
    // Classes
    // ========================================================================

    pub(super) fn lower_class_decl(&mut self, class: &ClassNode) -> LowerResult<IrNode> {
        let line = class.span.line;
        let Some(name) = &class.name else {
            let value = self.lower_class(class)?;
            return Ok(IrNode::unary(NodeKind::ExprVoid, value, line));
        };
        self.declare(name.name, SymbolKind::Let, name.span);
        let value = self.lower_class(class)?;
        Ok(IrNode::unary(
            NodeKind::VarDecl(VariableKind::Let),
            Self::bind_name(name.name, value, false, line),
            line,
        ))
    }

    /// `Class [Function(ctor), heritage?, ClassMember..., Decorator...]`
    ///
    /// Instance fields are evaluated in the enclosing function; methods and
    /// static fields belong to the constructor.
    pub(super) fn lower_class(&mut self, class: &ClassNode) -> LowerResult<IrNode> {
        let line = class.span.line;
        let name = class.name.as_ref().map(|n| n.name);
        trace!("lowering class with {} members at line {}", class.members.len(), line);

        let heritage = match &class.heritage {
            Some(heritage) => Some(self.lower_expr(heritage)?),
            None => None,
        };

        let mut class_initializers = Vec::new();
        let mut decorators = Vec::new();
        for decorator in &class.decorators {
            let node = self.lower_decorator(decorator)?;
            if decorator.kind == DecoratorKind::Initialize {
                class_initializers.push(node);
            } else {
                decorators.push(node);
            }
        }

        // `@initialize` decorators of each member, in member order
        let mut member_initializers: Vec<Vec<IrNode>> = vec![Vec::new(); class.members.len()];
        let mut instance_fields = Vec::with_capacity(class.members.len());
        for (member, inits) in class.members.iter().zip(member_initializers.iter_mut()) {
            instance_fields.push(match member {
                ClassMember::Field(field) if !field.is_static => Some(self.lower_field(field, inits)?),
                _ => None,
            });
        }

        let synthesized;
        let constructor = match &class.constructor {
            Some(constructor) => constructor,
            None => {
                synthesized = self.default_constructor(class);
                &synthesized
            }
        };
        let leading = if class.constructor.is_none() && heritage.is_some() {
            vec![self.generated_super_call(line)]
        } else {
            Vec::new()
        };

        let ctor_id = self.enter_function(name);
        let mut ctor = self.new_ir_function(ctor_id, constructor);
        ctor.name = name;
        ctor.kind = Some(FunctionKind::Constructor);
        let body = self.lower_function_body(constructor, &mut ctor, leading)?;

        let mut members = Vec::with_capacity(class.members.len());
        let lowered_members = class.members.iter().zip(instance_fields).zip(member_initializers.iter_mut());
        for ((member, lowered), inits) in lowered_members {
            let node = match (member, lowered) {
                (_, Some(node)) => node,
                (ClassMember::Method(method), None) => self.lower_method(method, inits)?,
                (ClassMember::Field(field), None) => self.lower_field(field, inits)?,
            };
            members.push(node);
        }
        ctor.initializers = Self::initializer_order(&class.members, member_initializers, class_initializers);
        let ctor_id = self.exit_function(ctor, body, line)?;

        let mut children = vec![IrNode::new(NodeKind::Function(ctor_id), line)];
        children.extend(heritage);
        children.extend(members);
        children.extend(decorators);
        Ok(IrNode::with_children(NodeKind::Class { name }, children, line))
    }

    /// Methods' initializers first, then fields', then the class's own
    fn initializer_order(
        members: &[ClassMember],
        per_member: Vec<Vec<IrNode>>,
        class_level: Vec<IrNode>,
    ) -> Vec<IrNode> {
        let mut methods = Vec::new();
        let mut fields = Vec::new();
        for (member, inits) in members.iter().zip(per_member) {
            match member {
                ClassMember::Method(_) => methods.extend(inits),
                ClassMember::Field(_) => fields.extend(inits),
            }
        }
        methods.extend(fields);
        methods.extend(class_level);
        methods
    }

    /// `constructor() {}`, or `constructor(...args) { super(...args) }` for a derived class
    fn default_constructor(&mut self, class: &ClassNode) -> FunctionNode {
        let span = class.span;
        let params = if class.heritage.is_some() {
            let args = self.interner.intern("args");
            vec![Parameter {
                pattern: Pattern::Identifier(Identifier::new(args, span)),
                default: None,
                rest: true,
                span,
            }]
        } else {
            Vec::new()
        };
        FunctionNode {
            name: class.name.clone(),
            params,
            body: FunctionBody::Block(BlockStatement {
                statements: Vec::new(),
                span,
            }),
            kind: FunctionKind::Constructor,
            is_generator: false,
            span,
        }
    }

    fn generated_super_call(&mut self, line: u32) -> IrNode {
        let args = self.interner.intern("args");
        let spread = IrNode::unary(NodeKind::Spread, IrNode::name(args, line), line);
        let call = IrNode::binary(NodeKind::Call, IrNode::new(NodeKind::Super, line), spread, line)
            .with_prop(PropKey::GeneratedSuper, PropValue::Flag)
            .with_prop(PropKey::HasSpread, PropValue::Flag);
        IrNode::unary(NodeKind::ExprVoid, call, line)
    }

    fn lower_method(&mut self, method: &ClassMethod, initializers: &mut Vec<IrNode>) -> LowerResult<IrNode> {
        let line = method.span.line;
        let kind = match method.function.kind {
            FunctionKind::Getter => ClassMemberKind::Getter,
            FunctionKind::Setter => ClassMemberKind::Setter,
            _ => ClassMemberKind::Method,
        };
        let (key, _) = self.lower_property_key(&method.key)?;
        let id = self.lower_function(&method.function)?;

        let mut node = IrNode::with_children(
            NodeKind::ClassMember {
                kind,
                is_static: method.is_static,
            },
            vec![key, IrNode::new(NodeKind::Function(id), line)],
            line,
        );
        self.lower_member_decorators(&method.decorators, &mut node, initializers)?;
        Ok(node)
    }

    fn lower_field(&mut self, field: &ClassField, initializers: &mut Vec<IrNode>) -> LowerResult<IrNode> {
        let line = field.span.line;
        let (key, _) = self.lower_property_key(&field.key)?;
        let value = match &field.value {
            Some(value) => self.lower_expr(value)?,
            None => IrNode::new(NodeKind::Undefined, line),
        };

        let mut node = IrNode::binary(
            NodeKind::ClassMember {
                kind: ClassMemberKind::Field,
                is_static: field.is_static,
            },
            key,
            value,
            line,
        );
        self.lower_member_decorators(&field.decorators, &mut node, initializers)?;
        Ok(node)
    }

    fn lower_member_decorators(
        &mut self,
        decorators: &[Decorator],
        member: &mut IrNode,
        initializers: &mut Vec<IrNode>,
    ) -> LowerResult<()> {
        for decorator in decorators {
            let node = self.lower_decorator(decorator)?;
            if decorator.kind == DecoratorKind::Initialize {
                initializers.push(node);
            } else {
                member.push(node);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Decorators
    // ========================================================================

    fn lower_decorator(&mut self, decorator: &Decorator) -> LowerResult<IrNode> {
        let name = match &decorator.kind {
            DecoratorKind::Wrap => DecoratorName::Wrap,
            DecoratorKind::Register => DecoratorName::Register,
            DecoratorKind::Initialize => DecoratorName::Initialize,
            DecoratorKind::NumericTemplate => DecoratorName::NumericTemplate,
            DecoratorKind::User(id) => DecoratorName::User(id.name),
        };
        let arguments = decorator
            .arguments
            .iter()
            .map(|arg| self.lower_expr(arg))
            .collect::<LowerResult<Vec<_>>>()?;
        Ok(IrNode::with_children(NodeKind::Decorator(name), arguments, decorator.span.line))
    }

    pub(super) fn lower_decorator_decl(&mut self, decl: &DecoratorDecl) -> LowerResult<IrNode> {
        let line = decl.span.line;
        let numeric = decl
            .decorators
            .iter()
            .any(|d| d.kind == DecoratorKind::NumericTemplate);
        // A numeric template decorator stands alone
        if numeric && decl.decorators.len() > 1 {
            let name = self.resolve(decl.name.name).to_string();
            self.report(LoweringDiagnostic::NumericTemplateMixed { name, span: decl.span });
        }
        self.declare(decl.name.name, SymbolKind::Const, decl.name.span);

        let decorators = decl
            .decorators
            .iter()
            .map(|d| self.lower_decorator(d))
            .collect::<LowerResult<Vec<_>>>()?;
        Ok(IrNode::with_children(NodeKind::DecoratorDecl(decl.name.name), decorators, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LowerOptions;
    use crate::LowerOutput;
    use kiln_syntax::ast::{Expression, Statement};
    use kiln_syntax::{AstBuilder, Interner, Span};

    fn lower(b: AstBuilder, statements: Vec<Statement>) -> (LowerOutput, Interner) {
        let script = b.script(statements);
        let mut interner = b.into_interner();
        let output = crate::lower_script(&script, &mut interner, &LowerOptions::default()).expect("lowering failed");
        (output, interner)
    }

    fn class(b: &mut AstBuilder, name: &str, heritage: Option<Expression>, members: Vec<ClassMember>) -> ClassNode {
        ClassNode {
            name: Some(b.ident(name)),
            heritage,
            constructor: None,
            members,
            decorators: Vec::new(),
            span: b.span(),
        }
    }

    #[test]
    fn test_function_gets_implicit_return() {
        let mut b = AstBuilder::new();
        let one = b.num(1.0);
        let stmt = b.expr_stmt(one);
        let f = b.function_decl("f", &["a", "b"], vec![stmt]);
        let (output, interner) = lower(b, vec![f]);

        assert_eq!(output.script.function_count(), 2);
        let root = output.script.root().expect("root");
        assert_eq!(root.nested, vec![FunctionId(1)]);
        assert!(root.requires_activation);
        let f_sym = interner.get("f").expect("f");
        assert_eq!(root.symbols.lookup(f_sym).map(|s| s.kind), Some(SymbolKind::Function));

        let f = output.script.function(FunctionId(1)).expect("f");
        assert_eq!(f.param_count(), 2);
        let last = f.body.children.last().expect("statement");
        assert_eq!(last.kind, NodeKind::Return { unwinds: vec![] });
        // Statements inside functions discard their value
        assert_eq!(f.body.children[0].kind, NodeKind::ExprVoid);
    }

    #[test]
    fn test_named_function_expression_binds_itself() {
        let mut b = AstBuilder::new();
        let f = b.function_expr(Some("fact"), &["n"], vec![]);
        let stmt = b.expr_stmt(f);
        let (output, _) = lower(b, vec![stmt]);

        let f = output.script.function(FunctionId(1)).expect("fact");
        let first = &f.body.children[0];
        assert_eq!(first.kind, NodeKind::ExprVoid);
        assert_eq!(first.children[0].kind, NodeKind::SetName);
        assert_eq!(first.children[0].children[1].kind, NodeKind::ThisFn);
    }

    #[test]
    fn test_self_binding_skipped_when_shadowed() {
        let mut b = AstBuilder::new();
        let f = b.function_expr(Some("g"), &["g"], vec![]);
        let stmt = b.expr_stmt(f);
        let (output, _) = lower(b, vec![stmt]);

        let g = output.script.function(FunctionId(1)).expect("g");
        assert_eq!(g.body.count(|n| n.kind == NodeKind::ThisFn), 0);
    }

    #[test]
    fn test_arrow_expression_body_returns() {
        let mut b = AstBuilder::new();
        let x = b.name("x");
        let arrow = b.arrow(&["x"], x);
        let stmt = b.expr_stmt(arrow);
        let (output, _) = lower(b, vec![stmt]);

        let arrow = output.script.function(FunctionId(1)).expect("arrow");
        assert_eq!(arrow.body.children.len(), 1);
        let ret = &arrow.body.children[0];
        assert!(matches!(ret.kind, NodeKind::Return { .. }));
        assert_eq!(ret.children.len(), 1);
    }

    #[test]
    fn test_parameter_default() {
        let mut b = AstBuilder::new();
        let mut f = b.function(Some("f"), &["a"], vec![]);
        f.kind = FunctionKind::Declaration;
        f.params[0].default = Some(b.num(5.0));
        let (output, _) = lower(b, vec![Statement::FunctionDecl(Box::new(f))]);

        let f = output.script.function(FunctionId(1)).expect("f");
        assert_eq!(f.body.count(|n| n.kind == NodeKind::Hook), 1);
        assert_eq!(f.body.count(|n| n.kind == NodeKind::Undefined), 1);
        assert_eq!(f.body.count(|n| n.number_value() == Some(5.0)), 1);
    }

    #[test]
    fn test_destructuring_parameter() {
        let mut b = AstBuilder::new();
        let mut f = b.function(Some("f"), &[], vec![]);
        f.kind = FunctionKind::Declaration;
        let x = b.pat("x");
        let y = b.pat("y");
        f.params.push(Parameter {
            pattern: b.pat_array(vec![Some(x), Some(y)]),
            default: None,
            rest: false,
            span: Span::default(),
        });
        let (output, interner) = lower(b, vec![Statement::FunctionDecl(Box::new(f))]);

        let f = output.script.function(FunctionId(1)).expect("f");
        assert_eq!(f.param_count(), 1);
        assert!(interner.resolve(f.params[0]).starts_with("$param"));
        assert!(interner.is_generated(f.params[0]));
        let x = interner.get("x").expect("x");
        assert_eq!(f.symbols.lookup(x).map(|s| s.kind), Some(SymbolKind::Param));
        assert_eq!(f.body.count(|n| matches!(n.kind, NodeKind::LetExpr(_))), 1);
    }

    #[test]
    fn test_derived_class_default_constructor() {
        let mut b = AstBuilder::new();
        let base = b.name("Base");
        let class = class(&mut b, "Derived", Some(base), Vec::new());
        let (output, interner) = lower(b, vec![Statement::ClassDecl(Box::new(class))]);

        let root = output.script.root().expect("root");
        let classes = root.body.find_all(|n| matches!(n.kind, NodeKind::Class { .. }));
        assert_eq!(classes.len(), 1);
        let NodeKind::Function(ctor_id) = classes[0].children[0].kind else {
            panic!("constructor first");
        };

        let ctor = output.script.function(ctor_id).expect("ctor");
        assert_eq!(ctor.kind, Some(FunctionKind::Constructor));
        assert!(ctor.has_rest);
        assert_eq!(interner.resolve(ctor.params[0]), "args");
        let supers = ctor.body.find_all(|n| n.has_prop(PropKey::GeneratedSuper));
        assert_eq!(supers.len(), 1);
        assert_eq!(supers[0].children[0].kind, NodeKind::Super);
    }

    #[test]
    fn test_base_class_default_constructor_has_no_super() {
        let mut b = AstBuilder::new();
        let class = class(&mut b, "Plain", None, Vec::new());
        let (output, _) = lower(b, vec![Statement::ClassDecl(Box::new(class))]);

        let ctor = output.script.function(FunctionId(1)).expect("ctor");
        assert!(ctor.params.is_empty());
        assert_eq!(ctor.body.count(|n| n.kind == NodeKind::Super), 0);
    }

    #[test]
    fn test_class_members_and_initializer_decorators() {
        let mut b = AstBuilder::new();
        let method_fn = {
            let mut f = b.function(None, &[], vec![]);
            f.kind = FunctionKind::Method;
            f
        };
        let span = b.span();
        let method = ClassMember::Method(ClassMethod {
            key: kiln_syntax::ast::PropertyKey::Identifier(b.ident("run")),
            function: method_fn,
            is_static: false,
            decorators: vec![Decorator {
                kind: DecoratorKind::Wrap,
                arguments: Vec::new(),
                span,
            }],
            span,
        });
        let field = ClassMember::Field(ClassField {
            key: kiln_syntax::ast::PropertyKey::Identifier(b.ident("count")),
            value: Some(b.num(0.0)),
            is_static: false,
            decorators: vec![Decorator {
                kind: DecoratorKind::Initialize,
                arguments: Vec::new(),
                span,
            }],
            span,
        });
        let class = class(&mut b, "Counter", None, vec![method, field]);
        let (output, _) = lower(b, vec![Statement::ClassDecl(Box::new(class))]);

        let root = output.script.root().expect("root");
        let class_node = root.body.find_all(|n| matches!(n.kind, NodeKind::Class { .. }))[0];
        // ctor, method, field
        assert_eq!(class_node.children.len(), 3);
        let method = &class_node.children[1];
        assert_eq!(
            method.kind,
            NodeKind::ClassMember {
                kind: ClassMemberKind::Method,
                is_static: false
            }
        );
        assert_eq!(method.children.len(), 3);
        assert_eq!(method.children[2].kind, NodeKind::Decorator(DecoratorName::Wrap));

        let field = &class_node.children[2];
        assert_eq!(field.children.len(), 2);

        // ctor is fn1, the method fn2 is nested in the constructor
        let ctor = output.script.function(FunctionId(1)).expect("ctor");
        assert_eq!(ctor.nested, vec![FunctionId(2)]);
        assert_eq!(ctor.initializers.len(), 1);
        assert_eq!(ctor.initializers[0].kind, NodeKind::Decorator(DecoratorName::Initialize));
    }

    #[test]
    fn test_initializers_list_methods_then_fields_then_class() {
        let mut b = AstBuilder::new();
        let span = b.span();
        let initialize = |b: &mut AstBuilder, tag: &str| Decorator {
            kind: DecoratorKind::Initialize,
            arguments: vec![b.str(tag)],
            span,
        };
        let field = |b: &mut AstBuilder, name: &str, is_static: bool| {
            let decorator = initialize(b, name);
            ClassMember::Field(ClassField {
                key: kiln_syntax::ast::PropertyKey::Identifier(b.ident(name)),
                value: None,
                is_static,
                decorators: vec![decorator],
                span,
            })
        };
        let first = field(&mut b, "first", false);
        let method = {
            let mut function = b.function(None, &[], vec![]);
            function.kind = FunctionKind::Method;
            let decorator = initialize(&mut b, "method");
            ClassMember::Method(ClassMethod {
                key: kiln_syntax::ast::PropertyKey::Identifier(b.ident("method")),
                function,
                is_static: false,
                decorators: vec![decorator],
                span,
            })
        };
        let shared = field(&mut b, "shared", true);
        let mut class = class(&mut b, "Mixed", None, vec![first, method, shared]);
        class.decorators.push(initialize(&mut b, "class"));
        let (output, _) = lower(b, vec![Statement::ClassDecl(Box::new(class))]);

        let ctor = output.script.function(FunctionId(1)).expect("ctor");
        let tags: Vec<&str> = ctor
            .initializers
            .iter()
            .filter_map(|d| d.children.first().and_then(|arg| arg.string_value()))
            .collect();
        assert_eq!(tags, vec!["method", "first", "shared", "class"]);
    }

    #[test]
    fn test_numeric_template_must_stand_alone() {
        let mut b = AstBuilder::new();
        let span = b.span();
        let decl = DecoratorDecl {
            name: b.ident("fmt"),
            decorators: vec![
                Decorator {
                    kind: DecoratorKind::NumericTemplate,
                    arguments: Vec::new(),
                    span,
                },
                Decorator {
                    kind: DecoratorKind::Wrap,
                    arguments: Vec::new(),
                    span,
                },
            ],
            span,
        };
        let (output, _) = lower(b, vec![Statement::DecoratorDecl(decl)]);

        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].message_code(), "msg.decorator.numeric.template");
    }
}
