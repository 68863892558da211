//! Destructuring
//!
//! A destructuring assignment or binding becomes a `LetExpr` that holds the
//! right-hand side in a temporary and assigns each target from it in order:
//!
//! ```text
//! [a, b = 1] = rhs
//!   =>  LetExpr $0 [rhs, Comma [a = $0[0], b = (LetExpr $1 [$0[1], $1 === undefined ? 1 : $1]), $0]]
//! ```

use super::Lowerer;
use crate::error::{LowerError, LowerResult, LoweringDiagnostic};
use crate::ir::{BinaryOp, IrNode, NodeKind, PropKey, PropValue};
use kiln_syntax::ast::{Expression, Pattern, PropertyKey};
use kiln_syntax::Symbol;

impl<'a> Lowerer<'a> {
    /// Assign the parts of `value` to the targets of `pattern`
    pub(super) fn destructure(
        &mut self,
        pattern: &Pattern,
        value: IrNode,
        is_const: bool,
        line: u32,
    ) -> LowerResult<IrNode> {
        let temp = self.new_temp("$");
        let mut steps = Vec::new();
        self.destructure_into(pattern, temp, is_const, &mut steps, line)?;
        steps.push(IrNode::name(temp, line));

        let body = IrNode::with_children(NodeKind::Comma, steps, line);
        let mut node = IrNode::binary(NodeKind::LetExpr(temp), value, body, line);

        let names: Vec<Symbol> = pattern.bound_names().iter().map(|id| id.name).collect();
        node.set_prop(PropKey::DestructuringNames, PropValue::Names(names));
        if let Pattern::Array(array) = pattern {
            node.set_prop(
                PropKey::DestructuringArrayLength,
                PropValue::Int(array.elements.len() as i64),
            );
            let holes: Vec<u32> = array
                .elements
                .iter()
                .enumerate()
                .filter(|(_, element)| element.is_none())
                .map(|(i, _)| i as u32)
                .collect();
            if !holes.is_empty() {
                node.set_prop(PropKey::SkipIndexes, PropValue::IntList(holes));
            }
        }
        Ok(node)
    }

    fn destructure_into(
        &mut self,
        pattern: &Pattern,
        source: Symbol,
        is_const: bool,
        steps: &mut Vec<IrNode>,
        line: u32,
    ) -> LowerResult<()> {
        match pattern {
            Pattern::Array(array) => {
                for (index, element) in array.elements.iter().enumerate() {
                    let Some(element) = element else { continue };
                    let value = IrNode::binary(
                        NodeKind::GetElem,
                        IrNode::name(source, line),
                        IrNode::number(index as f64, line),
                        line,
                    );
                    self.bind_target(&element.target, value, element.default.as_ref(), is_const, steps, line)?;
                }
                if let Some(rest) = &array.rest {
                    let value = IrNode::unary(
                        NodeKind::ArrayRest {
                            from: array.elements.len() as u32,
                        },
                        IrNode::name(source, line),
                        line,
                    );
                    self.bind_target(rest, value, None, is_const, steps, line)?;
                }
            }
            Pattern::Object(object) => {
                // Keys already taken, for the rest element
                let mut taken = Vec::new();
                for prop in &object.properties {
                    let value = match &prop.key {
                        PropertyKey::Identifier(id) => {
                            let key = self.resolve(id.name).to_string();
                            taken.push(IrNode::string(key.clone(), line));
                            Self::get_prop(source, key, line)
                        }
                        PropertyKey::String(s) => {
                            taken.push(IrNode::string(s.value.clone(), line));
                            Self::get_prop(source, s.value.clone(), line)
                        }
                        PropertyKey::Number(n) => {
                            taken.push(IrNode::number(n.value, line));
                            IrNode::binary(
                                NodeKind::GetElem,
                                IrNode::name(source, line),
                                IrNode::number(n.value, line),
                                line,
                            )
                        }
                        PropertyKey::Computed(expr) => {
                            let key = self.lower_expr(expr)?;
                            // The key runs before an expression target's own operands,
                            // and the rest element needs it again
                            let reused = object.rest.is_some();
                            let key = if reused || matches!(prop.value, Pattern::Expression(_)) {
                                let key_temp = self.new_temp("$");
                                steps.push(Self::bind_name(key_temp, key, false, line));
                                if reused {
                                    taken.push(IrNode::name(key_temp, line));
                                }
                                IrNode::name(key_temp, line)
                            } else {
                                key
                            };
                            IrNode::binary(NodeKind::GetElem, IrNode::name(source, line), key, line)
                        }
                    };
                    self.bind_target(&prop.value, value, prop.default.as_ref(), is_const, steps, line)?;
                }
                if let Some(rest) = &object.rest {
                    let mut children = vec![IrNode::name(source, line)];
                    children.extend(taken);
                    let value = IrNode::with_children(NodeKind::ObjectRest, children, line);
                    self.bind_target(rest, value, None, is_const, steps, line)?;
                }
            }
            Pattern::Identifier(_) | Pattern::Expression(_) => {
                return Err(LowerError::internal("destructuring a non-pattern target"));
            }
        }
        Ok(())
    }

    fn get_prop(source: Symbol, key: String, line: u32) -> IrNode {
        IrNode::binary(
            NodeKind::GetProp,
            IrNode::name(source, line),
            IrNode::string(key, line),
            line,
        )
    }

    /// Assign `value` (or `default` when it is undefined) to one target
    fn bind_target(
        &mut self,
        target: &Pattern,
        value: IrNode,
        default: Option<&Expression>,
        is_const: bool,
        steps: &mut Vec<IrNode>,
        line: u32,
    ) -> LowerResult<()> {
        let value = match default {
            Some(default) => {
                let temp = self.new_temp("$");
                let test = IrNode::binary(
                    NodeKind::Binary(BinaryOp::ShEq),
                    IrNode::name(temp, line),
                    IrNode::new(NodeKind::Undefined, line),
                    line,
                );
                let fallback = self.lower_expr(default)?;
                let choice = IrNode::with_children(
                    NodeKind::Hook,
                    vec![test, fallback, IrNode::name(temp, line)],
                    line,
                );
                IrNode::binary(NodeKind::LetExpr(temp), value, choice, line)
            }
            None => value,
        };

        match target {
            Pattern::Identifier(id) => steps.push(Self::bind_name(id.name, value, is_const, line)),
            Pattern::Array(_) | Pattern::Object(_) => {
                steps.push(self.destructure(target, value, is_const, line)?);
            }
            Pattern::Expression(expr) => match self.make_reference(expr)? {
                Some(reference) => steps.push(Self::assign_reference(reference, value, line)),
                None => self.report(LoweringDiagnostic::BadAssignLeft { span: *expr.span() }),
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::SymbolKind;
    use crate::options::LowerOptions;
    use crate::LowerOutput;
    use kiln_syntax::ast::{Script, VariableKind};
    use kiln_syntax::{AstBuilder, Interner};

    fn lower(b: AstBuilder, script: &Script) -> (LowerOutput, Interner) {
        let mut interner = b.into_interner();
        let output = crate::lower_script(script, &mut interner, &LowerOptions::default()).expect("lowering failed");
        (output, interner)
    }

    #[test]
    fn test_array_destructuring_declaration() {
        let mut b = AstBuilder::new();
        let a = b.pat("a");
        let c = b.pat("c");
        let pattern = b.pat_array(vec![Some(a), None, Some(c)]);
        let pair = b.name("pair");
        let decl = b.var_decl(VariableKind::Let, pattern, Some(pair));
        let script = b.script(vec![kiln_syntax::ast::Statement::VariableDecl(decl)]);
        let (output, interner) = lower(b, &script);

        assert!(!output.has_errors());
        let root = output.script.root().expect("root");
        let lets = root.body.find_all(|n| matches!(n.kind, NodeKind::LetExpr(_)));
        assert_eq!(lets.len(), 1);
        let node = lets[0];
        assert_eq!(node.prop(PropKey::DestructuringArrayLength), Some(&PropValue::Int(3)));
        assert_eq!(node.prop(PropKey::SkipIndexes), Some(&PropValue::IntList(vec![1])));

        let a = interner.get("a").expect("a");
        let c = interner.get("c").expect("c");
        assert_eq!(node.prop(PropKey::DestructuringNames), Some(&PropValue::Names(vec![a, c])));

        // Two element reads: indexes 0 and 2
        let reads: Vec<f64> = node
            .find_all(|n| n.kind == NodeKind::GetElem)
            .iter()
            .filter_map(|n| n.children[1].number_value())
            .collect();
        assert_eq!(reads, vec![0.0, 2.0]);
        assert_eq!(node.count(|n| n.kind == NodeKind::SetName), 2);

        // The temporary is a function-level symbol
        let temps = root.symbols.iter().filter(|s| s.kind == SymbolKind::Temp).count();
        assert_eq!(temps, 1);
    }

    #[test]
    fn test_const_destructuring_uses_set_const() {
        let mut b = AstBuilder::new();
        let x = b.pat("x");
        let pattern = b.pat_object(vec![("x", x)]);
        let o = b.name("o");
        let decl = b.var_decl(VariableKind::Const, pattern, Some(o));
        let script = b.script(vec![kiln_syntax::ast::Statement::VariableDecl(decl)]);
        let (output, _) = lower(b, &script);

        let root = output.script.root().expect("root");
        assert_eq!(root.body.count(|n| n.kind == NodeKind::SetConst), 1);
        assert_eq!(root.body.count(|n| n.kind == NodeKind::GetProp), 1);
    }

    #[test]
    fn test_compound_destructuring_is_rejected() {
        let mut b = AstBuilder::new();
        let a = b.pat("a");
        let pattern = b.pat_array(vec![Some(a)]);
        let v = b.name("v");
        let assign = b.assign_op(kiln_syntax::ast::AssignmentOperator::AddAssign, pattern, v);
        let stmt = b.expr_stmt(assign);
        let script = b.script(vec![stmt]);
        let (output, _) = lower(b, &script);

        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].message_code(), "msg.bad.destruct.op");
    }

    #[test]
    fn test_nested_pattern_with_default() {
        let mut b = AstBuilder::new();
        let inner_x = b.pat("x");
        let inner = b.pat_array(vec![Some(inner_x)]);
        let mut pattern = b.pat_array(vec![Some(inner)]);
        let one = b.num(1.0);
        if let Pattern::Array(array) = &mut pattern {
            if let Some(Some(element)) = array.elements.get_mut(0) {
                element.default = Some(one);
            }
        }
        let src = b.name("src");
        let assign = b.assign(pattern, src);
        let stmt = b.expr_stmt(assign);
        let script = b.script(vec![stmt]);
        let (output, _) = lower(b, &script);

        assert!(!output.has_errors());
        let body = &output.script.root().expect("root").body;
        // Outer temp, default temp, inner temp
        assert_eq!(body.count(|n| matches!(n.kind, NodeKind::LetExpr(_))), 3);
        assert_eq!(body.count(|n| n.kind == NodeKind::Hook), 1);
        assert_eq!(body.count(|n| n.kind == NodeKind::Undefined), 1);
    }
}
