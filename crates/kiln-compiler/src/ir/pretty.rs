//! Pretty-printing for IR
//!
//! Provides human-readable output for debugging lowered trees. One node per
//! line, children indented under their parent.

use super::function::{IrFunction, IrScript};
use super::node::{DecoratorName, IrNode, JumpKind, NodeKind, Unwind};
use super::props::PropValue;
use super::scope::ScopeTable;
use kiln_syntax::Interner;
use std::fmt::{self, Write};

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    fn write_pretty(&self, out: &mut String, interner: &Interner) -> fmt::Result;

    fn pretty_print(&self, interner: &Interner) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail
        let _ = self.write_pretty(&mut output, interner);
        output
    }
}

impl PrettyPrint for IrScript {
    fn write_pretty(&self, out: &mut String, interner: &Interner) -> fmt::Result {
        writeln!(out, "; script {}", self.name)?;
        writeln!(out)?;
        for func in &self.functions {
            func.write_pretty(out, interner)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

impl PrettyPrint for IrFunction {
    fn write_pretty(&self, out: &mut String, interner: &Interner) -> fmt::Result {
        let name = match self.name {
            Some(sym) => interner.resolve(sym).to_string(),
            None if self.is_script() => "<script>".to_string(),
            None => "<anonymous>".to_string(),
        };
        let params: Vec<&str> = self.params.iter().map(|&p| interner.resolve(p)).collect();
        write!(out, "{} {}({})", self.id, name, params.join(", "))?;
        if self.requires_activation {
            write!(out, " [activation]")?;
        }
        if self.is_generator {
            write!(out, " [generator]")?;
        }
        if self.strict {
            write!(out, " [strict]")?;
        }
        writeln!(out, " {{")?;

        if !self.symbols.is_empty() {
            writeln!(out, "  ; symbols: {}", describe_table(&self.symbols, interner))?;
        }
        if !self.nested.is_empty() {
            let nested: Vec<String> = self.nested.iter().map(|id| id.to_string()).collect();
            writeln!(out, "  ; nested: {}", nested.join(", "))?;
        }
        for init in &self.initializers {
            write_node(out, init, interner, 1)?;
        }
        write_node(out, &self.body, interner, 1)?;
        writeln!(out, "}}")
    }
}

impl PrettyPrint for IrNode {
    fn write_pretty(&self, out: &mut String, interner: &Interner) -> fmt::Result {
        write_node(out, self, interner, 0)
    }
}

fn write_node(out: &mut String, node: &IrNode, interner: &Interner, depth: usize) -> fmt::Result {
    let prefix = "  ".repeat(depth);
    write!(out, "{}{}", prefix, describe(node, interner))?;
    for (key, value) in node.props() {
        match value {
            PropValue::Flag => write!(out, " @{:?}", key)?,
            PropValue::Int(n) => write!(out, " @{:?}={}", key, n)?,
            PropValue::IntList(list) => write!(out, " @{:?}={:?}", key, list)?,
            PropValue::Names(names) => {
                let names: Vec<&str> = names.iter().map(|&n| interner.resolve(n)).collect();
                write!(out, " @{:?}=[{}]", key, names.join(", "))?
            }
            PropValue::Special(special) => write!(out, " @{:?}={:?}", key, special)?,
        }
    }
    writeln!(out, "  ; line {}", node.line)?;
    for child in &node.children {
        write_node(out, child, interner, depth + 1)?;
    }
    Ok(())
}

fn describe_unwinds(unwinds: &[Unwind]) -> String {
    if unwinds.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = unwinds
        .iter()
        .map(|u| match u {
            Unwind::Finally(t) => format!("finally {}", t),
            Unwind::Scope => "scope".to_string(),
        })
        .collect();
    format!(" via [{}]", parts.join(", "))
}

fn describe_table(table: &ScopeTable, interner: &Interner) -> String {
    let entries: Vec<String> = table
        .iter()
        .map(|s| {
            let shadow = if s.shadowed { "*" } else { "" };
            let kind = format!("{:?}", s.kind).to_lowercase();
            format!("{} {}{}", kind, interner.resolve(s.name), shadow)
        })
        .collect();
    entries.join(", ")
}

fn describe(node: &IrNode, interner: &Interner) -> String {
    let sym = |s| interner.resolve(s);
    match &node.kind {
        NodeKind::Scope(table) => format!("Scope {:?} [{}]", table.kind, describe_table(table, interner)),
        NodeKind::LocalBlock(l) => format!("LocalBlock {}", l),
        NodeKind::Target(t) => format!("{}:", t),
        NodeKind::Jump {
            kind,
            target,
            unwinds,
        } => {
            let op = match kind {
                JumpKind::Goto => "Goto",
                JumpKind::IfTrue => "IfTrue",
                JumpKind::IfFalse => "IfFalse",
                JumpKind::Finally => "JsrFinally",
            };
            format!("{} {}{}", op, target, describe_unwinds(unwinds))
        }
        NodeKind::Switch {
            break_target,
            default,
        } => match default {
            Some(d) => format!("Switch break={} default={}", break_target, d),
            None => format!("Switch break={}", break_target),
        },
        NodeKind::Case(t) => format!("Case -> {}", t),
        NodeKind::Loop {
            break_target,
            continue_target,
        } => format!("Loop break={} continue={}", break_target, continue_target),
        NodeKind::Label { names, break_target } => {
            let names: Vec<&str> = names.iter().map(|&n| sym(n)).collect();
            format!("Label {} break={}", names.join(" "), break_target)
        }
        NodeKind::Return { unwinds } => format!("Return{}", describe_unwinds(unwinds)),
        NodeKind::Rethrow(l) => format!("Rethrow {}", l),
        NodeKind::Try {
            catch_target,
            finally_target,
            handler,
        } => match finally_target {
            Some(f) => format!("Try handler={} catch={} finally={}", handler, catch_target, f),
            None => format!("Try handler={} catch={}", handler, catch_target),
        },
        NodeKind::CatchScope { name, index, local } => format!(
            "CatchScope #{} {} -> {}",
            index,
            name.map(sym).unwrap_or("<none>"),
            local
        ),
        NodeKind::EnumInit { local, mode } => format!("EnumInit {:?} -> {}", mode, local),
        NodeKind::EnumNext(l) => format!("EnumNext {}", l),
        NodeKind::EnumId(l) => format!("EnumId {}", l),
        NodeKind::VarDecl(kind) => format!("VarDecl {:?}", kind),
        NodeKind::DecoratorDecl(name) => format!("DecoratorDecl {}", sym(*name)),
        NodeKind::Number(n) => format!("Number {}", n),
        NodeKind::String(s) => format!("String {:?}", s),
        NodeKind::RegExp { pattern, flags } => format!("RegExp /{}/{}", pattern, flags),
        NodeKind::Template { tagged } => {
            if *tagged {
                "TaggedTemplate".to_string()
            } else {
                "Template".to_string()
            }
        }
        NodeKind::Name(n) => format!("Name {}", sym(*n)),
        NodeKind::BindName(n) => format!("BindName {}", sym(*n)),
        NodeKind::UseLocal(l) => format!("UseLocal {}", l),
        NodeKind::IncDec(flags) => format!(
            "{}{}",
            if flags.postfix { "Post" } else { "Pre" },
            if flags.decrement { "Dec" } else { "Inc" }
        ),
        NodeKind::TypeofName(n) => format!("TypeofName {}", sym(*n)),
        NodeKind::Binary(op) => format!("Binary {}", op.symbol()),
        NodeKind::Logical(op) => format!("Logical {:?}", op),
        NodeKind::Unary(op) => format!("Unary {:?}", op),
        NodeKind::ArrayRest { from } => format!("ArrayRest from={}", from),
        NodeKind::ObjectProperty { computed } => {
            if *computed {
                "ObjectProperty computed".to_string()
            } else {
                "ObjectProperty".to_string()
            }
        }
        NodeKind::Function(id) => format!("Function {}", id),
        NodeKind::Yield { delegate } => {
            if *delegate {
                "YieldStar".to_string()
            } else {
                "Yield".to_string()
            }
        }
        NodeKind::LetExpr(tmp) => format!("LetExpr {}", sym(*tmp)),
        NodeKind::Class { name } => format!("Class {}", name.map(sym).unwrap_or("<anonymous>")),
        NodeKind::ClassMember { kind, is_static } => {
            format!("ClassMember {:?}{}", kind, if *is_static { " static" } else { "" })
        }
        NodeKind::Decorator(name) => match name {
            DecoratorName::User(n) => format!("Decorator @{}", sym(*n)),
            other => format!("Decorator @{:?}", other),
        },
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::{FunctionId, TargetId};

    #[test]
    fn test_print_function_header() {
        let mut interner = Interner::new();
        let f = interner.intern("f");
        let x = interner.intern("x");

        let mut func = IrFunction::new(FunctionId(1), Some(f), Some(kiln_syntax::ast::FunctionKind::Declaration));
        func.params.push(x);
        func.requires_activation = true;
        func.body = IrNode::block(
            vec![IrNode::goto(TargetId(0), 2), IrNode::target(TargetId(0), 3)],
            1,
        );

        let text = func.pretty_print(&interner);
        assert!(text.starts_with("fn1 f(x) [activation] {"));
        assert!(text.contains("Goto L0"));
        assert!(text.contains("L0:"));
        assert!(text.trim_end().ends_with('}'));
    }

    #[test]
    fn test_print_unwinds() {
        let interner = Interner::new();
        let node = IrNode::jump(
            JumpKind::Goto,
            TargetId(3),
            vec![Unwind::Scope, Unwind::Finally(TargetId(1))],
            4,
        );
        let text = node.pretty_print(&interner);
        assert!(text.contains("Goto L3 via [scope, finally L1]"));
    }
}
