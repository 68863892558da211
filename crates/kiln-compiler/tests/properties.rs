//! Structural properties that hold for every lowered script
//!
//! A corpus of small programs covering each statement form is lowered and the
//! resulting IR is checked independently of the built-in validator.

use kiln_compiler::ir::{IrScript, LocalId, TargetId};
use kiln_compiler::{lower_script, FunctionId, IrNode, LowerOptions, NodeKind, PrettyPrint};
use kiln_syntax::ast::{
    AssignmentOperator, BinaryOperator, ForInLeft, ForInit, LogicalOperator, Statement, UpdateOperator,
    VariableKind,
};
use kiln_syntax::{AstBuilder, Interner};
use rustc_hash::FxHashSet;

type Program = fn(&mut AstBuilder) -> Vec<Statement>;

fn call(b: &mut AstBuilder, name: &str) -> Statement {
    let f = b.name(name);
    let call = b.call(f, vec![]);
    b.expr_stmt(call)
}

fn loops(b: &mut AstBuilder) -> Vec<Statement> {
    let zero = b.num(0.0);
    let init = {
        let i = b.pat("i");
        b.var_decl(VariableKind::Let, i, Some(zero))
    };
    let test = {
        let i = b.name("i");
        let n = b.name("n");
        b.binary(BinaryOperator::LessThan, i, n)
    };
    let update = {
        let i = b.name("i");
        b.update(UpdateOperator::Increment, false, i)
    };
    let skip = {
        let odd = b.name("odd");
        let cont = b.continue_stmt(None);
        b.if_stmt(odd, cont, None)
    };
    let work = call(b, "work");
    let body = b.block_stmt(vec![skip, work]);
    let for_loop = b.for_stmt(Some(ForInit::Variable(init)), Some(test), Some(update), body);

    let inner_break = b.break_stmt(Some("outer"));
    let inner_body = b.block_stmt(vec![inner_break]);
    let t = b.name("t");
    let inner = b.do_while(inner_body, t);
    let outer_body = b.block_stmt(vec![inner]);
    let u = b.name("u");
    let outer = b.while_stmt(u, outer_body);
    let labeled = b.labeled(&["outer"], outer);
    vec![for_loop, labeled]
}

fn enumerations(b: &mut AstBuilder) -> Vec<Statement> {
    let keys = {
        let k = b.pat("k");
        let decl = b.var_decl(VariableKind::Var, k, None);
        let o = b.name("o");
        let brk = b.break_stmt(None);
        let body = b.block_stmt(vec![brk]);
        b.for_in(ForInLeft::Variable(decl), o, body)
    };
    let values = {
        let a = b.pat("a");
        let c = b.pat("c");
        let pattern = b.pat_object(vec![("a", a), ("c", c)]);
        let decl = b.var_decl(VariableKind::Const, pattern, None);
        let list = b.name("list");
        let body = b.block_stmt(vec![]);
        b.for_of(ForInLeft::Variable(decl), list, body)
    };
    vec![keys, values]
}

fn exceptions(b: &mut AstBuilder) -> Vec<Statement> {
    let nested_try = {
        let risky = call(b, "risky");
        let clause = b.catch_clause(Some("inner"), vec![]);
        b.try_stmt(vec![risky], vec![clause], None)
    };
    let guarded = {
        let mut clause = b.catch_clause(Some("e"), vec![]);
        clause.guard = Some(b.name("ok"));
        clause
    };
    let fallback = {
        let log = call(b, "log");
        b.catch_clause(Some("e"), vec![log])
    };
    let cleanup = call(b, "cleanup");
    let outer = b.try_stmt(vec![nested_try], vec![guarded, fallback], Some(vec![cleanup]));

    let with = {
        let o = b.name("o");
        let body = call(b, "inside");
        b.with_stmt(o, body)
    };
    vec![outer, with]
}

fn switches(b: &mut AstBuilder) -> Vec<Statement> {
    let one = b.num(1.0);
    let two = b.num(2.0);
    let a = call(b, "a");
    let brk = b.break_stmt(None);
    let dflt = call(b, "fallback");
    let c = call(b, "c");
    let x = b.name("x");
    vec![b.switch_stmt(x, vec![(Some(one), vec![a, brk]), (None, vec![dflt]), (Some(two), vec![c])])]
}

fn functions(b: &mut AstBuilder) -> Vec<Statement> {
    let loop_in_fn = {
        let ret = {
            let v = b.name("v");
            b.return_stmt(Some(v))
        };
        let cleanup = call(b, "cleanup");
        let guarded = b.try_stmt(vec![ret], vec![], Some(vec![cleanup]));
        let body = b.block_stmt(vec![guarded]);
        let more = b.name("more");
        let w = b.while_stmt(more, body);
        b.function_decl("drain", &["v"], vec![w])
    };
    let closure = {
        let x = b.name("x");
        let arrow = b.arrow(&["x"], x);
        b.var(VariableKind::Const, "id", Some(arrow))
    };
    let compound = {
        let total = b.name("total");
        let target = b.member(total, "sum");
        let target = b.pat_expr(target);
        let amount = b.name("amount");
        let assign = b.assign_op(AssignmentOperator::AddAssign, target, amount);
        b.expr_stmt(assign)
    };
    let logical = {
        let a = b.name("a");
        let c = b.name("c");
        let value = b.logical(LogicalOperator::Or, a, c);
        b.var(VariableKind::Let, "either", Some(value))
    };
    vec![loop_in_fn, closure, compound, logical]
}

fn destructuring(b: &mut AstBuilder) -> Vec<Statement> {
    let p = b.pat("p");
    let q = b.pat("q");
    let inner = b.pat_array(vec![Some(q)]);
    let pattern = b.pat_array(vec![Some(p), None, Some(inner)]);
    let src = b.name("src");
    vec![Statement::VariableDecl(b.var_decl(VariableKind::Var, pattern, Some(src)))]
}

const CORPUS: &[(&str, Program)] = &[
    ("loops", loops as Program),
    ("enumerations", enumerations as Program),
    ("exceptions", exceptions as Program),
    ("switches", switches as Program),
    ("functions", functions as Program),
    ("destructuring", destructuring as Program),
];

fn lower_program(program: Program) -> (IrScript, Interner) {
    let mut b = AstBuilder::new();
    let statements = program(&mut b);
    let script = b.script(statements);
    let mut interner = b.into_interner();
    let output = lower_script(&script, &mut interner, &LowerOptions::default()).expect("lowering failed");
    assert!(output.diagnostics.is_empty(), "unexpected diagnostics: {:?}", output.diagnostics);
    (output.script, interner)
}

/// Targets placed in a body, and targets referenced from it
fn collect_targets(node: &IrNode, placed: &mut Vec<TargetId>, referenced: &mut Vec<TargetId>) {
    match &node.kind {
        NodeKind::Target(id) => placed.push(*id),
        NodeKind::Jump { target, .. } => referenced.push(*target),
        NodeKind::Loop {
            break_target,
            continue_target,
        } => {
            referenced.push(*break_target);
            referenced.push(*continue_target);
        }
        NodeKind::Label { break_target, .. } => referenced.push(*break_target),
        NodeKind::Switch { break_target, default } => {
            referenced.push(*break_target);
            referenced.extend(default.iter().copied());
        }
        NodeKind::Case(target) => referenced.push(*target),
        _ => {}
    }
    for child in &node.children {
        collect_targets(child, placed, referenced);
    }
}

fn local_uses_are_enclosed(node: &IrNode, open: &mut Vec<LocalId>) -> bool {
    let used = match node.kind {
        NodeKind::UseLocal(local) | NodeKind::EnumNext(local) | NodeKind::EnumId(local) | NodeKind::Rethrow(local) => {
            Some(local)
        }
        _ => None,
    };
    if let Some(local) = used {
        if !open.contains(&local) {
            return false;
        }
    }
    let opened = match node.kind {
        NodeKind::LocalBlock(local) => {
            open.push(local);
            true
        }
        _ => false,
    };
    let ok = node.children.iter().all(|child| local_uses_are_enclosed(child, open));
    if opened {
        open.pop();
    }
    ok
}

#[test]
fn test_corpus_validates() {
    for (name, program) in CORPUS {
        let (script, _) = lower_program(*program);
        assert!(script.validate().is_ok(), "{} failed validation", name);
    }
}

#[test]
fn test_targets_placed_once_and_resolved() {
    for (name, program) in CORPUS {
        let (script, _) = lower_program(*program);
        for func in script.functions() {
            let mut placed = Vec::new();
            let mut referenced = Vec::new();
            collect_targets(&func.body, &mut placed, &mut referenced);

            let unique: FxHashSet<TargetId> = placed.iter().copied().collect();
            assert_eq!(unique.len(), placed.len(), "{}: duplicate target in {}", name, func.id);
            for target in &placed {
                assert!(target.0 < func.target_count, "{}: target {:?} out of range", name, target);
            }
            for target in &referenced {
                assert!(unique.contains(target), "{}: dangling {:?} in {}", name, target, func.id);
            }
        }
    }
}

#[test]
fn test_locals_used_inside_their_block() {
    for (name, program) in CORPUS {
        let (script, _) = lower_program(*program);
        for func in script.functions() {
            assert!(local_uses_are_enclosed(&func.body, &mut Vec::new()), "{}: stray local use", name);
            let used: FxHashSet<u32> = func
                .body
                .find_all(|n| matches!(n.kind, NodeKind::LocalBlock(_)))
                .iter()
                .filter_map(|n| match n.kind {
                    NodeKind::LocalBlock(local) => Some(local.0),
                    _ => None,
                })
                .collect();
            assert!(used.iter().all(|&l| l < func.local_count), "{}: local out of range", name);
        }
    }
}

#[test]
fn test_every_function_has_one_parent() {
    for (name, program) in CORPUS {
        let (script, _) = lower_program(*program);
        let mut seen = FxHashSet::default();
        for func in script.functions() {
            for &child in &func.nested {
                assert!(child.0 > func.id.0, "{}: nested function precedes its parent", name);
                assert!(seen.insert(child), "{}: {} has two parents", name, child);
            }
        }
        assert_eq!(seen.len(), script.function_count() - 1, "{}: orphan function", name);
        assert!(!seen.contains(&FunctionId(0)));
    }
}

#[test]
fn test_functions_end_in_return() {
    for (name, program) in CORPUS {
        let (script, _) = lower_program(*program);
        for func in script.functions().filter(|f| !f.is_script()) {
            let last = func.body.children.last().expect("non-empty body");
            assert!(matches!(last.kind, NodeKind::Return { .. }), "{}: {} falls off the end", name, func.id);
        }
    }
}

#[test]
fn test_lowering_is_deterministic() {
    for (name, program) in CORPUS {
        let (first, first_interner) = lower_program(*program);
        let (second, second_interner) = lower_program(*program);
        assert_eq!(
            first.pretty_print(&first_interner),
            second.pretty_print(&second_interner),
            "{} lowered differently twice",
            name
        );
    }
}
