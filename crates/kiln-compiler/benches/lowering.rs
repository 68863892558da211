use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kiln_compiler::{lower_script, LowerOptions};
use kiln_syntax::ast::{BinaryOperator, ForInLeft, ForInit, Script, Statement, UpdateOperator, VariableKind};
use kiln_syntax::{AstBuilder, Interner};

/// `for (let i = 0; i < n; i++) { if (skip(i)) continue; total += i; }`
fn counting_loop(b: &mut AstBuilder) -> Statement {
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
        let f = b.name("skip");
        let i = b.name("i");
        let call = b.call(f, vec![i]);
        let cont = b.continue_stmt(None);
        b.if_stmt(call, cont, None)
    };
    let add = {
        let total = b.pat("total");
        let i = b.name("i");
        let assign = b.assign_op(kiln_syntax::ast::AssignmentOperator::AddAssign, total, i);
        b.expr_stmt(assign)
    };
    let body = b.block_stmt(vec![skip, add]);
    b.for_stmt(Some(ForInit::Variable(init)), Some(test), Some(update), body)
}

/// `function f(o) { for (const [k, v] of entries(o)) { try { use(k, v); } catch (e) { log(e); } finally { done(); } } return o; }`
fn function_with_try(b: &mut AstBuilder, name: &str) -> Statement {
    let decl = {
        let k = b.pat("k");
        let v = b.pat("v");
        let pair = b.pat_array(vec![Some(k), Some(v)]);
        b.var_decl(VariableKind::Const, pair, None)
    };
    let iterated = {
        let entries = b.name("entries");
        let o = b.name("o");
        b.call(entries, vec![o])
    };
    let use_call = {
        let f = b.name("use");
        let k = b.name("k");
        let v = b.name("v");
        let call = b.call(f, vec![k, v]);
        b.expr_stmt(call)
    };
    let log_call = {
        let f = b.name("log");
        let e = b.name("e");
        let call = b.call(f, vec![e]);
        b.expr_stmt(call)
    };
    let done = {
        let f = b.name("done");
        let call = b.call(f, vec![]);
        b.expr_stmt(call)
    };
    let clause = b.catch_clause(Some("e"), vec![log_call]);
    let guarded = b.try_stmt(vec![use_call], vec![clause], Some(vec![done]));
    let body = b.block_stmt(vec![guarded]);
    let loop_stmt = b.for_of(ForInLeft::Variable(decl), iterated, body);
    let o = b.name("o");
    let ret = b.return_stmt(Some(o));
    b.function_decl(name, &["o"], vec![loop_stmt, ret])
}

fn build_script(functions: usize) -> (Script, Interner) {
    let mut b = AstBuilder::new();
    let mut statements = Vec::with_capacity(functions + 1);
    for i in 0..functions {
        statements.push(function_with_try(&mut b, &format!("f{}", i)));
    }
    statements.push(counting_loop(&mut b));
    let script = b.script(statements);
    (script, b.into_interner())
}

fn bench_loop(c: &mut Criterion) {
    let (script, interner) = build_script(0);
    let options = LowerOptions::default();

    c.bench_function("lower_counting_loop", |b| {
        b.iter(|| {
            let mut interner = interner.clone();
            lower_script(black_box(&script), &mut interner, &options).unwrap()
        });
    });
}

fn bench_functions(c: &mut Criterion) {
    let mut group = c.benchmark_group("functions");
    let options = LowerOptions::default();

    for count in [1usize, 10, 100] {
        let (script, interner) = build_script(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("lower", count), &script, |b, script| {
            b.iter(|| {
                let mut interner = interner.clone();
                lower_script(black_box(script), &mut interner, &options).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_folding(c: &mut Criterion) {
    let mut group = c.benchmark_group("folding");
    let (script, interner) = build_script(10);

    for fold in [true, false] {
        let options = LowerOptions {
            fold_constants: fold,
            ..LowerOptions::default()
        };
        group.bench_with_input(BenchmarkId::new("fold_constants", fold), &options, |b, options| {
            b.iter(|| {
                let mut interner = interner.clone();
                lower_script(black_box(&script), &mut interner, options).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_loop, bench_functions, bench_folding);
criterion_main!(benches);
