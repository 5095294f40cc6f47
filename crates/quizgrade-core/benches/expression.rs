use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizgrade_core::expression::{truth_table, Expression};

fn chain(n: usize) -> String {
    let ops = ["AND", "OR", "XOR"];
    let mut s = String::from("NOT V0");
    for i in 1..n {
        s.push_str(&format!(" {} V{i}", ops[i % ops.len()]));
    }
    s
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("expression_parse");

    let short = "A AND NOT B";
    let symbolic = "¬A ∧ B ∨ C ⊕ D";
    let long = chain(200);

    group.bench_function("short", |b| b.iter(|| Expression::parse(black_box(short))));
    group.bench_function("symbolic", |b| {
        b.iter(|| Expression::parse(black_box(symbolic)))
    });
    group.bench_function("200_terms", |b| {
        b.iter(|| Expression::parse(black_box(&long)))
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("expression_evaluate");

    for n in [4, 200] {
        let Ok(expr) = Expression::parse(&chain(n)) else {
            panic!("benchmark expression must parse");
        };
        let assignment: BTreeMap<String, bool> =
            (0..n).map(|i| (format!("V{i}"), i % 3 == 0)).collect();
        group.bench_function(format!("{n}_terms"), |b| {
            b.iter(|| expr.evaluate(black_box(&assignment)))
        });
    }

    group.finish();
}

fn bench_truth_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("truth_table");

    for n in [3, 10] {
        let Ok(expr) = Expression::parse(&chain(n)) else {
            panic!("benchmark expression must parse");
        };
        let variables: Vec<String> = (0..n).map(|i| format!("V{i}")).collect();
        group.bench_function(format!("{n}_variables"), |b| {
            b.iter(|| truth_table(black_box(&expr), black_box(&variables)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_evaluate, bench_truth_table);
criterion_main!(benches);
