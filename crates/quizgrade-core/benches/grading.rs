use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizgrade_core::aggregate::aggregate;
use quizgrade_core::answer::SubmittedAnswer;
use quizgrade_core::grading::grade;
use quizgrade_core::model::*;
use quizgrade_core::results::{GradeStatus, GradingResult};

fn matching_question(n: usize) -> QuestionDefinition {
    let left = (0..n)
        .map(|i| LabeledItem::new(format!("l{i}"), format!("left {i}")))
        .collect();
    let right = (0..n)
        .map(|i| LabeledItem::new(format!("r{i}"), format!("right {i}")))
        .collect();
    let correct = (0..n).map(|i| (format!("l{i}"), format!("r{i}"))).collect();
    QuestionDefinition::new(
        "matching",
        "Match the pairs",
        n as f64,
        QuestionData::Matching(MatchingData {
            left_items: left,
            right_items: right,
            correct_matches: correct,
        }),
    )
}

fn ordering_question(n: usize) -> QuestionDefinition {
    QuestionDefinition::new(
        "ordering",
        "Put these in order",
        n as f64,
        QuestionData::Ordering(OrderingData {
            items: (1..=n)
                .map(|i| OrderItem {
                    id: format!("item{i}"),
                    text: format!("step {i}"),
                    target_position: i,
                })
                .collect(),
            allow_partial_credit: true,
        }),
    )
}

fn bench_grade(c: &mut Criterion) {
    let mut group = c.benchmark_group("grade");

    let single = QuestionDefinition::new(
        "single",
        "Pick one",
        1.0,
        QuestionData::SingleChoice(SingleChoiceData {
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_option_index: 2,
        }),
    );
    let single_answer = SubmittedAnswer::SingleChoice { selected_index: 2 };
    group.bench_function("single_choice", |b| {
        b.iter(|| grade(black_box(&single), black_box(&single_answer)))
    });

    for n in [5, 50] {
        let q = matching_question(n);
        let answer = SubmittedAnswer::Matching {
            matches: (0..n)
                .map(|i| (format!("l{i}"), format!("r{}", (i + 1) % n)))
                .collect::<BTreeMap<_, _>>(),
        };
        group.bench_function(format!("matching_{n}"), |b| {
            b.iter(|| grade(black_box(&q), black_box(&answer)))
        });
    }

    for n in [5, 100] {
        let q = ordering_question(n);
        let answer = SubmittedAnswer::Ordering {
            order: (1..=n).rev().map(|i| format!("item{i}")).collect(),
        };
        group.bench_function(format!("ordering_{n}"), |b| {
            b.iter(|| grade(black_box(&q), black_box(&answer)))
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for n in [10, 1000] {
        let results: Vec<GradingResult> = (0..n)
            .map(|i| GradingResult {
                question_id: format!("q{i}"),
                status: if i % 7 == 0 {
                    GradeStatus::PendingManualReview
                } else {
                    GradeStatus::Graded
                },
                is_correct: Some(i % 2 == 0),
                points_earned: (i % 3) as f64,
                max_points: 2.0,
                feedback: None,
                test_outcomes: vec![],
            })
            .collect();
        let weights: Vec<f64> = (0..n).map(|i| 1.0 + (i % 4) as f64).collect();
        group.bench_function(format!("{n}_results"), |b| {
            b.iter(|| aggregate(black_box(&results), black_box(&weights)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grade, bench_aggregate);
criterion_main!(benches);
