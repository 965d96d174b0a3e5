use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizstat_core::config::Thresholds;
use quizstat_core::evaluate::evaluate_metrics;
use quizstat_core::model::{Answer, GradeBook, Question, ResponseRecord};
use quizstat_core::statistics::{
    difficulty, discrimination, distractor_analysis, point_biserial, GroupingMethod,
};

fn make_class(n: usize) -> (Vec<ResponseRecord>, GradeBook) {
    let mut grades = GradeBook::new();
    let responses = (0..n)
        .map(|i| {
            let id = format!("student_{i:04}");
            grades.insert(id.clone(), 100.0 - (i % 60) as f64);
            let answer = (i % 4) as u64 + 1;
            ResponseRecord::new(id, Some(answer), answer == 1)
        })
        .collect();
    (responses, grades)
}

fn make_question() -> Question {
    Question {
        id: 1,
        position: 1,
        text: "bench".into(),
        question_type: "multiple_choice_question".into(),
        points: Some(1.0),
        answers: (1..=4)
            .map(|id| Answer {
                id,
                text: format!("option {id}"),
                weight: if id == 1 { 100.0 } else { 0.0 },
            })
            .collect(),
    }
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("item_metrics");
    let question = make_question();

    for n in [30usize, 300, 3000] {
        let (responses, grades) = make_class(n);

        group.bench_function(format!("difficulty/n={n}"), |b| {
            b.iter(|| difficulty(black_box(&responses)))
        });

        group.bench_function(format!("discrimination/n={n}"), |b| {
            b.iter(|| {
                discrimination(
                    black_box(&responses),
                    black_box(&grades),
                    GroupingMethod::TopBottom27,
                )
            })
        });

        group.bench_function(format!("distractor/n={n}"), |b| {
            b.iter(|| distractor_analysis(black_box(&responses), black_box(&question)))
        });

        group.bench_function(format!("point_biserial/n={n}"), |b| {
            b.iter(|| point_biserial(black_box(&responses), black_box(&grades)))
        });
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let (responses, grades) = make_class(300);
    let disc = discrimination(&responses, &grades, GroupingMethod::Thirds);
    let pb = point_biserial(&responses, &grades);
    let thresholds = Thresholds::default();

    c.bench_function("evaluate_metrics", |b| {
        b.iter(|| {
            evaluate_metrics(
                black_box(Some(0.25)),
                black_box(disc.as_ref()),
                black_box(pb.as_ref()),
                black_box(&thresholds),
            )
        })
    });
}

criterion_group!(benches, bench_metrics, bench_evaluate);
criterion_main!(benches);
