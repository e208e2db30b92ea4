use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bubblegrade_core::grid::assign;
use bubblegrade_core::model::{Mark, SheetLayout};

/// One mark per question on a `questions` x 5 grid, with a second mark on
/// every seventh question and a little positional jitter.
fn sheet_marks(questions: usize) -> Vec<Mark> {
    let mut marks = Vec::new();
    for q in 0..questions {
        let jitter = ((q * 37) % 7) as f64 - 3.0;
        let y = 20.0 + 40.0 * q as f64 + jitter;
        marks.push(Mark::new(100.0 + 60.0 * (q % 5) as f64 + jitter, y, 12.0));
        if q % 7 == 0 {
            marks.push(Mark::new(100.0 + 60.0 * ((q + 2) % 5) as f64, y, 12.0));
        }
    }
    marks.reverse();
    marks
}

fn bench_assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("assign");

    for questions in [20, 100, 400] {
        let marks = sheet_marks(questions);
        let layout = SheetLayout::new(questions, 5);
        let height = 40.0 * questions as f64;
        group.bench_function(format!("questions={questions}"), |b| {
            b.iter(|| assign(black_box(&marks), black_box(&layout), black_box(height)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_assign);
criterion_main!(benches);
