//! Reading order and duplicate suppression benchmarks
//!
//! Pages are synthetic form layouts: rows of input boxes with a
//! little vertical jitter, the shape detectors produce on real forms.

use commonforms::detection::{suppress_duplicates, Candidate};
use commonforms::geometry::BoundingBox;
use commonforms::pipeline::{LineGroupingStrategy, ReadingOrderStrategy, RowMajorStrategy};
use commonforms::widget::{Widget, WidgetType};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Deterministic form-like layout with `count` widgets.
fn form_layout(count: usize, seed: u64) -> Vec<Widget> {
    let mut s = seed;
    let mut next = || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((s >> 33) as f32) / (u32::MAX >> 1) as f32
    };

    let per_row = 4;
    let rows = count.div_ceil(per_row).max(1);
    let row_height = 0.9 / rows as f32;

    (0..count)
        .map(|i| {
            let row = i / per_row;
            let col = i % per_row;
            let y0 = 0.05 + row as f32 * row_height + next() * row_height * 0.1;
            let x0 = 0.05 + col as f32 * 0.23;
            let bbox = BoundingBox::new(x0, y0, x0 + 0.2, y0 + row_height * 0.5);
            Widget::new(WidgetType::ALL[i % WidgetType::ALL.len()], bbox, 0)
        })
        .rev()
        .collect()
}

fn bench_line_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_grouping");
    let strategy = LineGroupingStrategy::new();

    for count in [10, 100, 1000] {
        let widgets = form_layout(count, count as u64);
        group.bench_with_input(BenchmarkId::from_parameter(count), &widgets, |b, widgets| {
            b.iter(|| black_box(strategy.apply(black_box(widgets.clone()))));
        });
    }

    group.finish();
}

fn bench_row_major(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_major");
    let strategy = RowMajorStrategy;

    for count in [10, 100, 1000] {
        let widgets = form_layout(count, count as u64);
        group.bench_with_input(BenchmarkId::from_parameter(count), &widgets, |b, widgets| {
            b.iter(|| black_box(strategy.apply(black_box(widgets.clone()))));
        });
    }

    group.finish();
}

/// Each widget is reported twice with slightly shifted boxes.
fn bench_suppression(c: &mut Criterion) {
    let mut group = c.benchmark_group("suppress_duplicates");

    for count in [10, 100, 500] {
        let candidates: Vec<Candidate> = form_layout(count, 7)
            .into_iter()
            .flat_map(|w| {
                let b = w.bounding_box;
                let shifted = Widget::new(
                    WidgetType::TextBox,
                    BoundingBox::new(b.x0 + 0.005, b.y0, b.x1 + 0.005, b.y1),
                    w.page,
                );
                [Candidate::new(w, 0.9), Candidate::new(shifted, 0.6)]
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &candidates,
            |b, candidates| {
                b.iter(|| black_box(suppress_duplicates(black_box(candidates.clone()), 0.1)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_line_grouping, bench_row_major, bench_suppression);
criterion_main!(benches);
