use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vizij_motive_core::{
    MatrixInit, MatrixOpKind, MotiveEngine, MotiveTarget1f, Motivator1f, MotivatorInit,
    MotivatorMatrix4f,
};

fn scalar_engine(count: usize) -> (MotiveEngine, Vec<Motivator1f>) {
    let mut engine = MotiveEngine::default();
    let handles = (0..count)
        .map(|i| {
            let init = if i % 2 == 0 {
                MotivatorInit::smooth()
            } else {
                MotivatorInit::spring()
            };
            Motivator1f::with_target(
                &init,
                &mut engine,
                &MotiveTarget1f::target(i as f32, 0.0, 1e6),
            )
        })
        .collect();
    (engine, handles)
}

fn matrix_engine(count: usize) -> (MotiveEngine, Vec<MotivatorMatrix4f>) {
    let mut engine = MotiveEngine::default();
    let init: MotivatorInit = MatrixInit::new()
        .constant(MatrixOpKind::TranslateX, 1.0)
        .driven(
            MatrixOpKind::RotateAboutY,
            MotivatorInit::smooth(),
            Some(MotiveTarget1f::target(3.0, 0.0, 1e6)),
        )
        .constant(MatrixOpKind::ScaleUniformly, 2.0)
        .into();
    let handles = (0..count)
        .map(|_| MotivatorMatrix4f::new(&init, &mut engine))
        .collect();
    (engine, handles)
}

fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance_frame");
    for count in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("scalar", count), &count, |b, &count| {
            let (mut engine, _handles) = scalar_engine(count);
            b.iter(|| engine.advance_frame(black_box(1.0 / 60.0)));
        });
        group.bench_with_input(BenchmarkId::new("matrix", count), &count, |b, &count| {
            let (mut engine, _handles) = matrix_engine(count);
            b.iter(|| engine.advance_frame(black_box(1.0 / 60.0)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_advance);
criterion_main!(benches);
