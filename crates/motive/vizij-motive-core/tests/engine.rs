use vizij_motive_core::{
    Config, MatrixInit, MatrixOpKind, MotiveEngine, MotiveTarget1f, Motivator1f, MotivatorInit,
    MotivatorKind, MotivatorMatrix4f,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

#[test]
fn one_processor_per_kind_created_on_first_use() {
    let mut engine = MotiveEngine::default();
    assert_eq!(engine.processor_count(), 0);

    let _a = Motivator1f::new(&MotivatorInit::smooth(), &mut engine);
    let _b = Motivator1f::new(&MotivatorInit::smooth(), &mut engine);
    assert_eq!(engine.processor_count(), 1);
    assert!(engine.has_processor(MotivatorKind::Smooth));

    let _m = MotivatorMatrix4f::new(
        &MatrixInit::new()
            .driven(MatrixOpKind::TranslateX, MotivatorInit::spring(), None)
            .into(),
        &mut engine,
    );
    assert_eq!(engine.processor_count(), 3);
    assert_eq!(engine.live_slots(MotivatorKind::Smooth), 2);
    assert_eq!(engine.live_slots(MotivatorKind::Spring), 1);
    assert_eq!(engine.live_slots(MotivatorKind::Matrix), 1);
}

#[test]
fn processors_persist_when_empty() {
    let mut engine = MotiveEngine::default();
    drop(Motivator1f::new(&MotivatorInit::spring(), &mut engine));
    assert!(engine.has_processor(MotivatorKind::Spring));
    assert_eq!(engine.live_slots(MotivatorKind::Spring), 0);
    engine.advance_frame(0.1);
}

#[test]
fn negative_and_nan_deltas_do_not_move_values() {
    let mut engine = MotiveEngine::default();
    let m = Motivator1f::with_target(
        &MotivatorInit::spring(),
        &mut engine,
        &MotiveTarget1f::target(1.0, 0.0, 1.0),
    );
    engine.advance_frame(-0.5);
    engine.advance_frame(f32::NAN);
    engine.advance_frame(f32::INFINITY);
    approx(m.value(), 0.0, 0.0);
    approx(m.target_time(), 1.0, 0.0);
}

#[test]
fn max_delta_time_clamps_large_steps() {
    let mut engine = MotiveEngine::new(Config {
        max_delta_time: Some(0.25),
        ..Config::default()
    });
    let m = Motivator1f::with_target(
        &MotivatorInit::smooth(),
        &mut engine,
        &MotiveTarget1f::target(4.0, 0.0, 1.0),
    );
    engine.advance_frame(10.0);
    approx(m.target_time(), 0.75, 1e-6);
}

#[test]
fn compaction_can_be_deferred_to_explicit_defragment() {
    let mut engine = MotiveEngine::new(Config {
        defragment_on_advance: false,
        ..Config::default()
    });
    let mut handles: Vec<Motivator1f> = (0..4)
        .map(|i| {
            Motivator1f::with_target(
                &MotivatorInit::spring(),
                &mut engine,
                &MotiveTarget1f::current(i as f32, 0.0),
            )
        })
        .collect();
    drop(handles.remove(0));
    let tail = handles[2].index();

    engine.advance_frame(0.1);
    assert_eq!(handles[2].index(), tail, "no compaction during advance");

    assert_eq!(engine.defragment(), 1);
    assert_ne!(handles[2].index(), tail);
    approx(handles[2].value(), 3.0, 0.0);
    assert_eq!(engine.defragment(), 0);
}

#[test]
fn advance_order_is_deterministic() {
    fn run() -> Vec<f32> {
        let mut engine = MotiveEngine::default();
        let handles: Vec<Motivator1f> = (0..16)
            .map(|i| {
                let init = if i % 2 == 0 {
                    MotivatorInit::smooth()
                } else {
                    MotivatorInit::spring()
                };
                Motivator1f::with_target(
                    &init,
                    &mut engine,
                    &MotiveTarget1f::target(i as f32, 0.5, 0.3 + i as f32 * 0.05),
                )
            })
            .collect();
        for _ in 0..30 {
            engine.advance_frame(1.0 / 30.0);
        }
        handles.iter().map(Motivator1f::value).collect()
    }
    assert_eq!(run(), run());
}
