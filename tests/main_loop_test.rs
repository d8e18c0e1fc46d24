//! End-to-end: config → telemetry → main loop → segments → report data

use std::rc::Rc;

use chrono::TimeDelta;
use facewatch::clock::{Clock, ManualClock, SystemClock};
use facewatch::config::AppConfig;
use facewatch::metrics::{CriteriaSchema, MetricsAccumulator};
use facewatch::pipeline::synthetic::{LogDisplay, SyntheticDetector, SyntheticSource};
use facewatch::pipeline::{
    BoxAnnotator, CancelToken, Collaborators, FixedProbe, IterationOutcome, MainLoop,
    ResourceSample, Telemetry, STANDARD_METRICS,
};
use facewatch::schedule::Scheduler;
use facewatch::storage::SegmentStore;
use facewatch::visualize::TextSurface;

fn collaborators(source: SyntheticSource) -> Collaborators {
    Collaborators {
        source: Box::new(source),
        detector: Box::new(SyntheticDetector::default()),
        annotator: Box::new(BoxAnnotator),
        display: Box::new(LogDisplay::default()),
        probe: Box::new(FixedProbe(ResourceSample {
            cpu_percent: 5.0,
            mem_percent: 50.0,
        })),
    }
}

fn assemble(config: &AppConfig, clock: Rc<dyn Clock>, source: SyntheticSource) -> MainLoop {
    let schema = CriteriaSchema::with_metrics(STANDARD_METRICS).unwrap();
    config.validate(&schema).unwrap();

    let telemetry = Telemetry::new(
        MetricsAccumulator::with_schema(schema.clone()),
        SegmentStore::open(&config.save_dir).unwrap(),
        config.visualizer(schema).unwrap(),
        Box::new(TextSurface::new(std::io::sink())),
        Rc::clone(&clock),
    )
    .unwrap();

    let mut scheduler = Scheduler::new(clock);
    Telemetry::register_jobs(
        &mut scheduler,
        config.rotation.interval().unwrap(),
        config.redraw.interval().unwrap(),
    );

    MainLoop::new(
        config.loop_config(CancelToken::new()),
        collaborators(source),
        telemetry,
        scheduler,
    )
}

#[test]
fn test_bounded_run_writes_final_segment() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        save_dir: dir.path().to_path_buf(),
        max_iterations: Some(20),
        ..AppConfig::default()
    };
    let source = SyntheticSource::new(64, 48).fail_every(4);
    let mut main_loop = assemble(&config, Rc::new(SystemClock), source);

    let summary = main_loop.run().unwrap();
    assert_eq!(summary.iterations, 20);
    assert_eq!(summary.capture_failures, 5);
    assert_eq!(summary.recorded + summary.skipped_zero_duration, 15);
    assert!(summary.recorded > 0);
    assert_eq!(summary.job_failures, 0);

    let store = SegmentStore::open(dir.path()).unwrap();
    let schema = CriteriaSchema::with_metrics(STANDARD_METRICS).unwrap();
    let table = store.load_all(&schema).unwrap();
    assert_eq!(u64::try_from(table.num_rows()).unwrap(), summary.recorded);

    for metric in table.summary() {
        assert_eq!(u64::try_from(metric.count).unwrap(), summary.recorded);
        assert!(metric.min <= metric.mean && metric.mean <= metric.max, "{metric:?}");
    }
    let faces = table.column("faces").unwrap();
    assert!(faces.iter().all(|f| (*f - 1.0).abs() < f64::EPSILON));
}

#[test]
fn test_scheduled_jobs_driven_by_manual_clock() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::from_json(&format!(
        r#"{{
            "save_dir": {:?},
            "rotation": {{"every": 10, "period": "second"}},
            "redraw": {{"every": 30, "period": "second"}}
        }}"#,
        dir.path().display().to_string()
    ))
    .unwrap();
    let clock = Rc::new(ManualClock::default());
    let mut main_loop = assemble(&config, clock.clone(), SyntheticSource::new(64, 48));

    // Six simulated seconds per frame: rotation fires on every other frame
    let mut outcomes = Vec::new();
    for _ in 0..10 {
        clock.advance(TimeDelta::seconds(6));
        outcomes.push(main_loop.step().unwrap());
    }
    assert!(outcomes.iter().all(|o| !matches!(o, IterationOutcome::CaptureFailed)));

    let store = main_loop.telemetry().store();
    assert_eq!(store.segment_names().unwrap().len(), 5);
    assert!(main_loop.telemetry().accumulator().is_empty());
    assert_eq!(main_loop.summary().job_failures, 0);
}

#[test]
fn test_registration_mode_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::from_json(r#"{"mode": "registration"}"#).unwrap();
    config.save_dir = dir.path().to_path_buf();
    let mut main_loop = assemble(&config, Rc::new(SystemClock), SyntheticSource::new(64, 48));

    let summary = main_loop.run().unwrap();
    assert_eq!(summary.iterations, 0);
    assert!(!main_loop.telemetry().store().has_segments().unwrap());
}
