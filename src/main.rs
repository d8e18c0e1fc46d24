//! `facewatch` CLI
//!
//! ```text
//! facewatch run --frames 500 --rotate-every 10 --rotate-period second
//! facewatch report --save-dir benchmark --latest
//! ```

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use facewatch::clock::{Clock, SystemClock};
use facewatch::config::{AppConfig, ScheduleSpec};
use facewatch::metrics::{CriteriaSchema, MetricsAccumulator};
use facewatch::pipeline::synthetic::{LogDisplay, SyntheticDetector, SyntheticSource};
use facewatch::pipeline::{
    BoxAnnotator, CancelToken, Collaborators, MainLoop, SysinfoProbe, Telemetry, STANDARD_METRICS,
};
use facewatch::schedule::Scheduler;
use facewatch::storage::SegmentStore;
use facewatch::visualize::TextSurface;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset (e.g. `debug`, `facewatch=trace`)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the detection loop with telemetry
    Run(RunArgs),
    /// Summarize recorded segments
    Report(ReportArgs),
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// JSON config file; flags below override it
    #[arg(long, env = "FACEWATCH_CONFIG")]
    config: Option<PathBuf>,
    /// Segment directory
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Stop after this many iterations
    #[arg(long)]
    frames: Option<u64>,
    /// Stop after this many seconds of wall time
    #[arg(long)]
    duration_secs: Option<u64>,
    /// Rotation interval count
    #[arg(long, requires = "rotate_period")]
    rotate_every: Option<u32>,
    /// Rotation interval unit (second, minute, hour, day)
    #[arg(long, requires = "rotate_every")]
    rotate_period: Option<String>,
    /// Redraw interval count
    #[arg(long, requires = "redraw_period")]
    redraw_every: Option<u32>,
    /// Redraw interval unit (second, minute, hour, day)
    #[arg(long, requires = "redraw_every")]
    redraw_period: Option<String>,
    /// Minimum detector confidence in [0, 1]
    #[arg(long)]
    threshold: Option<f32>,
    /// Make every Nth synthetic capture fail
    #[arg(long, default_value_t = 0)]
    drop_every: u64,
}

#[derive(Debug, clap::Args)]
struct ReportArgs {
    /// Segment directory
    #[arg(long, default_value = "benchmark")]
    save_dir: PathBuf,
    /// Only the newest segment
    #[arg(long)]
    latest: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Run(args) => run(&args),
        Command::Report(args) => report(&args),
    }
}

fn load_config(args: &RunArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(dir) = &args.save_dir {
        config.save_dir.clone_from(dir);
    }
    if args.frames.is_some() {
        config.max_iterations = args.frames;
    }
    if let Some(threshold) = args.threshold {
        config.detection_threshold = threshold;
    }
    if let (Some(every), Some(period)) = (args.rotate_every, &args.rotate_period) {
        config.rotation = ScheduleSpec::new(every, period.as_str());
    }
    if let (Some(every), Some(period)) = (args.redraw_every, &args.redraw_period) {
        config.redraw = ScheduleSpec::new(every, period.as_str());
    }
    Ok(config)
}

fn run(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    let schema = CriteriaSchema::with_metrics(STANDARD_METRICS)?;
    config
        .validate(&schema)
        .context("invalid configuration")?;

    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let store = SegmentStore::open(&config.save_dir)
        .with_context(|| format!("opening segment directory {}", config.save_dir.display()))?;
    let telemetry = Telemetry::new(
        MetricsAccumulator::with_schema(schema.clone()),
        store,
        config.visualizer(schema)?,
        Box::new(TextSurface::new(std::io::stdout())),
        Rc::clone(&clock),
    )?;

    let mut scheduler = Scheduler::new(clock);
    Telemetry::register_jobs(
        &mut scheduler,
        config.rotation.interval()?,
        config.redraw.interval()?,
    );

    let cancel = CancelToken::new();
    if let Some(secs) = args.duration_secs {
        let remote = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            remote.cancel();
        });
    }

    let parts = Collaborators {
        source: Box::new(
            SyntheticSource::new(config.frame_width, config.frame_height).fail_every(args.drop_every),
        ),
        detector: Box::new(SyntheticDetector::default()),
        annotator: Box::new(BoxAnnotator),
        display: Box::new(LogDisplay::default()),
        probe: Box::new(SysinfoProbe::new()),
    };

    let mut main_loop = MainLoop::new(config.loop_config(cancel), parts, telemetry, scheduler);
    let summary = main_loop.run().context("main loop failed")?;
    info!(
        iterations = summary.iterations,
        recorded = summary.recorded,
        capture_failures = summary.capture_failures,
        job_failures = summary.job_failures,
        "Done"
    );
    Ok(())
}

fn report(args: &ReportArgs) -> Result<()> {
    let store = SegmentStore::open(&args.save_dir)
        .with_context(|| format!("opening segment directory {}", args.save_dir.display()))?;
    let schema = CriteriaSchema::with_metrics(STANDARD_METRICS)?;

    let table = if args.latest {
        store.load_latest(&schema)?
    } else {
        store.load_all(&schema)?
    };

    println!(
        "{} row(s) from {} segment(s) in {}",
        table.num_rows(),
        if args.latest { 1 } else { store.segment_names()?.len() },
        store.dir().display()
    );
    println!("{:<14}{:>8}{:>14}{:>14}{:>14}", "metric", "count", "mean", "min", "max");
    for s in table.summary() {
        println!(
            "{:<14}{:>8}{:>14.5}{:>14.5}{:>14.5}",
            s.name, s.count, s.mean, s.min, s.max
        );
    }
    Ok(())
}
