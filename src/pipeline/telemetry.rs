//! Telemetry context shared by the main loop and its scheduled jobs

use std::path::PathBuf;
use std::rc::Rc;

use crate::clock::Clock;
use crate::metrics::MetricsAccumulator;
use crate::schedule::{Interval, JobId, Scheduler};
use crate::storage::SegmentStore;
use crate::visualize::{ChartSurface, DrawOutcome, RollingVisualizer};
use crate::{Error, Result};

/// Metrics the main loop records on every completed iteration.
pub const STANDARD_METRICS: [&str; 9] = [
    "t_capture",
    "t_detect",
    "t_annotate",
    "t_display",
    "t_total",
    "fps",
    "faces",
    "cpu_percent",
    "mem_percent",
];

/// Accumulator, segment store and visualizer on one timeline.
///
/// The main loop appends through [`record`](Self::record); scheduled jobs
/// call [`rotate`](Self::rotate) and [`redraw`](Self::redraw). Everything
/// runs on the loop's thread, one operation at a time.
pub struct Telemetry {
    accumulator: MetricsAccumulator,
    store: SegmentStore,
    visualizer: RollingVisualizer,
    surface: Box<dyn ChartSurface>,
    clock: Rc<dyn Clock>,
}

impl Telemetry {
    /// Assemble the context.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGraph` if the visualizer was built for a different
    /// schema than the accumulator's.
    pub fn new(
        accumulator: MetricsAccumulator,
        store: SegmentStore,
        visualizer: RollingVisualizer,
        surface: Box<dyn ChartSurface>,
        clock: Rc<dyn Clock>,
    ) -> Result<Self> {
        if visualizer.schema() != accumulator.schema() {
            return Err(Error::InvalidGraph(format!(
                "graphs declared over {:?} but metrics are {:?}",
                visualizer.schema().columns(),
                accumulator.schema().columns()
            )));
        }
        Ok(Self {
            accumulator,
            store,
            visualizer,
            surface,
            clock,
        })
    }

    /// Append one observation stamped with the clock's current time.
    ///
    /// # Errors
    ///
    /// Propagates `SchemaMismatch` / `InvalidInput` from the accumulator.
    pub fn record<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.accumulator.track_at(self.clock.now(), values)
    }

    /// Flush buffered rows into a new segment.
    ///
    /// # Errors
    ///
    /// Returns storage errors; rows stay buffered on failure.
    pub fn rotate(&mut self) -> Result<Option<PathBuf>> {
        self.store.rotate(&mut self.accumulator, self.clock.now())
    }

    /// Redraw every graph from the newest segment.
    ///
    /// # Errors
    ///
    /// Returns storage or surface errors; a missing segment is not an error.
    pub fn redraw(&mut self) -> Result<DrawOutcome> {
        self.visualizer.draw(&self.store, self.surface.as_mut())
    }

    /// Register the rotation and redraw jobs, in that order.
    pub fn register_jobs(
        scheduler: &mut Scheduler<Self>,
        rotation: Interval,
        redraw: Interval,
    ) -> (JobId, JobId) {
        let rotate = scheduler.every("rotate", rotation, |t: &mut Self| t.rotate().map(|_| ()));
        let draw = scheduler.every("redraw", redraw, |t: &mut Self| t.redraw().map(|_| ()));
        (rotate, draw)
    }

    /// The live accumulator.
    #[must_use]
    pub const fn accumulator(&self) -> &MetricsAccumulator {
        &self.accumulator
    }

    /// The segment store.
    #[must_use]
    pub const fn store(&self) -> &SegmentStore {
        &self.store
    }

    /// The visualizer.
    #[must_use]
    pub const fn visualizer(&self) -> &RollingVisualizer {
        &self.visualizer
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("rows", &self.accumulator.row_count())
            .field("store", &self.store)
            .field("graphs", &self.visualizer.graphs().len())
            .finish_non_exhaustive()
    }
}
