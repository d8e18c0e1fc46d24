//! # facewatch: Instrumentation for a Real-Time Face Detection Loop
//!
//! **Version**: 0.1.0
//!
//! facewatch times every stage of a capture → detect → annotate → display
//! loop, buffers the per-iteration metrics in memory, periodically rotates
//! them into timestamped CSV segments and redraws rolling charts from the
//! newest segment. All of it runs on the loop's own thread, between frames.
//!
//! ## Design Principles
//!
//! - **Fixed schema**: metric names are declared before the first row; every
//!   row carries exactly those metrics (plus `time`)
//! - **Cooperative scheduling**: background jobs run only when the loop polls
//!   them, so telemetry never blocks mid-frame
//! - **Lexical ordering**: segment file names sort in creation order
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use facewatch::metrics::MetricsAccumulator;
//! use facewatch::storage::SegmentStore;
//!
//! let mut acc = MetricsAccumulator::new();
//! acc.declare_schema(["t_total", "fps"])?;
//! acc.track([("t_total", 0.04), ("fps", 25.0)])?;
//!
//! let mut store = SegmentStore::open("benchmark")?;
//! store.rotate(&mut acc, chrono::Local::now())?;
//! let table = store.load_latest(acc.schema())?;
//! assert_eq!(table.num_rows(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod schedule;
pub mod storage;
pub mod timing;
pub mod visualize;

pub use error::{Error, Result};
