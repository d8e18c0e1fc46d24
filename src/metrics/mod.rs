//! Per-cycle metrics: criteria schema, observation rows and the accumulator
//!
//! ## Data Model
//!
//! ```text
//! CriteriaSchema (1) ──< ObservationRow (N)   [buffered in MetricsAccumulator]
//!                             │
//!                             └── rotation ──> Segment (CSV on disk)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use facewatch::metrics::MetricsAccumulator;
//!
//! let mut acc = MetricsAccumulator::new();
//! acc.declare_schema(["t_total", "t_capture", "t_detect", "fps"])?;
//! acc.track([
//!     ("t_total", 0.04),
//!     ("t_capture", 0.01),
//!     ("t_detect", 0.03),
//!     ("fps", 25.0),
//! ])?;
//! assert_eq!(acc.row_count(), 1);
//! # Ok::<(), facewatch::Error>(())
//! ```

mod accumulator;
mod row;
mod schema;

pub use accumulator::MetricsAccumulator;
pub use row::{ObservationRow, TIME_FORMAT};
pub use schema::{CriteriaSchema, TIME_COLUMN};

pub(crate) use schema::arrow_schema_for;
