//! Metrics Accumulator - append-only, schema-validated row buffer

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Local};

use super::{CriteriaSchema, ObservationRow, TIME_COLUMN};
use crate::{Error, Result};

/// In-memory table of observation rows sharing one criteria schema.
///
/// ## Lifecycle
///
/// 1. Declare every metric with [`declare_schema`](Self::declare_schema)
/// 2. Append one row per iteration with [`track`](Self::track)
/// 3. A rotation in [`SegmentStore`](crate::storage::SegmentStore) persists
///    the buffered rows and clears the buffer
///
/// Rotation is the only path that clears rows.
///
/// ```rust
/// use facewatch::metrics::MetricsAccumulator;
///
/// let mut acc = MetricsAccumulator::new();
/// acc.declare_schema(["t_total", "fps"])?;
/// acc.track([("t_total", 0.04), ("fps", 25.0)])?;
/// assert_eq!(acc.row_count(), 1);
///
/// // Too late to add metrics now
/// assert!(acc.declare_schema(["faces"]).is_err());
/// # Ok::<(), facewatch::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct MetricsAccumulator {
    schema: CriteriaSchema,
    rows: Vec<ObservationRow>,
}

impl MetricsAccumulator {
    /// Create an empty accumulator with only the implicit `time` column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator with a pre-declared schema.
    #[must_use]
    pub fn with_schema(schema: CriteriaSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Extend the criteria schema.
    ///
    /// Names already declared are skipped, so repeating a declaration before
    /// the first row is harmless.
    ///
    /// # Errors
    ///
    /// Returns `SchemaLocked` once any row has been tracked, and
    /// `InvalidInput` for empty names.
    pub fn declare_schema<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.rows.is_empty() {
            return Err(Error::SchemaLocked {
                rows: self.rows.len(),
            });
        }
        self.schema.extend(names)
    }

    /// Track one observation stamped with the current local time.
    ///
    /// # Errors
    ///
    /// See [`track_at`](Self::track_at).
    pub fn track<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.track_at(Local::now(), values)
    }

    /// Track one observation with an explicit timestamp.
    ///
    /// The key set must equal the declared metrics exactly (order does not
    /// matter). A `time` key is ignored: the row is always stamped with
    /// `timestamp`. Cost is linear in the number of metrics and constant in the
    /// number of buffered rows.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` for a missing, extra, renamed or repeated
    /// key, and `InvalidInput` for a NaN or infinite value. The buffer is
    /// left unchanged on error.
    pub fn track_at<I, K>(&mut self, timestamp: DateTime<Local>, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let width = self.schema.len();
        let mut slots = vec![0.0_f64; width];
        let mut filled = vec![false; width];
        let mut got = Vec::with_capacity(width);
        let mut mismatch = false;

        for (key, value) in values {
            let key = key.as_ref();
            if key == TIME_COLUMN {
                continue;
            }
            got.push(key.to_string());
            match self.schema.slot(key) {
                Some(slot) if !filled[slot] => {
                    if !value.is_finite() {
                        return Err(Error::InvalidInput(format!(
                            "metric '{key}' must be finite, got {value}"
                        )));
                    }
                    slots[slot] = value;
                    filled[slot] = true;
                }
                _ => mismatch = true,
            }
        }

        if mismatch || filled.iter().any(|f| !f) {
            return Err(Error::SchemaMismatch {
                expected: self.schema.metrics().to_vec(),
                got,
            });
        }

        self.rows
            .push(ObservationRow::new(timestamp, slots.into_boxed_slice()));
        Ok(())
    }

    /// Number of buffered rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The criteria schema.
    #[must_use]
    pub const fn schema(&self) -> &CriteriaSchema {
        &self.schema
    }

    /// Buffered rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[ObservationRow] {
        &self.rows
    }

    /// Snapshot the buffered rows as an Arrow batch (`time` first, then
    /// metrics in schema order).
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if the batch cannot be assembled.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let times = StringArray::from_iter_values(self.rows.iter().map(ObservationRow::formatted_time));

        let mut columns: Vec<ArrayRef> = Vec::with_capacity(self.schema.len() + 1);
        columns.push(Arc::new(times));
        for slot in 0..self.schema.len() {
            let values = Float64Array::from_iter_values(self.rows.iter().map(|r| r.values()[slot]));
            columns.push(Arc::new(values));
        }

        Ok(RecordBatch::try_new(self.schema.arrow_schema(), columns)?)
    }

    /// Drop every buffered row. Reserved for rotation.
    pub(crate) fn clear(&mut self) {
        self.rows.clear();
    }
}
