//! Segment Table - a loaded segment (or concatenation of segments)

use arrow::array::{Array, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;

use crate::metrics::TIME_COLUMN;

/// Aggregate of one metric column.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    /// Metric name
    pub name: String,
    /// Non-null values
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
}

/// Rows read back from segment files, columns in schema order.
#[derive(Debug, Clone)]
pub struct SegmentTable {
    batch: RecordBatch,
}

impl SegmentTable {
    pub(crate) const fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Underlying Arrow batch.
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Whether the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Column names, `time` first.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// The `time` column as formatted strings.
    #[must_use]
    pub fn times(&self) -> Vec<String> {
        self.batch
            .column_by_name(TIME_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .map(|a| {
                a.iter()
                    .map(|v| v.unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A metric column; empty cells read as NaN.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let values = self
            .batch
            .column_by_name(name)?
            .as_any()
            .downcast_ref::<Float64Array>()?;
        Some(values.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    /// Count, mean, min and max of every metric column.
    #[must_use]
    pub fn summary(&self) -> Vec<MetricSummary> {
        self.column_names()
            .into_iter()
            .filter(|name| name != TIME_COLUMN)
            .filter_map(|name| {
                let values: Vec<f64> = self
                    .column(&name)?
                    .into_iter()
                    .filter(|v| !v.is_nan())
                    .collect();
                let count = values.len();
                let (min, max, sum) = values.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY, 0.0),
                    |(lo, hi, sum), &v| (lo.min(v), hi.max(v), sum + v),
                );
                #[allow(clippy::cast_precision_loss)]
                let mean = if count == 0 { f64::NAN } else { sum / count as f64 };
                Some(MetricSummary {
                    name,
                    count,
                    mean,
                    min,
                    max,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CriteriaSchema;
    use std::sync::Arc;

    fn table() -> SegmentTable {
        let schema = CriteriaSchema::with_metrics(["fps"]).unwrap();
        let batch = RecordBatch::try_new(
            schema.arrow_schema(),
            vec![
                Arc::new(StringArray::from(vec!["01/01/2024 00:00:00", "01/01/2024 00:00:01"])),
                Arc::new(Float64Array::from(vec![Some(20.0), Some(30.0)])),
            ],
        )
        .unwrap();
        SegmentTable::new(batch)
    }

    #[test]
    fn test_columns_and_times() {
        let t = table();
        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.column_names(), vec!["time", "fps"]);
        assert_eq!(t.times()[1], "01/01/2024 00:00:01");
        assert_eq!(t.column("fps"), Some(vec![20.0, 30.0]));
        assert_eq!(t.column("time"), None);
        assert_eq!(t.column("missing"), None);
    }

    #[test]
    fn test_summary() {
        let summary = table().summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].name, "fps");
        assert_eq!(summary[0].count, 2);
        assert!((summary[0].mean - 25.0).abs() < 1e-9);
        assert!((summary[0].min - 20.0).abs() < f64::EPSILON);
        assert!((summary[0].max - 30.0).abs() < f64::EPSILON);
    }
}
