//! Observation Row - one timestamped record per loop iteration

use chrono::{DateTime, Local};

/// Format of the `time` column in rows and segment files.
pub const TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// One timestamped record of every declared metric.
///
/// Values are stored in schema slot order; the owning accumulator's
/// [`CriteriaSchema`](super::CriteriaSchema) maps names to slots.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    timestamp: DateTime<Local>,
    values: Box<[f64]>,
}

impl ObservationRow {
    pub(crate) fn new(timestamp: DateTime<Local>, values: Box<[f64]>) -> Self {
        Self { timestamp, values }
    }

    /// Wall-clock time the row was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Timestamp rendered as `DD/MM/YYYY HH:MM:SS`.
    #[must_use]
    pub fn formatted_time(&self) -> String {
        self.timestamp.format(TIME_FORMAT).to_string()
    }

    /// Metric values in schema order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formatted_time() {
        let ts = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        let row = ObservationRow::new(ts, vec![1.0].into_boxed_slice());
        assert_eq!(row.formatted_time(), "07/03/2024 09:05:02");
        assert_eq!(row.values(), &[1.0]);
    }
}
