//! Criteria Schema - ordered metric names accepted by an accumulator

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

/// Name of the implicit timestamp column.
pub const TIME_COLUMN: &str = "time";

/// Ordered set of metric names, `time` implicit and first.
///
/// Metric names are resolved to column slots through a hash index so a row
/// can be validated in time proportional to its width, independent of how
/// many rows are buffered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaSchema {
    metrics: Vec<String>,
    slots: HashMap<String, usize>,
}

impl CriteriaSchema {
    /// Create a schema holding only the implicit `time` column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema from metric names.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for empty names.
    pub fn with_metrics<I, S>(names: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut schema = Self::new();
        schema.extend(names)?;
        Ok(schema)
    }

    /// Append names not already present, preserving first-seen order.
    ///
    /// `time` is ignored since it is always the first column.
    pub(crate) fn extend<I, S>(&mut self, names: I) -> crate::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(crate::Error::InvalidInput(
                "metric names must be non-empty".to_string(),
            ));
        }

        for name in names {
            if name == TIME_COLUMN || self.slots.contains_key(&name) {
                continue;
            }
            self.slots.insert(name.clone(), self.metrics.len());
            self.metrics.push(name);
        }
        Ok(())
    }

    /// Declared metric names, excluding `time`.
    #[must_use]
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Number of declared metrics, excluding `time`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether no metric has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Column slot of a metric.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    /// Whether `name` is a column of this schema (including `time`).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        name == TIME_COLUMN || self.slots.contains_key(name)
    }

    /// All column names in file order: `time` then metrics.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        std::iter::once(TIME_COLUMN.to_string())
            .chain(self.metrics.iter().cloned())
            .collect()
    }

    /// Whether a header names exactly these columns, in any order.
    #[must_use]
    pub fn matches_columns(&self, header: &[String]) -> bool {
        let mut got: Vec<&str> = header.iter().map(String::as_str).collect();
        let mut expected: Vec<String> = self.columns();
        got.sort_unstable();
        expected.sort_unstable();
        got.len() == expected.len() && got.iter().zip(&expected).all(|(g, e)| *g == e.as_str())
    }

    /// Arrow schema: `time` as UTF-8, every metric as `Float64`.
    #[must_use]
    pub fn arrow_schema(&self) -> SchemaRef {
        arrow_schema_for(&self.columns())
    }
}

/// Arrow schema for a header: `time` as UTF-8, anything else as `Float64`.
pub(crate) fn arrow_schema_for(columns: &[String]) -> SchemaRef {
    let fields: Vec<Field> = columns
        .iter()
        .map(|name| {
            if name == TIME_COLUMN {
                Field::new(name, DataType::Utf8, false)
            } else {
                Field::new(name, DataType::Float64, true)
            }
        })
        .collect();
    Arc::new(Schema::new(fields))
}
