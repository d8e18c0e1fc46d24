//! Rolling visualizer: named chart views over the newest segment
//!
//! The visualizer only ever reads persisted segments, never the live
//! accumulator, so a rotation between two redraws cannot tear a chart.
//! Until the first segment exists every registered graph shows a
//! placeholder.

mod surface;

pub use surface::{ChartSurface, TextSurface, PLACEHOLDER_TEXT};

use tracing::debug;

use crate::metrics::{CriteriaSchema, TIME_COLUMN};
use crate::storage::{SegmentStore, SegmentTable};
use crate::{Error, Result};

/// A named view: title, ordered attributes and the x-axis attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRegistration {
    title: String,
    attributes: Vec<String>,
    index: String,
}

impl GraphRegistration {
    /// Chart title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Displayed attributes, index included.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// X-axis attribute.
    #[must_use]
    pub fn index(&self) -> &str {
        &self.index
    }
}

/// X-axis values of a chart.
#[derive(Debug, Clone, PartialEq)]
pub enum Axis {
    /// Timestamp labels (`time` index)
    Labels(Vec<String>),
    /// Numeric index
    Values(Vec<f64>),
}

impl Axis {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Labels(v) => v.len(),
            Self::Values(v) => v.len(),
        }
    }

    /// Whether the axis has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One plotted attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Attribute name
    pub name: String,
    /// One value per axis point
    pub values: Vec<f64>,
}

/// Data handed to a [`ChartSurface`] for one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    /// Graph title
    pub title: String,
    /// Index attribute name
    pub index: String,
    /// Index values
    pub axis: Axis,
    /// Every non-index attribute except `time`
    pub series: Vec<Series>,
}

/// Result of a redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// No segment yet; placeholders shown
    Placeholder,
    /// Charts rendered from a segment with this many rows
    Rendered {
        /// Rows in the newest segment
        rows: usize,
    },
}

/// Registry of graph views over one criteria schema.
#[derive(Debug, Clone)]
pub struct RollingVisualizer {
    schema: CriteriaSchema,
    graphs: Vec<GraphRegistration>,
}

impl RollingVisualizer {
    /// Create a visualizer for segments written with `schema`.
    #[must_use]
    pub const fn new(schema: CriteriaSchema) -> Self {
        Self {
            schema,
            graphs: Vec::new(),
        }
    }

    /// Register a graph.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGraph` if `index` is not one of `attributes`, an
    /// attribute is not a schema column, the attribute list is empty, or the
    /// title is already taken.
    pub fn add_graph<S: AsRef<str>>(
        &mut self,
        title: impl Into<String>,
        attributes: &[S],
        index: &str,
    ) -> Result<()> {
        let title = title.into();
        let attributes: Vec<String> = attributes.iter().map(|a| a.as_ref().to_string()).collect();

        if attributes.is_empty() {
            return Err(Error::InvalidGraph(format!("'{title}' has no attributes")));
        }
        if !attributes.iter().any(|a| a == index) {
            return Err(Error::InvalidGraph(format!(
                "'{title}': index '{index}' not in {attributes:?}"
            )));
        }
        if let Some(unknown) = attributes.iter().find(|a| !self.schema.contains(a)) {
            return Err(Error::InvalidGraph(format!(
                "'{title}': '{unknown}' is not a tracked column {:?}",
                self.schema.columns()
            )));
        }
        if self.graphs.iter().any(|g| g.title == title) {
            return Err(Error::InvalidGraph(format!("'{title}' is already registered")));
        }

        self.graphs.push(GraphRegistration {
            title,
            attributes,
            index: index.to_string(),
        });
        Ok(())
    }

    /// Registered graphs in registration order.
    #[must_use]
    pub fn graphs(&self) -> &[GraphRegistration] {
        &self.graphs
    }

    /// The schema graphs are validated against.
    #[must_use]
    pub const fn schema(&self) -> &CriteriaSchema {
        &self.schema
    }

    /// Reload the newest segment and redraw every graph.
    ///
    /// # Errors
    ///
    /// Returns storage errors other than `NoData`, and surface errors.
    pub fn draw(&self, store: &SegmentStore, surface: &mut dyn ChartSurface) -> Result<DrawOutcome> {
        let table = match store.load_latest(&self.schema) {
            Ok(table) => table,
            Err(Error::NoData(dir)) => {
                debug!(dir = %dir.display(), "No segment yet, drawing placeholders");
                for graph in &self.graphs {
                    surface.placeholder(&graph.title)?;
                }
                return Ok(DrawOutcome::Placeholder);
            }
            Err(e) => return Err(e),
        };

        for graph in &self.graphs {
            surface.line_chart(&Self::view(graph, &table))?;
        }
        Ok(DrawOutcome::Rendered {
            rows: table.num_rows(),
        })
    }

    /// Build the chart data for one graph.
    #[must_use]
    pub fn view(graph: &GraphRegistration, table: &SegmentTable) -> ChartView {
        let axis = if graph.index == TIME_COLUMN {
            Axis::Labels(table.times())
        } else {
            Axis::Values(table.column(&graph.index).unwrap_or_default())
        };

        let series = graph
            .attributes
            .iter()
            .filter(|a| **a != graph.index && *a != TIME_COLUMN)
            .filter_map(|a| {
                table.column(a).map(|values| Series {
                    name: a.clone(),
                    values,
                })
            })
            .collect();

        ChartView {
            title: graph.title.clone(),
            index: graph.index.clone(),
            axis,
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visualizer() -> RollingVisualizer {
        let schema = CriteriaSchema::with_metrics(["t_total", "fps", "faces"]).unwrap();
        RollingVisualizer::new(schema)
    }

    #[test]
    fn test_index_must_be_attribute() {
        let mut vis = visualizer();
        let err = vis.add_graph("depth view", &["time", "fps"], "depth").unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)));
        assert!(err.to_string().contains("depth"));
        assert!(vis.graphs().is_empty());
    }

    #[test]
    fn test_attribute_must_be_tracked() {
        let mut vis = visualizer();
        let result = vis.add_graph("gpu", &["time", "gpu_temp"], "time");
        assert!(matches!(result, Err(Error::InvalidGraph(_))));
    }

    #[test]
    fn test_duplicate_title_rejected() {
        let mut vis = visualizer();
        vis.add_graph("timing", &["time", "t_total"], "time").unwrap();
        assert!(vis.add_graph("timing", &["time", "fps"], "time").is_err());
        assert_eq!(vis.graphs().len(), 1);
    }

    #[test]
    fn test_numeric_index() {
        let mut vis = visualizer();
        vis.add_graph("fps by faces", &["faces", "fps"], "faces").unwrap();
        assert_eq!(vis.graphs()[0].index(), "faces");
        assert_eq!(vis.graphs()[0].attributes(), ["faces", "fps"]);
    }
}
