//! Application configuration
//!
//! Loaded from an optional JSON file; every field has a default so an empty
//! object (or no file at all) is a valid configuration.
//!
//! ```json
//! {
//!   "save_dir": "benchmark",
//!   "mode": "checkin",
//!   "detection_threshold": 0.5,
//!   "rotation": { "every": 5, "period": "minute" },
//!   "redraw": { "every": 5, "period": "minute" },
//!   "graphs": [
//!     { "title": "timing", "attributes": ["time", "t_total", "t_detect"], "index": "time" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::metrics::CriteriaSchema;
use crate::pipeline::{CancelToken, LoopConfig, Mode};
use crate::schedule::Interval;
use crate::visualize::RollingVisualizer;
use crate::{Error, Result};

/// `every N <period>` as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    /// Repeat count
    pub every: u32,
    /// One of `second`, `minute`, `hour`, `day`
    pub period: String,
}

impl ScheduleSpec {
    /// Create a schedule entry.
    #[must_use]
    pub fn new(every: u32, period: impl Into<String>) -> Self {
        Self {
            every,
            period: period.into(),
        }
    }

    /// Validate into an [`Interval`].
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPeriod` or `InvalidInput`.
    pub fn interval(&self) -> Result<Interval> {
        Interval::parse(self.every, &self.period)
    }
}

impl Default for ScheduleSpec {
    fn default() -> Self {
        Self::new(5, "minute")
    }
}

/// One graph view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSpec {
    /// Chart title
    pub title: String,
    /// Displayed attributes, index included
    pub attributes: Vec<String>,
    /// X-axis attribute
    #[serde(default = "default_index")]
    pub index: String,
}

fn default_index() -> String {
    "time".to_string()
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Segment directory
    pub save_dir: PathBuf,
    /// Operating mode
    pub mode: Mode,
    /// Minimum detector score
    pub detection_threshold: f32,
    /// Rotation job period
    pub rotation: ScheduleSpec,
    /// Redraw job period
    pub redraw: ScheduleSpec,
    /// Stop after this many iterations
    pub max_iterations: Option<u64>,
    /// Synthetic source width
    pub frame_width: u32,
    /// Synthetic source height
    pub frame_height: u32,
    /// Chart views
    pub graphs: Vec<GraphSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("benchmark"),
            mode: Mode::Checkin,
            detection_threshold: 0.5,
            rotation: ScheduleSpec::default(),
            redraw: ScheduleSpec::default(),
            max_iterations: None,
            frame_width: 640,
            frame_height: 480,
            graphs: vec![
                GraphSpec {
                    title: "timing".to_string(),
                    attributes: ["time", "t_total", "t_capture", "t_detect", "t_annotate", "t_display"]
                        .map(String::from)
                        .to_vec(),
                    index: default_index(),
                },
                GraphSpec {
                    title: "throughput".to_string(),
                    attributes: ["time", "fps", "faces", "cpu_percent", "mem_percent"]
                        .map(String::from)
                        .to_vec(),
                    index: default_index(),
                },
            ],
        }
    }
}

impl AppConfig {
    /// Load a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Parse JSON config text.
    ///
    /// # Errors
    ///
    /// Returns `Config` on malformed JSON or wrongly typed fields.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check everything that can be checked before the loop starts.
    ///
    /// # Errors
    ///
    /// Returns the first setup error: schedule periods, threshold, graphs.
    pub fn validate(&self, schema: &CriteriaSchema) -> Result<()> {
        self.rotation.interval()?;
        self.redraw.interval()?;
        self.loop_config(CancelToken::new()).validate()?;
        self.visualizer(schema.clone())?;
        Ok(())
    }

    /// Loop settings.
    #[must_use]
    pub fn loop_config(&self, cancel: CancelToken) -> LoopConfig {
        LoopConfig {
            mode: self.mode,
            detection_threshold: self.detection_threshold,
            max_iterations: self.max_iterations,
            cancel,
        }
    }

    /// A visualizer with every configured graph registered.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGraph` for the first inconsistent graph.
    pub fn visualizer(&self, schema: CriteriaSchema) -> Result<RollingVisualizer> {
        let mut visualizer = RollingVisualizer::new(schema);
        for graph in &self.graphs {
            visualizer.add_graph(graph.title.clone(), &graph.attributes, &graph.index)?;
        }
        Ok(visualizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::STANDARD_METRICS;

    fn standard_schema() -> CriteriaSchema {
        CriteriaSchema::with_metrics(STANDARD_METRICS).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate(&standard_schema()).unwrap();
        assert_eq!(config.rotation.interval().unwrap().as_delta().num_minutes(), 5);
        assert_eq!(config.visualizer(standard_schema()).unwrap().graphs().len(), 2);
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::from_json(
            r#"{"save_dir": "/tmp/fw", "mode": "registration", "rotation": {"every": 10, "period": "second"}}"#,
        )
        .unwrap();
        assert_eq!(config.save_dir, PathBuf::from("/tmp/fw"));
        assert_eq!(config.mode, Mode::Registration);
        assert_eq!(config.rotation, ScheduleSpec::new(10, "second"));
        assert_eq!(config.redraw, ScheduleSpec::default());
    }

    #[test]
    fn test_bad_period_fails_validation() {
        let config =
            AppConfig::from_json(r#"{"redraw": {"every": 1, "period": "fortnight"}}"#).unwrap();
        let err = config.validate(&standard_schema()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPeriod(_)));
        assert!(err.to_string().contains("second, minute, hour, day"));
    }

    #[test]
    fn test_bad_graph_fails_validation() {
        let config = AppConfig::from_json(
            r#"{"graphs": [{"title": "depth", "attributes": ["time", "fps"], "index": "depth"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(&standard_schema()),
            Err(Error::InvalidGraph(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            AppConfig::from_json("{ not json"),
            Err(Error::Config(_))
        ));
    }
}
