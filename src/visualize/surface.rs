//! Chart surfaces

use std::io::Write;

use super::{Axis, ChartView};
use crate::Result;

/// Text shown for a graph before any segment exists.
pub const PLACEHOLDER_TEXT: &str = "No data available!";

/// Somewhere charts are drawn.
pub trait ChartSurface {
    /// Show the "no data" state for a graph.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn placeholder(&mut self, title: &str) -> Result<()>;

    /// Draw (or replace) a line chart.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn line_chart(&mut self, chart: &ChartView) -> Result<()>;
}

/// Plain-text surface: a header per graph and one summary line per series.
///
/// ```text
/// == TIMING ==  (index: time, 120 points, 12/05/2024 10:00:00 .. 12/05/2024 10:00:04)
///   t_total      min 0.0312  max 0.0581  last 0.0401
/// ```
#[derive(Debug)]
pub struct TextSurface<W: Write> {
    out: W,
}

impl<W: Write> TextSurface<W> {
    /// Wrap a writer.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartSurface for TextSurface<W> {
    fn placeholder(&mut self, title: &str) -> Result<()> {
        writeln!(self.out, "== {} ==", title.to_uppercase())?;
        writeln!(self.out, "  {PLACEHOLDER_TEXT}")?;
        Ok(())
    }

    fn line_chart(&mut self, chart: &ChartView) -> Result<()> {
        let range = match &chart.axis {
            Axis::Labels(labels) => match (labels.first(), labels.last()) {
                (Some(first), Some(last)) => format!(", {first} .. {last}"),
                _ => String::new(),
            },
            Axis::Values(values) => match (values.first(), values.last()) {
                (Some(first), Some(last)) => format!(", {first} .. {last}"),
                _ => String::new(),
            },
        };
        writeln!(
            self.out,
            "== {} ==  (index: {}, {} points{range})",
            chart.title.to_uppercase(),
            chart.index,
            chart.axis.len()
        )?;

        for series in &chart.series {
            let min = series.values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = series.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            match series.values.last() {
                Some(last) => writeln!(
                    self.out,
                    "  {:<12} min {min:.4}  max {max:.4}  last {last:.4}",
                    series.name
                )?,
                None => writeln!(self.out, "  {:<12} (empty)", series.name)?,
            }
        }
        Ok(())
    }
}
