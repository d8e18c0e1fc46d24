//! Segment store (CSV segments on a flat directory)
//!
//! **Append-Then-Rotate Design**:
//! - The real-time path only appends rows to the accumulator
//! - Rotation is the only path that persists and clears those rows
//! - Segments are immutable once written; "latest" is the greatest file name
//!
//! File layout: one header row of column names (`time` first, then metrics in
//! schema order) and one data row per observation. The `time` column uses
//! `DD/MM/YYYY HH:MM:SS`.

mod segment_name;
mod table;

pub use segment_name::SegmentName;
pub use table::{MetricSummary, SegmentTable};

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::metrics::{arrow_schema_for, CriteriaSchema, MetricsAccumulator};
use crate::{Error, Result};

/// Directory of timestamp-named metric segments.
#[derive(Debug)]
pub struct SegmentStore {
    dir: PathBuf,
    last: Option<SegmentName>,
}

impl SegmentStore {
    /// Open (creating if needed) a segment directory.
    ///
    /// Opening an existing directory is not an error; its newest segment
    /// seeds name ordering for later rotations.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be created or listed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let mut store = Self { dir, last: None };
        store.last = store.segment_names()?.pop();
        Ok(store)
    }

    /// Segment directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All segment names, oldest first. Files that are not segments are ignored.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be listed.
    pub fn segment_names(&self) -> Result<Vec<SegmentName>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str().and_then(SegmentName::parse) {
                names.push(name);
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    /// Whether any segment has been written.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be listed.
    pub fn has_segments(&self) -> Result<bool> {
        Ok(!self.segment_names()?.is_empty())
    }

    /// Persist the accumulator's rows to a new segment, then clear it.
    ///
    /// The segment is written to a hidden temporary file and renamed into
    /// place, and the accumulator is cleared only after the rename succeeds.
    /// On error the rows stay buffered for the next rotation. An empty
    /// accumulator writes nothing and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an IO or Arrow error if the segment cannot be written.
    pub fn rotate(
        &mut self,
        accumulator: &mut MetricsAccumulator,
        now: DateTime<Local>,
    ) -> Result<Option<PathBuf>> {
        if accumulator.is_empty() {
            debug!(dir = %self.dir.display(), "Nothing buffered, skipping rotation");
            return Ok(None);
        }

        let batch = accumulator.to_record_batch()?;
        let name = SegmentName::next_after(now, self.last.as_ref());
        let path = self.dir.join(name.file_name());
        let tmp = self.dir.join(format!(".{}.tmp", name.file_name()));

        if let Err(e) = write_csv(&tmp, &batch) {
            fs::remove_file(&tmp).ok();
            return Err(e);
        }
        fs::rename(&tmp, &path)?;

        accumulator.clear();
        self.last = Some(name);
        info!(segment = %path.display(), rows = batch.num_rows(), "Rotated metrics segment");
        Ok(Some(path))
    }

    /// Load the newest segment.
    ///
    /// # Errors
    ///
    /// Returns `NoData` if no segment exists, and `SchemaMismatch` if the
    /// newest segment's columns differ from `schema`.
    pub fn load_latest(&self, schema: &CriteriaSchema) -> Result<SegmentTable> {
        let name = self
            .segment_names()?
            .pop()
            .ok_or_else(|| Error::NoData(self.dir.clone()))?;

        let (header, batch) = read_csv(&self.dir.join(name.file_name()))?;
        if !schema.matches_columns(&header) {
            return Err(Error::SchemaMismatch {
                expected: schema.columns(),
                got: header,
            });
        }
        Ok(SegmentTable::new(project(&batch, &header, schema)?))
    }

    /// Load and concatenate every segment whose columns match `schema`, oldest
    /// first. Segments with other columns are skipped.
    ///
    /// # Errors
    ///
    /// Returns `NoData` if no segment exists, or an IO/Arrow error if a
    /// matching segment cannot be read.
    pub fn load_all(&self, schema: &CriteriaSchema) -> Result<SegmentTable> {
        let names = self.segment_names()?;
        if names.is_empty() {
            return Err(Error::NoData(self.dir.clone()));
        }

        let mut batches = Vec::with_capacity(names.len());
        for name in names {
            debug!(segment = %name, "Reading segment");
            let (header, batch) = read_csv(&self.dir.join(name.file_name()))?;
            if schema.matches_columns(&header) {
                batches.push(project(&batch, &header, schema)?);
            } else {
                debug!(segment = %name, columns = ?header, "Skipping segment with different columns");
            }
        }

        let batch = concat_batches(&schema.arrow_schema(), &batches)?;
        Ok(SegmentTable::new(batch))
    }
}

fn write_csv(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;
    writer.into_inner().sync_all()?;
    Ok(())
}

/// Read a segment: header names plus the rows, `time` as UTF-8 and every
/// other column as `Float64`.
///
/// Header names go through the CSV reader, so names the writer had to quote
/// (commas, quotes, surrounding spaces) come back exactly as declared.
fn read_csv(path: &Path) -> Result<(Vec<String>, RecordBatch)> {
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(BufReader::new(File::open(path)?), Some(0))?;
    let header: Vec<String> = inferred.fields().iter().map(|f| f.name().clone()).collect();
    if header.is_empty() {
        return Err(Error::StorageError(format!(
            "Segment {} has no header",
            path.display()
        )));
    }

    let arrow_schema = arrow_schema_for(&header);
    let reader = ReaderBuilder::new(arrow_schema.clone())
        .with_header(true)
        .build(File::open(path)?)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&arrow_schema, &batches)?;
    Ok((header, batch))
}

/// Reorder a batch's columns into schema order.
fn project(batch: &RecordBatch, header: &[String], schema: &CriteriaSchema) -> Result<RecordBatch> {
    let indices = schema
        .columns()
        .iter()
        .map(|col| {
            header
                .iter()
                .position(|h| h == col)
                .ok_or_else(|| Error::StorageError(format!("Segment is missing column '{col}'")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(batch.project(&indices)?)
}
