//! # Trace Writer Module
//!
//! Writes finished traces to Parquet using the "wide" trace schema (see
//! [`crate::schema`]): one row per trace with list columns for the point
//! arrays. The builder configuration and run counters travel in the file
//! footer as JSON so a trace file documents how it was produced.
//!
//! A JSON export of the whole [`TraceSet`] is also provided for small runs
//! and debugging.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, Float64Array, Float64Builder, Int32Array, Int64Array, Int64Builder, ListBuilder,
};
use arrow::datatypes::{DataType, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::format::KeyValue;
use parquet::schema::types::ColumnPath;
use serde::Serialize;

use crate::builder::{BuildStats, BuilderConfig, TraceSet};
use crate::schema::{
    create_trace_schema_arc, list_item, trace_columns, KEY_BUILDER_CONFIG, KEY_BUILD_STATS,
    KEY_SOURCE_FILE,
};
use crate::track::FinishedTrace;

/// Errors that can occur during trace writing
#[derive(Debug, thiserror::Error)]
pub enum TraceWriterError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Trace does not fit the table layout
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Configuration for the trace writer
#[derive(Debug, Clone)]
pub struct TraceWriterConfig {
    /// ZSTD compression level
    pub compression_level: i32,

    /// Target row group size (traces per row group)
    pub row_group_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Whether to write statistics for columns
    pub write_statistics: bool,
}

impl Default for TraceWriterConfig {
    fn default() -> Self {
        Self {
            compression_level: 3,
            row_group_size: 1024,
            data_page_size: 1024 * 1024,
            write_statistics: true,
        }
    }
}

impl TraceWriterConfig {
    fn to_writer_properties(&self, metadata: &HashMap<String, String>) -> WriterProperties {
        let compression =
            Compression::ZSTD(ZstdLevel::try_new(self.compression_level).unwrap_or_default());

        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(compression)
            .set_data_page_size_limit(self.data_page_size)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size);

        // point arrays are high-cardinality
        for column in [
            trace_columns::TIME_ARRAY,
            trace_columns::MZ_ARRAY,
            trace_columns::INTENSITY_ARRAY,
        ] {
            builder = builder
                .set_column_dictionary_enabled(ColumnPath::new(vec![column.to_string()]), false);
        }

        let mut kv_metadata: Vec<KeyValue> = metadata
            .iter()
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: Some(v.clone()),
            })
            .collect();
        kv_metadata.sort_by(|a, b| a.key.cmp(&b.key));

        builder.set_key_value_metadata(Some(kv_metadata)).build()
    }
}

/// Provenance stored in the Parquet footer
#[derive(Debug, Clone, Default)]
pub struct TraceFileMetadata {
    /// Configuration the traces were built with
    pub builder_config: Option<BuilderConfig>,
    /// Counters of the run
    pub stats: Option<BuildStats>,
    /// Input file name
    pub source_file: Option<String>,
}

impl TraceFileMetadata {
    /// Empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the builder configuration
    pub fn with_config(mut self, config: &BuilderConfig) -> Self {
        self.builder_config = Some(config.clone());
        self
    }

    /// Record the run counters
    pub fn with_stats(mut self, stats: &BuildStats) -> Self {
        self.stats = Some(stats.clone());
        self
    }

    /// Record the input file name
    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = Some(name.into());
        self
    }

    /// Serialize into footer key-value pairs
    pub fn to_parquet_metadata(&self) -> Result<HashMap<String, String>, TraceWriterError> {
        let mut metadata = HashMap::new();
        if let Some(config) = &self.builder_config {
            metadata.insert(KEY_BUILDER_CONFIG.to_string(), serde_json::to_string(config)?);
        }
        if let Some(stats) = &self.stats {
            metadata.insert(KEY_BUILD_STATS.to_string(), serde_json::to_string(stats)?);
        }
        if let Some(source) = &self.source_file {
            metadata.insert(KEY_SOURCE_FILE.to_string(), source.clone());
        }
        Ok(metadata)
    }
}

/// Streaming writer for trace Parquet files
pub struct TraceWriter<W: Write + Send> {
    writer: ArrowWriter<W>,
    schema: Arc<Schema>,
    traces_written: usize,
    points_written: usize,
}

impl TraceWriter<File> {
    /// Create a new writer to a file path
    pub fn new_file<P: AsRef<Path>>(
        path: P,
        metadata: &TraceFileMetadata,
        config: TraceWriterConfig,
    ) -> Result<Self, TraceWriterError> {
        let file = File::create(path)?;
        Self::new(file, metadata, config)
    }
}

impl<W: Write + Send> TraceWriter<W> {
    /// Create a new writer to any Write implementation
    pub fn new(
        writer: W,
        metadata: &TraceFileMetadata,
        config: TraceWriterConfig,
    ) -> Result<Self, TraceWriterError> {
        let schema = create_trace_schema_arc();
        let props = config.to_writer_properties(&metadata.to_parquet_metadata()?);
        let arrow_writer = ArrowWriter::try_new(writer, schema.clone(), Some(props))?;

        Ok(Self {
            writer: arrow_writer,
            schema,
            traces_written: 0,
            points_written: 0,
        })
    }

    /// Write a batch of traces
    pub fn write_traces(&mut self, traces: &[FinishedTrace]) -> Result<(), TraceWriterError> {
        if traces.is_empty() {
            return Ok(());
        }

        let mut ids = Vec::with_capacity(traces.len());
        let mut apex_mz = Vec::with_capacity(traces.len());
        let mut apex_time = Vec::with_capacity(traces.len());
        let mut height = Vec::with_capacity(traces.len());
        let mut area = Vec::with_capacity(traces.len());
        let mut weighted_mz = Vec::with_capacity(traces.len());
        let mut point_count = Vec::with_capacity(traces.len());

        let mut scan_builder =
            ListBuilder::new(Int64Builder::new()).with_field(list_item(DataType::Int64));
        let mut time_builder =
            ListBuilder::new(Float64Builder::new()).with_field(list_item(DataType::Float64));
        let mut mz_builder =
            ListBuilder::new(Float64Builder::new()).with_field(list_item(DataType::Float64));
        let mut intensity_builder =
            ListBuilder::new(Float64Builder::new()).with_field(list_item(DataType::Float64));

        for trace in traces {
            let id = i64::try_from(trace.id).map_err(|_| {
                TraceWriterError::InvalidData(format!("trace id {} overflows", trace.id))
            })?;
            let count = i32::try_from(trace.len()).map_err(|_| {
                TraceWriterError::InvalidData(format!(
                    "trace {} has too many points ({})",
                    trace.id,
                    trace.len()
                ))
            })?;

            ids.push(id);
            apex_mz.push(trace.apex_mz);
            apex_time.push(trace.apex_time);
            height.push(trace.height);
            area.push(trace.area);
            weighted_mz.push(trace.weighted_mz);
            point_count.push(count);

            for point in &trace.points {
                scan_builder.values().append_value(point.scan_number);
                time_builder.values().append_value(point.retention_time);
                mz_builder.values().append_value(point.mz);
                intensity_builder.values().append_value(point.intensity);
            }
            scan_builder.append(true);
            time_builder.append(true);
            mz_builder.append(true);
            intensity_builder.append(true);

            self.points_written += trace.len();
        }

        let arrays: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(Float64Array::from(apex_mz)),
            Arc::new(Float64Array::from(apex_time)),
            Arc::new(Float64Array::from(height)),
            Arc::new(Float64Array::from(area)),
            Arc::new(Float64Array::from(weighted_mz)),
            Arc::new(Int32Array::from(point_count)),
            Arc::new(scan_builder.finish()),
            Arc::new(time_builder.finish()),
            Arc::new(mz_builder.finish()),
            Arc::new(intensity_builder.finish()),
        ];

        let batch = RecordBatch::try_new(self.schema.clone(), arrays)?;
        self.writer.write(&batch)?;
        self.traces_written += traces.len();

        Ok(())
    }

    /// Flush any buffered data and finalize the file
    pub fn finish(self) -> Result<TraceWriterStats, TraceWriterError> {
        let file_metadata = self.writer.close()?;

        Ok(TraceWriterStats {
            traces_written: self.traces_written,
            points_written: self.points_written,
            row_groups_written: file_metadata.row_groups.len(),
            file_size_bytes: file_metadata
                .row_groups
                .iter()
                .map(|rg| rg.total_byte_size as u64)
                .sum(),
        })
    }

    /// Finalize and return the inner writer (for buffer extraction)
    pub fn finish_into_inner(self) -> Result<W, TraceWriterError> {
        Ok(self.writer.into_inner()?)
    }

    /// Get current statistics
    pub fn stats(&self) -> TraceWriterStats {
        TraceWriterStats {
            traces_written: self.traces_written,
            points_written: self.points_written,
            row_groups_written: 0,
            file_size_bytes: 0,
        }
    }
}

/// Statistics from a completed trace write
#[derive(Debug, Clone)]
pub struct TraceWriterStats {
    /// Rows written
    pub traces_written: usize,
    /// Points across all rows
    pub points_written: usize,
    /// Row groups in the file
    pub row_groups_written: usize,
    /// Uncompressed size of the row groups
    pub file_size_bytes: u64,
}

impl std::fmt::Display for TraceWriterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Wrote {} traces ({} points) in {} row groups",
            self.traces_written, self.points_written, self.row_groups_written
        )
    }
}

/// Write a whole trace set to a Parquet file, recording `config` and the run
/// counters in the footer
pub fn write_trace_file<P: AsRef<Path>>(
    path: P,
    set: &TraceSet,
    config: &BuilderConfig,
    source_file: Option<&str>,
) -> Result<TraceWriterStats, TraceWriterError> {
    let mut metadata = TraceFileMetadata::new()
        .with_config(config)
        .with_stats(&set.stats);
    if let Some(source) = source_file {
        metadata = metadata.with_source_file(source);
    }

    let mut writer = TraceWriter::new_file(path, &metadata, TraceWriterConfig::default())?;
    writer.write_traces(&set.traces)?;
    writer.finish()
}

#[derive(Serialize)]
struct JsonExport<'a> {
    config: &'a BuilderConfig,
    stats: &'a BuildStats,
    traces: &'a [FinishedTrace],
}

/// Export a trace set and its configuration as pretty-printed JSON
pub fn write_traces_json<W: Write>(
    writer: W,
    set: &TraceSet,
    config: &BuilderConfig,
) -> Result<(), TraceWriterError> {
    let export = JsonExport {
        config,
        stats: &set.stats,
        traces: &set.traces,
    };
    serde_json::to_writer_pretty(writer, &export)?;
    Ok(())
}

/// Summary of an existing trace file
#[derive(Debug, Clone)]
pub struct TraceFileInfo {
    /// Number of traces
    pub num_rows: i64,
    /// Number of row groups
    pub num_row_groups: usize,
    /// Footer key-value metadata
    pub metadata: Vec<(String, Option<String>)>,
    /// Column names with their physical types
    pub columns: Vec<(String, String)>,
}

impl TraceFileInfo {
    /// Builder configuration stored in the footer, if any
    pub fn builder_config(&self) -> Result<Option<BuilderConfig>, TraceWriterError> {
        self.metadata
            .iter()
            .find(|(k, _)| k == KEY_BUILDER_CONFIG)
            .and_then(|(_, v)| v.as_deref())
            .map(|v| serde_json::from_str::<BuilderConfig>(v))
            .transpose()
            .map_err(TraceWriterError::from)
    }
}

/// Read the footer of a trace Parquet file
pub fn read_trace_file_info<P: AsRef<Path>>(path: P) -> Result<TraceFileInfo, TraceWriterError> {
    let file = File::open(path)?;
    let reader = SerializedFileReader::new(file)?;
    let metadata = reader.metadata();
    let file_metadata = metadata.file_metadata();
    let schema = file_metadata.schema_descr();

    Ok(TraceFileInfo {
        num_rows: file_metadata.num_rows(),
        num_row_groups: metadata.num_row_groups(),
        metadata: file_metadata
            .key_value_metadata()
            .map(|kv| kv.iter().map(|kv| (kv.key.clone(), kv.value.clone())).collect())
            .unwrap_or_default(),
        columns: (0..schema.num_columns())
            .map(|i| {
                let col = schema.column(i);
                (col.path().string(), col.physical_type().to_string())
            })
            .collect(),
    })
}
