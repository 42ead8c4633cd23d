//! # Trace Table Schema
//!
//! Finished traces are stored in the "wide" layout: one row per trace, with
//! the point arrays held in list columns so a trace can be plotted without
//! scanning a peak table.
//!
//! ## Schema Columns
//!
//! | Column | Type | Description | CV Term |
//! |--------|------|-------------|---------|
//! | trace_id | Int64 | Creation sequence number of the trace | |
//! | apex_mz | Float64 | m/z of the most intense point | MS:1000040 |
//! | apex_time | Float64 | Retention time of the most intense point | MS:1000016 |
//! | height | Float64 | Highest intensity | MS:1000042 |
//! | area | Float64 | Trapezoidal area under the trace | |
//! | weighted_mz | Float64 | Intensity-weighted mean m/z | |
//! | point_count | Int32 | Number of points, gap markers included | |
//! | scan_number_array | `List<Int64>` | Native scan numbers | |
//! | time_array | `List<Float64>` | Retention times | MS:1000595 |
//! | mz_array | `List<Float64>` | m/z values | MS:1000514 |
//! | intensity_array | `List<Float64>` | Intensities (0 for gap markers) | MS:1000515 |

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaBuilder};

/// Trace table format version
pub const TRACE_FORMAT_VERSION: &str = "1.0.0";

/// Metadata key for the format version in the Parquet footer
pub const KEY_FORMAT_VERSION: &str = "mztrace:format_version";

/// Metadata key for the builder configuration (JSON) in the Parquet footer
pub const KEY_BUILDER_CONFIG: &str = "mztrace:builder_config";

/// Metadata key for the run counters (JSON) in the Parquet footer
pub const KEY_BUILD_STATS: &str = "mztrace:build_stats";

/// Metadata key for the input file name in the Parquet footer
pub const KEY_SOURCE_FILE: &str = "mztrace:source_file";

/// Column names for the trace table
pub mod trace_columns {
    /// Creation sequence number of the trace
    pub const TRACE_ID: &str = "trace_id";
    /// m/z of the most intense point
    pub const APEX_MZ: &str = "apex_mz";
    /// Retention time of the most intense point
    pub const APEX_TIME: &str = "apex_time";
    /// Highest intensity
    pub const HEIGHT: &str = "height";
    /// Trapezoidal area
    pub const AREA: &str = "area";
    /// Intensity-weighted mean m/z
    pub const WEIGHTED_MZ: &str = "weighted_mz";
    /// Number of points
    pub const POINT_COUNT: &str = "point_count";
    /// Native scan numbers
    pub const SCAN_NUMBER_ARRAY: &str = "scan_number_array";
    /// Retention time values
    pub const TIME_ARRAY: &str = "time_array";
    /// m/z values
    pub const MZ_ARRAY: &str = "mz_array";
    /// Intensity values
    pub const INTENSITY_ARRAY: &str = "intensity_array";
}

/// Creates a Field with CV term metadata annotation
fn field_with_cv(name: &str, data_type: DataType, nullable: bool, cv_accession: &str) -> Field {
    let mut metadata = HashMap::new();
    metadata.insert("cv_accession".to_string(), cv_accession.to_string());
    Field::new(name, data_type, nullable).with_metadata(metadata)
}

/// Item field shared by every list column
pub(crate) fn list_item(data_type: DataType) -> Arc<Field> {
    Arc::new(Field::new("item", data_type, false))
}

/// Creates the trace table Arrow schema.
///
/// # Example
///
/// ```
/// use mztrace::schema::create_trace_schema;
///
/// let schema = create_trace_schema();
/// assert_eq!(schema.fields().len(), 11);
/// ```
pub fn create_trace_schema() -> Schema {
    use trace_columns::*;

    let mut builder = SchemaBuilder::new();

    builder.push(Field::new(TRACE_ID, DataType::Int64, false));
    builder.push(field_with_cv(APEX_MZ, DataType::Float64, false, "MS:1000040"));
    builder.push(field_with_cv(APEX_TIME, DataType::Float64, false, "MS:1000016"));
    builder.push(field_with_cv(HEIGHT, DataType::Float64, false, "MS:1000042"));
    builder.push(Field::new(AREA, DataType::Float64, false));
    builder.push(Field::new(WEIGHTED_MZ, DataType::Float64, false));
    builder.push(Field::new(POINT_COUNT, DataType::Int32, false));

    builder.push(Field::new(
        SCAN_NUMBER_ARRAY,
        DataType::List(list_item(DataType::Int64)),
        false,
    ));
    builder.push(field_with_cv(
        TIME_ARRAY,
        DataType::List(list_item(DataType::Float64)),
        false,
        "MS:1000595",
    ));
    builder.push(field_with_cv(
        MZ_ARRAY,
        DataType::List(list_item(DataType::Float64)),
        false,
        "MS:1000514",
    ));
    builder.push(field_with_cv(
        INTENSITY_ARRAY,
        DataType::List(list_item(DataType::Float64)),
        false,
        "MS:1000515",
    ));

    let mut metadata = HashMap::new();
    metadata.insert(
        KEY_FORMAT_VERSION.to_string(),
        TRACE_FORMAT_VERSION.to_string(),
    );
    metadata.insert(
        "mztrace:schema_description".to_string(),
        "Extracted ion chromatogram traces, one row per trace with point arrays".to_string(),
    );

    builder.finish().with_metadata(metadata)
}

/// Returns an Arc-wrapped trace schema for shared ownership
pub fn create_trace_schema_arc() -> Arc<Schema> {
    Arc::new(create_trace_schema())
}
