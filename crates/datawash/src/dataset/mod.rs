//! In-memory dataset with an explicit column schema.
//!
//! A [`Dataset`] pairs a polars `DataFrame` with a [`Schema`] that records
//! the declared [`ColumnKind`] of every column. The schema is computed once
//! when the dataset is loaded; the imputers, the outlier filter and the
//! reporter all select columns through it.

mod export;
mod loader;

pub use export::{EXPORT_MIME_TYPE, export_csv, to_csv_bytes};
pub use loader::{FileFormat, load_csv, load_dataset};
#[cfg(feature = "excel")]
pub use loader::load_spreadsheet;

use crate::error::{CleaningError, Result};
use crate::utils::{is_boolean_dtype, is_categorical_dtype, is_datetime_dtype, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared kind of a column, derived from its dtype at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point numbers
    Numeric,
    /// True/false values
    Boolean,
    /// Date, datetime or time values
    Datetime,
    /// Dictionary-encoded strings
    Categorical,
    /// Free text
    String,
    /// Anything else (lists, structs, binary)
    Other,
}

impl ColumnKind {
    pub fn from_dtype(dtype: &DataType) -> Self {
        if is_numeric_dtype(dtype) {
            Self::Numeric
        } else if is_boolean_dtype(dtype) {
            Self::Boolean
        } else if is_datetime_dtype(dtype) {
            Self::Datetime
        } else if is_categorical_dtype(dtype) {
            Self::Categorical
        } else if matches!(dtype, DataType::String) {
            Self::String
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
            Self::Categorical => "categorical",
            Self::String => "string",
            Self::Other => "other",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name, physical dtype and declared kind of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: String,
    pub kind: ColumnKind,
}

/// Ordered column descriptions of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSchema>,
}

impl Schema {
    /// Classify every column of a frame.
    pub fn from_frame(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| ColumnSchema {
                name: col.name().to_string(),
                dtype: col.dtype().to_string(),
                kind: ColumnKind::from_dtype(col.dtype()),
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Names of the columns declared numeric, in column order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns_of_kind(ColumnKind::Numeric)
    }

    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Same columns and kinds, physical dtypes re-read from `df`.
    ///
    /// Fails if `df` does not have exactly the same columns in the same order.
    fn carried_to(&self, df: &DataFrame) -> Result<Self> {
        let frame_columns = df.get_columns();
        if frame_columns.len() != self.columns.len()
            || frame_columns
                .iter()
                .zip(&self.columns)
                .any(|(col, schema)| col.name().as_str() != schema.name)
        {
            return Err(CleaningError::SchemaMismatch(format!(
                "expected columns {:?}, got {:?}",
                self.names().collect::<Vec<_>>(),
                df.get_column_names()
            )));
        }

        let columns = frame_columns
            .iter()
            .zip(&self.columns)
            .map(|(col, schema)| ColumnSchema {
                name: schema.name.clone(),
                dtype: col.dtype().to_string(),
                kind: schema.kind,
            })
            .collect();
        Ok(Self { columns })
    }
}

/// Missing-value count of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingCount {
    pub column: String,
    pub count: usize,
    pub percentage: f64,
}

/// The in-memory table under transformation.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    schema: Schema,
}

impl Dataset {
    /// Wrap a freshly loaded frame, classifying its columns.
    ///
    /// Floating-point `NaN` is stored as a missing value.
    pub fn new(frame: DataFrame) -> Self {
        let frame = nan_as_null(frame);
        let schema = Schema::from_frame(&frame);
        Self { frame, schema }
    }

    /// Derive a new dataset from a transformed frame, keeping this
    /// dataset's declared column kinds.
    pub fn derive(&self, frame: DataFrame) -> Result<Self> {
        let schema = self.schema.carried_to(&frame)?;
        Ok(Self { frame, schema })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.frame.shape()
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.schema.numeric_columns()
    }

    /// Borrow a column as a materialized Series.
    pub fn series(&self, name: &str) -> Result<&Series> {
        self.frame
            .column(name)
            .map(|col| col.as_materialized_series())
            .map_err(|_| CleaningError::ColumnNotFound(name.to_string()))
    }

    /// Total number of missing cells.
    pub fn missing_cells(&self) -> usize {
        self.frame
            .get_columns()
            .iter()
            .map(|col| col.null_count())
            .sum()
    }

    /// Missing-value counts for the columns that have at least one.
    pub fn missing_counts(&self) -> Vec<MissingCount> {
        let height = self.height();
        self.frame
            .get_columns()
            .iter()
            .filter(|col| col.null_count() > 0)
            .map(|col| MissingCount {
                column: col.name().to_string(),
                count: col.null_count(),
                percentage: if height > 0 {
                    col.null_count() as f64 / height as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect()
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> DataFrame {
        self.frame.head(Some(n))
    }
}

fn has_nan(column: &Column) -> bool {
    let series = column.as_materialized_series();
    match series.dtype() {
        DataType::Float64 => series
            .f64()
            .is_ok_and(|ca| ca.iter().flatten().any(f64::is_nan)),
        DataType::Float32 => series
            .f32()
            .is_ok_and(|ca| ca.iter().flatten().any(f32::is_nan)),
        _ => false,
    }
}

fn nan_column_as_null(column: &Column) -> Column {
    let series = column.as_materialized_series();
    let cleaned = match series.dtype() {
        DataType::Float64 => series.f64().map(|ca| {
            ca.iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect::<Float64Chunked>()
                .into_series()
        }),
        DataType::Float32 => series.f32().map(|ca| {
            ca.iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect::<Float32Chunked>()
                .into_series()
        }),
        _ => return column.clone(),
    };
    match cleaned {
        Ok(s) => s.with_name(series.name().clone()).into_column(),
        Err(_) => column.clone(),
    }
}

fn nan_as_null(frame: DataFrame) -> DataFrame {
    if !frame.get_columns().iter().any(has_nan) {
        return frame;
    }
    let columns: Vec<Column> = frame
        .get_columns()
        .iter()
        .map(nan_column_as_null)
        .collect();
    DataFrame::new(columns).unwrap_or(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_frame() -> DataFrame {
        df![
            "age" => [Some(22i64), None, Some(35)],
            "fare" => [Some(7.25), Some(71.28), None],
            "name" => [Some("Braund"), Some("Cumings"), None],
            "survived" => [true, false, true],
        ]
        .unwrap()
    }

    #[test]
    fn test_schema_classifies_columns() {
        let dataset = Dataset::new(mixed_frame());
        let schema = dataset.schema();

        assert_eq!(schema.len(), 4);
        assert_eq!(schema.kind_of("age"), Some(ColumnKind::Numeric));
        assert_eq!(schema.kind_of("fare"), Some(ColumnKind::Numeric));
        assert_eq!(schema.kind_of("name"), Some(ColumnKind::String));
        assert_eq!(schema.kind_of("survived"), Some(ColumnKind::Boolean));
        assert_eq!(schema.kind_of("missing"), None);
        assert_eq!(dataset.numeric_columns(), vec!["age", "fare"]);
    }

    #[test]
    fn test_missing_counts_only_lists_columns_with_gaps() {
        let dataset = Dataset::new(mixed_frame());
        let counts = dataset.missing_counts();

        let names: Vec<&str> = counts.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(names, vec!["age", "fare", "name"]);
        assert!(counts.iter().all(|c| c.count == 1));
        assert_eq!(dataset.missing_cells(), 3);
    }

    #[test]
    fn test_derive_keeps_kinds_and_refreshes_dtype() {
        let dataset = Dataset::new(mixed_frame());
        let mut frame = dataset.frame().clone();
        let age = frame
            .column("age")
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::Float64)
            .unwrap();
        frame.replace("age", age).unwrap();

        let derived = dataset.derive(frame).unwrap();
        assert_eq!(derived.schema().kind_of("age"), Some(ColumnKind::Numeric));
        assert_eq!(derived.schema().columns()[0].dtype, DataType::Float64.to_string());
    }

    #[test]
    fn test_derive_rejects_changed_columns() {
        let dataset = Dataset::new(mixed_frame());
        let frame = dataset.frame().drop("name").unwrap();

        let err = dataset.derive(frame).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let dataset = Dataset::new(
            df![
                "x" => [Some(1.0), Some(f64::NAN), None],
                "y" => [Some(1.0f32), Some(f32::NAN), Some(3.0)],
            ]
            .unwrap(),
        );

        assert_eq!(dataset.missing_cells(), 3);
        assert_eq!(dataset.series("x").unwrap().dtype(), &DataType::Float64);
        assert_eq!(dataset.series("y").unwrap().dtype(), &DataType::Float32);
        let names: Vec<&str> = dataset.schema().names().collect();
        assert_eq!(names, vec!["x", "y"]);
    }
}
