//! Data profiling module for dataset analysis.
//!
//! Computes the descriptive statistics shown in the EDA report:
//! - numeric columns: count, mean, std, min, quartiles, max
//! - other columns: count, unique, top, freq

mod statistics;

pub use statistics::{CategoricalSummary, NumericSummary};

use crate::dataset::Dataset;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use statistics::{summarize_categorical, summarize_numeric};
use tracing::debug;

/// Descriptive statistics of every column of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescription {
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
}

/// Data profiler for computing column statistics.
pub struct DataProfiler;

impl DataProfiler {
    /// Describe every column, split by declared kind.
    pub fn describe(dataset: &Dataset) -> Result<DatasetDescription> {
        let mut description = DatasetDescription::default();

        for column in dataset.schema().columns() {
            let series = dataset.series(&column.name)?;
            if column.kind.is_numeric() {
                description.numeric.push(summarize_numeric(series)?);
            } else {
                description.categorical.push(summarize_categorical(series)?);
            }
        }

        debug!(
            "Described {} numeric and {} non-numeric columns",
            description.numeric.len(),
            description.categorical.len()
        );
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_describe_splits_by_kind() {
        let dataset = Dataset::new(
            df![
                "fare" => [7.25, 71.28, 8.05],
                "sex" => ["male", "female", "male"],
                "pclass" => [3i64, 1, 3],
                "survived" => [false, true, false],
            ]
            .unwrap(),
        );

        let description = DataProfiler::describe(&dataset).unwrap();
        let numeric: Vec<&str> = description.numeric.iter().map(|s| s.column.as_str()).collect();
        let other: Vec<&str> = description
            .categorical
            .iter()
            .map(|s| s.column.as_str())
            .collect();

        assert_eq!(numeric, vec!["fare", "pclass"]);
        assert_eq!(other, vec!["sex", "survived"]);
    }

    #[test]
    fn test_describe_empty_dataset() {
        let dataset = Dataset::new(DataFrame::empty());
        let description = DataProfiler::describe(&dataset).unwrap();
        assert!(description.numeric.is_empty());
        assert!(description.categorical.is_empty());
    }
}
