//! Statistical imputation methods.
//!
//! Provides mean, median and mode filling of a single column.

use crate::error::{CleaningError, Result};
use crate::utils::{fill_nulls_from_index, fill_numeric_nulls, modal_index};
use polars::prelude::*;
use tracing::{debug, warn};

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Apply median imputation to a numeric column.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let series = Self::column_with_gaps(df, col_name)?;
        let Some(series) = series else {
            return Ok(());
        };
        match series.median() {
            Some(median_val) => {
                Self::fill_with_value(df, &series, median_val, processing_steps, "median")
            }
            None => {
                warn!("'{}' has no values to take a median from, left as is", col_name);
                Ok(())
            }
        }
    }

    /// Apply mean imputation to a numeric column.
    pub fn apply_numeric_mean(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let series = Self::column_with_gaps(df, col_name)?;
        let Some(series) = series else {
            return Ok(());
        };
        match series.mean() {
            Some(mean_val) => Self::fill_with_value(df, &series, mean_val, processing_steps, "mean"),
            None => {
                warn!("'{}' has no values to take a mean from, left as is", col_name);
                Ok(())
            }
        }
    }

    /// Apply mode imputation to a column of any type.
    ///
    /// Fails with [`CleaningError::NoModalValue`] when the column has no
    /// non-missing value at all.
    pub fn apply_mode_imputation(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let series = Self::column_with_gaps(df, col_name)?;
        let Some(series) = series else {
            return Ok(());
        };

        let modal_idx = modal_index(&series)?
            .ok_or_else(|| CleaningError::NoModalValue(col_name.to_string()))?;
        let mode_val = series
            .cast(&DataType::String)?
            .str()?
            .get(modal_idx)
            .unwrap_or_default()
            .to_string();

        let filled = fill_nulls_from_index(&series, modal_idx).map_err(|e| {
            CleaningError::ImputationFailed {
                column: col_name.to_string(),
                reason: e.to_string(),
            }
        })?;
        df.replace(col_name, filled)?;

        debug!("Filled {} nulls in '{}' with mode", series.null_count(), col_name);
        processing_steps.push(format!("Filled '{}' with mode: {}", col_name, mode_val));
        Ok(())
    }

    /// Clone a column out of the frame if it has anything to fill.
    fn column_with_gaps(df: &DataFrame, col_name: &str) -> Result<Option<Series>> {
        let column = df
            .column(col_name)
            .map_err(|_| CleaningError::ColumnNotFound(col_name.to_string()))?;
        let series = column.as_materialized_series();
        if series.null_count() == 0 {
            return Ok(None);
        }
        Ok(Some(series.clone()))
    }

    /// Fill a numeric column with a specific value.
    fn fill_with_value(
        df: &mut DataFrame,
        series: &Series,
        fill_value: f64,
        processing_steps: &mut Vec<String>,
        method: &str,
    ) -> Result<()> {
        let col_name = series.name().to_string();
        let filled = fill_numeric_nulls(series, fill_value).map_err(|e| {
            CleaningError::ImputationFailed {
                column: col_name.clone(),
                reason: e.to_string(),
            }
        })?;
        df.replace(&col_name, filled)?;

        debug!(
            "Filled {} nulls in '{}' with {}",
            series.null_count(),
            col_name,
            method
        );
        processing_steps.push(format!(
            "Filled '{}' with {}: {:.2}",
            col_name, method, fill_value
        ));
        Ok(())
    }
}
